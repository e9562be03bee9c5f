use criterion::{black_box, criterion_group, criterion_main, Criterion};

use shiftreduce::{
  AnnotatedSentence, BeamConfig, Configuration, DependencyTree, Scorer, System, SystemKind, TransitionSystem,
};

// The quick brown fox jumped over the lazy dog that barked
const SENTENCE: &str = "the:3:det quick:3:amod brown:3:amod fox:4:nsubj jumped:11:root over:8:case \
                        the:8:det lazy:8:amod dog:4:obl that:10:nsubj barked:8:acl ROOT:-";

// "a hearing is scheduled on the issue today", with the crossing PP attachment
const CROSSING: &str = "a:1:det hearing:3:nsubj is:3:aux scheduled:8:root on:6:case the:6:det issue:1:nmod \
                        today:3:obl ROOT:-";

/// Prefers actions by id, shifted by the length of the history
struct Cycling {
  num_actions: usize,
}

impl Scorer for Cycling {
  type Input = ();
  type Checkpoint = usize;

  fn new_checkpoint(&mut self, _: &()) -> usize {
    0
  }

  fn score(&self, &step: &usize) -> Vec<f32> {
    (0..self.num_actions)
      .map(|a| ((a + step) % self.num_actions) as f32)
      .collect()
  }

  fn advance(&mut self, step: &mut usize, _: usize) {
    *step += 1;
  }

  fn clone_checkpoint(&mut self, step: &usize) -> usize {
    *step
  }

  fn dispose(&mut self, _: usize) {}
}

fn setup(kind: SystemKind, notation: &str) -> (TransitionSystem, DependencyTree) {
  let sentence = notation.parse::<AnnotatedSentence>().unwrap();
  let system = TransitionSystem::new(kind, sentence.label_set());
  let gold = sentence.to_tree(system.labels()).unwrap();
  (system, gold)
}

/// Sums the costs of every legal action along the static oracle's path
fn costs_along_oracle(system: &TransitionSystem, gold: &DependencyTree) -> u32 {
  let mut config = Configuration::new(gold.len());
  let mut total = 0;
  for action in system.static_oracle(gold).unwrap() {
    let legal = system.legal_actions(&config).unwrap();
    total += system.dynamic_oracle_costs(&config, &legal, gold).unwrap().iter().sum::<u32>();
    system.apply(&mut config, action).unwrap();
  }
  total
}

fn criterion_benchmark(c: &mut Criterion) {
  for kind in [SystemKind::ArcStandard, SystemKind::ArcEager, SystemKind::ArcHybrid] {
    let (system, gold) = setup(kind, SENTENCE);
    c.bench_function(&format!("{} static oracle", kind), |b| {
      b.iter(|| system.static_oracle(black_box(&gold)).unwrap())
    });
    c.bench_function(&format!("{} costs along oracle", kind), |b| {
      b.iter(|| costs_along_oracle(black_box(&system), black_box(&gold)))
    });
  }

  let (swap, crossing) = setup(SystemKind::Swap, CROSSING);
  c.bench_function("swap static oracle (non-projective)", |b| {
    b.iter(|| swap.static_oracle(black_box(&crossing)).unwrap())
  });

  let (system, gold) = setup(SystemKind::ArcHybrid, SENTENCE);
  let mut scorer = Cycling {
    num_actions: system.num_actions(),
  };
  c.bench_function("archybrid greedy", |b| {
    b.iter(|| system.parse(&mut scorer, &(), black_box(gold.len())).unwrap())
  });
  let settings = BeamConfig::default();
  c.bench_function("archybrid beam 8", |b| {
    b.iter(|| {
      system
        .parse_beam(&mut scorer, &(), black_box(gold.len()), &settings)
        .unwrap()
    })
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
