use std::env;
use std::io;
use std::io::Write;
use std::process;

use shiftreduce::oracle::{matches_gold, replay};
use shiftreduce::{AnnotatedSentence, Configuration, Err, ParserError, System, SystemKind, TransitionSystem};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} SYSTEM [options]

Reads sentences in form:head:label notation from stdin, one per line
(e.g. she:1:nsubj eats:3:root fish:1:obj ROOT:-), and prints the static
oracle of SYSTEM for each of them.

Systems: arcstd, arceager, archybrid, swap

Options:
  -h, --help    Print this message
  -c, --costs   Also print the zero-cost actions at every step",
    prog_name
  )
}

fn explain(kind: SystemKind, line: &str, print_costs: bool) -> Result<(), Err> {
  let sentence: AnnotatedSentence = line.parse()?;
  let system = TransitionSystem::new(kind, sentence.label_set());
  let gold = sentence.to_tree(system.labels())?;

  let actions = system.static_oracle(&gold)?;
  if !matches_gold(&replay(&system, gold.len(), &actions)?, &gold) {
    return Err(format!("{} oracle did not rebuild the tree", system.name()).into());
  }
  println!(
    "{} action{}",
    actions.len(),
    if actions.len() == 1 { "" } else { "s" }
  );

  let mut config = Configuration::new(gold.len());
  for &action in actions.iter() {
    let name = system.action_name(action);
    if print_costs {
      let legal = system.legal_actions(&config)?;
      match system.dynamic_oracle_costs(&config, &legal, &gold) {
        Ok(costs) => {
          let free = legal
            .iter()
            .zip(costs.iter())
            .filter(|(_, c)| **c == 0)
            .map(|(&a, _)| system.action_name(a))
            .collect::<Vec<_>>();
          println!("{:<16} free: {}", name, free.join(" "));
        }
        Err(ParserError::CostsUnsupported(_)) => println!("{}", name),
        Err(e) => return Err(e.into()),
      }
    } else {
      println!("{}", name);
    }
    system.apply(&mut config, action)?;
    debug!(%config, "applied {}", name);
  }

  println!("{}", config);
  Ok(())
}

struct Args {
  system: SystemKind,
  print_costs: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    let mut iter = v.into_iter();
    let Some(prog_name) = iter.next() else {
      return Err(Self::make_error_message("bad argument vector", "cli"));
    };

    let mut system: Option<SystemKind> = None;
    let mut print_costs = false;

    for o in iter {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-c" || o == "--costs" {
        print_costs = true;
      } else if system.is_none() {
        system = Some(
          o.parse()
            .map_err(|e: ParserError| Self::make_error_message(&e.to_string(), &prog_name))?,
        );
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    match system {
      Some(system) => Ok(Self { system, print_costs }),
      None => Err(Self::make_error_message("missing system", prog_name)),
    }
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        if !input.trim().is_empty() {
          if let Err(e) = explain(opts.system, input.trim(), opts.print_costs) {
            eprintln!("error: {}", e);
          }
        }
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
