use std::{process::ExitCode, time::Instant};

use capsa::{
    LifecycleTracer, LimitedTracker, NoLimitTracker, NoopTracer, Object, ResourceLimits, ResourceTracker, Session,
    StderrTracer,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "capsa")]
#[command(about = "Drive stepped iterators and Point capsules through the capsa function table.", long_about = None)]
#[command(version)]
struct Cli {
    /// Print the iterator and capsule lifecycle to stderr.
    #[arg(long, global = true)]
    trace: bool,

    /// Refuse payload allocations once N have been made.
    #[arg(long, value_name = "N", global = true)]
    max_allocations: Option<usize>,

    /// Refuse payload allocations that would exceed BYTES live bytes.
    #[arg(long, value_name = "BYTES", global = true)]
    max_memory: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn limits(&self) -> ResourceLimits {
        let mut limits = ResourceLimits::new();
        if let Some(max) = self.max_allocations {
            limits = limits.max_allocations(max);
        }
        if let Some(max) = self.max_memory {
            limits = limits.max_memory(max);
        }
        limits
    }
}

#[derive(clap::Subcommand, Debug, PartialEq)]
enum Command {
    /// Print START, START+STEP, ... up to the exclusive STOP as a JSON array.
    #[command(allow_negative_numbers = true)]
    Range { start: i64, stop: i64, step: Option<i64> },
    /// Create a Point capsule, print it as a JSON object, then release it.
    #[command(allow_negative_numbers = true)]
    Point { x: i64, y: i64, name: String },
    /// Drain a JSON list, string or object and print the items.
    Iterate {
        #[arg(value_parser = parse_json)]
        json: serde_json::Value,
    },
}

fn parse_json(value: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(value).map_err(|err| format!("invalid JSON: {err}"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let limits = cli.limits();
    let limited = limits != ResourceLimits::default();
    match (limited, cli.trace) {
        (false, false) => run(Session::new(NoLimitTracker, NoopTracer), cli),
        (false, true) => run(Session::new(NoLimitTracker, StderrTracer::new()), cli),
        (true, false) => run(Session::new(LimitedTracker::new(limits), NoopTracer), cli),
        (true, true) => run(Session::new(LimitedTracker::new(limits), StderrTracer::new()), cli),
    }
}

fn run<T: ResourceTracker, Tr: LifecycleTracer>(mut session: Session<T, Tr>, cli: Cli) -> ExitCode {
    let start = Instant::now();
    let result = match cli.command {
        Command::Range { start, stop, step } => {
            let mut args = vec![Object::Int(start), Object::Int(stop)];
            args.extend(step.map(Object::Int));
            call(&mut session, "range_iterator", args).and_then(|it| call(&mut session, "iterate", vec![it]))
        }
        Command::Point { x, y, name } => {
            let args = vec![Object::Int(x), Object::Int(y), Object::String(name)];
            call(&mut session, "create_point", args).and_then(|capsule| {
                let point = call(&mut session, "get_point", vec![capsule.clone()])?;
                call(&mut session, "release_point", vec![capsule])?;
                Some(point)
            })
        }
        Command::Iterate { json } => match Object::from_json(json) {
            Ok(iterable) => call(&mut session, "iterate", vec![iterable]),
            Err(exc) => {
                session.errors_mut().set(exc);
                None
            }
        },
    };
    let elapsed = start.elapsed();

    let Some(value) = result else {
        if let Some(exc) = session.errors_mut().fetch() {
            eprintln!("error: {exc}");
        }
        return ExitCode::FAILURE;
    };
    if cli.trace {
        let stats = session.heap_stats();
        eprintln!("success after: {elapsed:?}, {} live objects", stats.live_objects);
    }
    println!("{}", value.to_json());
    ExitCode::SUCCESS
}

/// Calls a table function, returning `None` when it set the error indicator.
fn call<T: ResourceTracker, Tr: LifecycleTracer>(
    session: &mut Session<T, Tr>,
    name: &str,
    args: Vec<Object>,
) -> Option<Object> {
    let result = session.call(name, args);
    if session.errors().occurred().is_some() { None } else { result }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind as ClapErrorKind;
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("capsa").chain(args.iter().copied()))
    }

    #[test]
    fn range_step_is_optional() {
        let cli = parse(&["range", "0", "5"]).unwrap();
        assert_eq!(cli.command, Command::Range { start: 0, stop: 5, step: None });
        let cli = parse(&["range", "10", "0", "-2"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Range {
                start: 10,
                stop: 0,
                step: Some(-2)
            }
        );
    }

    #[test]
    fn range_arity_is_checked() {
        assert_eq!(
            parse(&["range", "0"]).unwrap_err().kind(),
            ClapErrorKind::MissingRequiredArgument
        );
        assert_eq!(
            parse(&["range", "0", "1", "2", "3"]).unwrap_err().kind(),
            ClapErrorKind::UnknownArgument
        );
        assert_eq!(parse(&["range", "a", "1"]).unwrap_err().kind(), ClapErrorKind::ValueValidation);
    }

    #[test]
    fn bad_json_is_rejected() {
        let err = parse(&["iterate", "[1, 2"]).unwrap_err();
        assert_eq!(err.kind(), ClapErrorKind::ValueValidation);
        let cli = parse(&["iterate", r#"{"a": 1}"#]).unwrap();
        assert_eq!(
            cli.command,
            Command::Iterate {
                json: serde_json::json!({"a": 1})
            }
        );
    }

    #[test]
    fn limit_flags_build_resource_limits() {
        let cli = parse(&["--max-memory", "64", "point", "1", "-2", "p", "--max-allocations", "3"]).unwrap();
        assert_eq!(cli.limits(), ResourceLimits::new().max_allocations(3).max_memory(64));
        assert_eq!(
            cli.command,
            Command::Point {
                x: 1,
                y: -2,
                name: "p".to_owned()
            }
        );
        assert_eq!(parse(&["range", "0", "1"]).unwrap().limits(), ResourceLimits::default());
    }

    #[test]
    fn command_is_required() {
        assert!(parse(&["--trace"]).is_err());
    }
}
