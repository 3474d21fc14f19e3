//! weir pipeline runner.
//!
//! Runs one producer and N quota-bound consumers around a shared bounded
//! queue and prints what each consumer received.
//!
//! # Usage
//!
//! ```sh
//! weir --items 10 --consumers 5 --quota 2 --capacity 10
//! ```

use weir::runtime::{ConfigError, Pipeline, PipelineConfig};

/// Default queue capacity.
const DEFAULT_CAPACITY: usize = 10;

/// Default number of items to produce.
const DEFAULT_ITEMS: u64 = 10;

/// Default number of consumer threads.
const DEFAULT_CONSUMERS: usize = 5;

/// Default per-consumer quota.
const DEFAULT_QUOTA: u64 = 2;

fn main() {
    weir::init_tracing();

    if let Err(e) = run() {
        eprintln!("weir: {e}");
        std::process::exit(1);
    }
}

/// Error terminating the runner.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// A flag was missing its value or could not be parsed.
    #[error("invalid usage: {0}")]
    Usage(String),
    /// The parsed configuration failed pipeline validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn run() -> Result<(), CliError> {
    let args: Vec<String> = std::env::args().collect();
    let config = parse_args(&args)?;

    eprintln!(
        "weir: producing {} items for {} consumer(s) (quota {}, capacity {})",
        config.items, config.consumers, config.quota, config.capacity
    );

    let pipeline = Pipeline::spawn(config)?;
    let summary = pipeline.join();

    for (id, receipt) in summary.receipts.iter().enumerate() {
        println!("consumer {id}: {receipt:?}");
    }
    if !summary.leftover.is_empty() {
        println!("leftover: {:?}", summary.leftover);
    }
    eprintln!(
        "weir: done ({} produced, {} consumed, {} leftover)",
        summary.produced,
        summary.consumed(),
        summary.leftover.len()
    );

    Ok(())
}

/// Parses command line arguments into a PipelineConfig.
fn parse_args(args: &[String]) -> Result<PipelineConfig, CliError> {
    let mut config = PipelineConfig {
        capacity: DEFAULT_CAPACITY,
        items: DEFAULT_ITEMS,
        consumers: DEFAULT_CONSUMERS,
        quota: DEFAULT_QUOTA,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--items" | "-n" => {
                config.items = parse_value(args, &mut i)?;
            }
            "--consumers" | "-c" => {
                config.consumers = parse_value(args, &mut i)?;
            }
            "--quota" | "-q" => {
                config.quota = parse_value(args, &mut i)?;
            }
            "--capacity" | "-b" => {
                config.capacity = parse_value(args, &mut i)?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg => {
                return Err(CliError::Usage(format!("unknown argument: {arg}")));
            }
        }
        i += 1;
    }

    Ok(config)
}

/// Consumes the value following the flag at `args[*i]`.
fn parse_value<T: std::str::FromStr>(args: &[String], i: &mut usize) -> Result<T, CliError>
where
    T::Err: std::fmt::Display,
{
    let flag = &args[*i];
    *i += 1;
    let Some(raw) = args.get(*i) else {
        return Err(CliError::Usage(format!("missing value for {flag}")));
    };
    raw.parse()
        .map_err(|e| CliError::Usage(format!("bad value for {flag}: {e}")))
}

fn print_usage() {
    eprintln!(
        r#"weir - bounded producer/consumer pipeline runner

USAGE:
    weir [OPTIONS]

OPTIONS:
    -n, --items <N>       Items to produce (default: 10)
    -c, --consumers <N>   Consumer threads (default: 5)
    -q, --quota <N>       Items each consumer pops (default: 2)
    -b, --capacity <N>    Queue capacity (default: 10)
    -h, --help            Print this help message

EXAMPLE:
    weir --items 10 --consumers 3 --quota 2
    weir -n 100 -c 10 -q 10 -b 4
"#
    );
}
