//! q CLI - route a batch of JSON messages and print the resulting queues.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use q::{AppConfig, OutputFormat, QueueRecord, Router};

#[derive(Parser)]
#[command(name = "q")]
#[command(version, about = "Transform, dispatch and reassemble JSON messages into five queues", long_about = None)]
struct Cli {
    /// Path to a YAML config file (defaults plus environment otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enqueue every line of the input, then drain all queues in order
    Route {
        /// Input file with one JSON message per line ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output layout
        #[arg(short, long, value_enum, default_value_t = Format::Ndjson)]
        format: Format,
    },

    /// Print the transform chain and dispatch rules
    Rules,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Ndjson,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Ndjson => OutputFormat::Ndjson,
            Format::Json => OutputFormat::JsonArray,
        }
    }
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => AppConfig::from_env(),
    };

    init_tracing(&config.logging.filter);

    let router = Router::new(config.router.clone());

    let result = match cli.command {
        Commands::Route {
            input,
            output,
            format,
        } => route(&router, &input, output.as_deref(), format.into()),
        Commands::Rules => {
            print_rules(&router);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn route(
    router: &Router,
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<(), String> {
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(input)
            .map_err(|e| format!("Failed to open {}: {}", input.display(), e))?;
        Box::new(BufReader::new(file))
    };

    let mut accepted: usize = 0;
    let mut failed: usize = 0;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Failed to read input: {}", e))?;
        if line.trim().is_empty() {
            continue;
        }
        match router.enqueue(&line) {
            Ok(delivery) => {
                accepted += 1;
                tracing::debug!(line = line_num + 1, queue = delivery.queue(), "accepted");
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(line = line_num + 1, error = %e, "rejected message");
            }
        }
    }

    let records = router
        .drain_all()
        .into_iter()
        .map(|(queue, encoded)| QueueRecord::from_encoded(queue, &encoded))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).map_err(|e| format!("Failed to create {}: {}", path.display(), e))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    q::serialization::write_records(writer, &records, format).map_err(|e| e.to_string())?;

    tracing::info!(
        accepted,
        failed,
        delivered = records.len(),
        buffered = accepted.saturating_sub(records.len()),
        "routing complete"
    );
    Ok(())
}

fn print_rules(router: &Router) {
    println!("Transforms (applied in order):");
    for (i, name) in router.transforms().names().iter().enumerate() {
        println!("  {}. {}", i + 1, name);
    }

    println!("Dispatch rules (first match wins):");
    let chain = router.dispatch_chain();
    for (i, rule) in chain.rules().iter().enumerate() {
        println!("  {}. {} -> queue {}", i + 1, rule.name(), rule.queue());
    }
    println!("  *  fallback -> queue {}", chain.fallback());

    println!("Digest: {}", router.config().digest_algorithm);
}
