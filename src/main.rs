use clap::Parser;
use takeout_dates::args::Args;
use takeout_dates::exiftool::ExifToolCli;
use takeout_dates::processor::Processor;
use takeout_dates::updater::UpdateOptions;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    // Set up logging; RUST_LOG overrides --verbose
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let root = args.resolve_root()?;

    let exiftool = ExifToolCli::new(&args.exiftool);
    let version = exiftool.check_available()?;
    debug!("Using {} {}", exiftool.program(), version);

    let options = UpdateOptions {
        update_file_timestamp: !args.keep_file_time,
    };
    let mut processor = Processor::new(exiftool, options);
    processor.process_directory(&root)?;

    Ok(())
}
