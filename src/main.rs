#![deny(missing_docs)]

//! Standalone entry point that runs churn data ingestion once.
use std::path::PathBuf;
use std::process::ExitCode;

use churnpipe::config::resolve_settings;
use churnpipe::ingestion::DataIngestion;
use churnpipe::logging;
use churnpipe::provider::KaggleProvider;

/// Parsed command-line flags.
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    // Dropped on return, which flushes the log file.
    let log_handle = match logging::init() {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("Logging disabled: {err}");
            None
        }
    };
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if log_handle.is_some() {
                tracing::error!("{err}");
            } else {
                eprintln!("{err}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let Some(cli) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    let cwd = std::env::current_dir().map_err(|err| format!("No working directory: {err}"))?;
    let settings = resolve_settings(cli.config.as_deref(), &cwd).map_err(|err| err.to_string())?;

    tracing::info!("Running data ingestion as a standalone step.");
    let provider =
        KaggleProvider::new(&settings.kaggle.api_base).map_err(|err| err.to_string())?;
    let output = DataIngestion::new(settings.ingestion_config(), provider)
        .split_options(settings.split_options())
        .run()
        .map_err(|err| format!("Data ingestion failed: {err}"))?;
    let (train, test) = output.paths();
    tracing::info!(
        "Data ingestion successful.\tTrain: \"{}\"\tTest: \"{}\"",
        train.display(),
        test.display()
    );
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Option<CliArgs>, String> {
    let mut cli = CliArgs::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                cli.config = Some(PathBuf::from(value));
            }
            other => return Err(format!("Unknown argument: {other}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(Some(cli))
}

fn help_text() -> &'static str {
    "Usage: churnpipe [--config <path>]\n\n\
     Downloads the raw churn dataset if missing, drops duplicate rows, and writes\n\
     02_Intermediate/train.csv and 02_Intermediate/test.csv under the data root.\n\
     Without --config, churnpipe.toml in the working directory is used when present."
}
