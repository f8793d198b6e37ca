use crate::pipeline::{run_pipeline, PipelineArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use iv_housing::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Isla Vista Housing",
    about = "Build the Isla Vista rental listings dataset and browse it in a dashboard",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the dashboard HTTP service (default command)
    Serve(ServeArgs),
    /// Extract, geocode, and enrich listings from the availability PDF
    Pipeline(PipelineArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Dataset CSV to serve (defaults to the configured pipeline output)
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::serve(args),
        Command::Pipeline(args) => run_pipeline(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["iv-housing-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn pipeline_flags_parse() {
        let cli = Cli::try_parse_from([
            "iv-housing-api",
            "pipeline",
            "--input",
            "listings.pdf",
            "--output",
            "out/listings.csv",
            "--skip-geocoding",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Pipeline(args)) => {
                assert_eq!(args.input, Some(PathBuf::from("listings.pdf")));
                assert_eq!(args.output, Some(PathBuf::from("out/listings.csv")));
                assert!(args.skip_geocoding);
            }
            other => panic!("expected pipeline command, got {other:?}"),
        }
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "iv-housing-api",
            "serve",
            "--port",
            "8080",
            "--dataset",
            "listings.csv",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.host, None);
                assert_eq!(args.dataset, Some(PathBuf::from("listings.csv")));
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }
}
