use clap::Args;
use iv_housing::config::AppConfig;
use iv_housing::error::AppError;
use iv_housing::{telemetry, ListingPipeline, PipelineSummary};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct PipelineArgs {
    /// Listing PDF to read (defaults to the configured input)
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    /// Where to write the dataset CSV (defaults to the configured output)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Leave coordinates and geo metrics empty instead of calling the geocoder
    #[arg(long)]
    pub(crate) skip_geocoding: bool,
}

pub(crate) fn run_pipeline(mut args: PipelineArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(input) = args.input.take() {
        config.pipeline.input_pdf = input;
    }
    if let Some(output) = args.output.take() {
        config.pipeline.dataset_path = output;
    }

    telemetry::init(&config.telemetry)?;

    let pipeline =
        ListingPipeline::from_config(config.pipeline, &config.geocoder, args.skip_geocoding)?;
    let summary = pipeline.run()?;
    render_summary(&summary);
    Ok(())
}

fn render_summary(summary: &PipelineSummary) {
    println!("Listing pipeline complete");
    println!("  Lines read: {}", summary.lines);
    println!(
        "  Listings extracted: {} ({} lines dropped)",
        summary.extracted, summary.rejected
    );
    println!(
        "  Unique listings: {} ({} duplicates replaced)",
        summary.unique, summary.replaced
    );
    println!(
        "  Geocoded: {} of {} ({} provider calls)",
        summary.geocoded, summary.unique, summary.geocoder_calls
    );
    println!("  Dataset: {}", summary.output.display());
}
