//! Descriptive analytics over a music listening log joined against a song
//! catalog: favorite genres, average listen time, genre loyalty and night
//! owls. Each result is printed and written to its own output directory.

pub mod error;
pub mod load;
pub mod query;
pub mod report;

use log::info;
use std::path::PathBuf;

pub use error::{AnalysisError, Result};
pub use load::Inputs;
pub use query::Analysis;
pub use report::{OutputFormat, Report};

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub inputs: Inputs,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
}

/// Loads the inputs, evaluates all four queries, then prints and persists
/// the results.
///
/// Nothing is written unless loading and every query succeeded. Outputs are
/// written one after another, so a write failure leaves the outputs written
/// before it in place.
///
/// Configures the polars table formatter to print results untruncated; this
/// sets process-wide environment variables.
pub fn run(settings: &Settings) -> Result<()> {
    report::configure_display();

    info!("loading inputs...");
    let (events, songs) = load::load_inputs(&settings.inputs)?;

    info!("evaluating queries...");
    let analysis = Analysis::evaluate(&events, &songs)?;

    let Analysis {
        favorite_genres,
        avg_listen_time,
        genre_loyalty,
        night_users,
    } = analysis;
    let mut results = [favorite_genres, avg_listen_time, genre_loyalty, night_users];

    for (kind, df) in Report::ALL.iter().zip(results.iter()) {
        report::show(*kind, df);
    }

    info!(
        "writing {} output to {}...",
        settings.format.extension(),
        settings.output_dir.display()
    );
    for (kind, df) in Report::ALL.iter().zip(results.iter_mut()) {
        let dir = settings.output_dir.join(kind.dir_name());
        report::write_report(df, &dir, settings.format)?;
    }
    Ok(())
}
