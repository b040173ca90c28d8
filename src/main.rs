use anyhow::Result;
use clap::{Args, Parser};
use std::path::PathBuf;

use listening_analytics::{Inputs, OutputFormat, Settings};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Favorite genres, listen times, genre loyalty and night owls from a
/// listening log and a song catalog.
#[derive(Parser, Debug)]
struct Configuration {
    #[command(flatten)]
    files: Files,
    /// Root directory receiving one subdirectory per result
    #[arg(long, default_value = "output")]
    output: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct Files {
    /// CSV with user_id, song_id, timestamp, duration_sec
    #[arg(long, default_value = "./listening_logs.csv")]
    listening_logs: PathBuf,
    /// CSV with song_id, title, artist, genre
    #[arg(long, default_value = "./songs_metadata.csv")]
    songs: PathBuf,
}

impl From<Configuration> for Settings {
    fn from(config: Configuration) -> Self {
        Settings {
            inputs: Inputs {
                listening_logs: config.files.listening_logs,
                songs: config.files.songs,
            },
            output_dir: config.output,
            format: config.format,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::debug!("parsing arguments...");
    let config = Configuration::try_parse()?;

    listening_analytics::run(&config.into())?;
    Ok(())
}
