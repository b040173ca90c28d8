use clap::ValueEnum;
use log::{debug, info};
use polars::prelude::{
    CsvWriter, DataFrame, JsonFormat, JsonWriter, ParquetWriter, PolarsResult, SerWriter,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

/// Flat format every result is persisted in. One setting covers all outputs.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma separated with a header row
    #[default]
    Csv,
    /// Newline delimited JSON objects
    Json,
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Parquet => "parquet",
        }
    }

    fn encode(self, file: File, df: &mut DataFrame) -> PolarsResult<()> {
        match self {
            OutputFormat::Csv => CsvWriter::new(file).has_header(true).finish(df),
            OutputFormat::Json => JsonWriter::new(file)
                .with_json_format(JsonFormat::JsonLines)
                .finish(df),
            OutputFormat::Parquet => {
                ParquetWriter::new(file).finish(df)?;
                Ok(())
            }
        }
    }
}

/// The four result sets, named after their destination directories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Report {
    FavoriteGenres,
    AvgListenTime,
    GenreLoyalty,
    NightUsers,
}

impl Report {
    pub const ALL: [Report; 4] = [
        Report::FavoriteGenres,
        Report::AvgListenTime,
        Report::GenreLoyalty,
        Report::NightUsers,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Report::FavoriteGenres => "user_favorite_genres",
            Report::AvgListenTime => "avg_listen_time_per_song",
            Report::GenreLoyalty => "genre_loyalty_scores",
            Report::NightUsers => "night_users",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Report::FavoriteGenres => "User favorite genres",
            Report::AvgListenTime => "Average listen time per song",
            Report::GenreLoyalty => "Genre loyalty scores",
            Report::NightUsers => "Users listening between 00:00 and 05:59",
        }
    }
}

/// Name of the single file written inside each output directory.
pub fn part_file_name(format: OutputFormat) -> String {
    format!("part-00000.{}", format.extension())
}

/// Lets the table formatter print every row and the full width of every
/// value. Sets process-wide environment variables; [`crate::run`] calls it
/// before the first frame is displayed.
pub fn configure_display() {
    const UNLIMITED: &str = "2147483647";
    std::env::set_var("POLARS_FMT_MAX_ROWS", UNLIMITED);
    std::env::set_var("POLARS_FMT_MAX_COLS", UNLIMITED);
    std::env::set_var("POLARS_FMT_STR_LEN", UNLIMITED);
}

pub fn show(report: Report, df: &DataFrame) {
    println!("{}:", report.title());
    println!("{df}");
}

/// Replaces whatever is at `dir` with a directory holding `df` in `format`.
/// Returns the path of the written part file.
pub fn write_report(df: &mut DataFrame, dir: &Path, format: OutputFormat) -> Result<PathBuf> {
    let io_error = |source| AnalysisError::OutputIo {
        path: dir.to_path_buf(),
        source,
    };
    if dir.is_dir() {
        debug!("removing previous output at {}", dir.display());
        fs::remove_dir_all(dir).map_err(io_error)?;
    } else if dir.exists() {
        fs::remove_file(dir).map_err(io_error)?;
    }
    fs::create_dir_all(dir).map_err(io_error)?;

    let path = dir.join(part_file_name(format));
    let file = File::create(&path).map_err(|source| AnalysisError::OutputIo {
        path: path.clone(),
        source,
    })?;
    format
        .encode(file, df)
        .map_err(|source| AnalysisError::OutputEncode {
            path: path.clone(),
            source,
        })?;
    info!("wrote {} rows to {}", df.height(), path.display());
    Ok(path)
}
