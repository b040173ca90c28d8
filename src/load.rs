use log::{debug, info};
use polars::prelude::{
    DataFrame, DataType, Field, LazyCsvReader, LazyFileListReader, LazyFrame, PolarsError,
    PolarsResult, Schema,
};
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

pub const LISTENING_LOG_COLUMNS: [&str; 4] = ["user_id", "song_id", "timestamp", "duration_sec"];
pub const SONG_COLUMNS: [&str; 4] = ["song_id", "title", "artist", "genre"];

/// Locations of the two input tables.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub listening_logs: PathBuf,
    pub songs: PathBuf,
}

/// Loads the event log. Every required column is read as a string; the
/// queries cast durations themselves so one bad value cannot retype the
/// whole column.
pub fn load_listening_logs(path: &Path) -> Result<DataFrame> {
    let logs = read_csv(path, &LISTENING_LOG_COLUMNS, &LISTENING_LOG_COLUMNS)?;
    info!("loaded {} listening events from {}", logs.height(), path.display());
    Ok(logs)
}

pub fn load_songs(path: &Path) -> Result<DataFrame> {
    let songs = read_csv(path, &SONG_COLUMNS, &["song_id"])?;
    info!("loaded {} catalog entries from {}", songs.height(), path.display());
    Ok(songs)
}

/// Loads both inputs, events first.
pub fn load_inputs(inputs: &Inputs) -> Result<(DataFrame, DataFrame)> {
    let logs = load_listening_logs(&inputs.listening_logs)?;
    let songs = load_songs(&inputs.songs)?;
    Ok((logs, songs))
}

/// Rejects files where any record has a different number of fields than the
/// header. The polars reader pads short rows with nulls instead.
fn check_row_widths(path: &Path) -> Result<()> {
    let format_error = |source: csv::Error| AnalysisError::InputFormat {
        path: path.to_path_buf(),
        source: source.into(),
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .map_err(format_error)?;
    for record in reader.records() {
        record.map_err(format_error)?;
    }
    Ok(())
}

fn scan(path: &Path, overwrite: Option<&Schema>) -> PolarsResult<LazyFrame> {
    LazyCsvReader::new(path)
        .has_header(true)
        .with_dtype_overwrite(overwrite)
        .finish()
}

/// Checks the header for `required` before materializing the file with
/// `string_columns` pinned to Utf8 and everything else inferred.
fn read_csv(path: &Path, required: &[&str], string_columns: &[&str]) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(AnalysisError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    let format_error = |source: PolarsError| AnalysisError::InputFormat {
        path: path.to_path_buf(),
        source: source.into(),
    };
    check_row_widths(path)?;

    let inferred = scan(path, None)
        .and_then(|csv| csv.schema())
        .map_err(format_error)?;
    if let Some(missing) = required.iter().find(|name| inferred.get(name).is_none()) {
        return Err(AnalysisError::MissingColumn {
            path: path.to_path_buf(),
            column: missing.to_string(),
        });
    }

    let overwrite: Schema = string_columns
        .iter()
        .map(|name| Field::new(name, DataType::Utf8))
        .collect();
    let df = scan(path, Some(&overwrite))
        .and_then(|csv| csv.collect())
        .map_err(format_error)?;
    debug!("{}: schema {:?}", path.display(), df.schema());
    Ok(df)
}
