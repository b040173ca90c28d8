use chrono::{NaiveDateTime, Timelike};
use polars::lazy::dsl::GetOutput;
use polars::prelude::{
    col, BooleanChunked, DataFrame, DataType, Expr, Float64Chunked, IntoLazy, IntoSeries,
    LazyFrame, PolarsResult, Series, SortOptions, UniqueKeepStrategy,
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NIGHT_HOURS: std::ops::RangeInclusive<u32> = 0..=5;

/// Rounds half-up (away from zero) on the shortest decimal form of `value`,
/// so 1.005 becomes 1.01 even though its binary value is slightly below.
pub fn round_half_up(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let repr = value.abs().to_string();
    let (whole, fraction) = repr.split_once('.').unwrap_or((repr.as_str(), ""));
    if fraction.len() <= decimals {
        return value;
    }
    let kept = format!("{whole}{}", &fraction[..decimals]);
    let Ok(mut scaled) = kept.parse::<u128>() else {
        return value;
    };
    if fraction.as_bytes()[decimals] >= b'5' {
        scaled += 1;
    }
    let rounded = scaled as f64 / 10f64.powi(decimals as i32);
    if value.is_sign_negative() {
        -rounded
    } else {
        rounded
    }
}

fn rounded(expr: Expr, decimals: usize) -> Expr {
    expr.map(
        move |s: Series| {
            let out: Float64Chunked = s
                .f64()?
                .into_iter()
                .map(|v| v.map(|v| round_half_up(v, decimals)))
                .collect();
            Ok(Some(out.into_series()))
        },
        GetOutput::from_type(DataType::Float64),
    )
}

/// Plays per (user_id, genre) over events that match a catalog entry.
pub fn genre_play_counts(events: LazyFrame, songs: LazyFrame) -> LazyFrame {
    let catalog = songs.select(&[col("song_id"), col("genre")]);
    events
        .inner_join(catalog, col("song_id"), col("song_id"))
        .groupby([col("user_id"), col("genre")])
        .agg([col("song_id").count().cast(DataType::Int64).alias("plays")])
}

/// Every (user_id, genre, plays) row whose count equals that user's maximum.
/// Ties are all kept.
fn top_genres(counts: LazyFrame) -> LazyFrame {
    let maxima = counts
        .clone()
        .groupby([col("user_id")])
        .agg([col("plays").max().alias("max_plays")]);
    counts
        .inner_join(maxima, col("user_id"), col("user_id"))
        .filter(col("plays").eq(col("max_plays")))
        .select(&[col("user_id"), col("genre"), col("plays")])
}

pub fn favorite_genres(events: LazyFrame, songs: LazyFrame) -> LazyFrame {
    top_genres(genre_play_counts(events, songs))
        .select(&[
            col("user_id"),
            col("genre").alias("favorite_genre"),
            col("plays"),
        ])
        .sort_by_exprs([col("user_id"), col("favorite_genre")], [false, false], false)
}

/// Mean listen duration per song, including songs missing from the catalog.
/// Durations that do not parse as numbers are excluded from the mean.
pub fn avg_listen_time(events: LazyFrame, songs: LazyFrame) -> LazyFrame {
    let averages = events.groupby([col("song_id")]).agg([col("duration_sec")
        .cast(DataType::Float64)
        .mean()
        .alias("mean_seconds")]);
    let catalog = songs.select(&[col("song_id"), col("title"), col("artist"), col("genre")]);
    averages
        .left_join(catalog, col("song_id"), col("song_id"))
        .select(&[
            col("song_id"),
            col("title"),
            col("artist"),
            col("genre"),
            rounded(col("mean_seconds"), 2).alias("avg_listen_seconds"),
        ])
        .sort(
            "avg_listen_seconds",
            SortOptions {
                descending: true,
                nulls_last: true,
                ..Default::default()
            },
        )
}

pub fn genre_loyalty(events: LazyFrame, songs: LazyFrame) -> LazyFrame {
    let counts = genre_play_counts(events, songs);
    let totals = counts
        .clone()
        .groupby([col("user_id")])
        .agg([col("plays").sum().alias("total_plays")]);
    top_genres(counts)
        .inner_join(totals, col("user_id"), col("user_id"))
        .select(&[
            col("user_id"),
            col("genre").alias("top_genre"),
            col("plays").alias("top_genre_plays"),
            col("total_plays"),
            rounded(
                col("plays").cast(DataType::Float64) / col("total_plays").cast(DataType::Float64),
                3,
            )
            .alias("loyalty_score"),
        ])
        .sort_by_exprs([col("user_id"), col("top_genre")], [false, false], false)
}

/// True when `timestamp` parses with [`TIMESTAMP_FORMAT`] and its hour is
/// between midnight and 05:59.
pub fn is_night_hour(timestamp: &str) -> bool {
    NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT)
        .map(|at| NIGHT_HOURS.contains(&at.hour()))
        .unwrap_or(false)
}

/// Distinct users with at least one event during night hours.
pub fn night_users(events: LazyFrame) -> LazyFrame {
    let at_night = col("timestamp").map(
        |s: Series| {
            let mask: BooleanChunked = s
                .utf8()?
                .into_iter()
                .map(|ts| Some(ts.map_or(false, is_night_hour)))
                .collect();
            Ok(Some(mask.into_series()))
        },
        GetOutput::from_type(DataType::Boolean),
    );
    events
        .filter(at_night)
        .select(&[col("user_id")])
        .unique(None, UniqueKeepStrategy::First)
        .sort("user_id", SortOptions::default())
}

/// The four result relations of one run.
pub struct Analysis {
    pub favorite_genres: DataFrame,
    pub avg_listen_time: DataFrame,
    pub genre_loyalty: DataFrame,
    pub night_users: DataFrame,
}

impl Analysis {
    /// Evaluates all four queries against the loaded relations.
    pub fn evaluate(events: &DataFrame, songs: &DataFrame) -> PolarsResult<Self> {
        let events = events.clone().lazy();
        let songs = songs.clone().lazy();
        Ok(Self {
            favorite_genres: favorite_genres(events.clone(), songs.clone()).collect()?,
            avg_listen_time: avg_listen_time(events.clone(), songs.clone()).collect()?,
            genre_loyalty: genre_loyalty(events.clone(), songs).collect()?,
            night_users: night_users(events).collect()?,
        })
    }
}
