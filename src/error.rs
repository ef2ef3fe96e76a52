//! Ошибки конвейера предобработки

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Этап конвейера, на котором произошла ошибка
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Preprocess,
    Balance,
    SelectFeatures,
    Align,
    Save,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Load => "loading data",
            Stage::Preprocess => "preprocessing data",
            Stage::Balance => "balancing data",
            Stage::SelectFeatures => "feature selection",
            Stage::Align => "aligning test columns",
            Stage::Save => "saving data",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Причина ошибки внутри этапа
#[derive(Debug, Error)]
pub enum StageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("table has no columns")]
    NoColumns,

    #[error("data frame error: {0}")]
    Frame(#[from] polars::prelude::PolarsError),

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("column '{0}' is not numeric")]
    NonNumericColumn(String),

    #[error("missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("label value {value} in row {row} is not a non-negative integer")]
    InvalidLabel { value: f64, row: usize },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("need samples of at least two classes, found {0}")]
    SingleClass(usize),

    #[error("class {class} has {found} samples, at least {required} needed for {k} neighbours")]
    TooFewSamples {
        class: usize,
        found: usize,
        required: usize,
        k: usize,
    },

    #[error("value '{value}' in column '{column}' was not seen when fitting")]
    UnseenCategory { column: String, value: String },

    #[error("encoder not fitted")]
    NotFitted,

    #[error("model error: {0}")]
    Model(String),
}

/// Ошибка конвейера: этап + исходная причина
#[derive(Debug, Error)]
#[error("error while {stage}: {source}")]
pub struct ProcessingError {
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

impl ProcessingError {
    pub fn new(stage: Stage, source: StageError) -> Self {
        Self { stage, source }
    }
}

pub type Result<T, E = ProcessingError> = std::result::Result<T, E>;

/// Расширение для `Result<T, StageError>`: логирует ошибку и помечает этап
pub trait StageResultExt<T> {
    fn at_stage(self, stage: Stage) -> Result<T>;
}

impl<T> StageResultExt<T> for std::result::Result<T, StageError> {
    fn at_stage(self, stage: Stage) -> Result<T> {
        self.map_err(|source| {
            tracing::error!(stage = %stage, "Error during {} step: {}", stage, source);
            ProcessingError::new(stage, source)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_stage_and_cause() {
        let err = ProcessingError::new(Stage::Balance, StageError::SingleClass(1));
        assert_eq!(
            err.to_string(),
            "error while balancing data: need samples of at least two classes, found 1"
        );
    }

    #[test]
    fn test_at_stage_tags_error() {
        let res: std::result::Result<(), StageError> =
            Err(StageError::ColumnNotFound("Booking_ID".to_string()));
        let err = res.at_stage(Stage::Preprocess).unwrap_err();
        assert_eq!(err.stage, Stage::Preprocess);
        assert!(matches!(err.source, StageError::ColumnNotFound(ref c) if c == "Booking_ID"));
    }
}
