/// Балансировка классов и отбор признаков

pub mod feature_selection;
pub mod oversampling;
pub mod random_forest;

pub use feature_selection::{align_columns, FeatureSelector, Selection};
pub use oversampling::Smote;
pub use random_forest::RandomForest;

use ndarray::Array1;
use polars::prelude::DataFrame;

use crate::error::StageError;
use crate::frame::{column_names, numeric_values};

/// Метки класса из закодированного столбца: целые неотрицательные числа
pub(crate) fn class_labels(df: &DataFrame, label: &str) -> Result<Array1<usize>, StageError> {
    numeric_values(df, label)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
                Ok(value as usize)
            } else {
                Err(StageError::InvalidLabel { value, row })
            }
        })
        .collect()
}

/// Все столбцы таблицы, кроме метки
pub(crate) fn feature_names(df: &DataFrame, label: &str) -> Vec<String> {
    column_names(df)
        .into_iter()
        .filter(|name| name != label)
        .collect()
}
