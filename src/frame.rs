//! Вспомогательные операции над polars `DataFrame`

use ndarray::Array2;
use polars::prelude::*;

use crate::error::StageError;

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names_owned()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, StageError> {
    match df.get_column_index(name) {
        Some(idx) => Ok(&df.get_columns()[idx]),
        None => Err(StageError::ColumnNotFound(name.to_string())),
    }
}

pub fn is_text(column: &Column) -> bool {
    column.dtype() == &DataType::String
}

/// Числовые значения столбца; null становится NaN
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, StageError> {
    let column = require_column(df, name)?;
    if is_text(column) {
        return Err(StageError::NonNumericColumn(name.to_string()));
    }
    let values = column.cast(&DataType::Float64)?;
    Ok(values
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Удаляет столбцы; отсутствующий столбец - ошибка, исходная таблица не меняется
pub fn drop_columns(df: &DataFrame, names: &[String]) -> Result<DataFrame, StageError> {
    for name in names {
        require_column(df, name)?;
    }
    Ok(df.drop_many(names.iter().map(String::as_str)))
}

/// Удаляет повторяющиеся строки, оставляя первое вхождение в исходном порядке
pub fn drop_duplicates(df: &DataFrame) -> Result<DataFrame, StageError> {
    Ok(df.unique_stable(None, UniqueKeepStrategy::First, None)?)
}

/// Новая таблица из указанных столбцов в указанном порядке
pub fn select_columns(df: &DataFrame, names: &[String]) -> Result<DataFrame, StageError> {
    for name in names {
        require_column(df, name)?;
    }
    Ok(df.select(names.iter().map(String::as_str))?)
}

/// Матрица признаков для linfa; текст и пропуски недопустимы
pub fn numeric_matrix(df: &DataFrame, names: &[String]) -> Result<Array2<f64>, StageError> {
    let mut matrix = Array2::zeros((df.height(), names.len()));

    for (j, name) in names.iter().enumerate() {
        for (i, value) in numeric_values(df, name)?.into_iter().enumerate() {
            if value.is_nan() {
                return Err(StageError::MissingValue {
                    column: name.clone(),
                    row: i,
                });
            }
            matrix[[i, j]] = value;
        }
    }

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "id" => [1.0, 2.0, 3.0, 4.0],
            "kind" => ["a", "b", "a", "b"],
            "value" => [Some(0.5), None, Some(0.5), None]
        )
        .unwrap()
    }

    #[test]
    fn test_drop_columns_then_duplicates() {
        let df = drop_columns(&sample(), &["id".to_string()]).unwrap();
        assert_eq!(column_names(&df), vec!["kind", "value"]);

        // Пропуски считаются равными друг другу
        let df = drop_duplicates(&df).unwrap();
        assert_eq!(df.height(), 2);
        let kind: Vec<Option<&str>> =
            df.column("kind").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(kind, vec![Some("a"), Some("b")]);
    }

    #[test]
    fn test_drop_missing_column_is_error() {
        let df = sample();
        let err = drop_columns(&df, &["kind".to_string(), "Booking_ID".to_string()]).unwrap_err();
        assert!(matches!(err, StageError::ColumnNotFound(ref c) if c == "Booking_ID"));
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_select_reorders() {
        let selected = select_columns(&sample(), &["value".to_string(), "id".to_string()]).unwrap();
        assert_eq!(column_names(&selected), vec!["value", "id"]);
        assert_eq!(selected.height(), 4);

        let err = select_columns(&sample(), &["market_segment_type".to_string()]).unwrap_err();
        assert!(matches!(err, StageError::ColumnNotFound(_)));
    }

    #[test]
    fn test_numeric_matrix_rejects_text_and_missing() {
        let df = sample();
        assert!(matches!(
            numeric_matrix(&df, &["kind".to_string()]),
            Err(StageError::NonNumericColumn(_))
        ));
        assert!(matches!(
            numeric_matrix(&df, &["value".to_string()]),
            Err(StageError::MissingValue { row: 1, .. })
        ));

        let matrix = numeric_matrix(&df, &["id".to_string()]).unwrap();
        assert_eq!(matrix.shape(), &[4, 1]);
        assert_eq!(matrix[[3, 0]], 4.0);
    }
}
