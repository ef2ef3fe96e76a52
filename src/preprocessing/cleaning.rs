//! Удаление служебных столбцов и дубликатов

use polars::prelude::DataFrame;

use crate::error::StageError;
use crate::frame::{drop_columns, drop_duplicates};

/// Удаляет столбцы индекса/идентификатора, затем повторяющиеся строки.
/// Возвращает очищенную таблицу и число удаленных дубликатов.
pub fn drop_identifiers_and_duplicates(
    df: &DataFrame,
    columns: &[String],
) -> Result<(DataFrame, usize), StageError> {
    tracing::info!("Dropping the columns {:?}", columns);
    let df = drop_columns(df, columns)?;

    let before = df.height();
    let df = drop_duplicates(&df)?;
    let removed = before - df.height();
    if removed > 0 {
        tracing::info!("Dropped {} duplicate rows", removed);
    }
    Ok((df, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_duplicates_detected_after_dropping_id() {
        // Строки отличаются только идентификатором
        let df = df!(
            "Unnamed: 0" => [0i64, 1, 2],
            "Booking_ID" => ["INN1", "INN2", "INN3"],
            "lead_time" => [10.0, 10.0, 20.0]
        )
        .unwrap();

        let (df, removed) = drop_identifiers_and_duplicates(
            &df,
            &["Unnamed: 0".to_string(), "Booking_ID".to_string()],
        )
        .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(df.width(), 1);
        let lead_time: Vec<Option<f64>> =
            df.column("lead_time").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(lead_time, vec![Some(10.0), Some(20.0)]);
    }
}
