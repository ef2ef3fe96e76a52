//! Кодирование категориальных признаков целыми числами

use std::cmp::Ordering;
use std::collections::BTreeSet;

use polars::prelude::*;

use crate::error::StageError;
use crate::frame::is_text;
use crate::types::CategoryMapping;

/// Значения категориального столбца
#[derive(Debug, Clone, PartialEq)]
enum Values {
    Text(Vec<String>),
    Numeric(Vec<f64>),
}

impl Values {
    fn from_column(column: &Column) -> Result<Self, StageError> {
        if is_text(column) {
            column
                .str()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    value.map(str::to_string).ok_or_else(|| StageError::MissingValue {
                        column: column.name().to_string(),
                        row,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Values::Text)
        } else {
            // Пропуск в числовом столбце - отдельный класс NaN
            let numeric = column.cast(&DataType::Float64)?;
            Ok(Values::Numeric(
                numeric.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
            ))
        }
    }

    fn len(&self) -> usize {
        match self {
            Values::Text(values) => values.len(),
            Values::Numeric(values) => values.len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Кодировщик меток: код = позиция значения в отсортированном списке классов
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Option<Values>,
    is_fitted: bool,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self {
            classes: None,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, column: &Column) -> Result<(), StageError> {
        let classes = match Values::from_column(column)? {
            Values::Text(values) => {
                let unique: BTreeSet<String> = values.into_iter().collect();
                Values::Text(unique.into_iter().collect())
            }
            Values::Numeric(mut values) => {
                // NaN попадает в конец, как отдельный класс
                values.sort_by(|a, b| compare_numbers(*a, *b));
                values.dedup_by(|a, b| same_number(*a, *b));
                Values::Numeric(values)
            }
        };
        if classes.is_empty() {
            return Err(StageError::EmptyDataset);
        }

        self.classes = Some(classes);
        self.is_fitted = true;
        Ok(())
    }

    /// Коды столбца; имя столбца сохраняется
    pub fn transform(&self, column: &Column) -> Result<Column, StageError> {
        if !self.is_fitted {
            return Err(StageError::NotFitted);
        }
        let classes = self.classes.as_ref().ok_or(StageError::NotFitted)?;
        let values = Values::from_column(column)?;

        let mut codes: Vec<i64> = Vec::with_capacity(values.len());
        for row in 0..values.len() {
            let code = match (classes, &values) {
                (Values::Text(classes), Values::Text(values)) => classes
                    .binary_search_by(|c| c.as_str().cmp(values[row].as_str()))
                    .ok(),
                (Values::Numeric(classes), Values::Numeric(values)) => classes
                    .binary_search_by(|c| compare_numbers(*c, values[row]))
                    .ok(),
                // Тип столбца не совпадает с тем, на котором обучались
                _ => None,
            };
            match code {
                Some(code) => codes.push(code as i64),
                None => {
                    return Err(StageError::UnseenCategory {
                        column: column.name().to_string(),
                        value: cell_text(&values, row),
                    })
                }
            }
        }

        Ok(Column::new(column.name().clone(), codes))
    }

    pub fn fit_transform(&mut self, column: &Column) -> Result<Column, StageError> {
        self.fit(column)?;
        self.transform(column)
    }

    pub fn n_classes(&self) -> usize {
        self.classes.as_ref().map(Values::len).unwrap_or(0)
    }

    /// Словарь значение -> код для логирования
    pub fn mapping(&self, name: &str) -> CategoryMapping {
        let labels: Vec<String> = match &self.classes {
            Some(Values::Text(classes)) => classes.clone(),
            Some(Values::Numeric(classes)) => classes.iter().map(|v| v.to_string()).collect(),
            None => Vec::new(),
        };
        CategoryMapping {
            column: name.to_string(),
            codes: labels.into_iter().enumerate().map(|(code, label)| (label, code)).collect(),
        }
    }
}

impl Default for LabelEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn cell_text(values: &Values, row: usize) -> String {
    match values {
        Values::Text(values) => values[row].clone(),
        Values::Numeric(values) => values[row].to_string(),
    }
}

fn same_number(a: f64, b: f64) -> bool {
    compare_numbers(a, b) == Ordering::Equal
}

// Числа по возрастанию, NaN в конце; -0.0 == 0.0
fn compare_numbers(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(column: &Column) -> Vec<Option<i64>> {
        column.i64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_text_codes_follow_sorted_order() {
        let column = Column::new(
            "room_type_reserved".into(),
            ["Room_Type 4", "Room_Type 1", "Room_Type 4", "Room_Type 2"],
        );
        let mut encoder = LabelEncoder::new();
        let encoded = encoder.fit_transform(&column).unwrap();

        assert_eq!(encoded.name().as_str(), "room_type_reserved");
        assert_eq!(codes(&encoded), vec![Some(2), Some(0), Some(2), Some(1)]);
        assert_eq!(encoder.n_classes(), 3);
        let mapping = encoder.mapping("room_type_reserved");
        assert_eq!(mapping.code_of("Room_Type 1"), Some(0));
        assert_eq!(mapping.code_of("Room_Type 4"), Some(2));
    }

    #[test]
    fn test_numeric_codes_use_numeric_order() {
        let column = Column::new("arrival_month".into(), [10.0, 2.0, 10.0, -0.0, 0.0]);
        let mut encoder = LabelEncoder::new();
        let encoded = encoder.fit_transform(&column).unwrap();

        // 10 > 2 численно, хотя "10" < "2" лексикографически
        assert_eq!(codes(&encoded), vec![Some(2), Some(1), Some(2), Some(0), Some(0)]);
        assert_eq!(encoder.n_classes(), 3);
    }

    #[test]
    fn test_transform_rejects_unseen_value() {
        let mut encoder = LabelEncoder::new();
        encoder
            .fit(&Column::new("market_segment_type".into(), ["Offline", "Online"]))
            .unwrap();

        let err = encoder
            .transform(&Column::new("market_segment_type".into(), ["Online", "Aviation"]))
            .unwrap_err();
        assert!(matches!(err, StageError::UnseenCategory { ref value, .. } if value == "Aviation"));
    }

    #[test]
    fn test_transform_requires_fit() {
        let encoder = LabelEncoder::new();
        assert!(matches!(
            encoder.transform(&Column::new("x".into(), [1.0])),
            Err(StageError::NotFitted)
        ));
    }
}
