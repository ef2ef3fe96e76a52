/// Типы данных для конвейера предобработки

use std::fmt;

use serde::{Deserialize, Serialize};

/// Словарь кодов категориального столбца: значение -> код
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub column: String,
    pub codes: Vec<(String, usize)>, // в порядке возрастания кода
}

impl CategoryMapping {
    pub fn code_of(&self, value: &str) -> Option<usize> {
        self.codes
            .iter()
            .find(|(label, _)| label == value)
            .map(|(_, code)| *code)
    }
}

impl fmt::Display for CategoryMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {{", self.column)?;
        for (i, (label, code)) in self.codes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}': {}", label, code)?;
        }
        f.write_str("}")
    }
}

/// Важность признаков, отсортированная по убыванию
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub ranked: Vec<(String, f64)>,
}

impl FeatureImportance {
    /// Стабильная сортировка: при равной важности сохраняется порядок столбцов
    pub fn from_scores(names: &[String], scores: &[f64]) -> Self {
        let mut ranked: Vec<(String, f64)> = names
            .iter()
            .cloned()
            .zip(scores.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self { ranked }
    }

    pub fn top(&self, n: usize) -> Vec<String> {
        self.ranked.iter().take(n).map(|(name, _)| name.clone()).collect()
    }

    pub fn total(&self) -> f64 {
        self.ranked.iter().map(|(_, score)| score).sum()
    }
}

/// Итог одного прогона конвейера
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub selected_features: Vec<String>,
    pub columns: Vec<String>,
    pub importance: FeatureImportance,
    pub train_mappings: Vec<CategoryMapping>,
    pub test_mappings: Vec<CategoryMapping>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_display() {
        let mapping = CategoryMapping {
            column: "booking_status".into(),
            codes: vec![("Canceled".into(), 0), ("Not_Canceled".into(), 1)],
        };
        assert_eq!(
            mapping.to_string(),
            "booking_status : {'Canceled': 0, 'Not_Canceled': 1}"
        );
        assert_eq!(mapping.code_of("Not_Canceled"), Some(1));
        assert_eq!(mapping.code_of("Unknown"), None);
    }

    #[test]
    fn test_importance_ranking_is_stable() {
        let names: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let importance = FeatureImportance::from_scores(&names, &[0.2, 0.4, 0.2, 0.2]);
        assert_eq!(importance.top(3), vec!["b", "a", "c"]);
        assert!((importance.total() - 1.0).abs() < 1e-12);
        assert_eq!(importance.ranked[3], ("d".to_string(), 0.2));
    }
}
