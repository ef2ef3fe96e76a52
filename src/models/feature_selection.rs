//! Отбор признаков по важности в случайном лесе

use polars::prelude::DataFrame;

use super::random_forest::RandomForest;
use super::{class_labels, feature_names};
use crate::error::StageError;
use crate::frame::{numeric_matrix, select_columns};
use crate::types::FeatureImportance;

pub struct FeatureSelector {
    num_features: usize,
    n_estimators: usize,
    max_features: Option<usize>,
    random_state: u64,
}

/// Таблица, суженная до выбранных признаков + метка
#[derive(Debug, Clone)]
pub struct Selection {
    pub table: DataFrame,
    pub selected: Vec<String>,
    pub importance: FeatureImportance,
}

impl FeatureSelector {
    pub fn new(num_features: usize, n_estimators: usize, random_state: u64) -> Self {
        Self {
            num_features,
            n_estimators,
            max_features: None,
            random_state,
        }
    }

    /// Число признаков на дерево леса; по умолчанию ceil(sqrt(p))
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn select(&self, table: &DataFrame, label: &str) -> Result<Selection, StageError> {
        tracing::info!("Starting feature selection");

        let features = feature_names(table, label);
        let matrix = numeric_matrix(table, &features)?;
        let labels = class_labels(table, label)?;

        let mut forest = RandomForest::new(self.n_estimators, self.random_state);
        if let Some(max_features) = self.max_features {
            forest = forest.with_max_features(max_features);
        }
        forest.fit(&matrix, &labels)?;

        let predicted = forest.predict(&matrix)?;
        let correct = predicted.iter().zip(labels.iter()).filter(|(p, t)| p == t).count();
        tracing::info!(
            "Random forest training accuracy: {:.4}",
            correct as f64 / labels.len() as f64
        );

        let importance = FeatureImportance::from_scores(&features, forest.feature_importances());
        if self.num_features > features.len() {
            tracing::warn!(
                "num_features = {} exceeds {} available features, selecting all",
                self.num_features,
                features.len()
            );
        }
        let selected = importance.top(self.num_features);

        let mut columns = selected.clone();
        columns.push(label.to_string());
        let reduced = select_columns(table, &columns)?;

        tracing::info!("Features selected: {:?}", selected);
        tracing::info!("Feature selection completed successfully");

        Ok(Selection {
            table: reduced,
            selected,
            importance,
        })
    }
}

/// Приводит столбцы таблицы к заданному набору и порядку
pub fn align_columns(table: &DataFrame, columns: &[String]) -> Result<DataFrame, StageError> {
    select_columns(table, columns)
}
