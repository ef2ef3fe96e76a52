//! Случайный лес для оценки важности признаков

use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_tree::{DecisionTree, SplitQuality, TreeNode};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

use crate::error::StageError;

/// Ансамбль деревьев решений: bootstrap по строкам + случайное подмножество признаков на дерево
pub struct RandomForest {
    n_trees: usize,
    max_features: Option<usize>,
    random_state: u64,
    trees: Vec<ForestTree>,
    feature_importances: Vec<f64>,
}

struct ForestTree {
    features: Vec<usize>,
    tree: DecisionTree<f64, usize>,
}

impl RandomForest {
    pub fn new(n_trees: usize, random_state: u64) -> Self {
        Self {
            n_trees,
            max_features: None,
            random_state,
            trees: Vec::new(),
            feature_importances: Vec::new(),
        }
    }

    /// Число признаков на дерево; по умолчанию ceil(sqrt(p))
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn fit(
        &mut self,
        features: &Array2<f64>,
        labels: &Array1<usize>,
    ) -> Result<(), StageError> {
        let n_samples = features.nrows();
        let n_features = features.ncols();
        if n_samples == 0 || n_features == 0 {
            return Err(StageError::EmptyDataset);
        }

        let max_features = self
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .clamp(1, n_features);

        let mut rng = StdRng::seed_from_u64(self.random_state);
        let mut trees = Vec::with_capacity(self.n_trees);
        let mut importances = vec![0.0; n_features];

        for _ in 0..self.n_trees {
            // Bootstrap-выборка строк
            let rows: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

            // Случайное подмножество признаков
            let mut columns = sample(&mut rng, n_features, max_features).into_vec();
            columns.sort_unstable();

            let records = features.select(Axis(0), &rows).select(Axis(1), &columns);
            let targets = labels.select(Axis(0), &rows);
            let dataset = Dataset::new(records.clone(), targets);

            let tree = DecisionTree::<f64, usize>::params()
                .split_quality(SplitQuality::Gini)
                .fit(&dataset)
                .map_err(|e| StageError::Model(e.to_string()))?;

            // Важность внутри дерева нормируется к 1; дерево-лист не вносит вклад
            let tree_importance = weighted_impurity_decrease(&tree, &records);
            let total: f64 = tree_importance.iter().sum();
            if total > 0.0 {
                for (&feature, &value) in columns.iter().zip(tree_importance.iter()) {
                    importances[feature] += value / total;
                }
            }

            trees.push(ForestTree {
                features: columns,
                tree,
            });
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for value in &mut importances {
                *value /= total;
            }
        } else {
            tracing::warn!("All trees are single leaves, using uniform feature importance");
            importances = vec![1.0 / n_features as f64; n_features];
        }

        tracing::info!(
            "Random forest trained: {} trees, {} features per tree",
            trees.len(),
            max_features
        );
        self.trees = trees;
        self.feature_importances = importances;
        Ok(())
    }

    /// Нормированная важность признаков (сумма = 1)
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Голосование большинством по деревьям
    pub fn predict(&self, features: &Array2<f64>) -> Result<Array1<usize>, StageError> {
        if self.trees.is_empty() {
            return Err(StageError::NotFitted);
        }

        let mut votes: Vec<std::collections::BTreeMap<usize, usize>> =
            vec![Default::default(); features.nrows()];
        for forest_tree in &self.trees {
            let records = features.select(Axis(1), &forest_tree.features);
            let predictions: Array1<usize> = forest_tree.tree.predict(&records);
            for (i, &class) in predictions.iter().enumerate() {
                *votes[i].entry(class).or_default() += 1;
            }
        }

        // При равенстве голосов выигрывает меньший класс
        Ok(votes
            .into_iter()
            .map(|counts| {
                counts
                    .into_iter()
                    .fold((0, 0), |best, (class, n)| if n > best.1 { (class, n) } else { best })
                    .0
            })
            .collect())
    }
}

/// Уменьшение неоднородности по признакам, взвешенное долей строк, дошедших до узла
fn weighted_impurity_decrease(tree: &DecisionTree<f64, usize>, records: &Array2<f64>) -> Vec<f64> {
    let mut importance = vec![0.0; records.ncols()];
    let rows: Vec<usize> = (0..records.nrows()).collect();
    accumulate_decrease(
        tree.root_node(),
        records,
        &rows,
        records.nrows() as f64,
        &mut importance,
    );
    importance
}

// Строки идут влево, если значение признака меньше порога (как при предсказании)
fn accumulate_decrease(
    node: &TreeNode<f64, usize>,
    records: &Array2<f64>,
    rows: &[usize],
    n_total: f64,
    importance: &mut [f64],
) {
    if node.is_leaf() || rows.is_empty() {
        return;
    }
    let (feature, threshold, decrease) = node.split();
    if feature >= records.ncols() {
        return;
    }
    if decrease.is_finite() && decrease > 0.0 {
        importance[feature] += decrease * rows.len() as f64 / n_total;
    }

    let (left, right): (Vec<usize>, Vec<usize>) = rows
        .iter()
        .partition(|&&row| records[[row, feature]] < threshold);
    let children = node.children();
    if let Some(Some(child)) = children.first() {
        accumulate_decrease(child, records, &left, n_total, importance);
    }
    if let Some(Some(child)) = children.get(1) {
        accumulate_decrease(child, records, &right, n_total, importance);
    }
}
