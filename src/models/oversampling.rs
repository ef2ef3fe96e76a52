//! SMOTE: синтетическое дополнение миноритарных классов

use std::collections::BTreeMap;

use linfa_nn::distance::L2Dist;
use linfa_nn::{CommonNearestNeighbour, NearestNeighbour};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use polars::prelude::{Column, DataFrame};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{class_labels, feature_names};
use crate::error::StageError;
use crate::frame::{column_names, numeric_matrix};

pub struct Smote {
    k_neighbors: usize,
    random_state: u64,
}

impl Smote {
    pub fn new(k_neighbors: usize, random_state: u64) -> Self {
        Self {
            k_neighbors,
            random_state,
        }
    }

    /// Дополняет все классы, кроме мажоритарного, до его размера.
    /// Исходные строки идут первыми, синтетические - после, по возрастанию класса.
    pub fn fit_resample(
        &self,
        features: &Array2<f64>,
        labels: &Array1<usize>,
    ) -> Result<(Array2<f64>, Array1<usize>), StageError> {
        if features.nrows() == 0 {
            return Err(StageError::EmptyDataset);
        }

        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for &label in labels.iter() {
            *counts.entry(label).or_default() += 1;
        }
        if counts.len() < 2 {
            return Err(StageError::SingleClass(counts.len()));
        }
        let majority = counts.values().copied().max().unwrap_or(0);

        let mut rng = StdRng::seed_from_u64(self.random_state);
        let mut synthetic_rows: Vec<f64> = Vec::new();
        let mut synthetic_labels: Vec<usize> = Vec::new();

        for (&class, &count) in &counts {
            let needed = majority - count;
            if needed == 0 {
                continue;
            }
            if count < self.k_neighbors + 1 {
                return Err(StageError::TooFewSamples {
                    class,
                    found: count,
                    required: self.k_neighbors + 1,
                    k: self.k_neighbors,
                });
            }

            let rows: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, label)| **label == class)
                .map(|(i, _)| i)
                .collect();
            let samples = features.select(Axis(0), &rows);
            let neighbours = self.nearest_neighbours(samples.view())?;

            for _ in 0..needed {
                let i = rng.gen_range(0..count);
                let j = neighbours[i][rng.gen_range(0..neighbours[i].len())];
                let gap: f64 = rng.gen();

                let base = samples.row(i);
                let other = samples.row(j);
                synthetic_rows.extend(
                    base.iter()
                        .zip(other.iter())
                        .map(|(b, o)| b + gap * (o - b)),
                );
            }
            synthetic_labels.extend(std::iter::repeat(class).take(needed));
            tracing::debug!("Class {}: generated {} synthetic samples", class, needed);
        }

        let n_synthetic = synthetic_labels.len();
        let synthetic = Array2::from_shape_vec((n_synthetic, features.ncols()), synthetic_rows)
            .map_err(|e| StageError::Model(e.to_string()))?;
        let resampled = ndarray::concatenate(Axis(0), &[features.view(), synthetic.view()])
            .map_err(|e| StageError::Model(e.to_string()))?;

        let mut resampled_labels = labels.to_vec();
        resampled_labels.extend(synthetic_labels);

        Ok((resampled, Array1::from(resampled_labels)))
    }

    /// Балансирует таблицу по столбцу метки. Порядок столбцов сохраняется.
    pub fn balance_table(&self, df: &DataFrame, label: &str) -> Result<DataFrame, StageError> {
        tracing::info!("Handling imbalanced data");

        let features = feature_names(df, label);
        let matrix = numeric_matrix(df, &features)?;
        let labels = class_labels(df, label)?;

        let (resampled, resampled_labels) = self.fit_resample(&matrix, &labels)?;

        let mut columns = Vec::with_capacity(df.width());
        let mut feature_idx = 0;
        for name in column_names(df) {
            if name == label {
                let codes: Vec<i64> = resampled_labels.iter().map(|&l| l as i64).collect();
                columns.push(Column::new(name.into(), codes));
            } else {
                columns.push(Column::new(name.into(), resampled.column(feature_idx).to_vec()));
                feature_idx += 1;
            }
        }

        let balanced = DataFrame::new(columns)?;
        tracing::info!(
            "Data balanced successfully: {} -> {} rows",
            df.height(),
            balanced.height()
        );
        Ok(balanced)
    }

    // k ближайших соседей каждой строки внутри класса (без самой строки)
    fn nearest_neighbours(
        &self,
        samples: ArrayView2<'_, f64>,
    ) -> Result<Vec<Vec<usize>>, StageError> {
        let index = CommonNearestNeighbour::KdTree
            .from_batch(&samples, L2Dist)
            .map_err(|e| StageError::Model(e.to_string()))?;

        let mut neighbours = Vec::with_capacity(samples.nrows());
        for (i, row) in samples.rows().into_iter().enumerate() {
            let found = index
                .k_nearest(row, self.k_neighbors + 1)
                .map_err(|e| StageError::Model(e.to_string()))?;
            let ids: Vec<usize> = found
                .into_iter()
                .map(|(_, idx)| idx)
                .filter(|&idx| idx != i)
                .take(self.k_neighbors)
                .collect();
            neighbours.push(ids);
        }
        Ok(neighbours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn imbalanced() -> (Array2<f64>, Array1<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            rows.extend([i as f64, (i * 2) as f64]);
            labels.push(1);
        }
        for i in 0..6 {
            rows.extend([100.0 + i as f64, 50.0 - i as f64]);
            labels.push(0);
        }
        (
            Array2::from_shape_vec((18, 2), rows).unwrap(),
            Array1::from(labels),
        )
    }

    #[test]
    fn test_resample_equalises_classes() {
        let (x, y) = imbalanced();
        let (xr, yr) = Smote::new(5, 42).fit_resample(&x, &y).unwrap();

        assert_eq!(xr.nrows(), 24);
        assert_eq!(yr.len(), 24);
        assert_eq!(yr.iter().filter(|&&l| l == 0).count(), 12);
        assert_eq!(yr.iter().filter(|&&l| l == 1).count(), 12);

        // Исходные строки сохраняются в начале
        assert_eq!(xr.slice(ndarray::s![..18, ..]), x);

        // Синтетические точки лежат внутри оболочки класса 0
        for row in xr.slice(ndarray::s![18.., ..]).rows() {
            assert!(row[0] >= 100.0 && row[0] <= 105.0);
            assert!(row[1] >= 45.0 && row[1] <= 50.0);
        }
    }

    #[test]
    fn test_resample_is_deterministic() {
        let (x, y) = imbalanced();
        let first = Smote::new(5, 42).fit_resample(&x, &y).unwrap();
        let second = Smote::new(5, 42).fit_resample(&x, &y).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_too_few_minority_samples() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [10.0], [11.0]];
        let y = Array1::from(vec![1, 1, 1, 1, 0, 0]);
        let err = Smote::new(5, 42).fit_resample(&x, &y).unwrap_err();
        assert!(matches!(
            err,
            StageError::TooFewSamples { class: 0, found: 2, required: 6, k: 5 }
        ));
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[0.0], [1.0]];
        let y = Array1::from(vec![1, 1]);
        assert!(matches!(
            Smote::new(5, 42).fit_resample(&x, &y),
            Err(StageError::SingleClass(1))
        ));
    }

    #[test]
    fn test_resample_several_minority_classes() {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (class, count) in [(0usize, 12usize), (1, 7), (2, 6)] {
            for i in 0..count {
                rows.extend([class as f64 * 50.0 + i as f64, i as f64 * 0.5]);
                labels.push(class);
            }
        }
        let x = Array2::from_shape_vec((25, 2), rows).unwrap();
        let y = Array1::from(labels);

        let (xr, yr) = Smote::new(5, 42).fit_resample(&x, &y).unwrap();
        assert_eq!(xr.nrows(), 36);
        for class in 0..3 {
            assert_eq!(yr.iter().filter(|&&l| l == class).count(), 12);
        }

        // Синтетические строки сгруппированы по классам: сначала 5 строк класса 1, затем 6 класса 2
        let synthetic: Vec<usize> = yr.iter().skip(25).copied().collect();
        assert_eq!(synthetic, [vec![1; 5], vec![2; 6]].concat());
        for (row, &class) in xr.slice(ndarray::s![25.., ..]).rows().into_iter().zip(&synthetic) {
            let low = class as f64 * 50.0;
            assert!(row[0] >= low && row[0] <= low + 6.0);
        }
    }

    #[test]
    fn test_balance_table_keeps_column_order() {
        let (x, y) = imbalanced();
        let df = DataFrame::new(vec![
            Column::new("lead_time".into(), x.column(0).to_vec()),
            Column::new(
                "booking_status".into(),
                y.iter().map(|&l| l as i64).collect::<Vec<_>>(),
            ),
            Column::new("avg_price_per_room".into(), x.column(1).to_vec()),
        ])
        .unwrap();

        let balanced = Smote::new(5, 42).balance_table(&df, "booking_status").unwrap();
        assert_eq!(column_names(&balanced), column_names(&df));
        assert_eq!(balanced.height(), 24);
        let labels = class_labels(&balanced, "booking_status").unwrap();
        assert_eq!(labels.iter().filter(|&&l| l == 0).count(), 12);
    }
}
