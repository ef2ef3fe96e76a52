//! Коррекция асимметрии числовых признаков

use polars::prelude::*;

use crate::error::StageError;
use crate::frame::numeric_values;

/// Ошибки округления ниже этого порога считаются нулем
const FP_ZERO: f64 = 1e-14;

/// Выборочный коэффициент асимметрии (скорректированный Фишера-Пирсона, G1).
/// Пропуски (NaN) игнорируются; меньше трех значений - `None`; постоянный столбец - 0.
pub fn sample_skewness(values: &[f64]) -> Option<f64> {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = present.len();
    if n < 3 {
        return None;
    }

    let count = n as f64;
    let mean = present.iter().sum::<f64>() / count;

    // Суммы центральных моментов
    let mut m2 = 0.0;
    let mut m3 = 0.0;
    for v in &present {
        let d = v - mean;
        m2 += d * d;
        m3 += d * d * d;
    }
    if m2.abs() < FP_ZERO {
        return Some(0.0);
    }
    if m3.abs() < FP_ZERO {
        m3 = 0.0;
    }

    let adjustment = count * (count - 1.0).sqrt() / (count - 2.0);
    Some(adjustment * m3 / m2.powf(1.5))
}

pub struct SkewCorrector {
    threshold: f64,
}

impl SkewCorrector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Применяет ln(1+x) к столбцам с асимметрией выше порога.
    /// Возвращает имена преобразованных столбцов.
    pub fn apply(&self, df: &mut DataFrame, columns: &[String]) -> Result<Vec<String>, StageError> {
        // Сначала считаем асимметрию всех столбцов, затем преобразуем
        let mut skewed = Vec::new();
        for name in columns {
            let values = numeric_values(df, name)?;
            match sample_skewness(&values) {
                Some(skew) if skew > self.threshold => {
                    tracing::debug!("Column {} skewness {:.3} above threshold", name, skew);
                    skewed.push(name.clone());
                }
                Some(skew) => tracing::debug!("Column {} skewness {:.3}", name, skew),
                None => tracing::debug!("Column {} skewness undefined", name),
            }
        }

        for name in &skewed {
            let transformed: Vec<f64> = numeric_values(df, name)?
                .into_iter()
                .map(f64::ln_1p)
                .collect();
            df.with_column(Column::new(name.as_str().into(), transformed))?;
        }

        Ok(skewed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skewness_matches_adjusted_estimator() {
        // pandas: pd.Series([1, 2, 3, 4, 100]).skew() == 2.2324...
        let skew = sample_skewness(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert!((skew - 2.232_396).abs() < 1e-5, "skew = {}", skew);

        let symmetric = sample_skewness(&[1.0, 2.0, 3.0]).unwrap();
        assert!(symmetric.abs() < 1e-12);
    }

    #[test]
    fn test_skewness_edge_cases() {
        assert_eq!(sample_skewness(&[1.0, 2.0]), None);
        assert_eq!(sample_skewness(&[1.0, f64::NAN, 2.0]), None);
        assert_eq!(sample_skewness(&[5.0, 5.0, 5.0, 5.0]), Some(0.0));
    }

    #[test]
    fn test_apply_transforms_only_skewed_columns() {
        let lead_time: Vec<f64> = vec![0.0, 1.0, 2.0, 1.0, 0.0, 2.0, 1.0, 500.0];
        let price = vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0];
        let mut df = df!(
            "lead_time" => lead_time.clone(),
            "avg_price_per_room" => price.clone()
        )
        .unwrap();

        let corrector = SkewCorrector::new(2.0);
        let transformed = corrector
            .apply(&mut df, &["lead_time".into(), "avg_price_per_room".into()])
            .unwrap();

        assert_eq!(transformed, vec!["lead_time".to_string()]);
        let out = numeric_values(&df, "lead_time").unwrap();
        for (o, v) in out.iter().zip(&lead_time) {
            assert!((o - v.ln_1p()).abs() < 1e-12);
        }
        assert_eq!(numeric_values(&df, "avg_price_per_room").unwrap(), price);
        // Порядок столбцов не меняется
        assert_eq!(crate::frame::column_names(&df), vec!["lead_time", "avg_price_per_room"]);
    }

    #[test]
    fn test_apply_rejects_text_column() {
        let mut df = df!("lead_time" => ["a", "b", "c"]).unwrap();
        let err = SkewCorrector::new(1.0)
            .apply(&mut df, &["lead_time".into()])
            .unwrap_err();
        assert!(matches!(err, StageError::NonNumericColumn(_)));
    }
}
