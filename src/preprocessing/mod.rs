/// Модуль предобработки данных

pub mod cleaning;
pub mod encoding;
pub mod skewness;

pub use encoding::LabelEncoder;
pub use skewness::{sample_skewness, SkewCorrector};

use polars::prelude::DataFrame;

use crate::config::ProcessingConfig;
use crate::error::StageError;
use crate::frame::require_column;
use crate::types::CategoryMapping;

/// Обученные кодировщики категориальных столбцов (в порядке конфигурации)
#[derive(Debug, Clone, Default)]
pub struct CategoryEncoders {
    encoders: Vec<(String, LabelEncoder)>,
}

impl CategoryEncoders {
    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, encoder)| encoder)
    }

    pub fn mappings(&self) -> Vec<CategoryMapping> {
        self.encoders
            .iter()
            .map(|(name, encoder)| encoder.mapping(name))
            .collect()
    }
}

/// Результат предобработки одного набора данных
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub table: DataFrame,
    pub encoders: CategoryEncoders,
    pub log_transformed: Vec<String>,
    pub duplicates_removed: usize,
}

impl Preprocessed {
    pub fn mappings(&self) -> Vec<CategoryMapping> {
        self.encoders.mappings()
    }
}

pub struct Preprocessor {
    drop_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numerical_columns: Vec<String>,
    skew_corrector: SkewCorrector,
}

impl Preprocessor {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            drop_columns: config.drop_columns.clone(),
            categorical_columns: config.categorical_columns.clone(),
            numerical_columns: config.numerical_columns.clone(),
            skew_corrector: SkewCorrector::new(config.skewness_threshold),
        }
    }

    /// Предобработка с обучением кодировщиков на этом же наборе
    pub fn fit_transform(&self, table: DataFrame) -> Result<Preprocessed, StageError> {
        self.run(table, None)
    }

    /// Предобработка с готовыми кодировщиками (например, обученными на train)
    pub fn transform_with(
        &self,
        table: DataFrame,
        encoders: &CategoryEncoders,
    ) -> Result<Preprocessed, StageError> {
        self.run(table, Some(encoders))
    }

    fn run(
        &self,
        table: DataFrame,
        fitted: Option<&CategoryEncoders>,
    ) -> Result<Preprocessed, StageError> {
        tracing::info!("Starting data preprocessing step");

        let (mut table, duplicates_removed) =
            cleaning::drop_identifiers_and_duplicates(&table, &self.drop_columns)?;
        if table.height() == 0 {
            return Err(StageError::EmptyDataset);
        }

        tracing::info!("Applying label encoding");
        let mut encoders = CategoryEncoders::default();
        for name in &self.categorical_columns {
            let column = require_column(&table, name)?;
            let (encoder, codes) = match fitted.and_then(|f| f.get(name)) {
                Some(encoder) => (encoder.clone(), encoder.transform(column)?),
                None => {
                    let mut encoder = LabelEncoder::new();
                    let codes = encoder.fit_transform(column)?;
                    (encoder, codes)
                }
            };
            tracing::debug!("Column {} has {} classes", name, encoder.n_classes());
            table.with_column(codes)?;
            encoders.encoders.push((name.clone(), encoder));
        }

        tracing::info!("Label mappings are:");
        for mapping in encoders.mappings() {
            tracing::info!("{}", mapping);
        }

        tracing::info!("Doing skewness handling");
        let log_transformed = self.skew_corrector.apply(&mut table, &self.numerical_columns)?;
        if !log_transformed.is_empty() {
            tracing::info!("Applied log1p to {:?}", log_transformed);
        }

        Ok(Preprocessed {
            table,
            encoders,
            log_transformed,
            duplicates_removed,
        })
    }
}
