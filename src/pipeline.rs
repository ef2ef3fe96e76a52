//! Конвейер обработки данных: загрузка -> предобработка -> балансировка -> отбор -> сохранение

use std::fs;
use std::path::Path;

use polars::prelude::DataFrame;

use crate::config::{Config, PathConfig, ProcessingConfig};
use crate::error::{Result, Stage, StageError, StageResultExt};
use crate::frame::column_names;
use crate::io::{load_table, save_table};
use crate::models::{align_columns, FeatureSelector, Selection, Smote};
use crate::preprocessing::{Preprocessed, Preprocessor};
use crate::types::ProcessingReport;

pub struct DataProcessor {
    config: ProcessingConfig,
    paths: PathConfig,
}

impl DataProcessor {
    /// Создает каталог для обработанных данных, если его нет
    pub fn new(config: Config) -> Result<Self> {
        let processed_dir = &config.paths.processed_dir;
        if !processed_dir.exists() {
            fs::create_dir_all(processed_dir)
                .map_err(|source| StageError::Io {
                    path: processed_dir.clone(),
                    source,
                })
                .at_stage(Stage::Save)?;
        }

        Ok(Self {
            config: config.data_processing,
            paths: config.paths,
        })
    }

    pub fn preprocess(&self, table: DataFrame) -> Result<Preprocessed> {
        Preprocessor::new(&self.config)
            .fit_transform(table)
            .at_stage(Stage::Preprocess)
    }

    pub fn balance(&self, table: &DataFrame) -> Result<DataFrame> {
        Smote::new(self.config.k_neighbors, self.config.random_state)
            .balance_table(table, &self.config.label_column)
            .at_stage(Stage::Balance)
    }

    pub fn select_features(&self, table: &DataFrame) -> Result<Selection> {
        FeatureSelector::new(
            self.config.num_features,
            self.config.n_estimators,
            self.config.random_state,
        )
        .with_max_features(self.config.max_features)
        .select(table, &self.config.label_column)
        .at_stage(Stage::SelectFeatures)
    }

    pub fn save(&self, table: &DataFrame, path: &Path) -> Result<()> {
        tracing::info!("Saving data in processed folder");
        save_table(table, path).at_stage(Stage::Save)
    }

    /// Полный прогон. Ничего не записывается, пока все этапы до сохранения не прошли.
    pub fn process(&self) -> Result<ProcessingReport> {
        let report = self.run().map_err(|err| {
            tracing::error!("Error during processing pipeline: {}", err);
            err
        })?;
        tracing::info!("Data processing completed successfully");
        Ok(report)
    }

    fn run(&self) -> Result<ProcessingReport> {
        tracing::info!("Loading data from raw directory");
        let train = load_table(&self.paths.train_file).at_stage(Stage::Load)?;
        let test = load_table(&self.paths.test_file).at_stage(Stage::Load)?;

        let train = self.preprocess(train)?;
        let test = if self.config.shared_category_codes {
            Preprocessor::new(&self.config)
                .transform_with(test, &train.encoders)
                .at_stage(Stage::Preprocess)?
        } else {
            self.preprocess(test)?
        };

        let train_balanced = self.balance(&train.table)?;
        let test_balanced = self.balance(&test.table)?;

        let selection = self.select_features(&train_balanced)?;
        let columns = column_names(&selection.table);
        let test_aligned = align_columns(&test_balanced, &columns).at_stage(Stage::Align)?;

        self.save(&selection.table, &self.paths.processed_train_file())?;
        self.save(&test_aligned, &self.paths.processed_test_file())?;

        Ok(ProcessingReport {
            train_rows: selection.table.height(),
            test_rows: test_aligned.height(),
            selected_features: selection.selected,
            columns,
            importance: selection.importance,
            train_mappings: train.mappings(),
            test_mappings: test.mappings(),
        })
    }
}
