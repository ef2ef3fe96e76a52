//! Чтение и запись таблиц в CSV

use std::fs;
use std::io::Write;
use std::path::Path;

use polars::prelude::*;

use crate::error::StageError;

/// Заголовок файла как есть: polars переименовывает пустые имена по-своему
fn read_header(path: &Path) -> Result<Vec<String>, StageError> {
    let file = fs::File::open(path).map_err(|source| StageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
    let headers = reader.headers().map_err(|source| StageError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}

/// Читает CSV с заголовком. Пустые ячейки становятся null.
/// Безымянный столбец (индекс, сохраненный pandas) получает имя "Unnamed: <позиция>".
pub fn load_table(path: &Path) -> Result<DataFrame, StageError> {
    let headers = read_header(path)?;
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(StageError::NoColumns);
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let names = df.get_column_names_owned();
    for (idx, header) in headers.iter().enumerate() {
        if header.is_empty() {
            if let Some(current) = names.get(idx) {
                df.rename(current.as_str(), format!("Unnamed: {idx}").into())?;
            }
        }
    }

    tracing::info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Записывает таблицу в CSV, перезаписывая файл
pub fn save_table(df: &DataFrame, path: &Path) -> Result<(), StageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StageError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let file = fs::File::create(path).map_err(|source| StageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_table(df, file)?;
    tracing::info!("Data saved successfully to {}", path.display());
    Ok(())
}

pub fn write_table<W: Write>(df: &DataFrame, writer: W) -> Result<(), StageError> {
    let mut clone = df.clone();
    CsvWriter::new(writer)
        .include_header(true)
        .finish(&mut clone)?;
    Ok(())
}
