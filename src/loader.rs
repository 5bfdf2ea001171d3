use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::AppError;
use crate::filter::{CellKind, Row};

/// Header names accepted for each cell, compared case-insensitively.
const HEADER_ALIASES: [(CellKind, &[&str]); 5] = [
    (CellKind::Identifier, &["id", "roll_no", "roll no", "student_id"]),
    (CellKind::Name, &["name", "student_name"]),
    (CellKind::Class, &["class", "class_name"]),
    (CellKind::Date, &["date"]),
    (CellKind::Status, &["status"]),
];

#[derive(Debug)]
pub struct RecordTable {
    pub path: PathBuf,
    pub rows: Vec<Row>,
}

struct Column {
    name: String,
    data: Vec<String>,
}

pub fn load(path: PathBuf) -> Result<RecordTable, AppError> {
    check_file(&path)?;

    let start_time = Instant::now();
    let df = Arc::new(load_csv(&path)?.collect()?);

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let columns: Result<Vec<Column>, PolarsError> = names
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect();
    let columns = columns?;

    let rows = rows_from_columns(&columns, df.height());
    info!(
        "Loaded {} records from {:?} in {}ms",
        rows.len(),
        path,
        start_time.elapsed().as_millis()
    );
    Ok(RecordTable { path, rows })
}

fn check_file(path: &Path) -> Result<(), AppError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::FileNotFound,
        ErrorKind::PermissionDenied => AppError::PermissionDenied,
        _ => AppError::Io(e),
    })?;
    if !metadata.is_file() {
        return Err(AppError::LoadingFailed("Not a file!".into()));
    }
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(()),
        _ => Err(AppError::UnknownFileType),
    }
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<Column, PolarsError> {
    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    let data = series
        .into_iter()
        .map(|value| match value {
            Some(s) => s.trim().replace("\r\n", " ").replace('\n', " "),
            None => String::new(),
        })
        .collect();
    Ok(Column {
        name: col_name.to_string(),
        data,
    })
}

/// Picks the source column for every cell; positional when no header is recognised.
fn column_mapping(names: &[&str]) -> [Option<usize>; 5] {
    let mut mapping = [None; 5];
    for (kind, aliases) in HEADER_ALIASES.iter() {
        mapping[*kind as usize] = names.iter().position(|name| {
            let name = name.trim().to_lowercase();
            aliases.iter().any(|alias| *alias == name)
        });
    }
    if mapping.iter().all(Option::is_none) {
        debug!("No known headers in {:?}, mapping columns by position", names);
        for (idx, slot) in mapping.iter_mut().enumerate() {
            *slot = (idx < names.len()).then_some(idx);
        }
    }
    mapping
}

fn rows_from_columns(columns: &[Column], height: usize) -> Vec<Row> {
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let mapping = column_mapping(&names);
    debug!("Column mapping {:?}", mapping);

    (0..height)
        .map(|ridx| {
            Row::new(
                CellKind::ALL
                    .iter()
                    .map(|kind| {
                        mapping[*kind as usize]
                            .and_then(|cidx| columns[cidx].data.get(ridx).cloned())
                            .unwrap_or_default()
                    })
                    .collect(),
            )
        })
        .collect()
}
