use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    Int8Array, UInt16Array, UInt32Array, UInt8Array,
};
use arrow::datatypes::DataType;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, ColumnKind, Dataset, dedupe_names};

/// Cell texts treated as missing when reading CSV.
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// On-disk formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
    Json,
}

impl FileFormat {
    /// A missing extension reads as CSV.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("csv")
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Ok(FileFormat::Csv),
            "parquet" | "pq" => Ok(FileFormat::Parquet),
            "json" => Ok(FileFormat::Json),
            other => bail!("Unsupported file extension: .{other}"),
        }
    }
}

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one record per line (the primary format)
/// * `.parquet` – flat columns of strings, integers, floats or booleans
/// * `.json`    – `[{ "GEOID": "35001000107", "E_TOTPOP": 3721, ... }, ...]`
pub fn load_file(path: &Path) -> Result<Dataset> {
    let format = FileFormat::from_path(path)?;
    let bytes = std::fs::read(path).with_context(|| format!("opening {}", path.display()))?;
    load_bytes(path, format, bytes)
}

/// Parse file content that has already been read. `path` only names the
/// source in errors and logs.
pub fn load_bytes(path: &Path, format: FileFormat, bytes: Vec<u8>) -> Result<Dataset> {
    let dataset = match format {
        FileFormat::Csv => load_csv_reader(bytes.as_slice()),
        FileFormat::Parquet => load_parquet(Bytes::from(bytes)),
        FileFormat::Json => {
            let text = String::from_utf8(bytes).context("reading JSON file")?;
            load_json_str(&text)
        }
    }
    .with_context(|| format!("parsing {}", path.display()))?;

    log::info!(
        "Loaded {} rows x {} columns from {}",
        dataset.len(),
        dataset.columns.len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse CSV text with a header row.
///
/// Column types are inferred over the whole column: a column is `int64` when
/// every non-missing cell parses as an integer and none is missing, `float64`
/// when every non-missing cell parses as a number, `bool` for `True`/`False`
/// literals, and `object` (text) otherwise. Cells of text columns keep their
/// original spelling even when they look numeric.
pub fn load_csv_reader<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        bail!("No columns to parse from file");
    }

    let mut raw: Vec<Vec<String>> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;
        raw.push(record.iter().map(str::to_string).collect());
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|i| infer_text_kind(raw.iter().map(|r| r[i].as_str())))
        .collect();

    let rows = raw
        .iter()
        .map(|r| {
            r.iter()
                .zip(&kinds)
                .map(|(cell, kind)| parse_cell(cell, *kind))
                .collect()
        })
        .collect();

    let columns = dedupe_names(headers)
        .into_iter()
        .zip(kinds)
        .map(|(name, kind)| Column { name, kind })
        .collect();

    Ok(Dataset::with_columns(columns, rows))
}

fn is_missing_marker(s: &str) -> bool {
    MISSING_MARKERS.contains(&s.trim())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

fn infer_text_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let values: Vec<CellValue> = cells
        .map(|s| {
            let t = s.trim();
            if is_missing_marker(t) {
                CellValue::Null
            } else if let Ok(i) = t.parse::<i64>() {
                CellValue::Integer(i)
            } else if let Ok(f) = t.parse::<f64>() {
                CellValue::Float(f)
            } else if let Some(b) = parse_bool(t) {
                CellValue::Bool(b)
            } else {
                CellValue::String(String::new())
            }
        })
        .collect();
    ColumnKind::infer(&values)
}

fn parse_cell(s: &str, kind: ColumnKind) -> CellValue {
    if is_missing_marker(s) {
        return CellValue::Null;
    }
    let t = s.trim();
    match kind {
        ColumnKind::Integer => t.parse::<i64>().map_or(CellValue::Null, CellValue::Integer),
        ColumnKind::Float => t.parse::<f64>().map_or(CellValue::Null, CellValue::Float),
        ColumnKind::Bool => parse_bool(t).map_or(CellValue::Null, CellValue::Bool),
        ColumnKind::Text => CellValue::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')` layout.
/// Columns appear in first-seen key order.
pub fn load_json_str(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            names
                .iter()
                .map(|name| obj.get(name).map_or(CellValue::Null, json_to_cell))
                .collect()
        })
        .collect();

    Ok(Dataset::new(names, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat (non-nested) columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(bytes: Bytes) -> Result<Dataset> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(bytes).context("reading parquet metadata")?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect::<Result<Vec<_>>>()?;
            rows.push(cells);
        }
    }

    Ok(Dataset::new(names, rows))
}

// -- Arrow helpers --

macro_rules! downcast_int {
    ($col:expr, $ty:ty, $row:expr) => {
        $col.as_any()
            .downcast_ref::<$ty>()
            .map(|a| CellValue::Integer(a.value($row) as i64))
            .context(concat!("expected ", stringify!($ty)))
    };
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    match col.data_type() {
        DataType::Utf8 => Ok(CellValue::String(col.as_string::<i32>().value(row).to_string())),
        DataType::LargeUtf8 => Ok(CellValue::String(col.as_string::<i64>().value(row).to_string())),
        DataType::Int8 => downcast_int!(col, Int8Array, row),
        DataType::Int16 => downcast_int!(col, Int16Array, row),
        DataType::Int32 => downcast_int!(col, Int32Array, row),
        DataType::Int64 => downcast_int!(col, Int64Array, row),
        DataType::UInt8 => downcast_int!(col, UInt8Array, row),
        DataType::UInt16 => downcast_int!(col, UInt16Array, row),
        DataType::UInt32 => downcast_int!(col, UInt32Array, row),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64))
            .context("expected Float32Array"),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row)))
            .context("expected Float64Array"),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row)))
            .context("expected BooleanArray"),
        other => bail!("Unsupported parquet column type {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_types_are_inferred_per_column() {
        let csv = "GEOID,COUNTY,E_TOTPOP,EPL_POV200,F_UNEMP\n\
                   35001000107,Bernalillo,3721,0.41,True\n\
                   35001000108,Bernalillo,,0.77,False\n";
        let ds = load_csv_reader(csv.as_bytes()).unwrap();

        let kinds: Vec<&str> = ds.columns.iter().map(|c| c.kind.dtype_name()).collect();
        assert_eq!(kinds, ["int64", "object", "float64", "float64", "bool"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.value(1, 2), Some(&CellValue::Null));
        assert_eq!(ds.value(0, 2), Some(&CellValue::Float(3721.0)));
    }

    #[test]
    fn text_columns_keep_numeric_looking_cells_as_text() {
        let csv = "TRACT,NAME\n001,Tract 1\nA2,Tract 2\n";
        let ds = load_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(ds.columns[0].kind, ColumnKind::Text);
        assert_eq!(ds.value(0, 0), Some(&CellValue::String("001".into())));
    }

    #[test]
    fn missing_markers_become_null() {
        let csv = "v\n1.5\nNA\nnull\nN/A\n2.5\n";
        let ds = load_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(ds.columns[0].kind, ColumnKind::Float);
        assert_eq!(ds.numeric_values(0), vec![1.5, 2.5]);
    }

    #[test]
    fn ragged_csv_is_an_error() {
        let csv = "a,b\n1,2\n3\n";
        let err = load_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 2"));
    }

    #[test]
    fn empty_input_has_no_columns() {
        assert!(load_csv_reader("".as_bytes()).is_err());
    }

    #[test]
    fn missing_default_file_reports_path() {
        let err = load_file(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(format!("{err:#}").contains("definitely/not/here.csv"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("data.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn bundled_default_dataset_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(crate::config::DEFAULT_DATA_PATH);
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 40);
        assert_eq!(ds.column("COUNTY").unwrap().kind, ColumnKind::Text);
        assert_eq!(ds.column("E_TOTPOP").unwrap().kind, ColumnKind::Integer);
        assert_eq!(ds.column("RPL_EJI").unwrap().kind, ColumnKind::Float);
    }

    #[test]
    fn header_names_keep_surrounding_spaces() {
        let ds = load_csv_reader("GEOID, E_MINRTY\n35001,3\n".as_bytes()).unwrap();
        let names: Vec<&str> = ds.column_names().collect();
        assert_eq!(names, ["GEOID", " E_MINRTY"]);
        assert!(ds.column("E_MINRTY").is_none());
    }

    #[test]
    fn json_records_keep_key_order() {
        let json = r#"[{"GEOID": "35001", "E_TOTPOP": 10, "RPL_EJI": 0.5},
                       {"GEOID": "35003", "E_TOTPOP": 20}]"#;
        let ds = load_json_str(json).unwrap();
        let names: Vec<&str> = ds.column_names().collect();
        assert_eq!(names, ["GEOID", "E_TOTPOP", "RPL_EJI"]);
        assert_eq!(ds.columns[1].kind, ColumnKind::Integer);
        assert_eq!(ds.value(1, 2), Some(&CellValue::Null));
    }

    #[test]
    fn parquet_flat_columns_load() {
        use arrow::array::StringArray;
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("GEOID", DataType::Utf8, false),
            Field::new("E_TOTPOP", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["35001", "35003"])),
                Arc::new(Int64Array::from(vec![Some(10), None])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns[0].kind, ColumnKind::Text);
        assert_eq!(ds.columns[1].kind, ColumnKind::Float);
        assert_eq!(ds.value(1, 1), Some(&CellValue::Null));
    }
}
