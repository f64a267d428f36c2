use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use calamine::{Data, Reader, open_workbook_auto};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, CostTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Extensions accepted by [`load_file`], grouped for file dialogs.
pub const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv", "tab"];
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];
pub const PARQUET_EXTENSIONS: &[&str] = &["parquet", "pq"];
pub const JSON_EXTENSIONS: &[&str] = &["json"];

/// Load a cost table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` – delimited text, first row = headers
/// * `.xlsx` / `.xls` / `.ods` … – first worksheet, first row = headers
/// * `.parquet`      – flat scalar columns
/// * `.json`         – `[{ "Years": 2021, "COGM Cost": "$1,000", ... }, ...]`
///
/// Headers are returned exactly as written; canonicalization happens in
/// [`super::normalize`].
pub fn load_file(path: &Path) -> Result<CostTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_delimited(path, b',')?,
        "tsv" | "tab" => load_delimited(path, b'\t')?,
        e if SPREADSHEET_EXTENSIONS.contains(&e) => load_spreadsheet(path)?,
        e if PARQUET_EXTENSIONS.contains(&e) => load_parquet(path)?,
        "json" => load_json(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    if table.columns().is_empty() {
        bail!("{} has no header row", path.display());
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, delimiter: u8) -> Result<CostTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .context("opening delimited file")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {}", row_no + 1))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok(CostTable::new(headers, rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Load the first worksheet of an Excel/ODS workbook.
fn load_spreadsheet(path: &Path) -> Result<CostTable> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|c| c.to_string().trim().to_string())
            .collect(),
        None => bail!("first worksheet is empty"),
    };

    let rows = sheet_rows
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    Ok(CostTable::new(headers, rows))
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => guess_cell_type(s),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => {
            CellValue::Date(cell.to_string())
        }
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Years": 2021, "Scenario": "Plan", "COGM Cost": "$1,000,000", ... },
///   ...
/// ]
/// ```
///
/// Columns are ordered by first appearance across records.
fn load_json(path: &Path) -> Result<CostTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(CostTable::new(columns, rows))
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

/// Load a Parquet file of flat scalar columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<CostTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
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
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(CostTable::new(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => match col.as_any().downcast_ref::<StringArray>() {
            Some(s) => CellValue::String(s.value(row).to_string()),
            None => CellValue::Null,
        },
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row))),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Null, |a| CellValue::Bool(a.value(row))),
        other => CellValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_csv_keeps_headers_and_guesses_types() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_temp(
            &dir,
            "cogm.csv",
            "Years,Plant,COGM Cost\n2021,ASM1,\"$1,234.50\"\n2022,ADL,\n",
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.columns(), ["Years", "Plant", "COGM Cost"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0), &CellValue::Integer(2021));
        assert_eq!(table.cell(0, 2), &CellValue::String("$1,234.50".into()));
        assert_eq!(table.cell(1, 2), &CellValue::Null);
    }

    #[test]
    fn test_load_tsv_uses_tab_delimiter() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_temp(&dir, "cogm.tsv", "Years\tLots\n2021\t3\n");
        let table = load_file(&path).unwrap();
        assert_eq!(table.columns(), ["Years", "Lots"]);
        assert_eq!(table.cell(0, 1), &CellValue::Integer(3));
    }

    #[test]
    fn test_load_csv_pads_short_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_temp(&dir, "short.csv", "a,b,c\n1\n");
        let table = load_file(&path).unwrap();
        assert_eq!(table.rows()[0][2], CellValue::Null);
    }

    #[test]
    fn test_load_json_records_orders_columns_by_first_appearance() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_temp(
            &dir,
            "cogm.json",
            r#"[{"Years": 2021, "Lots": 2}, {"Years": 2022, "Scenario": "Plan"}]"#,
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.columns().len(), 3);
        assert!(table.column_index("Scenario").is_some());
        let lots = table.column_index("Lots").unwrap();
        assert_eq!(table.cell(1, lots), &CellValue::Null);
    }

    #[test]
    fn test_unsupported_extension_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_temp(&dir, "cogm.txt", "Years\n2021\n");
        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }

    #[test]
    fn test_empty_file_has_no_header_row() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_temp(&dir, "empty.csv", "");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_temp(&dir, "bad.json", "{not json");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing JSON"));
    }

    #[test]
    fn test_load_xlsx_first_sheet() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cogm.xlsx");
        let table = load_file(&path).unwrap();

        assert_eq!(table.columns(), ["Years", "Scenario", "COGM Cost"]);
        assert_eq!(table.len(), 2);
        // Spreadsheets store whole numbers as floats.
        assert_eq!(table.cell(0, 0), &CellValue::Float(2021.0));
        assert_eq!(table.cell(0, 0).as_year(), Some(2021));
        assert_eq!(table.cell(0, 1), &CellValue::String("Base".into()));
        assert_eq!(table.cell(0, 2), &CellValue::String("$1,234.50".into()));
        assert_eq!(table.cell(1, 2), &CellValue::Float(5000.0));
    }

    #[test]
    fn test_load_parquet_scalar_columns() {
        use arrow::array::ArrayRef;
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("Years", DataType::Int64, false),
            Field::new("Scenario", DataType::Utf8, true),
            Field::new("COGM Cost", DataType::Float64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(vec![2021, 2022])),
            Arc::new(StringArray::from(vec![Some("Base"), None])),
            Arc::new(Float64Array::from(vec![1_000_000.0, 2_500.5])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cogm.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.columns(), ["Years", "Scenario", "COGM Cost"]);
        assert_eq!(table.cell(0, 0), &CellValue::Integer(2021));
        assert_eq!(table.cell(0, 1), &CellValue::String("Base".into()));
        assert_eq!(table.cell(1, 1), &CellValue::Null);
        assert_eq!(table.cell(1, 2), &CellValue::Float(2_500.5));
    }
}
