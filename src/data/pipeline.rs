use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::filter::{FilterSpec, filtered_indices};
use super::loader::load_file;
use super::metrics::{Metric, MetricResult, aggregate};
use super::model::{CellValue, CostTable};
use super::normalize::normalize;
use super::schema::{CostColumns, MissingColumns, validate};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures that stop a report for the current session.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The uploaded file could not be read or decoded.
    #[error("could not read {}: {source:#}", .path.display())]
    Ingestion {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The file was read but lacks required columns.
    #[error(transparent)]
    Schema(#[from] MissingColumns),
}

// ---------------------------------------------------------------------------
// Validated views
// ---------------------------------------------------------------------------

/// A normalized table together with the proof that it passed validation.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedTable<'a> {
    table: &'a CostTable,
    columns: &'a CostColumns,
}

impl<'a> ValidatedTable<'a> {
    /// `columns` must come from [`validate`] on this same `table`.
    pub fn new(table: &'a CostTable, columns: &'a CostColumns) -> Self {
        Self { table, columns }
    }

    pub fn table(&self) -> &'a CostTable {
        self.table
    }

    pub fn columns(&self) -> &'a CostColumns {
        self.columns
    }

    /// Distinct year cells as they appear in the table, blanks included.
    pub fn year_values(&self) -> BTreeSet<CellValue> {
        self.table
            .unique_values(self.columns.years)
            .cloned()
            .unwrap_or_default()
    }

    /// Distinct cells that read as a numeric year, ascending.
    pub fn years(&self) -> BTreeSet<i64> {
        self.table
            .rows()
            .iter()
            .filter_map(|row| row[self.columns.years].as_year())
            .collect()
    }

    /// Every row, in order.
    pub fn all_rows(&self) -> RowSubset<'a> {
        RowSubset::new(*self, (0..self.table.len()).collect())
    }
}

/// A read-only selection of rows from a [`ValidatedTable`], in table order.
#[derive(Debug, Clone)]
pub struct RowSubset<'a> {
    table: ValidatedTable<'a>,
    indices: Cow<'a, [usize]>,
}

impl<'a> RowSubset<'a> {
    pub fn new(table: ValidatedTable<'a>, indices: Vec<usize>) -> Self {
        Self {
            table,
            indices: Cow::Owned(indices),
        }
    }

    /// View over indices kept elsewhere (e.g. cached UI state).
    pub fn borrowed(table: ValidatedTable<'a>, indices: &'a [usize]) -> Self {
        Self {
            table,
            indices: Cow::Borrowed(indices),
        }
    }

    pub fn table(&self) -> ValidatedTable<'a> {
        self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a Vec<CellValue>> + '_ {
        let rows = self.table.table.rows();
        self.indices.iter().map(move |&i| &rows[i])
    }

    /// Numeric values of `column`; non-numeric cells count as zero.
    pub fn numbers(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows().map(move |row| row[column].as_f64().unwrap_or(0.0))
    }

    /// Sum of `column` over the subset.
    pub fn sum(&self, column: usize) -> f64 {
        self.numbers(column).sum()
    }

    /// The rows of this subset whose year equals `year`.
    pub fn restrict_to_year(&self, year: i64) -> RowSubset<'a> {
        let years = self.table.columns.years;
        let rows = self.table.table.rows();
        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|&i| rows[i][years].as_year() == Some(year))
            .collect();
        RowSubset::new(self.table, indices)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One uploaded file: the ingested cells, the normalized table and its
/// schema check.
///
/// A failed schema check is kept rather than returned as an error so the
/// preview and the missing-column list can still be shown.
#[derive(Debug)]
pub struct Session {
    source: PathBuf,
    /// Cells as read, under canonical headers.
    ingested: CostTable,
    table: CostTable,
    schema: Result<CostColumns, MissingColumns>,
}

impl Session {
    /// Ingest, normalize and validate `path`.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let raw = load_file(path).map_err(|source| PipelineError::Ingestion {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_raw(path.to_path_buf(), &raw))
    }

    /// Normalize and validate an already ingested table.
    pub fn from_raw(source: PathBuf, raw: &CostTable) -> Self {
        let table = normalize(raw);
        let ingested = CostTable::new(table.columns().to_vec(), raw.rows().to_vec());
        let schema = validate(&table);
        match &schema {
            Ok(_) => log::info!(
                "Loaded {} rows with {} columns from {}",
                table.len(),
                table.columns().len(),
                source.display()
            ),
            Err(missing) => log::warn!("{}: {missing}", source.display()),
        }
        Self {
            source,
            ingested,
            table,
            schema,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The table before numeric cleaning, with canonical headers.
    pub fn ingested(&self) -> &CostTable {
        &self.ingested
    }

    /// The normalized table, valid or not.
    pub fn table(&self) -> &CostTable {
        &self.table
    }

    pub fn validated(&self) -> Result<ValidatedTable<'_>, &MissingColumns> {
        self.schema
            .as_ref()
            .map(|columns| ValidatedTable::new(&self.table, columns))
    }
}

// ---------------------------------------------------------------------------
// Render cycle
// ---------------------------------------------------------------------------

/// The presentation layer, as seen by the pipeline.
pub trait ReportSink {
    /// Head of the ingested table, before numeric cleaning.
    fn preview(&mut self, columns: &[String], rows: &[Vec<CellValue>]);
    /// Schema outcome; an empty list means every required column is present.
    fn validation(&mut self, missing: &[String]);
    /// Rows passing the current filters.
    fn filtered(&mut self, subset: &RowSubset<'_>);
    /// The selected metric over a non-empty subset.
    fn metric(&mut self, result: &MetricResult);
    /// The filters matched nothing.
    fn no_data(&mut self);
}

/// What a render cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    NoData,
    Computed(MetricResult),
}

/// Run filter + aggregation over `session` and push every stage's output to
/// `sink`. Stops after reporting when the schema check failed.
pub fn render_cycle(
    session: &Session,
    filters: &FilterSpec,
    metric: Metric,
    preview_rows: usize,
    sink: &mut impl ReportSink,
) -> Result<Outcome, PipelineError> {
    let ingested = session.ingested();
    sink.preview(ingested.columns(), ingested.head(preview_rows));

    let validated = match session.validated() {
        Ok(validated) => validated,
        Err(missing) => {
            sink.validation(&missing.0);
            return Err(missing.clone().into());
        }
    };
    sink.validation(&[]);

    let subset = RowSubset::new(validated, filtered_indices(&validated, filters));
    log::debug!("{} of {} rows pass the filters", subset.len(), session.table().len());
    sink.filtered(&subset);

    if subset.is_empty() {
        sink.no_data();
        return Ok(Outcome::NoData);
    }

    let result = aggregate(&subset, metric);
    log::debug!("{} = {}", metric.label(), result.value);
    sink.metric(&result);
    Ok(Outcome::Computed(result))
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::data::normalize::NUMERIC_COLUMNS;
    use crate::data::schema::REQUIRED_COLUMNS;

    /// A normalized table with every required column. Each tuple is
    /// `(year, scenario, product code, cogm cost, lots)`; other numeric
    /// columns are zero and other categorical columns are `"X"`.
    pub(crate) fn cost_table(rows: &[(i64, &str, &str, f64, f64)]) -> CostTable {
        let columns: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        let cells = rows
            .iter()
            .map(|&(year, scenario, code, cogm, lots)| {
                columns
                    .iter()
                    .map(|col| match col.as_str() {
                        "years" => CellValue::Integer(year),
                        "scenario" => CellValue::String(scenario.to_string()),
                        "productcode" => CellValue::String(code.to_string()),
                        "cogmcost" => CellValue::Float(cogm),
                        "lots" => CellValue::Float(lots),
                        c if NUMERIC_COLUMNS.contains(&c) => CellValue::Float(0.0),
                        _ => CellValue::String("X".to_string()),
                    })
                    .collect()
            })
            .collect();
        CostTable::new(columns, cells)
    }

    /// Replace the values of a numeric column, row by row.
    pub(crate) fn with_numbers(table: &CostTable, column: &str, values: &[f64]) -> CostTable {
        let index = table.column_index(column).expect("known column");
        let rows = table
            .rows()
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                row[index] = CellValue::Float(*value);
                row
            })
            .collect();
        CostTable::new(table.columns().to_vec(), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::cost_table;
    use super::*;
    use crate::data::filter::{Dimension, Selection, YearFilter};

    #[derive(Default)]
    struct RecordingSink {
        preview_rows: usize,
        preview: Vec<Vec<CellValue>>,
        missing: Option<Vec<String>>,
        filtered: Vec<usize>,
        result: Option<f64>,
        no_data: bool,
    }

    impl ReportSink for RecordingSink {
        fn preview(&mut self, _columns: &[String], rows: &[Vec<CellValue>]) {
            self.preview_rows = rows.len();
            self.preview = rows.to_vec();
        }
        fn validation(&mut self, missing: &[String]) {
            self.missing = Some(missing.to_vec());
        }
        fn filtered(&mut self, subset: &RowSubset<'_>) {
            self.filtered = subset.indices().to_vec();
        }
        fn metric(&mut self, result: &MetricResult) {
            self.result = Some(result.value);
        }
        fn no_data(&mut self) {
            self.no_data = true;
        }
    }

    fn session(table: CostTable) -> Session {
        Session::from_raw(PathBuf::from("test.csv"), &table)
    }

    #[test]
    fn test_end_to_end_average_cogm_per_lot() {
        let session = session(cost_table(&[
            (2021, "Base", "P1", 1e6, 1.0),
            (2021, "Base", "P1", 3e6, 1.0),
            (2022, "Base", "P1", 5e6, 2.0),
        ]));
        let filters = FilterSpec::with_years(YearFilter::years([2021]));
        let mut sink = RecordingSink::default();

        let outcome =
            render_cycle(&session, &filters, Metric::AvgCogmCostPerLot, 5, &mut sink).unwrap();

        assert_eq!(sink.preview_rows, 3);
        assert_eq!(sink.missing, Some(vec![]));
        assert_eq!(sink.filtered, vec![0, 1]);
        assert_eq!(sink.result, Some(1.0));
        assert!(matches!(outcome, Outcome::Computed(r) if r.value == 1.0));
    }

    #[test]
    fn test_no_match_reports_no_data_not_zero() {
        let session = session(cost_table(&[(2021, "Base", "P1", 1e6, 1.0)]));
        let filters = FilterSpec::with_years(YearFilter::years([2021]))
            .with(Dimension::Scenario, Selection::One(CellValue::String("Upside".into())));
        let mut sink = RecordingSink::default();

        let outcome =
            render_cycle(&session, &filters, Metric::DsCostPerGram, 5, &mut sink).unwrap();

        assert_eq!(outcome, Outcome::NoData);
        assert!(sink.no_data);
        assert!(sink.result.is_none());
    }

    #[test]
    fn test_missing_columns_halt_before_filtering() {
        let raw = CostTable::new(
            vec!["Years".into(), "COGM Cost".into()],
            vec![vec![CellValue::Integer(2021), CellValue::String("$5".into())]],
        );
        let session = session(raw);
        let filters = FilterSpec::with_years(YearFilter::years([2021]));
        let mut sink = RecordingSink::default();

        let err = render_cycle(&session, &filters, Metric::AvgCogmCostPerLot, 5, &mut sink)
            .unwrap_err();

        let missing = sink.missing.unwrap();
        assert!(missing.contains(&"scenario".to_string()));
        assert!(!missing.contains(&"years".to_string()));
        assert!(!missing.contains(&"cogmcost".to_string()));
        assert!(sink.filtered.is_empty());
        assert!(matches!(err, PipelineError::Schema(MissingColumns(list)) if list == missing));
    }

    #[test]
    fn test_preview_shows_cells_before_cleaning() {
        let raw = CostTable::new(
            vec!["Years".into(), "COGM Cost".into()],
            vec![vec![CellValue::Integer(2021), CellValue::String("$1,234.50".into())]],
        );
        let session = session(raw);
        let mut sink = RecordingSink::default();

        let _ = render_cycle(
            &session,
            &FilterSpec::with_years(YearFilter::years([2021])),
            Metric::AvgCogmCostPerLot,
            5,
            &mut sink,
        );

        assert_eq!(session.ingested().columns(), &["years", "cogmcost"]);
        assert_eq!(sink.preview[0][1], CellValue::String("$1,234.50".into()));
        assert_eq!(session.table().cell(0, 1), &CellValue::Float(1234.5));
    }

    #[test]
    fn test_year_values_include_blank_cells() {
        let table = cost_table(&[(2021, "Base", "P1", 1.0, 1.0)]);
        let rows = vec![table.rows()[0].clone(), vec![CellValue::Null; table.columns().len()]];
        let table = CostTable::new(table.columns().to_vec(), rows);
        let columns = validate(&table).unwrap();
        let view = ValidatedTable::new(&table, &columns);

        assert_eq!(
            view.year_values(),
            BTreeSet::from([CellValue::Null, CellValue::Integer(2021)])
        );
        assert_eq!(view.years(), BTreeSet::from([2021]));
    }

    #[test]
    fn test_restrict_to_year_keeps_order() {
        let table = cost_table(&[
            (2021, "Base", "P1", 1.0, 1.0),
            (2022, "Base", "P1", 1.0, 1.0),
            (2021, "Base", "P1", 1.0, 1.0),
        ]);
        let columns = validate(&table).unwrap();
        let view = ValidatedTable::new(&table, &columns);

        let subset = view.all_rows().restrict_to_year(2021);
        assert_eq!(subset.indices(), &[0, 2]);
    }

    #[test]
    fn test_open_reports_ingestion_failure_with_path() {
        let err = Session::open(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Ingestion { .. }));
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }
}
