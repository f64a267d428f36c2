use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use cogm_calculator::config::ViewerConfig;
use cogm_calculator::data::filter::{Dimension, FilterSpec, Selection, YearFilter};
use cogm_calculator::data::metrics::{Metric, MetricResult};
use cogm_calculator::data::model::CellValue;
use cogm_calculator::data::pipeline::{PipelineError, ReportSink, RowSubset, Session, render_cycle};

// ---------------------------------------------------------------------------
// Rendered report (what the pipeline pushed this cycle)
// ---------------------------------------------------------------------------

/// Output of the last render cycle, kept for drawing.
#[derive(Debug, Default)]
pub struct ReportView {
    pub preview_columns: Vec<String>,
    pub preview_rows: Vec<Vec<String>>,
    /// `None` until a cycle ran; empty when every required column exists.
    pub missing_columns: Option<Vec<String>>,
    /// Indices of rows passing the current filters (cached).
    pub visible_indices: Vec<usize>,
    pub result: Option<MetricResult>,
    pub no_data: bool,
}

impl ReportSink for ReportView {
    fn preview(&mut self, columns: &[String], rows: &[Vec<CellValue>]) {
        self.preview_columns = columns.to_vec();
        self.preview_rows = rows
            .iter()
            .map(|row| row.iter().map(CellValue::to_string).collect())
            .collect();
    }

    fn validation(&mut self, missing: &[String]) {
        self.missing_columns = Some(missing.to_vec());
    }

    fn filtered(&mut self, subset: &RowSubset<'_>) {
        self.visible_indices = subset.indices().to_vec();
    }

    fn metric(&mut self, result: &MetricResult) {
        self.result = Some(result.clone());
    }

    fn no_data(&mut self) {
        self.no_data = true;
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// How the year filter is chosen in the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearMode {
    Select,
    Range,
}

/// Option lists for the filter widgets, taken from the loaded table.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Distinct year cells, for the checkbox list.
    pub year_values: Vec<CellValue>,
    /// Cells readable as numeric years, for the range and sold-unit year.
    pub years: Vec<i64>,
    pub values: BTreeMap<Dimension, Vec<CellValue>>,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    /// Loaded file (None until user loads one).
    pub session: Option<Session>,

    pub year_mode: YearMode,
    pub selected_years: BTreeSet<CellValue>,
    pub year_range: (i64, i64),

    /// "Select All Scenarios" checkbox.
    pub all_scenarios: bool,
    pub scenarios: BTreeSet<CellValue>,

    /// Single-value selections for the other dimensions.
    pub categories: BTreeMap<Dimension, Selection>,

    pub metric: Metric,
    /// Year used by [`Metric::CostPerSoldUnit`].
    pub sold_unit_year: i64,

    pub report: ReportView,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            session: None,
            year_mode: YearMode::Select,
            selected_years: BTreeSet::new(),
            year_range: (0, 0),
            all_scenarios: true,
            scenarios: BTreeSet::new(),
            categories: BTreeMap::new(),
            metric: Metric::AvgCogmCostPerLot,
            sold_unit_year: 0,
            report: ReportView::default(),
            status_message: None,
        }
    }

    /// Load a file, replacing the current session only on success.
    pub fn open_file(&mut self, path: &Path) {
        match Session::open(path) {
            Ok(session) => self.set_session(session),
            Err(e) => {
                log::error!("Failed to load file: {e}");
                self.status_message = Some(format!("An error occurred while processing the file: {e}"));
            }
        }
    }

    /// Install a freshly loaded session and reset filters to "everything".
    pub fn set_session(&mut self, session: Session) {
        let (years, year_values, scenarios) = match session.validated() {
            Ok(table) => (
                table.years(),
                table.year_values(),
                table
                    .table()
                    .unique_values(table.columns().dimension(Dimension::Scenario))
                    .cloned()
                    .unwrap_or_default(),
            ),
            Err(_) => Default::default(),
        };

        self.year_range = (
            years.first().copied().unwrap_or_default(),
            years.last().copied().unwrap_or_default(),
        );
        self.sold_unit_year = self.year_range.1;
        self.selected_years = year_values;
        self.all_scenarios = true;
        self.scenarios = scenarios;
        self.categories.clear();
        if let Metric::CostPerSoldUnit { .. } = self.metric {
            self.metric = Metric::CostPerSoldUnit {
                year: self.sold_unit_year,
            };
        }

        self.session = Some(session);
        self.status_message = None;
        self.refresh();
    }

    /// The filter specification described by the current widget state.
    pub fn filter_spec(&self) -> FilterSpec {
        let years = match self.year_mode {
            YearMode::Select => YearFilter::Set(self.selected_years.clone()),
            YearMode::Range => YearFilter::Range {
                start: self.year_range.0,
                end: self.year_range.1,
            },
        };
        let scenario = if self.all_scenarios {
            Selection::All
        } else {
            Selection::Many(self.scenarios.clone())
        };

        let mut spec = FilterSpec::with_years(years).with(Dimension::Scenario, scenario);
        for (dimension, selection) in &self.categories {
            spec = spec.with(*dimension, selection.clone());
        }
        spec
    }

    /// Distinct values offered by the filter widgets, if a valid table is loaded.
    pub fn filter_options(&self) -> Option<FilterOptions> {
        let table = self.session.as_ref()?.validated().ok()?;
        let values = Dimension::ALL
            .iter()
            .map(|&dimension| {
                let column = table.columns().dimension(dimension);
                let values = table
                    .table()
                    .unique_values(column)
                    .map(|set| set.iter().cloned().collect())
                    .unwrap_or_default();
                (dimension, values)
            })
            .collect();
        Some(FilterOptions {
            year_values: table.year_values().into_iter().collect(),
            years: table.years().into_iter().collect(),
            values,
        })
    }

    /// Select a metric; the sold-unit variant picks up the chosen year.
    pub fn set_metric(&mut self, metric: Metric) {
        self.metric = match metric {
            Metric::CostPerSoldUnit { .. } => Metric::CostPerSoldUnit {
                year: self.sold_unit_year,
            },
            other => other,
        };
    }

    pub fn set_sold_unit_year(&mut self, year: i64) {
        self.sold_unit_year = year;
        self.set_metric(self.metric);
    }

    /// Re-run the pipeline after a filter or metric change.
    pub fn refresh(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let filters = self.filter_spec();
        self.report = ReportView::default();

        match render_cycle(
            session,
            &filters,
            self.metric,
            self.config.preview_rows,
            &mut self.report,
        ) {
            Ok(_) => self.status_message = None,
            Err(PipelineError::Schema(missing)) => {
                self.status_message = Some(format!(
                    "The following required columns are missing: {}",
                    missing.0.join(", ")
                ));
            }
            Err(e) => {
                log::error!("{e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Rows currently passing the filters, if the table is valid.
    pub fn visible_rows(&self) -> Option<RowSubset<'_>> {
        let table = self.session.as_ref()?.validated().ok()?;
        Some(RowSubset::borrowed(table, &self.report.visible_indices))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use cogm_calculator::data::model::CostTable;
    use cogm_calculator::data::schema::REQUIRED_COLUMNS;

    fn session(rows: &[(i64, &str, f64, f64)]) -> Session {
        let columns: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        let cells = rows
            .iter()
            .map(|&(year, scenario, cogm, lots)| {
                columns
                    .iter()
                    .map(|c| match c.as_str() {
                        "years" => CellValue::Integer(year),
                        "scenario" => CellValue::String(scenario.into()),
                        "cogmcost" => CellValue::Float(cogm),
                        "lots" => CellValue::Float(lots),
                        _ => CellValue::Integer(0),
                    })
                    .collect()
            })
            .collect();
        Session::from_raw(PathBuf::from("memory.csv"), &CostTable::new(columns, cells))
    }

    #[test]
    fn test_new_session_selects_every_year() {
        let mut state = AppState::new(ViewerConfig::default());
        state.set_session(session(&[(2021, "Base", 1e6, 1.0), (2023, "Base", 3e6, 1.0)]));

        assert_eq!(
            state.selected_years,
            BTreeSet::from([CellValue::Integer(2021), CellValue::Integer(2023)])
        );
        assert_eq!(state.year_range, (2021, 2023));
        assert_eq!(state.report.visible_indices, vec![0, 1]);
        assert_eq!(state.report.missing_columns, Some(vec![]));
        assert!(state.report.result.is_some());
    }

    #[test]
    fn test_clearing_years_gives_no_data() {
        let mut state = AppState::new(ViewerConfig::default());
        state.set_session(session(&[(2021, "Base", 1e6, 1.0)]));

        state.selected_years.clear();
        state.refresh();

        assert!(state.report.no_data);
        assert!(state.report.result.is_none());
    }

    #[test]
    fn test_range_mode_uses_range() {
        let mut state = AppState::new(ViewerConfig::default());
        state.set_session(session(&[
            (2020, "Base", 1e6, 1.0),
            (2021, "Base", 1e6, 1.0),
            (2022, "Base", 1e6, 1.0),
        ]));

        state.year_mode = YearMode::Range;
        state.year_range = (2021, 2021);
        state.refresh();

        assert_eq!(state.report.visible_indices, vec![1]);
    }

    #[test]
    fn test_sold_unit_metric_follows_year() {
        let mut state = AppState::new(ViewerConfig::default());
        state.set_session(session(&[(2021, "Base", 1e6, 1.0), (2022, "Base", 1e6, 1.0)]));

        state.set_metric(Metric::CostPerSoldUnit { year: 0 });
        assert_eq!(state.metric, Metric::CostPerSoldUnit { year: 2022 });
        state.set_sold_unit_year(2021);
        assert_eq!(state.metric, Metric::CostPerSoldUnit { year: 2021 });
    }

    #[test]
    fn test_invalid_file_reports_missing_columns() {
        let mut state = AppState::new(ViewerConfig::default());
        let raw = CostTable::new(vec!["Years".into()], vec![vec![CellValue::Integer(2021)]]);
        state.set_session(Session::from_raw(PathBuf::from("bad.csv"), &raw));

        let missing = state.report.missing_columns.clone().unwrap();
        assert!(missing.contains(&"cogmcost".to_string()));
        assert!(state.filter_options().is_none());
        assert!(state.status_message.unwrap().contains("cogmcost"));
    }

    #[test]
    fn test_unchecking_all_scenarios_keeps_every_box_ticked() {
        let mut state = AppState::new(ViewerConfig::default());
        state.set_session(session(&[(2021, "Base", 1e6, 1.0), (2021, "Upside", 1e6, 1.0)]));

        assert_eq!(
            state.scenarios,
            BTreeSet::from([CellValue::String("Base".into()), CellValue::String("Upside".into())])
        );

        state.all_scenarios = false;
        state.scenarios.remove(&CellValue::String("Upside".into()));
        state.refresh();
        assert_eq!(state.report.visible_indices, vec![0]);
    }

    #[test]
    fn test_text_years_are_offered_and_selected() {
        let columns: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        let cells = ["FY2021", "FY2022"]
            .iter()
            .map(|year| {
                columns
                    .iter()
                    .map(|c| match c.as_str() {
                        "years" => CellValue::String(year.to_string()),
                        "lots" => CellValue::Float(1.0),
                        _ => CellValue::Integer(0),
                    })
                    .collect()
            })
            .collect();
        let mut state = AppState::new(ViewerConfig::default());
        state.set_session(Session::from_raw(
            PathBuf::from("fy.csv"),
            &CostTable::new(columns, cells),
        ));

        let options = state.filter_options().unwrap();
        assert_eq!(options.year_values.len(), 2);
        assert!(options.years.is_empty());
        assert_eq!(state.report.visible_indices, vec![0, 1]);
        assert!(!state.report.no_data);
    }
}
