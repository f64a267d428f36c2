use std::collections::{BTreeMap, BTreeSet};

use super::model::CellValue;
use super::pipeline::{RowSubset, ValidatedTable};

// ---------------------------------------------------------------------------
// Filter dimensions
// ---------------------------------------------------------------------------

/// Categorical columns the user can filter on. Years are handled separately
/// by [`YearFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Scenario,
    ProductCode,
    Plant,
    MfgCode,
    Product,
    MfgStage,
    Site,
    DpSpType,
    PresType,
    Presentation,
}

impl Dimension {
    pub const ALL: [Dimension; 10] = [
        Dimension::Scenario,
        Dimension::ProductCode,
        Dimension::Plant,
        Dimension::MfgCode,
        Dimension::Product,
        Dimension::MfgStage,
        Dimension::Site,
        Dimension::DpSpType,
        Dimension::PresType,
        Dimension::Presentation,
    ];

    /// Canonical column name.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Scenario => "scenario",
            Dimension::ProductCode => "productcode",
            Dimension::Plant => "plant",
            Dimension::MfgCode => "mfgcode",
            Dimension::Product => "product",
            Dimension::MfgStage => "mfgstage",
            Dimension::Site => "site",
            Dimension::DpSpType => "dpsptype",
            Dimension::PresType => "prestype",
            Dimension::Presentation => "presentation",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Scenario => "Scenario",
            Dimension::ProductCode => "Product Code",
            Dimension::Plant => "Plant",
            Dimension::MfgCode => "Mfg Code",
            Dimension::Product => "Product",
            Dimension::MfgStage => "Mfg Stage",
            Dimension::Site => "Site",
            Dimension::DpSpType => "DP/SP Type",
            Dimension::PresType => "Pres Type",
            Dimension::Presentation => "Presentation",
        }
    }
}

// ---------------------------------------------------------------------------
// Filter specification
// ---------------------------------------------------------------------------

/// Year constraint. The two modes are alternatives, never combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearFilter {
    /// Explicit year cells, compared like any categorical value. An empty
    /// set matches no rows at all.
    Set(BTreeSet<CellValue>),
    /// Closed range `[start, end]` over cells readable as a year.
    Range { start: i64, end: i64 },
}

impl YearFilter {
    /// A set of numeric years.
    pub fn years(years: impl IntoIterator<Item = i64>) -> Self {
        YearFilter::Set(years.into_iter().map(CellValue::Integer).collect())
    }

    pub fn matches(&self, cell: &CellValue) -> bool {
        match self {
            YearFilter::Set(years) => {
                years.contains(cell) || years.iter().any(|y| y.matches(cell))
            }
            YearFilter::Range { start, end } => cell
                .as_year()
                .is_some_and(|year| (*start..=*end).contains(&year)),
        }
    }

    /// Whether this filter rejects every row regardless of data.
    pub fn selects_nothing(&self) -> bool {
        match self {
            YearFilter::Set(years) => years.is_empty(),
            YearFilter::Range { start, end } => start > end,
        }
    }
}

/// Constraint on one categorical dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// No constraint (also the "select all" shortcut).
    #[default]
    All,
    /// Exactly one value. A blank value means unconstrained.
    One(CellValue),
    /// Membership in a set. An empty set means unconstrained.
    Many(BTreeSet<CellValue>),
}

impl Selection {
    /// `true` when this selection filters nothing out.
    pub fn is_unconstrained(&self) -> bool {
        match self {
            Selection::All => true,
            Selection::One(value) => value.is_blank(),
            Selection::Many(values) => values.is_empty(),
        }
    }

    pub fn matches(&self, cell: &CellValue) -> bool {
        if self.is_unconstrained() {
            return true;
        }
        match self {
            Selection::All => true,
            Selection::One(value) => value.matches(cell),
            Selection::Many(values) => {
                values.contains(cell) || values.iter().any(|v| v.matches(cell))
            }
        }
    }
}

/// Full filter specification: a year constraint plus per-dimension
/// selections. A dimension absent from `categories` is unconstrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub years: YearFilter,
    pub categories: BTreeMap<Dimension, Selection>,
}

impl FilterSpec {
    /// No constraint on anything except the given years.
    pub fn with_years(years: YearFilter) -> Self {
        Self {
            years,
            categories: BTreeMap::new(),
        }
    }

    /// The default for a freshly loaded table: every distinct year cell
    /// selected (blank ones included), every other dimension unconstrained.
    pub fn select_everything(table: &ValidatedTable<'_>) -> Self {
        Self::with_years(YearFilter::Set(table.year_values()))
    }

    /// Builder-style helper to constrain one dimension.
    pub fn with(mut self, dimension: Dimension, selection: Selection) -> Self {
        self.categories.insert(dimension, selection);
        self
    }

    pub fn selection(&self, dimension: Dimension) -> &Selection {
        static UNCONSTRAINED: Selection = Selection::All;
        self.categories.get(&dimension).unwrap_or(&UNCONSTRAINED)
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Return indices of rows that pass every active filter, in table order.
///
/// A row passes when:
/// * its year satisfies the year filter (an empty year set passes nothing)
/// * for each constrained dimension, its cell matches the selection
pub fn filtered_indices(table: &ValidatedTable<'_>, spec: &FilterSpec) -> Vec<usize> {
    if spec.years.selects_nothing() {
        return Vec::new();
    }

    let cols = table.columns();
    let active: Vec<(usize, &Selection)> = spec
        .categories
        .iter()
        .filter(|(_, selection)| !selection.is_unconstrained())
        .map(|(dimension, selection)| (cols.dimension(*dimension), selection))
        .collect();

    table
        .table()
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            spec.years.matches(&row[cols.years])
                && active
                    .iter()
                    .all(|(col, selection)| selection.matches(&row[*col]))
        })
        .map(|(i, _)| i)
        .collect()
}

/// Apply `spec` and wrap the result as a read-only view over the table.
pub fn select<'a>(table: ValidatedTable<'a>, spec: &FilterSpec) -> RowSubset<'a> {
    let indices = filtered_indices(&table, spec);
    RowSubset::new(table, indices)
}
