use std::collections::BTreeMap;

use crate::format::{format_count, format_currency, format_millions};

use super::filter::Dimension;
use super::model::CellValue;
use super::pipeline::RowSubset;

/// Dollars per million dollars.
pub const MILLION: f64 = 1_000_000.0;

// ---------------------------------------------------------------------------
// Metric identifiers
// ---------------------------------------------------------------------------

/// The cost metrics the report can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// mean(cogmcost) in $M, divided by sum(lots).
    AvgCogmCostPerLot,
    /// mean(rawmaterialcost) in $M, divided by sum(lots).
    AvgRawMaterialCostPerLot,
    /// sum(cogmcost) / sum(activegramsmanufactured), in $.
    DsCostPerGram,
    /// sum(cogmcost) / sum(unitsmanufactured), in $.
    DpFdpCostPerUnit,
    /// sum(cogmcost) / sum(unitsmanufactured) over the rows of one year, in $.
    CostPerSoldUnit { year: i64 },
}

impl Metric {
    pub fn label(self) -> &'static str {
        match self {
            Metric::AvgCogmCostPerLot => "Average COGM Cost/Lot",
            Metric::AvgRawMaterialCostPerLot => "Average RM Cost/Lot",
            Metric::DsCostPerGram => "DS Cost per Gram",
            Metric::DpFdpCostPerUnit => "DP/FDP: Cost per Unit",
            Metric::CostPerSoldUnit { .. } => "Cost per Sold Unit",
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// How a figure is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Dollars,
    MillionDollars,
    Count,
    Grams,
    Units,
}

impl Unit {
    pub fn format(self, value: f64) -> String {
        match self {
            Unit::Dollars => format_currency(value),
            Unit::MillionDollars => format_millions(value),
            Unit::Count => format_count(value),
            Unit::Grams => format!("{} g", format_count(value)),
            Unit::Units => format!("{} units", format_count(value)),
        }
    }
}

/// One labeled number of a result: an intermediate total or the metric itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub label: String,
    pub value: f64,
    pub unit: Unit,
}

impl Figure {
    fn new(label: impl Into<String>, value: f64, unit: Unit) -> Self {
        Self {
            label: label.into(),
            value,
            unit,
        }
    }

    /// `"Total Lots: 4"`.
    pub fn display(&self) -> String {
        format!("{}: {}", self.label, self.unit.format(self.value))
    }
}

/// A computed metric with the totals that produced it. The last figure is
/// always the metric value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult {
    pub metric: Metric,
    pub value: f64,
    pub figures: Vec<Figure>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Compute `metric` over `subset`. Never fails: zero denominators and empty
/// subsets give `0`.
pub fn aggregate(subset: &RowSubset<'_>, metric: Metric) -> MetricResult {
    let cols = subset.table().columns();

    let (value, figures) = match metric {
        Metric::AvgCogmCostPerLot | Metric::AvgRawMaterialCostPerLot => {
            let (column, name) = if metric == Metric::AvgCogmCostPerLot {
                (cols.cogm_cost, "COGM")
            } else {
                (cols.raw_material_cost, "Raw Material")
            };
            // Mean of the column first, then per lot; not sum/sum.
            let average = mean(subset.numbers(column)) / MILLION;
            let lots = subset.sum(cols.lots);
            let per_lot = ratio(average, lots);
            (
                per_lot,
                vec![
                    Figure::new(format!("Average {name} Cost"), average, Unit::MillionDollars),
                    Figure::new("Total Lots", lots, Unit::Count),
                    Figure::new(metric.label(), per_lot, Unit::MillionDollars),
                ],
            )
        }
        Metric::DsCostPerGram => {
            let cost = subset.sum(cols.cogm_cost);
            let grams = subset.sum(cols.active_grams);
            let per_gram = ratio(cost, grams);
            (
                per_gram,
                vec![
                    Figure::new("Total COGM Cost", cost, Unit::Dollars),
                    Figure::new("Total Active Grams", grams, Unit::Grams),
                    Figure::new("Cost per Gram", per_gram, Unit::Dollars),
                ],
            )
        }
        Metric::DpFdpCostPerUnit => {
            let cost = subset.sum(cols.cogm_cost);
            let units = subset.sum(cols.units);
            let per_unit = ratio(cost, units);
            (
                per_unit,
                vec![
                    Figure::new("Total COGM Cost", cost, Unit::Dollars),
                    Figure::new("Total Manufactured Units", units, Unit::Units),
                    Figure::new("Cost per Unit", per_unit, Unit::Dollars),
                ],
            )
        }
        Metric::CostPerSoldUnit { year } => {
            let yearly = subset.restrict_to_year(year);
            let cost = yearly.sum(cols.cogm_cost);
            let units = yearly.sum(cols.units);
            let per_unit = ratio(cost, units);
            (
                per_unit,
                vec![
                    Figure::new(format!("Total COGM Cost for {year}"), cost, Unit::Dollars),
                    Figure::new(format!("Total Units Manufactured for {year}"), units, Unit::Units),
                    Figure::new(format!("Cost per Sold Unit for {year}"), per_unit, Unit::Dollars),
                ],
            )
        }
    };

    MetricResult {
        metric,
        value,
        figures,
    }
}

/// COGM cost in $M per year, split by the values of `dimension`:
/// `series value → year → cost`. Rows with an unreadable year are skipped.
pub fn yearly_breakdown(
    subset: &RowSubset<'_>,
    dimension: Dimension,
) -> BTreeMap<CellValue, BTreeMap<i64, f64>> {
    let cols = subset.table().columns();
    let group = cols.dimension(dimension);

    let mut series: BTreeMap<CellValue, BTreeMap<i64, f64>> = BTreeMap::new();
    for row in subset.rows() {
        let Some(year) = row[cols.years].as_year() else {
            continue;
        };
        let cost = row[cols.cogm_cost].as_f64().unwrap_or(0.0) / MILLION;
        *series
            .entry(row[group].clone())
            .or_default()
            .entry(year)
            .or_default() += cost;
    }
    series
}
