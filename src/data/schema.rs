use thiserror::Error;

use super::filter::Dimension;
use super::model::CostTable;

/// Canonical columns every uploaded cost file must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "years",
    "scenario",
    "draft",
    "demandtype",
    "productcode",
    "plant",
    "mfgcode",
    "lots",
    "volumetricgramsmanufactured",
    "activegramsmanufactured",
    "unitsmanufactured",
    "rawmaterialcost",
    "siteinventoriableexpenses",
    "nonsiteinventoriableexpenses",
    "normalscrap",
    "contractorspend",
    "cogmjudgement",
    "carryovercost",
    "wipcostcogm",
    "cogmcost",
    "product",
    "mfgstage",
    "site",
    "dpsptype",
    "prestype",
    "presentation",
];

/// Schema check failure: the canonical names absent from the table, in
/// required-list order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required columns: {}", .0.join(", "))]
pub struct MissingColumns(pub Vec<String>);

/// Report which of `required` are not columns of `table`. Never repairs.
pub fn missing_columns(table: &CostTable, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .map(|name| name.to_string())
        .collect()
}

/// Positions of the columns the selector and aggregator read.
///
/// Only obtainable through [`validate`], so holding one means the table
/// passed the schema check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostColumns {
    pub years: usize,
    pub lots: usize,
    pub cogm_cost: usize,
    pub raw_material_cost: usize,
    pub active_grams: usize,
    pub units: usize,
    dimensions: Vec<usize>,
}

impl CostColumns {
    /// Column position of a categorical filter dimension.
    pub fn dimension(&self, dimension: Dimension) -> usize {
        self.dimensions[dimension as usize]
    }
}

/// Check `table` (already normalized) against [`REQUIRED_COLUMNS`].
pub fn validate(table: &CostTable) -> Result<CostColumns, MissingColumns> {
    let missing = missing_columns(table, REQUIRED_COLUMNS);
    if !missing.is_empty() {
        return Err(MissingColumns(missing));
    }

    // Every name below is in REQUIRED_COLUMNS, so the lookups cannot miss.
    let index = |name: &str| table.column_index(name).unwrap_or_default();
    Ok(CostColumns {
        years: index("years"),
        lots: index("lots"),
        cogm_cost: index("cogmcost"),
        raw_material_cost: index("rawmaterialcost"),
        active_grams: index("activegramsmanufactured"),
        units: index("unitsmanufactured"),
        dimensions: Dimension::ALL.iter().map(|d| index(d.column())).collect(),
    })
}
