use super::model::{CellValue, CostTable};

/// Canonical names of the columns coerced to numbers.
pub const NUMERIC_COLUMNS: &[&str] = &[
    "cogmcost",
    "rawmaterialcost",
    "lots",
    "volumetricgramsmanufactured",
    "activegramsmanufactured",
    "unitsmanufactured",
    "siteinventoriableexpenses",
    "nonsiteinventoriableexpenses",
    "normalscrap",
    "contractorspend",
    "cogmjudgement",
    "carryovercost",
    "wipcostcogm",
];

/// Lower-case a header and drop whitespace, `_` and `/`.
///
/// ```
/// use cogm_calculator::data::normalize::canonical_column_name;
///
/// assert_eq!(canonical_column_name("COGM Cost"), "cogmcost");
/// assert_eq!(canonical_column_name("_DP/SP type"), "dpsptype");
/// ```
pub fn canonical_column_name(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '/')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Coerce a cell to a number: keep only ASCII digits and `.`, then parse.
/// Anything that does not parse afterwards (including blanks) is zero.
///
/// Applied to every cell of a numeric column, clean or not, so `"$1,234.50"`
/// and `1234.5` give the same value. Signs are dropped with the rest.
pub fn coerce_numeric(cell: &CellValue) -> f64 {
    let digits: String = cell
        .raw_text()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().unwrap_or(0.0)
}

/// Produce a new table with canonical headers and numeric columns coerced
/// to [`CellValue::Float`]. The input is left untouched.
pub fn normalize(table: &CostTable) -> CostTable {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .map(|h| canonical_column_name(h))
        .collect();

    let numeric: Vec<bool> = columns
        .iter()
        .map(|c| NUMERIC_COLUMNS.contains(&c.as_str()))
        .collect();

    let rows = table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(&numeric)
                .map(|(cell, is_numeric)| {
                    if *is_numeric {
                        CellValue::Float(coerce_numeric(cell))
                    } else {
                        cell.clone()
                    }
                })
                .collect()
        })
        .collect();

    CostTable::new(columns, rows)
}
