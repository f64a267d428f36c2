//! Writes `sample_cogm.csv` and `sample_cogm.parquet`: a deterministic
//! COGM dataset with every required column, for trying the calculator.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use cogm_calculator::format::format_currency;
use parquet::arrow::ArrowWriter;

const TEXT_COLUMNS: &[&str] = &[
    "Scenario",
    "Draft",
    "Demand Type",
    "Product Code",
    "Plant",
    "Mfg Code",
    "_Product",
    "_Mfg Stage",
    "_Site",
    "_DP/SP type",
    "_Pres Type",
    "_Presentation",
];

const COST_COLUMNS: &[&str] = &[
    "Raw Material Cost",
    "Site inventoriable expenses",
    "Non Site inventoriable expenses",
    "Normal Scrap",
    "Contractor Spend",
    "COGM Judgement",
    "Carry Over Cost",
    "Wip Cost COGM",
    "COGM Cost",
];

const QUANTITY_COLUMNS: &[&str] = &[
    "Lots",
    "Volumetric Grams Manufactured",
    "Active Grams Manufactured",
    "Units Manufactured",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[low, high)`.
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }
}

struct Product {
    code: &'static str,
    name: &'static str,
    plant: &'static str,
    mfg_code: &'static str,
    stage: &'static str,
    site: &'static str,
    dpsp_type: &'static str,
    pres_type: &'static str,
    presentation: &'static str,
}

const PRODUCTS: &[Product] = &[
    Product {
        code: "P-1001",
        name: "Alpha API",
        plant: "ASM1",
        mfg_code: "M-DS-01",
        stage: "DS",
        site: "Site North",
        dpsp_type: "SP",
        pres_type: "Bulk",
        presentation: "Drum",
    },
    Product {
        code: "P-1002",
        name: "Alpha Vial",
        plant: "ATO20",
        mfg_code: "M-DP-07",
        stage: "DP",
        site: "Site East",
        dpsp_type: "DP",
        pres_type: "Vial",
        presentation: "10 mL vial",
    },
    Product {
        code: "P-1003",
        name: "Alpha Pen",
        plant: "AOH",
        mfg_code: "M-FDP-12",
        stage: "FDP",
        site: "Site West",
        dpsp_type: "DP",
        pres_type: "Device",
        presentation: "Autoinjector",
    },
];

/// One generated record: text cells, then cost and quantity values in the
/// order of the column lists above.
struct Record {
    year: i64,
    text: Vec<String>,
    costs: Vec<f64>,
    quantities: Vec<f64>,
}

fn generate(rng: &mut SimpleRng) -> Vec<Record> {
    let mut records = Vec::new();
    for year in 2022..=2026 {
        for scenario in ["Base", "Upside", "Downside"] {
            for product in PRODUCTS {
                let lots = (rng.uniform(1.0, 12.0)).floor();
                let active = lots * rng.uniform(200.0, 800.0);
                let volumetric = active * rng.uniform(1.1, 1.6);
                let units = if product.stage == "DS" {
                    0.0
                } else {
                    (lots * rng.uniform(5_000.0, 20_000.0)).floor()
                };

                let raw_material = lots * rng.uniform(150_000.0, 400_000.0);
                let site = lots * rng.uniform(50_000.0, 120_000.0);
                let non_site = lots * rng.uniform(10_000.0, 40_000.0);
                let scrap = raw_material * rng.uniform(0.01, 0.05);
                let contractor = rng.uniform(0.0, 250_000.0);
                let judgement = rng.uniform(0.0, 50_000.0);
                let carry_over = rng.uniform(0.0, 80_000.0);
                let wip = rng.uniform(0.0, 60_000.0);
                let cogm = raw_material
                    + site
                    + non_site
                    + scrap
                    + contractor
                    + judgement
                    + carry_over
                    + wip;

                records.push(Record {
                    year,
                    text: vec![
                        scenario.to_string(),
                        "Final".to_string(),
                        "Commercial".to_string(),
                        product.code.to_string(),
                        product.plant.to_string(),
                        product.mfg_code.to_string(),
                        product.name.to_string(),
                        product.stage.to_string(),
                        product.site.to_string(),
                        product.dpsp_type.to_string(),
                        product.pres_type.to_string(),
                        product.presentation.to_string(),
                    ],
                    costs: vec![
                        raw_material, site, non_site, scrap, contractor, judgement, carry_over,
                        wip, cogm,
                    ],
                    quantities: vec![lots, volumetric, active, units],
                });
            }
        }
    }
    records
}

/// Costs are written currency-formatted, the way finance exports look.
fn write_csv(path: &str, records: &[Record]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;

    let mut header = vec!["Years"];
    header.extend_from_slice(TEXT_COLUMNS);
    header.extend_from_slice(QUANTITY_COLUMNS);
    header.extend_from_slice(COST_COLUMNS);
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![record.year.to_string()];
        row.extend(record.text.iter().cloned());
        row.extend(record.quantities.iter().map(|q| format!("{q:.0}")));
        row.extend(record.costs.iter().map(|c| format_currency(*c)));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, records: &[Record]) -> Result<()> {
    let mut fields = vec![Field::new("Years", DataType::Int64, false)];
    let mut arrays: Vec<ArrayRef> =
        vec![Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.year)))];

    for (i, name) in TEXT_COLUMNS.iter().enumerate() {
        fields.push(Field::new(*name, DataType::Utf8, false));
        arrays.push(Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.text[i].as_str()),
        )));
    }
    for (i, name) in QUANTITY_COLUMNS.iter().enumerate() {
        fields.push(Field::new(*name, DataType::Float64, false));
        arrays.push(Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.quantities[i]),
        )));
    }
    for (i, name) in COST_COLUMNS.iter().enumerate() {
        fields.push(Field::new(*name, DataType::Float64, false));
        arrays.push(Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.costs[i]),
        )));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let records = generate(&mut rng);

    write_csv("sample_cogm.csv", &records)?;
    write_parquet("sample_cogm.parquet", &records)?;

    println!(
        "Wrote {} records to sample_cogm.csv and sample_cogm.parquet",
        records.len()
    );
    Ok(())
}
