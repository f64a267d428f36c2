use cogm_calculator::data::filter::{Dimension, Selection};
use eframe::egui::{Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{chart, table};

// ---------------------------------------------------------------------------
// Report (central panel)
// ---------------------------------------------------------------------------

/// Render preview, validation outcome, results, chart and filtered rows.
pub fn report_panel(ui: &mut Ui, state: &AppState) {
    if state.session.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Please upload a COGM file to get started  (File → Open…)");
        });
        return;
    }
    let report = &state.report;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Uploaded Data Preview");
            table::data_table(
                ui,
                "preview",
                &report.preview_columns,
                report.preview_rows.len(),
                |r, c| report.preview_rows[r][c].clone(),
            );
            ui.add_space(8.0);

            match &report.missing_columns {
                Some(missing) if missing.is_empty() => {
                    ui.label(
                        RichText::new("✅ All required columns are present.")
                            .color(Color32::from_rgb(80, 170, 80)),
                    );
                }
                Some(missing) => {
                    ui.label(
                        RichText::new(format!(
                            "❌ The following required columns are missing: {}",
                            missing.join(", ")
                        ))
                        .color(Color32::RED),
                    );
                    return;
                }
                None => return,
            }

            if report.no_data {
                ui.label(
                    RichText::new("❌ No data found for the selected filters.")
                        .color(Color32::YELLOW),
                );
                return;
            }

            if let Some(result) = &report.result {
                ui.separator();
                ui.heading("Calculation Results");
                if let Some(Selection::One(product)) = state.categories.get(&Dimension::Product) {
                    if !product.is_blank() {
                        ui.label(format!("Selected Product: {product}"));
                    }
                }
                for figure in &result.figures {
                    ui.label(RichText::new(figure.display()).strong());
                }
            }

            let Some(subset) = state.visible_rows() else {
                return;
            };

            ui.separator();
            ui.heading("COGM Cost by Year");
            chart::cost_by_year(ui, &subset);

            ui.separator();
            ui.heading(format!("Filtered Data ({} rows)", subset.len()));
            let rows: Vec<&Vec<_>> = subset.rows().collect();
            table::data_table(
                ui,
                "filtered",
                subset.table().table().columns(),
                rows.len(),
                |r, c| rows[r][c].to_string(),
            );
        });
}
