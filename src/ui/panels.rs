use cogm_calculator::data::filter::{Dimension, Selection};
use cogm_calculator::data::loader::{
    DELIMITED_EXTENSIONS, JSON_EXTENSIONS, PARQUET_EXTENSIONS, SPREADSHEET_EXTENSIONS,
};
use cogm_calculator::data::metrics::Metric;
use cogm_calculator::data::model::CellValue;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, FilterOptions, YearMode};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    // Clone what we need so we can mutate state inside the widgets.
    let Some(options) = state.filter_options() else {
        ui.label("No valid dataset loaded.");
        plant_site_info(ui);
        return;
    };

    let mut changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            changed |= year_filter(ui, state, &options);
            ui.separator();
            changed |= scenario_filter(ui, state, &options);
            ui.separator();

            for dimension in Dimension::ALL {
                if dimension == Dimension::Scenario {
                    continue;
                }
                let values = options.values.get(&dimension).map(Vec::as_slice).unwrap_or(&[]);
                changed |= single_value_filter(ui, state, dimension, values);
            }
            ui.separator();

            changed |= metric_selector(ui, state, &options);
            ui.separator();
            plant_site_info(ui);
        });

    // Recompute the report after any widget change.
    if changed {
        state.refresh();
    }
}

fn year_filter(ui: &mut Ui, state: &mut AppState, options: &FilterOptions) -> bool {
    let mut changed = false;
    ui.strong("Years");
    ui.horizontal(|ui: &mut Ui| {
        changed |= ui
            .radio_value(&mut state.year_mode, YearMode::Select, "Select")
            .changed();
        changed |= ui
            .radio_value(&mut state.year_mode, YearMode::Range, "Range")
            .changed();
    });

    match state.year_mode {
        YearMode::Select => {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.selected_years = options.year_values.iter().cloned().collect();
                    changed = true;
                }
                if ui.small_button("None").clicked() {
                    state.selected_years.clear();
                    changed = true;
                }
            });
            for year in &options.year_values {
                let mut checked = state.selected_years.contains(year);
                if ui.checkbox(&mut checked, year.to_string()).changed() {
                    if checked {
                        state.selected_years.insert(year.clone());
                    } else {
                        state.selected_years.remove(year);
                    }
                    changed = true;
                }
            }
        }
        YearMode::Range => {
            let min = options.years.first().copied().unwrap_or_default();
            let max = options.years.last().copied().unwrap_or_default();
            ui.horizontal(|ui: &mut Ui| {
                ui.label("From");
                changed |= ui
                    .add(egui::DragValue::new(&mut state.year_range.0).range(min..=max))
                    .changed();
                ui.label("to");
                changed |= ui
                    .add(egui::DragValue::new(&mut state.year_range.1).range(min..=max))
                    .changed();
            });
        }
    }
    changed
}

fn scenario_filter(ui: &mut Ui, state: &mut AppState, options: &FilterOptions) -> bool {
    let mut changed = false;
    ui.strong(Dimension::Scenario.label());
    changed |= ui
        .checkbox(&mut state.all_scenarios, "Select All Scenarios")
        .changed();

    if !state.all_scenarios {
        let values = options
            .values
            .get(&Dimension::Scenario)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for value in values {
            let mut checked = state.scenarios.contains(value);
            if ui.checkbox(&mut checked, value.to_string()).changed() {
                if checked {
                    state.scenarios.insert(value.clone());
                } else {
                    state.scenarios.remove(value);
                }
                changed = true;
            }
        }
    }
    changed
}

/// Combo box with a leading empty entry meaning "no constraint".
fn single_value_filter(
    ui: &mut Ui,
    state: &mut AppState,
    dimension: Dimension,
    values: &[CellValue],
) -> bool {
    let current = match state.categories.get(&dimension) {
        Some(Selection::One(value)) => value.clone(),
        _ => CellValue::Null,
    };
    let mut picked = current.clone();

    ui.label(format!("Select {}", dimension.label()));
    egui::ComboBox::from_id_salt(dimension.column())
        .selected_text(picked.to_string())
        .width(ui.available_width() * 0.9)
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut picked, CellValue::Null, "");
            for value in values {
                ui.selectable_value(&mut picked, value.clone(), value.to_string());
            }
        });

    if picked != current {
        state.categories.insert(dimension, Selection::One(picked));
        return true;
    }
    false
}

fn metric_selector(ui: &mut Ui, state: &mut AppState, options: &FilterOptions) -> bool {
    let before = state.metric;
    let choices = [
        Metric::AvgCogmCostPerLot,
        Metric::AvgRawMaterialCostPerLot,
        Metric::DsCostPerGram,
        Metric::DpFdpCostPerUnit,
        Metric::CostPerSoldUnit {
            year: state.sold_unit_year,
        },
    ];

    ui.strong("Select Calculation");
    let mut picked = state.metric;
    egui::ComboBox::from_id_salt("metric")
        .selected_text(picked.label())
        .show_ui(ui, |ui: &mut Ui| {
            for choice in choices {
                ui.selectable_value(&mut picked, choice, choice.label());
            }
        });
    state.set_metric(picked);

    if let Metric::CostPerSoldUnit { .. } = state.metric {
        let mut year = state.sold_unit_year;
        ui.label("Select Year for Cost per Sold Unit");
        egui::ComboBox::from_id_salt("sold_unit_year")
            .selected_text(year.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                for y in &options.years {
                    ui.selectable_value(&mut year, *y, y.to_string());
                }
            });
        if year != state.sold_unit_year {
            state.set_sold_unit_year(year);
        }
    }

    state.metric != before
}

/// Reference notes on the plant categories found in the data.
fn plant_site_info(ui: &mut Ui) {
    egui::CollapsingHeader::new(RichText::new("Plant Site Information").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.label(RichText::new("Drug Substance (DS) plants").strong());
            ui.label("AML6, AML7, ARI30, ARI5, ASM1, ASM2, ANC1, ANC2, ATO23, ATO 07");
            ui.label("Produce the active pharmaceutical ingredients.");
            ui.add_space(4.0);
            ui.label(RichText::new("Drug Product (DP) plants").strong());
            ui.label("ATO20, ADL, AML14");
            ui.label("Formulate and package drug products.");
            ui.add_space(4.0);
            ui.label(RichText::new("Finished Drug Product (FDP) plants").strong());
            ui.label("AML, ABR, AOH");
            ui.label("Final packaging and distribution.");
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(session) = &state.session {
            ui.label(format!(
                "{}: {} rows loaded, {} selected",
                session
                    .source()
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                session.table().len(),
                state.report.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let supported = [
        DELIMITED_EXTENSIONS,
        SPREADSHEET_EXTENSIONS,
        PARQUET_EXTENSIONS,
        JSON_EXTENSIONS,
    ]
    .concat();

    let file = rfd::FileDialog::new()
        .set_title("Upload your COGM file")
        .add_filter("Supported files", &supported)
        .add_filter("Delimited text", DELIMITED_EXTENSIONS)
        .add_filter("Spreadsheet", SPREADSHEET_EXTENSIONS)
        .add_filter("Parquet", PARQUET_EXTENSIONS)
        .add_filter("JSON", JSON_EXTENSIONS)
        .pick_file();

    if let Some(path) = file {
        state.open_file(&path);
    }
}
