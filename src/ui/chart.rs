use std::collections::BTreeSet;

use cogm_calculator::data::filter::Dimension;
use cogm_calculator::data::metrics::yearly_breakdown;
use cogm_calculator::data::pipeline::RowSubset;
use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// COGM by year (central panel)
// ---------------------------------------------------------------------------

/// Stacked bars of COGM cost ($M) per year, one series per scenario.
pub fn cost_by_year(ui: &mut Ui, subset: &RowSubset<'_>) {
    let series = yearly_breakdown(subset, Dimension::Scenario);
    let years: BTreeSet<i64> = series.values().flat_map(|by_year| by_year.keys().copied()).collect();
    let colors = ColorMap::new(&series.keys().cloned().collect());

    // Bars are stacked by position, so every series carries every year.
    let mut charts: Vec<BarChart> = Vec::with_capacity(series.len());
    for (scenario, by_year) in &series {
        let bars: Vec<Bar> = years
            .iter()
            .map(|year| {
                let cost = by_year.get(year).copied().unwrap_or(0.0);
                Bar::new(*year as f64, cost).width(0.6)
            })
            .collect();

        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars)
            .name(scenario.to_string())
            .color(colors.color_for(scenario))
            .stack_on(&below);
        charts.push(chart);
    }

    Plot::new("cogm_by_year")
        .legend(Legend::default())
        .height(260.0)
        .x_axis_label("Year")
        .y_axis_label("COGM Cost ($M)")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}
