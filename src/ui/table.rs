use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

/// Scrollable, striped grid of text cells. `cell(row, column)` supplies
/// the text.
pub fn data_table(
    ui: &mut Ui,
    id: &str,
    columns: &[String],
    n_rows: usize,
    cell: impl Fn(usize, usize) -> String,
) {
    ui.push_id(id, |ui: &mut Ui| {
        egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(240.0)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .columns(Column::auto().at_least(60.0), columns.len())
                .header(20.0, |mut header| {
                    for name in columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, n_rows, |mut row| {
                        let r = row.index();
                        for c in 0..columns.len() {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell(r, c));
                            });
                        }
                    });
                });
        });
    });
}
