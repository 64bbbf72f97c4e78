use eframe::egui::{Align, Color32, Layout, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::view::DerivedView;
use crate::state::ViewModel;

const TOWER_JUMP: &str = "tower_jump";

// ---------------------------------------------------------------------------
// Result table (central panel)
// ---------------------------------------------------------------------------

/// Render the current page of the result set.
pub fn result_table(ui: &mut Ui, state: &ViewModel, view: &DerivedView) {
    let result = match &state.result {
        Some(rs) => rs,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Upload a CSV file to see results  (File → Upload CSV…)");
            });
            return;
        }
    };

    if result.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("The service returned no rows.");
        });
        return;
    }
    if view.filtered_indices.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No rows match the current filter.");
        });
        return;
    }
    if view.visible_indices.is_empty() {
        ui.label(format!(
            "Page {} is past the last page ({}). Use Previous to go back.",
            view.current_page, view.total_pages
        ));
        return;
    }

    let columns = &result.column_names;
    let rows = view.visible_rows(result);

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(Layout::left_to_right(Align::Center))
            .columns(Column::auto().at_least(80.0), columns.len())
            .header(20.0, |mut header| {
                for col in columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(col);
                    });
                }
            })
            .body(|mut body| {
                for row in rows {
                    body.row(18.0, |mut table_row| {
                        for col in columns {
                            table_row.col(|ui: &mut Ui| {
                                let text = row.get(col).map(|v| v.text()).unwrap_or_default();
                                if col == TOWER_JUMP && text == "yes" {
                                    ui.label(RichText::new(text.as_ref()).color(Color32::LIGHT_RED).strong());
                                } else {
                                    ui.label(text.as_ref());
                                }
                            });
                        }
                    });
                }
            });
    });
}
