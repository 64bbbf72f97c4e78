use std::path::PathBuf;

use chrono::NaiveDate;
use eframe::egui::{self, Button, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use crate::data::view::DerivedView;
use crate::state::{Status, ViewModel};

/// Something the panels ask the app to do outside of plain state edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Upload(PathBuf),
    CheckHealth,
    Export,
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &ViewModel) -> Option<UiAction> {
    let mut action = None;

    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Upload CSV…").clicked() {
                action = pick_upload_file().map(UiAction::Upload);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.result.is_some(), Button::new("Export filtered rows…"))
                .clicked()
            {
                action = Some(UiAction::Export);
                ui.close_menu();
            }
        });

        ui.menu_button("Service", |ui: &mut Ui| {
            if ui.button("Check service").clicked() {
                action = Some(UiAction::CheckHealth);
                ui.close_menu();
            }
        });

        ui.separator();

        match state.service_healthy {
            Some(true) => ui.label(RichText::new("● online").color(Color32::GREEN)),
            Some(false) => ui.label(RichText::new("● offline").color(Color32::RED)),
            None => ui.label(RichText::new("● unknown").color(Color32::GRAY)),
        };

        if state.pending_uploads > 0 {
            ui.spinner();
            ui.label(format!("{} upload(s) pending", state.pending_uploads));
        }

        ui.separator();

        match &state.status {
            Some(Status::Info(msg)) => {
                ui.label(msg);
            }
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            None => {}
        }
    });

    action
}

// ---------------------------------------------------------------------------
// Filter bar
// ---------------------------------------------------------------------------

/// Date-prefix filter, match count and the export button.
pub fn filter_bar(ui: &mut Ui, state: &mut ViewModel, picker_date: &mut NaiveDate) -> Option<UiAction> {
    let mut action = None;

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Start date");

        let mut prefix = state.view.filter_prefix.clone();
        let edit = ui.add(
            egui::TextEdit::singleline(&mut prefix)
                .hint_text("YYYY-MM-DD")
                .desired_width(110.0),
        );
        if edit.changed() {
            state.set_filter(prefix);
        }

        if ui
            .add(DatePickerButton::new(picker_date).id_salt("filter_date"))
            .changed()
        {
            state.set_filter(picker_date.format("%Y-%m-%d").to_string());
        }

        if ui
            .add_enabled(!state.view.filter_prefix.is_empty(), Button::new("Clear"))
            .clicked()
        {
            state.set_filter("");
        }

        ui.separator();

        if let Some(result) = &state.result {
            let matching = state.derive().filtered_indices.len();
            ui.label(format!("{} rows loaded, {matching} matching", result.len()));

            if ui.button("Export CSV").clicked() {
                action = Some(UiAction::Export);
            }
        }
    });

    action
}

// ---------------------------------------------------------------------------
// Page navigation
// ---------------------------------------------------------------------------

/// Previous / next buttons with the page indicator. Hidden when nothing
/// matches the filter.
pub fn page_nav(ui: &mut Ui, state: &mut ViewModel, view: &DerivedView) {
    if !view.shows_navigation() {
        return;
    }
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add_enabled(view.has_prev(), Button::new("◀ Previous"))
            .clicked()
        {
            state.prev_page();
        }
        ui.label(view.page_label());
        if ui
            .add_enabled(view.has_next(), Button::new("Next ▶"))
            .clicked()
        {
            state.next_page();
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn pick_upload_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Upload carrier records")
        .add_filter("CSV", &["csv"])
        .pick_file()
}
