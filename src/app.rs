use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use chrono::NaiveDate;
use eframe::egui;

use crate::config::AppConfig;
use crate::data::export::{DialogSink, DirectorySink, FileSink};
use crate::data::upload::{spawn_health_check, spawn_upload, ServiceEvent, UploadClient};
use crate::state::{Status, ViewModel};
use crate::ui::panels::{self, UiAction};
use crate::ui::table;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TowerViewApp {
    pub state: ViewModel,
    config: AppConfig,
    /// None when the configured endpoint is unusable.
    client: Option<Arc<UploadClient>>,
    events_tx: Sender<ServiceEvent>,
    events_rx: Receiver<ServiceEvent>,
    /// Date shown in the picker next to the filter box.
    picker_date: NaiveDate,
}

impl TowerViewApp {
    pub fn new(config: AppConfig) -> Self {
        let mut state = ViewModel::new(config.filter_page_policy(), config.csv_quoting());

        let client = match config
            .upload_url()
            .and_then(|url| UploadClient::new(url).map_err(anyhow::Error::from))
        {
            Ok(client) => {
                log::info!("Uploading to {}", client.upload_url());
                Some(Arc::new(client))
            }
            Err(e) => {
                log::error!("Cannot set up upload client: {e:#}");
                state.status = Some(Status::Error(format!("Upload disabled: {e:#}")));
                None
            }
        };

        let (events_tx, events_rx) = mpsc::channel();
        Self {
            state,
            config,
            client,
            events_tx,
            events_rx,
            picker_date: chrono::Local::now().date_naive(),
        }
    }

    fn start_upload(&mut self, path: PathBuf, ctx: &egui::Context) {
        let Some(client) = &self.client else {
            self.state.status = Some(Status::Error("No usable upload endpoint".to_string()));
            return;
        };
        self.state.upload_started();
        let ctx = ctx.clone();
        spawn_upload(client.clone(), path, self.events_tx.clone(), move || {
            ctx.request_repaint()
        });
    }

    fn start_health_check(&mut self, ctx: &egui::Context) {
        let Some(client) = &self.client else {
            self.state.status = Some(Status::Error("No usable upload endpoint".to_string()));
            return;
        };
        let ctx = ctx.clone();
        spawn_health_check(client.clone(), self.events_tx.clone(), move || {
            ctx.request_repaint()
        });
    }

    fn export(&mut self) {
        let mut sink: Box<dyn FileSink> = match &self.config.export_dir {
            Some(dir) => Box::new(DirectorySink::new(dir.clone())),
            None => Box::new(DialogSink),
        };
        let outcome = self.state.export(sink.as_mut());
        self.state.record_export(outcome);
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.state.apply_event(event);
        }
    }

    fn handle(&mut self, action: Option<UiAction>, ctx: &egui::Context) {
        match action {
            Some(UiAction::Upload(path)) => self.start_upload(path, ctx),
            Some(UiAction::CheckHealth) => self.start_health_check(ctx),
            Some(UiAction::Export) => self.export(),
            None => {}
        }
    }
}

impl eframe::App for TowerViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        // ---- Top panel: menu bar ----
        let action = egui::TopBottomPanel::top("top_bar")
            .show(ctx, |ui| panels::top_bar(ui, &self.state))
            .inner;
        self.handle(action, ctx);

        // ---- Filter bar ----
        let action = egui::TopBottomPanel::top("filter_bar")
            .show(ctx, |ui| panels::filter_bar(ui, &mut self.state, &mut self.picker_date))
            .inner;
        self.handle(action, ctx);

        // Derive after the filter may have changed this frame.
        let view = self.state.derive();

        // ---- Bottom panel: page navigation ----
        egui::TopBottomPanel::bottom("page_nav").show(ctx, |ui| {
            panels::page_nav(ui, &mut self.state, &view);
        });

        // ---- Central panel: result table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::result_table(ui, &self.state, &view);
        });
    }
}
