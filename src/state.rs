use anyhow::Result;

use crate::data::export::{export_rows, CsvQuoting, ExportOutcome, FileSink};
use crate::data::model::ResultSet;
use crate::data::upload::ServiceEvent;
use crate::data::view::{derive_view, DerivedView, FilterPagePolicy, ViewState};

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Debug, Default)]
pub struct ViewModel {
    /// Rows of the last successful upload (None until the first one lands).
    pub result: Option<ResultSet>,

    /// Date filter and page cursor.
    pub view: ViewState,

    /// Page behaviour on filter changes.
    pub policy: FilterPagePolicy,

    /// Field quoting used by export.
    pub quoting: CsvQuoting,

    /// Status / error message shown in the UI.
    pub status: Option<Status>,

    /// Uploads sent but not answered yet.
    pub pending_uploads: usize,

    /// Outcome of the last health probe.
    pub service_healthy: Option<bool>,
}

impl ViewModel {
    pub fn new(policy: FilterPagePolicy, quoting: CsvQuoting) -> Self {
        Self {
            policy,
            quoting,
            ..Self::default()
        }
    }

    /// Replace the result set wholesale and go back to page 1.
    pub fn set_result(&mut self, result: ResultSet) {
        self.result = Some(result);
        self.view.current_page = 1;
    }

    /// Change the date prefix. The page is only reset under
    /// [`FilterPagePolicy::ResetToFirst`].
    pub fn set_filter(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        if prefix == self.view.filter_prefix {
            return;
        }
        self.view.filter_prefix = prefix;
        if self.policy == FilterPagePolicy::ResetToFirst {
            self.view.current_page = 1;
        }
    }

    /// Jump to a page; pages are 1-based so 0 becomes 1.
    pub fn set_page(&mut self, page: usize) {
        self.view.current_page = page.max(1);
    }

    pub fn next_page(&mut self) {
        if self.derive().has_next() {
            self.set_page(self.view.current_page + 1);
        }
    }

    pub fn prev_page(&mut self) {
        if self.derive().has_prev() {
            self.set_page(self.view.current_page - 1);
        }
    }

    /// Filtered rows, current page and page count for this frame.
    pub fn derive(&self) -> DerivedView {
        match &self.result {
            Some(result) => derive_view(result, &self.view),
            None => derive_view(&ResultSet::default(), &self.view),
        }
    }

    // -- uploads --

    pub fn upload_started(&mut self) {
        self.pending_uploads += 1;
        self.status = Some(Status::Info(format!(
            "Uploading… ({} pending)",
            self.pending_uploads
        )));
    }

    /// Apply a finished background request. Uploads are applied in arrival
    /// order, so the last one to finish wins.
    pub fn apply_event(&mut self, event: ServiceEvent) {
        match event {
            ServiceEvent::Uploaded { path, result } => {
                self.pending_uploads = self.pending_uploads.saturating_sub(1);
                match result {
                    Ok(result) => {
                        log::info!(
                            "Received {} rows with columns {:?} for {}",
                            result.len(),
                            result.column_names,
                            path.display()
                        );
                        self.status = Some(Status::Info(format!(
                            "Loaded {} rows from {}",
                            result.len(),
                            path.display()
                        )));
                        self.set_result(result);
                    }
                    Err(e) => {
                        log::error!("Upload of {} failed: {e:#}", path.display());
                        self.status = Some(Status::Error(format!("Upload failed: {e}")));
                    }
                }
            }
            ServiceEvent::Health(Ok(())) => {
                log::info!("Processing service is up");
                self.service_healthy = Some(true);
                self.status = Some(Status::Info("Service is reachable".to_string()));
            }
            ServiceEvent::Health(Err(e)) => {
                log::warn!("Health check failed: {e:#}");
                self.service_healthy = Some(false);
                self.status = Some(Status::Error(format!("Service unreachable: {e}")));
            }
        }
    }

    // -- export --

    /// Export every row matching the filter, regardless of the page shown.
    pub fn export(&self, sink: &mut dyn FileSink) -> Result<ExportOutcome> {
        let Some(result) = &self.result else {
            return Ok(ExportOutcome::NothingToExport);
        };
        let rows = self.derive().filtered_rows(result);
        export_rows(&rows, sink, self.quoting)
    }

    /// Log an export attempt and reflect it in the status line.
    pub fn record_export(&mut self, outcome: Result<ExportOutcome>) {
        match outcome {
            Ok(ExportOutcome::Saved { rows, path }) => {
                log::info!("Exported {rows} rows to {}", path.display());
                self.status = Some(Status::Info(format!(
                    "Exported {rows} rows to {}",
                    path.display()
                )));
            }
            Ok(ExportOutcome::Cancelled) => log::info!("Export cancelled"),
            Ok(ExportOutcome::NothingToExport) => log::debug!("No rows to export"),
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.status = Some(Status::Error(format!("Export failed: {e:#}")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::data::export::tests::RecordingSink;
    use crate::data::model::{CellValue, Row};
    use crate::data::upload::UploadError;
    use crate::data::view::ROWS_PER_PAGE;

    fn rows_on_days(days: &[u32]) -> ResultSet {
        ResultSet::from_rows(
            days.iter()
                .map(|d| {
                    [
                        ("start_time", CellValue::from(format!("2024-01-{d:02}T10:00:00"))),
                        ("State", CellValue::from("NY")),
                    ]
                    .into_iter()
                    .collect::<Row>()
                })
                .collect(),
        )
    }

    fn uploaded(name: &str, result: Result<ResultSet, UploadError>) -> ServiceEvent {
        ServiceEvent::Uploaded {
            path: PathBuf::from(name),
            result,
        }
    }

    #[test]
    fn test_set_result_resets_page() {
        let mut vm = ViewModel::default();
        vm.set_result(rows_on_days(&[1; 60]));
        vm.set_page(4);
        assert_eq!(vm.derive().current_page, 4);

        vm.set_result(rows_on_days(&[2; 5]));
        assert_eq!(vm.view.current_page, 1);
        assert_eq!(vm.derive().visible_indices.len(), 5);
    }

    #[test]
    fn test_filter_keeps_page_by_default() {
        let mut vm = ViewModel::default();
        let mut days = vec![1; 40];
        days.extend([2, 2]);
        vm.set_result(rows_on_days(&days));
        vm.set_page(3);

        vm.set_filter("2024-01-02");
        let view = vm.derive();
        assert_eq!(view.current_page, 3);
        assert_eq!(view.total_pages, 1);
        assert!(view.visible_indices.is_empty());
        // The way back is still open.
        assert!(view.has_prev());
    }

    #[test]
    fn test_filter_resets_page_when_configured() {
        let mut vm = ViewModel::new(FilterPagePolicy::ResetToFirst, CsvQuoting::Verbatim);
        vm.set_result(rows_on_days(&[1; 40]));
        vm.set_page(3);

        vm.set_filter("2024-01-01");
        assert_eq!(vm.view.current_page, 1);

        // Same prefix again is not a change.
        vm.set_page(2);
        vm.set_filter("2024-01-01");
        assert_eq!(vm.view.current_page, 2);
    }

    #[test]
    fn test_page_navigation_stays_in_bounds() {
        let mut vm = ViewModel::default();
        vm.set_result(rows_on_days(&[1; 3 * ROWS_PER_PAGE]));

        vm.prev_page();
        assert_eq!(vm.view.current_page, 1);
        vm.next_page();
        vm.next_page();
        vm.next_page();
        assert_eq!(vm.view.current_page, 3);

        vm.set_page(0);
        assert_eq!(vm.view.current_page, 1);
    }

    #[test]
    fn test_last_finished_upload_wins() {
        let mut vm = ViewModel::default();
        vm.upload_started();
        vm.upload_started();
        assert_eq!(vm.pending_uploads, 2);

        vm.apply_event(uploaded("second.csv", Ok(rows_on_days(&[2, 2]))));
        vm.apply_event(uploaded("first.csv", Ok(rows_on_days(&[1]))));

        assert_eq!(vm.pending_uploads, 0);
        assert_eq!(vm.result.as_ref().map(ResultSet::len), Some(1));
    }

    #[test]
    fn test_failed_upload_keeps_previous_result() {
        let mut vm = ViewModel::default();
        vm.set_result(rows_on_days(&[1, 2, 3]));
        vm.set_page(1);

        vm.upload_started();
        vm.apply_event(uploaded(
            "bad.csv",
            Err(UploadError::Status {
                status: 400,
                detail: "Invalid file type. Only CSV files are allowed.".to_string(),
            }),
        ));

        assert_eq!(vm.result.as_ref().map(ResultSet::len), Some(3));
        assert!(matches!(vm.status, Some(Status::Error(ref m)) if m.contains("Only CSV")));
    }

    #[test]
    fn test_health_event_updates_flag() {
        let mut vm = ViewModel::default();
        vm.apply_event(ServiceEvent::Health(Ok(())));
        assert_eq!(vm.service_healthy, Some(true));
        vm.apply_event(ServiceEvent::Health(Err(UploadError::Malformed("x".into()))));
        assert_eq!(vm.service_healthy, Some(false));
    }

    #[test]
    fn test_export_covers_all_filtered_rows() {
        let mut vm = ViewModel::default();
        let mut days = vec![5; 20];
        days.push(6);
        vm.set_result(rows_on_days(&days));
        vm.set_filter("2024-01-05");

        let mut sink = RecordingSink::default();
        let outcome = vm.export(&mut sink).unwrap();
        assert!(matches!(outcome, ExportOutcome::Saved { rows: 20, .. }));

        let (_, content, _) = &sink.saved[0];
        assert_eq!(content.lines().count(), 21);
        assert!(content.starts_with("start_time,State\n"));
        assert!(!content.contains("2024-01-06"));
    }

    #[test]
    fn test_export_without_matches_is_a_no_op() {
        let mut sink = RecordingSink::default();
        let mut vm = ViewModel::default();
        assert_eq!(vm.export(&mut sink).unwrap(), ExportOutcome::NothingToExport);

        vm.set_result(rows_on_days(&[1]));
        vm.set_filter("1999");
        assert_eq!(vm.export(&mut sink).unwrap(), ExportOutcome::NothingToExport);
        assert!(sink.saved.is_empty());

        vm.record_export(Ok(ExportOutcome::NothingToExport));
        assert!(vm.status.is_none());
    }
}
