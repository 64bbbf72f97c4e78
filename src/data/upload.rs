use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::Url;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{CellValue, ResultSet, Row};

/// Key of the row array in the service response.
pub const RESULT_FIELD: &str = "sync_result";

/// Multipart field name the service reads the file from.
const FILE_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0} is not a .csv file; only CSV files are accepted")]
    UnsupportedFile(String),

    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service answered {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Talks to the processing gateway.
#[derive(Debug, Clone)]
pub struct UploadClient {
    upload_url: Url,
    health_url: Url,
    http: reqwest::blocking::Client,
}

impl UploadClient {
    pub fn new(upload_url: Url) -> Result<Self, UploadError> {
        let http = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            health_url: health_url_for(&upload_url),
            upload_url,
            http,
        })
    }

    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    /// POST `path` as multipart field `file` and decode the returned rows.
    pub fn upload(&self, path: &Path) -> Result<ResultSet, UploadError> {
        if !is_csv(path) {
            return Err(UploadError::UnsupportedFile(path.display().to_string()));
        }
        let bytes = std::fs::read(path).map_err(|source| UploadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.csv")
            .to_string();

        log::info!(
            "Uploading {} ({} bytes) to {}",
            file_name,
            bytes.len(),
            self.upload_url
        );

        let part = Part::bytes(bytes).file_name(file_name).mime_str("text/csv")?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .http
            .post(self.upload_url.clone())
            .multipart(form)
            .send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(UploadError::Status {
                status: status.as_u16(),
                detail: error_detail(&body, status.canonical_reason()),
            });
        }
        parse_response(&body)
    }

    /// GET the gateway's `/health` endpoint; `Ok` when it reports `"ok"`.
    pub fn check_health(&self) -> Result<(), UploadError> {
        let response = self.http.get(self.health_url.clone()).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(UploadError::Status {
                status: status.as_u16(),
                detail: error_detail(&body, status.canonical_reason()),
            });
        }

        let root: JsonValue = serde_json::from_str(&body)
            .map_err(|e| UploadError::Malformed(format!("health body is not JSON: {e}")))?;
        match root.get("status").and_then(JsonValue::as_str) {
            Some("ok") => Ok(()),
            other => Err(UploadError::Malformed(format!(
                "unexpected health status {other:?}"
            ))),
        }
    }
}

/// `/health` on the same origin as the upload endpoint.
pub fn health_url_for(upload_url: &Url) -> Url {
    let mut url = upload_url.clone();
    url.set_path("/health");
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// The gateway only accepts files named `*.csv`.
pub fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

// ---------------------------------------------------------------------------
// Response decoding
// ---------------------------------------------------------------------------

/// Decode a success body: `{ "sync_result": [ {..row..}, ... ] }`.
///
/// A body without `sync_result` (or with `null`) is an empty result.
pub fn parse_response(body: &str) -> Result<ResultSet, UploadError> {
    let root: JsonValue = serde_json::from_str(body)
        .map_err(|e| UploadError::Malformed(format!("body is not JSON: {e}")))?;
    let obj = root
        .as_object()
        .ok_or_else(|| UploadError::Malformed("expected a JSON object".into()))?;

    let records = match obj.get(RESULT_FIELD) {
        None | Some(JsonValue::Null) => {
            log::warn!("Response has no '{RESULT_FIELD}' field, treating it as empty");
            return Ok(ResultSet::default());
        }
        Some(JsonValue::Array(records)) => records,
        Some(_) => {
            return Err(UploadError::Malformed(format!(
                "'{RESULT_FIELD}' is not an array"
            )))
        }
    };

    let rows = records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let fields = rec
                .as_object()
                .ok_or_else(|| UploadError::Malformed(format!("row {i} is not a JSON object")))?;
            Ok(fields
                .iter()
                .map(|(key, val)| (key.as_str(), json_to_cell(val)))
                .collect::<Row>())
        })
        .collect::<Result<Vec<Row>, UploadError>>()?;

    Ok(ResultSet::from_rows(rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

/// Human-readable reason from an error body (`{"detail": ...}`), falling back
/// to the raw body and then to the status reason.
fn error_detail(body: &str, reason: Option<&str>) -> String {
    if let Ok(root) = serde_json::from_str::<JsonValue>(body) {
        match root.get("detail") {
            Some(JsonValue::String(s)) => return s.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        reason.unwrap_or("no details").to_string()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Background dispatch
// ---------------------------------------------------------------------------

/// Results handed back to the UI thread.
#[derive(Debug)]
pub enum ServiceEvent {
    Uploaded {
        path: PathBuf,
        result: Result<ResultSet, UploadError>,
    },
    Health(Result<(), UploadError>),
}

/// Run an upload on its own thread. Every call is independent: nothing
/// cancels an earlier upload, so whichever finishes last is applied last.
pub fn spawn_upload(
    client: Arc<UploadClient>,
    path: PathBuf,
    tx: Sender<ServiceEvent>,
    on_done: impl FnOnce() + Send + 'static,
) {
    std::thread::spawn(move || {
        let result = client.upload(&path);
        // Receiver gone means the app is shutting down.
        let _ = tx.send(ServiceEvent::Uploaded { path, result });
        on_done();
    });
}

pub fn spawn_health_check(
    client: Arc<UploadClient>,
    tx: Sender<ServiceEvent>,
    on_done: impl FnOnce() + Send + 'static,
) {
    std::thread::spawn(move || {
        let _ = tx.send(ServiceEvent::Health(client.check_health()));
        on_done();
    });
}
