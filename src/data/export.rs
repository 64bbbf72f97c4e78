use std::path::PathBuf;

use anyhow::{Context, Result};

use super::model::Row;

/// File name offered for every export.
pub const EXPORT_FILE_NAME: &str = "filtered_result.csv";

/// MIME type of the exported text.
pub const CSV_MIME: &str = "text/csv";

// ---------------------------------------------------------------------------
// Save-file capability
// ---------------------------------------------------------------------------

/// Somewhere an exported file can be handed to.
pub trait FileSink {
    /// Persist `content` under `name`.
    ///
    /// Returns the written path, or `None` when the user backed out.
    fn save_file(&mut self, name: &str, content: &str, mime: &str) -> Result<Option<PathBuf>>;
}

/// Asks for a destination with the native save dialog.
#[derive(Debug, Default)]
pub struct DialogSink;

impl FileSink for DialogSink {
    fn save_file(&mut self, name: &str, content: &str, _mime: &str) -> Result<Option<PathBuf>> {
        let target = rfd::FileDialog::new()
            .set_title("Export filtered rows")
            .set_file_name(name)
            .add_filter("CSV", &["csv"])
            .save_file();

        let Some(path) = target else {
            return Ok(None);
        };
        std::fs::write(&path, content)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(Some(path))
    }
}

/// Writes straight into a fixed directory, overwriting an existing file.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSink for DirectorySink {
    fn save_file(&mut self, name: &str, content: &str, _mime: &str) -> Result<Option<PathBuf>> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(Some(path))
    }
}

// ---------------------------------------------------------------------------
// CSV encoding
// ---------------------------------------------------------------------------

/// How field values are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvQuoting {
    /// Values are joined as-is. A comma, quote or newline inside a value
    /// breaks the column alignment of that line.
    #[default]
    Verbatim,
    /// Fields containing a comma, quote or newline are quoted and embedded
    /// quotes doubled.
    Standard,
}

/// Encode `rows` as CSV text.
///
/// The header is the key order of the first row. Every row is written with
/// that header: a missing key gives an empty cell, extra keys are dropped.
/// Lines are separated by `\n` with no trailing newline. No rows gives an
/// empty string.
pub fn to_csv(rows: &[&Row], quoting: CsvQuoting) -> Result<String> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let headers: Vec<&str> = first.keys().collect();
    let records = rows.iter().map(|row| {
        headers
            .iter()
            .map(|&h| row.get(h).map(|v| v.to_string()).unwrap_or_default())
            .collect::<Vec<String>>()
    });

    match quoting {
        CsvQuoting::Verbatim => {
            let mut lines = Vec::with_capacity(rows.len() + 1);
            lines.push(headers.join(","));
            lines.extend(records.map(|fields| fields.join(",")));
            Ok(lines.join("\n"))
        }
        CsvQuoting::Standard => {
            let mut writer = csv::WriterBuilder::new()
                .terminator(csv::Terminator::Any(b'\n'))
                .quote_style(csv::QuoteStyle::Necessary)
                .from_writer(Vec::new());
            writer.write_record(&headers).context("writing CSV header")?;
            for (row_no, fields) in records.enumerate() {
                writer
                    .write_record(&fields)
                    .with_context(|| format!("writing CSV row {row_no}"))?;
            }
            let bytes = writer.into_inner().context("flushing CSV writer")?;
            let mut text = String::from_utf8(bytes).context("CSV output is not UTF-8")?;
            if text.ends_with('\n') {
                text.pop();
            }
            Ok(text)
        }
    }
}

// ---------------------------------------------------------------------------
// Export entry-point
// ---------------------------------------------------------------------------

/// What an export attempt amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing matched the filter; the sink was not touched.
    NothingToExport,
    /// The sink declined (e.g. the save dialog was cancelled).
    Cancelled,
    Saved { rows: usize, path: PathBuf },
}

/// Encode `rows` and hand them to `sink` as [`EXPORT_FILE_NAME`].
pub fn export_rows(
    rows: &[&Row],
    sink: &mut dyn FileSink,
    quoting: CsvQuoting,
) -> Result<ExportOutcome> {
    if rows.is_empty() {
        return Ok(ExportOutcome::NothingToExport);
    }
    let content = to_csv(rows, quoting)?;
    match sink.save_file(EXPORT_FILE_NAME, &content, CSV_MIME)? {
        Some(path) => Ok(ExportOutcome::Saved {
            rows: rows.len(),
            path,
        }),
        None => Ok(ExportOutcome::Cancelled),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::model::CellValue;

    /// Keeps every saved file in memory.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        pub saved: Vec<(String, String, String)>,
    }

    impl FileSink for RecordingSink {
        fn save_file(&mut self, name: &str, content: &str, mime: &str) -> Result<Option<PathBuf>> {
            self.saved
                .push((name.to_string(), content.to_string(), mime.to_string()));
            Ok(Some(PathBuf::from(name)))
        }
    }

    fn row(fields: &[(&str, CellValue)]) -> Row {
        fields.iter().cloned().collect()
    }

    #[test]
    fn test_homogeneous_rows() {
        let rows = [
            row(&[("a", 1_i64.into()), ("b", 2_i64.into())]),
            row(&[("a", 3_i64.into()), ("b", 4_i64.into())]),
        ];
        let refs: Vec<&Row> = rows.iter().collect();
        assert_eq!(to_csv(&refs, CsvQuoting::Verbatim).unwrap(), "a,b\n1,2\n3,4");
    }

    #[test]
    fn test_missing_key_gives_empty_cell() {
        let rows = [
            row(&[("a", 1_i64.into()), ("b", 2_i64.into())]),
            row(&[("a", 3_i64.into())]),
        ];
        let refs: Vec<&Row> = rows.iter().collect();
        assert_eq!(to_csv(&refs, CsvQuoting::Verbatim).unwrap(), "a,b\n1,2\n3,");
    }

    #[test]
    fn test_extra_keys_of_later_rows_are_dropped() {
        let rows = [
            row(&[("a", 1_i64.into())]),
            row(&[("a", 2_i64.into()), ("z", "extra".into())]),
        ];
        let refs: Vec<&Row> = rows.iter().collect();
        assert_eq!(to_csv(&refs, CsvQuoting::Verbatim).unwrap(), "a\n1\n2");
    }

    #[test]
    fn test_header_follows_first_row_order() {
        let rows = [row(&[
            ("start_time", "2024-01-05T10:00:00".into()),
            ("end_time", "2024-01-05T10:20:00".into()),
            ("State", "NY".into()),
            ("tower_jump", "no".into()),
            ("confidence", 0.67.into()),
        ])];
        let refs: Vec<&Row> = rows.iter().collect();
        assert_eq!(
            to_csv(&refs, CsvQuoting::Verbatim).unwrap(),
            "start_time,end_time,State,tower_jump,confidence\n\
             2024-01-05T10:00:00,2024-01-05T10:20:00,NY,no,0.67"
        );
    }

    #[test]
    fn test_verbatim_does_not_escape_commas() {
        let rows = [row(&[("name", "Kansas City, MO".into()), ("n", 1_i64.into())])];
        let refs: Vec<&Row> = rows.iter().collect();
        assert_eq!(
            to_csv(&refs, CsvQuoting::Verbatim).unwrap(),
            "name,n\nKansas City, MO,1"
        );
    }

    #[test]
    fn test_standard_quotes_special_fields() {
        let rows = [
            row(&[("name", "Kansas City, MO".into()), ("note", "say \"hi\"".into())]),
            row(&[("name", "two\nlines".into()), ("note", "plain".into())]),
        ];
        let refs: Vec<&Row> = rows.iter().collect();
        assert_eq!(
            to_csv(&refs, CsvQuoting::Standard).unwrap(),
            "name,note\n\"Kansas City, MO\",\"say \"\"hi\"\"\"\n\"two\nlines\",plain"
        );
    }

    #[test]
    fn test_standard_matches_verbatim_for_plain_values() {
        let rows = [
            row(&[("a", 1_i64.into()), ("b", 2_i64.into())]),
            row(&[("a", 3_i64.into())]),
        ];
        let refs: Vec<&Row> = rows.iter().collect();
        assert_eq!(to_csv(&refs, CsvQuoting::Standard).unwrap(), "a,b\n1,2\n3,");
    }

    #[test]
    fn test_export_of_nothing_never_touches_sink() {
        let mut sink = RecordingSink::default();
        let outcome = export_rows(&[], &mut sink, CsvQuoting::Verbatim).unwrap();
        assert_eq!(outcome, ExportOutcome::NothingToExport);
        assert!(sink.saved.is_empty());
    }

    #[test]
    fn test_export_hands_csv_to_sink() {
        let rows = [row(&[("a", 1_i64.into()), ("b", 2_i64.into())])];
        let refs: Vec<&Row> = rows.iter().collect();
        let mut sink = RecordingSink::default();

        let outcome = export_rows(&refs, &mut sink, CsvQuoting::Verbatim).unwrap();
        assert_eq!(
            outcome,
            ExportOutcome::Saved {
                rows: 1,
                path: PathBuf::from(EXPORT_FILE_NAME)
            }
        );
        assert_eq!(
            sink.saved,
            vec![(
                EXPORT_FILE_NAME.to_string(),
                "a,b\n1,2".to_string(),
                CSV_MIME.to_string()
            )]
        );
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let target = dir.path().join("exports");
        let mut sink = DirectorySink::new(&target);
        let rows = [row(&[("a", 1_i64.into())])];
        let refs: Vec<&Row> = rows.iter().collect();

        let outcome = export_rows(&refs, &mut sink, CsvQuoting::Verbatim).unwrap();
        let expected = target.join(EXPORT_FILE_NAME);
        assert_eq!(
            outcome,
            ExportOutcome::Saved {
                rows: 1,
                path: expected.clone()
            }
        );
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "a\n1");
    }
}
