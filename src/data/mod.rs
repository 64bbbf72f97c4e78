/// Data layer: core types, upload, filtering, paging and export.
///
/// Architecture:
/// ```text
///   picked .csv
///        │
///        ▼
///   ┌──────────┐
///   │  upload   │  multipart POST → JSON → ResultSet
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ ResultSet  │  Vec<Row>, header from first row
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐      ┌──────────┐
///   │  filter   │ ───▶ │   view    │  date prefix → page slice
///   └──────────┘      └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  filtered rows → CSV → FileSink
///   └──────────┘
/// ```

pub mod export;
pub mod filter;
pub mod model;
pub mod upload;
pub mod view;
