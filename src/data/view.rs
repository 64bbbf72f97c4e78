use super::filter::filtered_indices;
use super::model::{ResultSet, Row};

/// Fixed page size of the result table.
pub const ROWS_PER_PAGE: usize = 15;

// ---------------------------------------------------------------------------
// View state: filter prefix + page cursor
// ---------------------------------------------------------------------------

/// What happens to the page cursor when the filter prefix changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPagePolicy {
    /// Keep the current page; only a new result set resets it. A narrow
    /// filter may then leave the cursor past the last page.
    #[default]
    KeepPage,
    /// Jump back to page 1 whenever the prefix changes.
    ResetToFirst,
}

/// User-controlled view parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Date prefix (`YYYY-MM-DD` or any leading part of it). Empty = no filter.
    pub filter_prefix: String,
    /// 1-based page cursor.
    pub current_page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filter_prefix: String::new(),
            current_page: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived view
// ---------------------------------------------------------------------------

/// Everything the table needs to render one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedView {
    /// Indices (into the result set) of all rows passing the filter.
    pub filtered_indices: Vec<usize>,
    /// Indices of the rows on the current page.
    pub visible_indices: Vec<usize>,
    pub total_pages: usize,
    pub current_page: usize,
}

/// Number of pages needed for `n` rows; zero rows means zero pages.
pub fn total_pages(n: usize) -> usize {
    n.div_ceil(ROWS_PER_PAGE)
}

/// Compute filter, page slice and page count from the current state.
pub fn derive_view(result: &ResultSet, view: &ViewState) -> DerivedView {
    let filtered = filtered_indices(result, &view.filter_prefix);
    let total_pages = total_pages(filtered.len());

    let start = view
        .current_page
        .saturating_sub(1)
        .saturating_mul(ROWS_PER_PAGE)
        .min(filtered.len());
    let end = start.saturating_add(ROWS_PER_PAGE).min(filtered.len());
    let visible = filtered[start..end].to_vec();

    DerivedView {
        filtered_indices: filtered,
        visible_indices: visible,
        total_pages,
        current_page: view.current_page,
    }
}

impl DerivedView {
    /// "Previous" is enabled from page 2 on.
    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    /// "Next" is enabled while the cursor is before the last page.
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Whether the page navigation should be shown at all.
    pub fn shows_navigation(&self) -> bool {
        !self.filtered_indices.is_empty()
    }

    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.current_page, self.total_pages)
    }

    /// All filtered rows in result order (what gets exported).
    pub fn filtered_rows<'a>(&self, result: &'a ResultSet) -> Vec<&'a Row> {
        self.filtered_indices
            .iter()
            .filter_map(|&i| result.rows.get(i))
            .collect()
    }

    /// Rows on the current page.
    pub fn visible_rows<'a>(&self, result: &'a ResultSet) -> Vec<&'a Row> {
        self.visible_indices
            .iter()
            .filter_map(|&i| result.rows.get(i))
            .collect()
    }
}
