use super::model::ResultSet;

// ---------------------------------------------------------------------------
// Date-prefix filter
// ---------------------------------------------------------------------------

/// Return indices of rows whose `start_time` begins with `prefix`.
///
/// A row passes when:
/// * `prefix` is empty → every row passes (no constraint)
/// * the text of its `start_time` starts with `prefix` literally
///
/// A row without `start_time` only passes the empty prefix. No date parsing
/// takes place: `"2024-01"` matches `"2024-01-15T..."` but not `"2024-02-01T..."`.
pub fn filtered_indices(result: &ResultSet, prefix: &str) -> Vec<usize> {
    if prefix.is_empty() {
        return (0..result.len()).collect();
    }
    result
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            row.start_time()
                .is_some_and(|start| start.starts_with(prefix))
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Row};

    fn rows_starting_at(starts: &[&str]) -> ResultSet {
        ResultSet::from_rows(
            starts
                .iter()
                .map(|s| {
                    [
                        ("start_time", CellValue::from(*s)),
                        ("State", CellValue::from("NY")),
                    ]
                    .into_iter()
                    .collect::<Row>()
                })
                .collect(),
        )
    }

    #[test]
    fn test_empty_prefix_is_identity() {
        let rs = rows_starting_at(&["2024-01-05T00:00:00", "2023-12-31T23:00:00"]);
        assert_eq!(filtered_indices(&rs, ""), vec![0, 1]);
    }

    #[test]
    fn test_day_prefix_selects_matching_rows() {
        let rs = rows_starting_at(&[
            "2024-01-05T00:00:00",
            "2024-01-06T00:00:00",
            "2024-01-05T23:59:00",
        ]);
        assert_eq!(filtered_indices(&rs, "2024-01-05"), vec![0, 2]);
    }

    #[test]
    fn test_month_prefix_is_literal_not_a_range() {
        let rs = rows_starting_at(&[
            "2024-01-05T10:00:00",
            "2024-01-15T10:00:00",
            "2024-02-01T10:00:00",
        ]);
        assert_eq!(filtered_indices(&rs, "2024-01"), vec![0, 1]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let rs = rows_starting_at(&["2024-01-05T00:00:00", "2024-01-06T00:00:00"]);
        let first = filtered_indices(&rs, "2024-01-06");
        let second = filtered_indices(&rs, "2024-01-06");
        assert_eq!(first, second);
    }

    #[test]
    fn test_row_without_start_time_only_matches_empty_prefix() {
        let mut rs = rows_starting_at(&["2024-01-05T00:00:00"]);
        rs.rows
            .push([("State", CellValue::from("CA"))].into_iter().collect());

        assert_eq!(filtered_indices(&rs, ""), vec![0, 1]);
        assert_eq!(filtered_indices(&rs, "2024"), vec![0]);
    }
}
