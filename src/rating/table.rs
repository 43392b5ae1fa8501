//! Extraction of a student's row from the rating table page.

use crate::rating::Field;
use crate::rating::RatingFields;
use crate::rating::SENTINEL;
use crate::rating::html::Document;

/// Finds the row whose record-book cell matches `student_id` and extracts
/// every [`Field`] by column index.
///
/// A row matches when any of its cells reads exactly `student_id`, whether the
/// number is plain cell text or the text of a link inside the cell. Rows with
/// fewer than `min_columns` cells carry no rating and yield `None`.
pub fn parse_student_row(html: &str, student_id: &str, min_columns: usize) -> Option<RatingFields> {
    let doc = Document::new(html);
    let whole = (0, doc.raw().len());

    let cells = doc.blocks("tr", whole).into_iter().find_map(|row| {
        let cells: Vec<String> = doc
            .blocks("td", row)
            .into_iter()
            .map(|cell| doc.text(cell))
            .collect();
        cells.iter().any(|c| c == student_id).then_some(cells)
    })?;

    if cells.len() < min_columns {
        return None;
    }

    Some(
        Field::ALL
            .iter()
            .map(|&field| (field, cell_or_sentinel(&cells, field.column())))
            .collect(),
    )
}

fn cell_or_sentinel(cells: &[String], index: usize) -> String {
    match cells.get(index) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => SENTINEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> String {
        let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
        format!("<tr>{tds}</tr>")
    }

    fn page(rows: &[String]) -> String {
        format!(
            "<html><body><table><tr><th>№</th><th>Зачётка</th></tr>{}</table></body></html>",
            rows.concat()
        )
    }

    fn full_row(number: &str, id_cell: &str) -> Vec<String> {
        let mut cells: Vec<String> = (0..31).map(|i| format!("c{i}")).collect();
        cells[0] = number.to_string();
        cells[1] = id_cell.to_string();
        cells[30] = "отлично".to_string();
        cells
    }

    #[test]
    fn test_extracts_fields_by_column() {
        let other = full_row("1", "<a href=\"#\">111111</a>");
        let mine = full_row("2", "<a href=\"#\">123456</a>");
        let html = page(&[
            row(&other.iter().map(String::as_str).collect::<Vec<_>>()),
            row(&mine.iter().map(String::as_str).collect::<Vec<_>>()),
        ]);

        let fields = parse_student_row(&html, "123456", 3).expect("row should be found");

        assert_eq!(fields.len(), Field::ALL.len());
        assert_eq!(fields.get(Field::ListNumber), Some("2"));
        assert_eq!(fields.get(Field::RecordBook), Some("123456"));
        assert_eq!(fields.get(Field::Lectures(1)), Some("c3"));
        assert_eq!(fields.get(Field::CheckpointTotal(3)), Some("c17"));
        assert_eq!(fields.get(Field::OverallRating), Some("c29"));
        assert_eq!(fields.get(Field::Grade), Some("отлично"));
    }

    #[test]
    fn test_matches_plain_cell_text() {
        let mine = full_row("7", "123456");
        let html = page(&[row(&mine.iter().map(String::as_str).collect::<Vec<_>>())]);

        let fields = parse_student_row(&html, "123456", 3).expect("row should be found");
        assert_eq!(fields.get(Field::ListNumber), Some("7"));
    }

    #[test]
    fn test_short_and_empty_cells_become_sentinel() {
        let html = page(&[row(&["3", "123456", "", "  ", "15"])]);

        let fields = parse_student_row(&html, "123456", 3).expect("row should be found");
        assert_eq!(fields.get(Field::Lectures(1)), Some(SENTINEL));
        assert_eq!(fields.get(Field::Practicals(1)), Some("15"));
        assert_eq!(fields.get(Field::Grade), Some(SENTINEL));
    }

    #[test]
    fn test_narrow_row_is_not_found() {
        let html = page(&[row(&["1", "123456"])]);
        assert!(parse_student_row(&html, "123456", 3).is_none());
    }

    #[test]
    fn test_unknown_student_is_not_found() {
        let mine = full_row("1", "123456");
        let html = page(&[row(&mine.iter().map(String::as_str).collect::<Vec<_>>())]);
        assert!(parse_student_row(&html, "654321", 3).is_none());
        assert!(parse_student_row("", "654321", 3).is_none());
    }

    #[test]
    fn test_partial_number_does_not_match() {
        let mine = full_row("1", "1234567");
        let html = page(&[row(&mine.iter().map(String::as_str).collect::<Vec<_>>())]);
        assert!(parse_student_row(&html, "123456", 3).is_none());
    }
}
