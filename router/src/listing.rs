//! Splits a ledger snapshot into pages of ID cells for a paginated listing.

use fortune_common::{Fortune, FortuneId};
use serde::Serialize;

pub const DEFAULT_ROW_WIDTH: usize = 5;
pub const DEFAULT_ROWS_PER_PAGE: usize = 3;

const UNOPENED_MARK: &str = "🍪";
const OPENED_MARK: &str = "📜";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingCell {
    pub id: FortuneId,
    pub opened: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingPage {
    /// 1-based.
    pub number: usize,
    pub total: usize,
    pub rows: Vec<Vec<ListingCell>>,
}

impl ListingPage {
    pub fn render(&self) -> String {
        let mut out = String::from("📜 Fortunes\n\n");
        for row in &self.rows {
            let line: Vec<String> = row
                .iter()
                .map(|cell| {
                    let mark = if cell.opened { OPENED_MARK } else { UNOPENED_MARK };
                    format!("{mark} {}", cell.id)
                })
                .collect();
            out.push_str(&line.join("  "));
            out.push('\n');
        }
        out.push_str(&format!("\nPage {} of {}", self.number, self.total));
        out
    }
}

/// Chunk `fortunes` into rows of `row_width` cells and pages of
/// `rows_per_page` rows. Zero sizes are treated as 1. An empty slice yields
/// no pages.
pub fn paginate(fortunes: &[Fortune], row_width: usize, rows_per_page: usize) -> Vec<ListingPage> {
    let row_width = row_width.max(1);
    let rows_per_page = rows_per_page.max(1);

    let rows: Vec<Vec<ListingCell>> = fortunes
        .chunks(row_width)
        .map(|chunk| {
            chunk
                .iter()
                .map(|f| ListingCell {
                    id: f.id.clone(),
                    opened: f.is_opened(),
                })
                .collect()
        })
        .collect();

    let total = rows.len().div_ceil(rows_per_page);
    rows.chunks(rows_per_page)
        .enumerate()
        .map(|(i, page_rows)| ListingPage {
            number: i + 1,
            total,
            rows: page_rows.to_vec(),
        })
        .collect()
}
