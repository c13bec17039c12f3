//! Reply text for chat responses.

use fortune_common::Fortune;
use fortune_router::{paginate, FortuneResponse};

/// Shape of the paginated listing.
#[derive(Debug, Clone, Copy)]
pub struct ListingShape {
    pub row_width: usize,
    pub rows_per_page: usize,
}

/// The direct message a participant receives for a drawn fortune.
pub fn fortune_dm(fortune: &Fortune) -> String {
    format!(
        "**Here's your fortune!**\n(Fortune ID: {})\n\n{}",
        fortune.id, fortune.text
    )
}

pub fn reply(response: &FortuneResponse, shape: ListingShape) -> String {
    match response {
        FortuneResponse::Added(f) => format!("Added fortune with ID: {}!", f.id),
        FortuneResponse::Removed(f) => format!("Removed fortune with ID: {}!", f.id),
        FortuneResponse::Listing(snapshot) => {
            let pages = paginate(&snapshot.fortunes, shape.row_width, shape.rows_per_page);
            if pages.is_empty() {
                return "There are no fortunes!".to_string();
            }
            pages
                .iter()
                .map(|p| p.render())
                .collect::<Vec<_>>()
                .join("\n\n")
        }
        FortuneResponse::Cleared { .. } => "Cleared all fortunes!".to_string(),
        FortuneResponse::Shuffled => "Shuffled all fortunes!".to_string(),
        FortuneResponse::Cleaned { removed } => format!("Removed {removed} opened fortunes!"),
        FortuneResponse::Info(f) => format!(
            "**Fortune ID:** {}\n**Status:** {}",
            f.id,
            if f.is_opened() { "Opened" } else { "Closed" }
        ),
        FortuneResponse::Drawn(f) => {
            format!("Check your DMs for your fortune! (Fortune ID: {})", f.id)
        }
        FortuneResponse::Unparticipated(who) => format!("{who} can draw a fortune again!"),
        FortuneResponse::Help(text) => text.to_string(),
    }
}
