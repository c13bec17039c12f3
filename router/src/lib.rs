//! Command routing for the fortune ledger.
//!
//! Chat messages are parsed once into a closed set of [`FortuneRequest`]s and
//! executed by a [`FortuneService`], which serializes every mutation of the
//! shared ledger.

pub mod command;
pub mod listing;
pub mod service;

pub use command::{ChatMessage, CommandSyntax, FortuneRequest};
pub use listing::{paginate, ListingCell, ListingPage};
pub use service::{FortuneResponse, FortuneService};
