pub mod allocator;
pub mod defaults;
pub mod draw;
pub mod error;
pub mod fortune;
pub mod ledger;
pub mod maintenance;
pub mod store;

pub use error::{LedgerError, StoreError};
pub use fortune::{Fortune, FortuneId, FortuneStatus, LedgerSnapshot, ParticipantId};
pub use ledger::FortuneLedger;
