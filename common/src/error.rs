//! Error types shared by the ledger, the draw policy and the stores.

use crate::fortune::{FortuneId, ParticipantId};

/// Errors from the persistence collaborator. Never masked by the ledger.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored collection is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Everything a ledger operation can fail with.
///
/// All variants except `Storage` are recoverable at the command layer and map
/// to a reply for the user.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Empty text, missing argument or malformed identifier.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("fortune {0} does not exist")]
    NotFound(FortuneId),

    #[error("fortune {0} has already been opened")]
    AlreadyOpened(FortuneId),

    #[error("{0} has already drawn a fortune")]
    AlreadyParticipated(ParticipantId),

    #[error("there are no fortunes")]
    PoolEmpty,

    #[error("every fortune has been opened")]
    PoolExhausted,

    #[error("{0} has not drawn a fortune")]
    NotParticipated(ParticipantId),

    /// The fortune could not be handed to the participant; the draw was
    /// rolled back.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("no free fortune ID left")]
    AllocationExhausted,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl LedgerError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Only storage failures should stop the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Reply text for the person who issued the command.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => format!("Invalid input: {msg}"),
            Self::NotFound(_) => "That fortune ID does not exist!".to_string(),
            Self::AlreadyOpened(id) => format!("Fortune {id} has already been opened!"),
            Self::AlreadyParticipated(_) => "You have already drawn a fortune!".to_string(),
            Self::PoolEmpty => "There are no fortunes!".to_string(),
            Self::PoolExhausted => "All fortunes have been opened!".to_string(),
            Self::NotParticipated(who) => format!("{who} has not drawn a fortune."),
            Self::DeliveryFailed(_) => {
                "I couldn't send you your fortune. Check your DMs and try again.".to_string()
            }
            Self::AllocationExhausted => "No more fortunes can be added.".to_string(),
            Self::Storage(_) => "Storage is unavailable.".to_string(),
        }
    }
}
