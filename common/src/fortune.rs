use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Longest hex token accepted from user input.
pub const MAX_ID_LEN: usize = 32;

/// Unique fortune identifier (lowercase hex token).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FortuneId(String);

impl FortuneId {
    /// Parse an identifier typed by a user. Accepts 1..=32 hex digits in any
    /// case and normalizes to lowercase.
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let raw = raw.trim();
        if Self::looks_like_id(raw) {
            Ok(Self(raw.to_ascii_lowercase()))
        } else {
            Err(LedgerError::invalid_input(format!(
                "`{raw}` is not a fortune ID"
            )))
        }
    }

    /// True if `raw` has the shape of a fortune ID. Used by the router to
    /// tell a direct redemption apart from a misspelled subcommand.
    pub fn looks_like_id(raw: &str) -> bool {
        !raw.is_empty()
            && raw.len() <= MAX_ID_LEN
            && raw.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Wrap a token produced by the allocator, which is already lowercase hex.
    pub(crate) fn from_token(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FortuneId {
    type Error = LedgerError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<FortuneId> for String {
    fn from(id: FortuneId) -> Self {
        id.0
    }
}

impl fmt::Display for FortuneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An identifiable community member who may draw one fortune per epoch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(raw: impl Into<String>) -> Result<Self, LedgerError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::invalid_input("participant ID must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = LedgerError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a single fortune. `Opened` is terminal.
///
/// Who opened the fortune and when are carried by the variant itself, so a
/// fortune can never be opened without both being known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FortuneStatus {
    #[default]
    Unopened,
    Opened {
        by: ParticipantId,
        /// Seconds since the Unix epoch on the wire.
        #[serde(with = "chrono::serde::ts_seconds")]
        at: DateTime<Utc>,
    },
}

impl FortuneStatus {
    /// Returns true if transitioning from self to `next` is valid.
    pub fn can_transition_to(&self, next: &FortuneStatus) -> bool {
        matches!(
            (self, next),
            (FortuneStatus::Unopened, FortuneStatus::Opened { .. })
        )
    }
}

/// A single textual message that can be drawn once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fortune {
    pub id: FortuneId,
    pub text: String,
    #[serde(default)]
    pub status: FortuneStatus,
}

impl Fortune {
    pub fn new(id: FortuneId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            status: FortuneStatus::Unopened,
        }
    }

    pub fn is_opened(&self) -> bool {
        matches!(self.status, FortuneStatus::Opened { .. })
    }

    pub fn opened_by(&self) -> Option<&ParticipantId> {
        match &self.status {
            FortuneStatus::Opened { by, .. } => Some(by),
            FortuneStatus::Unopened => None,
        }
    }

    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        match &self.status {
            FortuneStatus::Opened { at, .. } => Some(*at),
            FortuneStatus::Unopened => None,
        }
    }

    /// Apply the one transition a fortune ever makes.
    pub(crate) fn open(
        &mut self,
        by: ParticipantId,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let next = FortuneStatus::Opened { by, at };
        if !self.status.can_transition_to(&next) {
            return Err(LedgerError::AlreadyOpened(self.id.clone()));
        }
        self.status = next;
        Ok(())
    }
}

/// Immutable copy of the whole ledger, in ledger order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub fortunes: Vec<Fortune>,
    pub participants: BTreeSet<ParticipantId>,
}

impl LedgerSnapshot {
    pub fn opened_count(&self) -> usize {
        self.fortunes.iter().filter(|f| f.is_opened()).count()
    }

    pub fn unopened_count(&self) -> usize {
        self.fortunes.len() - self.opened_count()
    }
}
