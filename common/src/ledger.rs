use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::allocator::TokenAllocator;
use crate::error::{LedgerError, StoreError};
use crate::fortune::{Fortune, FortuneId, FortuneStatus, LedgerSnapshot, ParticipantId};
use crate::store::{self, Collection, LedgerStore};

/// Sole owner of the fortune pool and of the participation set.
///
/// Every mutation is written to the store before the in-memory copy changes,
/// so a failed write leaves the ledger exactly as it was and the storage
/// error is returned unchanged.
#[derive(Debug)]
pub struct FortuneLedger<S> {
    store: S,
    fortunes: Vec<Fortune>,
    participants: BTreeSet<ParticipantId>,
    allocator: TokenAllocator,
}

impl<S: LedgerStore> FortuneLedger<S> {
    /// Load both collections. Missing collections start empty.
    pub fn load(store: S) -> Result<Self, LedgerError> {
        let fortunes = store::load::<Fortune>(&store, Collection::Fortunes)?.unwrap_or_default();
        let participants = store::load::<ParticipantId>(&store, Collection::Participants)?
            .unwrap_or_default()
            .into_iter()
            .collect();
        let ledger = Self {
            store,
            fortunes,
            participants,
            allocator: TokenAllocator::default(),
        };
        info!(
            fortunes = ledger.fortunes.len(),
            participants = ledger.participants.len(),
            "Loaded fortune ledger"
        );
        Ok(ledger)
    }

    /// Load, and if the fortune collection has never been written, fill it
    /// with `defaults`. An existing but empty collection stays empty.
    pub fn load_or_seed<R: Rng + ?Sized>(
        store: S,
        defaults: &[String],
        rng: &mut R,
    ) -> Result<Self, LedgerError> {
        let seeded = store.get(Collection::Fortunes)?.is_none();
        let mut ledger = Self::load(store)?;
        if seeded {
            let mut fortunes: Vec<Fortune> = Vec::with_capacity(defaults.len());
            for text in defaults.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
                let id = {
                    let existing: HashSet<&FortuneId> = fortunes.iter().map(|f| &f.id).collect();
                    ledger.allocator.allocate(&existing, rng)?
                };
                fortunes.push(Fortune::new(id, text));
            }
            ledger.replace_fortunes(fortunes)?;
            info!(count = ledger.fortunes.len(), "Seeded ledger with default fortunes");
        }
        Ok(ledger)
    }

    pub fn with_allocator(mut self, allocator: TokenAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ─── Fortunes ───────────────────────────────────────────────────────────

    /// Append a new unopened fortune with a freshly allocated ID.
    pub fn add<R: Rng + ?Sized>(&mut self, text: &str, rng: &mut R) -> Result<Fortune, LedgerError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LedgerError::invalid_input("you need to provide a fortune"));
        }
        let id = {
            let existing: HashSet<&FortuneId> = self.fortunes.iter().map(|f| &f.id).collect();
            self.allocator.allocate(&existing, rng)?
        };
        let fortune = Fortune::new(id, text);
        let encoded = serde_json::to_value(&fortune).map_err(StoreError::from)?;
        self.store.append(Collection::Fortunes, encoded)?;
        self.fortunes.push(fortune.clone());
        info!(fortune_id = %fortune.id, "Added fortune");
        Ok(fortune)
    }

    /// Delete a fortune and hand back the removed record. Participation is
    /// left alone.
    pub fn remove_by_id(&mut self, id: &FortuneId) -> Result<Fortune, LedgerError> {
        let idx = self
            .position(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        let mut next = self.fortunes.clone();
        let removed = next.remove(idx);
        self.replace_fortunes(next)?;
        info!(fortune_id = %id, "Removed fortune");
        Ok(removed)
    }

    pub fn get_by_id(&self, id: &FortuneId) -> Option<&Fortune> {
        self.fortunes.iter().find(|f| &f.id == id)
    }

    /// Fortunes in ledger order (insertion order unless shuffled).
    pub fn list(&self) -> &[Fortune] {
        &self.fortunes
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            fortunes: self.fortunes.clone(),
            participants: self.participants.clone(),
        }
    }

    /// Empty the pool. Returns how many fortunes were dropped.
    pub fn clear(&mut self) -> Result<usize, LedgerError> {
        let removed = self.fortunes.len();
        self.replace_fortunes(Vec::new())?;
        info!(count = removed, "Cleared all fortunes");
        Ok(removed)
    }

    /// The single, irreversible transition every fortune undergoes.
    pub fn mark_opened(
        &mut self,
        id: &FortuneId,
        participant: &ParticipantId,
        at: DateTime<Utc>,
    ) -> Result<Fortune, LedgerError> {
        let idx = self
            .position(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        let mut next = self.fortunes.clone();
        next[idx].open(participant.clone(), at)?;
        let opened = next[idx].clone();
        self.replace_fortunes(next)?;
        info!(fortune_id = %id, %participant, "Fortune opened");
        Ok(opened)
    }

    // ─── Participation ──────────────────────────────────────────────────────

    pub fn has_participated(&self, participant: &ParticipantId) -> bool {
        self.participants.contains(participant)
    }

    pub fn participants(&self) -> &BTreeSet<ParticipantId> {
        &self.participants
    }

    /// Idempotent. Returns true if the participant was not yet recorded.
    pub fn record_participation(&mut self, participant: &ParticipantId) -> Result<bool, LedgerError> {
        if self.participants.contains(participant) {
            return Ok(false);
        }
        self.store.append(
            Collection::Participants,
            serde_json::Value::String(participant.as_str().to_owned()),
        )?;
        self.participants.insert(participant.clone());
        debug!(%participant, "Recorded participation");
        Ok(true)
    }

    /// Returns whether the participant was present. The caller decides
    /// whether `false` is an error.
    pub fn clear_participation(&mut self, participant: &ParticipantId) -> Result<bool, LedgerError> {
        if !self.participants.contains(participant) {
            return Ok(false);
        }
        let mut next = self.participants.clone();
        next.remove(participant);
        self.replace_participants(next)?;
        info!(%participant, "Cleared participation");
        Ok(true)
    }

    // ─── Draw support ───────────────────────────────────────────────────────

    /// Open `id` for `participant` and record the participation as one step.
    ///
    /// Participation is written before the fortune is opened, and `unclaim`
    /// reopens before it forgets the participant. Whichever write fails, the
    /// only partial state left behind (in memory and in the store alike) is a
    /// recorded participant next to an unopened fortune. A fortune is never
    /// opened by someone missing from the participant set.
    pub(crate) fn claim(
        &mut self,
        id: &FortuneId,
        participant: &ParticipantId,
        at: DateTime<Utc>,
    ) -> Result<Fortune, LedgerError> {
        let recorded = self.record_participation(participant)?;
        match self.mark_opened(id, participant, at) {
            Ok(opened) => Ok(opened),
            Err(e) => {
                if recorded {
                    if let Err(revert) = self.clear_participation(participant) {
                        warn!(
                            fortune_id = %id,
                            %participant,
                            error = %revert,
                            "Participant left recorded after failed claim"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// Undo a `claim`: the fortune goes back to unopened and the participant
    /// is forgotten. Only the draw rollback path uses this.
    pub(crate) fn unclaim(
        &mut self,
        id: &FortuneId,
        participant: &ParticipantId,
    ) -> Result<(), LedgerError> {
        self.reopen(id)?;
        self.clear_participation(participant)?;
        warn!(fortune_id = %id, %participant, "Rolled back draw");
        Ok(())
    }

    fn reopen(&mut self, id: &FortuneId) -> Result<(), LedgerError> {
        let idx = self
            .position(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        let mut next = self.fortunes.clone();
        next[idx].status = FortuneStatus::Unopened;
        self.replace_fortunes(next)
    }

    // ─── Persistence ────────────────────────────────────────────────────────

    /// Persist `next` as the whole fortune collection, then adopt it.
    pub(crate) fn replace_fortunes(&mut self, next: Vec<Fortune>) -> Result<(), LedgerError> {
        let encoded = store::encode(&next)?;
        self.store.set(Collection::Fortunes, encoded)?;
        self.fortunes = next;
        Ok(())
    }

    fn replace_participants(&mut self, next: BTreeSet<ParticipantId>) -> Result<(), LedgerError> {
        let encoded = store::encode(&next)?;
        self.store.set(Collection::Participants, encoded)?;
        self.participants = next;
        Ok(())
    }

    fn position(&self, id: &FortuneId) -> Option<usize> {
        self.fortunes.iter().position(|f| &f.id == id)
    }
}
