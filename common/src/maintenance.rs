//! Bulk maintenance over the ledger: reorder, prune spent fortunes, reset
//! participants.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::error::LedgerError;
use crate::fortune::{FortuneId, ParticipantId};
use crate::ledger::FortuneLedger;
use crate::store::LedgerStore;

impl<S: LedgerStore> FortuneLedger<S> {
    /// Uniformly permute the listing order (Fisher–Yates). IDs and opened
    /// state are untouched.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), LedgerError> {
        let mut next = self.list().to_vec();
        next.shuffle(rng);
        self.replace_fortunes(next)?;
        info!(count = self.list().len(), "Shuffled fortunes");
        Ok(())
    }

    /// Drop every opened fortune. Returns the removed count.
    pub fn prune(&mut self) -> Result<usize, LedgerError> {
        let before = self.list().len();
        let next: Vec<_> = self.list().iter().filter(|f| !f.is_opened()).cloned().collect();
        let removed = before - next.len();
        if removed > 0 {
            self.replace_fortunes(next)?;
        }
        info!(count = removed, "Pruned opened fortunes");
        Ok(removed)
    }

    /// Same as `clear_participation`.
    pub fn reset_participant(&mut self, participant: &ParticipantId) -> Result<bool, LedgerError> {
        self.clear_participation(participant)
    }

    /// IDs of opened fortunes, in ledger order.
    pub fn opened_ids(&self) -> Vec<FortuneId> {
        self.list()
            .iter()
            .filter(|f| f.is_opened())
            .map(|f| f.id.clone())
            .collect()
    }
}
