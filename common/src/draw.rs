//! Draw policy: who may open which fortune, and how a draw is delivered.
//!
//! A draw is select → record participation → mark opened → deliver. The
//! caller must hold exclusive access to the ledger for the whole sequence;
//! a delivery failure is rolled back before this module returns.

use std::future::Future;

use chrono::{SubsecRound, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::fortune::{Fortune, FortuneId, ParticipantId};
use crate::ledger::FortuneLedger;
use crate::store::LedgerStore;

/// The collaborator could not hand the fortune to the participant.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct DeliveryError(pub String);

/// Sends a drawn fortune to the participant (a direct message in a chat).
pub trait Courier: Send + Sync {
    fn deliver(
        &self,
        participant: &ParticipantId,
        fortune: &Fortune,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Whether `open_specific` only looks a fortune up or actually redeems it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only lookup: no participation gate, no state change.
    Inspect,
    /// Open the fortune for the participant and deliver it.
    Redeem,
}

/// Pick an eligible fortune for `participant` uniformly among unopened ones.
pub fn choose<S, R>(
    ledger: &FortuneLedger<S>,
    participant: &ParticipantId,
    rng: &mut R,
) -> Result<FortuneId, LedgerError>
where
    S: LedgerStore,
    R: Rng + ?Sized,
{
    if ledger.has_participated(participant) {
        return Err(LedgerError::AlreadyParticipated(participant.clone()));
    }
    if ledger.list().is_empty() {
        return Err(LedgerError::PoolEmpty);
    }
    let unopened: Vec<&Fortune> = ledger.list().iter().filter(|f| !f.is_opened()).collect();
    unopened
        .choose(rng)
        .map(|f| f.id.clone())
        .ok_or(LedgerError::PoolExhausted)
}

/// Draw a random unopened fortune for `participant` and deliver it.
pub async fn draw<S, C, R>(
    ledger: &mut FortuneLedger<S>,
    participant: &ParticipantId,
    courier: &C,
    rng: &mut R,
) -> Result<Fortune, LedgerError>
where
    S: LedgerStore,
    C: Courier,
    R: Rng + ?Sized,
{
    let id = choose(ledger, participant, rng)?;
    claim_and_deliver(ledger, participant, &id, courier).await
}

/// Like `draw`, but the caller names the fortune.
pub async fn open_specific<S, C>(
    ledger: &mut FortuneLedger<S>,
    participant: &ParticipantId,
    id: &FortuneId,
    mode: OpenMode,
    courier: &C,
) -> Result<Fortune, LedgerError>
where
    S: LedgerStore,
    C: Courier,
{
    match mode {
        OpenMode::Inspect => inspect(ledger, id),
        OpenMode::Redeem => {
            if ledger.has_participated(participant) {
                return Err(LedgerError::AlreadyParticipated(participant.clone()));
            }
            let fortune = inspect(ledger, id)?;
            if fortune.is_opened() {
                return Err(LedgerError::AlreadyOpened(fortune.id));
            }
            claim_and_deliver(ledger, participant, id, courier).await
        }
    }
}

/// Read-only lookup used by the `info` path.
pub fn inspect<S: LedgerStore>(
    ledger: &FortuneLedger<S>,
    id: &FortuneId,
) -> Result<Fortune, LedgerError> {
    ledger
        .get_by_id(id)
        .cloned()
        .ok_or_else(|| LedgerError::NotFound(id.clone()))
}

async fn claim_and_deliver<S, C>(
    ledger: &mut FortuneLedger<S>,
    participant: &ParticipantId,
    id: &FortuneId,
    courier: &C,
) -> Result<Fortune, LedgerError>
where
    S: LedgerStore,
    C: Courier,
{
    // Whole seconds, matching what the store keeps.
    let opened = ledger.claim(id, participant, Utc::now().trunc_subsecs(0))?;
    match courier.deliver(participant, &opened).await {
        Ok(()) => {
            info!(fortune_id = %id, %participant, "Delivered fortune");
            Ok(opened)
        }
        Err(e) => {
            warn!(fortune_id = %id, %participant, error = %e, "Delivery failed");
            ledger.unclaim(id, participant)?;
            Err(LedgerError::DeliveryFailed(e.0))
        }
    }
}
