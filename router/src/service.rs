use fortune_common::draw::{self, Courier, OpenMode};
use fortune_common::store::LedgerStore;
use fortune_common::{Fortune, FortuneLedger, LedgerError, LedgerSnapshot, ParticipantId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::command::{FortuneRequest, HELP};

/// Success payload for each request. Rendering is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FortuneResponse {
    Added(Fortune),
    Removed(Fortune),
    Listing(LedgerSnapshot),
    Cleared { removed: usize },
    Shuffled,
    Cleaned { removed: usize },
    Info(Fortune),
    Drawn(Fortune),
    Unparticipated(ParticipantId),
    Help(&'static str),
}

struct State<S> {
    ledger: FortuneLedger<S>,
    rng: StdRng,
}

/// Shared handle to the ledger.
///
/// Reads (`list`, `info`) share a read lock. Everything else, including the
/// whole draw sequence and its rollback, runs under the write lock.
pub struct FortuneService<S, C> {
    state: RwLock<State<S>>,
    courier: C,
}

impl<S, C> FortuneService<S, C>
where
    S: LedgerStore + Send + Sync,
    C: Courier,
{
    pub fn new(ledger: FortuneLedger<S>, courier: C) -> Self {
        Self::with_rng(ledger, courier, StdRng::from_entropy())
    }

    pub fn with_rng(ledger: FortuneLedger<S>, courier: C, rng: StdRng) -> Self {
        Self {
            state: RwLock::new(State { ledger, rng }),
            courier,
        }
    }

    pub fn courier(&self) -> &C {
        &self.courier
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.state.read().await.ledger.snapshot()
    }

    pub async fn has_participated(&self, participant: &ParticipantId) -> bool {
        self.state.read().await.ledger.has_participated(participant)
    }

    /// Run one request on behalf of `author`.
    pub async fn handle(
        &self,
        author: &ParticipantId,
        request: FortuneRequest,
    ) -> Result<FortuneResponse, LedgerError> {
        debug!(%author, ?request, read_only = request.is_read_only(), "Handling request");
        match request {
            FortuneRequest::Help => Ok(FortuneResponse::Help(HELP)),
            FortuneRequest::List => {
                let state = self.state.read().await;
                Ok(FortuneResponse::Listing(state.ledger.snapshot()))
            }
            FortuneRequest::Info(id) => {
                let state = self.state.read().await;
                draw::inspect(&state.ledger, &id).map(FortuneResponse::Info)
            }
            FortuneRequest::Add { text } => {
                let mut guard = self.state.write().await;
                let State { ledger, rng } = &mut *guard;
                ledger.add(&text, rng).map(FortuneResponse::Added)
            }
            FortuneRequest::Remove(id) => {
                let mut guard = self.state.write().await;
                guard.ledger.remove_by_id(&id).map(FortuneResponse::Removed)
            }
            FortuneRequest::Clear => {
                let mut guard = self.state.write().await;
                let removed = guard.ledger.clear()?;
                Ok(FortuneResponse::Cleared { removed })
            }
            FortuneRequest::Shuffle => {
                let mut guard = self.state.write().await;
                let State { ledger, rng } = &mut *guard;
                ledger.shuffle(rng)?;
                Ok(FortuneResponse::Shuffled)
            }
            FortuneRequest::Clean => {
                let mut guard = self.state.write().await;
                let removed = guard.ledger.prune()?;
                Ok(FortuneResponse::Cleaned { removed })
            }
            FortuneRequest::Random => {
                let mut guard = self.state.write().await;
                let State { ledger, rng } = &mut *guard;
                draw::draw(ledger, author, &self.courier, rng)
                    .await
                    .map(FortuneResponse::Drawn)
            }
            FortuneRequest::Redeem(id) => {
                let mut guard = self.state.write().await;
                draw::open_specific(&mut guard.ledger, author, &id, OpenMode::Redeem, &self.courier)
                    .await
                    .map(FortuneResponse::Drawn)
            }
            FortuneRequest::Unparticipate(target) => {
                let who = target.unwrap_or_else(|| author.clone());
                let mut guard = self.state.write().await;
                if guard.ledger.reset_participant(&who)? {
                    Ok(FortuneResponse::Unparticipated(who))
                } else {
                    Err(LedgerError::NotParticipated(who))
                }
            }
        }
    }
}
