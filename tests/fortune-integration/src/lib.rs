use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use fortune_common::draw::{Courier, DeliveryError};
use fortune_common::store::{Collection, JsonFileStore, LedgerStore};
use fortune_common::{Fortune, ParticipantId, StoreError};
use serde_json::Value;


pub fn pid(name: &str) -> ParticipantId {
    ParticipantId::new(name).unwrap()
}

/// Courier that records every delivery and refuses participants whose DMs
/// are closed.
#[derive(Default)]
pub struct RecordingCourier {
    delivered: Mutex<Vec<(ParticipantId, Fortune)>>,
    closed: Mutex<HashSet<ParticipantId>>,
}

impl RecordingCourier {
    pub fn close_dms(&self, participant: &ParticipantId) {
        self.closed.lock().unwrap().insert(participant.clone());
    }

    pub fn open_dms(&self, participant: &ParticipantId) {
        self.closed.lock().unwrap().remove(participant);
    }

    pub fn delivered(&self) -> Vec<(ParticipantId, Fortune)> {
        self.delivered.lock().unwrap().clone()
    }
}

impl Courier for RecordingCourier {
    async fn deliver(
        &self,
        participant: &ParticipantId,
        fortune: &Fortune,
    ) -> Result<(), DeliveryError> {
        if self.closed.lock().unwrap().contains(participant) {
            return Err(DeliveryError(format!("{participant} has DMs closed")));
        }
        tokio::task::yield_now().await;
        self.delivered
            .lock()
            .unwrap()
            .push((participant.clone(), fortune.clone()));
        Ok(())
    }
}

/// File store whose writes fail while the shared switch is on.
pub struct FlakyStore {
    inner: JsonFileStore,
    down: Arc<AtomicBool>,
}

impl FlakyStore {
    /// Returns the store and the switch that takes it down.
    pub fn new(inner: JsonFileStore) -> (Self, Arc<AtomicBool>) {
        let down = Arc::new(AtomicBool::new(false));
        let store = Self {
            inner,
            down: down.clone(),
        };
        (store, down)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("disk detached".into()))
        } else {
            Ok(())
        }
    }
}

impl LedgerStore for FlakyStore {
    fn get(&self, collection: Collection) -> Result<Option<Vec<Value>>, StoreError> {
        self.inner.get(collection)
    }

    fn set(&mut self, collection: Collection, items: Vec<Value>) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set(collection, items)
    }

    fn append(&mut self, collection: Collection, item: Value) -> Result<(), StoreError> {
        self.check()?;
        self.inner.append(collection, item)
    }
}
