use std::io::Write;

use fortune_common::draw::{Courier, DeliveryError};
use fortune_common::{Fortune, ParticipantId};

use crate::render;

/// Delivers fortunes as `[dm -> <participant>]` blocks on stdout.
pub struct StdoutCourier;

impl Courier for StdoutCourier {
    async fn deliver(
        &self,
        participant: &ParticipantId,
        fortune: &Fortune,
    ) -> Result<(), DeliveryError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "[dm -> {participant}]\n{}", render::fortune_dm(fortune))
            .and_then(|()| out.flush())
            .map_err(|e| DeliveryError(format!("failed to message {participant}: {e}")))
    }
}
