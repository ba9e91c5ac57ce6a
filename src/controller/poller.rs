//! Polling consumer: a fixed-cadence task that encodes extension frames and
//! broadcasts them to any number of read-only subscribers.

use crate::controller::emulated::ControllerError;
use crate::extension::Extension;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Poller settings.
#[derive(Clone, Debug)]
pub struct PollerSettings {
    pub interval_ms: u64,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self { interval_ms: 10 }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("frame encoding failed: {0}")]
    Encode(#[from] ControllerError),

    #[error("all frame subscribers dropped")]
    ChannelClosed,
}

/// One encoded extension frame as delivered to subscribers. Each tick
/// replaces the previous frame; there is no staleness bound beyond one poll
/// interval.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtensionFrame {
    pub bytes: Vec<u8>,
}

/// Public handle for the polling task.
pub struct PollerHandle {
    frame_receiver: watch::Receiver<ExtensionFrame>,
}

impl PollerHandle {
    /// Spawn the poller for one extension peripheral.
    pub fn spawn(extension: Arc<dyn Extension>, settings: Option<PollerSettings>) -> Self {
        let settings = settings.unwrap_or_default();
        info!(
            "Spawning state poller for '{}' at {} ms cadence",
            extension.name(),
            settings.interval_ms
        );

        let (frame_sender, frame_receiver) = watch::channel(ExtensionFrame::default());
        tokio::spawn(async move {
            if let Err(e) = run_poller_loop(extension, settings, frame_sender).await {
                error!("State poller terminated: {}", e);
            }
        });

        Self { frame_receiver }
    }

    /// Get a receiver for encoded frames.
    pub fn subscribe(&self) -> watch::Receiver<ExtensionFrame> {
        debug!("New subscriber to extension frames");
        self.frame_receiver.clone()
    }
}

async fn run_poller_loop(
    extension: Arc<dyn Extension>,
    settings: PollerSettings,
    frame_sender: watch::Sender<ExtensionFrame>,
) -> Result<(), PollerError> {
    let mut interval_timer =
        tokio::time::interval(tokio::time::Duration::from_millis(settings.interval_ms));
    let mut frame = ExtensionFrame {
        bytes: vec![0; extension.frame_len()],
    };

    info!("Entering poller loop");
    loop {
        interval_timer.tick().await;

        extension.encode_frame(&mut frame.bytes)?;
        debug!("Polled frame: {:02X?}", frame.bytes);

        if frame_sender.send(frame.clone()).is_err() {
            return Err(PollerError::ChannelClosed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ClassicController;

    #[tokio::test]
    async fn poller_broadcasts_encoded_frames() {
        let pad = Arc::new(ClassicController::new());
        {
            let mut state = pad.controller().state_lock();
            state.group_mut_by_name("Buttons").unwrap().controls_mut()[0]
                .reference_mut()
                .set_input(1.0, 1);
        }

        let poller = PollerHandle::spawn(pad.clone(), Some(PollerSettings { interval_ms: 1 }));
        let mut frames = poller.subscribe();
        frames.changed().await.unwrap();

        let frame = frames.borrow().clone();
        assert_eq!(frame.bytes.len(), pad.frame_len());
        // Button field at the tail carries the inverted pressed-mask.
        let field = u16::from_le_bytes([frame.bytes[6], frame.bytes[7]]);
        assert_ne!(field, 0xFFFF);
    }
}
