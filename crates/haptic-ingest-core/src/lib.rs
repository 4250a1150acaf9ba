//! Telemetry source trait and the per-stream frame channels used by the bridge

use model::{PhysicsFrame, Stream};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type FrameTx = crossbeam_channel::Sender<PhysicsFrame>;
pub type FrameRx = crossbeam_channel::Receiver<PhysicsFrame>;

/// Trait for any live source connector
#[async_trait::async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn run(&self, sinks: StreamSinks) -> Result<(), IngestError>;
}

/// Bounded channel for one stream.
pub fn channel(capacity: usize) -> (FrameTx, FrameRx) {
    crossbeam_channel::bounded(capacity)
}

/// Outcome of handing a frame to its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// the stream's pump is behind, frame dropped
    Dropped,
    /// the stream's pump is gone
    Closed,
}

/// Senders for the motion and telemetry streams. Frames never block the
/// source: a full stream drops the frame so the other stream keeps flowing.
#[derive(Debug, Clone)]
pub struct StreamSinks {
    motion: FrameTx,
    telemetry: FrameTx,
    tap: Option<FrameTx>,
}

/// Receiving ends matching a [`StreamSinks`].
#[derive(Debug)]
pub struct StreamReceivers {
    pub motion: FrameRx,
    pub telemetry: FrameRx,
}

impl StreamSinks {
    pub fn new(motion: FrameTx, telemetry: FrameTx) -> Self {
        Self { motion, telemetry, tap: None }
    }

    /// Copies every frame to `tap` as well (capture). A full tap loses
    /// frames, it never holds back the pumps.
    pub fn with_tap(mut self, tap: FrameTx) -> Self {
        self.tap = Some(tap);
        self
    }

    pub fn send(&self, frame: PhysicsFrame) -> Delivery {
        let stream = frame.stream();
        if let Some(tap) = &self.tap {
            if let Err(crossbeam_channel::TrySendError::Full(_)) = tap.try_send(frame) {
                debug!(frame_id = frame.frame_id, "capture tap full, frame not recorded");
            }
        }
        let tx = match stream {
            Stream::Motion => &self.motion,
            Stream::Telemetry => &self.telemetry,
        };
        match tx.try_send(frame) {
            Ok(()) => Delivery::Sent,
            Err(crossbeam_channel::TrySendError::Full(_)) => {
                debug!(?stream, frame_id = frame.frame_id, "stream full, dropping frame");
                Delivery::Dropped
            }
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => Delivery::Closed,
        }
    }
}

/// Creates the two stream channels, each holding up to `capacity` frames.
pub fn stream_channels(capacity: usize) -> (StreamSinks, StreamReceivers) {
    let (motion_tx, motion_rx) = channel(capacity);
    let (telemetry_tx, telemetry_rx) = channel(capacity);
    (
        StreamSinks::new(motion_tx, telemetry_tx),
        StreamReceivers { motion: motion_rx, telemetry: telemetry_rx },
    )
}
