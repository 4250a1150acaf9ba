//! Per-stream event pump: classify a frame, route each event, drive the playlist.

use crate::playlist::Playlist;
use crate::router::route;
use analysis::{finish_events, Classifier};
use crossbeam_channel::Receiver;
use model::{FeedbackEvent, PhysicsFrame, Stream};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// What one frame turned into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub events: usize,
    pub routed: usize,
    pub failed: usize,
}

/// Owns the classifier state of one stream. Frames of that stream must go
/// through a single pump, in arrival order.
#[derive(Debug)]
pub struct EventPump {
    classifier: Classifier,
    playlist: Arc<Playlist>,
    session_uid: Option<u64>,
    /// Assets whose stop failed on the device. Retried on every frame until
    /// it succeeds or the asset becomes active again.
    pending_stops: Vec<&'static str>,
}

impl EventPump {
    pub fn new(stream: Stream, playlist: Arc<Playlist>) -> Self {
        Self {
            classifier: Classifier::new(stream),
            playlist,
            session_uid: None,
            pending_stops: Vec::new(),
        }
    }

    pub fn stream(&self) -> Stream {
        self.classifier.stream()
    }

    /// Events produced by the last processed frame of this stream.
    pub fn last_batch(&self) -> &[FeedbackEvent] {
        self.classifier.previous()
    }

    pub fn pending_stops(&self) -> &[&'static str] {
        &self.pending_stops
    }

    /// Classifies `frame` and applies its events in classifier order.
    /// Device failures are logged and do not stop the remaining events.
    ///
    /// A frame from a new session first stops everything the old session
    /// left active, so the new one starts from a clean state.
    pub fn process(&mut self, frame: &PhysicsFrame) -> FrameReport {
        let mut report = FrameReport::default();
        if frame.stream() != self.stream() {
            return report;
        }
        if self.session_uid.is_some_and(|uid| uid != frame.session_uid) {
            info!(stream = ?self.stream(), session_uid = frame.session_uid, "new session");
            for marker in finish_events(self.classifier.previous(), Vec::new()) {
                apply(&self.playlist, &mut self.pending_stops, frame, &marker, &mut report);
            }
            self.classifier.reset();
        }
        self.session_uid = Some(frame.session_uid);

        let events = self.classifier.classify(frame);
        report.events = events.len();
        retry_stops(&self.playlist, &mut self.pending_stops, events, &mut report);
        for event in events {
            apply(&self.playlist, &mut self.pending_stops, frame, event, &mut report);
        }
        report
    }

    /// Processes frames until every sender of `rx` is gone. Returns the
    /// number of frames handled.
    pub fn run(mut self, rx: &Receiver<PhysicsFrame>) -> u64 {
        let stream = self.stream();
        debug!(?stream, "pump started");
        let mut frames = 0u64;
        for frame in rx.iter() {
            self.process(&frame);
            frames += 1;
        }
        debug!(?stream, frames, "pump finished");
        frames
    }
}

fn apply(
    playlist: &Playlist,
    pending_stops: &mut Vec<&'static str>,
    frame: &PhysicsFrame,
    event: &FeedbackEvent,
    report: &mut FrameReport,
) {
    let Some(asset) = route(event) else {
        trace!(kind = ?event.kind, "no asset for event");
        return;
    };
    report.routed += 1;
    let result = if event.is_end_marker() {
        playlist.stop(asset)
    } else {
        playlist.play(asset, event.continuous, event.intensity_percent, event.frequency_percent)
    };
    if let Err(e) = result {
        warn!(frame_id = frame.frame_id, error = %e, "haptic update failed");
        report.failed += 1;
        if event.is_end_marker() && !pending_stops.contains(&asset) {
            pending_stops.push(asset);
        }
    }
}

fn retry_stops(
    playlist: &Playlist,
    pending_stops: &mut Vec<&'static str>,
    events: &[FeedbackEvent],
    report: &mut FrameReport,
) {
    pending_stops.retain(|&asset| {
        if events.iter().any(|e| e.enabled && route(e) == Some(asset)) {
            return false;
        }
        match playlist.stop(asset) {
            Ok(()) => {
                debug!(asset, "stop retried");
                false
            }
            Err(e) => {
                debug!(asset, error = %e, "stop retry failed");
                report.failed += 1;
                true
            }
        }
    });
}
