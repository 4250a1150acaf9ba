use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Context;
use haptic_ingest_core::{channel, stream_channels, StreamSinks};
use haptic_playlist::{route, EventPump, Playlist};
use iox::{EventRow, FrameRecorder};
use model::{PhysicsFrame, Stream};
use tracing::{info, warn};

/// Pump threads (one per stream) and the optional capture thread of a live run.
pub struct BridgeSession {
    playlist: Arc<Playlist>,
    pumps: Vec<(Stream, JoinHandle<u64>)>,
    recorder: Option<JoinHandle<anyhow::Result<u64>>>,
}

impl BridgeSession {
    /// Spawns the pumps and returns the sinks the source should feed. The
    /// session winds down once every clone of the sinks is dropped.
    pub fn start(
        playlist: Arc<Playlist>,
        capacity: usize,
        record: Option<PathBuf>,
    ) -> anyhow::Result<(StreamSinks, Self)> {
        let (mut sinks, rx) = stream_channels(capacity);

        let recorder = match record {
            Some(path) => {
                let mut rec = FrameRecorder::create(&path)?;
                let (tap_tx, tap_rx) = channel(capacity * 4);
                sinks = sinks.with_tap(tap_tx);
                info!(path = %path.display(), "recording frames");
                Some(
                    thread::Builder::new()
                        .name("capture".into())
                        .spawn(move || -> anyhow::Result<u64> {
                            for frame in tap_rx.iter() {
                                rec.record(&frame)?;
                            }
                            rec.finish()
                        })
                        .context("spawn capture thread")?,
                )
            }
            None => None,
        };

        let mut pumps = Vec::new();
        for (stream, frames) in [(Stream::Motion, rx.motion), (Stream::Telemetry, rx.telemetry)] {
            let pump = EventPump::new(stream, playlist.clone());
            let handle = thread::Builder::new()
                .name(format!("pump-{stream:?}").to_lowercase())
                .spawn(move || pump.run(&frames))
                .context("spawn pump thread")?;
            pumps.push((stream, handle));
        }

        Ok((sinks, Self { playlist, pumps, recorder }))
    }

    /// Waits for the pumps to drain, then releases every asset.
    pub fn finish(self) {
        for (stream, handle) in self.pumps {
            match handle.join() {
                Ok(frames) => info!(?stream, frames, "pump stopped"),
                Err(_) => warn!(?stream, "pump thread panicked"),
            }
        }
        if let Some(handle) = self.recorder {
            match handle.join() {
                Ok(Ok(frames)) => info!(frames, "capture closed"),
                Ok(Err(e)) => warn!(error = %e, "capture failed"),
                Err(_) => warn!("capture thread panicked"),
            }
        }
        self.playlist.shutdown();
    }
}

/// Runs recorded frames through fresh pumps, in file order, on the calling
/// thread. Returns every classified event.
pub fn replay(playlist: Arc<Playlist>, frames: &[PhysicsFrame]) -> Vec<EventRow> {
    let mut motion = EventPump::new(Stream::Motion, playlist.clone());
    let mut telemetry = EventPump::new(Stream::Telemetry, playlist);
    let mut rows = Vec::new();
    for frame in frames {
        let pump = match frame.stream() {
            Stream::Motion => &mut motion,
            Stream::Telemetry => &mut telemetry,
        };
        pump.process(frame);
        rows.extend(pump.last_batch().iter().map(|e| EventRow::new(frame, e, route(e))));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use haptic_playlist::{router, MemoryActuator, DEFAULT_ASSET_EXTENSION};
    use model::{CarTelemetrySample, MotionSample};

    fn playlist(dir: &std::path::Path) -> (Arc<MemoryActuator>, Arc<Playlist>) {
        for name in haptic_playlist::ROUTED_ASSETS {
            std::fs::write(dir.join(format!("{name}.{DEFAULT_ASSET_EXTENSION}")), b"asset").unwrap();
        }
        let actuator = Arc::new(MemoryActuator::new());
        let playlist = Playlist::load(actuator.clone(), dir, DEFAULT_ASSET_EXTENSION).unwrap();
        (actuator, Arc::new(playlist))
    }

    #[test]
    fn replay_emits_events_and_end_markers() {
        let dir = tempfile::tempdir().unwrap();
        let (_actuator, playlist) = playlist(dir.path());
        let frames = vec![
            PhysicsFrame::motion(1, MotionSample { g_force_lateral: 0.2, ..Default::default() }),
            PhysicsFrame::car_telemetry(1, CarTelemetrySample { engine_rpm: 7000 }),
            PhysicsFrame::motion(2, MotionSample::default()),
        ];
        let rows = replay(playlist.clone(), &frames);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].asset, router::GFORCE_RIGHT);
        assert_eq!(rows[1].asset, router::ENGINE_VIBRATION);
        assert!(!rows[2].enabled);
        assert!(playlist.is_playing(router::ENGINE_VIBRATION));
        assert!(!playlist.is_playing(router::GFORCE_RIGHT));
    }

    #[test]
    fn live_session_drains_records_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let (actuator, playlist) = playlist(dir.path());
        let capture = dir.path().join("capture.ndjson");

        let (sinks, session) = BridgeSession::start(playlist, 16, Some(capture.clone())).unwrap();
        sinks.send(PhysicsFrame::motion(1, MotionSample { g_force_longitudinal: -1.0, ..Default::default() }));
        sinks.send(PhysicsFrame::car_telemetry(2, CarTelemetrySample { engine_rpm: 9000 }));
        drop(sinks);
        session.finish();

        assert_eq!(actuator.playable_count(), 0);
        assert_eq!(iox::import_ndjson(&capture).unwrap().len(), 2);
    }
}
