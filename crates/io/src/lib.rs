//! Capture files: decoded frames as NDJSON, classified events as CSV.

use anyhow::{Context, Result};
use model::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Appends frames to an NDJSON capture, one frame per line.
pub struct FrameRecorder {
    w: BufWriter<File>,
    frames: u64,
}

impl FrameRecorder {
    pub fn create(path: &Path) -> Result<Self> {
        let f = File::create(path).with_context(|| format!("create capture {}", path.display()))?;
        Ok(Self { w: BufWriter::new(f), frames: 0 })
    }

    pub fn record(&mut self, frame: &PhysicsFrame) -> Result<()> {
        serde_json::to_writer(&mut self.w, frame)?;
        self.w.write_all(b"\n")?;
        self.frames += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<u64> {
        self.w.flush()?;
        Ok(self.frames)
    }
}

pub fn import_ndjson(path: &Path) -> Result<Vec<PhysicsFrame>> {
    let f = File::open(path).with_context(|| format!("open capture {}", path.display()))?;
    let rdr = BufReader::new(f);
    let mut frames = vec![];
    for (n, line) in rdr.lines().enumerate() {
        let s = line?;
        if s.trim().is_empty() {
            continue;
        }
        let frame: PhysicsFrame =
            serde_json::from_str(&s).with_context(|| format!("{}:{}", path.display(), n + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

pub fn export_ndjson(frames: &[PhysicsFrame], path: &Path) -> Result<()> {
    let mut rec = FrameRecorder::create(path)?;
    for f in frames {
        rec.record(f)?;
    }
    rec.finish()?;
    Ok(())
}

/// One classified event, flattened for CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub frame_id: u32,
    pub stream: Stream,
    pub kind: EventKind,
    pub direction: EventDirection,
    pub location: EventLocation,
    pub enabled: bool,
    pub intensity: f32,
    pub frequency: f32,
    pub asset: String,
}

impl EventRow {
    pub fn new(frame: &PhysicsFrame, event: &FeedbackEvent, asset: Option<&str>) -> Self {
        Self {
            frame_id: frame.frame_id,
            stream: frame.stream(),
            kind: event.kind,
            direction: event.direction,
            location: event.location,
            enabled: event.enabled,
            intensity: event.intensity_percent,
            frequency: event.frequency_percent,
            asset: asset.unwrap_or_default().to_string(),
        }
    }
}

pub fn export_events_csv(rows: &[EventRow], path: &Path) -> Result<()> {
    let mut w = csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for r in rows {
        w.serialize(r)?;
    }
    w.flush()?;
    Ok(())
}
