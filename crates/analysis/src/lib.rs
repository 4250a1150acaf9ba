//! Feedback event classification.
//!
//! Every frame is run through a fixed set of threshold rules, producing the
//! events whose conditions hold right now. [`finish_events`] then compares
//! that batch with the previous one of the same stream and appends an
//! end-marker for every condition that stopped holding.

use model::*;
use tracing::trace;

pub const G_FORCE_THRESHOLD: f32 = 0.1;
/// Saturation points of the g-force intensities.
pub const G_FORCE_BACK_MAX: f32 = 1.8;
pub const G_FORCE_FRONT_MAX: f32 = 4.0;
pub const G_FORCE_LATERAL_MAX: f32 = 3.5;

pub const SLIP_THRESHOLD: f32 = 0.1;

pub const SUSPENSION_THRESHOLD: f32 = 6000.0;
pub const SUSPENSION_MAX: f32 = 50000.0;

pub const ENGINE_RPM_MIN: f32 = 4400.0;
pub const ENGINE_RPM_MAX: f32 = 11000.0;

/// Vibration period bounds, in the device's period units.
pub const VIBRATION_PERIOD_MIN: f32 = 6666.0;
pub const VIBRATION_PERIOD_MAX: f32 = 16666.0;

/// Linear map of `value` from `[lo, hi]` onto `[0, 1]`, saturating at both ends.
pub fn normalize(value: f32, lo: f32, hi: f32) -> f32 {
    let t = (value - lo) / (hi - lo);
    if t.is_nan() {
        return 0.0;
    }
    t.clamp(0.0, 1.0)
}

/// Maps an intensity fraction to the matching period, expressed as a fraction
/// of `period_max`. Inverted: a higher `percent` gives a shorter period.
pub fn normalize_period_percent(percent: f32, period_min: f32, period_max: f32) -> f32 {
    let target = (1.0 - percent) * (period_max - period_min) + period_min;
    target / period_max
}

/// Events for a motion packet: g-force, wheel slip and suspension shaking.
pub fn motion_events(sample: &MotionSample) -> Vec<FeedbackEvent> {
    let mut events = Vec::new();

    let g_lon = sample.g_force_longitudinal;
    if g_lon > G_FORCE_THRESHOLD {
        events.push(FeedbackEvent::g_force(
            EventDirection::Back,
            normalize(g_lon, 0.0, G_FORCE_BACK_MAX),
        ));
    } else if g_lon < -G_FORCE_THRESHOLD {
        events.push(FeedbackEvent::g_force(
            EventDirection::Front,
            normalize(-g_lon, 0.0, G_FORCE_FRONT_MAX),
        ));
    }

    let g_lat = sample.g_force_lateral;
    if g_lat > G_FORCE_THRESHOLD {
        events.push(FeedbackEvent::g_force(
            EventDirection::Right,
            normalize(g_lat, 0.0, G_FORCE_LATERAL_MAX),
        ));
    } else if g_lat < -G_FORCE_THRESHOLD {
        events.push(FeedbackEvent::g_force(
            EventDirection::Left,
            normalize(-g_lat, 0.0, G_FORCE_LATERAL_MAX),
        ));
    }

    // slip ratio is reported as-is, it can exceed 1.0 under heavy lockup
    for wheel in Wheel::ALL {
        let slip = sample.wheel_slip[wheel.index()].abs();
        if slip > SLIP_THRESHOLD {
            events.push(FeedbackEvent::slip(wheel.location(), slip));
        }
    }

    for wheel in Wheel::ALL {
        let accel = sample.suspension_acceleration[wheel.index()].abs();
        if accel > SUSPENSION_THRESHOLD {
            events.push(FeedbackEvent::shaking(
                wheel.location(),
                normalize(accel, SUSPENSION_THRESHOLD, SUSPENSION_MAX),
            ));
        }
    }

    events
}

/// Events for a car telemetry packet. Engine vibration is present on every frame.
pub fn telemetry_events(sample: &CarTelemetrySample) -> Vec<FeedbackEvent> {
    let rpm_percent = normalize(f32::from(sample.engine_rpm), ENGINE_RPM_MIN, ENGINE_RPM_MAX);
    vec![FeedbackEvent::vibration(normalize_period_percent(
        rpm_percent,
        VIBRATION_PERIOD_MIN,
        VIBRATION_PERIOD_MAX,
    ))]
}

pub fn frame_events(frame: &PhysicsFrame) -> Vec<FeedbackEvent> {
    match &frame.payload {
        FramePayload::Motion(sample) => motion_events(sample),
        FramePayload::CarTelemetry(sample) => telemetry_events(sample),
    }
}

/// Appends an end-marker to `current` for every enabled event of `previous`
/// that has no counterpart in `current`. End-markers already in `previous`
/// are skipped, so a stopped condition is reported exactly once.
pub fn finish_events(previous: &[FeedbackEvent], mut current: Vec<FeedbackEvent>) -> Vec<FeedbackEvent> {
    let generated = current.len();
    for prev in previous.iter().filter(|e| e.enabled) {
        let still_active = current[..generated].iter().any(|e| e.same_as(prev));
        if !still_active {
            trace!(kind = ?prev.kind, direction = ?prev.direction, location = ?prev.location, "event finished");
            current.push(prev.end_marker());
        }
    }
    current
}

/// One classification step. The returned batch (active events followed by
/// end-markers) is also the `previous` to pass on the next call.
pub fn classify(frame: &PhysicsFrame, previous: &[FeedbackEvent]) -> Vec<FeedbackEvent> {
    finish_events(previous, frame_events(frame))
}

/// Classifier state for a single stream. Motion and telemetry must each own
/// one so their edge detection never mixes.
#[derive(Debug, Clone)]
pub struct Classifier {
    stream: Stream,
    previous: Vec<FeedbackEvent>,
}

impl Classifier {
    pub fn new(stream: Stream) -> Self {
        Self { stream, previous: Vec::new() }
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }

    /// The last batch returned by [`Classifier::classify`].
    pub fn previous(&self) -> &[FeedbackEvent] {
        &self.previous
    }

    /// Classifies `frame` and remembers the result. A frame from the other
    /// stream yields an empty batch and leaves the state untouched.
    pub fn classify(&mut self, frame: &PhysicsFrame) -> &[FeedbackEvent] {
        if frame.stream() != self.stream {
            return &[];
        }
        self.previous = classify(frame, &self.previous);
        &self.previous
    }

    /// Forgets the previous batch, e.g. when a new session starts.
    pub fn reset(&mut self) {
        self.previous.clear();
    }
}
