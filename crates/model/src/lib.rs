//! Frame and feedback-event types shared by the haptic bridge crates

use serde::{Deserialize, Serialize};

/// Number of wheels carried by every per-wheel array.
pub const WHEEL_COUNT: usize = 4;

/// Per-wheel values in packet order: RL, RR, FL, FR.
pub type WheelArray = [f32; WHEEL_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wheel {
    RearLeft,
    RearRight,
    FrontLeft,
    FrontRight,
}

impl Wheel {
    /// Wheels in the order the game lays them out in per-wheel arrays.
    pub const ALL: [Wheel; WHEEL_COUNT] = [
        Wheel::RearLeft,
        Wheel::RearRight,
        Wheel::FrontLeft,
        Wheel::FrontRight,
    ];

    pub fn index(self) -> usize {
        match self {
            Wheel::RearLeft => 0,
            Wheel::RearRight => 1,
            Wheel::FrontLeft => 2,
            Wheel::FrontRight => 3,
        }
    }

    /// Body location used for wheel-bound events (slip, shaking).
    pub fn location(self) -> EventLocation {
        match self {
            Wheel::RearLeft => EventLocation::RearLeftDown,
            Wheel::RearRight => EventLocation::RearRightDown,
            Wheel::FrontLeft => EventLocation::FrontLeftDown,
            Wheel::FrontRight => EventLocation::FrontRightDown,
        }
    }
}

/// Which packet stream a frame came from. Each stream keeps its own
/// classifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    Motion,
    Telemetry,
}

/// Player-car physics decoded from a motion packet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionSample {
    pub g_force_lateral: f32,
    pub g_force_longitudinal: f32,
    pub wheel_slip: WheelArray,
    pub suspension_acceleration: WheelArray,
}

/// Player-car engine data decoded from a car telemetry packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CarTelemetrySample {
    pub engine_rpm: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FramePayload {
    Motion(MotionSample),
    CarTelemetry(CarTelemetrySample),
}

/// One decoded telemetry sample for the controlled car. Built per packet,
/// never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsFrame {
    pub session_uid: u64,
    pub session_time: f32,
    pub frame_id: u32,
    pub payload: FramePayload,
}

impl PhysicsFrame {
    pub fn motion(frame_id: u32, sample: MotionSample) -> Self {
        Self {
            session_uid: 0,
            session_time: 0.0,
            frame_id,
            payload: FramePayload::Motion(sample),
        }
    }

    pub fn car_telemetry(frame_id: u32, sample: CarTelemetrySample) -> Self {
        Self {
            session_uid: 0,
            session_time: 0.0,
            frame_id,
            payload: FramePayload::CarTelemetry(sample),
        }
    }

    pub fn stream(&self) -> Stream {
        match self.payload {
            FramePayload::Motion(_) => Stream::Motion,
            FramePayload::CarTelemetry(_) => Stream::Telemetry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventKind {
    #[default]
    Undefined,
    GForce,
    Vibration,
    Shaking,
    Slip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventDirection {
    #[default]
    Undefined,
    Front,
    Back,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventLocation {
    #[default]
    Undefined,
    FrontLeftDown,
    FrontRightDown,
    RearLeftDown,
    RearRightDown,
    FrontLeftUp,
    FrontRightUp,
    RearLeftUp,
    RearRightUp,
}

/// What makes two events "the same condition". Intensity, frequency and the
/// enabled flag take no part in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventIdentity {
    pub kind: EventKind,
    pub direction: EventDirection,
    pub location: EventLocation,
}

/// An active condition (`enabled`) or the end-marker of one that just stopped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub kind: EventKind,
    pub direction: EventDirection,
    pub location: EventLocation,
    pub enabled: bool,
    /// false only on end-markers: stop, do not retrigger
    pub continuous: bool,
    pub intensity_percent: f32,
    pub frequency_percent: f32,
}

impl FeedbackEvent {
    fn active(kind: EventKind, intensity_percent: f32, frequency_percent: f32) -> Self {
        Self {
            kind,
            direction: EventDirection::Undefined,
            location: EventLocation::Undefined,
            enabled: true,
            continuous: true,
            intensity_percent,
            frequency_percent,
        }
    }

    pub fn g_force(direction: EventDirection, intensity_percent: f32) -> Self {
        Self { direction, ..Self::active(EventKind::GForce, intensity_percent, 1.0) }
    }

    pub fn slip(location: EventLocation, intensity_percent: f32) -> Self {
        Self { location, ..Self::active(EventKind::Slip, intensity_percent, 1.0) }
    }

    pub fn shaking(location: EventLocation, intensity_percent: f32) -> Self {
        Self { location, ..Self::active(EventKind::Shaking, intensity_percent, 1.0) }
    }

    pub fn vibration(frequency_percent: f32) -> Self {
        Self::active(EventKind::Vibration, 1.0, frequency_percent)
    }

    pub fn identity(&self) -> EventIdentity {
        EventIdentity { kind: self.kind, direction: self.direction, location: self.location }
    }

    pub fn same_as(&self, other: &FeedbackEvent) -> bool {
        self.identity() == other.identity()
    }

    /// The disabled twin of this event, emitted the frame its condition stops holding.
    pub fn end_marker(&self) -> Self {
        Self {
            kind: self.kind,
            direction: self.direction,
            location: self.location,
            enabled: false,
            continuous: false,
            intensity_percent: 0.0,
            frequency_percent: 0.0,
        }
    }

    pub fn is_end_marker(&self) -> bool {
        !self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sameness_ignores_intensity_and_enabled() {
        let a = FeedbackEvent::g_force(EventDirection::Right, 0.2);
        let b = FeedbackEvent::g_force(EventDirection::Right, 0.9);
        assert!(a.same_as(&b));
        assert!(a.same_as(&a.end_marker()));
        assert!(!a.same_as(&FeedbackEvent::g_force(EventDirection::Left, 0.2)));
    }

    #[test]
    fn constructors_fill_only_the_relevant_axis() {
        let g = FeedbackEvent::g_force(EventDirection::Back, 0.5);
        assert_eq!(g.location, EventLocation::Undefined);

        let s = FeedbackEvent::slip(EventLocation::RearLeftDown, 0.15);
        assert_eq!(s.direction, EventDirection::Undefined);

        let v = FeedbackEvent::vibration(1.0);
        assert_eq!(v.direction, EventDirection::Undefined);
        assert_eq!(v.location, EventLocation::Undefined);
    }

    #[test]
    fn end_marker_is_disabled_and_not_continuous() {
        let m = FeedbackEvent::shaking(EventLocation::FrontRightDown, 0.4).end_marker();
        assert!(m.is_end_marker());
        assert!(!m.continuous);
        assert_eq!(m.location, EventLocation::FrontRightDown);
    }

    #[test]
    fn wheel_order_matches_packet_layout() {
        let idx: Vec<usize> = Wheel::ALL.iter().map(|w| w.index()).collect();
        assert_eq!(idx, vec![0, 1, 2, 3]);
        assert_eq!(Wheel::RearLeft.location(), EventLocation::RearLeftDown);
    }

    #[test]
    fn frame_serializes_with_kind_tag() {
        let frame = PhysicsFrame::car_telemetry(7, CarTelemetrySample { engine_rpm: 9000 });
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"kind\":\"car_telemetry\""));
        let back: PhysicsFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
        assert_eq!(back.stream(), Stream::Telemetry);
    }
}
