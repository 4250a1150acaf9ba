//! Static event-to-asset table.
//!
//! Asset names are file names inside the assets directory, without the
//! extension. The playlist appends its own when resolving them.

use model::{EventDirection, EventKind, EventLocation, FeedbackEvent};

pub const GFORCE_BACK: &str = "gforce_back";
pub const GFORCE_FRONT: &str = "gforce_front";
pub const GFORCE_LEFT: &str = "gforce_left";
pub const GFORCE_RIGHT: &str = "gforce_right";

pub const ENGINE_VIBRATION: &str = "engine_vibration";

pub const SLIP_REAR_LEFT: &str = "slip_rear_left";
pub const SLIP_REAR_RIGHT: &str = "slip_rear_right";
pub const SLIP_FRONT_LEFT: &str = "slip_front_left";
pub const SLIP_FRONT_RIGHT: &str = "slip_front_right";

pub const SHAKING_REAR_LEFT: &str = "shaking_rear_left";
pub const SHAKING_REAR_RIGHT: &str = "shaking_rear_right";
pub const SHAKING_FRONT_LEFT: &str = "shaking_front_left";
pub const SHAKING_FRONT_RIGHT: &str = "shaking_front_right";

/// Every name [`route`] can return.
pub const ROUTED_ASSETS: [&str; 13] = [
    GFORCE_BACK,
    GFORCE_FRONT,
    GFORCE_LEFT,
    GFORCE_RIGHT,
    ENGINE_VIBRATION,
    SLIP_REAR_LEFT,
    SLIP_REAR_RIGHT,
    SLIP_FRONT_LEFT,
    SLIP_FRONT_RIGHT,
    SHAKING_REAR_LEFT,
    SHAKING_REAR_RIGHT,
    SHAKING_FRONT_LEFT,
    SHAKING_FRONT_RIGHT,
];

/// Asset driven by `event`, or `None` for combinations with no asset.
pub fn route(event: &FeedbackEvent) -> Option<&'static str> {
    use EventLocation::*;
    match event.kind {
        EventKind::GForce => match event.direction {
            EventDirection::Back => Some(GFORCE_BACK),
            EventDirection::Front => Some(GFORCE_FRONT),
            EventDirection::Left => Some(GFORCE_LEFT),
            EventDirection::Right => Some(GFORCE_RIGHT),
            _ => None,
        },
        EventKind::Vibration => Some(ENGINE_VIBRATION),
        EventKind::Slip => match event.location {
            RearLeftDown => Some(SLIP_REAR_LEFT),
            RearRightDown => Some(SLIP_REAR_RIGHT),
            FrontLeftDown => Some(SLIP_FRONT_LEFT),
            FrontRightDown => Some(SLIP_FRONT_RIGHT),
            _ => None,
        },
        EventKind::Shaking => match event.location {
            RearLeftDown => Some(SHAKING_REAR_LEFT),
            RearRightDown => Some(SHAKING_REAR_RIGHT),
            FrontLeftDown => Some(SHAKING_FRONT_LEFT),
            FrontRightDown => Some(SHAKING_FRONT_RIGHT),
            _ => None,
        },
        EventKind::Undefined => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn rear_left_slip_has_its_own_asset() {
        let e = FeedbackEvent::slip(EventLocation::RearLeftDown, 0.15);
        assert_eq!(route(&e), Some(SLIP_REAR_LEFT));
        assert_eq!(route(&e.end_marker()), Some(SLIP_REAR_LEFT));
    }

    #[test]
    fn unmapped_combinations_route_nowhere() {
        assert_eq!(route(&FeedbackEvent::default()), None);
        assert_eq!(route(&FeedbackEvent::g_force(EventDirection::Up, 1.0)), None);
        assert_eq!(route(&FeedbackEvent::g_force(EventDirection::Undefined, 1.0)), None);
        assert_eq!(route(&FeedbackEvent::shaking(EventLocation::RearLeftUp, 1.0)), None);
        assert_eq!(route(&FeedbackEvent::slip(EventLocation::Undefined, 1.0)), None);
    }

    #[test]
    fn table_names_are_distinct() {
        let names: HashSet<&str> = ROUTED_ASSETS.iter().copied().collect();
        assert_eq!(names.len(), ROUTED_ASSETS.len());
        assert_eq!(route(&FeedbackEvent::vibration(0.5)), Some(ENGINE_VIBRATION));
    }
}
