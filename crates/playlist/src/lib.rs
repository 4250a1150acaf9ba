//! Haptic playback side of the bridge.
//!
//! [`Playlist`] binds every haptic asset to one long-lived looped playable on
//! an [`Actuator`]. [`route`] picks the asset for a feedback event and
//! [`EventPump`] ties a stream's classifier to the playlist.

pub mod actuator;
pub mod memory;
pub mod playlist;
pub mod pump;
pub mod router;

pub use actuator::{Actuator, ActuatorError, AssetHandle, Multipliers, PlayableId};
pub use memory::{ActuatorCall, MemoryActuator};
pub use playlist::{AssetInfo, Playlist, PlaylistError, DEFAULT_ASSET_EXTENSION};
pub use pump::{EventPump, FrameReport};
pub use router::{route, ROUTED_ASSETS};
