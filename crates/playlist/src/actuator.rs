//! The haptic device surface the playlist drives.
//!
//! Calls may block on device I/O. Implementations must be shareable between
//! the motion and telemetry pump threads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque handle of an asset loaded into the device runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle(pub u64);

/// Opaque id of a playable created from an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayableId(pub u64);

impl fmt::Display for PlayableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "playable#{}", self.0)
    }
}

/// Runtime scaling applied to a playable without restarting it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    pub period: f32,
    pub amplitude: f32,
    pub pulse_width: f32,
}

impl Multipliers {
    /// Amplitude and pulse width follow intensity, period follows frequency.
    pub fn touch(intensity_percent: f32, frequency_percent: f32) -> Self {
        Self { period: frequency_percent, amplitude: intensity_percent, pulse_width: intensity_percent }
    }
}

impl Default for Multipliers {
    fn default() -> Self {
        Self { period: 1.0, amplitude: 1.0, pulse_width: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActuatorError {
    #[error("device disconnected: {0}")]
    Disconnected(String),
    #[error("unknown asset handle {0:?}")]
    UnknownAsset(AssetHandle),
    #[error("unknown {0}")]
    UnknownPlayable(PlayableId),
    #[error("failed to load asset {path}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },
}

pub trait Actuator: Send + Sync {
    fn load_asset(&self, path: &Path) -> Result<AssetHandle, ActuatorError>;
    fn unload_asset(&self, asset: AssetHandle) -> Result<(), ActuatorError>;
    /// Creates a looped playable, idle until [`Actuator::play`].
    fn create_looped_playable(&self, asset: AssetHandle) -> Result<PlayableId, ActuatorError>;
    fn play(&self, id: PlayableId) -> Result<(), ActuatorError>;
    fn stop(&self, id: PlayableId) -> Result<(), ActuatorError>;
    fn remove_playable(&self, id: PlayableId) -> Result<(), ActuatorError>;
    /// Retargets a playable in place; a running playable keeps running.
    fn set_multipliers(&self, id: PlayableId, multipliers: Multipliers) -> Result<(), ActuatorError>;
}
