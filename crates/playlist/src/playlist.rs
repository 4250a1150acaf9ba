//! Asset registry: one looped playable per asset, started and stopped on demand.

use crate::actuator::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_ASSET_EXTENSION: &str = "ts_asset";

#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    #[error("reading asset directory {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("asset {asset}: {source}")]
    Actuator { asset: String, #[source] source: ActuatorError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetInfo {
    pub name: String,
    pub asset: AssetHandle,
    pub playable: PlayableId,
    pub is_playing: bool,
}

/// Owns every asset binding. Each asset sits behind its own lock, so pumps
/// touching different assets never wait on each other.
pub struct Playlist {
    actuator: Arc<dyn Actuator>,
    assets: HashMap<String, Mutex<AssetInfo>>,
    extension: String,
    closed: AtomicBool,
}

impl std::fmt::Debug for Playlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playlist")
            .field("assets", &self.asset_names())
            .field("extension", &self.extension)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl Playlist {
    /// A playlist with no assets. Names passed to [`Playlist::add`] may end
    /// in `extension`; lookups work with or without it.
    pub fn empty(actuator: Arc<dyn Actuator>, extension: &str) -> Self {
        Self {
            actuator,
            assets: HashMap::new(),
            extension: extension.to_string(),
            closed: AtomicBool::new(false),
        }
    }

    /// Loads every `*.{extension}` file of `dir` and creates its looped
    /// playable. On error the assets loaded so far are released again.
    pub fn load(actuator: Arc<dyn Actuator>, dir: &Path, extension: &str) -> Result<Self, PlaylistError> {
        let io_err = |source: std::io::Error| PlaylistError::Io { path: dir.to_path_buf(), source };
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == extension) {
                files.push(path);
            }
        }
        files.sort();

        let mut playlist = Self::empty(actuator, extension);
        for path in files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!(path = %path.display(), "skipping asset with non UTF-8 name");
                continue;
            };
            playlist.add(name, &path)?;
        }
        info!(dir = %dir.display(), count = playlist.assets.len(), "assets loaded");
        Ok(playlist)
    }

    /// Loads one asset under `name`.
    pub fn add(&mut self, name: &str, path: &Path) -> Result<(), PlaylistError> {
        let fail = |source: ActuatorError| PlaylistError::Actuator { asset: name.to_string(), source };
        info!(asset = name, path = %path.display(), "load asset");
        let asset = self.actuator.load_asset(path).map_err(fail)?;
        let playable = match self.actuator.create_looped_playable(asset) {
            Ok(id) => id,
            Err(e) => {
                if let Err(e) = self.actuator.unload_asset(asset) {
                    warn!(asset = name, error = %e, "unload after failed playable creation");
                }
                return Err(fail(e));
            }
        };
        let info = AssetInfo { name: name.to_string(), asset, playable, is_playing: false };
        if let Some(old) = self.assets.insert(name.to_string(), Mutex::new(info)) {
            self.release(old.into_inner());
        }
        Ok(())
    }

    pub fn asset_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.assets.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn info(&self, name: &str) -> Option<AssetInfo> {
        self.slot(name).map(|a| a.lock().clone())
    }

    pub fn is_playing(&self, name: &str) -> bool {
        self.slot(name).is_some_and(|a| a.lock().is_playing)
    }

    /// Resolves `name` as a file name, then as a file name missing the
    /// playlist's extension.
    fn slot(&self, name: &str) -> Option<&Mutex<AssetInfo>> {
        self.assets
            .get(name)
            .or_else(|| self.assets.get(&format!("{name}.{}", self.extension)))
    }

    /// Starts `name` or retunes it in place if already playing.
    ///
    /// With `continuous == false` the asset is stopped first, so a playing
    /// asset goes through a full stop/play. Unknown names are logged and
    /// ignored. On a device failure the bookkeeping reflects only the calls
    /// that succeeded.
    pub fn play(
        &self,
        name: &str,
        continuous: bool,
        intensity_percent: f32,
        frequency_percent: f32,
    ) -> Result<(), PlaylistError> {
        let Some(slot) = self.slot(name) else {
            warn!(asset = name, "asset not found");
            return Ok(());
        };
        let mut info = slot.lock();
        if self.closed.load(Ordering::SeqCst) {
            debug!(asset = name, "playlist closed, ignoring play");
            return Ok(());
        }
        if !continuous {
            self.stop_locked(&mut info)?;
        }
        let multipliers = Multipliers::touch(intensity_percent, frequency_percent);
        self.actuator
            .set_multipliers(info.playable, multipliers)
            .map_err(|source| PlaylistError::Actuator { asset: info.name.clone(), source })?;
        if !info.is_playing {
            self.actuator
                .play(info.playable)
                .map_err(|source| PlaylistError::Actuator { asset: info.name.clone(), source })?;
            info.is_playing = true;
            info!(asset = name, intensity = intensity_percent, frequency = frequency_percent, "play");
        } else {
            debug!(asset = name, intensity = intensity_percent, frequency = frequency_percent, "retune");
        }
        Ok(())
    }

    /// Stops `name` if it is playing. Stopping a stopped asset does nothing.
    pub fn stop(&self, name: &str) -> Result<(), PlaylistError> {
        let Some(slot) = self.slot(name) else {
            warn!(asset = name, "asset not found");
            return Ok(());
        };
        let mut info = slot.lock();
        self.stop_locked(&mut info)
    }

    fn stop_locked(&self, info: &mut AssetInfo) -> Result<(), PlaylistError> {
        if !info.is_playing {
            return Ok(());
        }
        self.actuator
            .stop(info.playable)
            .map_err(|source| PlaylistError::Actuator { asset: info.name.clone(), source })?;
        info.is_playing = false;
        info!(asset = %info.name, "stop");
        Ok(())
    }

    /// Stops, removes and unloads every asset. Runs once; later calls and
    /// the drop that follows do nothing.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for slot in self.assets.values() {
            let mut info = slot.lock();
            self.release(info.clone());
            info.is_playing = false;
        }
        info!(count = self.assets.len(), "assets released");
    }

    fn release(&self, info: AssetInfo) {
        if info.is_playing {
            if let Err(e) = self.actuator.stop(info.playable) {
                warn!(asset = %info.name, error = %e, "stop on release failed");
            }
        }
        if let Err(e) = self.actuator.remove_playable(info.playable) {
            warn!(asset = %info.name, error = %e, "remove playable failed");
        }
        if let Err(e) = self.actuator.unload_asset(info.asset) {
            warn!(asset = %info.name, error = %e, "unload asset failed");
        }
    }
}

impl Drop for Playlist {
    fn drop(&mut self) {
        self.shutdown();
    }
}
