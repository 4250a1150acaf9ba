//! In-process actuator that keeps playables in memory and journals every
//! successful call. Used when no device backend is linked, and by tests.

use crate::actuator::*;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    LoadAsset(PathBuf),
    UnloadAsset(AssetHandle),
    CreateLoopedPlayable(AssetHandle),
    Play(PlayableId),
    Stop(PlayableId),
    RemovePlayable(PlayableId),
    SetMultipliers(PlayableId, Multipliers),
}

#[derive(Debug, Clone, Copy)]
struct Playable {
    playing: bool,
    multipliers: Multipliers,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    offline: bool,
    assets: HashSet<AssetHandle>,
    playables: HashMap<PlayableId, Playable>,
    calls: Vec<ActuatorCall>,
}

impl State {
    fn online(&self) -> Result<(), ActuatorError> {
        if self.offline {
            return Err(ActuatorError::Disconnected("memory actuator offline".into()));
        }
        Ok(())
    }

    fn playable(&mut self, id: PlayableId) -> Result<&mut Playable, ActuatorError> {
        self.playables.get_mut(&id).ok_or(ActuatorError::UnknownPlayable(id))
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryActuator {
    state: Mutex<State>,
}

impl MemoryActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with [`ActuatorError::Disconnected`].
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.state.lock().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<ActuatorCall> {
        std::mem::take(&mut self.state.lock().calls)
    }

    pub fn is_playing(&self, id: PlayableId) -> bool {
        self.state.lock().playables.get(&id).is_some_and(|p| p.playing)
    }

    pub fn multipliers(&self, id: PlayableId) -> Option<Multipliers> {
        self.state.lock().playables.get(&id).map(|p| p.multipliers)
    }

    pub fn playable_count(&self) -> usize {
        self.state.lock().playables.len()
    }

    pub fn loaded_asset_count(&self) -> usize {
        self.state.lock().assets.len()
    }
}

impl Actuator for MemoryActuator {
    fn load_asset(&self, path: &Path) -> Result<AssetHandle, ActuatorError> {
        let mut st = self.state.lock();
        st.online()?;
        if !path.is_file() {
            return Err(ActuatorError::AssetLoad { path: path.to_path_buf(), reason: "not a file".into() });
        }
        let handle = AssetHandle(st.next());
        st.assets.insert(handle);
        st.calls.push(ActuatorCall::LoadAsset(path.to_path_buf()));
        debug!(path = %path.display(), ?handle, "asset loaded");
        Ok(handle)
    }

    fn unload_asset(&self, asset: AssetHandle) -> Result<(), ActuatorError> {
        let mut st = self.state.lock();
        st.online()?;
        if !st.assets.remove(&asset) {
            return Err(ActuatorError::UnknownAsset(asset));
        }
        st.calls.push(ActuatorCall::UnloadAsset(asset));
        Ok(())
    }

    fn create_looped_playable(&self, asset: AssetHandle) -> Result<PlayableId, ActuatorError> {
        let mut st = self.state.lock();
        st.online()?;
        if !st.assets.contains(&asset) {
            return Err(ActuatorError::UnknownAsset(asset));
        }
        let id = PlayableId(st.next());
        st.playables.insert(id, Playable { playing: false, multipliers: Multipliers::default() });
        st.calls.push(ActuatorCall::CreateLoopedPlayable(asset));
        Ok(id)
    }

    fn play(&self, id: PlayableId) -> Result<(), ActuatorError> {
        let mut st = self.state.lock();
        st.online()?;
        st.playable(id)?.playing = true;
        st.calls.push(ActuatorCall::Play(id));
        debug!(%id, "play");
        Ok(())
    }

    fn stop(&self, id: PlayableId) -> Result<(), ActuatorError> {
        let mut st = self.state.lock();
        st.online()?;
        st.playable(id)?.playing = false;
        st.calls.push(ActuatorCall::Stop(id));
        debug!(%id, "stop");
        Ok(())
    }

    fn remove_playable(&self, id: PlayableId) -> Result<(), ActuatorError> {
        let mut st = self.state.lock();
        st.online()?;
        if st.playables.remove(&id).is_none() {
            return Err(ActuatorError::UnknownPlayable(id));
        }
        st.calls.push(ActuatorCall::RemovePlayable(id));
        Ok(())
    }

    fn set_multipliers(&self, id: PlayableId, multipliers: Multipliers) -> Result<(), ActuatorError> {
        let mut st = self.state.lock();
        st.online()?;
        st.playable(id)?.multipliers = multipliers;
        st.calls.push(ActuatorCall::SetMultipliers(id, multipliers));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playable_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ts_asset");
        std::fs::write(&path, b"asset").unwrap();

        let act = MemoryActuator::new();
        let asset = act.load_asset(&path).unwrap();
        let id = act.create_looped_playable(asset).unwrap();
        assert!(!act.is_playing(id));

        act.play(id).unwrap();
        assert!(act.is_playing(id));
        act.set_multipliers(id, Multipliers::touch(0.5, 0.4)).unwrap();
        assert!(act.is_playing(id));
        assert_eq!(act.multipliers(id).unwrap().amplitude, 0.5);

        act.stop(id).unwrap();
        act.remove_playable(id).unwrap();
        act.unload_asset(asset).unwrap();
        assert_eq!(act.playable_count(), 0);
        assert_eq!(act.loaded_asset_count(), 0);
        assert_eq!(act.calls().len(), 7);
    }

    #[test]
    fn missing_file_and_unknown_ids_fail() {
        let act = MemoryActuator::new();
        assert!(matches!(
            act.load_asset(Path::new("/nonexistent/x.ts_asset")),
            Err(ActuatorError::AssetLoad { .. })
        ));
        assert_eq!(act.play(PlayableId(9)), Err(ActuatorError::UnknownPlayable(PlayableId(9))));
        assert!(act.calls().is_empty());
    }

    #[test]
    fn offline_rejects_calls_without_journaling() {
        let act = MemoryActuator::new();
        act.set_offline(true);
        assert!(matches!(act.stop(PlayableId(1)), Err(ActuatorError::Disconnected(_))));
        assert!(act.take_calls().is_empty());
    }
}
