//! The sound manager: identifier→sound map plus engine lifecycle

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cue_engine::{AudioEngine, EngineSound, LoadMode};

use crate::error::{SoundError, SoundResult};
use crate::params::{clamp_pan, clamp_pitch, clamp_volume};

/// Registry record binding an identifier to a loaded engine handle.
///
/// Dropping the entry releases the handle, which stops any in-flight
/// playback of the sound.
struct SoundEntry<S> {
    /// Source path, fixed at load time
    path: PathBuf,
    sound: S,
}

/// Owns the audio engine and every loaded sound.
///
/// All operations are synchronous and keyed by a non-empty string id.
/// Unknown ids are warned and ignored rather than failed: game code fires
/// sounds opportunistically and a missing asset must never crash the host.
pub struct SoundManager<E: AudioEngine> {
    engine: E,
    sounds: HashMap<String, SoundEntry<E::Sound>>,
}

impl<E: AudioEngine> SoundManager<E> {
    /// Wrap an initialized engine. The engine is released when the
    /// manager is dropped or [`SoundManager::shutdown`] consumes it.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            sounds: HashMap::new(),
        }
    }

    /// Look up a mutable entry for a `Result`-returning operation.
    ///
    /// Empty id is a usage error; unknown id warns and yields `Ok(None)`.
    fn resolve_mut(
        &mut self,
        op: &str,
        id: &str,
    ) -> SoundResult<Option<&mut SoundEntry<E::Sound>>> {
        if id.is_empty() {
            return Err(SoundError::Usage { what: "sound id" });
        }
        let entry = self.sounds.get_mut(id);
        if entry.is_none() {
            log::warn!("{op}: unknown sound id '{id}'");
        }
        Ok(entry)
    }

    /// Look up a mutable entry for a void operation (setters, unload).
    fn entry_mut(&mut self, op: &str, id: &str) -> Option<&mut SoundEntry<E::Sound>> {
        if id.is_empty() {
            log::error!("{op}: empty sound id");
            return None;
        }
        let entry = self.sounds.get_mut(id);
        if entry.is_none() {
            log::warn!("{op}: unknown sound id '{id}'");
        }
        entry
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOAD / UNLOAD
    // ═══════════════════════════════════════════════════════════════════════════

    /// Decode the asset at `path` and register it under `id`.
    ///
    /// Loading an id that already exists is an idempotent success: the
    /// existing entry (including its original path) is left untouched.
    pub fn load(&mut self, path: impl AsRef<Path>, id: &str) -> SoundResult<()> {
        let path = path.as_ref();
        if id.is_empty() {
            return Err(SoundError::Usage { what: "sound id" });
        }
        if path.as_os_str().is_empty() {
            return Err(SoundError::Usage { what: "path" });
        }
        if self.sounds.contains_key(id) {
            log::warn!("load: sound id '{id}' already loaded, ignoring");
            return Ok(());
        }

        let sound = self
            .engine
            .load(path, LoadMode::Decode)
            .map_err(|source| SoundError::Load {
                id: id.to_string(),
                path: path.to_path_buf(),
                source,
            })?;

        self.sounds.insert(
            id.to_string(),
            SoundEntry {
                path: path.to_path_buf(),
                sound,
            },
        );
        log::info!("loaded '{}' as '{id}'", path.display());
        Ok(())
    }

    /// Remove a sound, stopping it first if it is playing.
    pub fn unload(&mut self, id: &str) {
        if id.is_empty() {
            log::error!("unload: empty sound id");
            return;
        }
        match self.sounds.remove(id) {
            Some(mut entry) => {
                if entry.sound.is_playing() {
                    if let Err(e) = entry.sound.stop() {
                        log::warn!("unload: failed to stop '{id}': {e}");
                    }
                }
                log::info!("unloaded '{id}'");
                // entry drop releases the engine handle
            }
            None => log::warn!("unload: unknown sound id '{id}'"),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PLAYBACK
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start playback. An already-playing sound restarts from frame 0
    /// instead of layering a second instance.
    pub fn play(&mut self, id: &str, looping: bool) -> SoundResult<()> {
        let Some(entry) = self.resolve_mut("play", id)? else {
            return Ok(());
        };

        if entry.sound.is_playing() {
            entry
                .sound
                .stop()
                .map_err(|source| SoundError::Playback {
                    id: id.to_string(),
                    source,
                })?;
            entry.sound.seek_to_frame(0);
        }

        entry.sound.set_looping(looping);
        entry
            .sound
            .start()
            .map_err(|source| SoundError::Playback {
                id: id.to_string(),
                source,
            })?;
        log::info!("playing '{id}' (looping: {looping})");
        Ok(())
    }

    /// Stop playback and rewind to frame 0, so the next play starts from
    /// the beginning. Stopping a stopped sound is a no-op success.
    pub fn stop(&mut self, id: &str) -> SoundResult<()> {
        let Some(entry) = self.resolve_mut("stop", id)? else {
            return Ok(());
        };

        if !entry.sound.is_playing() {
            log::debug!("stop: '{id}' is not playing");
            return Ok(());
        }

        entry
            .sound
            .stop()
            .map_err(|source| SoundError::Playback {
                id: id.to_string(),
                source,
            })?;
        entry.sound.seek_to_frame(0);
        log::info!("stopped '{id}'");
        Ok(())
    }

    /// Halt playback without rewinding; the position is preserved for
    /// [`SoundManager::resume`]. This is the contract that separates
    /// pause from [`SoundManager::stop`].
    pub fn pause(&mut self, id: &str) -> SoundResult<()> {
        let Some(entry) = self.resolve_mut("pause", id)? else {
            return Ok(());
        };

        entry
            .sound
            .stop()
            .map_err(|source| SoundError::Playback {
                id: id.to_string(),
                source,
            })?;
        log::info!("paused '{id}'");
        Ok(())
    }

    /// Restart playback from the preserved position.
    pub fn resume(&mut self, id: &str) -> SoundResult<()> {
        let Some(entry) = self.resolve_mut("resume", id)? else {
            return Ok(());
        };

        entry
            .sound
            .start()
            .map_err(|source| SoundError::Playback {
                id: id.to_string(),
                source,
            })?;
        log::info!("resumed '{id}'");
        Ok(())
    }

    /// Live playing state; false for empty or unknown ids.
    pub fn is_playing(&self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        self.sounds
            .get(id)
            .map(|entry| entry.sound.is_playing())
            .unwrap_or(false)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PARAMETERS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Global output gain, clamped to [0, 1].
    pub fn set_master_volume(&mut self, volume: f32) {
        let volume = clamp_volume(volume);
        self.engine.set_master_volume(volume);
        log::info!("master volume set to {volume}");
    }

    /// Per-sound gain, clamped to [0, 1].
    pub fn set_volume(&mut self, id: &str, volume: f32) {
        if let Some(entry) = self.entry_mut("set_volume", id) {
            entry.sound.set_volume(clamp_volume(volume));
        }
    }

    /// Stereo pan, clamped to [-1, 1].
    pub fn set_pan(&mut self, id: &str, pan: f32) {
        if let Some(entry) = self.entry_mut("set_pan", id) {
            entry.sound.set_pan(clamp_pan(pan));
        }
    }

    /// Playback rate multiplier, floored to a small positive epsilon.
    pub fn set_pitch(&mut self, id: &str, pitch: f32) {
        if let Some(entry) = self.entry_mut("set_pitch", id) {
            entry.sound.set_pitch(clamp_pitch(pitch));
        }
    }

    /// World position of the sound's emitter.
    pub fn set_position(&mut self, id: &str, x: f32, y: f32, z: f32) {
        if let Some(entry) = self.entry_mut("set_position", id) {
            entry.sound.set_position(x, y, z);
        }
    }

    /// World position of the (single) listener.
    pub fn set_listener_position(&mut self, x: f32, y: f32, z: f32) {
        self.engine.set_listener_position(x, y, z);
    }

    /// Forward vector of the listener; there is no up-vector control.
    pub fn set_listener_orientation(&mut self, fx: f32, fy: f32, fz: f32) {
        self.engine.set_listener_orientation(fx, fy, fz);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTROSPECTION / LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Source path an id was loaded from.
    pub fn source_path(&self, id: &str) -> Option<&Path> {
        self.sounds.get(id).map(|entry| entry.path.as_path())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sounds.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// Stop and release every sound, then release the engine.
    ///
    /// Entries are dropped before the engine so no handle outlives the
    /// device. Best-effort: stop failures are logged, never propagated.
    pub fn shutdown(mut self) {
        let count = self.sounds.len();
        for (id, entry) in self.sounds.iter_mut() {
            if entry.sound.is_playing() {
                if let Err(e) = entry.sound.stop() {
                    log::warn!("shutdown: failed to stop '{id}': {e}");
                }
            }
        }
        self.sounds.clear();
        log::info!("sound system shut down ({count} sounds released)");
        // engine drops here, closing the device
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
