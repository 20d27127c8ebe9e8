//! Engine capability interface
//!
//! The sound registry drives playback exclusively through these traits,
//! which keeps it independent of the backing audio implementation (the
//! default is [`crate::MixerEngine`]; tests substitute their own).

use std::path::Path;

use crate::EngineResult;

/// How an asset is prepared at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Fully decode into memory at load time.
    Decode,
    /// Stream from disk during playback.
    Stream,
}

/// A loaded, playable sound owned by the engine.
///
/// Dropping the handle stops playback and releases the underlying
/// engine resource.
pub trait EngineSound {
    /// Begin or resume playback from the current play cursor.
    fn start(&mut self) -> EngineResult<()>;

    /// Halt playback. The play cursor is left where it was; callers that
    /// want rewind-on-stop follow up with [`EngineSound::seek_to_frame`].
    fn stop(&mut self) -> EngineResult<()>;

    /// Move the play cursor to an absolute source frame.
    fn seek_to_frame(&mut self, frame: u64);

    /// Live playback state as the mixer sees it.
    fn is_playing(&self) -> bool;

    fn set_looping(&mut self, looping: bool);
    fn set_volume(&mut self, volume: f32);
    fn set_pan(&mut self, pan: f32);
    fn set_pitch(&mut self, pitch: f32);
    fn set_position(&mut self, x: f32, y: f32, z: f32);
}

/// The audio subsystem: device ownership, asset loading, global gain and
/// the single spatialization listener.
///
/// Construction opens the device; dropping the engine closes it. Sounds
/// must not outlive the engine that loaded them.
pub trait AudioEngine {
    type Sound: EngineSound;

    /// Decode-and-prepare the asset at `path`.
    fn load(&mut self, path: &Path, mode: LoadMode) -> EngineResult<Self::Sound>;

    /// Global output gain, applied after per-sound gains.
    fn set_master_volume(&mut self, volume: f32);

    fn set_listener_position(&mut self, x: f32, y: f32, z: f32);
    fn set_listener_orientation(&mut self, fx: f32, fy: f32, fz: f32);
}
