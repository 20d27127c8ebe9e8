//! Voice table and the default [`AudioEngine`] implementation
//!
//! One [`Voice`] per loaded sound, mixed into the output stream by
//! [`MixerState::render`]. The state lives behind a mutex shared with the
//! stream callback; control-side operations hold the lock only for cheap
//! field writes.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::decode::{DecodedAudio, decode_file};
use crate::engine::{AudioEngine, EngineSound, LoadMode};
use crate::{EngineConfig, EngineError, EngineResult, stream};

/// Sounds closer than this are not attenuated.
const MIN_DISTANCE: f32 = 1.0;

/// World up vector for deriving the listener's right axis.
const WORLD_UP: [f32; 3] = [0.0, 1.0, 0.0];

// ═══════════════════════════════════════════════════════════════════════════════
// MIXER STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Spatialization listener (single, index 0).
pub(crate) struct Listener {
    pub position: [f32; 3],
    pub forward: [f32; 3],
}

impl Default for Listener {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            forward: [0.0, 0.0, -1.0],
        }
    }
}

/// Playback slot for one loaded sound.
pub(crate) struct Voice {
    clip: Arc<DecodedAudio>,
    /// Fractional source-frame cursor
    cursor: f64,
    playing: bool,
    looping: bool,
    volume: f32,
    pan: f32,
    pitch: f32,
    position: [f32; 3],
}

impl Voice {
    fn new(clip: Arc<DecodedAudio>) -> Self {
        Self {
            clip,
            cursor: 0.0,
            playing: false,
            looping: false,
            volume: 1.0,
            pan: 0.0,
            pitch: 1.0,
            position: [0.0, 0.0, 0.0],
        }
    }
}

/// Everything the stream callback reads: voices, master gain, listener.
pub(crate) struct MixerState {
    voices: Vec<Option<Voice>>,
    master_volume: f32,
    listener: Listener,
    output_rate: u32,
}

impl MixerState {
    pub(crate) fn new(output_rate: u32) -> Self {
        Self {
            voices: Vec::new(),
            master_volume: 1.0,
            listener: Listener::default(),
            output_rate,
        }
    }

    /// Claim a free slot, reusing holes left by released sounds.
    fn alloc(&mut self, voice: Voice) -> usize {
        if let Some(slot) = self.voices.iter().position(|v| v.is_none()) {
            self.voices[slot] = Some(voice);
            slot
        } else {
            self.voices.push(Some(voice));
            self.voices.len() - 1
        }
    }

    /// Mix all playing voices into an interleaved stereo buffer.
    pub(crate) fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let frames = out.len() / 2;

        for voice in self.voices.iter_mut().flatten() {
            if !voice.playing {
                continue;
            }
            let total = voice.clip.frames() as f64;
            if total <= 0.0 {
                voice.playing = false;
                continue;
            }

            let (distance_gain, lateral) = spatialize(&self.listener, voice.position);
            let (gain_l, gain_r) = pan_gains((voice.pan + lateral).clamp(-1.0, 1.0));
            let gain = voice.volume * distance_gain;
            let step =
                voice.pitch as f64 * voice.clip.sample_rate() as f64 / self.output_rate as f64;

            for i in 0..frames {
                if voice.cursor >= total {
                    if voice.looping {
                        voice.cursor %= total;
                    } else {
                        voice.playing = false;
                        voice.cursor = total;
                        break;
                    }
                }
                let (l, r) = voice.clip.sample_at(voice.cursor);
                out[i * 2] += l * gain * gain_l;
                out[i * 2 + 1] += r * gain * gain_r;
                voice.cursor += step;
            }
        }

        if self.master_volume != 1.0 {
            for s in out.iter_mut() {
                *s *= self.master_volume;
            }
        }
    }

    pub(crate) fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume;
    }

    pub(crate) fn listener_mut(&mut self) -> &mut Listener {
        &mut self.listener
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPATIALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Distance gain (inverse model, min-distance floor) and lateral pan
/// component in [-1, 1] relative to the listener's right axis.
fn spatialize(listener: &Listener, position: [f32; 3]) -> (f32, f32) {
    let dx = position[0] - listener.position[0];
    let dy = position[1] - listener.position[1];
    let dz = position[2] - listener.position[2];
    let distance = (dx * dx + dy * dy + dz * dz).sqrt();
    if distance < 1e-6 {
        return (1.0, 0.0);
    }

    let gain = (MIN_DISTANCE / distance).min(1.0);

    let forward = normalize_or(listener.forward, [0.0, 0.0, -1.0]);
    let right = normalize_or(cross(forward, WORLD_UP), [1.0, 0.0, 0.0]);
    let direction = [dx / distance, dy / distance, dz / distance];
    let lateral = dot(direction, right);

    (gain, lateral)
}

/// Constant-power pan: equal gain at center, full throw at the extremes.
fn pan_gains(pan: f32) -> (f32, f32) {
    let theta = (pan + 1.0) * std::f32::consts::FRAC_PI_4;
    (theta.cos(), theta.sin())
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn normalize_or(v: [f32; 3], fallback: [f32; 3]) -> [f32; 3] {
    let mag = dot(v, v).sqrt();
    if mag < 1e-6 {
        return fallback;
    }
    [v[0] / mag, v[1] / mag, v[2] / mag]
}

// ═══════════════════════════════════════════════════════════════════════════════
// MIXER ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Default [`AudioEngine`]: cpal output stream over an in-process voice
/// mixer with fully decoded sources.
pub struct MixerEngine {
    shared: Arc<Mutex<MixerState>>,
    /// Keeps the output stream alive for the engine's lifetime.
    _stream: stream::StreamHolder,
}

impl MixerEngine {
    /// Open the output device and start the mix stream.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let (holder, shared) = stream::open_output(&config)?;
        Ok(Self {
            shared,
            _stream: holder,
        })
    }
}

impl AudioEngine for MixerEngine {
    type Sound = MixerSound;

    fn load(&mut self, path: &Path, mode: LoadMode) -> EngineResult<MixerSound> {
        if mode == LoadMode::Stream {
            return Err(EngineError::Unsupported("streaming playback"));
        }
        let clip = Arc::new(decode_file(path)?);
        let slot = self.shared.lock().alloc(Voice::new(clip));
        Ok(MixerSound {
            shared: Arc::clone(&self.shared),
            slot,
        })
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.shared.lock().set_master_volume(volume);
    }

    fn set_listener_position(&mut self, x: f32, y: f32, z: f32) {
        self.shared.lock().listener_mut().position = [x, y, z];
    }

    fn set_listener_orientation(&mut self, fx: f32, fy: f32, fz: f32) {
        self.shared.lock().listener_mut().forward = [fx, fy, fz];
    }
}

/// Handle to one voice of the mixer. Dropping it releases the slot,
/// which also halts any in-flight playback of that sound.
pub struct MixerSound {
    shared: Arc<Mutex<MixerState>>,
    slot: usize,
}

impl MixerSound {
    fn with_voice<R>(&self, f: impl FnOnce(&mut Voice) -> R) -> Option<R> {
        let mut state = self.shared.lock();
        state.voices[self.slot].as_mut().map(f)
    }
}

impl EngineSound for MixerSound {
    fn start(&mut self) -> EngineResult<()> {
        self.with_voice(|v| {
            // A one-shot that ran to the end restarts from the top.
            if !v.looping && v.cursor >= v.clip.frames() as f64 {
                v.cursor = 0.0;
            }
            v.playing = true;
        });
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        self.with_voice(|v| v.playing = false);
        Ok(())
    }

    fn seek_to_frame(&mut self, frame: u64) {
        self.with_voice(|v| v.cursor = frame.min(v.clip.frames()) as f64);
    }

    fn is_playing(&self) -> bool {
        self.with_voice(|v| v.playing).unwrap_or(false)
    }

    fn set_looping(&mut self, looping: bool) {
        self.with_voice(|v| v.looping = looping);
    }

    fn set_volume(&mut self, volume: f32) {
        self.with_voice(|v| v.volume = volume);
    }

    fn set_pan(&mut self, pan: f32) {
        self.with_voice(|v| v.pan = pan);
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.with_voice(|v| v.pitch = pitch);
    }

    fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.with_voice(|v| v.position = [x, y, z]);
    }
}

impl Drop for MixerSound {
    fn drop(&mut self) {
        // Removing the voice stops and releases it in one step.
        self.shared.lock().voices[self.slot] = None;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn constant_clip(value: f32, frames: usize, rate: u32) -> Arc<DecodedAudio> {
        Arc::new(DecodedAudio::from_channels(
            vec![vec![value; frames]],
            rate,
        ))
    }

    fn voice_mut(state: &mut MixerState, slot: usize) -> &mut Voice {
        state.voices[slot].as_mut().unwrap()
    }

    #[test]
    fn test_silent_when_nothing_plays() {
        let mut state = MixerState::new(48_000);
        state.alloc(Voice::new(constant_clip(1.0, 64, 48_000)));

        let mut out = [1.0f32; 32];
        state.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_center_pan_is_constant_power() {
        let mut state = MixerState::new(48_000);
        let slot = state.alloc(Voice::new(constant_clip(1.0, 256, 48_000)));
        voice_mut(&mut state, slot).playing = true;

        let mut out = [0.0f32; 16];
        state.render(&mut out);

        let center = std::f32::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(out[0], center, epsilon = 1e-5);
        assert_relative_eq!(out[1], center, epsilon = 1e-5);
    }

    #[test]
    fn test_pan_extremes() {
        let (l, r) = pan_gains(-1.0);
        assert_relative_eq!(l, 1.0, epsilon = 1e-6);
        assert_relative_eq!(r, 0.0, epsilon = 1e-6);

        let (l, r) = pan_gains(1.0);
        assert_relative_eq!(l, 0.0, epsilon = 1e-6);
        assert_relative_eq!(r, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_one_shot_stops_at_end() {
        let mut state = MixerState::new(48_000);
        let slot = state.alloc(Voice::new(constant_clip(0.5, 8, 48_000)));
        voice_mut(&mut state, slot).playing = true;

        // 16 output frames but only 8 source frames available
        let mut out = [0.0f32; 32];
        state.render(&mut out);

        let voice = voice_mut(&mut state, slot);
        assert!(!voice.playing);
        assert_relative_eq!(voice.cursor as f32, 8.0);
        // Tail of the buffer stays silent
        assert_eq!(out[30], 0.0);
        assert_eq!(out[31], 0.0);
    }

    #[test]
    fn test_looping_wraps_cursor() {
        let mut state = MixerState::new(48_000);
        let slot = state.alloc(Voice::new(constant_clip(0.5, 8, 48_000)));
        {
            let voice = voice_mut(&mut state, slot);
            voice.playing = true;
            voice.looping = true;
        }

        let mut out = [0.0f32; 40];
        state.render(&mut out);

        let voice = voice_mut(&mut state, slot);
        assert!(voice.playing);
        assert!(voice.cursor < 8.0);
        // Every output frame carries signal
        assert!(out.iter().all(|&s| s != 0.0));
    }

    #[test]
    fn test_pitch_doubles_advance() {
        let mut state = MixerState::new(48_000);
        let slot = state.alloc(Voice::new(constant_clip(0.5, 64, 48_000)));
        {
            let voice = voice_mut(&mut state, slot);
            voice.playing = true;
            voice.pitch = 2.0;
        }

        let mut out = [0.0f32; 32];
        state.render(&mut out);
        assert_relative_eq!(voice_mut(&mut state, slot).cursor as f32, 32.0);
    }

    #[test]
    fn test_source_rate_drives_step() {
        // 24 kHz source on a 48 kHz stream advances half a frame per output frame
        let mut state = MixerState::new(48_000);
        let slot = state.alloc(Voice::new(constant_clip(0.5, 64, 24_000)));
        voice_mut(&mut state, slot).playing = true;

        let mut out = [0.0f32; 32];
        state.render(&mut out);
        assert_relative_eq!(voice_mut(&mut state, slot).cursor as f32, 8.0);
    }

    #[test]
    fn test_master_volume_scales_output() {
        let mut state = MixerState::new(48_000);
        let slot = state.alloc(Voice::new(constant_clip(1.0, 64, 48_000)));
        voice_mut(&mut state, slot).playing = true;
        state.set_master_volume(0.5);

        let mut out = [0.0f32; 8];
        state.render(&mut out);
        assert_relative_eq!(
            out[0],
            0.5 * std::f32::consts::FRAC_1_SQRT_2,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_distance_attenuation() {
        let listener = Listener::default();
        let (gain_near, _) = spatialize(&listener, [0.0, 0.0, -0.5]);
        assert_relative_eq!(gain_near, 1.0);

        let (gain_far, _) = spatialize(&listener, [0.0, 0.0, -4.0]);
        assert_relative_eq!(gain_far, 0.25);
    }

    #[test]
    fn test_lateral_pan_follows_listener_right() {
        // Default forward is -Z, so +X is to the listener's right
        let listener = Listener::default();
        let (_, lateral) = spatialize(&listener, [3.0, 0.0, 0.0]);
        assert_relative_eq!(lateral, 1.0, epsilon = 1e-5);

        let (_, lateral) = spatialize(&listener, [-3.0, 0.0, 0.0]);
        assert_relative_eq!(lateral, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_slot_reuse() {
        let mut state = MixerState::new(48_000);
        let a = state.alloc(Voice::new(constant_clip(0.1, 4, 48_000)));
        let b = state.alloc(Voice::new(constant_clip(0.2, 4, 48_000)));
        assert_ne!(a, b);

        state.voices[a] = None;
        let c = state.alloc(Voice::new(constant_clip(0.3, 4, 48_000)));
        assert_eq!(a, c);
    }
}
