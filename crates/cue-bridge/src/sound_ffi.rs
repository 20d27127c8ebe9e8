//! Sound registry exports

use std::ffi::c_char;

use crate::helpers::cstr_to_string;
use crate::{SOUND_SYSTEM, with_system};

/// Load the audio asset at `path` and register it under `sound_id`.
///
/// Returns 1 on success (including the idempotent already-loaded case),
/// 0 on failure. The asset is fully decoded into memory.
#[unsafe(no_mangle)]
pub extern "C" fn sound_load(path: *const c_char, sound_id: *const c_char) -> i32 {
    ffi_guard!(0, {
        let path = unsafe { cstr_to_string(path) };
        let id = unsafe { cstr_to_string(sound_id) };
        let (Some(path), Some(id)) = (path, id) else {
            log::error!("sound_load: null or invalid path/sound id");
            return 0;
        };
        with_system("sound_load", 0, |system| match system.load(&path, &id) {
            Ok(()) => 1,
            Err(e) => {
                log::error!("sound_load: {e}");
                0
            }
        })
    })
}

/// Unload a sound, stopping it first if it is playing. Unknown ids are
/// reported as a warning and ignored.
#[unsafe(no_mangle)]
pub extern "C" fn sound_unload(sound_id: *const c_char) {
    ffi_guard!((), {
        let Some(id) = (unsafe { cstr_to_string(sound_id) }) else {
            log::error!("sound_unload: null or invalid sound id");
            return;
        };
        with_system("sound_unload", (), |system| system.unload(&id));
    })
}

/// Play a loaded sound. A sound that is already playing restarts from
/// the beginning. Nonzero `looping` loops indefinitely.
#[unsafe(no_mangle)]
pub extern "C" fn sound_play(sound_id: *const c_char, looping: i32) {
    ffi_guard!((), {
        let Some(id) = (unsafe { cstr_to_string(sound_id) }) else {
            log::error!("sound_play: null or invalid sound id");
            return;
        };
        with_system("sound_play", (), |system| {
            if let Err(e) = system.play(&id, looping != 0) {
                log::error!("sound_play: {e}");
            }
        });
    })
}

/// Stop a sound and rewind it to the beginning.
#[unsafe(no_mangle)]
pub extern "C" fn sound_stop(sound_id: *const c_char) {
    ffi_guard!((), {
        let Some(id) = (unsafe { cstr_to_string(sound_id) }) else {
            log::error!("sound_stop: null or invalid sound id");
            return;
        };
        with_system("sound_stop", (), |system| {
            if let Err(e) = system.stop(&id) {
                log::error!("sound_stop: {e}");
            }
        });
    })
}

/// Pause a sound, preserving its playback position for `sound_resume`.
#[unsafe(no_mangle)]
pub extern "C" fn sound_pause(sound_id: *const c_char) {
    ffi_guard!((), {
        let Some(id) = (unsafe { cstr_to_string(sound_id) }) else {
            log::error!("sound_pause: null or invalid sound id");
            return;
        };
        with_system("sound_pause", (), |system| {
            if let Err(e) = system.pause(&id) {
                log::error!("sound_pause: {e}");
            }
        });
    })
}

/// Resume a paused sound from its preserved position.
#[unsafe(no_mangle)]
pub extern "C" fn sound_resume(sound_id: *const c_char) {
    ffi_guard!((), {
        let Some(id) = (unsafe { cstr_to_string(sound_id) }) else {
            log::error!("sound_resume: null or invalid sound id");
            return;
        };
        with_system("sound_resume", (), |system| {
            if let Err(e) = system.resume(&id) {
                log::error!("sound_resume: {e}");
            }
        });
    })
}

/// Per-sound gain; clamped to [0, 1].
#[unsafe(no_mangle)]
pub extern "C" fn sound_set_volume(sound_id: *const c_char, volume: f32) {
    ffi_guard!((), {
        let Some(id) = (unsafe { cstr_to_string(sound_id) }) else {
            log::error!("sound_set_volume: null or invalid sound id");
            return;
        };
        with_system("sound_set_volume", (), |system| {
            system.set_volume(&id, volume);
        });
    })
}

/// Stereo pan; clamped to [-1, 1] (-1 full left, 0 center, 1 full right).
#[unsafe(no_mangle)]
pub extern "C" fn sound_set_pan(sound_id: *const c_char, pan: f32) {
    ffi_guard!((), {
        let Some(id) = (unsafe { cstr_to_string(sound_id) }) else {
            log::error!("sound_set_pan: null or invalid sound id");
            return;
        };
        with_system("sound_set_pan", (), |system| {
            system.set_pan(&id, pan);
        });
    })
}

/// Playback rate multiplier (1.0 = normal). Values at or below zero are
/// replaced with a small positive floor.
#[unsafe(no_mangle)]
pub extern "C" fn sound_set_pitch(sound_id: *const c_char, pitch: f32) {
    ffi_guard!((), {
        let Some(id) = (unsafe { cstr_to_string(sound_id) }) else {
            log::error!("sound_set_pitch: null or invalid sound id");
            return;
        };
        with_system("sound_set_pitch", (), |system| {
            system.set_pitch(&id, pitch);
        });
    })
}

/// World position of the sound's emitter.
#[unsafe(no_mangle)]
pub extern "C" fn sound_set_position(sound_id: *const c_char, x: f32, y: f32, z: f32) {
    ffi_guard!((), {
        let Some(id) = (unsafe { cstr_to_string(sound_id) }) else {
            log::error!("sound_set_position: null or invalid sound id");
            return;
        };
        with_system("sound_set_position", (), |system| {
            system.set_position(&id, x, y, z);
        });
    })
}

/// 1 if the sound is currently playing, 0 otherwise (including null,
/// unknown or never-loaded ids, and an uninitialized system).
#[unsafe(no_mangle)]
pub extern "C" fn sound_is_playing(sound_id: *const c_char) -> i32 {
    ffi_guard!(0, {
        let Some(id) = (unsafe { cstr_to_string(sound_id) }) else {
            return 0;
        };
        match SOUND_SYSTEM.read().as_ref() {
            Some(system) => system.is_playing(&id) as i32,
            None => 0,
        }
    })
}
