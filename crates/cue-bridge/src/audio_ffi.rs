//! Lifecycle and master-gain exports

use std::sync::Once;

use cue_engine::{EngineConfig, MixerEngine};
use cue_system::SoundManager;

use crate::{SOUND_SYSTEM, with_system};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("info"),
        )
        .try_init();
    });
}

/// Initialize the process-wide sound system with default configuration.
///
/// Returns 1 on success, 0 on failure. Fails if the output device cannot
/// be opened, or if the system is already initialized (shut down first).
#[unsafe(no_mangle)]
pub extern "C" fn audio_initialize() -> i32 {
    ffi_guard!(0, {
        init_logging();
        let mut slot = SOUND_SYSTEM.write();
        if slot.is_some() {
            log::warn!("audio_initialize: already initialized; call audio_shutdown first");
            0
        } else {
            match MixerEngine::new(EngineConfig::default()) {
                Ok(engine) => {
                    *slot = Some(SoundManager::new(engine));
                    log::info!("audio_initialize: sound system ready");
                    1
                }
                Err(e) => {
                    log::error!("audio_initialize: engine init failed: {e}");
                    0
                }
            }
        }
    })
}

/// Tear down the sound system, releasing every loaded sound and the
/// output device. Safe to call when not initialized.
#[unsafe(no_mangle)]
pub extern "C" fn audio_shutdown() {
    ffi_guard!((), {
        match SOUND_SYSTEM.write().take() {
            Some(system) => system.shutdown(),
            None => log::warn!("audio_shutdown: not initialized"),
        }
    })
}

/// 1 if the sound system is currently initialized, 0 otherwise.
#[unsafe(no_mangle)]
pub extern "C" fn audio_is_initialized() -> i32 {
    ffi_guard!(0, if SOUND_SYSTEM.read().is_some() { 1 } else { 0 })
}

/// Set the global output gain. Out-of-range values are clamped to [0, 1].
#[unsafe(no_mangle)]
pub extern "C" fn audio_set_master_volume(volume: f32) {
    ffi_guard!((), {
        with_system("audio_set_master_volume", (), |system| {
            system.set_master_volume(volume);
        });
    })
}
