//! Spatialization listener exports (single default listener)

use crate::with_system;

/// World position of the listener.
#[unsafe(no_mangle)]
pub extern "C" fn listener_set_position(x: f32, y: f32, z: f32) {
    ffi_guard!((), {
        with_system("listener_set_position", (), |system| {
            system.set_listener_position(x, y, z);
        });
    })
}

/// Forward vector of the listener. There is no up-vector control.
#[unsafe(no_mangle)]
pub extern "C" fn listener_set_orientation(forward_x: f32, forward_y: f32, forward_z: f32) {
    ffi_guard!((), {
        with_system("listener_set_orientation", (), |system| {
            system.set_listener_orientation(forward_x, forward_y, forward_z);
        });
    })
}
