//! The free-running emulation loop (no debugger attached).
//!
//! One iteration per frame: sample the shared button snapshot into the
//! controller, run the console to the VBlank dot, publish the frame. In
//! the default vsync-coupled mode the publish blocks until the presenter
//! consumes the frame, which paces emulation to the display.

use ferricom_core::Console;

use crate::sync::Shared;

/// Run until the shared state flips to exiting.
pub fn run(mut console: Console, shared: &Shared) {
    while !shared.exiting() {
        console.set_controller1(shared.buttons());
        console.run_frame();
        if let Some(inv) = console.take_invalid() {
            tracing::warn!(
                "invalid instruction {:02X} at {:04X}, continuing as NOP",
                inv.id,
                inv.pc
            );
        }
        shared.publish_frame(console.framebuffer());
    }
    tracing::debug!("emulation thread exiting after {} frames", console.frame_count());
}
