//! Shared state between the emulation and presentation threads.
//!
//! Three pieces, each with its own lock:
//!
//! - the frame slot: single writer (emulation), single reader
//!   (presentation), a mutex plus a condition variable. By default the
//!   emulation thread blocks after publishing until the presenter consumes
//!   the frame (vsync-coupled); free-run skips the wait.
//! - the button snapshot: written on every key event, read when the
//!   controller strobe latches.
//! - the run state: either side may flip it to `Exiting`; doing so also
//!   releases the frame condvar so nobody stays blocked.

use std::sync::{Condvar, Mutex};

use ferricom_core::{FRAME_HEIGHT, FRAME_WIDTH};

/// Run state shared by both threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Both loops keep going.
    Running,
    /// Drain and join.
    Exiting,
}

struct FrameSlot {
    rgba: Vec<u8>,
    pending: bool,
    /// Cleared on shutdown so a blocked publisher falls through.
    wait_for_consume: bool,
}

/// Everything the two threads share.
pub struct Shared {
    slot: Mutex<FrameSlot>,
    consumed: Condvar,
    buttons: Mutex<u8>,
    state: Mutex<RunState>,
}

impl Shared {
    /// Fresh shared state. `vsync_coupled` selects whether the publisher
    /// waits for the presenter.
    #[must_use]
    pub fn new(vsync_coupled: bool) -> Self {
        Self {
            slot: Mutex::new(FrameSlot {
                rgba: vec![0; FRAME_WIDTH * FRAME_HEIGHT * 4],
                pending: false,
                wait_for_consume: vsync_coupled,
            }),
            consumed: Condvar::new(),
            buttons: Mutex::new(0),
            state: Mutex::new(RunState::Running),
        }
    }

    /// Publish a finished frame. In the coupled mode this blocks until the
    /// presenter has taken it (or shutdown releases the slot).
    pub fn publish_frame(&self, rgba: &[u8]) {
        let mut slot = self.slot.lock().expect("frame slot poisoned");
        slot.rgba.copy_from_slice(rgba);
        slot.pending = true;
        while slot.pending && slot.wait_for_consume {
            slot = self.consumed.wait(slot).expect("frame slot poisoned");
        }
    }

    /// Copy the pending frame out, if any. Signals the publisher.
    pub fn take_frame(&self, dest: &mut [u8]) -> bool {
        let mut slot = self.slot.lock().expect("frame slot poisoned");
        if !slot.pending {
            return false;
        }
        dest.copy_from_slice(&slot.rgba);
        slot.pending = false;
        self.consumed.notify_one();
        true
    }

    /// Store the live button snapshot.
    pub fn set_buttons(&self, buttons: u8) {
        *self.buttons.lock().expect("button snapshot poisoned") = buttons;
    }

    /// Read the live button snapshot.
    #[must_use]
    pub fn buttons(&self) -> u8 {
        *self.buttons.lock().expect("button snapshot poisoned")
    }

    /// Current run state.
    #[must_use]
    pub fn exiting(&self) -> bool {
        *self.state.lock().expect("run state poisoned") == RunState::Exiting
    }

    /// Flip to `Exiting` and release anyone blocked on the frame slot.
    pub fn stop(&self) {
        {
            let mut state = self.state.lock().expect("run state poisoned");
            if *state == RunState::Exiting {
                return;
            }
            *state = RunState::Exiting;
        }
        let mut slot = self.slot.lock().expect("frame slot poisoned");
        slot.pending = false;
        slot.wait_for_consume = false;
        self.consumed.notify_all();
    }
}
