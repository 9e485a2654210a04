//! Tap push-button debouncing and toggle tracking.
//!
//! ## Hardware
//!
//! Active-low momentary switch on a raw GPIO line with a pull-up.  The
//! contacts bounce for a few milliseconds after each transition, so a
//! single edge can produce a burst of level changes.
//!
//! ## Behaviour
//!
//! | Step      | Rule                                                      |
//! |-----------|-----------------------------------------------------------|
//! | Debounce  | sample until the level holds for `settle` samples in a row |
//! | Toggle    | flip on a pressed sample only if a release was seen since  |
//!
//! Holding the button down therefore toggles exactly once.

use std::thread;
use std::time::Duration;

use crate::error::IoError;

/// Consecutive unchanged samples required before a level counts as stable.
pub const DEFAULT_SETTLE_ITERATIONS: u8 = 18;

/// Sleep between samples.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Sample `read` until its value stops changing.
///
/// The countdown restarts from `settle_iterations` every time the sampled
/// value differs from the previous one.  The first read error aborts the
/// routine and no further samples are taken.
pub fn debounce_digital_input<F>(
    mut read: F,
    settle_iterations: u8,
    poll_interval: Duration,
) -> Result<bool, IoError>
where
    F: FnMut() -> Result<bool, IoError>,
{
    let mut last = read()?;
    let mut remaining = settle_iterations;

    while remaining > 0 {
        if !poll_interval.is_zero() {
            thread::sleep(poll_interval);
        }
        let sample = read()?;
        if sample == last {
            remaining -= 1;
        } else {
            last = sample;
            remaining = settle_iterations;
        }
    }

    Ok(last)
}

/// Advance the toggle state by one debounced sample.
///
/// `sampled_low` is `true` while the button is pressed.
pub fn tap_toggle_on_edge(
    current_state: bool,
    released_since_last_press: &mut bool,
    sampled_low: bool,
) -> bool {
    if sampled_low {
        if *released_since_last_press {
            *released_since_last_press = false;
            return !current_state;
        }
        current_state
    } else {
        *released_since_last_press = true;
        current_state
    }
}

/// Toggle state plus its release flag, owned by the tap button worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapToggle {
    on: bool,
    released: bool,
}

impl Default for TapToggle {
    fn default() -> Self {
        Self::new()
    }
}

impl TapToggle {
    pub const fn new() -> Self {
        Self {
            on: false,
            released: true,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Overwrite the on/off state, e.g. after it changed elsewhere.  The
    /// release flag is kept.
    pub fn sync(&mut self, on: bool) {
        self.on = on;
    }

    /// Feed one debounced sample; returns `Some(new_state)` on a toggle.
    pub fn sample(&mut self, pressed: bool) -> Option<bool> {
        let next = tap_toggle_on_edge(self.on, &mut self.released, pressed);
        if next == self.on {
            return None;
        }
        self.on = next;
        Some(next)
    }
}
