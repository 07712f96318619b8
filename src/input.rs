//! Debounced input pipeline: button edges and encoder detents.
//!
//! The button edge arrives from an interrupt context; [`EdgeCell`] is the
//! single piece of state shared between that context and the main loop. The
//! interrupt side only stamps a timestamp and sets a sticky pending flag.
//! The debounce decision — and everything else — happens on the loop side,
//! so interrupt latency stays bounded and no re-entrant hazard exists.
//!
//! The encoder is polled, not interrupt-driven: [`EncoderDebouncer`] turns
//! the raw bounded position into discrete change events, filtering the
//! contact bounce of the quadrature mechanism with a short settle window.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::time::elapsed_ms;

/// A discrete, debounced input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    /// The push button was pressed (at most once per physical press).
    ButtonPressed,

    /// The encoder moved to a new bounded position.
    PositionChanged(i32),
}

/// Trait for abstracting the rotary encoder driver.
///
/// The driver owns the quadrature decode and clamps the position to a
/// `0..=max` range; this crate only reads the resulting integer and
/// re-clamps the range when the active screen changes.
pub trait RotaryEncoder {
    /// Current bounded position.
    fn value(&self) -> i32;

    /// Re-clamps the position range to `0..=max_value`.
    fn set_bound(&mut self, max_value: i32);
}

/// Lock-free pending-edge cell shared with the button interrupt handler.
///
/// Single writer (the interrupt), single reader-then-clear (the main loop).
/// The pending flag is sticky: an edge is never lost between interrupt and
/// consumption, though edges overwriting each other before consumption
/// collapse to the newest timestamp, which the debounce window would have
/// collapsed anyway.
///
/// ```ignore
/// static BUTTON_EDGE: EdgeCell = EdgeCell::new();
///
/// // in the falling-edge ISR: nothing but a stamp and a flag
/// BUTTON_EDGE.record(ticks_ms());
/// ```
pub struct EdgeCell {
    stamp_ms: AtomicU32,
    pending: AtomicBool,
}

impl EdgeCell {
    pub const fn new() -> Self {
        Self {
            stamp_ms: AtomicU32::new(0),
            pending: AtomicBool::new(false),
        }
    }

    /// Records an edge. Interrupt-side; must stay minimal and non-blocking.
    pub fn record(&self, now_ms: u32) {
        self.stamp_ms.store(now_ms, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
    }

    /// Consumes the pending edge, if any. Loop-side.
    pub fn take(&self) -> Option<u32> {
        if self.pending.swap(false, Ordering::Acquire) {
            Some(self.stamp_ms.load(Ordering::Relaxed))
        } else {
            None
        }
    }
}

impl Default for EdgeCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Debounces raw button edges into accepted press events.
///
/// An edge is accepted only when more than the debounce window has elapsed
/// since the previous *accepted* edge; suppressed bounces do not extend the
/// window. Elapsed time is measured wraparound-safe on the millisecond
/// counter.
pub struct ButtonDebouncer {
    window_ms: u32,
    last_accepted_ms: u32,
}

impl ButtonDebouncer {
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ms,
            last_accepted_ms: 0,
        }
    }

    /// Polls the edge cell, returning `true` at most once per physical press.
    pub fn poll(&mut self, edges: &EdgeCell) -> bool {
        let Some(at_ms) = edges.take() else {
            return false;
        };
        if elapsed_ms(at_ms, self.last_accepted_ms) <= self.window_ms {
            return false;
        }
        self.last_accepted_ms = at_ms;
        true
    }
}

/// Debounces the encoder's bounded position into discrete change events.
///
/// A new value is reported only when it differs from the last observed value
/// and the settle window has passed since the last accepted change. A
/// bounce-suppressed change is not lost: the value still differs on the next
/// poll and is reported once the window clears, so genuine consecutive
/// detents all arrive.
pub struct EncoderDebouncer {
    settle_ms: u32,
    last_value: i32,
    last_change_ms: u32,
}

impl EncoderDebouncer {
    pub fn new(settle_ms: u32, initial_value: i32) -> Self {
        Self {
            settle_ms,
            last_value: initial_value,
            last_change_ms: 0,
        }
    }

    /// Reports the new position if it changed and the settle window cleared.
    pub fn poll(&mut self, raw: i32, now_ms: u32) -> Option<i32> {
        if raw == self.last_value {
            return None;
        }
        if elapsed_ms(now_ms, self.last_change_ms) <= self.settle_ms {
            return None;
        }
        self.last_value = raw;
        self.last_change_ms = now_ms;
        Some(raw)
    }
}
