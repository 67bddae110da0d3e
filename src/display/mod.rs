// src/display/mod.rs

//! The display-hardware seam: `DisplayDriver` and its implementations.
//!
//! A flush (`update`) is the one genuinely asynchronous operation in the
//! system. It is initiated non-blocking; completion is reported as a
//! `DisplayEvent::UpdateComplete` from `poll_events`, so the completion
//! callback of the real hardware is modeled as a message processed on the
//! kernel task's own turn, never concurrently with other kernel logic.

pub mod headless;
#[cfg(test)]
pub mod mock;

pub use headless::HeadlessDriver;

use anyhow::Result;

use crate::framebuffer::FrameBuffer;

/// Events originating from the display hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// The previously initiated flush has reached the panel. Emitted exactly
    /// once per `update` call, and the sole trigger for draining the
    /// compositor's deferred-render record.
    UpdateComplete,
}

/// Interface to the physical display.
///
/// Implementations must not block in `update`; they report completion
/// through `poll_events`. Callers never invoke `update` while
/// `update_in_progress` is true: the compositor's deferred-render record
/// absorbs render requests that arrive in that window.
pub trait DisplayDriver {
    /// Begins an asynchronous flush of `frame` to the panel.
    fn update(&mut self, frame: &FrameBuffer) -> Result<()>;

    /// True from `update` until the matching `UpdateComplete` is emitted.
    fn update_in_progress(&self) -> bool;

    /// Drains pending hardware events. Called once per kernel cycle.
    fn poll_events(&mut self) -> Vec<DisplayEvent>;
}
