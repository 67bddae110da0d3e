// src/display/mock.rs

//! Test display driver with manually driven completion.
//!
//! `update` records a snapshot of every flushed frame and leaves the driver
//! busy until the test calls `complete_update`, which emits the
//! `UpdateComplete` event on the next poll. This lets tests hold the
//! "hardware busy" window open across arbitrary compositor calls.

use anyhow::Result;

use crate::color::Color;
use crate::display::{DisplayDriver, DisplayEvent};
use crate::framebuffer::FrameBuffer;

#[derive(Default)]
pub struct MockDriver {
    busy: bool,
    frames: Vec<Vec<Color>>,
    pending_events: Vec<DisplayEvent>,
}

impl MockDriver {
    pub fn new() -> Self {
        MockDriver::default()
    }

    /// Number of `update` calls observed so far.
    pub fn update_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Vec<Color>] {
        &self.frames
    }

    pub fn last_frame(&self) -> &[Color] {
        self.frames.last().expect("no frame flushed yet")
    }

    /// Finishes the in-flight flush; the completion event surfaces on the
    /// next `poll_events` call.
    pub fn complete_update(&mut self) {
        assert!(self.busy, "complete_update without an in-flight update");
        self.busy = false;
        self.pending_events.push(DisplayEvent::UpdateComplete);
    }
}

impl DisplayDriver for MockDriver {
    fn update(&mut self, frame: &FrameBuffer) -> Result<()> {
        assert!(!self.busy, "display update initiated while one is in flight");
        self.busy = true;
        self.frames.push(frame.pixels().to_vec());
        Ok(())
    }

    fn update_in_progress(&self) -> bool {
        self.busy
    }

    fn poll_events(&mut self) -> Vec<DisplayEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
