// src/display/headless.rs

//! A display driver with no panel behind it, used by the host simulator.
//!
//! Flush latency is simulated in poll cycles: `update` captures the frame
//! and the driver stays busy for a configurable number of `poll_events`
//! calls before reporting `UpdateComplete`. Latency zero still completes on
//! the *next* poll, preserving the asynchronous contract.

use anyhow::Result;
use log::{debug, trace};

use crate::color::Color;
use crate::display::{DisplayDriver, DisplayEvent};
use crate::framebuffer::FrameBuffer;
use crate::geometry::Size;

pub struct HeadlessDriver {
    size: Size,
    latency_polls: u32,
    polls_remaining: Option<u32>,
    last_frame: Vec<Color>,
    frames_completed: u64,
}

impl HeadlessDriver {
    pub fn new(size: Size, latency_polls: u32) -> Self {
        debug!(
            "headless display {}x{}, flush latency {} polls",
            size.width, size.height, latency_polls
        );
        HeadlessDriver {
            size,
            latency_polls,
            polls_remaining: None,
            last_frame: Vec::new(),
            frames_completed: 0,
        }
    }

    /// Pixels of the most recently flushed frame.
    pub fn last_frame(&self) -> &[Color] {
        &self.last_frame
    }

    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }
}

impl DisplayDriver for HeadlessDriver {
    fn update(&mut self, frame: &FrameBuffer) -> Result<()> {
        assert!(
            self.polls_remaining.is_none(),
            "display update initiated while one is in flight"
        );
        assert_eq!(
            frame.size(),
            self.size,
            "frame size does not match the panel"
        );
        self.last_frame = frame.pixels().to_vec();
        self.polls_remaining = Some(self.latency_polls);
        trace!("flush initiated");
        Ok(())
    }

    fn update_in_progress(&self) -> bool {
        self.polls_remaining.is_some()
    }

    fn poll_events(&mut self) -> Vec<DisplayEvent> {
        match self.polls_remaining {
            Some(0) => {
                self.polls_remaining = None;
                self.frames_completed += 1;
                trace!("flush complete (frame {})", self.frames_completed);
                vec![DisplayEvent::UpdateComplete]
            }
            Some(n) => {
                self.polls_remaining = Some(n - 1);
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}
