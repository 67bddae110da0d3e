// src/app.rs

//! The application-task seam and the render-readiness handshake types.
//!
//! The handshake gives write access to the application framebuffer to
//! exactly one side at a time without a lock: the app owns it until it
//! posts `AppMessage::RenderReady`; the kernel owns read access until it
//! delivers `AppEvent::RenderFinished`, which is the only legal grant of
//! write access back to the app and is issued exactly once per
//! `RenderReady`.

use crate::framebuffer::FrameBuffer;

/// Kernel → app events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The kernel is done reading the app framebuffer; the app may render
    /// a new frame.
    RenderFinished,
    /// The compositor needs a fresh app frame (e.g. to start a transition
    /// or to recomposite behind a transparent modal).
    FrameRequested,
    /// Focus moved between the app and a modal window.
    FocusChanged { focused: bool },
}

/// App → kernel messages, surfaced through `AppTask::poll`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMessage {
    /// The app finished drawing into its framebuffer and relinquishes it
    /// for compositing.
    RenderReady,
}

/// Stand-in for the process manager's view of the foreground application.
///
/// The kernel only ever *reads* the app framebuffer, and only between a
/// `RenderReady` message and the matching `RenderFinished` event.
pub trait AppTask {
    /// The app's framebuffer. Its logical size may be smaller than the
    /// display (bezel mode) but never larger.
    fn framebuffer(&self) -> &FrameBuffer;

    /// Delivers an event to the application task's queue.
    fn deliver(&mut self, event: AppEvent);

    /// Drains messages the application task has posted to the kernel.
    fn poll(&mut self) -> Vec<AppMessage>;
}
