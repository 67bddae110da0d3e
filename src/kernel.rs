// src/kernel.rs

//! The KernelMain-side run loop: owns the compositor, the animation
//! scheduler and the collaborator trait objects, and processes every
//! queue on the kernel task's own turn.
//!
//! Per-cycle drain order: display completions (they unblock deferred
//! work), kernel self-posted events, app messages, then the animation
//! tick. The two tasks never share a lock; everything that looks like a
//! cross-context callback arrives here as a polled message.


use std::collections::VecDeque;

use anyhow::Result;
use log::{trace, warn};

use crate::animation::{AnimationEvent, AnimationScheduler};
use crate::app::{AppMessage, AppTask};
use crate::compositor::transition::CompositorTransition;
use crate::compositor::{Compositor, Services};
use crate::display::{DisplayDriver, DisplayEvent};
use crate::framebuffer::FrameBuffer;
use crate::geometry::Point;
use crate::modal::ModalManager;

/// Events the kernel loop posts to itself, processed on a later turn of
/// its own cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KernelEvent {
    /// Replay the deferred-render record, exactly as flush-complete does.
    /// Posted by `unfreeze`.
    ReplayDeferred,
}

pub struct KernelLoop<'a> {
    compositor: Compositor,
    animations: AnimationScheduler,
    display: &'a mut dyn DisplayDriver,
    modal: &'a mut dyn ModalManager,
    app: &'a mut dyn AppTask,
    pending: VecDeque<KernelEvent>,
}

impl<'a> KernelLoop<'a> {
    pub fn new(
        compositor: Compositor,
        display: &'a mut dyn DisplayDriver,
        modal: &'a mut dyn ModalManager,
        app: &'a mut dyn AppTask,
    ) -> Self {
        KernelLoop {
            compositor,
            animations: AnimationScheduler::new(),
            display,
            modal,
            app,
            pending: VecDeque::new(),
        }
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        self.compositor.framebuffer()
    }

    pub fn is_animating(&self) -> bool {
        self.compositor.is_animating()
    }

    /// Requests a visual-state change, animated by `transition` when one
    /// is supplied. See `Compositor::transition`.
    pub fn transition(
        &mut self,
        now_ms: u64,
        transition: Option<Box<dyn CompositorTransition>>,
    ) -> Result<()> {
        self.with_services(now_ms, |comp, svc| comp.transition(svc, transition))
    }

    /// Unschedules the active transition's animation without tearing the
    /// transition down.
    pub fn transition_cancel(&mut self, now_ms: u64) {
        self.with_services(now_ms, |comp, svc| comp.transition_cancel(svc));
    }

    /// Entry point for the kernel's own windows after a modal redraw.
    pub fn modal_render_ready(&mut self, now_ms: u64) -> Result<()> {
        self.with_services(now_ms, |comp, svc| comp.modal_render_ready(svc))
    }

    pub fn set_modal_transition_offset(&mut self, offset: Point) {
        self.compositor.set_modal_transition_offset(offset);
    }

    pub fn freeze(&mut self) {
        self.compositor.freeze();
    }

    /// Clears the freeze and schedules a deferred-record replay on this
    /// loop's next turn, mirroring the flush-complete handler.
    pub fn unfreeze(&mut self) {
        self.compositor.unfreeze();
        self.pending.push_back(KernelEvent::ReplayDeferred);
    }

    /// One turn of the kernel task.
    pub fn run_cycle(&mut self, now_ms: u64) -> Result<()> {
        trace!("kernel cycle at {} ms", now_ms);

        // Flush completions first: they are the sole trigger that drains
        // the deferred-render record.
        for event in self.display.poll_events() {
            match event {
                DisplayEvent::UpdateComplete => {
                    self.with_services(now_ms, |comp, svc| comp.flush_completed(svc))?;
                }
            }
        }

        while let Some(event) = self.pending.pop_front() {
            match event {
                KernelEvent::ReplayDeferred => {
                    self.with_services(now_ms, |comp, svc| comp.replay_deferred(svc))?;
                }
            }
        }

        for message in self.app.poll() {
            match message {
                AppMessage::RenderReady => {
                    self.with_services(now_ms, |comp, svc| comp.handle_app_render_ready(svc))?;
                }
            }
        }

        for event in self.animations.tick(now_ms) {
            match event {
                AnimationEvent::Frame { handle, progress } => {
                    if self.compositor.owns_animation(handle) {
                        self.with_services(now_ms, |comp, svc| {
                            comp.handle_animation_frame(svc, progress)
                        })?;
                    } else {
                        warn!("animation frame for unowned handle {:?}", handle);
                    }
                }
                AnimationEvent::Complete { handle } => {
                    if self.compositor.owns_animation(handle) {
                        self.with_services(now_ms, |comp, svc| {
                            comp.handle_animation_complete(svc)
                        })?;
                    } else {
                        warn!("animation completion for unowned handle {:?}", handle);
                    }
                }
            }
        }

        Ok(())
    }

    fn with_services<R>(
        &mut self,
        now_ms: u64,
        f: impl FnOnce(&mut Compositor, &mut Services) -> R,
    ) -> R {
        let KernelLoop {
            compositor,
            animations,
            display,
            modal,
            app,
            ..
        } = self;
        let mut svc = Services {
            display: &mut **display,
            modal: &mut **modal,
            app: &mut **app,
            animations,
            now_ms,
        };
        f(compositor, &mut svc)
    }
}
