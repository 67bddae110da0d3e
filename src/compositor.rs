// src/compositor.rs

//! The compositor core: owns the hardware framebuffer, the compositor
//! state machine and the deferred-render record, and decides when to
//! composite, when to flush to hardware, when to release the application
//! framebuffer and when to notify the app of focus changes.
//!
//! Every entry point here runs on the kernel task. The application task
//! participates only through the render-readiness handshake (`app.rs`);
//! the display hardware participates only through `DisplayEvent`s routed
//! in by the kernel loop. Transient contention (flush in flight, frozen
//! compositor) is absorbed by the deferred-render record; invariant
//! violations are fatal, since continuing with a corrupted compositor is
//! worse than rebooting.

pub(crate) mod bezel;
pub(crate) mod deferred;
pub mod transition;


use anyhow::{Context, Result};
use log::{debug, trace, warn};

use crate::animation::{AnimationHandle, AnimationScheduler};
use crate::app::{AppEvent, AppTask};
use crate::display::DisplayDriver;
use crate::framebuffer::FrameBuffer;
use crate::geometry::{Point, Size};
use crate::graphics::GraphicsContext;
use crate::modal::{ModalManager, ModalProperties};

use self::deferred::{DeferredRender, DeferredWork};
use self::transition::{CompositorTransition, CompositorTransitionState, TransitionContext};

/// The compositor's visual state. Mutated only by the kernel task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorState {
    /// Steady: the display shows the app only.
    App,
    /// A transition wants to start but needs the app's first fresh frame.
    AppTransitionPending,
    /// A transition animation is driving every frame.
    Transitioning,
    /// Steady: the display shows modal content only.
    Modal,
    /// Steady: the modal is transparent and the app shows through.
    AppAndModal,
}

/// Collaborators borrowed into every compositor operation for the duration
/// of one kernel-loop turn.
pub struct Services<'a> {
    pub display: &'a mut dyn DisplayDriver,
    pub modal: &'a mut dyn ModalManager,
    pub app: &'a mut dyn AppTask,
    pub animations: &'a mut AnimationScheduler,
    /// Kernel tick timestamp for this turn.
    pub now_ms: u64,
}

pub struct Compositor {
    framebuffer: FrameBuffer,
    state: CompositorState,
    deferred: DeferredRender,
    transition: Option<CompositorTransitionState>,
    /// True between the kernel taking the app frame (`RenderReady`) and
    /// handing it back (`RenderFinished`).
    app_frame_held: bool,
    frozen: bool,
    bezel_peek_offset: u32,
}

impl Compositor {
    /// Creates the compositor and its hardware framebuffer. Called once at
    /// boot; the compositor lives for the lifetime of the firmware.
    pub fn new(display_size: Size) -> Self {
        debug!("compositor init, display {}x{}", display_size.width, display_size.height);
        Compositor {
            framebuffer: FrameBuffer::new(display_size),
            state: CompositorState::App,
            deferred: DeferredRender::default(),
            transition: None,
            app_frame_held: false,
            frozen: false,
            bezel_peek_offset: 0,
        }
    }

    pub fn state(&self) -> CompositorState {
        self.state
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn framebuffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.framebuffer
    }

    /// True while a transition owns the frame (scheduled or awaiting its
    /// first app frame).
    pub fn is_animating(&self) -> bool {
        self.state == CompositorState::Transitioning || self.transition.is_some()
    }

    /// Whether render work may touch the hardware right now. False while a
    /// flush is in flight or the compositor is frozen.
    pub fn should_render(&self, display: &dyn DisplayDriver) -> bool {
        !self.frozen && !display.update_in_progress()
    }

    /// Stops all rendering unconditionally, for safety-critical windows
    /// such as firmware flashing. Requests arriving while frozen land in
    /// the deferred record.
    pub fn freeze(&mut self) {
        debug!("compositor frozen");
        self.frozen = true;
    }

    /// Clears the freeze flag. The kernel loop schedules a deferred-record
    /// replay on its own turn, mirroring the flush-complete path.
    pub fn unfreeze(&mut self) {
        debug!("compositor unfrozen");
        self.frozen = false;
    }

    /// Vertical offset applied in bezel mode to make room for a system
    /// peek overlay above the app image.
    pub fn set_bezel_peek_offset(&mut self, offset: u32) {
        self.bezel_peek_offset = offset;
    }

    /// Overrides the modal-layer translation of the active transition.
    pub fn set_modal_transition_offset(&mut self, offset: Point) {
        match self.transition.as_mut() {
            Some(st) => st.modal_offset = offset,
            None => warn!("modal transition offset set with no active transition"),
        }
    }

    pub(crate) fn owns_animation(&self, handle: AnimationHandle) -> bool {
        self.transition
            .as_ref()
            .is_some_and(|st| st.animation == handle)
    }

    // --- Render-readiness protocol -------------------------------------

    /// Entry point for `AppMessage::RenderReady`. The app has relinquished
    /// its framebuffer; from here until `RenderFinished` the kernel owns
    /// read access to it.
    pub fn handle_app_render_ready(&mut self, svc: &mut Services) -> Result<()> {
        self.app_frame_held = true;
        if !self.should_render(svc.display) {
            debug!("app frame deferred (flush in flight or frozen)");
            self.deferred.set_app();
            return Ok(());
        }
        self.app_render_ready(svc)
    }

    /// The non-deferred half of the protocol. Schedules a pending
    /// transition, or resolves the steady state, composites and flushes,
    /// and releases the app framebuffer.
    pub fn app_render_ready(&mut self, svc: &mut Services) -> Result<()> {
        if self.state == CompositorState::AppTransitionPending {
            if let Some(st) = self.transition.as_ref() {
                // The app frame must stay stable for the whole transition;
                // it is not released here.
                svc.animations.schedule(st.animation, svc.now_ms);
                self.set_state(CompositorState::Transitioning);
                return Ok(());
            }
            let props = svc.modal.properties();
            let next = if props.contains(ModalProperties::EXISTS) {
                CompositorState::AppAndModal
            } else {
                CompositorState::App
            };
            self.set_state(next);
            self.emit_focus_event(svc);
        }
        if matches!(
            self.state,
            CompositorState::App | CompositorState::AppAndModal
        ) {
            self.render_app(svc);
            self.flush(svc)?;
        }
        self.release_app_frame(svc);
        Ok(())
    }

    /// Invoked when the kernel's own modal windows have redrawn.
    pub fn modal_render_ready(&mut self, svc: &mut Services) -> Result<()> {
        if self.state == CompositorState::Transitioning {
            trace!("modal frame ignored, transition drives all drawing");
            return Ok(());
        }
        if !self.should_render(svc.display) {
            trace!("modal frame ignored while flush in flight or frozen");
            return Ok(());
        }
        match self.state {
            CompositorState::Modal => {
                self.render_modal(svc);
                self.flush(svc)?;
            }
            // Rendering only the modal layer would tear against a stale
            // app frame; ask the app for a fresh one instead.
            CompositorState::AppAndModal => svc.app.deliver(AppEvent::FrameRequested),
            CompositorState::App | CompositorState::AppTransitionPending => {
                trace!("modal frame ignored in {:?}", self.state)
            }
            CompositorState::Transitioning => unreachable!(),
        }
        Ok(())
    }

    // --- Compositing ---------------------------------------------------

    /// Composites the app framebuffer into the hardware buffer, bezeled if
    /// the app is smaller than the display; in `AppAndModal` the modal
    /// layer is rendered on top. Marks the hardware buffer fully dirty.
    pub fn render_app(&mut self, svc: &mut Services) {
        let app_frame = svc.app.framebuffer();
        assert!(
            app_frame.size().fits_within(self.framebuffer.size()),
            "application framebuffer larger than the display"
        );
        bezel::composite(&mut self.framebuffer, app_frame, self.bezel_peek_offset);
        if self.state == CompositorState::AppAndModal {
            self.render_modal(svc);
        }
        self.framebuffer.mark_dirty_all();
    }

    /// Renders modal content into the hardware buffer, translated by the
    /// active transition's modal offset. The drawing origin is restored
    /// afterwards.
    pub fn render_modal(&mut self, svc: &mut Services) {
        let offset = self
            .transition
            .as_ref()
            .map(|st| st.modal_offset)
            .unwrap_or_else(Point::zero);
        let mut ctx = GraphicsContext::new(&mut self.framebuffer);
        ctx.with_origin(offset, |ctx| svc.modal.render(ctx));
        self.framebuffer.mark_dirty_all();
    }

    // --- Transitions ---------------------------------------------------

    /// Replaces the current visual state with the one described by the
    /// current modal properties, animated by `transition` if supplied.
    ///
    /// An active transition is superseded immediately: its teardown runs
    /// synchronously and nothing of it replays later. If the hardware is
    /// busy the whole request is deferred as a `transition_start`.
    pub fn transition(
        &mut self,
        svc: &mut Services,
        transition: Option<Box<dyn CompositorTransition>>,
    ) -> Result<()> {
        self.supersede_active_transition(svc);
        if !self.should_render(svc.display) {
            debug!("transition request deferred (flush in flight or frozen)");
            self.deferred.set_transition_start(transition);
            return Ok(());
        }
        let props = svc.modal.properties();
        if props.opaque() {
            // Modal content is renderable on demand, so the animation can
            // start right away.
            match transition {
                Some(desc) => self.start_transition(svc, desc),
                None => self.finish_transition(svc)?,
            }
        } else {
            // No modal, or a transparent one: the stored app frame is
            // stale, so nothing can be shown until the app renders fresh.
            if let Some(desc) = transition {
                self.prepare_transition(svc, desc);
            }
            self.set_state(CompositorState::AppTransitionPending);
            svc.app.deliver(AppEvent::FrameRequested);
        }
        Ok(())
    }

    /// Unschedules (does not tear down) the active transition's animation.
    pub fn transition_cancel(&mut self, svc: &mut Services) {
        match self.transition.as_ref() {
            Some(st) => {
                svc.animations.unschedule(st.animation);
                debug!("transition animation unscheduled");
            }
            None => trace!("transition_cancel with no active transition"),
        }
    }

    /// Resolves the post-transition steady state from the current modal
    /// properties, redraws, and emits the focus event. The app framebuffer
    /// is force-released: it is no longer protected by a transition.
    pub fn finish_transition(&mut self, svc: &mut Services) -> Result<()> {
        debug_assert!(
            self.transition.is_none(),
            "finish_transition with the transition state still live"
        );
        let props = svc.modal.properties();
        let next = steady_state_for(props);
        self.set_state(next);
        match next {
            CompositorState::App => {
                self.render_app(svc);
                self.flush(svc)?;
                self.release_app_frame(svc);
            }
            CompositorState::Modal => {
                self.release_app_frame(svc);
                self.render_modal(svc);
                self.flush(svc)?;
            }
            CompositorState::AppAndModal => {
                self.release_app_frame(svc);
                self.render_app(svc);
                self.flush(svc)?;
            }
            _ => unreachable!("steady_state_for returned a non-steady state"),
        }
        self.emit_focus_event(svc);
        Ok(())
    }

    fn supersede_active_transition(&mut self, svc: &mut Services) {
        if let Some(mut st) = self.transition.take() {
            debug!("superseding active transition");
            svc.animations.unschedule(st.animation);
            svc.animations.destroy(st.animation);
            st.descriptor.teardown();
            // Nothing of the superseded transition may replay.
            self.deferred.clear_transition_slots();
        }
    }

    /// Creates the transition state with its animation left unscheduled;
    /// `app_render_ready` schedules it once a fresh app frame exists.
    fn prepare_transition(&mut self, svc: &mut Services, mut desc: Box<dyn CompositorTransition>) {
        desc.init(self.framebuffer.size());
        let animation = svc.animations.create(desc.duration_ms(), desc.curve());
        self.transition = Some(CompositorTransitionState {
            animation,
            descriptor: desc,
            modal_offset: Point::zero(),
        });
    }

    fn start_transition(&mut self, svc: &mut Services, desc: Box<dyn CompositorTransition>) {
        self.prepare_transition(svc, desc);
        let st = self
            .transition
            .as_ref()
            .expect("transition state just created");
        svc.animations.schedule(st.animation, svc.now_ms);
        self.set_state(CompositorState::Transitioning);
    }

    /// Routed in by the kernel loop for the transition's animation frames.
    pub(crate) fn handle_animation_frame(&mut self, svc: &mut Services, progress: f32) -> Result<()> {
        if !self.should_render(svc.display) {
            trace!("animation frame deferred at progress {:.3}", progress);
            self.deferred.set_animation(progress);
            return Ok(());
        }
        self.transition_animation_update(svc, progress)
    }

    /// Routed in by the kernel loop when the transition's animation
    /// completes.
    pub(crate) fn handle_animation_complete(&mut self, svc: &mut Services) -> Result<()> {
        if !self.should_render(svc.display) {
            debug!("transition completion deferred");
            self.deferred.set_transition_complete();
            return Ok(());
        }
        self.complete_transition(svc)
    }

    fn transition_animation_update(&mut self, svc: &mut Services, progress: f32) -> Result<()> {
        let Some(mut st) = self.transition.take() else {
            panic!("animation frame with no live transition");
        };
        trace!("transition frame at progress {:.3}", progress);
        {
            let mut ctx = TransitionContext::new(
                &mut self.framebuffer,
                svc.app.framebuffer(),
                svc.modal,
                st.modal_offset,
                self.bezel_peek_offset,
            );
            st.descriptor.update(&mut ctx, progress);
            if !st.descriptor.skip_modal_render_after_update() {
                ctx.draw_modal();
            }
            st.modal_offset = ctx.modal_offset;
        }
        self.transition = Some(st);
        self.framebuffer.mark_dirty_all();
        self.flush(svc)
    }

    fn complete_transition(&mut self, svc: &mut Services) -> Result<()> {
        match self.transition.take() {
            Some(mut st) => {
                svc.animations.unschedule(st.animation);
                svc.animations.destroy(st.animation);
                st.descriptor.teardown();
            }
            None => panic!("transition completion with no live transition"),
        }
        self.finish_transition(svc)
    }

    // --- Flush and deferred replay -------------------------------------

    /// Hands the composited hardware framebuffer to the display driver if
    /// anything is dirty. Non-blocking; completion arrives later as a
    /// `DisplayEvent::UpdateComplete`.
    fn flush(&mut self, svc: &mut Services) -> Result<()> {
        if !self.framebuffer.is_dirty() {
            trace!("flush skipped, framebuffer clean");
            return Ok(());
        }
        debug_assert!(
            !svc.display.update_in_progress(),
            "flush initiated while one is in flight"
        );
        let dirty = self.framebuffer.take_dirty();
        trace!("flushing {:?}", dirty);
        svc.display
            .update(&self.framebuffer)
            .context("display update failed")
    }

    /// The sole trigger (besides unfreeze) that drains the deferred-render
    /// record. Runs on the kernel task's own turn.
    pub fn flush_completed(&mut self, svc: &mut Services) -> Result<()> {
        trace!("display flush complete");
        self.replay_deferred(svc)
    }

    /// Drains the deferred record in priority order. Each slot is cleared
    /// before its handler runs; a handler that initiates a flush stops the
    /// drain until the next flush-complete.
    pub(crate) fn replay_deferred(&mut self, svc: &mut Services) -> Result<()> {
        while self.should_render(svc.display) {
            let Some(work) = self.deferred.take_next() else {
                break;
            };
            match work {
                DeferredWork::TransitionComplete => self.complete_transition(svc)?,
                DeferredWork::Animation(progress) => {
                    self.transition_animation_update(svc, progress)?
                }
                DeferredWork::App => self.app_render_ready(svc)?,
                DeferredWork::TransitionStart(desc) => self.transition(svc, desc)?,
            }
        }
        if !self.deferred.is_empty() {
            trace!("deferred work remains for the next flush-complete");
        }
        Ok(())
    }

    // --- Internal helpers ----------------------------------------------

    fn set_state(&mut self, next: CompositorState) {
        if self.state != next {
            debug!("compositor state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Grants the app write access to its framebuffer again. Idempotent so
    /// the finish path can force-release without double-granting.
    fn release_app_frame(&mut self, svc: &mut Services) {
        if self.app_frame_held {
            self.app_frame_held = false;
            svc.app.deliver(AppEvent::RenderFinished);
        }
    }

    fn emit_focus_event(&mut self, svc: &mut Services) {
        let focused = svc.modal.properties().app_focused();
        svc.app.deliver(AppEvent::FocusChanged { focused });
    }
}

fn steady_state_for(props: ModalProperties) -> CompositorState {
    if !props.contains(ModalProperties::EXISTS) {
        CompositorState::App
    } else if props.contains(ModalProperties::TRANSPARENT) {
        CompositorState::AppAndModal
    } else {
        CompositorState::Modal
    }
}
