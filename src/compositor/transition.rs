// src/compositor/transition.rs

//! The transition engine: the `CompositorTransition` descriptor trait, the
//! live transition state, and the shipped concrete transitions.
//!
//! A transition descriptor is driven by a generic animation: the compositor
//! creates and owns the animation handle, and on every animation frame
//! calls `update` with a `TransitionContext` exposing the compositing
//! helpers. `teardown` runs exactly once, either on completion (followed by
//! the finish path) or synchronously when the transition is superseded.

use log::trace;

use crate::animation::{AnimationHandle, Curve};
use crate::compositor::bezel;
use crate::framebuffer::FrameBuffer;
use crate::geometry::{Point, Size};
use crate::graphics::GraphicsContext;
use crate::modal::ModalManager;

/// Per-frame drawing surface handed to `CompositorTransition::update`.
///
/// Wraps the hardware framebuffer together with the app frame held stable
/// for the duration of the transition, and the modal layer. The modal
/// offset set here is applied when the modal layer is drawn and is kept by
/// the compositor between frames.
pub struct TransitionContext<'a> {
    framebuffer: &'a mut FrameBuffer,
    app_frame: &'a FrameBuffer,
    modal: &'a mut dyn ModalManager,
    pub modal_offset: Point,
    bezel_peek_offset: u32,
}

impl<'a> TransitionContext<'a> {
    pub(crate) fn new(
        framebuffer: &'a mut FrameBuffer,
        app_frame: &'a FrameBuffer,
        modal: &'a mut dyn ModalManager,
        modal_offset: Point,
        bezel_peek_offset: u32,
    ) -> Self {
        TransitionContext {
            framebuffer,
            app_frame,
            modal,
            modal_offset,
            bezel_peek_offset,
        }
    }

    pub fn display_size(&self) -> Size {
        self.framebuffer.size()
    }

    /// Composites the held app frame into the hardware framebuffer,
    /// bezel-bordered if the app frame is smaller than the display.
    pub fn draw_app(&mut self) {
        bezel::composite(self.framebuffer, self.app_frame, self.bezel_peek_offset);
    }

    /// Renders the modal layer at the current modal offset, restoring the
    /// drawing origin afterwards.
    pub fn draw_modal(&mut self) {
        let mut ctx = GraphicsContext::new(&mut *self.framebuffer);
        let offset = self.modal_offset;
        ctx.with_origin(offset, |ctx| self.modal.render(ctx));
    }
}

/// A compositor transition descriptor.
///
/// `init` runs once when the compositor accepts the transition; `update`
/// runs once per animation frame with curved progress in `0.0..=1.0`;
/// `teardown` runs exactly once when the transition completes or is
/// superseded.
pub trait CompositorTransition {
    fn init(&mut self, display_size: Size) {
        let _ = display_size;
    }

    fn duration_ms(&self) -> u64;

    fn curve(&self) -> Curve {
        Curve::EaseInOut
    }

    fn update(&mut self, ctx: &mut TransitionContext<'_>, progress: f32);

    fn teardown(&mut self) {}

    /// When true, the compositor does not render the modal layer after
    /// `update` returns; the transition has drawn everything itself.
    fn skip_modal_render_after_update(&self) -> bool {
        false
    }
}

/// The live transition: an owned animation handle, the descriptor driving
/// it, and the modal-layer translation applied while it runs.
pub(crate) struct CompositorTransitionState {
    pub(crate) animation: AnimationHandle,
    pub(crate) descriptor: Box<dyn CompositorTransition>,
    pub(crate) modal_offset: Point,
}

/// Display edge a sliding modal enters from or leaves towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    /// Offset placing the modal layer fully off-screen past this edge.
    fn off_screen(self, size: Size) -> Point {
        match self {
            Edge::Top => Point::new(0, -(size.height as i32)),
            Edge::Bottom => Point::new(0, size.height as i32),
            Edge::Left => Point::new(-(size.width as i32), 0),
            Edge::Right => Point::new(size.width as i32, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlideDirection {
    /// Modal slides from off-screen to its resting position.
    In,
    /// Modal slides from its resting position off-screen.
    Out,
}

/// Slides the modal layer in from (or out towards) a display edge while the
/// app frame stays put underneath.
pub struct SlideTransition {
    edge: Edge,
    direction: SlideDirection,
    duration_ms: u64,
    extent: Point,
}

impl SlideTransition {
    pub fn slide_in(edge: Edge, duration_ms: u64) -> Self {
        SlideTransition {
            edge,
            direction: SlideDirection::In,
            duration_ms,
            extent: Point::zero(),
        }
    }

    pub fn slide_out(edge: Edge, duration_ms: u64) -> Self {
        SlideTransition {
            edge,
            direction: SlideDirection::Out,
            duration_ms,
            extent: Point::zero(),
        }
    }
}

impl CompositorTransition for SlideTransition {
    fn init(&mut self, display_size: Size) {
        self.extent = self.edge.off_screen(display_size);
        trace!(
            "slide transition ({:?}, {:?}) extent {:?}",
            self.edge,
            self.direction,
            self.extent
        );
    }

    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    fn update(&mut self, ctx: &mut TransitionContext<'_>, progress: f32) {
        ctx.draw_app();
        let t = match self.direction {
            SlideDirection::In => 1.0 - progress,
            SlideDirection::Out => progress,
        };
        ctx.modal_offset = Point::new(
            (self.extent.x as f32 * t).round() as i32,
            (self.extent.y as f32 * t).round() as i32,
        );
    }
}

/// A transition with no animation frames to speak of: a single frame at
/// full progress, then completion. Used where a state change should go
/// through the transition machinery without any visible motion.
pub struct CutTransition;

impl CompositorTransition for CutTransition {
    fn duration_ms(&self) -> u64 {
        0
    }

    fn curve(&self) -> Curve {
        Curve::Linear
    }

    fn update(&mut self, ctx: &mut TransitionContext<'_>, _progress: f32) {
        ctx.draw_app();
        ctx.modal_offset = Point::zero();
    }
}
