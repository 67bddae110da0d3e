// src/main.rs

//! Host simulator for the compositor.
//!
//! Wires a headless display driver, a demo application task and a demo
//! modal manager into the kernel loop, then runs a scripted sequence:
//! steady app frames, a modal pushed with a slide-in transition, a
//! freeze/unfreeze window, and a modal pop. Intended for exercising the
//! compositor end to end on a workstation; on hardware the same kernel
//! loop runs against the real driver and process manager.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use log::{info, warn};

use core_compositor::app::{AppEvent, AppMessage, AppTask};
use core_compositor::color::Color;
use core_compositor::compositor::transition::{Edge, SlideTransition};
use core_compositor::compositor::Compositor;
use core_compositor::config::Config;
use core_compositor::display::HeadlessDriver;
use core_compositor::framebuffer::FrameBuffer;
use core_compositor::geometry::{Rect, Size};
use core_compositor::graphics::GraphicsContext;
use core_compositor::kernel::KernelLoop;
use core_compositor::modal::{ModalManager, ModalProperties};

/// Legacy app resolution, displayed bezeled on the larger panel.
const APP_SIZE: Size = Size::new(144, 168);
const SIM_CYCLES: u64 = 60;

/// A foreground application that renders a test pattern whenever it holds
/// write access to its framebuffer and a frame has been requested.
struct DemoApp {
    framebuffer: FrameBuffer,
    outbox: Vec<AppMessage>,
    owns_buffer: bool,
    frame_requested: bool,
    frames_drawn: u32,
}

impl DemoApp {
    fn new(size: Size) -> Self {
        let mut app = DemoApp {
            framebuffer: FrameBuffer::new(size),
            outbox: Vec::new(),
            owns_buffer: true,
            frame_requested: false,
            frames_drawn: 0,
        };
        app.draw_frame();
        app
    }

    fn draw_frame(&mut self) {
        assert!(self.owns_buffer, "app drew without write access");
        let size = self.framebuffer.size();
        for y in 0..size.height {
            for x in 0..size.width {
                let shade = ((x + y + self.frames_drawn) % 4) as u8;
                self.framebuffer
                    .set_pixel(x, y, Color(0b1100_0000 | (shade << 4) | shade));
            }
        }
        self.frames_drawn += 1;
        self.owns_buffer = false;
        self.outbox.push(AppMessage::RenderReady);
    }
}

impl AppTask for DemoApp {
    fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    fn deliver(&mut self, event: AppEvent) {
        match event {
            AppEvent::RenderFinished => {
                self.owns_buffer = true;
                if self.frame_requested {
                    self.frame_requested = false;
                    self.draw_frame();
                }
            }
            AppEvent::FrameRequested => {
                if self.owns_buffer {
                    self.draw_frame();
                } else {
                    self.frame_requested = true;
                }
            }
            AppEvent::FocusChanged { focused } => {
                info!("app focus changed: focused={}", focused);
            }
        }
    }

    fn poll(&mut self) -> Vec<AppMessage> {
        std::mem::take(&mut self.outbox)
    }
}

/// A notification-style banner modal. Visibility is scripted from `main`
/// through a shared flag; the banner itself stays renderable during the
/// pop animation after visibility drops.
struct DemoModal {
    visible: Rc<Cell<bool>>,
    banner_height: u32,
}

impl ModalManager for DemoModal {
    fn properties(&self) -> ModalProperties {
        if self.visible.get() {
            ModalProperties::EXISTS | ModalProperties::UNFOCUSED
        } else {
            ModalProperties::empty()
        }
    }

    fn render(&mut self, ctx: &mut GraphicsContext<'_>) {
        let size = ctx.size();
        ctx.fill_rect(Rect::new(0, 0, size.width, self.banner_height), Color::WHITE);
        ctx.fill_rect(
            Rect::new(0, self.banner_height as i32 - 2, size.width, 2),
            Color::BLACK,
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(Path::new(&path)).context("failed to load configuration")?,
        None => Config::default(),
    };
    info!(
        "compositor simulator, panel {}x{}",
        config.display.cols, config.display.rows
    );

    let mut compositor = Compositor::new(config.display.size());
    compositor.set_bezel_peek_offset(config.system.bezel_peek_offset);

    let mut driver = HeadlessDriver::new(config.display.size(), config.display.flush_latency_polls);
    let modal_visible = Rc::new(Cell::new(false));
    let mut modal = DemoModal {
        visible: Rc::clone(&modal_visible),
        banner_height: 64,
    };
    let mut app = DemoApp::new(APP_SIZE);

    let mut kernel = KernelLoop::new(compositor, &mut driver, &mut modal, &mut app);

    let interval = config.timing.frame_interval_ms;
    let duration = config.timing.transition_duration_ms;
    for cycle in 0..SIM_CYCLES {
        let now_ms = cycle * interval;
        match cycle {
            5 => {
                info!("pushing modal with slide-in transition");
                modal_visible.set(true);
                kernel
                    .transition(
                        now_ms,
                        Some(Box::new(SlideTransition::slide_in(Edge::Bottom, duration))),
                    )
                    .context("modal push transition failed")?;
            }
            30 => {
                info!("freezing compositor");
                kernel.freeze();
            }
            33 => {
                info!("unfreezing compositor");
                kernel.unfreeze();
            }
            40 => {
                info!("popping modal with slide-out transition");
                modal_visible.set(false);
                kernel
                    .transition(
                        now_ms,
                        Some(Box::new(SlideTransition::slide_out(Edge::Bottom, duration))),
                    )
                    .context("modal pop transition failed")?;
            }
            _ => {}
        }
        kernel
            .run_cycle(now_ms)
            .with_context(|| format!("kernel cycle {} failed", cycle))?;
    }

    if kernel.is_animating() {
        warn!("simulation ended with a transition still in flight");
    }
    info!("final compositor state: {:?}", kernel.compositor().state());
    drop(kernel);
    info!("frames flushed to the panel: {}", driver.frames_completed());
    Ok(())
}
