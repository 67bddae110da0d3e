// src/graphics.rs

//! `GraphicsContext`: a borrowed framebuffer plus a drawing origin.
//!
//! Modal content is rendered through this type so the compositor can apply
//! the transition's `modal_offset` translation without the modal code
//! knowing about it. `with_origin` scopes a translation and restores the
//! prior draw state on exit, so nested rendering cannot corrupt the global
//! drawing origin.

use crate::color::Color;
use crate::framebuffer::FrameBuffer;
use crate::geometry::{Point, Rect, Size};

pub struct GraphicsContext<'a> {
    fb: &'a mut FrameBuffer,
    origin: Point,
}

impl<'a> GraphicsContext<'a> {
    pub fn new(fb: &'a mut FrameBuffer) -> Self {
        GraphicsContext {
            fb,
            origin: Point::zero(),
        }
    }

    pub fn size(&self) -> Size {
        self.fb.size()
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Runs `f` with the origin translated by `offset`, restoring the prior
    /// origin afterwards even if `f` draws nothing.
    pub fn with_origin<R>(&mut self, offset: Point, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.origin;
        self.origin = saved.offset(offset);
        let result = f(self);
        self.origin = saved;
        result
    }

    /// Fills `rect` (in context coordinates) with `color`, clipped to the
    /// framebuffer bounds.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let screen = Rect {
            origin: rect.origin.offset(self.origin),
            size: rect.size,
        };
        let clipped = screen.intersection(&Rect::from_size(self.fb.size()));
        if clipped.is_empty() {
            return;
        }
        let x0 = clipped.origin.x as u32;
        let x1 = clipped.right() as u32;
        for y in clipped.origin.y as u32..clipped.bottom() as u32 {
            self.fb.row_mut(y)[x0 as usize..x1 as usize].fill(color);
        }
        self.fb.mark_dirty(clipped);
    }

    /// Copies `src` into the framebuffer with its top-left corner at `at`
    /// (in context coordinates), clipped to the framebuffer bounds.
    pub fn blit(&mut self, src: &FrameBuffer, at: Point) {
        let dst_origin = at.offset(self.origin);
        let dst_rect = Rect {
            origin: dst_origin,
            size: src.size(),
        };
        let clipped = dst_rect.intersection(&Rect::from_size(self.fb.size()));
        if clipped.is_empty() {
            return;
        }
        let src_x = (clipped.origin.x - dst_origin.x) as u32;
        let src_y = (clipped.origin.y - dst_origin.y) as u32;
        let x0 = clipped.origin.x as usize;
        let width = clipped.size.width as usize;
        for row in 0..clipped.size.height {
            let src_row = src.row(src_y + row);
            let dst_row = self.fb.row_mut(clipped.origin.y as u32 + row);
            dst_row[x0..x0 + width]
                .copy_from_slice(&src_row[src_x as usize..src_x as usize + width]);
        }
        self.fb.mark_dirty(clipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    #[test]
    fn with_origin_restores_prior_state() {
        let mut fb = FrameBuffer::new(Size::new(10, 10));
        let mut ctx = GraphicsContext::new(&mut fb);
        ctx.with_origin(Point::new(3, 4), |ctx| {
            assert_eq!(ctx.origin(), Point::new(3, 4));
            ctx.with_origin(Point::new(1, 1), |ctx| {
                assert_eq!(ctx.origin(), Point::new(4, 5));
            });
            assert_eq!(ctx.origin(), Point::new(3, 4));
        });
        assert_eq!(ctx.origin(), Point::zero());
    }

    #[test]
    fn fill_rect_applies_translation_and_clips() {
        let mut fb = FrameBuffer::new(Size::new(8, 8));
        fb.clear(Color::CLEAR);
        fb.take_dirty();
        let mut ctx = GraphicsContext::new(&mut fb);
        ctx.with_origin(Point::new(6, 6), |ctx| {
            ctx.fill_rect(Rect::new(0, 0, 4, 4), Color::WHITE);
        });
        assert_eq!(fb.pixel(6, 6), Some(Color::WHITE));
        assert_eq!(fb.pixel(7, 7), Some(Color::WHITE));
        assert_eq!(fb.pixel(5, 5), Some(Color::CLEAR));
        assert!(fb.is_dirty());
    }

    #[test]
    fn blit_clips_negative_offsets() {
        let mut src = FrameBuffer::new(Size::new(4, 4));
        src.clear(Color::WHITE);
        let mut fb = FrameBuffer::new(Size::new(8, 8));
        fb.clear(Color::CLEAR);
        let mut ctx = GraphicsContext::new(&mut fb);
        ctx.blit(&src, Point::new(-2, -2));
        assert_eq!(fb.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(fb.pixel(1, 1), Some(Color::WHITE));
        assert_eq!(fb.pixel(2, 2), Some(Color::CLEAR));
    }
}
