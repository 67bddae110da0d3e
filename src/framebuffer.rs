// src/framebuffer.rs

//! Fixed-size pixel buffer with a bounding-rectangle dirty tracker.
//!
//! Two instances exist at runtime: the hardware-facing buffer owned by the
//! `Compositor` for its whole lifetime, and the application buffer owned by
//! the foreground app's task. The application buffer's size may be smaller
//! than the hardware buffer (bezel mode) but never larger.
//!
//! Dirty tracking is deliberately coarse: a single bounding rectangle,
//! grown by `mark_dirty` and consumed by `take_dirty` when the buffer is
//! handed to the display driver.

use crate::color::Color;
use crate::geometry::{Rect, Size};

pub struct FrameBuffer {
    size: Size,
    pixels: Box<[Color]>,
    dirty: Rect,
}

impl FrameBuffer {
    /// Allocates a buffer of `size` filled with `Color::CLEAR`, marked fully
    /// dirty so the first flush pushes the whole frame.
    pub fn new(size: Size) -> Self {
        assert!(size.area() > 0, "framebuffer must have a non-zero size");
        FrameBuffer {
            size,
            pixels: vec![Color::CLEAR; size.area()].into_boxed_slice(),
            dirty: Rect::from_size(size),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Fills the whole buffer with `color` and marks it fully dirty.
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
        self.mark_dirty_all();
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    /// Writes a single pixel; out-of-bounds writes are dropped. The caller
    /// is responsible for dirty marking (bulk operations mark for you).
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.size.width || y >= self.size.height {
            return;
        }
        let idx = self.index(x, y);
        self.pixels[idx] = color;
    }

    pub fn row(&self, y: u32) -> &[Color] {
        let start = y as usize * self.size.width as usize;
        &self.pixels[start..start + self.size.width as usize]
    }

    /// Mutable access to one row. Callers performing bulk writes mark the
    /// affected region dirty themselves.
    pub fn row_mut(&mut self, y: u32) -> &mut [Color] {
        let start = y as usize * self.size.width as usize;
        let width = self.size.width as usize;
        &mut self.pixels[start..start + width]
    }

    /// Whole-buffer copy from an identically sized source: the full-size
    /// fast path of `render_app`. A single bulk copy, no per-row logic.
    pub fn blit_from(&mut self, src: &FrameBuffer) {
        assert_eq!(
            self.size, src.size,
            "blit_from requires identically sized buffers"
        );
        self.pixels.copy_from_slice(&src.pixels);
        self.mark_dirty_all();
    }

    pub fn mark_dirty(&mut self, rect: Rect) {
        let clipped = rect.intersection(&Rect::from_size(self.size));
        self.dirty = self.dirty.union(&clipped);
    }

    pub fn mark_dirty_all(&mut self) {
        self.dirty = Rect::from_size(self.size);
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Returns the accumulated dirty region and resets the tracker.
    pub fn take_dirty(&mut self) -> Rect {
        std::mem::take(&mut self.dirty)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.size.width as usize + x as usize
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("size", &self.size)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_fully_dirty() {
        let fb = FrameBuffer::new(Size::new(4, 4));
        assert!(fb.is_dirty());
    }

    #[test]
    fn take_dirty_resets_tracker() {
        let mut fb = FrameBuffer::new(Size::new(4, 4));
        assert_eq!(fb.take_dirty(), Rect::new(0, 0, 4, 4));
        assert!(!fb.is_dirty());
    }

    #[test]
    fn mark_dirty_unions_and_clips() {
        let mut fb = FrameBuffer::new(Size::new(10, 10));
        fb.take_dirty();
        fb.mark_dirty(Rect::new(1, 1, 2, 2));
        fb.mark_dirty(Rect::new(5, 5, 20, 20));
        assert_eq!(fb.take_dirty(), Rect::new(1, 1, 9, 9));
    }

    #[test]
    fn blit_from_copies_every_pixel() {
        let size = Size::new(8, 8);
        let mut src = FrameBuffer::new(size);
        src.clear(Color::WHITE);
        src.set_pixel(3, 2, Color::BLACK);

        let mut dst = FrameBuffer::new(size);
        dst.take_dirty();
        dst.blit_from(&src);

        assert_eq!(dst.pixels(), src.pixels());
        assert!(dst.is_dirty());
    }

    #[test]
    fn out_of_bounds_pixel_access_is_dropped() {
        let mut fb = FrameBuffer::new(Size::new(4, 4));
        fb.set_pixel(10, 10, Color::WHITE);
        assert_eq!(fb.pixel(10, 10), None);
        assert_eq!(fb.pixel(0, 0), Some(Color::CLEAR));
    }
}
