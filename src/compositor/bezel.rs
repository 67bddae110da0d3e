// src/compositor/bezel.rs

//! Bezel/border compositing: a legacy app framebuffer smaller than the
//! physical display is drawn centered, surrounded by black, with a fixed
//! per-row corner table faking rounded corners on the first and last six
//! rows of the app image.
//!
//! When the sizes match exactly this degenerates to a single bulk copy and
//! none of the per-row corner logic runs.

use crate::color::Color;
use crate::framebuffer::FrameBuffer;

/// Leading/trailing app pixels replaced by black on the first six rows of
/// the app image; mirrored on the last six rows.
const CORNER_WIDTHS: [u32; 6] = [6, 4, 3, 2, 1, 1];

/// Corner width for `row` of an app image `height` rows tall; zero outside
/// the first/last six rows.
pub(crate) fn corner_width_for_row(row: u32, height: u32) -> u32 {
    if row < CORNER_WIDTHS.len() as u32 {
        CORNER_WIDTHS[row as usize]
    } else if row >= height.saturating_sub(CORNER_WIDTHS.len() as u32) {
        CORNER_WIDTHS[(height - 1 - row) as usize]
    } else {
        0
    }
}

/// Composites `src` into `dst`.
///
/// Equal sizes take the bulk-copy fast path. Otherwise `src` is centered
/// with equal black bezels on each side, shifted down by `peek_offset`
/// rows (clamped to the top bezel height) to make room for a system peek
/// overlay above the app image.
pub(crate) fn composite(dst: &mut FrameBuffer, src: &FrameBuffer, peek_offset: u32) {
    let disp = dst.size();
    let app = src.size();

    if disp == app {
        dst.blit_from(src);
        return;
    }

    assert!(
        app.width < disp.width && app.height < disp.height,
        "bezel mode requires the app framebuffer to be smaller than the display in both dimensions"
    );
    let bezel_width = (disp.width - app.width) / 2;
    let bezel_height = (disp.height - app.height) / 2;
    assert!(
        bezel_width > 0 && bezel_height > 0,
        "bezel mode requires a positive bezel on every side"
    );
    let peek = peek_offset.min(bezel_height);
    let top = bezel_height + peek;

    for y in 0..disp.height {
        if y < top || y >= top + app.height {
            dst.row_mut(y).fill(Color::BLACK);
            continue;
        }
        let app_row = y - top;
        let corner = corner_width_for_row(app_row, app.height) as usize;
        let left = bezel_width as usize;
        let width = app.width as usize;

        let dst_row = dst.row_mut(y);
        dst_row[..left + corner].fill(Color::BLACK);
        dst_row[left + corner..left + width - corner]
            .copy_from_slice(&src.row(app_row)[corner..width - corner]);
        dst_row[left + width - corner..].fill(Color::BLACK);
    }
    dst.mark_dirty_all();
}
