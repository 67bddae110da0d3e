// src/modal.rs

//! The modal manager seam: system-level overlay windows (notifications,
//! quick-launch, dialogs) rendered independently of the foreground app.
//!
//! The compositor never caches `ModalProperties` across calls; modal state
//! can change asynchronously to any single decision point, so it is
//! re-queried every time a decision depends on it.

use bitflags::bitflags;

use crate::graphics::GraphicsContext;

bitflags! {
    /// Snapshot of the modal stack, queried at every decision point.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ModalProperties: u8 {
        /// At least one modal window is on screen.
        const EXISTS      = 1 << 0;
        /// The topmost modal is transparent; the app shows through.
        const TRANSPARENT = 1 << 1;
        /// The modal takes input focus away from the app.
        const UNFOCUSED   = 1 << 2;
    }
}

impl ModalProperties {
    /// True when a modal exists and fully covers the app.
    pub fn opaque(self) -> bool {
        self.contains(ModalProperties::EXISTS) && !self.contains(ModalProperties::TRANSPARENT)
    }

    /// Whether the foreground app currently holds input focus.
    pub fn app_focused(self) -> bool {
        !self.contains(ModalProperties::UNFOCUSED)
    }
}

/// The modal window stack, owned by the kernel task.
pub trait ModalManager {
    fn properties(&self) -> ModalProperties;

    /// Renders the topmost modal content into `ctx`. The compositor has
    /// already applied any transition offset to the context origin.
    fn render(&mut self, ctx: &mut GraphicsContext<'_>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_requires_exists_without_transparent() {
        assert!(ModalProperties::EXISTS.opaque());
        assert!(!(ModalProperties::EXISTS | ModalProperties::TRANSPARENT).opaque());
        assert!(!ModalProperties::empty().opaque());
    }

    #[test]
    fn focus_follows_unfocused_bit() {
        assert!(ModalProperties::EXISTS.app_focused());
        assert!(!(ModalProperties::EXISTS | ModalProperties::UNFOCUSED).app_focused());
    }
}
