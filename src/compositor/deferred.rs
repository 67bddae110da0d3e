// src/compositor/deferred.rs

//! The deferred-render record: work that arrived while the hardware was
//! busy (or the compositor frozen), replayed exactly once when the flush
//! completes.
//!
//! Four independent slots, one per kind of work. A newly arriving event of
//! a kind overwrites the previous one (last-write-wins, never a queue).
//! Setting `transition_complete` clears the other slots and blocks them
//! while it is pending: finishing a transition outranks everything that
//! transition would otherwise do next.
//!
//! Drain order is fixed: `transition_complete`, `animation`, `app`,
//! `transition_start`. Each slot is cleared *before* its handler runs so a
//! handler may re-arm its own slot without losing the new entry.

use log::trace;

use super::transition::CompositorTransition;

/// One unit of replayable work, in priority order.
pub(crate) enum DeferredWork {
    TransitionComplete,
    /// Replays the exact progress value that was most recently overwritten.
    Animation(f32),
    App,
    /// A full deferred `transition(..)` request, including `None`.
    TransitionStart(Option<Box<dyn CompositorTransition>>),
}

#[derive(Default)]
pub(crate) struct DeferredRender {
    transition_complete: bool,
    animation: Option<f32>,
    app: bool,
    transition_start: Option<Option<Box<dyn CompositorTransition>>>,
}

impl DeferredRender {
    pub(crate) fn set_transition_complete(&mut self) {
        self.transition_complete = true;
        self.animation = None;
        self.app = false;
        self.transition_start = None;
    }

    pub(crate) fn set_animation(&mut self, progress: f32) {
        if self.transition_complete {
            trace!("deferred animation frame suppressed by pending completion");
            return;
        }
        self.animation = Some(progress);
    }

    pub(crate) fn set_app(&mut self) {
        if self.transition_complete {
            trace!("deferred app frame suppressed by pending completion");
            return;
        }
        self.app = true;
    }

    pub(crate) fn set_transition_start(
        &mut self,
        transition: Option<Box<dyn CompositorTransition>>,
    ) {
        if self.transition_complete {
            trace!("deferred transition start suppressed by pending completion");
            return;
        }
        self.transition_start = Some(transition);
    }

    /// Drops any record tied to the active transition. Used when that
    /// transition is superseded, so no stale completion or frame replays
    /// against its successor.
    pub(crate) fn clear_transition_slots(&mut self) {
        self.transition_complete = false;
        self.animation = None;
    }

    pub(crate) fn is_empty(&self) -> bool {
        !self.transition_complete
            && self.animation.is_none()
            && !self.app
            && self.transition_start.is_none()
    }

    /// Removes and returns the highest-priority pending slot.
    pub(crate) fn take_next(&mut self) -> Option<DeferredWork> {
        if self.transition_complete {
            self.transition_complete = false;
            return Some(DeferredWork::TransitionComplete);
        }
        if let Some(progress) = self.animation.take() {
            return Some(DeferredWork::Animation(progress));
        }
        if self.app {
            self.app = false;
            return Some(DeferredWork::App);
        }
        if let Some(transition) = self.transition_start.take() {
            return Some(DeferredWork::TransitionStart(transition));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_priority_order() {
        let mut deferred = DeferredRender::default();
        deferred.set_transition_start(None);
        deferred.set_app();
        deferred.set_animation(0.25);
        // transition_complete armed last but drains first; it also clears
        // the lower-priority slots armed above.
        deferred.set_transition_complete();

        assert!(matches!(
            deferred.take_next(),
            Some(DeferredWork::TransitionComplete)
        ));
        assert!(deferred.take_next().is_none());
    }

    #[test]
    fn animation_slot_is_last_write_wins() {
        let mut deferred = DeferredRender::default();
        deferred.set_animation(0.25);
        deferred.set_animation(0.75);
        match deferred.take_next() {
            Some(DeferredWork::Animation(p)) => assert_eq!(p, 0.75),
            _ => panic!("expected the overwritten animation progress"),
        }
    }

    #[test]
    fn pending_completion_blocks_other_slots() {
        let mut deferred = DeferredRender::default();
        deferred.set_transition_complete();
        deferred.set_animation(0.5);
        deferred.set_app();
        deferred.set_transition_start(None);

        assert!(matches!(
            deferred.take_next(),
            Some(DeferredWork::TransitionComplete)
        ));
        assert!(deferred.is_empty());
    }

    #[test]
    fn lower_slots_drain_in_order_without_completion() {
        let mut deferred = DeferredRender::default();
        deferred.set_transition_start(None);
        deferred.set_app();
        deferred.set_animation(0.5);

        assert!(matches!(deferred.take_next(), Some(DeferredWork::Animation(_))));
        assert!(matches!(deferred.take_next(), Some(DeferredWork::App)));
        assert!(matches!(
            deferred.take_next(),
            Some(DeferredWork::TransitionStart(None))
        ));
        assert!(deferred.take_next().is_none());
    }

    #[test]
    fn clear_transition_slots_leaves_app_and_start() {
        let mut deferred = DeferredRender::default();
        deferred.set_animation(0.5);
        deferred.set_app();
        deferred.clear_transition_slots();

        assert!(matches!(deferred.take_next(), Some(DeferredWork::App)));
        assert!(deferred.take_next().is_none());
    }
}
