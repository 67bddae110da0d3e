// src/animation.rs

//! The generic animation scheduler consumed by the transition engine.
//!
//! Animations are opaque handles: the owner creates one with a duration and
//! a curve, schedules it, and the kernel loop calls `tick` once per cycle.
//! `tick` emits `AnimationEvent`s which the loop routes back to the owner,
//! so the per-frame `update` and the final teardown run on the kernel
//! task's own turn rather than inside the scheduler.
//!
//! Progress is a curved `f32` in `0.0..=1.0`. A completed animation emits a
//! final `Frame` at progress 1.0 followed by a `Complete` event in the same
//! tick, then unschedules itself; the slot stays allocated until the owner
//! calls `destroy`.

use log::{trace, warn};

/// Opaque identifier of one animation slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle(u32);

/// Easing curve applied to linear elapsed time at tick time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Curve {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Curve {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Curve::Linear => t,
            Curve::EaseIn => t * t,
            Curve::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Curve::EaseInOut => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Emitted by `tick`; routed by the kernel loop to the animation's owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationEvent {
    Frame { handle: AnimationHandle, progress: f32 },
    Complete { handle: AnimationHandle },
}

struct Slot {
    handle: AnimationHandle,
    duration_ms: u64,
    curve: Curve,
    /// Tick timestamp at which the animation was scheduled, if running.
    started_at_ms: Option<u64>,
}

/// Kernel-hosted scheduler for all live animations.
#[derive(Default)]
pub struct AnimationScheduler {
    slots: Vec<Slot>,
    next_id: u32,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        AnimationScheduler::default()
    }

    /// Allocates an unscheduled animation slot.
    pub fn create(&mut self, duration_ms: u64, curve: Curve) -> AnimationHandle {
        let handle = AnimationHandle(self.next_id);
        self.next_id += 1;
        self.slots.push(Slot {
            handle,
            duration_ms,
            curve,
            started_at_ms: None,
        });
        trace!("animation {:?} created ({} ms, {:?})", handle, duration_ms, curve);
        handle
    }

    /// Frees the slot. Destroying an unknown handle is a no-op.
    pub fn destroy(&mut self, handle: AnimationHandle) {
        let before = self.slots.len();
        self.slots.retain(|s| s.handle != handle);
        if self.slots.len() == before {
            warn!("destroy of unknown animation {:?}", handle);
        }
    }

    /// Starts (or restarts) the animation at `now_ms`.
    pub fn schedule(&mut self, handle: AnimationHandle, now_ms: u64) {
        match self.slot_mut(handle) {
            Some(slot) => {
                slot.started_at_ms = Some(now_ms);
                trace!("animation {:?} scheduled at {} ms", handle, now_ms);
            }
            None => warn!("schedule of unknown animation {:?}", handle),
        }
    }

    /// Stops the animation without freeing its slot. No completion event
    /// will fire for an unscheduled animation.
    pub fn unschedule(&mut self, handle: AnimationHandle) {
        if let Some(slot) = self.slot_mut(handle) {
            slot.started_at_ms = None;
        }
    }

    pub fn is_scheduled(&self, handle: AnimationHandle) -> bool {
        self.slots
            .iter()
            .any(|s| s.handle == handle && s.started_at_ms.is_some())
    }

    /// Advances every scheduled animation to `now_ms`, emitting a `Frame`
    /// per animation and a trailing `Complete` for those that finished.
    pub fn tick(&mut self, now_ms: u64) -> Vec<AnimationEvent> {
        let mut events = Vec::new();
        for slot in &mut self.slots {
            let Some(started) = slot.started_at_ms else {
                continue;
            };
            let raw = if slot.duration_ms == 0 {
                1.0
            } else {
                let elapsed = now_ms.saturating_sub(started);
                (elapsed as f32 / slot.duration_ms as f32).min(1.0)
            };
            events.push(AnimationEvent::Frame {
                handle: slot.handle,
                progress: slot.curve.apply(raw),
            });
            if raw >= 1.0 {
                slot.started_at_ms = None;
                events.push(AnimationEvent::Complete {
                    handle: slot.handle,
                });
            }
        }
        events
    }

    fn slot_mut(&mut self, handle: AnimationHandle) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.handle == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_progress_follows_elapsed_time() {
        let mut sched = AnimationScheduler::new();
        let h = sched.create(100, Curve::Linear);
        sched.schedule(h, 1000);

        let events = sched.tick(1050);
        assert_eq!(
            events,
            vec![AnimationEvent::Frame {
                handle: h,
                progress: 0.5
            }]
        );
    }

    #[test]
    fn completion_emits_final_frame_then_complete() {
        let mut sched = AnimationScheduler::new();
        let h = sched.create(100, Curve::Linear);
        sched.schedule(h, 0);

        let events = sched.tick(150);
        assert_eq!(
            events,
            vec![
                AnimationEvent::Frame {
                    handle: h,
                    progress: 1.0
                },
                AnimationEvent::Complete { handle: h },
            ]
        );
        assert!(!sched.is_scheduled(h));
        // No further events without a reschedule.
        assert!(sched.tick(200).is_empty());
    }

    #[test]
    fn zero_duration_completes_on_first_tick() {
        let mut sched = AnimationScheduler::new();
        let h = sched.create(0, Curve::EaseInOut);
        sched.schedule(h, 10);
        let events = sched.tick(10);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            AnimationEvent::Frame {
                handle: h,
                progress: 1.0
            }
        );
    }

    #[test]
    fn unschedule_suppresses_completion() {
        let mut sched = AnimationScheduler::new();
        let h = sched.create(100, Curve::Linear);
        sched.schedule(h, 0);
        sched.unschedule(h);
        assert!(!sched.is_scheduled(h));
        assert!(sched.tick(500).is_empty());
    }

    #[test]
    fn curves_are_monotonic_and_bounded() {
        for curve in [Curve::Linear, Curve::EaseIn, Curve::EaseOut, Curve::EaseInOut] {
            let mut prev = 0.0f32;
            for i in 0..=10 {
                let v = curve.apply(i as f32 / 10.0);
                assert!((0.0..=1.0).contains(&v), "{:?} out of range", curve);
                assert!(v >= prev, "{:?} not monotonic", curve);
                prev = v;
            }
            assert_eq!(curve.apply(1.0), 1.0);
        }
    }
}
