//! Controllable animation units.
//!
//! A [`MotionHandle`] wraps either a per-frame update loop ([`FrameLoop`])
//! or a declarative keyframe animation started by the host. Handles are
//! cheap to clone: the coordinator keeps one clone per registration and the
//! creator gets another, both pointing at the same state.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::host::{ElementRef, KeyframeAnimation};

/// Per-frame update callback of a loop handle.
pub type UpdateFn = Box<dyn FnMut()>;

/// Which kind of animation a handle controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    /// A recurring per-frame update function.
    FrameLoop,
    /// A declarative, infinitely repeating keyframe animation.
    Declarative,
}

/// Scheduling state of a per-frame loop.
///
/// `scheduled` is the loop's frame request: while it is set, every
/// coordinator tick runs the update function once. The update function is
/// dropped on cancel so captured resources are released with the handle.
pub struct FrameLoop {
    update: Option<UpdateFn>,
    scheduled: bool,
}

impl FrameLoop {
    fn new(update: UpdateFn) -> Self {
        Self {
            update: Some(update),
            scheduled: false,
        }
    }
}

enum Motion {
    Loop(FrameLoop),
    Declarative {
        animation: Box<dyn KeyframeAnimation>,
        element: ElementRef,
        running: bool,
    },
}

struct HandleState {
    motion: Motion,
    cancelled: bool,
}

/// One controllable animation unit.
#[derive(Clone)]
pub struct MotionHandle {
    state: Rc<RefCell<HandleState>>,
    reduced_motion: Rc<Cell<bool>>,
}

impl MotionHandle {
    /// Loop handle, initially not scheduled.
    pub(crate) fn frame_loop(
        update: UpdateFn,
        reduced_motion: Rc<Cell<bool>>,
    ) -> Self {
        Self::with_motion(Motion::Loop(FrameLoop::new(update)), reduced_motion)
    }

    /// Declarative handle around an animation the host already started.
    /// Paused right away when reduced motion is active.
    pub(crate) fn declarative(
        mut animation: Box<dyn KeyframeAnimation>,
        element: ElementRef,
        reduced_motion: Rc<Cell<bool>>,
    ) -> Self {
        let running = !reduced_motion.get();
        if !running {
            animation.pause();
        }
        Self::with_motion(
            Motion::Declarative {
                animation,
                element,
                running,
            },
            reduced_motion,
        )
    }

    fn with_motion(motion: Motion, reduced_motion: Rc<Cell<bool>>) -> Self {
        Self {
            state: Rc::new(RefCell::new(HandleState {
                motion,
                cancelled: false,
            })),
            reduced_motion,
        }
    }

    /// Start or resume the animation. No-op while reduced motion is active
    /// and forever after [`cancel`](Self::cancel).
    pub fn play(&self) {
        if self.reduced_motion.get() {
            return;
        }
        let mut state = self.state.borrow_mut();
        if state.cancelled {
            return;
        }
        match &mut state.motion {
            Motion::Loop(frame_loop) => frame_loop.scheduled = true,
            Motion::Declarative {
                animation, running, ..
            } => {
                animation.play();
                *running = true;
            }
        }
    }

    /// Stop the animation in place.
    pub fn pause(&self) {
        let mut state = self.state.borrow_mut();
        if state.cancelled {
            return;
        }
        match &mut state.motion {
            Motion::Loop(frame_loop) => frame_loop.scheduled = false,
            Motion::Declarative {
                animation, running, ..
            } => {
                animation.pause();
                *running = false;
            }
        }
    }

    /// Stop the animation permanently and release its resources.
    pub fn cancel(&self) {
        let mut state = self.state.borrow_mut();
        if state.cancelled {
            return;
        }
        state.cancelled = true;
        match &mut state.motion {
            Motion::Loop(frame_loop) => {
                frame_loop.scheduled = false;
                frame_loop.update = None;
            }
            Motion::Declarative {
                animation, running, ..
            } => {
                animation.cancel();
                *running = false;
            }
        }
    }

    /// Whether the animation is currently scheduled / playing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        match &self.state.borrow().motion {
            Motion::Loop(frame_loop) => frame_loop.scheduled,
            Motion::Declarative { running, .. } => *running,
        }
    }

    /// Whether [`cancel`](Self::cancel) has run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().cancelled
    }

    /// Which kind of animation this handle controls.
    #[must_use]
    pub fn kind(&self) -> HandleKind {
        match self.state.borrow().motion {
            Motion::Loop(_) => HandleKind::FrameLoop,
            Motion::Declarative { .. } => HandleKind::Declarative,
        }
    }

    /// Animated element, for declarative handles.
    #[must_use]
    pub fn element(&self) -> Option<ElementRef> {
        match &self.state.borrow().motion {
            Motion::Loop(_) => None,
            Motion::Declarative { element, .. } => Some(Rc::clone(element)),
        }
    }

    /// Whether two handles share the same state.
    #[must_use]
    pub fn same_handle(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Run one frame of a scheduled loop. Returns whether the update ran.
    ///
    /// The update function is taken out of the state while it runs, so it
    /// may pause or cancel its own handle.
    pub(crate) fn run_frame(&self) -> bool {
        let update = {
            let mut state = self.state.borrow_mut();
            match &mut state.motion {
                Motion::Loop(frame_loop) if frame_loop.scheduled => {
                    frame_loop.update.take()
                }
                _ => None,
            }
        };
        let Some(mut update) = update else {
            return false;
        };
        update();

        let mut state = self.state.borrow_mut();
        if !state.cancelled {
            if let Motion::Loop(frame_loop) = &mut state.motion {
                frame_loop.update = Some(update);
            }
        }
        true
    }
}

impl fmt::Debug for MotionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionHandle")
            .field("kind", &self.kind())
            .field("running", &self.is_running())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_loop(reduced: bool) -> (MotionHandle, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let handle = MotionHandle::frame_loop(
            Box::new(move || counter.set(counter.get() + 1)),
            Rc::new(Cell::new(reduced)),
        );
        (handle, calls)
    }

    #[test]
    fn loop_runs_only_while_scheduled() {
        let (handle, calls) = counting_loop(false);
        assert!(!handle.run_frame());

        handle.play();
        assert!(handle.run_frame());
        assert!(handle.run_frame());
        handle.pause();
        assert!(!handle.run_frame());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn reduced_motion_blocks_play() {
        let (handle, calls) = counting_loop(true);
        handle.play();
        assert!(!handle.is_running());
        assert!(!handle.run_frame());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn cancelled_loop_never_plays_again() {
        let (handle, calls) = counting_loop(false);
        handle.play();
        handle.cancel();
        handle.play();
        assert!(handle.is_cancelled());
        assert!(!handle.is_running());
        assert!(!handle.run_frame());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn update_may_cancel_its_own_handle() {
        let slot: Rc<RefCell<Option<MotionHandle>>> = Rc::default();
        let inner = Rc::clone(&slot);
        let handle = MotionHandle::frame_loop(
            Box::new(move || {
                if let Some(h) = inner.borrow().as_ref() {
                    h.cancel();
                }
            }),
            Rc::new(Cell::new(false)),
        );
        *slot.borrow_mut() = Some(handle.clone());

        handle.play();
        assert!(handle.run_frame());
        assert!(handle.is_cancelled());
        assert!(!handle.run_frame());
        // Break the handle → closure → slot → handle cycle.
        let _ = slot.borrow_mut().take();
    }

    #[test]
    fn clones_share_state() {
        let (handle, _) = counting_loop(false);
        let other = handle.clone();
        other.play();
        assert!(handle.is_running());
        assert!(handle.same_handle(&other));
        assert_eq!(handle.kind(), HandleKind::FrameLoop);
        assert!(handle.element().is_none());
    }
}
