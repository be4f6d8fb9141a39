//! Motion lifecycle coordination.
//!
//! [`MotionCoordinator`] decides for every registered module whether its
//! animations run, from three signals: viewport intersection, document
//! visibility and the reduced-motion preference. It owns every
//! [`MotionHandle`] and observer, and guarantees they are released on
//! [`MotionCoordinator::cleanup_module`] or [`MotionCoordinator::cleanup`].

mod coordinator;
mod handle;
mod scope;
mod signals;

pub use coordinator::{
    MotionCoordinator, ResizeFn, MODULE_ATTRIBUTE, PAUSED_CLASS,
};
pub use handle::{FrameLoop, HandleKind, MotionHandle, UpdateFn};
pub use scope::CancellationScope;
pub use signals::PlaySignals;
