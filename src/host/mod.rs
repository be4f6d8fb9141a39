//! Environment seam between the gallery and whatever renders it.
//!
//! The coordinator, preference store and gallery never talk to a browser
//! directly. They see elements through the [`Element`] trait and reach
//! observers, declarative animations and global listeners through
//! [`MotionHost`] / [`PreferenceHost`]. Notifications flow back the other
//! way as [`HostEvent`] values that the owner routes into
//! [`MotionCoordinator::dispatch`](crate::motion::MotionCoordinator::dispatch)
//! or [`App::dispatch`](crate::app::App::dispatch).
//!
//! Two hosts ship with the crate: [`headless`] (in-memory, used by tests
//! and the demo binary) and `web` (feature `web`, backed by `web-sys`).

pub mod headless;
#[cfg(feature = "web")]
pub mod web;

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Shared reference to a host element.
pub type ElementRef = Rc<dyn Element>;

/// Whether two element references point at the same underlying element.
#[must_use]
pub fn same_element(a: &ElementRef, b: &ElementRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Layout size of an element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Size {
    /// Construct a size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A node in the host's document tree.
///
/// Methods take `&self`: elements are shared handles onto host-owned nodes
/// and mutate through interior mutability, as DOM nodes do.
pub trait Element: fmt::Debug {
    /// Set an attribute value.
    fn set_attribute(&self, name: &str, value: &str);

    /// Read an attribute value.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Add (`on = true`) or remove a class. Whitespace-separated lists
    /// apply each class individually.
    fn set_class(&self, class: &str, on: bool);

    /// Whether the element carries `class`.
    fn has_class(&self, class: &str) -> bool;

    /// Set an inline style property.
    fn set_style(&self, property: &str, value: &str);

    /// Replace the element's content with markup.
    fn set_content(&self, markup: &str);

    /// Append a child element.
    fn append_child(&self, child: &ElementRef);

    /// Remove all children and content.
    fn clear_children(&self);

    /// First descendant whose attribute `name` equals `value`.
    fn query_attribute(&self, name: &str, value: &str) -> Option<ElementRef>;

    /// Current layout size.
    fn size(&self) -> Size;

    /// Whether `other` refers to the same underlying node. Hosts may hand
    /// out several references to one node.
    fn is_same(&self, other: &ElementRef) -> bool;

    /// Downcasting support for host implementations.
    fn as_any(&self) -> &dyn Any;
}

/// A live registration with the host (observer, listener) that can be
/// detached.
pub trait Subscription {
    /// Detach the registration. Calling twice is harmless.
    fn disconnect(&mut self);
}

/// A declarative keyframe animation running on a host element.
pub trait KeyframeAnimation {
    /// Resume (or start) playback.
    fn play(&mut self);
    /// Pause playback, keeping the current position.
    fn pause(&mut self);
    /// Stop playback and drop all effects. Permanent.
    fn cancel(&mut self);
}

/// One keyframe: CSS property → value.
pub type Keyframe = BTreeMap<String, String>;

/// Ordered list of keyframes for a declarative animation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keyframes(pub Vec<Keyframe>);

impl Keyframes {
    /// Two-frame animation of a single property.
    #[must_use]
    pub fn between(property: &str, from: &str, to: &str) -> Self {
        let frame = |value: &str| {
            Keyframe::from([(property.to_owned(), value.to_owned())])
        };
        Self(vec![frame(from), frame(to)])
    }

    /// Number of keyframes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no keyframes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Timing for a declarative animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationOptions {
    /// Duration of one iteration in milliseconds.
    pub duration_ms: f64,
    /// CSS easing function.
    pub easing: String,
    /// Start delay in milliseconds.
    pub delay_ms: f64,
    /// Iteration count; `None` repeats forever.
    pub iterations: Option<f64>,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            duration_ms: 1000.0,
            easing: "linear".to_owned(),
            delay_ms: 0.0,
            iterations: Some(1.0),
        }
    }
}

/// Media queries the gallery reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaQuery {
    /// `(prefers-color-scheme: dark)`
    PrefersDarkScheme,
    /// `(prefers-reduced-motion: reduce)`
    PrefersReducedMotion,
}

impl MediaQuery {
    /// CSS media query text.
    #[must_use]
    pub fn query(self) -> &'static str {
        match self {
            Self::PrefersDarkScheme => "(prefers-color-scheme: dark)",
            Self::PrefersReducedMotion => "(prefers-reduced-motion: reduce)",
        }
    }
}

/// Global (document/window level) notifications a component can listen
/// for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalEvent {
    /// Document visibility toggled.
    VisibilityChange,
    /// The reduced-motion media query changed.
    ReducedMotionChange,
    /// The color-scheme media query changed.
    ColorSchemeChange,
    /// The page is being hidden for navigation.
    PageHide,
    /// The page is about to unload.
    BeforeUnload,
}

/// A notification delivered by the host.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// An observed container entered or left the viewport.
    Intersection {
        /// The observed element.
        element: ElementRef,
        /// Whether it now intersects the viewport.
        intersecting: bool,
    },
    /// A size-observed element changed size.
    Resize {
        /// Module whose observation fired.
        module_id: String,
        /// New content size.
        size: Size,
    },
    /// Document visibility changed.
    VisibilityChange {
        /// Whether the document is now hidden.
        hidden: bool,
    },
    /// Reduced-motion media query changed.
    ReducedMotionChange {
        /// Whether reduced motion is now requested.
        matches: bool,
    },
    /// Color-scheme media query changed.
    ColorSchemeChange {
        /// Whether a dark scheme is now preferred.
        dark: bool,
    },
    /// Page teardown (`pagehide` or `beforeunload`).
    PageHide,
}

/// Services the motion coordinator and gallery need from the host.
pub trait MotionHost {
    /// Create a detached element.
    fn create_element(&self, tag: &str) -> ElementRef;

    /// Whether the document is currently hidden.
    fn document_hidden(&self) -> bool;

    /// Whether the platform currently requests reduced motion.
    fn prefers_reduced_motion(&self) -> bool;

    /// Start viewport-intersection observation of an element. The host
    /// later delivers [`HostEvent::Intersection`] for it.
    fn observe_intersection(&self, element: &ElementRef);

    /// Stop viewport-intersection observation of an element.
    fn unobserve_intersection(&self, element: &ElementRef);

    /// Stop all viewport-intersection observation.
    fn disconnect_intersection(&self);

    /// Start size observation of an element on behalf of a module. The host
    /// delivers [`HostEvent::Resize`] for subsequent size changes only.
    fn observe_resize(
        &self,
        element: &ElementRef,
        module_id: &str,
    ) -> Box<dyn Subscription>;

    /// Start a declarative keyframe animation on an element.
    fn animate(
        &self,
        element: &ElementRef,
        keyframes: &Keyframes,
        options: &AnimationOptions,
    ) -> Box<dyn KeyframeAnimation>;

    /// Start forwarding a global event as [`HostEvent`]s.
    fn listen(&self, event: GlobalEvent) -> Box<dyn Subscription>;
}

/// Services the preference store needs from the host.
pub trait PreferenceHost {
    /// Current value of a media query.
    fn media_matches(&self, query: MediaQuery) -> bool;

    /// Start forwarding changes of a media query as [`HostEvent`]s.
    fn listen_media(&self, query: MediaQuery) -> Box<dyn Subscription>;

    /// Add or remove a class on the document root element.
    fn set_root_class(&self, class: &str, on: bool);
}
