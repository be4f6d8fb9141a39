//! In-memory host used by tests and the demo binary.
//!
//! Elements are plain reference-counted nodes; observers, listeners and
//! animations only record what was asked of them so callers can inspect
//! the result. Markup handed to [`Element::set_content`] is not parsed:
//! `query_attribute` finds real children first and otherwise materializes
//! a stand-in node for any `name="value"` pair present in the markup.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use super::{
    same_element, AnimationOptions, Element, ElementRef, GlobalEvent,
    KeyframeAnimation, Keyframes, MediaQuery, MotionHost, PreferenceHost,
    Size, Subscription,
};

// ─────────────────────────────────────────────────────────────────────────────
// Elements
// ─────────────────────────────────────────────────────────────────────────────

/// An in-memory element.
#[derive(Debug, Default)]
pub struct HeadlessElement {
    tag: String,
    attributes: RefCell<BTreeMap<String, String>>,
    classes: RefCell<BTreeSet<String>>,
    styles: RefCell<BTreeMap<String, String>>,
    content: RefCell<String>,
    children: RefCell<Vec<ElementRef>>,
    stand_ins: RefCell<Vec<ElementRef>>,
    size: Cell<Size>,
}

impl HeadlessElement {
    /// Create a detached element.
    #[must_use]
    pub fn new(tag: &str) -> Rc<Self> {
        Rc::new(Self {
            tag: tag.to_owned(),
            ..Self::default()
        })
    }

    /// Tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Change the reported layout size. Does not emit a resize event.
    pub fn set_size(&self, size: Size) {
        self.size.set(size);
    }

    /// Inline style value.
    #[must_use]
    pub fn style(&self, property: &str) -> Option<String> {
        self.styles.borrow().get(property).cloned()
    }

    /// Markup last set through [`Element::set_content`].
    #[must_use]
    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }

    /// Direct children appended through [`Element::append_child`].
    #[must_use]
    pub fn children(&self) -> Vec<ElementRef> {
        self.children.borrow().clone()
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    fn stand_in(&self, name: &str, value: &str) -> Option<ElementRef> {
        let existing = self
            .stand_ins
            .borrow()
            .iter()
            .find(|el| el.attribute(name).as_deref() == Some(value))
            .cloned();
        if existing.is_some() {
            return existing;
        }
        let needle = format!("{name}=\"{value}\"");
        if !self.content.borrow().contains(&needle) {
            return None;
        }
        let node: ElementRef = Self::new("div");
        node.set_attribute(name, value);
        self.stand_ins.borrow_mut().push(Rc::clone(&node));
        Some(node)
    }
}

impl Element for HeadlessElement {
    fn set_attribute(&self, name: &str, value: &str) {
        let _ = self
            .attributes
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    fn set_class(&self, class: &str, on: bool) {
        let mut classes = self.classes.borrow_mut();
        for name in class.split_whitespace() {
            if on {
                let _ = classes.insert(name.to_owned());
            } else {
                let _ = classes.remove(name);
            }
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().contains(class)
    }

    fn set_style(&self, property: &str, value: &str) {
        let _ = self
            .styles
            .borrow_mut()
            .insert(property.to_owned(), value.to_owned());
    }

    fn set_content(&self, markup: &str) {
        markup.clone_into(&mut self.content.borrow_mut());
        self.children.borrow_mut().clear();
        self.stand_ins.borrow_mut().clear();
    }

    fn append_child(&self, child: &ElementRef) {
        self.children.borrow_mut().push(Rc::clone(child));
    }

    fn clear_children(&self) {
        self.set_content("");
    }

    fn query_attribute(&self, name: &str, value: &str) -> Option<ElementRef> {
        let children = self.children.borrow().clone();
        for child in &children {
            if child.attribute(name).as_deref() == Some(value) {
                return Some(Rc::clone(child));
            }
            if let Some(found) = child.query_attribute(name, value) {
                return Some(found);
            }
        }
        self.stand_in(name, value)
    }

    fn size(&self) -> Size {
        self.size.get()
    }

    fn is_same(&self, other: &ElementRef) -> bool {
        std::ptr::addr_eq(std::ptr::from_ref(self), Rc::as_ptr(other))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Animations and subscriptions
// ─────────────────────────────────────────────────────────────────────────────

/// Playback state of a recorded declarative animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    /// Actively playing.
    Running,
    /// Paused in place.
    Paused,
    /// Cancelled; never plays again.
    Cancelled,
}

/// Record of one declarative animation started on the headless host.
#[derive(Debug)]
pub struct AnimationRecord {
    /// Element the animation runs on.
    pub element: ElementRef,
    /// Keyframes it was started with.
    pub keyframes: Keyframes,
    /// Timing it was started with.
    pub options: AnimationOptions,
    state: Cell<PlayState>,
    play_calls: Cell<usize>,
    pause_calls: Cell<usize>,
}

impl AnimationRecord {
    /// Current playback state.
    #[must_use]
    pub fn state(&self) -> PlayState {
        self.state.get()
    }

    /// Number of `play` calls received.
    #[must_use]
    pub fn play_calls(&self) -> usize {
        self.play_calls.get()
    }

    /// Number of `pause` calls received.
    #[must_use]
    pub fn pause_calls(&self) -> usize {
        self.pause_calls.get()
    }
}

struct RecordedAnimation(Rc<AnimationRecord>);

impl KeyframeAnimation for RecordedAnimation {
    fn play(&mut self) {
        let record = &self.0;
        record.play_calls.set(record.play_calls.get() + 1);
        if record.state.get() != PlayState::Cancelled {
            record.state.set(PlayState::Running);
        }
    }

    fn pause(&mut self) {
        let record = &self.0;
        record.pause_calls.set(record.pause_calls.get() + 1);
        if record.state.get() != PlayState::Cancelled {
            record.state.set(PlayState::Paused);
        }
    }

    fn cancel(&mut self) {
        self.0.state.set(PlayState::Cancelled);
    }
}

/// What a headless subscription is registered for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerKey {
    /// A global event listener.
    Global(String),
    /// A media query change listener.
    Media(&'static str),
    /// A resize observation for a module.
    Resize(String),
}

type ActiveSet = Rc<RefCell<Vec<ListenerKey>>>;

struct HeadlessSubscription {
    key: Option<ListenerKey>,
    active: ActiveSet,
}

impl Subscription for HeadlessSubscription {
    fn disconnect(&mut self) {
        if let Some(key) = self.key.take() {
            let mut active = self.active.borrow_mut();
            if let Some(pos) = active.iter().position(|k| *k == key) {
                let _ = active.remove(pos);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Host
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory [`MotionHost`] + [`PreferenceHost`].
#[derive(Debug, Default)]
pub struct HeadlessHost {
    document_hidden: Cell<bool>,
    reduced_motion: Cell<bool>,
    dark_scheme: Cell<bool>,
    observed: RefCell<Vec<ElementRef>>,
    active: ActiveSet,
    animations: RefCell<Vec<Rc<AnimationRecord>>>,
    root_classes: RefCell<BTreeSet<String>>,
}

impl HeadlessHost {
    /// Create a host with every signal off.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Set the document-hidden flag reported to new components. Does not
    /// emit an event.
    pub fn set_document_hidden(&self, hidden: bool) {
        self.document_hidden.set(hidden);
    }

    /// Set the reduced-motion media value. Does not emit an event.
    pub fn set_reduced_motion(&self, reduced: bool) {
        self.reduced_motion.set(reduced);
    }

    /// Set the dark-scheme media value. Does not emit an event.
    pub fn set_dark_scheme(&self, dark: bool) {
        self.dark_scheme.set(dark);
    }

    /// Elements currently under intersection observation.
    #[must_use]
    pub fn observed_elements(&self) -> Vec<ElementRef> {
        self.observed.borrow().clone()
    }

    /// Whether an element is under intersection observation.
    #[must_use]
    pub fn is_observed(&self, element: &ElementRef) -> bool {
        self.observed
            .borrow()
            .iter()
            .any(|el| same_element(el, element))
    }

    /// Active listeners and resize observations.
    #[must_use]
    pub fn active_listeners(&self) -> Vec<ListenerKey> {
        self.active.borrow().clone()
    }

    /// Declarative animations started so far.
    #[must_use]
    pub fn animations(&self) -> Vec<Rc<AnimationRecord>> {
        self.animations.borrow().clone()
    }

    /// Whether the document root carries `class`.
    #[must_use]
    pub fn root_has_class(&self, class: &str) -> bool {
        self.root_classes.borrow().contains(class)
    }

    fn subscribe(&self, key: ListenerKey) -> Box<dyn Subscription> {
        self.active.borrow_mut().push(key.clone());
        Box::new(HeadlessSubscription {
            key: Some(key),
            active: Rc::clone(&self.active),
        })
    }
}

impl MotionHost for HeadlessHost {
    fn create_element(&self, tag: &str) -> ElementRef {
        HeadlessElement::new(tag)
    }

    fn document_hidden(&self) -> bool {
        self.document_hidden.get()
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion.get()
    }

    fn observe_intersection(&self, element: &ElementRef) {
        if !self.is_observed(element) {
            self.observed.borrow_mut().push(Rc::clone(element));
        }
    }

    fn unobserve_intersection(&self, element: &ElementRef) {
        self.observed
            .borrow_mut()
            .retain(|el| !same_element(el, element));
    }

    fn disconnect_intersection(&self) {
        self.observed.borrow_mut().clear();
    }

    fn observe_resize(
        &self,
        _element: &ElementRef,
        module_id: &str,
    ) -> Box<dyn Subscription> {
        self.subscribe(ListenerKey::Resize(module_id.to_owned()))
    }

    fn animate(
        &self,
        element: &ElementRef,
        keyframes: &Keyframes,
        options: &AnimationOptions,
    ) -> Box<dyn KeyframeAnimation> {
        let record = Rc::new(AnimationRecord {
            element: Rc::clone(element),
            keyframes: keyframes.clone(),
            options: options.clone(),
            state: Cell::new(PlayState::Running),
            play_calls: Cell::new(0),
            pause_calls: Cell::new(0),
        });
        self.animations.borrow_mut().push(Rc::clone(&record));
        Box::new(RecordedAnimation(record))
    }

    fn listen(&self, event: GlobalEvent) -> Box<dyn Subscription> {
        self.subscribe(ListenerKey::Global(format!("{event:?}")))
    }
}

impl PreferenceHost for HeadlessHost {
    fn media_matches(&self, query: MediaQuery) -> bool {
        match query {
            MediaQuery::PrefersDarkScheme => self.dark_scheme.get(),
            MediaQuery::PrefersReducedMotion => self.reduced_motion.get(),
        }
    }

    fn listen_media(&self, query: MediaQuery) -> Box<dyn Subscription> {
        self.subscribe(ListenerKey::Media(query.query()))
    }

    fn set_root_class(&self, class: &str, on: bool) {
        let mut classes = self.root_classes.borrow_mut();
        if on {
            let _ = classes.insert(class.to_owned());
        } else {
            let _ = classes.remove(class);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_finds_appended_descendants() {
        let root = HeadlessElement::new("div");
        let child = HeadlessElement::new("div");
        let grandchild: ElementRef = HeadlessElement::new("span");
        grandchild.set_attribute("data-module", "m1");
        child.append_child(&grandchild);
        let child: ElementRef = child;
        root.append_child(&child);

        let found = root.query_attribute("data-module", "m1").unwrap();
        assert!(same_element(&found, &grandchild));
        assert!(root.query_attribute("data-module", "m2").is_none());
    }

    #[test]
    fn query_materializes_markup_stand_ins_once() {
        let root = HeadlessElement::new("div");
        root.set_content(r#"<svg><path data-role="stroke"/></svg>"#);

        let a = root.query_attribute("data-role", "stroke").unwrap();
        let b = root.query_attribute("data-role", "stroke").unwrap();
        assert!(same_element(&a, &b));
        assert!(root.query_attribute("data-role", "missing").is_none());
    }

    #[test]
    fn identity_is_per_node() {
        let a: ElementRef = HeadlessElement::new("div");
        let b: ElementRef = HeadlessElement::new("div");
        assert!(a.is_same(&Rc::clone(&a)));
        assert!(!a.is_same(&b));
    }

    #[test]
    fn class_lists_split_on_whitespace() {
        let el = HeadlessElement::new("div");
        el.set_class("a b  c", true);
        assert!(el.has_class("a") && el.has_class("b") && el.has_class("c"));
        el.set_class("b", false);
        assert!(!el.has_class("b"));
    }

    #[test]
    fn subscriptions_detach_once() {
        let host = HeadlessHost::new();
        let mut sub = host.listen(GlobalEvent::PageHide);
        assert_eq!(host.active_listeners().len(), 1);
        sub.disconnect();
        sub.disconnect();
        assert!(host.active_listeners().is_empty());
    }
}
