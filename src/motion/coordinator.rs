//! The motion coordinator: single source of truth for whether each
//! module's animations run.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::handle::MotionHandle;
use super::scope::CancellationScope;
use super::signals::PlaySignals;
use crate::host::{
    AnimationOptions, Element, ElementRef, GlobalEvent, HostEvent,
    KeyframeAnimation, Keyframes, MotionHost, Size, Subscription,
};
use crate::options::LayoutOptions;

/// Marker class toggled on a container while its animations are paused.
pub const PAUSED_CLASS: &str = "animation-paused";

/// Attribute carrying the module identifier on observed containers.
pub const MODULE_ATTRIBUTE: &str = "data-module";

const RESIZE_KEY_SUFFIX: &str = "-resize";

fn resize_key(module_id: &str) -> String {
    format!("{module_id}{RESIZE_KEY_SUFFIX}")
}

/// Callback invoked with an element's size when a resize observation fires.
pub type ResizeFn = Box<dyn FnMut(Size)>;

/// Stand-in for an animation requested after teardown.
struct InertAnimation;

impl KeyframeAnimation for InertAnimation {
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn cancel(&mut self) {}
}

struct ResizeObservation {
    module_id: String,
    subscription: Box<dyn Subscription>,
    callback: ResizeFn,
}

/// Owns every animation handle and observer of the gallery and decides,
/// per module, whether its animations play.
///
/// A module plays iff its container intersects the viewport, the document
/// is visible and reduced motion is off (see [`PlaySignals`]). Any change
/// of those inputs re-evaluates the affected modules; document visibility
/// and reduced motion affect every observed module at once.
///
/// Environment notifications arrive through the `handle_*` methods (or
/// [`dispatch`](Self::dispatch)); per-frame loops advance on
/// [`tick`](Self::tick).
pub struct MotionCoordinator {
    host: Rc<dyn MotionHost>,
    paused_class: String,
    module_attribute: String,
    /// Module id → handles, in registration order.
    handles: FxHashMap<String, Vec<MotionHandle>>,
    /// Module id → observed container.
    containers: FxHashMap<String, ElementRef>,
    /// Module id → last reported intersection.
    intersections: FxHashMap<String, bool>,
    /// `<module id>-resize` → size observation.
    resize_observers: FxHashMap<String, ResizeObservation>,
    /// Shared with every handle so `play` can refuse while it is set.
    reduced_motion: Rc<Cell<bool>>,
    document_hidden: bool,
    listeners: CancellationScope,
    cleanup_completed: bool,
}

impl MotionCoordinator {
    /// Create a coordinator with the default DOM class contract.
    pub fn new(host: Rc<dyn MotionHost>) -> Self {
        Self::with_layout(host, &LayoutOptions::default())
    }

    /// Create a coordinator using the paused class and module attribute
    /// from `layout`. Reads the current document visibility and
    /// reduced-motion preference and registers the global listeners.
    pub fn with_layout(host: Rc<dyn MotionHost>, layout: &LayoutOptions) -> Self {
        let mut listeners = CancellationScope::new();
        for event in [
            GlobalEvent::VisibilityChange,
            GlobalEvent::ReducedMotionChange,
            GlobalEvent::PageHide,
            GlobalEvent::BeforeUnload,
        ] {
            listeners.register(host.listen(event));
        }

        Self {
            reduced_motion: Rc::new(Cell::new(host.prefers_reduced_motion())),
            document_hidden: host.document_hidden(),
            host,
            paused_class: layout.paused_class.clone(),
            module_attribute: layout.module_attribute.clone(),
            handles: FxHashMap::default(),
            containers: FxHashMap::default(),
            intersections: FxHashMap::default(),
            resize_observers: FxHashMap::default(),
            listeners,
            cleanup_completed: false,
        }
    }

    /// The host this coordinator drives.
    #[must_use]
    pub fn host(&self) -> &Rc<dyn MotionHost> {
        &self.host
    }

    // ── Handle creation ──────────────────────────────────────────────────

    /// Create a per-frame loop handle for `module_id`.
    ///
    /// While playing, `update` runs once per [`tick`](Self::tick). When
    /// `start_immediately` is set the handle is played right away, which
    /// does nothing while reduced motion is active.
    pub fn create_loop_handle(
        &mut self,
        module_id: &str,
        update: impl FnMut() + 'static,
        start_immediately: bool,
    ) -> MotionHandle {
        let handle = MotionHandle::frame_loop(
            Box::new(update),
            Rc::clone(&self.reduced_motion),
        );
        if self.cleanup_completed {
            log::debug!("{module_id}: loop handle requested after teardown");
            handle.cancel();
            return handle;
        }
        self.register_handle(module_id, handle.clone());
        if start_immediately {
            handle.play();
        }
        handle
    }

    /// Create an infinitely repeating declarative animation on `element`
    /// for `module_id`. Starts paused while reduced motion is active.
    pub fn create_declarative_handle(
        &mut self,
        module_id: &str,
        element: &ElementRef,
        keyframes: &Keyframes,
        options: &AnimationOptions,
    ) -> MotionHandle {
        if self.cleanup_completed {
            log::debug!("{module_id}: animation requested after teardown");
            let handle = MotionHandle::declarative(
                Box::new(InertAnimation),
                Rc::clone(element),
                Rc::clone(&self.reduced_motion),
            );
            handle.cancel();
            return handle;
        }
        let options = AnimationOptions {
            iterations: None,
            ..options.clone()
        };
        let animation = self.host.animate(element, keyframes, &options);
        let handle = MotionHandle::declarative(
            animation,
            Rc::clone(element),
            Rc::clone(&self.reduced_motion),
        );
        self.register_handle(module_id, handle.clone());
        handle
    }

    /// Register an externally built handle under `module_id`. After
    /// teardown the handle is cancelled instead.
    pub fn register_handle(&mut self, module_id: &str, handle: MotionHandle) {
        if self.cleanup_completed {
            handle.cancel();
            return;
        }
        self.handles
            .entry(module_id.to_owned())
            .or_default()
            .push(handle);
    }

    // ── Observation ──────────────────────────────────────────────────────

    /// Observe `element` for viewport intersection on behalf of
    /// `module_id`.
    ///
    /// The module starts out as not intersecting, so it is paused until
    /// the host reports otherwise.
    pub fn observe_for_pausing(&mut self, element: &ElementRef, module_id: &str) {
        if self.cleanup_completed {
            return;
        }
        element.set_attribute(&self.module_attribute, module_id);
        if let Some(previous) = self
            .containers
            .insert(module_id.to_owned(), Rc::clone(element))
        {
            if !previous.is_same(element) {
                self.host.unobserve_intersection(&previous);
            }
        }
        self.host.observe_intersection(element);
        let _ = self.intersections.insert(module_id.to_owned(), false);
        log::trace!("observing {module_id} for pausing");
        self.evaluate(module_id);
    }

    /// Observe `element`'s size on behalf of `module_id`.
    ///
    /// `callback` runs once immediately with the current size and again on
    /// every reported change. A module has at most one size observation;
    /// registering again replaces the previous one.
    pub fn register_resize_observer(
        &mut self,
        element: &ElementRef,
        module_id: &str,
        callback: impl FnMut(Size) + 'static,
    ) {
        if self.cleanup_completed {
            return;
        }
        let key = resize_key(module_id);
        if let Some(mut previous) = self.resize_observers.remove(&key) {
            previous.subscription.disconnect();
        }
        let subscription = self.host.observe_resize(element, module_id);
        let mut callback: ResizeFn = Box::new(callback);
        callback(element.size());
        let _ = self.resize_observers.insert(
            key,
            ResizeObservation {
                module_id: module_id.to_owned(),
                subscription,
                callback,
            },
        );
    }

    // ── Play / pause ─────────────────────────────────────────────────────

    /// Pause every handle of `module_id`, or of every module when `None`.
    pub fn pause_all(&self, module_id: Option<&str>) {
        self.for_each_handle(module_id, MotionHandle::pause);
    }

    /// Play every handle of `module_id`, or of every module when `None`.
    /// Does nothing while reduced motion is active.
    pub fn play_all(&self, module_id: Option<&str>) {
        if self.reduced_motion.get() {
            return;
        }
        self.for_each_handle(module_id, MotionHandle::play);
    }

    fn for_each_handle(&self, module_id: Option<&str>, f: fn(&MotionHandle)) {
        match module_id {
            Some(id) => {
                if let Some(handles) = self.handles.get(id) {
                    handles.iter().for_each(f);
                }
            }
            None => self.handles.values().flatten().for_each(f),
        }
    }

    /// Run one animation frame: every playing loop handle updates once.
    /// Returns how many updates ran.
    pub fn tick(&self) -> usize {
        if self.cleanup_completed {
            return 0;
        }
        self.handles
            .values()
            .flatten()
            .filter(|handle| handle.run_frame())
            .count()
    }

    // ── Environment notifications ────────────────────────────────────────

    /// Route a host notification to the matching handler.
    pub fn dispatch(&mut self, event: &HostEvent) {
        match event {
            HostEvent::Intersection {
                element,
                intersecting,
            } => self.handle_intersection(element, *intersecting),
            HostEvent::Resize { module_id, size } => {
                self.handle_resize(module_id, *size);
            }
            HostEvent::VisibilityChange { hidden } => {
                self.handle_visibility_change(*hidden);
            }
            HostEvent::ReducedMotionChange { matches } => {
                self.handle_reduced_motion_change(*matches);
            }
            HostEvent::PageHide => self.handle_page_hide(),
            HostEvent::ColorSchemeChange { .. } => {}
        }
    }

    /// An observed container entered or left the viewport. Reports for an
    /// element that is no longer the module's registered container are
    /// ignored.
    pub fn handle_intersection(&mut self, element: &ElementRef, intersecting: bool) {
        if self.cleanup_completed {
            return;
        }
        let Some(module_id) = element.attribute(&self.module_attribute) else {
            return;
        };
        let registered = self
            .containers
            .get(&module_id)
            .is_some_and(|container| container.is_same(element));
        if !registered {
            log::trace!("stale intersection report for {module_id}");
            return;
        }
        let _ = self.intersections.insert(module_id.clone(), intersecting);
        self.evaluate(&module_id);
    }

    /// Document visibility changed.
    pub fn handle_visibility_change(&mut self, hidden: bool) {
        if self.cleanup_completed {
            return;
        }
        log::debug!("document {}", if hidden { "hidden" } else { "visible" });
        self.document_hidden = hidden;
        self.evaluate_all();
    }

    /// Reduced-motion preference changed.
    pub fn handle_reduced_motion_change(&mut self, reduced: bool) {
        if self.cleanup_completed {
            return;
        }
        log::debug!("reduced motion {}", if reduced { "on" } else { "off" });
        self.reduced_motion.set(reduced);
        self.evaluate_all();
    }

    /// A size-observed element of `module_id` changed size.
    pub fn handle_resize(&mut self, module_id: &str, size: Size) {
        if self.cleanup_completed {
            return;
        }
        if let Some(observation) =
            self.resize_observers.get_mut(&resize_key(module_id))
        {
            (observation.callback)(size);
        }
    }

    /// The page is going away: tear everything down.
    pub fn handle_page_hide(&mut self) {
        self.cleanup();
    }

    fn evaluate_all(&self) {
        for module_id in self.containers.keys() {
            self.evaluate(module_id);
        }
    }

    fn evaluate(&self, module_id: &str) {
        let Some(container) = self.containers.get(module_id) else {
            return;
        };
        let play = self.signals(module_id).should_play();
        log::trace!("{module_id}: {}", if play { "play" } else { "pause" });
        if play {
            container.set_class(&self.paused_class, false);
            self.play_all(Some(module_id));
        } else {
            container.set_class(&self.paused_class, true);
            self.pause_all(Some(module_id));
        }
    }

    // ── Teardown ─────────────────────────────────────────────────────────

    /// Release everything registered for `module_id`: cancel its handles,
    /// stop observing its container and drop its size observation. Unknown
    /// ids are ignored.
    pub fn cleanup_module(&mut self, module_id: &str) {
        if let Some(handles) = self.handles.remove(module_id) {
            handles.iter().for_each(MotionHandle::cancel);
        }
        if let Some(container) = self.containers.remove(module_id) {
            self.host.unobserve_intersection(&container);
        }
        let _ = self.intersections.remove(module_id);
        if let Some(mut observation) =
            self.resize_observers.remove(&resize_key(module_id))
        {
            observation.subscription.disconnect();
        }
        log::debug!("cleaned up module {module_id}");
    }

    /// Tear down every observer, handle and global listener. Runs at most
    /// once; later calls do nothing.
    pub fn cleanup(&mut self) {
        if self.cleanup_completed {
            return;
        }
        self.host.disconnect_intersection();
        for (_, mut observation) in self.resize_observers.drain() {
            observation.subscription.disconnect();
        }
        for (_, handles) in self.handles.drain() {
            handles.iter().for_each(MotionHandle::cancel);
        }
        self.containers.clear();
        self.intersections.clear();
        self.listeners.cancel();
        self.cleanup_completed = true;
        log::debug!("motion coordinator torn down");
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Current inputs of the play predicate for `module_id`. Unobserved
    /// modules count as not intersecting.
    #[must_use]
    pub fn signals(&self, module_id: &str) -> PlaySignals {
        PlaySignals {
            intersecting: self
                .intersections
                .get(module_id)
                .copied()
                .unwrap_or(false),
            document_hidden: self.document_hidden,
            reduced_motion: self.reduced_motion.get(),
        }
    }

    /// Whether `module_id`'s animations should currently run.
    #[must_use]
    pub fn should_play(&self, module_id: &str) -> bool {
        self.signals(module_id).should_play()
    }

    /// Whether `module_id`'s container is under observation.
    #[must_use]
    pub fn is_observed(&self, module_id: &str) -> bool {
        self.containers.contains_key(module_id)
    }

    /// Last reported intersection of `module_id`, if observed.
    #[must_use]
    pub fn is_intersecting(&self, module_id: &str) -> Option<bool> {
        self.intersections.get(module_id).copied()
    }

    /// Whether `module_id` has an active size observation.
    #[must_use]
    pub fn has_resize_observer(&self, module_id: &str) -> bool {
        self.resize_observers.contains_key(&resize_key(module_id))
    }

    /// Handles registered for `module_id`.
    #[must_use]
    pub fn handles(&self, module_id: &str) -> &[MotionHandle] {
        self.handles.get(module_id).map_or(&[], Vec::as_slice)
    }

    /// Number of handles registered for `module_id`.
    #[must_use]
    pub fn handle_count(&self, module_id: &str) -> usize {
        self.handles(module_id).len()
    }

    /// Number of modules under observation.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.containers.len()
    }

    /// Whether reduced motion is active.
    #[must_use]
    pub fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion.get()
    }

    /// Whether the document is hidden.
    #[must_use]
    pub fn document_hidden(&self) -> bool {
        self.document_hidden
    }

    /// Whether [`cleanup`](Self::cleanup) has run.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.cleanup_completed
    }
}

impl Drop for MotionCoordinator {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl fmt::Debug for MotionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resize_modules: Vec<&str> = self
            .resize_observers
            .values()
            .map(|o| o.module_id.as_str())
            .collect();
        f.debug_struct("MotionCoordinator")
            .field("modules", &self.containers.keys().collect::<Vec<_>>())
            .field("handles", &self.handles.values().map(Vec::len).sum::<usize>())
            .field("resize_observers", &resize_modules)
            .field("document_hidden", &self.document_hidden)
            .field("reduced_motion", &self.reduced_motion.get())
            .field("listeners", &self.listeners)
            .field("torn_down", &self.cleanup_completed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::host::headless::{
        HeadlessElement, HeadlessHost, ListenerKey, PlayState,
    };
    use crate::host::same_element;

    fn setup() -> (Rc<HeadlessHost>, MotionCoordinator) {
        let host = HeadlessHost::new();
        let coordinator = MotionCoordinator::new(host.clone());
        (host, coordinator)
    }

    fn container() -> ElementRef {
        HeadlessElement::new("div")
    }

    fn counter() -> (Rc<Cell<usize>>, impl FnMut() + 'static) {
        let calls = Rc::new(Cell::new(0));
        let inner = Rc::clone(&calls);
        (calls, move || inner.set(inner.get() + 1))
    }

    fn fade() -> (Keyframes, AnimationOptions) {
        (
            Keyframes::between("opacity", "0", "1"),
            AnimationOptions {
                duration_ms: 1000.0,
                ..AnimationOptions::default()
            },
        )
    }

    // ── Registration ────────────────────────────────────────────────────

    #[test]
    fn loop_handle_registers_and_runs() {
        let (_host, mut motion) = setup();
        let (calls, update) = counter();
        let handle = motion.create_loop_handle("test-module", update, false);
        assert_eq!(motion.handle_count("test-module"), 1);

        handle.play();
        for _ in 0..3 {
            let _ = motion.tick();
        }
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn declarative_handle_is_infinite_and_keeps_element() {
        let (host, mut motion) = setup();
        let el = container();
        let (keyframes, options) = fade();
        let handle =
            motion.create_declarative_handle("test-module", &el, &keyframes, &options);

        assert!(same_element(&handle.element().unwrap(), &el));
        let records = host.animations();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].options.iterations, None);
        assert_eq!(records[0].options.duration_ms, 1000.0);
        assert_eq!(records[0].state(), PlayState::Running);
    }

    #[test]
    fn declarative_handle_starts_paused_under_reduced_motion() {
        let host = HeadlessHost::new();
        host.set_reduced_motion(true);
        let mut motion = MotionCoordinator::new(host.clone());
        let (keyframes, options) = fade();
        let handle =
            motion.create_declarative_handle("m", &container(), &keyframes, &options);

        assert!(!handle.is_running());
        assert_eq!(host.animations()[0].state(), PlayState::Paused);
    }

    #[test]
    fn start_immediately_is_ignored_under_reduced_motion() {
        let host = HeadlessHost::new();
        host.set_reduced_motion(true);
        let mut motion = MotionCoordinator::new(host);
        let (calls, update) = counter();
        let handle = motion.create_loop_handle("m", update, true);

        for _ in 0..10 {
            let _ = motion.tick();
        }
        assert!(!handle.is_running());
        assert_eq!(calls.get(), 0);
    }

    // ── Play predicate ──────────────────────────────────────────────────

    #[test]
    fn observed_module_starts_paused() {
        let (host, mut motion) = setup();
        let el = container();
        let (_, update) = counter();
        let handle = motion.create_loop_handle("m1", update, true);
        assert!(handle.is_running());

        motion.observe_for_pausing(&el, "m1");
        assert_eq!(el.attribute(MODULE_ATTRIBUTE).as_deref(), Some("m1"));
        assert_eq!(motion.is_intersecting("m1"), Some(false));
        assert!(el.has_class(PAUSED_CLASS));
        assert!(!handle.is_running());
        assert!(host.is_observed(&el));
    }

    #[test]
    fn loop_follows_intersection() {
        let (_host, mut motion) = setup();
        let el = container();
        let (calls, update) = counter();
        let _ = motion.create_loop_handle("m1", update, true);
        motion.observe_for_pausing(&el, "m1");

        motion.handle_intersection(&el, true);
        assert!(!el.has_class(PAUSED_CLASS));
        assert_eq!(motion.tick(), 1);
        assert_eq!(calls.get(), 1);

        motion.handle_intersection(&el, false);
        for _ in 0..5 {
            let _ = motion.tick();
        }
        assert_eq!(calls.get(), 1);
        assert!(el.has_class(PAUSED_CLASS));
    }

    #[test]
    fn each_signal_flips_running_state() {
        let (_host, mut motion) = setup();
        let el = container();
        let (_, update) = counter();
        let handle = motion.create_loop_handle("m1", update, true);
        motion.observe_for_pausing(&el, "m1");
        motion.handle_intersection(&el, true);
        assert!(handle.is_running());

        motion.handle_visibility_change(true);
        assert!(!handle.is_running());
        motion.handle_visibility_change(false);
        assert!(handle.is_running());

        motion.handle_reduced_motion_change(true);
        assert!(!handle.is_running());
        assert!(el.has_class(PAUSED_CLASS));
        motion.handle_reduced_motion_change(false);
        assert!(handle.is_running());
        assert!(!el.has_class(PAUSED_CLASS));

        motion.handle_intersection(&el, false);
        assert!(!handle.is_running());
    }

    #[test]
    fn hiding_document_pauses_every_module_once() {
        let (host, mut motion) = setup();
        let (keyframes, options) = fade();
        let elements = [container(), container()];
        for (el, id) in elements.iter().zip(["m1", "m2"]) {
            let _ = motion.create_declarative_handle(id, el, &keyframes, &options);
            let _ = motion.create_declarative_handle(id, el, &keyframes, &options);
            motion.observe_for_pausing(el, id);
            motion.handle_intersection(el, true);
        }
        let before: Vec<usize> =
            host.animations().iter().map(|a| a.pause_calls()).collect();

        motion.handle_visibility_change(true);

        for (record, before) in host.animations().iter().zip(before) {
            assert_eq!(record.state(), PlayState::Paused);
            assert_eq!(record.pause_calls(), before + 1);
        }
        assert!(elements.iter().all(|el| el.has_class(PAUSED_CLASS)));
    }

    #[test]
    fn play_all_is_a_no_op_under_reduced_motion() {
        let (host, mut motion) = setup();
        let (keyframes, options) = fade();
        let handle =
            motion.create_declarative_handle("m", &container(), &keyframes, &options);
        motion.pause_all(None);
        motion.handle_reduced_motion_change(true);

        motion.play_all(Some("m"));
        motion.play_all(None);
        handle.play();
        assert_eq!(host.animations()[0].play_calls(), 0);
        assert!(!handle.is_running());
    }

    #[test]
    fn pause_and_play_all_without_id_cover_every_module() {
        let (_host, mut motion) = setup();
        let handles: Vec<MotionHandle> = ["a", "b", "c"]
            .iter()
            .map(|id| motion.create_loop_handle(id, || {}, true))
            .collect();

        motion.pause_all(None);
        assert!(handles.iter().all(|h| !h.is_running()));
        motion.play_all(None);
        assert!(handles.iter().all(MotionHandle::is_running));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let (_host, mut motion) = setup();
        motion.pause_all(Some("nope"));
        motion.play_all(Some("nope"));
        motion.cleanup_module("nope");
        motion.handle_resize("nope", Size::new(1.0, 1.0));
        let stray = container();
        stray.set_attribute(MODULE_ATTRIBUTE, "nope");
        motion.handle_intersection(&stray, true);
        assert_eq!(motion.is_intersecting("nope"), None);
    }

    #[test]
    fn reobserving_replaces_the_container() {
        let (host, mut motion) = setup();
        let first = container();
        let second = container();
        motion.observe_for_pausing(&first, "m");
        motion.observe_for_pausing(&second, "m");

        assert!(!host.is_observed(&first));
        assert!(host.is_observed(&second));
        assert_eq!(motion.module_count(), 1);
    }

    #[test]
    fn reports_for_a_replaced_container_are_ignored() {
        let (host, mut motion) = setup();
        let first = container();
        let second = container();
        let (_, update) = counter();
        let handle = motion.create_loop_handle("m", update, true);
        motion.observe_for_pausing(&first, "m");
        motion.observe_for_pausing(&second, "m");

        // `first` still carries the module attribute.
        motion.handle_intersection(&first, true);
        assert_eq!(motion.is_intersecting("m"), Some(false));
        assert!(second.has_class(PAUSED_CLASS));
        assert!(!handle.is_running());
        assert!(!host.is_observed(&first));

        motion.handle_intersection(&second, true);
        assert!(!second.has_class(PAUSED_CLASS));
        assert!(handle.is_running());
    }

    // ── Resize ──────────────────────────────────────────────────────────

    #[test]
    fn resize_callback_fires_immediately_and_on_change() {
        let (host, mut motion) = setup();
        let el = HeadlessElement::new("div");
        el.set_size(Size::new(200.0, 100.0));
        let el: ElementRef = el;
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&sizes);

        motion.register_resize_observer(&el, "particles", move |size| {
            sink.borrow_mut().push(size);
        });
        assert_eq!(*sizes.borrow(), vec![Size::new(200.0, 100.0)]);
        assert!(host
            .active_listeners()
            .contains(&ListenerKey::Resize("particles".to_owned())));

        motion.handle_resize("particles", Size::new(50.0, 50.0));
        assert_eq!(sizes.borrow().len(), 2);
        assert_eq!(sizes.borrow()[1], Size::new(50.0, 50.0));
    }

    #[test]
    fn resize_registration_replaces_silently() {
        let (host, mut motion) = setup();
        let el = container();
        let (first_calls, mut first) = counter();
        let (second_calls, mut second) = counter();
        motion.register_resize_observer(&el, "m", move |_| first());
        motion.register_resize_observer(&el, "m", move |_| second());

        motion.handle_resize("m", Size::default());
        assert_eq!(first_calls.get(), 1);
        assert_eq!(second_calls.get(), 2);
        let resize_subs = host
            .active_listeners()
            .into_iter()
            .filter(|k| matches!(k, ListenerKey::Resize(_)))
            .count();
        assert_eq!(resize_subs, 1);
    }

    // ── Teardown ────────────────────────────────────────────────────────

    #[test]
    fn cleanup_module_stops_pending_frames() {
        let (host, mut motion) = setup();
        let el = container();
        let (calls, update) = counter();
        let handle = motion.create_loop_handle("m1", update, true);
        motion.observe_for_pausing(&el, "m1");
        motion.handle_intersection(&el, true);
        motion.register_resize_observer(&el, "m1", |_| {});
        let _ = motion.tick();

        motion.cleanup_module("m1");
        for _ in 0..5 {
            let _ = motion.tick();
        }
        assert_eq!(calls.get(), 1);
        assert!(handle.is_cancelled());
        assert_eq!(motion.handle_count("m1"), 0);
        assert!(!motion.is_observed("m1"));
        assert_eq!(motion.is_intersecting("m1"), None);
        assert!(!motion.has_resize_observer("m1"));
        assert!(!host.is_observed(&el));

        // A late intersection report for the removed module is ignored.
        motion.handle_intersection(&el, true);
        handle.play();
        assert_eq!(motion.tick(), 0);
    }

    #[test]
    fn cleanup_releases_everything_once() {
        let (host, mut motion) = setup();
        let el = container();
        let (keyframes, options) = fade();
        let _ = motion.create_declarative_handle("m1", &el, &keyframes, &options);
        let loop_handle = motion.create_loop_handle("m2", || {}, true);
        motion.observe_for_pausing(&el, "m1");
        motion.register_resize_observer(&el, "m2", |_| {});
        assert_eq!(host.active_listeners().len(), 5);

        motion.cleanup();
        let listeners_after_first = host.active_listeners();
        let pauses_after_first = host.animations()[0].pause_calls();

        motion.cleanup();
        assert!(listeners_after_first.is_empty());
        assert!(host.active_listeners().is_empty());
        assert!(host.observed_elements().is_empty());
        assert_eq!(host.animations()[0].state(), PlayState::Cancelled);
        assert_eq!(host.animations()[0].pause_calls(), pauses_after_first);
        assert!(loop_handle.is_cancelled());
        assert!(motion.is_torn_down());
        assert_eq!(motion.module_count(), 0);
    }

    #[test]
    fn events_after_teardown_are_ignored() {
        let (_host, mut motion) = setup();
        motion.dispatch(&HostEvent::PageHide);
        assert!(motion.is_torn_down());

        motion.dispatch(&HostEvent::VisibilityChange { hidden: true });
        motion.dispatch(&HostEvent::ReducedMotionChange { matches: true });
        assert!(!motion.document_hidden());
        assert!(!motion.prefers_reduced_motion());
    }

    #[test]
    fn registrations_after_teardown_allocate_nothing() {
        let (host, mut motion) = setup();
        motion.cleanup();
        let el = container();
        let (keyframes, options) = fade();
        let (calls, update) = counter();

        let loop_handle = motion.create_loop_handle("late", update, true);
        let animation =
            motion.create_declarative_handle("late", &el, &keyframes, &options);
        motion.observe_for_pausing(&el, "late");
        motion.register_resize_observer(&el, "late", |_| {});

        assert!(loop_handle.is_cancelled());
        assert!(animation.is_cancelled());
        assert!(host.animations().is_empty());
        assert!(host.observed_elements().is_empty());
        assert!(host.active_listeners().is_empty());
        assert_eq!(motion.handle_count("late"), 0);
        assert!(!motion.is_observed("late"));
        assert_eq!(motion.tick(), 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn initial_signals_come_from_the_host() {
        let host = HeadlessHost::new();
        host.set_document_hidden(true);
        let motion = MotionCoordinator::new(host);
        assert!(motion.document_hidden());
        assert!(!motion.prefers_reduced_motion());
    }
}
