//! Browser host backed by `web-sys`.
//!
//! Observer and listener callbacks never touch the [`App`] directly: they
//! push [`HostEvent`]s into an [`EventSink`], which dispatches them right
//! away when the app is free and otherwise leaves them for the next
//! animation frame. The frame loop drains the sink and then ticks.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, EventTarget, HtmlElement,
    IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, KeyframeAnimationOptions, MediaQueryListEvent,
    ResizeObserver, ResizeObserverEntry, Window,
};

use super::headless::HeadlessElement;
use super::{
    AnimationOptions, Element, ElementRef, GlobalEvent, HostEvent,
    KeyframeAnimation, Keyframes, MediaQuery, MotionHost, PreferenceHost,
    Size, Subscription,
};
use crate::app::App;
use crate::error::GalleryError;
use crate::options::{GalleryOptions, ObserverOptions};
use crate::preferences::{MemoryStorage, PreferenceStorage};

/// Id of the element the gallery mounts into.
pub const GALLERY_ROOT_ID: &str = "gallery-container";
/// Id of the optional theme toggle button.
pub const THEME_TOGGLE_ID: &str = "theme-toggle";
/// Id of the optional motion toggle button.
pub const MOTION_TOGGLE_ID: &str = "motion-toggle";

fn host_error(e: &JsValue) -> GalleryError {
    GalleryError::Host(format!("{e:?}"))
}

fn css_size(width: f64, height: f64) -> Size {
    Size::new(width as f32, height as f32)
}

// ─────────────────────────────────────────────────────────────────────────────
// Elements
// ─────────────────────────────────────────────────────────────────────────────

/// A DOM element.
#[derive(Debug, Clone)]
pub struct WebElement(pub web_sys::Element);

fn wrap(element: web_sys::Element) -> ElementRef {
    Rc::new(WebElement(element))
}

fn unwrap_dom(element: &ElementRef) -> Option<&web_sys::Element> {
    element
        .as_any()
        .downcast_ref::<WebElement>()
        .map(|el| &el.0)
}

impl Element for WebElement {
    fn set_attribute(&self, name: &str, value: &str) {
        if let Err(e) = self.0.set_attribute(name, value) {
            log::warn!("set_attribute {name}: {e:?}");
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_class(&self, class: &str, on: bool) {
        let list = self.0.class_list();
        for name in class.split_whitespace() {
            let result = if on {
                list.add_1(name)
            } else {
                list.remove_1(name)
            };
            if let Err(e) = result {
                log::warn!("class {name}: {e:?}");
            }
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn set_style(&self, property: &str, value: &str) {
        let Some(html) = self.0.dyn_ref::<HtmlElement>() else {
            return;
        };
        if let Err(e) = html.style().set_property(property, value) {
            log::warn!("style {property}: {e:?}");
        }
    }

    fn set_content(&self, markup: &str) {
        self.0.set_inner_html(markup);
    }

    fn append_child(&self, child: &ElementRef) {
        let Some(node) = unwrap_dom(child) else {
            log::warn!("cannot append a non-DOM element");
            return;
        };
        if let Err(e) = self.0.append_child(node) {
            log::warn!("append_child: {e:?}");
        }
    }

    fn clear_children(&self) {
        self.0.set_inner_html("");
    }

    fn query_attribute(&self, name: &str, value: &str) -> Option<ElementRef> {
        self.0
            .query_selector(&format!("[{name}=\"{value}\"]"))
            .ok()
            .flatten()
            .map(wrap)
    }

    fn size(&self) -> Size {
        let rect = self.0.get_bounding_client_rect();
        css_size(rect.width(), rect.height())
    }

    fn is_same(&self, other: &ElementRef) -> bool {
        unwrap_dom(other).is_some_and(|other| {
            let node: &web_sys::Node = other.as_ref();
            self.0.is_same_node(Some(node))
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Animations and subscriptions
// ─────────────────────────────────────────────────────────────────────────────

struct WebAnimation(web_sys::Animation);

impl KeyframeAnimation for WebAnimation {
    fn play(&mut self) {
        if let Err(e) = self.0.play() {
            log::warn!("animation play: {e:?}");
        }
    }

    fn pause(&mut self) {
        if let Err(e) = self.0.pause() {
            log::warn!("animation pause: {e:?}");
        }
    }

    fn cancel(&mut self) {
        self.0.cancel();
    }
}

/// Stand-in for an animation the browser refused to start.
struct InertAnimation;

impl KeyframeAnimation for InertAnimation {
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn cancel(&mut self) {}
}

/// An event listener registered on a DOM target.
struct ListenerSubscription {
    target: EventTarget,
    event: &'static str,
    callback: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

impl Subscription for ListenerSubscription {
    fn disconnect(&mut self) {
        if let Some(callback) = self.callback.take() {
            let _ = self.target.remove_event_listener_with_callback(
                self.event,
                callback.as_ref().unchecked_ref(),
            );
        }
    }
}

struct ResizeSubscription {
    observer: Option<ResizeObserver>,
    _callback: Closure<dyn FnMut(js_sys::Array, ResizeObserver)>,
}

impl Subscription for ResizeSubscription {
    fn disconnect(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
    }
}

/// Registration that was never made.
struct NoSubscription;

impl Subscription for NoSubscription {
    fn disconnect(&mut self) {}
}

/// `stroke-dashoffset` → `strokeDashoffset`, the form keyframe objects use.
fn camel_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len());
    let mut upper = false;
    for c in property.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn keyframes_to_js(keyframes: &Keyframes) -> Result<js_sys::Array, JsValue> {
    let frames = js_sys::Array::new();
    for keyframe in &keyframes.0 {
        let frame = js_sys::Object::new();
        for (property, value) in keyframe {
            let _ = js_sys::Reflect::set(
                &frame,
                &JsValue::from_str(&camel_case(property)),
                &JsValue::from_str(value),
            )?;
        }
        let _ = frames.push(&frame);
    }
    Ok(frames)
}

fn animation_options_to_js(
    options: &AnimationOptions,
) -> Result<KeyframeAnimationOptions, JsValue> {
    let object = js_sys::Object::new();
    let set = |key: &str, value: JsValue| {
        js_sys::Reflect::set(&object, &JsValue::from_str(key), &value)
    };
    let _ = set("duration", JsValue::from_f64(options.duration_ms))?;
    let _ = set("easing", JsValue::from_str(&options.easing))?;
    let _ = set("delay", JsValue::from_f64(options.delay_ms))?;
    let iterations = options.iterations.unwrap_or(f64::INFINITY);
    let _ = set("iterations", JsValue::from_f64(iterations))?;
    Ok(object.unchecked_into())
}

// ─────────────────────────────────────────────────────────────────────────────
// Event sink
// ─────────────────────────────────────────────────────────────────────────────

/// Queue between browser callbacks and the app.
#[derive(Default)]
pub struct EventSink {
    queue: RefCell<VecDeque<HostEvent>>,
    app: RefCell<Weak<RefCell<App>>>,
}

impl EventSink {
    /// Attach the app events are delivered to.
    pub fn attach(&self, app: &Rc<RefCell<App>>) {
        *self.app.borrow_mut() = Rc::downgrade(app);
    }

    /// Queue an event and deliver everything queued if the app is free.
    pub fn push(&self, event: HostEvent) {
        self.queue.borrow_mut().push_back(event);
        self.pump();
    }

    /// Deliver queued events. Leaves them queued while the app is busy.
    pub fn pump(&self) {
        let Some(app) = self.app.borrow().upgrade() else {
            return;
        };
        let Ok(mut app) = app.try_borrow_mut() else {
            return;
        };
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            app.dispatch(&event);
        }
    }

    /// Number of undelivered events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Host
// ─────────────────────────────────────────────────────────────────────────────

/// [`MotionHost`] + [`PreferenceHost`] for a browser window.
pub struct WebHost {
    window: Window,
    document: Document,
    sink: Rc<EventSink>,
    intersection: IntersectionObserver,
    _on_intersection: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

impl WebHost {
    /// Connect to the current window and create the shared viewport
    /// observer.
    pub fn new(
        sink: Rc<EventSink>,
        observer: &ObserverOptions,
    ) -> Result<Self, GalleryError> {
        let window = web_sys::window()
            .ok_or_else(|| GalleryError::Host("no global window".to_owned()))?;
        let document = window
            .document()
            .ok_or_else(|| GalleryError::Host("no document".to_owned()))?;

        let entries_sink = Rc::clone(&sink);
        let on_intersection =
            Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
                move |entries: js_sys::Array, _observer: IntersectionObserver| {
                    for entry in entries.iter() {
                        let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>()
                        else {
                            continue;
                        };
                        entries_sink.push(HostEvent::Intersection {
                            element: wrap(entry.target()),
                            intersecting: entry.is_intersecting(),
                        });
                    }
                },
            );
        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(observer.threshold));
        init.set_root_margin(&observer.root_margin);
        let intersection = IntersectionObserver::new_with_options(
            on_intersection.as_ref().unchecked_ref(),
            &init,
        )
        .map_err(|e| host_error(&e))?;

        Ok(Self {
            window,
            document,
            sink,
            intersection,
            _on_intersection: on_intersection,
        })
    }

    /// The document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    fn media_list(&self, query: MediaQuery) -> Option<web_sys::MediaQueryList> {
        self.window.match_media(query.query()).ok().flatten()
    }

    fn add_listener(
        &self,
        target: EventTarget,
        event: &'static str,
        to_host_event: impl Fn(&web_sys::Event) -> Option<HostEvent> + 'static,
    ) -> Box<dyn Subscription> {
        let sink = Rc::clone(&self.sink);
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(
            move |e: web_sys::Event| {
                if let Some(event) = to_host_event(&e) {
                    sink.push(event);
                }
            },
        );
        if let Err(e) = target.add_event_listener_with_callback(
            event,
            callback.as_ref().unchecked_ref(),
        ) {
            log::warn!("listen {event}: {e:?}");
            return Box::new(NoSubscription);
        }
        Box::new(ListenerSubscription {
            target,
            event,
            callback: Some(callback),
        })
    }

    fn listen_media_change(
        &self,
        query: MediaQuery,
        to_host_event: fn(bool) -> HostEvent,
    ) -> Box<dyn Subscription> {
        let Some(list) = self.media_list(query) else {
            log::warn!("matchMedia unsupported for {}", query.query());
            return Box::new(NoSubscription);
        };
        self.add_listener(list.into(), "change", move |e| {
            e.dyn_ref::<MediaQueryListEvent>()
                .map(|e| to_host_event(e.matches()))
        })
    }
}

impl MotionHost for WebHost {
    fn create_element(&self, tag: &str) -> ElementRef {
        match self.document.create_element(tag) {
            Ok(element) => wrap(element),
            Err(e) => {
                log::error!("create_element {tag}: {e:?}");
                HeadlessElement::new(tag)
            }
        }
    }

    fn document_hidden(&self) -> bool {
        self.document.hidden()
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.media_matches(MediaQuery::PrefersReducedMotion)
    }

    fn observe_intersection(&self, element: &ElementRef) {
        if let Some(el) = unwrap_dom(element) {
            self.intersection.observe(el);
        }
    }

    fn unobserve_intersection(&self, element: &ElementRef) {
        if let Some(el) = unwrap_dom(element) {
            self.intersection.unobserve(el);
        }
    }

    fn disconnect_intersection(&self) {
        self.intersection.disconnect();
    }

    fn observe_resize(
        &self,
        element: &ElementRef,
        module_id: &str,
    ) -> Box<dyn Subscription> {
        let Some(el) = unwrap_dom(element) else {
            return Box::new(NoSubscription);
        };
        let sink = Rc::clone(&self.sink);
        let module_id = module_id.to_owned();
        // The coordinator reports the initial size itself.
        let first = Cell::new(true);
        let callback = Closure::<dyn FnMut(js_sys::Array, ResizeObserver)>::new(
            move |entries: js_sys::Array, _observer: ResizeObserver| {
                if first.replace(false) {
                    return;
                }
                let Some(entry) = entries
                    .iter()
                    .find_map(|e| e.dyn_into::<ResizeObserverEntry>().ok())
                else {
                    return;
                };
                let rect = entry.content_rect();
                sink.push(HostEvent::Resize {
                    module_id: module_id.clone(),
                    size: css_size(rect.width(), rect.height()),
                });
            },
        );
        match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => {
                observer.observe(el);
                Box::new(ResizeSubscription {
                    observer: Some(observer),
                    _callback: callback,
                })
            }
            Err(e) => {
                log::warn!("ResizeObserver: {e:?}");
                Box::new(NoSubscription)
            }
        }
    }

    fn animate(
        &self,
        element: &ElementRef,
        keyframes: &Keyframes,
        options: &AnimationOptions,
    ) -> Box<dyn KeyframeAnimation> {
        let Some(el) = unwrap_dom(element) else {
            return Box::new(InertAnimation);
        };
        let started = keyframes_to_js(keyframes).and_then(|frames| {
            let options = animation_options_to_js(options)?;
            let frames: &js_sys::Object = &frames;
            Ok(el.animate_with_keyframe_animation_options(Some(frames), &options))
        });
        match started {
            Ok(animation) => Box::new(WebAnimation(animation)),
            Err(e) => {
                log::warn!("animate: {e:?}");
                Box::new(InertAnimation)
            }
        }
    }

    fn listen(&self, event: GlobalEvent) -> Box<dyn Subscription> {
        match event {
            GlobalEvent::VisibilityChange => {
                let document = self.document.clone();
                self.add_listener(
                    self.document.clone().into(),
                    "visibilitychange",
                    move |_| {
                        Some(HostEvent::VisibilityChange {
                            hidden: document.hidden(),
                        })
                    },
                )
            }
            GlobalEvent::ReducedMotionChange => self.listen_media_change(
                MediaQuery::PrefersReducedMotion,
                |matches| HostEvent::ReducedMotionChange { matches },
            ),
            GlobalEvent::ColorSchemeChange => self.listen_media_change(
                MediaQuery::PrefersDarkScheme,
                |dark| HostEvent::ColorSchemeChange { dark },
            ),
            GlobalEvent::PageHide => self.add_listener(
                self.window.clone().into(),
                "pagehide",
                |_| Some(HostEvent::PageHide),
            ),
            GlobalEvent::BeforeUnload => self.add_listener(
                self.window.clone().into(),
                "beforeunload",
                |_| Some(HostEvent::PageHide),
            ),
        }
    }
}

impl PreferenceHost for WebHost {
    fn media_matches(&self, query: MediaQuery) -> bool {
        self.media_list(query).is_some_and(|list| list.matches())
    }

    fn listen_media(&self, query: MediaQuery) -> Box<dyn Subscription> {
        match query {
            MediaQuery::PrefersDarkScheme => {
                self.listen(GlobalEvent::ColorSchemeChange)
            }
            MediaQuery::PrefersReducedMotion => {
                self.listen(GlobalEvent::ReducedMotionChange)
            }
        }
    }

    fn set_root_class(&self, class: &str, on: bool) {
        if let Some(root) = self.document.document_element() {
            WebElement(root).set_class(class, on);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────────────────────────────────────

/// `window.localStorage`.
pub struct LocalStorage(web_sys::Storage);

impl LocalStorage {
    /// The window's local storage, if the browser allows it.
    pub fn open(window: &Window) -> Result<Self, GalleryError> {
        window
            .local_storage()
            .map_err(|e| host_error(&e))?
            .map(Self)
            .ok_or_else(|| GalleryError::Storage("localStorage unavailable".to_owned()))
    }
}

impl PreferenceStorage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GalleryError> {
        self.0
            .set_item(key, value)
            .map_err(|e| GalleryError::Storage(format!("{e:?}")))
    }

    fn remove(&mut self, key: &str) -> Result<(), GalleryError> {
        self.0
            .remove_item(key)
            .map_err(|e| GalleryError::Storage(format!("{e:?}")))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bootstrap
// ─────────────────────────────────────────────────────────────────────────────

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn request_frame(window: &Window, callback: &FrameCallback) {
    if let Some(cb) = callback.borrow().as_ref() {
        if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            log::error!("requestAnimationFrame: {e:?}");
        }
    }
}

fn run_frames(window: &Window, app: Rc<RefCell<App>>, sink: Rc<EventSink>) {
    let callback: FrameCallback = Rc::new(RefCell::new(None));
    let next = Rc::clone(&callback);
    let frame_window = window.clone();
    *callback.borrow_mut() = Some(Closure::<dyn FnMut()>::new(move || {
        sink.pump();
        let Ok(app) = app.try_borrow() else {
            request_frame(&frame_window, &next);
            return;
        };
        if app.is_torn_down() {
            let _ = next.borrow_mut().take();
            return;
        }
        let _ = app.tick();
        drop(app);
        request_frame(&frame_window, &next);
    }));
    request_frame(window, &callback);
}

fn bind_button(
    document: &Document,
    id: &str,
    app: &Rc<RefCell<App>>,
    action: fn(&mut App),
) {
    let Some(button) = document.get_element_by_id(id) else {
        return;
    };
    let app = Rc::downgrade(app);
    let on_click = Closure::<dyn FnMut(web_sys::Event)>::new(
        move |_e: web_sys::Event| {
            if let Some(app) = app.upgrade() {
                if let Ok(mut app) = app.try_borrow_mut() {
                    action(&mut app);
                }
            }
        },
    );
    if let Err(e) = button
        .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
    {
        log::warn!("bind {id}: {e:?}");
    }
    on_click.forget();
}

fn boot() -> Result<(), GalleryError> {
    let options = GalleryOptions::default();
    let sink = Rc::new(EventSink::default());
    let host = Rc::new(WebHost::new(Rc::clone(&sink), &options.observer)?);
    let window = host.window.clone();
    let document = host.document.clone();

    let storage: Box<dyn PreferenceStorage> = match LocalStorage::open(&window) {
        Ok(storage) => Box::new(storage),
        Err(e) => {
            log::warn!("{e}; preferences will not persist");
            Box::new(MemoryStorage::new())
        }
    };
    let root = document.get_element_by_id(GALLERY_ROOT_ID).map(wrap);
    let Some(app) = App::init(host, storage, root, &options) else {
        return Ok(());
    };
    let app = Rc::new(RefCell::new(app));
    sink.attach(&app);

    bind_button(&document, THEME_TOGGLE_ID, &app, |app| {
        let _ = app.toggle_theme();
    });
    bind_button(&document, MOTION_TOGGLE_ID, &app, |app| {
        let _ = app.toggle_motion();
    });
    run_frames(&window, app, sink);
    Ok(())
}

/// Browser entry point: mount the gallery once the DOM is ready.
#[wasm_bindgen]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    if document.ready_state() == "loading" {
        let on_ready = Closure::<dyn FnMut(web_sys::Event)>::new(
            |_e: web_sys::Event| {
                if let Err(e) = boot() {
                    log::error!("{e}");
                }
            },
        );
        document.add_event_listener_with_callback(
            "DOMContentLoaded",
            on_ready.as_ref().unchecked_ref(),
        )?;
        on_ready.forget();
        return Ok(());
    }
    boot().map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyframe_properties_become_camel_case() {
        assert_eq!(camel_case("stroke-dashoffset"), "strokeDashoffset");
        assert_eq!(camel_case("opacity"), "opacity");
        assert_eq!(camel_case("border-top-color"), "borderTopColor");
    }
}
