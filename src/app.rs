//! Application wiring: one coordinator, one preference store and one
//! gallery per runtime context, with an explicit init/teardown lifecycle.

use std::rc::Rc;

use crate::gallery::Gallery;
use crate::host::{ElementRef, HostEvent, MediaQuery, MotionHost, PreferenceHost};
use crate::motion::MotionCoordinator;
use crate::options::GalleryOptions;
use crate::preferences::{
    AxisValue, MotionPreference, PreferenceStorage, PreferenceStore, Theme,
};

/// A mounted gallery and the services it runs on.
#[derive(Debug)]
pub struct App {
    motion: MotionCoordinator,
    preferences: PreferenceStore,
    gallery: Gallery,
    torn_down: bool,
}

impl App {
    /// Load preferences, create the coordinator and mount the gallery
    /// into `root`.
    ///
    /// Returns `None` (after logging) when the gallery root is missing.
    pub fn init<H>(
        host: Rc<H>,
        storage: Box<dyn PreferenceStorage>,
        root: Option<ElementRef>,
        options: &GalleryOptions,
    ) -> Option<Self>
    where
        H: MotionHost + PreferenceHost + 'static,
    {
        let Some(root) = root else {
            log::error!("Gallery container not found");
            return None;
        };

        let preferences = PreferenceStore::new(host.clone(), storage);
        let mut motion = MotionCoordinator::with_layout(host, &options.layout);
        if preferences.reduced_motion() != motion.prefers_reduced_motion() {
            motion.handle_reduced_motion_change(preferences.reduced_motion());
        }

        let mut gallery = Gallery::with_builtin_modules(root, options);
        gallery.render(&mut motion);

        Some(Self {
            motion,
            preferences,
            gallery,
            torn_down: false,
        })
    }

    /// Route a host notification. Media query changes go through the
    /// preference store so a user override also governs animations.
    pub fn dispatch(&mut self, event: &HostEvent) {
        if self.torn_down {
            return;
        }
        match event {
            HostEvent::ReducedMotionChange { matches } => {
                self.preferences
                    .handle_media_change(MediaQuery::PrefersReducedMotion, *matches);
                self.sync_motion();
            }
            HostEvent::ColorSchemeChange { dark } => {
                self.preferences
                    .handle_media_change(MediaQuery::PrefersDarkScheme, *dark);
            }
            HostEvent::PageHide => self.teardown(),
            _ => self.motion.dispatch(event),
        }
    }

    /// Run one animation frame. Returns how many loop updates ran.
    pub fn tick(&self) -> usize {
        self.motion.tick()
    }

    /// Flip the theme as a user choice.
    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.preferences.toggle_theme();
        log::info!("theme: {}", theme.as_str());
        theme
    }

    /// Flip the motion preference as a user choice and apply it to every
    /// module.
    pub fn toggle_motion(&mut self) -> MotionPreference {
        let motion = self.preferences.toggle_motion();
        log::info!("motion: {}", motion.as_str());
        self.sync_motion();
        motion
    }

    /// Drop the user's motion override and follow the system again.
    pub fn use_system_motion(&mut self) {
        self.preferences.use_system_motion();
        self.sync_motion();
    }

    /// Destroy the gallery, detach preference listeners and tear the
    /// coordinator down. Later calls do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.gallery.cleanup(&mut self.motion);
        self.preferences.cleanup();
        self.motion.cleanup();
        self.torn_down = true;
        log::info!("app torn down");
    }

    /// The motion coordinator.
    #[must_use]
    pub fn motion(&self) -> &MotionCoordinator {
        &self.motion
    }

    /// The preference store.
    #[must_use]
    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// Mutable access to the preference store, e.g. to subscribe.
    pub fn preferences_mut(&mut self) -> &mut PreferenceStore {
        &mut self.preferences
    }

    /// The gallery.
    #[must_use]
    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    /// Whether [`teardown`](Self::teardown) has run.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn sync_motion(&mut self) {
        let reduced = self.preferences.reduced_motion();
        if reduced != self.motion.prefers_reduced_motion() {
            self.motion.handle_reduced_motion_change(reduced);
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::headless::{
        HeadlessElement, HeadlessHost, ListenerKey, PlayState,
    };
    use crate::host::Element;
    use crate::motion::PAUSED_CLASS;
    use crate::preferences::{MemoryStorage, DARK_CLASS};

    fn mount(host: &Rc<HeadlessHost>, storage: &MemoryStorage) -> (App, Rc<HeadlessElement>) {
        let root = HeadlessElement::new("main");
        let element: ElementRef = root.clone();
        let app = App::init(
            host.clone(),
            Box::new(storage.clone()),
            Some(element),
            &GalleryOptions::default(),
        )
        .unwrap();
        (app, root)
    }

    fn container(root: &HeadlessElement, id: &str) -> ElementRef {
        root.query_attribute("data-module", id).unwrap()
    }

    #[test]
    fn missing_root_aborts_init() {
        let host = HeadlessHost::new();
        let app = App::init(
            host.clone(),
            Box::new(MemoryStorage::new()),
            None,
            &GalleryOptions::default(),
        );
        assert!(app.is_none());
        assert!(host.active_listeners().is_empty());
    }

    #[test]
    fn init_mounts_every_module_paused() {
        let host = HeadlessHost::new();
        let (app, root) = mount(&host, &MemoryStorage::new());

        assert_eq!(root.child_count(), 10);
        assert_eq!(app.gallery().active_count(), 10);
        assert_eq!(app.motion().module_count(), 10);
        assert!(root
            .children()
            .iter()
            .all(|c| c.has_class(PAUSED_CLASS)));
        assert_eq!(app.tick(), 0);
    }

    #[test]
    fn scrolling_into_view_runs_the_particle_loop() {
        let host = HeadlessHost::new();
        let (mut app, root) = mount(&host, &MemoryStorage::new());
        let particles = container(&root, "particle-field");

        app.dispatch(&HostEvent::Intersection {
            element: Rc::clone(&particles),
            intersecting: true,
        });
        assert!(!particles.has_class(PAUSED_CLASS));
        assert_eq!(app.tick(), 1);

        app.dispatch(&HostEvent::VisibilityChange { hidden: true });
        assert_eq!(app.tick(), 0);
    }

    #[test]
    fn user_motion_override_beats_the_system_signal() {
        let host = HeadlessHost::new();
        let storage = MemoryStorage::new();
        let (mut app, root) = mount(&host, &storage);
        let stroke = container(&root, "svg-stroke");
        app.dispatch(&HostEvent::Intersection {
            element: Rc::clone(&stroke),
            intersecting: true,
        });
        assert_eq!(host.animations()[0].state(), PlayState::Running);

        assert!(app.toggle_motion().is_reduced());
        assert!(app.motion().prefers_reduced_motion());
        assert_eq!(host.animations()[0].state(), PlayState::Paused);
        assert_eq!(storage.get("motion").as_deref(), Some("reduced"));

        // System says motion is fine, but the user said otherwise.
        app.dispatch(&HostEvent::ReducedMotionChange { matches: false });
        assert!(app.motion().prefers_reduced_motion());
        assert!(stroke.has_class(PAUSED_CLASS));

        app.use_system_motion();
        assert!(!app.motion().prefers_reduced_motion());
        assert_eq!(host.animations()[0].state(), PlayState::Running);
    }

    #[test]
    fn one_system_motion_change_notifies_subscribers_once() {
        let host = HeadlessHost::new();
        let (mut app, _root) = mount(&host, &MemoryStorage::new());
        let calls = Rc::new(std::cell::Cell::new(0));
        let counter = Rc::clone(&calls);
        let _ = app
            .preferences_mut()
            .on_motion_change(move |_| counter.set(counter.get() + 1));

        // The coordinator and the store both listen to the media query, so
        // a browser reports one change once per listener.
        let listeners = host
            .active_listeners()
            .into_iter()
            .filter(|k| match k {
                ListenerKey::Media(q) => *q == MediaQuery::PrefersReducedMotion.query(),
                ListenerKey::Global(name) => name == "ReducedMotionChange",
                ListenerKey::Resize(_) => false,
            })
            .count();
        assert_eq!(listeners, 2);
        for _ in 0..listeners {
            app.dispatch(&HostEvent::ReducedMotionChange { matches: true });
        }

        assert_eq!(calls.get(), 1);
        assert!(app.motion().prefers_reduced_motion());
    }

    #[test]
    fn persisted_reduced_motion_applies_at_startup() {
        let host = HeadlessHost::new();
        let storage = MemoryStorage::with_entries([
            ("motion-mode", "user"),
            ("motion", "reduced"),
        ]);
        let (app, _root) = mount(&host, &storage);

        assert!(app.motion().prefers_reduced_motion());
        assert_eq!(host.animations()[0].state(), PlayState::Paused);
    }

    #[test]
    fn theme_follows_system_until_toggled() {
        let host = HeadlessHost::new();
        let (mut app, _root) = mount(&host, &MemoryStorage::new());

        app.dispatch(&HostEvent::ColorSchemeChange { dark: true });
        assert!(host.root_has_class(DARK_CLASS));
        assert_eq!(app.toggle_theme(), Theme::Light);
        app.dispatch(&HostEvent::ColorSchemeChange { dark: true });
        assert!(!host.root_has_class(DARK_CLASS));
    }

    #[test]
    fn page_hide_tears_everything_down_once() {
        let host = HeadlessHost::new();
        let (mut app, root) = mount(&host, &MemoryStorage::new());
        let particles = container(&root, "particle-field");

        app.dispatch(&HostEvent::PageHide);
        assert!(app.is_torn_down());
        assert_eq!(app.gallery().active_count(), 0);
        assert!(app.motion().is_torn_down());
        assert!(app.preferences().is_cleaned_up());
        assert!(host.active_listeners().is_empty());
        assert!(host.observed_elements().is_empty());
        assert_eq!(host.animations()[0].state(), PlayState::Cancelled);

        app.teardown();
        app.dispatch(&HostEvent::Intersection {
            element: particles,
            intersecting: true,
        });
        assert_eq!(app.tick(), 0);
    }
}
