//! Persisted display preferences: color theme and reduced motion.
//!
//! Each axis resolves its value with three-tier precedence: an explicit
//! user choice (persisted) beats the live system media query, which beats
//! the built-in default. An axis starts in [`PreferenceMode::System`];
//! toggling or setting it switches to [`PreferenceMode::User`] and persists
//! both mode and value. In system mode media query changes update the value
//! and notify subscribers without writing anything.
//!
//! Persistence layout (key → value): `theme-mode ∈ {system,user}`,
//! `theme ∈ {light,dark}`, `motion-mode ∈ {system,user}`,
//! `motion ∈ {reduced,normal}`. A missing key means system mode.

mod axis;
mod storage;

use std::fmt;
use std::rc::Rc;

pub use axis::AxisValue;
use axis::PreferenceAxis;
use serde::{Deserialize, Serialize};
pub use storage::{MemoryStorage, PreferenceStorage, TomlFileStorage};

use crate::host::{MediaQuery, PreferenceHost};

/// Root class applied while the dark theme is active.
pub const DARK_CLASS: &str = "dark";

/// Root class applied while reduced motion is active.
pub const MOTION_DISABLED_CLASS: &str = "motion-disabled";

/// Where an axis takes its value from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceMode {
    /// Follow the live system media query.
    #[default]
    System,
    /// Keep the user's explicit choice.
    User,
}

impl PreferenceMode {
    /// Persisted representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }

    /// Parse a persisted representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

/// Color theme.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme (built-in default).
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

impl AxisValue for Theme {
    const KEY: &'static str = "theme";
    const MODE_KEY: &'static str = "theme-mode";
    const QUERY: MediaQuery = MediaQuery::PrefersDarkScheme;

    fn from_media(matches: bool) -> Self {
        if matches {
            Self::Dark
        } else {
            Self::Light
        }
    }

    fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

/// Motion preference.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MotionPreference {
    /// Full motion (built-in default).
    #[default]
    Normal,
    /// Suppress non-essential animation.
    Reduced,
}

impl MotionPreference {
    /// Whether motion should be reduced.
    #[must_use]
    pub fn is_reduced(self) -> bool {
        self == Self::Reduced
    }
}

impl AxisValue for MotionPreference {
    const KEY: &'static str = "motion";
    const MODE_KEY: &'static str = "motion-mode";
    const QUERY: MediaQuery = MediaQuery::PrefersReducedMotion;

    fn from_media(matches: bool) -> Self {
        if matches {
            Self::Reduced
        } else {
            Self::Normal
        }
    }

    fn toggled(self) -> Self {
        match self {
            Self::Normal => Self::Reduced,
            Self::Reduced => Self::Normal,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Reduced => "reduced",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(Self::Normal),
            "reduced" => Some(Self::Reduced),
            _ => None,
        }
    }
}

/// Token returned by the `on_*_change` methods, for
/// [`PreferenceStore::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Theme and motion preferences of one runtime context.
pub struct PreferenceStore {
    host: Rc<dyn PreferenceHost>,
    storage: Box<dyn PreferenceStorage>,
    theme: PreferenceAxis<Theme>,
    motion: PreferenceAxis<MotionPreference>,
    next_subscriber: u64,
    cleaned_up: bool,
}

impl PreferenceStore {
    /// Load both axes from `storage` and the host's media queries, apply
    /// the root classes and start listening for media changes.
    pub fn new(
        host: Rc<dyn PreferenceHost>,
        storage: Box<dyn PreferenceStorage>,
    ) -> Self {
        let theme = PreferenceAxis::load(host.as_ref(), storage.as_ref());
        let motion = PreferenceAxis::load(host.as_ref(), storage.as_ref());
        let store = Self {
            host,
            storage,
            theme,
            motion,
            next_subscriber: 0,
            cleaned_up: false,
        };
        store.apply_theme();
        store.apply_motion();
        log::debug!(
            "preferences: theme={:?} ({:?}), motion={:?} ({:?})",
            store.theme(),
            store.theme_mode(),
            store.motion(),
            store.motion_mode()
        );
        store
    }

    // ── Theme ────────────────────────────────────────────────────────────

    /// Current theme.
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme.value()
    }

    /// Where the theme comes from.
    #[must_use]
    pub fn theme_mode(&self) -> PreferenceMode {
        self.theme.mode()
    }

    /// Flip the theme as a user choice. Returns the new theme.
    pub fn toggle_theme(&mut self) -> Theme {
        self.set_theme(self.theme().toggled());
        self.theme()
    }

    /// Set the theme as a user choice.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme.set_user(theme, self.storage.as_mut());
        self.apply_theme();
    }

    /// Return the theme to system mode and follow the media query again.
    pub fn use_system_theme(&mut self) {
        self.theme.use_system(self.host.as_ref(), self.storage.as_mut());
        self.apply_theme();
    }

    /// Call `callback` with the new theme on every change.
    pub fn on_theme_change(
        &mut self,
        callback: impl FnMut(Theme) + 'static,
    ) -> SubscriberId {
        let id = self.next_id();
        self.theme.subscribe(id, Box::new(callback));
        id
    }

    // ── Motion ───────────────────────────────────────────────────────────

    /// Current motion preference.
    #[must_use]
    pub fn motion(&self) -> MotionPreference {
        self.motion.value()
    }

    /// Whether motion is currently reduced.
    #[must_use]
    pub fn reduced_motion(&self) -> bool {
        self.motion().is_reduced()
    }

    /// Where the motion preference comes from.
    #[must_use]
    pub fn motion_mode(&self) -> PreferenceMode {
        self.motion.mode()
    }

    /// Flip the motion preference as a user choice. Returns the new value.
    pub fn toggle_motion(&mut self) -> MotionPreference {
        self.set_motion(self.motion().toggled());
        self.motion()
    }

    /// Set the motion preference as a user choice.
    pub fn set_motion(&mut self, motion: MotionPreference) {
        self.motion.set_user(motion, self.storage.as_mut());
        self.apply_motion();
    }

    /// Return motion to system mode and follow the media query again.
    pub fn use_system_motion(&mut self) {
        self.motion.use_system(self.host.as_ref(), self.storage.as_mut());
        self.apply_motion();
    }

    /// Call `callback` with the new preference on every change.
    pub fn on_motion_change(
        &mut self,
        callback: impl FnMut(MotionPreference) + 'static,
    ) -> SubscriberId {
        let id = self.next_id();
        self.motion.subscribe(id, Box::new(callback));
        id
    }

    // ── Shared ───────────────────────────────────────────────────────────

    /// Remove a theme or motion subscriber. Returns whether one was found.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.theme.unsubscribe(id) || self.motion.unsubscribe(id)
    }

    /// Number of live subscribers across both axes.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.theme.subscriber_count() + self.motion.subscriber_count()
    }

    /// A media query changed. Ignored by axes in user mode and after
    /// cleanup.
    pub fn handle_media_change(&mut self, query: MediaQuery, matches: bool) {
        if self.cleaned_up {
            return;
        }
        match query {
            MediaQuery::PrefersDarkScheme => {
                if self.theme.media_changed(matches) {
                    self.apply_theme();
                }
            }
            MediaQuery::PrefersReducedMotion => {
                if self.motion.media_changed(matches) {
                    self.apply_motion();
                }
            }
        }
    }

    /// Detach media listeners and forget subscribers. Later calls do
    /// nothing.
    pub fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.theme.detach();
        self.motion.detach();
        self.cleaned_up = true;
    }

    /// Whether [`cleanup`](Self::cleanup) has run.
    #[must_use]
    pub fn is_cleaned_up(&self) -> bool {
        self.cleaned_up
    }

    fn next_id(&mut self) -> SubscriberId {
        self.next_subscriber += 1;
        SubscriberId(self.next_subscriber)
    }

    fn apply_theme(&self) {
        self.host
            .set_root_class(DARK_CLASS, self.theme() == Theme::Dark);
    }

    fn apply_motion(&self) {
        self.host
            .set_root_class(MOTION_DISABLED_CLASS, self.reduced_motion());
    }
}

impl fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("theme", &self.theme())
            .field("theme_mode", &self.theme_mode())
            .field("motion", &self.motion())
            .field("motion_mode", &self.motion_mode())
            .field("subscribers", &self.subscriber_count())
            .field("cleaned_up", &self.cleaned_up)
            .finish_non_exhaustive()
    }
}
