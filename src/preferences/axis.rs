//! One preference axis with user > system > default precedence.

use std::fmt;

use super::storage::PreferenceStorage;
use super::{PreferenceMode, SubscriberId};
use crate::host::{MediaQuery, PreferenceHost, Subscription};

/// A value one preference axis can hold.
pub trait AxisValue: Copy + PartialEq + fmt::Debug + 'static {
    /// Storage key of the value.
    const KEY: &'static str;
    /// Storage key of the axis mode.
    const MODE_KEY: &'static str;
    /// Media query providing the live system value.
    const QUERY: MediaQuery;

    /// Value implied by the media query's state.
    fn from_media(matches: bool) -> Self;

    /// The other value.
    #[must_use]
    fn toggled(self) -> Self;

    /// Persisted representation.
    fn as_str(self) -> &'static str;

    /// Parse a persisted representation.
    fn parse(value: &str) -> Option<Self>;
}

type Subscriber<T> = (SubscriberId, Box<dyn FnMut(T)>);

pub(crate) struct PreferenceAxis<T: AxisValue> {
    mode: PreferenceMode,
    value: T,
    subscribers: Vec<Subscriber<T>>,
    media: Option<Box<dyn Subscription>>,
}

impl<T: AxisValue> PreferenceAxis<T> {
    /// Resolve the starting value: a persisted user choice wins, otherwise
    /// the live media query. Starts listening to the media query.
    pub(crate) fn load(
        host: &dyn PreferenceHost,
        storage: &dyn PreferenceStorage,
    ) -> Self {
        let mode = match storage.get(T::MODE_KEY) {
            None => PreferenceMode::System,
            Some(raw) => PreferenceMode::parse(&raw).unwrap_or_else(|| {
                log::warn!("ignoring unknown {} {raw:?}", T::MODE_KEY);
                PreferenceMode::System
            }),
        };

        let stored = match (mode, storage.get(T::KEY)) {
            (PreferenceMode::User, Some(raw)) => {
                let parsed = T::parse(&raw);
                if parsed.is_none() {
                    log::warn!("ignoring unknown {} {raw:?}", T::KEY);
                }
                parsed
            }
            _ => None,
        };
        let value = stored
            .unwrap_or_else(|| T::from_media(host.media_matches(T::QUERY)));

        Self {
            mode,
            value,
            subscribers: Vec::new(),
            media: Some(host.listen_media(T::QUERY)),
        }
    }

    pub(crate) fn mode(&self) -> PreferenceMode {
        self.mode
    }

    pub(crate) fn value(&self) -> T {
        self.value
    }

    /// Record an explicit user choice: switch to user mode, persist mode
    /// and value, notify.
    pub(crate) fn set_user(
        &mut self,
        value: T,
        storage: &mut dyn PreferenceStorage,
    ) {
        self.mode = PreferenceMode::User;
        self.value = value;
        persist(storage, T::MODE_KEY, PreferenceMode::User.as_str());
        persist(storage, T::KEY, value.as_str());
        self.notify();
    }

    /// A media query change. Only followed in system mode; never persisted.
    /// A report that leaves the value unchanged is dropped. Returns whether
    /// the value changed.
    pub(crate) fn media_changed(&mut self, matches: bool) -> bool {
        if self.mode != PreferenceMode::System {
            return false;
        }
        let value = T::from_media(matches);
        if value == self.value {
            return false;
        }
        self.value = value;
        self.notify();
        true
    }

    /// Drop the user choice: forget persisted keys and resync to the live
    /// media value. Notifies only when the value changes.
    pub(crate) fn use_system(
        &mut self,
        host: &dyn PreferenceHost,
        storage: &mut dyn PreferenceStorage,
    ) {
        self.mode = PreferenceMode::System;
        for key in [T::MODE_KEY, T::KEY] {
            if let Err(e) = storage.remove(key) {
                log::warn!("failed to clear {key}: {e}");
            }
        }
        let live = T::from_media(host.media_matches(T::QUERY));
        if live != self.value {
            self.value = live;
            self.notify();
        }
    }

    pub(crate) fn subscribe(&mut self, id: SubscriberId, callback: Box<dyn FnMut(T)>) {
        self.subscribers.push((id, callback));
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Stop listening to the media query and forget subscribers.
    pub(crate) fn detach(&mut self) {
        if let Some(mut media) = self.media.take() {
            media.disconnect();
        }
        self.subscribers.clear();
    }

    fn notify(&mut self) {
        let value = self.value;
        for (_, callback) in &mut self.subscribers {
            callback(value);
        }
    }
}

fn persist(storage: &mut dyn PreferenceStorage, key: &str, value: &str) {
    if let Err(e) = storage.set(key, value) {
        log::warn!("failed to persist {key}={value}: {e}");
    }
}
