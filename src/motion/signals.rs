//! The three inputs of the effective play predicate.

/// Snapshot of the signals that decide whether a module animates.
///
/// Built fresh from the coordinator's inputs on every evaluation; never
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaySignals {
    /// The module's container intersects the viewport.
    pub intersecting: bool,
    /// The document is hidden (background tab, minimized window).
    pub document_hidden: bool,
    /// Reduced motion is requested.
    pub reduced_motion: bool,
}

impl PlaySignals {
    /// `intersecting ∧ ¬document_hidden ∧ ¬reduced_motion`
    #[must_use]
    pub fn should_play(self) -> bool {
        self.intersecting && !self.document_hidden && !self.reduced_motion
    }
}
