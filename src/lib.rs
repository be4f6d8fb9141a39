// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
// Test code may unwrap freely
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Motion effects gallery with a viewport-aware animation lifecycle.
//!
//! A grid of self-contained visual modules, each of which only animates
//! while it is on screen, the document is visible and the user has not
//! asked for reduced motion. Theme and motion preferences persist across
//! sessions with user > system > default precedence.
//!
//! # Key entry points
//!
//! - [`motion::MotionCoordinator`] - owns every animation handle and
//!   observer and decides, per module, whether it plays
//! - [`gallery::Gallery`] - mounts [`gallery::MotionModule`]s into the grid
//! - [`preferences::PreferenceStore`] - theme and reduced-motion preferences
//! - [`app::App`] - wires one of each together with an init/teardown
//!   lifecycle
//! - [`options::GalleryOptions`] - TOML configuration
//!
//! # Architecture
//!
//! Nothing here talks to a browser directly. Elements, observers and
//! listeners sit behind the traits in [`host`]; the host delivers
//! notifications back as [`host::HostEvent`] values and drives frames by
//! calling [`app::App::tick`]. [`host::headless`] implements the seam in
//! memory for tests and the demo binary; `host::web` (feature `web`) is the
//! browser implementation.

pub mod app;
pub mod error;
pub mod gallery;
pub mod host;
pub mod motion;
pub mod options;
pub mod preferences;
