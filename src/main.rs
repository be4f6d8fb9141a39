//! Headless demo session: mounts the gallery on the in-memory host, scrolls
//! a few modules into view, toggles visibility and motion, then tears down.
//! Everything it does is reported through the log.

use std::path::Path;
use std::rc::Rc;

use motion_gallery::app::App;
use motion_gallery::host::headless::{HeadlessElement, HeadlessHost};
use motion_gallery::host::{Element, ElementRef, HostEvent};
use motion_gallery::options::GalleryOptions;
use motion_gallery::preferences::MemoryStorage;

const FRAMES: usize = 60;

fn load_options() -> GalleryOptions {
    let Some(path) = std::env::args().nth(1) else {
        return GalleryOptions::default();
    };
    match GalleryOptions::load(Path::new(&path)) {
        Ok(options) => {
            log::info!("loaded options from {path}");
            options
        }
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    }
}

fn run_frames(app: &App, label: &str) {
    let updates: usize = (0..FRAMES).map(|_| app.tick()).sum();
    log::info!("{label}: {updates} loop updates over {FRAMES} frames");
}

fn scroll(app: &mut App, root: &HeadlessElement, id: &str, intersecting: bool) {
    let Some(element) = root.query_attribute("data-module", id) else {
        log::warn!("no container for {id}");
        return;
    };
    app.dispatch(&HostEvent::Intersection {
        element,
        intersecting,
    });
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let options = load_options();
    let host = HeadlessHost::new();
    let root = HeadlessElement::new("main");
    let root_ref: ElementRef = root.clone();

    let Some(mut app) = App::init(
        Rc::clone(&host),
        Box::new(MemoryStorage::new()),
        Some(root_ref),
        &options,
    ) else {
        std::process::exit(1);
    };
    for module in app.gallery().modules() {
        log::info!("  {:<20} {} [{}]", module.id, module.title, module.category);
    }
    run_frames(&app, "offscreen");

    for id in ["particle-field", "svg-stroke"] {
        scroll(&mut app, &root, id, true);
    }
    run_frames(&app, "in view");

    app.dispatch(&HostEvent::VisibilityChange { hidden: true });
    run_frames(&app, "document hidden");
    app.dispatch(&HostEvent::VisibilityChange { hidden: false });

    let _ = app.toggle_motion();
    run_frames(&app, "reduced motion");
    let _ = app.toggle_motion();
    run_frames(&app, "motion restored");

    let _ = app.toggle_theme();
    scroll(&mut app, &root, "particle-field", false);
    run_frames(&app, "scrolled away");

    app.dispatch(&HostEvent::PageHide);
    log::info!(
        "{} animations started, {} listeners left",
        host.animations().len(),
        host.active_listeners().len()
    );
}
