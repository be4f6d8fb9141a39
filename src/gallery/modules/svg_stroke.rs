//! A circle path drawn by animating its dash offset.

use crate::gallery::{Capabilities, ModuleDescriptor, MotionModule};
use crate::host::{AnimationOptions, Element, ElementRef, Keyframes};
use crate::motion::MotionCoordinator;

const ID: &str = "svg-stroke";
const PATH_ROLE: &str = "stroke-path";
const DASH_LENGTH: &str = "300";

/// Vector path drawing with a repeating declarative animation.
pub struct SvgStroke {
    descriptor: ModuleDescriptor,
}

impl SvgStroke {
    /// Create the module.
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: ModuleDescriptor {
                id: ID,
                title: "SVG Stroke Animation",
                description: "Vector path drawing with dasharray animation",
                category: "Vector",
            },
        }
    }

    fn markup() -> String {
        format!(
            r#"<div class="p-8 h-full flex items-center justify-center"><svg class="w-48 h-48" viewBox="0 0 100 100"><path data-role="{PATH_ROLE}" class="stroke-accent dark:stroke-accent-dark stroke-[0.5] fill-none" d="M50,10 C70,10 90,30 90,50 C90,70 70,90 50,90 C30,90 10,70 10,50 C10,30 30,10 50,10 Z" stroke-dasharray="{DASH_LENGTH}" stroke-dashoffset="{DASH_LENGTH}"/></svg></div>"#
        )
    }
}

impl Default for SvgStroke {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionModule for SvgStroke {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn init(&mut self, container: &ElementRef, motion: &mut MotionCoordinator) {
        container.set_content(&Self::markup());
        let Some(path) = container.query_attribute("data-role", PATH_ROLE) else {
            log::warn!("{ID}: stroke path missing from markup");
            return;
        };
        let _ = motion.create_declarative_handle(
            ID,
            &path,
            &Keyframes::between("stroke-dashoffset", DASH_LENGTH, "0"),
            &AnimationOptions {
                duration_ms: 2000.0,
                easing: "ease-in-out".to_owned(),
                ..AnimationOptions::default()
            },
        );
    }

    fn pause(&mut self, motion: &MotionCoordinator) {
        motion.pause_all(Some(ID));
    }

    fn play(&mut self, motion: &MotionCoordinator) {
        motion.play_all(Some(ID));
    }

    fn destroy(&mut self, motion: &mut MotionCoordinator) {
        motion.cleanup_module(ID);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::headless::{HeadlessElement, HeadlessHost, PlayState};
    use crate::host::same_element;

    #[test]
    fn init_animates_the_stroke_path_forever() {
        let host = HeadlessHost::new();
        let mut motion = MotionCoordinator::new(host.clone());
        let container: ElementRef = HeadlessElement::new("div");
        let mut module = SvgStroke::new();

        module.init(&container, &mut motion);

        let records = host.animations();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.options.duration_ms, 2000.0);
        assert_eq!(record.options.easing, "ease-in-out");
        assert_eq!(record.options.iterations, None);
        assert_eq!(
            record.keyframes,
            Keyframes::between("stroke-dashoffset", "300", "0")
        );
        let path = container.query_attribute("data-role", PATH_ROLE).unwrap();
        assert!(same_element(&record.element, &path));
        assert_eq!(motion.handle_count(ID), 1);
    }

    #[test]
    fn hooks_route_through_the_coordinator() {
        let host = HeadlessHost::new();
        let mut motion = MotionCoordinator::new(host.clone());
        let container: ElementRef = HeadlessElement::new("div");
        let mut module = SvgStroke::new();
        module.init(&container, &mut motion);

        module.pause(&motion);
        assert_eq!(host.animations()[0].state(), PlayState::Paused);
        module.play(&motion);
        assert_eq!(host.animations()[0].state(), PlayState::Running);
        module.destroy(&mut motion);
        assert_eq!(host.animations()[0].state(), PlayState::Cancelled);
        assert_eq!(motion.handle_count(ID), 0);
    }
}
