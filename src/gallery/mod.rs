//! The gallery: a fixed set of visual modules mounted into a grid.
//!
//! Each module implements [`MotionModule`]. The gallery creates one
//! container per module inside the root layout element, calls the module's
//! `init`, and registers the container with the [`MotionCoordinator`] so
//! the module pauses whenever it scrolls out of view.

pub mod modules;

use std::fmt;

use serde::Serialize;

use crate::host::{Element, ElementRef};
use crate::motion::MotionCoordinator;
use crate::options::{GalleryOptions, LayoutOptions};

/// Static metadata describing a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    /// Unique identifier, also written to the container's module attribute.
    pub id: &'static str,
    /// Display title.
    pub title: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Grouping shown next to the title.
    pub category: &'static str,
}

/// Optional lifecycle hooks a module provides. The gallery only calls a
/// hook whose flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Module implements [`MotionModule::pause`].
    pub pause: bool,
    /// Module implements [`MotionModule::play`].
    pub play: bool,
    /// Module implements [`MotionModule::destroy`].
    pub destroy: bool,
}

impl Capabilities {
    /// Every optional hook.
    pub const ALL: Self = Self {
        pause: true,
        play: true,
        destroy: true,
    };
}

/// Lifecycle contract of a visual module.
///
/// Modules never start or stop animations themselves: everything that
/// moves goes through handles registered with the coordinator, so the
/// global rules (reduced motion, document visibility) stay authoritative.
pub trait MotionModule {
    /// Module metadata.
    fn descriptor(&self) -> &ModuleDescriptor;

    /// Which optional hooks this module implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Build the module's content inside `container` and register any
    /// animation handles or observers.
    fn init(&mut self, container: &ElementRef, motion: &mut MotionCoordinator);

    /// Pause the module's animations.
    fn pause(&mut self, _motion: &MotionCoordinator) {}

    /// Resume the module's animations.
    fn play(&mut self, _motion: &MotionCoordinator) {}

    /// Release module-owned resources.
    fn destroy(&mut self, _motion: &mut MotionCoordinator) {}
}

/// Registry and mount point of the gallery's modules.
pub struct Gallery {
    root: ElementRef,
    layout: LayoutOptions,
    /// Registration order.
    modules: Vec<Box<dyn MotionModule>>,
    /// Mounted module ids, in mount order.
    active: Vec<String>,
}

impl Gallery {
    /// Empty gallery rendering into `root`.
    pub fn new(root: ElementRef, layout: LayoutOptions) -> Self {
        Self {
            root,
            layout,
            modules: Vec::new(),
            active: Vec::new(),
        }
    }

    /// Gallery with the built-in module catalog registered.
    pub fn with_builtin_modules(
        root: ElementRef,
        options: &GalleryOptions,
    ) -> Self {
        let mut gallery = Self::new(root, options.layout.clone());
        for module in modules::builtin_modules(options) {
            gallery.register_module(module);
        }
        gallery
    }

    /// Register a module. A module with the same id replaces the earlier
    /// one, keeping its position.
    pub fn register_module(&mut self, module: Box<dyn MotionModule>) {
        let id = module.descriptor().id;
        match self.position(id) {
            Some(index) => {
                log::debug!("module {id} re-registered, replacing");
                self.modules[index] = module;
            }
            None => self.modules.push(module),
        }
    }

    /// Clear the root, lay out one container per module and mount every
    /// module.
    pub fn render(&mut self, motion: &mut MotionCoordinator) {
        self.root.clear_children();
        self.root.set_class(&self.layout.gallery_class, true);

        let ids: Vec<&'static str> =
            self.modules.iter().map(|m| m.descriptor().id).collect();
        for id in ids {
            let container = motion.host().create_element("div");
            container.set_class(&self.layout.container_class, true);
            container.set_attribute(&self.layout.module_attribute, id);
            self.root.append_child(&container);
            self.render_module(id, motion);
        }
        log::info!("gallery rendered {} modules", self.active.len());
    }

    /// Mount one module into its container and start observing it.
    ///
    /// An unknown id or a missing container is logged and skipped.
    pub fn render_module(&mut self, module_id: &str, motion: &mut MotionCoordinator) {
        let Some(index) = self.position(module_id) else {
            log::warn!("no module registered as {module_id}");
            return;
        };
        let Some(container) = self
            .root
            .query_attribute(&self.layout.module_attribute, module_id)
        else {
            log::warn!("no container for module {module_id}");
            return;
        };

        self.modules[index].init(&container, motion);
        motion.observe_for_pausing(&container, module_id);
        if !self.is_active(module_id) {
            self.active.push(module_id.to_owned());
        }
        log::debug!("mounted {module_id}");
    }

    /// Destroy one module: its own `destroy` hook first, then the
    /// coordinator's cleanup for its id. Unknown ids only reach the
    /// coordinator, which ignores them.
    pub fn destroy_module(&mut self, module_id: &str, motion: &mut MotionCoordinator) {
        if let Some(index) = self.position(module_id) {
            let module = &mut self.modules[index];
            if module.capabilities().destroy {
                module.destroy(motion);
            }
        }
        motion.cleanup_module(module_id);
        self.active.retain(|id| id != module_id);
    }

    /// Pause one module through its own hook, or through the coordinator
    /// when it has none.
    pub fn pause_module(&mut self, module_id: &str, motion: &MotionCoordinator) {
        match self.position(module_id) {
            Some(index) if self.modules[index].capabilities().pause => {
                self.modules[index].pause(motion);
            }
            _ => motion.pause_all(Some(module_id)),
        }
    }

    /// Resume one module through its own hook, or through the coordinator
    /// when it has none.
    pub fn play_module(&mut self, module_id: &str, motion: &MotionCoordinator) {
        match self.position(module_id) {
            Some(index) if self.modules[index].capabilities().play => {
                self.modules[index].play(motion);
            }
            _ => motion.play_all(Some(module_id)),
        }
    }

    /// Destroy every mounted module.
    pub fn cleanup(&mut self, motion: &mut MotionCoordinator) {
        for id in std::mem::take(&mut self.active) {
            self.destroy_module(&id, motion);
        }
    }

    /// Registered module descriptors, in registration order.
    #[must_use]
    pub fn modules(&self) -> Vec<&ModuleDescriptor> {
        self.modules.iter().map(|m| m.descriptor()).collect()
    }

    /// Descriptor of one registered module.
    #[must_use]
    pub fn module(&self, module_id: &str) -> Option<&ModuleDescriptor> {
        self.position(module_id)
            .map(|index| self.modules[index].descriptor())
    }

    /// Whether `module_id` is currently mounted.
    #[must_use]
    pub fn is_active(&self, module_id: &str) -> bool {
        self.active.iter().any(|id| id == module_id)
    }

    /// Number of mounted modules.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Root layout element.
    #[must_use]
    pub fn root(&self) -> &ElementRef {
        &self.root
    }

    fn position(&self, module_id: &str) -> Option<usize> {
        self.modules
            .iter()
            .position(|m| m.descriptor().id == module_id)
    }
}

impl fmt::Debug for Gallery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gallery")
            .field(
                "modules",
                &self.modules.iter().map(|m| m.descriptor().id).collect::<Vec<_>>(),
            )
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
