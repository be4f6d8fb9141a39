//! Built-in module catalog.

mod markup;
mod particle_field;
mod svg_stroke;

pub use markup::MarkupModule;
pub use particle_field::ParticleField;
pub use svg_stroke::SvgStroke;

use super::MotionModule;
use crate::options::GalleryOptions;

/// Every built-in module, in display order.
#[must_use]
pub fn builtin_modules(options: &GalleryOptions) -> Vec<Box<dyn MotionModule>> {
    vec![
        Box::new(MarkupModule::kinetic_typography()),
        Box::new(SvgStroke::new()),
        Box::new(MarkupModule::geometric_grid()),
        Box::new(MarkupModule::wave_generator()),
        Box::new(ParticleField::new(options.particles.clone())),
        Box::new(MarkupModule::moire_pattern()),
        Box::new(MarkupModule::neon_grid()),
        Box::new(MarkupModule::binary_rain()),
        Box::new(MarkupModule::radial_loader()),
        Box::new(MarkupModule::infinite_scroll()),
    ]
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashSet;

    use super::*;

    #[test]
    fn catalog_has_ten_unique_modules() {
        let modules = builtin_modules(&GalleryOptions::default());
        let ids: FxHashSet<&str> =
            modules.iter().map(|m| m.descriptor().id).collect();
        assert_eq!(modules.len(), 10);
        assert_eq!(ids.len(), 10);
        assert_eq!(modules[0].descriptor().id, "kinetic-typography");
        assert_eq!(modules[9].descriptor().id, "infinite-scroll");
    }
}
