//! Modules that are pure markup: their motion is CSS keyframes, frozen by
//! the paused marker class the coordinator toggles on the container.

use rand::Rng;

use crate::gallery::{ModuleDescriptor, MotionModule};
use crate::host::{Element, ElementRef};
use crate::motion::MotionCoordinator;

/// A module whose `init` only writes markup.
pub struct MarkupModule {
    descriptor: ModuleDescriptor,
    markup: fn() -> String,
}

impl MarkupModule {
    /// Staggered letter reveal.
    #[must_use]
    pub fn kinetic_typography() -> Self {
        Self {
            descriptor: ModuleDescriptor {
                id: "kinetic-typography",
                title: "Kinetic Typography",
                description: "Baseline-aligned letter animations with precise timing",
                category: "Typography",
            },
            markup: kinetic_typography,
        }
    }

    /// 8×8 grid of pulsing cells.
    #[must_use]
    pub fn geometric_grid() -> Self {
        Self {
            descriptor: ModuleDescriptor {
                id: "geometric-grid",
                title: "Geometric Grid",
                description: "Procedurally generated grid with cellular automata",
                category: "Grid",
            },
            markup: geometric_grid,
        }
    }

    /// Expanding concentric rings.
    #[must_use]
    pub fn wave_generator() -> Self {
        Self {
            descriptor: ModuleDescriptor {
                id: "wave-generator",
                title: "Wave Generator",
                description: "Sine wave superposition with interference patterns",
                category: "Physics",
            },
            markup: wave_generator,
        }
    }

    /// Counter-rotating concentric rings.
    #[must_use]
    pub fn moire_pattern() -> Self {
        Self {
            descriptor: ModuleDescriptor {
                id: "moire-pattern",
                title: "Moire Pattern",
                description: "Interference patterns from rotating concentric circles",
                category: "Optical",
            },
            markup: moire_pattern,
        }
    }

    /// 6×6 grid of glowing cells.
    #[must_use]
    pub fn neon_grid() -> Self {
        Self {
            descriptor: ModuleDescriptor {
                id: "neon-grid",
                title: "Neon Grid",
                description: "Retro-futuristic grid with glow effects",
                category: "Grid",
            },
            markup: neon_grid,
        }
    }

    /// Columns of falling binary digits.
    #[must_use]
    pub fn binary_rain() -> Self {
        Self {
            descriptor: ModuleDescriptor {
                id: "binary-rain",
                title: "Binary Rain",
                description: "Matrix-style falling binary digits",
                category: "Typography",
            },
            markup: binary_rain,
        }
    }

    /// Three nested spinners with phase offset.
    #[must_use]
    pub fn radial_loader() -> Self {
        Self {
            descriptor: ModuleDescriptor {
                id: "radial-loader",
                title: "Radial Loader",
                description: "Concentric loading indicators with phase offset",
                category: "UI",
            },
            markup: radial_loader,
        }
    }

    /// Endlessly scrolling list.
    #[must_use]
    pub fn infinite_scroll() -> Self {
        Self {
            descriptor: ModuleDescriptor {
                id: "infinite-scroll",
                title: "Infinite Scroll",
                description: "Seamlessly looping content with parallax layers",
                category: "UI",
            },
            markup: infinite_scroll,
        }
    }
}

impl MotionModule for MarkupModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn init(&mut self, container: &ElementRef, _motion: &mut MotionCoordinator) {
        container.set_content(&(self.markup)());
    }
}

// ── Markup ───────────────────────────────────────────────────────────────

fn repeat(count: usize, item: impl FnMut(usize) -> String) -> String {
    (0..count).map(item).collect()
}

fn kinetic_typography() -> String {
    let letters = "SWISS"
        .chars()
        .enumerate()
        .map(|(i, c)| {
            format!(
                r#"<span class="kinetic-letter delay-{}">{c}</span>"#,
                (i + 1) * 50
            )
        })
        .collect::<String>();
    format!(
        r#"<div class="p-8 h-full flex items-center justify-center"><div class="text-center"><div class="text-4xl font-bold tracking-tighter overflow-hidden">{letters}</div><div class="mt-4 text-lg text-gray-600 dark:text-gray-400"><span class="animate-fade-in delay-300">Precision Type</span></div></div></div>"#
    )
}

fn geometric_grid() -> String {
    let cells = repeat(64, |i| {
        format!(r#"<div class="geometric-cell delay-{}"></div>"#, (i % 8) * 50)
    });
    format!(
        r#"<div class="p-4 h-full grid grid-cols-8 grid-rows-8 gap-1">{cells}</div>"#
    )
}

fn wave_generator() -> String {
    let rings = repeat(5, |i| {
        format!(
            r#"<div class="absolute w-32 h-32 border-2 border-accent/30 dark:border-accent-dark/30 rounded-full opacity-20 animate-wave delay-{}"></div>"#,
            i * 100
        )
    });
    format!(
        r#"<div class="p-4 h-full relative overflow-hidden"><div class="absolute inset-0 flex items-center justify-center">{rings}</div></div>"#
    )
}

fn moire_pattern() -> String {
    let rings = repeat(8, |i| {
        let size = (i + 1) * 6;
        let direction = if i % 2 == 0 { "normal" } else { "reverse" };
        format!(
            r#"<div class="moire-ring absolute inset-0 m-auto w-{size} h-{size} animate-spin duration-{} direction-{direction}"></div>"#,
            1000 + i * 200
        )
    });
    format!(
        r#"<div class="p-8 h-full flex items-center justify-center"><div class="relative w-48 h-48">{rings}</div></div>"#
    )
}

fn neon_grid() -> String {
    let cells = repeat(36, |i| {
        format!(
            r#"<div class="neon-cell delay-{} duration-1000"></div>"#,
            (i % 6) * 100
        )
    });
    format!(
        r#"<div class="p-4 h-full grid grid-cols-6 grid-rows-6 gap-2">{cells}</div>"#
    )
}

fn binary_rain() -> String {
    let mut rng = rand::rng();
    let columns = repeat(20, |_| {
        let digits = repeat(30, |_| {
            let duration = rng.random_range(500..1500);
            let digit = if rng.random_bool(0.5) { '1' } else { '0' };
            format!(
                r#"<span class="text-accent dark:text-accent-dark opacity-0 animate-rain duration-{duration}">{digit}</span>"#
            )
        });
        format!(r#"<div class="flex flex-col items-center">{digits}</div>"#)
    });
    format!(
        r#"<div class="p-4 h-full relative overflow-hidden font-mono text-sm"><div class="absolute inset-0 flex justify-around">{columns}</div></div>"#
    )
}

fn radial_loader() -> String {
    let rings = repeat(3, |i| {
        let size = (i + 1) * 20;
        format!(
            r#"<div class="radial-loader absolute inset-0 m-auto w-{size} h-{size} border-t-accent dark:border-t-accent-dark animate-spin duration-{} delay-{}"></div>"#,
            1000 + i * 300,
            i * 100
        )
    });
    format!(
        r#"<div class="p-8 h-full flex items-center justify-center"><div class="relative w-32 h-32">{rings}</div></div>"#
    )
}

fn infinite_scroll() -> String {
    let items = repeat(10, |i| {
        format!(
            r#"<div class="w-48 h-12 bg-accent/10 dark:bg-accent-dark/10 rounded-lg flex items-center justify-center"><span class="text-accent dark:text-accent-dark">Item {}</span></div>"#,
            i + 1
        )
    });
    format!(
        r#"<div class="p-4 h-full relative overflow-hidden"><div class="absolute inset-0 flex flex-col items-center space-y-8 animate-scroll">{items}</div></div>"#
    )
}
