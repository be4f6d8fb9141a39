//! Brownian particles bouncing inside their container.
//!
//! Simulation state lives in [`Field`], which knows nothing about elements:
//! the per-frame loop steps it against the area's current size and then
//! writes one `transform` per particle element.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use rand::Rng;

use crate::gallery::{Capabilities, ModuleDescriptor, MotionModule};
use crate::host::{Element, ElementRef};
use crate::motion::MotionCoordinator;
use crate::options::ParticleOptions;

const ID: &str = "particle-field";
const AREA_ID: &str = "particle-container";
const AREA_CLASS: &str = "p-4 h-full w-full relative overflow-hidden";
const PARTICLE_CLASS: &str = "absolute w-1 h-1 bg-accent dark:bg-accent-dark \
                              rounded-full will-change-transform opacity-60";

/// Scatter extent used before the first size report, in pixels.
const INITIAL_EXTENT: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Particle {
    position: Vec2,
    velocity: Vec2,
}

impl Particle {
    fn transform(&self) -> String {
        format!("translate({}px, {}px)", self.position.x, self.position.y)
    }
}

/// Particle positions and velocities.
#[derive(Debug, Clone, PartialEq)]
struct Field {
    particles: Vec<Particle>,
}

impl Field {
    /// `count` particles at random positions with per-axis velocity in
    /// `[-max_speed, max_speed)`.
    fn new(count: usize, max_speed: f32, rng: &mut impl Rng) -> Self {
        let extent = Vec2::splat(INITIAL_EXTENT);
        let particles = (0..count)
            .map(|_| Particle {
                position: random_point(extent, rng),
                velocity: Vec2::new(
                    rng.random::<f32>() * 2.0 - 1.0,
                    rng.random::<f32>() * 2.0 - 1.0,
                ) * max_speed,
            })
            .collect();
        Self { particles }
    }

    /// Advance every particle by its velocity. A particle that ends up
    /// outside `bounds` on an axis reverses its velocity on that axis.
    fn step(&mut self, bounds: Vec2) {
        for p in &mut self.particles {
            p.position += p.velocity;
            if p.position.x < 0.0 || p.position.x > bounds.x {
                p.velocity.x = -p.velocity.x;
            }
            if p.position.y < 0.0 || p.position.y > bounds.y {
                p.velocity.y = -p.velocity.y;
            }
        }
    }

    /// Move every particle to a random point inside `bounds`. Velocities
    /// are kept.
    fn scatter(&mut self, bounds: Vec2, rng: &mut impl Rng) {
        for p in &mut self.particles {
            p.position = random_point(bounds, rng);
        }
    }
}

fn random_point(bounds: Vec2, rng: &mut impl Rng) -> Vec2 {
    Vec2::new(rng.random::<f32>(), rng.random::<f32>()) * bounds
}

/// Particle physics field driven by a per-frame loop handle.
pub struct ParticleField {
    descriptor: ModuleDescriptor,
    options: ParticleOptions,
    field: Option<Rc<RefCell<Field>>>,
}

impl ParticleField {
    /// Create the module.
    #[must_use]
    pub fn new(options: ParticleOptions) -> Self {
        Self {
            descriptor: ModuleDescriptor {
                id: ID,
                title: "Particle Physics Field",
                description: "Brownian motion simulation with velocity vectors",
                category: "Physics",
            },
            options,
            field: None,
        }
    }

    /// Current particle positions. Empty before `init` and after
    /// `destroy`.
    #[must_use]
    pub fn positions(&self) -> Vec<Vec2> {
        self.field.as_ref().map_or_else(Vec::new, |field| {
            field.borrow().particles.iter().map(|p| p.position).collect()
        })
    }
}

impl MotionModule for ParticleField {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn init(&mut self, container: &ElementRef, motion: &mut MotionCoordinator) {
        let host = Rc::clone(motion.host());
        container.clear_children();
        let area = host.create_element("div");
        area.set_attribute("id", AREA_ID);
        area.set_class(AREA_CLASS, true);
        container.append_child(&area);

        let dots: Vec<ElementRef> = (0..self.options.count)
            .map(|_| {
                let dot = host.create_element("div");
                dot.set_class(PARTICLE_CLASS, true);
                area.append_child(&dot);
                dot
            })
            .collect();

        let field = Rc::new(RefCell::new(Field::new(
            self.options.count,
            self.options.max_speed,
            &mut rand::rng(),
        )));

        let frame_field = Rc::clone(&field);
        let frame_area = Rc::clone(&area);
        let _ = motion.create_loop_handle(
            ID,
            move || {
                let size = frame_area.size();
                let mut field = frame_field.borrow_mut();
                field.step(Vec2::new(size.width, size.height));
                for (particle, dot) in field.particles.iter().zip(&dots) {
                    dot.set_style("transform", &particle.transform());
                }
            },
            true,
        );

        let resize_field = Rc::clone(&field);
        motion.register_resize_observer(&area, ID, move |size| {
            resize_field
                .borrow_mut()
                .scatter(Vec2::new(size.width, size.height), &mut rand::rng());
        });

        log::debug!("{ID}: {} particles", self.options.count);
        self.field = Some(field);
    }

    fn pause(&mut self, motion: &MotionCoordinator) {
        motion.pause_all(Some(ID));
    }

    fn play(&mut self, motion: &MotionCoordinator) {
        motion.play_all(Some(ID));
    }

    fn destroy(&mut self, motion: &mut MotionCoordinator) {
        motion.cleanup_module(ID);
        self.field = None;
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::host::headless::{HeadlessElement, HeadlessHost};
    use crate::host::Size;

    fn headless(el: &ElementRef) -> &HeadlessElement {
        el.as_any().downcast_ref::<HeadlessElement>().unwrap()
    }

    #[test]
    fn velocities_stay_within_max_speed() {
        let mut rng = StdRng::seed_from_u64(7);
        let field = Field::new(200, 1.5, &mut rng);
        assert_eq!(field.particles.len(), 200);
        for p in &field.particles {
            assert!(p.velocity.abs().max_element() <= 1.5);
            assert!(p.position.min_element() >= 0.0);
            assert!(p.position.max_element() <= INITIAL_EXTENT);
        }
    }

    #[test]
    fn particles_bounce_off_the_bounds() {
        let mut field = Field {
            particles: vec![
                Particle {
                    position: Vec2::new(0.5, 50.0),
                    velocity: Vec2::new(-1.0, 0.0),
                },
                Particle {
                    position: Vec2::new(50.0, 99.5),
                    velocity: Vec2::new(0.0, 1.0),
                },
            ],
        };
        field.step(Vec2::new(100.0, 100.0));
        assert_eq!(field.particles[0].velocity, Vec2::new(1.0, 0.0));
        assert_eq!(field.particles[1].velocity, Vec2::new(0.0, -1.0));

        field.step(Vec2::new(100.0, 100.0));
        assert_eq!(field.particles[0].position, Vec2::new(0.5, 50.0));
        assert_eq!(field.particles[1].position, Vec2::new(50.0, 99.5));
    }

    #[test]
    fn scatter_lands_inside_new_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut field = Field::new(50, 1.0, &mut rng);
        let velocities: Vec<Vec2> =
            field.particles.iter().map(|p| p.velocity).collect();

        field.scatter(Vec2::new(20.0, 10.0), &mut rng);
        for (p, v) in field.particles.iter().zip(velocities) {
            assert!(p.position.x <= 20.0 && p.position.y <= 10.0);
            assert_eq!(p.velocity, v);
        }
    }

    #[test]
    fn init_builds_particles_and_registers_motion() {
        let host = HeadlessHost::new();
        let mut motion = MotionCoordinator::new(host);
        let container: ElementRef = HeadlessElement::new("div");
        let mut module = ParticleField::new(ParticleOptions::default());

        module.init(&container, &mut motion);

        let area = headless(&container).children().remove(0);
        assert_eq!(area.attribute("id").as_deref(), Some(AREA_ID));
        assert_eq!(headless(&area).child_count(), 30);
        assert_eq!(motion.handle_count(ID), 1);
        assert!(motion.has_resize_observer(ID));
        assert!(motion.handles(ID)[0].is_running());
        // The immediate resize callback scattered into the 0×0 area.
        assert!(module.positions().iter().all(|p| *p == Vec2::ZERO));
    }

    #[test]
    fn frames_move_dots_and_resize_rescatters() {
        let host = HeadlessHost::new();
        let mut motion = MotionCoordinator::new(host);
        let container: ElementRef = HeadlessElement::new("div");
        let mut module = ParticleField::new(ParticleOptions {
            count: 5,
            ..ParticleOptions::default()
        });
        module.init(&container, &mut motion);

        assert_eq!(motion.tick(), 1);
        let area = headless(&container).children().remove(0);
        for dot in headless(&area).children() {
            let transform = headless(&dot).style("transform").unwrap();
            assert!(transform.starts_with("translate("));
        }

        motion.handle_resize(ID, Size::new(300.0, 200.0));
        assert!(module
            .positions()
            .iter()
            .all(|p| p.x <= 300.0 && p.y <= 200.0));

        module.destroy(&mut motion);
        assert!(module.positions().is_empty());
        assert_eq!(motion.tick(), 0);
    }
}
