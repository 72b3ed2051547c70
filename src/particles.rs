//! Decorative particle system.
//!
//! Particles are emitted from the mouth contour while the gesture is active,
//! drift upward and fade out at a fixed rate per rendered frame.

use crate::config::ParticleConfig;
use crate::constants::PARTICLE_INITIAL_OPACITY;
use crate::geometry::{map_point, Point, Rect};
use crate::utils::safe_cast::f32_to_i32_clamp;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, Blend};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A single fading dot
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Point,
    /// Displacement per simulation step
    pub velocity: Point,
    /// 255 at birth, dead at or below zero
    pub opacity: i32,
    /// Diameter in pixels
    pub size: f32,
    pub color: [u8; 3],
}

impl Particle {
    /// Apply one simulation step
    pub fn advance(&mut self, decay: i32) {
        self.position.x += self.velocity.x;
        self.position.y += self.velocity.y;
        self.opacity -= decay;
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.opacity <= 0
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped to u8 range
    fn rgba(&self) -> Rgba<u8> {
        let alpha = self.opacity.clamp(0, 255) as u8;
        Rgba([self.color[0], self.color[1], self.color[2], alpha])
    }
}

/// Owns every live particle
pub struct ParticleSystem {
    particles: Vec<Particle>,
    config: ParticleConfig,
    rng: StdRng,
}

impl ParticleSystem {
    /// Create a particle system seeded from system entropy
    #[must_use]
    pub fn new(config: ParticleConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a particle system with a fixed seed
    #[must_use]
    pub fn with_seed(config: ParticleConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: ParticleConfig, rng: StdRng) -> Self {
        Self {
            particles: Vec::new(),
            config,
            rng,
        }
    }

    /// Emit one particle per origin point.
    ///
    /// Origins are in `src` (video) space and are placed on the canvas
    /// through `dst`, then jittered horizontally.
    pub fn emit(&mut self, origins: &[Point], src: &Rect, dst: &Rect) {
        let cfg = &self.config;
        self.particles.reserve(origins.len());

        for origin in origins {
            let mapped = map_point(*origin, src, dst);
            let jitter = self.rng.gen_range(-cfg.jitter..=cfg.jitter);
            let velocity = Point::new(
                self.rng.gen_range(cfg.velocity_x[0]..=cfg.velocity_x[1]),
                self.rng.gen_range(cfg.velocity_y[0]..=cfg.velocity_y[1]),
            );
            let size = self.rng.gen_range(cfg.size[0]..=cfg.size[1]);
            let color = [
                self.rng.gen_range(cfg.color_min..=u8::MAX),
                self.rng.gen_range(cfg.color_min..=u8::MAX),
                self.rng.gen_range(cfg.color_min..=u8::MAX),
            ];

            self.particles.push(Particle {
                position: Point::new(mapped.x + jitter, mapped.y),
                velocity,
                opacity: PARTICLE_INITIAL_OPACITY,
                size,
                color,
            });
        }
    }

    /// Move every particle one step and fade it
    pub fn advance(&mut self) {
        let decay = self.config.decay;
        for particle in &mut self.particles {
            particle.advance(decay);
        }
    }

    /// Draw every live particle as an alpha-blended filled circle
    pub fn render(&self, canvas: &mut RgbaImage) {
        if self.particles.is_empty() {
            return;
        }

        let mut blend = Blend(std::mem::take(canvas));
        for particle in &self.particles {
            let center = (
                f32_to_i32_clamp(particle.position.x, i32::MIN / 2, i32::MAX / 2),
                f32_to_i32_clamp(particle.position.y, i32::MIN / 2, i32::MAX / 2),
            );
            let radius = f32_to_i32_clamp(particle.size / 2.0, 1, i32::MAX / 2);
            draw_filled_circle_mut(&mut blend, center, radius, particle.rgba());
        }
        *canvas = blend.0;
    }

    /// Drop particles whose opacity reached zero. Returns how many were removed.
    pub fn cull(&mut self) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| !p.is_dead());
        before - self.particles.len()
    }

    /// One rendered frame: advance, draw, then drop the dead
    pub fn update_and_render(&mut self, canvas: &mut RgbaImage) {
        self.advance();
        self.render(canvas);
        self.cull();
    }

    /// Remove all particles
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}
