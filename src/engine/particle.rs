// =============================================================================
// PARTICLE.RS — time-driven particle emitter
// =============================================================================

use std::collections::VecDeque;

use crate::types::Vec2;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Fraction of the lifetime used, `0.0..` (may pass 1.0 before removal).
    pub age: f32,
    pub age_ms: u32,
}

impl Particle {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self { pos, vel, age: 0.0, age_ms: 0 }
    }
}

pub type ParticleFactory = Box<dyn FnMut() -> Particle + Send>;

/// Keeps roughly `count` particles alive, oldest at the front. Spawning is
/// paced by the age of the oldest particle so the stream ramps up over one
/// lifetime.
pub struct ParticleGenerator {
    pub count: u32,
    pub lifetime_ms: u32,
    pub force: Vec2,
    pub generate: ParticleFactory,
    pub particles: VecDeque<Particle>,
    last_time_ms: Option<u32>,
}

impl std::fmt::Debug for ParticleGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleGenerator")
            .field("count", &self.count)
            .field("lifetime_ms", &self.lifetime_ms)
            .field("force", &self.force)
            .field("particles", &self.particles.len())
            .finish()
    }
}

impl ParticleGenerator {
    pub fn new(count: u32, lifetime_ms: u32, generate: impl FnMut() -> Particle + Send + 'static) -> Self {
        Self {
            count,
            lifetime_ms: lifetime_ms.max(1),
            force: Vec2::ZERO,
            generate: Box::new(generate),
            particles: VecDeque::new(),
            last_time_ms: None,
        }
    }

    pub fn with_force(mut self, force: Vec2) -> Self {
        self.force = force;
        self
    }

    pub fn update(&mut self, time_ms: u32) {
        let elapsed_ms = time_ms.wrapping_sub(self.last_time_ms.unwrap_or(time_ms));

        while self.particles.front().is_some_and(|p| p.age_ms > self.lifetime_ms) {
            self.particles.pop_front();
        }

        let td = elapsed_ms as f32 / 1000.0;
        let f = self.force * td;
        for p in self.particles.iter_mut() {
            p.vel += f;
            p.pos += p.vel * td;
            p.age_ms += elapsed_ms;
            p.age = p.age_ms as f32 / self.lifetime_ms as f32;
        }

        let target = match self.particles.front() {
            Some(front) => ((front.age_ms as u64 * self.count as u64) / self.lifetime_ms as u64).max(1),
            None => 1,
        } as usize;
        while self.particles.len() < target {
            self.particles.push_back((self.generate)());
        }

        self.last_time_ms = Some(time_ms);
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_spawns_one() {
        let mut g = ParticleGenerator::new(10, 1000, || Particle::new(Vec2::ZERO, Vec2::X));
        g.update(0);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn particles_move_and_expire() {
        let mut g = ParticleGenerator::new(4, 100, || Particle::new(Vec2::ZERO, Vec2::new(10.0, 0.0)));
        g.update(0);
        g.update(50);
        let front = g.particles[0];
        assert_eq!(front.age_ms, 50);
        assert!((front.pos.x - 0.5).abs() < 1e-4);
        assert!((front.age - 0.5).abs() < 1e-4);
        // oldest reaches 50ms: target = 50 * 4 / 100 = 2
        assert_eq!(g.len(), 2);

        g.update(160);
        assert!(g.particles.iter().all(|p| p.age_ms <= 160));
        g.update(170);
        assert!(g.particles.front().is_some_and(|p| p.age_ms <= 120));
    }
}
