use super::ids::ParticleId;

/// An ordered collection of particles sharing one coordinate frame and one
/// source format.
///
/// Membership is maintained by [`ParticleSystem`](super::system::ParticleSystem);
/// the list itself only records the name and the particle order.
#[derive(Debug, Clone, Default)]
pub struct ParticleList {
    pub name: String,
    particles: Vec<ParticleId>,
}

impl ParticleList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            particles: Vec::new(),
        }
    }

    pub fn particles(&self) -> &[ParticleId] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub(crate) fn push(&mut self, id: ParticleId) {
        self.particles.push(id);
    }

    pub(crate) fn remove(&mut self, id: ParticleId) {
        self.particles.retain(|&existing| existing != id);
    }
}
