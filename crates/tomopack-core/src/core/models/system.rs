use super::ids::{ListId, ParticleId};
use super::list::ParticleList;
use super::particle::Particle;
use slotmap::SlotMap;

/// The container owning every particle list and particle of one scene.
///
/// Primary storage is slot-map based so handles stay valid across removals.
/// Importers and editing commands build and mutate the system; the relaxation
/// engine only rewrites particle positions and orientations in place and
/// never creates or deletes particles.
#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    lists: SlotMap<ListId, ParticleList>,
    particles: SlotMap<ParticleId, Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_list(&mut self, name: impl Into<String>) -> ListId {
        self.lists.insert(ParticleList::new(name))
    }

    pub fn list(&self, id: ListId) -> Option<&ParticleList> {
        self.lists.get(id)
    }

    pub fn list_mut(&mut self, id: ListId) -> Option<&mut ParticleList> {
        self.lists.get_mut(id)
    }

    pub fn lists_iter(&self) -> impl Iterator<Item = (ListId, &ParticleList)> {
        self.lists.iter()
    }

    /// Adds a particle to a list, fixing up its membership field. Returns
    /// `None` when the list does not exist.
    pub fn add_particle(&mut self, list: ListId, mut particle: Particle) -> Option<ParticleId> {
        let list_entry = self.lists.get_mut(list)?;
        particle.list = list;
        let id = self.particles.insert(particle);
        list_entry.push(id);
        Some(id)
    }

    pub fn remove_particle(&mut self, id: ParticleId) -> Option<Particle> {
        let particle = self.particles.remove(id)?;
        if let Some(list) = self.lists.get_mut(particle.list) {
            list.remove(id);
        }
        Some(particle)
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    pub fn particles_iter(&self) -> impl Iterator<Item = (ParticleId, &Particle)> {
        self.particles.iter()
    }

    /// Particles of one list, in list order.
    pub fn particles_of(&self, list: ListId) -> impl Iterator<Item = (ParticleId, &Particle)> {
        self.lists
            .get(list)
            .into_iter()
            .flat_map(|l| l.particles().iter())
            .filter_map(|&id| self.particles.get(id).map(|p| (id, p)))
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }
}
