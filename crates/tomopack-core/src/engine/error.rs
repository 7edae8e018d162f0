use super::config::ConfigError;
use crate::core::models::ids::{ListId, MeshId, ModelId, ParticleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("particle list {list:?} is not part of this system")]
    ListNotFound { list: ListId },

    #[error("particle list {list:?} appears in more than one constraint role")]
    ConstraintConflict { list: ListId },

    #[error("geometric model {model:?} is not registered")]
    ModelNotFound { model: ModelId },

    #[error("particle {particle:?} has no attached surface mesh")]
    MeshUnavailable { particle: ParticleId },

    #[error("mesh {mesh:?} attached to particle {particle:?} is not registered")]
    MeshNotFound { particle: ParticleId, mesh: MeshId },

    #[error(
        "manifold particle {particle:?} of list {list:?} starts {distance:.3} frame units away from its surface"
    )]
    ManifoldOffSurface {
        list: ListId,
        particle: ParticleId,
        distance: f64,
    },

    #[error("internal logic error: {0}")]
    Internal(String),
}
