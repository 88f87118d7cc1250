//! Error types for the model component core.
//!
//! Every failure is either rolled back completely or reported and skipped;
//! nothing retries.

use rigmesh_api_core::NameHash;

/// Errors from component lifecycle operations (attach, reload).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ModelError {
    /// The world's fixed-capacity component pool is exhausted.
    #[error("model could not be created since the component buffer is full ({capacity})")]
    WorldFull { capacity: usize },

    /// Node or identifier allocation failed while mirroring the skeleton.
    #[error(
        "failed to create scene nodes for bones ({created} of {total}); \
         consider removing unneeded nodes elsewhere or increasing the scene's max instances"
    )]
    BoneSynthesis { created: usize, total: usize },

    /// The rig engine rejected instance creation.
    #[error("failed to create a rig instance needed by the model: {0}")]
    Rig(#[from] RigError),

    /// Operation addressed a free pool slot.
    #[error("no component at slot {index}")]
    InvalidIndex { index: u32 },
}

/// Errors surfaced by the external rig engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum RigError {
    #[error("bind data is invalid")]
    InvalidBindData,

    #[error("animation not found: {animation:?}")]
    AnimationNotFound { animation: NameHash },

    #[error("skin not found: {skin:?}")]
    SkinNotFound { skin: NameHash },

    #[error("rig instance handle is invalid")]
    InvalidInstance,
}

/// Property get/set failures. Non-fatal: the operation no-ops.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PropertyError {
    #[error("property or constant not found: {name:?}")]
    NotFound { name: NameHash },

    #[error("property type mismatch for {name:?}")]
    TypeMismatch { name: NameHash },

    #[error("unsupported value for {name:?}")]
    UnsupportedValue { name: NameHash },
}

/// Message delivery failure. Logged and dropped by callers, never retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MessageError {
    #[error("receiver address is invalid")]
    InvalidAddress,
}
