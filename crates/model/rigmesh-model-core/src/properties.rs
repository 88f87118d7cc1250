//! Virtual property names and the value variant used by get/set.
//!
//! Four properties delegate to the rig engine (skin, animation, cursor,
//! playback_rate); any other name falls through to the material-constant
//! path.

use nalgebra::Vector4;
use rigmesh_api_core::{hash_name, NameHash};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Hash(NameHash),
    Number(f64),
    Vector4(Vector4<f32>),
}

#[inline]
pub fn prop_skin() -> NameHash {
    hash_name("skin")
}

#[inline]
pub fn prop_animation() -> NameHash {
    hash_name("animation")
}

#[inline]
pub fn prop_cursor() -> NameHash {
    hash_name("cursor")
}

#[inline]
pub fn prop_playback_rate() -> NameHash {
    hash_name("playback_rate")
}
