//! rigmesh-api-core: hash and transform primitives shared across the
//! rigmesh crates (engine-agnostic).

pub mod hash;
pub mod transform;

pub use hash::{hash_name, Hash32, NameHash};
pub use transform::Transform;
