//! Cache implementations for resolved bin geometry.

mod geometry_cache;

pub use geometry_cache::{GeometryCache, DEFAULT_MEMORY_LIMIT};
