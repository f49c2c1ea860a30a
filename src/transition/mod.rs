//! Transition tiles: a floor tile whose edges fade into its neighbors.
//!
//! A transition is identified by its [`TransitionKey`], the center tile plus
//! the four neighbors. The first request for a key composes it from the
//! retained source images; every later request returns the cached result.

mod blend;
mod cache;
mod engine;
mod error;
mod key;

pub use blend::{blend_edge, BlendParams, DEFAULT_CHANCES};
pub use cache::{CacheStats, TransitionCache};
pub use engine::TransitionEngine;
pub use error::TransitionError;
pub use key::TransitionKey;
