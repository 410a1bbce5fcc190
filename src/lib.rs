//! Chunked voxel world engine: deterministic terrain generation, background
//! chunk builds with CPU meshing, and edit-aware streaming around a moving
//! observer.
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;

pub use crate::config::EngineConfig;
pub use crate::engine::{Engine, EngineOutput};
