//! Model export and serialization module
//!
//! - [`artifact`]: the two-blob (model, scaler) pair format
//! - [`versioning`]: semantic versions and a directory-backed registry

pub mod artifact;
pub mod versioning;

pub use artifact::{load, save, ArtifactMetadata, ArtifactPair, ArtifactPaths};
pub use versioning::{ModelRegistry, ModelVersion, RegisteredArtifact, RegistryEntry, RegistryIndex};
