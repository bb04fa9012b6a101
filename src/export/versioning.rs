//! Model versioning and registry
//!
//! A registry directory holds every saved pair of a model name under its own
//! version directory, plus an `index.json` describing them:
//!
//! ```text
//! <root>/index.json
//! <root>/<name>/v1.0.0/{model.bin,scaler.bin}
//! <root>/<name>/v1.0.1/{model.bin,scaler.bin}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use super::artifact::{self, ArtifactPair, ArtifactPaths};
use crate::error::{PipelineError, Result};
use crate::training::EstimatorParams;

/// Semantic version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ModelVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Parse from string (e.g., "1.2.3", an optional leading `v` is accepted)
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_start_matches('v');
        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() != 3 {
            return Err(PipelineError::Validation(format!("Invalid version format: {}", s)));
        }

        let component = |label: &str, part: &str| -> Result<u32> {
            part.parse()
                .map_err(|_| PipelineError::Validation(format!("Invalid {} version: {}", label, part)))
        };

        Ok(Self {
            major: component("major", parts[0])?,
            minor: component("minor", parts[1])?,
            patch: component("patch", parts[2])?,
        })
    }

    pub fn bump_patch(&self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }
}

impl std::fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Default for ModelVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// Registry entry (metadata only, without model data)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub version: ModelVersion,
    pub pair_id: Uuid,
    /// Version directory relative to the registry root
    pub path: String,
    pub features: Vec<String>,
    pub targets: Vec<String>,
    pub params: EstimatorParams,
    pub cv_score: f64,
    pub registered_at: DateTime<Utc>,
}

/// Registry index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryIndex {
    /// Entries per model name, in registration order
    pub models: BTreeMap<String, Vec<RegistryEntry>>,
}

/// A pair that has just been written to the registry
#[derive(Debug, Clone)]
pub struct RegisteredArtifact {
    pub entry: RegistryEntry,
    pub paths: ArtifactPaths,
    pub pair: ArtifactPair,
}

/// Registry of versioned artifact pairs rooted at a directory
#[derive(Debug)]
pub struct ModelRegistry {
    root: PathBuf,
    index: RegistryIndex,
}

impl ModelRegistry {
    const INDEX_FILE: &'static str = "index.json";

    /// Create or open registry at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let index_path = root.join(Self::INDEX_FILE);
        let index = if index_path.exists() {
            let file = File::open(&index_path)?;
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                PipelineError::Serialization(format!("Failed to read {}: {}", index_path.display(), e))
            })?
        } else {
            RegistryIndex::default()
        };

        Ok(Self { root, index })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the index through a temporary file so readers never see a
    /// partial one
    fn save_index(&self) -> Result<()> {
        let index_path = self.root.join(Self::INDEX_FILE);
        let tmp_path = self.root.join(format!(".{}.tmp", Self::INDEX_FILE));
        let json = serde_json::to_vec_pretty(&self.index)?;

        let mut file = File::create(&tmp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&tmp_path, &index_path)?;
        Ok(())
    }

    fn check_name(name: &str) -> Result<()> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && name != "."
            && name != "..";
        if valid {
            Ok(())
        } else {
            Err(PipelineError::Config(format!("invalid model name '{}'", name)))
        }
    }

    fn version_dir(name: &str, version: &ModelVersion) -> String {
        format!("{}/v{}", name, version)
    }

    /// Paths of a version's blobs
    pub fn paths(&self, name: &str, version: &ModelVersion) -> ArtifactPaths {
        ArtifactPaths::in_dir(self.root.join(Self::version_dir(name, version)))
    }

    /// Next version for `name`: 1.0.0 for a new name, otherwise the latest
    /// version with its patch bumped
    pub fn next_version(&self, name: &str) -> ModelVersion {
        self.latest_version(name)
            .map(|v| v.bump_patch())
            .unwrap_or_default()
    }

    /// Persist `pair` as the next version of its model name
    pub fn register(&mut self, pair: ArtifactPair) -> Result<RegisteredArtifact> {
        let name = pair.metadata().name.clone();
        Self::check_name(&name)?;

        let version = self.next_version(&name);
        let pair = pair.with_version(version);
        let paths = self.paths(&name, &version);
        artifact::save(&pair, &paths)?;

        let meta = pair.metadata();
        let entry = RegistryEntry {
            name: name.clone(),
            version,
            pair_id: meta.pair_id,
            path: Self::version_dir(&name, &version),
            features: meta.features.names().to_vec(),
            targets: meta.targets.names().to_vec(),
            params: meta.params,
            cv_score: meta.cv_score,
            registered_at: Utc::now(),
        };

        self.index.models.entry(name.clone()).or_default().push(entry.clone());
        self.save_index()?;

        info!(model = %name, version = %version, path = %paths.model.display(), "Registered artifact pair");
        Ok(RegisteredArtifact { entry, paths, pair })
    }

    fn entries(&self, name: &str) -> Result<&[RegistryEntry]> {
        self.index
            .models
            .get(name)
            .map(|v| v.as_slice())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PipelineError::ArtifactNotFound(self.root.join(name)))
    }

    /// Entry with the highest version
    pub fn latest(&self, name: &str) -> Result<&RegistryEntry> {
        self.entries(name)?
            .iter()
            .max_by_key(|e| e.version)
            .ok_or_else(|| PipelineError::ArtifactNotFound(self.root.join(name)))
    }

    pub fn latest_version(&self, name: &str) -> Option<ModelVersion> {
        self.latest(name).ok().map(|e| e.version)
    }

    pub fn entry(&self, name: &str, version: &ModelVersion) -> Result<&RegistryEntry> {
        self.entries(name)?
            .iter()
            .find(|e| &e.version == version)
            .ok_or_else(|| PipelineError::ArtifactNotFound(self.root.join(Self::version_dir(name, version))))
    }

    /// Load the latest pair of a model
    pub fn load_latest(&self, name: &str) -> Result<ArtifactPair> {
        let entry = self.latest(name)?;
        artifact::load(&self.paths(name, &entry.version))
    }

    /// Load a specific version of a model
    pub fn load_version(&self, name: &str, version: &ModelVersion) -> Result<ArtifactPair> {
        let entry = self.entry(name, version)?;
        artifact::load(&self.paths(name, &entry.version))
    }

    /// List all model names
    pub fn list_models(&self) -> Vec<String> {
        self.index.models.keys().cloned().collect()
    }

    /// Versions of a model, oldest first
    pub fn list_versions(&self, name: &str) -> Vec<ModelVersion> {
        let mut versions: Vec<ModelVersion> = self
            .index
            .models
            .get(name)
            .map(|entries| entries.iter().map(|e| e.version).collect())
            .unwrap_or_default();
        versions.sort();
        versions
    }

    /// Delete a model version and its blobs
    pub fn delete(&mut self, name: &str, version: &ModelVersion) -> Result<()> {
        let missing = || PipelineError::ArtifactNotFound(self.root.join(Self::version_dir(name, version)));
        let entries = self.index.models.get_mut(name).ok_or_else(missing)?;
        let idx = entries.iter().position(|e| &e.version == version).ok_or_else(missing)?;
        let entry = entries.remove(idx);
        if entries.is_empty() {
            self.index.models.remove(name);
        }

        let dir = self.root.join(&entry.path);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        self.save_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        let v = ModelVersion::parse("1.2.3").unwrap();
        assert_eq!(v, ModelVersion::new(1, 2, 3));
        assert_eq!(ModelVersion::parse("v2.0.1").unwrap(), ModelVersion::new(2, 0, 1));
        assert!(ModelVersion::parse("1.2").is_err());
        assert!(ModelVersion::parse("1.x.3").is_err());
    }

    #[test]
    fn test_version_bumping() {
        let v = ModelVersion::new(1, 2, 3);
        assert_eq!(v.bump_patch(), ModelVersion::new(1, 2, 4));
        assert_eq!(ModelVersion::new(0, 9, 99).bump_patch(), ModelVersion::new(0, 9, 100));
    }

    #[test]
    fn test_version_ordering() {
        let mut versions = vec![
            ModelVersion::new(1, 10, 0),
            ModelVersion::new(1, 2, 0),
            ModelVersion::new(0, 9, 9),
        ];
        versions.sort();
        assert_eq!(versions[0], ModelVersion::new(0, 9, 9));
        assert_eq!(versions[2], ModelVersion::new(1, 10, 0));
        assert_eq!(versions[2].to_string(), "1.10.0");
    }

    #[test]
    fn test_name_rules() {
        assert!(ModelRegistry::check_name("health_rf-1").is_ok());
        assert!(ModelRegistry::check_name("").is_err());
        assert!(ModelRegistry::check_name("../escape").is_err());
        assert!(ModelRegistry::check_name("a/b").is_err());
    }

    #[test]
    fn test_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::open(dir.path()).unwrap();
        assert!(registry.list_models().is_empty());
        assert_eq!(registry.next_version("health"), ModelVersion::new(1, 0, 0));
        assert!(matches!(registry.load_latest("health"), Err(PipelineError::ArtifactNotFound(_))));
    }
}
