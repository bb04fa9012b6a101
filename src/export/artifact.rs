//! Persistence of a matched (model, scaler) pair
//!
//! Each pair is stored as two blobs. Both start with the same magic bytes and
//! carry an envelope with the pair id, the semantic version and a SHA-256
//! checksum of their payload, so a model is never loaded next to a scaler it
//! was not trained with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use super::versioning::ModelVersion;
use crate::error::{PipelineError, Result};
use crate::preprocessing::ScalerState;
use crate::schema::{FeatureSchema, TargetSchema};
use crate::training::{EstimatorParams, MultiOutputRegressor};

const MAGIC: [u8; 4] = *b"AQRP";
const FORMAT_VERSION: u32 = 1;

/// Identity and provenance shared by both blobs of a pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub pair_id: Uuid,
    pub name: String,
    pub version: ModelVersion,
    pub created_at: DateTime<Utc>,
    pub features: FeatureSchema,
    pub targets: TargetSchema,
    pub params: EstimatorParams,
    /// Mean cross-validated score of the selected candidate
    pub cv_score: f64,
}

/// A fitted model together with the scaler its inputs were standardized by.
/// Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPair {
    metadata: ArtifactMetadata,
    model: MultiOutputRegressor,
    scaler: ScalerState,
}

impl ArtifactPair {
    /// Bind `model` and `scaler` under a fresh pair id at version 1.0.0
    pub fn new(
        name: impl Into<String>,
        features: FeatureSchema,
        targets: TargetSchema,
        model: MultiOutputRegressor,
        scaler: ScalerState,
        cv_score: f64,
    ) -> Result<Self> {
        if scaler.n_features() != features.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: features.len(),
                actual: scaler.n_features(),
            });
        }
        if model.n_features() != features.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: features.len(),
                actual: model.n_features(),
            });
        }
        if model.n_outputs() != targets.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: targets.len(),
                actual: model.n_outputs(),
            });
        }

        let metadata = ArtifactMetadata {
            pair_id: Uuid::new_v4(),
            name: name.into(),
            version: ModelVersion::default(),
            created_at: Utc::now(),
            features,
            targets,
            params: *model.params(),
            cv_score,
        };
        Ok(Self { metadata, model, scaler })
    }

    /// Assign the version the pair will be saved under
    pub fn with_version(mut self, version: ModelVersion) -> Self {
        self.metadata.version = version;
        self
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn model(&self) -> &MultiOutputRegressor {
        &self.model
    }

    pub fn scaler(&self) -> &ScalerState {
        &self.scaler
    }

    pub fn features(&self) -> &FeatureSchema {
        &self.metadata.features
    }

    pub fn targets(&self) -> &TargetSchema {
        &self.metadata.targets
    }
}

/// Locations of the two blobs of a pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
}

impl ArtifactPaths {
    pub fn new(model: impl Into<PathBuf>, scaler: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            scaler: scaler.into(),
        }
    }

    /// `model.bin` and `scaler.bin` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("model.bin"), dir.join("scaler.bin"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum BlobKind {
    Model,
    Scaler,
}

/// Everything after the magic bytes
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    format_version: u32,
    kind: BlobKind,
    pair_id: Uuid,
    version: ModelVersion,
    checksum: [u8; 32],
    payload: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct ModelPayload {
    metadata: ArtifactMetadata,
    model: MultiOutputRegressor,
}

#[derive(Serialize, Deserialize)]
struct ScalerPayload {
    pair_id: Uuid,
    features: FeatureSchema,
    scaler: ScalerState,
}

fn checksum(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

fn encode<T: Serialize>(kind: BlobKind, meta: &ArtifactMetadata, payload: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(payload)
        .map_err(|e| PipelineError::Serialization(format!("Failed to serialize {:?} blob: {}", kind, e)))?;
    let envelope = Envelope {
        format_version: FORMAT_VERSION,
        kind,
        pair_id: meta.pair_id,
        version: meta.version,
        checksum: checksum(&payload),
        payload,
    };
    let body = bincode::serialize(&envelope)
        .map_err(|e| PipelineError::Serialization(format!("Failed to serialize envelope: {}", e)))?;

    let mut bytes = Vec::with_capacity(MAGIC.len() + body.len());
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

fn decode<T: for<'de> Deserialize<'de>>(path: &Path, expected: BlobKind) -> Result<(Envelope, T)> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PipelineError::ArtifactNotFound(path.to_path_buf()),
        _ => PipelineError::corrupt(path, e.to_string()),
    })?;

    if bytes.len() < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
        return Err(PipelineError::corrupt(path, "bad magic bytes"));
    }
    let envelope: Envelope = bincode::deserialize(&bytes[MAGIC.len()..])
        .map_err(|e| PipelineError::corrupt(path, format!("unreadable envelope: {}", e)))?;

    if envelope.format_version != FORMAT_VERSION {
        return Err(PipelineError::corrupt(
            path,
            format!("unsupported format version {}", envelope.format_version),
        ));
    }
    if envelope.kind != expected {
        return Err(PipelineError::corrupt(
            path,
            format!("expected a {:?} blob, found {:?}", expected, envelope.kind),
        ));
    }
    if checksum(&envelope.payload) != envelope.checksum {
        return Err(PipelineError::corrupt(path, "checksum mismatch"));
    }

    let payload: T = bincode::deserialize(&envelope.payload)
        .map_err(|e| PipelineError::corrupt(path, format!("unreadable payload: {}", e)))?;
    Ok((envelope, payload))
}

/// Write `bytes` next to `target` and return the temporary path
fn write_temp(target: &Path, bytes: &[u8], pair_id: &Uuid) -> Result<PathBuf> {
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PipelineError::Config(format!("invalid artifact path {}", target.display())))?;
    let tmp = target.with_file_name(format!(".{}.{}.tmp", file_name, pair_id.simple()));

    let mut file = File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(tmp)
}

/// Save both blobs. Nothing at `paths` is replaced until both blobs are
/// fully written; the model is moved into place last.
pub fn save(pair: &ArtifactPair, paths: &ArtifactPaths) -> Result<()> {
    let meta = pair.metadata();
    let model_bytes = encode(
        BlobKind::Model,
        meta,
        &ModelPayload {
            metadata: meta.clone(),
            model: pair.model.clone(),
        },
    )?;
    let scaler_bytes = encode(
        BlobKind::Scaler,
        meta,
        &ScalerPayload {
            pair_id: meta.pair_id,
            features: meta.features.clone(),
            scaler: pair.scaler.clone(),
        },
    )?;

    for path in [&paths.model, &paths.scaler] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
    }

    let scaler_tmp = write_temp(&paths.scaler, &scaler_bytes, &meta.pair_id)?;
    let model_tmp = match write_temp(&paths.model, &model_bytes, &meta.pair_id) {
        Ok(tmp) => tmp,
        Err(e) => {
            let _ = fs::remove_file(&scaler_tmp);
            return Err(e);
        }
    };

    fs::rename(&scaler_tmp, &paths.scaler)?;
    fs::rename(&model_tmp, &paths.model)?;

    info!(
        pair_id = %meta.pair_id,
        version = %meta.version,
        model = %paths.model.display(),
        scaler = %paths.scaler.display(),
        model_bytes = model_bytes.len(),
        scaler_bytes = scaler_bytes.len(),
        "Artifact pair saved"
    );
    Ok(())
}

/// Load and cross-check both blobs
pub fn load(paths: &ArtifactPaths) -> Result<ArtifactPair> {
    let (model_env, model_payload): (Envelope, ModelPayload) = decode(&paths.model, BlobKind::Model)?;
    let (scaler_env, scaler_payload): (Envelope, ScalerPayload) = decode(&paths.scaler, BlobKind::Scaler)?;

    let metadata = model_payload.metadata;
    if model_env.pair_id != scaler_env.pair_id
        || scaler_payload.pair_id != metadata.pair_id
        || model_env.pair_id != metadata.pair_id
    {
        return Err(PipelineError::corrupt(
            &paths.scaler,
            format!(
                "scaler belongs to pair {} but model belongs to pair {}",
                scaler_env.pair_id, model_env.pair_id
            ),
        ));
    }
    if model_env.version != scaler_env.version || model_env.version != metadata.version {
        return Err(PipelineError::corrupt(&paths.scaler, "model and scaler versions differ"));
    }
    if scaler_payload.features != metadata.features
        || scaler_payload.scaler.n_features() != metadata.features.len()
        || model_payload.model.n_features() != metadata.features.len()
        || model_payload.model.n_outputs() != metadata.targets.len()
    {
        return Err(PipelineError::corrupt(&paths.model, "blob shapes disagree with the stored schema"));
    }

    debug!(pair_id = %metadata.pair_id, version = %metadata.version, "Artifact pair loaded");
    Ok(ArtifactPair {
        metadata,
        model: model_payload.model,
        scaler: scaler_payload.scaler,
    })
}
