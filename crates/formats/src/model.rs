//! Animated model assets placed on the map as overlay instances.
//!
//! Models are opaque loaded resources: a few indexed meshes plus keyframed
//! clips. The JSON form is the uncompressed format; see [`crate::model_codec`]
//! for the compressed binary form.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAsset {
    pub name: String,
    pub meshes: Vec<ModelMesh>,
    #[serde(default)]
    pub animations: Vec<AnimationClip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    pub duration_s: f32,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackProperty {
    Translation,
    Scale,
    /// Euler angles in radians.
    Rotation,
}

/// Keyframes for one property of one mesh. `times` are ascending seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub mesh: usize,
    pub property: TrackProperty,
    pub times: Vec<f32>,
    pub values: Vec<[f32; 3]>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MeshPose {
    pub translation: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for MeshPose {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

#[derive(Debug)]
pub enum ModelError {
    Json { reason: String },
    UnexpectedEof,
    InvalidMagic,
    UnsupportedVersion { found: u16 },
    InvalidVarint,
    InvalidUtf8,
    Invalid { reason: String },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Json { reason } => write!(f, "model JSON error: {reason}"),
            ModelError::UnexpectedEof => write!(f, "unexpected end of model data"),
            ModelError::InvalidMagic => write!(f, "invalid ATMC magic"),
            ModelError::UnsupportedVersion { found } => {
                write!(f, "unsupported ATMC version: {found}")
            }
            ModelError::InvalidVarint => write!(f, "invalid varint"),
            ModelError::InvalidUtf8 => write!(f, "invalid utf-8"),
            ModelError::Invalid { reason } => write!(f, "invalid model: {reason}"),
        }
    }
}

impl std::error::Error for ModelError {}

impl ModelAsset {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let asset: ModelAsset = serde_json::from_slice(bytes).map_err(|e| ModelError::Json {
            reason: e.to_string(),
        })?;
        asset.validate()?;
        Ok(asset)
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>, ModelError> {
        serde_json::to_vec(self).map_err(|e| ModelError::Json {
            reason: e.to_string(),
        })
    }

    /// Checks index ranges and keyframe shapes.
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |reason: String| Err(ModelError::Invalid { reason });
        for mesh in &self.meshes {
            if mesh.indices.len() % 3 != 0 {
                return invalid(format!("mesh {:?}: index count not a multiple of 3", mesh.name));
            }
            if let Some(i) = mesh
                .indices
                .iter()
                .find(|i| **i as usize >= mesh.positions.len())
            {
                return invalid(format!("mesh {:?}: index {i} out of range", mesh.name));
            }
        }
        for clip in &self.animations {
            if !(clip.duration_s.is_finite() && clip.duration_s >= 0.0) {
                return invalid(format!("clip {:?}: bad duration", clip.name));
            }
            for track in &clip.tracks {
                if track.mesh >= self.meshes.len() {
                    return invalid(format!("clip {:?}: track targets missing mesh", clip.name));
                }
                if track.times.len() != track.values.len() || track.times.is_empty() {
                    return invalid(format!("clip {:?}: keyframe count mismatch", clip.name));
                }
                if track.times.windows(2).any(|w| !(w[0] <= w[1])) {
                    return invalid(format!("clip {:?}: keyframe times not ascending", clip.name));
                }
            }
        }
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len() / 3).sum()
    }

    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.animations.iter().find(|c| c.name == name)
    }
}

impl AnimationClip {
    /// Pose of every mesh at `t_s`, wrapped into the clip duration.
    pub fn sample(&self, mesh_count: usize, t_s: f64) -> Vec<MeshPose> {
        let t = if self.duration_s > 0.0 {
            t_s.rem_euclid(f64::from(self.duration_s)) as f32
        } else {
            0.0
        };
        let mut poses = vec![MeshPose::default(); mesh_count];
        for track in &self.tracks {
            let (Some(pose), Some(v)) = (poses.get_mut(track.mesh), track.sample(t)) else {
                continue;
            };
            match track.property {
                TrackProperty::Translation => pose.translation = v,
                TrackProperty::Rotation => pose.rotation = v,
                TrackProperty::Scale => pose.scale = v,
            }
        }
        poses
    }
}

impl Track {
    /// Linear interpolation between keyframes, holding the ends.
    pub fn sample(&self, t: f32) -> Option<[f32; 3]> {
        let first = *self.values.first()?;
        let last = *self.values.last()?;
        let next = self.times.partition_point(|k| *k <= t);
        if next == 0 {
            return Some(first);
        }
        if next >= self.times.len() || next >= self.values.len() {
            return Some(last);
        }
        let (t0, t1) = (self.times[next - 1], self.times[next]);
        let (a, b) = (self.values[next - 1], self.values[next]);
        let u = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
        Some([
            a[0] + (b[0] - a[0]) * u,
            a[1] + (b[1] - a[1]) * u,
            a[2] + (b[2] - a[2]) * u,
        ])
    }
}
