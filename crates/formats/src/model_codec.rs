//! Compressed binary model format ("ATMC").
//!
//! Layout (little endian):
//! - magic `ATMC`, `u16` version, `u16` flags (reserved)
//! - varint-prefixed UTF-8 asset name, varint mesh count
//! - per mesh: name, varint vertex count, `f32` bounds min/max, positions
//!   quantized to 16 bits per axis inside the bounds and stored as zigzag
//!   varint deltas, varint index count, zigzag varint index deltas
//! - varint-prefixed JSON of the animation clips

use crate::model::{AnimationClip, ModelAsset, ModelError, ModelMesh};

const MAGIC: [u8; 4] = *b"ATMC";
const VERSION_V1: u16 = 1;
const QUANT_MAX: f32 = 65535.0;

/// Decodes either format: ATMC when the magic matches, JSON otherwise.
pub fn load_model_bytes(bytes: &[u8]) -> Result<ModelAsset, ModelError> {
    if is_compressed(bytes) {
        decode_model(bytes)
    } else {
        ModelAsset::from_json_slice(bytes)
    }
}

pub fn is_compressed(bytes: &[u8]) -> bool {
    bytes.starts_with(&MAGIC)
}

pub fn encode_model(asset: &ModelAsset) -> Result<Vec<u8>, ModelError> {
    asset.validate()?;
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION_V1.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    write_str(&mut out, &asset.name);
    write_var_u64(&mut out, asset.meshes.len() as u64);

    for mesh in &asset.meshes {
        write_str(&mut out, &mesh.name);
        write_var_u64(&mut out, mesh.positions.len() as u64);
        let (min, max) = mesh_bounds(&mesh.positions);
        for v in min.iter().chain(max.iter()) {
            out.extend_from_slice(&v.to_le_bytes());
        }
        let mut prev = [0i64; 3];
        for p in &mesh.positions {
            for axis in 0..3 {
                let q = quantize(p[axis], min[axis], max[axis]);
                write_var_u64(&mut out, zigzag(q - prev[axis]));
                prev[axis] = q;
            }
        }
        write_var_u64(&mut out, mesh.indices.len() as u64);
        let mut prev_index = 0i64;
        for &i in &mesh.indices {
            write_var_u64(&mut out, zigzag(i64::from(i) - prev_index));
            prev_index = i64::from(i);
        }
    }

    let clips = serde_json::to_vec(&asset.animations).map_err(|e| ModelError::Json {
        reason: e.to_string(),
    })?;
    write_var_u64(&mut out, clips.len() as u64);
    out.extend_from_slice(&clips);
    Ok(out)
}

pub fn decode_model(bytes: &[u8]) -> Result<ModelAsset, ModelError> {
    let mut r = Reader { bytes, pos: 0 };
    if r.take(4)? != MAGIC.as_slice() {
        return Err(ModelError::InvalidMagic);
    }
    let version = r.u16_le()?;
    if version != VERSION_V1 {
        return Err(ModelError::UnsupportedVersion { found: version });
    }
    let _flags = r.u16_le()?;
    let name = r.string()?;

    let mesh_count = r.len_prefix()?;
    let mut meshes = Vec::with_capacity(mesh_count.min(1024));
    for _ in 0..mesh_count {
        let mesh_name = r.string()?;
        let vertex_count = r.len_prefix()?;
        let mut bounds = [0f32; 6];
        for b in &mut bounds {
            *b = r.f32_le()?;
        }
        let (min, max) = ([bounds[0], bounds[1], bounds[2]], [bounds[3], bounds[4], bounds[5]]);

        let mut positions = Vec::with_capacity(vertex_count.min(1 << 20));
        let mut prev = [0i64; 3];
        for _ in 0..vertex_count {
            let mut p = [0f32; 3];
            for axis in 0..3 {
                prev[axis] += unzigzag(r.var_u64()?);
                p[axis] = dequantize(prev[axis], min[axis], max[axis]);
            }
            positions.push(p);
        }

        let index_count = r.len_prefix()?;
        let mut indices = Vec::with_capacity(index_count.min(1 << 20));
        let mut prev_index = 0i64;
        for _ in 0..index_count {
            prev_index += unzigzag(r.var_u64()?);
            let i = u32::try_from(prev_index).map_err(|_| ModelError::Invalid {
                reason: format!("index {prev_index} out of u32 range"),
            })?;
            indices.push(i);
        }
        meshes.push(ModelMesh {
            name: mesh_name,
            positions,
            indices,
        });
    }

    let clip_len = r.len_prefix()?;
    let animations: Vec<AnimationClip> =
        serde_json::from_slice(r.take(clip_len)?).map_err(|e| ModelError::Json {
            reason: e.to_string(),
        })?;

    let asset = ModelAsset {
        name,
        meshes,
        animations,
    };
    asset.validate()?;
    Ok(asset)
}

fn mesh_bounds(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for p in positions {
        for axis in 0..3 {
            if p[axis].is_finite() {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
    }
    for axis in 0..3 {
        if min[axis] > max[axis] {
            min[axis] = 0.0;
            max[axis] = 0.0;
        }
    }
    (min, max)
}

fn quantize(v: f32, min: f32, max: f32) -> i64 {
    let extent = max - min;
    if !(extent > 0.0) || !v.is_finite() {
        return 0;
    }
    (((v - min) / extent).clamp(0.0, 1.0) * QUANT_MAX).round() as i64
}

fn dequantize(q: i64, min: f32, max: f32) -> f32 {
    min + (max - min) * (q as f32 / QUANT_MAX)
}

fn zigzag(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

fn unzigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

fn write_var_u64(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    write_var_u64(out, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ModelError> {
        let end = self.pos.checked_add(n).ok_or(ModelError::UnexpectedEof)?;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(ModelError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    fn u16_le(&mut self) -> Result<u16, ModelError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn f32_le(&mut self) -> Result<f32, ModelError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn var_u64(&mut self) -> Result<u64, ModelError> {
        let mut out = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = self.take(1)?[0];
            out |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(out);
            }
        }
        Err(ModelError::InvalidVarint)
    }

    /// A length that must fit in the remaining input.
    fn len_prefix(&mut self) -> Result<usize, ModelError> {
        let n = usize::try_from(self.var_u64()?).map_err(|_| ModelError::UnexpectedEof)?;
        if n > self.bytes.len() - self.pos {
            return Err(ModelError::UnexpectedEof);
        }
        Ok(n)
    }

    fn string(&mut self) -> Result<String, ModelError> {
        let n = self.len_prefix()?;
        let b = self.take(n)?;
        std::str::from_utf8(b)
            .map(str::to_string)
            .map_err(|_| ModelError::InvalidUtf8)
    }
}
