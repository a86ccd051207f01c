use formats::model::{AnimationClip, MeshPose, ModelAsset};
use foundation::math::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use runtime::clock::AnimationClock;
use serde::{Deserialize, Serialize};

use crate::extrude::RegionLabelAnchor;
use crate::layer::Animated;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub enabled: bool,
    /// Asset path handed to the loader, if any.
    pub path: Option<String>,
    /// Clip to play; the first clip when unset.
    pub clip: Option<String>,
    pub scale: f64,
    pub speed: f64,
    /// Start offsets are drawn from `[0, stagger_s)`.
    pub stagger_s: f64,
    pub seed: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            clip: None,
            scale: 1.0,
            speed: 1.0,
            stagger_s: 2.0,
            seed: 0x0dd,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    pub adcode: i64,
    pub position: Vec3,
    pub clock: AnimationClock,
}

/// Clones of one animated asset, one per label anchor.
///
/// Anchors can arrive before the asset; instances appear once both exist.
#[derive(Debug, Clone)]
pub struct ModelInstances {
    settings: ModelSettings,
    asset: Option<ModelAsset>,
    anchors: Vec<RegionLabelAnchor>,
    instances: Vec<ModelInstance>,
}

impl ModelInstances {
    pub fn new(settings: ModelSettings) -> Self {
        Self {
            settings,
            asset: None,
            anchors: Vec::new(),
            instances: Vec::new(),
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// A new seed or stagger respawns the instances; speed changes keep
    /// every clock's current time.
    pub fn set_settings(&mut self, settings: ModelSettings) {
        let respawn =
            self.settings.seed != settings.seed || self.settings.stagger_s != settings.stagger_s;
        let speed = settings.speed;
        self.settings = settings;
        if respawn {
            self.respawn();
            return;
        }
        for i in &mut self.instances {
            i.clock.set_speed(speed);
        }
    }

    pub fn set_anchors(&mut self, anchors: &[RegionLabelAnchor]) {
        self.anchors = anchors.to_vec();
        self.respawn();
    }

    /// Installs a loaded asset and clones it onto every anchor.
    pub fn set_asset(&mut self, asset: ModelAsset) {
        self.asset = Some(asset);
        self.respawn();
    }

    pub fn asset(&self) -> Option<&ModelAsset> {
        self.asset.as_ref()
    }

    pub fn instances(&self) -> &[ModelInstance] {
        &self.instances
    }

    /// Drops instances and anchors. The asset is kept for the next build.
    pub fn clear(&mut self) {
        self.anchors.clear();
        self.instances.clear();
    }

    fn respawn(&mut self) {
        self.instances.clear();
        if self.asset.is_none() {
            return;
        }
        let mut rng = SmallRng::seed_from_u64(self.settings.seed);
        let stagger = self.settings.stagger_s;
        let speed = self.settings.speed;
        self.instances = self
            .anchors
            .iter()
            .map(|a| {
                let offset = if stagger > 0.0 {
                    rng.random_range(0.0..stagger)
                } else {
                    0.0
                };
                ModelInstance {
                    adcode: a.adcode,
                    position: a.position,
                    clock: AnimationClock::with_speed(speed).with_offset(offset),
                }
            })
            .collect();
    }

    fn active_clip(&self) -> Option<&AnimationClip> {
        let asset = self.asset.as_ref()?;
        match &self.settings.clip {
            Some(name) => asset.clip(name),
            None => asset.animations.first(),
        }
    }

    /// Per-mesh pose of instance `i` at its own clock time. Meshes without
    /// tracks (or assets without clips) rest at the identity pose.
    pub fn poses(&self, i: usize) -> Option<Vec<MeshPose>> {
        let asset = self.asset.as_ref()?;
        let instance = self.instances.get(i)?;
        let mesh_count = asset.meshes.len();
        Some(match self.active_clip() {
            Some(clip) => clip.sample(mesh_count, instance.clock.elapsed_s()),
            None => vec![MeshPose::default(); mesh_count],
        })
    }
}

impl Animated for ModelInstances {
    fn advance(&mut self, dt_s: f64) {
        for i in &mut self.instances {
            i.clock.advance(dt_s);
        }
    }
}
