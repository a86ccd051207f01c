//! Screen-space region labels, laid out with the 3D camera.

use foundation::math::Vec3;
use layers::labels::{LabelLayoutConfig, LabelProjector, LabelsLayer, PlacedLabel2D, layout_labels_2d};
use scene::components::Transform;

use crate::camera::PerspectiveCamera;

/// Projects root-local anchors through the root transform and the camera.
pub struct CameraProjector<'a> {
    pub camera: &'a PerspectiveCamera,
    pub root: Transform,
}

impl LabelProjector for CameraProjector<'_> {
    fn project(&self, local: Vec3) -> Option<[f32; 2]> {
        let p = self.camera.project(self.root.apply(local))?;
        Some([p[0] as f32, p[1] as f32])
    }
}

/// The 2D overlay holding placed labels, sized like the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayer {
    layout: LabelLayoutConfig,
    placed: Vec<PlacedLabel2D>,
}

impl LabelLayer {
    pub fn new(width_px: f64, height_px: f64) -> Self {
        let mut layer = Self {
            layout: LabelLayoutConfig::default(),
            placed: Vec::new(),
        };
        layer.resize(width_px, height_px);
        layer
    }

    pub fn resize(&mut self, width_px: f64, height_px: f64) {
        self.layout.viewport_px = [width_px.max(1.0) as f32, height_px.max(1.0) as f32];
    }

    pub fn size_px(&self) -> [f32; 2] {
        self.layout.viewport_px
    }

    pub fn layout(&mut self, labels: &LabelsLayer, camera: &PerspectiveCamera, root: Transform) {
        let projector = CameraProjector { camera, root };
        self.placed = layout_labels_2d(labels.anchors(), &labels.config.style, &projector, self.layout);
    }

    pub fn placed(&self) -> &[PlacedLabel2D] {
        &self.placed
    }

    pub fn clear(&mut self) {
        self.placed.clear();
    }
}
