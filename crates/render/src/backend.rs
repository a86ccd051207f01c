use layers::labels::PlacedLabel2D;
use scene::components::GeometryId;

use crate::renderer::RenderFrame;
use crate::vertex::PackedMesh;

/// Sink for collected frames. A GPU backend uploads meshes once per build
/// and draws every submitted frame.
pub trait RenderBackend {
    fn resize(&mut self, width_px: u32, height_px: u32);

    fn upload(&mut self, meshes: &[(GeometryId, PackedMesh)]);

    fn submit(&mut self, frame: &RenderFrame, labels: &[PlacedLabel2D]);
}

/// What a [`RecordingBackend`] remembers about one submitted frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub frame_index: u64,
    pub commands: usize,
    pub labels: Vec<String>,
}

/// Headless backend that keeps the latest frame and a bounded history.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    pub size_px: [u32; 2],
    pub uploads: usize,
    pub uploaded_bytes: usize,
    pub last_frame: Option<RenderFrame>,
    history: Vec<FrameRecord>,
    history_limit: usize,
}

impl RecordingBackend {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history_limit,
            ..Self::default()
        }
    }

    pub fn history(&self) -> &[FrameRecord] {
        &self.history
    }
}

impl RenderBackend for RecordingBackend {
    fn resize(&mut self, width_px: u32, height_px: u32) {
        self.size_px = [width_px, height_px];
    }

    fn upload(&mut self, meshes: &[(GeometryId, PackedMesh)]) {
        self.uploads += 1;
        self.uploaded_bytes = meshes
            .iter()
            .map(|(_, m)| m.vertex_bytes().len() + m.index_bytes().len())
            .sum();
    }

    fn submit(&mut self, frame: &RenderFrame, labels: &[PlacedLabel2D]) {
        if self.history_limit > 0 {
            if self.history.len() == self.history_limit {
                self.history.remove(0);
            }
            self.history.push(FrameRecord {
                frame_index: frame.frame_index,
                commands: frame.commands.len(),
                labels: labels.iter().map(|l| l.text.clone()).collect(),
            });
        }
        self.last_frame = Some(frame.clone());
    }
}
