use foundation::color::Color;
use foundation::math::Vec3;
use formats::model::MeshPose;
use layers::overlays::Overlays;
use scene::World;
use scene::components::{GeometryId, GeometryRole, Material, Transform};
use scene::entity::EntityId;

use crate::camera::PerspectiveCamera;
use crate::debug::{DebugLines, DebugToggles, axes_lines, frustum_lines, light_markers};
use crate::lights::Light;

/// Segments used to draw each flight arc.
const ARC_SEGMENTS: usize = 24;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Mesh {
        entity: EntityId,
        transform: Transform,
        geometry: GeometryId,
        role: GeometryRole,
        material: Material,
    },
    Line {
        entity: EntityId,
        transform: Transform,
        geometry: GeometryId,
        color: Color,
        width_px: f32,
    },
    Marker {
        position: Vec3,
        radius: f64,
        color: Color,
        opacity: f32,
    },
    FlightArc {
        points: Vec<Vec3>,
        head: Vec3,
        color: Color,
    },
    Radar {
        center: Vec3,
        radius: f64,
        angle_rad: f64,
        color: Color,
    },
    Model {
        instance: usize,
        transform: Transform,
        poses: Vec<MeshPose>,
    },
    Light(Light),
    Debug(DebugLines),
}

impl RenderCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            RenderCommand::Mesh { .. } => "mesh",
            RenderCommand::Line { .. } => "line",
            RenderCommand::Marker { .. } => "marker",
            RenderCommand::FlightArc { .. } => "flight",
            RenderCommand::Radar { .. } => "radar",
            RenderCommand::Model { .. } => "model",
            RenderCommand::Light(_) => "light",
            RenderCommand::Debug(_) => "debug",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderFrame {
    pub frame_index: u64,
    pub view_proj: [[f32; 4]; 4],
    pub viewport_px: [f64; 2],
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn count(&self, kind: &str) -> usize {
        self.commands.iter().filter(|c| c.kind() == kind).count()
    }
}

/// Everything besides the world that goes into a frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    pub frame_index: u64,
    pub camera: &'a PerspectiveCamera,
    pub overlays: Option<&'a Overlays>,
    pub lights: &'a [Light],
    pub debug: DebugToggles,
}

pub struct Renderer;

impl Renderer {
    /// Collects one backend-agnostic frame.
    ///
    /// Meshes and lines carry the full world transform (root included).
    /// Overlay positions are root-local and are mapped through the root here.
    pub fn collect(world: &World, inputs: FrameInputs<'_>) -> RenderFrame {
        let camera = inputs.camera;
        let mut frame = RenderFrame {
            frame_index: inputs.frame_index,
            view_proj: camera.view_proj(),
            viewport_px: camera.size_px(),
            commands: Vec::new(),
        };

        frame
            .commands
            .extend(inputs.lights.iter().copied().map(RenderCommand::Light));

        for (entity, transform, component) in world.drawables() {
            let Some(material) = world.material(entity).copied() else {
                continue;
            };
            let cmd = match (component.role, material) {
                (GeometryRole::EdgeLine, Material::Line { color, width_px }) => {
                    RenderCommand::Line {
                        entity,
                        transform,
                        geometry: component.id,
                        color,
                        width_px,
                    }
                }
                (role, material) => RenderCommand::Mesh {
                    entity,
                    transform,
                    geometry: component.id,
                    role,
                    material,
                },
            };
            frame.commands.push(cmd);
        }

        if let Some(overlays) = inputs.overlays {
            collect_overlays(&world.root(), overlays, &mut frame.commands);
        }

        if inputs.debug.frustum {
            frame
                .commands
                .push(RenderCommand::Debug(frustum_lines(camera)));
        }
        if inputs.debug.axes {
            let length = camera.size_px()[1] * 0.25;
            frame
                .commands
                .extend(axes_lines(length).into_iter().map(RenderCommand::Debug));
        }
        if inputs.debug.lights {
            frame
                .commands
                .push(RenderCommand::Debug(light_markers(inputs.lights, 8.0)));
        }

        frame
    }
}

fn collect_overlays(root: &Transform, overlays: &Overlays, out: &mut Vec<RenderCommand>) {
    let uniform = root.scale.x;

    let markers = &overlays.markers;
    let ms = markers.settings();
    if ms.enabled {
        for m in markers.markers() {
            out.push(RenderCommand::Marker {
                position: root.apply(m.position),
                radius: ms.radius * m.scale * uniform,
                color: ms.color,
                opacity: markers.opacity(m) as f32,
            });
        }
    }

    let color = overlays.flights.settings().color;
    for path in overlays.flights.paths() {
        let points = (0..=ARC_SEGMENTS)
            .map(|i| root.apply(path.curve.point(i as f64 / ARC_SEGMENTS as f64)))
            .collect();
        out.push(RenderCommand::FlightArc {
            points,
            head: root.apply(path.head()),
            color,
        });
    }

    let radar = &overlays.radar;
    for (i, plane) in radar.planes().iter().enumerate() {
        out.push(RenderCommand::Radar {
            center: root.apply(plane.position),
            radius: plane.radius * uniform,
            angle_rad: radar.angle(i).unwrap_or(0.0),
            color: plane.color,
        });
    }

    let models = &overlays.models;
    if models.settings().enabled {
        let scale = models.settings().scale;
        for (i, inst) in models.instances().iter().enumerate() {
            let Some(poses) = models.poses(i) else {
                continue;
            };
            let local = Transform::scale_then_translate(scale, inst.position);
            out.push(RenderCommand::Model {
                instance: i,
                transform: root.compose(&local),
                poses,
            });
        }
    }
}
