use compute::analysis::Period;
use formats::geojson::{BoundaryCollection, GeoJsonError};
use formats::time_series::MetricSeries;
use layers::Animated;
use layers::extrude::{BuildReport, build_regions};
use layers::labels::{LabelsConfig, LabelsLayer};
use layers::normalize::{ScaleNormalizer, ViewportSize};
use layers::overlays::Overlays;
use layers::symbology::{ColorMode, RecolorReport, Selection, recolor};
use render::camera::PerspectiveCamera;
use render::label_layer::LabelLayer;
use render::renderer::{FrameInputs, Renderer};
use render::vertex::pack_world;
use render::RenderBackend;
use runtime::event_bus::{Event, EventBus};
use runtime::frame::{Frame, FrameClock};
use runtime::metrics::{Metrics, names};
use scene::World;
use scene::components::{GeometryRole, Material, RegionProperties, Transform};
use scene::picking::{PickIndex, PickOptions};
use scene::regions::RegionRegistry;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, MapConfig};
use crate::events::MapEvent;
use crate::interaction::{HoverState, Interaction, Tooltip};
use crate::loader::{ModelLoader, ModelSource};
use crate::navigation::NavigationStack;

/// One interactive map bound to a render backend.
pub struct MapView<B: RenderBackend> {
    config: MapConfig,
    world: World,
    regions: RegionRegistry,
    pick_index: PickIndex,
    normalizer: ScaleNormalizer,
    camera: PerspectiveCamera,
    labels: LabelsLayer,
    label_layer: LabelLayer,
    overlays: Overlays,
    series: MetricSeries,
    period: Period,
    color_mode: ColorMode,
    interaction: Interaction,
    navigation: NavigationStack,
    loader: ModelLoader,
    events: EventBus<MapEvent>,
    clock: FrameClock,
    metrics: Metrics,
    report: BuildReport,
    listeners_attached: bool,
    backend: B,
}

impl<B: RenderBackend> MapView<B> {
    pub fn new(config: MapConfig, width_px: f64, height_px: f64, mut backend: B) -> Self {
        backend.resize(width_px.max(0.0) as u32, height_px.max(0.0) as u32);
        let mut view = Self {
            world: World::new(),
            regions: RegionRegistry::new(),
            pick_index: PickIndex::default(),
            normalizer: ScaleNormalizer::new(config.fit_settings()),
            camera: PerspectiveCamera::new(width_px, height_px, config.camera_tilt_deg.to_radians()),
            labels: LabelsLayer::new(1, LabelsConfig::default()),
            label_layer: LabelLayer::new(width_px, height_px),
            overlays: Overlays::new(2, &config.overlays),
            series: MetricSeries::new(),
            period: config.initial_period,
            color_mode: config.color_mode,
            interaction: Interaction::default(),
            navigation: NavigationStack::new(),
            loader: ModelLoader::new(),
            events: EventBus::new(),
            clock: FrameClock::new(config.max_frame_dt_s),
            metrics: Metrics::new(),
            report: BuildReport::default(),
            listeners_attached: false,
            backend,
            config,
        };
        view.attach_listeners();
        view
    }

    /// Parses a GeoJSON document and builds it.
    pub fn load_boundaries_json(&mut self, payload: &str) -> Result<&BuildReport, GeoJsonError> {
        let collection = BoundaryCollection::from_geojson_str(payload)?;
        Ok(self.load_boundaries(&collection))
    }

    /// Replaces the current map with `collection`, projected for the current
    /// navigation depth.
    pub fn load_boundaries(&mut self, collection: &BoundaryCollection) -> &BuildReport {
        self.dispose_map();

        let projection = self
            .navigation
            .projection(self.config.root_center, &self.config.level_scales);
        let style = self.config.extrude_style();
        let built = build_regions(collection, &projection, &style, &mut self.world, &mut self.regions);
        self.pick_index = PickIndex::build(&self.world);

        let bounds = self.world.local_bounds_of_role(GeometryRole::TopFace);
        self.normalizer.reset(bounds);
        self.normalizer.fit(self.viewport());
        self.world.set_root(self.normalizer.root_transform());

        self.labels.set_anchors(&built.anchors);
        self.overlays.populate(&built.anchors);
        self.apply_metric_colors();
        self.backend.upload(&pack_world(&self.world));
        self.request_configured_model();

        let report = built.report;
        for skipped in &report.skipped_features {
            warn!(adcode = ?skipped.adcode, reason = %skipped.reason, "feature skipped");
        }
        info!(
            regions = report.regions_built,
            polygons = report.polygons_built,
            skipped_polygons = report.polygons_skipped,
            skipped_features = report.skipped_features.len(),
            scale = self.normalizer.scale(),
            "map built"
        );
        self.metrics.add(names::REGIONS_BUILT, report.regions_built as u64);
        self.metrics
            .add(names::FEATURES_SKIPPED, report.skipped_features.len() as u64);
        self.events.emit(MapEvent::BuildFinished {
            regions: report.regions_built,
            skipped_features: report.skipped_features.len(),
            skipped_polygons: report.polygons_skipped,
        });
        self.report = report;
        &self.report
    }

    /// Tears the map down: listeners detach, pending loads are dropped and
    /// every entity is released. The view can be rebuilt afterwards.
    pub fn dispose(&mut self) {
        self.detach_listeners();
        self.dispose_map();
        self.report = BuildReport::default();
        info!("map disposed");
    }

    fn dispose_map(&mut self) {
        self.interaction.reset();
        self.loader.cancel();
        self.overlays.clear();
        self.labels.clear();
        self.label_layer.clear();
        self.regions.clear();
        let dropped = self.world.clear();
        self.pick_index = PickIndex::default();
        if dropped > 0 {
            debug!(entities = dropped, "previous map disposed");
        }
    }

    pub fn set_series(&mut self, series: MetricSeries) {
        self.series = series;
        self.apply_metric_colors();
    }

    pub fn select_period(&mut self, period: Period) {
        self.period = period;
        self.apply_metric_colors();
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.color_mode = mode;
        self.apply_metric_colors();
    }

    /// Recolors top faces. Without a series every region shows the base fill.
    fn apply_metric_colors(&mut self) -> RecolorReport {
        let hovered = self.interaction.state().adcode();
        let report = if self.series.is_empty() {
            let fill = self.config.base_fill;
            for record in self.regions.iter_mut() {
                record.value = None;
                record.base_color = fill;
                if hovered == Some(record.adcode()) {
                    continue;
                }
                for e in &record.top_faces {
                    if let Some(m) = self.world.material_mut(*e) {
                        m.set_solid_color(fill, 1.0);
                    }
                }
            }
            RecolorReport::default()
        } else {
            let selection = Selection {
                period: self.period,
                mode: self.color_mode,
            };
            recolor(
                &mut self.world,
                &mut self.regions,
                &self.series,
                selection,
                &self.config.palette,
                hovered,
            )
        };
        self.metrics.incr(names::RECOLOR_PASSES);
        debug!(
            period = %self.period,
            with_data = report.with_data,
            no_data = report.no_data,
            "recolored"
        );
        report
    }

    /// Swaps the configuration without rebuilding geometry.
    pub fn set_config(&mut self, config: MapConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let refit = config.fit_margin != self.config.fit_margin;
        let tilt_changed = config.camera_tilt_deg != self.config.camera_tilt_deg;
        self.config = config;

        for record in self.regions.iter() {
            for e in &record.side_walls {
                self.world.set_material(
                    *e,
                    Material::VerticalGradient {
                        bottom: self.config.side_bottom,
                        top: self.config.side_top,
                        opacity: 1.0,
                    },
                );
            }
            for e in &record.bottoms {
                self.world.set_material(*e, Material::solid(self.config.side_bottom));
            }
            for e in &record.edge_lines {
                self.world.set_material(
                    *e,
                    Material::Line {
                        color: self.config.edge_color,
                        width_px: self.config.edge_width_px,
                    },
                );
            }
        }

        self.normalizer.set_settings(self.config.fit_settings());
        if refit {
            self.normalizer.fit(self.viewport());
        }
        if tilt_changed {
            self.camera.tilt_rad = self.config.camera_tilt_deg.to_radians();
        }
        self.clock.set_max_dt_s(self.config.max_frame_dt_s);
        self.overlays.apply_settings(&self.config.overlays);
        self.apply_metric_colors();
        self.interaction
            .repaint(&mut self.world, &self.regions, self.config.hover);
        self.request_configured_model();
        info!("config applied");
        Ok(())
    }

    fn request_configured_model(&mut self) {
        let models = &self.config.overlays.models;
        if !models.enabled || self.overlays.models.asset().is_some() || self.loader.is_pending() {
            return;
        }
        if let Some(path) = models.path.clone() {
            let generation = self.loader.request(ModelSource::Path(path.into()));
            debug!(generation, "model load requested");
        }
    }

    /// Starts loading a model from an explicit source, replacing any pending load.
    pub fn load_model(&mut self, source: ModelSource) {
        let generation = self.loader.request(source);
        debug!(generation, "model load requested");
    }

    pub fn cancel_model_load(&mut self) {
        self.loader.cancel();
    }

    fn poll_loader(&mut self) {
        match self.loader.poll() {
            None => {}
            Some(Ok(asset)) => {
                let name = asset.name.clone();
                self.overlays.models.set_asset(asset);
                let instances = self.overlays.models.instances().len();
                info!(model = %name, instances, "model loaded");
                self.events.emit(MapEvent::ModelLoaded { name, instances });
            }
            Some(Err(e)) => {
                warn!(error = %e, "model load failed; continuing without models");
                self.events.emit(MapEvent::ModelFailed {
                    reason: e.to_string(),
                });
            }
        }
    }

    pub fn resize(&mut self, width_px: f64, height_px: f64) {
        if !self.listeners_attached {
            return;
        }
        self.camera.resize(width_px, height_px);
        self.label_layer.resize(width_px, height_px);
        self.backend
            .resize(width_px.max(0.0) as u32, height_px.max(0.0) as u32);
        let target = self.normalizer.fit(self.viewport());
        debug!(width_px, height_px, target, "resized");
    }

    fn viewport(&self) -> ViewportSize {
        let [w, h] = self.camera.size_px();
        ViewportSize::new(w, h)
    }

    /// Region under the screen point, if any. One ray cast.
    pub fn pick(&mut self, x_px: f64, y_px: f64) -> Option<i64> {
        let ray = self.camera.ray_from_screen(x_px, y_px);
        self.metrics.incr(names::RAY_CASTS);
        let hit = self
            .pick_index
            .pick(&self.world.root(), ray, PickOptions::default())?;
        self.metrics.incr(names::PICK_HITS);
        self.regions.owner_of(hit.entity).map(|r| r.adcode())
    }

    fn update_hover(&mut self, x_px: f64, y_px: f64) {
        let target = self.pick(x_px, y_px);
        self.set_hover(target);
    }

    /// One hover transition; emits `HoverChanged` when the region changes.
    fn set_hover(&mut self, target: Option<i64>) {
        let changed = self.interaction.hover(
            &mut self.world,
            &self.regions,
            target,
            self.config.hover,
            self.config.value_unit.as_deref(),
        );
        if changed {
            self.events.emit(MapEvent::HoverChanged {
                adcode: self.interaction.state().adcode(),
                tooltip: self.interaction.tooltip().cloned(),
            });
        }
    }

    pub fn pointer_move(&mut self, x_px: f64, y_px: f64) {
        if !self.listeners_attached {
            return;
        }
        self.interaction.set_pointer(Some([x_px, y_px]));
        self.update_hover(x_px, y_px);
    }

    /// The pointer left the canvas; ends any hover.
    pub fn pointer_leave(&mut self) {
        if !self.listeners_attached {
            return;
        }
        self.interaction.set_pointer(None);
        self.set_hover(None);
    }

    /// Emits one drill-down event when the point hits a region.
    pub fn double_click(&mut self, x_px: f64, y_px: f64) -> Option<i64> {
        if !self.listeners_attached {
            return None;
        }
        let adcode = self.pick(x_px, y_px)?;
        let properties = self.regions.get(adcode)?.properties.clone();
        info!(adcode, name = %properties.name, "drill-down requested");
        self.events.emit(MapEvent::DrillDown { properties });
        Some(adcode)
    }

    /// Records a drill into `region`; the next build uses its projection.
    pub fn push_region(&mut self, region: RegionProperties) {
        self.navigation.push(region);
    }

    pub fn pop_region(&mut self) -> Option<RegionProperties> {
        self.navigation.pop()
    }

    /// Advances one display refresh and submits the frame to the backend.
    pub fn frame(&mut self, raw_dt_s: f64) -> Frame {
        let frame = self.clock.tick(raw_dt_s);
        self.events.begin_frame(frame);
        self.metrics.incr(names::FRAMES);
        self.metrics.sample(names::FRAME_DT_MS, frame.dt_s * 1_000.0);

        self.normalizer.advance(frame.dt_s);
        self.world.set_root(self.normalizer.root_transform());
        self.overlays.advance(frame.dt_s);
        self.poll_loader();

        if self.listeners_attached
            && let Some([x, y]) = self.interaction.pointer()
        {
            self.update_hover(x, y);
        }

        let lights = self.config.lights.lights();
        let render_frame = Renderer::collect(
            &self.world,
            FrameInputs {
                frame_index: frame.index,
                camera: &self.camera,
                overlays: Some(&self.overlays),
                lights: &lights,
                debug: self.config.debug,
            },
        );
        self.metrics
            .add(names::DRAW_COMMANDS, render_frame.commands.len() as u64);
        self.label_layer
            .layout(&self.labels, &self.camera, self.world.root());
        self.backend.submit(&render_frame, self.label_layer.placed());
        frame
    }

    /// Returns `false` when already attached.
    pub fn attach_listeners(&mut self) -> bool {
        if self.listeners_attached {
            return false;
        }
        self.listeners_attached = true;
        debug!("listeners attached");
        true
    }

    /// Returns `false` when already detached.
    pub fn detach_listeners(&mut self) -> bool {
        if !self.listeners_attached {
            return false;
        }
        self.listeners_attached = false;
        debug!("listeners detached");
        true
    }

    pub fn listeners_attached(&self) -> bool {
        self.listeners_attached
    }

    pub fn drain_events(&mut self) -> Vec<Event<MapEvent>> {
        self.events.drain()
    }

    /// Screen position of a region's label anchor under the current fit.
    pub fn screen_position_of(&self, adcode: i64) -> Option<[f64; 2]> {
        let anchor = self.regions.get(adcode)?.anchor;
        self.camera.project(self.world.root().apply(anchor))
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn regions(&self) -> &RegionRegistry {
        &self.regions
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn overlays(&self) -> &Overlays {
        &self.overlays
    }

    pub fn labels(&self) -> &LabelLayer {
        &self.label_layer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn hover_state(&self) -> HoverState {
        self.interaction.state()
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.interaction.tooltip()
    }

    pub fn scale(&self) -> f64 {
        self.normalizer.scale()
    }

    pub fn target_scale(&self) -> f64 {
        self.normalizer.target_scale()
    }

    pub fn root_transform(&self) -> Transform {
        self.world.root()
    }

    pub fn navigation(&self) -> &NavigationStack {
        &self.navigation
    }
}

impl<B: RenderBackend> Drop for MapView<B> {
    fn drop(&mut self) {
        self.loader.cancel();
        self.detach_listeners();
    }
}

#[cfg(test)]
mod tests {
    use super::MapView;
    use crate::config::MapConfig;
    use crate::events::MapEvent;
    use render::RecordingBackend;

    const ONE_SQUARE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"adcode": 7, "name": "Seven"},
            "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
        }]
    }"#;

    fn view() -> MapView<RecordingBackend> {
        MapView::new(MapConfig::default(), 800.0, 600.0, RecordingBackend::new(4))
    }

    #[test]
    fn build_uploads_meshes_and_reports() {
        let mut view = view();
        let report = view.load_boundaries_json(ONE_SQUARE).expect("geojson");
        assert_eq!(report.regions_built, 1);
        assert_eq!(view.backend().uploads, 1);
        assert!(view.backend().uploaded_bytes > 0);
        let events = view.drain_events();
        assert!(matches!(
            events[0].payload,
            MapEvent::BuildFinished { regions: 1, .. }
        ));
    }

    #[test]
    fn not_a_feature_collection_is_an_error() {
        let mut view = view();
        assert!(view.load_boundaries_json(r#"{"type": "Feature"}"#).is_err());
    }

    #[test]
    fn listeners_detach_exactly_once() {
        let mut view = view();
        assert!(view.listeners_attached());
        assert!(!view.attach_listeners());
        assert!(view.detach_listeners());
        assert!(!view.detach_listeners());

        view.load_boundaries_json(ONE_SQUARE).expect("geojson");
        view.drain_events();
        view.pointer_move(400.0, 300.0);
        assert!(view.drain_events().is_empty());
    }

    #[test]
    fn dispose_releases_every_entity() {
        let mut view = view();
        view.load_boundaries_json(ONE_SQUARE).expect("geojson");
        view.dispose();
        assert!(view.world().is_empty());
        assert!(view.regions().is_empty());
        assert!(!view.listeners_attached());
        assert_eq!(view.report().regions_built, 0);
    }

    #[test]
    fn hover_tooltip_carries_the_unit_and_leave_clears_it() {
        let config = MapConfig {
            value_unit: Some("t".into()),
            ..MapConfig::default()
        };
        let mut view = MapView::new(config, 800.0, 600.0, RecordingBackend::new(4));
        view.load_boundaries_json(ONE_SQUARE).expect("geojson");
        view.set_series(
            formats::time_series::MetricSeries::from_json_str(
                r#"[{"adcode": 7, "data": {"2020": {"average": 1500}}}]"#,
            )
            .expect("series"),
        );
        view.drain_events();

        let [x, y] = view.screen_position_of(7).expect("on screen");
        view.pointer_move(x, y);
        assert_eq!(view.tooltip().map(|t| t.text.as_str()), Some("1,500 t"));

        view.pointer_leave();
        let payloads: Vec<MapEvent> = view.drain_events().into_iter().map(|e| e.payload).collect();
        assert_eq!(payloads.len(), 2);
        assert!(matches!(
            payloads[1],
            MapEvent::HoverChanged {
                adcode: None,
                tooltip: None
            }
        ));
    }

    #[test]
    fn frames_reach_the_backend_with_labels() {
        let mut view = view();
        view.load_boundaries_json(ONE_SQUARE).expect("geojson");
        view.frame(1.0 / 60.0);
        view.frame(1.0 / 60.0);
        let history = view.backend().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].frame_index, 1);
        assert_eq!(history[1].labels, vec!["Seven".to_string()]);
        assert!(view.metrics().counter(runtime::metrics::names::DRAW_COMMANDS) > 0);
    }

    #[test]
    fn config_swap_restyles_side_walls_without_rebuild() {
        let mut view = view();
        view.load_boundaries_json(ONE_SQUARE).expect("geojson");
        let entities = view.world().len();
        let config = MapConfig {
            side_top: foundation::color::Color::WHITE,
            ..MapConfig::default()
        };
        view.set_config(config).expect("valid");
        assert_eq!(view.world().len(), entities);
        let wall = view.regions().get(7).expect("region").side_walls[0];
        assert_eq!(
            view.world().material(wall).map(|m| m.color()),
            Some(foundation::color::Color::WHITE)
        );
    }
}
