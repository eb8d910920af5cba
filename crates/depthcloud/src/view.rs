//! The view instance: owns navigation, cameras and the point cloud, and runs
//! the per-frame render loop body.

use crate::camera::OrbitInteraction;
use crate::config::ViewConfig;
use crate::error::{Error, Result};
use crate::events::{EventBus, InputEvent, Subscription};
use crate::geometry::build_geometry;
use crate::material::{build_material, build_mesh, PointCloud};
use crate::navigation::{CameraSelection, LookAroundController, NavigationState};
use crate::render::{RenderBackend, Scene};
use crate::rig::CameraRig;
use crate::source::{FrameSource, SourceMetadata};

pub struct DepthCloudView<T> {
    config: ViewConfig,
    nav: NavigationState,
    look: LookAroundController,
    rig: CameraRig,
    metadata: Option<SourceMetadata>,
    cloud: Option<PointCloud<T>>,
    subscription: Subscription,
}

impl<T> DepthCloudView<T> {
    /// Sets up cameras and navigation and starts listening on `bus`.
    /// Nothing is drawn until the frame source reports its metadata.
    pub fn mount(config: ViewConfig, bus: &mut EventBus, width: u32, height: u32) -> Result<Self> {
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(Error::MissingRenderTarget(format!(
                "viewport has no area ({}x{})",
                width, height
            )));
        }

        let aspect = width as f32 / height as f32;
        let rig = CameraRig::new(aspect, config.look_radius, config.initial_camera);
        let look = LookAroundController::new(config.look_sensitivity, config.look_radius);
        let nav = NavigationState::new(config.initial_camera);

        log::info!(
            "Mounted depth cloud view at {}x{} ({} camera)",
            width,
            height,
            config.initial_camera.name()
        );

        Ok(Self {
            config,
            nav,
            look,
            rig,
            metadata: None,
            cloud: None,
            subscription: bus.subscribe(),
        })
    }

    /// Polls `source` for its one-time metadata signal and builds the point
    /// cloud when it fires.
    pub fn poll_source<S, B>(&mut self, source: &mut S, backend: &mut B) -> Result<()>
    where
        S: FrameSource + ?Sized,
        B: RenderBackend<Textures = T>,
    {
        match source.poll_ready() {
            Some(metadata) => self.on_metadata_ready(metadata, backend),
            None => Ok(()),
        }
    }

    pub fn on_metadata_ready<B>(&mut self, metadata: SourceMetadata, backend: &mut B) -> Result<()>
    where
        B: RenderBackend<Textures = T>,
    {
        if self.cloud.is_some() {
            log::warn!("Ignoring repeated metadata signal; point cloud already built");
            return Ok(());
        }

        log::info!(
            "Frame source ready: {}x{}, {} frames",
            metadata.width,
            metadata.height,
            metadata.frame_count
        );
        self.metadata = Some(metadata);
        self.build_point_cloud(backend)
    }

    /// Builds geometry, material and mesh for the known source.
    pub fn build_point_cloud<B>(&mut self, backend: &mut B) -> Result<()>
    where
        B: RenderBackend<Textures = T>,
    {
        let metadata = self.metadata.ok_or(Error::SourceNotReady)?;
        let (width, height) = self.config.grid_for(metadata.width, metadata.height);

        backend.check_grid(width, height)?;
        let geometry = build_geometry(width, height)?;
        let textures = backend.create_textures(&metadata)?;
        let material = build_material(textures, self.config.uniforms_for(width, height))?;
        let cloud = build_mesh(geometry, material)?;

        backend.prepare_mesh(&cloud)?;
        log::info!("Point cloud built: {} points", cloud.point_count());

        self.cloud = Some(cloud);
        Ok(())
    }

    /// Handles everything published on the bus since the last call.
    pub fn pump_events(&mut self) {
        let events: Vec<InputEvent> = self.subscription.drain().collect();
        for event in events {
            self.handle_input(event);
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown { x, y } => {
                self.look.press(&mut self.nav, x, y);
                self.rig.orbit_mut().pointer_down(x, y);
            }
            InputEvent::PointerMove { x, y } => {
                self.look.drag_to(&mut self.nav, x, y);
                self.rig.orbit_mut().pointer_move(x, y);
            }
            InputEvent::PointerUp => {
                self.look.release(&mut self.nav);
                self.rig.orbit_mut().pointer_up();
            }
            InputEvent::Scroll { lines } => {
                self.rig.orbit_mut().scroll(lines);
            }
            InputEvent::Resize { width, height } => {
                log::debug!("Viewport resized to {}x{}", width, height);
                self.rig.resize(width, height);
            }
        }
    }

    pub fn select_camera(&mut self, selected: CameraSelection) {
        if self.nav.selected == selected {
            return;
        }
        log::info!("Switching to {} camera", selected.name());
        self.nav.selected = selected;
        self.rig.transition(selected);
    }

    /// One render loop tick. Returns whether a frame was rendered; before the
    /// point cloud exists this does nothing at all.
    pub fn tick<B>(&mut self, dt: f32, backend: &mut B) -> std::result::Result<bool, B::Error>
    where
        B: RenderBackend<Textures = T>,
    {
        let Some(cloud) = self.cloud.as_ref() else {
            return Ok(false);
        };

        self.rig.update(dt, &self.nav, &self.look);

        let show_helper =
            self.rig.helper_visible() && self.nav.selected == CameraSelection::Outside;
        let scene = Scene {
            cloud,
            helper: show_helper.then(|| self.rig.inside()),
        };

        backend.render(&scene, self.rig.active(self.nav.selected))?;
        Ok(true)
    }

    pub fn is_ready(&self) -> bool {
        self.cloud.is_some()
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn look_around_mut(&mut self) -> &mut LookAroundController {
        &mut self.look
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn cloud(&self) -> Option<&PointCloud<T>> {
        self.cloud.as_ref()
    }

    pub fn cloud_mut(&mut self) -> Option<&mut PointCloud<T>> {
        self.cloud.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;
    use std::convert::Infallible;

    #[derive(Default)]
    struct Recorder {
        textures_created: usize,
        meshes_prepared: usize,
        renders: Vec<(f32, bool)>,
        /// Largest grid or texture edge accepted, if limited.
        max_dimension: Option<u32>,
    }

    impl Recorder {
        fn limited(max_dimension: u32) -> Self {
            Self {
                max_dimension: Some(max_dimension),
                ..Self::default()
            }
        }

        fn fits(&self, width: u32, height: u32) -> Result<()> {
            match self.max_dimension {
                Some(max) if width > max || height > max => Err(Error::InvalidConfig(format!(
                    "{}x{} exceeds {}",
                    width, height, max
                ))),
                _ => Ok(()),
            }
        }
    }

    impl RenderBackend for Recorder {
        type Textures = ();
        type Error = Infallible;

        fn check_grid(&self, width: u32, height: u32) -> Result<()> {
            self.fits(width, height)
        }

        fn create_textures(&mut self, metadata: &SourceMetadata) -> Result<()> {
            self.fits(metadata.width, metadata.height)?;
            self.textures_created += 1;
            Ok(())
        }

        fn prepare_mesh(&mut self, _cloud: &PointCloud<()>) -> Result<()> {
            self.meshes_prepared += 1;
            Ok(())
        }

        fn render(
            &mut self,
            scene: &Scene<'_, ()>,
            camera: &PerspectiveCamera,
        ) -> std::result::Result<(), Infallible> {
            self.renders.push((camera.fov_y_deg, scene.helper.is_some()));
            Ok(())
        }
    }

    /// Becomes ready after a fixed number of polls.
    struct Scripted {
        polls_until_ready: usize,
        metadata: SourceMetadata,
        fired: bool,
    }

    impl FrameSource for Scripted {
        fn poll_ready(&mut self) -> Option<SourceMetadata> {
            if self.fired {
                return None;
            }
            if self.polls_until_ready > 0 {
                self.polls_until_ready -= 1;
                return None;
            }
            self.fired = true;
            Some(self.metadata)
        }

        fn metadata(&self) -> Option<SourceMetadata> {
            self.fired.then_some(self.metadata)
        }

        fn advance(&mut self, _dt: f32) -> Option<crate::source::FramePair<'_>> {
            None
        }

        fn sync(&mut self) {}
    }

    const META: SourceMetadata = SourceMetadata {
        width: 800,
        height: 600,
        frame_count: 1,
    };

    fn mounted(bus: &mut EventBus) -> DepthCloudView<()> {
        DepthCloudView::mount(ViewConfig::default(), bus, 1280, 720).unwrap()
    }

    #[test]
    fn test_ticks_before_metadata_are_noops() {
        let mut bus = EventBus::new();
        let mut view = mounted(&mut bus);
        let mut backend = Recorder::default();
        let mut source = Scripted {
            polls_until_ready: 3,
            metadata: META,
            fired: false,
        };

        let outside_before = view.rig().outside().clone();
        let inside_before = view.rig().inside().clone();
        for _ in 0..3 {
            view.poll_source(&mut source, &mut backend).unwrap();
            assert_eq!(view.tick(0.016, &mut backend), Ok(false));
        }
        assert!(backend.renders.is_empty());
        assert_eq!(backend.textures_created, 0);
        assert_eq!(view.rig().outside(), &outside_before);
        assert_eq!(view.rig().inside(), &inside_before);

        view.poll_source(&mut source, &mut backend).unwrap();
        assert!(view.is_ready());
        assert_eq!(view.tick(0.016, &mut backend), Ok(true));
        assert_eq!(backend.renders.len(), 1);
        assert_eq!(backend.meshes_prepared, 1);
    }

    #[test]
    fn test_one_render_per_tick_against_active_camera() {
        let mut bus = EventBus::new();
        let mut view = mounted(&mut bus);
        let mut backend = Recorder::default();
        view.on_metadata_ready(META, &mut backend).unwrap();

        view.tick(0.016, &mut backend).unwrap();
        view.select_camera(CameraSelection::Inside);
        view.tick(0.016, &mut backend).unwrap();

        assert_eq!(
            backend.renders,
            vec![
                (crate::rig::OUTSIDE_FOV_DEG, true),
                (crate::rig::INSIDE_FOV_DEG, false)
            ]
        );
    }

    #[test]
    fn test_build_before_metadata_is_rejected() {
        let mut bus = EventBus::new();
        let mut view = mounted(&mut bus);
        let mut backend = Recorder::default();
        assert_eq!(view.build_point_cloud(&mut backend), Err(Error::SourceNotReady));
        assert!(!view.is_ready());
    }

    #[test]
    fn test_grid_follows_metadata_unless_overridden() {
        let mut bus = EventBus::new();
        let mut backend = Recorder::default();

        let mut view = mounted(&mut bus);
        view.on_metadata_ready(META, &mut backend).unwrap();
        let geometry = view.cloud().unwrap().geometry();
        assert_eq!((geometry.width(), geometry.height()), (800, 600));
        assert_eq!(geometry.positions().len(), 800 * 600 * 3);

        let config = ViewConfig {
            grid_width: Some(320),
            grid_height: Some(240),
            ..ViewConfig::default()
        };
        let mut view: DepthCloudView<()> =
            DepthCloudView::mount(config, &mut bus, 1280, 720).unwrap();
        view.on_metadata_ready(META, &mut backend).unwrap();
        assert_eq!(view.cloud().unwrap().material().uniforms.width, 320);
    }

    #[test]
    fn test_repeated_metadata_does_not_rebuild() {
        let mut bus = EventBus::new();
        let mut view = mounted(&mut bus);
        let mut backend = Recorder::default();
        view.on_metadata_ready(META, &mut backend).unwrap();
        view.on_metadata_ready(META, &mut backend).unwrap();
        assert_eq!(backend.meshes_prepared, 1);
    }

    #[test]
    fn test_drag_scenario_through_bus() {
        let mut bus = EventBus::new();
        let mut view = mounted(&mut bus);
        view.select_camera(CameraSelection::Inside);

        bus.publish(InputEvent::PointerDown { x: 100.0, y: 100.0 });
        bus.publish(InputEvent::PointerMove { x: 150.0, y: 80.0 });
        bus.publish(InputEvent::PointerUp);
        view.pump_events();

        let nav = view.navigation();
        assert!((nav.longitude - -5.0).abs() < 1e-5);
        assert!((nav.latitude - -2.0).abs() < 1e-5);
        assert!(!nav.dragging);
    }

    #[test]
    fn test_camera_round_trip_keeps_orientation() {
        let mut bus = EventBus::new();
        let mut view = mounted(&mut bus);
        view.look_around_mut().sensitivity = 1.0;

        view.select_camera(CameraSelection::Inside);
        assert!(!view.rig().orbit().enabled());

        view.handle_input(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        view.handle_input(InputEvent::PointerMove { x: -30.0, y: 10.0 });
        view.handle_input(InputEvent::PointerUp);
        assert_eq!((view.navigation().longitude, view.navigation().latitude), (30.0, 10.0));

        view.select_camera(CameraSelection::Outside);
        assert!(view.rig().orbit().enabled());
        view.select_camera(CameraSelection::Inside);

        assert_eq!((view.navigation().longitude, view.navigation().latitude), (30.0, 10.0));
    }

    #[test]
    fn test_resize_reaches_both_cameras() {
        let mut bus = EventBus::new();
        let mut view = mounted(&mut bus);

        bus.publish(InputEvent::Resize { width: 600, height: 600 });
        view.pump_events();

        assert_eq!(view.rig().outside().aspect, 1.0);
        assert_eq!(view.rig().inside().aspect, 1.0);
    }

    #[test]
    fn test_teardown_unsubscribes() {
        let mut bus = EventBus::new();
        let view = mounted(&mut bus);
        assert_eq!(bus.listener_count(), 1);

        drop(view);
        bus.publish(InputEvent::PointerUp);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_oversized_grid_rejected_before_allocation() {
        let mut bus = EventBus::new();
        let config = ViewConfig {
            grid_width: Some(10_000),
            grid_height: Some(10_000),
            ..ViewConfig::default()
        };
        let mut view: DepthCloudView<()> =
            DepthCloudView::mount(config, &mut bus, 1280, 720).unwrap();
        let mut backend = Recorder::limited(4096);

        let result = view.on_metadata_ready(META, &mut backend);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
        assert!(!view.is_ready());
        assert_eq!(backend.textures_created, 0);
        assert_eq!(backend.meshes_prepared, 0);
        assert_eq!(view.tick(0.016, &mut backend), Ok(false));
    }

    #[test]
    fn test_oversized_source_rejected() {
        let mut bus = EventBus::new();
        let mut view = mounted(&mut bus);
        let mut backend = Recorder::limited(512);
        let config_grid = ViewConfig {
            grid_width: Some(320),
            grid_height: Some(240),
            ..ViewConfig::default()
        };
        let mut small_grid: DepthCloudView<()> =
            DepthCloudView::mount(config_grid, &mut bus, 1280, 720).unwrap();

        // 800x600 frames do not fit in 512-texel textures, whatever the grid.
        assert!(matches!(
            view.on_metadata_ready(META, &mut backend),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            small_grid.on_metadata_ready(META, &mut backend),
            Err(Error::InvalidConfig(_))
        ));
        assert_eq!(backend.meshes_prepared, 0);
    }

    #[test]
    fn test_mount_rejects_empty_viewport() {
        let mut bus = EventBus::new();
        let result = DepthCloudView::<()>::mount(ViewConfig::default(), &mut bus, 0, 720);
        assert!(matches!(result, Err(Error::MissingRenderTarget(_))));
    }
}
