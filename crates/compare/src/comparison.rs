use std::cell::RefCell;
use std::rc::Rc;

use foundation::bounds::ScreenRect;
use foundation::time::CalendarDate;
use foundation::view::ViewState;
use layers::{BasemapRegistry, Layer, LayerId, TileLayerFactory};
use runtime::metrics::{Metrics, MetricsSnapshot};
use runtime::scope::ListenerHost;
use streaming::{TileCoord, TileLoadState};
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::error::SelectionError;
use crate::notify::{TileFailureNotice, TileFailureNotifier};
use crate::registry::{SharedViewport, ViewportRegistry};
use crate::selection::{ComparisonSelection, SelectionWarning};
use crate::slider::{DragState, PaneSplit, SliderController};
use crate::surface::SurfaceProvider;
use crate::sync::ViewSyncCoordinator;
use crate::viewport::ViewportRole;

/// Counter and gauge names reported by [`ComparisonView::metrics`].
pub mod metric_names {
    pub const CREATED: &str = "viewports.created";
    pub const DESTROYED: &str = "viewports.destroyed";
    pub const LIVE: &str = "viewports.live";
    pub const TILES_IN_FLIGHT: &str = "tiles.in_flight";
    pub const TILES_FAILED: &str = "tiles.failed";
    pub const ENTER: &str = "mode.enter_comparison";
    pub const EXIT: &str = "mode.exit_comparison";
    pub const BASEMAP: &str = "basemap.switches";
    pub const DRAGS: &str = "slider.drags";
    pub const MIRRORED: &str = "sync.mirrored";
    pub const NOTICES: &str = "notices.raised";
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewMode {
    Single,
    Comparison,
}

/// Composition root: one map, or a synchronized before/after pair with a
/// reveal slider.
///
/// Mode switches tear the current viewports down before creating the next
/// set. The sync link is created after both panes exist and removed before
/// either is destroyed.
pub struct ComparisonView {
    factory: TileLayerFactory,
    basemaps: BasemapRegistry,
    basemap_id: &'static str,
    surfaces: Box<dyn SurfaceProvider>,
    registry: ViewportRegistry,
    sync: ViewSyncCoordinator,
    slider: SliderController,
    notifier: Rc<RefCell<TileFailureNotifier>>,
    selection: Option<ComparisonSelection>,
    mode: ViewMode,
    last_view: ViewState,
    metrics: Metrics,
}

impl std::fmt::Debug for ComparisonView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparisonView")
            .field("mode", &self.mode)
            .field("basemap", &self.basemap_id)
            .field("viewports", &self.registry.roles())
            .field("slider", &self.slider)
            .field("selection", &self.selection)
            .finish()
    }
}

impl ComparisonView {
    /// Starts in single mode at the configured view and basemap.
    pub fn new(
        config: ViewerConfig,
        surfaces: Box<dyn SurfaceProvider>,
        host: Rc<dyn ListenerHost>,
    ) -> Self {
        let basemaps = config.basemaps();
        let basemap_id = basemaps.default_id();
        let mut view = Self {
            factory: config.tile_factory(),
            basemaps,
            basemap_id,
            surfaces,
            registry: ViewportRegistry::new(),
            sync: ViewSyncCoordinator::new(),
            slider: SliderController::new(host, config.slider_position),
            notifier: Rc::new(RefCell::new(TileFailureNotifier::new())),
            selection: None,
            mode: ViewMode::Single,
            last_view: config.default_view(),
            metrics: Metrics::new(),
        };
        view.create_single(view.last_view);
        view
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn basemap_id(&self) -> &'static str {
        self.basemap_id
    }

    pub fn selection(&self) -> Option<&ComparisonSelection> {
        self.selection.as_ref()
    }

    pub fn viewport(&self, role: ViewportRole) -> Option<SharedViewport> {
        self.registry.get(role)
    }

    pub fn viewport_count(&self) -> usize {
        self.registry.live_count()
    }

    pub fn is_synchronized(&self) -> bool {
        self.sync.is_linked()
    }

    /// Silent sets performed by the current pair's link.
    pub fn mirrored_count(&self) -> u64 {
        self.sync.mirrored_count()
    }

    /// View of the single viewport, or the before pane in comparison mode.
    /// Falls back to the last known view when nothing is mounted.
    pub fn active_view_state(&self) -> ViewState {
        let primary = match self.mode {
            ViewMode::Single => ViewportRole::Single,
            ViewMode::Comparison => ViewportRole::Before,
        };
        self.registry
            .get(primary)
            .or_else(|| primary.peer().and_then(|p| self.registry.get(p)))
            .map_or(self.last_view, |vp| vp.borrow().view_state())
    }

    /// Replaces the current viewports with a before/after pair for
    /// `selection`, starting at the current view.
    ///
    /// Calling this again while comparing rebuilds the pair.
    pub fn enter_comparison_mode(
        &mut self,
        selection: ComparisonSelection,
    ) -> Result<Vec<SelectionWarning>, SelectionError> {
        let warnings = selection.validate(CalendarDate::today())?;
        for w in &warnings {
            warn!(warning = %w, "comparison selection");
        }

        let initial = self.active_view_state();
        self.teardown_viewports();
        self.notifier.borrow_mut().reset();

        let imagery = selection.imagery_type();
        if imagery.is_none() {
            warn!(imagery = %selection.imagery, "unknown imagery, showing basemap only");
        }
        let before = self.create_pane(ViewportRole::Before, initial, &selection, selection.start);
        let after = self.create_pane(ViewportRole::After, initial, &selection, selection.end);
        if let (Some(before), Some(after)) = (&before, &after) {
            self.sync.link(before, after, initial);
        } else {
            warn!("comparison pair incomplete, panes are not synchronized");
        }

        info!(
            imagery = %selection.imagery,
            start = %selection.start,
            end = %selection.end,
            "comparison mode"
        );
        self.last_view = initial;
        self.selection = Some(selection);
        self.mode = ViewMode::Comparison;
        self.metrics.incr(metric_names::ENTER);
        Ok(warnings)
    }

    /// Back to one viewport at the pair's last view. `false` if not
    /// comparing.
    pub fn exit_comparison_mode(&mut self) -> bool {
        if self.mode != ViewMode::Comparison {
            return false;
        }
        let view = self.active_view_state();
        self.teardown_viewports();
        self.slider.end_drag();
        self.selection = None;
        self.mode = ViewMode::Single;
        self.last_view = view;
        self.create_single(view);
        self.metrics.incr(metric_names::EXIT);
        info!(?view, "single mode");
        true
    }

    /// Swaps the basemap on every live viewport. Overlays and views are
    /// kept. Unknown ids resolve to the registry default.
    pub fn switch_basemap(&mut self, id: &str) -> &'static str {
        let resolved = self.basemaps.resolve_id(id);
        self.basemap_id = resolved;
        let descriptor = self.basemaps.lookup(resolved).clone();
        for role in self.registry.roles() {
            if let Some(vp) = self.registry.get(role) {
                vp.borrow_mut().attach_layer(descriptor.clone());
            }
        }
        self.metrics.incr(metric_names::BASEMAP);
        debug!(basemap = resolved, "basemap switched");
        resolved
    }

    /// User navigation on one viewport; the pair link mirrors it.
    pub fn set_view_state(&mut self, role: ViewportRole, state: ViewState) -> bool {
        self.with_viewport(role, |vp| vp.borrow_mut().set_view_state(state))
    }

    pub fn pan_by(&mut self, role: ViewportRole, dx_px: f64, dy_px: f64) -> bool {
        self.with_viewport(role, |vp| vp.borrow_mut().pan_by(dx_px, dy_px))
    }

    pub fn zoom_by(&mut self, role: ViewportRole, delta: f64) -> bool {
        self.with_viewport(role, |vp| vp.borrow_mut().zoom_by(delta))
    }

    pub fn report_tile_error(&mut self, role: ViewportRole, layer: &LayerId, coord: TileCoord) -> bool {
        self.with_viewport(role, |vp| vp.borrow_mut().report_tile_error(layer, coord))
    }

    pub fn report_tile_loaded(&mut self, role: ViewportRole, layer: &LayerId, coord: TileCoord) -> bool {
        self.with_viewport(role, |vp| vp.borrow_mut().report_tile_loaded(layer, coord))
    }

    pub fn set_container(&mut self, rect: ScreenRect) {
        self.slider.set_container(rect);
    }

    /// Press on the slider handle. Only meaningful while comparing.
    pub fn pointer_down(&mut self) -> bool {
        if self.mode != ViewMode::Comparison {
            return false;
        }
        let started = self.slider.begin_drag();
        if started {
            self.metrics.incr(metric_names::DRAGS);
        }
        started
    }

    pub fn pointer_move(&mut self, x: f64) -> bool {
        self.slider.drag_to(x)
    }

    pub fn pointer_up(&mut self) -> bool {
        self.slider.end_drag()
    }

    /// Cancellation or the pointer leaving the window.
    pub fn pointer_cancel(&mut self) -> bool {
        self.slider.end_drag()
    }

    pub fn slider_position(&self) -> f64 {
        self.slider.position()
    }

    pub fn slider_state(&self) -> DragState {
        self.slider.state()
    }

    pub fn layout(&self) -> PaneSplit {
        self.slider.layout()
    }

    pub fn drain_notices(&mut self) -> Vec<TileFailureNotice> {
        self.notifier.borrow_mut().drain()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        let mut m = self.metrics.clone();
        m.add(metric_names::MIRRORED, self.sync.mirrored_total());
        m.add(metric_names::NOTICES, self.notifier.borrow().raised_total());
        m.set_gauge(metric_names::LIVE, self.registry.live_count() as i64);
        let (mut in_flight, mut failed) = (0, 0);
        for role in self.registry.roles() {
            let Some(vp) = self.registry.get(role) else {
                continue;
            };
            let Ok(vp) = vp.try_borrow() else {
                continue;
            };
            in_flight += vp.tiles().in_flight();
            failed += vp.tiles().count(TileLoadState::Failed);
        }
        m.set_gauge(metric_names::TILES_IN_FLIGHT, in_flight as i64);
        m.set_gauge(metric_names::TILES_FAILED, failed as i64);
        m.snapshot()
    }

    fn with_viewport(&self, role: ViewportRole, f: impl FnOnce(&SharedViewport) -> bool) -> bool {
        match self.registry.get(role) {
            Some(vp) => f(&vp),
            None => {
                warn!(%role, "no live viewport for role");
                false
            }
        }
    }

    fn create_single(&mut self, view: ViewState) -> Option<SharedViewport> {
        let vp = self
            .registry
            .create(ViewportRole::Single, view, self.surfaces.as_mut())?;
        self.metrics.incr(metric_names::CREATED);
        vp.borrow_mut()
            .attach_layer(self.basemaps.lookup(self.basemap_id).clone());
        Some(vp)
    }

    fn create_pane(
        &mut self,
        role: ViewportRole,
        view: ViewState,
        selection: &ComparisonSelection,
        date: CalendarDate,
    ) -> Option<SharedViewport> {
        let vp = self.registry.create(role, view, self.surfaces.as_mut())?;
        self.metrics.incr(metric_names::CREATED);

        let mut pane = vp.borrow_mut();
        pane.attach_layer(self.basemaps.lookup(self.basemap_id).clone());
        if let Some(imagery) = selection.imagery_type() {
            let descriptor = self.factory.build_for(imagery, Some(date));
            let layer = descriptor.id().clone();
            pane.attach_layer(descriptor);

            let notifier = Rc::clone(&self.notifier);
            pane.on_tile_error(move |event| {
                // Basemap failures only show the fallback tile.
                if event.layer != layer {
                    return;
                }
                notifier.borrow_mut().raise(TileFailureNotice {
                    pane: role,
                    imagery,
                    date,
                });
            });
        }
        drop(pane);
        Some(vp)
    }

    fn teardown_viewports(&mut self) {
        self.sync.unlink();
        let destroyed = self.registry.destroy_all();
        self.metrics.add(metric_names::DESTROYED, destroyed as u64);
    }
}

impl Drop for ComparisonView {
    fn drop(&mut self) {
        self.slider.end_drag();
        self.teardown_viewports();
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{ComparisonView, ViewMode, metric_names};
    use crate::config::ViewerConfig;
    use crate::selection::ComparisonSelection;
    use crate::surface::HeadlessProvider;
    use crate::viewport::ViewportRole;
    use foundation::view::ViewState;
    use layers::{Layer, LayerKind};
    use runtime::scope::RecordingHost;

    fn view_with(provider: &HeadlessProvider) -> ComparisonView {
        ComparisonView::new(
            ViewerConfig::default(),
            Box::new(provider.clone()),
            Rc::new(RecordingHost::new()),
        )
    }

    fn selection() -> ComparisonSelection {
        ComparisonSelection::new(
            "modis",
            "2024-03-01".parse().unwrap(),
            "2024-03-15".parse().unwrap(),
        )
    }

    #[test]
    fn starts_with_one_viewport_at_the_default_view() {
        let provider = HeadlessProvider::new([640.0, 480.0]);
        let view = view_with(&provider);
        assert_eq!(view.mode(), ViewMode::Single);
        assert_eq!(view.viewport_count(), 1);
        assert_eq!(view.active_view_state(), ViewState::new(4.5, 8.5, 6.0));
        assert_eq!(view.basemap_id(), "esri");
    }

    #[test]
    fn no_render_target_leaves_no_viewport() {
        let provider = HeadlessProvider::new([640.0, 480.0]);
        provider.set_available(false);
        let mut view = view_with(&provider);
        assert_eq!(view.viewport_count(), 0);
        assert!(!view.set_view_state(ViewportRole::Single, ViewState::new(1.0, 1.0, 1.0)));
        assert_eq!(view.active_view_state(), ViewState::default());
    }

    #[test]
    fn rejected_selection_changes_nothing() {
        let provider = HeadlessProvider::new([640.0, 480.0]);
        let mut view = view_with(&provider);
        let bad = ComparisonSelection::new(
            "modis",
            "2024-03-15".parse().unwrap(),
            "2024-03-01".parse().unwrap(),
        );
        assert!(view.enter_comparison_mode(bad).is_err());
        assert_eq!(view.mode(), ViewMode::Single);
        assert_eq!(provider.created_count(), 1);
    }

    #[test]
    fn slider_is_inert_outside_comparison() {
        let provider = HeadlessProvider::new([640.0, 480.0]);
        let mut view = view_with(&provider);
        assert!(!view.pointer_down());
        view.enter_comparison_mode(selection()).unwrap();
        assert!(view.pointer_down());
    }

    #[test]
    fn metrics_track_lifecycle() {
        let provider = HeadlessProvider::new([640.0, 480.0]);
        let mut view = view_with(&provider);
        view.enter_comparison_mode(selection()).unwrap();
        view.exit_comparison_mode();
        let snap = view.metrics();
        let counter = |name: &str| {
            snap.counters
                .iter()
                .find(|(k, _)| *k == name)
                .map_or(0, |(_, v)| *v)
        };
        assert_eq!(counter(metric_names::CREATED), 4);
        assert_eq!(counter(metric_names::DESTROYED), 3);
        assert_eq!(counter(metric_names::ENTER), 1);
        assert_eq!(counter(metric_names::EXIT), 1);
        let gauge = |name: &str| snap.gauges.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);
        assert_eq!(gauge(metric_names::LIVE), Some(1));
        assert_eq!(gauge(metric_names::TILES_FAILED), Some(0));
        assert!(gauge(metric_names::TILES_IN_FLIGHT).unwrap() > 0);
    }

    #[test]
    fn tile_gauges_track_outcomes() {
        let provider = HeadlessProvider::new([640.0, 480.0]);
        let mut view = view_with(&provider);
        view.enter_comparison_mode(selection()).unwrap();
        let gauge = |view: &ComparisonView, name: &str| {
            view.metrics()
                .gauges
                .iter()
                .find(|(k, _)| *k == name)
                .map_or(0, |(_, v)| *v)
        };
        let in_flight = gauge(&view, metric_names::TILES_IN_FLIGHT);

        let vp = view.viewport(ViewportRole::After).unwrap();
        let overlay = vp.borrow().imagery().unwrap().id().clone();
        let frame = provider.latest(ViewportRole::After).unwrap().last_frame.unwrap();
        let tiles = &frame.layer(LayerKind::Imagery).unwrap().tiles;
        assert!(view.report_tile_error(ViewportRole::After, &overlay, tiles[0].coord));
        assert!(view.report_tile_loaded(ViewportRole::After, &overlay, tiles[1].coord));

        assert_eq!(gauge(&view, metric_names::TILES_FAILED), 1);
        assert_eq!(gauge(&view, metric_names::TILES_IN_FLIGHT), in_flight - 2);
    }
}
