use std::fmt;

use foundation::handles::Handle;
use foundation::math::mercator::{project, unproject, wrap_longitude};
use foundation::view::ViewState;
use layers::{ImageryLayerDescriptor, Layer, LayerId, LayerKind};
use runtime::event_bus::{Listeners, SubscriptionId};
use streaming::{TileCoord, TileRequest, TileTracker, TrackerError, covering_tiles};
use tracing::{debug, trace, warn};

use crate::surface::{FrameLayer, RenderSurface, SurfaceFrame};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViewportRole {
    Single,
    Before,
    After,
}

impl ViewportRole {
    pub fn label(&self) -> &'static str {
        match self {
            ViewportRole::Single => "single",
            ViewportRole::Before => "before",
            ViewportRole::After => "after",
        }
    }

    /// Handle slot; each role reuses its own slot across instances.
    pub fn slot(&self) -> u32 {
        match self {
            ViewportRole::Single => 0,
            ViewportRole::Before => 1,
            ViewportRole::After => 2,
        }
    }

    /// The other pane of a comparison pair.
    pub fn peer(&self) -> Option<ViewportRole> {
        match self {
            ViewportRole::Single => None,
            ViewportRole::Before => Some(ViewportRole::After),
            ViewportRole::After => Some(ViewportRole::Before),
        }
    }
}

impl fmt::Display for ViewportRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewportPhase {
    Uninitialized,
    Active,
    Destroyed,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewStateChanged {
    pub origin: Handle,
    pub role: ViewportRole,
    pub state: ViewState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileErrorEvent {
    pub origin: Handle,
    pub role: ViewportRole,
    pub layer: LayerId,
    pub coord: TileCoord,
}

/// Subscription on a viewport; the variant says which listener set it is in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ViewportSubscription {
    ViewState(SubscriptionId),
    TileError(SubscriptionId),
}

/// One renderable map: a surface, a view state and two layer slots.
///
/// Lifecycle: `Uninitialized → Active` on [`mount`](Self::mount),
/// `Active → Destroyed` once on [`destroy`](Self::destroy). Mutations on a
/// viewport that is not active are logged and ignored.
pub struct MapViewport {
    handle: Handle,
    role: ViewportRole,
    phase: ViewportPhase,
    view: ViewState,
    basemap: Option<ImageryLayerDescriptor>,
    imagery: Option<ImageryLayerDescriptor>,
    surface: Option<Box<dyn RenderSurface>>,
    tiles: TileTracker<LayerId>,
    view_listeners: Listeners<ViewStateChanged>,
    error_listeners: Listeners<TileErrorEvent>,
    renders: u64,
}

impl fmt::Debug for MapViewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapViewport")
            .field("handle", &self.handle)
            .field("role", &self.role)
            .field("phase", &self.phase)
            .field("view", &self.view)
            .field("basemap", &self.basemap.as_ref().map(|d| d.id()))
            .field("imagery", &self.imagery.as_ref().map(|d| d.id()))
            .field("tiles", &self.tiles.len())
            .finish()
    }
}

impl MapViewport {
    pub fn new(handle: Handle, role: ViewportRole, view: ViewState) -> Self {
        Self {
            handle,
            role,
            phase: ViewportPhase::Uninitialized,
            view,
            basemap: None,
            imagery: None,
            surface: None,
            tiles: TileTracker::new(),
            view_listeners: Listeners::new(),
            error_listeners: Listeners::new(),
            renders: 0,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn role(&self) -> ViewportRole {
        self.role
    }

    pub fn phase(&self) -> ViewportPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == ViewportPhase::Active
    }

    pub fn view_state(&self) -> ViewState {
        self.view
    }

    pub fn basemap(&self) -> Option<&ImageryLayerDescriptor> {
        self.basemap.as_ref()
    }

    pub fn imagery(&self) -> Option<&ImageryLayerDescriptor> {
        self.imagery.as_ref()
    }

    /// Attached layers in draw order: basemap, then imagery overlay.
    pub fn attached_layers(&self) -> Vec<&ImageryLayerDescriptor> {
        self.basemap.iter().chain(self.imagery.iter()).collect()
    }

    pub fn tiles(&self) -> &TileTracker<LayerId> {
        &self.tiles
    }

    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn listener_count(&self) -> usize {
        self.view_listeners.len() + self.error_listeners.len()
    }

    /// Binds a render target and renders the current state.
    pub fn mount(&mut self, surface: Box<dyn RenderSurface>) -> bool {
        if self.phase != ViewportPhase::Uninitialized {
            warn!(role = %self.role, phase = ?self.phase, "mount ignored");
            return false;
        }
        self.surface = Some(surface);
        self.phase = ViewportPhase::Active;
        debug!(role = %self.role, handle = ?self.handle, "viewport mounted");
        self.render();
        true
    }

    /// Fills the descriptor's slot (by its kind), replacing what was there.
    /// The other slot and the view state are untouched.
    pub fn attach_layer(&mut self, descriptor: ImageryLayerDescriptor) -> bool {
        if !self.check_active("attach_layer") {
            return false;
        }
        let slot = match descriptor.kind() {
            LayerKind::Basemap => &mut self.basemap,
            LayerKind::Imagery => &mut self.imagery,
        };
        if let Some(previous) = slot.replace(descriptor) {
            let dropped = self.tiles.forget_layer(previous.id());
            trace!(layer = %previous.id(), dropped, "layer replaced");
        }
        self.render();
        true
    }

    pub fn detach_imagery(&mut self) -> bool {
        if !self.check_active("detach_imagery") {
            return false;
        }
        let Some(previous) = self.imagery.take() else {
            return false;
        };
        self.tiles.forget_layer(previous.id());
        self.render();
        true
    }

    /// User-originated update: renders and notifies listeners.
    pub fn set_view_state(&mut self, state: ViewState) -> bool {
        if !self.apply_state(state, "set_view_state") {
            return false;
        }
        let event = ViewStateChanged {
            origin: self.handle,
            role: self.role,
            state,
        };
        self.view_listeners.emit(&event);
        true
    }

    /// Mirrored update from a peer: renders without notifying anyone.
    pub fn apply_mirrored(&mut self, state: ViewState) -> bool {
        self.apply_state(state, "apply_mirrored")
    }

    /// Moves the center by a screen offset in pixels.
    pub fn pan_by(&mut self, dx_px: f64, dy_px: f64) -> bool {
        let z = self.view.zoom_level;
        let [x, y] = project(self.view.center_latitude, self.view.center_longitude, z);
        let (lat, lon) = unproject([x + dx_px, y + dy_px], z);
        self.set_view_state(self.view.with_center(lat, wrap_longitude(lon)))
    }

    pub fn zoom_by(&mut self, delta: f64) -> bool {
        self.set_view_state(self.view.with_zoom(self.view.zoom_level + delta))
    }

    pub fn on_view_state_changed(
        &mut self,
        callback: impl FnMut(&ViewStateChanged) + 'static,
    ) -> Option<ViewportSubscription> {
        if !self.check_active("on_view_state_changed") {
            return None;
        }
        Some(ViewportSubscription::ViewState(
            self.view_listeners.subscribe(callback),
        ))
    }

    pub fn on_tile_error(
        &mut self,
        callback: impl FnMut(&TileErrorEvent) + 'static,
    ) -> Option<ViewportSubscription> {
        if !self.check_active("on_tile_error") {
            return None;
        }
        Some(ViewportSubscription::TileError(
            self.error_listeners.subscribe(callback),
        ))
    }

    pub fn unsubscribe(&mut self, subscription: ViewportSubscription) -> bool {
        match subscription {
            ViewportSubscription::ViewState(id) => self.view_listeners.unsubscribe(id),
            ViewportSubscription::TileError(id) => self.error_listeners.unsubscribe(id),
        }
    }

    /// Host report that a tile failed. The surface shows the layer's
    /// fallback image; tile-error listeners hear about each failing tile
    /// once.
    pub fn report_tile_error(&mut self, layer: &LayerId, coord: TileCoord) -> bool {
        if !self.check_active("report_tile_error") {
            return false;
        }
        match self.tiles.mark_failed(layer, coord) {
            Ok(true) => {
                debug!(role = %self.role, %layer, ?coord, "tile failed, showing fallback");
                let event = TileErrorEvent {
                    origin: self.handle,
                    role: self.role,
                    layer: layer.clone(),
                    coord,
                };
                self.error_listeners.emit(&event);
                true
            }
            Ok(false) => false,
            Err(TrackerError::UnknownTile) => {
                trace!(role = %self.role, %layer, ?coord, "error for untracked tile ignored");
                false
            }
        }
    }

    pub fn report_tile_loaded(&mut self, layer: &LayerId, coord: TileCoord) -> bool {
        if !self.check_active("report_tile_loaded") {
            return false;
        }
        match self.tiles.mark_loaded(layer, coord) {
            Ok(()) => true,
            Err(TrackerError::UnknownTile) => {
                trace!(role = %self.role, %layer, ?coord, "load for untracked tile ignored");
                false
            }
        }
    }

    /// Releases listeners, surface and tile bookkeeping. Runs once.
    pub fn destroy(&mut self) -> bool {
        if self.phase == ViewportPhase::Destroyed {
            return false;
        }
        let listeners = self.view_listeners.clear() + self.error_listeners.clear();
        if let Some(mut surface) = self.surface.take() {
            surface.release();
        }
        let dropped = self.tiles.clear();
        self.phase = ViewportPhase::Destroyed;
        debug!(
            role = %self.role,
            handle = ?self.handle,
            listeners,
            dropped_tiles = dropped,
            "viewport destroyed"
        );
        true
    }

    fn apply_state(&mut self, state: ViewState, op: &'static str) -> bool {
        if !self.check_active(op) {
            return false;
        }
        if !state.is_finite() {
            warn!(role = %self.role, ?state, op, "non-finite view state ignored");
            return false;
        }
        self.view = state;
        self.render();
        true
    }

    fn check_active(&self, op: &'static str) -> bool {
        if self.is_active() {
            return true;
        }
        warn!(role = %self.role, phase = ?self.phase, op, "viewport not active, ignoring");
        false
    }

    fn render(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let size = surface.size();
        let mut layers = Vec::with_capacity(2);
        for descriptor in self.basemap.iter().chain(self.imagery.iter()) {
            let coords = covering_tiles(
                &self.view,
                size,
                descriptor.tile_size(),
                descriptor.min_zoom(),
                descriptor.max_zoom(),
            );
            let mut tiles = Vec::with_capacity(coords.len());
            let mut fallback_tiles = Vec::new();
            let bounds = descriptor.bounds();
            for coord in coords {
                if !bounds.intersects(&coord.bounds()) {
                    continue;
                }
                self.tiles.request(descriptor.id(), coord);
                if self
                    .tiles
                    .state(descriptor.id(), coord)
                    .is_some_and(|s| s.shows_fallback())
                {
                    fallback_tiles.push(coord);
                }
                tiles.push(TileRequest {
                    layer: descriptor.id().clone(),
                    coord,
                    url: descriptor.tile_url(coord),
                });
            }
            let covered: Vec<TileCoord> = tiles.iter().map(|t| t.coord).collect();
            let evicted = self.tiles.retain_only(descriptor.id(), &covered);
            if evicted > 0 {
                trace!(layer = %descriptor.id(), evicted, "tiles left the view");
            }
            layers.push(FrameLayer {
                layer: descriptor.id().clone(),
                kind: descriptor.kind(),
                attribution: descriptor.attribution().to_string(),
                tiles,
                fallback_tiles,
                error_fallback: descriptor.error_fallback().clone(),
            });
        }
        let frame = SurfaceFrame {
            viewport: self.handle,
            role: self.role,
            view: self.view,
            layers,
        };
        surface.render(&frame);
        self.renders += 1;
    }
}

impl Drop for MapViewport {
    fn drop(&mut self) {
        self.destroy();
    }
}
