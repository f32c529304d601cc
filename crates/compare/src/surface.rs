use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bytes::Bytes;
use foundation::handles::Handle;
use foundation::view::ViewState;
use layers::{LayerId, LayerKind};
use streaming::{TileCoord, TileRequest};

use crate::viewport::ViewportRole;

/// Tiles one attached layer needs for the current view.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayer {
    pub layer: LayerId,
    pub kind: LayerKind,
    pub attribution: String,
    pub tiles: Vec<TileRequest<LayerId>>,
    /// Tiles that already failed; draw `error_fallback` in their place.
    pub fallback_tiles: Vec<TileCoord>,
    pub error_fallback: Bytes,
}

/// Everything a surface needs to draw one state of a viewport.
///
/// Layers are in draw order: basemap first, imagery overlay second.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceFrame {
    pub viewport: Handle,
    pub role: ViewportRole,
    pub view: ViewState,
    pub layers: Vec<FrameLayer>,
}

impl SurfaceFrame {
    pub fn tile_count(&self) -> usize {
        self.layers.iter().map(|l| l.tiles.len()).sum()
    }

    pub fn layer(&self, kind: LayerKind) -> Option<&FrameLayer> {
        self.layers.iter().find(|l| l.kind == kind)
    }
}

/// A host render target (map container, canvas, offscreen buffer).
///
/// Tile fetching belongs to the surface; outcomes come back through
/// `MapViewport::report_tile_loaded` / `report_tile_error`.
pub trait RenderSurface {
    /// Drawable size in CSS pixels.
    fn size(&self) -> [f64; 2];
    fn render(&mut self, frame: &SurfaceFrame);
    /// Called once when the owning viewport is destroyed.
    fn release(&mut self);
}

/// Creates render targets for viewport roles.
pub trait SurfaceProvider {
    /// `None` when the host has no target for `role` right now.
    fn create(&mut self, role: ViewportRole) -> Option<Box<dyn RenderSurface>>;
}

/// What a headless surface has seen so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceLog {
    pub frames: usize,
    pub last_frame: Option<SurfaceFrame>,
    pub released: bool,
}

/// Surface that records frames instead of drawing them.
pub struct HeadlessSurface {
    size: [f64; 2],
    log: Rc<RefCell<SurfaceLog>>,
}

impl HeadlessSurface {
    pub fn new(size: [f64; 2]) -> Self {
        Self {
            size,
            log: Rc::new(RefCell::new(SurfaceLog::default())),
        }
    }

    pub fn log(&self) -> Rc<RefCell<SurfaceLog>> {
        Rc::clone(&self.log)
    }
}

impl fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessSurface")
            .field("size", &self.size)
            .field("frames", &self.log.borrow().frames)
            .finish()
    }
}

impl RenderSurface for HeadlessSurface {
    fn size(&self) -> [f64; 2] {
        self.size
    }

    fn render(&mut self, frame: &SurfaceFrame) {
        let mut log = self.log.borrow_mut();
        log.frames += 1;
        log.last_frame = Some(frame.clone());
    }

    fn release(&mut self) {
        self.log.borrow_mut().released = true;
    }
}

#[derive(Debug)]
struct ProviderState {
    size: [f64; 2],
    available: bool,
    created: Vec<(ViewportRole, Rc<RefCell<SurfaceLog>>)>,
}

/// Hands out [`HeadlessSurface`]s and keeps their logs.
///
/// Clones share state, so a caller can keep one clone for inspection after
/// boxing another into a `ComparisonView`.
#[derive(Debug, Clone)]
pub struct HeadlessProvider {
    state: Rc<RefCell<ProviderState>>,
}

impl HeadlessProvider {
    pub fn new(size: [f64; 2]) -> Self {
        Self {
            state: Rc::new(RefCell::new(ProviderState {
                size,
                available: true,
                created: Vec::new(),
            })),
        }
    }

    /// Simulates the host losing (or regaining) its render target.
    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }

    pub fn created_count(&self) -> usize {
        self.state.borrow().created.len()
    }

    /// Surfaces handed out and not yet released.
    pub fn live_count(&self) -> usize {
        self.state
            .borrow()
            .created
            .iter()
            .filter(|(_, log)| !log.borrow().released)
            .count()
    }

    /// Log of the most recent surface created for `role`.
    pub fn latest(&self, role: ViewportRole) -> Option<SurfaceLog> {
        self.state
            .borrow()
            .created
            .iter()
            .rev()
            .find(|(r, _)| *r == role)
            .map(|(_, log)| log.borrow().clone())
    }
}

impl SurfaceProvider for HeadlessProvider {
    fn create(&mut self, role: ViewportRole) -> Option<Box<dyn RenderSurface>> {
        let mut state = self.state.borrow_mut();
        if !state.available {
            return None;
        }
        let surface = HeadlessSurface::new(state.size);
        state.created.push((role, surface.log()));
        Some(Box::new(surface))
    }
}
