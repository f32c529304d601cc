use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use foundation::handles::{Handle, HandleAllocator};
use foundation::view::ViewState;
use tracing::{debug, warn};

use crate::surface::SurfaceProvider;
use crate::viewport::{MapViewport, ViewportRole};

pub type SharedViewport = Rc<RefCell<MapViewport>>;

/// Live viewports keyed by role.
///
/// At most one live instance per role. Destroyed instances are dropped from
/// the registry and never handed out again; re-creating a role allocates a
/// fresh generation of its handle.
#[derive(Debug, Default)]
pub struct ViewportRegistry {
    live: BTreeMap<ViewportRole, SharedViewport>,
    handles: HandleAllocator,
    created_total: u64,
    destroyed_total: u64,
}

impl ViewportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and mounts a viewport for `role`.
    ///
    /// Returns `None` if the role is already live or the provider has no
    /// render target; nothing is registered in either case.
    pub fn create(
        &mut self,
        role: ViewportRole,
        view: ViewState,
        surfaces: &mut dyn SurfaceProvider,
    ) -> Option<SharedViewport> {
        if self.live.contains_key(&role) {
            warn!(%role, "viewport already live for role");
            return None;
        }
        let Some(surface) = surfaces.create(role) else {
            debug!(%role, "no render target, viewport left uninitialized");
            return None;
        };
        let handle = self.handles.alloc(role.slot());
        let mut viewport = MapViewport::new(handle, role, view);
        viewport.mount(surface);
        let shared = Rc::new(RefCell::new(viewport));
        self.live.insert(role, Rc::clone(&shared));
        self.created_total += 1;
        Some(shared)
    }

    pub fn get(&self, role: ViewportRole) -> Option<SharedViewport> {
        self.live.get(&role).cloned()
    }

    /// The live viewport behind `handle`, if that exact instance still lives.
    pub fn resolve(&self, handle: Handle) -> Option<SharedViewport> {
        self.live
            .values()
            .find(|vp| vp.borrow().handle() == handle)
            .cloned()
    }

    pub fn is_live(&self, role: ViewportRole) -> bool {
        self.live.contains_key(&role)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn roles(&self) -> Vec<ViewportRole> {
        self.live.keys().copied().collect()
    }

    pub fn created_total(&self) -> u64 {
        self.created_total
    }

    pub fn destroyed_total(&self) -> u64 {
        self.destroyed_total
    }

    pub fn destroy(&mut self, role: ViewportRole) -> bool {
        let Some(viewport) = self.live.remove(&role) else {
            return false;
        };
        viewport.borrow_mut().destroy();
        self.destroyed_total += 1;
        true
    }

    /// Destroys every live viewport; returns how many there were.
    pub fn destroy_all(&mut self) -> usize {
        let roles = self.roles();
        roles.into_iter().filter(|r| self.destroy(*r)).count()
    }
}

impl Drop for ViewportRegistry {
    fn drop(&mut self) {
        self.destroy_all();
    }
}
