use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use foundation::view::ViewState;
use tracing::{debug, warn};

use crate::registry::SharedViewport;
use crate::viewport::{MapViewport, ViewStateChanged, ViewportSubscription};

#[derive(Debug, Default)]
struct SyncCounters {
    mirrored: Cell<u64>,
    skipped: Cell<u64>,
}

/// Two-way view mirroring between a before/after pair.
///
/// Each side's view-change listener applies the new state to the other side
/// through the silent path, so a mirrored update never echoes back. The link
/// holds only weak references; it unregisters both listeners on
/// [`teardown`](Self::teardown) or drop.
#[derive(Debug)]
pub struct SyncLink {
    subscriptions: Vec<(Weak<RefCell<MapViewport>>, ViewportSubscription)>,
    counters: Rc<SyncCounters>,
}

impl SyncLink {
    /// Aligns both viewports on `initial` (silently) and starts mirroring.
    ///
    /// `None` if either viewport cannot take listeners.
    pub fn establish(
        before: &SharedViewport,
        after: &SharedViewport,
        initial: ViewState,
    ) -> Option<Self> {
        before.borrow_mut().apply_mirrored(initial);
        after.borrow_mut().apply_mirrored(initial);

        let mut link = SyncLink {
            subscriptions: Vec::with_capacity(2),
            counters: Rc::new(SyncCounters::default()),
        };
        for (origin, peer) in [(before, after), (after, before)] {
            let listener = mirror_into(Rc::downgrade(peer), Rc::clone(&link.counters));
            let sub = origin.borrow_mut().on_view_state_changed(listener)?;
            link.subscriptions.push((Rc::downgrade(origin), sub));
        }
        debug!(?initial, "sync link established");
        Some(link)
    }

    /// Silent sets performed on behalf of origin updates.
    pub fn mirrored_count(&self) -> u64 {
        self.counters.mirrored.get()
    }

    /// Mirrors dropped because the peer was busy or gone.
    pub fn skipped_count(&self) -> u64 {
        self.counters.skipped.get()
    }

    pub fn is_active(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Unregisters both directions; returns how many listeners were removed.
    pub fn teardown(&mut self) -> usize {
        let mut removed = 0;
        for (viewport, sub) in self.subscriptions.drain(..) {
            let Some(viewport) = viewport.upgrade() else {
                continue;
            };
            match viewport.try_borrow_mut() {
                Ok(mut vp) => {
                    if vp.unsubscribe(sub) {
                        removed += 1;
                    }
                }
                Err(_) => warn!(?sub, "viewport busy during sync teardown"),
            }
        }
        removed
    }
}

impl Drop for SyncLink {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn mirror_into(
    peer: Weak<RefCell<MapViewport>>,
    counters: Rc<SyncCounters>,
) -> impl FnMut(&ViewStateChanged) + 'static {
    move |event| {
        let Some(peer) = peer.upgrade() else {
            counters.skipped.set(counters.skipped.get() + 1);
            debug!(origin = %event.role, "sync peer gone, mirror skipped");
            return;
        };
        let Ok(mut peer) = peer.try_borrow_mut() else {
            counters.skipped.set(counters.skipped.get() + 1);
            warn!(origin = %event.role, "sync peer busy, mirror skipped");
            return;
        };
        if peer.apply_mirrored(event.state) {
            counters.mirrored.set(counters.mirrored.get() + 1);
        }
    }
}

/// Owns the current [`SyncLink`] across pair rebuilds.
#[derive(Debug, Default)]
pub struct ViewSyncCoordinator {
    link: Option<SyncLink>,
    mirrored_before_current: u64,
    links_created: u64,
}

impl ViewSyncCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any existing link with one between `before` and `after`.
    pub fn link(
        &mut self,
        before: &SharedViewport,
        after: &SharedViewport,
        initial: ViewState,
    ) -> bool {
        self.unlink();
        self.link = SyncLink::establish(before, after, initial);
        if self.link.is_some() {
            self.links_created += 1;
        }
        self.link.is_some()
    }

    /// Tears the current link down. Must run before either pane is destroyed.
    pub fn unlink(&mut self) -> bool {
        let Some(mut link) = self.link.take() else {
            return false;
        };
        self.mirrored_before_current += link.mirrored_count();
        link.teardown();
        true
    }

    pub fn is_linked(&self) -> bool {
        self.link.as_ref().is_some_and(SyncLink::is_active)
    }

    /// Mirrors performed by the current link.
    pub fn mirrored_count(&self) -> u64 {
        self.link.as_ref().map_or(0, SyncLink::mirrored_count)
    }

    /// Mirrors performed over the coordinator's lifetime.
    pub fn mirrored_total(&self) -> u64 {
        self.mirrored_before_current + self.mirrored_count()
    }

    pub fn links_created(&self) -> u64 {
        self.links_created
    }
}
