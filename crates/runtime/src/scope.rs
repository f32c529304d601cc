use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Document/window-level events a host can deliver while a gesture is live.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostEvent {
    PointerMove,
    PointerUp,
    TouchMove,
    TouchEnd,
    PointerLeave,
}

/// Everything a horizontal drag listens to between press and release.
pub const DRAG_EVENTS: [HostEvent; 5] = [
    HostEvent::PointerMove,
    HostEvent::PointerUp,
    HostEvent::TouchMove,
    HostEvent::TouchEnd,
    HostEvent::PointerLeave,
];

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostRegistration(pub u64);

/// The shared document/window listener surface (a browser `document`, a
/// native window's event loop, or a recording double).
pub trait ListenerHost {
    fn attach(&self, events: &[HostEvent]) -> HostRegistration;
    fn detach(&self, registration: HostRegistration);
}

/// Owned host registration. Detaches exactly once, when dropped.
pub struct ScopedListeners {
    host: Rc<dyn ListenerHost>,
    registration: HostRegistration,
}

impl ScopedListeners {
    pub fn acquire(host: Rc<dyn ListenerHost>, events: &[HostEvent]) -> Self {
        let registration = host.attach(events);
        Self { host, registration }
    }

    pub fn registration(&self) -> HostRegistration {
        self.registration
    }
}

impl Drop for ScopedListeners {
    fn drop(&mut self) {
        self.host.detach(self.registration);
    }
}

impl fmt::Debug for ScopedListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedListeners")
            .field("registration", &self.registration)
            .finish()
    }
}

/// Host double that tracks live registrations; used by tests and the
/// headless driver.
#[derive(Debug, Default)]
pub struct RecordingHost {
    next: Cell<u64>,
    live: RefCell<BTreeMap<HostRegistration, Vec<HostEvent>>>,
    attached_total: Cell<u64>,
    detached_total: Cell<u64>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn attached_total(&self) -> u64 {
        self.attached_total.get()
    }

    pub fn detached_total(&self) -> u64 {
        self.detached_total.get()
    }

    pub fn is_listening(&self, event: HostEvent) -> bool {
        self.live.borrow().values().any(|evs| evs.contains(&event))
    }
}

impl ListenerHost for RecordingHost {
    fn attach(&self, events: &[HostEvent]) -> HostRegistration {
        let id = self.next.get() + 1;
        self.next.set(id);
        let reg = HostRegistration(id);
        self.live.borrow_mut().insert(reg, events.to_vec());
        self.attached_total.set(self.attached_total.get() + 1);
        reg
    }

    fn detach(&self, registration: HostRegistration) {
        if self.live.borrow_mut().remove(&registration).is_some() {
            self.detached_total.set(self.detached_total.get() + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DRAG_EVENTS, HostEvent, ListenerHost, RecordingHost, ScopedListeners};
    use std::rc::Rc;

    #[test]
    fn guard_detaches_on_drop() {
        let host = Rc::new(RecordingHost::new());
        let dyn_host: Rc<dyn ListenerHost> = host.clone();
        {
            let guard = ScopedListeners::acquire(dyn_host, &DRAG_EVENTS);
            assert_eq!(host.live_count(), 1);
            assert!(host.is_listening(HostEvent::TouchMove));
            assert_eq!(guard.registration().0, 1);
        }
        assert_eq!(host.live_count(), 0);
        assert_eq!(host.attached_total(), 1);
        assert_eq!(host.detached_total(), 1);
        assert!(!host.is_listening(HostEvent::PointerMove));
    }

    #[test]
    fn double_detach_is_ignored() {
        let host = RecordingHost::new();
        let reg = host.attach(&[HostEvent::PointerUp]);
        host.detach(reg);
        host.detach(reg);
        assert_eq!(host.detached_total(), 1);
    }
}
