use std::rc::Rc;

use foundation::bounds::ScreenRect;
use runtime::scope::{DRAG_EVENTS, ListenerHost, ScopedListeners};
use tracing::trace;

pub const DEFAULT_SLIDER_POSITION: f64 = 50.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging,
}

/// Horizontal extent of one pane in container pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PaneExtent {
    pub left: f64,
    pub width: f64,
}

impl PaneExtent {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

/// How the container is divided between the before and after panes.
///
/// The boundary is computed once and shared by both panes, so the widths
/// always add up to the container width.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PaneSplit {
    pub position: f64,
    pub container_width: f64,
    pub boundary_px: f64,
    pub before: PaneExtent,
    pub after: PaneExtent,
}

impl PaneSplit {
    pub fn new(position: f64, container_width: f64) -> Self {
        let position = clamp_position(position);
        let width = if container_width.is_finite() && container_width > 0.0 {
            container_width
        } else {
            0.0
        };
        let boundary_px = (width * position / 100.0).round().clamp(0.0, width);
        Self {
            position,
            container_width: width,
            boundary_px,
            before: PaneExtent {
                left: 0.0,
                width: boundary_px,
            },
            after: PaneExtent {
                left: boundary_px,
                width: width - boundary_px,
            },
        }
    }

    /// `clip-path` for the before pane: everything right of the boundary
    /// is hidden.
    pub fn before_clip_css(&self) -> String {
        format!("inset(0 {}% 0 0)", css_number(100.0 - self.position))
    }

    /// `clip-path` for the after pane: everything left of the boundary is
    /// hidden.
    pub fn after_clip_css(&self) -> String {
        format!("inset(0 0 0 {}%)", css_number(self.position))
    }

    /// `left` of the drag handle.
    pub fn handle_left_css(&self) -> String {
        format!("{}%", css_number(self.position))
    }
}

/// Before/after reveal slider.
///
/// Idle → Dragging on press, back to Idle on release, cancel, pointer
/// leaving the window, or drop. Document-level move/up listeners are held
/// only while dragging. The position survives drags and mode switches.
pub struct SliderController {
    position: f64,
    container: Option<ScreenRect>,
    host: Rc<dyn ListenerHost>,
    drag: Option<ScopedListeners>,
    drags_started: u64,
}

impl std::fmt::Debug for SliderController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliderController")
            .field("position", &self.position)
            .field("container", &self.container)
            .field("drag", &self.drag)
            .finish()
    }
}

impl SliderController {
    pub fn new(host: Rc<dyn ListenerHost>, initial: f64) -> Self {
        let position = if initial.is_finite() {
            clamp_position(initial)
        } else {
            DEFAULT_SLIDER_POSITION
        };
        Self {
            position,
            container: None,
            host,
            drag: None,
            drags_started: 0,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn state(&self) -> DragState {
        if self.drag.is_some() {
            DragState::Dragging
        } else {
            DragState::Idle
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drags_started(&self) -> u64 {
        self.drags_started
    }

    pub fn container(&self) -> Option<ScreenRect> {
        self.container
    }

    /// Container geometry in the same space as pointer x coordinates.
    pub fn set_container(&mut self, rect: ScreenRect) {
        self.container = Some(rect);
    }

    /// Press on the handle. Ignored while already dragging.
    pub fn begin_drag(&mut self) -> bool {
        if self.drag.is_some() {
            return false;
        }
        self.drag = Some(ScopedListeners::acquire(
            Rc::clone(&self.host),
            &DRAG_EVENTS,
        ));
        self.drags_started += 1;
        trace!(position = self.position, "slider drag started");
        true
    }

    /// Pointer or touch move at client `x`. Inert unless dragging over a
    /// usable container.
    pub fn drag_to(&mut self, x: f64) -> bool {
        if self.drag.is_none() || !x.is_finite() {
            return false;
        }
        let Some(rect) = self.container else {
            return false;
        };
        if rect.is_degenerate() {
            return false;
        }
        self.position = clamp_position(100.0 * (x - rect.left) / rect.width);
        true
    }

    /// Release, cancel or leave; drops the host listeners. The last
    /// position is kept.
    pub fn end_drag(&mut self) -> bool {
        let Some(guard) = self.drag.take() else {
            return false;
        };
        drop(guard);
        trace!(position = self.position, "slider drag ended");
        true
    }

    pub fn split(&self, container_width: f64) -> PaneSplit {
        PaneSplit::new(self.position, container_width)
    }

    /// Split for the current container, or an empty one before layout.
    pub fn layout(&self) -> PaneSplit {
        self.split(self.container.map_or(0.0, |r| r.width))
    }
}

fn clamp_position(p: f64) -> f64 {
    if p.is_nan() {
        return DEFAULT_SLIDER_POSITION;
    }
    p.clamp(0.0, 100.0)
}

fn css_number(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    format!("{rounded}")
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{DEFAULT_SLIDER_POSITION, DragState, PaneSplit, SliderController};
    use foundation::bounds::ScreenRect;
    use runtime::scope::{HostEvent, RecordingHost};

    fn slider() -> (SliderController, Rc<RecordingHost>) {
        let host = Rc::new(RecordingHost::new());
        let mut s = SliderController::new(host.clone(), DEFAULT_SLIDER_POSITION);
        s.set_container(ScreenRect::new(100.0, 0.0, 800.0, 600.0));
        (s, host)
    }

    #[test]
    fn split_partitions_container_exactly() {
        for width in [0.0, 1.0, 333.0, 800.0, 1023.5, 1920.0] {
            for step in 0..=200 {
                let p = f64::from(step) * 0.5;
                let s = PaneSplit::new(p, width);
                assert_eq!(s.before.width + s.after.width, width, "p={p} w={width}");
                assert_eq!(s.before.right(), s.after.left);
                assert!(s.before.width >= 0.0 && s.after.width >= 0.0);
            }
        }
    }

    #[test]
    fn drag_clamps_to_container() {
        let (mut s, _host) = slider();
        assert!(s.begin_drag());
        assert!(s.drag_to(500.0));
        assert_eq!(s.position(), 50.0);
        s.drag_to(300.0);
        assert_eq!(s.position(), 25.0);
        s.drag_to(-40.0);
        assert_eq!(s.position(), 0.0);
        s.drag_to(100.0);
        assert_eq!(s.position(), 0.0);
        s.drag_to(900.0);
        assert_eq!(s.position(), 100.0);
        s.drag_to(5000.0);
        assert_eq!(s.position(), 100.0);
    }

    #[test]
    fn moves_while_idle_are_ignored() {
        let (mut s, _host) = slider();
        assert!(!s.drag_to(300.0));
        assert_eq!(s.position(), 50.0);
    }

    #[test]
    fn listeners_live_only_while_dragging() {
        let (mut s, host) = slider();
        assert_eq!(host.live_count(), 0);
        s.begin_drag();
        assert_eq!(s.state(), DragState::Dragging);
        assert!(host.is_listening(HostEvent::PointerMove));
        assert!(host.is_listening(HostEvent::TouchEnd));

        // A second press does not attach twice.
        assert!(!s.begin_drag());
        assert_eq!(host.attached_total(), 1);

        s.drag_to(700.0);
        assert!(s.end_drag());
        assert_eq!(s.state(), DragState::Idle);
        assert_eq!(host.live_count(), 0);
        assert_eq!(s.position(), 75.0);
        assert!(!s.end_drag());
    }

    #[test]
    fn dropping_mid_drag_releases_listeners() {
        let (mut s, host) = slider();
        s.begin_drag();
        drop(s);
        assert_eq!(host.live_count(), 0);
        assert_eq!(host.detached_total(), 1);
    }

    #[test]
    fn degenerate_geometry_is_inert() {
        let host = Rc::new(RecordingHost::new());
        let mut s = SliderController::new(host, 40.0);
        s.begin_drag();
        assert!(!s.drag_to(10.0));
        s.set_container(ScreenRect::new(0.0, 0.0, 0.0, 600.0));
        assert!(!s.drag_to(10.0));
        s.set_container(ScreenRect::new(0.0, 0.0, 400.0, 600.0));
        assert!(!s.drag_to(f64::NAN));
        assert!(!s.drag_to(f64::INFINITY));
        assert_eq!(s.position(), 40.0);
        assert_eq!(s.layout().before.width, 160.0);
    }

    #[test]
    fn initial_position_is_sanitized() {
        let host = Rc::new(RecordingHost::new());
        assert_eq!(SliderController::new(host.clone(), 140.0).position(), 100.0);
        assert_eq!(SliderController::new(host, f64::NAN).position(), 50.0);
    }

    #[test]
    fn css_strings_follow_position() {
        let s = PaneSplit::new(30.0, 1000.0);
        assert_eq!(s.before_clip_css(), "inset(0 70% 0 0)");
        assert_eq!(s.after_clip_css(), "inset(0 0 0 30%)");
        assert_eq!(s.handle_left_css(), "30%");
        assert_eq!(s.boundary_px, 300.0);
    }
}
