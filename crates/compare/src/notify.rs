use std::collections::BTreeSet;
use std::fmt;

use foundation::time::CalendarDate;
use layers::ImageryType;
use tracing::{debug, warn};

use crate::viewport::ViewportRole;

/// "No imagery for this date" signal for one comparison pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFailureNotice {
    pub pane: ViewportRole,
    pub imagery: ImageryType,
    pub date: CalendarDate,
}

impl fmt::Display for TileFailureNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No imagery available for {} ({}, {} pane)",
            self.date,
            self.imagery.label(),
            self.pane
        )
    }
}

/// Collects tile-failure notices, one per (pane, date) per pair.
#[derive(Debug, Default)]
pub struct TileFailureNotifier {
    raised: BTreeSet<(ViewportRole, CalendarDate)>,
    pending: Vec<TileFailureNotice>,
    raised_total: u64,
    suppressed: u64,
}

impl TileFailureNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `notice` unless this pane already reported this date.
    pub fn raise(&mut self, notice: TileFailureNotice) -> bool {
        if !self.raised.insert((notice.pane, notice.date)) {
            self.suppressed += 1;
            debug!(pane = %notice.pane, date = %notice.date, "repeat tile failure suppressed");
            return false;
        }
        warn!(pane = %notice.pane, date = %notice.date, imagery = notice.imagery.id(), "imagery tiles failing");
        self.pending.push(notice);
        self.raised_total += 1;
        true
    }

    pub fn drain(&mut self) -> Vec<TileFailureNotice> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn raised_total(&self) -> u64 {
        self.raised_total
    }

    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }

    /// Forgets what was raised; undrained notices stay queued.
    pub fn reset(&mut self) {
        self.raised.clear();
    }
}
