use serde::{Deserialize, Serialize};

use foundation::time::CalendarDate;
use layers::ImageryType;

use crate::error::SelectionError;

/// First year with dense imagery coverage.
pub const ARCHIVE_START_YEAR: i32 = 2000;

/// What the user asked to compare: one imagery product at two dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSelection {
    pub imagery: String,
    pub start: CalendarDate,
    pub end: CalendarDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionWarning {
    /// A date lies after today; tiles are unlikely to exist yet.
    FutureDate(CalendarDate),
    /// A date predates the dense archive.
    SparseArchive(CalendarDate),
}

impl std::fmt::Display for SelectionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionWarning::FutureDate(d) => {
                write!(f, "{d} is in the future; imagery may not be available")
            }
            SelectionWarning::SparseArchive(d) => {
                write!(f, "limited imagery available before {ARCHIVE_START_YEAR} ({d})")
            }
        }
    }
}

impl ComparisonSelection {
    pub fn new(imagery: impl Into<String>, start: CalendarDate, end: CalendarDate) -> Self {
        Self {
            imagery: imagery.into(),
            start,
            end,
        }
    }

    /// `None` for ids outside the product table; the pair then shows the
    /// basemap only.
    pub fn imagery_type(&self) -> Option<ImageryType> {
        ImageryType::from_id(&self.imagery)
    }

    /// Rejects unusable selections and lists the soft problems of usable
    /// ones (at most one warning of each kind).
    pub fn validate(&self, today: CalendarDate) -> Result<Vec<SelectionWarning>, SelectionError> {
        if self.imagery.trim().is_empty() {
            return Err(SelectionError::MissingImagery);
        }
        if self.start > self.end {
            return Err(SelectionError::StartAfterEnd {
                start: self.start,
                end: self.end,
            });
        }
        let dates = [self.start, self.end];
        let mut warnings = Vec::new();
        if let Some(d) = dates.iter().find(|d| **d > today) {
            warnings.push(SelectionWarning::FutureDate(*d));
        }
        if let Some(d) = dates.iter().find(|d| d.year() < ARCHIVE_START_YEAR) {
            warnings.push(SelectionWarning::SparseArchive(*d));
        }
        Ok(warnings)
    }
}
