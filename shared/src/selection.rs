//! Start/end point selection.
//!
//! The state type makes "end without start" unrepresentable; the transition
//! function only decides which slot a new point lands in.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult, ErrorKind};
use crate::model::{GeoPoint, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectionState {
    #[default]
    Empty,
    StartOnly {
        start: GeoPoint,
    },
    BothSet {
        start: GeoPoint,
        end: GeoPoint,
    },
}

impl SelectionState {
    #[must_use]
    pub const fn start(&self) -> Option<GeoPoint> {
        match self {
            Self::Empty => None,
            Self::StartOnly { start } | Self::BothSet { start, .. } => Some(*start),
        }
    }

    #[must_use]
    pub const fn end(&self) -> Option<GeoPoint> {
        match self {
            Self::BothSet { end, .. } => Some(*end),
            _ => None,
        }
    }

    #[must_use]
    pub const fn endpoints(&self) -> Option<(GeoPoint, GeoPoint)> {
        match self {
            Self::BothSet { start, end } => Some((*start, *end)),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::BothSet { .. })
    }

    /// Slot a map click would fill, or `None` once both are set.
    #[must_use]
    pub const fn next_free_slot(&self) -> Option<Slot> {
        match self {
            Self::Empty => Some(Slot::Start),
            Self::StartOnly { .. } => Some(Slot::End),
            Self::BothSet { .. } => None,
        }
    }

    /// Computes the state after placing `point`.
    ///
    /// `slot: None` is a map click: the slot is inferred and a click while
    /// both points are set is refused with [`ErrorKind::SelectionFull`].
    /// An explicit slot (search result) overwrites whatever occupies it.
    /// An explicit end before any start is refused so the state never
    /// records an end point alone.
    pub fn select(&self, slot: Option<Slot>, point: GeoPoint) -> AppResult<Self> {
        let slot = match slot {
            Some(slot) => slot,
            None => self.next_free_slot().ok_or_else(AppError::selection_full)?,
        };

        let next = match (slot, *self) {
            (Slot::Start, Self::Empty | Self::StartOnly { .. }) => Self::StartOnly { start: point },
            (Slot::Start, Self::BothSet { end, .. }) => Self::BothSet { start: point, end },
            (Slot::End, Self::Empty) => {
                return Err(AppError::new(
                    ErrorKind::InvalidSelection,
                    "Select a start point first",
                ));
            }
            (Slot::End, Self::StartOnly { start } | Self::BothSet { start, .. }) => {
                Self::BothSet { start, end: point }
            }
        };

        debug!(slot = slot.as_str(), %point, "point selected");
        Ok(next)
    }
}
