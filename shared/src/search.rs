//! Free-text place lookup, one independent search box per slot.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::GeocodeCandidate;
use crate::error::AppResult;
use crate::model::{GeoPoint, Slot};
use crate::token::{RequestToken, TokenSequence};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub label: String,
    pub point: GeoPoint,
}

#[derive(Debug, Default)]
struct SlotSearch {
    query: String,
    requests: TokenSequence,
    results: Vec<SearchCandidate>,
}

#[derive(Debug, Default)]
pub struct LocationSearch {
    start: SlotSearch,
    end: SlotSearch,
}

impl LocationSearch {
    fn slot(&self, slot: Slot) -> &SlotSearch {
        match slot {
            Slot::Start => &self.start,
            Slot::End => &self.end,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut SlotSearch {
        match slot {
            Slot::Start => &mut self.start,
            Slot::End => &mut self.end,
        }
    }

    #[must_use]
    pub fn query(&self, slot: Slot) -> &str {
        &self.slot(slot).query
    }

    #[must_use]
    pub fn results(&self, slot: Slot) -> &[SearchCandidate] {
        &self.slot(slot).results
    }

    #[must_use]
    pub fn is_searching(&self, slot: Slot) -> bool {
        self.slot(slot).requests.is_pending()
    }

    /// Records the query and issues a token. A blank query issues nothing and
    /// drops both the listed results and any search still in flight.
    pub fn begin(&mut self, slot: Slot, query: &str) -> Option<RequestToken> {
        let entry = self.slot_mut(slot);
        entry.query = query.to_string();
        if query.trim().is_empty() {
            entry.results.clear();
            entry.requests.invalidate();
            return None;
        }
        let token = entry.requests.issue();
        debug!(slot = slot.as_str(), %token, "location search issued");
        Some(token)
    }

    /// Keeps up to `limit` candidates with parseable coordinates.
    pub fn complete(
        &mut self,
        slot: Slot,
        token: RequestToken,
        outcome: AppResult<Vec<GeocodeCandidate>>,
        limit: usize,
    ) -> AppResult<()> {
        let entry = self.slot_mut(slot);
        if !entry.requests.settle(token) {
            debug!(slot = slot.as_str(), %token, "discarding stale search results");
            return Ok(());
        }

        let candidates = outcome?;
        entry.results = candidates
            .into_iter()
            .filter_map(|c| match c.point() {
                Some(point) => Some(SearchCandidate {
                    label: c.display_name,
                    point,
                }),
                None => {
                    warn!(label = %c.display_name, "skipping search result with bad coordinates");
                    None
                }
            })
            .take(limit)
            .collect();
        debug!(slot = slot.as_str(), count = entry.results.len(), "search results received");
        Ok(())
    }

    /// Takes the chosen candidate, puts its label in the box and closes the
    /// list.
    pub fn choose(&mut self, slot: Slot, index: usize) -> Option<SearchCandidate> {
        let entry = self.slot_mut(slot);
        let chosen = entry.results.get(index).cloned()?;
        entry.query = chosen.label.clone();
        entry.results.clear();
        Some(chosen)
    }

    pub fn dismiss(&mut self, slot: Slot) {
        let entry = self.slot_mut(slot);
        entry.results.clear();
        entry.requests.invalidate();
    }
}
