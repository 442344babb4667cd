//! Route request lifecycle.
//!
//! One request is "current" at a time. Responses carry the token they were
//! issued with; anything that is not the current token is dropped, so a slow
//! early response can never overwrite a later one.

use tracing::{debug, info, warn};

use crate::api::RouteResponse;
use crate::error::{AppError, AppResult};
use crate::model::{RiskWeight, RouteMode, RouteRequest, RouteResult};
use crate::selection::SelectionState;
use crate::token::{RequestToken, TokenSequence};

#[derive(Debug, Clone, PartialEq)]
pub enum RouteCompletion {
    /// New result stored and the turn-by-turn panel opened.
    Applied,
    /// The request failed; any previous route is left in place.
    Failed(AppError),
    /// Superseded or cleared while in flight; nothing changed.
    Stale,
}

#[derive(Debug, Default)]
pub struct RouteOrchestrator {
    mode: RouteMode,
    risk_weight: RiskWeight,
    requests: TokenSequence,
    in_flight: Option<RouteRequest>,
    result: Option<RouteResult>,
    show_instructions: bool,
}

impl RouteOrchestrator {
    #[must_use]
    pub const fn mode(&self) -> RouteMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RouteMode) {
        self.mode = mode;
    }

    #[must_use]
    pub const fn risk_weight(&self) -> RiskWeight {
        self.risk_weight
    }

    pub fn set_risk_weight(&mut self, value: f64) {
        self.risk_weight = RiskWeight::new(value);
    }

    #[must_use]
    pub const fn is_requesting(&self) -> bool {
        self.requests.is_pending()
    }

    #[must_use]
    pub const fn result(&self) -> Option<&RouteResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub const fn show_instructions(&self) -> bool {
        self.show_instructions && self.result.is_some()
    }

    /// The "find route" action is enabled only with both points and no
    /// request outstanding.
    #[must_use]
    pub const fn can_request(&self, selection: &SelectionState) -> bool {
        selection.is_complete() && !self.is_requesting()
    }

    /// Builds the request body and enters `Requesting`.
    ///
    /// Fails with `InvalidSelection` before anything is issued unless both
    /// points are set. Calling again while a request is in flight supersedes
    /// it.
    pub fn begin(&mut self, selection: &SelectionState) -> AppResult<(RequestToken, RouteRequest)> {
        let (start, end) = selection
            .endpoints()
            .ok_or_else(AppError::invalid_selection)?;

        let request = RouteRequest {
            start,
            end,
            mode: self.mode,
            risk_weight: self.risk_weight,
        };

        if let Some(superseded) = self.requests.outstanding() {
            debug!(%superseded, "route request superseded");
        }

        let token = self.requests.issue();
        self.in_flight = Some(request.clone());
        info!(%token, mode = request.mode.as_str(), risk_weight = request.risk_weight.value(), "route requested");
        Ok((token, request))
    }

    pub fn complete(&mut self, token: RequestToken, outcome: AppResult<RouteResponse>) -> RouteCompletion {
        if !self.requests.settle(token) {
            warn!(%token, "discarding stale route response");
            return RouteCompletion::Stale;
        }

        let Some(request) = self.in_flight.take() else {
            return RouteCompletion::Stale;
        };

        let converted = outcome.and_then(|response| {
            response
                .into_result(request.mode, request.risk_weight)
                .map_err(AppError::from)
        });

        match converted {
            Ok(result) => {
                info!(
                    %token,
                    distance_km = result.statistics.distance_km,
                    time_min = result.statistics.time_min,
                    points = result.path.len(),
                    "route applied"
                );
                self.result = Some(result);
                self.show_instructions = true;
                RouteCompletion::Applied
            }
            Err(error) => {
                warn!(%token, error = %error, kept_previous = self.result.is_some(), "route request failed");
                RouteCompletion::Failed(error)
            }
        }
    }

    /// Drops the result, hides the panel and abandons any in-flight request.
    pub fn clear(&mut self) {
        if self.requests.is_pending() {
            debug!("abandoning in-flight route request");
        }
        self.requests.invalidate();
        self.in_flight = None;
        self.result = None;
        self.show_instructions = false;
    }

    /// Closes the turn-by-turn panel; the route itself stays on the map.
    pub fn hide_instructions(&mut self) {
        self.show_instructions = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RouteStatisticsDto, WirePoint};
    use crate::error::ErrorKind;
    use crate::model::GeoPoint;

    fn both_set() -> SelectionState {
        SelectionState::BothSet {
            start: GeoPoint::new(11.0168, 76.9558).unwrap(),
            end: GeoPoint::new(11.05, 77.00).unwrap(),
        }
    }

    fn response(distance_km: f64) -> RouteResponse {
        RouteResponse {
            path: vec![
                WirePoint {
                    lat: 11.0168,
                    lon: 76.9558,
                },
                WirePoint {
                    lat: 11.05,
                    lon: 77.0,
                },
            ],
            statistics: RouteStatisticsDto {
                distance_km,
                time_min: 12.0,
            },
            instructions: serde_json::json!([]),
        }
    }

    fn network_error() -> AppError {
        AppError::new(ErrorKind::NetworkFailure, "Error finding route")
    }

    #[test]
    fn test_begin_requires_both_points() {
        let mut orchestrator = RouteOrchestrator::default();

        let empty = orchestrator.begin(&SelectionState::Empty).unwrap_err();
        assert_eq!(empty.kind, ErrorKind::InvalidSelection);

        let start_only = SelectionState::StartOnly {
            start: GeoPoint::new(1.0, 1.0).unwrap(),
        };
        let err = orchestrator.begin(&start_only).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSelection);
        assert!(!orchestrator.is_requesting());
    }

    #[test]
    fn test_request_uses_mode_and_weight() {
        let mut orchestrator = RouteOrchestrator::default();
        orchestrator.set_mode(RouteMode::UserDefined);
        orchestrator.set_risk_weight(0.7);

        let (_, request) = orchestrator.begin(&both_set()).unwrap();
        assert_eq!(request.mode, RouteMode::UserDefined);
        assert_eq!(request.risk_weight.value(), 0.7);
        assert!(orchestrator.is_requesting());
        assert!(!orchestrator.can_request(&both_set()));
    }

    #[test]
    fn test_success_replaces_result_and_shows_panel() {
        let mut orchestrator = RouteOrchestrator::default();
        let (token, _) = orchestrator.begin(&both_set()).unwrap();

        assert_eq!(
            orchestrator.complete(token, Ok(response(5.2))),
            RouteCompletion::Applied
        );
        assert!(!orchestrator.is_requesting());
        assert!(orchestrator.show_instructions());
        assert_eq!(orchestrator.result().unwrap().statistics.distance_km, 5.2);
    }

    #[test]
    fn test_failure_keeps_previous_route() {
        let mut orchestrator = RouteOrchestrator::default();
        let (token, _) = orchestrator.begin(&both_set()).unwrap();
        orchestrator.complete(token, Ok(response(5.2)));

        let (token, _) = orchestrator.begin(&both_set()).unwrap();
        let completion = orchestrator.complete(token, Err(network_error()));

        assert!(matches!(completion, RouteCompletion::Failed(ref e) if e.kind == ErrorKind::NetworkFailure));
        assert_eq!(orchestrator.result().unwrap().statistics.distance_km, 5.2);
        assert!(!orchestrator.is_requesting());
    }

    #[test]
    fn test_later_request_wins_regardless_of_arrival_order() {
        let mut orchestrator = RouteOrchestrator::default();
        let (first, _) = orchestrator.begin(&both_set()).unwrap();
        let (second, _) = orchestrator.begin(&both_set()).unwrap();

        assert_eq!(
            orchestrator.complete(second, Ok(response(3.0))),
            RouteCompletion::Applied
        );
        assert_eq!(
            orchestrator.complete(first, Ok(response(9.9))),
            RouteCompletion::Stale
        );
        assert_eq!(orchestrator.result().unwrap().statistics.distance_km, 3.0);
    }

    #[test]
    fn test_clear_discards_in_flight_response() {
        let mut orchestrator = RouteOrchestrator::default();
        let (token, _) = orchestrator.begin(&both_set()).unwrap();
        orchestrator.clear();

        assert!(!orchestrator.is_requesting());
        assert_eq!(
            orchestrator.complete(token, Ok(response(5.2))),
            RouteCompletion::Stale
        );
        assert!(orchestrator.result().is_none());
        assert!(!orchestrator.show_instructions());
    }

    #[test]
    fn test_hide_instructions_keeps_route() {
        let mut orchestrator = RouteOrchestrator::default();
        let (token, _) = orchestrator.begin(&both_set()).unwrap();
        orchestrator.complete(token, Ok(response(5.2)));

        orchestrator.hide_instructions();
        assert!(!orchestrator.show_instructions());
        assert!(orchestrator.result().is_some());
    }

    #[test]
    fn test_invalid_path_point_is_a_failure() {
        let mut orchestrator = RouteOrchestrator::default();
        let (token, _) = orchestrator.begin(&both_set()).unwrap();
        let mut bad = response(1.0);
        bad.path.push(WirePoint {
            lat: 200.0,
            lon: 0.0,
        });

        assert!(matches!(
            orchestrator.complete(token, Ok(bad)),
            RouteCompletion::Failed(_)
        ));
        assert!(orchestrator.result().is_none());
    }
}
