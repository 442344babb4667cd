//! Read-only projection of the model for the shell.

use geojson::GeoJson;
use serde::{Deserialize, Serialize};

use crate::api::{havens_collection, route_feature};
use crate::datasets::{DatasetTask, DEFAULT_DOWNLOAD_RADIUS_M, DOWNLOAD_RADIUS_PRESETS_M};
use crate::emergency::EmergencyState;
use crate::error::Notice;
use crate::model::{
    BackendStatus, EmergencyService, GeoPoint, HavenKind, MapDataset, Model, RouteMode,
    RouteResult, Slot, TurnInstruction,
};
use crate::search::SearchCandidate;

#[must_use]
pub fn format_distance(km: f64) -> String {
    format!("{km:.2} km")
}

#[must_use]
pub fn format_duration(minutes: f64) -> String {
    format!("{} mins", minutes.round())
}

#[must_use]
pub fn format_safety_share(weight: f64) -> String {
    format!("{}% Safe", (weight * 100.0).round())
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PointView {
    pub lat: f64,
    pub lon: f64,
}

impl From<GeoPoint> for PointView {
    fn from(p: GeoPoint) -> Self {
        Self {
            lat: p.lat(),
            lon: p.lon(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SelectionView {
    pub start: Option<PointView>,
    pub end: Option<PointView>,
    pub next_slot: Option<Slot>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RouteResultView {
    pub distance: String,
    pub time: String,
    /// Only set for user-defined routes.
    pub safety_share: Option<String>,
    pub path: Vec<PointView>,
    pub path_geojson: String,
    pub instructions: Vec<TurnInstruction>,
}

impl From<&RouteResult> for RouteResultView {
    fn from(route: &RouteResult) -> Self {
        Self {
            distance: format_distance(route.statistics.distance_km),
            time: format_duration(route.statistics.time_min),
            safety_share: (route.mode == RouteMode::UserDefined)
                .then(|| format_safety_share(route.risk_weight.value())),
            path: route.path.iter().copied().map(PointView::from).collect(),
            path_geojson: GeoJson::from(route_feature(route)).to_string(),
            instructions: route.turn_list(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RouteView {
    pub mode: RouteMode,
    pub risk_weight: f64,
    pub risk_description: String,
    pub is_requesting: bool,
    pub can_find_route: bool,
    pub show_instructions: bool,
    pub result: Option<RouteResultView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchView {
    pub query: String,
    pub is_searching: bool,
    pub results: Vec<SearchCandidate>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HavenView {
    pub name: String,
    pub kind: HavenKind,
    pub location: PointView,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DatasetsView {
    pub datasets: Vec<MapDataset>,
    pub is_busy: bool,
    pub is_refreshing: bool,
    pub busy_label: Option<String>,
    pub active_location: Option<String>,
    pub police_count: usize,
    pub hospital_count: usize,
    pub havens: Vec<HavenView>,
    pub havens_geojson: String,
    /// Nearest haven to the start point, e.g. "Race Course Police Station (350 m)".
    pub nearest_haven: Option<String>,
    /// Download radius choices in metres; `default_download_radius_m` is preselected.
    pub download_radius_options: Vec<u32>,
    pub default_download_radius_m: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServiceOption {
    pub service: EmergencyService,
    pub label: String,
    pub number: String,
    pub selected: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmergencyView {
    pub state: EmergencyState,
    pub is_open: bool,
    pub seconds_remaining: u32,
    pub status_text: Option<String>,
    pub services: Vec<ServiceOption>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub selection: SelectionView,
    pub route: RouteView,
    pub start_search: SearchView,
    pub end_search: SearchView,
    pub datasets: DatasetsView,
    pub emergency: EmergencyView,
    pub backend_status: Option<BackendStatus>,
    pub notice: Option<Notice>,
}

impl ViewModel {
    #[must_use]
    pub fn build(model: &Model) -> Self {
        Self {
            selection: SelectionView {
                start: model.selection.start().map(PointView::from),
                end: model.selection.end().map(PointView::from),
                next_slot: model.selection.next_free_slot(),
            },
            route: RouteView {
                mode: model.route.mode(),
                risk_weight: model.route.risk_weight().value(),
                risk_description: model.route.risk_weight().description().to_string(),
                is_requesting: model.route.is_requesting(),
                can_find_route: model.route.can_request(&model.selection),
                show_instructions: model.route.show_instructions(),
                result: model.route.result().map(RouteResultView::from),
            },
            start_search: search_view(model, Slot::Start),
            end_search: search_view(model, Slot::End),
            datasets: datasets_view(model),
            emergency: emergency_view(model),
            backend_status: model.backend_status.clone(),
            notice: model.active_notice.clone(),
        }
    }
}

fn search_view(model: &Model, slot: Slot) -> SearchView {
    SearchView {
        query: model.search.query(slot).to_string(),
        is_searching: model.search.is_searching(slot),
        results: model.search.results(slot).to_vec(),
    }
}

fn datasets_view(model: &Model) -> DatasetsView {
    let manager = &model.datasets;
    let active = manager.active();

    let busy_label = manager.task().map(|task| match task {
        DatasetTask::Downloading { name, .. } => format!("Downloading {name}..."),
        DatasetTask::Loading { .. } => "Loading...".to_string(),
    });

    let nearest_haven = model.selection.start().and_then(|start| {
        active
            .nearest_haven(start)
            .map(|(haven, metres)| format!("{} ({} m)", haven.name, metres.round()))
    });

    DatasetsView {
        datasets: manager.datasets().to_vec(),
        is_busy: manager.is_busy(),
        is_refreshing: manager.is_refreshing(),
        busy_label,
        active_location: active.location.clone(),
        police_count: active.count(HavenKind::Police),
        hospital_count: active.count(HavenKind::Hospital),
        havens: active
            .safe_havens()
            .iter()
            .map(|h| HavenView {
                name: h.name.clone(),
                kind: h.kind,
                location: h.location.into(),
            })
            .collect(),
        havens_geojson: GeoJson::from(havens_collection(active.safe_havens())).to_string(),
        nearest_haven,
        download_radius_options: DOWNLOAD_RADIUS_PRESETS_M.to_vec(),
        default_download_radius_m: DEFAULT_DOWNLOAD_RADIUS_M,
    }
}

fn emergency_view(model: &Model) -> EmergencyView {
    let state = model.emergency.state();
    let (seconds_remaining, status_text) = match state {
        EmergencyState::Idle => (model.emergency.countdown_secs(), None),
        EmergencyState::CountingDown {
            seconds_remaining, ..
        } => (
            seconds_remaining,
            Some(format!("Calling in {seconds_remaining}s...")),
        ),
        EmergencyState::Calling { service } => (
            0,
            Some(format!("Calling {} at {}", service.label(), service.number())),
        ),
    };
    let selected = state.service();

    EmergencyView {
        state,
        is_open: state != EmergencyState::Idle,
        seconds_remaining,
        status_text,
        services: EmergencyService::ALL
            .iter()
            .map(|&service| ServiceOption {
                service,
                label: service.label().to_string(),
                number: service.number().to_string(),
                selected: selected == Some(service),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_formatting() {
        assert_eq!(format_distance(5.2), "5.20 km");
        assert_eq!(format_distance(0.0), "0.00 km");
        assert_eq!(format_duration(12.0), "12 mins");
        assert_eq!(format_duration(11.6), "12 mins");
        assert_eq!(format_safety_share(0.7), "70% Safe");
    }

    #[test]
    fn test_idle_view() {
        let view = ViewModel::build(&Model::default());

        assert_eq!(view.selection.next_slot, Some(Slot::Start));
        assert!(!view.route.can_find_route);
        assert_eq!(view.route.mode, RouteMode::UserDefined);
        assert_eq!(view.route.risk_description, "Quite Safe");
        assert!(!view.emergency.is_open);
        assert_eq!(view.emergency.seconds_remaining, 5);
        assert_eq!(view.emergency.services.len(), 4);
        assert!(view.emergency.services.iter().all(|s| !s.selected));
        let havens: serde_json::Value = serde_json::from_str(&view.datasets.havens_geojson).unwrap();
        assert_eq!(havens["type"], "FeatureCollection");
        assert_eq!(havens["features"], serde_json::json!([]));
        assert_eq!(
            view.datasets.download_radius_options,
            vec![2000, 5000, 10_000, 20_000]
        );
        assert!(view
            .datasets
            .download_radius_options
            .contains(&view.datasets.default_download_radius_m));
    }

    #[test]
    fn test_countdown_view() {
        let mut model = Model::default();
        model.emergency.trigger();
        let view = ViewModel::build(&model);

        assert!(view.emergency.is_open);
        assert_eq!(view.emergency.status_text.as_deref(), Some("Calling in 5s..."));
        let police = &view.emergency.services[0];
        assert_eq!(police.number, "100");
        assert!(police.selected);
    }
}
