use serde::{Deserialize, Serialize};

use crate::capabilities::{DialResult, HttpResult, TimerOutput};
use crate::config::ClientConfig;
use crate::model::{EmergencyService, RouteMode, Slot};
use crate::token::RequestToken;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    AppStarted,
    Configure(ClientConfig),
    AppClosing,

    // --- selection & route ---
    MapClicked {
        lat: f64,
        lon: f64,
    },
    ClearSelection,
    SearchRequested {
        slot: Slot,
        query: String,
    },
    SearchResultChosen {
        slot: Slot,
        index: usize,
    },
    SearchDismissed {
        slot: Slot,
    },
    ModeSelected(RouteMode),
    RiskWeightChanged(f64),
    FindRoute,
    HideInstructions,

    // --- datasets ---
    RefreshDatasets,
    DownloadDataset {
        name: String,
        radius_m: u32,
    },
    LoadDataset {
        file: String,
    },
    StatusRequested,

    // --- emergency ---
    SosTriggered,
    KeyPressed {
        key: String,
    },
    EmergencyServiceSelected(EmergencyService),
    SosCancelled,
    SosCallNow,

    NoticeDismissed,

    // --- capability results, never sent by the shell ---
    #[serde(skip)]
    RouteResponse {
        token: RequestToken,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    DatasetsResponse {
        token: RequestToken,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    DownloadResponse {
        token: RequestToken,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    LoadResponse {
        token: RequestToken,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    SafeHavensResponse {
        version: u64,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    SearchResponse {
        slot: Slot,
        token: RequestToken,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    StatusResponse(Box<HttpResult>),
    #[serde(skip)]
    SosTimerFired(TimerOutput),
    #[serde(skip)]
    DialCompleted {
        service: EmergencyService,
        result: DialResult,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted => "app_started",
            Self::Configure(_) => "configure",
            Self::AppClosing => "app_closing",
            Self::MapClicked { .. } => "map_clicked",
            Self::ClearSelection => "clear_selection",
            Self::SearchRequested { .. } => "search_requested",
            Self::SearchResultChosen { .. } => "search_result_chosen",
            Self::SearchDismissed { .. } => "search_dismissed",
            Self::ModeSelected(_) => "mode_selected",
            Self::RiskWeightChanged(_) => "risk_weight_changed",
            Self::FindRoute => "find_route",
            Self::HideInstructions => "hide_instructions",
            Self::RefreshDatasets => "refresh_datasets",
            Self::DownloadDataset { .. } => "download_dataset",
            Self::LoadDataset { .. } => "load_dataset",
            Self::StatusRequested => "status_requested",
            Self::SosTriggered => "sos_triggered",
            Self::KeyPressed { .. } => "key_pressed",
            Self::EmergencyServiceSelected(_) => "emergency_service_selected",
            Self::SosCancelled => "sos_cancelled",
            Self::SosCallNow => "sos_call_now",
            Self::NoticeDismissed => "notice_dismissed",
            Self::RouteResponse { .. } => "route_response",
            Self::DatasetsResponse { .. } => "datasets_response",
            Self::DownloadResponse { .. } => "download_response",
            Self::LoadResponse { .. } => "load_response",
            Self::SafeHavensResponse { .. } => "safe_havens_response",
            Self::SearchResponse { .. } => "search_response",
            Self::StatusResponse(_) => "status_response",
            Self::SosTimerFired(_) => "sos_timer_fired",
            Self::DialCompleted { .. } => "dial_completed",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::MapClicked { .. }
                | Self::ClearSelection
                | Self::SearchRequested { .. }
                | Self::SearchResultChosen { .. }
                | Self::SearchDismissed { .. }
                | Self::ModeSelected(_)
                | Self::RiskWeightChanged(_)
                | Self::FindRoute
                | Self::HideInstructions
                | Self::DownloadDataset { .. }
                | Self::LoadDataset { .. }
                | Self::SosTriggered
                | Self::KeyPressed { .. }
                | Self::EmergencyServiceSelected(_)
                | Self::SosCancelled
                | Self::SosCallNow
                | Self::NoticeDismissed
        )
    }
}
