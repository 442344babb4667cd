use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::datasets::DatasetManager;
use crate::emergency::EmergencyController;
use crate::error::Notice;
use crate::route::RouteOrchestrator;
use crate::search::LocationSearch;
use crate::selection::SelectionState;
use crate::EARTH_RADIUS_M;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

/// WGS84 position in degrees. Validated on construction, including when
/// deserialized, and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lon(self) -> f64 {
        self.lon
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        haversine_distance(self, other)
    }
}

#[derive(Deserialize)]
struct RawPoint {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = CoordinateError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lon)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

/// Great-circle distance in meters.
#[must_use]
pub fn haversine_distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    const EPSILON: f64 = 1e-10;

    if (p1.lat - p2.lat).abs() < EPSILON && (p1.lon - p2.lon).abs() < EPSILON {
        return 0.0;
    }

    let lat1_rad = p1.lat.to_radians();
    let lat2_rad = p2.lat.to_radians();
    let delta_lat = (p2.lat - p1.lat).to_radians();
    let delta_lon = (p2.lon - p1.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().asin();
    let result = EARTH_RADIUS_M * c;

    if result.is_finite() {
        result
    } else {
        f64::MAX
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Start,
    End,
}

impl Slot {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    Safest,
    #[default]
    UserDefined,
}

impl RouteMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safest => "safest",
            Self::UserDefined => "user_defined",
        }
    }
}

/// Safety-versus-directness bias forwarded to the router, always in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskWeight(f64);

impl RiskWeight {
    pub const DEFAULT: Self = Self(0.7);

    /// Clamps into range; non-finite input falls back to the default.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self::DEFAULT
        }
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self.0 {
            w if w < 0.3 => "Prioritize Speed",
            w if w < 0.5 => "Slightly Safe",
            w if w < 0.7 => "Balanced",
            w if w < 0.9 => "Quite Safe",
            _ => "Very Safe",
        }
    }
}

impl Default for RiskWeight {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Body of `POST /route-with-instructions`. Only built from a complete selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub mode: RouteMode,
    pub risk_weight: RiskWeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteStatistics {
    pub distance_km: f64,
    pub time_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnInstruction {
    #[serde(default)]
    pub step: u32,
    pub instruction: String,
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub path: Vec<GeoPoint>,
    pub statistics: RouteStatistics,
    /// Turn list as delivered by the router; interpreted only for display.
    pub instructions: serde_json::Value,
    pub mode: RouteMode,
    pub risk_weight: RiskWeight,
}

impl RouteResult {
    /// Entries that do not look like a turn instruction are skipped.
    #[must_use]
    pub fn turn_list(&self) -> Vec<TurnInstruction> {
        self.instructions
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDataset {
    pub display_name: String,
    pub file_handle: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HavenKind {
    Police,
    Hospital,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeHaven {
    pub name: String,
    pub location: GeoPoint,
    pub kind: HavenKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyService {
    #[default]
    Police,
    Ambulance,
    Fire,
    WomenHelpline,
}

impl EmergencyService {
    pub const ALL: [Self; 4] = [Self::Police, Self::Ambulance, Self::Fire, Self::WomenHelpline];

    #[must_use]
    pub const fn number(self) -> &'static str {
        match self {
            Self::Police => "100",
            Self::Ambulance => "108",
            Self::Fire => "101",
            Self::WomenHelpline => "1091",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Police => "Police",
            Self::Ambulance => "Ambulance",
            Self::Fire => "Fire",
            Self::WomenHelpline => "Women Helpline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BackendStatus {
    pub status: String,
    #[serde(default)]
    pub location_loaded: bool,
    #[serde(default)]
    pub current_location: Option<String>,
    #[serde(default)]
    pub nodes: u64,
    #[serde(default)]
    pub edges: u64,
}

/// Process-wide store. Controllers own their slice; the app glue in
/// `app.rs` is the only code that mutates across slices.
#[derive(Debug, Default)]
pub struct Model {
    pub config: ClientConfig,
    pub selection: SelectionState,
    pub route: RouteOrchestrator,
    pub datasets: DatasetManager,
    pub search: LocationSearch,
    pub emergency: EmergencyController,
    pub backend_status: Option<BackendStatus>,
    pub active_notice: Option<Notice>,
}

impl Model {
    pub fn show_notice(&mut self, notice: Notice) {
        self.active_notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.active_notice = None;
    }

    /// Drops both points and the route; used whenever the map context changes.
    pub fn reset_selection(&mut self) {
        self.selection = SelectionState::Empty;
        self.route.clear();
    }
}
