//! Wire shapes for the routing backend and the public geocoder, plus the
//! conversions into the core's own types.

use crux_http::Response;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use crate::capabilities::HttpError;
use crate::model::{
    CoordinateError, GeoPoint, HavenKind, MapDataset, RiskWeight, RouteMode, RouteResult,
    RouteStatistics, SafeHaven,
};

pub const LOCATIONS_PATH: &str = "/locations";
pub const SAFE_HAVENS_PATH: &str = "/safe-havens";
pub const DOWNLOAD_PATH: &str = "/download-location";
pub const LOAD_PATH: &str = "/load-location";
pub const ROUTE_PATH: &str = "/route-with-instructions";
pub const STATUS_PATH: &str = "/status";

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: String,
}

/// Turns a non-2xx response into `HttpError::Status`, using the backend's
/// `{"error": ...}` body when present.
pub fn expect_success<E>(
    result: Result<Response<Vec<u8>>, E>,
) -> Result<Response<Vec<u8>>, HttpError>
where
    HttpError: From<E>,
{
    let response = result?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .body()
        .and_then(|body| serde_json::from_slice::<ApiErrorResponse>(body).ok())
        .map(|e| e.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP error: {status}"));

    Err(HttpError::Status {
        status: u16::from(status),
        message,
    })
}

pub fn expect_json<T, E>(result: Result<Response<Vec<u8>>, E>) -> Result<T, HttpError>
where
    T: DeserializeOwned,
    HttpError: From<E>,
{
    let response = expect_success(result)?;
    let body = response.body().map(Vec::as_slice).unwrap_or_default();
    serde_json::from_slice(body).map_err(|e| HttpError::InvalidResponse {
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationsResponse {
    #[serde(default)]
    pub locations: Vec<LocationDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationDto {
    pub name: String,
    pub file: String,
}

impl From<LocationDto> for MapDataset {
    fn from(dto: LocationDto) -> Self {
        Self {
            display_name: dto.name,
            file_handle: dto.file,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SafeHavensResponse {
    #[serde(default)]
    pub havens: Vec<HavenDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HavenDto {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl SafeHavensResponse {
    /// Entries with an unknown type or invalid coordinates are skipped.
    #[must_use]
    pub fn into_havens(self) -> Vec<SafeHaven> {
        self.havens
            .into_iter()
            .filter_map(|dto| {
                let kind = match dto.kind.to_ascii_lowercase().as_str() {
                    "police" => HavenKind::Police,
                    "hospital" => HavenKind::Hospital,
                    other => {
                        warn!(name = %dto.name, kind = other, "skipping safe haven of unknown type");
                        return None;
                    }
                };
                match GeoPoint::new(dto.lat, dto.lon) {
                    Ok(location) => Some(SafeHaven {
                        name: dto.name,
                        location,
                        kind,
                    }),
                    Err(e) => {
                        warn!(name = %dto.name, error = %e, "skipping safe haven with bad coordinates");
                        None
                    }
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    pub location: String,
    pub radius: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadRequest {
    pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadResponse {
    pub location: String,
    #[serde(default)]
    pub nodes: Option<u64>,
    #[serde(default)]
    pub edges: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RouteStatisticsDto {
    pub distance_km: f64,
    pub time_min: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteResponse {
    pub path: Vec<WirePoint>,
    pub statistics: RouteStatisticsDto,
    #[serde(default)]
    pub instructions: serde_json::Value,
}

impl RouteResponse {
    pub fn into_result(
        self,
        mode: RouteMode,
        risk_weight: RiskWeight,
    ) -> Result<RouteResult, CoordinateError> {
        let path = self
            .path
            .into_iter()
            .map(|p| GeoPoint::new(p.lat, p.lon))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RouteResult {
            path,
            statistics: RouteStatistics {
                distance_km: self.statistics.distance_km,
                time_min: self.statistics.time_min,
            },
            instructions: self.instructions,
            mode,
            risk_weight,
        })
    }
}

/// One entry of the geocoder's JSON array. Coordinates arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeCandidate {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

impl GeocodeCandidate {
    #[must_use]
    pub fn point(&self) -> Option<GeoPoint> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lon = self.lon.trim().parse::<f64>().ok()?;
        GeoPoint::new(lat, lon).ok()
    }
}

fn position(point: GeoPoint) -> Vec<f64> {
    vec![point.lon(), point.lat()]
}

/// Route path as a GeoJSON `LineString` feature (positions are `[lon, lat]`).
#[must_use]
pub fn route_feature(route: &RouteResult) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert(
        "distance_km".into(),
        JsonValue::from(route.statistics.distance_km),
    );
    properties.insert("time_min".into(), JsonValue::from(route.statistics.time_min));
    properties.insert("mode".into(), JsonValue::from(route.mode.as_str()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(
            route.path.iter().copied().map(position).collect(),
        ))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[must_use]
pub fn havens_collection(havens: &[SafeHaven]) -> FeatureCollection {
    let features = havens
        .iter()
        .map(|haven| {
            let mut properties = JsonObject::new();
            properties.insert("name".into(), JsonValue::from(haven.name.clone()));
            let kind = match haven.kind {
                HavenKind::Police => "police",
                HavenKind::Hospital => "hospital",
            };
            properties.insert("type".into(), JsonValue::from(kind));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(position(haven.location)))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
