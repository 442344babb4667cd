//! Shared core of the safe-route client: point selection, route requests,
//! saved map datasets and the SOS countdown, driven by a native shell.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod api;
pub mod app;
pub mod capabilities;
pub mod config;
pub mod datasets;
pub mod emergency;
pub mod error;
pub mod event;
pub mod model;
pub mod route;
pub mod search;
pub mod selection;
pub mod token;
pub mod view;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::ClientConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use error::{AppError, AppResult, ErrorKind, Notice, NoticeLevel};
pub use event::Event;
pub use model::{GeoPoint, Model, RiskWeight, RouteMode, Slot};
pub use view::ViewModel;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_SEARCH_RESULT_LIMIT: usize = 5;
pub const DEFAULT_COUNTDOWN_SECS: u32 = 5;
pub const DEFAULT_GRACE_PERIOD_SECS: u32 = 3;
pub const DEFAULT_TICK_MILLIS: u64 = 1000;
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
