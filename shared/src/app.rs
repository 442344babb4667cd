use crux_core::App as CruxApp;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{
    self, DownloadRequest, GeocodeCandidate, LoadRequest, LoadResponse, LocationsResponse,
    RouteResponse, SafeHavensResponse,
};
use crate::capabilities::{
    Capabilities, HttpError, HttpMethod, HttpRequest, HttpResult, TimerOutput, ValidatedUrl,
};
use crate::config::ClientConfig;
use crate::datasets::DatasetCompletion;
use crate::emergency::SosCommand;
use crate::error::{AppError, Notice};
use crate::event::Event;
use crate::model::{BackendStatus, GeoPoint, MapDataset, Model, Slot};
use crate::route::RouteCompletion;
use crate::view::ViewModel;

#[derive(Default)]
pub struct App;

impl App {
    fn get(config: &ClientConfig, path: &str) -> Result<HttpRequest, HttpError> {
        HttpRequest::get(config.endpoint(path))
    }

    fn post_json<T: Serialize>(
        config: &ClientConfig,
        path: &str,
        body: &T,
    ) -> Result<HttpRequest, HttpError> {
        HttpRequest::post(config.endpoint(path))?.with_json(body)
    }

    fn geocode(config: &ClientConfig, query: &str) -> Result<HttpRequest, HttpError> {
        let url = ValidatedUrl::with_query(
            &config.geocoder_url,
            [("format", "json"), ("q", query.trim())],
        )?;
        HttpRequest::new(HttpMethod::Get, url)
    }

    /// Hands `request` to the shell. A request that could not be built is
    /// answered immediately with its error so every issued token settles.
    fn send<F>(
        &self,
        model: &mut Model,
        caps: &Capabilities,
        request: Result<HttpRequest, HttpError>,
        make_event: F,
    ) where
        F: FnOnce(HttpResult) -> Event + Send + 'static,
    {
        match request {
            Ok(request) => {
                debug!(
                    method = request.method().as_str(),
                    url = request.url().as_str(),
                    request_id = request.request_id(),
                    "http request"
                );
                request.send(&caps.http, make_event);
            }
            Err(error) => {
                warn!(error = %error, "could not build http request");
                self.update(make_event(Err(error)), model, caps);
            }
        }
    }

    fn notify(model: &mut Model, error: &AppError) {
        warn!(code = error.code(), remote = error.kind.is_remote(), error = %error, "surfacing notice");
        model.show_notice(Notice::from(error));
    }

    /// Returns whether the point was accepted.
    fn select(model: &mut Model, slot: Option<Slot>, point: GeoPoint) -> bool {
        match model.selection.select(slot, point) {
            Ok(next) => {
                model.selection = next;
                model.route.clear();
                true
            }
            Err(error) => {
                Self::notify(model, &error);
                false
            }
        }
    }

    fn refresh_datasets(&self, model: &mut Model, caps: &Capabilities) {
        let token = model.datasets.begin_refresh();
        let request = Self::get(&model.config, api::LOCATIONS_PATH);
        self.send(model, caps, request, move |result| Event::DatasetsResponse {
            token,
            result: Box::new(result),
        });
    }

    fn fetch_havens(&self, model: &mut Model, caps: &Capabilities, version: u64) {
        let request = Self::get(&model.config, api::SAFE_HAVENS_PATH);
        self.send(model, caps, request, move |result| Event::SafeHavensResponse {
            version,
            result: Box::new(result),
        });
    }

    fn apply_dataset_completion(
        &self,
        model: &mut Model,
        caps: &Capabilities,
        completion: DatasetCompletion,
    ) {
        match completion {
            DatasetCompletion::Changed {
                notice,
                fetch_havens,
            } => {
                model.reset_selection();
                model.show_notice(Notice::success(notice));
                self.refresh_datasets(model, caps);
                if let Some(version) = fetch_havens {
                    self.fetch_havens(model, caps, version);
                }
            }
            DatasetCompletion::Failed(error) => Self::notify(model, &error),
            DatasetCompletion::Stale => {}
        }
    }

    fn run_sos(caps: &Capabilities, commands: Vec<SosCommand>) {
        for command in commands {
            match command {
                SosCommand::StartTimer { id, after } => {
                    caps.timer.start(id, after, Event::SosTimerFired);
                }
                SosCommand::ClearTimer(id) => caps.timer.clear(id),
                SosCommand::Dial(service) => {
                    info!(service = service.label(), number = service.number(), "placing emergency call");
                    caps.dialer.call(service, move |result| Event::DialCompleted {
                        service,
                        result,
                    });
                }
            }
        }
    }
}

impl CruxApp for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(
            event = event.name(),
            user_initiated = event.is_user_initiated(),
            "update"
        );

        match event {
            Event::AppStarted => {
                self.refresh_datasets(model, caps);
                let version = model.datasets.active().version();
                self.fetch_havens(model, caps, version);
            }

            Event::Configure(config) => match config.validate() {
                Ok(()) => {
                    info!(api = %config.api_base_url, "configuration applied");
                    model.emergency.configure(&config);
                    model.config = config;
                }
                Err(e) => Self::notify(model, &AppError::from(e)),
            },

            Event::AppClosing => Self::run_sos(caps, model.emergency.teardown()),

            Event::MapClicked { lat, lon } => match GeoPoint::new(lat, lon) {
                Ok(point) => {
                    Self::select(model, None, point);
                }
                Err(e) => Self::notify(model, &AppError::from(e)),
            },

            Event::ClearSelection => model.reset_selection(),

            Event::SearchRequested { slot, query } => {
                if let Some(token) = model.search.begin(slot, &query) {
                    let request = Self::geocode(&model.config, &query);
                    self.send(model, caps, request, move |result| Event::SearchResponse {
                        slot,
                        token,
                        result: Box::new(result),
                    });
                }
            }

            Event::SearchResponse {
                slot,
                token,
                result,
            } => {
                let outcome = api::expect_json::<Vec<GeocodeCandidate>, _>(*result)
                    .map_err(|e| AppError::search(&e));
                let limit = model.config.search_result_limit;
                if let Err(error) = model.search.complete(slot, token, outcome, limit) {
                    Self::notify(model, &error);
                }
            }

            Event::SearchResultChosen { slot, index } => {
                let point = model.search.results(slot).get(index).map(|c| c.point);
                if let Some(point) = point {
                    if Self::select(model, Some(slot), point) {
                        model.search.choose(slot, index);
                    }
                }
            }

            Event::SearchDismissed { slot } => model.search.dismiss(slot),

            Event::ModeSelected(mode) => model.route.set_mode(mode),

            Event::RiskWeightChanged(weight) => model.route.set_risk_weight(weight),

            Event::FindRoute => match model.route.begin(&model.selection) {
                Ok((token, body)) => {
                    let request = Self::post_json(&model.config, api::ROUTE_PATH, &body);
                    self.send(model, caps, request, move |result| Event::RouteResponse {
                        token,
                        result: Box::new(result),
                    });
                }
                Err(error) => Self::notify(model, &error),
            },

            Event::RouteResponse { token, result } => {
                let outcome = api::expect_json::<RouteResponse, _>(*result)
                    .map_err(|e| AppError::network("Error finding route", &e));
                match model.route.complete(token, outcome) {
                    RouteCompletion::Applied | RouteCompletion::Stale => {}
                    RouteCompletion::Failed(error) => Self::notify(model, &error),
                }
            }

            Event::HideInstructions => model.route.hide_instructions(),

            Event::RefreshDatasets => self.refresh_datasets(model, caps),

            Event::DatasetsResponse { token, result } => {
                let outcome = api::expect_json::<LocationsResponse, _>(*result)
                    .map(|r| r.locations.into_iter().map(MapDataset::from).collect::<Vec<_>>())
                    .map_err(|e| AppError::network("Error loading saved locations", &e));
                if let Err(error) = model.datasets.apply_listing(token, outcome) {
                    Self::notify(model, &error);
                }
            }

            Event::DownloadDataset { name, radius_m } => {
                match model.datasets.begin_download(&name, radius_m) {
                    Ok(token) => {
                        let body = DownloadRequest {
                            location: name.trim().to_string(),
                            radius: radius_m,
                        };
                        let request = Self::post_json(&model.config, api::DOWNLOAD_PATH, &body);
                        self.send(model, caps, request, move |result| Event::DownloadResponse {
                            token,
                            result: Box::new(result),
                        });
                    }
                    Err(error) => Self::notify(model, &error),
                }
            }

            Event::DownloadResponse { token, result } => {
                let outcome = api::expect_success(*result)
                    .map(|_| ())
                    .map_err(|e| AppError::network("Error downloading location", &e));
                let completion = model.datasets.finish_download(token, outcome);
                self.apply_dataset_completion(model, caps, completion);
            }

            Event::LoadDataset { file } => match model.datasets.begin_load(&file) {
                Ok(token) => {
                    let body = LoadRequest { file };
                    let request = Self::post_json(&model.config, api::LOAD_PATH, &body);
                    self.send(model, caps, request, move |result| Event::LoadResponse {
                        token,
                        result: Box::new(result),
                    });
                }
                Err(error) => Self::notify(model, &error),
            },

            Event::LoadResponse { token, result } => {
                let outcome = api::expect_json::<LoadResponse, _>(*result)
                    .map_err(|e| AppError::network("Error loading location", &e));
                let completion = model.datasets.finish_load(token, outcome);
                self.apply_dataset_completion(model, caps, completion);
            }

            Event::SafeHavensResponse { version, result } => {
                let outcome = api::expect_json::<SafeHavensResponse, _>(*result)
                    .map_err(|e| AppError::network("Error loading safe havens", &e));
                if let Err(error) = model.datasets.apply_havens(version, outcome) {
                    Self::notify(model, &error);
                }
            }

            Event::StatusRequested => {
                let request = Self::get(&model.config, api::STATUS_PATH);
                self.send(model, caps, request, |result| {
                    Event::StatusResponse(Box::new(result))
                });
            }

            Event::StatusResponse(result) => {
                match api::expect_json::<BackendStatus, _>(*result) {
                    Ok(status) => {
                        debug!(
                            status = %status.status,
                            location_loaded = status.location_loaded,
                            "backend status"
                        );
                        model.backend_status = Some(status);
                    }
                    Err(e) => {
                        model.backend_status = None;
                        Self::notify(model, &AppError::network("Routing service unavailable", &e));
                    }
                }
            }

            Event::SosTriggered => Self::run_sos(caps, model.emergency.trigger()),

            Event::KeyPressed { key } => {
                if !model.config.is_sos_key(&key) {
                    return;
                }
                debug!(key = %key, "sos key pressed");
                Self::run_sos(caps, model.emergency.trigger());
            }

            Event::EmergencyServiceSelected(service) => model.emergency.select_service(service),

            Event::SosCancelled => Self::run_sos(caps, model.emergency.cancel()),

            Event::SosCallNow => Self::run_sos(caps, model.emergency.call_now()),

            Event::SosTimerFired(output) => match output {
                TimerOutput::Fired(id) => Self::run_sos(caps, model.emergency.timer_fired(id)),
                TimerOutput::Cleared(id) => debug!(%id, "timer cleared by shell"),
            },

            Event::DialCompleted { service, result } => match result {
                Ok(()) => info!(service = service.label(), "emergency call handed off"),
                Err(e) => Self::notify(model, &AppError::dial(service.number(), &e)),
            },

            Event::NoticeDismissed => model.clear_notice(),
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::build(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{HttpResult, REQUEST_ID_HEADER};
    use crate::error::ErrorKind;
    use crux_http::http::StatusCode;
    use crux_http::testing::ResponseBuilder;

    #[test]
    fn test_geocode_request_shape() {
        let request = App::geocode(&ClientConfig::default(), "  Gandhipuram  ").unwrap();
        assert_eq!(request.method(), HttpMethod::Get);
        assert_eq!(
            request.url().as_str(),
            "https://nominatim.openstreetmap.org/search?format=json&q=Gandhipuram"
        );
        assert!(request.headers().get(REQUEST_ID_HEADER).is_some());
    }

    #[test]
    fn test_backend_requests_use_configured_base() {
        let config = ClientConfig {
            api_base_url: "https://routes.example.com/api/".into(),
            ..ClientConfig::default()
        };

        let request = App::get(&config, api::LOCATIONS_PATH).unwrap();
        assert_eq!(request.url().as_str(), "https://routes.example.com/api/locations");

        let request = App::post_json(
            &config,
            api::LOAD_PATH,
            &LoadRequest {
                file: "data/coimbatore.pkl".into(),
            },
        )
        .unwrap();
        assert_eq!(request.method(), HttpMethod::Post);
        let body: serde_json::Value = request.body_json().unwrap();
        assert_eq!(body, serde_json::json!({"file": "data/coimbatore.pkl"}));
    }

    #[test]
    fn test_error_kinds_for_dataset_failures() {
        let response = ResponseBuilder::with_status(StatusCode::InternalServerError)
            .body(br#"{"error": "Location not found"}"#.to_vec())
            .build();
        let response: HttpResult = Ok(response);
        let error = api::expect_success(response)
            .map_err(|e| AppError::network("Error downloading location", &e))
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::NetworkFailure);
        assert_eq!(error.user_facing_message(), "Error downloading location");
        assert_eq!(error.context.get("status").map(String::as_str), Some("500"));
        assert_eq!(
            error.internal_message.as_deref(),
            Some("HTTP error 500: Location not found")
        );
    }
}
