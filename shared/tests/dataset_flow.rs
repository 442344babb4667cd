use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
use serde_json::json;
use shared::{App, Effect, Event, Model, NoticeLevel};

fn http_requests(effects: Vec<Effect>) -> Vec<Request<HttpRequest>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn path_of(request: &Request<HttpRequest>) -> String {
    request
        .operation
        .url
        .trim_start_matches("http://localhost:5000/api")
        .to_string()
}

/// Resolves `request` with `result` and feeds the resulting events back,
/// returning the HTTP requests those events issued.
fn resolve_with(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    request: &mut Request<HttpRequest>,
    result: HttpResult,
) -> Vec<Request<HttpRequest>> {
    let update = app.resolve(request, result).expect("resolves");
    let mut issued = Vec::new();
    for event in update.events {
        issued.extend(http_requests(app.update(event, model).effects));
    }
    issued
}

fn answer(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    request: &mut Request<HttpRequest>,
    body: serde_json::Value,
) -> Vec<Request<HttpRequest>> {
    let response = HttpResponse::ok().json(body).build();
    resolve_with(app, model, request, HttpResult::Ok(response))
}

/// Selects two points and applies a route, leaving its instructions open.
fn apply_route(app: &AppTester<App, Effect>, model: &mut Model) {
    app.update(Event::MapClicked { lat: 11.0168, lon: 76.9558 }, model);
    app.update(Event::MapClicked { lat: 11.05, lon: 77.0 }, model);
    let mut requests = http_requests(app.update(Event::FindRoute, model).effects);
    answer(
        app,
        model,
        &mut requests[0],
        json!({
            "path": [{"lat": 11.0168, "lon": 76.9558}, {"lat": 11.05, "lon": 77.0}],
            "statistics": {"distance_km": 5.2, "time_min": 12},
            "instructions": [
                {"step": 1, "instruction": "Head north", "road": "Avinashi Road", "distance": 1200}
            ]
        }),
    );

    let view = app.view(model);
    assert!(view.route.result.is_some());
    assert!(view.route.show_instructions);
}

#[test]
fn startup_lists_datasets_and_havens() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let mut requests = http_requests(app.update(Event::AppStarted, &mut model).effects);
    let paths: Vec<_> = requests.iter().map(path_of).collect();
    assert_eq!(paths, vec!["/locations", "/safe-havens"]);

    answer(
        &app,
        &mut model,
        &mut requests[0],
        json!({"locations": [{"id": "coimbatore_india", "name": "Coimbatore India", "file": "data/coimbatore_india.pkl"}]}),
    );
    answer(
        &app,
        &mut model,
        &mut requests[1],
        json!({"havens": [
            {"name": "Race Course Police Station", "lat": 11.0, "lon": 76.97, "type": "police"},
            {"name": "Government Hospital", "lat": 11.02, "lon": 76.96, "type": "hospital"}
        ]}),
    );

    let view = app.view(&model);
    assert_eq!(view.datasets.datasets.len(), 1);
    assert_eq!(view.datasets.datasets[0].display_name, "Coimbatore India");
    assert_eq!(view.datasets.police_count, 1);
    assert_eq!(view.datasets.hospital_count, 1);
}

#[test]
fn download_ack_refreshes_list_once_and_clears_selection() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::MapClicked { lat: 11.0168, lon: 76.9558 }, &mut model);

    let update = app.update(
        Event::DownloadDataset {
            name: "Coimbatore, India".into(),
            radius_m: 5000,
        },
        &mut model,
    );
    let mut requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].operation.method, "POST");
    assert_eq!(path_of(&requests[0]), "/download-location");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].operation.body).unwrap();
    assert_eq!(body, json!({"location": "Coimbatore, India", "radius": 5000}));
    assert!(app.view(&model).datasets.is_busy);

    let issued = answer(&app, &mut model, &mut requests[0], json!({"success": true}));

    let refreshes = issued.iter().filter(|r| path_of(r) == "/locations").count();
    assert_eq!(refreshes, 1);
    assert_eq!(issued.len(), 1);
    assert!(model.selection.start().is_none());
    assert!(model.route.result().is_none());

    let view = app.view(&model);
    assert!(!view.datasets.is_busy);
    let notice = view.notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Downloaded Coimbatore, India");
}

#[test]
fn download_ack_with_empty_selection_is_still_one_refresh() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let mut requests = http_requests(
        app.update(
            Event::DownloadDataset {
                name: "Coimbatore, India".into(),
                radius_m: 5000,
            },
            &mut model,
        )
        .effects,
    );
    let issued = answer(&app, &mut model, &mut requests[0], json!({"success": true}));
    assert_eq!(issued.len(), 1);
    assert_eq!(path_of(&issued[0]), "/locations");
}

#[test]
fn download_failure_surfaces_notice_and_keeps_list() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let mut requests = http_requests(
        app.update(
            Event::DownloadDataset {
                name: "Nowhere".into(),
                radius_m: 2000,
            },
            &mut model,
        )
        .effects,
    );

    let failure = HttpResponse::status(500)
        .json(json!({"error": "Could not geocode"}))
        .build();
    let issued = resolve_with(&app, &mut model, &mut requests[0], HttpResult::Ok(failure));

    assert!(issued.is_empty());
    let notice = model.active_notice.clone().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Error downloading location");
    assert!(!model.datasets.is_busy());
}

#[test]
fn load_switches_context_and_ignores_old_havens() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let mut startup = http_requests(app.update(Event::AppStarted, &mut model).effects);
    let stale_havens = startup.remove(1);

    app.update(Event::MapClicked { lat: 11.0168, lon: 76.9558 }, &mut model);
    app.update(Event::MapClicked { lat: 11.05, lon: 77.0 }, &mut model);

    let mut requests = http_requests(
        app.update(
            Event::LoadDataset {
                file: "data/coimbatore_india.pkl".into(),
            },
            &mut model,
        )
        .effects,
    );
    let mut issued = answer(
        &app,
        &mut model,
        &mut requests[0],
        json!({"success": true, "location": "Coimbatore, India", "nodes": 1200, "edges": 3400}),
    );

    assert!(!model.selection.is_complete());
    assert_eq!(
        model.datasets.active().location.as_deref(),
        Some("Coimbatore, India")
    );
    let paths: Vec<_> = issued.iter().map(path_of).collect();
    assert_eq!(paths, vec!["/locations", "/safe-havens"]);

    // Havens requested before the load answer late and are dropped.
    let mut stale_havens = stale_havens;
    answer(
        &app,
        &mut model,
        &mut stale_havens,
        json!({"havens": [{"name": "Old Station", "lat": 1.0, "lon": 1.0, "type": "police"}]}),
    );
    assert!(model.datasets.active().safe_havens().is_empty());

    answer(
        &app,
        &mut model,
        &mut issued[1],
        json!({"havens": [{"name": "Race Course Police Station", "lat": 11.0, "lon": 76.97, "type": "police"}]}),
    );
    assert_eq!(model.datasets.active().safe_havens().len(), 1);
    assert_eq!(
        app.view(&model).notice.unwrap().message,
        "Loaded Coimbatore, India"
    );
}

#[test]
fn load_failure_keeps_active_context() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let mut requests = http_requests(
        app.update(
            Event::LoadDataset {
                file: "data/missing.pkl".into(),
            },
            &mut model,
        )
        .effects,
    );
    let failure = HttpResponse::status(404)
        .json(json!({"error": "File not found"}))
        .build();
    resolve_with(&app, &mut model, &mut requests[0], HttpResult::Ok(failure));

    assert_eq!(model.datasets.active().version(), 0);
    assert!(model.datasets.active().location.is_none());
    assert_eq!(
        model.active_notice.clone().unwrap().message,
        "Error loading location"
    );
}

#[test]
fn status_is_surfaced() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let mut requests = http_requests(app.update(Event::StatusRequested, &mut model).effects);
    assert_eq!(path_of(&requests[0]), "/status");
    answer(
        &app,
        &mut model,
        &mut requests[0],
        json!({"status": "running", "location_loaded": true, "current_location": "Coimbatore, India", "nodes": 1200, "edges": 3400}),
    );

    let status = app.view(&model).backend_status.unwrap();
    assert!(status.location_loaded);
    assert_eq!(status.nodes, 1200);
}

#[test]
fn load_hides_previous_route_and_instructions() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    apply_route(&app, &mut model);

    let mut requests = http_requests(
        app.update(
            Event::LoadDataset {
                file: "data/coimbatore_india.pkl".into(),
            },
            &mut model,
        )
        .effects,
    );
    answer(
        &app,
        &mut model,
        &mut requests[0],
        json!({"success": true, "location": "Coimbatore, India", "nodes": 1200, "edges": 3400}),
    );

    let view = app.view(&model);
    assert!(view.route.result.is_none());
    assert!(!view.route.show_instructions);
}

#[test]
fn download_hides_previous_route_and_instructions() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    apply_route(&app, &mut model);

    let mut requests = http_requests(
        app.update(
            Event::DownloadDataset {
                name: "Coimbatore, India".into(),
                radius_m: 5000,
            },
            &mut model,
        )
        .effects,
    );
    answer(&app, &mut model, &mut requests[0], json!({"success": true}));

    let view = app.view(&model);
    assert!(view.route.result.is_none());
    assert!(!view.route.show_instructions);
}
