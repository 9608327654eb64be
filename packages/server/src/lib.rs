#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the municipal budget map.
//!
//! Accepts and lists budget allocation submissions (stored in `SQLite`),
//! and serves the decoded municipality boundaries, municipality search,
//! point lookup, and the allocation category catalog. In production the
//! built frontend is served from a static directory.

pub mod config;
mod handlers;

use std::path::Path;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::dev::{ServiceRequest, ServiceResponse, fn_service};
use actix_web::{App, HttpServer, middleware, web};
use muni_budget_map_data::MapDataLoader;
use switchy_database::Database;

pub use config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// `SQLite` database of submitted allocations.
    pub db: Arc<dyn Database>,
    /// Process-wide map data, loaded on first use.
    pub map_data: Arc<MapDataLoader>,
}

/// Registers every `/api` route.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(handlers::json_error))
            .app_data(web::QueryConfig::default().error_handler(handlers::query_error))
            .route("/health", web::get().to(handlers::health))
            .route(
                "/budget-allocations",
                web::post().to(handlers::store_allocation),
            )
            .route(
                "/budget-allocations",
                web::get().to(handlers::list_allocations),
            )
            .route("/categories", web::get().to(handlers::categories))
            .route("/municipalities", web::get().to(handlers::municipalities))
            .route(
                "/municipalities/{id}",
                web::get().to(handlers::municipality),
            )
            .route("/locate", web::get().to(handlers::locate))
            .route("/boundaries", web::get().to(handlers::boundaries)),
    );
}

/// Serves the built frontend, falling back to `index.html` for client-side
/// routes.
fn static_files(dir: &Path) -> Files {
    let index = dir.join("index.html");

    Files::new("/", dir)
        .index_file("index.html")
        .default_handler(fn_service(move |req: ServiceRequest| {
            let index = index.clone();
            async move {
                let (req, _) = req.into_parts();
                let file = NamedFile::open_async(index).await?;
                let res = file.into_response(&req);
                Ok(ServiceResponse::new(req, res))
            }
        }))
}

/// Starts the municipal budget map API server.
///
/// Opens the allocations database, prepares the map data loader (and
/// starts the first load in the background), and runs the Actix-Web HTTP
/// server. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database or topology source
/// cannot be set up, or if the HTTP server fails to bind or encounters a
/// runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    log::info!("Opening allocations database...");
    let db = muni_budget_database::open_db(&config.database_path)
        .await
        .map_err(std::io::Error::other)?;

    log::info!("Map data source: {}", config.topology);
    let fetcher = config.topology.fetcher().map_err(std::io::Error::other)?;
    let loader = Arc::new(MapDataLoader::new(fetcher));

    let warm = Arc::clone(&loader);
    actix_rt::spawn(async move {
        if warm.get().await.is_ok() {
            log::info!("Map data preloaded");
        }
    });

    let state = web::Data::new(AppState {
        db: Arc::from(db),
        map_data: loader,
    });

    let static_dir = config
        .static_dir
        .is_dir()
        .then(|| config.static_dir.clone());
    match &static_dir {
        Some(dir) => log::info!("Serving frontend from {}", dir.display()),
        None => log::info!(
            "Static directory {} not found; serving API only",
            config.static_dir.display()
        ),
    }

    let bind_addr = config.bind_addr.clone();
    let port = config.port;
    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        let mut app = App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api);

        if let Some(dir) = &static_dir {
            app = app.service(static_files(dir));
        }
        app
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use actix_web::http::{StatusCode, header};
    use actix_web::test;
    use muni_budget_map_data::FileFetcher;
    use muni_budget_topology::reproject::reproject;
    use serde_json::{Value, json};

    use super::*;

    struct Fixture {
        db_path: PathBuf,
        topology_path: PathBuf,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.db_path);
            let _ = std::fs::remove_file(&self.topology_path);
        }
    }

    /// One absolute-coordinate square (no transform) in spherical Mercator
    /// meters, covering roughly 99.7-100.6 E, 13.3-14.2 N.
    fn topology() -> Value {
        json!({
            "type": "Topology",
            "objects": {
                "municipalities": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {
                            "type": "Polygon",
                            "arcs": [[0]],
                            "properties": {
                                "muni_code": "2001",
                                "name": "เทศบาลเมืองทดสอบ",
                                "cwt_name": "นครปฐม",
                                "amp_name": "เมืองนครปฐม",
                                "type": "เทศบาลเมือง"
                            }
                        }
                    ]
                }
            },
            "arcs": [[
                [11_100_000.0, 1_500_000.0],
                [11_200_000.0, 1_500_000.0],
                [11_200_000.0, 1_600_000.0],
                [11_100_000.0, 1_600_000.0],
                [11_100_000.0, 1_500_000.0]
            ]]
        })
    }

    async fn state(name: &str, with_topology: bool) -> (web::Data<AppState>, Fixture) {
        let dir = std::env::temp_dir();
        let fixture = Fixture {
            db_path: dir.join(format!("muni_budget_server_{name}.db")),
            topology_path: dir.join(format!("muni_budget_server_{name}.topo.json")),
        };
        let _ = std::fs::remove_file(&fixture.db_path);
        let _ = std::fs::remove_file(&fixture.topology_path);
        if with_topology {
            std::fs::write(
                &fixture.topology_path,
                serde_json::to_vec(&topology()).unwrap(),
            )
            .unwrap();
        }

        let db = muni_budget_database::open_db(&fixture.db_path).await.unwrap();
        let fetcher = Arc::new(FileFetcher::new(fixture.topology_path.clone()));
        let state = web::Data::new(AppState {
            db: Arc::from(db),
            map_data: Arc::new(MapDataLoader::new(fetcher)),
        });
        (state, fixture)
    }

    fn submission(percentage: f64) -> Value {
        json!({
            "municipalityId": "2001",
            "municipalityName": "เทศบาลเมืองทดสอบ",
            "totalBudget": 400_000_000.0,
            "categories": [{
                "id": "water",
                "name": "บริหารจัดการน้ำ",
                "description": "",
                "percentage": percentage,
                "amount": percentage / 100.0 * 400_000_000.0,
                "color": "#42A5F5"
            }],
            "overBudget": percentage > 100.0,
            "overBudgetIdeas": "ค่าธรรมเนียมจอดรถ"
        })
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let (state, _fixture) = state("health", false).await;
        let app = test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], "Server is running");
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn stores_and_lists_allocations() {
        let (state, _fixture) = state("store_list", false).await;
        let app = test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::post()
            .uri("/api/budget-allocations")
            .peer_addr("203.0.113.7:5000".parse().unwrap())
            .insert_header((header::USER_AGENT, "test-agent"))
            .set_json(submission(120.0))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let stored: Value = test::read_body_json(resp).await;
        assert_eq!(stored["success"], true);
        assert_eq!(stored["message"], "Budget allocation stored successfully");
        let id = stored["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/budget-allocations")
            .to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list["success"], true);
        assert_eq!(list["count"], 1);
        let entry = &list["data"][0];
        assert_eq!(entry["id"], id.as_str());
        assert_eq!(entry["municipalityId"], "2001");
        assert_eq!(entry["overBudget"], true);
        assert_eq!(entry["overBudgetIdeas"], "ค่าธรรมเนียมจอดรถ");
        assert_eq!(entry["userInfo"]["ipAddress"], "203.0.113.7");
        assert_eq!(entry["userInfo"]["userAgent"], "test-agent");
        assert!(entry["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn listing_respects_limit() {
        let (state, _fixture) = state("limit", false).await;
        let app = test::init_service(App::new().app_data(state).configure(configure_api)).await;

        for _ in 0..3 {
            let req = test::TestRequest::post()
                .uri("/api/budget-allocations")
                .set_json(submission(100.0))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri("/api/budget-allocations?limit=2")
            .to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list["count"], 2);
        assert_eq!(list["data"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn malformed_submission_is_bad_request() {
        let (state, _fixture) = state("malformed", false).await;
        let app = test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::post()
            .uri("/api/budget-allocations")
            .set_json(json!({ "municipalityId": 5 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid budget allocation");
    }

    #[actix_web::test]
    async fn categories_lists_catalog() {
        let (state, _fixture) = state("categories", false).await;
        let app = test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get().uri("/api/categories").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let categories = body.as_array().unwrap();
        assert_eq!(categories.len(), 8);
        assert_eq!(categories[0]["id"], "health-env");
    }

    #[actix_web::test]
    async fn searches_and_finds_municipalities() {
        let (state, _fixture) = state("search", true).await;
        let app = test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get()
            .uri("/api/municipalities?q=%E0%B8%99%E0%B8%84%E0%B8%A3%E0%B8%9B%E0%B8%90%E0%B8%A1")
            .to_request();
        let results: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(results.as_array().unwrap().len(), 1);
        assert_eq!(results[0]["id"], "2001");

        let req = test::TestRequest::get().uri("/api/municipalities").to_request();
        let results: Value = test::call_and_read_body_json(&app, req).await;
        assert!(results.as_array().unwrap().is_empty());

        let req = test::TestRequest::get()
            .uri("/api/municipalities/2001")
            .to_request();
        let record: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(record["name"], "เทศบาลเมืองทดสอบ");
        assert_eq!(record["budget"], 400_000_000.0);

        let req = test::TestRequest::get()
            .uri("/api/municipalities/9999")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn locates_point_inside_boundary() {
        let (state, _fixture) = state("locate", true).await;
        let app = test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let (lon, lat) = reproject(11_150_000.0, 1_550_000.0);
        let req = test::TestRequest::get()
            .uri(&format!("/api/locate?lat={lat}&lon={lon}"))
            .to_request();
        let record: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(record["id"], "2001");
        assert_eq!(record["province"], "นครปฐม");

        let req = test::TestRequest::get()
            .uri("/api/locate?lat=0&lon=0")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn malformed_query_is_json_bad_request() {
        let (state, _fixture) = state("bad_query", true).await;
        let app = test::init_service(App::new().app_data(state).configure(configure_api)).await;

        for uri in [
            "/api/locate?lat=abc&lon=100",
            "/api/locate?lat=13",
            "/api/budget-allocations?limit=many",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["success"], false, "{uri}");
            assert_eq!(body["message"], "Invalid query parameters", "{uri}");
            assert!(body["error"].is_string(), "{uri}");
        }
    }

    #[actix_web::test]
    async fn boundaries_are_enriched_geojson() {
        let (state, _fixture) = state("boundaries", true).await;
        let app = test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get().uri("/api/boundaries").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["type"], "FeatureCollection");
        let feature = &body["features"][0];
        assert_eq!(feature["geometry"]["type"], "Polygon");
        assert_eq!(feature["properties"]["id"], "2001");
        assert_eq!(feature["properties"]["budget"], 400_000_000.0);

        let first = &feature["geometry"]["coordinates"][0][0];
        assert!(first[0].as_f64().unwrap() > 99.0 && first[0].as_f64().unwrap() < 101.0);
    }

    #[actix_web::test]
    async fn missing_map_data_is_unavailable_but_sink_still_works() {
        let (state, _fixture) = state("unavailable", false).await;
        let app = test::init_service(App::new().app_data(state).configure(configure_api)).await;

        for uri in ["/api/boundaries", "/api/municipalities?q=x", "/api/locate?lat=13&lon=100"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], "could not load map data");
        }

        let req = test::TestRequest::post()
            .uri("/api/budget-allocations")
            .set_json(submission(100.0))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }
}
