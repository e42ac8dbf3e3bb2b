use anyhow::Result;
use axum::routing::get;
use axum::Router;
use config::Config;
use doc::{build_descriptors, list_descriptors, list_documents, serve_document, DocumentRegistry};
use std::sync::Arc;
use store::ForecastStore;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use versioning::{
    ApiVersionDescriptionProvider, SupportedVersions, DEPRECATED_VERSIONS_HEADER,
    SUPPORTED_VERSIONS_HEADER,
};

/// Handlers
mod api;
/// configuration from file
mod config;
/// OpenAPI document registry
mod doc;
/// forecast records and their generation
mod forecast;
/// in memory forecast store with sliding expiration
mod store;
/// supported API versions
mod versioning;

const CONFIG_PATH: &str = "/etc/weather-forecast-api/config.toml";

#[derive(Clone)]
struct AppState {
    // built once at startup, read only afterwards.
    documents: Arc<DocumentRegistry>,
    store: Arc<ForecastStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let path = std::env::args().nth(1).unwrap_or(CONFIG_PATH.to_string());
    info!("loading configuration file {path}");
    let config = confy::load_path::<Config>(path)?;
    let listen = config.listen_address;
    let versions = SupportedVersions::default();
    info!("building the OpenAPI documents and the store...");
    let state = new_state(&config, &versions, ForecastStore::new(config.store.expiration));
    info!("Done.");
    let route = router(&versions).with_state(state);
    info!("starting to listen on {listen}");
    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(listener, route.into_make_service()).await?;
    Ok(())
}

fn router(versions: &SupportedVersions) -> Router<AppState> {
    Router::new()
        .nest("/v1/weatherforecast", v1_router())
        .nest(api::v2::ROUTE, v2_router())
        .nest("/swagger", doc_router())
        .layer(SetResponseHeaderLayer::if_not_present(
            SUPPORTED_VERSIONS_HEADER,
            versions.supported_header(),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            DEPRECATED_VERSIONS_HEADER,
            versions.deprecated_header(),
        ))
}

fn v1_router() -> Router<AppState> {
    Router::new().route("/", get(api::v1::list))
}
fn v2_router() -> Router<AppState> {
    Router::new()
        .route("/", get(api::v2::list).post(api::v2::create))
        .route(
            "/:id",
            get(api::v2::get_by_id)
                .put(api::v2::update)
                .delete(api::v2::delete),
        )
}
fn doc_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_documents))
        .route("/descriptors", get(list_descriptors))
        .route("/:document/swagger.json", get(serve_document))
}
fn new_state(
    config: &Config,
    provider: &impl ApiVersionDescriptionProvider,
    store: ForecastStore,
) -> AppState {
    let versions = provider.api_version_descriptions();
    let documents =
        build_descriptors(&versions, config.registry_mode()).with_operations(api::operations());
    documents.log_summary();
    AppState {
        documents: Arc::new(documents),
        store: Arc::new(store),
    }
}
// tests

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use anyhow::Result;
    use axum::http::{header::LOCATION, StatusCode};
    use axum_test::TestServer;
    use chrono::{DateTime, Utc};
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::{
        api,
        config::Config,
        doc::HttpMethod,
        forecast::{WeatherForecast, SEED_COUNT},
        new_state, router,
        store::{test::ManualClock, ForecastStore},
        versioning::SupportedVersions,
    };

    fn app_with(config: Config) -> Result<(TestServer, Arc<ManualClock>)> {
        let clock = ManualClock::new();
        let versions = SupportedVersions::default();
        let store = ForecastStore::with_clock(config.store.expiration, clock.clone());
        let state = new_state(&config, &versions, store);
        let router = router(&versions).with_state(state);
        Ok((TestServer::new(router)?, clock))
    }
    fn app() -> Result<(TestServer, Arc<ManualClock>)> {
        app_with(Config::default())
    }
    fn mild(date: DateTime<Utc>) -> Value {
        json!({"date": date, "temperatureC": 20, "summary": "mild"})
    }

    #[tokio::test]
    async fn list_v2() -> Result<()> {
        let (app, _clock) = app()?;
        let rep = app.get("/v2/weatherforecast").await;
        rep.assert_status_ok();
        let forecasts = rep.json::<Vec<WeatherForecast>>();
        assert_eq!(forecasts.len(), SEED_COUNT);
        // same set while the store is warm
        let again = app.get("/v2/weatherforecast").await.json::<Vec<WeatherForecast>>();
        assert_eq!(forecasts, again);
        Ok(())
    }
    #[tokio::test]
    async fn list_v1_is_not_stored() -> Result<()> {
        let (app, _clock) = app()?;
        let rep = app.get("/v1/weatherforecast").await;
        rep.assert_status_ok();
        let forecasts = rep.json::<Vec<WeatherForecast>>();
        assert_eq!(forecasts.len(), SEED_COUNT);
        assert!(forecasts
            .iter()
            .all(|f| f.summary.starts_with(|c: char| c.is_uppercase())));
        let stored = app.get("/v2/weatherforecast").await.json::<Vec<WeatherForecast>>();
        assert!(stored.iter().all(|s| forecasts.iter().all(|f| f.id != s.id)));
        Ok(())
    }
    #[tokio::test]
    async fn json_is_camel_case() -> Result<()> {
        let (app, _clock) = app()?;
        let rep = app.get("/v2/weatherforecast").await.json::<Value>();
        let first = &rep[0];
        assert!(first["temperatureC"].is_i64());
        assert!(first["id"].is_string());
        assert!(first["summary"].is_string());
        Ok(())
    }
    #[tokio::test]
    async fn create_get_delete() -> Result<()> {
        let (app, _clock) = app()?;
        let date = Utc::now();
        let rep = app.post("/v2/weatherforecast").json(&mild(date)).await;
        rep.assert_status(StatusCode::CREATED);
        assert!(rep.text().is_empty());
        let location = rep.header(LOCATION);
        let location = location.to_str()?.to_string();
        assert!(location.starts_with("/v2/weatherforecast/"));
        let forecast = app.get(&location).await.json::<WeatherForecast>();
        assert_eq!(location, format!("/v2/weatherforecast/{}", forecast.id));
        assert_eq!(forecast.summary, "mild");
        assert_eq!(forecast.temperature_c, 20);
        assert_eq!(forecast.date, date);
        app.delete(&location).await.assert_status(StatusCode::NO_CONTENT);
        app.get(&location).await.assert_status_not_found();
        Ok(())
    }
    #[tokio::test]
    async fn get_invalid_ids() -> Result<()> {
        let (app, _clock) = app()?;
        app.get(&format!("/v2/weatherforecast/{}", Uuid::nil()))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        app.get("/v2/weatherforecast/not-a-uuid")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        app.get(&format!("/v2/weatherforecast/{}", Uuid::new_v4()))
            .await
            .assert_status_not_found();
        Ok(())
    }
    #[tokio::test]
    async fn update() -> Result<()> {
        let (app, _clock) = app()?;
        let forecasts = app.get("/v2/weatherforecast").await.json::<Vec<WeatherForecast>>();
        let id = forecasts[2].id;
        let uri = format!("/v2/weatherforecast/{id}");
        app.put(&uri)
            .json(&json!({
                "id": id,
                "date": forecasts[2].date,
                "temperatureC": 33,
                "summary": "hot"
            }))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        let after = app.get("/v2/weatherforecast").await.json::<Vec<WeatherForecast>>();
        assert_eq!(after[2].id, id);
        assert_eq!(after[2].temperature_c, 33);
        assert_eq!(after[2].summary, "hot");
        Ok(())
    }
    #[tokio::test]
    async fn update_mismatch_and_unknown() -> Result<()> {
        let (app, _clock) = app()?;
        let before = app.get("/v2/weatherforecast").await.json::<Vec<WeatherForecast>>();
        let body = json!({
            "id": Uuid::new_v4(),
            "date": Utc::now(),
            "temperatureC": 1,
            "summary": "cool"
        });
        app.put(&format!("/v2/weatherforecast/{}", before[0].id))
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        let after = app.get("/v2/weatherforecast").await.json::<Vec<WeatherForecast>>();
        assert_eq!(before, after);
        app.put(&format!("/v2/weatherforecast/{}", body["id"].as_str().unwrap()))
            .json(&body)
            .await
            .assert_status_not_found();
        Ok(())
    }
    #[tokio::test]
    async fn delete_unknown() -> Result<()> {
        let (app, _clock) = app()?;
        app.delete(&format!("/v2/weatherforecast/{}", Uuid::new_v4()))
            .await
            .assert_status_not_found();
        let list = app.get("/v2/weatherforecast").await.json::<Vec<WeatherForecast>>();
        assert_eq!(list.len(), SEED_COUNT);
        Ok(())
    }
    #[tokio::test]
    async fn store_expires_when_idle() -> Result<()> {
        let (app, clock) = app()?;
        let date = Utc::now();
        let location = app
            .post("/v2/weatherforecast")
            .json(&mild(date))
            .await
            .header(LOCATION)
            .to_str()?
            .to_string();
        clock.advance(Config::default().store.expiration);
        app.get(&location).await.assert_status_not_found();
        let list = app.get("/v2/weatherforecast").await.json::<Vec<WeatherForecast>>();
        assert_eq!(list.len(), SEED_COUNT);
        // activity keeps the store alive
        clock.advance(Duration::from_secs(200));
        let again = app.get("/v2/weatherforecast").await.json::<Vec<WeatherForecast>>();
        assert_eq!(list, again);
        Ok(())
    }
    #[tokio::test]
    async fn version_headers() -> Result<()> {
        let (app, _clock) = app()?;
        let rep = app.get("/v2/weatherforecast").await;
        assert_eq!(rep.header("api-supported-versions"), "1, 2");
        assert!(rep.headers().get("api-deprecated-versions").is_none());
        Ok(())
    }
    #[tokio::test]
    async fn declared_documents() -> Result<()> {
        let (app, _clock) = app()?;
        let links = app.get("/swagger").await.json::<Value>();
        let names: Vec<_> = links
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["V1", "V2", "ALL"]);
        let v2 = app.get("/swagger/v2/swagger.json").await;
        v2.assert_status_ok();
        let v2 = v2.json::<Value>();
        assert_eq!(v2["info"]["title"], "Weather Forecast API");
        let jwt = &v2["components"]["securitySchemes"]["JWT"];
        assert_eq!(jwt["in"], "header");
        assert_eq!(jwt["name"], "Authorization");
        app.get("/swagger/all/swagger.json").await.assert_status_ok();
        app.get("/swagger/v3/swagger.json")
            .await
            .assert_status_not_found();
        Ok(())
    }
    #[tokio::test]
    async fn discovered_documents() -> Result<()> {
        let (app, _clock) = app_with(Config {
            use_version_provider_for_docs: true,
            ..Default::default()
        })?;
        let descriptors = app.get("/swagger/descriptors").await.json::<Value>();
        let descriptors = descriptors.as_array().unwrap();
        assert_eq!(descriptors.len(), SupportedVersions::default().len());
        assert!(descriptors.iter().all(|d| d["security_scheme"].is_null()));
        app.get("/swagger/all/swagger.json")
            .await
            .assert_status_not_found();
        let v1 = app.get("/swagger/v1/swagger.json").await.json::<Value>();
        assert!(v1["components"].is_null());
        Ok(())
    }
    #[tokio::test]
    async fn documents_list_their_version_paths() -> Result<()> {
        let (app, _clock) = app()?;
        let v1 = app.get("/swagger/v1/swagger.json").await.json::<Value>();
        let v1_paths: Vec<_> = v1["paths"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(v1_paths, ["/v1/weatherforecast"]);
        let all = app.get("/swagger/all/swagger.json").await.json::<Value>();
        let all = all["paths"].as_object().unwrap();
        assert!(all.contains_key("/v1/weatherforecast"));
        assert!(all.contains_key("/v2/weatherforecast"));
        assert!(all.contains_key("/v2/weatherforecast/{id}"));
        Ok(())
    }
    #[tokio::test]
    async fn documented_operations_are_routed() -> Result<()> {
        let (app, _clock) = app()?;
        for operation in api::operations() {
            let path = operation
                .path
                .replace("{id}", &Uuid::new_v4().to_string());
            let rep = match operation.method {
                HttpMethod::Get => app.get(&path).await,
                HttpMethod::Post => app.post(&path).json(&mild(Utc::now())).await,
                HttpMethod::Put => app.put(&path).json(&json!({})).await,
                HttpMethod::Delete => app.delete(&path).await,
            };
            assert_ne!(rep.status_code(), StatusCode::METHOD_NOT_ALLOWED, "{path}");
            if !operation.path.contains("{id}") {
                assert!(rep.status_code().is_success(), "{path}");
            }
        }
        Ok(())
    }
}
