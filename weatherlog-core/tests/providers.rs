//! HTTP provider tests against a wiremock server.

use reqwest::Client;
use weatherlog_core::{
    FetchError, HttpGateway, WeatherGateway,
    provider::{
        ipinfo::IpInfoProvider, openweather::OpenWeatherProvider,
        visualcrossing::VisualCrossingProvider,
    },
};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn forecast_entry(ts: &str, temp: f64, description: &str) -> serde_json::Value {
    serde_json::json!({
        "dt_txt": ts,
        "main": { "temp": temp, "humidity": 70 },
        "weather": [{ "description": description }],
        "wind": { "speed": 8.5 }
    })
}

fn openweather_gateway(server: &MockServer) -> HttpGateway {
    HttpGateway::new().with_openweather(
        OpenWeatherProvider::new("OW_KEY".into(), Client::new()).with_base_url(server.uri()),
    )
}

async fn mount_geocode(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Seattle, WA, USA"))
        .and(query_param("limit", "1"))
        .and(query_param("appid", "OW_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn current_and_forecast_success() {
    let server = MockServer::start().await;
    mount_geocode(&server, serde_json::json!([{ "lat": 47.6, "lon": -122.3 }])).await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "47.6"))
        .and(query_param("lon", "-122.3"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Seattle",
            "main": { "temp": 58.5, "humidity": 77 },
            "weather": [{ "description": "light rain" }],
            "wind": { "speed": 12.1 }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [
                forecast_entry("2024-06-01 21:00:00", 57.0, "light rain"),
                forecast_entry("2024-06-02 00:00:00", 55.0, "overcast clouds"),
            ]
        })))
        .mount(&server)
        .await;

    let gateway = openweather_gateway(&server);
    let (snapshot, forecast) = gateway.current_and_forecast("Seattle, WA, USA").await.unwrap();

    assert_eq!(snapshot.location_name.as_deref(), Some("Seattle"));
    assert_eq!(snapshot.temperature_f, Some(58.5));
    assert_eq!(snapshot.humidity_pct, Some(77.0));
    assert_eq!(snapshot.condition.as_deref(), Some("light rain"));
    assert_eq!(snapshot.wind_speed_mph, Some(12.1));
    assert_eq!(forecast.len(), 2);
    assert_eq!(forecast[1].timestamp, "2024-06-02 00:00:00");
    assert_eq!(forecast[1].condition.as_deref(), Some("overcast clouds"));
}

#[tokio::test]
async fn empty_geocode_result_fails() {
    let server = MockServer::start().await;
    mount_geocode(&server, serde_json::json!([])).await;

    let gateway = openweather_gateway(&server);
    let err = gateway.current_and_forecast("Seattle, WA, USA").await.unwrap_err();

    assert!(matches!(err, FetchError::NoResults { .. }), "unexpected error: {err:?}");
}

#[tokio::test]
async fn forecast_failure_fails_whole_operation() {
    let server = MockServer::start().await;
    mount_geocode(&server, serde_json::json!([{ "lat": 47.6, "lon": -122.3 }])).await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Seattle",
            "main": { "temp": 58.5 }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let gateway = openweather_gateway(&server);
    let err = gateway.current_and_forecast("Seattle, WA, USA").await.unwrap_err();

    match err {
        FetchError::Status { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream down");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn historical_timeline_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(
            r"^/VisualCrossingWebServices/rest/services/timeline/.+/2024-01-01/2024-01-02$",
        ))
        .and(query_param("key", "VC_KEY"))
        .and(query_param("unitGroup", "us"))
        .and(query_param("include", "days"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resolvedAddress": "Seattle, WA, United States",
            "days": [
                { "datetime": "2024-01-01", "temp": 41.2, "conditions": "Rain, Overcast",
                  "humidity": 88.1, "windspeed": 9.8 },
                { "datetime": "2024-01-02", "conditions": "Clear" }
            ]
        })))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new().with_visualcrossing(
        VisualCrossingProvider::new("VC_KEY".into(), Client::new()).with_base_url(server.uri()),
    );
    let days = gateway.historical("Seattle, WA, USA", "2024-01-01", "2024-01-02").await.unwrap();

    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date, "2024-01-01");
    assert_eq!(days[0].temperature_f, Some(41.2));
    assert_eq!(days[0].location_name.as_deref(), Some("Seattle, WA, United States"));
    assert_eq!(days[1].temperature_f, None);
    assert_eq!(days[1].formatted_temperature(), "unknown");
}

#[tokio::test]
async fn historical_error_status_and_missing_days_fail() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/2023-01-01/2023-01-01$"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad API Request"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"/2023-02-01/2023-02-01$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "resolvedAddress": "Nowhere" })),
        )
        .mount(&server)
        .await;

    let gateway = HttpGateway::new().with_visualcrossing(
        VisualCrossingProvider::new("VC_KEY".into(), Client::new()).with_base_url(server.uri()),
    );

    let status = gateway.historical("Nowhere, XX", "2023-01-01", "2023-01-01").await.unwrap_err();
    let missing = gateway.historical("Nowhere, XX", "2023-02-01", "2023-02-01").await.unwrap_err();

    assert!(matches!(status, FetchError::Status { status: 400, .. }));
    assert!(matches!(missing, FetchError::MissingField { field: "days", .. }));
}

#[tokio::test]
async fn ip_lookup_requires_city_and_country() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .and(query_param("token", "GOOD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ip": "203.0.113.9", "city": "Portland", "country": "US"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .and(query_param("token", "PARTIAL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ip": "203.0.113.9", "city": "", "country": "US"
        })))
        .mount(&server)
        .await;

    let good = HttpGateway::new().with_ipinfo(
        IpInfoProvider::new("GOOD".into(), Client::new()).with_base_url(server.uri()),
    );
    let partial = HttpGateway::new().with_ipinfo(
        IpInfoProvider::new("PARTIAL".into(), Client::new()).with_base_url(server.uri()),
    );

    assert_eq!(
        good.resolve_current_location().await.unwrap(),
        ("Portland".to_string(), "US".to_string())
    );
    assert!(matches!(
        partial.resolve_current_location().await.unwrap_err(),
        FetchError::MissingField { field: "city", .. }
    ));
}

#[tokio::test]
async fn malformed_body_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new().with_ipinfo(
        IpInfoProvider::new("TOKEN".into(), Client::new()).with_base_url(server.uri()),
    );

    assert!(matches!(
        gateway.resolve_current_location().await.unwrap_err(),
        FetchError::Malformed { .. }
    ));
}
