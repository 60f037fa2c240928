use serde_json::json;
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};
use zipweather_core::{
    Config, FetchError, ManualClock, OpenWeatherProvider, WeatherOutcome, WeatherProvider,
    WeatherService,
};

fn current_weather_body() -> serde_json::Value {
    json!({
        "coord": { "lon": -118.4065, "lat": 34.0901 },
        "weather": [{ "id": 800, "main": "Clear", "description": "clear sky" }],
        "main": { "temp": 295.5, "feels_like": 295.1, "humidity": 38 },
        "wind": { "speed": 2.5, "deg": 260 },
        "dt": 1_700_000_000,
        "name": "Beverly Hills"
    })
}

fn provider_for(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::with_base_url(
        format!("{}/data/2.5/weather", server.uri()),
        Some("TEST_KEY".into()),
    )
}

#[tokio::test]
async fn fetch_sends_zip_and_key_and_decodes_reading() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("zip", "90210,us"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_body()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let reading = provider.fetch("90210").await.expect("fetch should succeed");

    assert_eq!(reading.temperature, "295.500000");
    assert_eq!(reading.humidity, "38");
    assert_eq!(reading.wind_speed, "2.500000");
}

#[tokio::test]
async fn units_are_forwarded_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_body()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server).with_units("metric");
    assert!(provider.fetch("90210").await.is_ok());
}

#[tokio::test]
async fn error_status_is_reported_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "cod": "404", "message": "city not found" })),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider.fetch("22222").await.unwrap_err();

    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("city not found"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider.fetch("90210").await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn unreachable_provider_is_a_transport_error() {
    let provider = OpenWeatherProvider::with_base_url("http://127.0.0.1:1/weather", Some("K".into()));
    let err = provider.fetch("90210").await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}

#[tokio::test]
async fn service_serves_repeat_lookups_from_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("zip", "06883,us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.provider.base_url = format!("{}/data/2.5/weather", server.uri());
    config.set_api_key("TEST_KEY".into());

    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let svc = WeatherService::new(
        &config,
        Arc::new(OpenWeatherProvider::from_config(&config.provider)),
        clock.clone(),
    );

    let first = svc.get_weather("6883").await;
    clock.advance(30);
    let second = svc.latest("06883").await;

    assert_eq!(first.temperature, "295.500000");
    assert_eq!(first.data_age_seconds, "0");
    match second {
        WeatherOutcome::Success(report) => assert_eq!(report.data_age_seconds, 30),
        other => panic!("expected cached success, got {other:?}"),
    }
}

#[tokio::test]
async fn service_falls_back_when_provider_starts_failing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.provider.base_url = format!("{}/data/2.5/weather", server.uri());
    config.set_api_key("TEST_KEY".into());

    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let svc = WeatherService::new(
        &config,
        Arc::new(OpenWeatherProvider::from_config(&config.provider)),
        clock.clone(),
    );

    svc.latest("90210").await;
    clock.advance(3_600);
    let result = svc.get_weather("90210").await;

    assert!(result.error.is_empty());
    assert_eq!(result.temperature, "295.500000");
    assert_eq!(result.data_age_seconds, "3600");
}
