use meteo_core::{
    ProviderConfig, ProviderId, WeatherError, WeatherGateway,
    condition::{CodeFamily, classify},
};
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::any};

#[tokio::test]
async fn missing_credential_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = ProviderConfig::new(ProviderId::OpenWeather)
        .with_credential("")
        .with_base_url(server.uri());

    let err = WeatherGateway::new(config).unwrap_err();

    assert!(matches!(err, WeatherError::Configuration(_)), "unexpected {err:?}");
    let received = server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[tokio::test]
async fn gateway_keeps_its_provider_for_every_call() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway =
        WeatherGateway::new(ProviderConfig::new(ProviderId::Wttr).with_base_url(server.uri()))
            .expect("gateway");

    for city in ["Paris", "Rome"] {
        let err = gateway.fetch_current(city).await.unwrap_err();
        assert!(matches!(err, WeatherError::Upstream { provider: ProviderId::Wttr, .. }));
    }
    assert_eq!(gateway.provider_id(), ProviderId::Wttr);
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    // bind, then drop, so nothing listens on the port
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let uri = format!("http://127.0.0.1:{port}/");

    let gateway = WeatherGateway::new(ProviderConfig::new(ProviderId::Wttr).with_base_url(uri))
        .expect("gateway");

    let err = gateway.fetch_current("Paris").await.unwrap_err();
    assert!(matches!(err, WeatherError::Network(_)), "unexpected {err:?}");
}

#[test]
fn unknown_codes_classify_as_default_for_every_family() {
    for (family, codes) in [
        (CodeFamily::Wmo, [100, 150, 999, i32::MAX]),
        (CodeFamily::Wwo, [396, 500, 1000, i32::MAX]),
    ] {
        for code in codes {
            let entry = classify(family, code);
            assert_eq!(entry.main, "Clear", "{family:?} {code}");
            assert_eq!(entry.icon, "01d");
            assert_eq!(entry.id, code);
        }
    }
}
