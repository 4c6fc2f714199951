//! HttpGateway against a local mock server.

use std::time::Duration;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gims_core::api::{Gateway, HttpGateway};
use gims_core::config::GimsConfig;
use gims_core::error::GimsError;
use gims_core::model::ComponentKind;
use gims_core::resources::ComponentCatalog;

/// Mock server kept alive on its own runtime while the gateway blocks on another.
struct Harness {
    // dropped before the runtime
    server: MockServer,
    runtime: Runtime,
}

impl Harness {
    fn start() -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    fn gateway(&self) -> HttpGateway {
        HttpGateway::new(GimsConfig {
            url: self.server.uri(),
            access_token: "old-access".into(),
            refresh_token: "refresh-1".into(),
            verify_ssl: true,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }
}

#[test]
fn expired_token_is_refreshed_once_and_request_retried() {
    let harness = Harness::start();
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/automation/scripts/script/42/"))
            .and(header("authorization", "Bearer old-access"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1),
    );
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/security/token/refresh/"))
            .and(body_json(json!({"refresh": "refresh-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new-access"})))
            .expect(1),
    );
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/automation/scripts/script/42/"))
            .and(header("authorization", "Bearer new-access"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 42, "name": "ICMP Monitor"})),
            ),
    );

    let gateway = harness.gateway();
    let component = ComponentCatalog::new(&gateway, ComponentKind::Script)
        .fetch(42)
        .unwrap();
    assert_eq!(component.name, "ICMP Monitor");
}

#[test]
fn rejected_refresh_token_is_an_auth_error() {
    let harness = Harness::start();
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/automation/scripts/script/"))
            .respond_with(ResponseTemplate::new(401)),
    );
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/security/token/refresh/"))
            .respond_with(ResponseTemplate::new(401)),
    );

    let err = harness.gateway().get("/scripts/script/").unwrap_err();
    assert_eq!(err.status_code(), 401);
    assert_eq!(err.message(), "Authentication failed");
    assert_eq!(
        err.detail().as_deref(),
        Some("Refresh token is invalid. Get new tokens from GIMS.")
    );
}

#[test]
fn query_parameters_are_sent() {
    let harness = Harness::start();
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/automation/datasource_types/method/"))
            .and(query_param("mds_type_id", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([]))),
    );

    let value = harness
        .gateway()
        .get_query("/datasource_types/method/", &[("mds_type_id", "7".to_string())])
        .unwrap();
    assert_eq!(value, json!([]));
}

#[test]
fn no_content_yields_nothing() {
    let harness = Harness::start();
    harness.mount(
        Mock::given(method("DELETE"))
            .and(path("/automation/scripts/script/42/"))
            .respond_with(ResponseTemplate::new(204)),
    );

    harness.gateway().delete("/scripts/script/42/").unwrap();
}

#[test]
fn non_json_success_is_a_protocol_error() {
    let harness = Harness::start();
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/automation/scripts/script/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>")),
    );

    let err = harness.gateway().get("/scripts/script/").unwrap_err();
    assert!(matches!(err, GimsError::Protocol { status: 200, .. }), "{err:?}");
}

#[rstest]
#[case(403, "Permission denied", "Insufficient permissions")]
#[case(404, "Not found", "Resource not found")]
fn fixed_error_statuses(#[case] status: u16, #[case] message: &str, #[case] detail: &str) {
    let harness = Harness::start();
    harness.mount(
        Mock::given(method("GET"))
            .and(path("/automation/scripts/script/9/"))
            .respond_with(ResponseTemplate::new(status)),
    );

    let err = harness.gateway().get("/scripts/script/9/").unwrap_err();
    assert_eq!(err.status_code(), status);
    assert_eq!(err.message(), message);
    assert_eq!(err.detail().as_deref(), Some(detail));
}

#[test]
fn html_error_page_is_sanitized() {
    let harness = Harness::start();
    harness.mount(
        Mock::given(method("POST"))
            .and(path("/automation/scripts/script/"))
            .respond_with(
                ResponseTemplate::new(502)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><head><title>502 Bad Gateway</title></head></html>"),
            ),
    );

    let err = harness
        .gateway()
        .post("/scripts/script/", json!({"name": "x"}))
        .unwrap_err();
    assert_eq!(err.status_code(), 502);
    assert_eq!(
        err.detail().as_deref(),
        Some("Server returned HTML error: 502 Bad Gateway")
    );
}

#[test]
fn json_error_detail_is_surfaced() {
    let harness = Harness::start();
    harness.mount(
        Mock::given(method("PATCH"))
            .and(path("/automation/scripts/script/42/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "name must be unique"})),
            ),
    );

    let err = harness
        .gateway()
        .patch("/scripts/script/42/", json!({"name": "dup"}))
        .unwrap_err();
    assert_eq!(err.message(), "API error");
    assert_eq!(err.detail().as_deref(), Some("name must be unique"));
}
