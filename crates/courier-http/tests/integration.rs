//! End-to-end tests against a local mock server.

use courier_common_config::ClientSettings;
use bytes::Bytes;
use courier_http::{
    Configuration, Direct, HttpConfig, HttpError, Proxy, ReqwestTransport, RequestOptions,
    RetryStrategy, StatusRule, TransportError,
};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: u32,
    name: String,
}

fn proxy(server: &MockServer) -> Proxy {
    let transport = ReqwestTransport::new().expect("Failed to create transport");
    Proxy::new(Configuration::new(server.uri(), Arc::new(transport)))
}

#[tokio::test]
async fn test_get_decodes_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Ann"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = proxy(&server)
        .get::<User>("user/1", RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(response.status_code(), Some(200));
    assert_eq!(
        response.value,
        User {
            id: 1,
            name: "Ann".to_string()
        }
    );
    assert_eq!(response.request.url(), format!("{}/user/1", server.uri()));
}

#[tokio::test]
async fn test_post_round_trips_body() {
    let server = MockServer::start().await;
    let user = User {
        id: 2,
        name: "Bea".to_string(),
    };
    Mock::given(method("POST"))
        .and(path("/user"))
        .and(header("content-type", "application/json"))
        .and(body_json(&user))
        .respond_with(ResponseTemplate::new(201).set_body_json(&user))
        .expect(1)
        .mount(&server)
        .await;

    let response = proxy(&server)
        .post::<_, User>("user", &user, RequestOptions::new().rule(201u16))
        .await
        .unwrap();

    assert_eq!(response.value, user);
    assert_eq!(response.status_code(), Some(201));
}

fn xml_transport() -> Arc<ReqwestTransport> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
    let config = HttpConfig {
        default_headers,
        ..HttpConfig::default()
    };
    Arc::new(ReqwestTransport::with_config(config).expect("Failed to create transport"))
}

#[tokio::test]
async fn test_transport_content_type_is_kept_by_proxy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notes"))
        .and(header("content-type", "application/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "name": "note"})))
        .expect(1)
        .mount(&server)
        .await;

    let proxy = Proxy::new(Configuration::new(server.uri(), xml_transport()));
    let response = proxy
        .request::<User>(
            courier_http::HttpMethod::Post,
            "notes",
            Some(Bytes::from_static(b"<note/>")),
            RequestOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.value.id, 5);
    assert!(response.request.header("content-type").is_none());
}

#[tokio::test]
async fn test_transport_content_type_is_kept_by_direct() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/notes/5"))
        .and(header("content-type", "application/xml"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let direct = Direct::new(xml_transport());
    let url = format!("{}/notes/5", server.uri());
    let raw = direct
        .put(&url, Some(Bytes::from_static(b"<note/>")), RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(raw.meta.status, Some(204));
}

#[tokio::test]
async fn test_put_with_caller_headers() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/user/3"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "name": "Cy"})))
        .expect(1)
        .mount(&server)
        .await;

    let user = User {
        id: 3,
        name: "Cy".to_string(),
    };
    let response = proxy(&server)
        .put::<_, User>(
            "user/3",
            &user,
            RequestOptions::new().header("Authorization", "Bearer secret"),
        )
        .await
        .unwrap();
    assert_eq!(response.value, user);
}

#[tokio::test]
async fn test_query_parameters_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("user", "Name"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let response = proxy(&server)
        .get::<Vec<User>>(
            "users",
            RequestOptions::new().query("user", "Name").query("page", "2"),
        )
        .await
        .unwrap();
    assert!(response.value.is_empty());
}

#[tokio::test]
async fn test_not_found_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such user"))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::new().retry(RetryStrategy::constant(3, Duration::from_millis(10)));
    let err = proxy(&server)
        .get::<User>("user/9", options)
        .await
        .unwrap_err();

    assert!(err.is_status());
    assert_eq!(err.status_code(), Some(404));
    match err {
        HttpError::Status { body, meta, .. } => {
            assert_eq!(body.as_deref(), Some(&b"no such user"[..]));
            assert_eq!(meta.status, Some(404));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = proxy(&server)
        .get::<User>("user/1", RequestOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_decode());
}

#[tokio::test]
async fn test_unreachable_host_is_a_transport_error() {
    let transport = ReqwestTransport::new().expect("Failed to create transport");
    let proxy = Proxy::new(
        Configuration::new("http://127.0.0.1:1", Arc::new(transport))
            .with_retry(RetryStrategy::constant(2, Duration::from_millis(10))),
    );

    let err = proxy
        .get::<User>("user/1", RequestOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_attempt_timeout_is_applied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let err = proxy(&server)
        .get::<User>("slow", RequestOptions::new().timeout(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Transport(TransportError::Timeout)));
}

#[tokio::test]
async fn test_settings_headers_and_rules() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/user/4"))
        .and(header("x-api-key", "k-123"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = ClientSettings {
        base_url: Some(server.uri()),
        accept_status: Some(vec![200, 202]),
        ..ClientSettings::default()
    };
    settings
        .transport
        .default_headers
        .insert("X-Api-Key".to_string(), "k-123".to_string());

    let proxy = Proxy::new(Configuration::from_settings(&settings).unwrap());
    let response = proxy
        .delete::<Option<User>>("user/4", RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(response.status_code(), Some(202));
    assert!(response.value.is_none());
}

#[tokio::test]
async fn test_head_skips_decoding() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/user/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let response = proxy(&server)
        .head("user/1", RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(response.status_code(), Some(200));
}

#[tokio::test]
async fn test_direct_returns_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(2)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().expect("Failed to create transport");
    let direct = Direct::new(Arc::new(transport));
    let url = format!("{}/raw", server.uri());

    let raw = direct.get(&url, None, RequestOptions::new()).await.unwrap();
    assert_eq!(raw.meta.status, Some(503));
    assert_eq!(&raw.body[..], b"busy");

    let err = direct
        .get(&url, None, RequestOptions::new().rule(StatusRule::success()))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(503));
}
