//! REST backend against a mock hosted store.

use serde_json::{json, Map};
use westpay_core::{Money, UserId, UserProfile};
use westpay_store::{DbPath, RestOptions, RestStore, Store, StoreError, StoreExt};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn uid() -> UserId {
    UserId::new("u1").unwrap()
}

#[tokio::test]
async fn get_reads_json_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/u1/wallet/balance.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1520.5)))
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri()).unwrap();
    let balance: Option<Money> = store.get_as(&DbPath::balance(&uid())).await.unwrap();
    assert_eq!(balance, Some(Money::from_paise(152_050)));
}

#[tokio::test]
async fn missing_path_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/u1/profile.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri()).unwrap();
    assert_eq!(store.get(&DbPath::profile(&uid())).await.unwrap(), None);
}

#[tokio::test]
async fn set_puts_with_auth_token() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/users/u1/profile.json"))
        .and(query_param("auth", "secret"))
        .and(body_json(json!({ "name": "Asha", "email": "a@x.in", "isBlocked": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let store =
        RestStore::with_options(server.uri(), RestOptions::with_auth_token("secret")).unwrap();
    store
        .set_as(&DbPath::profile(&uid()), &UserProfile::new("Asha", "a@x.in"))
        .await
        .unwrap();
}

#[tokio::test]
async fn update_patches_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/users/u1.json"))
        .and(body_json(json!({ "profile/isBlocked": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "profile/isBlocked": true })))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri()).unwrap();
    let mut fields = Map::new();
    fields.insert("profile/isBlocked".into(), json!(true));
    store.update(&DbPath::user(&uid()), fields).await.unwrap();
}

#[tokio::test]
async fn null_set_deletes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/contactMessages.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri()).unwrap();
    store
        .set(&DbPath::contact_messages(), serde_json::Value::Null)
        .await
        .unwrap();
}

#[tokio::test]
async fn permission_denied_maps_from_401() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Permission denied" })))
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri()).unwrap();
    let err = store.get(&DbPath::users()).await.unwrap_err();
    assert_eq!(err, StoreError::PermissionDenied("Permission denied".into()));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_errors_are_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri()).unwrap();
    let err = store.get(&DbPath::users()).await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn client_errors_are_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid data; couldn't parse JSON object" })))
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri()).unwrap();
    let err = store.set(&DbPath::users(), json!(1)).await.unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 400, .. }));
}
