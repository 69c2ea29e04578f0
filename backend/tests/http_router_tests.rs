//! End-to-end tests of the HTTP surface against an in-memory repository.
//!
//! Requests go through the full router (layers included) with
//! `tower::ServiceExt::oneshot`; no socket is opened.

#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use readers_service::db::repositories::{InjectedFault, LocalRepository};
use async_trait::async_trait;
use readers_service::db::{ReaderRepository, RepositoryResult};
use readers_service::http::{create_router, create_router_with_timeout, AppState};
use readers_service::{Reader, ReaderId};
use serde_json::Value;
use support::vasya;
use tower::ServiceExt;

fn app(repo: &LocalRepository) -> Router {
    create_router(AppState::new(Arc::new(repo.clone())))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_post_then_get_round_trips_fields() {
    let repo = LocalRepository::new();

    let response = send(
        app(&repo),
        Method::POST,
        "/readers",
        Some(r#"{"name":"Vasya","adress":"Mira 6","phone":"555"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/readers/1"
    );
    assert_eq!(body_text(response).await, "Added reader with ID: 1");

    let response = send(app(&repo), Method::GET, "/readers/1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["num"], 1);
    assert_eq!(json["name"], "Vasya");
    assert_eq!(json["adress"], "Mira 6");
    assert_eq!(json["phone"], "555");
}

#[tokio::test]
async fn test_post_ignores_body_id() {
    let repo = LocalRepository::new();

    let response = send(
        app(&repo),
        Method::POST,
        "/readers",
        Some(r#"{"num":77,"name":"Vasya","phone":"555"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    assert!(repo.get_reader(ReaderId(77)).await.is_err());
    let stored = repo.get_reader(ReaderId(1)).await.unwrap();
    assert_eq!(stored.address, None);
}

#[tokio::test]
async fn test_post_rejects_malformed_json() {
    let repo = LocalRepository::new();

    let response = send(app(&repo), Method::POST, "/readers", Some("{\"name\":")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(repo.reader_count(), 0);
}

#[tokio::test]
async fn test_post_rejects_missing_required_field() {
    let repo = LocalRepository::new();

    let response = send(
        app(&repo),
        Method::POST,
        "/readers",
        Some(r#"{"name":"Vasya"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(repo.operation_count(), 0);
}

#[tokio::test]
async fn test_get_with_non_numeric_id_is_bad_request_without_repository_call() {
    let repo = LocalRepository::new();

    let response = send(app(&repo), Method::GET, "/readers/abc", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(repo.operation_count(), 0);

    let response = send(app(&repo), Method::DELETE, "/readers/1.5", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(repo.operation_count(), 0);
}

#[tokio::test]
async fn test_get_missing_reader_is_not_found() {
    let repo = LocalRepository::new();

    let response = send(app(&repo), Method::GET, "/readers/9", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_empty_is_empty_array() {
    let repo = LocalRepository::new();

    let response = send(app(&repo), Method::GET, "/readers", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_list_returns_stored_readers() {
    let repo = LocalRepository::new();
    repo.add_reader(&vasya()).await.unwrap();
    repo.add_reader(&Reader::new("Petya", None::<String>, "777"))
        .await
        .unwrap();

    let response = send(app(&repo), Method::GET, "/readers", None).await;
    let readers: Vec<Reader> = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(readers.len(), 2);
    assert!(readers.iter().any(|r| r.name == "Petya" && r.address.is_none()));
}

#[tokio::test]
async fn test_put_uses_path_id_over_body_num() {
    let repo = LocalRepository::new();
    for _ in 0..5 {
        repo.add_reader(&vasya()).await.unwrap();
    }

    let response = send(
        app(&repo),
        Method::PUT,
        "/readers/5",
        Some(r#"{"num":99,"name":"Vasily","adress":null,"phone":"556"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Reader with ID 5 updated");

    let updated = repo.get_reader(ReaderId(5)).await.unwrap();
    assert_eq!(updated.name, "Vasily");
    assert_eq!(updated.address, None);
    assert!(repo.get_reader(ReaderId(99)).await.is_err());
}

#[tokio::test]
async fn test_put_rejects_malformed_json_without_repository_call() {
    let repo = LocalRepository::new();

    let response = send(app(&repo), Method::PUT, "/readers/1", Some("{\"name\":")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    assert_eq!(repo.operation_count(), 0);
}

#[tokio::test]
async fn test_put_with_non_numeric_id_is_bad_request_without_repository_call() {
    let repo = LocalRepository::new();

    let response = send(
        app(&repo),
        Method::PUT,
        "/readers/abc",
        Some(r#"{"name":"Vasya","phone":"555"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(repo.operation_count(), 0);
}

#[tokio::test]
async fn test_put_missing_reader_is_not_found() {
    let repo = LocalRepository::new();

    let response = send(
        app(&repo),
        Method::PUT,
        "/readers/3",
        Some(r#"{"name":"Vasya","phone":"555"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_removes_reader_and_books() {
    let repo = LocalRepository::new();
    let id = repo.add_reader(&vasya()).await.unwrap();
    repo.lend_book(id, 1);

    let response = send(app(&repo), Method::DELETE, "/readers/1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Reader with ID 1 deleted");
    assert_eq!(repo.books_in_use_count(id), 0);

    let response = send(app(&repo), Method::GET, "/readers/1", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_repository_failure_is_internal_error_with_generic_body() {
    let repo = LocalRepository::new();
    repo.inject_fault(Some(InjectedFault::QueryFailure));

    let response = send(app(&repo), Method::GET, "/readers", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "REPOSITORY_ERROR");
    assert!(!json["message"].as_str().unwrap().contains("Injected"));
}

#[tokio::test]
async fn test_failed_delete_is_internal_error() {
    let repo = LocalRepository::new();
    repo.add_reader(&vasya()).await.unwrap();
    repo.inject_fault(Some(InjectedFault::DeleteAfterAssociations));

    let response = send(app(&repo), Method::DELETE, "/readers/1", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(repo.reader_count(), 1);
}

#[tokio::test]
async fn test_unsupported_method_is_method_not_allowed() {
    let repo = LocalRepository::new();

    let response = send(app(&repo), Method::PATCH, "/readers/1", None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = send(app(&repo), Method::DELETE, "/readers", None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let repo = LocalRepository::new();

    let response = send(app(&repo), Method::GET, "/books", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_health_reports_database_state() {
    let repo = LocalRepository::new();

    let response = send(app(&repo), Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "connected");

    repo.set_healthy(false);
    let response = send(app(&repo), Method::GET, "/health", None).await;
    assert_eq!(body_json(response).await["database"], "disconnected");
}

/// A repository whose calls never finish in time.
struct StalledRepository;

#[async_trait]
impl ReaderRepository for StalledRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn close(&self) {}

    async fn get_reader(&self, _id: ReaderId) -> RepositoryResult<Reader> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        unreachable!("request deadline should fire first")
    }

    async fn list_readers(&self) -> RepositoryResult<Vec<Reader>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }

    async fn add_reader(&self, _reader: &Reader) -> RepositoryResult<ReaderId> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(ReaderId(1))
    }

    async fn update_reader(&self, _reader: &Reader) -> RepositoryResult<()> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }

    async fn delete_reader(&self, _id: ReaderId) -> RepositoryResult<()> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_stalled_request_is_gateway_timeout() {
    let app = create_router_with_timeout(
        AppState::new(Arc::new(StalledRepository)),
        Duration::from_millis(50),
    );

    let response = send(app, Method::GET, "/readers", None).await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}
