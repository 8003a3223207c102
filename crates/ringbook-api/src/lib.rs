//! JSON REST API for Ringbook.
//!
//! Exposes an axum [`Router`] backed by a [`Phonebook`] over any
//! [`ringbook_core::store::DirectoryStore`]. Authentication, TLS, and
//! transport concerns are the caller's responsibility; the requester is
//! identified by the [`USER_HEADER`] set upstream.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ringbook_api::api_router(phonebook.clone()))
//! ```

pub mod contacts;
pub mod directory;
pub mod error;
pub mod identity;
pub mod search;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use ringbook_core::{Phonebook, store::DirectoryStore};

pub use error::ApiError;
pub use identity::{Requester, USER_HEADER};

/// Build a fully-materialised API router for `phonebook`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(phonebook: Arc<Phonebook<S>>) -> Router<()>
where
  S: DirectoryStore + 'static,
{
  Router::new()
    // Search
    .route("/search", get(search::handler::<S>))
    .route("/phone-directory", get(directory::handler::<S>))
    // Contacts and spam
    .route(
      "/contacts",
      get(contacts::list_contacts::<S>).post(contacts::add_contact::<S>),
    )
    .route("/spam", get(contacts::list_spam::<S>).post(contacts::report_spam::<S>))
    // Users
    .route("/users", post(users::sign_up::<S>))
    .route("/users/{id}", delete(users::delete::<S>))
    .with_state(phonebook)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
  };
  use ringbook_core::{PhoneNormalizer, phonebook::NewUserInput};
  use ringbook_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt;
  use uuid::Uuid;

  use super::*;

  async fn app() -> (Router, Arc<Phonebook<SqliteStore>>) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let normalizer = PhoneNormalizer::new("US").unwrap();
    let phonebook = Arc::new(Phonebook::new(store, normalizer));
    (api_router(phonebook.clone()), phonebook)
  }

  async fn register(
    phonebook: &Phonebook<SqliteStore>,
    username: &str,
    phone: &str,
    is_staff: bool,
  ) -> Uuid {
    phonebook
      .register_user(NewUserInput {
        username: username.into(),
        phone: phone.into(),
        email: Some(format!("{username}@example.com")),
        is_staff,
      })
      .await
      .unwrap()
      .user_id
  }

  fn get(uri: &str, user: Option<Uuid>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(user) = user {
      builder = builder.header(USER_HEADER, user.to_string());
    }
    builder.body(Body::empty()).unwrap()
  }

  fn post(uri: &str, user: Option<Uuid>, body: Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
      builder = builder.header(USER_HEADER, user.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
  }

  async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn search_requires_requester() {
    let (app, _) = app().await;
    let res = app.oneshot(get("/search?name=Ali", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn unknown_requester_is_unauthorized() {
    let (app, _) = app().await;
    let res = app
      .oneshot(get("/search?name=Ali", Some(Uuid::new_v4())))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn search_with_both_params_is_bad_request() {
    let (app, pb) = app().await;
    let me = register(&pb, "me", "+12015550100", false).await;
    let res = app
      .oneshot(get("/search?name=Ali&phone=%2B12015550101", Some(me)))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn search_by_unknown_phone_is_not_found() {
    let (app, pb) = app().await;
    let me = register(&pb, "me", "+12015550100", false).await;
    let res = app
      .oneshot(get("/search?phone=%2B12015550199", Some(me)))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn reported_spam_is_searchable_by_phone() {
    let (app, pb) = app().await;
    let me = register(&pb, "me", "+12015550100", false).await;

    let res = app
      .clone()
      .oneshot(post(
        "/spam",
        Some(me),
        json!({ "phone": "(201) 555-0123", "name": "Scammer" }),
      ))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app
      .oneshot(get("/search?phone=%2B12015550123", Some(me)))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(
      body,
      json!([{
        "type": "reported_spam",
        "name": "Scammer",
        "phone": "+12015550123",
        "spam_count": 1
      }])
    );
  }

  #[tokio::test]
  async fn duplicate_spam_report_is_bad_request() {
    let (app, pb) = app().await;
    let me = register(&pb, "me", "+12015550100", false).await;
    let body = json!({ "phone": "+12015550123", "name": "Scammer" });

    let first = app.clone().oneshot(post("/spam", Some(me), body.clone())).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = app.oneshot(post("/spam", Some(me), body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn contacts_are_scoped_to_owner() {
    let (app, pb) = app().await;
    let alice = register(&pb, "alice", "+12015550100", false).await;
    let bob = register(&pb, "bob", "+12015550101", false).await;
    let staff = register(&pb, "root", "+12015550102", true).await;

    for (owner, phone) in [(alice, "+12015550110"), (bob, "+12015550111")] {
      let res = app
        .clone()
        .oneshot(post("/contacts", Some(owner), json!({ "phone": phone, "name": "Pal" })))
        .await
        .unwrap();
      assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = app.clone().oneshot(get("/contacts", Some(alice))).await.unwrap();
    let mine = json_body(res).await;
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
    assert_eq!(mine[0]["phone"], "+12015550110");

    let res = app.oneshot(get("/contacts", Some(staff))).await.unwrap();
    let all = json_body(res).await;
    assert_eq!(all.as_array().map(Vec::len), Some(2));
  }

  #[tokio::test]
  async fn phone_directory_hides_email_from_strangers() {
    let (app, pb) = app().await;
    register(&pb, "alice", "+12015550100", false).await;
    let me = register(&pb, "me", "+12015550101", false).await;

    let res = app
      .clone()
      .oneshot(get("/phone-directory?q=%2B12015550100", Some(me)))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], Value::Null);

    let res = app
      .oneshot(get("/phone-directory?q=", Some(me)))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn sign_up_creates_user() {
    let (app, pb) = app().await;
    let res = app
      .clone()
      .oneshot(post(
        "/users",
        None,
        json!({ "username": "carol", "phone": "201-555-0150", "email": "carol@example.com" }),
      ))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = json_body(res).await;
    assert_eq!(body["phone"], "+12015550150");
    assert_eq!(body["is_staff"], false);

    let id: Uuid = body["user_id"].as_str().unwrap().parse().unwrap();
    assert!(pb.user(id).await.is_ok());

    let res = app
      .oneshot(post(
        "/users",
        None,
        json!({ "username": "other", "phone": "+12015550150" }),
      ))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn delete_user_requires_self_or_staff() {
    let (app, pb) = app().await;
    let alice = register(&pb, "alice", "+12015550100", false).await;
    let bob = register(&pb, "bob", "+12015550101", false).await;
    let staff = register(&pb, "root", "+12015550102", true).await;

    let delete = |target: Uuid, by: Uuid| {
      Request::delete(format!("/users/{target}"))
        .header(USER_HEADER, by.to_string())
        .body(Body::empty())
        .unwrap()
    };

    let res = app.clone().oneshot(delete(alice, bob)).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.clone().oneshot(delete(alice, alice)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.clone().oneshot(delete(bob, staff)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.oneshot(delete(bob, staff)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
  }
}
