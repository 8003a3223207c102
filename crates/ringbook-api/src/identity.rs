//! Requester extractor.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user's UUID in [`USER_HEADER`]. The extractor only checks that the user
//! still exists and loads their staff flag.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use ringbook_core::{Error, Phonebook, directory::Identity, store::DirectoryStore};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user's UUID.
pub const USER_HEADER: &str = "x-ringbook-user";

/// The authenticated caller of a handler.
pub struct Requester(pub Identity);

impl<S> FromRequestParts<Arc<Phonebook<S>>> for Requester
where
  S: DirectoryStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &Arc<Phonebook<S>>,
  ) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(USER_HEADER)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let user_id = Uuid::parse_str(raw.trim()).map_err(|_| ApiError::Unauthorized)?;

    match state.identity(user_id).await {
      Ok(identity) => Ok(Requester(identity)),
      Err(Error::UserNotFound(_)) => Err(ApiError::Unauthorized),
      Err(e) => Err(e.into()),
    }
  }
}
