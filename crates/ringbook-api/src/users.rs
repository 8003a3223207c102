//! Handlers for `/users`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`   | `/users` | Sign up; body: [`SignUpBody`]; no requester needed |
//! | `DELETE` | `/users/{id}` | The user themselves or staff; returns 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use ringbook_core::{Phonebook, phonebook::NewUserInput, store::DirectoryStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, identity::Requester};

/// Sign-up body. Staff accounts cannot be created through the API.
#[derive(Debug, Deserialize)]
pub struct SignUpBody {
  pub username: String,
  pub phone:    String,
  pub email:    Option<String>,
}

/// `POST /users` returns 201 with the registered user.
pub async fn sign_up<S>(
  State(phonebook): State<Arc<Phonebook<S>>>,
  Json(body): Json<SignUpBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + 'static,
{
  let user = phonebook
    .register_user(NewUserInput {
      username: body.username,
      phone:    body.phone,
      email:    body.email,
      is_staff: false,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `DELETE /users/{id}`
pub async fn delete<S>(
  State(phonebook): State<Arc<Phonebook<S>>>,
  Requester(requester): Requester,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DirectoryStore + 'static,
{
  if !requester.is_staff && requester.user_id != id {
    return Err(ApiError::Forbidden);
  }
  phonebook.delete_user(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
