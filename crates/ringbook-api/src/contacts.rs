//! Handlers for `/contacts` and `/spam`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/contacts` | The requester's contacts; staff see all |
//! | `POST` | `/contacts` | Body: `{"phone":"...","name":"..."}`; returns 201 |
//! | `GET`  | `/spam` | The requester's reports; staff see all |
//! | `POST` | `/spam` | Body: `{"phone":"...","name":"..."}`; returns 201 |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use ringbook_core::{
  Phonebook,
  directory::{ContactAlias, SpamReport},
  store::DirectoryStore,
};
use serde::Deserialize;

use crate::{error::ApiError, identity::Requester};

/// JSON body accepted by `POST /contacts` and `POST /spam`.
#[derive(Debug, Deserialize)]
pub struct PhoneBody {
  pub phone: String,
  pub name:  Option<String>,
}

// ─── Contacts ─────────────────────────────────────────────────────────────────

/// `GET /contacts`
pub async fn list_contacts<S>(
  State(phonebook): State<Arc<Phonebook<S>>>,
  Requester(requester): Requester,
) -> Result<Json<Vec<ContactAlias>>, ApiError>
where
  S: DirectoryStore + 'static,
{
  Ok(Json(phonebook.list_contacts(&requester).await?))
}

/// `POST /contacts` returns 201 with the stored [`ContactAlias`].
pub async fn add_contact<S>(
  State(phonebook): State<Arc<Phonebook<S>>>,
  Requester(requester): Requester,
  Json(body): Json<PhoneBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + 'static,
{
  let alias = phonebook
    .add_contact(&requester, &body.phone, body.name)
    .await?;
  Ok((StatusCode::CREATED, Json(alias)))
}

// ─── Spam ─────────────────────────────────────────────────────────────────────

/// `GET /spam`
pub async fn list_spam<S>(
  State(phonebook): State<Arc<Phonebook<S>>>,
  Requester(requester): Requester,
) -> Result<Json<Vec<SpamReport>>, ApiError>
where
  S: DirectoryStore + 'static,
{
  Ok(Json(phonebook.list_spam_reports(&requester).await?))
}

/// `POST /spam` returns 201 with the stored [`SpamReport`].
pub async fn report_spam<S>(
  State(phonebook): State<Arc<Phonebook<S>>>,
  Requester(requester): Requester,
  Json(body): Json<PhoneBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + 'static,
{
  let report = phonebook
    .report_spam(&requester, &body.phone, body.name)
    .await?;
  Ok((StatusCode::CREATED, Json(report)))
}
