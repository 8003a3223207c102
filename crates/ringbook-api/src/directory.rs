//! Handler for `GET /phone-directory`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use ringbook_core::{
  Phonebook,
  phonebook::PhoneDetails,
  store::DirectoryStore,
};
use serde::Deserialize;

use crate::{error::ApiError, identity::Requester};

#[derive(Debug, Deserialize)]
pub struct DetailsParams {
  /// The phone number to look up.
  pub q: Option<String>,
}

/// `GET /phone-directory?q=<number>`
pub async fn handler<S>(
  State(phonebook): State<Arc<Phonebook<S>>>,
  Requester(requester): Requester,
  Query(params): Query<DetailsParams>,
) -> Result<Json<PhoneDetails>, ApiError>
where
  S: DirectoryStore + 'static,
{
  let query = params.q.unwrap_or_default();
  let details = phonebook.phone_details(&query, &requester).await?;
  Ok(Json(details))
}
