//! Handler for `GET /search`.
//!
//! Exactly one of `name` or `phone` must be given.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use ringbook_core::{
  Phonebook,
  result::LabeledResult,
  search::SearchQuery,
  store::DirectoryStore,
};

use crate::{error::ApiError, identity::Requester};

/// `GET /search?name=<text>` or `GET /search?phone=<number>`
pub async fn handler<S>(
  State(phonebook): State<Arc<Phonebook<S>>>,
  Requester(requester): Requester,
  Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<LabeledResult>>, ApiError>
where
  S: DirectoryStore + 'static,
{
  let results = phonebook.search(&query, &requester).await?;
  Ok(Json(results))
}
