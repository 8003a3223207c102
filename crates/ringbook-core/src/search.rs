//! Name and phone matchers.
//!
//! A search is either by name or by phone, never both. Name search fans out
//! over the three sources twice (prefix, then substring); phone search
//! resolves a single directory entry and reports who knows or flags it.

use serde::Deserialize;

use crate::{
  directory::Identity,
  phone::PhoneNormalizer,
  result::{Assembler, EmailVisibility, LabeledResult},
  store::{DirectoryStore, NameMatch},
  Error, Result,
};

// ─── Query ───────────────────────────────────────────────────────────────────

/// A search request. Exactly one of the two fields must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
  pub name:  Option<String>,
  pub phone: Option<String>,
}

/// The validated form of a [`SearchQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchBy<'q> {
  Name(&'q str),
  Phone(&'q str),
}

impl SearchQuery {
  pub fn by_name(name: impl Into<String>) -> Self {
    Self { name: Some(name.into()), phone: None }
  }

  pub fn by_phone(phone: impl Into<String>) -> Self {
    Self { name: None, phone: Some(phone.into()) }
  }

  /// Reject a query that names both or neither search mode.
  pub fn mode(&self) -> Result<SearchBy<'_>> {
    match (self.name.as_deref(), self.phone.as_deref()) {
      (Some(_), Some(_)) => Err(Error::AmbiguousQuery),
      (Some(name), None) => Ok(SearchBy::Name(name)),
      (None, Some(phone)) => Ok(SearchBy::Phone(phone)),
      (None, None) => Err(Error::MissingQuery),
    }
  }
}

// ─── Name matcher ────────────────────────────────────────────────────────────

/// All prefix hits (registered, unregistered, reported spam), then all
/// substring hits in the same source order. Email is never exposed.
pub async fn match_by_name<S: DirectoryStore>(
  store: &S,
  query: &str,
) -> Result<Vec<LabeledResult>> {
  if query.is_empty() {
    return Err(Error::EmptyQuery);
  }

  let assembler = Assembler::new(store);
  let mut results = Vec::new();

  for pattern in [
    NameMatch::Prefix(query.to_owned()),
    NameMatch::Substring(query.to_owned()),
  ] {
    let users = store.users_by_name(&pattern).await.map_err(Error::store)?;
    let aliases = store.aliases_by_name(&pattern).await.map_err(Error::store)?;
    let reports = store
      .spam_reports_by_name(&pattern)
      .await
      .map_err(Error::store)?;

    tracing::debug!(
      ?pattern,
      users = users.len(),
      aliases = aliases.len(),
      reports = reports.len(),
      "name search block"
    );

    results.extend(assembler.users(&users, EmailVisibility::Hidden).await?);
    results.extend(assembler.aliases(&aliases).await?);
    results.extend(assembler.reports(&reports).await?);
  }

  Ok(results)
}

// ─── Phone matcher ───────────────────────────────────────────────────────────

/// Resolve `query` to a directory entry and describe it.
///
/// A number owned by a registered user yields exactly that user, with email
/// shown only when `requester` has the number in their contacts. Any other
/// number yields its named contact aliases followed by its named spam
/// reports.
pub async fn match_by_phone<S: DirectoryStore>(
  store: &S,
  normalizer: &PhoneNormalizer,
  query: &str,
  requester: &Identity,
) -> Result<Vec<LabeledResult>> {
  let phone = normalizer.normalize(query)?;

  let entry = store
    .get_entry(phone.clone())
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::PhoneNotFound(phone.clone()))?;

  let assembler = Assembler::new(store);

  if let Some(user) = &entry.user {
    let visibility = email_visibility(store, &entry.phone, requester).await?;
    let spam_count = assembler.spam_count(&entry.phone).await?;
    return Ok(vec![LabeledResult::registered(user, spam_count, visibility)]);
  }

  let aliases = store.aliases(phone.clone()).await.map_err(Error::store)?;
  let reports = store.spam_reports(phone).await.map_err(Error::store)?;

  let mut results = assembler.aliases(&aliases).await?;
  results.extend(assembler.reports(&reports).await?);
  Ok(results)
}

/// Email is shown only to requesters who imported the number as a contact.
pub(crate) async fn email_visibility<S: DirectoryStore>(
  store: &S,
  phone: &crate::CanonicalPhone,
  requester: &Identity,
) -> Result<EmailVisibility> {
  let owns = store
    .is_alias_owner(phone.clone(), requester.user_id)
    .await
    .map_err(Error::store)?;
  Ok(if owns { EmailVisibility::Visible } else { EmailVisibility::Hidden })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mode_requires_exactly_one_field() {
    assert!(matches!(SearchQuery::default().mode(), Err(Error::MissingQuery)));

    let both = SearchQuery {
      name:  Some("bob".into()),
      phone: Some("+918123456789".into()),
    };
    assert!(matches!(both.mode(), Err(Error::AmbiguousQuery)));

    assert_eq!(SearchQuery::by_name("bob").mode().unwrap(), SearchBy::Name("bob"));
    assert_eq!(
      SearchQuery::by_phone("+918123456789").mode().unwrap(),
      SearchBy::Phone("+918123456789")
    );
  }

  #[test]
  fn empty_name_still_selects_name_mode() {
    // Emptiness is reported by the matcher, not as a missing query.
    assert_eq!(SearchQuery::by_name("").mode().unwrap(), SearchBy::Name(""));
  }
}
