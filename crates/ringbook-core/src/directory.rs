//! Directory records: the per-phone entry and the rows that hang off it.
//!
//! A [`DirectoryEntry`] is created lazily the first time a phone number is
//! referenced (registration, contact import, spam report) and is never
//! deleted by application flows. Registered users are linked to their entry
//! without owning it: deleting a user clears the link, the alias owner and
//! the spam reporter, but leaves the entry and its rows in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::phone::CanonicalPhone;

/// Longest accepted contact alias or spam report name.
pub const MAX_NAME_LEN: usize = 128;

/// Longest accepted username.
pub const MAX_USERNAME_LEN: usize = 150;

// ─── Identities ──────────────────────────────────────────────────────────────

/// A registered identity. Owned by the identity collaborator; the directory
/// only links to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
  pub user_id:    Uuid,
  pub username:   String,
  pub phone:      CanonicalPhone,
  pub email:      Option<String>,
  pub is_staff:   bool,
  pub created_at: DateTime<Utc>,
}

impl RegisteredUser {
  pub fn identity(&self) -> Identity {
    Identity { user_id: self.user_id, is_staff: self.is_staff }
  }
}

/// Input for [`DirectoryStore::register_user`](crate::store::DirectoryStore::register_user).
/// The phone is already normalised.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username: String,
  pub phone:    CanonicalPhone,
  pub email:    Option<String>,
  pub is_staff: bool,
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id:  Uuid,
  /// Staff see every row in the contact and spam listings.
  pub is_staff: bool,
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// The durable per-phone record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
  pub phone:      CanonicalPhone,
  /// The registered user owning this number, if any.
  pub user:       Option<RegisteredUser>,
  pub created_at: DateTime<Utc>,
}

/// A user's private label for a phone number, imported from their contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactAlias {
  pub alias_id:   Uuid,
  /// `None` once the importing user has been deleted.
  pub owner_id:   Option<Uuid>,
  pub phone:      CanonicalPhone,
  pub name:       Option<String>,
  pub created_at: DateTime<Utc>,
}

/// A user's assertion that a number is a spam source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpamReport {
  pub report_id:   Uuid,
  pub phone:       CanonicalPhone,
  /// `None` once the reporting user has been deleted.
  pub reporter_id: Option<Uuid>,
  /// The name the reporter believes the spammer goes by.
  pub name:        Option<String>,
  pub created_at:  DateTime<Utc>,
}

// ─── Insert outcome ──────────────────────────────────────────────────────────

/// Result of an insert guarded by a storage uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inserted<T> {
  Created(T),
  /// A row with the same unique key already exists; nothing was written.
  Duplicate,
}

impl<T> Inserted<T> {
  pub fn created(self) -> Option<T> {
    match self {
      Inserted::Created(v) => Some(v),
      Inserted::Duplicate => None,
    }
  }
}

/// Normalise an optional free-text name: blank strings are treated as absent.
pub fn clean_name(name: Option<String>) -> Option<String> {
  name
    .map(|n| n.trim().to_owned())
    .filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clean_name_drops_blank() {
    assert_eq!(clean_name(None), None);
    assert_eq!(clean_name(Some("   ".into())), None);
    assert_eq!(clean_name(Some(" Bob ".into())).as_deref(), Some("Bob"));
  }

  #[test]
  fn inserted_created() {
    assert_eq!(Inserted::Created(3).created(), Some(3));
    assert_eq!(Inserted::<u8>::Duplicate.created(), None);
  }
}
