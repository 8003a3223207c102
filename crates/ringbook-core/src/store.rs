//! The `DirectoryStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `ringbook-store-sqlite`).
//! The [`Phonebook`](crate::Phonebook) service and the HTTP layer depend on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  directory::{ContactAlias, DirectoryEntry, Inserted, NewUser, RegisteredUser, SpamReport},
  phone::CanonicalPhone,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// How a name query is compared against stored names.
///
/// The two variants partition the matching rows of one source: a name that
/// satisfies [`NameMatch::Prefix`] never satisfies [`NameMatch::Substring`]
/// for the same query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
  /// Name starts with the query; case-sensitive.
  Prefix(String),
  /// Name contains the query, ignoring ASCII case, and is not a
  /// [`NameMatch::Prefix`] hit. The query is literal text; no wildcard or
  /// regex characters are interpreted.
  Substring(String),
}

impl NameMatch {
  pub fn query(&self) -> &str {
    match self {
      NameMatch::Prefix(q) | NameMatch::Substring(q) => q,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Ringbook directory backend.
///
/// Entries are append-only: there is no operation that deletes a
/// [`DirectoryEntry`]. Inserts guarded by uniqueness constraints report
/// collisions as [`Inserted::Duplicate`] rather than as errors.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Entries ───────────────────────────────────────────────────────────

  /// Return the entry for `phone`, creating an unlinked one if absent.
  ///
  /// Must hold at most one entry per phone even when callers race.
  fn get_or_create_entry(
    &self,
    phone: CanonicalPhone,
  ) -> impl Future<Output = Result<DirectoryEntry, Self::Error>> + Send + '_;

  /// Retrieve an entry by phone. Returns `None` if not found.
  fn get_entry(
    &self,
    phone: CanonicalPhone,
  ) -> impl Future<Output = Result<Option<DirectoryEntry>, Self::Error>> + Send + '_;

  /// All contact aliases for `phone`, in insertion order.
  fn aliases(
    &self,
    phone: CanonicalPhone,
  ) -> impl Future<Output = Result<Vec<ContactAlias>, Self::Error>> + Send + '_;

  /// All spam reports for `phone`, in insertion order.
  fn spam_reports(
    &self,
    phone: CanonicalPhone,
  ) -> impl Future<Output = Result<Vec<SpamReport>, Self::Error>> + Send + '_;

  /// Number of spam reports currently recorded against `phone`.
  fn spam_count(
    &self,
    phone: CanonicalPhone,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Number of contact aliases currently recorded for `phone`.
  fn alias_count(
    &self,
    phone: CanonicalPhone,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Whether `user_id` has imported `phone` as a contact.
  fn is_alias_owner(
    &self,
    phone: CanonicalPhone,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user and link the directory entry for its phone,
  /// creating the entry if absent.
  ///
  /// All of it happens atomically: on any failure neither the user nor the
  /// link remains. Phone and email are unique; a collision on either yields
  /// [`Inserted::Duplicate`].
  fn register_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Inserted<RegisteredUser>, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<RegisteredUser>, Self::Error>> + Send + '_;

  fn user_by_phone(
    &self,
    phone: CanonicalPhone,
  ) -> impl Future<Output = Result<Option<RegisteredUser>, Self::Error>> + Send + '_;

  fn user_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<RegisteredUser>, Self::Error>> + Send + '_;

  /// Delete a user. Entry links, alias owners and spam reporters pointing at
  /// the user are cleared, not deleted. Returns `false` if no such user.
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Aliases and reports ───────────────────────────────────────────────

  /// Record a contact alias. The entry for `phone` must already exist.
  ///
  /// Unique per `(owner, phone, name)`, and per `(owner, phone)` when `name`
  /// is `None`.
  fn insert_alias(
    &self,
    owner_id: Uuid,
    phone: CanonicalPhone,
    name: Option<String>,
  ) -> impl Future<Output = Result<Inserted<ContactAlias>, Self::Error>> + Send + '_;

  /// Record a spam report. The entry for `phone` must already exist.
  ///
  /// Unique per `(phone, reporter, name)`, and per `(phone, reporter)` when
  /// `name` is `None`.
  fn insert_spam_report(
    &self,
    reporter_id: Uuid,
    phone: CanonicalPhone,
    name: Option<String>,
  ) -> impl Future<Output = Result<Inserted<SpamReport>, Self::Error>> + Send + '_;

  /// List aliases imported by `owner`, or all aliases when `None`.
  fn list_aliases(
    &self,
    owner: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<ContactAlias>, Self::Error>> + Send + '_;

  /// List reports filed by `reporter`, or all reports when `None`.
  fn list_spam_reports(
    &self,
    reporter: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<SpamReport>, Self::Error>> + Send + '_;

  // ── Name lookups ──────────────────────────────────────────────────────

  /// Registered users whose username satisfies `pattern`.
  fn users_by_name<'a>(
    &'a self,
    pattern: &'a NameMatch,
  ) -> impl Future<Output = Result<Vec<RegisteredUser>, Self::Error>> + Send + 'a;

  /// Contact aliases whose name satisfies `pattern`.
  fn aliases_by_name<'a>(
    &'a self,
    pattern: &'a NameMatch,
  ) -> impl Future<Output = Result<Vec<ContactAlias>, Self::Error>> + Send + 'a;

  /// Spam reports whose name satisfies `pattern`.
  fn spam_reports_by_name<'a>(
    &'a self,
    pattern: &'a NameMatch,
  ) -> impl Future<Output = Result<Vec<SpamReport>, Self::Error>> + Send + 'a;
}
