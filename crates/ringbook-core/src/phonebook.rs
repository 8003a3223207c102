//! [`Phonebook`], the service every front end calls into.
//!
//! Owns a [`DirectoryStore`] and a [`PhoneNormalizer`]. All raw phone input
//! is normalised here before it reaches the store, and every uniqueness
//! collision reported by the store is turned into a caller-facing
//! validation error.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  directory::{
    ContactAlias, Identity, Inserted, NewUser, RegisteredUser, SpamReport,
    MAX_NAME_LEN, MAX_USERNAME_LEN, clean_name,
  },
  phone::{CanonicalPhone, PhoneNormalizer},
  result::{EmailVisibility, LabeledResult},
  search::{self, SearchBy, SearchQuery},
  store::DirectoryStore,
  Error, Result,
};

// ─── Input / output types ────────────────────────────────────────────────────

/// Registration request, before phone normalisation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUserInput {
  pub username: String,
  pub phone:    String,
  pub email:    Option<String>,
  #[serde(default)]
  pub is_staff: bool,
}

/// A registered user as shown in phone details; email may be redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
  pub username: String,
  pub phone:    CanonicalPhone,
  pub email:    Option<String>,
}

/// Everything the directory knows about one number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneDetails {
  pub phone:           CanonicalPhone,
  pub user:            Option<UserSummary>,
  pub spam_count:      u64,
  pub contact_count:   u64,
  /// Names given by spam reporters; unnamed reports are omitted.
  pub spam_aliases:    Vec<String>,
  /// Names given by importing users; unnamed aliases are omitted.
  pub contact_aliases: Vec<String>,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct Phonebook<S> {
  store:      S,
  normalizer: PhoneNormalizer,
}

impl<S: DirectoryStore> Phonebook<S> {
  pub fn new(store: S, normalizer: PhoneNormalizer) -> Self {
    Self { store, normalizer }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn normalizer(&self) -> &PhoneNormalizer { &self.normalizer }

  // ── Search ──────────────────────────────────────────────────────────────

  /// Dispatch to the name or phone matcher. Both or neither query set is
  /// rejected before any lookup.
  pub async fn search(
    &self,
    query: &SearchQuery,
    requester: &Identity,
  ) -> Result<Vec<LabeledResult>> {
    match query.mode()? {
      SearchBy::Name(name) => self.match_by_name(name).await,
      SearchBy::Phone(phone) => self.match_by_phone(phone, requester).await,
    }
  }

  pub async fn match_by_name(&self, query: &str) -> Result<Vec<LabeledResult>> {
    search::match_by_name(&self.store, query).await
  }

  pub async fn match_by_phone(
    &self,
    query: &str,
    requester: &Identity,
  ) -> Result<Vec<LabeledResult>> {
    search::match_by_phone(&self.store, &self.normalizer, query, requester).await
  }

  /// Full view of one number: linked user, counts and alias names.
  pub async fn phone_details(
    &self,
    query: &str,
    requester: &Identity,
  ) -> Result<PhoneDetails> {
    let phone = self.normalizer.normalize(query)?;

    let entry = self
      .store
      .get_entry(phone.clone())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::PhoneNotFound(phone.clone()))?;

    let visibility =
      search::email_visibility(&self.store, &entry.phone, requester).await?;

    let user = entry.user.map(|u| UserSummary {
      username: u.username,
      phone:    u.phone,
      email:    match visibility {
        EmailVisibility::Visible => u.email,
        EmailVisibility::Hidden => None,
      },
    });

    let spam_count = self.store.spam_count(phone.clone()).await.map_err(Error::store)?;
    let contact_count = self.store.alias_count(phone.clone()).await.map_err(Error::store)?;
    let reports = self.store.spam_reports(phone.clone()).await.map_err(Error::store)?;
    let aliases = self.store.aliases(phone.clone()).await.map_err(Error::store)?;

    Ok(PhoneDetails {
      phone,
      user,
      spam_count,
      contact_count,
      spam_aliases: reports.into_iter().filter_map(|r| r.name).collect(),
      contact_aliases: aliases.into_iter().filter_map(|a| a.name).collect(),
    })
  }

  // ── Users ───────────────────────────────────────────────────────────────

  /// Register a user and link their directory entry in one store call. The
  /// entry already exists if the number was seen before as a contact or spam
  /// target.
  pub async fn register_user(&self, input: NewUserInput) -> Result<RegisteredUser> {
    let username = input.username.trim().to_owned();
    if username.is_empty() {
      return Err(Error::Validation("username is required".into()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
      return Err(Error::Validation(format!(
        "username must be at most {MAX_USERNAME_LEN} characters"
      )));
    }

    let email = clean_name(input.email);
    if let Some(e) = &email {
      validate_email(e)?;
    }

    let phone = self.normalizer.normalize(&input.phone)?;

    if let Some(e) = &email
      && self.store.user_by_email(e.clone()).await.map_err(Error::store)?.is_some()
    {
      return Err(Error::EmailAlreadyRegistered);
    }
    if self
      .store
      .user_by_phone(phone.clone())
      .await
      .map_err(Error::store)?
      .is_some()
    {
      return Err(Error::PhoneAlreadyRegistered);
    }

    let new_user = NewUser {
      username,
      phone: phone.clone(),
      email: email.clone(),
      is_staff: input.is_staff,
    };

    let user = match self.store.register_user(new_user).await.map_err(Error::store)? {
      Inserted::Created(user) => user,
      // Lost a race with a concurrent registration; report which key clashed.
      Inserted::Duplicate => {
        let email_taken = match &email {
          Some(e) => self.store.user_by_email(e.clone()).await.map_err(Error::store)?.is_some(),
          None => false,
        };
        tracing::warn!(%phone, "registration collided with an existing user");
        return Err(if email_taken {
          Error::EmailAlreadyRegistered
        } else {
          Error::PhoneAlreadyRegistered
        });
      }
    };

    tracing::info!(user_id = %user.user_id, %phone, "registered user");
    Ok(user)
  }

  /// Remove a user. Their directory entry, aliases and reports remain, with
  /// the links to the user cleared.
  pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
    if !self.store.delete_user(user_id).await.map_err(Error::store)? {
      return Err(Error::UserNotFound(user_id));
    }
    tracing::info!(%user_id, "deleted user");
    Ok(())
  }

  pub async fn user(&self, user_id: Uuid) -> Result<RegisteredUser> {
    self
      .store
      .get_user(user_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::UserNotFound(user_id))
  }

  /// Resolve the identity of a requesting user.
  pub async fn identity(&self, user_id: Uuid) -> Result<Identity> {
    Ok(self.user(user_id).await?.identity())
  }

  // ── Contacts and spam ───────────────────────────────────────────────────

  /// Import `phone` into the requester's contacts.
  pub async fn add_contact(
    &self,
    requester: &Identity,
    phone: &str,
    name: Option<String>,
  ) -> Result<ContactAlias> {
    let name = validated_name(name)?;
    let phone = self.normalizer.normalize(phone)?;
    self
      .store
      .get_or_create_entry(phone.clone())
      .await
      .map_err(Error::store)?;

    match self
      .store
      .insert_alias(requester.user_id, phone.clone(), name)
      .await
      .map_err(Error::store)?
    {
      Inserted::Created(alias) => {
        tracing::info!(owner = %requester.user_id, %phone, "added contact");
        Ok(alias)
      }
      Inserted::Duplicate => {
        tracing::warn!(owner = %requester.user_id, %phone, "duplicate contact");
        Err(Error::ContactAlreadyAdded)
      }
    }
  }

  /// Flag `phone` as spam on behalf of the requester.
  pub async fn report_spam(
    &self,
    requester: &Identity,
    phone: &str,
    name: Option<String>,
  ) -> Result<SpamReport> {
    let name = validated_name(name)?;
    let phone = self.normalizer.normalize(phone)?;
    self
      .store
      .get_or_create_entry(phone.clone())
      .await
      .map_err(Error::store)?;

    match self
      .store
      .insert_spam_report(requester.user_id, phone.clone(), name)
      .await
      .map_err(Error::store)?
    {
      Inserted::Created(report) => {
        tracing::info!(reporter = %requester.user_id, %phone, "reported spam");
        Ok(report)
      }
      Inserted::Duplicate => {
        tracing::warn!(reporter = %requester.user_id, %phone, "duplicate spam report");
        Err(Error::AlreadyReported)
      }
    }
  }

  /// The requester's contacts; staff see every contact.
  pub async fn list_contacts(&self, requester: &Identity) -> Result<Vec<ContactAlias>> {
    let owner = (!requester.is_staff).then_some(requester.user_id);
    self.store.list_aliases(owner).await.map_err(Error::store)
  }

  /// The requester's spam reports; staff see every report.
  pub async fn list_spam_reports(&self, requester: &Identity) -> Result<Vec<SpamReport>> {
    let reporter = (!requester.is_staff).then_some(requester.user_id);
    self.store.list_spam_reports(reporter).await.map_err(Error::store)
  }
}

fn validated_name(name: Option<String>) -> Result<Option<String>> {
  let name = clean_name(name);
  if let Some(n) = &name
    && n.chars().count() > MAX_NAME_LEN
  {
    return Err(Error::Validation(format!(
      "name must be at most {MAX_NAME_LEN} characters"
    )));
  }
  Ok(name)
}

fn validate_email(email: &str) -> Result<()> {
  let valid = match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
    }
    None => false,
  };
  if valid { Ok(()) } else { Err(Error::InvalidEmail(email.to_owned())) }
}
