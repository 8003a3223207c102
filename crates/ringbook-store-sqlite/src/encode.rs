//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings and phones as E.164.

use chrono::{DateTime, Utc};
use ringbook_core::{
  directory::{ContactAlias, DirectoryEntry, RegisteredUser, SpamReport},
  phone::CanonicalPhone,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`], qualified with alias `u`.
pub const USER_COLUMNS: &str =
  "u.user_id, u.username, u.phone, u.email, u.is_staff, u.created_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub phone:      String,
  pub email:      Option<String>,
  pub is_staff:   bool,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawUser {
      user_id:    row.get(0)?,
      username:   row.get(1)?,
      phone:      row.get(2)?,
      email:      row.get(3)?,
      is_staff:   row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<RegisteredUser> {
    Ok(RegisteredUser {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      phone:      CanonicalPhone::from_e164(self.phone),
      email:      self.email,
      is_staff:   self.is_staff,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `directory` row left-joined with its linked user.
pub struct RawEntry {
  pub phone:      String,
  pub created_at: String,
  pub user:       Option<RawUser>,
}

impl RawEntry {
  /// Expects `d.phone, d.created_at` followed by [`USER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    let user_id: Option<String> = row.get(2)?;
    let user = match user_id {
      Some(user_id) => Some(RawUser {
        user_id,
        username:   row.get(3)?,
        phone:      row.get(4)?,
        email:      row.get(5)?,
        is_staff:   row.get(6)?,
        created_at: row.get(7)?,
      }),
      None => None,
    };
    Ok(RawEntry { phone: row.get(0)?, created_at: row.get(1)?, user })
  }

  pub fn into_entry(self) -> Result<DirectoryEntry> {
    Ok(DirectoryEntry {
      phone:      CanonicalPhone::from_e164(self.phone),
      user:       self.user.map(RawUser::into_user).transpose()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawAlias::from_row`].
pub const ALIAS_COLUMNS: &str = "alias_id, owner_id, phone, name, created_at";

pub struct RawAlias {
  pub alias_id:   String,
  pub owner_id:   Option<String>,
  pub phone:      String,
  pub name:       Option<String>,
  pub created_at: String,
}

impl RawAlias {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawAlias {
      alias_id:   row.get(0)?,
      owner_id:   row.get(1)?,
      phone:      row.get(2)?,
      name:       row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_alias(self) -> Result<ContactAlias> {
    Ok(ContactAlias {
      alias_id:   decode_uuid(&self.alias_id)?,
      owner_id:   self.owner_id.as_deref().map(decode_uuid).transpose()?,
      phone:      CanonicalPhone::from_e164(self.phone),
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawReport::from_row`].
pub const REPORT_COLUMNS: &str = "report_id, phone, reporter_id, name, created_at";

pub struct RawReport {
  pub report_id:   String,
  pub phone:       String,
  pub reporter_id: Option<String>,
  pub name:        Option<String>,
  pub created_at:  String,
}

impl RawReport {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawReport {
      report_id:   row.get(0)?,
      phone:       row.get(1)?,
      reporter_id: row.get(2)?,
      name:        row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_report(self) -> Result<SpamReport> {
    Ok(SpamReport {
      report_id:   decode_uuid(&self.report_id)?,
      phone:       CanonicalPhone::from_e164(self.phone),
      reporter_id: self.reporter_id.as_deref().map(decode_uuid).transpose()?,
      name:        self.name,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
