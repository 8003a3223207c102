//! [`SqliteStore`], the SQLite implementation of [`DirectoryStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use ringbook_core::{
  directory::{ContactAlias, DirectoryEntry, Inserted, NewUser, RegisteredUser, SpamReport},
  phone::CanonicalPhone,
  store::{DirectoryStore, NameMatch},
};

use crate::{
  encode::{
    encode_dt, encode_uuid, RawAlias, RawEntry, RawReport, RawUser, ALIAS_COLUMNS,
    REPORT_COLUMNS, USER_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Ringbook directory backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run arbitrary SQL against the connection; tests use it to install
  /// failure triggers.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-row `INSERT`, reporting a uniqueness collision as `false`
  /// instead of an error.
  async fn insert_unique(
    &self,
    sql: &'static str,
    params: Vec<Option<String>>,
  ) -> Result<bool> {
    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(sql, rusqlite::params_from_iter(params.iter())) {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;
    Ok(inserted)
  }

  async fn query_users(&self, sql: String, param: Option<String>) -> Result<Vec<RegisteredUser>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![param], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn query_aliases(
    &self,
    sql: String,
    params: Vec<Option<String>>,
  ) -> Result<Vec<ContactAlias>> {
    let raws: Vec<RawAlias> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawAlias::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAlias::into_alias).collect()
  }

  async fn query_reports(
    &self,
    sql: String,
    params: Vec<Option<String>>,
  ) -> Result<Vec<SpamReport>> {
    let raws: Vec<RawReport> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawReport::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReport::into_report).collect()
  }

  async fn count(&self, sql: &'static str, phone: CanonicalPhone) -> Result<u64> {
    let phone_str = phone.into_inner();
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(sql, rusqlite::params![phone_str], |r| r.get(0))?)
      })
      .await?;
    Ok(n.max(0) as u64)
  }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

/// `WHERE` fragment selecting rows whose `column` satisfies `pattern`, with
/// the query bound as `?1`.
///
/// `lower()` only folds ASCII, matching [`NameMatch::matches`].
fn name_filter(column: &str, pattern: &NameMatch) -> String {
  match pattern {
    NameMatch::Prefix(_) => format!("substr({column}, 1, length(?1)) = ?1"),
    NameMatch::Substring(_) => format!(
      "substr({column}, 1, length(?1)) != ?1 AND instr(lower({column}), lower(?1)) > 0"
    ),
  }
}

const ENTRY_SELECT: &str = "
  SELECT d.phone, d.created_at,
         u.user_id, u.username, u.phone, u.email, u.is_staff, u.created_at
  FROM directory d
  LEFT JOIN users u ON u.user_id = d.user_id
  WHERE d.phone = ?1";

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = Error;

  // ── Entries ───────────────────────────────────────────────────────────────

  async fn get_or_create_entry(&self, phone: CanonicalPhone) -> Result<DirectoryEntry> {
    let phone_str = phone.as_str().to_owned();
    let at_str    = encode_dt(Utc::now());

    // A concurrent creator wins the insert; we fall through to the fetch.
    let created = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO directory (phone, created_at) VALUES (?1, ?2)
           ON CONFLICT(phone) DO NOTHING",
          rusqlite::params![phone_str, at_str],
        )?;
        Ok(n == 1)
      })
      .await?;

    if created {
      tracing::debug!(%phone, "created directory entry");
    }

    self
      .get_entry(phone.clone())
      .await?
      .ok_or_else(|| Error::EntryNotFound(phone.into_inner()))
  }

  async fn get_entry(&self, phone: CanonicalPhone) -> Result<Option<DirectoryEntry>> {
    let phone_str = phone.into_inner();

    let raw: Option<RawEntry> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(ENTRY_SELECT, rusqlite::params![phone_str], RawEntry::from_row)
          .optional()?)
      })
      .await?;

    raw.map(RawEntry::into_entry).transpose()
  }

  async fn aliases(&self, phone: CanonicalPhone) -> Result<Vec<ContactAlias>> {
    let sql = format!("SELECT {ALIAS_COLUMNS} FROM contacts WHERE phone = ?1 ORDER BY rowid");
    self.query_aliases(sql, vec![Some(phone.into_inner())]).await
  }

  async fn spam_reports(&self, phone: CanonicalPhone) -> Result<Vec<SpamReport>> {
    let sql =
      format!("SELECT {REPORT_COLUMNS} FROM spam_reports WHERE phone = ?1 ORDER BY rowid");
    self.query_reports(sql, vec![Some(phone.into_inner())]).await
  }

  async fn spam_count(&self, phone: CanonicalPhone) -> Result<u64> {
    self
      .count("SELECT COUNT(*) FROM spam_reports WHERE phone = ?1", phone)
      .await
  }

  async fn alias_count(&self, phone: CanonicalPhone) -> Result<u64> {
    self
      .count("SELECT COUNT(*) FROM contacts WHERE phone = ?1", phone)
      .await
  }

  async fn is_alias_owner(&self, phone: CanonicalPhone, user_id: Uuid) -> Result<bool> {
    let phone_str = phone.into_inner();
    let user_str  = encode_uuid(user_id);

    let owns = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS(SELECT 1 FROM contacts WHERE phone = ?1 AND owner_id = ?2)",
          rusqlite::params![phone_str, user_str],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(owns)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn register_user(&self, input: NewUser) -> Result<Inserted<RegisteredUser>> {
    let user = RegisteredUser {
      user_id:    Uuid::new_v4(),
      username:   input.username,
      phone:      input.phone,
      email:      input.email,
      is_staff:   input.is_staff,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(user.user_id);
    let phone_str = user.phone.as_str().to_owned();
    let username  = user.username.clone();
    let email     = user.email.clone();
    let is_staff  = user.is_staff;
    let at_str    = encode_dt(user.created_at);

    // User row, entry and link commit together or not at all.
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let res = tx.execute(
          "INSERT INTO users (user_id, username, phone, email, is_staff, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, username, phone_str, email, is_staff, at_str],
        );
        match res {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => return Ok(false),
          Err(e) => return Err(e.into()),
        }

        tx.execute(
          "INSERT INTO directory (phone, created_at) VALUES (?1, ?2)
           ON CONFLICT(phone) DO NOTHING",
          rusqlite::params![phone_str, at_str],
        )?;
        tx.execute(
          "UPDATE directory SET user_id = ?2 WHERE phone = ?1",
          rusqlite::params![phone_str, id_str],
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(if inserted { Inserted::Created(user) } else { Inserted::Duplicate })
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<RegisteredUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1");
    Ok(self.query_users(sql, Some(encode_uuid(id))).await?.into_iter().next())
  }

  async fn user_by_phone(&self, phone: CanonicalPhone) -> Result<Option<RegisteredUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.phone = ?1");
    Ok(self.query_users(sql, Some(phone.into_inner())).await?.into_iter().next())
  }

  async fn user_by_email(&self, email: String) -> Result<Option<RegisteredUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.email = ?1");
    Ok(self.query_users(sql, Some(email)).await?.into_iter().next())
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM users WHERE user_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Aliases and reports ───────────────────────────────────────────────────

  async fn insert_alias(
    &self,
    owner_id: Uuid,
    phone:    CanonicalPhone,
    name:     Option<String>,
  ) -> Result<Inserted<ContactAlias>> {
    let alias = ContactAlias {
      alias_id:   Uuid::new_v4(),
      owner_id:   Some(owner_id),
      phone,
      name,
      created_at: Utc::now(),
    };

    let inserted = self
      .insert_unique(
        "INSERT INTO contacts (alias_id, owner_id, phone, name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          Some(encode_uuid(alias.alias_id)),
          Some(encode_uuid(owner_id)),
          Some(alias.phone.as_str().to_owned()),
          alias.name.clone(),
          Some(encode_dt(alias.created_at)),
        ],
      )
      .await?;

    Ok(if inserted { Inserted::Created(alias) } else { Inserted::Duplicate })
  }

  async fn insert_spam_report(
    &self,
    reporter_id: Uuid,
    phone:       CanonicalPhone,
    name:        Option<String>,
  ) -> Result<Inserted<SpamReport>> {
    let report = SpamReport {
      report_id:   Uuid::new_v4(),
      phone,
      reporter_id: Some(reporter_id),
      name,
      created_at:  Utc::now(),
    };

    let inserted = self
      .insert_unique(
        "INSERT INTO spam_reports (report_id, phone, reporter_id, name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          Some(encode_uuid(report.report_id)),
          Some(report.phone.as_str().to_owned()),
          Some(encode_uuid(reporter_id)),
          report.name.clone(),
          Some(encode_dt(report.created_at)),
        ],
      )
      .await?;

    Ok(if inserted { Inserted::Created(report) } else { Inserted::Duplicate })
  }

  async fn list_aliases(&self, owner: Option<Uuid>) -> Result<Vec<ContactAlias>> {
    let sql = format!(
      "SELECT {ALIAS_COLUMNS} FROM contacts
       WHERE ?1 IS NULL OR owner_id = ?1
       ORDER BY rowid"
    );
    self.query_aliases(sql, vec![owner.map(encode_uuid)]).await
  }

  async fn list_spam_reports(&self, reporter: Option<Uuid>) -> Result<Vec<SpamReport>> {
    let sql = format!(
      "SELECT {REPORT_COLUMNS} FROM spam_reports
       WHERE ?1 IS NULL OR reporter_id = ?1
       ORDER BY rowid"
    );
    self.query_reports(sql, vec![reporter.map(encode_uuid)]).await
  }

  // ── Name lookups ──────────────────────────────────────────────────────────

  async fn users_by_name(&self, pattern: &NameMatch) -> Result<Vec<RegisteredUser>> {
    let sql = format!(
      "SELECT {USER_COLUMNS} FROM users u WHERE {} ORDER BY u.rowid",
      name_filter("u.username", pattern)
    );
    self.query_users(sql, Some(pattern.query().to_owned())).await
  }

  async fn aliases_by_name(&self, pattern: &NameMatch) -> Result<Vec<ContactAlias>> {
    let sql = format!(
      "SELECT {ALIAS_COLUMNS} FROM contacts WHERE {} ORDER BY rowid",
      name_filter("name", pattern)
    );
    self.query_aliases(sql, vec![Some(pattern.query().to_owned())]).await
  }

  async fn spam_reports_by_name(&self, pattern: &NameMatch) -> Result<Vec<SpamReport>> {
    let sql = format!(
      "SELECT {REPORT_COLUMNS} FROM spam_reports WHERE {} ORDER BY rowid",
      name_filter("name", pattern)
    );
    self.query_reports(sql, vec![Some(pattern.query().to_owned())]).await
  }
}
