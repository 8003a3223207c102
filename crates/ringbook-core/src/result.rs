//! The uniform search result and the assembler that builds it.
//!
//! Each of the three sources (registered users, contact aliases, spam
//! reports) has its own conversion into [`LabeledResult`]. Redaction and
//! null-name filtering happen here, so matchers only decide *which* rows to
//! return.

use serde::{Deserialize, Serialize};

use crate::{
  directory::{ContactAlias, RegisteredUser, SpamReport},
  phone::CanonicalPhone,
  store::DirectoryStore,
  Error, Result,
};

// ─── Result type ─────────────────────────────────────────────────────────────

/// Which source a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
  Registered,
  Unregistered,
  ReportedSpam,
}

/// One search hit, tagged by source.
///
/// Serialises as `{"type": "registered", "name": ..., "phone": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LabeledResult {
  Registered {
    name:       String,
    phone:      CanonicalPhone,
    spam_count: u64,
    /// `None` unless the requester has this number in their contacts.
    email:      Option<String>,
  },
  Unregistered {
    name:       String,
    phone:      CanonicalPhone,
    spam_count: u64,
  },
  ReportedSpam {
    name:       String,
    phone:      CanonicalPhone,
    spam_count: u64,
  },
}

/// Whether a registered user's email may be shown to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailVisibility {
  Visible,
  Hidden,
}

impl LabeledResult {
  pub fn registered(
    user: &RegisteredUser,
    spam_count: u64,
    visibility: EmailVisibility,
  ) -> Self {
    let email = match visibility {
      EmailVisibility::Visible => user.email.clone(),
      EmailVisibility::Hidden => None,
    };
    LabeledResult::Registered {
      name: user.username.clone(),
      phone: user.phone.clone(),
      spam_count,
      email,
    }
  }

  /// `None` for unnamed aliases; those are bookkeeping rows, not results.
  pub fn from_alias(alias: &ContactAlias, spam_count: u64) -> Option<Self> {
    let name = alias.name.clone()?;
    Some(LabeledResult::Unregistered { name, phone: alias.phone.clone(), spam_count })
  }

  /// `None` for unnamed reports.
  pub fn from_report(report: &SpamReport, spam_count: u64) -> Option<Self> {
    let name = report.name.clone()?;
    Some(LabeledResult::ReportedSpam { name, phone: report.phone.clone(), spam_count })
  }

  pub fn kind(&self) -> ResultKind {
    match self {
      LabeledResult::Registered { .. } => ResultKind::Registered,
      LabeledResult::Unregistered { .. } => ResultKind::Unregistered,
      LabeledResult::ReportedSpam { .. } => ResultKind::ReportedSpam,
    }
  }

  pub fn name(&self) -> &str {
    match self {
      LabeledResult::Registered { name, .. }
      | LabeledResult::Unregistered { name, .. }
      | LabeledResult::ReportedSpam { name, .. } => name,
    }
  }

  pub fn phone(&self) -> &CanonicalPhone {
    match self {
      LabeledResult::Registered { phone, .. }
      | LabeledResult::Unregistered { phone, .. }
      | LabeledResult::ReportedSpam { phone, .. } => phone,
    }
  }

  pub fn spam_count(&self) -> u64 {
    match self {
      LabeledResult::Registered { spam_count, .. }
      | LabeledResult::Unregistered { spam_count, .. }
      | LabeledResult::ReportedSpam { spam_count, .. } => *spam_count,
    }
  }

  pub fn email(&self) -> Option<&str> {
    match self {
      LabeledResult::Registered { email, .. } => email.as_deref(),
      _ => None,
    }
  }
}

// ─── Assembler ───────────────────────────────────────────────────────────────

/// Converts store rows into results for a single request.
///
/// Spam counts are read fresh from the store for every row.
pub struct Assembler<'s, S> {
  store: &'s S,
}

impl<'s, S: DirectoryStore> Assembler<'s, S> {
  pub fn new(store: &'s S) -> Self { Self { store } }

  pub async fn spam_count(&self, phone: &CanonicalPhone) -> Result<u64> {
    self
      .store
      .spam_count(phone.clone())
      .await
      .map_err(Error::store)
  }

  pub async fn users(
    &self,
    users: &[RegisteredUser],
    visibility: EmailVisibility,
  ) -> Result<Vec<LabeledResult>> {
    let mut out = Vec::with_capacity(users.len());
    for user in users {
      let spam_count = self.spam_count(&user.phone).await?;
      out.push(LabeledResult::registered(user, spam_count, visibility));
    }
    Ok(out)
  }

  pub async fn aliases(&self, aliases: &[ContactAlias]) -> Result<Vec<LabeledResult>> {
    let mut out = Vec::with_capacity(aliases.len());
    for alias in aliases.iter().filter(|a| a.name.is_some()) {
      let spam_count = self.spam_count(&alias.phone).await?;
      out.extend(LabeledResult::from_alias(alias, spam_count));
    }
    Ok(out)
  }

  pub async fn reports(&self, reports: &[SpamReport]) -> Result<Vec<LabeledResult>> {
    let mut out = Vec::with_capacity(reports.len());
    for report in reports.iter().filter(|r| r.name.is_some()) {
      let spam_count = self.spam_count(&report.phone).await?;
      out.extend(LabeledResult::from_report(report, spam_count));
    }
    Ok(out)
  }
}
