//! Phone normalisation: raw user input to a canonical, region-validated
//! directory key.
//!
//! Parsing and number-plan validation are delegated to the `phonenumber`
//! crate (a port of libphonenumber). Numbers without a leading `+` country
//! code are interpreted in the normalizer's default region.

use std::{fmt, str::FromStr};

use phonenumber::{Mode, country};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Region used when configuration does not name one.
pub const DEFAULT_REGION: &str = "IN";

// ─── Canonical value ─────────────────────────────────────────────────────────

/// A validated phone number in E.164 form, e.g. `+918123456789`.
///
/// Only [`PhoneNormalizer::normalize`] produces new values from user input;
/// storage backends rebuild them from trusted columns with
/// [`CanonicalPhone::from_e164`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalPhone(String);

impl CanonicalPhone {
  /// Rebuild a canonical phone from an already-normalised E.164 string.
  pub fn from_e164(value: impl Into<String>) -> Self { Self(value.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for CanonicalPhone {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl AsRef<str> for CanonicalPhone {
  fn as_ref(&self) -> &str { &self.0 }
}

// ─── Normalizer ──────────────────────────────────────────────────────────────

/// Parses and validates raw phone strings against a default region.
#[derive(Debug, Clone, Copy)]
pub struct PhoneNormalizer {
  region: country::Id,
}

impl PhoneNormalizer {
  /// Build a normalizer for an ISO 3166-1 alpha-2 region code (`"IN"`,
  /// `"US"`, ...). Case-insensitive.
  pub fn new(region: &str) -> Result<Self> {
    let code = region.trim().to_ascii_uppercase();
    let region = country::Id::from_str(&code)
      .map_err(|_| Error::UnknownRegion(region.to_owned()))?;
    Ok(Self { region })
  }

  pub fn region(&self) -> country::Id { self.region }

  /// Normalise `raw` into E.164.
  ///
  /// Fails with [`Error::InvalidPhoneFormat`] when the input does not parse
  /// or parses but is not a valid number in its numbering plan.
  pub fn normalize(&self, raw: &str) -> Result<CanonicalPhone> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(Error::InvalidPhoneFormat(raw.to_owned()));
    }

    let number = phonenumber::parse(Some(self.region), trimmed)
      .map_err(|_| Error::InvalidPhoneFormat(raw.to_owned()))?;

    if !phonenumber::is_valid(&number) {
      return Err(Error::InvalidPhoneFormat(raw.to_owned()));
    }

    Ok(CanonicalPhone(number.format().mode(Mode::E164).to_string()))
  }
}

impl Default for PhoneNormalizer {
  fn default() -> Self {
    Self { region: country::Id::IN }
  }
}
