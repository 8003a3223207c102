//! Error types for `ringbook-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::phone::CanonicalPhone;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no search query provided")]
  MissingQuery,

  #[error("both name and phone search not allowed")]
  AmbiguousQuery,

  #[error("name query must not be empty")]
  EmptyQuery,

  #[error("invalid phone number: {0:?}")]
  InvalidPhoneFormat(String),

  #[error("phone number not found in directory: {0}")]
  PhoneNotFound(CanonicalPhone),

  #[error("unknown phone region: {0:?}")]
  UnknownRegion(String),

  #[error("already reported this number")]
  AlreadyReported,

  #[error("contact is previously added")]
  ContactAlreadyAdded,

  #[error("phone number is already registered")]
  PhoneAlreadyRegistered,

  #[error("email is already registered")]
  EmailAlreadyRegistered,

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("invalid email address: {0:?}")]
  InvalidEmail(String),

  #[error("{0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure. Used as `.map_err(Error::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }

  /// Whether the caller supplied bad input, as opposed to a lookup miss or
  /// a backend failure.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Error::MissingQuery
        | Error::AmbiguousQuery
        | Error::EmptyQuery
        | Error::InvalidPhoneFormat(_)
        | Error::AlreadyReported
        | Error::ContactAlreadyAdded
        | Error::PhoneAlreadyRegistered
        | Error::EmailAlreadyRegistered
        | Error::InvalidEmail(_)
        | Error::Validation(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
