use std::{borrow::Cow, future::Future, pin::Pin, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize};

use uuid::Uuid;

use crate::domain::{eligibility::Denial, promo::ValidationError};

pub mod enroll;
pub mod promos;

/// Future returned by every use case
pub type CommandFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send>>;

/// Promo create/read/update/delete use cases
pub struct PromoLifecycle<P> {
    promos: Arc<P>,
}

impl<P> PromoLifecycle<P> {
    pub fn new(promos: Arc<P>) -> Self {
        Self { promos }
    }
}

impl<P> Clone for PromoLifecycle<P> {
    fn clone(&self) -> Self {
        Self {
            promos: self.promos.clone(),
        }
    }
}

/// Member enrollment use case
pub struct EnrollmentLogic<P, M, E> {
    promos: Arc<P>,
    members: Arc<M>,
    enrollments: Arc<E>,
}

impl<P, M, E> EnrollmentLogic<P, M, E> {
    pub fn new(promos: Arc<P>, members: Arc<M>, enrollments: Arc<E>) -> Self {
        Self {
            promos,
            members,
            enrollments,
        }
    }
}

impl<P, M, E> Clone for EnrollmentLogic<P, M, E> {
    fn clone(&self) -> Self {
        Self {
            promos: self.promos.clone(),
            members: self.members.clone(),
            enrollments: self.enrollments.clone(),
        }
    }
}

/// Caller identity, as seen by the transport
///
/// Only carried through for logging.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Read an explicit `null` the same way as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a caller-supplied id
///
/// A blank id counts as missing. An id that does not parse cannot match any stored document.
fn parse_id(
    raw: Option<&str>,
    field: &'static str,
    entity: &'static str,
) -> Result<Uuid, Error> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or(ValidationError::MissingInformation(field))?;

    raw.parse().map_err(|_| Error::NotFound(entity))
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BusinessRule(Cow<'static, str>),

    /// Opaque store failure, never retried here
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MissingInformation,
    InvalidTemplate,
    InvalidInputField,
    InvalidMemberField,
    InvalidStatus,
    NotFound,
    BusinessRule,
    StoreUnavailable,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(err) => match err {
                ValidationError::MissingInformation(_) => ErrorKind::MissingInformation,
                ValidationError::InvalidTemplate(_) => ErrorKind::InvalidTemplate,
                ValidationError::InvalidInputField(_) => ErrorKind::InvalidInputField,
                ValidationError::InvalidMemberField(_) => ErrorKind::InvalidMemberField,
                ValidationError::InvalidStatus(_) => ErrorKind::InvalidStatus,
            },
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::BusinessRule(_) => ErrorKind::BusinessRule,
            Error::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }
}

/// Log a failed use case at a level matching its kind
fn log_failure(err: &Error) {
    match err.kind() {
        ErrorKind::StoreUnavailable => tracing::error!(error = %err, "store call failed"),
        kind => tracing::warn!(?kind, error = %err, "request refused"),
    }
}

impl From<Denial> for Error {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::PromoNotFound => Error::NotFound("Promo"),
            denial => Error::BusinessRule(denial.to_string().into()),
        }
    }
}

impl From<crate::ports::promo::Error> for Error {
    fn from(err: crate::ports::promo::Error) -> Self {
        match err {
            crate::ports::promo::Error::Adapter(err) => Error::StoreUnavailable(err),
        }
    }
}

impl From<crate::ports::member::Error> for Error {
    fn from(err: crate::ports::member::Error) -> Self {
        match err {
            crate::ports::member::Error::Adapter(err) => Error::StoreUnavailable(err),
        }
    }
}

impl From<crate::ports::enrollment::Error> for Error {
    fn from(err: crate::ports::enrollment::Error) -> Self {
        match err {
            crate::ports::enrollment::Error::AlreadyEnrolled { .. } => {
                Denial::AlreadyEnrolled.into()
            }
            crate::ports::enrollment::Error::Adapter(err) => Error::StoreUnavailable(err),
        }
    }
}
