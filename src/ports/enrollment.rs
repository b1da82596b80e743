use uuid::Uuid;

use crate::domain::EnrollmentRequest;

#[mockall::automock]
#[async_trait::async_trait]
pub trait EnrollmentStore {
    async fn exists_by_filter(&self, filter: EnrollmentFilter) -> Result<bool, Error>;
    /// Persist a new enrollment
    ///
    /// Adapters backed by a unique (member, promo) index return [`Error::AlreadyEnrolled`] when
    /// the pair is already present.
    async fn insert_one(&self, request: EnrollmentRequest) -> Result<EnrollmentRequest, Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnrollmentFilter {
    Id(Uuid),
    MemberAndPromo { member: Uuid, promo: Uuid },
}

impl EnrollmentFilter {
    pub fn matches(&self, request: &EnrollmentRequest) -> bool {
        match self {
            EnrollmentFilter::Id(id) => request.id == *id,
            EnrollmentFilter::MemberAndPromo { member, promo } => {
                request.member == *member && request.promo == *promo
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The member already has an enrollment for this promo
    #[error("member {member} is already enrolled in promo {promo}")]
    AlreadyEnrolled { member: Uuid, promo: Uuid },

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
