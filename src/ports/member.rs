use uuid::Uuid;

use crate::domain::Member;

#[mockall::automock]
#[async_trait::async_trait]
pub trait MemberStore {
    async fn select_one_by_filter(&self, filter: MemberFilter) -> Result<Option<Member>, Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberFilter {
    Id(Uuid),
    Username(String),
}

impl MemberFilter {
    pub fn matches(&self, member: &Member) -> bool {
        match self {
            MemberFilter::Id(id) => member.id == *id,
            MemberFilter::Username(username) => member.username == *username,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
