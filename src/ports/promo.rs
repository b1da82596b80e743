use uuid::Uuid;

use crate::domain::{Promo, PromoDefinition};

#[mockall::automock]
#[async_trait::async_trait]
pub trait PromoStore {
    async fn exists_by_filter(&self, filter: PromoFilter) -> Result<bool, Error>;
    /// Store a new promo and assign it an identifier
    async fn insert_one(&self, promo: PromoDefinition) -> Result<Promo, Error>;
    async fn select_one_by_filter(&self, filter: PromoFilter) -> Result<Option<Promo>, Error>;
    async fn select_all(&self) -> Result<Vec<Promo>, Error>;
    /// Replace the fields of the promo matching `filter`
    ///
    /// Matching nothing is not an error.
    async fn update_one_by_filter(
        &self,
        filter: PromoFilter,
        promo: PromoDefinition,
    ) -> Result<(), Error>;
    async fn delete_one_by_filter(&self, filter: PromoFilter) -> Result<(), Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromoFilter {
    Id(Uuid),
    Name(String),
}

impl PromoFilter {
    pub fn matches(&self, promo: &Promo) -> bool {
        match self {
            PromoFilter::Id(id) => promo.id == *id,
            PromoFilter::Name(name) => promo.definition.name == *name,
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
