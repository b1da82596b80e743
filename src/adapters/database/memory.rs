use crate::{
    domain::{EnrollmentRequest, Member, Promo, PromoDefinition},
    ports::{
        enrollment::{self, EnrollmentFilter, EnrollmentStore},
        member::{self, MemberFilter, MemberStore},
        promo::{self, PromoFilter, PromoStore},
    },
};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// In-process document store
///
/// Documents are kept in insertion order, which is also the order `select_all` returns them in.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    promos: Arc<Mutex<Vec<Promo>>>,
    members: Arc<Mutex<Vec<Member>>>,
    enrollments: Arc<Mutex<Vec<EnrollmentRequest>>>,
}

impl MemoryDatabase {
    pub fn with_members(members: impl IntoIterator<Item = Member>) -> Self {
        Self {
            members: Arc::new(Mutex::new(members.into_iter().collect())),
            ..Default::default()
        }
    }

    /// Snapshot of every stored enrollment request, in insertion order
    pub fn enrollments(&self) -> Result<Vec<EnrollmentRequest>, enrollment::Error> {
        Ok(self.enrollments.lock()?.clone())
    }
}

#[async_trait::async_trait]
impl PromoStore for MemoryDatabase {
    async fn exists_by_filter(&self, filter: PromoFilter) -> Result<bool, promo::Error> {
        Ok(self.promos.lock()?.iter().any(|promo| filter.matches(promo)))
    }

    async fn insert_one(&self, definition: PromoDefinition) -> Result<Promo, promo::Error> {
        let promo = Promo {
            id: Uuid::new_v4(),
            definition,
        };
        self.promos.lock()?.push(promo.clone());

        Ok(promo)
    }

    async fn select_one_by_filter(
        &self,
        filter: PromoFilter,
    ) -> Result<Option<Promo>, promo::Error> {
        let promo = self
            .promos
            .lock()?
            .iter()
            .find(|promo| filter.matches(promo))
            .cloned();

        Ok(promo)
    }

    async fn select_all(&self) -> Result<Vec<Promo>, promo::Error> {
        Ok(self.promos.lock()?.clone())
    }

    async fn update_one_by_filter(
        &self,
        filter: PromoFilter,
        definition: PromoDefinition,
    ) -> Result<(), promo::Error> {
        if let Some(promo) = self
            .promos
            .lock()?
            .iter_mut()
            .find(|promo| filter.matches(promo))
        {
            promo.definition = definition;
        }

        Ok(())
    }

    async fn delete_one_by_filter(&self, filter: PromoFilter) -> Result<(), promo::Error> {
        let mut promos = self.promos.lock()?;
        if let Some(index) = promos.iter().position(|promo| filter.matches(promo)) {
            promos.remove(index);
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl MemberStore for MemoryDatabase {
    async fn select_one_by_filter(
        &self,
        filter: MemberFilter,
    ) -> Result<Option<Member>, member::Error> {
        let member = self
            .members
            .lock()?
            .iter()
            .find(|member| filter.matches(member))
            .cloned();

        Ok(member)
    }
}

#[async_trait::async_trait]
impl EnrollmentStore for MemoryDatabase {
    async fn exists_by_filter(&self, filter: EnrollmentFilter) -> Result<bool, enrollment::Error> {
        Ok(self
            .enrollments
            .lock()?
            .iter()
            .any(|request| filter.matches(request)))
    }

    async fn insert_one(
        &self,
        request: EnrollmentRequest,
    ) -> Result<EnrollmentRequest, enrollment::Error> {
        let mut enrollments = self.enrollments.lock()?;

        // Unique (member, promo) index, checked under the same lock as the insert
        let pair = EnrollmentFilter::MemberAndPromo {
            member: request.member,
            promo: request.promo,
        };
        if enrollments.iter().any(|stored| pair.matches(stored)) {
            return Err(enrollment::Error::AlreadyEnrolled {
                member: request.member,
                promo: request.promo,
            });
        }

        enrollments.push(request.clone());
        Ok(request)
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for promo::Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}

impl<T> From<PoisonError<T>> for member::Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}

impl<T> From<PoisonError<T>> for enrollment::Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
