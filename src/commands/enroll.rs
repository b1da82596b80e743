use std::task::{Context, Poll};

use serde::Deserialize;
use tower::Service;
use tracing::{info, info_span, Instrument};
use crate::{
    domain::{
        eligibility::{decide, Decision, Denial},
        promo::ValidationError,
        EnrollmentRequest,
    },
    ports::{
        enrollment::{EnrollmentFilter, EnrollmentStore},
        member::{MemberFilter, MemberStore},
        promo::{PromoFilter, PromoStore},
    },
};

use super::{
    log_failure, null_as_default, parse_id, CommandFuture, EnrollmentLogic, Error, Source,
};

/// Enroll the member `id` in a promo
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EnrollToPromoRequest {
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub info: EnrollToPromoInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Source,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EnrollToPromoInfo {
    pub promo: Option<String>,
}

impl<P, M, E> Service<EnrollToPromoRequest> for EnrollmentLogic<P, M, E>
where
    P: PromoStore + Send + Sync + 'static,
    M: MemberStore + Send + Sync + 'static,
    E: EnrollmentStore + Send + Sync + 'static,
{
    type Response = EnrollmentRequest;
    type Error = Error;
    type Future = CommandFuture<EnrollmentRequest>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: EnrollToPromoRequest) -> Self::Future {
        let logic = self.clone();
        let span = info_span!(
            "enroll_to_promo",
            member_id = ?req.id,
            promo_id = ?req.info.promo,
            source = ?req.source,
        );
        Box::pin(
            async move {
                logic
                    .enroll(req.id.as_deref(), req.info.promo.as_deref())
                    .await
                    .inspect_err(log_failure)
            }
            .instrument(span),
        )
    }
}

impl<P, M, E> EnrollmentLogic<P, M, E>
where
    P: PromoStore,
    M: MemberStore,
    E: EnrollmentStore,
{
    async fn enroll(
        &self,
        member_id: Option<&str>,
        promo_id: Option<&str>,
    ) -> Result<EnrollmentRequest, Error> {
        if member_id.map_or(true, |id| id.trim().is_empty()) {
            return Err(ValidationError::MissingInformation("id").into());
        }
        let promo_id = parse_id(promo_id, "promo ID", "Promo")?;

        // A missing promo is reported before the member is looked up
        let promo = self
            .promos
            .select_one_by_filter(PromoFilter::Id(promo_id))
            .await?
            .ok_or(Denial::PromoNotFound)?;

        let member_id = parse_id(member_id, "id", "Member")?;
        let member = self
            .members
            .select_one_by_filter(MemberFilter::Id(member_id))
            .await?
            .ok_or(Error::NotFound("Member"))?;
        let already_enrolled = self
            .enrollments
            .exists_by_filter(EnrollmentFilter::MemberAndPromo {
                member: member.id,
                promo: promo.id,
            })
            .await?;

        if let Decision::Deny(denial) = decide(Some(&promo), &member, already_enrolled) {
            return Err(denial.into());
        }

        // The store may still refuse a duplicate that raced past the check above
        let request = self
            .enrollments
            .insert_one(EnrollmentRequest::new(member.id, promo.id))
            .await?;
        info!(enrollment_id = %request.id, "member enrolled");

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::database::memory::MemoryDatabase,
        commands::ErrorKind,
        domain::{
            EnrollmentStatus, Member, MemberField, Promo, PromoDefinition, PromoStatus, Template,
        },
        ports::{
            enrollment::{self, MockEnrollmentStore},
            member::MockMemberStore,
            promo::MockPromoStore,
        },
    };
    use mockall::predicate::*;
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::{BoxError, ServiceExt};
    use uuid::Uuid;

    fn promo(template: Template, status: PromoStatus) -> Promo {
        Promo {
            id: Uuid::new_v4(),
            definition: PromoDefinition {
                name: "promo".to_string(),
                title: "Promo".to_string(),
                description: "A promo".to_string(),
                template,
                status,
                submitted: None,
                enabled: None,
            },
        }
    }

    fn deposit() -> Promo {
        promo(
            Template::Deposit {
                minimum_balance: 25.0,
            },
            PromoStatus::Active,
        )
    }

    #[fixture]
    fn member() -> Member {
        Member {
            id: Uuid::new_v4(),
            username: "jdoe".to_string(),
            real_name: Some("Jane Doe".to_string()),
            email: Some("jane@example.com".to_string()),
            bank_account: Some("0011-2233".to_string()),
            balance: Some(26.0),
        }
    }

    fn request(member: Uuid, promo: Uuid) -> EnrollToPromoRequest {
        EnrollToPromoRequest {
            id: Some(member.to_string()),
            info: EnrollToPromoInfo {
                promo: Some(promo.to_string()),
            },
            ..Default::default()
        }
    }

    fn promo_store(promo: Option<Promo>) -> MockPromoStore {
        let mut promos = MockPromoStore::new();
        promos
            .expect_select_one_by_filter()
            .times(1)
            .returning(move |_| Ok(promo.clone()));
        promos
    }

    fn member_store(member: Option<Member>) -> MockMemberStore {
        let mut members = MockMemberStore::new();
        members
            .expect_select_one_by_filter()
            .times(1)
            .returning(move |_| Ok(member.clone()));
        members
    }

    #[rstest]
    #[tokio::test]
    async fn test_call(member: Member) -> Result<(), BoxError> {
        // GIVEN
        // * an active deposit promo requiring a balance of 25
        // * a member with a balance of 26, not enrolled yet
        let promo = deposit();
        let (member_id, promo_id) = (member.id, promo.id);
        let mut enrollments = MockEnrollmentStore::new();
        enrollments
            .expect_exists_by_filter()
            .times(1)
            .with(eq(EnrollmentFilter::MemberAndPromo {
                member: member_id,
                promo: promo_id,
            }))
            .returning(|_| Ok(false));
        enrollments
            .expect_insert_one()
            .times(1)
            .returning(|request| Ok(request));

        let mut logic = EnrollmentLogic::new(
            Arc::new(promo_store(Some(promo))),
            Arc::new(member_store(Some(member))),
            Arc::new(enrollments),
        );

        // WHEN calling the service
        let res = logic.ready().await?.call(request(member_id, promo_id)).await;

        // THEN
        // * it returns a pending enrollment for the pair
        // * all ports are called
        assert_that!(res).is_ok().matches(|request| {
            request.member == member_id
                && request.promo == promo_id
                && request.status == EnrollmentStatus::Pending
        });
        Arc::into_inner(logic.enrollments).unwrap().checkpoint();

        Ok(())
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[tokio::test]
    async fn test_missing_promo_id(member: Member, #[case] promo: Option<&str>) {
        let logic = EnrollmentLogic::new(
            Arc::new(MockPromoStore::new()),
            Arc::new(MockMemberStore::new()),
            Arc::new(MockEnrollmentStore::new()),
        );

        let res = logic
            .oneshot(EnrollToPromoRequest {
                id: Some(member.id.to_string()),
                info: EnrollToPromoInfo {
                    promo: promo.map(str::to_string),
                },
                ..Default::default()
            })
            .await;

        assert_that!(res).is_err().matches(|err| {
            err.kind() == ErrorKind::MissingInformation && err.to_string() == "Please input promo ID"
        });
    }

    #[tokio::test]
    async fn test_malformed_promo_id() {
        let logic = EnrollmentLogic::new(
            Arc::new(MockPromoStore::new()),
            Arc::new(MockMemberStore::new()),
            Arc::new(MockEnrollmentStore::new()),
        );

        let res = logic
            .oneshot(EnrollToPromoRequest {
                id: Some(Uuid::new_v4().to_string()),
                info: EnrollToPromoInfo {
                    promo: Some("abc".to_string()),
                },
                ..Default::default()
            })
            .await;

        assert_that!(res).is_err().matches(|err| {
            err.kind() == ErrorKind::NotFound && err.to_string() == "Promo not found"
        });
    }

    #[tokio::test]
    async fn test_unknown_promo_and_member() {
        // GIVEN neither the promo nor the member exist
        let mut members = MockMemberStore::new();
        members.expect_select_one_by_filter().never();
        let mut enrollments = MockEnrollmentStore::new();
        enrollments.expect_insert_one().never();
        let logic = EnrollmentLogic::new(
            Arc::new(promo_store(None)),
            Arc::new(members),
            Arc::new(enrollments),
        );

        // WHEN enrolling
        let res = logic.oneshot(request(Uuid::new_v4(), Uuid::new_v4())).await;

        // THEN the missing promo is reported first
        assert_that!(res).is_err().matches(|err| {
            err.kind() == ErrorKind::NotFound && err.to_string() == "Promo not found"
        });
    }

    #[tokio::test]
    async fn test_malformed_member_id() {
        let promo = deposit();
        let promo_id = promo.id;
        let logic = EnrollmentLogic::new(
            Arc::new(promo_store(Some(promo))),
            Arc::new(MockMemberStore::new()),
            Arc::new(MockEnrollmentStore::new()),
        );

        let res = logic
            .oneshot(EnrollToPromoRequest {
                id: Some("jdoe".to_string()),
                info: EnrollToPromoInfo {
                    promo: Some(promo_id.to_string()),
                },
                ..Default::default()
            })
            .await;

        assert_that!(res)
            .is_err()
            .matches(|err| err.to_string() == "Member not found");
    }

    #[tokio::test]
    async fn test_unknown_member() {
        let promo = deposit();
        let promo_id = promo.id;
        let logic = EnrollmentLogic::new(
            Arc::new(promo_store(Some(promo))),
            Arc::new(member_store(None)),
            Arc::new(MockEnrollmentStore::new()),
        );

        let res = logic.oneshot(request(Uuid::new_v4(), promo_id)).await;

        assert_that!(res)
            .is_err()
            .matches(|err| err.to_string() == "Member not found");
    }

    #[rstest]
    #[case(Some(24.0), "You don't have enough balance to enroll in this promo")]
    #[case(None, "You don't have enough balance to enroll in this promo")]
    #[tokio::test]
    async fn test_denied_is_not_persisted(
        mut member: Member,
        #[case] balance: Option<f64>,
        #[case] message: &str,
    ) {
        member.balance = balance;
        let promo = deposit();
        let (member_id, promo_id) = (member.id, promo.id);
        let mut enrollments = MockEnrollmentStore::new();
        enrollments.expect_exists_by_filter().returning(|_| Ok(false));
        enrollments.expect_insert_one().never();
        let logic = EnrollmentLogic::new(
            Arc::new(promo_store(Some(promo))),
            Arc::new(member_store(Some(member))),
            Arc::new(enrollments),
        );

        let res = logic.oneshot(request(member_id, promo_id)).await;

        assert_that!(res).is_err().matches(|err| {
            err.kind() == ErrorKind::BusinessRule && err.to_string() == message
        });
    }

    #[rstest]
    #[tokio::test]
    async fn test_store_rejects_duplicate(member: Member) {
        // GIVEN an enrollment store whose unique index trips after the read-side check passed
        let promo = deposit();
        let (member_id, promo_id) = (member.id, promo.id);
        let mut enrollments = MockEnrollmentStore::new();
        enrollments.expect_exists_by_filter().returning(|_| Ok(false));
        enrollments.expect_insert_one().returning(|request| {
            Err(enrollment::Error::AlreadyEnrolled {
                member: request.member,
                promo: request.promo,
            })
        });
        let logic = EnrollmentLogic::new(
            Arc::new(promo_store(Some(promo))),
            Arc::new(member_store(Some(member))),
            Arc::new(enrollments),
        );

        let res = logic.oneshot(request(member_id, promo_id)).await;

        assert_that!(res)
            .is_err()
            .matches(|err| err.to_string() == "You are already enrolled in this promo");
    }

    #[rstest]
    #[tokio::test]
    async fn test_sign_up_missing_field(mut member: Member) -> Result<(), BoxError> {
        member.real_name = None;
        let database = MemoryDatabase::with_members([member.clone()]);
        let promo = PromoStore::insert_one(
            &database,
            promo(
                Template::SignUp {
                    required_member_fields: vec![
                        MemberField::BankAccount,
                        MemberField::Email,
                        MemberField::RealName,
                    ],
                },
                PromoStatus::Active,
            )
            .definition,
        )
        .await?;
        let database = Arc::new(database);
        let logic = EnrollmentLogic::new(database.clone(), database.clone(), database.clone());

        let res = logic.oneshot(request(member.id, promo.id)).await;

        assert_that!(res)
            .is_err()
            .matches(|err| err.to_string() == "Required member field REAL_NAME is missing");

        Ok(())
    }
}
