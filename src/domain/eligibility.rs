//! Enrollment eligibility rules
//!
//! [`decide`] is a pure function: the caller fetches the promo, the member and the existing
//! enrollment state beforehand and persists the enrollment afterwards.

use super::{promo::is_set, Member, MemberField, Promo, PromoStatus, Template};

#[derive(Debug, PartialEq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

/// Reason for refusing an enrollment
///
/// The messages are surfaced verbatim to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("Promo not found")]
    PromoNotFound,
    #[error("Promo is not active")]
    NotActive,
    #[error("You are already enrolled in this promo")]
    AlreadyEnrolled,
    #[error("Minimum balance not set in the promo")]
    MinimumBalanceNotSet,
    #[error("You don't have enough balance to enroll in this promo")]
    InsufficientBalance,
    #[error("Required member field {0} is missing")]
    MissingMemberField(MemberField),
}

/// Decide whether `member` may enroll in `promo`
///
/// Checks run in a fixed order and the first failing one is reported.
pub fn decide(promo: Option<&Promo>, member: &Member, already_enrolled: bool) -> Decision {
    match check(promo, member, already_enrolled) {
        Ok(()) => Decision::Allow,
        Err(denial) => Decision::Deny(denial),
    }
}

fn check(promo: Option<&Promo>, member: &Member, already_enrolled: bool) -> Result<(), Denial> {
    let promo = promo.ok_or(Denial::PromoNotFound)?;

    if promo.status() != PromoStatus::Active {
        return Err(Denial::NotActive);
    }

    if already_enrolled {
        return Err(Denial::AlreadyEnrolled);
    }

    match &promo.definition.template {
        Template::Deposit { minimum_balance } => {
            if !is_set(*minimum_balance) {
                return Err(Denial::MinimumBalanceNotSet);
            }

            // A member without a balance never has enough
            match member.balance {
                Some(balance) if balance >= *minimum_balance => Ok(()),
                _ => Err(Denial::InsufficientBalance),
            }
        }
        Template::SignUp {
            required_member_fields,
        } => match required_member_fields
            .iter()
            .find(|field| !member.has_field(**field))
        {
            Some(field) => Err(Denial::MissingMemberField(*field)),
            None => Ok(()),
        },
    }
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}
