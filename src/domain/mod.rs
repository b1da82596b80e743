use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod eligibility;
pub mod promo;

/// A stored promo
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Promo {
    /// Store-assigned identifier
    pub id: Uuid,
    #[serde(flatten)]
    pub definition: PromoDefinition,
}

impl Promo {
    pub fn status(&self) -> PromoStatus {
        self.definition.status
    }
}

/// Canonical, validated promo fields
///
/// This is what `promo::validate_and_normalize` produces and what the stores persist alongside
/// an identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoDefinition {
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(flatten)]
    pub template: Template,
    pub status: PromoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Reward template of a promo
///
/// Each variant carries exactly the fields that are legal for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "template", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Template {
    /// Members must have filled in some of their profile fields
    #[serde(rename_all = "camelCase")]
    SignUp {
        /// Fields checked in declaration order during enrollment
        required_member_fields: Vec<MemberField>,
    },
    /// Members must hold at least some balance
    #[serde(rename_all = "camelCase")]
    Deposit { minimum_balance: f64 },
}

impl Template {
    pub fn kind(&self) -> TemplateKind {
        match self {
            Template::SignUp { .. } => TemplateKind::SignUp,
            Template::Deposit { .. } => TemplateKind::Deposit,
        }
    }
}

/// Template tag without its payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateKind {
    SignUp,
    Deposit,
}

impl TemplateKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SIGN_UP" => Some(TemplateKind::SignUp),
            "DEPOSIT" => Some(TemplateKind::Deposit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::SignUp => "SIGN_UP",
            TemplateKind::Deposit => "DEPOSIT",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromoStatus {
    #[default]
    Draft,
    Active,
    Inactive,
}

impl PromoStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DRAFT" => Some(PromoStatus::Draft),
            "ACTIVE" => Some(PromoStatus::Active),
            "INACTIVE" => Some(PromoStatus::Inactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromoStatus::Draft => "DRAFT",
            PromoStatus::Active => "ACTIVE",
            PromoStatus::Inactive => "INACTIVE",
        }
    }
}

/// Member attributes a sign up promo can require
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberField {
    BankAccount,
    Email,
    RealName,
}

impl MemberField {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BANK_ACCOUNT" => Some(MemberField::BankAccount),
            "EMAIL" => Some(MemberField::Email),
            "REAL_NAME" => Some(MemberField::RealName),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberField::BankAccount => "BANK_ACCOUNT",
            MemberField::Email => "EMAIL",
            MemberField::RealName => "REAL_NAME",
        }
    }
}

impl fmt::Display for MemberField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member, as read from the member store
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bank_account: Option<String>,
    /// Externally maintained balance
    ///
    /// This service never computes it, it only compares against it.
    #[serde(default)]
    pub balance: Option<f64>,
}

impl Member {
    /// Whether the attribute behind `field` is filled in
    pub fn has_field(&self, field: MemberField) -> bool {
        let value = match field {
            MemberField::BankAccount => &self.bank_account,
            MemberField::Email => &self.email,
            MemberField::RealName => &self.real_name,
        };

        value.as_deref().is_some_and(|value| !value.is_empty())
    }
}

/// Persisted record of one enrollment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRequest {
    pub id: Uuid,
    pub member: Uuid,
    pub promo: Uuid,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
}

impl EnrollmentRequest {
    pub fn new(member: Uuid, promo: Uuid) -> Self {
        Self::with_status(member, promo, EnrollmentStatus::default())
    }

    pub fn with_status(member: Uuid, promo: Uuid, status: EnrollmentStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            member,
            promo,
            status,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[default]
    Pending,
    Approved,
}
