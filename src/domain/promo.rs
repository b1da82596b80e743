use serde::{Deserialize, Serialize};

use super::{MemberField, PromoDefinition, PromoStatus, Template, TemplateKind};

/// Raw promo fields, as supplied by a caller
///
/// Enumerated values are kept as strings so that unknown values can be reported back verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoInput {
    pub name: Option<String>,
    pub template: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub minimum_balance: Option<f64>,
    pub required_member_fields: Option<Vec<String>>,
    pub submitted: Option<bool>,
    pub enabled: Option<bool>,
}

impl From<&PromoDefinition> for PromoInput {
    fn from(definition: &PromoDefinition) -> Self {
        let (minimum_balance, required_member_fields) = match &definition.template {
            Template::SignUp {
                required_member_fields,
            } => (
                None,
                Some(
                    required_member_fields
                        .iter()
                        .map(|field| field.as_str().to_string())
                        .collect(),
                ),
            ),
            Template::Deposit { minimum_balance } => (Some(*minimum_balance), None),
        };

        Self {
            name: Some(definition.name.clone()),
            template: Some(definition.template.kind().as_str().to_string()),
            title: Some(definition.title.clone()),
            description: Some(definition.description.clone()),
            status: Some(definition.status.as_str().to_string()),
            minimum_balance,
            required_member_fields,
            submitted: definition.submitted,
            enabled: definition.enabled,
        }
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A mandatory field was absent or empty
    #[error("Please input {0}")]
    MissingInformation(&'static str),

    #[error("Template: {0} is invalid")]
    InvalidTemplate(String),

    /// A field was supplied that is illegal for the resolved template
    #[error("Invalid input field: {0}")]
    InvalidInputField(&'static str),

    #[error("Required member field: {0} is invalid")]
    InvalidMemberField(String),

    #[error("Status: {0} is invalid")]
    InvalidStatus(String),
}

/// Validate raw promo fields and turn them into a [`PromoDefinition`]
///
/// Checks run in a fixed order and the first failure is returned. A missing status defaults to
/// [`PromoStatus::Draft`].
pub fn validate_and_normalize(input: PromoInput) -> Result<PromoDefinition, ValidationError> {
    let name = required_text(input.name, "name")?;
    let template = required_text(input.template, "template")?;
    let title = required_text(input.title, "title")?;
    let description = required_text(input.description, "description")?;

    let kind = TemplateKind::parse(&template).ok_or(ValidationError::InvalidTemplate(template))?;

    // 0 counts as "not given" for the minimum balance
    let minimum_balance = input.minimum_balance.filter(|balance| is_set(*balance));

    let template = match kind {
        TemplateKind::SignUp => {
            if minimum_balance.is_some() {
                return Err(ValidationError::InvalidInputField(
                    "minimumBalance for sign up",
                ));
            }

            let fields = match input.required_member_fields {
                Some(fields) if !fields.is_empty() => fields,
                _ => {
                    return Err(ValidationError::MissingInformation(
                        "required member fields",
                    ))
                }
            };

            let required_member_fields = fields
                .into_iter()
                .map(|field| {
                    MemberField::parse(&field).ok_or(ValidationError::InvalidMemberField(field))
                })
                .collect::<Result<Vec<_>, _>>()?;

            Template::SignUp {
                required_member_fields,
            }
        }
        TemplateKind::Deposit => {
            if input.required_member_fields.is_some() {
                return Err(ValidationError::InvalidInputField(
                    "requiredMemberFields for deposit",
                ));
            }

            let minimum_balance =
                minimum_balance.ok_or(ValidationError::MissingInformation("minimum balance"))?;

            Template::Deposit { minimum_balance }
        }
    };

    let status = match input.status {
        None => PromoStatus::default(),
        Some(status) => PromoStatus::parse(&status).ok_or(ValidationError::InvalidStatus(status))?,
    };

    Ok(PromoDefinition {
        name,
        title,
        description,
        template,
        status,
        submitted: input.submitted,
        enabled: input.enabled,
    })
}

/// Whether a minimum balance counts as given
pub(crate) fn is_set(balance: f64) -> bool {
    balance != 0.0 && !balance.is_nan()
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ValidationError::MissingInformation(field)),
    }
}
