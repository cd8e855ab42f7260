pub mod sanitize;
pub mod sender;
pub mod verify;

use crate::model::{LeadField, SubmitError, ValidationError, Vertical};
use chrono::{DateTime, Utc};
use sanitize::{MAX_TEXT_LEN, sanitize_email, sanitize_org_number, sanitize_phone, sanitize_text};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use sender::RestLeadSink;
pub use verify::UrlVerifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserType {
    #[default]
    #[serde(rename = "privat")]
    Private,
    #[serde(rename = "bedrift")]
    Business,
}

/// Contact request as typed by the visitor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadForm {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
    /// Vertical slug or free-text service description.
    pub service: String,
    #[serde(default)]
    pub current_provider: Option<String>,
    #[serde(default)]
    pub consent: bool,
    #[serde(default)]
    pub org_number: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub employees: Option<String>,
}

/// Business details; only sent for business users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessDetails {
    #[serde(rename = "organisasjonsnummer")]
    pub org_number: Option<String>,
    #[serde(rename = "bransje")]
    pub industry: Option<String>,
    #[serde(rename = "antall_ansatte")]
    pub employees: Option<String>,
}

/// A sanitized lead, serialized with the column names of the leads table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lead {
    #[serde(rename = "navn")]
    pub name: String,
    #[serde(rename = "telefon")]
    pub phone: String,
    #[serde(rename = "epost")]
    pub email: Option<String>,
    #[serde(rename = "brukertype")]
    pub user_type: UserType,
    #[serde(rename = "tjeneste")]
    pub service: String,
    #[serde(rename = "leverandor")]
    pub current_provider: Option<String>,
    #[serde(rename = "samtykke")]
    pub consent: bool,
    #[serde(flatten)]
    pub business: Option<BusinessDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadReceipt {
    pub submitted_at: DateTime<Utc>,
}

/// Handyman and cleaning requests have no current provider to switch from.
/// The service arrives as a page slug or as the form's label.
fn needs_current_provider(service: &str) -> bool {
    let service = service.trim().to_lowercase();
    if matches!(service.as_str(), "håndverkere" | "renhold") {
        return false;
    }
    !matches!(
        Vertical::from_slug(&service),
        Some(Vertical::Handyman) | Some(Vertical::Cleaning)
    )
}

fn optional_text(input: Option<&str>) -> Option<String> {
    input
        .map(|s| sanitize_text(s, MAX_TEXT_LEN))
        .filter(|s| !s.is_empty())
}

impl LeadForm {
    /// Sanitizes every field. The first invalid field is reported.
    pub fn validate(&self) -> Result<Lead, ValidationError> {
        let name = sanitize_text(&self.name, MAX_TEXT_LEN);
        if name.chars().count() < 2 {
            return Err(ValidationError::new(LeadField::Name, "Navn må være minst 2 tegn"));
        }

        let phone = sanitize_phone(&self.phone)
            .ok_or_else(|| ValidationError::new(LeadField::Phone, "Ugyldig telefonnummer format"))?;

        let email = match self.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            Some(raw) => Some(sanitize_email(raw).ok_or_else(|| {
                ValidationError::new(LeadField::Email, "Ugyldig e-post format")
            })?),
            None => None,
        };

        let service = sanitize_text(&self.service, MAX_TEXT_LEN);
        if service.is_empty() {
            return Err(ValidationError::new(LeadField::Service, "Velg en tjeneste"));
        }

        let current_provider = optional_text(self.current_provider.as_deref());
        if current_provider.is_none() && needs_current_provider(&service) {
            return Err(ValidationError::new(LeadField::Provider, "Velg nåværende leverandør"));
        }

        if !self.consent {
            return Err(ValidationError::new(LeadField::Consent, "Samtykke er påkrevd"));
        }

        let business = match self.user_type {
            UserType::Private => None,
            UserType::Business => {
                let raw_org_number = self.org_number.as_deref().map(str::trim);
                let org_number = match raw_org_number.filter(|o| !o.is_empty()) {
                    Some(raw) => Some(sanitize_org_number(raw).ok_or_else(|| {
                        ValidationError::new(
                            LeadField::OrgNumber,
                            "Ugyldig organisasjonsnummer format",
                        )
                    })?),
                    None => None,
                };
                Some(BusinessDetails {
                    org_number,
                    industry: optional_text(self.industry.as_deref()),
                    employees: optional_text(self.employees.as_deref()),
                })
            }
        };

        Ok(Lead {
            name,
            phone,
            email,
            user_type: self.user_type,
            service,
            current_provider,
            consent: self.consent,
            business,
        })
    }
}

/// Persists leads. Implemented over HTTP by [`RestLeadSink`].
#[async_trait::async_trait]
pub trait LeadSink: Send + Sync {
    async fn submit(&self, lead: &Lead) -> Result<LeadReceipt, SubmitError>;
}

/// Validates `form` and hands the lead to `sink`. Nothing is sent when a
/// field is invalid.
pub async fn submit_form(sink: &dyn LeadSink, form: &LeadForm) -> Result<LeadReceipt, SubmitError> {
    let lead = form.validate()?;
    let receipt = sink.submit(&lead).await?;
    info!("Lead for {} submitted at {}", lead.service, receipt.submitted_at);
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> LeadForm {
        LeadForm {
            name: "Kari Nordmann".into(),
            phone: "912 34 567".into(),
            email: Some("Kari@Example.no".into()),
            service: "strom".into(),
            current_provider: Some("Fjordkraft".into()),
            consent: true,
            ..LeadForm::default()
        }
    }

    #[test]
    fn private_lead_serializes_with_norwegian_columns() {
        let lead = form().validate().unwrap();
        let value = serde_json::to_value(&lead).unwrap();
        assert_eq!(
            value,
            json!({
                "navn": "Kari Nordmann",
                "telefon": "912 34 567",
                "epost": "kari@example.no",
                "brukertype": "privat",
                "tjeneste": "strom",
                "leverandor": "Fjordkraft",
                "samtykke": true
            })
        );
    }

    #[test]
    fn business_fields_only_for_business_users() {
        let mut private = form();
        private.org_number = Some("923456789".into());
        assert!(private.validate().unwrap().business.is_none());

        let mut business = form();
        business.user_type = UserType::Business;
        business.org_number = Some("923 456 789".into());
        business.employees = Some("10-49".into());
        let value = serde_json::to_value(business.validate().unwrap()).unwrap();
        assert_eq!(value["organisasjonsnummer"], "923456789");
        assert_eq!(value["antall_ansatte"], "10-49");
        assert_eq!(value["bransje"], serde_json::Value::Null);
        assert_eq!(value["brukertype"], "bedrift");
    }

    #[test]
    fn field_errors() {
        let field = |f: LeadForm| f.validate().unwrap_err().field;

        assert_eq!(field(LeadForm { name: " K ".into(), ..form() }), LeadField::Name);
        assert_eq!(field(LeadForm { phone: "12".into(), ..form() }), LeadField::Phone);
        assert_eq!(field(LeadForm { email: Some("nope".into()), ..form() }), LeadField::Email);
        assert_eq!(field(LeadForm { service: " ".into(), ..form() }), LeadField::Service);
        assert_eq!(field(LeadForm { current_provider: None, ..form() }), LeadField::Provider);
        assert_eq!(field(LeadForm { consent: false, ..form() }), LeadField::Consent);
        assert_eq!(
            field(LeadForm {
                user_type: UserType::Business,
                org_number: Some("123".into()),
                ..form()
            }),
            LeadField::OrgNumber
        );
    }

    #[test]
    fn services_without_provider() {
        let handyman = LeadForm {
            service: "handverkere".into(),
            current_provider: None,
            email: None,
            ..form()
        };
        let lead = handyman.validate().unwrap();
        assert_eq!(lead.current_provider, None);
        assert_eq!(lead.email, None);
    }

    #[test]
    fn service_labels_without_provider() {
        for service in ["Håndverkere", "RENHOLD", " renhold "] {
            let form = LeadForm {
                service: service.into(),
                current_provider: None,
                ..form()
            };
            assert!(form.validate().is_ok(), "{}", service);
        }
        let mobile = LeadForm {
            service: "Mobil".into(),
            current_provider: None,
            ..form()
        };
        assert_eq!(mobile.validate().unwrap_err().field, LeadField::Provider);
    }
}
