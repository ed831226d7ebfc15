//! Contact form schema: trims every field, collects all violations, and
//! either yields a normalized record or a per-field error map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

pub const NAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 255;
pub const COMPANY_MAX_CHARS: usize = 100;
pub const MESSAGE_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Name,
    Email,
    Company,
    Message,
}

impl ContactField {
    pub const ALL: [ContactField; 4] = [
        ContactField::Name,
        ContactField::Email,
        ContactField::Company,
        ContactField::Message,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::Email => "email",
            ContactField::Company => "company",
            ContactField::Message => "message",
        }
    }
}

impl std::str::FromStr for ContactField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ContactField::Name),
            "email" => Ok(ContactField::Email),
            "company" => Ok(ContactField::Company),
            "message" => Ok(ContactField::Message),
            other => Err(format!("unknown contact field '{other}'")),
        }
    }
}

pub type FieldErrors = BTreeMap<ContactField, String>;

/// Raw form input as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    pub fn field(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
            ContactField::Company => self.company.as_deref().unwrap_or_default(),
            ContactField::Message => &self.message,
        }
    }

    pub fn set_field(&mut self, field: ContactField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ContactField::Name => self.name = value,
            ContactField::Email => self.email = value,
            ContactField::Company => self.company = Some(value),
            ContactField::Message => self.message = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        ContactField::ALL
            .iter()
            .all(|field| self.field(*field).is_empty())
    }
}

/// A submission that passed [`validate_contact`]. Also the JSON body of the
/// store insert and of the notification function call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    pub message: String,
}

impl From<NormalizedSubmission> for ContactForm {
    fn from(value: NormalizedSubmission) -> Self {
        Self {
            name: value.name,
            email: value.email,
            company: value.company,
            message: value.message,
        }
    }
}

pub fn validate_contact(form: &ContactForm) -> Result<NormalizedSubmission, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = form.name.trim();
    if name.is_empty() {
        errors.insert(ContactField::Name, "Name is required".to_string());
    } else if exceeds(name, NAME_MAX_CHARS) {
        errors.insert(ContactField::Name, too_long("Name", NAME_MAX_CHARS));
    }

    let email = form.email.trim();
    if email.is_empty() || !email.validate_email() {
        errors.insert(ContactField::Email, "Invalid email address".to_string());
    } else if exceeds(email, EMAIL_MAX_CHARS) {
        errors.insert(ContactField::Email, too_long("Email", EMAIL_MAX_CHARS));
    }

    let company = form
        .company
        .as_deref()
        .map(str::trim)
        .filter(|company| !company.is_empty());
    if let Some(company) = company {
        if exceeds(company, COMPANY_MAX_CHARS) {
            errors.insert(ContactField::Company, too_long("Company", COMPANY_MAX_CHARS));
        }
    }

    let message = form.message.trim();
    if message.is_empty() {
        errors.insert(ContactField::Message, "Message is required".to_string());
    } else if exceeds(message, MESSAGE_MAX_CHARS) {
        errors.insert(ContactField::Message, too_long("Message", MESSAGE_MAX_CHARS));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NormalizedSubmission {
        name: name.to_string(),
        email: email.to_string(),
        company: company.map(str::to_string),
        message: message.to_string(),
    })
}

fn exceeds(value: &str, max_chars: usize) -> bool {
    value.chars().count() > max_chars
}

fn too_long(label: &str, max_chars: usize) -> String {
    format!("{label} must be at most {max_chars} characters")
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
