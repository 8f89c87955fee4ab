use std::fmt;

use serde::{Deserialize, Serialize};

use crate::quote::QuoteRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Invalid lead ({}): {}", .0.len(), join_errors(.0))]
    Invalid(Vec<FieldError>),
}

impl CaptureError {
    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            CaptureError::Invalid(errors) => errors.iter().map(|e| e.field).collect(),
        }
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Loose structural email check: one `@`, non-empty local part, dotted
/// domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

/// The standalone project-capture form. Stricter than the quote wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCapture {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub project_title: String,
    pub project_type: String,
    pub project_description: String,
    pub features: Vec<String>,
    pub platforms: Vec<String>,
    pub budget: String,
    pub timeline: String,
    pub has_existing_brand: String,
    pub additional_info: Option<String>,
    pub preferred_contact: String,
}

impl ProjectCapture {
    pub const MIN_NAME: usize = 2;
    pub const MIN_PHONE_DIGITS: usize = 10;
    pub const MIN_TITLE: usize = 3;
    pub const MIN_DESCRIPTION: usize = 50;

    /// Reports every invalid field, not just the first.
    pub fn validate(&self) -> Result<(), CaptureError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &'static str, message: &'static str| {
            if !ok {
                errors.push(FieldError { field, message });
            }
        };

        check(
            self.name.chars().count() >= Self::MIN_NAME,
            "name",
            "must have at least 2 characters",
        );
        check(is_valid_email(&self.email), "email", "invalid email");
        check(
            self.phone.chars().filter(char::is_ascii_digit).count() >= Self::MIN_PHONE_DIGITS,
            "phone",
            "must have at least 10 digits",
        );
        check(
            self.project_title.chars().count() >= Self::MIN_TITLE,
            "project_title",
            "must have at least 3 characters",
        );
        check(
            !self.project_type.is_empty(),
            "project_type",
            "select a project type",
        );
        check(
            self.project_description.chars().count() >= Self::MIN_DESCRIPTION,
            "project_description",
            "must have at least 50 characters",
        );
        check(
            !self.features.is_empty(),
            "features",
            "select at least one feature",
        );
        check(
            !self.platforms.is_empty(),
            "platforms",
            "select at least one platform",
        );
        check(!self.budget.is_empty(), "budget", "select a budget range");
        check(!self.timeline.is_empty(), "timeline", "select a timeline");
        check(
            !self.has_existing_brand.is_empty(),
            "has_existing_brand",
            "tell us whether a visual identity exists",
        );
        check(
            !self.preferred_contact.is_empty(),
            "preferred_contact",
            "select a preferred contact channel",
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CaptureError::Invalid(errors))
        }
    }

    pub fn into_lead(self, user_agent: &str) -> Result<LeadRecord, CaptureError> {
        self.validate()?;
        Ok(LeadRecord {
            name: self.name,
            email: self.email,
            phone: self.phone,
            company: self.company.filter(|c| !c.is_empty()),
            project_title: self.project_title,
            project_type: self.project_type,
            project_description: self.project_description,
            features: self.features,
            platforms: self.platforms,
            budget: self.budget,
            timeline: self.timeline,
            has_existing_brand: self.has_existing_brand,
            additional_info: self.additional_info.filter(|i| !i.is_empty()),
            preferred_contact: self.preferred_contact,
            ip_address: None,
            user_agent: user_agent.to_string(),
        })
    }
}

/// Row inserted into the `project_leads` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub project_title: String,
    pub project_type: String,
    pub project_description: String,
    pub features: Vec<String>,
    pub platforms: Vec<String>,
    pub budget: String,
    pub timeline: String,
    pub has_existing_brand: String,
    pub additional_info: Option<String>,
    pub preferred_contact: String,
    pub ip_address: Option<String>,
    pub user_agent: String,
}

impl LeadRecord {
    /// Maps a wizard request onto the shared lead row. Wizard-only answers
    /// are folded into `additional_info`.
    pub fn from_quote(request: &QuoteRequest, user_agent: &str) -> Self {
        let mut notes = Vec::new();
        if !request.needs_hosting.is_empty() {
            notes.push(format!("Needs hosting: {}", request.needs_hosting));
        }
        if let Some(file) = &request.attachment {
            notes.push(format!("Attachment: {}", file.file_name));
        }
        if !request.additional_info.is_empty() {
            notes.push(request.additional_info.clone());
        }

        let contact = &request.contact;
        Self {
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            company: Some(contact.company.clone()).filter(|c| !c.is_empty()),
            project_title: format!("Quote: {}", request.project.project_type),
            project_type: request.project.project_type.clone(),
            project_description: request.requirements.description.clone(),
            features: request.requirements.features.clone(),
            platforms: Vec::new(),
            budget: request.requirements.budget.clone(),
            timeline: request.requirements.timeline.clone(),
            has_existing_brand: request.has_design.clone(),
            additional_info: if notes.is_empty() {
                None
            } else {
                Some(notes.join("\n"))
            },
            preferred_contact: "email".to_string(),
            ip_address: None,
            user_agent: user_agent.to_string(),
        }
    }
}
