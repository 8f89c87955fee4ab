use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// Text inputs of the quote form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ProjectType,
    Name,
    Email,
    Company,
    Phone,
    Budget,
    Timeline,
    Description,
    HasDesign,
    NeedsHosting,
    AdditionalInfo,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::ProjectType => "project_type",
            Field::Name => "name",
            Field::Email => "email",
            Field::Company => "company",
            Field::Phone => "phone",
            Field::Budget => "budget",
            Field::Timeline => "timeline",
            Field::Description => "description",
            Field::HasDesign => "has_design",
            Field::NeedsHosting => "needs_hosting",
            Field::AdditionalInfo => "additional_info",
        }
    }

    /// Wizard step whose form holds this field.
    pub fn step(&self) -> u8 {
        match self {
            Field::ProjectType => 1,
            Field::Name | Field::Email | Field::Company | Field::Phone => 2,
            Field::Budget | Field::Timeline | Field::Description => 3,
            Field::HasDesign | Field::NeedsHosting | Field::AdditionalInfo => 4,
        }
    }
}

/// Step holding the feature selection.
pub const FEATURES_STEP: u8 = 3;
/// Step holding the attachment.
pub const ATTACHMENT_STEP: u8 = 4;

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the single file a visitor may attach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub path: PathBuf,
}

impl Attachment {
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self {
            file_name,
            path: path.to_path_buf(),
        })
    }
}

/// Everything typed into the form so far, valid or not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteDraft {
    pub project_type: String,
    pub name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub budget: String,
    pub timeline: String,
    pub description: String,
    pub has_design: String,
    pub needs_hosting: String,
    pub additional_info: String,
    features: Vec<String>,
    file: Option<Attachment>,
}

impl QuoteDraft {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::ProjectType => &self.project_type,
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Company => &self.company,
            Field::Phone => &self.phone,
            Field::Budget => &self.budget,
            Field::Timeline => &self.timeline,
            Field::Description => &self.description,
            Field::HasDesign => &self.has_design,
            Field::NeedsHosting => &self.needs_hosting,
            Field::AdditionalInfo => &self.additional_info,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::ProjectType => &mut self.project_type,
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Company => &mut self.company,
            Field::Phone => &mut self.phone,
            Field::Budget => &mut self.budget,
            Field::Timeline => &mut self.timeline,
            Field::Description => &mut self.description,
            Field::HasDesign => &mut self.has_design,
            Field::NeedsHosting => &mut self.needs_hosting,
            Field::AdditionalInfo => &mut self.additional_info,
        };
        *slot = value.into();
    }

    /// Fields from `required` that are still empty.
    pub fn missing(&self, required: &[Field]) -> Vec<Field> {
        required
            .iter()
            .copied()
            .filter(|f| self.get(*f).is_empty())
            .collect()
    }

    /// Selected features, in selection order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Adds `feature` if absent, removes it if present. Returns whether it is
    /// selected afterwards.
    pub fn toggle_feature(&mut self, feature: &str) -> bool {
        if let Some(pos) = self.features.iter().position(|f| f == feature) {
            self.features.remove(pos);
            false
        } else {
            self.features.push(feature.to_string());
            true
        }
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.file.as_ref()
    }

    /// Replaces any previous attachment.
    pub fn attach(&mut self, file: Attachment) {
        self.file = Some(file);
    }

    pub fn detach(&mut self) -> Option<Attachment> {
        self.file.take()
    }
}
