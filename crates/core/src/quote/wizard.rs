use serde::Serialize;

use crate::quote::{
    Attachment, Field, LeadId, QuoteDraft, QuoteSubmitter,
    draft::{ATTACHMENT_STEP, FEATURES_STEP},
};

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Step {step} is incomplete, missing: {}", join_fields(.missing))]
    Incomplete { step: u8, missing: Vec<Field> },

    #[error("Cannot {action} from step {step}")]
    WrongStep { action: &'static str, step: u8 },
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(Field::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn require(draft: &QuoteDraft, step: u8, fields: &[Field]) -> Result<(), WizardError> {
    let missing = draft.missing(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(WizardError::Incomplete { step, missing })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDetails {
    pub project_type: String,
}

impl ProjectDetails {
    pub const REQUIRED: &'static [Field] = &[Field::ProjectType];

    fn from_draft(draft: &QuoteDraft) -> Result<Self, WizardError> {
        require(draft, 1, Self::REQUIRED)?;
        Ok(Self {
            project_type: draft.project_type.clone(),
        })
    }
}

/// Email format is not checked here; see `is_valid_email` for callers that
/// want it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
}

impl ContactDetails {
    pub const REQUIRED: &'static [Field] = &[Field::Name, Field::Email];

    fn from_draft(draft: &QuoteDraft) -> Result<Self, WizardError> {
        require(draft, 2, Self::REQUIRED)?;
        Ok(Self {
            name: draft.name.clone(),
            email: draft.email.clone(),
            company: draft.company.clone(),
            phone: draft.phone.clone(),
        })
    }
}

/// Features may be empty at this step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementDetails {
    pub budget: String,
    pub timeline: String,
    pub description: String,
    pub features: Vec<String>,
}

impl RequirementDetails {
    pub const REQUIRED: &'static [Field] = &[Field::Budget, Field::Timeline, Field::Description];

    fn from_draft(draft: &QuoteDraft) -> Result<Self, WizardError> {
        require(draft, 3, Self::REQUIRED)?;
        Ok(Self {
            budget: draft.budget.clone(),
            timeline: draft.timeline.clone(),
            description: draft.description.clone(),
            features: draft.features().to_vec(),
        })
    }
}

/// Everything handed to the submission collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteRequest {
    pub project: ProjectDetails,
    pub contact: ContactDetails,
    pub requirements: RequirementDetails,
    pub has_design: String,
    pub needs_hosting: String,
    pub additional_info: String,
    pub attachment: Option<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(LeadId),
    Failed(String),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }
}

/// Each variant carries the validated data of the steps already completed.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardState {
    ProjectType,
    Contact {
        project: ProjectDetails,
    },
    Requirements {
        project: ProjectDetails,
        contact: ContactDetails,
    },
    Extras {
        project: ProjectDetails,
        contact: ContactDetails,
        requirements: RequirementDetails,
    },
    Submitted {
        request: QuoteRequest,
        outcome: SubmitOutcome,
    },
}

impl WizardState {
    pub fn step(&self) -> u8 {
        match self {
            WizardState::ProjectType => 1,
            WizardState::Contact { .. } => 2,
            WizardState::Requirements { .. } => 3,
            WizardState::Extras { .. } => 4,
            WizardState::Submitted { .. } => 5,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardState::ProjectType => "Project type",
            WizardState::Contact { .. } => "Contact",
            WizardState::Requirements { .. } => "Requirements",
            WizardState::Extras { .. } => "Extras",
            WizardState::Submitted { .. } => "Submitted",
        }
    }
}

/// Step-gated quote request form.
///
/// Fields of a completed step are read-only until the wizard goes back to
/// that step; edits to later steps' fields are kept for when they are reached.
#[derive(Debug, Clone)]
pub struct QuoteWizard {
    draft: QuoteDraft,
    state: WizardState,
}

impl Default for QuoteWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteWizard {
    pub fn new() -> Self {
        Self {
            draft: QuoteDraft::default(),
            state: WizardState::ProjectType,
        }
    }

    pub fn current_step(&self) -> u8 {
        self.state.step()
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn draft(&self) -> &QuoteDraft {
        &self.draft
    }

    /// Fails with `WrongStep` if `field` belongs to a step already completed.
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> Result<(), WizardError> {
        self.editable(field.step())?;
        self.draft.set(field, value);
        Ok(())
    }

    /// Returns whether `feature` is selected afterwards. Features are read-only
    /// past the requirements step.
    pub fn toggle_feature(&mut self, feature: &str) -> Result<bool, WizardError> {
        self.editable(FEATURES_STEP)?;
        Ok(self.draft.toggle_feature(feature))
    }

    pub fn attach(&mut self, file: Attachment) -> Result<(), WizardError> {
        self.editable(ATTACHMENT_STEP)?;
        self.draft.attach(file);
        Ok(())
    }

    pub fn detach(&mut self) -> Result<Option<Attachment>, WizardError> {
        self.editable(ATTACHMENT_STEP)?;
        Ok(self.draft.detach())
    }

    fn editable(&self, owner: u8) -> Result<(), WizardError> {
        if owner < self.current_step() {
            Err(WizardError::WrongStep {
                action: "edit a completed step",
                step: self.current_step(),
            })
        } else {
            Ok(())
        }
    }

    /// Fields the current step still needs before `next` succeeds.
    pub fn missing(&self) -> Vec<Field> {
        let required = match self.state {
            WizardState::ProjectType => ProjectDetails::REQUIRED,
            WizardState::Contact { .. } => ContactDetails::REQUIRED,
            WizardState::Requirements { .. } => RequirementDetails::REQUIRED,
            WizardState::Extras { .. } | WizardState::Submitted { .. } => return Vec::new(),
        };
        self.draft.missing(required)
    }

    /// Whether the forward control is enabled.
    pub fn can_advance(&self) -> bool {
        self.current_step() < 4 && self.missing().is_empty()
    }

    /// Validates the current step and moves forward. State is untouched on
    /// error.
    pub fn next(&mut self) -> Result<u8, WizardError> {
        let next = match &self.state {
            WizardState::ProjectType => WizardState::Contact {
                project: ProjectDetails::from_draft(&self.draft)?,
            },
            WizardState::Contact { project } => WizardState::Requirements {
                project: project.clone(),
                contact: ContactDetails::from_draft(&self.draft)?,
            },
            WizardState::Requirements { project, contact } => WizardState::Extras {
                project: project.clone(),
                contact: contact.clone(),
                requirements: RequirementDetails::from_draft(&self.draft)?,
            },
            state => {
                return Err(WizardError::WrongStep {
                    action: "advance",
                    step: state.step(),
                });
            }
        };

        self.state = next;
        Ok(self.current_step())
    }

    /// Goes back one step without validation. Draft values are kept.
    pub fn prev(&mut self) -> Result<u8, WizardError> {
        let prev = match &self.state {
            WizardState::Contact { .. } => WizardState::ProjectType,
            WizardState::Requirements { project, .. } => WizardState::Contact {
                project: project.clone(),
            },
            WizardState::Extras {
                project, contact, ..
            } => WizardState::Requirements {
                project: project.clone(),
                contact: contact.clone(),
            },
            state => {
                return Err(WizardError::WrongStep {
                    action: "go back",
                    step: state.step(),
                });
            }
        };

        self.state = prev;
        Ok(self.current_step())
    }

    /// Hands the request to `submitter` and enters the terminal step whatever
    /// the outcome. The outcome is kept in the terminal state and returned.
    pub async fn submit(
        &mut self,
        submitter: &dyn QuoteSubmitter,
    ) -> Result<SubmitOutcome, WizardError> {
        let WizardState::Extras {
            project,
            contact,
            requirements,
        } = &self.state
        else {
            return Err(WizardError::WrongStep {
                action: "submit",
                step: self.current_step(),
            });
        };

        let request = QuoteRequest {
            project: project.clone(),
            contact: contact.clone(),
            requirements: requirements.clone(),
            has_design: self.draft.has_design.clone(),
            needs_hosting: self.draft.needs_hosting.clone(),
            additional_info: self.draft.additional_info.clone(),
            attachment: self.draft.attachment().cloned(),
        };

        let outcome = match submitter.submit_quote(&request).await {
            Ok(id) => {
                tracing::debug!(lead_id = %id, "Quote request accepted");
                SubmitOutcome::Accepted(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Quote submission failed");
                SubmitOutcome::Failed(e.to_string())
            }
        };

        self.state = WizardState::Submitted {
            request,
            outcome: outcome.clone(),
        };
        Ok(outcome)
    }

    pub fn request(&self) -> Option<&QuoteRequest> {
        match &self.state {
            WizardState::Submitted { request, .. } => Some(request),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&SubmitOutcome> {
        match &self.state {
            WizardState::Submitted { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::quote::SubmitError;

    #[derive(Default)]
    struct RecordingSubmitter {
        seen: Mutex<Vec<QuoteRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl QuoteSubmitter for RecordingSubmitter {
        async fn submit_quote(&self, request: &QuoteRequest) -> Result<LeadId, SubmitError> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail {
                Err(SubmitError::Rejected {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            } else {
                Ok(LeadId::from("lead-1".to_string()))
            }
        }
    }

    fn at_step_three() -> QuoteWizard {
        let mut wizard = QuoteWizard::new();
        wizard.set(Field::ProjectType, "website").unwrap();
        wizard.next().unwrap();
        wizard.set(Field::Name, "Ana").unwrap();
        wizard.set(Field::Email, "a@b.com").unwrap();
        wizard.next().unwrap();
        wizard
    }

    fn at_step_four() -> QuoteWizard {
        let mut wizard = at_step_three();
        wizard.set(Field::Budget, "sob-consulta").unwrap();
        wizard.set(Field::Timeline, "urgent").unwrap();
        wizard.set(Field::Description, "...").unwrap();
        wizard.next().unwrap();
        wizard
    }

    #[test]
    fn starts_at_step_one_with_an_empty_draft() {
        let wizard = QuoteWizard::new();
        assert_eq!(wizard.current_step(), 1);
        assert_eq!(wizard.draft(), &QuoteDraft::default());
        assert!(!wizard.can_advance());
    }

    #[test]
    fn project_type_gates_step_one() {
        let mut wizard = QuoteWizard::new();

        let err = wizard.next().unwrap_err();
        assert!(matches!(
            &err,
            WizardError::Incomplete { step: 1, missing } if missing == &vec![Field::ProjectType]
        ));
        assert_eq!(wizard.current_step(), 1);

        wizard.set(Field::ProjectType, "ecommerce").unwrap();
        assert!(wizard.can_advance());
        assert_eq!(wizard.next().unwrap(), 2);
    }

    #[test]
    fn contact_needs_name_and_email_but_not_a_valid_email() {
        let mut wizard = QuoteWizard::new();
        wizard.set(Field::ProjectType, "website").unwrap();
        wizard.next().unwrap();

        wizard.set(Field::Name, "Ana").unwrap();
        assert_eq!(wizard.missing(), vec![Field::Email]);
        assert!(wizard.next().is_err());

        wizard.set(Field::Email, "not-an-email").unwrap();
        assert_eq!(wizard.next().unwrap(), 3);
    }

    #[test]
    fn description_gates_step_three() {
        let mut wizard = at_step_three();
        wizard.set(Field::Budget, "x").unwrap();
        wizard.set(Field::Timeline, "y").unwrap();
        wizard.set(Field::Description, "").unwrap();

        assert!(wizard.next().is_err());
        assert_eq!(wizard.current_step(), 3);

        wizard.set(Field::Description, "z").unwrap();
        assert_eq!(wizard.next().unwrap(), 4);
    }

    #[test]
    fn no_feature_minimum_at_step_three() {
        let wizard = at_step_four();
        match wizard.state() {
            WizardState::Extras { requirements, .. } => assert!(requirements.features.is_empty()),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn prev_keeps_values_and_skips_validation() {
        let mut wizard = at_step_four();

        assert_eq!(wizard.prev().unwrap(), 3);
        wizard.set(Field::Description, "").unwrap();
        assert_eq!(wizard.prev().unwrap(), 2);
        assert_eq!(wizard.draft().name, "Ana");
        assert_eq!(wizard.prev().unwrap(), 1);
        assert!(matches!(
            wizard.prev(),
            Err(WizardError::WrongStep { step: 1, .. })
        ));
        assert_eq!(wizard.draft().project_type, "website");
    }

    #[test]
    fn completed_steps_are_read_only() {
        let mut wizard = at_step_four();

        assert!(matches!(
            wizard.set(Field::Budget, "changed"),
            Err(WizardError::WrongStep { step: 4, .. })
        ));
        assert!(matches!(
            wizard.toggle_feature("SEO Otimizado"),
            Err(WizardError::WrongStep { step: 4, .. })
        ));
        assert_eq!(wizard.draft().budget, "sob-consulta");
        assert!(wizard.draft().features().is_empty());

        wizard.set(Field::NeedsHosting, "yes").unwrap();

        wizard.prev().unwrap();
        wizard.set(Field::Budget, "changed").unwrap();
        assert!(wizard.toggle_feature("SEO Otimizado").unwrap());
        wizard.next().unwrap();
        match wizard.state() {
            WizardState::Extras { requirements, .. } => {
                assert_eq!(requirements.budget, "changed");
                assert_eq!(requirements.features, vec!["SEO Otimizado"]);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn later_fields_can_be_filled_early() {
        let mut wizard = QuoteWizard::new();
        wizard.set(Field::Email, "a@b.com").unwrap();
        wizard.set(Field::ProjectType, "website").unwrap();
        wizard.next().unwrap();
        wizard.set(Field::Name, "Ana").unwrap();
        assert_eq!(wizard.next().unwrap(), 3);
    }

    #[test]
    fn next_is_not_available_from_step_four() {
        let mut wizard = at_step_four();
        assert!(!wizard.can_advance());
        assert!(matches!(
            wizard.next(),
            Err(WizardError::WrongStep { step: 4, .. })
        ));
    }

    #[tokio::test]
    async fn submit_only_from_step_four() {
        let submitter = RecordingSubmitter::default();
        let mut wizard = at_step_three();

        assert!(matches!(
            wizard.submit(&submitter).await,
            Err(WizardError::WrongStep { step: 3, .. })
        ));
        assert!(submitter.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_to_end_reaches_step_five_on_success() {
        let submitter = RecordingSubmitter::default();
        let mut wizard = at_step_three();
        wizard.set(Field::Budget, "sob-consulta").unwrap();
        wizard.set(Field::Timeline, "urgent").unwrap();
        wizard.set(Field::Description, "...").unwrap();
        wizard.toggle_feature("SEO Otimizado").unwrap();
        wizard.next().unwrap();
        wizard.set(Field::NeedsHosting, "yes").unwrap();
        wizard
            .attach(Attachment::from_path("/tmp/brief.pdf").unwrap())
            .unwrap();

        let outcome = wizard.submit(&submitter).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Accepted(LeadId::from("lead-1".to_string())));
        assert_eq!(wizard.current_step(), 5);
        let seen = submitter.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].project.project_type, "website");
        assert_eq!(seen[0].contact.email, "a@b.com");
        assert_eq!(seen[0].needs_hosting, "yes");
        assert_eq!(seen[0].attachment.as_ref().unwrap().file_name, "brief.pdf");
        assert_eq!(seen[0].requirements.features, vec!["SEO Otimizado"]);
    }

    #[tokio::test]
    async fn end_to_end_reaches_step_five_on_failure() {
        let submitter = RecordingSubmitter {
            fail: true,
            ..Default::default()
        };
        let mut wizard = at_step_four();

        let outcome = wizard.submit(&submitter).await.unwrap();

        assert!(!outcome.is_accepted());
        assert_eq!(wizard.current_step(), 5);
        assert_eq!(wizard.outcome(), Some(&outcome));
        assert!(wizard.request().is_some());
        assert!(matches!(
            wizard.prev(),
            Err(WizardError::WrongStep { step: 5, .. })
        ));
        assert!(matches!(
            wizard.set(Field::AdditionalInfo, "late"),
            Err(WizardError::WrongStep { step: 5, .. })
        ));
        assert!(wizard.detach().is_err());
    }
}
