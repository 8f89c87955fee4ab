use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    config::BackendConfig,
    quote::{CaptureError, LeadRecord, ProjectCapture, QuoteRequest},
};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Lead insert rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Lead insert response carried no id")]
    MissingId,

    #[error(transparent)]
    Invalid(#[from] CaptureError),
}

/// Identifier the backend assigned to a stored lead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(String);

impl LeadId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for LeadId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// External persistence for completed quote requests.
#[async_trait]
pub trait QuoteSubmitter: Send + Sync {
    async fn submit_quote(&self, request: &QuoteRequest) -> Result<LeadId, SubmitError>;
}

/// What the notification function reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReceipt {
    #[serde(default)]
    pub client_email_sent: bool,
    #[serde(default)]
    pub admin_email_sent: bool,
}

/// Inserts leads through the hosted table API, then triggers the
/// notification function. Notification failures never fail a submission.
pub struct BackendSubmitter {
    client: reqwest::Client,
    config: BackendConfig,
    user_agent: String,
}

impl BackendSubmitter {
    pub const LEADS_TABLE: &'static str = "project_leads";
    pub const NOTIFY_FUNCTION: &'static str = "send-project-notification";

    pub fn new(config: BackendConfig, user_agent: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            user_agent: user_agent.into(),
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .header("Content-Type", "application/json")
    }

    /// Validates a project-capture form and submits it.
    pub async fn submit_capture(&self, capture: ProjectCapture) -> Result<LeadId, SubmitError> {
        let lead = capture.into_lead(&self.user_agent)?;
        self.submit_lead(&lead).await
    }

    pub async fn submit_lead(&self, lead: &LeadRecord) -> Result<LeadId, SubmitError> {
        let id = self.insert(lead).await?;
        match self.notify(&id).await {
            Ok(receipt) => tracing::info!(
                lead_id = %id,
                client_email_sent = receipt.client_email_sent,
                admin_email_sent = receipt.admin_email_sent,
                "Project notification dispatched"
            ),
            Err(e) => {
                tracing::warn!(lead_id = %id, error = %e, "Failed to send project notification")
            }
        }
        Ok(id)
    }

    async fn insert(&self, lead: &LeadRecord) -> Result<LeadId, SubmitError> {
        let response = self
            .authorized(
                self.client
                    .post(self.config.table_url(Self::LEADS_TABLE)),
            )
            .header("Prefer", "return=representation")
            .json(&[lead])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Value = response.json().await?;
        lead_id(&rows).ok_or(SubmitError::MissingId)
    }

    async fn notify(&self, id: &LeadId) -> Result<NotificationReceipt, SubmitError> {
        let response = self
            .authorized(
                self.client
                    .post(self.config.function_url(Self::NOTIFY_FUNCTION)),
            )
            .json(&json!({ "projectLeadId": id }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await.unwrap_or_default())
    }
}

#[async_trait]
impl QuoteSubmitter for BackendSubmitter {
    async fn submit_quote(&self, request: &QuoteRequest) -> Result<LeadId, SubmitError> {
        let lead = LeadRecord::from_quote(request, &self.user_agent);
        self.submit_lead(&lead).await
    }
}

/// The insert answers with the stored rows; ids may be strings or numbers.
fn lead_id(rows: &Value) -> Option<LeadId> {
    let row = match rows {
        Value::Array(rows) => rows.first()?,
        row => row,
    };
    match row.get("id")? {
        Value::String(id) if !id.is_empty() => Some(LeadId(id.clone())),
        Value::Number(id) => Some(LeadId(id.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn lead_id_from_representation() {
        assert_eq!(
            lead_id(&json!([{ "id": "9b2f", "name": "Ana" }])),
            Some(LeadId::from("9b2f".to_string()))
        );
        assert_eq!(lead_id(&json!({ "id": 42 })), Some(LeadId::from("42".to_string())));
        assert_eq!(lead_id(&json!([])), None);
        assert_eq!(lead_id(&json!([{ "id": "" }])), None);
        assert_eq!(lead_id(&json!([{ "name": "Ana" }])), None);
    }

    #[test]
    fn receipt_defaults_missing_flags() {
        let receipt: NotificationReceipt =
            serde_json::from_value(json!({ "clientEmailSent": true })).unwrap();
        assert_eq!(
            receipt,
            NotificationReceipt {
                client_email_sent: true,
                admin_email_sent: false,
            }
        );
    }
}
