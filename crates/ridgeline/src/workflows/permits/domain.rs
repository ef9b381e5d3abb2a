use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for permit applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermitId(pub String);

impl std::fmt::Display for PermitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Government identity document presented with the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdType {
    Aadhaar,
    Passport,
    VoterId,
}

/// Review state of a permit application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermitStatus {
    Pending,
    Verified,
    Approved,
    Rejected,
}

impl PermitStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PermitStatus::Pending => "PENDING",
            PermitStatus::Verified => "VERIFIED",
            PermitStatus::Approved => "APPROVED",
            PermitStatus::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for PermitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Rider supplied payload for a new application. Missing fields decode as
/// blank so the submission guard can name them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermitSubmission {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub destination: String,
    pub id_type: Option<IdType>,
    pub id_number: String,
    pub dl_number: String,
    pub document_path: String,
}

/// Persisted permit record stored under `permit:{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitApplication {
    pub id: PermitId,
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_type: Option<IdType>,
    pub id_number: String,
    pub dl_number: String,
    pub document_path: String,
    pub status: PermitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PermitApplication {
    /// Public projection that never carries identity numbers or the document path.
    pub fn status_view(&self) -> PermitStatusView {
        PermitStatusView {
            id: self.id.clone(),
            destination: self.destination.clone(),
            status: self.status,
            submitted_at: self.submitted_at,
            updated_at: self.updated_at,
        }
    }
}

/// Admin review payload. Only these two fields are ever merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermitUpdate {
    pub status: Option<PermitStatus>,
    pub admin_notes: Option<String>,
}

/// Minimal status record returned by the public email lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitStatusView {
    pub id: PermitId,
    pub destination: String,
    pub status: PermitStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Short-lived link to a permit's uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLink {
    pub url: String,
    pub path: String,
}
