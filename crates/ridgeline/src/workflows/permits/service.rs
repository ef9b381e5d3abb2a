use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use tracing::{info, warn};

use super::domain::{
    DocumentLink, PermitApplication, PermitId, PermitStatus, PermitStatusView, PermitSubmission,
    PermitUpdate,
};
use super::repository::{PermitRepository, RepositoryError};
use super::transitions::TransitionPolicy;
use super::validation::{SubmissionGuard, SubmissionViolation};
use crate::identity::IdentityProvider;
use crate::storage::{ObjectStorage, StorageError};
use crate::store::KeyValueStore;
use crate::workflows::access::{AccessControl, AccessError};

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `{unix_millis}-{9 base36 chars}`.
fn next_permit_id() -> PermitId {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect();
    PermitId(format!("{}-{suffix}", Utc::now().timestamp_millis()))
}

/// Review knobs resolved from configuration.
#[derive(Debug, Clone, Copy)]
pub struct PermitSettings {
    pub transitions: TransitionPolicy,
    pub document_url_ttl: Duration,
}

impl Default for PermitSettings {
    fn default() -> Self {
        Self {
            transitions: TransitionPolicy::default(),
            document_url_ttl: Duration::seconds(3600),
        }
    }
}

/// Service composing the submission guard, permit repository, admin checks
/// and object storage.
pub struct PermitService<S, O, I> {
    guard: SubmissionGuard,
    repository: PermitRepository<S>,
    objects: Arc<O>,
    access: AccessControl<S, I>,
    settings: PermitSettings,
}

impl<S, O, I> PermitService<S, O, I>
where
    S: KeyValueStore + 'static,
    O: ObjectStorage + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(
        store: Arc<S>,
        objects: Arc<O>,
        access: AccessControl<S, I>,
        settings: PermitSettings,
    ) -> Self {
        Self {
            guard: SubmissionGuard,
            repository: PermitRepository::new(store),
            objects,
            access,
            settings,
        }
    }

    /// Accept a new application in `PENDING`, persisted in a single write.
    pub fn submit(
        &self,
        submission: PermitSubmission,
    ) -> Result<PermitApplication, PermitServiceError> {
        self.guard.check(&submission)?;

        let record = PermitApplication {
            id: next_permit_id(),
            full_name: submission.full_name,
            email: submission.email,
            phone: submission.phone.filter(|phone| !phone.trim().is_empty()),
            destination: submission.destination,
            id_type: submission.id_type,
            id_number: submission.id_number,
            dl_number: submission.dl_number,
            document_path: submission.document_path,
            status: PermitStatus::Pending,
            admin_notes: None,
            submitted_at: Utc::now(),
            updated_at: None,
        };

        let stored = self.repository.insert(record)?;
        info!(permit_id = %stored.id, destination = %stored.destination, "permit submitted");
        Ok(stored)
    }

    /// Every stored application, for admins only.
    pub fn list(&self, token: Option<&str>) -> Result<Vec<PermitApplication>, PermitServiceError> {
        self.access.require_admin(token)?;
        Ok(self.repository.all()?)
    }

    /// Merge the admin's status and notes into the record and stamp `updatedAt`.
    pub fn transition(
        &self,
        token: Option<&str>,
        id: &PermitId,
        update: PermitUpdate,
    ) -> Result<PermitApplication, PermitServiceError> {
        let admin = self.access.require_admin(token)?;
        let mut record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        if let Some(next) = update.status {
            if !self.settings.transitions.allows(record.status, next) {
                warn!(permit_id = %id, from = %record.status, to = %next, "transition refused");
                return Err(PermitServiceError::DisallowedTransition {
                    from: record.status,
                    to: next,
                });
            }
            record.status = next;
        }
        if let Some(notes) = update.admin_notes {
            record.admin_notes = Some(notes);
        }
        record.updated_at = Some(Utc::now());

        self.repository.update(&record)?;
        info!(
            permit_id = %id,
            status = %record.status,
            reviewer = %admin.id,
            "permit reviewed"
        );
        Ok(record)
    }

    /// Public status lookup; matches the email case-insensitively.
    pub fn lookup_by_email(&self, email: &str) -> Result<Vec<PermitStatusView>, PermitServiceError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(PermitServiceError::InvalidQuery(
                "Email query param required".to_string(),
            ));
        }
        let wanted = email.to_lowercase();

        Ok(self
            .repository
            .all()?
            .iter()
            .filter(|record| record.email.to_lowercase() == wanted)
            .map(PermitApplication::status_view)
            .collect())
    }

    /// Time-limited link to the permit's uploaded document.
    pub fn document_url(
        &self,
        token: Option<&str>,
        id: &PermitId,
    ) -> Result<DocumentLink, PermitServiceError> {
        self.access.require_admin(token)?;
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        if record.document_path.trim().is_empty() {
            return Err(PermitServiceError::NoDocument);
        }

        let signed = self
            .objects
            .signed_url(&record.document_path, self.settings.document_url_ttl)?;
        Ok(DocumentLink {
            url: signed.url,
            path: record.document_path,
        })
    }
}

/// Error raised by the permit service.
#[derive(Debug, thiserror::Error)]
pub enum PermitServiceError {
    #[error(transparent)]
    Validation(#[from] SubmissionViolation),
    #[error("{0}")]
    InvalidQuery(String),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("no document attached to this permit")]
    NoDocument,
    #[error("status cannot move from {from} to {to}")]
    DisallowedTransition {
        from: PermitStatus,
        to: PermitStatus,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}
