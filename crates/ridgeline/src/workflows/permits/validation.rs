use super::domain::PermitSubmission;

/// Validation errors raised while accepting a submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionViolation {
    #[error("{field} is required")]
    MissingField { field: &'static str },
}

/// Guard checking that every mandatory field carries a non-blank value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmissionGuard;

impl SubmissionGuard {
    pub fn check(&self, submission: &PermitSubmission) -> Result<(), SubmissionViolation> {
        let required = [
            ("fullName", submission.full_name.as_str()),
            ("email", submission.email.as_str()),
            ("idNumber", submission.id_number.as_str()),
            ("dlNumber", submission.dl_number.as_str()),
            ("documentPath", submission.document_path.as_str()),
        ];

        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(SubmissionViolation::MissingField { field: *field }),
            None => Ok(()),
        }
    }
}
