//! Upload form
//!
//! What the upload dialog holds between sessions: the resource type, the
//! accepted file and the metadata being edited. Submitting creates a fresh
//! [`UploadSession`]; the file stays selected so a failed upload can be
//! resubmitted without picking it again.

use super::validator::default_title;
use super::{ResourceType, UploadFile, UploadMetadata, UploadSession, ValidationError, Validator};

#[derive(Debug, Clone)]
pub struct UploadForm {
    validator: Validator,
    resource_type: ResourceType,
    file: Option<UploadFile>,
    metadata: UploadMetadata,
}

impl UploadForm {
    pub fn new(validator: Validator, resource_type: ResourceType) -> Self {
        Self {
            validator,
            resource_type,
            file: None,
            metadata: UploadMetadata::default(),
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn file(&self) -> Option<&UploadFile> {
        self.file.as_ref()
    }

    pub fn metadata(&self) -> &UploadMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut UploadMetadata {
        &mut self.metadata
    }

    /// Validate and accept a file. A blank title is pre-filled from the file
    /// name. A rejected file leaves nothing selected.
    pub fn select_file(&mut self, file: UploadFile) -> Result<(), ValidationError> {
        if let Err(err) = self.validator.validate(&file, self.resource_type) {
            tracing::warn!(file = %file.name(), error = %err, "File rejected");
            self.file = None;
            return Err(err);
        }

        if self.metadata.title.trim().is_empty() {
            self.metadata.title = default_title(file.name());
        }
        tracing::debug!(file = %file.name(), size = file.size(), "File accepted");
        self.file = Some(file);
        Ok(())
    }

    /// Change the resource type, re-validating the selected file against the
    /// new allow-list. A file that no longer matches is cleared.
    pub fn set_resource_type(&mut self, resource_type: ResourceType) -> Result<(), ValidationError> {
        self.resource_type = resource_type;

        let Some(file) = &self.file else {
            return Ok(());
        };
        if let Err(err) = self.validator.validate(file, resource_type) {
            tracing::warn!(
                file = %file.name(),
                resource_type = %resource_type,
                error = %err,
                "Selected file no longer accepted"
            );
            self.file = None;
            return Err(err);
        }
        Ok(())
    }

    /// Start a new session from the current selection
    pub fn submit(&self) -> Result<UploadSession, ValidationError> {
        let file = self.file.clone().ok_or(ValidationError::NoFile)?;
        self.metadata.validate()?;
        Ok(UploadSession::new(
            file,
            self.resource_type,
            self.metadata.clone(),
        ))
    }

    /// Drop the selection and metadata, as when the dialog closes
    pub fn reset(&mut self) {
        self.file = None;
        self.metadata = UploadMetadata::default();
    }
}
