//! File validation
//!
//! Size and type checks that run before any network activity.

use super::{ResourceType, UploadFile, ValidationError};
use std::path::Path;

/// Accepts or rejects a candidate file for a resource type
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    max_file_size: u64,
}

impl Validator {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate a selected file against the current resource type
    pub fn validate(
        &self,
        file: &UploadFile,
        resource_type: ResourceType,
    ) -> Result<(), ValidationError> {
        self.check(file.name(), file.size(), resource_type)
    }

    /// Validate a file name and size without a backing source
    pub fn check(
        &self,
        file_name: &str,
        size: u64,
        resource_type: ResourceType,
    ) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        let extension = extension_of(file_name);
        let accepted = extension
            .as_deref()
            .is_some_and(|ext| resource_type.allowed_extensions().contains(&ext));
        if !accepted {
            return Err(ValidationError::UnsupportedType {
                extension: extension.unwrap_or_else(|| "(none)".to_string()),
                resource_type,
            });
        }

        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        Ok(())
    }
}

/// Title pre-filled from a file name: the name without its extension
pub fn default_title(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::MAX_FILE_SIZE;

    #[test]
    fn test_accepts_pdf_assignment() {
        let validator = Validator::new(MAX_FILE_SIZE);
        assert!(validator
            .check("week1.pdf", 2 * 1024 * 1024, ResourceType::Assignment)
            .is_ok());
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let validator = Validator::new(MAX_FILE_SIZE);
        assert!(validator
            .check("Lecture.MP4", 1024, ResourceType::Recording)
            .is_ok());
    }

    #[test]
    fn test_rejects_exe() {
        let validator = Validator::new(MAX_FILE_SIZE);
        let err = validator
            .check("setup.exe", 1024, ResourceType::Assignment)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedType {
                extension: "exe".into(),
                resource_type: ResourceType::Assignment,
            }
        );
    }

    #[test]
    fn test_rejects_recording_extension_for_assignment() {
        let validator = Validator::new(MAX_FILE_SIZE);
        assert!(matches!(
            validator.check("talk.mp4", 1024, ResourceType::Assignment),
            Err(ValidationError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_rejects_missing_extension() {
        let validator = Validator::new(MAX_FILE_SIZE);
        match validator.check("README", 10, ResourceType::Assignment) {
            Err(ValidationError::UnsupportedType { extension, .. }) => {
                assert_eq!(extension, "(none)")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_oversize() {
        let validator = Validator::new(1000);
        assert_eq!(
            validator.check("big.mov", 1001, ResourceType::Recording),
            Err(ValidationError::FileTooLarge {
                size: 1001,
                max: 1000
            })
        );
        assert!(validator.check("ok.mov", 1000, ResourceType::Recording).is_ok());
    }

    #[test]
    fn test_rejects_empty() {
        let validator = Validator::new(MAX_FILE_SIZE);
        assert_eq!(
            validator.check("notes.txt", 0, ResourceType::Assignment),
            Err(ValidationError::EmptyFile)
        );
    }

    #[test]
    fn test_default_title() {
        assert_eq!(default_title("Week 1.pdf"), "Week 1");
        assert_eq!(default_title("archive.tar.gz"), "archive.tar");
        assert_eq!(default_title("noext"), "noext");
    }
}
