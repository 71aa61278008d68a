/// Write payloads
///
/// Each payload is serialized into the document fields sent to the backend
/// and validated before any mutation is attempted. A name is valid when it is
/// non-empty after trimming; the name is stored as typed.

use crate::backend::Fields;
use crate::paths::NAME_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

/// A payload that can be written to a document
pub trait WriteFields: Serialize + Validate + Send + Sync {
    /// Serializes the payload into document fields
    fn to_fields(&self) -> Result<Fields, serde_json::Error> {
        match serde_json::to_value(self)? {
            JsonValue::Object(fields) => Ok(fields),
            other => Err(serde::ser::Error::custom(format!(
                "write fields must serialize to an object, got {}",
                other
            ))),
        }
    }
}

/// Validates a record name
///
/// # Errors
///
/// Returns a `name` field error with code `blank` when the trimmed name is empty.
pub fn validate_name(name: &str) -> Result<(), ValidationErrors> {
    if name.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::Borrowed("The name cannot be empty."));

        let mut errors = ValidationErrors::new();
        errors.add(NAME_FIELD, error);
        return Err(errors);
    }

    Ok(())
}

/// `{name}`: creates projects and columns, renames any record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFields {
    pub name: String,
}

impl Validate for NameFields {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_name(&self.name)
    }
}

impl WriteFields for NameFields {}

/// `{name, imageUrl}`: creates tasks (imageUrl written as null)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskFields {
    pub name: String,
    pub image_url: Option<String>,
}

impl Validate for NewTaskFields {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_name(&self.name)
    }
}

impl WriteFields for NewTaskFields {}

/// `{imageUrl}`: sets or clears a task image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFields {
    pub image_url: Option<String>,
}

impl Validate for ImageFields {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

impl WriteFields for ImageFields {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_names_rejected() {
        for name in ["", " ", "\t\n  "] {
            let errors = validate_name(name).unwrap_err();
            assert!(errors.field_errors().contains_key("name"));
        }
    }

    #[test]
    fn test_padded_name_accepted() {
        assert!(validate_name("  Launch ").is_ok());
    }

    #[test]
    fn test_name_fields_serialize() {
        let fields = NameFields {
            name: "Launch".to_string(),
        }
        .to_fields()
        .unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["name"], "Launch");
    }

    #[test]
    fn test_new_task_writes_null_image() {
        let fields = NewTaskFields {
            name: "Write".to_string(),
            image_url: None,
        }
        .to_fields()
        .unwrap();
        assert!(fields.contains_key("imageUrl"));
        assert!(fields["imageUrl"].is_null());
    }

    #[test]
    fn test_image_fields_always_valid() {
        assert!(ImageFields { image_url: None }.validate().is_ok());
    }

    #[test]
    fn test_new_task_validates_name() {
        let fields = NewTaskFields {
            name: "   ".to_string(),
            image_url: None,
        };
        assert!(fields.validate().is_err());
    }
}
