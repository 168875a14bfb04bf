// Validation error taxonomy
// Every variant carries the offending entity kind and field/relationship
// name plus the violated bound, so messages are directly displayable.

use std::fmt;

/// A single violated validation rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Scalar or string field out of bounds or malformed
    #[error("{entity}.{field}: {message}")]
    Field {
        entity: &'static str,
        field: &'static str,
        message: String,
    },

    /// Missing or dangling required link, or relationship count out of bounds
    #[error("{entity}.{relationship}: {message}")]
    Relationship {
        entity: &'static str,
        relationship: &'static str,
        message: String,
    },

    /// Timestamp in the future or created/updated out of order
    #[error("{entity}.{field}: {message}")]
    Date {
        entity: &'static str,
        field: &'static str,
        message: String,
    },

    /// Value outside a closed categorical set
    #[error("{entity}.{field}: \"{value}\" is not one of {allowed}")]
    Enumeration {
        entity: &'static str,
        field: &'static str,
        value: String,
        allowed: &'static str,
    },

    /// Fixed-cardinality violation (e.g. a kit without its 16 tracks)
    #[error("{entity}.{relationship}: expected {expected}, found {actual}")]
    Capacity {
        entity: &'static str,
        relationship: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl ValidationError {
    pub fn field(
        entity: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Field {
            entity,
            field,
            message: message.into(),
        }
    }

    pub fn out_of_range<T: fmt::Display>(
        entity: &'static str,
        field: &'static str,
        value: T,
        min: T,
        max: T,
    ) -> Self {
        Self::field(
            entity,
            field,
            format!("value {value} out of range [{min}, {max}]"),
        )
    }

    pub fn empty(entity: &'static str, field: &'static str) -> Self {
        Self::field(entity, field, "must not be empty")
    }

    pub fn too_long(entity: &'static str, field: &'static str, len: usize, max: usize) -> Self {
        Self::field(entity, field, format!("{len} characters exceeds limit {max}"))
    }

    pub fn missing_link(entity: &'static str, relationship: &'static str) -> Self {
        Self::Relationship {
            entity,
            relationship,
            message: "required link is missing".to_string(),
        }
    }

    pub fn dangling_link(
        entity: &'static str,
        relationship: &'static str,
        target: impl fmt::Display,
    ) -> Self {
        Self::Relationship {
            entity,
            relationship,
            message: format!("references missing entity {target}"),
        }
    }

    pub fn count_exceeded(
        entity: &'static str,
        relationship: &'static str,
        actual: usize,
        max: usize,
    ) -> Self {
        Self::Relationship {
            entity,
            relationship,
            message: format!("count {actual} exceeds limit {max}"),
        }
    }

    pub fn date(entity: &'static str, field: &'static str, message: impl Into<String>) -> Self {
        Self::Date {
            entity,
            field,
            message: message.into(),
        }
    }

    /// Relationship and capacity errors block commit unconditionally;
    /// the rest only surface at commit boundaries.
    pub fn is_hard(&self) -> bool {
        matches!(self, Self::Relationship { .. } | Self::Capacity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message_names_field_and_bound() {
        let err = ValidationError::out_of_range("Track", "volume", 1.5, 0.0, 1.0);
        let text = err.to_string();
        assert!(text.contains("volume"));
        assert!(text.contains("1.5"));
        assert!(text.contains("[0, 1]"));
    }

    #[test]
    fn test_capacity_display() {
        let err = ValidationError::Capacity {
            entity: "Kit",
            relationship: "tracks",
            expected: 16,
            actual: 12,
        };
        assert_eq!(err.to_string(), "Kit.tracks: expected 16, found 12");
        assert!(err.is_hard());
    }

    #[test]
    fn test_field_errors_are_soft() {
        let err = ValidationError::empty("Project", "name");
        assert!(!err.is_hard());
    }
}
