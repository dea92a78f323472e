/// Schema catalog errors. These signal a misconfigured catalog or corrupt
/// audit data and are never retried.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown entity type: {entity_type}")]
    UnknownType { entity_type: String },

    #[error("schema inconsistency in {entity_type}: {reason}")]
    SchemaInconsistency { entity_type: String, reason: String },

    #[error("no column mapping for field {field} of {entity_type}")]
    MissingColumnMapping { entity_type: String, field: String },

    #[error("invalid SQL identifier: {name}")]
    InvalidIdentifier { name: String },

    #[error("cannot decode field {field}: {reason}")]
    FieldDecode { field: String, reason: String },
}

impl SchemaError {
    pub fn inconsistent(entity_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaInconsistency {
            entity_type: entity_type.into(),
            reason: reason.into(),
        }
    }
}
