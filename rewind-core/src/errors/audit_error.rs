/// Errors raised while reading the revision log.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("entity type {entity_type} is not audited")]
    NotAudited { entity_type: String },

    #[error("no revision of {entity_type} {id} found at or before revision {revision}")]
    NoRevisionFound {
        entity_type: String,
        id: String,
        revision: i64,
    },

    #[error("{entity_type} {id} was deleted at or before revision {revision}")]
    Deleted {
        entity_type: String,
        id: String,
        revision: i64,
    },

    #[error("revision {revision} does not exist")]
    InvalidRevision { revision: i64 },
}
