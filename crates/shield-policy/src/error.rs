use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("zone not found: {0}")]
    ZoneNotFound(String),

    #[error("zone already registered: {0}")]
    ZoneAlreadyExists(String),

    #[error("acl not found: {0}")]
    AclNotFound(u32),

    #[error("duplicate rule sequence number {0} in acl {1}")]
    DuplicateRuleSequence(u32, u32),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
