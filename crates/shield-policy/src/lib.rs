//! Zone registry, numbered ACL rule engine, and per-zone-type guard dispatch.

mod acl;
mod error;
mod guard;
mod zone;

pub use acl::{Acl, AclTable, AclVerdict, Rule};
pub use error::{PolicyError, Result};
pub use guard::{
    AgentGuard, ApiGuard, Guard, GuardContext, GuardRegistry, GuardResult, LlmGuard, McpGuard,
    RagGuard, ToolGuard,
};
pub use zone::{Direction, Zone, ZoneRegistry, ZoneType};
