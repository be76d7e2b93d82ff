//! Declarative configuration surface. `shield-cli` parses this from TOML;
//! the core crates only ever see the already-parsed struct, never a path.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardPolicy {
    Block,
    Log,
    Alert,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        GuardPolicy::Block
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GuardSetting {
    pub enabled: bool,
    pub policy: GuardPolicy,
    pub threshold: f64,
}

impl Default for GuardSetting {
    fn default() -> Self {
        Self { enabled: true, policy: GuardPolicy::Block, threshold: 0.75 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuardsConfig {
    pub llm: GuardSetting,
    pub rag: GuardSetting,
    pub agent: GuardSetting,
    pub tool: GuardSetting,
    pub mcp: GuardSetting,
    pub api: GuardSetting,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitSetting {
    pub enabled: bool,
    pub rps: f64,
    pub burst: f64,
}

impl Default for RateLimitSetting {
    fn default() -> Self {
        Self { enabled: true, rps: 5.0, burst: 3.0 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlocklistConfig {
    pub entries: Vec<BlocklistEntryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlocklistEntryConfig {
    pub pattern: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanaryConfig {
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: shield_policy::ZoneType,
    pub inbound_acl: u32,
    pub outbound_acl: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub seq: u32,
    pub action: shield_pattern::Action,
    pub direction: shield_policy::Direction,
    pub zone_type: Option<shield_policy::ZoneType>,
    pub pattern: Option<shield_pattern::Pattern>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclConfig {
    pub number: u32,
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaMode {
    Standalone,
    ActiveStandby,
}

impl Default for HaMode {
    fn default() -> Self {
        HaMode::Standalone
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HaConfig {
    pub enabled: bool,
    pub mode: HaMode,
    pub virtual_ip: Option<String>,
    pub priority: u8,
    pub preempt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiemFormat {
    Cef,
    Json,
    Syslog,
}

impl Default for SiemFormat {
    fn default() -> Self {
        SiemFormat::Json
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiemConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub format: SiemFormat,
}

/// The full, already-validated-by-deserialization surface a deployment
/// configures. Direction, zones, and ACLs are records here; `ShieldPipeline`
/// builds its live registries from this at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldConfig {
    pub hostname: String,
    pub guards: GuardsConfig,
    pub rate_limit: RateLimitSetting,
    pub blocklist: BlocklistConfig,
    pub canary: CanaryConfig,
    pub zones: Vec<ZoneConfig>,
    pub acls: Vec<AclConfig>,
    pub deny_by_default: bool,
    pub max_sessions: usize,
    pub session_timeout_sec: i64,
    pub adaptive_memory_capacity: usize,
    pub ha: HaConfig,
    pub siem: SiemConfig,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            guards: GuardsConfig::default(),
            rate_limit: RateLimitSetting::default(),
            blocklist: BlocklistConfig::default(),
            canary: CanaryConfig::default(),
            zones: Vec::new(),
            acls: Vec::new(),
            deny_by_default: false,
            max_sessions: 10_000,
            session_timeout_sec: 3600,
            adaptive_memory_capacity: 100_000,
            ha: HaConfig::default(),
            siem: SiemConfig::default(),
        }
    }
}
