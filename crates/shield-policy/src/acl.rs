//! Numbered ACLs of ordered rules, evaluated first-match-wins.

use std::collections::HashMap;
use std::sync::Arc;

use shield_pattern::{Action, CompiledPattern};

use crate::error::{PolicyError, Result};
use crate::zone::{Direction, ZoneType};

#[derive(Clone)]
pub struct Rule {
    pub sequence_number: u32,
    pub action: Action,
    pub direction: Direction,
    pub zone_type_filter: Option<ZoneType>,
    pub pattern: Option<Arc<CompiledPattern>>,
}

impl Rule {
    fn matches(&self, direction: Direction, zone_type: ZoneType, payload: &[u8]) -> bool {
        let direction_ok = matches!(self.direction, Direction::Any) || self.direction == direction;
        let zone_ok = self.zone_type_filter.map(|z| z == zone_type).unwrap_or(true);
        let pattern_ok = match &self.pattern {
            Some(p) => p.is_match(payload),
            None => true,
        };
        direction_ok && zone_ok && pattern_ok
    }
}

pub struct Acl {
    pub number: u32,
    rules: Vec<Rule>,
}

impl Acl {
    pub fn new(number: u32) -> Self {
        Self { number, rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        if self.rules.iter().any(|r| r.sequence_number == rule.sequence_number) {
            return Err(PolicyError::DuplicateRuleSequence(rule.sequence_number, self.number));
        }
        let pos = self
            .rules
            .binary_search_by_key(&rule.sequence_number, |r| r.sequence_number)
            .unwrap_or_else(|p| p);
        self.rules.insert(pos, rule);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AclVerdict {
    pub action: Action,
    pub rule_sequence: Option<u32>,
    pub reason: String,
}

/// `deny_by_default` lets a deployment flip the no-match default from
/// ALLOW (the spec's modeled core behavior) to BLOCK without touching the
/// evaluation code itself.
pub struct AclTable {
    acls: HashMap<u32, Acl>,
    pub deny_by_default: bool,
}

impl AclTable {
    pub fn new(deny_by_default: bool) -> Self {
        Self { acls: HashMap::new(), deny_by_default }
    }

    pub fn register(&mut self, acl: Acl) {
        self.acls.insert(acl.number, acl);
    }

    pub fn acl_mut(&mut self, number: u32) -> Option<&mut Acl> {
        self.acls.get_mut(&number)
    }

    pub fn evaluate(
        &self,
        acl_number: u32,
        direction: Direction,
        zone_type: ZoneType,
        payload: &[u8],
    ) -> Result<AclVerdict> {
        let acl = self.acls.get(&acl_number).ok_or(PolicyError::AclNotFound(acl_number))?;
        for rule in &acl.rules {
            if rule.matches(direction, zone_type, payload) {
                return Ok(AclVerdict {
                    action: rule.action,
                    rule_sequence: Some(rule.sequence_number),
                    reason: format!("matched rule {} in acl {}", rule.sequence_number, acl_number),
                });
            }
        }
        let action = if self.deny_by_default { Action::Block } else { Action::Allow };
        Ok(AclVerdict { action, rule_sequence: None, reason: "no rule matched".to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shield_pattern::{CompiledPattern as CP, Pattern, PatternKind, Severity, ThreatType};

    fn contains_pattern(text: &str) -> Arc<CompiledPattern> {
        Arc::new(
            CP::compile(Pattern {
                id: 1,
                bytes: text.as_bytes().to_vec(),
                kind: PatternKind::Contains,
                case_insensitive: true,
                threat_type: ThreatType::Injection,
                severity: Severity::High,
            })
            .unwrap(),
        )
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut acl = Acl::new(1);
        acl.add_rule(Rule {
            sequence_number: 10,
            action: Action::Block,
            direction: Direction::Any,
            zone_type_filter: None,
            pattern: Some(contains_pattern("sudo")),
        })
        .unwrap();
        acl.add_rule(Rule {
            sequence_number: 20,
            action: Action::Allow,
            direction: Direction::Any,
            zone_type_filter: None,
            pattern: None,
        })
        .unwrap();

        let mut table = AclTable::new(false);
        table.register(acl);

        let blocked = table.evaluate(1, Direction::Input, ZoneType::Agent, b"sudo rm -rf /").unwrap();
        assert_eq!(blocked.action, Action::Block);
        assert_eq!(blocked.rule_sequence, Some(10));

        let allowed = table.evaluate(1, Direction::Input, ZoneType::Agent, b"hello").unwrap();
        assert_eq!(allowed.action, Action::Allow);
        assert_eq!(allowed.rule_sequence, Some(20));
    }

    #[test]
    fn no_match_defaults_to_allow_unless_configured_otherwise() {
        let mut table = AclTable::new(false);
        table.register(Acl::new(2));
        let verdict = table.evaluate(2, Direction::Input, ZoneType::Llm, b"anything").unwrap();
        assert_eq!(verdict.action, Action::Allow);

        let mut deny_table = AclTable::new(true);
        deny_table.register(Acl::new(2));
        let verdict = deny_table.evaluate(2, Direction::Input, ZoneType::Llm, b"anything").unwrap();
        assert_eq!(verdict.action, Action::Block);
    }

    #[test]
    fn duplicate_sequence_number_rejected() {
        let mut acl = Acl::new(1);
        acl.add_rule(Rule { sequence_number: 1, action: Action::Allow, direction: Direction::Any, zone_type_filter: None, pattern: None }).unwrap();
        let err = acl.add_rule(Rule { sequence_number: 1, action: Action::Block, direction: Direction::Any, zone_type_filter: None, pattern: None });
        assert!(err.is_err());
    }

    #[test]
    fn unknown_acl_number_errors() {
        let table = AclTable::new(false);
        assert!(table.evaluate(999, Direction::Input, ZoneType::Llm, b"x").is_err());
    }

    #[test]
    fn rules_stay_sorted_regardless_of_insertion_order() {
        let mut acl = Acl::new(1);
        acl.add_rule(Rule { sequence_number: 30, action: Action::Allow, direction: Direction::Any, zone_type_filter: None, pattern: None }).unwrap();
        acl.add_rule(Rule { sequence_number: 10, action: Action::Block, direction: Direction::Any, zone_type_filter: None, pattern: None }).unwrap();
        acl.add_rule(Rule { sequence_number: 20, action: Action::Log, direction: Direction::Any, zone_type_filter: None, pattern: None }).unwrap();
        assert_eq!(acl.rules.iter().map(|r| r.sequence_number).collect::<Vec<_>>(), vec![10, 20, 30]);
    }
}
