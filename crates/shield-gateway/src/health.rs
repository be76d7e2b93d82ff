//! Aggregate subsystem health, generalizing the teacher's single-subsystem
//! status snapshot into one per tracked component.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct SubsystemHealth {
    pub name: String,
    pub up: bool,
    pub last_error_ts: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub subsystems: Vec<SubsystemHealth>,
}

impl HealthReport {
    pub fn all_up(&self) -> bool {
        self.subsystems.iter().all(|s| s.up)
    }
}

pub struct HealthRegistry {
    subsystems: Mutex<HashMap<String, SubsystemHealth>>,
}

impl HealthRegistry {
    pub fn new(names: &[&str]) -> Self {
        let subsystems = names
            .iter()
            .map(|&name| (name.to_string(), SubsystemHealth { name: name.to_string(), up: true, last_error_ts: None }))
            .collect();
        Self { subsystems: Mutex::new(subsystems) }
    }

    pub fn mark_up(&self, name: &str) {
        let mut subsystems = self.subsystems.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(s) = subsystems.get_mut(name) {
            s.up = true;
        }
    }

    pub fn mark_down(&self, name: &str, now: i64) {
        let mut subsystems = self.subsystems.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(s) = subsystems.get_mut(name) {
            s.up = false;
            s.last_error_ts = Some(now);
        }
    }

    pub fn report(&self) -> HealthReport {
        let subsystems = self.subsystems.lock().unwrap_or_else(|e| e.into_inner());
        let mut list: Vec<SubsystemHealth> = subsystems.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        HealthReport { subsystems: list }
    }
}
