use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters for one phase of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub name: &'static str,
    pub queries: u32,
    /// Queries whose search or details call failed; their contribution is zero.
    pub failures: u32,
    /// Rows created (discovery phases) or updated (refresh phases).
    pub persisted: u32,
    pub duplicates: u32,
    /// Rows whose create or update failed; the phase moves on to the next row.
    pub write_failures: u32,
    /// Set when the phase stopped early; later phases still run.
    pub error: Option<String>,
}

impl PhaseReport {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            queries: 0,
            failures: 0,
            persisted: 0,
            duplicates: 0,
            write_failures: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub demo_mode: bool,
    pub phases: Vec<PhaseReport>,
}

impl CycleReport {
    #[must_use]
    pub fn persisted(&self) -> u32 {
        self.phases.iter().map(|p| p.persisted).sum()
    }

    #[must_use]
    pub fn failures(&self) -> u32 {
        self.phases.iter().map(|p| p.failures).sum()
    }

    #[must_use]
    pub fn write_failures(&self) -> u32 {
        self.phases.iter().map(|p| p.write_failures).sum()
    }

    #[must_use]
    pub fn phase(&self, name: &str) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Another cycle held the processing latch.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectorStatus {
    pub is_running: bool,
    pub is_processing: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub demo_mode: bool,
}

/// Broadcast once per completed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataUpdated {
    pub timestamp: DateTime<Utc>,
    pub last_run: DateTime<Utc>,
}
