//! External collaborator adapters.
//!
//! The advisor reads machine schemas and rated-run history through narrow
//! read-only traits; entity CRUD itself lives outside the core. In-memory
//! implementations back the test suite and small embedders.

use std::collections::HashMap;

use crate::schema::{MachineSchema, RunRecord};

/// Read-only access to machine definitions.
pub trait MachineCatalog: Send {
    /// Look up a machine schema by id.
    fn machine_by_id(&self, machine_id: &str) -> Option<MachineSchema>;
}

/// Read-only access to rated-run history.
///
/// Used only during explicit rebuild-from-history, e.g. after a run is
/// deleted.
pub trait RunHistory: Send {
    /// All rated runs for the pair, oldest first.
    fn rated_runs_for(&self, bean_id: &str, machine_id: &str) -> Vec<RunRecord>;
}

/// Map-backed machine catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    machines: HashMap<String, MachineSchema>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a machine.
    pub fn insert(&mut self, machine: MachineSchema) {
        self.machines.insert(machine.id.clone(), machine);
    }
}

impl MachineCatalog for InMemoryCatalog {
    fn machine_by_id(&self, machine_id: &str) -> Option<MachineSchema> {
        self.machines.get(machine_id).cloned()
    }
}

/// Vec-backed run history.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunHistory {
    runs: Vec<RunRecord>,
}

impl InMemoryRunHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run.
    pub fn push(&mut self, run: RunRecord) {
        self.runs.push(run);
    }

    /// Remove a run by id.
    pub fn remove(&mut self, run_id: &str) {
        self.runs.retain(|r| r.id != run_id);
    }
}

impl RunHistory for InMemoryRunHistory {
    fn rated_runs_for(&self, bean_id: &str, machine_id: &str) -> Vec<RunRecord> {
        self.runs
            .iter()
            .filter(|r| r.bean_id == bean_id && r.machine_id == machine_id && r.is_rated())
            .cloned()
            .collect()
    }
}
