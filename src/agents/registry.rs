//! Insertion-ordered store of agent handles
//!
//! Handles are keyed by their id. Adding an id that is already present is a
//! no-op, so a late duplicate can never replace an agent that is already
//! serving requests.

use crate::agents::handle::AgentHandle;
use crate::types::{AgentLookup, CyroError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Registry of loaded agents
#[derive(Debug, Default, Clone)]
pub struct AgentRegistry {
    /// Handles in insertion order
    agents: Vec<Arc<AgentHandle>>,
    /// Id to position in `agents`
    index: HashMap<Uuid, usize>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `handle` unless its id is already registered.
    ///
    /// Returns whether the handle was inserted.
    pub fn add(&mut self, handle: Arc<AgentHandle>) -> bool {
        if self.index.contains_key(&handle.id()) {
            return false;
        }
        self.index.insert(handle.id(), self.agents.len());
        self.agents.push(handle);
        true
    }

    pub fn get_by_id(&self, id: &Uuid) -> Result<Arc<AgentHandle>> {
        self.index
            .get(id)
            .map(|&i| Arc::clone(&self.agents[i]))
            .ok_or(CyroError::AgentNotFound(AgentLookup::Id(*id)))
    }

    /// Case-insensitive exact match on the agent name; the earliest registration wins
    pub fn get_by_name(&self, name: &str) -> Result<Arc<AgentHandle>> {
        let wanted = name.to_lowercase();
        self.agents
            .iter()
            .find(|a| a.metadata().name().to_lowercase() == wanted)
            .cloned()
            .ok_or_else(|| CyroError::AgentNotFound(AgentLookup::Name(name.to_string())))
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.get_by_name(name).is_ok()
    }

    /// Handles in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<AgentHandle>> {
        self.agents.iter()
    }

    /// Agent names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.metadata().name()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl<'a> IntoIterator for &'a AgentRegistry {
    type Item = &'a Arc<AgentHandle>;
    type IntoIter = std::slice::Iter<'a, Arc<AgentHandle>>;

    fn into_iter(self) -> Self::IntoIter {
        self.agents.iter()
    }
}
