//! Scope-owned collection of the parameters built during one schema load.
//!
//! The registry is passed by `&mut` into whatever builds parameters, so its
//! lifetime is the load call rather than the process. It only holds weak
//! references: dropping an element drops its parameters even if the registry
//! outlives it.

use std::sync::Weak;

use parking_lot::RwLock;

use crate::param::{Param, ParamPtr};

#[derive(Debug)]
pub struct ParamRegistry {
    params: Vec<Weak<RwLock<Param>>>,
    active: bool,
}

impl ParamRegistry {
    /// Create an active registry.
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            active: true,
        }
    }

    /// Create a registry that ignores registrations until activated.
    pub fn inactive() -> Self {
        Self {
            params: Vec::new(),
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Record `param`. A no-op while the registry is inactive.
    ///
    /// Entries whose parameter has been dropped are discarded here.
    pub fn register(&mut self, param: &ParamPtr) {
        if !self.active {
            return;
        }
        self.params.retain(|p| p.strong_count() > 0);
        self.params.push(std::sync::Arc::downgrade(param));
    }

    /// Live parameters in registration order.
    pub fn iter(&self) -> impl Iterator<Item = ParamPtr> + '_ {
        self.params.iter().filter_map(Weak::upgrade)
    }

    /// Number of parameters still alive.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every recorded parameter. The parameters themselves are untouched.
    pub fn clear(&mut self) {
        self.params.clear();
    }

    /// Look up the first live parameter with the given key.
    pub fn find(&self, key: &str) -> Option<ParamPtr> {
        self.iter().find(|p| p.read().key() == key)
    }
}

impl Default for ParamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
