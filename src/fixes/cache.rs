//! Memoized quick fixes keyed by diagnostic message and start position

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::types::{Diagnostic, Fix};

/// Cache key: (message, start line, start column)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixKey {
    pub message: String,
    pub line: usize,
    pub character: usize,
}

impl FixKey {
    pub fn of(diagnostic: &Diagnostic) -> Self {
        Self {
            message: diagnostic.message.clone(),
            line: diagnostic.range.start.line,
            character: diagnostic.range.start.character,
        }
    }
}

/// Fixes synthesized so far in one document session
#[derive(Debug, Default)]
pub struct FixCache {
    entries: HashMap<FixKey, Arc<Fix>>,
}

impl FixCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &FixKey) -> Option<Arc<Fix>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: FixKey, fix: Fix) -> Arc<Fix> {
        let fix = Arc::new(fix);
        self.entries.insert(key, Arc::clone(&fix));
        fix
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
