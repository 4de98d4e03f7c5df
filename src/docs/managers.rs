//! Document-type registry.
//!
//! Maps a document's type key to the manager that knows how the type is
//! routed. Types without a registered manager have no dispatch rules.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DocTypeConfig;
use crate::docs::model::DocKind;
use crate::routing::matcher::{AnyMatcher, Matcher, Params, PatternError, RoutePattern};

/// Routing capabilities of one document type.
#[derive(Debug, Clone, Default)]
pub struct DocManager {
    pub kind: DocKind,
    rules: AnyMatcher,
}

impl DocManager {
    pub fn new(kind: DocKind, rules: Vec<RoutePattern>) -> Self {
        Self {
            kind,
            rules: AnyMatcher::new(rules),
        }
    }

    /// Compile a manager from pattern strings.
    pub fn from_patterns<S: AsRef<str>>(kind: DocKind, patterns: &[S]) -> Result<Self, PatternError> {
        let rules = patterns
            .iter()
            .map(|p| RoutePattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(kind, rules))
    }

    pub fn rules(&self) -> &[RoutePattern] {
        self.rules.patterns()
    }

    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }

    /// Whether `remainder` is routable for this type. No rules accepts everything.
    pub fn accepts(&self, remainder: &str) -> bool {
        !self.has_rules() || self.rules.matches(remainder)
    }

    /// Parameters of the first matching rule.
    pub fn dispatch(&self, remainder: &str) -> Option<Params> {
        self.rules.captures(remainder)
    }
}

/// Registry of document types.
#[derive(Debug, Clone, Default)]
pub struct ManagerRegistry {
    managers: HashMap<String, Arc<DocManager>>,
}

impl ManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from validated configuration.
    pub fn from_config(types: &[DocTypeConfig]) -> Result<Self, PatternError> {
        let mut registry = Self::new();
        for doc_type in types {
            let manager = DocManager::from_patterns(doc_type.kind, &doc_type.dispatch)?;
            tracing::debug!(
                doc_type = %doc_type.name,
                kind = ?manager.kind,
                rules = ?manager.rules().iter().map(RoutePattern::as_str).collect::<Vec<_>>(),
                "Registered document type"
            );
            registry.register(doc_type.name.clone(), manager);
        }
        Ok(registry)
    }

    pub fn register(&mut self, doc_type: impl Into<String>, manager: DocManager) {
        self.managers.insert(doc_type.into(), Arc::new(manager));
    }

    pub fn get(&self, doc_type: &str) -> Option<Arc<DocManager>> {
        self.managers.get(doc_type).cloned()
    }

    /// Kind of a type; unregistered types are pages.
    pub fn kind_of(&self, doc_type: &str) -> DocKind {
        self.managers.get(doc_type).map(|m| m.kind).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}
