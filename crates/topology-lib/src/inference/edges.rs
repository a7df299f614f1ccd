//! Ordered, deduplicating collections used while building a graph

use crate::models::{DependencyEdge, EdgeKey, Service, UnresolvedReference};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Insertion-ordered set; the first value seen for a key wins
#[derive(Debug, Clone)]
pub struct OrderedSet<T, K = T> {
    seen: HashSet<K>,
    items: Vec<T>,
}

impl<T, K> Default for OrderedSet<T, K> {
    fn default() -> Self {
        Self {
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }
}

impl<T, K: Eq + Hash> OrderedSet<T, K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `key` is already present
    pub fn insert_keyed(&mut self, key: K, value: T) -> bool {
        if !self.seen.insert(key) {
            return false;
        }
        self.items.push(value);
        true
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Clone + Eq + Hash> OrderedSet<T> {
    /// Returns false if an equal value is already present
    pub fn insert(&mut self, value: T) -> bool {
        self.insert_keyed(value.clone(), value)
    }
}

/// Edges keyed on their natural tuple
pub type EdgeSet = OrderedSet<DependencyEdge, EdgeKey>;

impl EdgeSet {
    pub fn insert_edge(&mut self, edge: DependencyEdge) -> bool {
        self.insert_keyed(edge.key(), edge)
    }
}

/// Unresolved addresses, deduplicated on the whole record
pub type UnresolvedSet = OrderedSet<UnresolvedReference>;

/// Services indexed by `name.namespace`, in snapshot order
#[derive(Debug, Default)]
pub struct ServiceCatalog<'a> {
    index: HashMap<String, usize>,
    services: Vec<&'a Service>,
}

impl<'a> ServiceCatalog<'a> {
    /// Index `services`; returns the catalog and the keys that were duplicates
    pub fn build(services: &'a [Service]) -> (Self, Vec<String>) {
        let mut catalog = Self::default();
        let mut duplicates = Vec::new();
        for service in services {
            let key = service.key();
            if catalog.index.contains_key(&key) {
                duplicates.push(key);
                continue;
            }
            catalog.index.insert(key, catalog.services.len());
            catalog.services.push(service);
        }
        (catalog, duplicates)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&'a Service> {
        self.index.get(key).map(|i| self.services[*i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Service> + '_ {
        self.services.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Protocol, SourceKind, SourcePort};

    fn edge(source: &str, port: u16) -> DependencyEdge {
        DependencyEdge {
            source_key: source.to_string(),
            source_kind: SourceKind::Workload,
            source_port: SourcePort::Port(9000),
            dest_key: "billing.prod".to_string(),
            dest_port: port,
            protocol: Protocol::Http,
        }
    }

    #[test]
    fn test_edge_set_dedups_and_keeps_order() {
        let mut edges = EdgeSet::new();
        assert!(edges.insert_edge(edge("b.prod", 80)));
        assert!(edges.insert_edge(edge("a.prod", 80)));
        assert!(!edges.insert_edge(edge("b.prod", 80)));
        assert!(edges.insert_edge(edge("b.prod", 81)));

        let sources: Vec<_> = edges
            .into_vec()
            .into_iter()
            .map(|e| (e.source_key, e.dest_port))
            .collect();
        assert_eq!(
            sources,
            vec![
                ("b.prod".to_string(), 80),
                ("a.prod".to_string(), 80),
                ("b.prod".to_string(), 81)
            ]
        );
    }

    #[test]
    fn test_edge_key_ignores_source_kind() {
        let mut edges = EdgeSet::new();
        assert!(edges.insert_edge(edge("shared.prod", 80)));

        let mut same_tuple = edge("shared.prod", 80);
        same_tuple.source_kind = SourceKind::Secret;
        assert!(!edges.insert_edge(same_tuple));
        assert_eq!(edges.into_vec()[0].source_kind, SourceKind::Workload);
    }

    #[test]
    fn test_catalog_keeps_first_duplicate() {
        let services = vec![
            Service::new("api", "prod").with_port(80),
            Service::new("db", "prod"),
            Service::new("api", "prod").with_port(8080),
        ];
        let (catalog, duplicates) = ServiceCatalog::build(&services);

        assert_eq!(catalog.iter().count(), 2);
        assert_eq!(duplicates, vec!["api.prod".to_string()]);
        assert_eq!(catalog.get("api.prod").map(|s| s.ports[0].port), Some(80));
        assert!(catalog.contains("db.prod"));
        assert!(!catalog.contains("db.staging"));
    }
}
