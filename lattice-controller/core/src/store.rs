//! Maps Kubernetes names of services, listeners and target groups to the
//! identifiers the remote service assigned them.
//!
//! Each kind of resource is populated by its own reconciler, so each
//! mapping is locked independently. A rule can only be reconciled once all
//! of the resources it refers to have an entry here.

use ahash::AHashMap as HashMap;
use parking_lot::RwLock;
use std::{hash::Hash, sync::Arc};

pub type SharedStore = Arc<IdentifierStore>;

#[derive(Debug, Default)]
pub struct IdentifierStore {
    services: Mapping<ServiceKey, ServiceRecord>,
    listeners: Mapping<ListenerKey, ListenerRecord>,
    target_groups: Mapping<TargetGroupKey, TargetGroupRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    pub name: String,
    pub namespace: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceRecord {
    pub arn: String,
    pub id: String,
    pub dns: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    pub service_name: String,
    pub service_namespace: String,
    pub port: u16,
    pub protocol: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerRecord {
    pub arn: String,
    pub id: String,
}

/// Target groups are keyed by their generated name; see
/// [`target_group_name`]. Imported target groups share the name space of
/// local ones, so the key also records which kind it is.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetGroupKey {
    pub name: String,
    pub is_service_import: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetGroupRecord {
    pub vpc: String,
    pub arn: String,
    pub id: String,
    pub is_service_import: bool,
}

#[derive(Debug)]
struct Mapping<K, V>(RwLock<HashMap<K, V>>);

/// The name a target group is registered under for a backend.
pub fn target_group_name(name: &str, namespace: &str) -> String {
    format!("k8s-{name}-{namespace}")
}

// === impl IdentifierStore ===

impl IdentifierStore {
    pub fn shared() -> SharedStore {
        Arc::new(Self::default())
    }

    pub fn add_service(
        &self,
        name: impl ToString,
        namespace: impl ToString,
        arn: impl ToString,
        id: impl ToString,
        dns: impl ToString,
    ) {
        self.upsert_service(
            ServiceKey::new(name, namespace),
            ServiceRecord {
                arn: arn.to_string(),
                id: id.to_string(),
                dns: dns.to_string(),
            },
        );
    }

    pub fn add_listener(
        &self,
        name: impl ToString,
        namespace: impl ToString,
        port: u16,
        protocol: impl ToString,
        arn: impl ToString,
        id: impl ToString,
    ) {
        self.upsert_listener(
            ListenerKey::new(name, namespace, port, protocol),
            ListenerRecord {
                arn: arn.to_string(),
                id: id.to_string(),
            },
        );
    }

    /// Registers a target group by its generated name.
    pub fn add_target_group(
        &self,
        name: impl ToString,
        vpc: impl ToString,
        arn: impl ToString,
        id: impl ToString,
        is_service_import: bool,
    ) {
        self.upsert_target_group(
            TargetGroupKey {
                name: name.to_string(),
                is_service_import,
            },
            TargetGroupRecord {
                vpc: vpc.to_string(),
                arn: arn.to_string(),
                id: id.to_string(),
                is_service_import,
            },
        );
    }

    pub fn upsert_service(&self, key: ServiceKey, record: ServiceRecord) {
        self.services.upsert(key, record)
    }

    pub fn get_service(&self, key: &ServiceKey) -> Option<ServiceRecord> {
        self.services.get(key)
    }

    pub fn remove_service(&self, key: &ServiceKey) -> Option<ServiceRecord> {
        self.services.remove(key)
    }

    pub fn upsert_listener(&self, key: ListenerKey, record: ListenerRecord) {
        self.listeners.upsert(key, record)
    }

    pub fn get_listener(&self, key: &ListenerKey) -> Option<ListenerRecord> {
        self.listeners.get(key)
    }

    pub fn remove_listener(&self, key: &ListenerKey) -> Option<ListenerRecord> {
        self.listeners.remove(key)
    }

    pub fn upsert_target_group(&self, key: TargetGroupKey, record: TargetGroupRecord) {
        self.target_groups.upsert(key, record)
    }

    pub fn get_target_group(&self, key: &TargetGroupKey) -> Option<TargetGroupRecord> {
        self.target_groups.get(key)
    }

    pub fn remove_target_group(&self, key: &TargetGroupKey) -> Option<TargetGroupRecord> {
        self.target_groups.remove(key)
    }
}

// === impl ServiceKey ===

impl ServiceKey {
    pub fn new(name: impl ToString, namespace: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

// === impl ListenerKey ===

impl ListenerKey {
    pub fn new(
        service_name: impl ToString,
        service_namespace: impl ToString,
        port: u16,
        protocol: impl ToString,
    ) -> Self {
        Self {
            service_name: service_name.to_string(),
            service_namespace: service_namespace.to_string(),
            port,
            protocol: protocol.to_string(),
        }
    }
}

// === impl TargetGroupKey ===

impl TargetGroupKey {
    /// The key of the target group backing `name` in `namespace`.
    pub fn for_backend(name: &str, namespace: &str, is_service_import: bool) -> Self {
        Self {
            name: target_group_name(name, namespace),
            is_service_import,
        }
    }
}

// === impl Mapping ===

impl<K, V> Default for Mapping<K, V> {
    fn default() -> Self {
        Self(RwLock::new(HashMap::new()))
    }
}

impl<K: Eq + Hash, V: Clone> Mapping<K, V> {
    fn upsert(&self, key: K, value: V) {
        self.0.write().insert(key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        self.0.read().get(key).cloned()
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.0.write().remove(key)
    }
}
