use kube::{Resource, ResourceExt};

/// Identifies a namespaced Kubernetes object.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn of<K: Resource>(resource: &K) -> Self {
        Self {
            namespace: resource.namespace().unwrap_or_default(),
            name: resource.name_any(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::{api::core::v1::Service, apimachinery::pkg::apis::meta::v1::ObjectMeta};

    #[test]
    fn from_resource() {
        let svc = Service {
            metadata: ObjectMeta {
                namespace: Some("default".to_string()),
                name: Some("svc-1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let id = ResourceId::of(&svc);
        assert_eq!(id, ResourceId::new("default", "svc-1"));
        assert_eq!(id.to_string(), "default/svc-1");
    }
}
