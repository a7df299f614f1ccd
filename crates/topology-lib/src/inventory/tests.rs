//! Tests for snapshot ingestion
//!
//! Cluster objects are built from JSON the way the API server and
//! `kubectl` print them.

#[cfg(test)]
mod ingestion_tests {
    use crate::error::InventoryError;
    use crate::inventory::{
        config_map_entries, secret_entries, service_from_api, workload_from_pod, ConfigKind,
        ConfigValue, Inventory, InventorySource,
    };
    use crate::models::ContainerState;
    use crate::InferenceEngine;
    use async_trait::async_trait;
    use k8s_openapi::api::core::v1 as core;
    use k8s_openapi::ByteString;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn pod_json() -> serde_json::Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "checkout-7d9f",
                "namespace": "prod",
                "ownerReferences": [{
                    "apiVersion": "apps/v1",
                    "kind": "ReplicaSet",
                    "name": "checkout-7d",
                    "uid": "1234"
                }]
            },
            "spec": {
                "containers": [{
                    "name": "app",
                    "ports": [{"containerPort": 9000}, {"containerPort": 9001}],
                    "env": [
                        {"name": "BILLING_URL", "value": "http://billing.prod.svc.cluster.local:80"},
                        {"name": "DB_PASSWORD", "valueFrom": {"secretKeyRef": {"name": "db", "key": "pw"}}}
                    ],
                    "args": ["--auth=https://keycloak.iam.svc.cluster.local"]
                }]
            },
            "status": {
                "phase": "Running",
                "conditions": [{"type": "Ready", "status": "False", "reason": "ContainersNotReady"}],
                "containerStatuses": [{
                    "name": "app",
                    "ready": false,
                    "restartCount": 4,
                    "image": "checkout:1",
                    "imageID": "",
                    "state": {"waiting": {"reason": "CrashLoopBackOff", "message": "back-off"}}
                }]
            }
        })
    }

    #[test]
    fn test_pod_conversion() {
        let pod: core::Pod = serde_json::from_value(pod_json()).unwrap();
        let w = workload_from_pod(&pod);

        assert_eq!(w.key(), "checkout-7d9f.prod");
        assert_eq!(w.owner.as_deref(), Some("checkout-7d"));
        assert_eq!(w.phase, "Running");
        assert_eq!(w.conditions[0].condition_type, "Ready");
        assert_eq!(w.conditions[0].reason.as_deref(), Some("ContainersNotReady"));

        let c = &w.containers[0];
        assert_eq!(c.ports, vec![9000, 9001]);
        assert_eq!(c.env.len(), 1);
        assert_eq!(c.env[0].name, "BILLING_URL");
        assert_eq!(c.args.len(), 1);

        assert_eq!(
            w.container_statuses[0].state,
            Some(ContainerState::Waiting {
                reason: Some("CrashLoopBackOff".to_string()),
                message: Some("back-off".to_string()),
            })
        );
    }

    #[test]
    fn test_pod_defaults_for_missing_fields() {
        let pod: core::Pod =
            serde_json::from_value(json!({"apiVersion": "v1", "kind": "Pod", "metadata": {}}))
                .unwrap();
        let w = workload_from_pod(&pod);
        assert_eq!(w.name, "unknown");
        assert_eq!(w.namespace, "default");
        assert_eq!(w.phase, "Unknown");
        assert!(w.owner.is_none());
        assert!(w.containers.is_empty());
    }

    #[test]
    fn test_service_conversion_defaults() {
        let svc: core::Service = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {"name": "billing"},
            "spec": {
                "selector": {"app": "billing"},
                "ports": [
                    {"port": 80, "targetPort": 8080},
                    {"port": 443, "targetPort": "https", "protocol": "TCP"}
                ]
            }
        }))
        .unwrap();
        let s = service_from_api(&svc);

        assert_eq!(s.key(), "billing.default");
        assert_eq!(s.service_type, "ClusterIP");
        assert_eq!(s.ports.len(), 2);
        assert_eq!(s.ports[0].target_port, "8080");
        assert_eq!(s.ports[0].protocol, "TCP");
        assert_eq!(s.ports[1].target_port, "https");
        assert_eq!(s.selector, vec![("app".to_string(), "billing".to_string())]);
    }

    #[test]
    fn test_config_map_and_secret_entries() {
        let mut cm = core::ConfigMap::default();
        cm.metadata.name = Some("gateway".to_string());
        cm.metadata.namespace = Some("edge".to_string());
        cm.data = Some(BTreeMap::from([(
            "upstream".to_string(),
            "http://api.prod.svc.cluster.local".to_string(),
        )]));
        let entries = config_map_entries(&cm);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source.kind, ConfigKind::ConfigMap);
        assert_eq!(entries[0].source.key(), "configmap/gateway.edge");

        let mut secret = core::Secret::default();
        secret.metadata.name = Some("creds".to_string());
        secret.data = Some(BTreeMap::from([
            ("url".to_string(), ByteString(b"https://auth.iam.svc.cluster.local".to_vec())),
            ("cert".to_string(), ByteString(vec![0xff, 0xfe, 0x00])),
        ]));
        let entries = secret_entries(&secret);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source.namespace, "default");

        let decoded: Vec<_> = entries.iter().map(|e| e.value.decode().is_some()).collect();
        // BTreeMap order: "cert" before "url"
        assert_eq!(decoded, vec![false, true]);
    }

    #[test]
    fn test_config_value_decoding() {
        assert_eq!(
            ConfigValue::Text("plain".to_string()).decode().as_deref(),
            Some("plain")
        );
        assert_eq!(
            ConfigValue::Base64("aGVsbG8=".to_string()).decode().as_deref(),
            Some("hello")
        );
        assert!(ConfigValue::Base64("%%%".to_string()).decode().is_none());
        // valid base64 of non-UTF-8 bytes
        assert!(ConfigValue::Base64("//79".to_string()).decode().is_none());
        assert!(ConfigValue::Bytes(vec![0xc3, 0x28]).decode().is_none());
    }

    #[test]
    fn test_kubectl_list_document() {
        let doc = json!({
            "apiVersion": "v1",
            "kind": "List",
            "items": [
                pod_json(),
                {
                    "apiVersion": "v1",
                    "kind": "Service",
                    "metadata": {"name": "billing", "namespace": "prod"},
                    "spec": {"type": "ClusterIP", "ports": [{"port": 80}]}
                },
                {
                    "apiVersion": "v1",
                    "kind": "Secret",
                    "metadata": {"name": "creds", "namespace": "prod"},
                    "data": {
                        "good": "aHR0cDovL2JpbGxpbmcucHJvZC5zdmMuY2x1c3Rlci5sb2NhbDo4MA==",
                        "bad": "not-base64!"
                    }
                },
                {
                    "apiVersion": "v1",
                    "kind": "ConfigMap",
                    "metadata": {"name": "cfg", "namespace": "prod"},
                    "data": {"a": "b"}
                },
                {"apiVersion": "apps/v1", "kind": "Deployment", "metadata": {"name": "x"}},
                {"apiVersion": "v1", "kind": "Pod", "metadata": {"name": "broken"}, "spec": "oops"}
            ]
        });

        let inventory = Inventory::from_kubectl_json(&doc.to_string()).unwrap();
        assert_eq!(inventory.workloads.len(), 1);
        assert_eq!(inventory.services.len(), 1);
        assert_eq!(inventory.config_entries.len(), 3);
        assert!(inventory.captured_at > 0);

        let secrets: Vec<_> = inventory
            .config_entries
            .iter()
            .filter(|e| e.source.kind == ConfigKind::Secret)
            .collect();
        assert_eq!(secrets.len(), 2);
        assert!(secrets
            .iter()
            .all(|e| matches!(e.value, ConfigValue::Base64(_))));

        let graph = InferenceEngine::default().infer(&inventory);
        let sources: Vec<_> = graph.edges.iter().map(|e| e.source_key.as_str()).collect();
        assert_eq!(sources, vec!["checkout-7d9f.prod", "secret/creds.prod"]);
        assert_eq!(graph.unhealthy_workloads.len(), 1);
        assert_eq!(graph.unhealthy_workloads[0].reason, "ContainersNotReady");
    }

    #[test]
    fn test_single_object_document() {
        let inventory = Inventory::from_kubectl_json(&pod_json().to_string()).unwrap();
        assert_eq!(inventory.workloads.len(), 1);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            Inventory::from_kubectl_json("{not json"),
            Err(InventoryError::Json(_))
        ));
        assert!(matches!(
            Inventory::from_kubectl_json("[1, 2]"),
            Err(InventoryError::NotAnObject("array"))
        ));
    }

    #[test]
    fn test_retain_namespace() {
        let doc = json!({
            "kind": "List",
            "items": [
                pod_json(),
                {"kind": "Service", "apiVersion": "v1", "metadata": {"name": "a", "namespace": "prod"}},
                {"kind": "Service", "apiVersion": "v1", "metadata": {"name": "b", "namespace": "staging"}}
            ]
        });
        let mut inventory = Inventory::from_kubectl_json(&doc.to_string()).unwrap();
        inventory.retain_namespace("staging");
        assert!(inventory.workloads.is_empty());
        assert_eq!(inventory.services.len(), 1);
        assert_eq!(inventory.services[0].name, "b");
        assert!(!inventory.is_empty());

        inventory.retain_namespace("dev");
        assert!(inventory.is_empty());
    }

    struct StaticSource(Inventory);

    #[async_trait]
    impl InventorySource for StaticSource {
        async fn snapshot(&self) -> anyhow::Result<Inventory> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    #[tokio::test]
    async fn test_inventory_source_seam() {
        let source: Box<dyn InventorySource> =
            Box::new(StaticSource(Inventory::from_kubectl_json(&pod_json().to_string()).unwrap()));
        let inventory = source.snapshot().await.unwrap();
        assert_eq!(source.describe(), "static");
        assert_eq!(inventory.workloads[0].name, "checkout-7d9f");
    }
}
