//! Inventory sources: the live cluster API and saved `kubectl` JSON files

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret, Service};
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::path::PathBuf;
use topology_lib::inventory::{
    config_map_entries, secret_entries, service_from_api, workload_from_pod,
};
use topology_lib::{Inventory, InventorySource};
use tracing::{info, warn};

/// Connection settings for the cluster API
#[derive(Debug, Clone, Default)]
pub struct ClusterOptions {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub namespace: Option<String>,
}

/// Build a client from an explicit kubeconfig, a named context, or inference
pub async fn connect(options: &ClusterOptions) -> Result<Client> {
    let kube_options = KubeConfigOptions {
        context: options.context.clone(),
        ..Default::default()
    };

    let config = match &options.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
            kube::Config::from_custom_kubeconfig(kubeconfig, &kube_options)
                .await
                .context("Invalid kubeconfig")?
        }
        None if options.context.is_some() => kube::Config::from_kubeconfig(&kube_options)
            .await
            .context("Failed to load kubeconfig context")?,
        None => kube::Config::infer()
            .await
            .context("Failed to infer cluster configuration")?,
    };

    Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Lists pods, services, configmaps and secrets from a live cluster
pub struct KubeInventory {
    client: Client,
    namespace: Option<String>,
    include_config_stores: bool,
}

impl KubeInventory {
    pub fn new(client: Client, namespace: Option<String>, include_config_stores: bool) -> Self {
        Self {
            client,
            namespace,
            include_config_stores,
        }
    }

    fn api<K>(&self) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        match &self.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }
}

#[async_trait]
impl InventorySource for KubeInventory {
    async fn snapshot(&self) -> Result<Inventory> {
        let lp = ListParams::default();
        let mut inventory = Inventory::captured_now();

        let pods = self
            .api::<Pod>()
            .list(&lp)
            .await
            .context("Failed to list pods")?;
        inventory.workloads = pods.items.iter().map(workload_from_pod).collect();

        let services = self
            .api::<Service>()
            .list(&lp)
            .await
            .context("Failed to list services")?;
        inventory.services = services.items.iter().map(service_from_api).collect();

        if self.include_config_stores {
            // Missing RBAC for config stores degrades the graph, it does not abort it
            match self.api::<ConfigMap>().list(&lp).await {
                Ok(list) => inventory
                    .config_entries
                    .extend(list.items.iter().flat_map(config_map_entries)),
                Err(e) => warn!(error = %e, "Could not list configmaps, skipping"),
            }
            match self.api::<Secret>().list(&lp).await {
                Ok(list) => inventory
                    .config_entries
                    .extend(list.items.iter().flat_map(secret_entries)),
                Err(e) => warn!(error = %e, "Could not list secrets, skipping"),
            }
        }

        info!(
            pods = inventory.workloads.len(),
            services = inventory.services.len(),
            "Listed cluster inventory"
        );
        Ok(inventory)
    }

    fn describe(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("cluster:{}", ns),
            None => "cluster:all-namespaces".to_string(),
        }
    }
}

/// Reads a `kubectl get pods,services,configmaps,secrets -A -o json` dump
pub struct FileInventory {
    path: PathBuf,
    namespace: Option<String>,
}

impl FileInventory {
    pub fn new(path: impl Into<PathBuf>, namespace: Option<String>) -> Self {
        Self {
            path: path.into(),
            namespace,
        }
    }
}

#[async_trait]
impl InventorySource for FileInventory {
    async fn snapshot(&self) -> Result<Inventory> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot {}", self.path.display()))?;
        let mut inventory = Inventory::from_kubectl_json(&text)
            .with_context(|| format!("Failed to parse snapshot {}", self.path.display()))?;
        if let Some(ns) = &self.namespace {
            inventory.retain_namespace(ns);
        }
        Ok(inventory)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Pick the inventory source for a command
pub async fn open_source(
    options: &ClusterOptions,
    from_file: Option<PathBuf>,
    include_config_stores: bool,
) -> Result<Box<dyn InventorySource>> {
    match from_file {
        Some(path) => Ok(Box::new(FileInventory::new(path, options.namespace.clone()))),
        None => {
            let client = connect(options).await?;
            Ok(Box::new(KubeInventory::new(
                client,
                options.namespace.clone(),
                include_config_stores,
            )))
        }
    }
}
