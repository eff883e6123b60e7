//! Azure Resource Graph query execution.
//!
//! Each inventory listing is one Resource Graph query, fetched page by page
//! with skip tokens through `az graph query`.

use super::cli;
use crate::config::Config;
use crate::models::{
    GenericResource, InventorySnapshot, NetworkInterface, PublicIpAddress, VirtualMachine,
    VirtualNetwork,
};
use crate::BoxError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Queries are passed single-quoted on the command line: no single quotes inside,
// and they must not end with a double quote.

const VIRTUAL_MACHINE_QUERY: &str = r#"resources
        | where type =~ "microsoft.compute/virtualmachines"
        | project id, name, location, tags
                ,network_interfaces=properties.networkProfile.networkInterfaces
        | order by id asc"#;

const NETWORK_INTERFACE_QUERY: &str = r#"resources
        | where type =~ "microsoft.network/networkinterfaces"
        | project id, ip_configurations=properties.ipConfigurations
        | order by id asc"#;

const PUBLIC_IP_QUERY: &str = r#"resources
        | where type =~ "microsoft.network/publicipaddresses"
        | project id, ip_address=properties.ipAddress
        | order by id asc"#;

const VIRTUAL_NETWORK_QUERY: &str = r#"resources
        | where type =~ "microsoft.network/virtualnetworks"
        | project id, name, location, tags, subnets=properties.subnets
        | order by id asc"#;

const RESOURCE_QUERY: &str = r#"resources
        | project id, name, type, location, tags
        | order by id asc"#;

/// One page returned by `az graph query`.
#[derive(Serialize, Deserialize, Debug)]
pub struct GraphPage<T> {
    /// Rows in this page.
    pub data: Vec<T>,
    /// Token for pagination (if more results available).
    pub skip_token: Option<String>,
    /// Total number of records matching the query.
    pub total_records: Option<u32>,
    /// Count of records in this page.
    pub count: i32,
}

/// Resource Graph query settings for one subscription.
#[derive(Debug, Clone)]
pub struct GraphQuery {
    pub subscription_id: String,
    pub page_size: u32,
    pub page_pause: Duration,
    pub cli_timeout: Duration,
}

impl GraphQuery {
    pub fn from_config(config: &Config) -> GraphQuery {
        GraphQuery {
            subscription_id: config.subscription_id.clone(),
            page_size: config.graph_page_size,
            page_pause: config.graph_page_pause,
            cli_timeout: config.cli_timeout,
        }
    }

    /// Command line for one page of `query`.
    fn command(&self, query: &str, skip_token: Option<&str>) -> String {
        let skip = skip_token
            .map(|t| format!("--skip-token {t} "))
            .unwrap_or_default();
        format!(
            "az graph query --subscriptions {sub} --first {first} {skip}-q '{query}' --output json",
            sub = self.subscription_id,
            first = self.page_size,
        )
    }

    /// Run `query` and collect the rows of every page.
    ///
    /// Any CLI or parse failure aborts the whole listing.
    pub async fn fetch_all<T: DeserializeOwned>(&self, name: &str, query: &str) -> Result<Vec<T>, BoxError> {
        let mut rows: Vec<T> = Vec::new();
        let mut skip_token: Option<String> = None;
        let mut count_blocks_returned = 0;

        loop {
            let cmd = self.command(query, skip_token.as_deref());
            let output = cli::run(&cmd, self.cli_timeout).await?;
            let page: GraphPage<T> = parse_page(&output).map_err(|e| {
                log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", output);
                format!("Error parsing {name} block {count_blocks_returned}: {e}")
            })?;

            let count = page.data.len();
            rows.extend(page.data);
            log::info!(
                "{name}: got block#{count_blocks_returned:2} record_count=+{count:3} => {total:3} of {expected:?}",
                total = rows.len(),
                expected = page.total_records,
            );
            count_blocks_returned += 1;

            match page.skip_token {
                Some(token) if !token.is_empty() && token != "null" => {
                    if skip_token.as_deref() == Some(token.as_str()) {
                        return Err(format!("{name}: skip token not unique - possible infinite loop").into());
                    }
                    skip_token = Some(token);
                    // Rate limiting pause
                    tokio::time::sleep(self.page_pause).await;
                }
                _ => break,
            }
        }

        Ok(rows)
    }

    /// Fetch every listing the enumerator needs.
    pub async fn snapshot(&self) -> Result<InventorySnapshot, BoxError> {
        let virtual_machines: Vec<VirtualMachine> =
            self.fetch_all("virtual_machines", VIRTUAL_MACHINE_QUERY).await?;
        let network_interfaces: Vec<NetworkInterface> =
            self.fetch_all("network_interfaces", NETWORK_INTERFACE_QUERY).await?;
        let public_ip_addresses: Vec<PublicIpAddress> =
            self.fetch_all("public_ip_addresses", PUBLIC_IP_QUERY).await?;
        let virtual_networks: Vec<VirtualNetwork> =
            self.fetch_all("virtual_networks", VIRTUAL_NETWORK_QUERY).await?;
        let resources: Vec<GenericResource> = self.fetch_all("resources", RESOURCE_QUERY).await?;

        let snapshot = InventorySnapshot {
            virtual_machines,
            network_interfaces,
            public_ip_addresses,
            virtual_networks,
            resources,
        };
        log::info!(
            "Inventory: {} VMs, {} NICs, {} public IPs, {} VNets, {} resources",
            snapshot.virtual_machines.len(),
            snapshot.network_interfaces.len(),
            snapshot.public_ip_addresses.len(),
            snapshot.virtual_networks.len(),
            snapshot.resources.len()
        );
        Ok(snapshot)
    }
}

/// Decode one page, reporting the JSON path of any mismatch.
fn parse_page<T: DeserializeOwned>(output: &str) -> Result<GraphPage<T>, BoxError> {
    let mut json_block_deserializer = serde_json::Deserializer::from_str(output);
    serde_path_to_error::deserialize(&mut json_block_deserializer)
        .map_err(|e| format!("path={} error={}", e.path(), e).into())
}
