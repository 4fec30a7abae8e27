// ABOUTME: DynamoDB client construction for AWS and DynamoDB Local endpoints
// ABOUTME: Resolves profile and region, and probes local endpoints before connecting

pub mod converter;
pub mod store;

pub use store::DynamoStore;

use crate::config::ConnectionConfig;
use anyhow::{bail, Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client;
use std::time::Duration;
use tokio::net::TcpStream;

const LOCAL_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Host and port of a DynamoDB Local endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEndpoint {
    pub host: String,
    pub port: u16,
}

/// Parse a local endpoint URL such as `http://localhost:8000`
///
/// The scheme is optional but the port is required.
///
/// # Examples
///
/// ```
/// # use dynamo_dump::dynamo::parse_local_endpoint;
/// let endpoint = parse_local_endpoint("http://192.168.99.100:8000").unwrap();
/// assert_eq!(endpoint.host, "192.168.99.100");
/// assert_eq!(endpoint.port, 8000);
///
/// assert!(parse_local_endpoint("http://localhost").is_err());
/// ```
pub fn parse_local_endpoint(url: &str) -> Result<LocalEndpoint> {
    let without_scheme = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    let authority = without_scheme.split('/').next().unwrap_or_default();

    let (host, port_text) = match authority.rsplit_once(':') {
        Some(parts) => parts,
        None => bail!(
            "Port not found in local endpoint '{}'. Please specify a port",
            url
        ),
    };
    if host.is_empty() {
        bail!("Host not found in local endpoint '{}'", url);
    }

    let port = port_text.parse::<u16>().with_context(|| {
        format!(
            "Port '{}' is not a number. Please specify a valid port",
            port_text
        )
    })?;

    Ok(LocalEndpoint {
        host: host.to_string(),
        port,
    })
}

/// Check that something is listening on a DynamoDB Local endpoint
pub async fn probe_local_endpoint(endpoint: &LocalEndpoint) -> Result<()> {
    let address = format!("{}:{}", endpoint.host, endpoint.port);
    tracing::debug!("Probing DynamoDB Local at {}", address);

    match tokio::time::timeout(LOCAL_PROBE_TIMEOUT, TcpStream::connect(&address)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => bail!(
            "DynamoDB Local does not appear to have been started. Checked port {}: {}",
            endpoint.port,
            e
        ),
        Err(_) => bail!(
            "DynamoDB Local does not appear to have been started. \
             Timed out after {:?} connecting to port {}",
            LOCAL_PROBE_TIMEOUT,
            endpoint.port
        ),
    }
}

/// Build a DynamoDB client from resolved connection settings
///
/// For a local endpoint the port is probed first so a missing DynamoDB Local
/// fails fast with a clear message instead of timing out on the first request.
pub async fn connect(config: &ConnectionConfig) -> Result<Client> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .profile_name(&config.profile)
        .region(aws_config::Region::new(config.region.clone()));

    if let Some(url) = &config.local_endpoint {
        let endpoint = parse_local_endpoint(url)?;
        probe_local_endpoint(&endpoint).await?;
        tracing::info!("Setting up a DynamoDB Local client for {}", url);
        loader = loader.endpoint_url(url);
    } else {
        tracing::info!(
            "Connecting to DynamoDB with profile {} in region {}",
            config.profile,
            config.region
        );
    }

    let sdk_config = loader.load().await;
    Ok(Client::new(&sdk_config))
}
