//! SSH-relay IP range lookup.
//!
//! The provider publishes its service IP ranges as a JSON document. The
//! security group's SSH rule is pinned to the relay service's ranges for
//! the deployment region instead of opening port 22 to the world. The
//! lookup sits behind [`RelayRangeSource`] so synthesis never touches the
//! network in tests.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::LookupError;

/// Published location of the provider IP-range document.
pub const IP_RANGES_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";

/// Service tag of the managed SSH relay.
pub const RELAY_SERVICE: &str = "EC2_INSTANCE_CONNECT";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_ATTEMPTS: u32 = 3;

/// Resolves the relay CIDR ranges for a region.
pub trait RelayRangeSource {
    /// Returns the relay CIDRs for `region`, or [`LookupError`] when the
    /// document is unavailable or carries no entry for the region.
    fn relay_ranges(&self, region: &str) -> Result<Vec<String>, LookupError>;
}

/// One prefix entry of the ip-ranges document.
#[derive(Debug, Clone, Deserialize)]
pub struct IpPrefix {
    pub ip_prefix: String,
    pub region: String,
    pub service: String,
}

/// The parsed ip-ranges document.
#[derive(Debug, Clone, Deserialize)]
pub struct IpRangesDoc {
    pub prefixes: Vec<IpPrefix>,
}

/// Relay ranges backed by the provider's published document.
#[derive(Debug, Clone)]
pub struct PublishedIpRanges {
    doc: IpRangesDoc,
}

impl PublishedIpRanges {
    pub fn from_document(doc: IpRangesDoc) -> Self {
        Self { doc }
    }

    /// Parse a raw ip-ranges JSON document.
    pub fn parse(json: &str) -> Result<Self, LookupError> {
        let doc: IpRangesDoc =
            serde_json::from_str(json).map_err(|e| LookupError::Malformed(e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    /// Download and parse the published document.
    ///
    /// Bounded retry with a hard per-request timeout; an unreachable
    /// endpoint must fail the lookup, not hang synthesis.
    pub async fn fetch(url: &str) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| LookupError::Unreachable(e.to_string()))?;

        let mut last_err = String::new();
        for attempt in 1..=FETCH_ATTEMPTS {
            match client.get(url).send().await {
                Ok(resp) => match resp.error_for_status() {
                    Ok(resp) => {
                        let doc: IpRangesDoc = resp
                            .json()
                            .await
                            .map_err(|e| LookupError::Malformed(e.to_string()))?;
                        debug!(prefixes = doc.prefixes.len(), "fetched ip-ranges document");
                        return Ok(Self::from_document(doc));
                    }
                    Err(e) => last_err = e.to_string(),
                },
                Err(e) => last_err = e.to_string(),
            }
            warn!(attempt, error = %last_err, "ip-ranges fetch failed");
            if attempt < FETCH_ATTEMPTS {
                tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
            }
        }
        Err(LookupError::Unreachable(last_err))
    }
}

impl RelayRangeSource for PublishedIpRanges {
    fn relay_ranges(&self, region: &str) -> Result<Vec<String>, LookupError> {
        let ranges: Vec<String> = self
            .doc
            .prefixes
            .iter()
            .filter(|p| p.service == RELAY_SERVICE && p.region == region)
            .map(|p| p.ip_prefix.clone())
            .collect();
        if ranges.is_empty() {
            return Err(LookupError::NoRangeForRegion(region.to_string()));
        }
        Ok(ranges)
    }
}

/// Fixed region → CIDR map, for tests and offline synthesis.
#[derive(Debug, Clone, Default)]
pub struct StaticRelayRanges {
    ranges: HashMap<String, Vec<String>>,
}

impl StaticRelayRanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: &str, cidrs: &[&str]) -> Self {
        self.ranges.insert(
            region.to_string(),
            cidrs.iter().map(|c| c.to_string()).collect(),
        );
        self
    }
}

impl RelayRangeSource for StaticRelayRanges {
    fn relay_ranges(&self, region: &str) -> Result<Vec<String>, LookupError> {
        self.ranges
            .get(region)
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(|| LookupError::NoRangeForRegion(region.to_string()))
    }
}
