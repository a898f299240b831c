//! Resource graph model.
//!
//! The synthesizer's output: a declarative description of every cloud
//! resource in the deployment and how they reference each other. The graph
//! is provider-shaped but engine-agnostic; it serializes to a JSON template
//! document for whatever provisioning backend consumes it.

use serde::{Deserialize, Serialize};

/// Virtual network for the deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NetworkSpec {
    /// A dedicated network created for this stack.
    Dedicated { cidr: String, max_azs: u32 },
    /// The provider's pre-existing default network.
    DefaultVpc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// Source of an ingress rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Peer {
    AnyIpv4,
    Cidr { cidr: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub protocol: Protocol,
    pub port: u16,
    pub source: Peer,
    pub label: String,
}

/// Inbound access policy attached to the node template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirewallRuleSet {
    pub logical_id: String,
    pub allow_all_outbound: bool,
    pub rules: Vec<FirewallRule>,
}

impl FirewallRuleSet {
    /// Distinct ports permitted by any rule.
    pub fn open_ports(&self) -> Vec<u16> {
        let mut ports: Vec<u16> = self.rules.iter().map(|r| r.port).collect();
        ports.sort_unstable();
        ports.dedup();
        ports
    }
}

/// What happens to a bucket when the stack is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    Destroy,
    Retain,
}

/// Object expiration rule for a bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleRule {
    pub expiration_days: u32,
    /// Cap on retained versions, if the provider supports one.
    pub max_versions_retained: Option<u32>,
}

/// An object-storage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSpec {
    pub logical_id: String,
    /// Deterministic physical name, derived from the stack config.
    pub name: String,
    pub removal_policy: RemovalPolicy,
    pub lifecycle: Option<LifecycleRule>,
}

impl BucketSpec {
    pub fn arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.name)
    }

    /// ARN pattern matching every object in the bucket.
    pub fn object_arn_pattern(&self) -> String {
        format!("{}/*", self.arn())
    }

    /// Regional HTTPS endpoint for the bucket.
    pub fn regional_endpoint(&self, region: &str) -> String {
        format!("{}.s3.{}.amazonaws.com", self.name, region)
    }
}

/// One statement of an identity policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyStatement {
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

/// Least-privilege identity assumed by compute nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub logical_id: String,
    /// Service principal allowed to assume the role.
    pub principal: String,
    pub statements: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSpec {
    pub device_name: String,
    pub size_gib: u32,
    pub encrypted: bool,
}

/// Launch configuration for compute nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplateSpec {
    pub logical_id: String,
    pub instance_type: String,
    pub machine_image: String,
    pub disk: DiskSpec,
    /// Logical id of the firewall rule set.
    pub security_group: String,
    /// Logical id of the access role.
    pub role: String,
    /// First-boot script body.
    pub user_data: String,
}

/// Provider-managed pool keeping 1–2 nodes running from the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingGroupSpec {
    pub logical_id: String,
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub desired_capacity: u32,
    /// Logical id of the node template.
    pub node_template: String,
}

/// The compose descriptor placed in the artifact bucket at deploy time.
///
/// The graph records the source and its digest; the upload itself is the
/// provisioning engine's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDeployment {
    /// Logical id of the destination bucket.
    pub bucket: String,
    pub key: String,
    pub source_path: String,
    pub sha256: String,
}

/// Named value surfaced after a successful deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub value: String,
}

/// The complete deployment descriptor: exactly one of each resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGraph {
    pub stack_name: String,
    pub region: String,
    pub network: NetworkSpec,
    pub firewall: FirewallRuleSet,
    pub artifact_bucket: BucketSpec,
    pub backup_bucket: BucketSpec,
    pub role: RoleSpec,
    pub node_template: NodeTemplateSpec,
    pub scaling_group: ScalingGroupSpec,
    pub artifact: ArtifactDeployment,
    pub outputs: Vec<Output>,
}

impl ResourceGraph {
    /// Serialize to the JSON template document.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(name: &str) -> BucketSpec {
        BucketSpec {
            logical_id: "BackupBucket".to_string(),
            name: name.to_string(),
            removal_policy: RemovalPolicy::Retain,
            lifecycle: Some(LifecycleRule {
                expiration_days: 30,
                max_versions_retained: None,
            }),
        }
    }

    #[test]
    fn test_bucket_arns() {
        let b = bucket("ledgerstack-backup-eu-west-1");
        assert_eq!(b.arn(), "arn:aws:s3:::ledgerstack-backup-eu-west-1");
        assert_eq!(
            b.object_arn_pattern(),
            "arn:aws:s3:::ledgerstack-backup-eu-west-1/*"
        );
    }

    #[test]
    fn test_regional_endpoint() {
        let b = bucket("ledgerstack-env-eu-west-1");
        assert_eq!(
            b.regional_endpoint("eu-west-1"),
            "ledgerstack-env-eu-west-1.s3.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_open_ports_deduped_and_sorted() {
        let fw = FirewallRuleSet {
            logical_id: "SecurityGroup".to_string(),
            allow_all_outbound: true,
            rules: vec![
                FirewallRule {
                    protocol: Protocol::Tcp,
                    port: 443,
                    source: Peer::AnyIpv4,
                    label: "Allow HTTPS".to_string(),
                },
                FirewallRule {
                    protocol: Protocol::Tcp,
                    port: 22,
                    source: Peer::Cidr { cidr: "18.202.216.48/29".to_string() },
                    label: "Allow SSH from relay".to_string(),
                },
                FirewallRule {
                    protocol: Protocol::Tcp,
                    port: 22,
                    source: Peer::Cidr { cidr: "3.8.37.24/29".to_string() },
                    label: "Allow SSH from relay".to_string(),
                },
            ],
        };
        assert_eq!(fw.open_ports(), vec![22, 443]);
    }

    #[test]
    fn test_network_spec_serializes_tagged() {
        let json = serde_json::to_string(&NetworkSpec::Dedicated {
            cidr: "10.0.0.0/16".to_string(),
            max_azs: 2,
        })
        .unwrap();
        assert!(json.contains("\"kind\":\"dedicated\""));
    }
}
