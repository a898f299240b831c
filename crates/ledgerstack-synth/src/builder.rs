//! Resource graph synthesis.
//!
//! Turns a validated [`Config`] into the full deployment descriptor: one
//! network, one firewall rule set, the artifact and backup buckets, the
//! node role, the launch template with its first-boot script, and the
//! scaling group. Synthesis is deterministic: the same config and relay
//! ranges always produce an equal graph. Every fallible step runs before
//! the graph value is assembled, so a failure never leaks a partial graph.

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use ledgerstack_bootstrap::{render_cloud_init, retention_ok, BootstrapParams, BACKUP_INTERVAL_DAYS};
use ledgerstack_core::{
    ArtifactDeployment, BucketSpec, Config, DiskSpec, FirewallRule, FirewallRuleSet,
    LifecycleRule, NetworkSpec, NodeTemplateSpec, Output, Peer, Protocol, RemovalPolicy,
    ResourceGraph, RoleSpec, ScalingGroupSpec, SshPolicy,
};

use crate::error::{SynthError, SynthResult};
use crate::policy::{access_statements, COMPUTE_PRINCIPAL};
use crate::relay::RelayRangeSource;

/// Object key of the compose descriptor in the artifact bucket.
pub const COMPOSE_OBJECT_KEY: &str = "docker-compose.yml";

/// Days before a backup object expires. Must cover three backup cycles.
pub const BACKUP_EXPIRATION_DAYS: u32 = 30;

const NETWORK_CIDR: &str = "10.0.0.0/16";
const NETWORK_MAX_AZS: u32 = 2;
const INSTANCE_TYPE: &str = "t2.micro";
const MACHINE_IMAGE: &str = "amazon-linux-2";
const ROOT_DEVICE: &str = "/dev/xvda";
const ROOT_DISK_GIB: u32 = 8;
const MIN_NODES: u32 = 1;
const MAX_NODES: u32 = 2;
const DESIRED_NODES: u32 = 1;

/// The compose descriptor to be uploaded at deploy time.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSource {
    pub path: String,
    pub sha256: String,
}

impl ArtifactSource {
    /// Digest the descriptor content so redeploys can detect drift.
    pub fn from_bytes(path: &str, bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self {
            path: path.to_string(),
            sha256: hex::encode(digest),
        }
    }
}

/// Synthesize the deployment descriptor.
///
/// `relay` is only consulted when the config asks for SSH ingress; lookup
/// failure aborts synthesis with [`SynthError::Lookup`].
pub fn synthesize(
    config: &Config,
    relay: &dyn RelayRangeSource,
    artifact: &ArtifactSource,
) -> SynthResult<ResourceGraph> {
    config.validate()?;

    if !retention_ok(BACKUP_EXPIRATION_DAYS, BACKUP_INTERVAL_DAYS) {
        return Err(SynthError::Retention {
            expiration_days: BACKUP_EXPIRATION_DAYS,
            interval_days: BACKUP_INTERVAL_DAYS,
        });
    }

    // Resolve the SSH source ranges first; this is the only fallible
    // collaborator and nothing may be built before it succeeds.
    let ssh_ranges = match config.ssh {
        SshPolicy::RelayRestricted => Some(relay.relay_ranges(&config.region)?),
        SshPolicy::Disabled => None,
    };

    info!(
        stack = %config.stack_name,
        region = %config.region,
        ssh = ?config.ssh,
        "synthesizing deployment descriptor"
    );

    let artifact_bucket = BucketSpec {
        logical_id: "EnvBucket".to_string(),
        name: bucket_name(config, "env"),
        removal_policy: RemovalPolicy::Destroy,
        lifecycle: None,
    };
    let backup_bucket = BucketSpec {
        logical_id: "BackupBucket".to_string(),
        name: bucket_name(config, "backup"),
        removal_policy: RemovalPolicy::Retain,
        lifecycle: Some(LifecycleRule {
            expiration_days: BACKUP_EXPIRATION_DAYS,
            max_versions_retained: None,
        }),
    };

    let firewall = firewall_rules(ssh_ranges.as_deref());
    debug!(rules = firewall.rules.len(), "firewall rule set built");

    let role = RoleSpec {
        logical_id: "NodeRole".to_string(),
        principal: COMPUTE_PRINCIPAL.to_string(),
        statements: access_statements(&artifact_bucket, &backup_bucket),
    };

    let params = BootstrapParams::new(
        &artifact_bucket.name,
        &backup_bucket.name,
        &config.data_dir,
    )
    .with_domain(config.domain_name.as_deref());
    let node_template = NodeTemplateSpec {
        logical_id: "NodeTemplate".to_string(),
        instance_type: INSTANCE_TYPE.to_string(),
        machine_image: MACHINE_IMAGE.to_string(),
        disk: DiskSpec {
            device_name: ROOT_DEVICE.to_string(),
            size_gib: ROOT_DISK_GIB,
            encrypted: true,
        },
        security_group: firewall.logical_id.clone(),
        role: role.logical_id.clone(),
        user_data: render_cloud_init(&params),
    };

    let scaling_group = ScalingGroupSpec {
        logical_id: "ScalingGroup".to_string(),
        min_capacity: MIN_NODES,
        max_capacity: MAX_NODES,
        desired_capacity: DESIRED_NODES,
        node_template: node_template.logical_id.clone(),
    };

    let outputs = vec![
        Output {
            name: "BackupBucketName".to_string(),
            value: backup_bucket.name.clone(),
        },
        Output {
            name: "EnvBucketURL".to_string(),
            value: artifact_bucket.regional_endpoint(&config.region),
        },
    ];

    Ok(ResourceGraph {
        stack_name: config.stack_name.clone(),
        region: config.region.clone(),
        network: NetworkSpec::Dedicated {
            cidr: NETWORK_CIDR.to_string(),
            max_azs: NETWORK_MAX_AZS,
        },
        firewall,
        artifact: ArtifactDeployment {
            bucket: artifact_bucket.logical_id.clone(),
            key: COMPOSE_OBJECT_KEY.to_string(),
            source_path: artifact.path.clone(),
            sha256: artifact.sha256.clone(),
        },
        artifact_bucket,
        backup_bucket,
        role,
        node_template,
        scaling_group,
        outputs,
    })
}

/// Deterministic bucket name from the stack identity.
fn bucket_name(config: &Config, suffix: &str) -> String {
    match &config.account_id {
        Some(account) => format!("{}-{suffix}-{account}-{}", config.stack_name, config.region),
        None => format!("{}-{suffix}-{}", config.stack_name, config.region),
    }
}

fn firewall_rules(ssh_ranges: Option<&[String]>) -> FirewallRuleSet {
    let mut rules = vec![
        FirewallRule {
            protocol: Protocol::Tcp,
            port: 80,
            source: Peer::AnyIpv4,
            label: "Allow HTTP".to_string(),
        },
        FirewallRule {
            protocol: Protocol::Tcp,
            port: 443,
            source: Peer::AnyIpv4,
            label: "Allow HTTPS".to_string(),
        },
    ];
    if let Some(ranges) = ssh_ranges {
        for cidr in ranges {
            rules.push(FirewallRule {
                protocol: Protocol::Tcp,
                port: 22,
                source: Peer::Cidr { cidr: cidr.clone() },
                label: "Allow SSH from instance-connect relay".to_string(),
            });
        }
    }
    FirewallRuleSet {
        logical_id: "SecurityGroup".to_string(),
        allow_all_outbound: true,
        rules,
    }
}
