//! Access policy computation.
//!
//! The node role gets exactly what the bootstrap and backup scripts use:
//! read the compose descriptor, list and read backups, write new backups.
//! No ACL actions; the listing action targets the bucket ARN itself, object
//! actions target the object pattern.

use ledgerstack_core::{BucketSpec, PolicyStatement};

/// Service principal allowed to assume the node role.
pub const COMPUTE_PRINCIPAL: &str = "ec2.amazonaws.com";

/// Minimal statement set for the node role over the two stack buckets.
pub fn access_statements(
    artifact_bucket: &BucketSpec,
    backup_bucket: &BucketSpec,
) -> Vec<PolicyStatement> {
    vec![
        PolicyStatement {
            actions: vec!["s3:GetObject".to_string()],
            resources: vec![artifact_bucket.object_arn_pattern()],
        },
        PolicyStatement {
            actions: vec!["s3:GetObject".to_string(), "s3:PutObject".to_string()],
            resources: vec![backup_bucket.object_arn_pattern()],
        },
        PolicyStatement {
            actions: vec!["s3:ListBucket".to_string()],
            resources: vec![backup_bucket.arn()],
        },
    ]
}
