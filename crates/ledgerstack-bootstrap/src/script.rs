//! First-boot and backup script rendering.
//!
//! Both renderers are pure: identical parameters produce byte-identical
//! script text, which is what makes user-data diffs meaningful across
//! redeployments. The scripts run independently on every node; when the
//! scaling group runs more than one node their backup uploads race and the
//! newest timestamp wins. Nothing here coordinates that.

use serde::{Deserialize, Serialize};

use crate::schedule::BACKUP_CRON;

/// Log file the first-boot script appends to on the node.
pub const BOOTSTRAP_LOG: &str = "/var/log/ledgerstack-bootstrap.log";

/// Pinned compose CLI version installed on each node.
pub const COMPOSE_VERSION: &str = "1.29.2";

/// Parameters threaded into the rendered scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapParams {
    pub artifact_bucket: String,
    pub backup_bucket: String,
    /// Directory mounted into the service container.
    pub data_dir: String,
    /// Node user home; compose file and backup script land here.
    pub home_dir: String,
    /// Object key of the compose descriptor in the artifact bucket.
    pub compose_key: String,
    /// Public domain name handed to the service, if one is configured.
    pub domain_name: Option<String>,
}

impl BootstrapParams {
    pub fn new(artifact_bucket: &str, backup_bucket: &str, data_dir: &str) -> Self {
        Self {
            artifact_bucket: artifact_bucket.to_string(),
            backup_bucket: backup_bucket.to_string(),
            data_dir: data_dir.to_string(),
            home_dir: "/home/ec2-user".to_string(),
            compose_key: "docker-compose.yml".to_string(),
            domain_name: None,
        }
    }

    pub fn with_domain(mut self, domain: Option<&str>) -> Self {
        self.domain_name = domain.map(str::to_string);
        self
    }
}

/// Render the recurring backup script.
///
/// Archives the data directory under a timestamped name and uploads it to
/// the backup bucket. Timestamp-prefixed names keep the lexicographic
/// maximum the newest object, which is what restore relies on.
pub fn render_backup_script(params: &BootstrapParams) -> String {
    format!(
        r#"#!/bin/bash
set -u
STAMP=$(date +%Y%m%d_%H%M%S)
ARCHIVE="/tmp/backup_$STAMP.tar.gz"
tar -czf "$ARCHIVE" -C {data_dir} .
aws s3 cp "$ARCHIVE" "s3://{backup_bucket}/backup_$STAMP.tar.gz"
rm -f "$ARCHIVE"
"#,
        data_dir = params.data_dir,
        backup_bucket = params.backup_bucket,
    )
}

/// Render the first-boot (cloud-init) script.
///
/// Sequence: install the container runtime, fetch the compose descriptor,
/// restore the newest backup if one exists, start the service, then install
/// the recurring backup job. Every step logs its outcome to the node-local
/// bootstrap log and the network-dependent steps get a bounded retry; an
/// empty backup bucket is not an error.
pub fn render_cloud_init(params: &BootstrapParams) -> String {
    let backup_script = render_backup_script(params);
    let domain_env = match &params.domain_name {
        Some(domain) => format!("LEDGER_DOMAIN={domain} "),
        None => String::new(),
    };
    format!(
        r#"#!/bin/bash
exec >> {bootstrap_log} 2>&1

log() {{
    echo "[$(date -u '+%Y-%m-%dT%H:%M:%SZ')] $1"
}}

retry() {{
    local attempt=1
    until "$@"; do
        if [ "$attempt" -ge 3 ]; then
            log "giving up after $attempt attempts: $*"
            return 1
        fi
        log "attempt $attempt failed, retrying: $*"
        attempt=$((attempt + 1))
        sleep 5
    done
}}

log "bootstrap start"

yum update -y || log "package update failed"
yum install -y docker tar || log "package install failed"
systemctl start docker
systemctl enable docker
usermod -aG docker ec2-user

retry curl -fsSL "https://github.com/docker/compose/releases/download/{compose_version}/docker-compose-$(uname -s)-$(uname -m)" -o /usr/local/bin/docker-compose || log "compose install failed"
chmod +x /usr/local/bin/docker-compose

COMPOSE_FILE={home_dir}/docker-compose.yml
retry aws s3 cp "s3://{artifact_bucket}/{compose_key}" "$COMPOSE_FILE" || log "artifact download failed"

LATEST_BACKUP=$(aws s3 ls "s3://{backup_bucket}/" | sort | tail -n 1 | awk '{{print $4}}')
mkdir -p {data_dir}
if [ -n "$LATEST_BACKUP" ]; then
    log "latest backup: $LATEST_BACKUP, restoring"
    if retry aws s3 cp "s3://{backup_bucket}/$LATEST_BACKUP" "/tmp/$LATEST_BACKUP"; then
        tar -xzf "/tmp/$LATEST_BACKUP" -C {data_dir}/
        rm -f "/tmp/$LATEST_BACKUP"
        log "restore complete"
    else
        log "backup download failed, starting with an empty data directory"
    fi
else
    log "no backup found, starting fresh"
fi

if {domain_env}LEDGER_DATA_PATH={data_dir} docker-compose -f "$COMPOSE_FILE" up -d; then
    log "service started"
else
    log "service start failed"
fi

cat << 'LEDGERBACKUP' > {home_dir}/backup.sh
{backup_script}LEDGERBACKUP
chmod +x {home_dir}/backup.sh
(crontab -l 2>/dev/null; echo "{backup_cron} {home_dir}/backup.sh") | crontab -

log "bootstrap complete"
"#,
        bootstrap_log = BOOTSTRAP_LOG,
        compose_version = COMPOSE_VERSION,
        home_dir = params.home_dir,
        artifact_bucket = params.artifact_bucket,
        compose_key = params.compose_key,
        backup_bucket = params.backup_bucket,
        data_dir = params.data_dir,
        backup_script = backup_script,
        backup_cron = BACKUP_CRON,
        domain_env = domain_env,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BootstrapParams {
        BootstrapParams::new(
            "ledgerstack-env-eu-west-1",
            "ledgerstack-backup-eu-west-1",
            "/home/ec2-user/data",
        )
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let a = render_cloud_init(&params());
        let b = render_cloud_init(&params());
        assert_eq!(a, b);
    }

    #[test]
    fn test_cloud_init_references_both_buckets() {
        let script = render_cloud_init(&params());
        assert!(script.contains("s3://ledgerstack-env-eu-west-1/docker-compose.yml"));
        assert!(script.contains("s3://ledgerstack-backup-eu-west-1/"));
    }

    #[test]
    fn test_cloud_init_installs_cron_job() {
        let script = render_cloud_init(&params());
        assert!(script.contains("0 4 */3 * * /home/ec2-user/backup.sh"));
    }

    #[test]
    fn test_cloud_init_handles_empty_backup_bucket() {
        let script = render_cloud_init(&params());
        assert!(script.contains(r#"if [ -n "$LATEST_BACKUP" ]"#));
        assert!(script.contains("no backup found, starting fresh"));
    }

    #[test]
    fn test_restore_selects_newest_by_sort() {
        let script = render_cloud_init(&params());
        assert!(script.contains("| sort | tail -n 1 |"));
    }

    #[test]
    fn test_backup_script_embedded_verbatim() {
        let script = render_cloud_init(&params());
        let backup = render_backup_script(&params());
        assert!(script.contains(&backup));
        // Quoted heredoc so $STAMP expands on the node, not at render time.
        assert_eq!(script.matches("'LEDGERBACKUP'").count(), 1);
        assert_eq!(script.matches("LEDGERBACKUP").count(), 2);
    }

    #[test]
    fn test_backup_script_uploads_timestamped_archive() {
        let backup = render_backup_script(&params());
        assert!(backup.contains("tar -czf"));
        assert!(backup.contains("s3://ledgerstack-backup-eu-west-1/backup_$STAMP.tar.gz"));
        assert!(backup.contains("rm -f \"$ARCHIVE\""));
    }

    #[test]
    fn test_domain_passed_to_service_when_configured() {
        let with_domain = params().with_domain(Some("budget.example.com"));
        let script = render_cloud_init(&with_domain);
        assert!(script.contains("LEDGER_DOMAIN=budget.example.com LEDGER_DATA_PATH="));
        assert!(!render_cloud_init(&params()).contains("LEDGER_DOMAIN"));
    }

    #[test]
    fn test_distinct_params_distinct_scripts() {
        let other = BootstrapParams::new("other-env", "other-backup", "/srv/data");
        assert_ne!(render_cloud_init(&params()), render_cloud_init(&other));
    }
}
