use ledgerstack_bootstrap::{retention_ok, BACKUP_INTERVAL_DAYS};
use ledgerstack_synth::builder::BACKUP_EXPIRATION_DAYS;

use super::load_config;

pub fn check(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    println!("✓ Config valid: region={} ssh={:?}", config.region, config.ssh);

    if retention_ok(BACKUP_EXPIRATION_DAYS, BACKUP_INTERVAL_DAYS) {
        println!(
            "✓ Backup retention: {BACKUP_EXPIRATION_DAYS}d expiration covers \
             {BACKUP_INTERVAL_DAYS}d cycles"
        );
    } else {
        anyhow::bail!(
            "backup retention of {BACKUP_EXPIRATION_DAYS}d does not cover three \
             {BACKUP_INTERVAL_DAYS}d cycles"
        );
    }
    Ok(())
}
