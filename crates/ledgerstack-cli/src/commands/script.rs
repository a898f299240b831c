use ledgerstack_bootstrap::{render_cloud_init, BootstrapParams};

pub fn script(artifact_bucket: &str, backup_bucket: &str, data_dir: &str) -> anyhow::Result<()> {
    let params = BootstrapParams::new(artifact_bucket, backup_bucket, data_dir);
    print!("{}", render_cloud_init(&params));
    Ok(())
}
