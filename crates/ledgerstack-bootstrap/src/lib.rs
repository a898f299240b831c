pub mod schedule;
pub mod script;

pub use schedule::{latest_key, retention_ok, BACKUP_CRON, BACKUP_INTERVAL_DAYS};
pub use script::{render_backup_script, render_cloud_init, BootstrapParams};
