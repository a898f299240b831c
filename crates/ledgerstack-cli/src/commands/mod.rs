pub mod check;
pub mod script;
pub mod synth;

use std::path::Path;

use ledgerstack_core::Config;

/// File config when a path is given, env config otherwise.
pub fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let config = match path {
        Some(p) => Config::from_file(Path::new(p))?,
        None => Config::from_env()?,
    };
    Ok(config)
}
