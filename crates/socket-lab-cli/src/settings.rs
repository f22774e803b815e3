use anyhow::{Context, Result};
use socket_lab_abstract::{LabConfig, LabProfile};
use std::fs;
use std::path::Path;

/// Defaults, then the optional TOML profile on top.
pub fn load_config(path: Option<&Path>) -> Result<LabConfig> {
    let mut config = LabConfig::default();
    if let Some(path) = path {
        let profile = load_profile(path)?;
        profile.apply_to(&mut config);
    }
    Ok(config)
}

fn load_profile(path: &Path) -> Result<LabProfile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_profile(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

fn parse_profile(content: &str) -> Result<LabProfile> {
    Ok(toml::from_str(content)?)
}
