//! Configuration commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use finder_core::{Config, config::LOCAL_CONFIG_FILE};

/// Show current effective configuration
pub fn cmd_config_show(config: &Config, explicit: Option<&Path>) -> Result<()> {
  match explicit.map(Path::to_path_buf).or_else(Config::discovered_path) {
    Some(path) => println!("Using config: {:?}", path),
    None => println!("Using default configuration (no config file found)"),
  }
  println!();
  println!("{}", config.to_toml()?);
  Ok(())
}

/// Write the default config template
pub fn cmd_config_init(user: bool, force: bool) -> Result<()> {
  let path = if user {
    Config::user_config_path().context("Could not determine user config path")?
  } else {
    PathBuf::from(LOCAL_CONFIG_FILE)
  };

  if path.exists() && !force {
    bail!("Config file already exists: {:?} (use --force to overwrite)", path);
  }

  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
  }
  std::fs::write(&path, Config::generate_template()).with_context(|| format!("Failed to write {:?}", path))?;

  println!("Created config: {:?}", path);
  println!("Edit the file to customize settings.");
  Ok(())
}
