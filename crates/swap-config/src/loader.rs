//! Multi-file configuration.
//!
//! A run file usually holds only the trade and pulls the wallet, network and
//! order book sections from a file shared by every run on that network:
//!
//! ```toml
//! include = ["mainnet.toml"]
//!
//! [swap]
//! sell_token = "0x..."
//! ```
//!
//! Includes are resolved relative to the run file and may not include further
//! files. A top-level section may be defined in one file only.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One configuration file with its environment references resolved.
struct ConfigFile {
	path: PathBuf,
	table: toml::Table,
}

impl ConfigFile {
	async fn read(path: &Path) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read configuration file {}: {}", path.display(), e),
			))
		})?;
		let table = toml::from_str(&resolve_env_vars(&content)?)?;

		Ok(Self {
			path: path.to_path_buf(),
			table,
		})
	}

	/// Removes the `include` key and returns the listed paths, relative
	/// entries joined onto this file's directory.
	fn take_includes(&mut self) -> Result<Vec<PathBuf>, ConfigError> {
		let base = self.path.parent().unwrap_or_else(|| Path::new("."));
		let entries = match self.table.remove("include") {
			None => return Ok(Vec::new()),
			Some(toml::Value::String(single)) => vec![single],
			Some(toml::Value::Array(items)) => items
				.into_iter()
				.map(|item| match item {
					toml::Value::String(entry) => Ok(entry),
					_ => Err(ConfigError::Validation(
						"include must list file paths as strings".into(),
					)),
				})
				.collect::<Result<_, _>>()?,
			Some(_) => {
				return Err(ConfigError::Validation(
					"include must be a string or an array of strings".into(),
				))
			},
		};

		Ok(entries.into_iter().map(|entry| base.join(entry)).collect())
	}
}

/// Reads `path` together with its includes and validates the merged result.
pub(crate) async fn load(path: &Path) -> Result<Config, ConfigError> {
	let mut main = ConfigFile::read(path).await?;
	let includes = main.take_includes()?;
	let main_path = canonical(&main.path).await?;

	let mut sources: HashMap<String, PathBuf> = main
		.table
		.keys()
		.map(|section| (section.clone(), main.path.clone()))
		.collect();
	let mut merged = main.table;

	for include in includes {
		if canonical(&include).await? == main_path {
			return Err(ConfigError::Validation(format!(
				"{} includes itself",
				main.path.display()
			)));
		}

		let mut shared = ConfigFile::read(&include).await?;
		if !shared.take_includes()?.is_empty() {
			return Err(ConfigError::Validation(format!(
				"{} is included by {} and cannot include other files",
				include.display(),
				main.path.display()
			)));
		}

		for (section, value) in shared.table {
			if let Some(first) = sources.get(&section) {
				return Err(ConfigError::Validation(format!(
					"Section [{}] is defined in both {} and {}",
					section,
					first.display(),
					include.display()
				)));
			}
			sources.insert(section.clone(), include.clone());
			merged.insert(section, value);
		}
	}

	let config: Config = toml::Value::Table(merged).try_into()?;
	config.validate()?;
	Ok(config)
}

async fn canonical(path: &Path) -> Result<PathBuf, ConfigError> {
	tokio::fs::canonicalize(path).await.map_err(|e| {
		ConfigError::Io(std::io::Error::new(
			e.kind(),
			format!("Cannot resolve path {}: {}", path.display(), e),
		))
	})
}
