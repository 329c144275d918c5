//! Emulator configuration files.
//!
//! A file is parsed by its extension (`.toml` or `.json`) into an
//! [`EmulatorBlueprint`], then checked before anything resolves or connects:
//! required fields are non-empty, ports are non-zero, entity keys are unique
//! across the whole file and the replay speed is positive.
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("emulator.toml")).unwrap();
//! println!("Stakeholders: {}", blueprint.stakeholders.len());
//! ```

mod parser;
mod validator;

pub use contracts::EmulatorBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Entry points for reading a checked [`EmulatorBlueprint`].
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read, parse and validate the file at `path`.
    ///
    /// The format comes from the extension, so an unknown extension fails
    /// before the file is opened.
    pub fn load_from_path(path: &Path) -> Result<EmulatorBlueprint, ContractError> {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ConfigFormat::from_extension)
            .ok_or_else(|| {
                ContractError::config_parse(format!(
                    "{}: expected a .toml or .json file",
                    path.display()
                ))
            })?;

        let content = std::fs::read_to_string(path).map_err(|e| ContractError::ConfigParse {
            message: format!("cannot read {}: {e}", path.display()),
            source: Some(Box::new(e)),
        })?;

        Self::load_from_str(&content, format)
    }

    /// Parse and validate in-memory content.
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<EmulatorBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}
