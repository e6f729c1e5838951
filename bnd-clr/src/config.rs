//! Configuration types for `bnd-clr.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::passes::RenameTargets;
use crate::typemap::TemplateTypeMap;

/// Root configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub output: OutputConfig,
    /// Additional directories to search when resolving input paths. Each
    /// entry is tried in order after `base_dir` (the TOML file's parent
    /// directory).
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    /// Header descriptions, one per translation unit, in the order they
    /// should be processed.
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub passes: PassesConfig,
    /// Register the built-in `std::` and `va_list` type maps.
    #[serde(default = "default_true")]
    pub std_type_maps: bool,
    #[serde(default, rename = "type_map")]
    pub type_maps: Vec<TemplateTypeMap>,
}

fn default_true() -> bool {
    true
}

/// Output settings.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Managed namespace the wrappers are generated into (e.g. `MyLib`).
    pub name: String,
    /// Output file path (e.g. `MyLib.bindings.toml`).
    #[serde(default = "default_output_file")]
    pub file: PathBuf,
}

fn default_output_file() -> PathBuf {
    PathBuf::from("bindings.toml")
}

/// Pass pipeline selection. Every pass except renaming is on by default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PassesConfig {
    pub resolve_incomplete: bool,
    pub clean_names: bool,
    pub check_flag_enums: bool,
    pub function_to_static_method: bool,
    /// Declaration kinds to rename to UpperCamelCase. Empty disables the
    /// pass.
    pub rename_case: Vec<RenameTarget>,
    pub enum_from_macros: Vec<MacroEnumConfig>,
}

impl Default for PassesConfig {
    fn default() -> Self {
        Self {
            resolve_incomplete: true,
            clean_names: true,
            check_flag_enums: true,
            function_to_static_method: true,
            rename_case: Vec::new(),
            enum_from_macros: Vec::new(),
        }
    }
}

impl PassesConfig {
    pub fn rename_targets(&self) -> RenameTargets {
        self.rename_case
            .iter()
            .fold(RenameTargets::empty(), |acc, t| acc | t.flag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameTarget {
    Functions,
    Methods,
    Fields,
    Parameters,
}

impl RenameTarget {
    fn flag(self) -> RenameTargets {
        match self {
            RenameTarget::Functions => RenameTargets::FUNCTIONS,
            RenameTarget::Methods => RenameTargets::METHODS,
            RenameTarget::Fields => RenameTargets::FIELDS,
            RenameTarget::Parameters => RenameTargets::PARAMETERS,
        }
    }
}

/// Build an enumeration out of `#define` constants.
///
/// ```toml
/// [[passes.enum_from_macros]]
/// name = "Color"
/// prefix = "COLOR_"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MacroEnumConfig {
    pub name: String,
    pub prefix: String,
    /// Only look in the translation unit with this file name. All
    /// non-system units when absent.
    pub file: Option<String>,
}

/// Resolve an input path by searching `base_dir` first, then each
/// `include_paths` entry. Absolute paths are returned as-is. If the file is
/// not found anywhere, falls back to `base_dir.join(path)` so that the
/// caller gets a meaningful error when reading it.
pub fn resolve_input(path: &Path, base_dir: &Path, include_paths: &[PathBuf]) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let candidate = base_dir.join(path);
    if candidate.exists() {
        return candidate;
    }
    for inc in include_paths {
        let candidate = inc.join(path);
        if candidate.exists() {
            return candidate;
        }
    }
    base_dir.join(path)
}

/// Load and parse a `bnd-clr.toml` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))?;
    Ok(config)
}
