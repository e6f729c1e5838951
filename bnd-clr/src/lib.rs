//! bnd-clr: C++ declarations → C++/CLI marshaling glue.
//!
//! Reads header descriptions (one TOML file per translation unit), runs a
//! pipeline of tree-mutating passes over the declaration model and emits,
//! for every generated member, the managed signature and the code that
//! marshals each value across the native/managed boundary.
//!
//! # Quick start
//!
//! Generate the bindings file from a config (suitable for `build.rs`):
//!
//! ```no_run
//! use std::path::Path;
//!
//! // Reads config TOML, extracts declarations, writes the bindings file.
//! bnd_clr::run(Path::new("bnd-clr.toml"), None).unwrap();
//! ```
//!
//! Or drive the stages by hand:
//!
//! ```no_run
//! use bnd_clr::{Driver, DriverOptions, typemap::TypeMapDatabase};
//!
//! let unit = bnd_clr::extract::load_unit("api.toml".as_ref()).unwrap();
//! let mut driver = Driver::new(DriverOptions::new("Api"), TypeMapDatabase::with_std_maps());
//! driver.add_units(&[unit]).unwrap();
//! driver.process();
//! let bindings = driver.generate();
//! println!("{}", bnd_clr::emit::to_toml(&bindings).unwrap());
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

pub mod checks;
pub mod config;
pub mod context;
pub mod emit;
pub mod error;
pub mod extract;
pub mod marshal;
pub mod model;
pub mod passes;
pub mod printer;
pub mod text;
pub mod typemap;
pub mod types;
pub mod visit;

use config::PassesConfig;
use context::BindingContext;
use emit::BindingSet;
use extract::UnitDesc;
use model::{Diagnostic, DiagnosticLevel, Library};
use passes::{
    CheckFlagEnumsPass, CleanInvalidDeclNamesPass, FunctionToStaticMethodPass, PassBuilder,
    RenameCasePass, ResolveIncompleteDeclsPass,
};
use typemap::TypeMapDatabase;

/// Settings for one [`Driver`] run.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Managed namespace the wrappers are generated into.
    pub namespace: String,
    pub passes: PassesConfig,
}

impl DriverOptions {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            passes: PassesConfig::default(),
        }
    }
}

/// Owns the declaration tree and the type-map registry for one run.
#[derive(Debug)]
pub struct Driver {
    options: DriverOptions,
    library: Library,
    type_maps: TypeMapDatabase,
    diagnostics: Vec<Diagnostic>,
}

impl Driver {
    pub fn new(options: DriverOptions, type_maps: TypeMapDatabase) -> Self {
        Self {
            options,
            library: Library::new(),
            type_maps,
            diagnostics: Vec::new(),
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    pub fn type_maps(&self) -> &TypeMapDatabase {
        &self.type_maps
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Extract translation units into the tree. Front-end errors are
    /// reported and generation continues; a fatal diagnostic drops the
    /// whole unit from generation.
    pub fn add_units(&mut self, units: &[UnitDesc]) -> Result<()> {
        let diagnostics = extract::extract_units(&mut self.library, units)?;
        for diag in &diagnostics {
            match diag.level {
                DiagnosticLevel::Fatal => {
                    warn!(file = %diag.file, message = %diag.message, "fatal diagnostic; unit not generated");
                    let units = self.library.units().to_vec();
                    for unit in units {
                        if self.library.decl(unit).original_name() == diag.file {
                            self.library.decl_mut(unit).set_generated(false);
                        }
                    }
                }
                DiagnosticLevel::Error | DiagnosticLevel::Warning => {
                    warn!(file = %diag.file, level = ?diag.level, message = %diag.message, "diagnostic")
                }
                DiagnosticLevel::Note | DiagnosticLevel::Ignored => {
                    debug!(file = %diag.file, message = %diag.message, "diagnostic")
                }
            }
        }
        self.diagnostics.extend(diagnostics);
        Ok(())
    }

    /// The pass pipeline selected by the options, in execution order.
    pub fn setup_passes(&self) -> PassBuilder {
        let opts = &self.options.passes;
        let mut builder = PassBuilder::new();
        if opts.resolve_incomplete {
            builder.add_pass(ResolveIncompleteDeclsPass);
        }
        if opts.clean_names {
            builder.add_pass(CleanInvalidDeclNamesPass::default());
        }
        if opts.check_flag_enums {
            builder.add_pass(CheckFlagEnumsPass);
        }
        if opts.function_to_static_method {
            builder.add_pass(FunctionToStaticMethodPass);
        }
        let targets = opts.rename_targets();
        if !targets.is_empty() {
            builder.add_pass(RenameCasePass::new(targets));
        }
        builder
    }

    /// Synthesize macro enums, run the passes and restore definition order.
    pub fn process(&mut self) {
        self.generate_macro_enums();
        let mut builder = self.setup_passes();
        builder.run(&mut self.library, &self.type_maps);
        self.library.sort_declarations();
    }

    fn generate_macro_enums(&mut self) {
        let units = self.library.units().to_vec();
        for cfg in &self.options.passes.enum_from_macros {
            let mut found = false;
            for &unit in &units {
                let Some(tu) = self.library.unit_of(unit) else {
                    continue;
                };
                let wanted = match &cfg.file {
                    Some(file) => &tu.file_name == file,
                    None => !tu.is_system_header,
                };
                if wanted
                    && self
                        .library
                        .generate_enum_from_macros(unit, &cfg.name, &cfg.prefix)
                        .is_some()
                {
                    found = true;
                    break;
                }
            }
            if !found {
                warn!(name = %cfg.name, prefix = %cfg.prefix, "no macros matched enum prefix");
            }
        }
    }

    /// Emit the bindings of the processed tree.
    pub fn generate(&self) -> BindingSet {
        let cx = BindingContext::new(&self.library, &self.type_maps, &self.options.namespace);
        emit::emit_bindings(cx)
    }
}

/// Run the full pipeline: load config, extract the header descriptions,
/// run the passes, emit the bindings, and write the output file.
///
/// `config_path` is the path to a `bnd-clr.toml` configuration file.
/// `output` optionally overrides the output file path from the config.
///
/// Returns the path the bindings were written to.
pub fn run(config_path: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let bindings = generate_from_config(&cfg, base_dir)?;
    let text = emit::to_toml(&bindings)?;

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => base_dir.join(&cfg.output.file),
    };
    std::fs::write(&output_path, &text)
        .with_context(|| format!("writing output to {}", output_path.display()))?;

    info!(
        path = %output_path.display(),
        size = text.len(),
        "wrote bindings"
    );

    Ok(output_path)
}

/// Parse a `bnd-clr.toml` config file and return the generated bindings
/// without writing to disk.
pub fn generate(config_path: &Path) -> Result<BindingSet> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    generate_from_config(&cfg, base_dir)
}

/// Generate bindings from an already-loaded [`config::Config`].
///
/// `base_dir` is the directory relative to which input paths in the config
/// are resolved (typically the parent directory of the TOML file).
pub fn generate_from_config(cfg: &config::Config, base_dir: &Path) -> Result<BindingSet> {
    info!(
        namespace = %cfg.output.name,
        inputs = cfg.inputs.len(),
        type_maps = cfg.type_maps.len(),
        "loaded configuration"
    );

    let mut type_maps = if cfg.std_type_maps {
        TypeMapDatabase::with_std_maps()
    } else {
        TypeMapDatabase::new()
    };
    for map in &cfg.type_maps {
        type_maps.register(map.name.clone(), map.clone());
    }

    let units = cfg
        .inputs
        .iter()
        .map(|input| {
            let path = config::resolve_input(input, base_dir, &cfg.include_paths);
            extract::load_unit(&path)
        })
        .collect::<Result<Vec<_>>>()?;

    let options = DriverOptions {
        namespace: cfg.output.name.clone(),
        passes: cfg.passes.clone(),
    };
    let mut driver = Driver::new(options, type_maps);
    driver.add_units(&units)?;
    driver.process();
    Ok(driver.generate())
}
