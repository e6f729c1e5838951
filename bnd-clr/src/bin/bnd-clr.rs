//! Command-line driver: reads the header descriptions listed in
//! `bnd-clr.toml`, runs the pass pipeline and writes the C++/CLI binding
//! set as TOML.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// Generate C++/CLI wrapper glue for the C++ declarations described in a
/// bnd-clr project. Declarations that cannot be marshaled are listed in the
/// output's `omitted` table instead of failing the run.
#[derive(Parser, Debug)]
#[command(name = "bnd-clr", version, about)]
struct Cli {
    /// Project file naming the header descriptions, managed namespace and
    /// pass options.
    #[arg(default_value = "bnd-clr.toml")]
    config: PathBuf,

    /// Where to write the binding TOML (defaults to `[output] file`).
    #[arg(short, long, conflicts_with = "stdout")]
    output: Option<PathBuf>,

    /// Print the binding TOML instead of writing a file.
    #[arg(long)]
    stdout: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bnd_clr=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.stdout {
        let bindings = bnd_clr::generate(&cli.config)?;
        print!("{}", bnd_clr::emit::to_toml(&bindings)?);
        if !bindings.omitted.is_empty() {
            tracing::warn!(count = bindings.omitted.len(), "declarations omitted");
        }
        return Ok(());
    }
    bnd_clr::run(&cli.config, cli.output.as_deref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_the_project_file() {
        let cli = Cli::try_parse_from(["bnd-clr"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("bnd-clr.toml"));
        assert!(cli.output.is_none() && !cli.stdout);
    }

    #[test]
    fn stdout_and_output_are_exclusive() {
        let cli = Cli::try_parse_from(["bnd-clr", "proj.toml", "--stdout"]).unwrap();
        assert!(cli.stdout);
        assert!(Cli::try_parse_from(["bnd-clr", "--stdout", "-o", "out.toml"]).is_err());
    }
}
