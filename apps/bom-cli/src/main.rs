use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use bom_app::{AppError, AppResult, Framework};
use bom_core::NodeId;
use bom_graph::Bom;
use bom_skeleton::{Catalog, ParameterSets, Settings, Skeleton, validate_catalog};
use tracing::info;

#[derive(Parser)]
#[command(name = "bom-cli")]
#[command(about = "Bill of materials builder - templates to skeletons to assembly graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a skeleton from a configuration file
    Build {
        /// Path to the configuration file (YAML or JSON)
        config: PathBuf,
        /// Settings document applied after the skeleton is built
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Reference of the top part, overriding the configuration
        #[arg(long)]
        top: Option<String>,
        /// Write the skeleton here (YAML for .yaml/.yml, JSON otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the hierarchy of a saved skeleton
    Tree {
        /// Path to the skeleton file
        skeleton: PathBuf,
        /// Reference of the top part
        top: String,
    },
    /// Check a part catalog for missing types, parents and parameter sets
    Validate {
        /// Path to the catalog file
        catalog: PathBuf,
        /// Parameter set files to check `params_name` against
        #[arg(long)]
        parameters: Vec<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            settings,
            top,
            output,
        } => cmd_build(&config, settings.as_deref(), top, output.as_deref()),
        Commands::Tree { skeleton, top } => cmd_tree(&skeleton, &top),
        Commands::Validate {
            catalog,
            parameters,
        } => cmd_validate(&catalog, &parameters),
    }
}

fn cmd_build(
    config_path: &Path,
    settings_path: Option<&Path>,
    top: Option<String>,
    output: Option<&Path>,
) -> AppResult<()> {
    info!(config = %config_path.display(), "building bill of materials");
    let mut framework = Framework::from_config_path(config_path)?;
    if let Some(top) = top {
        let mut current = framework.config().top().cloned().unwrap_or_default();
        current.reference = top;
        framework.config_mut().set_top(current);
    }
    let settings = settings_path.map(Settings::load).transpose()?;

    let (skeleton, bom, root) = framework.build(settings)?;
    print_tree(&bom, root)?;
    println!("{} parts, {} nodes", skeleton.len(), bom.len());

    if let Some(output) = output {
        skeleton.save(output)?;
        println!("✓ Skeleton written to {}", output.display());
    }
    Ok(())
}

fn cmd_tree(skeleton_path: &Path, top: &str) -> AppResult<()> {
    let skeleton = Skeleton::load(skeleton_path)?;
    let (bom, root) = Framework::default().load(top, &skeleton)?;
    print_tree(&bom, root)
}

fn cmd_validate(catalog_path: &Path, parameter_paths: &[PathBuf]) -> AppResult<()> {
    println!("Validating catalog: {}", catalog_path.display());
    let catalog = Catalog::load(&[catalog_path])?;
    let parameters = if parameter_paths.is_empty() {
        None
    } else {
        Some(ParameterSets::load(parameter_paths)?)
    };

    let issues = validate_catalog(&catalog, parameters.as_ref());
    if issues.is_empty() {
        println!("✓ Catalog is valid ({} templates)", catalog.len());
        return Ok(());
    }
    for issue in &issues {
        println!("  ✗ {issue}");
    }
    Err(AppError::Validation(format!(
        "{} issue(s) in {}",
        issues.len(),
        catalog_path.display()
    )))
}

fn print_tree(bom: &Bom, root: NodeId) -> AppResult<()> {
    print!("{}", bom.hierarchy(root)?);
    Ok(())
}
