use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rowmap::config;
use rowmap::predicate::Lambda;
use rowmap::schema_catalog::CatalogConfig;
use rowmap::sql_generator::{compile_filter, render_inline};

/// rowmap - table mappings and SQL filters from type catalogs
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the table mapping of a type as JSON
    Mapping(MappingArgs),
    /// Compile a predicate file into a SQL filter
    Compile(CompileArgs),
}

#[derive(Args)]
struct MappingArgs {
    /// Catalog definition file (YAML, or JSON with a .json extension)
    #[arg(long)]
    catalog: PathBuf,

    /// Type to map
    #[arg(long = "type")]
    type_name: String,

    #[command(flatten)]
    mapper: MapperArgs,
}

#[derive(Args)]
struct CompileArgs {
    #[command(flatten)]
    target: MappingArgs,

    /// Predicate file: a lambda AST in JSON or YAML
    #[arg(long)]
    predicate: PathBuf,

    /// Print the SQL with parameters substituted instead of JSON
    #[arg(long)]
    inline: bool,
}

#[derive(Args)]
struct MapperArgs {
    /// Mapper configuration file (YAML); environment variables are used otherwise
    #[arg(long)]
    config: Option<PathBuf>,

    /// Creation flags, comma separated (e.g. implicit_pk,auto_inc_pk)
    #[arg(long)]
    flags: Option<String>,

    /// Member name treated as primary key under implicit_pk
    #[arg(long)]
    implicit_pk_name: Option<String>,

    /// Column-name suffix that triggers an implicit index
    #[arg(long)]
    implicit_index_suffix: Option<String>,
}

impl From<MapperArgs> for config::CliConfig {
    fn from(args: MapperArgs) -> Self {
        config::CliConfig {
            implicit_pk_name: args.implicit_pk_name,
            implicit_index_suffix: args.implicit_index_suffix,
            create_flags: args.flags.as_deref().map(config::split_flag_list),
        }
    }
}

fn main() -> anyhow::Result<()> {
    // .env first so it can set RUST_LOG
    let dotenv = dotenvy::dotenv();

    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Ok(path) = dotenv {
        log::debug!("Loaded environment from {}", path.display());
    }

    match Cli::parse().command {
        Command::Mapping(args) => run_mapping(args),
        Command::Compile(args) => run_compile(args),
    }
}

fn load_mapper_config(args: MapperArgs) -> anyhow::Result<config::MapperConfig> {
    let base = match &args.config {
        Some(path) => config::MapperConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load mapper config {}", path.display()))?,
        None => config::MapperConfig::from_env()?,
    };
    Ok(config::MapperConfig::from_cli(args.into(), base)?)
}

fn run_mapping(args: MappingArgs) -> anyhow::Result<()> {
    let loaded = CatalogConfig::from_file(&args.catalog)
        .and_then(|catalog| catalog.to_catalog())
        .with_context(|| format!("Failed to load catalog {}", args.catalog.display()))?;
    let mapper_config = load_mapper_config(args.mapper)?;
    let flags = mapper_config.create_flags()?;

    let mapping = loaded
        .mapper()
        .with_config(&mapper_config)
        .build_mapping(&args.type_name, flags)?;

    println!("{}", serde_json::to_string_pretty(&mapping)?);
    Ok(())
}

fn run_compile(args: CompileArgs) -> anyhow::Result<()> {
    let target = args.target;
    let loaded = CatalogConfig::from_file(&target.catalog)
        .and_then(|catalog| catalog.to_catalog())
        .with_context(|| format!("Failed to load catalog {}", target.catalog.display()))?;
    let mapper_config = load_mapper_config(target.mapper)?;
    let flags = mapper_config.create_flags()?;

    // One lookup per process, so the mapping is built directly
    let mapping = loaded
        .mapper()
        .with_config(&mapper_config)
        .build_mapping(&target.type_name, flags)?;

    let predicate = load_predicate(&args.predicate)?;
    let compiled = compile_filter(&mapping, &predicate)?;

    if args.inline {
        println!("{}", render_inline(&compiled.sql, &compiled.parameters)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&compiled)?);
    }
    Ok(())
}

fn load_predicate(path: &Path) -> anyhow::Result<Lambda> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read predicate {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let lambda = if is_json {
        serde_json::from_str(&contents)?
    } else {
        serde_yaml::from_str(&contents)?
    };
    Ok(lambda)
}
