//! assoc-sql: compile association requests from the command line
//!
//! # Usage
//!
//! ```bash
//! # Every A with its b (inner join), ordered by b.name descending
//! assoc-sql --schema schema.toml compile A --include 'b!' --order b=name:desc
//!
//! # Nested associations, custom alias, key filter
//! assoc-sql compile A --include b --include b.a --alias b=customB --key b=1
//!
//! # List the entities of a schema
//! assoc-sql --schema schema.toml entities
//! ```

use anyhow::{Context, Result, anyhow, bail};
use assoc_sql::prelude::*;
use assoc_sql::schema::config::default_schema_path;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "assoc-sql")]
#[command(version)]
#[command(about = "Compile association requests into SQL", long_about = None)]
#[command(after_help = "PATHS:
    '.' is the root entity; 'b' is its association b; 'b.a' is b's association a.
    A trailing '!' on --include/--join makes the join required (inner).

EXAMPLES:
    assoc-sql compile A --include 'b!' --order .=id --order b=name:desc --reverse .
    assoc-sql compile A --join b --key b=1 --format json")]
struct Cli {
    /// Schema TOML file
    #[arg(short, long, env = "ASSOC_SQL_SCHEMA")]
    schema: Option<PathBuf>,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a request rooted at ENTITY
    Compile(CompileArgs),
    /// List the entities and associations of the schema
    Entities,
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Root entity
    entity: String,

    /// Include an association and select its columns (PATH[!])
    #[arg(short, long)]
    include: Vec<String>,

    /// Join an association without selecting its columns (PATH[!])
    #[arg(short, long)]
    join: Vec<String>,

    /// Name the table instance at PATH (PATH=NAME)
    #[arg(short, long)]
    alias: Vec<String>,

    /// Filter PATH on its primary key; repeat for several keys (PATH=VALUE)
    #[arg(short, long)]
    key: Vec<String>,

    /// Order PATH by a column (PATH=COL[:asc|:desc])
    #[arg(short, long)]
    order: Vec<String>,

    /// Reverse the ordering at PATH and below
    #[arg(short, long)]
    reverse: Vec<String>,

    /// Row limit
    #[arg(short, long)]
    limit: Option<usize>,

    /// Row offset, with --limit
    #[arg(long, requires = "limit")]
    offset: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "sql")]
    format: OutputFormat,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Sql,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "assoc_sql=debug" } else { "assoc_sql=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let path = match &cli.schema {
        Some(path) => path.clone(),
        None => default_schema_path()
            .ok_or_else(|| anyhow!("no --schema given and no config directory on this platform"))?,
    };
    let registry = Registry::load(&path)
        .with_context(|| format!("loading schema from {}", path.display()))?;

    match &cli.command {
        Commands::Compile(args) => compile(&registry, args),
        Commands::Entities => {
            list_entities(&registry);
            Ok(())
        }
    }
}

fn compile(registry: &Registry, args: &CompileArgs) -> Result<()> {
    let specs = PathSpecs::from_args(args)?;
    let root_spec = specs.get(ROOT);

    let mut request = refine(registry.all(&args.entity)?, root_spec)?;
    request = attach_children(request, registry, &args.entity, ROOT, &specs)?;
    if let Some(limit) = args.limit {
        request = match args.offset {
            Some(offset) => request.limit_offset(limit, offset),
            None => request.limit(limit),
        };
    }

    let statement = request.build()?;
    match args.format {
        OutputFormat::Sql => print_statement(&statement),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&statement)?),
    }
    Ok(())
}

fn print_statement(statement: &Statement) {
    println!("{}", statement.sql.white());
    if !statement.arguments.is_empty() {
        println!();
        println!("{}", "Arguments:".cyan());
        for (i, value) in statement.arguments.iter().enumerate() {
            println!("  ?{} = {}", i + 1, value.to_string().yellow());
        }
    }
}

fn list_entities(registry: &Registry) {
    for schema in registry.schemas() {
        println!(
            "{} {}",
            schema.entity().cyan().bold(),
            format!("({})", schema.table()).dimmed()
        );
        if !schema.declared_columns().is_empty() {
            println!("  columns: {}", schema.declared_columns().join(", "));
        }
        for association in schema.associations() {
            let required = if association.is_required_by_default() { " !" } else { "" };
            println!(
                "  {} {} {}{}",
                association.name().green(),
                association.kind().to_string().dimmed(),
                association.destination(),
                required.yellow()
            );
        }
    }
}

const ROOT: &str = ".";

/// How a non-root path is attached to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Link {
    selected: bool,
    /// `None` keeps the association's declared default.
    required: Option<bool>,
}

/// Everything the flags say about one table instance.
#[derive(Debug, Default)]
struct PathSpec {
    link: Option<Link>,
    alias: Option<String>,
    keys: Vec<Value>,
    orders: Vec<OrderTerm>,
    reverse: bool,
}

/// Flag settings keyed by association path, every prefix present.
struct PathSpecs(BTreeMap<String, PathSpec>);

impl PathSpecs {
    fn from_args(args: &CompileArgs) -> Result<Self> {
        let mut specs = PathSpecs(BTreeMap::new());
        specs.entry(ROOT);

        for (flags, selected) in [(&args.include, true), (&args.join, false)] {
            for flag in flags {
                let (path, required) = match flag.strip_suffix('!') {
                    Some(path) => (path, true),
                    None => (flag.as_str(), false),
                };
                if path == ROOT {
                    bail!("the root entity cannot be included");
                }
                let spec = specs.entry(path);
                let conflicting = spec.link.is_some_and(|link| {
                    link.selected != selected || link.required != Some(required)
                });
                if conflicting {
                    bail!("conflicting --include/--join for '{}'", path);
                }
                spec.link = Some(Link {
                    selected,
                    required: Some(required),
                });
            }
        }

        for flag in &args.alias {
            let (path, name) = split_assignment(flag, "--alias")?;
            specs.entry(path).alias = Some(name.to_string());
        }
        for flag in &args.key {
            let (path, value) = split_assignment(flag, "--key")?;
            specs.entry(path).keys.push(parse_value(value));
        }
        for flag in &args.order {
            let (path, term) = split_assignment(flag, "--order")?;
            specs.entry(path).orders.push(parse_order(term)?);
        }
        for path in &args.reverse {
            let spec = specs.entry(path);
            spec.reverse = !spec.reverse;
        }
        Ok(specs)
    }

    /// The spec at `path`, creating it and its missing ancestors.
    fn entry(&mut self, path: &str) -> &mut PathSpec {
        if path != ROOT {
            let mut prefix = String::new();
            for segment in path.split('.') {
                if !prefix.is_empty() {
                    prefix.push('.');
                }
                prefix.push_str(segment);
                self.0.entry(prefix.clone()).or_default();
            }
        }
        self.0.entry(path.to_string()).or_default()
    }

    fn get(&self, path: &str) -> Option<&PathSpec> {
        self.0.get(path)
    }

    /// Direct children of `path`, as `(child path, association name)`.
    fn children<'s>(&'s self, path: &'s str) -> impl Iterator<Item = (&'s str, &'s str)> + 's {
        self.0.keys().filter_map(move |key| {
            let name = if path == ROOT {
                (key != ROOT).then_some(key.as_str())
            } else {
                key.strip_prefix(path).and_then(|rest| rest.strip_prefix('.'))
            }?;
            (!name.contains('.')).then_some((key.as_str(), name))
        })
    }
}

fn split_assignment<'f>(flag: &'f str, option: &str) -> Result<(&'f str, &'f str)> {
    flag.split_once('=')
        .filter(|(path, value)| !path.is_empty() && !value.is_empty())
        .ok_or_else(|| anyhow!("{} expects PATH=VALUE, got '{}'", option, flag))
}

fn parse_order(term: &str) -> Result<OrderTerm> {
    let (column, direction) = match term.rsplit_once(':') {
        Some((column, direction)) => (column, Some(direction)),
        None => (term, None),
    };
    match direction.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(col(column).into()),
        Some("asc") => Ok(col(column).asc()),
        Some("desc") => Ok(col(column).desc()),
        Some(other) => bail!("unknown order direction '{}' (asc or desc)", other),
    }
}

/// Apply the alias, key, order and reversal flags of one path.
fn refine<R: Derivable>(mut request: R, spec: Option<&PathSpec>) -> Result<R> {
    let Some(spec) = spec else {
        return Ok(request);
    };
    if let Some(name) = &spec.alias {
        request = request.aliased(&TableAlias::named(name));
    }
    request = match spec.keys.as_slice() {
        [] => request,
        [key] => request.filter_key(key.clone())?,
        keys => request.filter_keys(keys.iter().cloned())?,
    };
    if !spec.orders.is_empty() {
        request = request.order(spec.orders.iter().cloned());
    }
    if spec.reverse {
        request = request.reversed();
    }
    Ok(request)
}

fn attach_children<R: Derivable>(
    mut request: R,
    registry: &Registry,
    entity: &str,
    path: &str,
    specs: &PathSpecs,
) -> Result<R> {
    for (child_path, name) in specs.children(path) {
        let spec = specs.get(child_path);
        let association = registry.association(entity, name)?;
        let destination = association.association().destination().to_string();
        let association = refine(association, spec)?;
        let association = attach_children(association, registry, &destination, child_path, specs)?;

        let link = spec.and_then(|spec| spec.link).unwrap_or(Link {
            selected: true,
            required: None,
        });
        request = match (link.selected, link.required) {
            (true, None) => request.including(association)?,
            (true, Some(true)) => request.including_required(association)?,
            (true, Some(false)) => request.including_optional(association)?,
            (false, Some(true)) => request.joining_required(association)?,
            (false, _) => request.joining_optional(association)?,
        };
    }
    Ok(request)
}
