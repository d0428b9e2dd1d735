use apidocs::deprecation::{DeprecationRequest, DeprecationStatus};
use apidocs::render::{self, Format, Locale};
use apidocs::search::{self, TextQuery};
use apidocs::service::SearchCriteria;
use apidocs::{seed, ChangeType, DocumentationService, EndpointRecord, EndpointStore, HttpMethod};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;

/// Versioned documentation catalog for HTTP endpoints
#[derive(Parser)]
#[command(name = "apidocs", version, about)]
struct Cli {
    /// Path to the SQLite catalog file
    #[arg(long, env = "APIDOCS_DB", default_value = "api-docs.sqlite")]
    db: PathBuf,

    /// Output format
    #[arg(long, default_value = "json")]
    format: OutputFormat,

    /// Language of section headings in markdown/html output
    #[arg(long, default_value = "pt-br")]
    lang: Lang,

    /// Seed an empty catalog from this YAML/JSON file instead of the built-in endpoints
    #[arg(long)]
    seed_file: Option<PathBuf>,

    /// Do not seed an empty catalog
    #[arg(long)]
    no_seed: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Html,
    Compact,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => Format::Json,
            OutputFormat::Yaml => Format::Yaml,
            OutputFormat::Markdown => Format::Markdown,
            OutputFormat::Html => Format::Html,
            OutputFormat::Compact => Format::Compact,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Lang {
    EnUs,
    PtBr,
}

impl From<Lang> for Locale {
    fn from(lang: Lang) -> Self {
        match lang {
            Lang::EnUs => Locale::EnUs,
            Lang::PtBr => Locale::PtBr,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List every documented endpoint
    List,

    /// Show the endpoints documented under a path
    Get {
        /// Endpoint path (e.g. /api/v1/users)
        path: String,
        /// Only this HTTP method
        #[arg(long, value_parser = parse_method)]
        method: Option<HttpMethod>,
    },

    /// Case-insensitive search over path, description and group
    Search {
        /// Text to look for
        #[arg(long)]
        query: Option<String>,
        #[arg(long, value_parser = parse_method)]
        method: Option<HttpMethod>,
        #[arg(long)]
        group: Option<String>,
    },

    /// Exact-match lookup; every given field must match
    Find {
        #[arg(long)]
        path: Option<String>,
        #[arg(long, value_parser = parse_method)]
        method: Option<HttpMethod>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        group: Option<String>,
    },

    /// Add a new endpoint from a YAML/JSON file ("-" reads stdin)
    Add { file: String },

    /// Replace an existing endpoint from a YAML/JSON file ("-" reads stdin)
    Update { file: String },

    /// Remove a path with all its methods and history
    Remove { path: String },

    /// Record the current state of an endpoint as a new version
    Version {
        path: String,
        #[arg(long, value_parser = parse_method)]
        method: Option<HttpMethod>,
        /// Force the kind of change instead of classifying it
        #[arg(long, value_parser = parse_change_type)]
        change_type: Option<ChangeType>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// List the version history of a path, newest first
    Versions {
        path: String,
        /// Only this method's history
        #[arg(long, value_parser = parse_method)]
        method: Option<HttpMethod>,
    },

    /// Show the record stored under a version
    Rollback {
        path: String,
        version: String,
        /// Required when several methods share the version tag
        #[arg(long, value_parser = parse_method)]
        method: Option<HttpMethod>,
        /// Make the historical record the current one again
        #[arg(long)]
        restore: bool,
    },

    /// Field-level diff between two versions of a path
    Compare {
        path: String,
        v1: String,
        v2: String,
        /// Required when several methods share the version tag
        #[arg(long, value_parser = parse_method)]
        method: Option<HttpMethod>,
    },

    /// Start or advance the deprecation of a path
    Deprecate {
        path: String,
        /// pending, scheduled or deprecated (default: deprecated)
        #[arg(long, value_parser = parse_status)]
        status: Option<DeprecationStatus>,
        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(long, value_parser = parse_timestamp)]
        removal_date: Option<DateTime<Utc>>,
        /// Endpoint clients should move to
        #[arg(long)]
        alternative: Option<String>,
        #[arg(long)]
        reason: Option<String>,
        /// Allow moving the lifecycle backwards
        #[arg(long)]
        force: bool,
    },

    /// Clear the deprecation of a path
    Reinstate { path: String },

    /// List deprecated endpoints
    Deprecated,

    /// Dump every endpoint as JSON or YAML
    Export,

    /// Create or update every endpoint listed in a YAML/JSON file
    Import { file: String },
}

fn parse_method(s: &str) -> Result<HttpMethod, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_change_type(s: &str) -> Result<ChangeType, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_status(s: &str) -> Result<DeprecationStatus, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("Invalid date '{s}': expected RFC 3339 or YYYY-MM-DD"))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = EndpointStore::open(&cli.db)?;

    if !cli.no_seed {
        let records = match &cli.seed_file {
            Some(path) => seed::load_seed_file(path)?,
            None => seed::default_endpoints(),
        };
        let seeded = store.seed_if_empty(&records)?;
        if seeded > 0 {
            log::info!("Seeded {seeded} endpoints into {}", cli.db.display());
        }
    }

    // on error the handle is released by Drop
    dispatch(&store, &cli)?;
    store.close()?;
    Ok(())
}

fn dispatch(store: &EndpointStore, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let service = DocumentationService::new(store);
    let format = cli.format;
    let locale = Locale::from(cli.lang);

    match &cli.command {
        Command::List => {
            print_records(&store.find_all()?, format, locale)?;
        }

        Command::Get { path, method } => {
            let records = match method {
                Some(method) => store
                    .find_by_identity(path, *method)?
                    .into_iter()
                    .collect(),
                None => store.find_by_path(path)?,
            };
            if records.is_empty() {
                return Err(format!("Endpoint not found: {path}").into());
            }
            print_records(&records, format, locale)?;
        }

        Command::Search {
            query,
            method,
            group,
        } => {
            let query = TextQuery {
                text: query.clone(),
                method: *method,
                group: group.clone(),
            };
            let found = search::filter_records(store.find_all()?, &query);
            if found.is_empty() {
                return Err("No endpoint matches the given criteria".into());
            }
            print_records(&found, format, locale)?;
        }

        Command::Find {
            path,
            method,
            description,
            group,
        } => {
            let criteria = SearchCriteria {
                path: path.clone(),
                method: *method,
                description: description.clone(),
                group: group.clone(),
                ..Default::default()
            };
            print_records(&service.search_endpoints(&criteria)?, format, locale)?;
        }

        Command::Add { file } => {
            let record = read_record(file)?;
            service.create_endpoint(&record)?;
            print_value(
                &serde_json::json!({ "ok": true, "added": record.path, "method": record.method }),
                format,
            )?;
        }

        Command::Update { file } => {
            let record = read_record(file)?;
            service.update_endpoint(&record)?;
            print_value(
                &serde_json::json!({ "ok": true, "updated": record.path, "method": record.method }),
                format,
            )?;
        }

        Command::Remove { path } => {
            let removed = service.remove_endpoint(path)?;
            print_value(
                &serde_json::json!({ "ok": true, "removed": path, "rows": removed }),
                format,
            )?;
        }

        Command::Version {
            path,
            method,
            change_type,
            notes,
        } => {
            let version = service.version_endpoint(path, *method, *change_type, notes.as_deref())?;
            print_value(
                &serde_json::json!({ "ok": true, "path": path, "version": version }),
                format,
            )?;
        }

        Command::Versions { path, method } => {
            let versions = service.list_versions(path, *method)?;
            print_value(&serde_json::to_value(versions)?, format)?;
        }

        Command::Rollback {
            path,
            version,
            method,
            restore,
        } => {
            let record = service.rollback_endpoint(path, *method, version, *restore)?;
            print_records(&[record], format, locale)?;
        }

        Command::Compare {
            path,
            v1,
            v2,
            method,
        } => {
            let comparison = service.compare_versions(path, *method, v1, v2)?;
            print_value(&serde_json::to_value(comparison)?, format)?;
        }

        Command::Deprecate {
            path,
            status,
            removal_date,
            alternative,
            reason,
            force,
        } => {
            let request = DeprecationRequest {
                status: *status,
                deprecated_at: None,
                removal_date: *removal_date,
                alternative_endpoint: alternative.clone(),
                reason: reason.clone(),
                force: *force,
            };
            service.deprecate_endpoint(path, request)?;
            let config = store.is_deprecated(path)?;
            print_value(
                &serde_json::json!({ "ok": true, "path": path, "deprecation": config }),
                format,
            )?;
        }

        Command::Reinstate { path } => {
            let updated = service.reinstate_endpoint(path)?;
            print_value(
                &serde_json::json!({ "ok": true, "reinstated": path, "endpoints": updated }),
                format,
            )?;
        }

        Command::Deprecated => {
            let deprecated = service.list_deprecated()?;
            print_value(&serde_json::to_value(deprecated)?, format)?;
        }

        Command::Export => {
            let export_format = match format {
                OutputFormat::Yaml => OutputFormat::Yaml,
                _ => OutputFormat::Json,
            };
            print_records(&store.find_all()?, export_format, locale)?;
        }

        Command::Import { file } => {
            let records = seed::parse_seed_str(&read_input(file)?)?;
            for record in &records {
                service.upsert_endpoint(record)?;
            }
            print_value(
                &serde_json::json!({ "ok": true, "imported": records.len() }),
                format,
            )?;
        }
    }

    Ok(())
}

fn print_records(
    records: &[EndpointRecord],
    format: OutputFormat,
    locale: Locale,
) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = render::render_records(records, format.into(), locale)?;
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Print a non-record result. Prose formats fall back to JSON.
fn print_value(
    value: &serde_json::Value,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn read_input(file: &str) -> Result<String, Box<dyn std::error::Error>> {
    if file == "-" {
        use std::io::Read;
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        let content = std::fs::read_to_string(file)
            .map_err(|e| format!("Failed to read file '{file}': {e}"))?;
        Ok(content)
    }
}

fn read_record(file: &str) -> Result<EndpointRecord, Box<dyn std::error::Error>> {
    let record: EndpointRecord = serde_yaml::from_str(&read_input(file)?)?;
    Ok(record)
}
