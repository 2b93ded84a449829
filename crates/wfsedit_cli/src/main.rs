//! Command-line client for a WFS-T server.

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wfsedit_client::{Engine, HttpTransport, WriteOutcome};
use wfsedit_core::{
    CollectionRef, Config, Feature, Geometry, SketchSurface, TransactionOutcome, SEED_ATTRIBUTE,
};

#[derive(Parser)]
#[command(name = "wfsedit", about = "Edit WFS-T feature collections", version)]
struct Cli {
    /// WFS endpoint (can also be set via WFS_ENDPOINT env var)
    #[arg(short, long, env = "WFS_ENDPOINT")]
    endpoint: Option<String>,

    /// Collection to operate on, qualified or bare (bare names get WFS_NAMESPACE_PREFIX)
    #[arg(short, long, env = "WFS_COLLECTION", global = true)]
    collection: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// List the server's feature types
    Collections,
    /// Page through the features of a collection
    List {
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Defaults to WFS_PAGE_SIZE
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Print one feature
    Show { fid: String },
    /// Insert a feature from a GeoJSON geometry
    Insert {
        #[arg(short, long)]
        geometry: String,
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Update the geometry and/or attributes of a feature
    Update {
        fid: String,
        #[arg(short, long)]
        geometry: Option<String>,
        /// Attribute assignment, repeatable
        #[arg(long = "set", value_name = "KEY=VALUE")]
        assignments: Vec<String>,
    },
    /// Delete a feature
    Delete {
        fid: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

type CliEngine = Engine<HttpTransport, SketchSurface>;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "wfsedit=info".into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn resolve_config(endpoint: Option<String>) -> Config {
    let mut config = Config::from_env();
    if let Some(endpoint) = endpoint {
        let trimmed = endpoint.trim();
        if !trimmed.is_empty() {
            config.endpoint = trimmed.to_string();
        }
    }
    config
}

fn parse_geometry(raw: &str) -> anyhow::Result<Geometry> {
    let value: Value = serde_json::from_str(raw).context("geometry is not valid JSON")?;
    Ok(Geometry::from_geojson(&value)?)
}

/// Parse a `key=value` attribute assignment.
///
/// Numbers and `null` keep their JSON type; anything else is a string.
fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got '{}'", raw));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing attribute name in '{}'", raw));
    }
    let value = match serde_json::from_str::<Value>(value) {
        Ok(parsed @ (Value::Number(_) | Value::Null)) => parsed,
        _ => Value::String(value.to_string()),
    };
    Ok((key.to_string(), value))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn prompt_delete(feature: &Feature) -> bool {
    let id = feature.id.as_deref().unwrap_or("?");
    eprint!("Delete feature {}? [y/N] ", id);
    let _ = io::stderr().flush();
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => is_affirmative(&answer),
        Err(_) => false,
    }
}

fn feature_label(feature: &Feature) -> String {
    feature
        .properties
        .get(SEED_ATTRIBUTE)
        .and_then(wfsedit_core::models::feature::property_text)
        .unwrap_or_default()
}

fn format_collections(collections: &[CollectionRef]) -> String {
    collections
        .iter()
        .map(|c| match &c.title {
            Some(title) => format!("{:<32} {}", c.namespace_qualified_name, title),
            None => c.namespace_qualified_name.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_feature_rows(features: &[Feature]) -> String {
    features
        .iter()
        .map(|feature| {
            format!(
                "{:<24} {:<16} {}",
                feature.id.as_deref().unwrap_or("-"),
                feature.geometry.kind(),
                feature_label(feature)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_outcome(outcome: &TransactionOutcome) -> String {
    match outcome {
        TransactionOutcome::InsertOk { feature_id } => format!("Inserted: {}", feature_id),
        TransactionOutcome::UpdateOk => "Updated".to_string(),
        TransactionOutcome::DeleteOk => "Deleted".to_string(),
        TransactionOutcome::Unrecognized { .. } => {
            "Server response not recognized; collection refreshed anyway".to_string()
        }
    }
}

fn outcome_json(written: &WriteOutcome) -> Value {
    let mut value = match &written.outcome {
        TransactionOutcome::InsertOk { feature_id } => {
            json!({ "result": "insert", "feature_id": feature_id })
        }
        TransactionOutcome::UpdateOk => json!({ "result": "update" }),
        TransactionOutcome::DeleteOk => json!({ "result": "delete" }),
        TransactionOutcome::Unrecognized { raw_text } => {
            json!({ "result": "unrecognized", "raw_text": raw_text })
        }
    };
    value["refreshed"] = Value::Bool(written.refresh.is_ok());
    value
}

fn print_written(written: &WriteOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome_json(written))?);
    } else {
        println!("{}", format_outcome(&written.outcome));
        if let Err(err) = &written.refresh {
            eprintln!("Refresh after write failed: {}", err);
        }
    }
    Ok(())
}

async fn open_collection(
    engine: &mut CliEngine,
    config: &Config,
    collection: Option<String>,
) -> anyhow::Result<()> {
    let Some(name) = collection else {
        bail!("no collection given; pass --collection or set WFS_COLLECTION");
    };
    let collection = CollectionRef::new(&name, &config.namespace_prefix, true);
    engine
        .activate_collection(collection)
        .await
        .with_context(|| format!("failed to load collection '{}'", name))?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let Cli {
        endpoint,
        collection,
        json,
        command,
    } = Cli::parse();

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    init_tracing();
    let config = resolve_config(endpoint);
    debug!(endpoint = %config.endpoint, "using WFS endpoint");
    let transport = HttpTransport::from_config(&config)?;
    let mut engine = Engine::new(&config, transport, SketchSurface::new());

    match command {
        Commands::Completions { .. } => unreachable!("completions handled before engine setup"),
        Commands::Collections => {
            let collections = engine
                .list_collections()
                .await
                .context("failed to list collections")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&collections)?);
            } else if !collections.is_empty() {
                println!("{}", format_collections(&collections));
            }
        }
        Commands::List { page, page_size } => {
            open_collection(&mut engine, &config, collection).await?;
            let snapshot = engine.current_snapshot();
            let page = snapshot.page(page, page_size.unwrap_or(config.page_size));
            if json {
                let body = json!({
                    "page": page.page,
                    "total_pages": page.total_pages,
                    "bounds": page.bounds().map(|b| [b.min_x, b.min_y, b.max_x, b.max_y]),
                    "features": page.features,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                if !page.features.is_empty() {
                    println!("{}", format_feature_rows(page.features));
                }
                eprintln!(
                    "page {}/{} ({} features)",
                    page.page,
                    page.total_pages,
                    snapshot.len()
                );
            }
        }
        Commands::Show { fid } => {
            open_collection(&mut engine, &config, collection).await?;
            let feature = engine.select_feature(&fid)?;
            if json {
                println!("{}", serde_json::to_string_pretty(feature)?);
            } else {
                println!("{}", format_feature_rows(std::slice::from_ref(feature)));
                for (key, value) in &feature.properties {
                    println!("  {} = {}", key, value);
                }
            }
        }
        Commands::Insert { geometry, name } => {
            let geometry = parse_geometry(&geometry)?;
            open_collection(&mut engine, &config, collection).await?;
            engine.begin_draw()?;
            engine.surface_mut().set_geometry(geometry);
            if let Some(name) = name {
                engine.set_attribute(SEED_ATTRIBUTE, Value::String(name))?;
            }
            let written = engine.save_edit().await.context("insert failed")?;
            print_written(&written, json)?;
        }
        Commands::Update {
            fid,
            geometry,
            assignments,
        } => {
            let geometry = geometry.as_deref().map(parse_geometry).transpose()?;
            let assignments = assignments
                .iter()
                .map(|raw| parse_assignment(raw))
                .collect::<Result<Vec<_>, _>>()
                .map_err(anyhow::Error::msg)?;
            open_collection(&mut engine, &config, collection).await?;
            engine.begin_edit_by_id(&fid)?;
            if let Some(geometry) = geometry {
                engine.surface_mut().set_geometry(geometry);
            }
            for (key, value) in assignments {
                engine.set_attribute(&key, value)?;
            }
            let written = engine.save_edit().await.context("update failed")?;
            print_written(&written, json)?;
        }
        Commands::Delete { fid, yes } => {
            open_collection(&mut engine, &config, collection).await?;
            let feature = engine
                .current_snapshot()
                .find(&fid)
                .cloned()
                .with_context(|| format!("feature '{}' not found", fid))?;
            let written = engine
                .confirm_delete(&feature, |feature| yes || prompt_delete(feature))
                .await
                .context("delete failed")?;
            print_written(&written, json)?;
        }
    }

    Ok(())
}
