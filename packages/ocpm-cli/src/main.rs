//! Command-line surface over the discovery engine.
//!
//! Artifacts and uploads live in a filesystem blob store below
//! `OCPM_DATA_DIR`. Responses are JSON on stdout; logs go to stderr.

mod config;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use console::style;
use ocpm_core::{
    ArtifactId, BlobArtifactCache, DiscoveryEngine, DotRenderer, FilterSpec, FsBlobStore,
    JsonOcelMiner, LogSummary, Metric, Orientation, RenderParams, Rendered, VisualizationKind,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

type Engine = DiscoveryEngine<JsonOcelMiner, BlobArtifactCache<FsBlobStore>, FsBlobStore>;

#[derive(Parser)]
#[command(name = "ocpm")]
#[command(about = "Object-centric process discovery with cached models and percentile filtering")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest an OCEL JSON log and discover its models
    Ingest {
        path: PathBuf,
        /// Name recorded with the artifact (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Filter a cached artifact and render it as DOT
    Filter {
        id: ArtifactId,
        #[arg(long, default_value_t = 100)]
        activity_percent: u8,
        #[arg(long, default_value_t = 100)]
        path_percent: u8,
        /// Object types to keep, comma separated
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,
        /// events, unique_objects or total_objects
        #[arg(long, default_value = "unique_objects")]
        metric: Metric,
        /// horizontal (LR) or vertical (TB)
        #[arg(long, default_value = "horizontal")]
        orientation: Orientation,
        /// ocdfg or ocpn
        #[arg(long, default_value = "ocdfg")]
        kind: VisualizationKind,
        #[arg(long, default_value = "svg")]
        format: String,
        /// Write the DOT source here instead of embedding it in the response
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Remove an artifact and its stored upload
    Evict { id: ArtifactId },

    /// Remove artifacts older than the configured TTL
    Sweep,

    /// Show the object types of an artifact
    Types { id: ArtifactId },

    /// List cached artifacts, oldest first
    List,
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Response {
    Ingested {
        success: bool,
        artifact_id: ArtifactId,
        object_types: BTreeSet<String>,
        summary: LogSummary,
        params: RenderParams,
    },
    Filtered {
        success: bool,
        artifact_id: ArtifactId,
        rediscovered: bool,
        selection: Option<BTreeSet<String>>,
        params: RenderParams,
        #[serde(skip_serializing_if = "Option::is_none")]
        dot: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<PathBuf>,
    },
    Evicted {
        success: bool,
        evicted: usize,
    },
    Types {
        success: bool,
        artifact_id: ArtifactId,
        object_types: BTreeSet<String>,
        selection: Option<BTreeSet<String>>,
    },
    Listed {
        success: bool,
        artifacts: Vec<ArtifactListing>,
    },
}

#[derive(Debug, Serialize)]
struct ArtifactListing {
    artifact_id: ArtifactId,
    source_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    object_types: BTreeSet<String>,
    selection: Option<BTreeSet<String>>,
    generation: u64,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ocpm_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(data_dir = %config.data_dir.display(), "Configuration loaded");

    let engine = build_engine(&config);
    match run(&engine, cli.command).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn build_engine(config: &Config) -> Engine {
    let engine_config = config.engine_config();
    let blobs = FsBlobStore::new(&config.data_dir);
    let cache = BlobArtifactCache::new(blobs.clone(), engine_config.artifact_prefix.clone());
    DiscoveryEngine::with_config(JsonOcelMiner::new(), cache, blobs, engine_config)
}

// ============================================================================
// Commands
// ============================================================================

async fn run(engine: &Engine, command: Commands) -> Result<Response> {
    match command {
        Commands::Ingest { path, name } => cmd_ingest(engine, path, name).await,
        Commands::Filter {
            id,
            activity_percent,
            path_percent,
            types,
            metric,
            orientation,
            kind,
            format,
            output,
        } => {
            let spec = FilterSpec {
                activity_percent,
                path_percent,
                selected_object_types: (!types.is_empty()).then(|| types.into_iter().collect()),
                annotation_metric: metric,
                orientation,
                output_format: format,
            };
            cmd_filter(engine, id, spec, kind, output).await
        }
        Commands::Evict { id } => {
            engine.evict(&id).await?;
            Ok(Response::Evicted {
                success: true,
                evicted: 1,
            })
        }
        Commands::Sweep => {
            let evicted = engine.evict_expired(Utc::now()).await?;
            Ok(Response::Evicted {
                success: true,
                evicted,
            })
        }
        Commands::Types { id } => {
            let artifact = engine.artifact(&id).await?;
            Ok(Response::Types {
                success: true,
                artifact_id: id,
                object_types: artifact.object_types.clone(),
                selection: artifact.selection.clone(),
            })
        }
        Commands::List => {
            let artifacts = engine
                .artifacts()
                .await?
                .iter()
                .map(|artifact| ArtifactListing {
                    artifact_id: artifact.id,
                    source_name: artifact.source_name.clone(),
                    created_at: artifact.created_at,
                    updated_at: artifact.updated_at,
                    object_types: artifact.object_types.clone(),
                    selection: artifact.selection.clone(),
                    generation: artifact.generation,
                })
                .collect();
            Ok(Response::Listed {
                success: true,
                artifacts,
            })
        }
    }
}

async fn cmd_ingest(engine: &Engine, path: PathBuf, name: Option<String>) -> Result<Response> {
    let raw = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = name.unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    });

    let ingested = engine.ingest(&name, &raw).await?;
    Ok(Response::Ingested {
        success: true,
        artifact_id: ingested.artifact_id,
        object_types: ingested.object_types,
        summary: ingested.summary,
        params: ingested.params,
    })
}

async fn cmd_filter(
    engine: &Engine,
    id: ArtifactId,
    spec: FilterSpec,
    kind: VisualizationKind,
    output: Option<PathBuf>,
) -> Result<Response> {
    let outcome = engine.filter(&id, &spec, kind).await?;
    let dot = match outcome.render(&DotRenderer::new())? {
        Rendered::Text(text) => text,
        Rendered::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    };

    let dot = match &output {
        Some(path) => {
            tokio::fs::write(path, dot)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            None
        }
        None => Some(dot),
    };

    Ok(Response::Filtered {
        success: true,
        artifact_id: id,
        rediscovered: outcome.rediscovered,
        selection: outcome.selection,
        params: outcome.params,
        dot,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine_in(dir: &TempDir) -> Engine {
        build_engine(&Config {
            data_dir: dir.path().to_path_buf(),
            artifact_ttl: chrono::Duration::hours(24),
        })
    }

    #[test]
    fn parses_filter_arguments() {
        let cli = Cli::try_parse_from([
            "ocpm",
            "filter",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "--types",
            "order,item",
            "--metric",
            "events",
            "--kind",
            "ocpn",
            "--orientation",
            "vertical",
        ])
        .unwrap();

        let Commands::Filter {
            types,
            metric,
            kind,
            orientation,
            ..
        } = cli.command
        else {
            panic!("expected filter command");
        };
        assert_eq!(types, vec!["order", "item"]);
        assert_eq!(metric, Metric::Events);
        assert_eq!(kind, VisualizationKind::PetriNet);
        assert_eq!(orientation, Orientation::TopToBottom);
    }

    #[test]
    fn rejects_unknown_metric() {
        let result = Cli::try_parse_from([
            "ocpm",
            "filter",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "--metric",
            "bogus",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn ingest_then_filter_roundtrip() {
        let dir = TempDir::new().unwrap();
        let upload = dir.path().join("sample.jsonocel");
        std::fs::write(&upload, ocpm_core::testing::sample_ocel()).unwrap();
        let engine = engine_in(&dir);

        let Response::Ingested { artifact_id, .. } = run(
            &engine,
            Commands::Ingest {
                path: upload,
                name: None,
            },
        )
        .await
        .unwrap() else {
            panic!("expected ingest response");
        };

        let response = run(
            &engine,
            Commands::Filter {
                id: artifact_id,
                activity_percent: 100,
                path_percent: 100,
                types: vec!["order".into()],
                metric: Metric::Events,
                orientation: Orientation::LeftToRight,
                kind: VisualizationKind::FlowGraph,
                format: "svg".into(),
                output: None,
            },
        )
        .await
        .unwrap();
        let Response::Filtered {
            rediscovered, dot, ..
        } = response
        else {
            panic!("expected filter response");
        };
        assert!(rediscovered);
        assert!(dot.unwrap().starts_with("digraph ocdfg {"));

        let Response::Types { selection, .. } =
            run(&engine, Commands::Types { id: artifact_id }).await.unwrap()
        else {
            panic!("expected types response");
        };
        assert_eq!(selection, Some(["order".to_string()].into()));
    }

    #[tokio::test]
    async fn list_shows_ingested_artifacts() {
        let dir = TempDir::new().unwrap();
        let upload = dir.path().join("orders.jsonocel");
        std::fs::write(&upload, ocpm_core::testing::sample_ocel()).unwrap();
        let engine = engine_in(&dir);

        let Response::Listed { artifacts, .. } = run(&engine, Commands::List).await.unwrap() else {
            panic!("expected list response");
        };
        assert!(artifacts.is_empty());

        run(
            &engine,
            Commands::Ingest {
                path: upload,
                name: None,
            },
        )
        .await
        .unwrap();

        let Response::Listed { artifacts, .. } = run(&engine, Commands::List).await.unwrap() else {
            panic!("expected list response");
        };
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].source_name, "orders.jsonocel");
        assert_eq!(artifacts[0].generation, 0);
        assert!(Cli::try_parse_from(["ocpm", "list"]).is_ok());
    }
}
