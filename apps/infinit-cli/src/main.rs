//! infinit - resolution and deduplication over a movement database

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use infinit_core::{
    AliasIndex, EntityResolver, IngestOutcome, IngestRequest, NameNormalizer, Resolution,
    ResolutionConfig, SequenceRatio, SourceDeduplicator, TokenSetRatio, ingest_document,
    seed_from_config, MovementDeduplicator,
};
use infinit_store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "infinit", version, about = "Movement entity resolution and deduplication")]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true, default_value = "infinit.db")]
    db: PathBuf,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve free text to a known movement
    Resolve {
        /// Text to match against known names and aliases
        text: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Install configured movements and aliases into the database
    Seed,
    /// Ingest a document from a file or stdin
    Ingest {
        /// Origin URL of the document
        url: String,
        /// Document title
        #[arg(long, default_value = "")]
        title: String,
        /// Read the body from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
        /// Publication timestamp, RFC 3339
        #[arg(long)]
        published_at: Option<DateTime<Utc>>,
    },
    /// Find duplicate movements and optionally merge them
    DedupMovements {
        /// Apply the merges instead of only printing the plan
        #[arg(long)]
        merge: bool,
    },
    /// Source document deduplication utilities
    DedupSources {
        #[command(subcommand)]
        command: SourceCommand,
    },
}

#[derive(Subcommand)]
enum SourceCommand {
    /// Compute missing content fingerprints
    UpdateHashes {
        #[arg(long, default_value_t = 100)]
        batch_size: usize,
    },
    /// Recompute stored fingerprints and refresh stale ones
    Verify,
    /// List duplicate document groups without deleting anything
    Find,
    /// Delete redundant duplicate documents
    Remove {
        /// Actually delete; without this flag the run is a dry run
        #[arg(long)]
        force: bool,
    },
    /// Print corpus-wide duplicate statistics
    Stats,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => ResolutionConfig::load(path)?,
        None => ResolutionConfig::default(),
    };
    let normalizer = if config.qualifier_words.is_empty() {
        NameNormalizer::default()
    } else {
        NameNormalizer::new(&config.qualifier_words)
    };
    let store = SqliteStore::open(&cli.db)?;

    match cli.command {
        Command::Resolve { text, json } => {
            let index = AliasIndex::build(&config, &store, &normalizer)?;
            let similarity = TokenSetRatio;
            let resolver =
                EntityResolver::new(&index, &normalizer, &similarity, config.min_fuzzy_score);
            match resolver.resolve(&text) {
                Resolution::Found {
                    movement,
                    method,
                    score,
                } => {
                    let name = store
                        .movement(movement)?
                        .map(|m| m.canonical_name)
                        .unwrap_or_default();
                    if json {
                        println!(
                            "{}",
                            serde_json::json!({
                                "movement_id": movement.as_i64(),
                                "canonical_name": name,
                                "method": method,
                                "score": score,
                            })
                        );
                    } else {
                        println!("[{}] {} ({:?}, score {})", movement.as_i64(), name, method, score);
                    }
                }
                Resolution::NotFound => {
                    if json {
                        println!("null");
                    } else {
                        println!("no match");
                    }
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Seed => {
            let stats = seed_from_config(&store, &config, &normalizer)?;
            println!(
                "movements: {} created, {} existing; aliases: {} created, {} skipped",
                stats.movements_created,
                stats.movements_existing,
                stats.aliases_created,
                stats.aliases_skipped
            );
        }
        Command::Ingest {
            url,
            title,
            file,
            published_at,
        } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let index = AliasIndex::build(&config, &store, &normalizer)?;
            let similarity = TokenSetRatio;
            let resolver =
                EntityResolver::new(&index, &normalizer, &similarity, config.min_fuzzy_score);
            let outcome = ingest_document(
                &store,
                &resolver,
                IngestRequest {
                    url,
                    title,
                    text,
                    published_at,
                },
            )?;
            match outcome {
                IngestOutcome::Inserted { id, resolution } => match resolution.movement() {
                    Some(movement) => println!(
                        "stored source {} under movement {}",
                        id.as_i64(),
                        movement.as_i64()
                    ),
                    None => println!("stored source {} (unattributed)", id.as_i64()),
                },
                IngestOutcome::DuplicateUrl { existing } => {
                    println!("already stored as source {} (same url)", existing.id.as_i64());
                }
                IngestOutcome::DuplicateContent { existing } => {
                    println!(
                        "already stored as source {} (same content)",
                        existing.id.as_i64()
                    );
                }
            }
        }
        Command::DedupMovements { merge } => {
            let similarity = SequenceRatio;
            let dedup = MovementDeduplicator::new(
                &store,
                &normalizer,
                &similarity,
                config.merge_similarity,
            );
            let plan = dedup.plan_merges()?;
            print!("{}", plan.render_report());
            if merge && !plan.is_empty() {
                let report = dedup.apply_merges(&plan);
                println!(
                    "merged {} group(s): {} movement(s) removed, {} alias(es) created, {} document(s) reassigned",
                    report.groups_applied,
                    report.outcome.movements_deleted,
                    report.outcome.aliases_created,
                    report.outcome.sources_reassigned
                );
                if !report.failures.is_empty() {
                    for (survivor, error) in &report.failures {
                        eprintln!("group [{}] failed: {}", survivor.as_i64(), error);
                    }
                    return Err(format!("{} merge group(s) failed", report.failures.len()).into());
                }
            }
        }
        Command::DedupSources { command } => run_source_command(&store, command)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn run_source_command(
    store: &SqliteStore,
    command: SourceCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let dedup = SourceDeduplicator::new(store);
    match command {
        SourceCommand::UpdateHashes { batch_size } => {
            let stats = dedup.backfill_fingerprints(batch_size)?;
            println!(
                "{} processed, {} updated, {} error(s)",
                stats.processed, stats.updated, stats.errors
            );
        }
        SourceCommand::Verify => {
            let stats = dedup.verify_fingerprints()?;
            println!("{} checked, {} refreshed", stats.checked, stats.mismatched);
        }
        SourceCommand::Find => {
            let groups = dedup.find_duplicates()?;
            if groups.is_empty() {
                println!("no duplicates found");
                return Ok(());
            }
            for group in &groups {
                match &group.key {
                    infinit_core::DuplicateKey::Url(url) => println!("url {}", url),
                    infinit_core::DuplicateKey::Content(fp) => println!("content {}", fp.short()),
                }
                println!("  keep   {}", group.keep.as_i64());
                for id in &group.remove {
                    println!("  remove {}", id.as_i64());
                }
            }
        }
        SourceCommand::Remove { force } => {
            let stats = dedup.remove_duplicates(!force)?;
            let verb = if force { "removed" } else { "would remove" };
            println!(
                "{} {} document(s) in {} group(s), {} error(s)",
                verb, stats.removed, stats.groups_found, stats.errors
            );
        }
        SourceCommand::Stats => {
            let report = dedup.duplicate_stats()?;
            println!("sources:             {}", report.total_sources);
            println!("missing fingerprint: {}", report.missing_fingerprint);
            println!("url groups:          {}", report.url_groups);
            println!("content groups:      {}", report.content_groups);
            println!("redundant documents: {}", report.redundant_documents);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_then_merge_through_cli() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("test.db");
        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"known_movements = ["Wicca", "Hnutí Wicca čarodějnictví"]"#,
        )
        .unwrap();

        let seed = Cli::parse_from([
            "infinit",
            "--db",
            db.to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
            "seed",
        ]);
        run(seed).unwrap();

        let store = SqliteStore::open(&db).unwrap();
        assert_eq!(store.movements().unwrap().len(), 2);
        drop(store);

        let merge = Cli::parse_from([
            "infinit",
            "--db",
            db.to_str().unwrap(),
            "dedup-movements",
            "--merge",
        ]);
        run(merge).unwrap();

        let store = SqliteStore::open(&db).unwrap();
        let movements = store.movements().unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].canonical_name, "Hnutí Wicca čarodějnictví");
    }

    #[test]
    fn test_resolve_no_match_returns_instead_of_exiting() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("test.db");
        // Under an empty database nothing resolves; run() must come back
        // with a failure exit code rather than terminating the process.
        let cli = Cli::parse_from([
            "infinit",
            "--db",
            db.to_str().unwrap(),
            "resolve",
            "neznámý text",
        ]);
        assert!(run(cli).is_ok());
    }

    #[test]
    fn test_source_verify_subcommand_runs() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("test.db");
        let cli = Cli::parse_from([
            "infinit",
            "--db",
            db.to_str().unwrap(),
            "dedup-sources",
            "verify",
        ]);
        run(cli).unwrap();
    }

    #[test]
    fn test_source_stats_on_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("test.db");
        let cli = Cli::parse_from([
            "infinit",
            "--db",
            db.to_str().unwrap(),
            "dedup-sources",
            "stats",
        ]);
        run(cli).unwrap();
    }
}
