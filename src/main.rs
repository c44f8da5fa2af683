use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use lasttouch::cli::{Cli, Command};
use lasttouch::model::RepoEntry;
use lasttouch::repository::{Database, Indexer};
use lasttouch::util::format_timestamp;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => default_db_path()?,
    };
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let db_path_str = db_path.to_str().context("Invalid path encoding")?;
    let db = Database::new(db_path_str).await?;
    db.init_schema().await?;

    match cli.command {
        Command::Register { name, path } => {
            let abs_path = fs::canonicalize(&path)
                .with_context(|| format!("Could not resolve path: {}", path.display()))?;
            let abs_str = abs_path.to_str().context("Invalid path encoding")?;
            let repo = db.register_repository(&name, abs_str).await?;
            println!("Registered '{}' -> {}", repo.name, repo.path);
        }
        Command::Sync { name, quiet } => {
            let indexer = if quiet { Indexer::quiet() } else { Indexer::new() };
            let outcome = indexer.sync_by_name(&db, &name).await?;
            println!(
                "Synchronized {} commits with {} objects",
                outcome.commits_processed, outcome.objects_registered
            );
        }
        Command::Lookup { name, object, json } => {
            let repo = require_repository(&db, &name).await?;
            let oid = parse_oid(&object)?;

            match db.latest_commit_for(repo.id, oid.as_bytes()).await? {
                Some(commit) => {
                    let commit = git2::Oid::from_bytes(&commit)?;
                    if json {
                        let paths = db.object_paths(repo.id, oid.as_bytes()).await?;
                        println!(
                            "{}",
                            serde_json::json!({
                                "object": oid.to_string(),
                                "commit": commit.to_string(),
                                "paths": paths,
                            })
                        );
                    } else {
                        println!("{}", commit);
                    }
                }
                None => bail!(
                    "object {} is not in the index (has '{}' been synced?)",
                    object,
                    name
                ),
            }
        }
        Command::Predecessors { name, object } => {
            let repo = require_repository(&db, &name).await?;
            let oid = parse_oid(&object)?;

            let parents = db.predecessors_of(repo.id, oid.as_bytes()).await?;
            if parents.is_empty() {
                println!("(none recorded)");
            }
            for parent in parents {
                println!("{}", git2::Oid::from_bytes(&parent)?);
            }
        }
        Command::List => {
            let repos = db.list_repositories().await?;
            if repos.is_empty() {
                println!("No repositories registered");
            }
            for repo in repos {
                let objects = db.object_count(repo.id).await?;
                let synced = repo
                    .last_sync_at
                    .map(format_timestamp)
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{:<20} {:>8} objects  last sync: {:<16}  {}",
                    repo.name, objects, synced, repo.path
                );
            }
        }
    }

    Ok(())
}

async fn require_repository(db: &Database, name: &str) -> Result<RepoEntry> {
    match db.find_repository(name).await? {
        Some(repo) => Ok(repo),
        None => bail!("repository '{}' is not registered", name),
    }
}

fn parse_oid(object: &str) -> Result<git2::Oid> {
    git2::Oid::from_str(object).with_context(|| format!("Invalid object id: {}", object))
}

fn default_db_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .context("Could not determine cache directory")?
        .join("lasttouch");
    Ok(cache_dir.join("index.db"))
}
