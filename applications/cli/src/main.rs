/// Cloudbox - command-line client for cloud file storage
mod config;
mod host;

use anyhow::{anyhow, bail};
use clap::{Parser, Subcommand};
use cloudbox_client::{ClientConfig, CloudboxClient, FileRecord, UploadFile};
use cloudbox_state::{ErrorPolicy, FileSessionStorage, RefreshTask, Rejection, Session, Store};
use crate::config::CliConfig;
use crate::host::DirectoryHost;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cloudbox")]
#[command(about = "Cloudbox file storage client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "CLOUDBOX_PASSWORD")]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "CLOUDBOX_PASSWORD")]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// List stored files
    List,
    /// Upload one or more files
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Delete a file
    Delete { id: String },
    /// Download a file
    Download {
        id: String,
        /// Directory to save into
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
    /// Print a file's preview URL
    Preview { id: String },
    /// Keep the file list fresh until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cloudbox_cli=info,cloudbox_state=info,cloudbox_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = CliConfig::load()?;
    config.validate()?;

    let download_dir = match &cli.command {
        Commands::Download { dir, .. } => dir.clone(),
        _ => PathBuf::from("."),
    };

    let client = CloudboxClient::new(ClientConfig::new(config.api_url.clone()))?;
    let host = Arc::new(DirectoryHost::new(download_dir));
    let store = Store::new(
        client,
        Arc::new(FileSessionStorage::new(config.session_file.clone())),
        host.clone(),
    );

    match cli.command {
        Commands::Login { email, password } => {
            let session = store.login(&email, &password).await.map_err(report)?;
            println!("Signed in as {}", display_name(&session, &email));
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let session = store
                .register(&name, &email, &password)
                .await
                .map_err(report)?;
            println!("Account created; signed in as {}", display_name(&session, &email));
        }
        Commands::Logout => {
            if store.sign_out()? {
                println!("Signed out");
            } else {
                println!("Not signed in");
            }
        }
        Commands::List => {
            let session = require_session(&store)?;
            let files = store.fetch_all(&session).await.map_err(report)?;
            print_files(&files);
        }
        Commands::Upload { paths } => {
            let session = require_session(&store)?;
            upload(&store, &session, &paths).await?;
        }
        Commands::Delete { id } => {
            let session = require_session(&store)?;
            store.delete(&session, &id).await.map_err(report)?;
            println!("Deleted {}", id);
        }
        Commands::Download { id, .. } => {
            let session = require_session(&store)?;
            let outcome = store.download(&session, &id).await.map_err(report)?;
            println!("Saved {}", host.target(&outcome.file_name).display());
        }
        Commands::Preview { id } => {
            let session = require_session(&store)?;
            store.preview(&session, &id).await.map_err(report)?;
        }
        Commands::Watch => {
            let session = require_session(&store)?;
            watch(&store, &session, &config).await?;
        }
    }

    Ok(())
}

fn require_session(store: &Store) -> anyhow::Result<Session> {
    store
        .restore_session()?
        .ok_or_else(|| anyhow!("Not signed in. Run `cloudbox login` first."))
}

/// Turn a rejection into the error printed to the user.
fn report(rejection: Rejection) -> anyhow::Error {
    if rejection.is_unauthorized() {
        anyhow!("Your session has expired. Please sign in again with `cloudbox login`.")
    } else {
        anyhow::Error::new(rejection)
    }
}

fn display_name<'a>(session: &'a Session, fallback: &'a str) -> &'a str {
    session
        .user
        .as_ref()
        .and_then(|u| u.name.as_deref().or(u.email.as_deref()))
        .unwrap_or(fallback)
}

fn print_files(files: &[FileRecord]) {
    if files.is_empty() {
        println!("No files");
        return;
    }

    println!("{}", file_count(files.len()));
    for file in files {
        println!(
            "{:<26} {:>10}  {}  {}",
            file.id,
            format_bytes(file.size),
            file.created_at.format("%Y-%m-%d %H:%M"),
            file.file_name
        );
    }
}

fn file_count(count: usize) -> String {
    if count == 1 {
        "1 file".to_string()
    } else {
        format!("{} files", count)
    }
}

/// Human-readable size in binary units, e.g. `1.5 KB`.
#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        let rounded = format!("{:.2}", value);
        let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
        format!("{} {}", trimmed, UNITS[unit])
    }
}

async fn upload(store: &Store, session: &Session, paths: &[PathBuf]) -> anyhow::Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    let mut failed = 0;
    for path in paths {
        match UploadFile::from_path(path).await {
            Ok(file) => files.push(file),
            Err(e) => {
                failed += 1;
                eprintln!("Skipping {}: {}", path.display(), e);
            }
        }
    }

    for (file, result) in files.iter().zip(store.upload_batch(session, &files).await) {
        match result {
            Ok(record) => println!("Uploaded {} ({})", record.file_name, record.id),
            Err(rejection) if rejection.is_unauthorized() => return Err(report(rejection)),
            Err(rejection) => {
                failed += 1;
                eprintln!("Failed to upload {}: {}", file.file_name, rejection);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} uploads failed", failed, paths.len());
    }
    Ok(())
}

async fn watch(store: &Store, session: &Session, config: &CliConfig) -> anyhow::Result<()> {
    let files = store.fetch_all(session).await.map_err(report)?;
    print_files(&files);

    let (tx, mut errors) = tokio::sync::mpsc::unbounded_channel();
    let task = RefreshTask::spawn(
        store.clone(),
        config.refresh_interval(),
        ErrorPolicy::Surface(tx),
    );
    let mut state = store.subscribe();
    let mut last = files;

    tracing::info!(
        "Watching for changes every {}s (Ctrl-C to stop)",
        config.refresh_secs
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            Some(rejection) = errors.recv() => {
                if rejection.is_unauthorized() {
                    break Err(report(rejection));
                }
                eprintln!("Refresh failed: {}", rejection);
                store.clear_error();
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let files = state.borrow_and_update().files.files.clone();
                if files != last {
                    print_files(&files);
                    last = files;
                }
            }
        }
    };

    task.shutdown().await;
    result
}
