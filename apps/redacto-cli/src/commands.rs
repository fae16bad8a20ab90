use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::BufReader;
use tracing::{info, warn};

use redacto_client::HttpRedactionClient;
use redacto_core::{config, pdf, ArtifactManager, AuditLog, Document, RedactionSession};

use crate::review::{self, ReviewOutcome};
use crate::{render, AnalyzeArgs, RedactArgs};

pub async fn analyze(args: AnalyzeArgs) -> Result<()> {
    let session = start_session(&args.file, ArtifactManager::in_memory()).await?;
    let log = session.audit_log().await.unwrap_or_default();

    if args.json {
        let json = serde_json::to_string_pretty(log.entries())
            .context("Failed to serialize audit log")?;
        println!("{}", json);
    } else {
        print!("{}", render::audit_log_table(&log, config::current().theme));
        if !log.is_empty() {
            println!("{}", render::type_summary(&log));
        }
    }

    if let Some(path) = &args.preview_out {
        write_preview(&session, path).await?;
    }
    Ok(())
}

pub async fn redact(args: RedactArgs) -> Result<()> {
    let theme = config::current().theme;
    let artifacts = ArtifactManager::temp_dir().context("Failed to create artifact directory")?;
    let session = start_session(&args.file, artifacts).await?;

    if let Some(path) = &args.preview_out {
        write_preview(&session, path).await?;
    }

    let log = session.audit_log().await.unwrap_or_default();
    for index in rejected_positions(&log, &args.reject, &args.reject_type)? {
        session.toggle_approval(index).await?;
    }

    if args.interactive {
        let stdin = BufReader::new(tokio::io::stdin());
        if review::run(&session, stdin, theme).await? == ReviewOutcome::Quit {
            session.reset().await?;
            println!("Review abandoned; nothing was redacted.");
            return Ok(());
        }
    } else {
        let log = session.audit_log().await.unwrap_or_default();
        print!("{}", render::audit_log_table(&log, theme));
    }

    if let Err(err) = session.burn().await {
        let message = session
            .last_error()
            .await
            .unwrap_or_else(|| err.to_string());
        return Err(anyhow::Error::new(err).context(message));
    }

    let download = session.download().await?;
    tokio::fs::create_dir_all(&args.out_dir)
        .await
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    let out_path = args.out_dir.join(&download.file_name);
    tokio::fs::write(&out_path, &download.bytes)
        .await
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    info!(path = %out_path.display(), size_bytes = download.bytes.len(), "sanitized document written");

    match pdf::inspect(&download.bytes) {
        Ok(info) => {
            if !info.metadata_stripped() {
                warn!("sanitized document still carries metadata");
            }
            print!("{}", render::pdf_summary(&info, theme));
        }
        Err(err) => warn!(error = %err, "could not inspect sanitized document"),
    }
    println!("Wrote {}", out_path.display());

    session.reset().await?;
    Ok(())
}

/// Read, validate and analyze `path`, leaving the session in review
async fn start_session(path: &Path, artifacts: ArtifactManager) -> Result<RedactionSession> {
    let document = load_document(path).await?;
    let client = HttpRedactionClient::from_global().context("Failed to create service client")?;
    info!(api_base = client.api_base(), "using redaction service");

    let session = RedactionSession::with_artifacts(Arc::new(client), artifacts);
    session.select_document(document).await?;

    if let Err(err) = session.analyze().await {
        let message = session
            .last_error()
            .await
            .unwrap_or_else(|| err.to_string());
        return Err(anyhow::Error::new(err).context(message));
    }
    Ok(session)
}

async fn load_document(path: &Path) -> Result<Document> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    pdf::quick_validate(&bytes).with_context(|| format!("{} is not a PDF", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Document::new(name, bytes))
}

async fn write_preview(session: &RedactionSession, path: &Path) -> Result<()> {
    let bytes = session.preview_bytes().await?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write preview to {}", path.display()))?;
    info!(path = %path.display(), "preview written");
    Ok(())
}

/// Zero-based positions of approved entries the operator asked to keep
fn rejected_positions(
    log: &AuditLog,
    positions: &[usize],
    types: &[String],
) -> Result<BTreeSet<usize>> {
    let mut rejected = BTreeSet::new();
    for &position in positions {
        if position == 0 || position > log.len() {
            bail!(
                "--reject {} is out of range; there are {} detections",
                position,
                log.len()
            );
        }
        rejected.insert(position - 1);
    }
    for (index, entry) in log.iter().enumerate() {
        if types.iter().any(|t| t.eq_ignore_ascii_case(&entry.entity_type)) {
            rejected.insert(index);
        }
    }
    rejected.retain(|&i| log.get(i).is_some_and(|e| e.approved));
    Ok(rejected)
}
