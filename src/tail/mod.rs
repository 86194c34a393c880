//! The log-tail aggregator
//!
//! Resolves user tokens to live pods, then follows every resolved pod at
//! once: one watcher task per pod pushes lines into an unbounded queue, and a
//! single consumer loop on the calling task writes them out with a padded,
//! dimmed label column. A single resolved pod skips the queue and the column
//! entirely and streams its full history directly.
//!
//! Watchers are supervised: they all observe one cancellation token, and the
//! join set is drained on the way out rather than abandoned to process exit.
//! A watcher whose stream ends or fails terminates alone; its siblings keep
//! streaming. There is no reconnect here; the `Cluster` trait is the seam a
//! retry policy would plug into.

pub mod format;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::cluster::{Cluster, StreamMode};
use crate::resolve;
use format::LineFormatter;

/// One fully-formed log line and the pod it came from.
///
/// Carries no timestamp or sequence number: ordering is purely arrival order
/// into the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEvent {
    pub source: String,
    pub content: String,
}

/// Resolve `tokens` against the live pod list and follow every match.
///
/// Runs until cancelled or until every followed stream has ended. Resolution
/// failure and transport failure while listing pods are fatal and happen
/// before any stream is opened.
pub async fn run<C, W>(
    cluster: Arc<C>,
    tokens: &[String],
    groups: &HashMap<String, Vec<String>>,
    color: bool,
    shutdown: CancellationToken,
    out: &mut W,
) -> Result<()>
where
    C: Cluster + 'static,
    W: AsyncWrite + Unpin,
{
    let live = cluster.list_sources().await?;
    let sources = resolve::resolve(tokens, groups, &live)?;

    tracing::info!("Following {} pod(s): {}", sources.len(), sources.join(", "));

    if let [source] = sources.as_slice() {
        tail_one(cluster, source, color, shutdown, out).await
    } else {
        tail_many(cluster, &sources, color, shutdown, out).await
    }
}

/// Solo fast path: full history, unpadded label, no queue.
async fn tail_one<C, W>(
    cluster: Arc<C>,
    source: &str,
    color: bool,
    shutdown: CancellationToken,
    out: &mut W,
) -> Result<()>
where
    C: Cluster,
    W: AsyncWrite + Unpin,
{
    let mut stream = cluster
        .open_stream(source, StreamMode::FullHistory)
        .await
        .with_context(|| format!("Failed to open log stream for {source}"))?;

    let prefix = format::solo_prefix(source, color);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            next = stream.next() => match next {
                Some(Ok(content)) => {
                    out.write_all(format!("{prefix}{content}\n").as_bytes()).await?;
                    out.flush().await?;
                }
                Some(Err(e)) => {
                    tracing::debug!("Log stream for {} failed: {}", source, e);
                    break;
                }
                None => {
                    tracing::debug!("Log stream for {} ended", source);
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Multi-source path: tail-only watchers feeding one unbounded queue.
async fn tail_many<C, W>(
    cluster: Arc<C>,
    sources: &[String],
    color: bool,
    shutdown: CancellationToken,
    out: &mut W,
) -> Result<()>
where
    C: Cluster + 'static,
    W: AsyncWrite + Unpin,
{
    let formatter = LineFormatter::new(sources, color);

    // Unbounded: producers never block, a slow consumer just lets the
    // queue grow.
    let (tx, mut rx) = mpsc::unbounded_channel::<LineEvent>();

    let mut watchers = JoinSet::new();
    for source in sources {
        watchers.spawn(watch_source(
            Arc::clone(&cluster),
            source.clone(),
            tx.clone(),
            shutdown.clone(),
        ));
    }
    // The receiver sees the channel close once the last watcher is gone.
    drop(tx);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => {
                    let line = formatter.format(&event.source, &event.content);
                    out.write_all(line.as_bytes()).await?;
                    out.write_all(b"\n").await?;
                    out.flush().await?;
                }
                None => break,
            }
        }
    }

    watchers.shutdown().await;
    Ok(())
}

/// One watcher: open the tail-only stream for `source` and push every line
/// into the queue until the stream ends, errors, or the run is cancelled.
///
/// Stream end and stream error are terminal and local to this watcher.
async fn watch_source<C>(
    cluster: Arc<C>,
    source: String,
    tx: UnboundedSender<LineEvent>,
    shutdown: CancellationToken,
) where
    C: Cluster,
{
    let mut stream = match cluster.open_stream(&source, StreamMode::TailOnly).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::debug!("Failed to open log stream for {}: {}", source, e);
            return;
        }
    };

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            next = stream.next() => match next {
                Some(Ok(content)) => {
                    let event = LineEvent {
                        source: source.clone(),
                        content,
                    };
                    if tx.send(event).is_err() {
                        return;
                    }
                }
                Some(Err(e)) => {
                    tracing::debug!("Log stream for {} failed: {}", source, e);
                    return;
                }
                None => {
                    tracing::debug!("Log stream for {} ended", source);
                    return;
                }
            }
        }
    }
}
