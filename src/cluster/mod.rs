//! Cluster transport contract
//!
//! The aggregator only ever talks to the cluster through the [`Cluster`]
//! trait: list the live pods, open a log stream for one of them. The real
//! implementation lives in [`http`]; tests drive the aggregator with scripted
//! implementations of the same trait. A reconnect policy, if one is ever
//! wanted, belongs in a decorator of this trait rather than in the watchers.

pub mod http;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

pub use http::HttpCluster;

/// A lazy, infinite, non-restartable sequence of text lines from one pod.
///
/// The stream suspends the caller between line arrivals and ends when the
/// underlying connection closes.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, StreamError>> + Send>>;

/// Where a log stream starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Begin at the start of the pod's available history.
    FullHistory,
    /// Begin at the current end of the stream, delivering no backlog.
    TailOnly,
}

/// Transport failure while listing pods. Fatal: resolution cannot proceed.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("failed to list pods in namespace {namespace}: {reason}")]
    ListFailed { namespace: String, reason: String },

    #[error("pod list request in namespace {namespace} returned status {status}")]
    BadStatus { namespace: String, status: u16 },
}

/// Failure opening or reading one pod's log stream.
///
/// Never fatal to the run: the owning watcher terminates and its siblings
/// keep streaming.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("failed to open log stream for {pod}: {reason}")]
    Open { pod: String, reason: String },

    #[error("log stream read failed: {0}")]
    Read(String),
}

#[async_trait]
pub trait Cluster: Send + Sync {
    /// Names of the live pods in the configured namespace.
    async fn list_sources(&self) -> Result<Vec<String>, ClusterError>;

    /// Open the log stream for one pod.
    async fn open_stream(&self, source: &str, mode: StreamMode) -> Result<LineStream, StreamError>;
}
