//! Kubernetes pod-log API client
//!
//! Talks to the API server over plain HTTPS: one JSON request to list pods,
//! one long-lived chunked response per followed pod. The follow response body
//! arrives in arbitrary chunk boundaries, so chunks are reassembled into
//! complete lines before they reach the watchers.

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use super::{Cluster, ClusterError, LineStream, StreamError, StreamMode};
use crate::config::ClusterConfig;

/// [`Cluster`] implementation backed by the Kubernetes HTTP API.
pub struct HttpCluster {
    client: reqwest::Client,
    server: String,
    namespace: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PodList {
    items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMetadata,
}

#[derive(Debug, Deserialize)]
struct PodMetadata {
    name: String,
}

impl HttpCluster {
    pub fn new(config: &ClusterConfig) -> Result<Self> {
        // No overall request timeout: the follow stream is expected to stay
        // open indefinitely.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(config.insecure_skip_tls_verify)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            server: config.server.trim_end_matches('/').to_string(),
            namespace: config.namespace.clone(),
            token: config.token.clone(),
        })
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl Cluster for HttpCluster {
    async fn list_sources(&self) -> Result<Vec<String>, ClusterError> {
        let url = format!(
            "{}/api/v1/namespaces/{}/pods",
            self.server, self.namespace
        );

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| ClusterError::ListFailed {
                namespace: self.namespace.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ClusterError::BadStatus {
                namespace: self.namespace.clone(),
                status: response.status().as_u16(),
            });
        }

        let pods: PodList = response
            .json()
            .await
            .map_err(|e| ClusterError::ListFailed {
                namespace: self.namespace.clone(),
                reason: e.to_string(),
            })?;

        Ok(pods.items.into_iter().map(|p| p.metadata.name).collect())
    }

    async fn open_stream(&self, source: &str, mode: StreamMode) -> Result<LineStream, StreamError> {
        let url = format!(
            "{}/api/v1/namespaces/{}/pods/{}/log",
            self.server, self.namespace, source
        );

        let mut request = self.get(url).query(&[("follow", "true")]);
        if mode == StreamMode::TailOnly {
            request = request.query(&[("tailLines", "0")]);
        }

        let response = request.send().await.map_err(|e| StreamError::Open {
            pod: source.to_string(),
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(StreamError::Open {
                pod: source.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        let chunks = response
            .bytes_stream()
            .map(|chunk| match chunk {
                Ok(bytes) => Ok(bytes.to_vec()),
                Err(e) => Err(StreamError::Read(e.to_string())),
            });

        Ok(split_lines(chunks))
    }
}

/// Reassemble a chunked byte stream into complete lines.
///
/// A line split across two chunks is buffered until its newline arrives; a
/// trailing fragment with no newline is emitted when the stream ends. A read
/// error is surfaced once and terminates the stream.
fn split_lines<S>(chunks: S) -> LineStream
where
    S: Stream<Item = Result<Vec<u8>, StreamError>> + Send + 'static,
{
    struct State<S> {
        chunks: std::pin::Pin<Box<S>>,
        buf: Vec<u8>,
        pending: VecDeque<String>,
        done: bool,
    }

    let state = State {
        chunks: Box::pin(chunks),
        buf: Vec::new(),
        pending: VecDeque::new(),
        done: false,
    };

    Box::pin(futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(line) = st.pending.pop_front() {
                return Some((Ok(line), st));
            }
            if st.done {
                return None;
            }

            match st.chunks.next().await {
                Some(Ok(chunk)) => {
                    st.buf.extend_from_slice(&chunk);
                    while let Some(pos) = st.buf.iter().position(|&b| b == b'\n') {
                        let rest = st.buf.split_off(pos + 1);
                        let mut line = std::mem::replace(&mut st.buf, rest);
                        line.pop();
                        if line.last() == Some(&b'\r') {
                            line.pop();
                        }
                        st.pending
                            .push_back(String::from_utf8_lossy(&line).into_owned());
                    }
                }
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.done = true;
                    if !st.buf.is_empty() {
                        st.pending
                            .push_back(String::from_utf8_lossy(&st.buf).into_owned());
                        st.buf.clear();
                    }
                }
            }
        }
    }))
}
