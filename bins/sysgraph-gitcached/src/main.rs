// SPDX-License-Identifier: Apache-2.0
//! `sysgraph-gitcached`: HTTP front-end for the git-repository tarball
//! cache. Serves `GET /get?uri=<U>[&contains=<RFC3339>][&ref=<R>]` and
//! `GET /healthz`.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::Parser;
use serde::Deserialize;
use sysgraph_gitcache::{CacheError, Git2Clone, GitCache, LocalDirStorer, NativeGitClone, ObjectStoreBackend, ServeOutcome};
use sysgraph_util::{CloneOptions, GitCloner, UtilError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "SysGraph git-repository tarball cache")]
struct Args {
    /// TCP listener for cache clients.
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,
    /// Backend location: a local directory path, or `gs://<bucket>` for a
    /// remote object store. Selection is prefix-based at startup.
    #[arg(long, default_value = "./gitcache-data")]
    backend: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cache = Arc::new(build_cache(&args.backend)?);

    let app = Router::new()
        .route("/get", get(get_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(cache);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!(listen = %args.listen, backend = %args.backend, "sysgraph-gitcached listening");

    let shutdown = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
        info!("shutting down");
    };
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    Ok(())
}

/// Either built-in backend behind one interface, selected by the
/// `--backend` prefix (`gs://` for remote, anything else for local disk).
enum AnyBackend {
    Local(LocalDirStorer),
    Remote(ObjectStoreBackend),
}

enum AnyReader {
    Local(std::fs::File),
    Remote(std::io::Cursor<Vec<u8>>),
}

impl Read for AnyReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Local(r) => r.read(buf),
            Self::Remote(r) => r.read(buf),
        }
    }
}

enum AnyWriter {
    Local(std::fs::File),
    Remote(sysgraph_gitcache::BufferedObjectWriter),
}

impl std::io::Write for AnyWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Local(w) => w.write(buf),
            Self::Remote(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Local(w) => w.flush(),
            Self::Remote(w) => w.flush(),
        }
    }
}

impl sysgraph_util::Storer for AnyBackend {
    type Writer = AnyWriter;

    fn exists(&self, path: &str) -> Result<Option<SystemTime>, UtilError> {
        match self {
            Self::Local(b) => b.exists(path),
            Self::Remote(b) => b.exists(path),
        }
    }

    fn writer(&self, path: &str) -> Result<Self::Writer, UtilError> {
        match self {
            Self::Local(b) => b.writer(path).map(AnyWriter::Local),
            Self::Remote(b) => b.writer(path).map(AnyWriter::Remote),
        }
    }

    fn delete(&self, path: &str) -> Result<(), UtilError> {
        match self {
            Self::Local(b) => b.delete(path),
            Self::Remote(b) => b.delete(path),
        }
    }
}

impl sysgraph_gitcache::CacheBackend for AnyBackend {
    type Reader = AnyReader;

    fn serve(&self, path: &str) -> Result<ServeOutcome<Self::Reader>, CacheError> {
        match self {
            Self::Local(b) => match b.serve(path)? {
                ServeOutcome::Stream(r) => Ok(ServeOutcome::Stream(AnyReader::Local(r))),
                ServeOutcome::Redirect(url) => Ok(ServeOutcome::Redirect(url)),
            },
            Self::Remote(b) => match b.serve(path)? {
                ServeOutcome::Stream(r) => Ok(ServeOutcome::Stream(AnyReader::Remote(r))),
                ServeOutcome::Redirect(url) => Ok(ServeOutcome::Redirect(url)),
            },
        }
    }
}

/// Either git-clone implementation behind one interface, preferring the
/// native `git` binary and falling back to `git2` when it's unavailable.
enum AnyCloner {
    Native(NativeGitClone),
    Git2(Git2Clone),
}

impl GitCloner for AnyCloner {
    fn clone_repo(&self, options: &CloneOptions<'_>) -> Result<(), UtilError> {
        match self {
            Self::Native(c) => c.clone_repo(options),
            Self::Git2(c) => c.clone_repo(options),
        }
    }
}

fn build_cache(backend_spec: &str) -> Result<GitCache<AnyBackend, AnyCloner>> {
    let backend = if let Some(bucket) = backend_spec.strip_prefix("gs://") {
        let store = object_store::gcp::GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket).build().context("build GCS client from environment")?;
        AnyBackend::Remote(ObjectStoreBackend::new(Arc::new(store), bucket)?)
    } else {
        AnyBackend::Local(LocalDirStorer::new(backend_spec)?)
    };

    let cloner = if NativeGitClone::is_available() {
        AnyCloner::Native(NativeGitClone)
    } else {
        AnyCloner::Git2(Git2Clone)
    };

    Ok(GitCache::new(backend, cloner))
}

#[derive(Debug, Deserialize)]
struct GetParams {
    uri: String,
    contains: Option<String>,
    #[serde(rename = "ref")]
    reference: Option<String>,
}

/// What a [`ServeOutcome`] resolves to once fully read off the blocking
/// thread pool; the async handler only ever formats this into a response.
enum Served {
    Bytes(Vec<u8>),
    Redirect(String),
}

async fn get_handler(State(cache): State<Arc<GitCache<AnyBackend, AnyCloner>>>, Query(params): Query<GetParams>) -> impl IntoResponse {
    // Cloning, tarring, and local reads are all blocking I/O; run the whole
    // request off the async worker thread rather than stalling it.
    let join_result = tokio::task::spawn_blocking(move || -> Result<Served, CacheError> {
        match cache.get(&params.uri, params.contains.as_deref(), params.reference.as_deref(), SystemTime::now())? {
            ServeOutcome::Stream(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(Served::Bytes(bytes))
            }
            ServeOutcome::Redirect(url) => Ok(Served::Redirect(url)),
        }
    })
    .await;

    match join_result {
        Ok(Ok(Served::Bytes(bytes))) => {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/gzip"));
            (StatusCode::OK, headers, bytes).into_response()
        }
        Ok(Ok(Served::Redirect(url))) => {
            let mut headers = HeaderMap::new();
            if let Ok(value) = HeaderValue::from_str(&url) {
                headers.insert(header::LOCATION, value);
            }
            (StatusCode::FOUND, headers).into_response()
        }
        Ok(Err(err)) => map_error(&err).into_response(),
        Err(join_err) => {
            warn!(?join_err, "git-cache request task panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()).into_response()
        }
    }
}

fn map_error(err: &CacheError) -> (StatusCode, String) {
    match err {
        CacheError::InvalidRequest(_) | CacheError::AuthRequired(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CacheError::CloneFailed(_) | CacheError::Io(_) | CacheError::ObjectStore(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

async fn healthz_handler() -> StatusCode {
    StatusCode::OK
}
