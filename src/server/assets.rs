use axum::extract::State;
use axum::http::{ header::CONTENT_TYPE, StatusCode, Uri };
use axum::response::{ IntoResponse, Response };
use log::{ debug, warn };
use std::path::{ Component, Path, PathBuf };
use thiserror::Error;

use super::AppState;

const INDEX_DOCUMENT: &str = "/index.html";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no such asset: {0}")]
    NotFound(String),
    #[error("path escapes the public directory: {0}")]
    Rejected(String),
}

#[derive(Debug)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

pub fn content_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

/// Only plain file-name components are accepted; `..`, roots and drive
/// prefixes reject the whole path.
fn relative_asset_path(request_path: &str) -> Result<PathBuf, AssetError> {
    let mut relative = PathBuf::new();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(AssetError::Rejected(request_path.to_string()));
            }
        }
    }
    Ok(relative)
}

pub async fn load_asset(public_root: &Path, request_path: &str) -> Result<Asset, AssetError> {
    let request_path = request_path.split('?').next().unwrap_or_default();
    let request_path = if request_path.is_empty() || request_path == "/" {
        INDEX_DOCUMENT
    } else {
        request_path
    };

    let relative = relative_asset_path(request_path)?;
    let not_found = || AssetError::NotFound(request_path.to_string());

    let root = tokio::fs::canonicalize(public_root).await.map_err(|_| not_found())?;
    let full_path = tokio::fs::canonicalize(root.join(&relative)).await.map_err(|_| not_found())?;
    if !full_path.starts_with(&root) {
        return Err(AssetError::Rejected(request_path.to_string()));
    }

    let bytes = tokio::fs::read(&full_path).await.map_err(|_| not_found())?;
    Ok(Asset {
        bytes,
        content_type: content_type_for(request_path),
    })
}

pub async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    match load_asset(&state.public_dir, uri.path()).await {
        Ok(asset) => ([(CONTENT_TYPE, asset.content_type)], asset.bytes).into_response(),
        Err(e) => {
            match &e {
                AssetError::Rejected(_) => warn!("{}", e),
                AssetError::NotFound(_) => debug!("{}", e),
            }
            (StatusCode::NOT_FOUND, [(CONTENT_TYPE, "text/plain")], "Not found").into_response()
        }
    }
}
