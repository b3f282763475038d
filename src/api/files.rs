// File store endpoint
// Exposes the flat directory at `domain_root` as a REST collection of files

use chrono::{DateTime, Local};
use hyper::StatusCode;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::handler::{Endpoint, HandlerResult, RequestHandler};
use crate::http::ApiResponse;
use crate::logger;

const ALLOWED: [&str; 6] = ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// `GET /` lists, `GET /<name>` downloads, the other verbs write
#[derive(Debug, Default, Clone, Copy)]
pub struct FilesEndpoint;

#[derive(Debug, Serialize)]
struct FileEntry {
    name: String,
    size: u64,
    modified: Option<String>,
}

#[derive(Debug, Serialize)]
struct WriteResult<'a> {
    name: &'a str,
    size: u64,
    created: bool,
}

/// What the resource segments address
enum Target {
    Collection,
    File { name: String, path: PathBuf },
}

impl FilesEndpoint {
    fn target(handler: &RequestHandler) -> Result<Target, ApiResponse> {
        match handler.segments() {
            [] => Ok(Target::Collection),
            [name] if is_valid_name(name) => Ok(Target::File {
                name: name.clone(),
                path: PathBuf::from(&handler.config().domain_root).join(name),
            }),
            [_] => Err(error(handler, "invalid file name", StatusCode::BAD_REQUEST)),
            _ => Err(error(handler, "resource not found", StatusCode::NOT_FOUND)),
        }
    }

    /// A file target, or the response to send instead
    fn file_target(handler: &RequestHandler) -> Result<(String, PathBuf), ApiResponse> {
        match Self::target(handler)? {
            Target::File { name, path } => Ok((name, path)),
            Target::Collection => Err(error(
                handler,
                "a file name is required",
                StatusCode::METHOD_NOT_ALLOWED,
            )),
        }
    }

    async fn list(handler: &RequestHandler) -> HandlerResult {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&handler.config().domain_root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let metadata = entry.metadata().await?;
            if !metadata.is_file() || !is_valid_name(&name) {
                continue;
            }
            entries.push(FileEntry {
                name,
                size: metadata.len(),
                modified: metadata
                    .modified()
                    .ok()
                    .map(|t| DateTime::<Local>::from(t).to_rfc3339()),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        handler.send_json(&entries)
    }

    async fn write(handler: &RequestHandler, overwrite: bool) -> HandlerResult {
        let (name, path) = match Self::file_target(handler) {
            Ok(target) => target,
            Err(response) => return Ok(response),
        };

        let body = handler.read_request_body();
        let existed = if overwrite {
            let existed = fs::try_exists(&path).await?;
            fs::write(&path, body).await?;
            existed
        } else {
            let created = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            let mut file = match created {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    let message = format!("file already exists: {name}");
                    return handler.send_error_with_status(&message, StatusCode::CONFLICT);
                }
                Err(e) => return Err(e.into()),
            };
            file.write_all(body).await?;
            file.flush().await?;
            false
        };
        logger::log_info(&format!("Stored {} ({} bytes)", path.display(), body.len()));

        let status = if existed { StatusCode::OK } else { StatusCode::CREATED };
        handler.send_json_with_status(
            &WriteResult {
                name: &name,
                size: body.len() as u64,
                created: !existed,
            },
            status,
        )
    }
}

impl Endpoint for FilesEndpoint {
    async fn get(&self, handler: &RequestHandler) -> HandlerResult {
        let (name, path) = match Self::target(handler) {
            Ok(Target::Collection) => return Self::list(handler).await,
            Ok(Target::File { name, path }) => (name, path),
            Err(response) => return Ok(response),
        };

        if !fs::try_exists(&path).await? {
            return Ok(error(handler, &format!("file not found: {name}"), StatusCode::NOT_FOUND));
        }
        let download_name = handler
            .get_param("as", Some(name.as_str()), None)
            .unwrap_or(name.as_str());
        handler
            .send_file(&path, download_name, None, handler.param("type"))
            .await
    }

    async fn post(&self, handler: &RequestHandler) -> HandlerResult {
        Self::write(handler, false).await
    }

    async fn put(&self, handler: &RequestHandler) -> HandlerResult {
        Self::write(handler, true).await
    }

    async fn patch(&self, handler: &RequestHandler) -> HandlerResult {
        let (name, path) = match Self::file_target(handler) {
            Ok(target) => target,
            Err(response) => return Ok(response),
        };
        if !fs::try_exists(&path).await? {
            return Ok(error(handler, &format!("file not found: {name}"), StatusCode::NOT_FOUND));
        }

        let mut file = fs::OpenOptions::new().append(true).open(&path).await?;
        file.write_all(handler.read_request_body()).await?;
        file.flush().await?;
        let size = file.metadata().await?.len();

        handler.send_json(&WriteResult {
            name: &name,
            size,
            created: false,
        })
    }

    async fn delete(&self, handler: &RequestHandler) -> HandlerResult {
        let (name, path) = match Self::file_target(handler) {
            Ok(target) => target,
            Err(response) => return Ok(response),
        };
        if !fs::try_exists(&path).await? {
            return Ok(error(handler, &format!("file not found: {name}"), StatusCode::NOT_FOUND));
        }

        fs::remove_file(&path).await?;
        logger::log_info(&format!("Deleted {}", path.display()));
        handler.send_json(&serde_json::json!({ "deleted": name }))
    }

    async fn options(&self, handler: &RequestHandler) -> HandlerResult {
        handler.send_json(&serde_json::json!({
            "allow": ALLOWED,
            "base_uri": handler.config().base_uri,
        }))
    }
}

/// One plain name inside the root: no separators, no parent or hidden entries
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}

fn error(handler: &RequestHandler, message: &str, status: StatusCode) -> ApiResponse {
    logger::log_debug(&format!("{} {}: {message}", handler.verb(), handler.raw_uri()));
    crate::http::build_error_response(message, status)
}
