//! File download support
//!
//! Streams a file as an attachment in fixed-size chunks. Each chunk becomes
//! its own body frame, so hyper writes it out before the next read.

use futures_util::stream;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::StatusCode;
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::endpoint::HandlerResult;
use crate::http::{build_attachment_response, build_error_response, mime, ResponseBody};
use crate::logger;

pub const CHUNK_SIZE: usize = 8 * 1024;

/// Send `path` as a download named `download_name`
///
/// A missing path (or one that is not a regular file) yields a 400
/// `file does not exist` response and nothing is streamed. `size` and
/// `mime_type` default to the file's length and an extension-based guess.
pub async fn send_file(
    path: &Path,
    download_name: &str,
    size: Option<u64>,
    mime_type: Option<&str>,
) -> HandlerResult {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(file_missing(path)),
        Err(e) => return Err(e.into()),
    };
    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Ok(file_missing(path));
    }

    let size = size.unwrap_or_else(|| metadata.len());
    let mime_type = mime_type.unwrap_or_else(|| mime::content_type_for(path));
    logger::log_debug(&format!(
        "Sending {} as '{download_name}' ({size} bytes, {mime_type})",
        path.display()
    ));

    Ok(build_attachment_response(
        chunked_body(file),
        download_name,
        mime_type,
        size,
    ))
}

fn file_missing(path: &Path) -> crate::http::ApiResponse {
    logger::log_warning(&format!("Download requested for missing file: {}", path.display()));
    build_error_response("file does not exist", StatusCode::BAD_REQUEST)
}

fn chunked_body(file: File) -> ResponseBody {
    let chunks = stream::try_unfold(file, |mut file| async move {
        let chunk = read_chunk(&mut file).await?;
        let next = (!chunk.is_empty()).then(|| (Frame::data(chunk), file));
        Ok::<_, io::Error>(next)
    });
    StreamBody::new(chunks).boxed_unsync()
}

/// Read up to `CHUNK_SIZE` bytes; shorter only at end of file
async fn read_chunk(file: &mut File) -> io::Result<Bytes> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut filled = 0;
    while filled < CHUNK_SIZE {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("restpoint-file-{}-{name}", std::process::id()))
    }

    #[tokio::test]
    async fn test_missing_file_is_bad_request() {
        let response = send_file(&temp_path("nope.bin"), "nope.bin", None, None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"error":"file does not exist"}"#);
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let response = send_file(&std::env::temp_dir(), "tmp", None, None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_streams_in_fixed_chunks() {
        let path = temp_path("report.csv");
        let contents: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &contents).unwrap();

        let response = send_file(&path, "report.csv", None, None).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["Content-Length"], "20000");
        assert_eq!(response.headers()["Content-Type"], "text/csv; charset=utf-8");
        assert_eq!(
            response.headers()["Content-Disposition"],
            "attachment; filename=\"report.csv\""
        );

        let mut body = response.into_body();
        let mut sizes = Vec::new();
        let mut received = Vec::new();
        while let Some(frame) = body.frame().await {
            let data = frame.unwrap().into_data().unwrap();
            sizes.push(data.len());
            received.extend_from_slice(&data);
        }

        assert_eq!(sizes, vec![CHUNK_SIZE, CHUNK_SIZE, 20_000 - 2 * CHUNK_SIZE]);
        assert_eq!(received, contents);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_explicit_size_and_mime_win() {
        let path = temp_path("blob");
        std::fs::write(&path, b"abc").unwrap();

        let response = send_file(&path, "data.bin", Some(3), Some("application/x-custom"))
            .await
            .unwrap();
        assert_eq!(response.headers()["Content-Type"], "application/x-custom");
        assert_eq!(response.headers()["Content-Length"], "3");
        std::fs::remove_file(path).ok();
    }
}
