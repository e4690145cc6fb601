//! Response assembly for stream requests.

use crate::store::ObjectDescriptor;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};

use super::range::ResolvedRange;

const OCTET_STREAM: &str = "application/octet-stream";

/// Build the success response (200 or 206) around a body stream.
///
/// `Content-Range` is included whenever the request carried a `Range`
/// header; a plain full-object GET gets none.
pub fn stream_response(
    descriptor: &ObjectDescriptor,
    resolved: &ResolvedRange,
    body: Body,
) -> Result<Response<Body>, axum::http::Error> {
    let size = descriptor.size;
    let interval = resolved.interval;

    let status = if resolved.is_partial(size) {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let (mime_type, file_name) = content_identity(descriptor);
    let disposition = if is_inline(&mime_type) {
        "inline"
    } else {
        "attachment"
    };

    let disposition_value = format!("{disposition}; filename=\"{file_name}\"");
    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, mime_type)
        .header(header::CONTENT_LENGTH, interval.byte_len().to_string())
        .header(header::CONTENT_DISPOSITION, disposition_value)
        .header(header::ACCEPT_RANGES, "bytes");

    if resolved.had_header {
        builder = builder.header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", interval.from, interval.until, size),
        );
    }

    builder.body(body)
}

/// Resolve the advertised mime type and download file name, filling either
/// side in from the other when the store left it blank.
fn content_identity(descriptor: &ObjectDescriptor) -> (String, String) {
    match (&descriptor.mime_type, &descriptor.file_name) {
        (Some(mime), Some(name)) => (mime.clone(), name.clone()),
        (Some(mime), None) => (mime.clone(), generated_name(mime)),
        (None, Some(name)) => (
            guess_mime(name).unwrap_or(OCTET_STREAM).to_string(),
            name.clone(),
        ),
        (None, None) => (OCTET_STREAM.to_string(), generated_name(OCTET_STREAM)),
    }
}

/// Short random name for objects the store knows no name for.
fn generated_name(mime_type: &str) -> String {
    use rand::Rng;
    let ext = match mime_type.split('/').nth(1) {
        Some(subtype) if !subtype.is_empty() && subtype != "octet-stream" => subtype,
        _ => "bin",
    };
    format!("{:04x}.{}", rand::thread_rng().gen::<u16>(), ext)
}

fn is_inline(mime_type: &str) -> bool {
    mime_type.starts_with("video/")
        || mime_type.starts_with("audio/")
        || mime_type.contains("/html")
}

/// Guess a mime type from a file name extension.
pub fn guess_mime(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_lowercase();
    let mime = match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "ts" | "m2ts" => "video/mp2t",
        "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "html" | "htm" => "text/html",
        "txt" => "text/plain",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime)
}
