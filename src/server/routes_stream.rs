//! The status document and the streaming request handler.

use crate::config::AuthConfig;
use crate::ids::{ObjectId, ScopeId};
use crate::streaming::{chunk_stream, range, response, ChunkPlan};
use crate::token::{self, CapabilityToken};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::Json;
use futures::StreamExt;
use std::convert::Infallible;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::error::StreamError;
use super::AppContext;

/// `GET /` - liveness document with per-worker loads.
pub async fn status(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    let mut counts = ctx.pool.loads();
    counts.sort_unstable_by(|a, b| b.cmp(a));

    // Labels are positional after sorting: bot1 is the busiest worker.
    let mut loads = serde_json::Map::new();
    for (position, count) in counts.iter().enumerate() {
        loads.insert(format!("bot{}", position + 1), (*count).into());
    }

    Json(serde_json::json!({
        "server_status": "running",
        "uptime": format_uptime(ctx.started_at.elapsed()),
        "connected_bots": ctx.pool.len(),
        "loads": loads,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /{token_path}` - stream the object named by the capability token.
pub async fn stream(
    State(ctx): State<AppContext>,
    Path(token_path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, StreamError> {
    let (token, signature) = parse_token_path(&token_path, &ctx.config.auth)?;

    if token.is_expired(unix_now()) {
        return Err(StreamError::Expired);
    }
    if let Some(signature) = signature {
        let secret = ctx
            .config
            .auth
            .secret_key
            .as_deref()
            .ok_or(StreamError::FormatDisabled)?;
        if !token::verify(token.scope, token.object, token.expires_at, &signature, secret) {
            return Err(StreamError::SignatureMismatch);
        }
    }

    let worker = ctx.pool.select_worker();
    let guard = ctx.pool.begin(worker);
    let adapter = ctx.pool.adapter_for(worker);
    tracing::debug!(
        worker = worker.index(),
        scope = %token.scope,
        object = %token.object,
        "serving stream request"
    );

    let descriptor = adapter.resolve(token.scope, token.object).await?;

    let range_header = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());
    let resolved = range::resolve(range_header, descriptor.size)?;

    let plan = ChunkPlan::new(resolved.interval, ctx.config.store.chunk_size);
    tracing::debug!(
        object = %descriptor.object,
        from = resolved.interval.from,
        until = resolved.interval.until,
        parts = plan.part_count,
        "resolved byte interval"
    );

    let stream = chunk_stream(adapter, descriptor.clone(), plan);
    // The guard rides along with the body so the worker's load count drops
    // when the stream finishes or the client disconnects.
    let stream = stream.map(move |chunk| {
        let _held = &guard;
        Ok::<_, Infallible>(chunk)
    });

    response::stream_response(&descriptor, &resolved, Body::from_stream(stream))
        .map_err(|e| StreamError::Internal(e.to_string()))
}

/// Split the request path into a capability token.
///
/// Four segments are the signed form (`scope/object/expiry/signature`);
/// a single segment is the encrypted blob form. The signature comes back
/// separately so the handler can check expiry before doing digest work.
fn parse_token_path(
    path: &str,
    auth: &AuthConfig,
) -> Result<(CapabilityToken, Option<String>), StreamError> {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        [scope, object, expiry, signature] => {
            let scope: ScopeId = scope.parse().map_err(|_| StreamError::BadPath)?;
            let object: ObjectId = object.parse().map_err(|_| StreamError::BadPath)?;
            let expires_at: u64 = expiry.parse().map_err(|_| StreamError::BadPath)?;
            Ok((
                CapabilityToken {
                    scope,
                    object,
                    expires_at,
                },
                Some((*signature).to_string()),
            ))
        }
        [blob] => {
            let (key, iv) = match (&auth.cipher_key, &auth.cipher_iv) {
                (Some(key), Some(iv)) => (key, iv),
                _ => return Err(StreamError::FormatDisabled),
            };
            let token = token::blob::decode(blob, key.as_bytes(), iv.as_bytes())?;
            Ok((token, None))
        }
        _ => Err(StreamError::BadPath),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Render an uptime duration as `1d 2h 3m 4s`, dropping leading zero units.
fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days}d "));
    }
    if hours > 0 || !out.is_empty() {
        out.push_str(&format!("{hours}h "));
    }
    if minutes > 0 || !out.is_empty() {
        out.push_str(&format!("{minutes}m "));
    }
    out.push_str(&format!("{seconds}s"));
    out
}
