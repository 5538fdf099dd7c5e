use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::headers::Range;
use axum_extra::TypedHeader;
use axum_range::{KnownSize, Ranged};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::error;

/// IMF-fixdate, always GMT.
static HTTP_DATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Serves originals (and anything else under the media root, including the
/// artifact tree when it lives inside it).
#[utoipa::path(
    get,
    path = "/media/{path}",
    params(
        ("path" = String, Path, description = "Relative media path")
    ),
    responses(
        (status = 200, description = "File Content"),
        (status = 206, description = "Partial Content"),
        (status = 304, description = "Not Modified"),
        (status = 404, description = "Not Found")
    ),
    tag = "Delivery"
)]
pub async fn stream_media(
    State(state): State<crate::state::AppState>,
    UrlPath(path): UrlPath<String>,
    method: Method,
    headers: HeaderMap,
    range: Option<TypedHeader<Range>>,
) -> Response {
    let root = state.store.media_root().to_path_buf();
    serve_file(
        &root,
        &path,
        method == Method::HEAD,
        &headers,
        range.map(|TypedHeader(r)| r),
    )
    .await
}

/// Serves transcoded artifacts: master manifests, per-rendition playlists and
/// segments, rooted at the artifact store.
#[utoipa::path(
    get,
    path = "/hls/{path}",
    params(
        ("path" = String, Path, description = "Relative artifact path, e.g. `42/master.m3u8`")
    ),
    responses(
        (status = 200, description = "Playlist or Segment"),
        (status = 206, description = "Partial Content"),
        (status = 304, description = "Not Modified"),
        (status = 404, description = "Not Found")
    ),
    tag = "Delivery"
)]
pub async fn stream_hls(
    State(state): State<crate::state::AppState>,
    UrlPath(path): UrlPath<String>,
    method: Method,
    headers: HeaderMap,
    range: Option<TypedHeader<Range>>,
) -> Response {
    let root = state.store.hls_root().to_path_buf();
    serve_file(
        &root,
        &path,
        method == Method::HEAD,
        &headers,
        range.map(|TypedHeader(r)| r),
    )
    .await
}

pub(crate) async fn serve_file(
    root: &Path,
    rel: &str,
    head: bool,
    req_headers: &HeaderMap,
    range: Option<Range>,
) -> Response {
    let Some(abs) = resolve(root, rel) else {
        return not_found();
    };
    let meta = match tokio::fs::metadata(&abs).await {
        Ok(m) if m.is_file() => m,
        _ => return not_found(),
    };

    let etag = entity_tag(&meta);
    let mut headers = cache_headers(&abs, &meta, &etag);

    // Conditional GET: same entity tag means the client's copy is current.
    let matches = req_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|inm| inm == etag)
        .unwrap_or(false);
    if matches {
        let mut res = StatusCode::NOT_MODIFIED.into_response();
        res.headers_mut().extend(headers);
        return res;
    }

    // HEAD gets the full header set plus the entity length, never a body.
    if head {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(meta.len()));
        let mut res = StatusCode::OK.into_response();
        res.headers_mut().extend(headers);
        return res;
    }

    let file = match tokio::fs::File::open(&abs).await {
        Ok(f) => f,
        Err(_) => return not_found(),
    };
    let body = match KnownSize::file(file).await {
        Ok(b) => b,
        Err(e) => {
            error!("failed to stat {}: {}", abs.display(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let mut res = Ranged::new(range, body).into_response();
    res.headers_mut().extend(headers);
    res
}

/// Joins the request path onto the root, refusing anything that is not a
/// plain downward path.
fn resolve(root: &Path, rel: &str) -> Option<PathBuf> {
    let rel = Path::new(rel);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(rel))
}

/// Stable fingerprint of (mtime, size), quoted for use as an ETag.
fn entity_tag(meta: &Metadata) -> String {
    let mtime_ns = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("\"{:x}-{:x}\"", mtime_ns, meta.len())
}

fn cache_headers(abs: &Path, meta: &Metadata, etag: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type_for(abs));
    // Static immutable media: cache for a year.
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if let Ok(v) = HeaderValue::from_str(etag) {
        headers.insert(header::ETAG, v);
    }
    if let Some(v) = last_modified(meta) {
        headers.insert(header::LAST_MODIFIED, v);
    }
    // Helps Android webviews pull media cross-origin.
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("cross-origin"),
    );
    headers
}

/// HLS types first (the mime database misses them), then the usual guess.
fn content_type_for(abs: &Path) -> HeaderValue {
    match abs.extension().and_then(|e| e.to_str()) {
        Some("m3u8") => HeaderValue::from_static("application/vnd.apple.mpegurl"),
        Some("ts") => HeaderValue::from_static("video/mp2t"),
        _ => {
            let guessed: mime::Mime = mime_guess::from_path(abs).first_or_octet_stream();
            HeaderValue::from_str(guessed.as_ref())
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
        }
    }
}

fn last_modified(meta: &Metadata) -> Option<HeaderValue> {
    let modified = meta.modified().ok()?;
    let formatted = OffsetDateTime::from(modified)
        .to_offset(UtcOffset::UTC)
        .format(&HTTP_DATE)
        .ok()?;
    HeaderValue::from_str(&formatted).ok()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "file not found").into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::modules::media::test_support::{test_app, test_state, MockEncoder};

    async fn body_text(res: Response) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn fixture() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("media");
        std::fs::create_dir_all(root.join("posts")).unwrap();
        std::fs::write(root.join("posts/a.mp4"), b"0123456789").unwrap();
        (tmp, root)
    }

    #[tokio::test]
    async fn full_get_carries_cache_headers() {
        let (_tmp, root) = fixture();
        let res = serve_file(&root, "posts/a.mp4", false, &HeaderMap::new(), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let headers = res.headers().clone();
        assert_eq!(
            headers[header::CACHE_CONTROL],
            "public, max-age=31536000, immutable"
        );
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
        assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
        assert!(headers.contains_key(header::ETAG));
        let lm = headers[header::LAST_MODIFIED].to_str().unwrap();
        assert!(lm.ends_with(" GMT"), "unexpected Last-Modified: {lm}");
        assert_eq!(body_text(res).await, "0123456789");
    }

    #[tokio::test]
    async fn conditional_get_returns_not_modified_with_same_headers() {
        let (_tmp, root) = fixture();
        let first = serve_file(&root, "posts/a.mp4", false, &HeaderMap::new(), None).await;
        let etag = first.headers()[header::ETAG].clone();

        let mut req = HeaderMap::new();
        req.insert(header::IF_NONE_MATCH, etag.clone());
        let res = serve_file(&root, "posts/a.mp4", false, &req, None).await;
        assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(res.headers()[header::ETAG], etag);
        assert_eq!(
            res.headers()[header::CACHE_CONTROL],
            "public, max-age=31536000, immutable"
        );
        assert!(body_text(res).await.is_empty());
    }

    #[tokio::test]
    async fn stale_etag_serves_the_body_again() {
        let (_tmp, root) = fixture();
        let mut req = HeaderMap::new();
        req.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"old\""));
        let res = serve_file(&root, "posts/a.mp4", false, &req, None).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn range_request_yields_partial_content() {
        let (_tmp, root) = fixture();
        let range = Range::bytes(0..4).unwrap();
        let res = serve_file(&root, "posts/a.mp4", false, &HeaderMap::new(), Some(range)).await;
        assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            res.headers()[header::CONTENT_RANGE].to_str().unwrap(),
            "bytes 0-3/10"
        );
        assert_eq!(body_text(res).await, "0123");
    }

    #[tokio::test]
    async fn missing_and_traversing_paths_are_not_found() {
        let (_tmp, root) = fixture();
        let res = serve_file(&root, "posts/nope.mp4", false, &HeaderMap::new(), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = serve_file(&root, "../etc/passwd", false, &HeaderMap::new(), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        // a directory is not a servable file
        let res = serve_file(&root, "posts", false, &HeaderMap::new(), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn head_reports_headers_and_length_without_a_body() {
        let (_tmp, root) = fixture();
        let res = serve_file(&root, "posts/a.mp4", true, &HeaderMap::new(), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_LENGTH], "10");
        assert_eq!(res.headers()[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(res.headers()[header::ACCEPT_RANGES], "bytes");
        assert!(res.headers().contains_key(header::ETAG));
        assert!(body_text(res).await.is_empty());
    }

    #[tokio::test]
    async fn head_route_matches_get_and_strips_the_body() {
        let (_tmp, state) = test_state(MockEncoder::new());
        std::fs::write(state.store.abs_path("posts/h.mp4"), b"0123456789").unwrap();
        let app = test_app(state);

        let res = app
            .oneshot(
                Request::head("/media/posts/h.mp4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_LENGTH], "10");
        assert_eq!(
            res.headers()[header::CACHE_CONTROL],
            "public, max-age=31536000, immutable"
        );
        assert_eq!(res.headers()[header::ACCEPT_RANGES], "bytes");
        assert!(res.headers().contains_key(header::ETAG));
        assert!(body_text(res).await.is_empty());
    }
}
