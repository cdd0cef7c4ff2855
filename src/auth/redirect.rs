//! Building the log-in URL that sends the user back to where they were.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Reduce `raw_url` to a path and query on this site.
///
/// Returns `None` for URLs that point to another site (`https://...`,
/// `//host`), relative paths and the log-in page itself. When
/// `allow_absolute` is set, an absolute URL is accepted and reduced to its
/// path, which is how HTMX reports the current page.
fn local_path_and_query(raw_url: &str, allow_absolute: bool) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;

    if !allow_absolute && (uri.scheme().is_some() || uri.authority().is_some()) {
        return None;
    }

    let target = uri.path_and_query()?.as_str();

    if !target.starts_with('/') || target.starts_with("//") {
        return None;
    }

    (uri.path() != endpoints::LOG_IN_VIEW).then(|| target.to_owned())
}

/// Accept a redirect URL from the log-in form or query string only if it
/// stays on this site.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    local_path_and_query(raw_url, false)
}

/// The log-in page URL with `redirect_target` as the `redirect_url` query parameter.
pub fn log_in_url_with_redirect(redirect_target: &str) -> String {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(query) => format!("{}?{query}", endpoints::LOG_IN_VIEW),
        Err(error) => {
            tracing::error!("could not encode redirect URL {redirect_target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}

/// The log-in URL for an unauthenticated `request`.
///
/// Page requests come back to the requested page. API requests are made by
/// HTMX, so they come back to the page in the `HX-Current-URL` header.
/// Anything else falls back to the dashboard.
pub fn build_log_in_redirect_url(request: &Request) -> String {
    let target = if request.uri().path().starts_with("/api") {
        hx_current_url(request)
    } else {
        request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
    };

    let target = target.unwrap_or_else(|| {
        tracing::warn!(
            "no usable redirect target for {}, falling back to the dashboard",
            request.uri()
        );
        endpoints::DASHBOARD_VIEW.to_owned()
    });

    log_in_url_with_redirect(&target)
}

fn hx_current_url(request: &Request) -> Option<String> {
    let headers = request.headers();

    let is_htmx = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_htmx {
        return None;
    }

    headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
        .and_then(|current_url| local_path_and_query(current_url, true))
}
