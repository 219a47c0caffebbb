use axum::http::{HeaderMap, header};
use rentfolio_application::{AuthService, ClaimsService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub claims_service: ClaimsService,
    pub frontend_url: String,
}

impl AppState {
    /// Whether a request comes from the configured frontend.
    ///
    /// `Sec-Fetch-Site` is authoritative when the browser sends it;
    /// otherwise the declared `Origin` (or `Referer`) must sit under
    /// `frontend_url`. Requests declaring neither pass, since non-browser
    /// clients send no origin headers at all and carry no ambient cookies.
    pub fn permits_origin(&self, headers: &HeaderMap) -> bool {
        origin_allowed(&self.frontend_url, headers)
    }
}

fn origin_allowed(frontend_url: &str, headers: &HeaderMap) -> bool {
    if headers
        .get("sec-fetch-site")
        .is_some_and(|site| site.as_bytes() == b"cross-site")
    {
        return false;
    }

    match declared_origin(headers) {
        Some(origin) => {
            origin == frontend_url
                || origin
                    .strip_prefix(frontend_url)
                    .is_some_and(|rest| rest.starts_with('/'))
        }
        None => true,
    }
}

fn declared_origin(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::ORIGIN)
        .or_else(|| headers.get(header::REFERER))
        .and_then(|value| value.to_str().ok())
}
