//! Endpoint URL composition.
//!
//! One routine builds every endpoint the session connects to, from the base
//! URL given to `Connection::init`:
//!
//! ```text
//! base (or test URL) → ensure scheme → coerce to http/ws family → /service/{id} → /{append} → /client
//! ```
//!
//! Service handles use it at creation; game handles get their join URI
//! rewritten through it when the join ack names a connection type.

use ::url::{ParseError, Url};

use gatelink_service::PoolKind;

const HTTP: &str = "http";
const HTTPS: &str = "https";
const WS: &str = "ws";
const WSS: &str = "wss";

/// Inputs of [`generate_url`] that vary per endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlParts<'a> {
    /// HTTP endpoint (`http(s)://`) rather than a socket (`ws(s)://`).
    pub is_http: bool,
    /// Service type or theme id, used for `/service/{id}`.
    pub id: u32,
    /// Extra path joined before `/client`.
    pub append_path: &'a str,
    /// Replaces the base URL when non-empty.
    pub test_url: Option<&'a str>,
    /// Skip every path segment and use the URL as-is.
    pub test_full_custom_path: bool,
}

/// Builds the endpoint URL for a handle living in `pool`.
///
/// ```rust
/// use gatelink_service::PoolKind;
/// use gatelink_session::url::{UrlParts, generate_url};
///
/// let parts = UrlParts { is_http: true, id: 201, ..Default::default() };
/// let url = generate_url("example.com", PoolKind::Service, &parts).unwrap();
/// assert_eq!(url.as_str(), "http://example.com/service/201/client");
/// ```
///
/// # Errors
/// [`ParseError`] if the base (or test) URL has no usable host, even after
/// a scheme has been supplied.
pub fn generate_url(
    base: &str,
    pool: PoolKind,
    parts: &UrlParts<'_>,
) -> Result<Url, ParseError> {
    let raw = match parts.test_url {
        Some(test) if !test.is_empty() => test,
        _ => base,
    };

    let mut url = parse_web_url(raw, parts.is_http)?;
    let family = select_scheme(parts.is_http, is_secure(url.scheme()));
    if url.scheme() != family {
        // Switching between special schemes cannot fail.
        let _ = url.set_scheme(family);
    }

    if !parts.test_full_custom_path {
        if pool.is_service() {
            push_path(&mut url, &format!("service/{}", parts.id));
        }
        push_path(&mut url, parts.append_path);
        if pool != PoolKind::ApiService {
            push_path(&mut url, "client");
        }
    }
    Ok(url)
}

/// Parses `raw`, prefixing an insecure scheme of the right family when it
/// has none of `http`, `https`, `ws`, `wss`.
fn parse_web_url(raw: &str, is_http: bool) -> Result<Url, ParseError> {
    match Url::parse(raw) {
        Ok(url) if is_web_scheme(url.scheme()) => Ok(url),
        _ => Url::parse(&format!("{}://{raw}", select_scheme(is_http, false))),
    }
}

fn is_web_scheme(scheme: &str) -> bool {
    matches!(scheme, HTTP | HTTPS | WS | WSS)
}

/// Only `https` and `wss` count as secure.
pub fn is_secure(scheme: &str) -> bool {
    matches!(scheme, HTTPS | WSS)
}

pub fn select_scheme(is_http: bool, secure: bool) -> &'static str {
    match (is_http, secure) {
        (true, true) => HTTPS,
        (true, false) => HTTP,
        (false, true) => WSS,
        (false, false) => WS,
    }
}

/// Appends the non-empty `/`-separated segments of `path`, dropping a
/// trailing empty segment first so no `//` appears.
pub fn push_path(url: &mut Url, path: &str) {
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
    }
}
