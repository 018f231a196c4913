//! CORS policy and hardening headers applied to every response.

use axum::{
  Router,
  http::{HeaderName, HeaderValue, Method},
};
use tower_http::{
  cors::{AllowHeaders, AllowOrigin, CorsLayer},
  set_header::SetResponseHeaderLayer,
};

/// Headers added when the handler has not set them already.
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
  (
    "content-security-policy",
    "default-src 'self';base-uri 'self';font-src 'self' https: data:;\
     form-action 'self';frame-ancestors 'self';img-src 'self' data:;\
     object-src 'none';script-src 'self';script-src-attr 'none';\
     style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
  ),
  ("cross-origin-opener-policy", "same-origin"),
  ("cross-origin-resource-policy", "same-origin"),
  ("origin-agent-cluster", "?1"),
  ("referrer-policy", "no-referrer"),
  ("strict-transport-security", "max-age=31536000; includeSubDomains"),
  ("x-content-type-options", "nosniff"),
  ("x-dns-prefetch-control", "off"),
  ("x-download-options", "noopen"),
  ("x-frame-options", "SAMEORIGIN"),
  ("x-permitted-cross-domain-policies", "none"),
  ("x-xss-protection", "0"),
];

/// Wrap `router` so every response carries [`SECURITY_HEADERS`].
pub fn with_security_headers(router: Router) -> Router {
  SECURITY_HEADERS.iter().fold(router, |router, &(name, value)| {
    router.layer(SetResponseHeaderLayer::if_not_present(
      HeaderName::from_static(name),
      HeaderValue::from_static(value),
    ))
  })
}

/// CORS for the survey frontend. An empty `origins` list allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
  let allow_origin = if origins.is_empty() {
    AllowOrigin::any()
  } else {
    AllowOrigin::list(origins.iter().filter_map(|origin| {
      HeaderValue::from_str(origin)
        .inspect_err(|_| tracing::warn!(%origin, "ignoring invalid CORS origin"))
        .ok()
    }))
  };

  CorsLayer::new()
    .allow_origin(allow_origin)
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers(AllowHeaders::mirror_request())
}
