//! Security response headers and CORS.

use axum::http::{HeaderName, HeaderValue, Method, header};
use sensorcast_config::SecurityConfig;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

/// One layer per configured security header.
///
/// Empty values disable a header; `Strict-Transport-Security` is only sent
/// when `hsts_max_age` is non-zero. Headers already set by a handler are
/// left alone.
pub fn security_header_layers(config: &SecurityConfig) -> Vec<SetResponseHeaderLayer<HeaderValue>> {
    let hsts = (config.hsts_max_age > 0)
        .then(|| format!("max-age={}; includeSubDomains", config.hsts_max_age))
        .unwrap_or_default();

    [
        (header::X_XSS_PROTECTION, config.xss_protection.as_str()),
        (header::X_CONTENT_TYPE_OPTIONS, config.content_type_nosniff.as_str()),
        (header::X_FRAME_OPTIONS, config.x_frame_options.as_str()),
        (header::STRICT_TRANSPORT_SECURITY, hsts.as_str()),
        (header::CONTENT_SECURITY_POLICY, config.content_security_policy.as_str()),
    ]
    .into_iter()
    .filter_map(|(name, value)| header_layer(name, value))
    .collect()
}

fn header_layer(name: HeaderName, value: &str) -> Option<SetResponseHeaderLayer<HeaderValue>> {
    if value.is_empty() {
        return None;
    }
    match HeaderValue::from_str(value) {
        Ok(value) => Some(SetResponseHeaderLayer::if_not_present(name, value)),
        Err(e) => {
            tracing::warn!(header = %name, value, error = %e, "Skipping invalid security header");
            None
        }
    }
}

/// CORS layer for the configured origins. `"*"` or no origins allows any.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let list: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(list))
}
