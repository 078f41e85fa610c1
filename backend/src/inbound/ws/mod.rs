//! WebSocket inbound adapter streaming the report collection to clients.
//!
//! Responsibilities:
//! - validate upgrade requests against the configured origin allow-list
//! - spawn the per-connection session task
//! - keep WebSocket-specific concerns at the edge of the system

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use tracing::{error, warn};
use url::Url;

mod session;

pub mod messages;
pub mod state;

use self::state::OriginPolicy;

/// Handle WebSocket upgrade for the `/ws/reports` feed.
#[get("/ws/reports")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }

    validate_origin(&state.origins, origin_header)?;

    let (response, ws_session, msg_stream) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;
    let updates = state.cache.subscribe();
    actix_web::rt::spawn(session::handle_ws_session(updates, ws_session, msg_stream));
    Ok(response)
}

fn validate_origin(policy: &OriginPolicy, origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if policy.allows(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{StatusCode, header::HeaderValue};
    use rstest::{fixture, rstest};

    #[fixture]
    fn policy() -> OriginPolicy {
        OriginPolicy::new(["https://civic.example", "https://ops.civic.example:8443"])
            .expect("valid origins")
    }

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).expect("valid header value")
    }

    #[rstest]
    #[case("http://localhost:3000")]
    #[case("https://civic.example")]
    #[case("https://ops.civic.example:8443")]
    fn accepts_configured_origins(policy: OriginPolicy, #[case] origin: &str) {
        assert!(validate_origin(&policy, &header(origin)).is_ok());
    }

    #[rstest]
    #[case("http://localhost")]
    #[case("http://localhost:0")]
    #[case("https://example.com")]
    #[case("https://civic.example.evil.com")]
    #[case("https://ops.civic.example")]
    #[case("wss://civic.example")]
    fn rejects_disallowed_origins(policy: OriginPolicy, #[case] origin: &str) {
        let error = validate_origin(&policy, &header(origin)).expect_err("origin rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[rstest]
    fn rejects_non_utf8_origin_header(policy: OriginPolicy) {
        let header = HeaderValue::from_bytes(&[0x80]).expect("opaque header value");
        let error = validate_origin(&policy, &header).expect_err("origin rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[rstest]
    fn rejects_unparsable_origin_header(policy: OriginPolicy) {
        let header = HeaderValue::from_static("not a url");
        let error = validate_origin(&policy, &header).expect_err("origin rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[rstest]
    fn localhost_can_be_switched_off() {
        let policy = OriginPolicy::new(["https://civic.example"])
            .expect("valid origins")
            .without_localhost();
        assert!(validate_origin(&policy, &header("http://localhost:3000")).is_err());
    }
}
