//! Integration tests for the `/ws/reports` feed over a live server.

// The shared world carries HTTP exchange fields this suite never reads.
#[allow(dead_code)]
#[path = "support/civic_server.rs"]
mod civic_server;

use actix_codec::Framed;
use actix_web::http::{StatusCode, header};
use awc::BoxedSocket;
use awc::error::WsClientError;
use awc::ws::{Codec, Frame};
use backend::domain::ports::{CitizenCommand, ReportCommand};
use backend::domain::{LoginCredentials, Role};
use backend::test_support::report_input;
use civic_server::{ServerFixture, with_server};
use futures_util::StreamExt;
use rstest::{fixture, rstest};
use serde_json::Value;

const LOCAL_ORIGIN: &str = "http://localhost:3000";

#[fixture]
fn server() -> ServerFixture {
    civic_server::start()
}

/// Next snapshot message, skipping heartbeats.
async fn next_snapshot(socket: &mut Framed<BoxedSocket, Codec>) -> Value {
    loop {
        match socket.next().await.expect("ws frame").expect("ws frame ok") {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("ws json"),
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("unexpected ws frame: {other:?}"),
        }
    }
}

#[rstest]
fn pushes_a_new_snapshot_when_the_cache_changes(server: ServerFixture) {
    let world = server.world();
    let harness = world.borrow().harness.clone();

    let (first, second) = with_server(&world, |base_url| async move {
        let (_response, mut socket) = awc::Client::default()
            .ws(format!("{base_url}/ws/reports"))
            .set_header(header::ORIGIN, LOCAL_ORIGIN)
            .connect()
            .await
            .expect("websocket connect");
        let first = next_snapshot(&mut socket).await;

        let credentials =
            LoginCredentials::new("Feed Watcher", "feed@example.org", "pw", Role::Citizen)
                .expect("credentials");
        harness.citizens.login(&credentials).await.expect("login");
        harness
            .reports
            .submit_report(
                &credentials.user_id(),
                report_input("Blocked drain", 12.97, 77.59),
            )
            .await
            .expect("report filed");
        harness.sync();

        let second = next_snapshot(&mut socket).await;
        (first, second)
    });

    assert_eq!(first["type"], "snapshot");
    assert_eq!(first["reports"].as_array().map(Vec::len), Some(0));
    assert_eq!(second["type"], "snapshot");
    let reports = second["reports"].as_array().expect("reports array");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["title"], "Blocked drain");
    assert_eq!(reports[0]["status"], "NEW");
}

#[rstest]
#[case("https://elsewhere.example")]
#[case("http://localhost:0")]
fn refuses_unlisted_origins(server: ServerFixture, #[case] origin: &'static str) {
    let world = server.world();
    let outcome = with_server(&world, |base_url| async move {
        awc::Client::default()
            .ws(format!("{base_url}/ws/reports"))
            .set_header(header::ORIGIN, origin)
            .connect()
            .await
            .map(|_| ())
    });

    assert!(
        matches!(
            outcome,
            Err(WsClientError::InvalidResponseStatus(StatusCode::FORBIDDEN))
        ),
        "origin {origin} should be refused"
    );
}
