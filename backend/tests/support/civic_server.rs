//! Live server harness for HTTP and WebSocket integration tests.
//!
//! The world owns a single-threaded Tokio runtime plus a `LocalSet` because
//! Actix uses `spawn_local` internally. Dropping the [`ServerFixture`]
//! stops the server even if a test panics.

use std::cell::RefCell;
use std::collections::HashMap;
use std::net::TcpListener;
use std::rc::Rc;
use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Key, SameSite, time::Duration as CookieDuration};
use actix_web::dev::ServerHandle;
use actix_web::{App, HttpServer, web};
use backend::Trace;
use backend::inbound::http::configure_api;
use backend::inbound::ws;
use backend::inbound::ws::state::{OriginPolicy, WsState};
use backend::test_support::CivicHarness;
use serde_json::Value;
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

pub(crate) struct ServerWorld {
    pub(crate) runtime: Runtime,
    pub(crate) local: LocalSet,
    pub(crate) base_url: String,
    pub(crate) server: ServerHandle,
    pub(crate) harness: Arc<CivicHarness>,
    /// Session cookie pairs keyed by the actor who signed in.
    pub(crate) cookies: HashMap<String, String>,
    pub(crate) last_status: Option<u16>,
    pub(crate) last_body: Option<Value>,
    pub(crate) last_trace_id: Option<String>,
    pub(crate) report_id: Option<String>,
}

pub(crate) type SharedWorld = Rc<RefCell<ServerWorld>>;

pub(crate) struct ServerFixture {
    world: SharedWorld,
}

impl ServerFixture {
    pub(crate) fn world(&self) -> SharedWorld {
        self.world.clone()
    }
}

impl Drop for ServerFixture {
    fn drop(&mut self) {
        let ctx = self.world.borrow();
        let server = ctx.server.clone();
        ctx.local.block_on(&ctx.runtime, async move {
            server.stop(true).await;
        });
    }
}

/// Run `operation` on the server's runtime with the base URL.
///
/// The future must not borrow the world.
pub(crate) fn with_server<R, F>(world: &SharedWorld, operation: impl FnOnce(String) -> F) -> R
where
    F: std::future::Future<Output = R>,
{
    let ctx = world.borrow();
    let base_url = ctx.base_url.clone();
    ctx.local.block_on(&ctx.runtime, operation(base_url))
}

fn session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(false)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(PersistentSession::default().session_ttl(CookieDuration::hours(2)))
        .build()
}

async fn spawn_server(harness: &CivicHarness) -> Result<(String, ServerHandle), String> {
    let key = Key::generate();
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;

    let http_data = web::Data::new(harness.http_state());
    let origins = OriginPolicy::new(Vec::<String>::new()).map_err(|err| err.to_string())?;
    let ws_data = web::Data::new(WsState::new(Arc::clone(&harness.cache), origins));

    let server = HttpServer::new(move || {
        let api = web::scope("/api/v1")
            .wrap(session_middleware(key.clone()))
            .configure(configure_api);
        App::new()
            .app_data(http_data.clone())
            .app_data(ws_data.clone())
            .wrap(Trace)
            .service(api)
            .service(ws::ws_entry)
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .map_err(|err| err.to_string())?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);
    Ok((format!("http://{addr}"), handle))
}

/// Start a server over a fresh in-memory deployment.
pub(crate) fn start() -> ServerFixture {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let local = LocalSet::new();
    let harness = Arc::new(CivicHarness::new());
    let (base_url, server) = local
        .block_on(&runtime, spawn_server(&harness))
        .expect("server start");

    ServerFixture {
        world: Rc::new(RefCell::new(ServerWorld {
            runtime,
            local,
            base_url,
            server,
            harness,
            cookies: HashMap::new(),
            last_status: None,
            last_body: None,
            last_trace_id: None,
            report_id: None,
        })),
    }
}
