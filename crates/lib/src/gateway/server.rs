//! Gateway HTTP server: provider-style send endpoint plus the message listing.

use crate::auth::Credentials;
use crate::config::Config;
use crate::gateway::protocol::{
    parse_urlencoded, FormPairs, SendForm, MARSHAL_ERROR_BODY, UNAUTHORISED_BODY,
};
use crate::store::MessageStore;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Path, RawQuery, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared state for the gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The one credential pair the send endpoint accepts.
    pub credentials: Arc<Credentials>,
    pub store: Arc<MessageStore>,
}

impl GatewayState {
    pub fn new(config: &Config, store: Arc<MessageStore>) -> Self {
        Self {
            credentials: Arc::new(config.credentials()),
            store,
        }
    }
}

/// Routes: `GET /messages` and `POST /Accounts/{username}/Messages.json`.
/// Send bodies have no size limit.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/messages", get(list_messages))
        .route(
            "/Accounts/:username/Messages.json",
            post(send_message).layer(DefaultBodyLimit::disable()),
        )
        .with_state(state)
}

/// A gateway whose listener is bound but not yet serving.
pub struct Gateway {
    listener: TcpListener,
    local_addr: SocketAddr,
    app: Router,
}

impl Gateway {
    /// Bind to `config.bind:config.port`. Fails if the address is unavailable.
    pub async fn bind(config: &Config, store: Arc<MessageStore>) -> Result<Self> {
        let bind_addr = config.bind_addr();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("binding to {}", bind_addr))?;
        let local_addr = listener
            .local_addr()
            .with_context(|| format!("reading local address of {}", bind_addr))?;
        let app = router(GatewayState::new(config, store));
        Ok(Self {
            listener,
            local_addr,
            app,
        })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve requests until the listener fails.
    pub async fn serve(self) -> Result<()> {
        axum::serve(self.listener, self.app)
            .await
            .context("gateway server exited")
    }

    /// Serve on a background task until `shutdown` completes.
    ///
    /// Returns `Ok` when `shutdown` fires first; in-flight connections are not drained.
    /// Returns `Err` if the server task stops on its own before that.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr;
        let mut server = tokio::spawn(self.serve());
        tokio::select! {
            res = &mut server => {
                match res {
                    Ok(Ok(())) => anyhow::bail!("gateway on {} stopped unexpectedly", addr),
                    Ok(Err(e)) => Err(e),
                    Err(e) => Err(anyhow::Error::new(e).context("gateway task failed")),
                }
            }
            _ = shutdown => {
                server.abort();
                log::info!("gateway stopped");
                Ok(())
            }
        }
    }
}

/// Run the gateway with a fresh message store; binds to config.bind:config.port.
/// Blocks until SIGINT or SIGTERM. A bind failure is returned immediately.
pub async fn run_gateway(config: Config) -> Result<()> {
    let store = Arc::new(MessageStore::new());
    let gateway = Gateway::bind(&config, store).await?;
    log::info!("server started on localhost:{}", gateway.local_addr().port());
    if config.username.is_empty() && config.password.is_empty() {
        log::warn!("no --username/--password set; the send endpoint accepts empty Basic credentials");
    }
    gateway.run_until(shutdown_signal()).await
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

/// GET /messages returns every stored message as a JSON array, oldest first.
async fn list_messages(State(state): State<GatewayState>) -> Response {
    let messages = state.store.snapshot().await;
    match serde_json::to_vec(&messages) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            log::error!("serializing {} messages: {}", messages.len(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, MARSHAL_ERROR_BODY).into_response()
        }
    }
}

/// POST /Accounts/{username}/Messages.json stores a message after Basic auth.
/// The account segment is not checked against the credentials. A missing or
/// unparsable body is treated as empty fields.
async fn send_message(
    State(state): State<GatewayState>,
    account: Option<Path<String>>,
    RawQuery(query): RawQuery,
    request: Request,
) -> Response {
    if let Err(e) = state.credentials.authorize(request.headers()) {
        log::debug!("send rejected: {}", e);
        return (StatusCode::UNAUTHORIZED, UNAUTHORISED_BODY).into_response();
    }

    let query = query.as_deref().map(parse_urlencoded).unwrap_or_default();
    let form = match media_type(request.headers()).as_deref() {
        Some("application/x-www-form-urlencoded") => {
            let body = match Bytes::from_request(request, &state).await {
                Ok(bytes) => parse_urlencoded(&String::from_utf8_lossy(&bytes)),
                Err(e) => {
                    log::debug!("send form body ignored: {}", e);
                    Vec::new()
                }
            };
            SendForm::urlencoded(body, query)
        }
        Some("multipart/form-data") => {
            let fields = match Multipart::from_request(request, &state).await {
                Ok(multipart) => multipart_fields(multipart).await,
                Err(e) => {
                    log::debug!("send multipart body ignored: {}", e);
                    Vec::new()
                }
            };
            SendForm::multipart(query, fields)
        }
        _ => SendForm::urlencoded(Vec::new(), query),
    };

    let count = state.store.append(form.into_message()).await;
    log::debug!(
        "stored message #{} for account {}",
        count,
        account.as_ref().map(|Path(a)| a.as_str()).unwrap_or("?")
    );
    StatusCode::OK.into_response()
}

/// Lowercased media type of the request, without parameters.
fn media_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let essence = value.split(';').next().unwrap_or("").trim();
    (!essence.is_empty()).then(|| essence.to_ascii_lowercase())
}

/// Text parts of a multipart body in order. File parts are skipped; a malformed
/// part ends the read and keeps what was collected so far.
async fn multipart_fields(mut multipart: Multipart) -> FormPairs {
    let mut pairs = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                log::debug!("multipart read stopped: {}", e);
                break;
            }
        };
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match field.text().await {
            Ok(value) => pairs.push((name, value)),
            Err(e) => {
                log::debug!("multipart field {} unreadable: {}", name, e);
                break;
            }
        }
    }
    pairs
}
