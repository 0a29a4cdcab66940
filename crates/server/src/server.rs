use axum::{
    Router,
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as HeaderError, Header},
};

use std::sync::Arc;

use crate::{categories, contacts, labels, ledger};
use engine::Engine;

static ACCOUNT_HEADER: HeaderName = HeaderName::from_static("x-account-id");
static USER_HEADER: HeaderName = HeaderName::from_static("x-user-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Account and user a request acts for, resolved by [`auth`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountContext {
    pub account_id: i32,
    pub user_id: i32,
}

fn decode_id<'i, I>(values: &mut I) -> Result<i32, HeaderError>
where
    I: Iterator<Item = &'i HeaderValue>,
{
    let value = values.next().ok_or_else(HeaderError::invalid)?;
    let Ok(value) = value.to_str() else {
        return Err(HeaderError::invalid());
    };
    value.trim().parse().map_err(|_| HeaderError::invalid())
}

fn encode_id<E: Extend<HeaderValue>>(id: i32, values: &mut E) {
    values.extend(std::iter::once(HeaderValue::from(id)));
}

/// `TypedHeader` carrying the account id set by the authenticating proxy.
#[derive(Debug)]
struct AccountHeader(i32);

impl Header for AccountHeader {
    fn name() -> &'static HeaderName {
        &ACCOUNT_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, HeaderError>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        decode_id(values).map(AccountHeader)
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        encode_id(self.0, values);
    }
}

/// `TypedHeader` carrying the id of the user behind the request.
#[derive(Debug)]
struct UserHeader(i32);

impl Header for UserHeader {
    fn name() -> &'static HeaderName {
        &USER_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, HeaderError>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        decode_id(values).map(UserHeader)
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        encode_id(self.0, values);
    }
}

async fn auth(
    account: Option<TypedHeader<AccountHeader>>,
    user: Option<TypedHeader<UserHeader>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (Some(TypedHeader(account)), Some(TypedHeader(user))) = (account, user) else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    // Every query is scoped by account; id 0 would disable that scope.
    if account.0 <= 0 || user.0 <= 0 {
        return Err(StatusCode::UNAUTHORIZED);
    }

    request.extensions_mut().insert(AccountContext {
        account_id: account.0,
        user_id: user.0,
    });
    Ok(next.run(request).await)
}

/// The `/api/v3` router with the account middleware applied.
pub fn app(state: ServerState) -> Router {
    let api = Router::new()
        .route("/ledger", get(ledger::list).post(ledger::create))
        .route(
            "/ledger/{id}",
            get(ledger::get).put(ledger::update).delete(ledger::delete),
        )
        .route("/ledger/{id}/files/{file_id}", post(ledger::attach_file))
        .route("/contacts", get(contacts::list))
        .route("/categories", get(categories::list).post(categories::create))
        .route("/labels", get(labels::list).post(labels::create))
        .route_layer(middleware::from_fn(auth))
        .with_state(state);

    Router::new().nest("/api/v3", api)
}

pub async fn run(engine: Engine) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, app(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
