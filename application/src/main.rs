use std::{
    io,
    sync::{Arc, OnceLock},
    time,
};

use application::{api, graphql, Args, Config};
use axum::{
    body::Body,
    extract::MatchedPath,
    routing::{on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use juniper::EmptySubscription;
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

/// Levels written to `stderr` rather than `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Configured maximum log level, [`log::Level::INFO`] until loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    init_logging();

    _ = run().await;
}

/// Installs the two log writers, splitting events between `stdout` and
/// `stderr` by their level.
fn init_logging() {
    let writes_to = |stderr: bool| {
        filter_fn(move |meta| {
            let level = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
            meta.is_span()
                || (STDERR_LEVELS.contains(meta.level()) == stderr
                    && level >= *meta.level())
        })
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(writes_to(false)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(writes_to(true)),
        )
        .init();
}

/// Loads the configuration, migrates the database and serves the GraphQL
/// API until the listener fails.
async fn run() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;
    let Config {
        server,
        service,
        postgres,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("set only once"));

    let mut db = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to connect to Postgres: {e}");
    })?;
    let report =
        migrations::runner().run_async(&mut db).await.map_err(|e| {
            log::error!("failed to migrate the database: {e}");
        })?;
    for m in report.applied_migrations() {
        log::info!("applied migration `{m}`");
    }

    let service = service::Config::try_from(service).map_err(|e| {
        log::error!("invalid `service.utc_offset`: {e}");
    })?;
    let service = Service::new(service, db);

    let schema =
        api::Schema::new(api::Query, api::Mutation, EmptySubscription::new());

    let app = Router::new()
        .route(
            "/graphql",
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .layer(Extension(Arc::new(schema)))
        .layer(Extension(service))
        .layer(cors(&server.cors.origins)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span::<Body>)
                .on_response(log_response::<Body>),
        );

    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        log::error!("failed to listen on `{addr}`: {e}");
    })?;
    log::info!("serving GraphQL API on `{addr}`");

    axum::serve(listener, app)
        .await
        .map_err(|e| log::error!("server failed: {e}"))
}

/// Builds a [`CorsLayer`] allowing the provided origins.
fn cors(origins: &[String]) -> Result<CorsLayer, ()> {
    origins.iter().try_fold(
        CorsLayer::new()
            .allow_methods([
                http::Method::GET,
                http::Method::OPTIONS,
                http::Method::POST,
            ])
            .allow_headers([http::header::CONTENT_TYPE]),
        |cors, origin| {
            let origin =
                origin.parse::<http::header::HeaderValue>().map_err(|e| {
                    log::error!("invalid CORS origin `{origin}`: {e}");
                })?;
            Ok(cors.allow_origin(origin))
        },
    )
}

/// Opens a span for the provided HTTP request.
fn request_span<B>(r: &http::Request<B>) -> tracing::Span {
    let headers = r.headers();
    let uri = r.uri();
    tracing::info_span!(
        "HTTP request",
        http.client_ip = InsecureClientIp::from(headers, r.extensions())
            .map(|ip| ip.0.to_string())
            .ok(),
        http.flavor = ?r.version(),
        http.host = uri.host(),
        http.method = r.method().as_str(),
        http.route = r
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str),
        http.scheme = uri.scheme().map(http::uri::Scheme::as_str),
        http.target = uri
            .path_and_query()
            .map(http::uri::PathAndQuery::as_str),
        http.user_agent = headers
            .get(http::header::USER_AGENT)
            .and_then(|h| h.to_str().ok()),
        http.status_code = tracing::field::Empty,
    )
}

/// Records the status of the provided HTTP response into its span, logging
/// the time it took.
fn log_response<B>(
    r: &http::Response<B>,
    took: time::Duration,
    span: &tracing::Span,
) {
    let status = r.status();
    _ = span.record("http.status_code", status.as_u16());

    let duration = format!("{}ms", took.as_millis());
    if status.is_client_error() || status.is_server_error() {
        log::error!(duration = duration.as_str());
    } else {
        log::info!(duration = duration.as_str());
    }
}
