use std::{
    future::IntoFuture as _,
    io,
    sync::{Arc, OnceLock},
    time,
};

use application::{api, graphiql, graphql, Args, Config};
use axum::{
    extract::MatchedPath,
    routing::{get, on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::CorsLayer,
    trace::TraceLayer,
};
use tracing as log;
use tracing_subscriber::{
    filter::{filter_fn, FilterFn},
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

/// [`log::Level`]s written into STDERR instead of STDOUT.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum [`log::Level`] to be written, set once the [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(level_filter(false)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(level_filter(true)),
        )
        .init();

    _ = run().await;
}

/// Builds a filter passing spans and events of the configured [`LOG_LEVEL`],
/// which either belong to [`STDERR_LEVELS`] or not.
fn level_filter(
    stderr: bool,
) -> FilterFn<impl Fn(&log::Metadata<'_>) -> bool> {
    filter_fn(move |meta| {
        let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
        meta.is_span()
            || (STDERR_LEVELS.contains(meta.level()) == stderr
                && max >= *meta.level())
    })
}

/// Runs the marketplace server until it fails.
async fn run() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let mut postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    let report = migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;
    for m in report.applied_migrations() {
        log::info!("applied `{m}` database migration");
    }

    let service = Service::new(service.into(), postgres);
    let schema = api::Schema::new(
        api::Query,
        api::Mutation,
        juniper::EmptySubscription::new(),
    );

    let app = Router::new()
        .route(
            "/graphql",
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .route("/graphiql", get(graphiql("/graphql")))
        .route("/health", get(|| async { "OK" }))
        .layer(Extension(Arc::new(schema)))
        .layer(Extension(service))
        .layer(cors_layer(&server.cors.origins)?)
        .layer(trace_layer());

    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        log::error!("failed to listen on `{addr}`: {e}");
    })?;
    log::info!("parking marketplace is listening on `{addr}`");

    axum::serve(listener, app)
        .into_future()
        .await
        .map_err(|e| log::error!("webserver failed: {e}"))
}

/// Builds a [`CorsLayer`] allowing GraphQL requests from the provided
/// `origins`.
fn cors_layer(origins: &[String]) -> Result<CorsLayer, ()> {
    origins.iter().try_fold(
        CorsLayer::new()
            .allow_methods([
                http::Method::GET,
                http::Method::OPTIONS,
                http::Method::POST,
            ])
            .allow_headers([
                http::header::AUTHORIZATION,
                http::header::CONTENT_TYPE,
            ]),
        |cors, origin| {
            let origin = origin
                .parse::<http::header::HeaderValue>()
                .map_err(|e| {
                    log::error!("`{origin}` is not a valid CORS origin: {e}");
                })?;
            Ok(cors.allow_origin(origin))
        },
    )
}

/// Builds a [`TraceLayer`] wrapping every HTTP request into a span and
/// logging its response status and duration.
fn trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl Fn(&http::Request<axum::body::Body>) -> tracing::Span + Clone,
    tower_http::trace::DefaultOnRequest,
    impl Fn(&http::Response<axum::body::Body>, time::Duration, &tracing::Span)
        + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|r: &http::Request<axum::body::Body>| {
            tracing::info_span!(
                "HTTP request",
                http.client_ip = InsecureClientIp::from(
                    r.headers(),
                    r.extensions(),
                )
                .map(|ip| ip.0.to_string())
                .ok(),
                http.flavor = ?r.version(),
                http.method = r.method().as_str(),
                http.route = r
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str),
                http.target = r
                    .uri()
                    .path_and_query()
                    .map(http::uri::PathAndQuery::as_str),
                http.user_agent = r
                    .headers()
                    .get(http::header::USER_AGENT)
                    .and_then(|h| h.to_str().ok()),
                http.status_code = tracing::field::Empty,
            )
        })
        .on_response(
            |r: &http::Response<axum::body::Body>,
             dur: time::Duration,
             span: &tracing::Span| {
                _ = span.record(
                    "http.status_code",
                    tracing::field::display(r.status().as_u16()),
                );
                let duration = format!("{}ms", dur.as_millis());
                if r.status().is_server_error()
                    || r.status().is_client_error()
                {
                    tracing::error!(%duration);
                } else {
                    tracing::info!(%duration);
                }
            },
        )
}
