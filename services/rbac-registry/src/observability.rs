//! Logging, span export, and Prometheus metrics for the registry.
//!
//! `init_observability` installs the `tracing` subscriber once per process and
//! the Prometheus recorder once per process; later calls return the cached
//! handle. OTLP span export is only wired when `OTEL_EXPORTER_OTLP_ENDPOINT`
//! is set.
use anyhow::Context as _;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const RECONCILE_TOTAL: &str = "rbac_reconcile_total";
pub const RECONCILE_ROUTES: &str = "rbac_reconcile_routes";
pub const EDGE_REJECTED_TOTAL: &str = "rbac_edge_rejected_total";

/// Submitted route-set sizes; a service rarely exposes more than a few hundred.
const RECONCILE_ROUTE_BUCKETS: &[f64] = &[0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0];

/// Optional resource attributes and the variables they are read from.
const RESOURCE_ENV: &[(&str, &str)] = &[
    ("k8s.cluster.name", "K8S_CLUSTER_NAME"),
    ("k8s.namespace.name", "K8S_NAMESPACE_NAME"),
    ("k8s.pod.name", "K8S_POD_NAME"),
    ("cloud.region", "CLOUD_REGION"),
    ("deployment.environment", "DEPLOYMENT_ENVIRONMENT"),
];

static SUBSCRIBER: OnceLock<()> = OnceLock::new();
static PROPAGATOR: OnceLock<()> = OnceLock::new();
static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn init_observability(service_name: &str) -> anyhow::Result<PrometheusHandle> {
    install_propagator();
    SUBSCRIBER.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let otel = span_exporter(service_name).map(|provider| {
            let tracer = provider.tracer(service_name.to_string());
            global::set_tracer_provider(provider);
            tracing_opentelemetry::layer().with_tracer(tracer)
        });
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .with(otel)
            .try_init();
    });
    install_recorder()
}

fn install_propagator() {
    PROPAGATOR.get_or_init(|| global::set_text_map_propagator(TraceContextPropagator::new()));
}

fn span_exporter(service_name: &str) -> Option<SdkTracerProvider> {
    std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT")?;
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .ok()?;
    let resource = Resource::builder_empty()
        .with_attributes(resource_attributes(service_name))
        .build();
    Some(
        SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build(),
    )
}

fn resource_attributes(service_name: &str) -> Vec<KeyValue> {
    let mut attrs = vec![
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ];
    let instance =
        std::env::var("RBAC_SERVICE_INSTANCE_ID").or_else(|_| std::env::var("HOSTNAME"));
    attrs.extend(
        instance
            .ok()
            .map(|value| KeyValue::new("service.instance.id", value)),
    );
    attrs.extend(RESOURCE_ENV.iter().filter_map(|(key, var)| {
        std::env::var(var)
            .ok()
            .map(|value| KeyValue::new(*key, value))
    }));
    attrs
}

fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    if let Some(handle) = RECORDER.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(RECONCILE_ROUTES.to_string()),
            RECONCILE_ROUTE_BUCKETS,
        )
        .context("configure reconcile histogram buckets")?
        .install_recorder()
        .context("install prometheus recorder")?;
    describe_metrics();
    Ok(RECORDER.get_or_init(|| handle).clone())
}

fn describe_metrics() {
    metrics::describe_counter!(
        RECONCILE_TOTAL,
        "Reconcile passes by outcome (complete, stale_not_cleared, failed)"
    );
    metrics::describe_histogram!(RECONCILE_ROUTES, "Distinct routes per reconcile submission");
    metrics::describe_counter!(
        EDGE_REJECTED_TOTAL,
        "Permission edges rejected because the route or role does not exist"
    );
}

/// Parent context for a request span, read from W3C `traceparent`/`tracestate`.
pub fn trace_context_from_headers(headers: &axum::http::HeaderMap) -> opentelemetry::Context {
    install_propagator();
    global::get_text_map_propagator(|prop| prop.extract(&HeaderCarrier(headers)))
}

struct HeaderCarrier<'a>(&'a axum::http::HeaderMap);

impl Extractor for HeaderCarrier<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

pub fn metrics_router(handle: PrometheusHandle) -> axum::Router {
    axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

pub async fn serve_metrics(handle: PrometheusHandle, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "metrics listening");
    axum::serve(listener, metrics_router(handle).into_make_service()).await
}
