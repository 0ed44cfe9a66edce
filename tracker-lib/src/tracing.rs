use crate::config::Config;
use anyhow::Context;
use opentelemetry::sdk::trace::Tracer;
use opentelemetry::sdk::Resource;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use tonic::metadata::MetadataMap;
use tracing::info;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::{LookupSpan, Registry};

const HONEYCOMB_ENDPOINT: &str = "https://api.honeycomb.io";

pub fn create_opentelemetry_layer<S>(
    service_name: &'static str,
    api_key: &str,
) -> Result<OpenTelemetryLayer<S, Tracer>, anyhow::Error>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    let mut metadata_map = MetadataMap::with_capacity(1);
    metadata_map.insert(
        "x-honeycomb-team",
        api_key.parse().context("Invalid Honeycomb API key")?,
    );
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(HONEYCOMB_ENDPOINT)
        .with_metadata(metadata_map);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_trace_config(
            opentelemetry::sdk::trace::config().with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                service_name,
            )])),
        )
        .with_exporter(exporter)
        .install_simple()
        .context("Unable to create tracer")?;
    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
    Ok(telemetry_layer)
}

/// Installs the global subscriber: a level filter and fmt output, plus OTLP
/// export when a Honeycomb key is configured. Fails if called twice.
pub fn init(service_name: &'static str, config: &Config) -> Result<(), anyhow::Error> {
    let level_filter = config.level_filter()?;
    let telemetry_layer = match &config.honeycomb_api_key {
        Some(api_key) => Some(create_opentelemetry_layer(service_name, api_key)?),
        None => None,
    };
    let exporting = telemetry_layer.is_some();

    let subscriber = Registry::default()
        .with(level_filter)
        .with(tracing_subscriber::fmt::Layer::default())
        .with(telemetry_layer);
    tracing::subscriber::set_global_default(subscriber).context("Unable to set up subscriber")?;

    info!(service_name, %level_filter, exporting, "tracing initialized");
    Ok(())
}
