use std::io::Write;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_sdk::{
  Resource,
  metrics::MeterProviderBuilder,
  propagation::TraceContextPropagator,
  trace::{BatchConfigBuilder, BatchSpanProcessor, Sampler, SdkTracerProvider},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::fmt;

use crate::api::config::{self, Config, Env};

pub fn build_prometheus() -> Result<PrometheusHandle, BuildError> {
  let builder = PrometheusBuilder::new()
    .add_global_label("service", "vigil")
    .set_buckets_for_metric(Matcher::Full("vigil_scoring_scores".into()), &[0.2, 0.5, 0.7, 0.85, 0.95])?
    .set_buckets_for_metric(Matcher::Full("vigil_scoring_latency_seconds".into()), &[0.0001, 0.0005, 0.001, 0.005, 0.02, 0.1])?
    .set_buckets_for_metric(Matcher::Full("vigil_batch_items".into()), &[1.0, 10.0, 100.0, 500.0, 1000.0])?;

  builder.install_recorder()
}

pub async fn init_tracing(config: &Config, writer: impl Write + Send + 'static) -> (WorkerGuard, Option<SdkTracerProvider>) {
  use tracing_subscriber::{EnvFilter, prelude::*};

  let (appender, logging_guard) = tracing_appender::non_blocking(writer);

  let formatter = match config.env {
    #[cfg(not(test))]
    Env::Dev => fmt::layer().compact().with_writer(appender).with_ansi(true).boxed(),
    Env::Production => fmt::layer().json().flatten_event(true).with_writer(appender).boxed(),

    #[cfg(test)]
    Env::Dev => fmt::layer().compact().with_writer(appender).with_ansi(false).boxed(),
  };

  let (tracing_layer, tracing_provider, metrics_layer, metrics_provider) = match config.enable_tracing {
    true => {
      let resource = Resource::builder_empty().with_attributes([KeyValue::new("service.name", "vigil")]).build();

      let tracing_otlp = opentelemetry_otlp::SpanExporter::builder().with_tonic().build().expect("could not build OTLP span exporter");
      let processor = BatchSpanProcessor::builder(tracing_otlp)
        .with_batch_config(BatchConfigBuilder::default().with_max_queue_size(8192).build())
        .build();

      let tracing_provider = SdkTracerProvider::builder()
        .with_sampler(Sampler::TraceIdRatioBased(config::parse_env("OTEL_TRACES_SAMPLER_ARGS", 0.1).unwrap_or(0.1)))
        .with_resource(resource.clone())
        .with_span_processor(processor)
        .build();

      let tracer = tracing_provider.tracer("vigil");
      let tracing_layer = tracing_opentelemetry::layer().with_tracer(tracer);

      let metrics_otlp = opentelemetry_otlp::MetricExporter::builder().with_tonic().build().expect("could not build OTLP metric exporter");
      let metrics_provider = MeterProviderBuilder::default().with_periodic_exporter(metrics_otlp).with_resource(resource).build();
      let metrics_layer = MetricsLayer::new(metrics_provider.clone());

      (Some(tracing_layer), Some(tracing_provider), Some(metrics_layer), Some(metrics_provider))
    }

    false => (None, None, None, None),
  };

  if let Some(provider) = metrics_provider {
    global::set_meter_provider(provider);
  }

  global::set_text_map_propagator(TraceContextPropagator::new());

  tracing_subscriber::registry()
    .with(EnvFilter::builder().try_from_env().or_else(|_| EnvFilter::try_new("info")).unwrap())
    .with(metrics_layer)
    .with(tracing_layer)
    .with(formatter)
    .init();

  (logging_guard, tracing_provider)
}
