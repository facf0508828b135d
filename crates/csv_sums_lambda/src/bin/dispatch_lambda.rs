use aws_sdk_s3::primitives::ByteStream;
use csv_sums_core::contract::{CompletionStatus, StorageEvent};
use csv_sums_core::{DispatchConfig, StorageSettings};
use csv_sums_lambda::adapters::object_store::ObjectStore;
use csv_sums_lambda::handlers::dispatch::Dispatcher;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl ObjectStore for S3ObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .get_object()
                    .bucket(bucket)
                    .key(object_key)
                    .send()
                    .await
                    .map_err(|error| format!("failed to read object from s3: {error}"))?;
                output
                    .body
                    .collect()
                    .await
                    .map(|data| data.into_bytes().to_vec())
                    .map_err(|error| format!("failed to read object body from s3: {error}"))
            })
        })
    }

    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .content_type("text/csv")
                    .body(ByteStream::from(body_bytes))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to write object to s3: {error}"))
            })
        })
    }
}

async fn build_s3_client(settings: &StorageSettings) -> aws_sdk_s3::Client {
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let mut builder =
        aws_sdk_s3::config::Builder::from(&aws_config).force_path_style(settings.force_path_style);
    if let Some(endpoint_url) = &settings.endpoint_url {
        builder = builder.endpoint_url(endpoint_url);
    }
    aws_sdk_s3::Client::from_conf(builder.build())
}

async fn handle_request(
    event: LambdaEvent<Value>,
    dispatcher: &Dispatcher<S3ObjectStore>,
) -> Result<CompletionStatus, Error> {
    let storage_event = decode_storage_event(event.payload)?;
    let summary = dispatcher.dispatch(&storage_event)?;
    info!(
        records = storage_event.records.len(),
        uploaded = summary.uploaded_keys.len(),
        skipped = summary.skipped,
        "batch complete"
    );
    Ok(CompletionStatus::complete())
}

fn decode_storage_event(payload: Value) -> Result<StorageEvent, Error> {
    serde_json::from_value(payload)
        .map_err(|error| Error::from(format!("invalid storage event: {error}")))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = DispatchConfig::from_env()?;
    let s3_client = build_s3_client(&config.storage).await;
    let dispatcher = Dispatcher::from_config(config, S3ObjectStore { s3_client });
    info!(
        input_prefix = %dispatcher.config().input_prefix,
        output_prefix = %dispatcher.config().output_prefix,
        processor = dispatcher.processor_name(),
        "dispatcher configured"
    );

    let dispatcher = &dispatcher;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, dispatcher).await
    }))
    .await
}
