use csv_sums_core::contract::{Notification, StorageEvent};
use csv_sums_core::object_keys::{route_object_key, KeyRoute, SkipReason};
use csv_sums_core::{DispatchConfig, ProcessError, Processor};
use thiserror::Error;
use tracing::{debug, error, info, info_span};

use crate::adapters::object_store::ObjectStore;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to download s3://{bucket}/{key}: {message}")]
    Download {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("failed to process s3://{bucket}/{key}: {source}")]
    Process {
        bucket: String,
        key: String,
        #[source]
        source: ProcessError,
    },

    #[error("failed to upload s3://{bucket}/{key}: {message}")]
    Upload {
        bucket: String,
        key: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Uploaded { output_key: String },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub uploaded_keys: Vec<String>,
    pub skipped: usize,
}

/// Some notifications in a batch failed. The others were still processed.
#[derive(Debug, Error)]
#[error("{} notification(s) failed: {}", .failures.len(), describe_failures(.failures))]
pub struct BatchFailure {
    pub summary: DispatchSummary,
    pub failures: Vec<DispatchError>,
}

fn describe_failures(failures: &[DispatchError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Turns storage notifications into processor runs: download the input,
/// transform it in memory, upload the result under the output prefix.
pub struct Dispatcher<S> {
    config: DispatchConfig,
    processor: Box<dyn Processor>,
    store: S,
}

impl<S: ObjectStore> Dispatcher<S> {
    pub fn new(config: DispatchConfig, processor: Box<dyn Processor>, store: S) -> Self {
        Self {
            config,
            processor,
            store,
        }
    }

    /// Builds the processor named by `config.processor`.
    pub fn from_config(config: DispatchConfig, store: S) -> Self {
        let processor = config.processor.build();
        Self::new(config, processor, store)
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn processor_name(&self) -> &str {
        self.processor.name()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn dispatch(&self, event: &StorageEvent) -> Result<DispatchSummary, BatchFailure> {
        let mut summary = DispatchSummary::default();
        let mut failures = Vec::new();

        for notification in event.notifications() {
            match self.dispatch_notification(&notification) {
                Ok(NotificationOutcome::Uploaded { output_key }) => {
                    summary.uploaded_keys.push(output_key)
                }
                Ok(NotificationOutcome::Skipped(_)) => summary.skipped += 1,
                Err(failure) => {
                    error!(
                        bucket = %notification.bucket,
                        key = %notification.object_key,
                        error = %failure,
                        "notification failed"
                    );
                    failures.push(failure);
                }
            }
        }

        if failures.is_empty() {
            Ok(summary)
        } else {
            Err(BatchFailure { summary, failures })
        }
    }

    pub fn dispatch_notification(
        &self,
        notification: &Notification,
    ) -> Result<NotificationOutcome, DispatchError> {
        let _span = info_span!(
            "notification",
            bucket = %notification.bucket,
            key = %notification.object_key
        )
        .entered();

        let output_key = match route_object_key(
            &notification.object_key,
            &self.config.input_prefix,
            &self.config.output_prefix,
        ) {
            KeyRoute::Process { output_key, .. } => output_key,
            KeyRoute::Skip(reason) => {
                debug!(reason = reason.as_str(), "skipping notification");
                return Ok(NotificationOutcome::Skipped(reason));
            }
        };

        let input = self
            .store
            .get_object(&notification.bucket, &notification.object_key)
            .map_err(|message| DispatchError::Download {
                bucket: notification.bucket.clone(),
                key: notification.object_key.clone(),
                message,
            })?;

        let mut output = Vec::new();
        self.processor
            .transform(&mut input.as_slice(), &mut output)
            .map_err(|source| DispatchError::Process {
                bucket: notification.bucket.clone(),
                key: notification.object_key.clone(),
                source,
            })?;

        self.store
            .put_object(&notification.bucket, &output_key, &output)
            .map_err(|message| DispatchError::Upload {
                bucket: notification.bucket.clone(),
                key: output_key.clone(),
                message,
            })?;

        info!(
            output_key = %output_key,
            input_bytes = input.len(),
            processor = self.processor.name(),
            "uploaded column sums"
        );
        Ok(NotificationOutcome::Uploaded { output_key })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::{Read, Write};
    use std::sync::Mutex;

    use csv_sums_core::contract::{BucketRef, ObjectRef, StorageEntity, StorageEventRecord};
    use csv_sums_core::MalformedInput;

    use super::*;

    struct RecordingStore {
        objects: Mutex<HashMap<(String, String), Vec<u8>>>,
        reads: Mutex<Vec<String>>,
        writes: Mutex<Vec<String>>,
        denied_upload_suffix: Option<&'static str>,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                objects: Mutex::new(HashMap::new()),
                reads: Mutex::new(Vec::new()),
                writes: Mutex::new(Vec::new()),
                denied_upload_suffix: None,
            }
        }

        fn denying_uploads_ending_with(suffix: &'static str) -> Self {
            Self {
                denied_upload_suffix: Some(suffix),
                ..Self::new()
            }
        }

        fn seed_object(&self, bucket: &str, key: &str, body: &[u8]) {
            self.objects
                .lock()
                .expect("poisoned mutex")
                .insert((bucket.to_string(), key.to_string()), body.to_vec());
        }

        fn body(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
            self.objects
                .lock()
                .expect("poisoned mutex")
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
        }

        fn reads(&self) -> Vec<String> {
            self.reads.lock().expect("poisoned mutex").clone()
        }

        fn writes(&self) -> Vec<String> {
            self.writes.lock().expect("poisoned mutex").clone()
        }
    }

    impl ObjectStore for RecordingStore {
        fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
            self.reads
                .lock()
                .expect("poisoned mutex")
                .push(key.to_string());
            self.body(bucket, key)
                .ok_or_else(|| format!("NoSuchKey: {key}"))
        }

        fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), String> {
            if let Some(suffix) = self.denied_upload_suffix {
                if key.ends_with(suffix) {
                    return Err(format!("simulated write failure for key: {key}"));
                }
            }
            self.writes
                .lock()
                .expect("poisoned mutex")
                .push(key.to_string());
            self.seed_object(bucket, key, body);
            Ok(())
        }
    }

    struct ConstantProcessor(&'static [u8]);

    impl Processor for ConstantProcessor {
        fn name(&self) -> &str {
            "constant"
        }

        fn transform(
            &self,
            source: &mut dyn Read,
            sink: &mut dyn Write,
        ) -> Result<(), ProcessError> {
            let mut ignored = Vec::new();
            source.read_to_end(&mut ignored)?;
            sink.write_all(self.0)?;
            Ok(())
        }
    }

    fn event(keys: &[&str]) -> StorageEvent {
        StorageEvent {
            records: keys
                .iter()
                .map(|key| StorageEventRecord {
                    event_name: Some("ObjectCreated:Put".to_string()),
                    s3: StorageEntity {
                        bucket: BucketRef {
                            name: "reports".to_string(),
                        },
                        object: ObjectRef {
                            key: key.to_string(),
                        },
                    },
                })
                .collect(),
        }
    }

    fn dispatcher(store: RecordingStore) -> Dispatcher<RecordingStore> {
        Dispatcher::from_config(DispatchConfig::default(), store)
    }

    #[test]
    fn uploads_sums_under_output_prefix() {
        let store = RecordingStore::new();
        store.seed_object("reports", "try-lambda/in/data.csv", b"1,2,3\n4,5,6\n");
        let dispatcher = dispatcher(store);

        let summary = dispatcher
            .dispatch(&event(&["try-lambda/in/data.csv"]))
            .expect("batch should succeed");

        assert_eq!(summary.uploaded_keys, vec!["try-lambda/out/data.csv"]);
        assert_eq!(summary.skipped, 0);
        assert_eq!(
            dispatcher.store().body("reports", "try-lambda/out/data.csv"),
            Some(b"5,7,9\n".to_vec())
        );
    }

    #[test]
    fn skips_keys_outside_input_prefix_without_touching_storage() {
        let dispatcher = dispatcher(RecordingStore::new());

        let summary = dispatcher
            .dispatch(&event(&["other/in/file.csv", "try-lambda/in/"]))
            .expect("skips are not failures");

        assert_eq!(summary.skipped, 2);
        assert!(summary.uploaded_keys.is_empty());
        assert!(dispatcher.store().reads().is_empty());
        assert!(dispatcher.store().writes().is_empty());
    }

    #[test]
    fn decodes_url_encoded_keys_before_routing() {
        let store = RecordingStore::new();
        store.seed_object("reports", "try-lambda/in/q3 totals.csv", b"7\n");
        let dispatcher = dispatcher(store);

        let summary = dispatcher
            .dispatch(&event(&["try-lambda/in/q3+totals.csv"]))
            .expect("batch should succeed");

        assert_eq!(summary.uploaded_keys, vec!["try-lambda/out/q3 totals.csv"]);
    }

    #[test]
    fn malformed_input_uploads_nothing_and_batch_continues() {
        let store = RecordingStore::new();
        store.seed_object("reports", "try-lambda/in/bad.csv", b"1,2\n3,x\n");
        store.seed_object("reports", "try-lambda/in/good.csv", b"1,2\n3,4\n");
        let dispatcher = dispatcher(store);

        let failure = dispatcher
            .dispatch(&event(&["try-lambda/in/bad.csv", "try-lambda/in/good.csv"]))
            .expect_err("bad input should fail the batch");

        assert_eq!(failure.failures.len(), 1);
        match &failure.failures[0] {
            DispatchError::Process { key, source, .. } => {
                assert_eq!(key, "try-lambda/in/bad.csv");
                assert!(matches!(
                    source,
                    ProcessError::MalformedInput(MalformedInput::NonNumericCell { .. })
                ));
            }
            other => panic!("expected process failure, got {other:?}"),
        }
        assert_eq!(failure.summary.uploaded_keys, vec!["try-lambda/out/good.csv"]);
        assert_eq!(
            dispatcher.store().writes(),
            vec!["try-lambda/out/good.csv".to_string()]
        );
        assert!(failure.to_string().contains("1 notification(s) failed"));
    }

    #[test]
    fn missing_object_is_a_download_failure() {
        let dispatcher = dispatcher(RecordingStore::new());

        let error = dispatcher
            .dispatch_notification(&Notification {
                bucket: "reports".to_string(),
                object_key: "try-lambda/in/gone.csv".to_string(),
            })
            .expect_err("missing object should fail");

        assert!(matches!(error, DispatchError::Download { .. }));
        assert!(error.to_string().contains("NoSuchKey"));
        assert!(dispatcher.store().writes().is_empty());
    }

    #[test]
    fn upload_failure_is_reported_with_output_key() {
        let store = RecordingStore::denying_uploads_ending_with("data.csv");
        store.seed_object("reports", "try-lambda/in/data.csv", b"1\n");
        let dispatcher = dispatcher(store);

        let error = dispatcher
            .dispatch_notification(&Notification {
                bucket: "reports".to_string(),
                object_key: "try-lambda/in/data.csv".to_string(),
            })
            .expect_err("upload should fail");

        match error {
            DispatchError::Upload { key, message, .. } => {
                assert_eq!(key, "try-lambda/out/data.csv");
                assert!(message.contains("simulated write failure"));
            }
            other => panic!("expected upload failure, got {other:?}"),
        }
    }

    #[test]
    fn uses_the_processor_it_was_built_with() {
        let store = RecordingStore::new();
        store.seed_object("reports", "try-lambda/in/data.csv", b"1,2\n");
        let dispatcher = Dispatcher::new(
            DispatchConfig::default(),
            Box::new(ConstantProcessor(b"42\n")),
            store,
        );

        dispatcher
            .dispatch(&event(&["try-lambda/in/data.csv"]))
            .expect("batch should succeed");

        assert_eq!(dispatcher.processor_name(), "constant");
        assert_eq!(
            dispatcher.store().body("reports", "try-lambda/out/data.csv"),
            Some(b"42\n".to_vec())
        );
    }

    #[test]
    fn custom_prefixes_route_filename_only() {
        let store = RecordingStore::new();
        store.seed_object("reports", "incoming/2026/a.csv", b"1,1\n2,2\n");
        let config = DispatchConfig::new("incoming/", "processed/").expect("valid prefixes");
        let dispatcher = Dispatcher::from_config(config, store);

        let summary = dispatcher
            .dispatch(&event(&["incoming/2026/a.csv"]))
            .expect("batch should succeed");

        assert_eq!(summary.uploaded_keys, vec!["processed/2026/a.csv"]);
        assert_eq!(
            dispatcher.store().body("reports", "processed/2026/a.csv"),
            Some(b"3,3\n".to_vec())
        );
    }
}
