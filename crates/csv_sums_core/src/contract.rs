use serde::{Deserialize, Serialize};

use crate::object_keys::decode_object_key;

pub const COMPLETE_STATUS: &str = "complete";

/// A batch of storage change notifications in the S3 event layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StorageEventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageEventRecord {
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub s3: StorageEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageEntity {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectRef {
    /// URL-encoded as delivered by the notification source.
    pub key: String,
}

/// One object to consider, with its key already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub bucket: String,
    pub object_key: String,
}

impl StorageEvent {
    pub fn notifications(&self) -> Vec<Notification> {
        self.records
            .iter()
            .map(|record| Notification {
                bucket: record.s3.bucket.name.clone(),
                object_key: decode_object_key(&record.s3.object.key),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionStatus {
    pub status: String,
}

impl CompletionStatus {
    pub fn complete() -> Self {
        Self {
            status: COMPLETE_STATUS.to_string(),
        }
    }
}
