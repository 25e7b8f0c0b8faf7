use serde::{Deserialize, Serialize};

/// Declaration of a topic and its fixed delivery parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: u32,
    pub replicas: u16,
}

impl TopicSpec {
    pub fn new(name: impl Into<String>, partitions: u32, replicas: u16) -> Self {
        Self {
            name: name.into(),
            partitions,
            replicas,
        }
    }

    /// One partition, one replica.
    pub fn single(name: impl Into<String>) -> Self {
        Self::new(name, 1, 1)
    }
}

/// Where a published record landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
}

/// A record as delivered to a subscriber.
///
/// `payload` is opaque text; nothing in the transport interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub payload: String,
}

impl Record {
    pub fn metadata(&self) -> RecordMetadata {
        RecordMetadata {
            topic: self.topic.clone(),
            partition: self.partition,
            offset: self.offset,
        }
    }
}
