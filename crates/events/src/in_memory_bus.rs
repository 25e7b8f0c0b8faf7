//! In-memory broker for tests/dev.

use std::collections::HashMap;
use std::sync::{Mutex, mpsc};

use thiserror::Error;
use tracing::debug;

use warehub_core::GroupId;

use crate::bus::{Broker, Subscription};
use crate::topic::{Record, RecordMetadata, TopicSpec};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InMemoryBrokerError {
    /// Internal lock poisoning.
    #[error("broker state poisoned")]
    Poisoned,

    /// Publish to a topic nobody declared.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    /// A topic was re-declared with different parameters.
    #[error("topic {name} already declared as {existing_partitions}p/{existing_replicas}r")]
    TopicConflict {
        name: String,
        existing_partitions: u32,
        existing_replicas: u16,
    },
}

#[derive(Debug)]
struct GroupMembers {
    group: GroupId,
    members: Vec<mpsc::Sender<Record>>,
    cursor: usize,
}

impl GroupMembers {
    /// Hand `record` to the next live member (round-robin), pruning dead ones.
    fn deliver(&mut self, record: &Record) {
        while !self.members.is_empty() {
            let idx = self.cursor % self.members.len();
            if self.members[idx].send(record.clone()).is_ok() {
                self.cursor = idx + 1;
                return;
            }
            self.members.remove(idx);
        }
    }
}

#[derive(Debug, Default)]
struct TopicState {
    spec: Option<TopicSpec>,
    next_offset: u64,
    groups: Vec<GroupMembers>,
}

/// In-memory pub/sub broker.
///
/// - No IO, no async
/// - One ordered log per topic (records always report partition 0)
/// - Consumer groups: round-robin within a group, full copy per group
/// - Subscribing before a topic is declared is allowed
#[derive(Debug, Default)]
pub struct InMemoryBroker {
    topics: Mutex<HashMap<String, TopicState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared parameters of `topic`, if any.
    pub fn topic_spec(&self, topic: &str) -> Option<TopicSpec> {
        let topics = self.topics.lock().ok()?;
        topics.get(topic).and_then(|t| t.spec.clone())
    }
}

impl Broker for InMemoryBroker {
    type Error = InMemoryBrokerError;

    fn provision(&self, spec: &TopicSpec) -> Result<(), Self::Error> {
        let mut topics = self.topics.lock().map_err(|_| InMemoryBrokerError::Poisoned)?;
        let state = topics.entry(spec.name.clone()).or_default();

        match &state.spec {
            Some(existing) if existing == spec => Ok(()),
            Some(existing) => Err(InMemoryBrokerError::TopicConflict {
                name: spec.name.clone(),
                existing_partitions: existing.partitions,
                existing_replicas: existing.replicas,
            }),
            None => {
                debug!(topic = %spec.name, partitions = spec.partitions, replicas = spec.replicas, "topic declared");
                state.spec = Some(spec.clone());
                Ok(())
            }
        }
    }

    fn publish(&self, topic: &str, payload: String) -> Result<RecordMetadata, Self::Error> {
        let mut topics = self.topics.lock().map_err(|_| InMemoryBrokerError::Poisoned)?;
        let state = topics
            .get_mut(topic)
            .filter(|t| t.spec.is_some())
            .ok_or_else(|| InMemoryBrokerError::UnknownTopic(topic.to_string()))?;

        let record = Record {
            topic: topic.to_string(),
            partition: 0,
            offset: state.next_offset,
            payload,
        };
        state.next_offset += 1;

        for group in &mut state.groups {
            group.deliver(&record);
        }
        // Drop groups whose subscribers have all gone away.
        state.groups.retain(|g| !g.members.is_empty());

        Ok(record.metadata())
    }

    fn subscribe(&self, topic: &str, group: &GroupId) -> Subscription<Record> {
        let (tx, rx) = mpsc::channel();

        // If the lock is poisoned, we still return a subscription;
        // it just won't receive records until the process restarts.
        if let Ok(mut topics) = self.topics.lock() {
            let state = topics.entry(topic.to_string()).or_default();
            match state.groups.iter_mut().find(|g| &g.group == group) {
                Some(existing) => existing.members.push(tx),
                None => state.groups.push(GroupMembers {
                    group: group.clone(),
                    members: vec![tx],
                    cursor: 0,
                }),
            }
        }

        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker_with(topic: &str) -> InMemoryBroker {
        let broker = InMemoryBroker::new();
        broker.provision(&TopicSpec::single(topic)).unwrap();
        broker
    }

    #[test]
    fn provision_is_idempotent_for_same_parameters() {
        let broker = broker_with("warehouse-responses");
        assert!(broker.provision(&TopicSpec::single("warehouse-responses")).is_ok());
        assert_eq!(broker.topic_spec("warehouse-responses"), Some(TopicSpec::single("warehouse-responses")));
    }

    #[test]
    fn provision_rejects_conflicting_parameters() {
        let broker = broker_with("warehouse-responses");
        let err = broker.provision(&TopicSpec::new("warehouse-responses", 3, 1)).unwrap_err();
        assert!(matches!(err, InMemoryBrokerError::TopicConflict { existing_partitions: 1, .. }));
    }

    #[test]
    fn publish_to_undeclared_topic_fails() {
        let broker = InMemoryBroker::new();
        let err = broker.publish("nope", "x".to_string()).unwrap_err();
        assert_eq!(err, InMemoryBrokerError::UnknownTopic("nope".to_string()));
    }

    #[test]
    fn offsets_increase_per_topic() {
        let broker = broker_with("t");
        broker.provision(&TopicSpec::single("u")).unwrap();

        assert_eq!(broker.publish("t", "a".into()).unwrap().offset, 0);
        assert_eq!(broker.publish("t", "b".into()).unwrap().offset, 1);
        assert_eq!(broker.publish("u", "c".into()).unwrap().offset, 0);
    }

    #[test]
    fn distinct_groups_each_receive_every_record() {
        let broker = broker_with("t");
        let a = broker.subscribe("t", &GroupId::fixed("a"));
        let b = broker.subscribe("t", &GroupId::fixed("b"));

        broker.publish("t", "one".into()).unwrap();
        broker.publish("t", "two".into()).unwrap();

        for sub in [&a, &b] {
            assert_eq!(sub.try_recv().unwrap().payload, "one");
            assert_eq!(sub.try_recv().unwrap().payload, "two");
        }
    }

    #[test]
    fn shared_group_splits_delivery() {
        let broker = broker_with("t");
        let group = GroupId::fixed("final-lager-group");
        let first = broker.subscribe("t", &group);
        let second = broker.subscribe("t", &group);

        broker.publish("t", "one".into()).unwrap();
        broker.publish("t", "two".into()).unwrap();

        assert_eq!(first.try_recv().unwrap().payload, "one");
        assert_eq!(second.try_recv().unwrap().payload, "two");
        assert!(first.try_recv().is_err());
        assert!(second.try_recv().is_err());
    }

    #[test]
    fn dropped_member_is_skipped() {
        let broker = broker_with("t");
        let group = GroupId::fixed("g");
        let gone = broker.subscribe("t", &group);
        let alive = broker.subscribe("t", &group);
        drop(gone);

        broker.publish("t", "one".into()).unwrap();
        assert_eq!(alive.try_recv().unwrap().payload, "one");
    }

    #[test]
    fn subscribe_before_provision_receives_records() {
        let broker = InMemoryBroker::new();
        let sub = broker.subscribe("late", &GroupId::fixed("g"));
        broker.provision(&TopicSpec::single("late")).unwrap();

        let meta = broker.publish("late", "hello".into()).unwrap();
        let rec = sub.try_recv().unwrap();
        assert_eq!(rec.metadata(), meta);
    }
}
