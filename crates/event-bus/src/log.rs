//! Partitioned, append-only log abstraction for the distributed bus variant.
//!
//! The log is an external collaborator in production (a Kafka-style broker);
//! the in-memory implementation here provides the same contract for tests,
//! demos, and single-process deployments: per-partition append order, keyed
//! routing, and per-consumer-group committed offsets.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::DeliveryError;

/// One record in a partition.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub partition: u32,
    pub offset: u64,
    pub key: String,
    pub value: Vec<u8>,
}

/// Returns the partition a key routes to.
///
/// All records sharing a key land in one partition and are therefore
/// totally ordered relative to each other; records with different keys
/// carry no relative ordering guarantee.
pub fn partition_for(key: &str, partition_count: u32) -> u32 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % u64::from(partition_count.max(1))) as u32
}

/// A partitioned log with consumer-group offset tracking.
///
/// Offsets follow the usual convention: the committed offset is the next
/// offset a member of the group should read, so `0` means "nothing
/// consumed yet".
#[async_trait]
pub trait PartitionedLog: Send + Sync {
    /// Number of partitions in the log.
    fn partition_count(&self) -> u32;

    /// Appends a record, routed by key.
    async fn send(&self, key: &str, value: Vec<u8>) -> Result<(), DeliveryError>;

    /// Reads up to `max` records from a partition starting at `from_offset`.
    async fn fetch(
        &self,
        partition: u32,
        from_offset: u64,
        max: usize,
    ) -> Result<Vec<LogRecord>, DeliveryError>;

    /// Records a consumer group's read position for a partition.
    async fn commit_offset(
        &self,
        group: &str,
        partition: u32,
        offset: u64,
    ) -> Result<(), DeliveryError>;

    /// Returns a consumer group's committed read position for a partition.
    async fn committed_offset(&self, group: &str, partition: u32) -> Result<u64, DeliveryError>;
}

/// In-memory implementation of [`PartitionedLog`].
pub struct InMemoryPartitionedLog {
    partitions: Vec<RwLock<Vec<LogRecord>>>,
    committed: RwLock<HashMap<(String, u32), u64>>,
}

impl InMemoryPartitionedLog {
    /// Creates a log with the given number of partitions (at least 1).
    pub fn new(partition_count: u32) -> Self {
        let partitions = (0..partition_count.max(1))
            .map(|_| RwLock::new(Vec::new()))
            .collect();
        Self {
            partitions,
            committed: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of records across all partitions.
    pub async fn record_count(&self) -> usize {
        let mut total = 0;
        for partition in &self.partitions {
            total += partition.read().await.len();
        }
        total
    }
}

#[async_trait]
impl PartitionedLog for InMemoryPartitionedLog {
    fn partition_count(&self) -> u32 {
        self.partitions.len() as u32
    }

    async fn send(&self, key: &str, value: Vec<u8>) -> Result<(), DeliveryError> {
        let partition = partition_for(key, self.partition_count());
        let mut records = self.partitions[partition as usize].write().await;
        let offset = records.len() as u64;
        records.push(LogRecord {
            partition,
            offset,
            key: key.to_owned(),
            value,
        });
        Ok(())
    }

    async fn fetch(
        &self,
        partition: u32,
        from_offset: u64,
        max: usize,
    ) -> Result<Vec<LogRecord>, DeliveryError> {
        let records = self
            .partitions
            .get(partition as usize)
            .ok_or(DeliveryError::UnknownPartition(partition))?
            .read()
            .await;
        Ok(records
            .iter()
            .skip(from_offset as usize)
            .take(max)
            .cloned()
            .collect())
    }

    async fn commit_offset(
        &self,
        group: &str,
        partition: u32,
        offset: u64,
    ) -> Result<(), DeliveryError> {
        if partition >= self.partition_count() {
            return Err(DeliveryError::UnknownPartition(partition));
        }
        self.committed
            .write()
            .await
            .insert((group.to_owned(), partition), offset);
        Ok(())
    }

    async fn committed_offset(&self, group: &str, partition: u32) -> Result<u64, DeliveryError> {
        if partition >= self.partition_count() {
            return Err(DeliveryError::UnknownPartition(partition));
        }
        Ok(self
            .committed
            .read()
            .await
            .get(&(group.to_owned(), partition))
            .copied()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_for_is_stable_per_key() {
        let key = "5b2c9d51-0000-4000-8000-000000000000";
        assert_eq!(partition_for(key, 8), partition_for(key, 8));
        assert!(partition_for(key, 8) < 8);
    }

    #[tokio::test]
    async fn records_for_one_key_stay_in_order_in_one_partition() {
        let log = InMemoryPartitionedLog::new(4);
        log.send("kb-a", b"one".to_vec()).await.unwrap();
        log.send("kb-a", b"two".to_vec()).await.unwrap();
        log.send("kb-a", b"three".to_vec()).await.unwrap();

        let partition = partition_for("kb-a", 4);
        let records = log.fetch(partition, 0, 100).await.unwrap();
        let values: Vec<&[u8]> = records.iter().map(|r| r.value.as_slice()).collect();
        assert_eq!(values, vec![&b"one"[..], &b"two"[..], &b"three"[..]]);
        assert_eq!(records[0].offset, 0);
        assert_eq!(records[2].offset, 2);
    }

    #[tokio::test]
    async fn fetch_respects_offset_and_max() {
        let log = InMemoryPartitionedLog::new(1);
        for i in 0..5 {
            log.send("k", vec![i]).await.unwrap();
        }

        let records = log.fetch(0, 2, 2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].offset, 2);
        assert_eq!(records[1].offset, 3);
    }

    #[tokio::test]
    async fn committed_offsets_are_per_group() {
        let log = InMemoryPartitionedLog::new(2);
        log.commit_offset("group-a", 0, 7).await.unwrap();

        assert_eq!(log.committed_offset("group-a", 0).await.unwrap(), 7);
        assert_eq!(log.committed_offset("group-b", 0).await.unwrap(), 0);
        assert_eq!(log.committed_offset("group-a", 1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_partition_is_an_error() {
        let log = InMemoryPartitionedLog::new(1);
        assert!(matches!(
            log.fetch(3, 0, 10).await,
            Err(DeliveryError::UnknownPartition(3))
        ));
        assert!(matches!(
            log.commit_offset("g", 3, 0).await,
            Err(DeliveryError::UnknownPartition(3))
        ));
    }
}
