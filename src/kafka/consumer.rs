use crate::kafka::config::ClientProperties;
use crate::kafka::key::{Offset, PartitionRef};
use log::{debug, info, warn};
use rdkafka::config::FromClientConfig;
use rdkafka::consumer::{BaseConsumer, CommitMode, Consumer};
use rdkafka::error::{KafkaError, KafkaResult};
use rdkafka::message::OwnedMessage;
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::{Offset as KafkaOffset, TopicPartitionList};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// ブローカーとのセッションを開く。
pub trait ITransport {
    type Session: ISession;
    fn open(&self, properties: &ClientProperties) -> KafkaResult<Self::Session>;
}

/// 1つのセッションに対する操作。呼び出し側で直列化すること。
pub trait ISession: Send {
    fn assign(&mut self, partitions: &[PartitionRef]) -> KafkaResult<()>;
    fn end_offsets(
        &mut self,
        partitions: &[PartitionRef],
    ) -> KafkaResult<HashMap<PartitionRef, Offset>>;
    fn seek(&mut self, partition: &PartitionRef, offset: Offset) -> KafkaResult<()>;
    fn poll(&mut self, timeout: Duration) -> Option<KafkaResult<OwnedMessage>>;
    fn commit(&mut self) -> KafkaResult<()>;
    fn commit_offset(&mut self, partition: &PartitionRef, offset: Offset) -> KafkaResult<()>;
    fn close(&mut self);
}

#[derive(Clone, Debug)]
pub struct KafkaTransport {
    timeout: Duration,
}

impl KafkaTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for KafkaTransport {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

impl ITransport for KafkaTransport {
    type Session = KafkaSession;

    fn open(&self, properties: &ClientProperties) -> KafkaResult<KafkaSession> {
        let consumer = BaseConsumer::from_config(&properties.to_client_config())?;
        debug!("Opened kafka session.");
        Ok(KafkaSession {
            consumer: Some(consumer),
            assignment: TopicPartitionList::new(),
            pending: false,
            timeout: self.timeout,
        })
    }
}

/// [BaseConsumer]を1つだけ所有するセッション。
///
/// seekは割り当て済みの[TopicPartitionList]のオフセットを書き換え、次のpollの前に再割り当てする。
pub struct KafkaSession {
    consumer: Option<BaseConsumer>,
    assignment: TopicPartitionList,
    pending: bool,
    timeout: Duration,
}

impl KafkaSession {
    fn consumer(&self) -> KafkaResult<&BaseConsumer> {
        self.consumer
            .as_ref()
            .ok_or(KafkaError::Global(RDKafkaErrorCode::State))
    }

    fn validate(&self, partitions: &[PartitionRef]) -> KafkaResult<()> {
        let consumer = self.consumer()?;
        let topics = partitions
            .iter()
            .map(|p| p.topic.as_str())
            .collect::<BTreeSet<_>>();
        for topic in topics {
            let metadata = consumer.fetch_metadata(Some(topic), self.timeout)?;
            let known = metadata
                .topics()
                .iter()
                .find(|t| t.name() == topic && t.error().is_none())
                .map(|t| t.partitions().iter().map(|p| p.id()).collect::<Vec<_>>());
            let known = match known {
                Some(known) => known,
                None => {
                    warn!("Unknown topic.(topic={})", topic);
                    return Err(KafkaError::MetadataFetch(
                        RDKafkaErrorCode::UnknownTopicOrPartition,
                    ));
                }
            };
            for partition in partitions.iter().filter(|p| p.topic == topic) {
                if !known.contains(&partition.partition) {
                    warn!("Unknown partition.(partition={})", partition);
                    return Err(KafkaError::MetadataFetch(RDKafkaErrorCode::UnknownPartition));
                }
            }
        }
        Ok(())
    }

    fn sync_assignment(&mut self) -> KafkaResult<()> {
        if self.pending {
            self.consumer()?.assign(&self.assignment)?;
            self.pending = false;
        }
        Ok(())
    }
}

impl ISession for KafkaSession {
    fn assign(&mut self, partitions: &[PartitionRef]) -> KafkaResult<()> {
        self.validate(partitions)?;
        let mut assignment = TopicPartitionList::new();
        for p in partitions {
            assignment.add_partition_offset(&p.topic, p.partition, KafkaOffset::Stored)?;
        }
        self.consumer()?.assign(&assignment)?;
        self.assignment = assignment;
        self.pending = false;
        Ok(())
    }

    fn end_offsets(
        &mut self,
        partitions: &[PartitionRef],
    ) -> KafkaResult<HashMap<PartitionRef, Offset>> {
        // A timestamp of -1 (Offset::End) asks the broker for the latest offset.
        let mut query = TopicPartitionList::new();
        for p in partitions {
            query.add_partition_offset(&p.topic, p.partition, KafkaOffset::End)?;
        }
        let answer = self.consumer()?.offsets_for_times(query, self.timeout)?;
        let mut end_offsets = HashMap::new();
        for elem in answer.elements() {
            elem.error()?;
            match elem.offset() {
                KafkaOffset::Offset(offset) => {
                    end_offsets.insert(PartitionRef::new(elem.topic(), elem.partition()), offset);
                }
                other => {
                    warn!(
                        "Unexpected end offset.(topic={}, partition={}, offset={:?})",
                        elem.topic(),
                        elem.partition(),
                        other
                    );
                    return Err(KafkaError::OffsetFetch(RDKafkaErrorCode::InvalidArgument));
                }
            }
        }
        Ok(end_offsets)
    }

    fn seek(&mut self, partition: &PartitionRef, offset: Offset) -> KafkaResult<()> {
        self.assignment.set_partition_offset(
            &partition.topic,
            partition.partition,
            KafkaOffset::Offset(offset),
        )?;
        self.pending = true;
        Ok(())
    }

    fn poll(&mut self, timeout: Duration) -> Option<KafkaResult<OwnedMessage>> {
        if let Err(e) = self.sync_assignment() {
            return Some(Err(e));
        }
        let consumer = match self.consumer() {
            Ok(consumer) => consumer,
            Err(e) => return Some(Err(e)),
        };
        consumer
            .poll(timeout)
            .map(|result| result.map(|msg| msg.detach()))
    }

    fn commit(&mut self) -> KafkaResult<()> {
        self.consumer()?.commit_consumer_state(CommitMode::Sync)
    }

    fn commit_offset(&mut self, partition: &PartitionRef, offset: Offset) -> KafkaResult<()> {
        let mut offsets = TopicPartitionList::new();
        offsets.add_partition_offset(
            &partition.topic,
            partition.partition,
            KafkaOffset::Offset(offset),
        )?;
        self.consumer()?.commit(&offsets, CommitMode::Sync)
    }

    fn close(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            if let Err(e) = consumer.unassign() {
                warn!("Failed to unassign partitions.({})", e);
            }
            info!("Closed kafka session.");
        }
    }
}
