use crate::deserializer::{DeserializeError, Deserializer};
use crate::kafka::key::{key, Offset, Partition, PartitionRef};
use rdkafka::message::{Headers, Message as IMessage, OwnedMessage};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    pub value: Option<Vec<u8>>,
}

impl Header {
    pub fn new(key: &str, value: Option<Vec<u8>>) -> Self {
        Self {
            key: key.to_string(),
            value,
        }
    }
}

/// [crate::consumer::AssignedConsumer::poll]が返すデコード済みのレコード
#[derive(Clone, Debug)]
pub struct Record<K, V> {
    topic: String,
    partition: Partition,
    offset: Offset,
    timestamp: Option<i64>,
    key: Option<K>,
    value: Option<V>,
    headers: Vec<Header>,
}

impl<K, V> Record<K, V> {
    pub(crate) fn decode<KD, VD>(
        message: &OwnedMessage,
        key_deserializer: &KD,
        value_deserializer: &VD,
    ) -> Result<Self, DeserializeError>
    where
        KD: Deserializer<Output = K>,
        VD: Deserializer<Output = V>,
    {
        let headers = match message.headers() {
            Some(headers) => (0..headers.count())
                .map(|idx| {
                    let header = headers.get(idx);
                    Header::new(header.key, header.value.map(|v| v.to_vec()))
                })
                .collect::<Vec<_>>(),
            None => vec![],
        };
        let topic = message.topic();
        let partition = message.partition();
        let key = message
            .key()
            .map(|data| key_deserializer.deserialize(topic, partition, &headers, data))
            .transpose()?;
        let value = message
            .payload()
            .map(|data| value_deserializer.deserialize(topic, partition, &headers, data))
            .transpose()?;
        Ok(Self {
            topic: topic.to_string(),
            partition,
            offset: message.offset(),
            timestamp: message.timestamp().to_millis(),
            key,
            value,
            headers,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn partition_ref(&self) -> PartitionRef {
        key!(self)
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// ブローカーが付与したタイムスタンプ(ミリ秒)
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn into_value(self) -> Option<V> {
        self.value
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use rdkafka::message::{Header as KafkaHeader, OwnedHeaders};
    use rdkafka::Timestamp;

    pub fn create_message(
        topic: &str,
        partition: Partition,
        offset: Offset,
        key: Option<&[u8]>,
        payload: Option<&[u8]>,
        headers: &[(&str, &[u8])],
    ) -> OwnedMessage {
        let headers = if headers.is_empty() {
            None
        } else {
            Some(
                headers
                    .iter()
                    .fold(OwnedHeaders::new(), |acc, (key, value)| {
                        acc.insert(KafkaHeader {
                            key,
                            value: Some(*value),
                        })
                    }),
            )
        };
        OwnedMessage::new(
            payload.map(|p| p.to_vec()),
            key.map(|k| k.to_vec()),
            topic.to_string(),
            Timestamp::CreateTime(1000 + offset),
            partition,
            offset,
            headers,
        )
    }
}
