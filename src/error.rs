use crate::deserializer::DeserializeError;
use crate::kafka::key::{Offset, PartitionRef};
use rdkafka::error::KafkaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("InvalidArgument: {0}")]
    InvalidArgument(String),
    #[error("TransportOpenError: {0}")]
    TransportOpen(#[source] KafkaError),
    #[error("AssignmentError: {msg}")]
    Assignment {
        msg: String,
        #[source]
        source: Option<KafkaError>,
    },
    #[error("OffsetQueryError: {msg}")]
    OffsetQuery {
        msg: String,
        #[source]
        source: Option<KafkaError>,
    },
    #[error("SeekError: failed to seek {partition} to {offset}")]
    Seek {
        partition: PartitionRef,
        offset: Offset,
        #[source]
        source: KafkaError,
    },
    #[error("PollError: {0}")]
    Poll(#[source] KafkaError),
    #[error("CommitError: {0}")]
    Commit(#[source] KafkaError),
    #[error("DecodeError: record {partition}@{offset} could not be decoded")]
    Decode {
        partition: PartitionRef,
        offset: Offset,
        #[source]
        source: DeserializeError,
    },
    #[error("consumer is already closed")]
    Closed,
    #[error("WorkerError: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

macro_rules! assignment_error {
    ($msg: expr) => {
        $crate::error::ConsumerError::Assignment {
            msg: $msg.to_string(),
            source: None,
        }
    };
    ($msg: expr, $source: expr) => {
        $crate::error::ConsumerError::Assignment {
            msg: $msg.to_string(),
            source: Some($source),
        }
    };
}

macro_rules! offset_query_error {
    ($msg: expr) => {
        $crate::error::ConsumerError::OffsetQuery {
            msg: $msg.to_string(),
            source: None,
        }
    };
    ($msg: expr, $source: expr) => {
        $crate::error::ConsumerError::OffsetQuery {
            msg: $msg.to_string(),
            source: Some($source),
        }
    };
}

pub(crate) use assignment_error;
pub(crate) use offset_query_error;
