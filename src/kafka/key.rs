use std::fmt;

pub type Topic = String;
pub type Partition = i32;
pub type Offset = i64;

/// 1つのトピックの1つのパーティションを表す。
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PartitionRef {
    pub topic: Topic,
    pub partition: Partition,
}

impl PartitionRef {
    pub fn new(topic: &str, partition: Partition) -> Self {
        Self {
            topic: topic.to_string(),
            partition,
        }
    }
}

impl fmt::Display for PartitionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

macro_rules! key {
    ($msg: expr) => {
        $crate::kafka::key::PartitionRef {
            topic: $msg.topic().to_string(),
            partition: $msg.partition(),
        }
    };
}

pub(crate) use key;
