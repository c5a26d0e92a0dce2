//! 明示的に指定したパーティションだけを読むkafkaコンシューマを構築するライブラリ。
//!
//! ### Features
//!
//! - コンシューマグループを使わず、指定したパーティションを手動で割り当てる
//! - 開始位置は最古、最新、または終端オフセットから`N`件前を選べる
//! - [deserializer::Deserializer]でキーと値の型を静的に決められる
//!
//! ### Examples
//!
//! ```no_run
//! use assigned_consumer::prelude::*;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), ConsumerError> {
//!     env_logger::init();
//!     let mut consumer = builder(vec![
//!         PartitionRef::new("sample_topic", 0),
//!         PartitionRef::new("sample_topic", 1),
//!     ])
//!     .bootstrap_servers("localhost:9092")
//!     .value_deserializer(StringDeserializer)
//!     .distance_from_latest(10)?
//!     .build()?;
//!     for record in consumer.poll(Duration::from_secs(5))? {
//!         println!("{}@{}: {:?}", record.partition_ref(), record.offset(), record.value());
//!     }
//!     consumer.close();
//!     Ok(())
//! }
//! ```
pub mod builder;
pub mod consumer;
pub mod deserializer;
pub mod error;
pub mod kafka;
pub mod policy;
pub mod resolver;

pub mod prelude {
    pub use super::builder::{builder, PartitionsBuilder};
    pub use super::consumer::AssignedConsumer;
    pub use super::deserializer::*;
    pub use super::error::ConsumerError;
    pub use super::kafka::key::PartitionRef;
    pub use super::kafka::message::{Header, Record};
    pub use super::policy::{Isolation, OffsetStartPolicy};
}
