use crate::consumer::AssignedConsumer;
use crate::deserializer::{BytesDeserializer, Deserializer};
use crate::error::{assignment_error, ConsumerError};
use crate::kafka::config::{ClientProperties, BOOTSTRAP_SERVERS};
use crate::kafka::consumer::{ISession, ITransport, KafkaTransport};
use crate::kafka::key::PartitionRef;
use crate::policy::{Isolation, OffsetStartPolicy};
use crate::resolver;
use log::{error, info};
use std::collections::BTreeSet;
use tokio::task;

/// 指定したパーティションだけを読むコンシューマを組み立てる。
///
/// デフォルトではキー/値ともにバイト列のまま返し、最新のオフセットから読み始める。
#[derive(Clone, Debug)]
pub struct PartitionsBuilder<KD = BytesDeserializer, VD = BytesDeserializer> {
    partitions: BTreeSet<PartitionRef>,
    properties: ClientProperties,
    key_deserializer: KD,
    value_deserializer: VD,
    policy: OffsetStartPolicy,
}

pub fn builder<I>(partitions: I) -> PartitionsBuilder
where
    I: IntoIterator<Item = PartitionRef>,
{
    PartitionsBuilder::new(partitions)
}

impl PartitionsBuilder {
    pub fn new<I>(partitions: I) -> Self
    where
        I: IntoIterator<Item = PartitionRef>,
    {
        Self {
            partitions: partitions.into_iter().collect(),
            properties: ClientProperties::new(),
            key_deserializer: BytesDeserializer,
            value_deserializer: BytesDeserializer,
            policy: OffsetStartPolicy::default(),
        }
    }
}

impl<KD, VD> PartitionsBuilder<KD, VD> {
    fn with_policy(mut self, policy: OffsetStartPolicy) -> Self {
        let (key, value) = policy.auto_offset_reset();
        self.properties.set(key, value);
        self.policy = policy;
        self
    }

    /// 保持されている最も古いレコードから読む。
    pub fn from_beginning(self) -> Self {
        self.with_policy(OffsetStartPolicy::Earliest)
    }

    /// 最新のレコードから読む。デフォルト。
    pub fn from_latest(self) -> Self {
        self.with_policy(OffsetStartPolicy::Latest)
    }

    /// 終端オフセットから`distance`件前から読む。
    ///
    /// 例えば終端オフセットが5で`distance`が2なら、オフセット3から読む。
    pub fn distance_from_latest(self, distance: i64) -> Result<Self, ConsumerError> {
        if distance < 0 {
            return Err(ConsumerError::InvalidArgument(format!(
                "distance from latest must not be negative: {}",
                distance
            )));
        }
        Ok(self.with_policy(OffsetStartPolicy::BehindLatestBy(distance)))
    }

    pub fn key_deserializer<NKD>(self, key_deserializer: NKD) -> PartitionsBuilder<NKD, VD>
    where
        NKD: Deserializer,
    {
        PartitionsBuilder {
            partitions: self.partitions,
            properties: self.properties,
            key_deserializer,
            value_deserializer: self.value_deserializer,
            policy: self.policy,
        }
    }

    pub fn value_deserializer<NVD>(self, value_deserializer: NVD) -> PartitionsBuilder<KD, NVD>
    where
        NVD: Deserializer,
    {
        PartitionsBuilder {
            partitions: self.partitions,
            properties: self.properties,
            key_deserializer: self.key_deserializer,
            value_deserializer,
            policy: self.policy,
        }
    }

    pub fn config<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.properties.set(key, value);
        self
    }

    pub fn configs<I, K, V>(mut self, configs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.properties.extend(configs);
        self
    }

    pub fn bootstrap_servers(self, bootstrap_servers: &str) -> Self {
        self.config(BOOTSTRAP_SERVERS, bootstrap_servers)
    }

    pub fn isolation(self, isolation: Isolation) -> Self {
        let (key, value) = isolation.property();
        self.config(key, value)
    }

    pub fn policy(&self) -> OffsetStartPolicy {
        self.policy
    }

    pub fn properties(&self) -> &ClientProperties {
        &self.properties
    }

    pub fn partitions(&self) -> &BTreeSet<PartitionRef> {
        &self.partitions
    }
}

impl<KD, VD> PartitionsBuilder<KD, VD>
where
    KD: Deserializer,
    VD: Deserializer,
{
    /// kafkaに接続し、パーティションを割り当て、開始オフセットを確定させる。
    ///
    /// ネットワークI/Oでブロックする。非同期コンテキストからは[PartitionsBuilder::build_async]を使う。
    pub fn build(self) -> Result<AssignedConsumer<KD, VD>, ConsumerError> {
        self.build_with(&KafkaTransport::default())
    }

    pub fn build_with<T>(
        self,
        transport: &T,
    ) -> Result<AssignedConsumer<KD, VD, T::Session>, ConsumerError>
    where
        T: ITransport,
    {
        if self.partitions.is_empty() {
            return Err(assignment_error!("no partitions to assign"));
        }
        let partitions = self.partitions.into_iter().collect::<Vec<_>>();

        let mut session = transport.open(&self.properties).map_err(|e| {
            error!("Failed to open session.({})", e);
            ConsumerError::TransportOpen(e)
        })?;
        if let Err(e) = prepare(&mut session, &partitions, self.policy) {
            session.close();
            return Err(e);
        }
        info!(
            "Assigned partitions.(count={}, policy={:?})",
            partitions.len(),
            self.policy
        );
        Ok(AssignedConsumer::new(
            session,
            partitions,
            self.key_deserializer,
            self.value_deserializer,
        ))
    }

    /// [PartitionsBuilder::build]をブロッキング用のスレッドで実行する。
    pub async fn build_async(self) -> Result<AssignedConsumer<KD, VD>, ConsumerError> {
        self.build_async_with(KafkaTransport::default()).await
    }

    pub async fn build_async_with<T>(
        self,
        transport: T,
    ) -> Result<AssignedConsumer<KD, VD, T::Session>, ConsumerError>
    where
        T: ITransport + Send + 'static,
        T::Session: 'static,
    {
        task::spawn_blocking(move || self.build_with(&transport)).await?
    }
}

fn prepare<S>(
    session: &mut S,
    partitions: &[PartitionRef],
    policy: OffsetStartPolicy,
) -> Result<(), ConsumerError>
where
    S: ISession,
{
    session.assign(partitions).map_err(|e| {
        error!("Failed to assign partitions.({})", e);
        assignment_error!("failed to assign partitions", e)
    })?;
    // Earliest and Latest are handled by the transport through auto.offset.reset.
    if let OffsetStartPolicy::BehindLatestBy(distance) = policy {
        resolver::resolve(session, partitions, distance)?;
    }
    Ok(())
}
