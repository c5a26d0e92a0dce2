use crate::deserializer::Deserializer;
use crate::error::ConsumerError;
use crate::kafka::consumer::{ISession, KafkaSession};
use crate::kafka::key::{key, Offset, PartitionRef};
use crate::kafka::message::Record;
use log::{debug, error, info};
use rdkafka::message::{Message, OwnedMessage};
use std::time::Duration;

/// 1回の[AssignedConsumer::poll]で返す最大レコード数
pub const MAX_POLL_RECORDS: usize = 500;

/// パーティションの割り当てと開始オフセットが確定済みのコンシューマ。
///
/// 割り当ての変更や開始オフセットの再計算はできない。スレッド間で共有する場合は呼び出し側で直列化すること。
pub struct AssignedConsumer<KD, VD, S = KafkaSession>
where
    S: ISession,
{
    session: S,
    assignments: Vec<PartitionRef>,
    key_deserializer: KD,
    value_deserializer: VD,
    pending_error: Option<ConsumerError>,
    closed: bool,
}

impl<KD, VD, S> AssignedConsumer<KD, VD, S>
where
    KD: Deserializer,
    VD: Deserializer,
    S: ISession,
{
    pub(crate) fn new(
        session: S,
        assignments: Vec<PartitionRef>,
        key_deserializer: KD,
        value_deserializer: VD,
    ) -> Self {
        Self {
            session,
            assignments,
            key_deserializer,
            value_deserializer,
            pending_error: None,
            closed: false,
        }
    }

    /// 最大`timeout`だけ最初のレコードを待ち、その後すでに届いているレコードをまとめて返す。
    ///
    /// 途中でエラーが起きた場合はそれまでのレコードを返し、エラーは次のpollで返す。
    pub fn poll(
        &mut self,
        timeout: Duration,
    ) -> Result<Vec<Record<KD::Output, VD::Output>>, ConsumerError> {
        if self.closed {
            return Err(ConsumerError::Closed);
        }
        if let Some(e) = self.pending_error.take() {
            return Err(e);
        }
        let mut records = vec![];
        let mut failure = None;
        let mut wait = timeout;
        while records.len() < MAX_POLL_RECORDS {
            match self.session.poll(wait) {
                Some(Ok(msg)) => match self.decode(msg) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                },
                Some(Err(e)) => {
                    error!("KafkaError occurred.({})", e);
                    failure = Some(ConsumerError::Poll(e));
                    break;
                }
                None => break,
            }
            wait = Duration::ZERO;
        }
        if let Some(e) = failure {
            if records.is_empty() {
                return Err(e);
            }
            // Deliver what was already taken from the session; report the error next time.
            self.pending_error = Some(e);
        }
        debug!("Polled {} records.", records.len());
        Ok(records)
    }

    fn decode(&self, msg: OwnedMessage) -> Result<Record<KD::Output, VD::Output>, ConsumerError> {
        Record::decode(&msg, &self.key_deserializer, &self.value_deserializer).map_err(|source| {
            ConsumerError::Decode {
                partition: key!(msg),
                offset: msg.offset(),
                source,
            }
        })
    }

    /// 読み込み済みの位置を同期的にコミットする。
    pub fn commit(&mut self) -> Result<(), ConsumerError> {
        if self.closed {
            return Err(ConsumerError::Closed);
        }
        self.session.commit().map_err(ConsumerError::Commit)
    }

    pub fn commit_offset(
        &mut self,
        partition: &PartitionRef,
        offset: Offset,
    ) -> Result<(), ConsumerError> {
        if self.closed {
            return Err(ConsumerError::Closed);
        }
        self.session
            .commit_offset(partition, offset)
            .map_err(ConsumerError::Commit)
    }

    pub fn assignments(&self) -> &[PartitionRef] {
        &self.assignments
    }
}

impl<KD, VD, S> AssignedConsumer<KD, VD, S>
where
    S: ISession,
{
    /// セッションを解放する。何度呼んでもよい。
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.session.close();
        info!("Closed consumer.(assignments={})", self.assignments.len());
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<KD, VD, S> Drop for AssignedConsumer<KD, VD, S>
where
    S: ISession,
{
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserializer::{I32Deserializer, StringDeserializer};
    use crate::kafka::config::ClientProperties;
    use crate::kafka::consumer::testing::{MockSession, MockTransport};
    use crate::kafka::consumer::ITransport;
    use crate::kafka::message::testing::create_message;
    use rdkafka::error::KafkaError;
    use rdkafka::types::RDKafkaErrorCode;

    fn create_consumer(
        transport: &MockTransport,
    ) -> AssignedConsumer<I32Deserializer, StringDeserializer, MockSession> {
        let session = transport.open(&ClientProperties::new()).unwrap();
        AssignedConsumer::new(
            session,
            vec![PartitionRef::new("topic1", 0)],
            I32Deserializer,
            StringDeserializer,
        )
    }

    #[test]
    fn test_poll_drains_buffered_records() {
        let transport = MockTransport::new(&[("topic1", 0, 2)]);
        transport.with(|state| {
            state.messages.push_back(Ok(create_message(
                "topic1",
                0,
                0,
                Some(&1i32.to_be_bytes()),
                Some(b"message1"),
                &[],
            )));
            state.messages.push_back(Ok(create_message(
                "topic1",
                0,
                1,
                None,
                Some(b"message2"),
                &[],
            )));
        });
        let mut consumer = create_consumer(&transport);

        let records = consumer.poll(Duration::from_secs(1)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key(), Some(&1));
        assert_eq!(records[0].value().unwrap(), "message1");
        assert_eq!(records[1].offset(), 1);
        assert!(records[1].key().is_none());

        let records = consumer.poll(Duration::from_secs(1)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_poll_passes_transport_error_through() {
        let transport = MockTransport::new(&[("topic1", 0, 0)]);
        transport.with(|state| {
            state
                .messages
                .push_back(Err(KafkaError::MessageConsumption(
                    RDKafkaErrorCode::BrokerTransportFailure,
                )))
        });
        let mut consumer = create_consumer(&transport);

        match consumer.poll(Duration::from_secs(1)) {
            Err(ConsumerError::Poll(e)) => assert_eq!(
                e,
                KafkaError::MessageConsumption(RDKafkaErrorCode::BrokerTransportFailure)
            ),
            _ => panic!("expected poll error"),
        }
    }

    #[test]
    fn test_poll_reports_decode_failure() {
        let transport = MockTransport::new(&[("topic1", 0, 1)]);
        transport.with(|state| {
            state.messages.push_back(Ok(create_message(
                "topic1",
                0,
                0,
                Some(b"bad"),
                None,
                &[],
            )))
        });
        let mut consumer = create_consumer(&transport);

        match consumer.poll(Duration::from_secs(1)) {
            Err(ConsumerError::Decode {
                partition, offset, ..
            }) => {
                assert_eq!(partition, PartitionRef::new("topic1", 0));
                assert_eq!(offset, 0);
            }
            _ => panic!("expected decode error"),
        }
    }

    #[test]
    fn test_poll_keeps_records_taken_before_decode_failure() {
        let transport = MockTransport::new(&[("topic1", 0, 3)]);
        transport.with(|state| {
            state.messages.push_back(Ok(create_message(
                "topic1",
                0,
                0,
                Some(&1i32.to_be_bytes()),
                Some(b"message1"),
                &[],
            )));
            state.messages.push_back(Ok(create_message(
                "topic1",
                0,
                1,
                Some(&2i32.to_be_bytes()),
                Some(b"message2"),
                &[],
            )));
            state.messages.push_back(Ok(create_message(
                "topic1",
                0,
                2,
                Some(b"bad"),
                Some(b"message3"),
                &[],
            )));
        });
        let mut consumer = create_consumer(&transport);

        let records = consumer.poll(Duration::from_secs(1)).unwrap();
        assert_eq!(
            records.iter().map(|r| r.offset()).collect::<Vec<_>>(),
            vec![0, 1]
        );

        match consumer.poll(Duration::from_secs(1)) {
            Err(ConsumerError::Decode { offset, .. }) => assert_eq!(offset, 2),
            _ => panic!("expected decode error"),
        }
        assert!(consumer.poll(Duration::from_secs(1)).unwrap().is_empty());
    }

    #[test]
    fn test_poll_keeps_records_taken_before_transport_error() {
        let transport = MockTransport::new(&[("topic1", 0, 1)]);
        transport.with(|state| {
            state.messages.push_back(Ok(create_message(
                "topic1",
                0,
                0,
                None,
                Some(b"message1"),
                &[],
            )));
            state
                .messages
                .push_back(Err(KafkaError::MessageConsumption(
                    RDKafkaErrorCode::BrokerTransportFailure,
                )));
        });
        let mut consumer = create_consumer(&transport);

        assert_eq!(consumer.poll(Duration::from_secs(1)).unwrap().len(), 1);
        assert!(matches!(
            consumer.poll(Duration::from_secs(1)),
            Err(ConsumerError::Poll(_))
        ));
    }

    #[test]
    fn test_commit() {
        let transport = MockTransport::new(&[("topic1", 0, 1)]);
        let mut consumer = create_consumer(&transport);
        consumer.commit().unwrap();
        consumer
            .commit_offset(&PartitionRef::new("topic1", 0), 1)
            .unwrap();
        transport.with(|state| {
            assert_eq!(
                state.commits,
                vec![None, Some((PartitionRef::new("topic1", 0), 1))]
            )
        });
    }

    #[test]
    fn test_close_twice_releases_once() {
        let transport = MockTransport::new(&[("topic1", 0, 1)]);
        let mut consumer = create_consumer(&transport);
        consumer.close();
        consumer.close();
        assert!(consumer.is_closed());
        assert!(matches!(
            consumer.poll(Duration::from_secs(1)),
            Err(ConsumerError::Closed)
        ));
        assert!(matches!(consumer.commit(), Err(ConsumerError::Closed)));
        drop(consumer);
        transport.with(|state| assert_eq!(state.closes, 1));
    }

    #[test]
    fn test_drop_closes_session() {
        let transport = MockTransport::new(&[("topic1", 0, 1)]);
        {
            let consumer = create_consumer(&transport);
            assert_eq!(consumer.assignments(), &[PartitionRef::new("topic1", 0)]);
        }
        transport.with(|state| assert_eq!(state.closes, 1));
    }
}
