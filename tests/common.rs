use rdkafka::producer::{BaseProducer, BaseRecord, Producer};
use rdkafka::ClientConfig;
use std::time::Duration;

pub const BOOTSTRAP_SERVERS: &str = "localhost:9092";

pub fn create_producer() -> BaseProducer {
    ClientConfig::new()
        .set("bootstrap.servers", BOOTSTRAP_SERVERS)
        .create()
        .unwrap()
}

pub fn produce(topic: &str, partition: i32, count: usize) {
    let producer = create_producer();
    for n in 0..count {
        producer
            .send(
                BaseRecord::<str, str>::to(topic)
                    .partition(partition)
                    .payload(format!("test_message: {}", n).as_str()),
            )
            .unwrap();
    }
    producer.flush(Duration::from_secs(10)).unwrap();
}
