use anyhow::Result;
use assigned_consumer::prelude::*;
use clap::Parser;
use std::time::Duration;

/// Print the last records of the given partitions.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(long, default_value = "localhost:9092")]
    bootstrap_servers: String,
    #[clap(long)]
    topic: String,
    #[clap(long = "partition", required = true)]
    partitions: Vec<i32>,
    #[clap(long, default_value_t = 10)]
    distance: i64,
    #[clap(long, default_value_t = 5000)]
    timeout_ms: u64,
    #[clap(long)]
    read_committed: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let isolation = if args.read_committed {
        Isolation::ReadCommitted
    } else {
        Isolation::ReadUncommitted
    };
    let mut consumer = builder(
        args.partitions
            .iter()
            .map(|p| PartitionRef::new(&args.topic, *p)),
    )
    .bootstrap_servers(&args.bootstrap_servers)
    .isolation(isolation)
    .key_deserializer(StringDeserializer)
    .value_deserializer(StringDeserializer)
    .distance_from_latest(args.distance)?
    .build()?;

    loop {
        let records = consumer.poll(Duration::from_millis(args.timeout_ms))?;
        if records.is_empty() {
            break;
        }
        for record in records {
            println!(
                "{}@{} key={:?} value={:?}",
                record.partition_ref(),
                record.offset(),
                record.key(),
                record.value()
            );
        }
    }
    consumer.close();
    Ok(())
}
