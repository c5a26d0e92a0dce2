//! `BehindLatestBy`を各パーティションのseek先に変換する。
use crate::error::{offset_query_error, ConsumerError};
use crate::kafka::consumer::ISession;
use crate::kafka::key::{Offset, PartitionRef};
use log::{debug, error};
use std::collections::HashMap;

/// `max(0, end - distance)`
pub fn seek_target(end: Offset, distance: i64) -> Offset {
    end.saturating_sub(distance).max(0)
}

/// 終端オフセットを1回のリクエストでまとめて取得し、全パーティションのseek先が決まってからseekする。
///
/// 1つでも終端オフセットが得られなければ、どのパーティションもseekせずに失敗する。
pub fn resolve<S>(
    session: &mut S,
    partitions: &[PartitionRef],
    distance: i64,
) -> Result<HashMap<PartitionRef, Offset>, ConsumerError>
where
    S: ISession + ?Sized,
{
    let end_offsets = session.end_offsets(partitions).map_err(|e| {
        error!("Failed to query end offsets.({})", e);
        offset_query_error!("failed to query end offsets", e)
    })?;

    let mut targets = HashMap::with_capacity(partitions.len());
    for partition in partitions {
        let end = match end_offsets.get(partition) {
            Some(end) => *end,
            None => {
                error!("End offset is missing.(partition={})", partition);
                return Err(offset_query_error!(format!(
                    "end offset of {} is missing",
                    partition
                )));
            }
        };
        targets.insert(partition.clone(), seek_target(end, distance));
    }

    for partition in partitions {
        let offset = targets[partition];
        session
            .seek(partition, offset)
            .map_err(|source| ConsumerError::Seek {
                partition: partition.clone(),
                offset,
                source,
            })?;
        debug!("Seeked.(partition={}, offset={})", partition, offset);
    }
    Ok(targets)
}
