use crate::kafka::config::{AUTO_OFFSET_RESET, ISOLATION_LEVEL};

/// 最初のpollでどこから読み始めるか。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OffsetStartPolicy {
    Earliest,
    #[default]
    Latest,
    /// 各パーティションの終端オフセットから`distance`件前。
    BehindLatestBy(i64),
}

impl OffsetStartPolicy {
    /// Value written to `auto.offset.reset`.
    ///
    /// `BehindLatestBy` falls back to the oldest retained record when its seek target
    /// was already deleted by retention.
    pub(crate) fn auto_offset_reset(&self) -> (&'static str, &'static str) {
        match self {
            OffsetStartPolicy::Earliest | OffsetStartPolicy::BehindLatestBy(_) => {
                (AUTO_OFFSET_RESET, "earliest")
            }
            OffsetStartPolicy::Latest => (AUTO_OFFSET_RESET, "latest"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Isolation {
    #[default]
    ReadUncommitted,
    ReadCommitted,
}

impl Isolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Isolation::ReadUncommitted => "read_uncommitted",
            Isolation::ReadCommitted => "read_committed",
        }
    }

    pub(crate) fn property(&self) -> (&'static str, &'static str) {
        (ISOLATION_LEVEL, self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(OffsetStartPolicy::default(), OffsetStartPolicy::Latest);
        assert_eq!(Isolation::default(), Isolation::ReadUncommitted);
    }

    #[test]
    fn test_auto_offset_reset() {
        assert_eq!(
            OffsetStartPolicy::Earliest.auto_offset_reset(),
            ("auto.offset.reset", "earliest")
        );
        assert_eq!(
            OffsetStartPolicy::BehindLatestBy(3).auto_offset_reset(),
            ("auto.offset.reset", "earliest")
        );
        assert_eq!(
            OffsetStartPolicy::Latest.auto_offset_reset(),
            ("auto.offset.reset", "latest")
        );
    }

    #[test]
    fn test_isolation_property() {
        assert_eq!(
            Isolation::ReadCommitted.property(),
            ("isolation.level", "read_committed")
        );
    }
}
