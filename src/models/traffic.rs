//! Per-client usage accounting and its aggregation across a subscription

use serde::{Deserialize, Serialize};

/// Usage record for one client.
///
/// `total == 0` means the quota is unlimited; `expiry_time == 0` means the
/// client never expires. `expiry_time` is in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientTraffic {
    pub email: String,
    pub up: i64,
    pub down: i64,
    pub total: i64,
    pub expiry_time: i64,
}

impl ClientTraffic {
    /// Fold `other` into `self`.
    ///
    /// Up/down always add, saturating at the `i64` bounds. The total stays
    /// unlimited once either side is unlimited. The expiry survives only if
    /// both sides agree on it.
    pub fn merge(&mut self, other: &ClientTraffic) {
        self.up = self.up.saturating_add(other.up);
        self.down = self.down.saturating_add(other.down);
        if self.total == 0 || other.total == 0 {
            self.total = 0;
        } else {
            self.total = self.total.saturating_add(other.total);
        }
        if self.expiry_time != other.expiry_time {
            self.expiry_time = 0;
        }
    }

    /// Aggregate all records into one summary.
    ///
    /// The first record seeds the summary as-is. An empty input yields a
    /// zero-valued summary.
    pub fn aggregate<'a, I>(records: I) -> ClientTraffic
    where
        I: IntoIterator<Item = &'a ClientTraffic>,
    {
        let mut records = records.into_iter();
        let Some(first) = records.next() else {
            return ClientTraffic::default();
        };
        records.fold(first.clone(), |mut acc, record| {
            acc.merge(record);
            acc
        })
    }

    /// Expiry in whole seconds, truncated.
    pub fn expiry_secs(&self) -> i64 {
        self.expiry_time / 1000
    }
}
