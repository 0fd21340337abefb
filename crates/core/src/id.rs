// Article identifier generation
//
// Identifiers are submission timestamps with microsecond resolution. The
// generator never hands out the same timestamp twice: if the clock has not
// advanced past the previous identifier it is bumped by one microsecond.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use parking_lot::Mutex;

/// Timestamp-derived article identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArticleId(DateTime<Utc>);

impl ArticleId {
    /// `YYYYmmddHHMMSSffffff`
    pub fn stamp(&self) -> String {
        self.0.format("%Y%m%d%H%M%S%6f").to_string()
    }

    /// Index filename, also the delete key: `news_<stamp>.json`
    pub fn filename(&self) -> String {
        format!("news_{}.json", self.stamp())
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Monotonic identifier source shared by all saves in a process
#[derive(Debug, Default)]
pub struct ArticleIdGenerator {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl ArticleIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> ArticleId {
        self.next_at(Utc::now())
    }

    /// Next identifier given the current time
    pub fn next_at(&self, now: DateTime<Utc>) -> ArticleId {
        let mut last = self.last.lock();
        let mut ts = now.trunc_subsecs(6);
        if let Some(prev) = *last {
            if ts <= prev {
                ts = prev + Duration::microseconds(1);
            }
        }
        *last = Some(ts);
        ArticleId(ts)
    }
}
