use crate::model::{ForecastBucket, ForecastEntry};

/// Number of upcoming days shown next to today's conditions.
pub const DISPLAY_DAYS: usize = 5;

/// Group forecast samples by calendar date, keeping first-seen order of dates
/// and the original order of entries inside each day.
pub fn group_by_day(entries: Vec<ForecastEntry>) -> Vec<ForecastBucket> {
    let mut buckets: Vec<ForecastBucket> = Vec::new();

    for entry in entries {
        let key = entry.date_key().to_string();
        match buckets.iter_mut().find(|bucket| bucket.date == key) {
            Some(bucket) => bucket.entries.push(entry),
            None => buckets.push(ForecastBucket {
                date: key,
                entries: vec![entry],
            }),
        }
    }

    buckets
}

/// Skip the first bucket (today) and keep at most the next [`DISPLAY_DAYS`].
pub fn select_display_window(buckets: &[ForecastBucket]) -> &[ForecastBucket] {
    let rest = buckets.get(1..).unwrap_or_default();
    &rest[..rest.len().min(DISPLAY_DAYS)]
}
