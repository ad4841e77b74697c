use std::collections::BTreeMap;

use crate::types::{Dated, TimelineBucket};

/// Groups entries by calendar day, ascending, with undatable entries in a
/// single trailing `unknown` bucket. Entries keep their input order within a
/// bucket.
pub fn assemble_timeline<T: Dated>(entries: impl IntoIterator<Item = T>) -> Vec<TimelineBucket<T>> {
    let mut by_date = BTreeMap::new();
    for entry in entries {
        by_date
            .entry(entry.bucket_date())
            .or_insert_with(Vec::new)
            .push(entry);
    }

    by_date
        .into_iter()
        .map(|(date, events)| TimelineBucket { date, events })
        .collect()
}
