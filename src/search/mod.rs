use crate::index::Record;

/// Records whose title contains `query` verbatim, in index order.
///
/// Matching is a literal, case-sensitive substring test on the title; Thai
/// text is compared exactly as stored. An empty query keeps every record.
pub fn filter_by_title<'a>(records: &'a [Record], query: &str) -> Vec<&'a Record> {
    if query.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|record| record.title.contains(query))
        .collect()
}

/// Positions (into `records`) of the matches, for list selection bookkeeping.
pub fn matching_positions(records: &[Record], query: &str) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| query.is_empty() || record.title.contains(query))
        .map(|(idx, _)| idx)
        .collect()
}
