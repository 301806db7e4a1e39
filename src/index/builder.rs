use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::record::{file_stem_of, Record};

/// Default number of displayed entries, placeholder included.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Base names of documents that have a companion markdown note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftSet {
    stems: HashSet<String>,
}

impl DraftSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a markdown path such as `140A015N0000000000100.md`; the stem is stored.
    pub fn insert_path(&mut self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        self.stems.insert(file_stem_of(name).to_string())
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.stems.contains(stem)
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for DraftSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = DraftSet::new();
        for path in iter {
            set.insert_path(path.as_ref());
        }
        set
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexOptions {
    /// Displayed entries including the placeholder.
    pub max_entries: usize,
    /// When set, only rows whose category equals this value are kept.
    pub category_filter: Option<String>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            category_filter: None,
        }
    }
}

impl IndexOptions {
    fn row_limit(&self) -> usize {
        self.max_entries.max(1) - 1
    }

    fn accepts(&self, record: &Record) -> bool {
        match &self.category_filter {
            Some(category) => record.category == *category,
            None => true,
        }
    }
}

/// Ordered, capped list of records. The first entry is always the placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    records: Vec<Record>,
    dropped_by_filter: usize,
}

impl Index {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Record> {
        self.records.get(idx)
    }

    pub fn find(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn draft_count(&self) -> usize {
        self.records.iter().filter(|record| record.draft).count()
    }

    /// Rows skipped because of the category filter before the cap was reached.
    pub fn dropped_by_filter(&self) -> usize {
        self.dropped_by_filter
    }
}

impl Default for Index {
    fn default() -> Self {
        Self {
            records: vec![Record::placeholder()],
            dropped_by_filter: 0,
        }
    }
}

/// Flags drafts, moves them ahead of regular rows and caps the result.
///
/// Rows are consumed in source order until `max_entries - 1` have been
/// accepted; rows rejected by the category filter do not count toward the
/// cap. Drafts keep their relative source order, as do regular rows.
pub fn build_index<I>(rows: I, drafts: &DraftSet, options: &IndexOptions) -> Index
where
    I: IntoIterator<Item = Record>,
{
    let limit = options.row_limit();
    let mut draft_rows = Vec::new();
    let mut regular_rows = Vec::new();
    let mut dropped_by_filter = 0;

    for mut record in rows {
        if draft_rows.len() + regular_rows.len() >= limit {
            break;
        }
        if !options.accepts(&record) {
            dropped_by_filter += 1;
            continue;
        }
        if drafts.contains(record.file_stem()) {
            record.draft = true;
            draft_rows.push(record);
        } else {
            record.draft = false;
            regular_rows.push(record);
        }
    }

    if dropped_by_filter > 0 {
        tracing::debug!(dropped_by_filter, "category filter skipped index rows");
    }

    let mut records = Vec::with_capacity(1 + draft_rows.len() + regular_rows.len());
    records.push(Record::placeholder());
    records.extend(draft_rows);
    records.extend(regular_rows);
    Index {
        records,
        dropped_by_filter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(id: &str, title: &str, category: &str) -> Record {
        Record {
            id: id.to_string(),
            url: format!("https://example.org/pdf/{id}.pdf"),
            date: "1".into(),
            title: title.to_string(),
            volume: "140".into(),
            part: "1".into(),
            category: category.to_string(),
            page: "1".into(),
            volume_number: "1".into(),
            draft: false,
        }
    }

    #[test]
    fn prepends_placeholder_to_rows() {
        let rows = vec![row("a", "one", "ก"), row("b", "two", "ก"), row("c", "three", "ข")];
        let index = build_index(rows, &DraftSet::new(), &IndexOptions::default());
        assert_eq!(index.len(), 4);
        assert!(index.records()[0].is_placeholder());
        let ids: Vec<_> = index.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["this-is-demo-file", "a", "b", "c"]);
        assert_eq!(index.draft_count(), 0);
    }

    #[test]
    fn drafts_are_flagged_and_moved_first() {
        let rows = vec![row("a", "one", "ก"), row("b", "two", "ก"), row("c", "three", "ก")];
        let drafts: DraftSet = ["entries/c.md", "b.md"].into_iter().collect();
        let index = build_index(rows, &drafts, &IndexOptions::default());
        let ids: Vec<_> = index.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["this-is-demo-file", "b", "c", "a"]);
        assert!(index.find("b").map(|r| r.draft).unwrap_or(false));
        assert!(index.find("c").map(|r| r.draft).unwrap_or(false));
        assert!(!index.find("a").map(|r| r.draft).unwrap_or(true));
    }

    #[test]
    fn caps_output_at_max_entries() {
        let rows = (0..250).map(|i| row(&format!("r{i}"), "t", "ก"));
        let index = build_index(rows, &DraftSet::new(), &IndexOptions::default());
        assert_eq!(index.len(), 100);
        assert_eq!(index.records()[99].id, "r98");
    }

    #[test]
    fn category_filter_drops_rows_without_counting_them() {
        let options = IndexOptions {
            max_entries: 3,
            category_filter: Some("ก".into()),
        };
        let rows = vec![
            row("a", "one", "ข"),
            row("b", "two", "ก"),
            row("c", "three", "ค"),
            row("d", "four", "ก"),
            row("e", "five", "ก"),
        ];
        let index = build_index(rows, &DraftSet::new(), &options);
        let ids: Vec<_> = index.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["this-is-demo-file", "b", "d"]);
        assert_eq!(index.dropped_by_filter(), 2);
    }

    #[test]
    fn draft_set_stores_stems() {
        let drafts: DraftSet = ["entries/140A015N0000000000100.md"].into_iter().collect();
        assert!(drafts.contains("140A015N0000000000100"));
        assert!(!drafts.contains("140A015N0000000000100.md"));
        assert_eq!(drafts.len(), 1);
    }

    proptest! {
        #[test]
        fn index_is_capped_and_starts_with_placeholder(
            count in 0usize..300,
            draft_every in 1usize..10,
        ) {
            let rows: Vec<_> = (0..count).map(|i| row(&format!("r{i}"), "t", "ก")).collect();
            let drafts: DraftSet = (0..count)
                .filter(|i| i % draft_every == 0)
                .map(|i| format!("r{i}.md"))
                .collect();
            let index = build_index(rows, &drafts, &IndexOptions::default());
            prop_assert!(index.len() <= 100);
            prop_assert!(index.records()[0].is_placeholder());
        }

        #[test]
        fn drafts_precede_regular_rows(flags in proptest::collection::vec(any::<bool>(), 0..150)) {
            let rows: Vec<_> = (0..flags.len()).map(|i| row(&format!("r{i}"), "t", "ก")).collect();
            let drafts: DraftSet = flags
                .iter()
                .enumerate()
                .filter(|(_, flag)| **flag)
                .map(|(i, _)| format!("r{i}.md"))
                .collect();
            let index = build_index(rows, &drafts, &IndexOptions::default());
            let body = &index.records()[1..];
            for record in body {
                prop_assert_eq!(record.draft, drafts.contains(record.file_stem()));
            }
            if let Some(first_regular) = body.iter().position(|r| !r.draft) {
                prop_assert!(body[first_regular..].iter().all(|r| !r.draft));
            }
        }
    }
}
