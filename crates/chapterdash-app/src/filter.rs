// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{ChapterRecord, LooseValue, StatusFilter};

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome<'a> {
    /// Matching records in collection order.
    pub visible: Vec<&'a ChapterRecord>,
    /// `wrong`/`missing` records among `visible`.
    pub fixable_count: usize,
}

/// Applies the search text and status filter to a collection. Pure: the same
/// inputs always produce the same rows in the same order.
pub fn filter_chapters<'a>(
    records: &'a [ChapterRecord],
    search: &str,
    status_filter: StatusFilter,
) -> FilterOutcome<'a> {
    let needle = search.trim().to_lowercase();
    let mut visible = Vec::new();
    let mut fixable_count = 0;

    for record in records {
        if !needle.is_empty() && !search_haystack(record).contains(&needle) {
            continue;
        }
        if !status_filter.matches(&record.status) {
            continue;
        }
        if record.status.is_fixable() {
            fixable_count += 1;
        }
        visible.push(record);
    }

    FilterOutcome {
        visible,
        fixable_count,
    }
}

/// Lowercased, space-joined text the search box matches against. Absent
/// fields contribute an empty segment so the separators stay stable.
pub fn search_haystack(record: &ChapterRecord) -> String {
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();
    let loose = |value: &Option<LooseValue>| {
        value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    };

    [
        optional(&record.title),
        record.alt_titles.join(" "),
        optional(&record.filename),
        loose(&record.parsed_volume),
        loose(&record.parsed_chapter),
        optional(&record.comicinfo_date),
        optional(&record.official_date),
        optional(&record.file_mod_date),
    ]
    .join(" ")
    .to_lowercase()
}
