// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::ids::ChapterPath;
use crate::model::ChapterRecord;

/// A collection as returned by one successful read of the chapter service.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterLoad {
    pub records: Vec<ChapterRecord>,
    pub loaded_at: OffsetDateTime,
}

/// Last-fetched chapter collection. Only ever replaced wholesale.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChapterStore {
    records: Vec<ChapterRecord>,
    loaded_at: Option<OffsetDateTime>,
}

impl ChapterStore {
    pub fn records(&self) -> &[ChapterRecord] {
        &self.records
    }

    pub fn loaded_at(&self) -> Option<OffsetDateTime> {
        self.loaded_at
    }

    pub fn find(&self, path: &ChapterPath) -> Option<&ChapterRecord> {
        self.records.iter().find(|record| &record.path == path)
    }

    pub fn replace(&mut self, load: ChapterLoad) {
        self.records = load.records;
        self.loaded_at = Some(load.loaded_at);
    }
}
