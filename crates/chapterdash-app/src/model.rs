// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::anyhow;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::ChapterPath;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChapterStatus {
    Ok,
    Wrong,
    Missing,
    /// Anything the service reports outside the known set. Kept verbatim so
    /// the value can still be shown and filtered on.
    Unknown(String),
}

impl ChapterStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => "ok",
            Self::Wrong => "wrong",
            Self::Missing => "missing",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "ok" => Self::Ok,
            "wrong" => Self::Wrong,
            "missing" => Self::Missing,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// Counts toward the fixable total.
    pub const fn is_fixable(&self) -> bool {
        matches!(self, Self::Wrong | Self::Missing)
    }

    /// The fix control is enabled for every status except `ok`.
    pub const fn allows_fix(&self) -> bool {
        !matches!(self, Self::Ok)
    }
}

impl Default for ChapterStatus {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<String> for ChapterStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ChapterStatus> for String {
    fn from(value: ChapterStatus) -> Self {
        match value {
            ChapterStatus::Unknown(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Ok,
    Wrong,
    Missing,
}

impl StatusFilter {
    pub const ALL: [Self; 4] = [Self::All, Self::Ok, Self::Wrong, Self::Missing];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Ok => "ok",
            Self::Wrong => "wrong",
            Self::Missing => "missing",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "ok" => Some(Self::Ok),
            "wrong" => Some(Self::Wrong),
            "missing" => Some(Self::Missing),
            _ => None,
        }
    }

    pub fn matches(self, status: &ChapterStatus) -> bool {
        match self {
            Self::All => true,
            Self::Ok => *status == ChapterStatus::Ok,
            Self::Wrong => *status == ChapterStatus::Wrong,
            Self::Missing => *status == ChapterStatus::Missing,
        }
    }

    pub fn rotate(self, delta: isize) -> Self {
        let filters = Self::ALL;
        let current = filters
            .iter()
            .position(|filter| *filter == self)
            .unwrap_or(0) as isize;
        let len = filters.len() as isize;
        filters[(current + delta).rem_euclid(len) as usize]
    }
}

impl FromStr for StatusFilter {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value.trim()).ok_or_else(|| {
            anyhow!("unknown status filter {value:?}; use one of: all, ok, wrong, missing")
        })
    }
}

/// A field the service sends either as a string or as a bare number
/// (volume and chapter numbers parsed from file names).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseValue {
    Text(String),
    Number(f64),
}

impl fmt::Display for LooseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub path: ChapterPath,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub series_url: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_alt_titles")]
    pub alt_titles: Vec<String>,
    #[serde(default)]
    pub parsed_volume: Option<LooseValue>,
    #[serde(default)]
    pub parsed_chapter: Option<LooseValue>,
    #[serde(default)]
    pub comicinfo_date: Option<String>,
    #[serde(default)]
    pub official_date: Option<String>,
    #[serde(default)]
    pub file_mod_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: ChapterStatus,
}

impl ChapterRecord {
    pub fn new(path: impl Into<ChapterPath>, status: ChapterStatus) -> Self {
        Self {
            path: path.into(),
            filename: None,
            title: None,
            series_url: None,
            cover_url: None,
            alt_titles: Vec::new(),
            parsed_volume: None,
            parsed_chapter: None,
            comicinfo_date: None,
            official_date: None,
            file_mod_date: None,
            status,
        }
    }
}

/// `null` for the whole list or for one entry is dropped rather than failing
/// the record.
fn lenient_alt_titles<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let titles = Option::<Vec<Option<String>>>::deserialize(deserializer)?;
    Ok(titles.into_iter().flatten().flatten().collect())
}

fn lenient_status<'de, D>(deserializer: D) -> Result<ChapterStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(ChapterStatus::from)
        .unwrap_or_default())
}

/// Explicit per-record state of a fix control. Separates "nothing to fix"
/// from "a request is already running".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixControl {
    Eligible,
    DisabledOk,
    Busy,
}

impl FixControl {
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Eligible)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkFixState {
    #[default]
    Idle,
    Confirming,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixTarget {
    Chapter(ChapterPath),
    All,
}

impl fmt::Display for FixTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chapter(path) => write!(f, "fix {path}"),
            Self::All => f.write_str("fix all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardFault {
    /// Reading the collection failed; the previous rows are still shown.
    Fetch(String),
    Action { target: FixTarget, message: String },
}

impl DashboardFault {
    pub fn summary(&self) -> String {
        match self {
            Self::Fetch(message) => format!("refresh failed: {message}"),
            Self::Action { target, message } => format!("{target} failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    #[default]
    Nav,
    Search,
}

#[cfg(test)]
mod tests {
    use super::{ChapterRecord, ChapterStatus, LooseValue, StatusFilter};
    use anyhow::Result;

    #[test]
    fn status_decodes_known_and_unknown_values() -> Result<()> {
        let statuses: Vec<ChapterStatus> =
            serde_json::from_str(r#"["ok","wrong","missing","stale"]"#)?;
        assert_eq!(
            statuses,
            vec![
                ChapterStatus::Ok,
                ChapterStatus::Wrong,
                ChapterStatus::Missing,
                ChapterStatus::Unknown("stale".to_owned()),
            ]
        );
        Ok(())
    }

    #[test]
    fn status_fix_rules() {
        assert!(!ChapterStatus::Ok.allows_fix());
        assert!(!ChapterStatus::Ok.is_fixable());
        assert!(ChapterStatus::Wrong.is_fixable());
        assert!(ChapterStatus::Missing.is_fixable());

        let unknown = ChapterStatus::Unknown("stale".to_owned());
        assert!(unknown.allows_fix());
        assert!(!unknown.is_fixable());
    }

    #[test]
    fn record_decodes_sparse_payload() -> Result<()> {
        let record: ChapterRecord = serde_json::from_str(
            r#"{"path":"/lib/a.cbz","status":"wrong","alt_titles":null,"parsed_volume":3,"parsed_chapter":"12.5"}"#,
        )?;
        assert_eq!(record.path.as_str(), "/lib/a.cbz");
        assert_eq!(record.status, ChapterStatus::Wrong);
        assert!(record.alt_titles.is_empty());
        assert_eq!(record.parsed_volume, Some(LooseValue::Number(3.0)));
        assert_eq!(
            record.parsed_chapter.map(|value| value.to_string()),
            Some("12.5".to_owned())
        );
        assert!(record.title.is_none());
        Ok(())
    }

    #[test]
    fn record_without_status_degrades_to_unknown() -> Result<()> {
        let record: ChapterRecord = serde_json::from_str(r#"{"path":"a"}"#)?;
        assert_eq!(record.status, ChapterStatus::Unknown(String::new()));
        Ok(())
    }

    #[test]
    fn null_status_degrades_to_unknown() -> Result<()> {
        let records: Vec<ChapterRecord> = serde_json::from_str(
            r#"[{"path":"a","status":"ok"},{"path":"b","status":null}]"#,
        )?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, ChapterStatus::Ok);
        assert_eq!(records[1].status, ChapterStatus::Unknown(String::new()));
        Ok(())
    }

    #[test]
    fn null_alt_title_entries_are_skipped() -> Result<()> {
        let record: ChapterRecord =
            serde_json::from_str(r#"{"path":"a","status":"ok","alt_titles":["x",null,"y"]}"#)?;
        assert_eq!(record.alt_titles, vec!["x".to_owned(), "y".to_owned()]);
        Ok(())
    }

    #[test]
    fn record_without_path_is_rejected() {
        let result = serde_json::from_str::<ChapterRecord>(r#"{"status":"ok"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn loose_numbers_print_without_trailing_zero() {
        assert_eq!(LooseValue::Number(12.0).to_string(), "12");
        assert_eq!(LooseValue::Number(7.5).to_string(), "7.5");
        assert_eq!(LooseValue::Text("01".to_owned()).to_string(), "01");
    }

    #[test]
    fn status_filter_rotation_wraps() {
        assert_eq!(StatusFilter::Missing.rotate(1), StatusFilter::All);
        assert_eq!(StatusFilter::All.rotate(-1), StatusFilter::Missing);
        assert_eq!(StatusFilter::Ok.rotate(1), StatusFilter::Wrong);
    }

    #[test]
    fn status_filter_from_str_reports_choices() {
        assert_eq!("wrong".parse::<StatusFilter>().ok(), Some(StatusFilter::Wrong));
        let error = "broken"
            .parse::<StatusFilter>()
            .expect_err("unknown filter should fail");
        assert!(error.to_string().contains("all, ok, wrong, missing"));
    }

    #[test]
    fn status_filter_only_matches_known_statuses() {
        let unknown = ChapterStatus::Unknown("stale".to_owned());
        assert!(StatusFilter::All.matches(&unknown));
        assert!(!StatusFilter::Ok.matches(&unknown));
        assert!(StatusFilter::Missing.matches(&ChapterStatus::Missing));
    }
}
