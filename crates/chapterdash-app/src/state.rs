// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::filter::{FilterOutcome, filter_chapters};
use crate::ids::ChapterPath;
use crate::model::{
    AppMode, BulkFixState, ChapterRecord, DashboardFault, FixControl, FixTarget, StatusFilter,
};
use crate::store::{ChapterLoad, ChapterStore};

/// Outbound call the runtime must perform on behalf of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRequest {
    FetchChapters { request_id: u64 },
    FixChapter { path: ChapterPath },
    FixAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixPhase {
    Requesting,
    /// The fix settled; the row stays busy until this refresh lands.
    AwaitingRefresh { refresh_id: u64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub mode: AppMode,
    pub search: String,
    pub status_filter: StatusFilter,
    pub store: ChapterStore,
    pub bulk: BulkFixState,
    pub fault: Option<DashboardFault>,
    pub status_line: Option<String>,
    in_flight: BTreeMap<ChapterPath, FixPhase>,
    next_refresh_id: u64,
    pending_refreshes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Refresh,
    RefreshSettled {
        request_id: u64,
        result: Result<ChapterLoad, String>,
    },
    EnterSearch,
    ExitSearch,
    PushSearchChar(char),
    PopSearchChar,
    ClearSearch,
    SetStatusFilter(StatusFilter),
    NextStatusFilter,
    PrevStatusFilter,
    ActivateFix(ChapterPath),
    FixSettled {
        path: ChapterPath,
        result: Result<(), String>,
    },
    OpenFixAll,
    CancelFixAll,
    ConfirmFixAll,
    FixAllSettled {
        result: Result<(), String>,
    },
    DismissFault,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    RequestIssued(RemoteRequest),
    ChaptersReplaced { count: usize },
    ModeChanged(AppMode),
    SearchChanged(String),
    StatusFilterChanged(StatusFilter),
    FixControlChanged {
        path: ChapterPath,
        control: FixControl,
    },
    BulkFixChanged(BulkFixState),
    FaultRaised(DashboardFault),
    FaultCleared,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn with_status_filter(status_filter: StatusFilter) -> Self {
        Self {
            status_filter,
            ..Self::default()
        }
    }

    /// Rows that pass the current search and status filter.
    pub fn visible(&self) -> FilterOutcome<'_> {
        filter_chapters(self.store.records(), &self.search, self.status_filter)
    }

    pub fn fix_control(&self, path: &ChapterPath) -> Option<FixControl> {
        self.store
            .find(path)
            .map(|record| self.fix_control_for(record))
    }

    pub fn fix_control_for(&self, record: &ChapterRecord) -> FixControl {
        if self.in_flight.contains_key(&record.path) {
            FixControl::Busy
        } else if record.status.allows_fix() {
            FixControl::Eligible
        } else {
            FixControl::DisabledOk
        }
    }

    pub fn fixes_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_refreshing(&self) -> bool {
        self.pending_refreshes > 0
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::Refresh => vec![self.issue_refresh().0],
            AppCommand::RefreshSettled { request_id, result } => {
                self.settle_refresh(request_id, result)
            }
            AppCommand::EnterSearch => self.set_mode(AppMode::Search),
            AppCommand::ExitSearch => self.set_mode(AppMode::Nav),
            AppCommand::PushSearchChar(ch) => {
                self.search.push(ch);
                vec![AppEvent::SearchChanged(self.search.clone())]
            }
            AppCommand::PopSearchChar => {
                if self.search.pop().is_none() {
                    return Vec::new();
                }
                vec![AppEvent::SearchChanged(self.search.clone())]
            }
            AppCommand::ClearSearch => {
                if self.search.is_empty() {
                    return Vec::new();
                }
                self.search.clear();
                vec![AppEvent::SearchChanged(String::new())]
            }
            AppCommand::SetStatusFilter(filter) => self.set_status_filter(filter),
            AppCommand::NextStatusFilter => self.set_status_filter(self.status_filter.rotate(1)),
            AppCommand::PrevStatusFilter => self.set_status_filter(self.status_filter.rotate(-1)),
            AppCommand::ActivateFix(path) => self.activate_fix(path),
            AppCommand::FixSettled { path, result } => self.settle_fix(path, result),
            AppCommand::OpenFixAll => {
                if self.bulk != BulkFixState::Idle {
                    return Vec::new();
                }
                self.bulk = BulkFixState::Confirming;
                vec![AppEvent::BulkFixChanged(self.bulk)]
            }
            AppCommand::CancelFixAll => {
                if self.bulk != BulkFixState::Confirming {
                    return Vec::new();
                }
                self.bulk = BulkFixState::Idle;
                vec![AppEvent::BulkFixChanged(self.bulk)]
            }
            AppCommand::ConfirmFixAll => {
                if self.bulk != BulkFixState::Confirming {
                    return Vec::new();
                }
                self.bulk = BulkFixState::Busy;
                vec![
                    AppEvent::BulkFixChanged(self.bulk),
                    AppEvent::RequestIssued(RemoteRequest::FixAll),
                    self.set_status("fixing all chapters"),
                ]
            }
            AppCommand::FixAllSettled { result } => self.settle_fix_all(result),
            AppCommand::DismissFault => match self.fault.take() {
                Some(_) => vec![AppEvent::FaultCleared],
                None => Vec::new(),
            },
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn issue_refresh(&mut self) -> (AppEvent, u64) {
        self.next_refresh_id = self.next_refresh_id.saturating_add(1);
        self.pending_refreshes = self.pending_refreshes.saturating_add(1);
        let request_id = self.next_refresh_id;
        (
            AppEvent::RequestIssued(RemoteRequest::FetchChapters { request_id }),
            request_id,
        )
    }

    fn settle_refresh(
        &mut self,
        request_id: u64,
        result: Result<ChapterLoad, String>,
    ) -> Vec<AppEvent> {
        self.pending_refreshes = self.pending_refreshes.saturating_sub(1);

        let released = self
            .in_flight
            .iter()
            .filter_map(|(path, phase)| match phase {
                FixPhase::AwaitingRefresh { refresh_id } if *refresh_id <= request_id => {
                    Some(path.clone())
                }
                _ => None,
            })
            .collect::<Vec<_>>();
        for path in &released {
            self.in_flight.remove(path);
        }

        let mut events = Vec::new();
        match result {
            Ok(load) => {
                let count = load.records.len();
                self.store.replace(load);
                if matches!(self.fault, Some(DashboardFault::Fetch(_))) {
                    self.fault = None;
                    events.push(AppEvent::FaultCleared);
                }
                events.push(AppEvent::ChaptersReplaced { count });
            }
            Err(message) => {
                events.push(self.raise_fault(DashboardFault::Fetch(message)));
            }
        }

        for path in released {
            if let Some(control) = self.fix_control(&path) {
                events.push(AppEvent::FixControlChanged { path, control });
            }
        }
        events
    }

    fn activate_fix(&mut self, path: ChapterPath) -> Vec<AppEvent> {
        if self.fix_control(&path) != Some(FixControl::Eligible) {
            return Vec::new();
        }

        self.in_flight.insert(path.clone(), FixPhase::Requesting);
        let status = self.set_status(&format!("fixing {path}"));
        vec![
            AppEvent::FixControlChanged {
                path: path.clone(),
                control: FixControl::Busy,
            },
            AppEvent::RequestIssued(RemoteRequest::FixChapter { path }),
            status,
        ]
    }

    fn settle_fix(&mut self, path: ChapterPath, result: Result<(), String>) -> Vec<AppEvent> {
        if self.in_flight.get(&path) != Some(&FixPhase::Requesting) {
            return Vec::new();
        }

        let mut events = Vec::new();
        match result {
            Ok(()) => events.push(self.set_status(&format!("fix sent for {path}"))),
            Err(message) => events.push(self.raise_fault(DashboardFault::Action {
                target: FixTarget::Chapter(path.clone()),
                message,
            })),
        }

        let (refresh, refresh_id) = self.issue_refresh();
        self.in_flight
            .insert(path, FixPhase::AwaitingRefresh { refresh_id });
        events.push(refresh);
        events
    }

    fn settle_fix_all(&mut self, result: Result<(), String>) -> Vec<AppEvent> {
        if self.bulk != BulkFixState::Busy {
            return Vec::new();
        }

        self.bulk = BulkFixState::Idle;
        let mut events = vec![AppEvent::BulkFixChanged(self.bulk)];
        match result {
            Ok(()) => events.push(self.set_status("fix all finished")),
            Err(message) => events.push(self.raise_fault(DashboardFault::Action {
                target: FixTarget::All,
                message,
            })),
        }
        events.push(self.issue_refresh().0);
        events
    }

    fn set_status_filter(&mut self, filter: StatusFilter) -> Vec<AppEvent> {
        if self.status_filter == filter {
            return Vec::new();
        }
        self.status_filter = filter;
        vec![AppEvent::StatusFilterChanged(filter)]
    }

    fn set_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        if self.mode == mode {
            return Vec::new();
        }
        self.mode = mode;
        vec![AppEvent::ModeChanged(mode)]
    }

    fn raise_fault(&mut self, fault: DashboardFault) -> AppEvent {
        self.fault = Some(fault.clone());
        AppEvent::FaultRaised(fault)
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
