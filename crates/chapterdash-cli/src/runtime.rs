// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use chapterdash_app::{ChapterPath, ChapterRecord, RemoteRequest};
use chapterdash_client::Client;
use chapterdash_tui::{DashboardRuntime, InternalEvent, perform_request};
use log::debug;
use std::sync::mpsc::Sender;
use std::thread;

/// Talks to the chapter service. Each request runs on its own worker thread
/// with a clone of the client.
#[derive(Debug, Clone)]
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl DashboardRuntime for HttpRuntime {
    fn fetch_chapters(&mut self) -> Result<Vec<ChapterRecord>> {
        self.client.list_chapters()
    }

    fn fix_chapter(&mut self, path: &ChapterPath) -> Result<()> {
        self.client.fix_chapter(path)
    }

    fn fix_all(&mut self) -> Result<()> {
        self.client.fix_all()
    }

    fn spawn_request(&mut self, request: RemoteRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let mut worker = self.clone();
        let name = match &request {
            RemoteRequest::FetchChapters { .. } => "fetch-chapters",
            RemoteRequest::FixChapter { .. } => "fix-chapter",
            RemoteRequest::FixAll => "fix-all",
        };
        thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let completion = perform_request(&mut worker, request);
                if tx.send(InternalEvent::Remote(completion)).is_err() {
                    debug!("dashboard closed before {name} finished");
                }
            })
            .with_context(|| format!("spawn {name} worker"))?;
        Ok(())
    }
}
