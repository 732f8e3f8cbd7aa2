// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use chapterdash_app::{ChapterRecord, ChapterStatus, LooseValue};
use std::io::Read;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

const SERIES: [(&str, &[&str]); 5] = [
    ("Vinland Saga", &["ヴィンランド・サガ"]),
    ("Blue Period", &["ブルーピリオド", "Aoi Jidai"]),
    ("Dungeon Meshi", &["Delicious in Dungeon"]),
    ("Frieren", &["Sousou no Frieren", "葬送のフリーレン"]),
    ("Witch Hat Atelier", &["Tongari Boushi no Atelier"]),
];

pub fn chapter(path: &str, status: ChapterStatus) -> ChapterRecord {
    ChapterRecord::new(path, status)
}

/// `a` is fine, `b` has a wrong date.
pub fn scenario_records() -> Vec<ChapterRecord> {
    let mut ok = chapter("a", ChapterStatus::Ok);
    ok.filename = Some("a.zip".to_owned());
    let mut wrong = chapter("b", ChapterStatus::Wrong);
    wrong.filename = Some("b.zip".to_owned());
    vec![ok, wrong]
}

/// A small library with every status represented, including one the client
/// does not know about.
pub fn sample_library() -> Vec<ChapterRecord> {
    let statuses = [
        ChapterStatus::Ok,
        ChapterStatus::Wrong,
        ChapterStatus::Missing,
        ChapterStatus::Ok,
        ChapterStatus::Unknown("pending".to_owned()),
    ];

    SERIES
        .iter()
        .zip(statuses)
        .enumerate()
        .map(|(index, ((title, alt_titles), status))| {
            let volume = index as f64 + 1.0;
            let number = (index + 1) * 7;
            let filename = format!("{title} v{volume:02} c{number:03}.cbz");
            let slug = title.to_ascii_lowercase().replace(' ', "-");
            let official_date = format!("2024-0{}-15", index + 1);
            let comicinfo_date = match status {
                ChapterStatus::Ok => Some(official_date.clone()),
                ChapterStatus::Wrong => Some(format!("2023-1{index}-01")),
                _ => None,
            };

            ChapterRecord {
                path: format!("/library/{title}/{filename}").into(),
                filename: Some(filename),
                title: Some((*title).to_owned()),
                series_url: (index != 2)
                    .then(|| format!("https://www.mangaupdates.com/series/{slug}")),
                cover_url: (index % 2 == 0)
                    .then(|| format!("https://cdn.example.com/{slug}.jpg")),
                alt_titles: alt_titles.iter().map(|alt| (*alt).to_owned()).collect(),
                parsed_volume: Some(LooseValue::Number(volume)),
                parsed_chapter: Some(LooseValue::Text(number.to_string())),
                comicinfo_date,
                official_date: Some(official_date),
                file_mod_date: Some(format!("2024-06-0{} 10:30", index + 1)),
                status,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn chapters(records: &[ChapterRecord]) -> Result<Self> {
        let body = serde_json::to_string(records).context("encode chapter fixture")?;
        Ok(Self::json(200, body))
    }

    pub fn ok() -> Self {
        Self::json(200, r#"{"ok":true}"#)
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }
}

/// Chapter service stand-in. Answers requests in order with the scripted
/// responses and records what it received.
pub struct MockService {
    base_url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl MockService {
    pub fn start(responses: Vec<MockResponse>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let mut recorded = Vec::new();
            for scripted in responses {
                let mut request = match server.recv_timeout(RECV_TIMEOUT) {
                    Ok(Some(request)) => request,
                    Ok(None) | Err(_) => break,
                };

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                recorded.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    body,
                });

                if !scripted.delay.is_zero() {
                    thread::sleep(scripted.delay);
                }
                let mut response =
                    Response::from_string(scripted.body).with_status_code(scripted.status);
                if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
                    response = response.with_header(header);
                }
                let _ = request.respond(response);
            }
            recorded
        });

        Ok(Self { base_url, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Waits for the scripted responses to be consumed (or the receive
    /// timeout to pass) and returns the requests seen.
    pub fn finish(self) -> Result<Vec<RecordedRequest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock service thread panicked"))
    }
}
