use std::fs::File;
use std::thread;
use std::time::Duration;

use camino::Utf8Path;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{AudioFilter, CreatorField, CreatorName, Identifier};
use crate::error::CrunchyError;

#[derive(Debug, Clone)]
pub struct ShowHit {
    pub identifier: Identifier,
    pub creator: CreatorName,
}

#[derive(Debug, Clone, Copy)]
pub struct FetchReport {
    pub files_written: usize,
}

pub trait ArchiveClient: Send + Sync {
    fn search(&self, collection: &str, max_results: usize) -> Result<Vec<ShowHit>, CrunchyError>;
    fn fetch(
        &self,
        identifier: &Identifier,
        show_dir: &Utf8Path,
        filter: &AudioFilter,
        retries: usize,
    ) -> Result<FetchReport, CrunchyError>;
}

#[derive(Clone)]
pub struct ArchiveHttpClient {
    client: Client,
    base_url: String,
}

const SEARCH_RETRIES: usize = 3;

impl ArchiveHttpClient {
    pub fn new() -> Result<Self, CrunchyError> {
        Self::with_base_url("https://archive.org".to_string())
    }

    pub fn with_base_url(base_url: String) -> Result<Self, CrunchyError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("crunchy/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CrunchyError::ArchiveHttp(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| CrunchyError::ArchiveHttp(err.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn write_response_to_file(
        &self,
        mut response: reqwest::blocking::Response,
        destination: &Utf8Path,
    ) -> Result<(), CrunchyError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "archive request failed".to_string());
            return Err(CrunchyError::ArchiveStatus { status, message });
        }

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent.as_std_path())
                .map_err(|err| CrunchyError::Filesystem(err.to_string()))?;
        }
        let mut file = File::create(destination.as_std_path())
            .map_err(|err| CrunchyError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| CrunchyError::Filesystem(err.to_string()))?;
        Ok(())
    }

    fn send_with_retries<F>(
        &self,
        retries: usize,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, CrunchyError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < retries && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < retries && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(CrunchyError::ArchiveHttp(err.to_string()));
                }
            }
        }
    }
}

impl ArchiveClient for ArchiveHttpClient {
    fn search(&self, collection: &str, max_results: usize) -> Result<Vec<ShowHit>, CrunchyError> {
        let url = format!("{}/advancedsearch.php", self.base_url);
        let query = format!("collection:{collection}");
        let rows = max_results.to_string();
        let response = self.send_with_retries(SEARCH_RETRIES, || {
            self.client.get(&url).query(&[
                ("q", query.as_str()),
                ("fl[]", "identifier"),
                ("fl[]", "creator"),
                ("sort[]", "addeddate desc"),
                ("rows", rows.as_str()),
                ("page", "1"),
                ("output", "json"),
            ])
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "archive search failed".to_string());
            return Err(CrunchyError::ArchiveStatus { status, message });
        }

        let envelope: SearchEnvelope = response
            .json()
            .map_err(|err| CrunchyError::ArchiveHttp(err.to_string()))?;

        let mut hits = Vec::new();
        for doc in envelope.response.docs {
            if hits.len() >= max_results {
                break;
            }
            let Some(raw_identifier) = doc.identifier else {
                continue;
            };
            let identifier = match raw_identifier.parse::<Identifier>() {
                Ok(identifier) => identifier,
                Err(err) => {
                    warn!(identifier = %raw_identifier, %err, "skipping unusable search result");
                    continue;
                }
            };
            let creator = match doc.creator {
                Some(field) => field.resolve(collection),
                None => CreatorName::sanitize(collection),
            };
            hits.push(ShowHit {
                identifier,
                creator,
            });
        }
        Ok(hits)
    }

    fn fetch(
        &self,
        identifier: &Identifier,
        show_dir: &Utf8Path,
        filter: &AudioFilter,
        retries: usize,
    ) -> Result<FetchReport, CrunchyError> {
        let metadata_url = format!("{}/metadata/{}", self.base_url, identifier.as_str());
        let response = self.send_with_retries(retries, || self.client.get(&metadata_url))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "archive metadata request failed".to_string());
            return Err(CrunchyError::ArchiveStatus { status, message });
        }

        let metadata: ItemMetadata = response
            .json()
            .map_err(|err| CrunchyError::ArchiveHttp(err.to_string()))?;
        let wanted = metadata
            .files
            .into_iter()
            .filter_map(|file| file.name)
            .filter(|name| filter.matches(name))
            .collect::<Vec<_>>();

        if wanted.is_empty() {
            debug!(identifier = %identifier, suffix = filter.suffix(), "item has no matching audio files");
            return Ok(FetchReport { files_written: 0 });
        }

        std::fs::create_dir_all(show_dir.as_std_path())
            .map_err(|err| CrunchyError::Filesystem(err.to_string()))?;

        let mut files_written = 0usize;
        for name in &wanted {
            if name.split('/').any(|segment| segment == "..") {
                warn!(identifier = %identifier, file = %name, "file name path traversal detected, skipping");
                continue;
            }
            let encoded = name
                .split('/')
                .map(|segment| urlencoding::encode(segment).into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let url = format!(
                "{}/download/{}/{}",
                self.base_url,
                identifier.as_str(),
                encoded
            );
            let response = self.send_with_retries(retries, || self.client.get(&url))?;
            self.write_response_to_file(response, &show_dir.join(name.as_str()))?;
            files_written += 1;
        }

        Ok(FetchReport { files_written })
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    response: SearchResponse,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(default)]
    identifier: Option<String>,
    #[serde(default)]
    creator: Option<CreatorField>,
}

#[derive(Debug, Deserialize)]
struct ItemMetadata {
    #[serde(default)]
    files: Vec<ItemFile>,
}

#[derive(Debug, Deserialize)]
struct ItemFile {
    #[serde(default)]
    name: Option<String>,
}
