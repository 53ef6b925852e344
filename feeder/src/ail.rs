//! Blocking client for the AIL framework JSON import API.

use std::io::Write;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::write::GzEncoder;
use flate2::Compression;
use parser::message_id::sha256_hex;
use parser::{EventMetadata, EventSink};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AilConfig;

const PING_PATH: &str = "api/v1/ping";
const IMPORT_JSON_ITEM_PATH: &str = "api/v1/import/json/item";
const DEFAULT_ENCODING: &str = "UTF-8";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum AilError {
    #[error("invalid API key header: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AIL answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to compress payload: {0}")]
    Compress(#[from] std::io::Error),
}

/// Body of an `import/json/item` request
#[derive(Debug, Serialize)]
pub struct JsonItem<'a> {
    /// base64 of the gzip-compressed payload
    pub data: String,
    #[serde(rename = "data-sha256")]
    pub data_sha256: String,
    pub meta: &'a EventMetadata,
    pub source: &'a str,
    #[serde(rename = "source-uuid")]
    pub source_uuid: &'a str,
    #[serde(rename = "default-encoding")]
    pub default_encoding: &'a str,
}

pub fn build_json_item<'a>(
    payload: &[u8],
    meta: &'a EventMetadata,
    source: &'a str,
    source_uuid: &'a str,
) -> Result<JsonItem<'a>, AilError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    let compressed = encoder.finish()?;

    Ok(JsonItem {
        data: STANDARD.encode(compressed),
        data_sha256: sha256_hex(payload),
        meta,
        source,
        source_uuid,
        default_encoding: DEFAULT_ENCODING,
    })
}

pub struct AilClient {
    client: Client,
    base_url: String,
}

impl AilClient {
    /// Builds the HTTP client without touching the network
    pub fn new(config: &AilConfig) -> Result<Self, AilError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(config.apikey.trim())?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verifycert)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the client and checks that the API answers
    pub fn connect(config: &AilConfig) -> Result<Self, AilError> {
        let client = Self::new(config)?;
        client.ping()?;
        info!("Connected to AIL at {}", client.base_url);
        Ok(client)
    }

    pub fn ping(&self) -> Result<(), AilError> {
        let response = self.client.get(self.endpoint(PING_PATH)).send()?;
        check_status(response)
    }

    pub fn feed_json_item(
        &self,
        payload: &[u8],
        meta: &EventMetadata,
        source: &str,
        source_uuid: &str,
    ) -> Result<(), AilError> {
        let item = build_json_item(payload, meta, source, source_uuid)?;
        let response = self
            .client
            .post(self.endpoint(IMPORT_JSON_ITEM_PATH))
            .json(&item)
            .send()?;
        check_status(response)?;
        debug!("AIL accepted item {}", meta.id);
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl EventSink for AilClient {
    type Error = AilError;

    fn submit(
        &mut self,
        payload: &[u8],
        metadata: &EventMetadata,
        source: &str,
        source_uuid: &str,
    ) -> Result<(), Self::Error> {
        self.feed_json_item(payload, metadata, source, source_uuid)
    }
}

fn check_status(response: Response) -> Result<(), AilError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response
        .text()
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(AilError::Status { status, body })
}
