use std::pin::Pin;

use anyhow::{anyhow, bail, Result};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use reqwest::{
    header::{HeaderMap, CONTENT_TYPE},
    Response, StatusCode,
};
use tracing::{debug, trace};

mod multipart;

pub use multipart::{boundary, Part, PartSplitter, DEFAULT_MAX_PART_SIZE};

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

#[derive(Clone)]
pub struct Client {
    url: String,
    default_headers: HeaderMap,
    max_frame_size: usize,
    http: reqwest::Client,
}

impl Client {
    pub fn new(url: String, default_headers: Option<HeaderMap>) -> Self {
        Client {
            url,
            default_headers: default_headers.unwrap_or_default(),
            max_frame_size: DEFAULT_MAX_PART_SIZE,
            http: reqwest::Client::new(),
        }
    }

    /// Caps the size of one encoded image, multipart or not.
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issues the GET and returns a stream of encoded images.
    ///
    /// A `multipart/*` response yields one image per part, anything else is
    /// read whole and yields a single image.
    pub async fn connect(&self) -> Result<FrameStream> {
        let response = self
            .http
            .get(&self.url)
            .headers(self.default_headers.clone())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!(get_response_error(response).await));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        debug!("{} connected, content-type: {}", self.url, content_type);

        let splitter = boundary(&content_type)
            .map(|b| PartSplitter::with_max_part_size(&b, self.max_frame_size));
        Ok(FrameStream {
            body: Box::pin(response.bytes_stream()),
            splitter,
            max_frame_size: self.max_frame_size,
            done: false,
        })
    }
}

pub struct FrameStream {
    body: ByteStream,
    splitter: Option<PartSplitter>,
    max_frame_size: usize,
    done: bool,
}

impl FrameStream {
    pub fn is_multipart(&self) -> bool {
        self.splitter.is_some()
    }

    /// Returns the next encoded image, or `None` once the body has ended.
    pub async fn next_frame(&mut self) -> Result<Option<Bytes>> {
        if self.done {
            return Ok(None);
        }
        let Some(splitter) = self.splitter.as_mut() else {
            let mut whole = BytesMut::new();
            while let Some(chunk) = self.body.next().await {
                let chunk = chunk?;
                if whole.len() + chunk.len() > self.max_frame_size {
                    self.done = true;
                    bail!("image exceeds {} bytes", self.max_frame_size);
                }
                whole.extend_from_slice(&chunk);
            }
            self.done = true;
            return Ok((!whole.is_empty()).then(|| whole.freeze()));
        };
        loop {
            if let Some(part) = splitter.next_part()? {
                trace!("multipart part: {} bytes", part.body.len());
                return Ok(Some(part.body));
            }
            if splitter.is_closed() {
                self.done = true;
                return Ok(None);
            }
            match self.body.next().await {
                Some(chunk) => splitter.push(&chunk?),
                None => {
                    self.done = true;
                    return Ok(splitter.finish().map(|part| part.body));
                }
            }
        }
    }
}

async fn get_response_error(response: Response) -> String {
    match response.status() {
        StatusCode::NOT_FOUND => "stream not found".to_owned(),
        StatusCode::UNAUTHORIZED => "identity authentication failed".to_owned(),
        StatusCode::INTERNAL_SERVER_ERROR => {
            response.text().await.unwrap_or("server error".to_owned())
        }
        _ => format!("{}", response.status()),
    }
}
