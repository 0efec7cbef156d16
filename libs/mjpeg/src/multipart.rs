use anyhow::{bail, Result};
use bytes::{Bytes, BytesMut};

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

pub const DEFAULT_MAX_PART_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Part {
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Incrementally splits a `multipart/x-mixed-replace` body into parts.
///
/// Bytes are fed with [`PartSplitter::push`] as they arrive from the network and
/// complete parts are drained with [`PartSplitter::next_part`]. A part with a
/// `Content-Length` header is cut at that length; otherwise it runs until the
/// next delimiter.
pub struct PartSplitter {
    delimiter: Vec<u8>,
    buf: BytesMut,
    max_part_size: usize,
    closed: bool,
}

impl PartSplitter {
    pub fn new(boundary: &str) -> Self {
        Self::with_max_part_size(boundary, DEFAULT_MAX_PART_SIZE)
    }

    pub fn with_max_part_size(boundary: &str, max_part_size: usize) -> Self {
        // servers disagree on whether the header value already carries the
        // leading dashes, so match on the bare token
        let delimiter = format!("--{}", boundary.trim_start_matches('-')).into_bytes();
        PartSplitter {
            delimiter,
            buf: BytesMut::new(),
            max_part_size,
            closed: false,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        if !self.closed {
            self.buf.extend_from_slice(chunk);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn next_part(&mut self) -> Result<Option<Part>> {
        if self.closed {
            return Ok(None);
        }
        let Some(start) = find(&self.buf, &self.delimiter, 0) else {
            return self.wait();
        };
        let after_delimiter = start + self.delimiter.len();
        let Some(line_end) = find(&self.buf, CRLF, after_delimiter) else {
            return self.wait();
        };
        if self.buf[after_delimiter..line_end].starts_with(b"--") {
            self.closed = true;
            self.buf.clear();
            return Ok(None);
        }
        let Some(header_end) = find(&self.buf, HEADER_END, line_end) else {
            return self.wait();
        };
        let headers = parse_headers(&self.buf[(line_end + CRLF.len()).min(header_end)..header_end]);
        let body_start = header_end + HEADER_END.len();

        let (body_end, consumed) = match headers.content_length {
            Some(len) => {
                if len > self.max_part_size {
                    bail!(
                        "multipart part of {} bytes exceeds {} bytes",
                        len,
                        self.max_part_size
                    );
                }
                let Some(body_end) = body_start.checked_add(len) else {
                    bail!("multipart content-length {} out of range", len);
                };
                if self.buf.len() < body_end {
                    return self.wait();
                }
                (body_end, body_end)
            }
            None => match find(&self.buf, &self.delimiter, body_start) {
                Some(next) => (trim_crlf(&self.buf, body_start, next), next),
                None => return self.wait(),
            },
        };

        let chunk = self.buf.split_to(consumed).freeze();
        Ok(Some(Part {
            content_type: headers.content_type,
            body: chunk.slice(body_start..body_end),
        }))
    }

    /// Flushes a trailing part that was cut off by the end of the body.
    pub fn finish(&mut self) -> Option<Part> {
        if self.closed {
            return None;
        }
        self.closed = true;
        let start = find(&self.buf, &self.delimiter, 0)?;
        let line_end = find(&self.buf, CRLF, start + self.delimiter.len())?;
        let header_end = find(&self.buf, HEADER_END, line_end)?;
        let headers = parse_headers(&self.buf[(line_end + CRLF.len()).min(header_end)..header_end]);
        let body_start = header_end + HEADER_END.len();
        let body_end = match headers.content_length {
            Some(len) => match body_start.checked_add(len) {
                Some(end) if len <= self.max_part_size && end <= self.buf.len() => end,
                _ => return None,
            },
            None => trim_crlf(&self.buf, body_start, self.buf.len()),
        };
        if body_end <= body_start {
            return None;
        }
        let chunk = std::mem::take(&mut self.buf).freeze();
        Some(Part {
            content_type: headers.content_type,
            body: chunk.slice(body_start..body_end),
        })
    }

    fn wait(&self) -> Result<Option<Part>> {
        if self.buf.len() > self.max_part_size {
            bail!(
                "multipart part exceeds {} bytes without a delimiter",
                self.max_part_size
            );
        }
        Ok(None)
    }
}

#[derive(Default)]
struct PartHeaders {
    content_type: Option<String>,
    content_length: Option<usize>,
}

fn parse_headers(raw: &[u8]) -> PartHeaders {
    let mut headers = PartHeaders::default();
    for line in String::from_utf8_lossy(raw).split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "content-type" => headers.content_type = Some(value.to_string()),
            "content-length" => headers.content_length = value.parse().ok(),
            _ => {}
        }
    }
    headers
}

fn trim_crlf(buf: &[u8], start: usize, end: usize) -> usize {
    if end >= start + CRLF.len() && &buf[end - CRLF.len()..end] == CRLF {
        end - CRLF.len()
    } else {
        end
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Extracts the boundary parameter from a `Content-Type` header value.
pub fn boundary(content_type: &str) -> Option<String> {
    let mut params = content_type.split(';');
    let mime = params.next()?.trim().to_ascii_lowercase();
    if !mime.starts_with("multipart/") {
        return None;
    }
    params.find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}
