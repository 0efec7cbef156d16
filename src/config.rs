use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::Result;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub host: String,
    /// `None` leaves the port out of the URL
    #[serde(default = "default_port")]
    pub port: Option<u16>,
    /// 1-100, ignored unless the encoding is mjpeg
    #[serde(default)]
    pub quality: Option<u32>,
    /// e.g. `/wide_stereo/left/image_color`
    #[serde(default)]
    pub topic: String,
    /// Hz
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: f64,
    /// milliseconds
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// ask the server for mirrored images
    #[serde(default)]
    pub invert: bool,
    /// encoding kind, see [`crate::source::Encoding`]
    #[serde(default, rename = "type")]
    pub encoding: Option<String>,
    /// overrides host, port, quality and the rest of the composed source
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_port() -> Option<u16> {
    Some(8080)
}

fn default_refresh_rate() -> f64 {
    10.0
}

fn default_interval() -> u64 {
    30
}

fn default_background() -> String {
    "#aaaaaa".to_string()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            host: "localhost".to_string(),
            port: default_port(),
            quality: None,
            topic: String::new(),
            refresh_rate: default_refresh_rate(),
            interval: default_interval(),
            invert: false,
            encoding: None,
            src: None,
            ssl: false,
            background: default_background(),
            user_agent: None,
        }
    }
}

impl StreamConfig {
    /// The redraw period: the slower of the rate and the interval.
    pub fn period(&self) -> Duration {
        let from_rate = 1000.0 / self.refresh_rate;
        let millis = from_rate.max(self.interval as f64);
        Duration::from_micros((millis * 1000.0).round() as u64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AppError::invalid_config(format!(
                "canvas size {}x{} must be nonzero",
                self.width, self.height
            )));
        }
        if !(self.refresh_rate.is_finite() && self.refresh_rate > 0.0) {
            return Err(AppError::invalid_config(format!(
                "refresh_rate {} must be a positive number",
                self.refresh_rate
            )));
        }
        if self.src.is_none() {
            if self.host.is_empty() {
                return Err(AppError::invalid_config("host is required without src"));
            }
            if self.topic.is_empty() {
                return Err(AppError::invalid_config("topic is required without src"));
            }
        }
        crate::canvas::parse_color(&self.background)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MultiStreamConfig {
    #[serde(flatten)]
    pub stream: StreamConfig,
    pub topics: Vec<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub default_stream: usize,
}

impl MultiStreamConfig {
    pub fn new(stream: StreamConfig, topics: Vec<String>) -> Self {
        Self {
            stream,
            topics,
            labels: None,
            default_stream: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.topics.is_empty() {
            return Err(AppError::invalid_config("topics must not be empty"));
        }
        if let Some(labels) = &self.labels {
            if labels.len() != self.topics.len() {
                return Err(AppError::invalid_config(format!(
                    "{} labels for {} topics",
                    labels.len(),
                    self.topics.len()
                )));
            }
        }
        if self.default_stream >= self.topics.len() {
            return Err(AppError::invalid_config(format!(
                "default_stream {} out of range",
                self.default_stream
            )));
        }
        self.view_config().validate()
    }

    /// The config handed to the inner view, pointed at the default stream.
    pub fn view_config(&self) -> StreamConfig {
        let mut cfg = self.stream.clone();
        if let Some(topic) = self.topics.get(self.default_stream) {
            cfg.topic = topic.clone();
        }
        cfg
    }

    /// The text shown for a topic in the selection menu.
    pub fn label(&self, index: usize) -> Option<&str> {
        match &self.labels {
            Some(labels) => labels.get(index).map(String::as_str),
            None => self.topics.get(index).map(String::as_str),
        }
    }
}
