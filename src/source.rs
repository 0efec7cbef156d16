use std::{fmt, str::FromStr};

use crate::config::StreamConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Mjpeg,
    Png,
    RosCompressed,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Mjpeg => "mjpeg",
            Encoding::Png => "png",
            Encoding::RosCompressed => "ros_compressed",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mjpeg" => Ok(Encoding::Mjpeg),
            "png" => Ok(Encoding::Png),
            "ros_compressed" => Ok(Encoding::RosCompressed),
            _ => Err(format!("unsupported encoding: {s}")),
        }
    }
}

/// Builds the `/stream` URL for `topic`.
///
/// Parameters are appended in a fixed order and written verbatim. An explicit
/// `src` in the config is returned untouched.
pub fn compose(cfg: &StreamConfig, topic: &str) -> String {
    if let Some(src) = &cfg.src {
        return src.clone();
    }
    let scheme = if cfg.ssl { "https" } else { "http" };
    let mut src = match cfg.port {
        Some(port) => format!("{scheme}://{}:{port}/stream?topic={topic}", cfg.host),
        None => format!("{scheme}://{}/stream?topic={topic}", cfg.host),
    };
    src += &format!("&width={}", cfg.width);
    src += &format!("&height={}", cfg.height);

    // unknown kinds are dropped from the request, as if unset
    let encoding = cfg
        .encoding
        .as_deref()
        .and_then(|kind| kind.parse::<Encoding>().ok());
    if let Some(encoding) = encoding {
        src += &format!("&type={encoding}");
    }
    let quality_applies = cfg.encoding.is_none() || encoding == Some(Encoding::Mjpeg);
    if let Some(quality) = cfg.quality.filter(|q| *q > 0) {
        if quality_applies {
            src += &format!("&quality={quality}");
        }
    }
    if cfg.invert {
        src += "&invert=true";
    }
    src
}
