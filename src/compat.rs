const KILLCACHE: &str = "?killcache=";

/// Platform quirks keyed off the host's user agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Compat {
    /// The platform does not reuse a cached multipart response, so the source
    /// has to be re-requested after every draw.
    pub cache_bust: bool,
}

impl Compat {
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let cache_bust = user_agent
            .map(|ua| ua.to_lowercase().contains("firefox"))
            .unwrap_or(false);
        Compat { cache_bust }
    }

    /// Replaces (or adds) the `killcache` marker on `src`.
    pub fn bust(src: &str, nonce: f64) -> String {
        let base = src.split(KILLCACHE).next().unwrap_or(src);
        format!("{base}{KILLCACHE}{nonce}")
    }
}
