use std::fmt;

#[derive(Debug)]
pub enum AppError {
    InvalidConfig(String),
    UnknownStream(String),
    NoRuntime,
    MenuClosed,
    Closed,
    InternalError(anyhow::Error),
}

impl AppError {
    pub fn invalid_config<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::InvalidConfig(t.to_string())
    }

    pub fn unknown_stream<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::UnknownStream(t.to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidConfig(err) => write!(f, "invalid config: {err}"),
            AppError::UnknownStream(topic) => write!(f, "unknown stream: {topic}"),
            AppError::NoRuntime => write!(f, "no tokio runtime available"),
            AppError::MenuClosed => write!(f, "stream menu is not open"),
            AppError::Closed => write!(f, "view is closed"),
            AppError::InternalError(err) => write!(f, "{err}"),
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        AppError::InternalError(err.into())
    }
}
