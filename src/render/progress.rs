/// A progress notification from a render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Measurable work, `percent` in `0..=100`.
    Determinate { percent: u8, message: String },
    /// Work whose length is unknown (per-clip processing, concatenation).
    Indeterminate { message: String },
}

impl Progress {
    pub fn determinate(percent: u8, message: impl Into<String>) -> Self {
        Self::Determinate {
            percent: percent.min(100),
            message: message.into(),
        }
    }

    pub fn indeterminate(message: impl Into<String>) -> Self {
        Self::Indeterminate {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Determinate { message, .. } | Self::Indeterminate { message } => message,
        }
    }

    pub fn percent(&self) -> Option<u8> {
        match self {
            Self::Determinate { percent, .. } => Some(*percent),
            Self::Indeterminate { .. } => None,
        }
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Determinate { percent, message } => write!(f, "[{percent:>3}%] {message}"),
            Self::Indeterminate { message } => write!(f, "[ .. ] {message}"),
        }
    }
}
