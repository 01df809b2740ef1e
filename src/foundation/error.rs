pub type ReelResult<T> = Result<T, ReelError>;

#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("media error: {0}")]
    Media(String),

    #[error("data source error: {0}")]
    Data(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("template error: no template found at '{}'", .0.display())]
    TemplateMissing(std::path::PathBuf),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("nothing to render: the timeline has no clips")]
    EmptyTimeline,

    #[error("no clips were successfully processed ({attempted} attempted, all skipped)")]
    NothingProcessed { attempted: usize },

    #[error("render cancelled")]
    Cancelled,

    #[error("a render is already in progress")]
    RenderBusy,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
