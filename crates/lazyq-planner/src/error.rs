use thiserror::Error;

/// Errors raised while parsing or validating a pipeline.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pipeline: {0}")]
    Invalid(String),

    /// A step names a source the pipeline never declared.
    #[error("unknown source `{0}`")]
    UnknownSource(String),
}

impl From<PlanError> for lazyq_core::Error {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::UnknownSource(name) => {
                lazyq_core::Error::InvalidCollection(format!("unknown source `{name}`"))
            }
            other => lazyq_core::Error::InvalidArgument(other.to_string()),
        }
    }
}
