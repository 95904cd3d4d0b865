/// Failures a pipeline stage reports to its caller.
///
/// Window validation problems are not errors; they come back as
/// [`super::PartitionOutcome::Invalid`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The upload could not be decoded into a table.
    Format(String),
    /// The table decoded but lacks a usable label column.
    Schema(String),
    /// A stage ran before its prerequisite produced its artifact.
    NotReady(String),
    /// Anything the caller cannot fix by re-sending the request.
    Internal(String),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Format(_) => "format_error",
            Self::Schema(_) => "schema_error",
            Self::NotReady(_) => "not_ready",
            Self::Internal(_) => "internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Format(m) | Self::Schema(m) | Self::NotReady(m) | Self::Internal(m) => m,
        }
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl std::error::Error for PipelineError {}
