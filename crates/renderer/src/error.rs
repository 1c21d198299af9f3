use std::fmt;

use crate::host::HostState;

/// Pipeline stage a shader diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
}

impl ShaderStageKind {
    pub(crate) fn to_naga(self) -> wgpu::naga::ShaderStage {
        match self {
            ShaderStageKind::Vertex => wgpu::naga::ShaderStage::Vertex,
            ShaderStageKind::Fragment => wgpu::naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStageKind::Vertex => f.write_str("vertex"),
            ShaderStageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Failures reported by the renderer host.
///
/// Everything raised during [`crate::Host::initialize`] is terminal for that
/// host instance; the caller is expected to report it and stop.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("drawing context unavailable: {reason}")]
    ContextUnavailable { reason: String },
    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompile { stage: ShaderStageKind, log: String },
    #[error("shader program failed to link:\n{log}")]
    ShaderLink { log: String },
    #[error("host is not running (state: {state})")]
    NotRunning { state: HostState },
    #[error("surface failure: {reason}")]
    Surface { reason: String },
}

impl HostError {
    pub(crate) fn compile(stage: ShaderStageKind, log: impl Into<String>) -> Self {
        HostError::ShaderCompile {
            stage,
            log: log.into(),
        }
    }

    pub(crate) fn link(log: impl Into<String>) -> Self {
        HostError::ShaderLink { log: log.into() }
    }
}
