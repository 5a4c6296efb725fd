use std::fmt;

use thiserror::Error;

use crate::dome::PieceRole;

/// Top-level error type for dome decomposition.
#[derive(Debug, Error)]
pub enum DomeError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("boolean operation failed during {stage}: {source}")]
    BooleanOperationFailed {
        stage: Stage,
        #[source]
        source: KernelError,
    },

    #[error("ambiguous classification: pieces {first} and {second} share ordering key {key}")]
    AmbiguousClassification {
        first: usize,
        second: usize,
        key: String,
    },

    #[error("no inner wall found for piece {piece_id} ({role})")]
    NoInnerWallFound { piece_id: usize, role: PieceRole },

    #[error("kernel operation failed during {stage}: {source}")]
    Kernel {
        stage: Stage,
        #[source]
        source: KernelError,
    },
}

impl DomeError {
    pub(crate) fn boolean(stage: Stage) -> impl FnOnce(KernelError) -> Self {
        move |source| Self::BooleanOperationFailed { stage, source }
    }

    pub(crate) fn kernel(stage: Stage) -> impl FnOnce(KernelError) -> Self {
        move |source| Self::Kernel { stage, source }
    }
}

/// Rejected configuration values. Always detected before any geometry is built.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{parameter} = {value} is out of range ({min}, {max})")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{parameter} = {value} is below the minimum of {min}")]
    BelowMinimum {
        parameter: &'static str,
        value: usize,
        min: usize,
    },

    #[error("{parameter} = {value} does not evenly divide {range} degrees")]
    NotADivisor {
        parameter: &'static str,
        value: usize,
        range: usize,
    },
}

/// Errors reported by a geometry kernel.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KernelError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Pipeline stage an error was raised in, with the angle or piece it concerns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    Shell,
    CapCut { angle_deg: f64 },
    PolarCut { angle_deg: f64 },
    AzimuthCut { angle_deg: f64 },
    Classification,
    Hollowing { piece_id: usize },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell => write!(f, "shell construction"),
            Self::CapCut { angle_deg } => write!(f, "cap cut at {angle_deg}°"),
            Self::PolarCut { angle_deg } => write!(f, "polar cut at {angle_deg}°"),
            Self::AzimuthCut { angle_deg } => write!(f, "azimuth cut at {angle_deg}°"),
            Self::Classification => write!(f, "classification"),
            Self::Hollowing { piece_id } => write!(f, "hollowing of piece {piece_id}"),
        }
    }
}

/// Convenience type alias for results using [`DomeError`].
pub type Result<T> = std::result::Result<T, DomeError>;
