use thiserror::Error;

/// Top-level error type for the stratigraphic modelling pipeline.
#[derive(Debug, Error)]
pub enum GeostrataError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Borehole(#[from] BoreholeError),

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error(transparent)]
    LayerStack(#[from] LayerStackError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to mesh construction and queries.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("face {face} references vertex {index}, but the mesh has {len} vertices")]
    IndexOutOfRange { face: usize, index: u32, len: usize },

    #[error("mesh has no faces")]
    Empty,

    #[error("face {face} is invalid: {reason}")]
    InvalidFace { face: usize, reason: String },

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),
}

/// Errors in borehole records.
#[derive(Debug, Error)]
pub enum BoreholeError {
    #[error("borehole {name}: {units} unit labels but {depths} bottom depths")]
    LayerCountMismatch {
        name: String,
        units: usize,
        depths: usize,
    },

    #[error("borehole {name}: bottom depth {depth} at layer {index} is above the previous one")]
    NonMonotonicDepth {
        name: String,
        index: usize,
        depth: f64,
    },
}

/// Why an interpolation input cannot be fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateKind {
    /// No points were given.
    Empty,
    /// Two points share (x, y) but disagree in z.
    Contradictory,
    /// The interpolation system has no unique solution.
    Singular,
}

impl std::fmt::Display for DegenerateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("no contact points"),
            Self::Contradictory => f.write_str("coincident points with different elevations"),
            Self::Singular => f.write_str("singular interpolation system"),
        }
    }
}

/// Errors raised by the scattered surface interpolator.
#[derive(Debug, Error)]
pub enum InterpolationError {
    #[error("degenerate interpolation input: {kind}")]
    DegenerateInput { kind: DegenerateKind },

    #[error("invalid sampling grid: {0}")]
    InvalidGrid(String),
}

/// Errors raised while splitting a solid with a surface.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The arrangement is not two shell pieces closed by one surface piece.
    /// The counts describe the arrangement islands found.
    #[error("surface does not bisect the solid: {reason} (found {islands} islands: {shell} shell, {surface} surface)")]
    NonBisectingSurface {
        islands: usize,
        shell: usize,
        surface: usize,
        reason: String,
    },

    #[error("split produced a degenerate solid with volume {volume:e}")]
    DegenerateResult { volume: f64 },

    #[error("intersection kernel failed: {0}")]
    Kernel(String),
}

/// Errors raised while building the layer stack.
#[derive(Debug, Error)]
pub enum LayerStackError {
    #[error("splitting solid '{solid}' with surface {surface} failed: {source}")]
    Split {
        surface: usize,
        solid: String,
        #[source]
        source: SplitError,
    },

    #[error("solid '{solid}' has an invalid mesh: {source}")]
    InvalidSolid {
        solid: String,
        #[source]
        source: MeshError,
    },

    #[error("surface {surface} has an invalid mesh: {source}")]
    InvalidSurface {
        surface: usize,
        #[source]
        source: MeshError,
    },

    #[error("{solids} solids remain but {labels} layer labels were given")]
    LabelCount { solids: usize, labels: usize },

    #[error("no solids remain after applying all surfaces")]
    EmptyLayerStack,
}

/// Errors in model configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration value: {0}")]
    Invalid(String),
}

/// Convenience type alias for results using [`GeostrataError`].
pub type Result<T> = std::result::Result<T, GeostrataError>;
