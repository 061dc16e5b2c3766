use thiserror::Error;

/// Top-level error type for the orbis crate.
#[derive(Debug, Error)]
pub enum OrbisError {
    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors raised when a query option is assigned an invalid value.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("max_results must be at least 1")]
    ZeroMaxResults,

    #[error("{option} must be a non-negative distance, got {length2}")]
    NegativeDistance {
        option: &'static str,
        length2: f64,
    },
}

/// Errors related to shape construction.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("point ({x}, {y}, {z}) is not unit length")]
    NotUnitLength { x: f64, y: f64, z: f64 },

    #[error("loop {index} has {len} vertices, at least 3 are required")]
    LoopTooShort { index: usize, len: usize },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors related to shape index construction.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("max_edges_per_cell must be at least 1")]
    ZeroEdgesPerCell,

    #[error("max_level {0} exceeds the deepest cell level {max}", max = crate::geometry::cell_id::MAX_LEVEL)]
    LevelOutOfRange(u8),
}

/// Errors produced by the text format parser.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid lat:lng pair {0:?}")]
    InvalidLatLng(String),

    #[error("expected 3 '#'-separated sections in index description, got {0}")]
    SectionCount(usize),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Convenience type alias for results using [`OrbisError`].
pub type Result<T> = std::result::Result<T, OrbisError>;
