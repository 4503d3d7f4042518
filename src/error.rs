use thiserror::Error;

/// Top-level error type for the contour engine.
#[derive(Debug, Error)]
pub enum GeocontError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Errors related to element construction and modification.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors related to element chains and contour structure.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("element not found in list")]
    ElemNotFound,

    #[error("contour is not closed (gap {gap})")]
    ContourNotClosed { gap: f64 },

    #[error("contour is not contiguous")]
    NotContiguous,

    #[error("invalid nesting: {0}")]
    InvalidNesting(String),
}

/// Errors raised by spatial queries whose preconditions are not met.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("spatial index is empty")]
    EmptyIndex,

    #[error("spatial index does not belong to this element list")]
    StaleIndex,
}

/// Errors raised while reading or writing persistent fields.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` has unexpected type, expected {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unknown element kind tag {0}")]
    UnknownKind(u32),
}

/// Convenience type alias for results using [`GeocontError`].
pub type Result<T> = std::result::Result<T, GeocontError>;
