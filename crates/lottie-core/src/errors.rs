use thiserror::Error;

/// Failure to walk an [`AddressingPath`](crate::path::AddressingPath).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("cannot index into {found} at step {step} of `{path}`")]
    NotIndexable {
        path: String,
        step: usize,
        found: &'static str,
    },
    #[error("missing `{key}` at step {step} of `{path}`")]
    Missing {
        path: String,
        step: usize,
        key: String,
    },
    #[error("`{path}` does not address a slot of the live tree")]
    Unaddressable { path: String },
}

/// Failure while running a compiled expression against a context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("unknown composition `{0}`")]
    UnknownComposition(String),
    #[error("unknown layer `{0}`")]
    UnknownLayer(String),
    #[error("layer `{layer}` has no effect `{effect}`")]
    UnknownEffect { layer: String, effect: String },
    #[error("effect `{effect}` has no channel `{channel}`")]
    UnknownChannel { effect: String, channel: String },
    #[error("evaluation context does not provide `{0}`")]
    MissingMember(&'static str),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("invalid animation document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("animation has a zero frame rate")]
    ZeroFrameRate,
}
