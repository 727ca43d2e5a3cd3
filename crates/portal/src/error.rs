use render_tree::TreeError;
use thiserror::Error;

/// Errors from the typed portal surface.
///
/// Registry operations themselves never fail; these cover misconfiguration
/// and undeclared slot keys, which are programming errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortalError {
    #[error("invalid portal config: {0}")]
    InvalidConfig(String),
    #[error("slot '{slot}' is not declared by portal '{portal}'")]
    UnknownSlot { portal: String, slot: String },
    #[error(transparent)]
    Tree(#[from] TreeError),
}
