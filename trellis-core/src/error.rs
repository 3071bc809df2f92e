//! Error Types
//!
//! Everything that can go wrong while building or committing a render pass.
//!
//! Component failures propagate out of the work loop untouched: the
//! work-in-progress tree is left where it stopped and `current` keeps showing
//! the last good commit. Nothing is retried.

use thiserror::Error;

/// Result alias used by component render functions.
pub type RenderResult = Result<crate::element::Element, RenderError>;

/// Errors raised by the reconciliation engine.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An element that cannot be rendered (for example a native element with
    /// an empty tag).
    #[error("malformed element: {0}")]
    MalformedElement(String),

    /// A child list nested deeper than the flatten policy allows.
    #[error("children of <{parent}> are nested {depth} lists deep; only one level is flattened")]
    NestedChildren { parent: String, depth: usize },

    /// A hook slot was used with a different type than in the previous render.
    #[error("hook #{index} in `{component}` was read as {requested} but holds another type")]
    HookMismatch {
        component: String,
        index: usize,
        requested: &'static str,
    },

    /// A component reported a failure from its render function.
    #[error("component `{component}` failed to render: {message}")]
    Component { component: String, message: String },

    /// A driver kept committing without reaching idle.
    #[error("render loop: still busy after {passes} commits")]
    RenderLoop { passes: usize },

    /// A re-render was requested before anything was mounted.
    #[error("no tree is mounted; call begin_render first")]
    NotMounted,

    /// `begin_render` was called on an engine that already owns a root.
    #[error("a root is already mounted; use render or request_rerender")]
    AlreadyMounted,

    /// The display backend refused an operation that has no fallback.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The engine configuration could not be parsed.
    #[error("invalid engine config: {0}")]
    Config(#[from] serde_json::Error),
}

impl RenderError {
    /// Build a [`RenderError::Component`] from inside a render function.
    pub fn component(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by a display backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("display node {0} does not exist")]
    UnknownNode(String),

    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },

    #[error("cannot create a display node for {0}")]
    Unsupported(String),

    #[error("{0} cannot have children")]
    NotAContainer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_error_message_names_component() {
        let err = RenderError::component("Counter", "boom");
        assert_eq!(err.to_string(), "component `Counter` failed to render: boom");
    }

    #[test]
    fn backend_errors_convert() {
        let err: RenderError = BackendError::UnknownNode("n1".into()).into();
        assert!(matches!(err, RenderError::Backend(BackendError::UnknownNode(_))));
    }
}
