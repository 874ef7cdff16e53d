//! Evaluation modes.

/// Evaluation policy chosen when the interpreter is built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EvalMode {
    /// No depth limit on native targets; the stack grows on demand.
    #[default]
    Interpret,
    /// Invocation depth capped at `max_depth`; deeper calls fail with a
    /// recoverable `StackOverflow`.
    Bounded { max_depth: usize },
}

impl EvalMode {
    /// Maximum invocation depth, or `None` for unlimited.
    ///
    /// WASM has no `stacker` fallback, so `Interpret` is capped there too.
    #[inline]
    pub fn max_recursion_depth(&self) -> Option<usize> {
        match self {
            Self::Interpret => {
                #[cfg(target_arch = "wasm32")]
                {
                    Some(200)
                }
                #[cfg(not(target_arch = "wasm32"))]
                {
                    None
                }
            }
            Self::Bounded { max_depth } => Some(*max_depth),
        }
    }
}
