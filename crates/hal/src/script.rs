//! Script interpreter facade used as a CGI-like content generator.

/// One `name=value` pair from the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

impl QueryParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("script not found")]
    NotFound,
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("out of memory")]
    OutOfMemory,
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub trait ScriptEngine {
    /// A loaded chunk, ready to be called.
    type Script;

    /// Publishes the query parameters of the current request.
    fn set_query(&mut self, params: &[QueryParam]);

    fn set_global(&mut self, name: &str, value: &str);

    fn load(&mut self, path: &str) -> Result<Self::Script, ScriptError>;

    /// Calls the chunk with no arguments and one expected result.
    /// `Ok(None)` is a nil result.
    fn call(&mut self, script: &mut Self::Script) -> Result<Option<String>, ScriptError>;

    /// Drops the chunk from the interpreter.
    fn release(&mut self, script: Self::Script);

    fn full_gc(&mut self);
}
