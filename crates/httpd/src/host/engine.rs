use httpd_hal::{QueryParam, ScriptEngine, ScriptError};

/// Stand-in for builds without an interpreter: every script is missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledEngine;

impl ScriptEngine for DisabledEngine {
    type Script = ();

    fn set_query(&mut self, _params: &[QueryParam]) {}

    fn set_global(&mut self, _name: &str, _value: &str) {}

    fn load(&mut self, path: &str) -> Result<Self::Script, ScriptError> {
        log::debug!("no script engine, cannot load {}", path);
        Err(ScriptError::NotFound)
    }

    fn call(&mut self, _script: &mut Self::Script) -> Result<Option<String>, ScriptError> {
        Err(ScriptError::Internal("no script engine".to_string()))
    }

    fn release(&mut self, _script: Self::Script) {}

    fn full_gc(&mut self) {}
}
