//! The CGI-like bridge: a loaded script is called once per step and each
//! non-empty return value is streamed as the next body chunk.

use httpd_hal::{Connection, QueryParam, ScriptEngine, ScriptError};
use log::warn;

use crate::{
    conn::{Begun, Progress, log_net},
    http::{mime, parser::suffix_of, response},
};

/// Global holding the payload of the frame a WebSocket script runs for.
pub const WS_DATA_GLOBAL: &str = "ws_data";

pub(crate) struct ScriptJob<S: ScriptEngine> {
    script: S::Script,
    steps: u32,
}

pub(crate) async fn begin<S: ScriptEngine, C: Connection>(
    engine: &mut S,
    clnt: &mut C,
    path: &str,
    query: &[QueryParam],
) -> Begun<ScriptJob<S>> {
    engine.set_query(query);
    let script = match engine.load(path) {
        Ok(script) => script,
        Err(ScriptError::OutOfMemory) => {
            warn!("out of memory loading {}", path);
            engine.full_gc();
            return Begun::Abort;
        }
        Err(err) => {
            warn!("cannot load {}: {}", path, err);
            return Begun::Done(None);
        }
    };

    let job = ScriptJob { script, steps: 0 };
    let head = response::content_head(mime::content_type(suffix_of(path).as_deref()), None);
    match clnt.write(&head).await {
        Ok(()) => Begun::Streaming(job),
        Err(err) => {
            log_net(clnt.peer_addr(), err);
            Begun::Done(Some(job))
        }
    }
}

impl<S: ScriptEngine> ScriptJob<S> {
    /// One call of the script. A nil or empty result ends the response.
    pub(crate) async fn pas<C: Connection>(
        &mut self,
        engine: &mut S,
        clnt: &mut C,
        out_buf: usize,
        step_limit: u32,
    ) -> Progress {
        if self.steps >= step_limit {
            warn!("script stopped after {} steps", self.steps);
            return Progress::Done;
        }
        self.steps += 1;

        let result = engine.call(&mut self.script);
        engine.full_gc();
        let chunk = match result {
            Ok(Some(chunk)) if !chunk.is_empty() => chunk,
            Ok(_) => return Progress::Done,
            Err(err) => {
                warn!("script failed: {}", err);
                return Progress::Done;
            }
        };

        let mut out = chunk.as_bytes();
        if out.len() > out_buf {
            warn!("script output truncated from {} to {} bytes", out.len(), out_buf);
            out = &out[..out_buf];
        }
        match clnt.write(out).await {
            Ok(()) => Progress::More,
            Err(err) => {
                log_net(clnt.peer_addr(), err);
                Progress::Done
            }
        }
    }

    pub(crate) fn end(self, engine: &mut S) {
        engine.release(self.script);
        engine.full_gc();
    }
}

/// Runs the script at `path` once for a WebSocket frame and returns its
/// result. Failures are logged and produce no reply.
pub(crate) fn run_once<S: ScriptEngine>(engine: &mut S, path: &str, payload: &str) -> Option<String> {
    engine.set_query(&[]);
    engine.set_global(WS_DATA_GLOBAL, payload);
    let mut script = match engine.load(path) {
        Ok(script) => script,
        Err(err) => {
            warn!("cannot load {}: {}", path, err);
            return None;
        }
    };
    let result = engine.call(&mut script);
    engine.release(script);
    engine.full_gc();

    match result {
        Ok(out) => out,
        Err(err) => {
            warn!("script {} failed: {}", path, err);
            None
        }
    }
}
