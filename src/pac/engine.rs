// src/pac/engine.rs
//! The script host: one JavaScript engine instance running PAC scripts.
//!
//! A boa `Context` cannot leave the thread that created it, so every
//! `ScriptHost` owns a dedicated engine thread. Callers submit jobs over a
//! channel and block on the reply; the engine thread holds the host's
//! [`EngineLock`] for the duration of each job.
//!
//! Network lookups made by a script run on a helper thread with the lock
//! released. While one is pending the engine thread keeps taking jobs off
//! the queue, so a slow lookup holds up only the call that made it.

use super::bindings::{self, BindingHost};
use super::lock::EngineLock;
use super::platform;
use super::strings;
use crate::config::EngineConfig;
use crate::error::{EvalError, InitError};
use crate::interface::{ErrorListener, ProxyBindings};
use boa_engine::{Context, JsError, JsObject, JsString, JsValue, Source};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The function every PAC script must define.
pub const ENTRY_FUNCTION: &str = "FindProxyForURL";

pub const UTILITY_RESOURCE: &str = "proxy-pac-utility-script.js";
pub const SCRIPT_RESOURCE: &str = "proxy-pac-script.js";
const BINDINGS_RESOURCE: &str = "proxy-pac-bindings";

/// Generic PAC helpers followed by the Microsoft extension helpers.
const UTILITY_SCRIPT: &str = concat!(include_str!("pac_utils.js"), include_str!("pac_utils_ex.js"));

/// How often a binding waiting on a lookup checks whether it has finished.
const LOOKUP_POLL: Duration = Duration::from_millis(5);

pub(crate) enum Job {
    Load {
        script: Arc<str>,
        reply: Sender<Result<(), InitError>>,
    },
    Evaluate {
        url: String,
        host: String,
        reply: Sender<Result<String, EvalError>>,
    },
    Purge,
}

/// The engine thread's inbox.
///
/// Jobs that cannot run while a lookup is pending (script loads, and
/// evaluations while a script is still loading) are parked in `deferred`
/// and run, in order, before anything newer is received.
pub(crate) struct JobQueue {
    receiver: Mutex<Receiver<Job>>,
    deferred: Mutex<VecDeque<Job>>,
    evaluating: AtomicBool,
}

enum Poll {
    Job(Job),
    Idle,
    Stop,
}

impl JobQueue {
    pub(crate) fn new(receiver: Receiver<Job>) -> Self {
        JobQueue {
            receiver: Mutex::new(receiver),
            deferred: Mutex::new(VecDeque::new()),
            evaluating: AtomicBool::new(false),
        }
    }

    /// Next job for the main loop. `None` once every sender is gone.
    fn next(&self) -> Option<Job> {
        let parked = self.deferred.lock().pop_front();
        if parked.is_some() {
            return parked;
        }
        self.receiver.lock().recv().ok()
    }

    /// Next job for a binding that is waiting on a lookup. Stops handing out
    /// work once something had to be deferred, so nothing overtakes it.
    fn poll(&self, timeout: Duration) -> Poll {
        if !self.deferred.lock().is_empty() {
            return Poll::Stop;
        }
        match self.receiver.lock().recv_timeout(timeout) {
            Ok(job) => Poll::Job(job),
            Err(RecvTimeoutError::Timeout) => Poll::Idle,
            Err(RecvTimeoutError::Disconnected) => Poll::Stop,
        }
    }

    fn defer(&self, job: Job) {
        self.deferred.lock().push_back(job);
    }
}

/// Runs `lookup` on a helper thread with the engine lock released and serves
/// queued jobs on the engine thread until it returns.
pub(crate) fn wait_for<T, F>(host: &BindingHost, context: &mut Context, lookup: F) -> T
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    host.lock.unlocked(|| {
        thread::scope(|scope| {
            let pending = scope.spawn(lookup);
            while !pending.is_finished() {
                match host.queue.poll(LOOKUP_POLL) {
                    Poll::Job(job) => serve_while_waiting(host, context, job),
                    Poll::Idle => {}
                    Poll::Stop => break,
                }
            }
            match pending.join() {
                Ok(value) => value,
                Err(payload) => panic::resume_unwind(payload),
            }
        })
    })
}

fn serve_while_waiting(host: &BindingHost, context: &mut Context, job: Job) {
    match job {
        Job::Evaluate {
            url,
            host: target,
            reply,
        } if host.queue.evaluating.load(Ordering::Acquire) => {
            let _guard = host.lock.acquire();
            debug!("Evaluating {} while a lookup is pending", url);
            let _ = reply.send(call_entry(context, &url, &target, host.listener.as_ref()));
        }
        Job::Purge => {
            let _guard = host.lock.acquire();
            boa_gc::force_collect();
        }
        other => host.queue.defer(other),
    }
}

pub struct ScriptHost {
    id: u64,
    ready: AtomicBool,
    lock: Arc<EngineLock>,
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl ScriptHost {
    /// Starts an engine thread with no script loaded.
    pub fn new(
        bindings: Arc<dyn ProxyBindings>,
        listener: Arc<dyn ErrorListener>,
        config: EngineConfig,
    ) -> std::io::Result<Self> {
        let platform = platform::init();
        let id = platform.next_engine_id();
        let lock = Arc::new(EngineLock::new());
        let (jobs, queue) = mpsc::channel();
        let host = Arc::new(BindingHost {
            bindings,
            listener,
            lock: Arc::clone(&lock),
            queue: JobQueue::new(queue),
        });

        let stack_size = config.thread_stack_size;
        let worker = thread::Builder::new()
            .name(format!("pac-engine-{}", id))
            .stack_size(stack_size)
            .spawn(move || {
                Engine {
                    id,
                    config,
                    host,
                    active: None,
                }
                .run()
            })?;
        debug!("PAC engine {} started on {}", id, platform.engine_version());

        Ok(ScriptHost {
            id,
            ready: AtomicBool::new(false),
            lock,
            jobs: Some(jobs),
            worker: Some(worker),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// True once a script has loaded successfully.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Replaces the active script. The previous context is torn down first,
    /// whatever the outcome.
    pub fn load_script(&self, script: Arc<str>) -> Result<(), InitError> {
        self.ready.store(false, Ordering::Release);
        let (reply, response) = mpsc::channel();
        if !self.submit(Job::Load { script, reply }) {
            return Err(InitError::EngineUnavailable);
        }
        let outcome = response.recv().unwrap_or(Err(InitError::EngineUnavailable));
        self.ready.store(outcome.is_ok(), Ordering::Release);
        outcome
    }

    /// Calls `FindProxyForURL(url, host)` and returns its ASCII result.
    pub fn evaluate(&self, url: &str, host: &str) -> Result<String, EvalError> {
        if !self.is_ready() {
            return Err(EvalError::NotInitialized);
        }
        let (reply, response) = mpsc::channel();
        let job = Job::Evaluate {
            url: url.to_string(),
            host: host.to_string(),
            reply,
        };
        if !self.submit(job) {
            return Err(EvalError::EngineUnavailable);
        }
        response.recv().unwrap_or(Err(EvalError::EngineUnavailable))
    }

    /// Asks the engine to collect garbage. Does not wait for it.
    pub fn purge_memory(&self) {
        if self.is_ready() {
            self.submit(Job::Purge);
        }
    }

    fn submit(&self, job: Job) -> bool {
        match &self.jobs {
            Some(jobs) => jobs.send(job).is_ok(),
            None => false,
        }
    }
}

impl Drop for ScriptHost {
    fn drop(&mut self) {
        // Closing the queue stops the engine thread after its last job.
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("PAC engine {} thread panicked", self.id);
            }
        }
        debug_assert!(!self.lock.is_held());
    }
}

/// Engine-thread state.
struct Engine {
    id: u64,
    config: EngineConfig,
    host: Arc<BindingHost>,
    active: Option<ExecutionContext>,
}

impl Engine {
    fn run(mut self) {
        let host = Arc::clone(&self.host);
        let lock = &host.lock;
        while let Some(job) = host.queue.next() {
            let _guard = lock.acquire();
            match job {
                Job::Load { script, reply } => {
                    let _ = reply.send(self.load(&script));
                }
                Job::Evaluate { url, host, reply } => {
                    let _ = reply.send(self.evaluate(&url, &host));
                }
                Job::Purge => self.purge(),
            }
        }
        let _guard = lock.acquire();
        self.teardown();
        debug!("PAC engine {} stopped", self.id);
    }

    fn load(&mut self, script: &str) -> Result<(), InitError> {
        self.teardown();
        if script.is_empty() {
            warn!("PAC engine {}: refusing empty script", self.id);
            return Err(InitError::Empty);
        }
        let context = ExecutionContext::build(script, &self.config, &self.host)?;
        info!("PAC engine {}: script loaded ({} bytes)", self.id, script.len());
        self.active = Some(context);
        Ok(())
    }

    fn evaluate(&mut self, url: &str, host: &str) -> Result<String, EvalError> {
        let listener = Arc::clone(&self.host.listener);
        let active = self.active.as_mut().ok_or(EvalError::NotInitialized)?;
        self.host.queue.evaluating.store(true, Ordering::Release);
        let outcome = call_entry(&mut active.context, url, host, listener.as_ref());
        self.host.queue.evaluating.store(false, Ordering::Release);
        if let Err(e) = &outcome {
            debug!("PAC engine {}: evaluation of {} failed: {}", self.id, url, e);
        }
        outcome
    }

    fn purge(&mut self) {
        if self.active.is_some() {
            boa_gc::force_collect();
            debug!("PAC engine {}: garbage collected", self.id);
        }
    }

    fn teardown(&mut self) {
        if self.active.take().is_some() {
            debug!("PAC engine {}: previous script discarded", self.id);
        }
    }
}

/// Bindings, utility library and user script compiled into one context.
/// Only ever constructed complete.
struct ExecutionContext {
    context: Context,
}

impl ExecutionContext {
    fn build(
        script: &str,
        config: &EngineConfig,
        host: &Arc<BindingHost>,
    ) -> Result<Self, InitError> {
        let mut context = Context::default();
        context.set_runtime_limits(config.runtime_limits());
        if let Err(e) = bindings::install(&mut context, host) {
            return Err(compile_failure(host.listener.as_ref(), BINDINGS_RESOURCE, e.to_string()));
        }

        let mut compiled = ExecutionContext { context };
        let listener = host.listener.as_ref();
        compiled.run_script(UTILITY_SCRIPT, UTILITY_RESOURCE, listener)?;
        compiled.run_script(script, SCRIPT_RESOURCE, listener)?;

        if entry_function(&mut compiled.context).is_none() {
            warn!("PAC script does not define {}()", ENTRY_FUNCTION);
            return Err(InitError::EntryMissing);
        }
        Ok(compiled)
    }

    fn run_script(
        &mut self,
        text: &str,
        resource: &'static str,
        listener: &dyn ErrorListener,
    ) -> Result<(), InitError> {
        match self.context.eval(Source::from_bytes(text.as_bytes())) {
            Ok(_) => Ok(()),
            Err(e) => {
                let message = describe(e, &mut self.context);
                Err(compile_failure(listener, resource, message))
            }
        }
    }
}

/// Reports a failed load step to the listener.
fn compile_failure(listener: &dyn ErrorListener, resource: &'static str, message: String) -> InitError {
    listener.error_message(&format!("{}: {}", resource, message));
    InitError::CompileFailure { resource, message }
}

/// Looked up on every call: the script is free to reassign it.
fn entry_function(context: &mut Context) -> Option<JsObject> {
    let global = context.global_object();
    let value = global.get(JsString::from(ENTRY_FUNCTION), context).ok()?;
    value.as_callable().cloned()
}

fn call_entry(
    context: &mut Context,
    url: &str,
    host: &str,
    listener: &dyn ErrorListener,
) -> Result<String, EvalError> {
    let Some(function) = entry_function(context) else {
        listener.error_message("FindProxyForURL() is undefined");
        return Err(EvalError::EntryMissing);
    };

    let this = JsValue::from(context.global_object());
    let args = [strings::to_js_value(url), strings::to_js_value(host)];
    let result = match function.call(&this, &args, context) {
        Ok(result) => result,
        Err(e) => {
            let message = describe(e, context);
            listener.error_message(&message);
            return Err(EvalError::ThrowFailure(message));
        }
    };

    let Some(text) = result.as_string() else {
        listener.error_message("FindProxyForURL() did not return a string.");
        return Err(EvalError::ReturnNotString);
    };
    strings::ascii_from_js(text).ok_or_else(|| {
        listener.error_message("FindProxyForURL() returned a non-ASCII string");
        EvalError::NonAsciiResult
    })
}

/// Text of a script exception, as `String(exception)` would render it.
fn describe(error: JsError, context: &mut Context) -> String {
    if let Some(value) = error.as_opaque() {
        if let Ok(text) = value.to_string(context) {
            return strings::to_utf8(&text);
        }
    }
    error.to_string()
}
