//! In-memory remote used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use tgbucket_protocol::constants::{GET_FILE, SAVE_BIG_FILE_PART};
use tgbucket_protocol::{
    CallRoute, GetFile, InputFileLocation, RpcError, SaveBigFilePart, UploadFile,
};

use crate::caller::{CallError, RemoteCaller};

/// One scripted reaction to a call.
pub enum Step {
    Reply(Result<Value, CallError>),
    /// Behave like an ordinary remote for this call.
    Passthrough,
}

impl Step {
    pub fn ok(value: Value) -> Self {
        Step::Reply(Ok(value))
    }

    pub fn rpc(code: i32, message: &str) -> Self {
        Step::Reply(Err(CallError::Rpc(RpcError::new(code, message))))
    }

    pub fn transport(message: &str) -> Self {
        Step::Reply(Err(CallError::Transport(message.into())))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub params: Value,
    pub route: CallRoute,
}

type Hook = Box<dyn Fn(&RecordedCall) + Send + Sync>;

/// Stores uploaded parts, serves file windows and replays scripted failures.
#[derive(Default)]
pub struct FakeRemote {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<RecordedCall>>,
    parts: Mutex<HashMap<i64, Vec<(u32, Vec<u8>)>>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    dc_switches: Mutex<Vec<i32>>,
    hook: Mutex<Option<Hook>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers downloadable content under `file_id`.
    pub fn with_file(self, file_id: &str, content: Vec<u8>) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(file_id.to_string(), content);
        self
    }

    /// Queues reactions for the next calls of `method`. Once the queue is
    /// drained the method behaves normally again.
    pub fn script(&self, method: &str, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .extend(steps);
    }

    /// Runs `hook` whenever a call is received.
    pub fn on_call(&self, hook: impl Fn(&RecordedCall) + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    /// Decoded part requests, in the order they were received.
    pub fn part_requests(&self) -> Vec<SaveBigFilePart> {
        self.calls_of(SAVE_BIG_FILE_PART)
            .into_iter()
            .map(|c| serde_json::from_value(c.params).unwrap())
            .collect()
    }

    /// Decoded window requests, in the order they were received.
    pub fn window_requests(&self) -> Vec<GetFile> {
        self.calls_of(GET_FILE)
            .into_iter()
            .map(|c| serde_json::from_value(c.params).unwrap())
            .collect()
    }

    pub fn stored_parts(&self, file_id: i64) -> Vec<(u32, Vec<u8>)> {
        self.parts
            .lock()
            .unwrap()
            .get(&file_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn default_dc_switches(&self) -> Vec<i32> {
        self.dc_switches.lock().unwrap().clone()
    }

    /// Highest number of calls that were ever in progress at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn respond(&self, call: &RecordedCall) -> Result<Value, CallError> {
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&call.method)
            .and_then(VecDeque::pop_front);
        match step {
            Some(Step::Reply(reply)) => reply,
            Some(Step::Passthrough) | None => self.serve(call),
        }
    }

    fn serve(&self, call: &RecordedCall) -> Result<Value, CallError> {
        match call.method.as_str() {
            SAVE_BIG_FILE_PART => {
                let req: SaveBigFilePart = serde_json::from_value(call.params.clone())
                    .map_err(|e| CallError::Transport(e.to_string()))?;
                self.parts
                    .lock()
                    .unwrap()
                    .entry(req.file_id)
                    .or_default()
                    .push((req.file_part, req.bytes));
                Ok(json!(true))
            }
            GET_FILE => {
                let req: GetFile = serde_json::from_value(call.params.clone())
                    .map_err(|e| CallError::Transport(e.to_string()))?;
                let InputFileLocation::Document { id, .. } = &req.location;
                let files = self.files.lock().unwrap();
                let Some(content) = files.get(id) else {
                    return Err(CallError::Rpc(RpcError::new(400, "FILE_ID_INVALID")));
                };
                let start = (req.offset as usize).min(content.len());
                let end = (start + req.limit as usize).min(content.len());
                let window = UploadFile {
                    bytes: content[start..end].to_vec(),
                    mtime: 0,
                };
                Ok(serde_json::to_value(window).unwrap())
            }
            other => Err(CallError::Transport(format!("unknown method {other}"))),
        }
    }
}

impl RemoteCaller for FakeRemote {
    async fn call(
        &self,
        method: &str,
        params: &Value,
        route: &CallRoute,
    ) -> Result<Value, CallError> {
        let call = RecordedCall {
            method: method.to_string(),
            params: params.clone(),
            route: *route,
        };
        self.calls.lock().unwrap().push(call.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(&call);
        }
        let reply = self.respond(&call);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }

    async fn set_default_dc(&self, dc_id: i32) -> Result<(), CallError> {
        self.dc_switches.lock().unwrap().push(dc_id);
        Ok(())
    }
}
