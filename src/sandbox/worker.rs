//! Sandbox thread and the host-side channel handle.

use crate::config::SandboxLimits;
use crate::error::Result;
use crate::sandbox::executor::{SandboxExecutor, TickOutcome};
use crate::sandbox::{SandboxError, SandboxRequest, SandboxResponse};
use crate::world::WorldSnapshot;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::JoinHandle;

/// Channel capacity for requests (host → sandbox).
const REQUEST_CHANNEL_CAPACITY: usize = 4;
/// Channel capacity for responses (sandbox → host).
const RESPONSE_CHANNEL_CAPACITY: usize = 4;

/// Host-side handle for communicating with the sandbox thread.
pub struct SandboxBridge {
    pub request_tx: Sender<SandboxRequest>,
    pub response_rx: Receiver<SandboxResponse>,
}

impl SandboxBridge {
    /// Create a new bridge pair: `(bridge_for_host, request_rx, response_tx)`.
    ///
    /// The sandbox thread owns `request_rx` and `response_tx`.
    pub fn new() -> (Self, Receiver<SandboxRequest>, Sender<SandboxResponse>) {
        let (request_tx, request_rx) = bounded(REQUEST_CHANNEL_CAPACITY);
        let (response_tx, response_rx) = bounded(RESPONSE_CHANNEL_CAPACITY);
        (
            Self {
                request_tx,
                response_rx,
            },
            request_rx,
            response_tx,
        )
    }

    pub fn send(&self, request: SandboxRequest) -> bool {
        self.request_tx.send(request).is_ok()
    }

    pub fn shutdown(&self) {
        let _ = self.request_tx.send(SandboxRequest::Shutdown);
    }
}

/// Owns the executor and serves requests until shutdown or disconnect.
pub struct SandboxWorker {
    executor: SandboxExecutor,
    request_rx: Receiver<SandboxRequest>,
    response_tx: Sender<SandboxResponse>,
}

impl SandboxWorker {
    pub fn new(
        limits: &SandboxLimits,
        request_rx: Receiver<SandboxRequest>,
        response_tx: Sender<SandboxResponse>,
    ) -> Self {
        Self {
            executor: SandboxExecutor::new(limits),
            request_rx,
            response_tx,
        }
    }

    /// Run the request loop on the current thread.
    pub fn run(mut self) {
        tracing::debug!("sandbox worker started");
        while let Ok(request) = self.request_rx.recv() {
            let Some(response) = self.handle(request) else {
                break;
            };
            if self.response_tx.send(response).is_err() {
                tracing::debug!("host hung up; sandbox worker exiting");
                break;
            }
        }
        tracing::debug!("sandbox worker stopped");
    }

    /// Serve one request. `None` means shut down.
    pub fn handle(&mut self, request: SandboxRequest) -> Option<SandboxResponse> {
        let response = match request {
            SandboxRequest::Load { code } => match self.executor.load(&code) {
                Ok(()) => SandboxResponse::Loaded,
                Err(err) => failure(err, None),
            },
            SandboxRequest::Init { mut ctx } => match self.executor.init(&mut ctx) {
                Ok(TickOutcome::Continue) => SandboxResponse::Inited { ctx },
                Ok(TickOutcome::Ended) => SandboxResponse::End { ctx },
                Err(err) => failure(err, Some(ctx)),
            },
            SandboxRequest::Update { mut ctx, delta } => {
                match self.executor.tick(&mut ctx, delta) {
                    Ok(TickOutcome::Continue) => SandboxResponse::Updated { ctx },
                    Ok(TickOutcome::Ended) => SandboxResponse::End { ctx },
                    Err(err) => failure(err, Some(ctx)),
                }
            }
            SandboxRequest::Shutdown => return None,
        };
        Some(response)
    }
}

fn failure(err: SandboxError, ctx: Option<WorldSnapshot>) -> SandboxResponse {
    let detail = err.detail();
    tracing::warn!(phase = %detail.phase, "{}", detail);
    SandboxResponse::Error { detail, ctx }
}

/// Spawn a sandbox thread. Returns the host-side bridge and the thread
/// handle; the thread exits on `Shutdown` or when the bridge is dropped.
pub fn spawn_sandbox(limits: &SandboxLimits) -> Result<(SandboxBridge, JoinHandle<()>)> {
    let (bridge, request_rx, response_tx) = SandboxBridge::new();
    let worker = SandboxWorker::new(limits, request_rx, response_tx);
    let handle = std::thread::Builder::new()
        .name("sandbox".to_string())
        .spawn(move || worker.run())?;
    Ok((bridge, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::Phase;

    #[test]
    fn test_round_trip_over_channels() {
        let (bridge, handle) = spawn_sandbox(&SandboxLimits::default()).unwrap();

        bridge.send(SandboxRequest::Load {
            code: r#"fn init() { this.variables["ready"] = true; }"#.into(),
        });
        assert!(matches!(
            bridge.response_rx.recv().unwrap(),
            SandboxResponse::Loaded
        ));

        bridge.send(SandboxRequest::Init {
            ctx: WorldSnapshot::default(),
        });
        match bridge.response_rx.recv().unwrap() {
            SandboxResponse::Inited { ctx } => {
                assert_eq!(ctx.variable("ready"), Some(&serde_json::json!(true)))
            }
            other => panic!("unexpected response {:?}", other),
        }

        bridge.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn test_load_error_has_no_ctx() {
        let (bridge, request_rx, response_tx) = SandboxBridge::new();
        let mut worker = SandboxWorker::new(&SandboxLimits::default(), request_rx, response_tx);
        let response = worker.handle(SandboxRequest::Load {
            code: "fn (".into(),
        });
        match response {
            Some(SandboxResponse::Error { detail, ctx }) => {
                assert_eq!(detail.phase, Phase::Load);
                assert!(ctx.is_none());
            }
            other => panic!("unexpected response {:?}", other),
        }
        drop(bridge);
    }

    #[test]
    fn test_update_before_init_returns_ctx() {
        let (_bridge, request_rx, response_tx) = SandboxBridge::new();
        let mut worker = SandboxWorker::new(&SandboxLimits::default(), request_rx, response_tx);
        let response = worker.handle(SandboxRequest::Update {
            ctx: WorldSnapshot::default(),
            delta: 0.1,
        });
        match response {
            Some(SandboxResponse::Error { detail, ctx }) => {
                assert_eq!(detail.phase, Phase::Protocol);
                assert!(ctx.is_some());
            }
            other => panic!("unexpected response {:?}", other),
        }
        assert!(worker.handle(SandboxRequest::Shutdown).is_none());
    }
}
