//! Host loop: owns frame timing and the world snapshot between ticks.
//!
//! The host sends one request at a time and blocks until the sandbox
//! answers, so the snapshot is always owned by exactly one side. Input
//! events are buffered on the host and written into the snapshot just
//! before each update; edge-pressed keys are cleared after every tick.
//!
//! With a response timeout configured, a request that times out stays
//! outstanding. Its late reply is collected before the next request, which
//! hands the world snapshot back to the host.

use crate::config::EngineConfig;
use crate::error::{NodeScriptError, Result};
use crate::sandbox::{spawn_sandbox, ErrorDetail, SandboxBridge, SandboxRequest, SandboxResponse};
use crate::world::WorldSnapshot;
use crossbeam_channel::RecvTimeoutError;
use std::collections::BTreeSet;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// What happened on one init or update round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Continue,
    /// The game ended. The host will not send further updates.
    Ended,
    /// The sandbox reported an error. The returned snapshot was kept.
    Failed(ErrorDetail),
}

/// A request whose reply has not been collected yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outstanding {
    Load,
    Init,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostState {
    Idle,
    Loaded,
    Running,
    Ended,
}

/// Drives a sandbox thread frame by frame.
pub struct HostLoop {
    bridge: SandboxBridge,
    handle: Option<JoinHandle<()>>,
    /// `None` only if the sandbox never returned a snapshot.
    world: Option<WorldSnapshot>,
    held: BTreeSet<String>,
    pressed: BTreeSet<String>,
    state: HostState,
    outstanding: Option<Outstanding>,
    response_timeout: Option<Duration>,
    frame_delta: f64,
    frames: u64,
}

impl HostLoop {
    /// Spawn a sandbox thread configured from `config`, starting from the
    /// configured default world.
    pub fn spawn(config: &EngineConfig) -> Result<Self> {
        let (bridge, handle) = spawn_sandbox(&config.sandbox)?;
        Ok(Self {
            bridge,
            handle: Some(handle),
            world: Some(config.world.snapshot()),
            held: BTreeSet::new(),
            pressed: BTreeSet::new(),
            state: HostState::Idle,
            outstanding: None,
            response_timeout: config.host.response_timeout(),
            frame_delta: config.host.frame_delta(),
            frames: 0,
        })
    }

    /// Replace the world used by the next `init`.
    pub fn with_world(mut self, world: WorldSnapshot) -> Self {
        self.world = Some(world);
        self
    }

    pub fn world(&self) -> Option<&WorldSnapshot> {
        self.world.as_ref()
    }

    pub fn into_world(mut self) -> Option<WorldSnapshot> {
        self.world.take()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.state == HostState::Ended
    }

    /// Record a key press. A key that is already held is not pressed again.
    pub fn key_down(&mut self, key: impl Into<String>) {
        let key = key.into();
        if self.held.insert(key.clone()) {
            self.pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: &str) {
        self.held.remove(key);
    }

    /// Send a script to the sandbox. Load errors are returned as
    /// [`NodeScriptError::Script`].
    pub fn load(&mut self, code: impl Into<String>) -> Result<()> {
        self.settle()?;
        let request = SandboxRequest::Load { code: code.into() };
        let response = self.request(Outstanding::Load, request)?;
        self.loaded(response)
    }

    /// Initialize the loaded script with the current world.
    pub fn init(&mut self) -> Result<FrameOutcome> {
        self.settle()?;
        let ctx = self.take_world()?;
        let response = self.request(Outstanding::Init, SandboxRequest::Init { ctx })?;
        self.inited(response)
    }

    /// Advance one frame. After the game ended this returns
    /// [`FrameOutcome::Ended`] without contacting the sandbox.
    pub fn tick(&mut self, delta: f64) -> Result<FrameOutcome> {
        self.settle()?;
        if self.state == HostState::Ended {
            return Ok(FrameOutcome::Ended);
        }
        let mut ctx = self.take_world()?;
        ctx.input.held = self.held.clone();
        ctx.input.pressed = std::mem::take(&mut self.pressed);

        let request = SandboxRequest::Update { ctx, delta };
        let response = self.request(Outstanding::Update, request)?;
        self.updated(response)
    }

    /// Tick with a fixed delta until the game ends or `frames` have run.
    pub fn run_frames(&mut self, frames: u64, delta: f64) -> Result<FrameOutcome> {
        let mut last = FrameOutcome::Continue;
        for _ in 0..frames {
            last = self.tick(delta)?;
            if last == FrameOutcome::Ended {
                break;
            }
        }
        Ok(last)
    }

    /// Tick in real time at the configured frame rate, measuring the actual
    /// delta between frames. Stops when the game ends or after `max_frames`.
    pub fn run_realtime(&mut self, max_frames: Option<u64>) -> Result<FrameOutcome> {
        let target = Duration::from_secs_f64(self.frame_delta);
        let mut last_frame = Instant::now();
        let mut last = FrameOutcome::Continue;
        let mut ran = 0u64;

        while max_frames.map_or(true, |max| ran < max) {
            let frame_start = Instant::now();
            let delta = frame_start.duration_since(last_frame).as_secs_f64();
            last_frame = frame_start;

            last = self.tick(if ran == 0 { self.frame_delta } else { delta })?;
            ran += 1;
            if last == FrameOutcome::Ended {
                break;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < target {
                std::thread::sleep(target - elapsed);
            }
        }
        Ok(last)
    }

    /// Stop the sandbox thread and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.bridge.shutdown();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("sandbox thread panicked");
            }
        }
    }

    fn take_world(&mut self) -> Result<WorldSnapshot> {
        self.world.take().ok_or_else(|| {
            NodeScriptError::Channel("world snapshot was not returned by the sandbox".to_string())
        })
    }

    fn loaded(&mut self, response: SandboxResponse) -> Result<()> {
        match response {
            SandboxResponse::Loaded => {
                self.state = HostState::Loaded;
                tracing::info!("script loaded into sandbox");
                Ok(())
            }
            SandboxResponse::Error { detail, .. } => {
                self.state = HostState::Idle;
                tracing::error!(%detail, "sandbox rejected script");
                Err(NodeScriptError::Script(detail.to_string()))
            }
            other => Err(unexpected(&other)),
        }
    }

    fn inited(&mut self, response: SandboxResponse) -> Result<FrameOutcome> {
        let outcome = self.absorb(response)?;
        if outcome == FrameOutcome::Continue {
            self.state = HostState::Running;
            self.frames = 0;
        }
        Ok(outcome)
    }

    fn updated(&mut self, response: SandboxResponse) -> Result<FrameOutcome> {
        self.frames += 1;
        self.absorb(response)
    }

    /// Collect the reply to a request that timed out earlier. Fails with
    /// [`NodeScriptError::Timeout`] again if the sandbox is still busy.
    fn settle(&mut self) -> Result<()> {
        let Some(outstanding) = self.outstanding else {
            return Ok(());
        };
        let response = self.receive()?;
        self.outstanding = None;
        tracing::warn!(?outstanding, "collected late sandbox reply");

        match outstanding {
            Outstanding::Load => self.loaded(response),
            Outstanding::Init => self.inited(response).map(|_| ()),
            Outstanding::Update => self.updated(response).map(|_| ()),
        }
    }

    /// Store the snapshot carried by a response and classify it.
    fn absorb(&mut self, response: SandboxResponse) -> Result<FrameOutcome> {
        match response {
            SandboxResponse::Inited { ctx } | SandboxResponse::Updated { ctx } => {
                self.world = Some(ctx);
                Ok(FrameOutcome::Continue)
            }
            SandboxResponse::End { ctx } => {
                self.world = Some(ctx);
                self.state = HostState::Ended;
                tracing::info!(frames = self.frames, "game ended");
                Ok(FrameOutcome::Ended)
            }
            SandboxResponse::Error { detail, ctx } => {
                if ctx.is_some() {
                    self.world = ctx;
                }
                tracing::error!(%detail, "sandbox error");
                Ok(FrameOutcome::Failed(detail))
            }
            SandboxResponse::Loaded => Err(unexpected(&response)),
        }
    }

    /// Send one request and block for its response.
    fn request(&mut self, kind: Outstanding, request: SandboxRequest) -> Result<SandboxResponse> {
        self.bridge
            .request_tx
            .send(request)
            .map_err(|_| NodeScriptError::Channel("sandbox thread is gone".to_string()))?;

        let response = self.receive();
        if let Err(NodeScriptError::Timeout(_)) = &response {
            self.outstanding = Some(kind);
        }
        response
    }

    fn receive(&self) -> Result<SandboxResponse> {
        match self.response_timeout {
            None => self
                .bridge
                .response_rx
                .recv()
                .map_err(|_| NodeScriptError::Channel("sandbox thread is gone".to_string())),
            Some(timeout) => match self.bridge.response_rx.recv_timeout(timeout) {
                Ok(response) => Ok(response),
                Err(RecvTimeoutError::Timeout) => Err(NodeScriptError::Timeout(format!(
                    "sandbox did not answer within {:?}",
                    timeout
                ))),
                Err(RecvTimeoutError::Disconnected) => Err(NodeScriptError::Channel(
                    "sandbox thread is gone".to_string(),
                )),
            },
        }
    }
}

impl Drop for HostLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn unexpected(response: &SandboxResponse) -> NodeScriptError {
    NodeScriptError::Channel(format!("unexpected sandbox response: {:?}", response))
}
