//! Common test helpers for the CXA bridge crates
//!
//! - Condition-based waiting (no hardcoded sleeps)
//! - [`TestBridge`], a memory-backed amplifier + listener fixture that
//!   cleans up on drop

use cxa_bridge::{
    Amplifier, AmplifierConfig, HttpServer, HttpServerConfig, MalformedFramePolicy,
    ReplyListener, Result as BridgeResult, Simulator,
};
use cxa_core::DeviceState;
use cxa_transport::{MemoryDevice, MemoryTransport};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default test timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default condition check interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Condition-Based Waiting
// ============================================================================

/// Wait for a condition with timeout
pub async fn wait_for<F, Fut>(check: F, interval: Duration, max_wait: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = Instant::now();
    while start.elapsed() < max_wait {
        if check().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }
    false
}

/// Wait until the amplifier's state satisfies `pred`
pub async fn wait_for_state<P>(amp: &Amplifier, pred: P) -> bool
where
    P: Fn(&DeviceState) -> bool,
{
    wait_for(
        || {
            let state = amp.snapshot();
            let ok = pred(&state);
            async move { ok }
        },
        DEFAULT_CHECK_INTERVAL,
        DEFAULT_TIMEOUT,
    )
    .await
}

// ============================================================================
// Test Bridge - RAII wrapper with proper cleanup
// ============================================================================

/// Amplifier and reply listener wired to a memory transport
pub struct TestBridge {
    pub amp: Amplifier,
    device: Option<MemoryDevice>,
    cancel: CancellationToken,
    listener: Option<JoinHandle<BridgeResult<()>>>,
    simulator: Option<JoinHandle<()>>,
    server: Option<HttpServer>,
}

impl TestBridge {
    /// Start with default settings; the test drives the device end
    pub fn start() -> Self {
        Self::start_with(AmplifierConfig::default(), MalformedFramePolicy::default())
    }

    pub fn start_with(config: AmplifierConfig, policy: MalformedFramePolicy) -> Self {
        let (sender, receiver, device) = MemoryTransport::pair();
        let amp = Amplifier::new(sender, config);
        let cancel = CancellationToken::new();

        let listener = ReplyListener::new(receiver, amp.store().clone())
            .with_policy(policy)
            .spawn(cancel.child_token());

        Self {
            amp,
            device: Some(device),
            cancel,
            listener: Some(listener),
            simulator: None,
            server: None,
        }
    }

    /// Start with a [`Simulator`] answering on the device end
    pub fn start_simulated(powered: bool) -> Self {
        Self::start_simulated_with(|sim| if powered { sim.powered_on() } else { sim })
    }

    /// Start with a [`Simulator`] prepared by `configure`
    pub fn start_simulated_with<F>(configure: F) -> Self
    where
        F: FnOnce(Simulator) -> Simulator,
    {
        let mut bridge = Self::start();
        if let Some(device) = bridge.device.take() {
            let sim = configure(Simulator::new(device));
            bridge.simulator = Some(sim.spawn(bridge.cancel.child_token()));
        }
        bridge
    }

    /// Device end of the transport. Panics for simulated bridges.
    pub fn device(&mut self) -> &mut MemoryDevice {
        self.device
            .as_mut()
            .expect("device end is owned by the simulator")
    }

    /// Serve the HTTP API on an ephemeral local port
    pub async fn serve(&mut self, mut config: HttpServerConfig) -> SocketAddr {
        config.bind = "127.0.0.1:0".to_string();
        let mut server = HttpServer::new(self.amp.clone(), config);
        let addr = server.start().await.unwrap();
        self.server = Some(server);
        addr
    }

    /// Wait for the listener to finish and return its result
    pub async fn join_listener(&mut self) -> Option<BridgeResult<()>> {
        let handle = self.listener.take()?;
        tokio::time::timeout(DEFAULT_TIMEOUT, handle)
            .await
            .ok()
            .map(|joined| joined.unwrap())
    }

    /// Cancel background tasks and stop the HTTP server
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(mut server) = self.server.take() {
            let _ = server.stop().await;
        }
        if let Some(handle) = self.listener.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.simulator.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestBridge {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
