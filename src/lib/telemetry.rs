//! Tracing initialization and the per-run launch span.

use std::time::Instant;

use anyhow::Result;
use tracing::{info, info_span, Span};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// Initialize `tracing` and format developer logs on stderr.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Span helper recording the start and outcome of one launcher run.
pub struct LaunchSpan {
    span: Span,
    started_at: Instant,
    run_id: Uuid,
}

impl LaunchSpan {
    /// Start a run span.
    pub fn start(mode: &'static str) -> Self {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            target: "inspector_launcher::launch",
            "launcher_run",
            %run_id,
            mode
        );
        Self {
            span,
            started_at: Instant::now(),
            run_id,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Span to enter while the run executes.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Close the span while recording status and elapsed time.
    pub fn finish(self, status: &'static str) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let _entered = self.span.enter();
        info!(
            target: "inspector_launcher::launch",
            run_id = %self.run_id,
            status,
            elapsed_ms,
            "Launcher run finished"
        );
    }
}
