/*!
 * plamo-translate adapters.
 *
 * `PlamoCli` spawns one `plamo-translate` process per call, which reloads the
 * model every time. `PlamoServer` additionally keeps a `plamo-translate server`
 * process alive so that subsequent CLI calls reuse the loaded model.
 */

use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use super::Translator;
use super::process::{run_tool, spawn_error};
use crate::app_config::TranslatorConfig;
use crate::errors::ProviderError;
use crate::language_utils::get_language_name;

/// Interval between liveness checks while the server is starting
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One process per translate call
#[derive(Debug, Clone)]
pub struct PlamoCli {
    binary: String,
    timeout: Duration,
}

impl PlamoCli {
    pub fn new(config: &TranslatorConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Build the argument list for a translation between two language codes
    pub fn translate_args(from: &str, to: &str) -> Result<Vec<String>, ProviderError> {
        let from_name = get_language_name(from)
            .map_err(|_| ProviderError::InvalidInput(format!("unsupported source language '{}'", from)))?;
        let to_name = get_language_name(to)
            .map_err(|_| ProviderError::InvalidInput(format!("unsupported target language '{}'", to)))?;

        Ok(vec![
            "--from".to_string(),
            from_name,
            "--to".to_string(),
            to_name,
        ])
    }

    async fn run_translation(
        &self,
        text: &str,
        from: &str,
        to: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        if text.trim().is_empty() {
            return Err(ProviderError::InvalidInput("text to translate is empty".to_string()));
        }

        let args = Self::translate_args(from, to)?;
        let output = run_tool(&self.binary, &args, Some(text), self.timeout, cancel).await?;
        let translated = output.stdout.trim().to_string();

        if translated.is_empty() {
            return Err(ProviderError::ParseError(format!("{} returned no text", self.binary)));
        }

        Ok(translated)
    }
}

#[async_trait]
impl Translator for PlamoCli {
    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        self.run_translation(text, from, to, cancel).await
    }

    async fn start_server(&self, _cancel: &CancellationToken) -> Result<(), ProviderError> {
        Ok(())
    }

    fn stop_server(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "plamo-cli"
    }
}

/// CLI translation backed by a long-lived server process
#[derive(Debug)]
pub struct PlamoServer {
    cli: PlamoCli,
    startup_wait: Duration,
    /// Running server process; guards start/stop transitions
    child: Mutex<Option<Child>>,
}

impl PlamoServer {
    pub fn new(config: &TranslatorConfig) -> Self {
        Self {
            cli: PlamoCli::new(config),
            startup_wait: Duration::from_secs(config.server_startup_secs),
            child: Mutex::new(None),
        }
    }

    /// Whether a server process is currently held and still alive
    pub fn is_running(&self) -> bool {
        let mut guard = self.child.lock();
        match guard.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Spawn the server unless one is already alive; returns whether a new process was spawned
    fn spawn_if_needed(&self) -> Result<bool, ProviderError> {
        let mut guard = self.child.lock();

        if let Some(child) = guard.as_mut() {
            match child.try_wait() {
                Ok(None) => return Ok(false),
                Ok(Some(status)) => warn!("Translator server exited ({}), restarting", status),
                Err(e) => warn!("Could not query translator server state ({}), restarting", e),
            }
            *guard = None;
        }

        let child = Command::new(&self.cli.binary)
            .arg("server")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&self.cli.binary, e))?;

        info!(
            "Started translator server {} (pid {})",
            self.cli.binary,
            child.id().map(|id| id.to_string()).unwrap_or_else(|| "?".to_string())
        );
        *guard = Some(child);
        Ok(true)
    }

    /// Check the freshly spawned server has not died; `Err` carries the exit description
    fn check_alive(&self) -> Result<(), String> {
        let mut guard = self.child.lock();
        let Some(child) = guard.as_mut() else {
            return Err("server was stopped during startup".to_string());
        };

        match child.try_wait() {
            Ok(None) => Ok(()),
            Ok(Some(status)) => {
                *guard = None;
                Err(format!("server exited during startup: {}", status))
            }
            Err(e) => {
                *guard = None;
                Err(e.to_string())
            }
        }
    }
}

#[async_trait]
impl Translator for PlamoServer {
    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        self.cli.run_translation(text, from, to, cancel).await
    }

    async fn start_server(&self, cancel: &CancellationToken) -> Result<(), ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        if !self.spawn_if_needed()? {
            debug!("Translator server already running");
            return Ok(());
        }

        let deadline = Instant::now() + self.startup_wait;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }

            let pause = STARTUP_POLL_INTERVAL.min(deadline - now);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.stop_server()?;
                    return Err(ProviderError::Cancelled);
                }
                _ = tokio::time::sleep(pause) => {}
            }

            self.check_alive().map_err(ProviderError::ServerUnavailable)?;
        }
    }

    fn stop_server(&self) -> Result<(), ProviderError> {
        let mut guard = self.child.lock();
        let Some(mut child) = guard.take() else {
            return Ok(());
        };

        if let Ok(Some(status)) = child.try_wait() {
            debug!("Translator server had already exited ({})", status);
            return Ok(());
        }

        child.start_kill().map_err(|e| {
            ProviderError::ServerUnavailable(format!("failed to stop translator server: {}", e))
        })?;
        info!("Stopped translator server");
        Ok(())
    }

    fn name(&self) -> &str {
        "plamo-server"
    }
}
