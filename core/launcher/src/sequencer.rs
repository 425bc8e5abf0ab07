//! FILENAME: core/launcher/src/sequencer.rs
//! PURPOSE: The startup state machine: database adapter, then server, then
//! presentation.
//! CONTEXT: Each stage settles fully before the next begins, by sequential
//! continuation on the single logical thread. A database-stage error
//! freezes the launcher in Degraded; an adapter that merely reports
//! unsuccessful initialization does not stop the sequence. Re-entrant
//! activation is guarded by the state, never by the window reference
//! alone.

use std::rc::Rc;

use script_host::{PumpOutcome, ScriptContext, ScriptHost};

use crate::config::LaunchConfig;
use crate::environment::{EnvironmentCapability, ReadySignal, SharedEnvironment};
use crate::lifecycle::LifecycleEvent;
use crate::presentation::{PresentationHost, WindowSpec};

/// Startup progress. `Degraded` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupState {
    Idle,
    DatabaseStarting,
    ServerStarting,
    Ready,
    Degraded,
}

pub struct StartupSequencer {
    config: LaunchConfig,
    environment: SharedEnvironment,
    host: ScriptHost,
    presentation: Box<dyn PresentationHost>,
    state: StartupState,
    server: Option<ScriptContext>,
    ready: ReadySignal,
}

impl StartupSequencer {
    pub fn new(
        config: LaunchConfig,
        environment: SharedEnvironment,
        host: ScriptHost,
        presentation: Box<dyn PresentationHost>,
    ) -> Self {
        StartupSequencer {
            config,
            environment,
            host,
            presentation,
            state: StartupState::Idle,
            server: None,
            ready: ReadySignal::new(),
        }
    }

    pub fn state(&self) -> StartupState {
        self.state
    }

    pub fn environment(&self) -> &SharedEnvironment {
        &self.environment
    }

    /// How many times the current server signaled readiness.
    pub fn ready_count(&self) -> u32 {
        self.ready.count()
    }

    pub fn server_loaded(&self) -> bool {
        self.server.is_some()
    }

    /// Feed one process lifecycle signal into the machine.
    pub fn handle_event(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Ready | LifecycleEvent::Reactivate => self.activate(),
            LifecycleEvent::AllWindowsClosed => self.window_closed(),
        }
    }

    /// The closed notification from the presentation host. Clears the
    /// stored window reference and returns to Idle so a later reactivation
    /// restarts the full sequence.
    pub fn window_closed(&mut self) {
        self.environment.borrow_mut().clear_window();
        if self.state == StartupState::Ready {
            self.server = None;
            self.state = StartupState::Idle;
            log::info!("window closed; launcher idle");
        }
    }

    /// Idle -> DatabaseStarting -> ServerStarting -> Ready, with the
    /// guards and failure policy described on each stage.
    fn activate(&mut self) {
        match self.state {
            StartupState::Idle => {}
            StartupState::Degraded => {
                log::warn!("activation ignored: launcher is degraded");
                return;
            }
            other => {
                log::debug!("activation ignored: startup already active ({:?})", other);
                return;
            }
        }

        self.state = StartupState::DatabaseStarting;
        let adapter_name = self.config.database_adapter.clone();
        log::info!("starting database adapter {}", adapter_name);

        let capabilities = self.environment.borrow().capability_template().clone();
        let timeout = self.config.init_timeout();
        // the registry leaves the environment while scripts run: a timer
        // callback surviving from an earlier cycle may re-enter the
        // environment mid-pump, and no borrow can be held across that
        let mut registry =
            std::mem::take(self.environment.borrow_mut().registry_mut());
        let started = registry.start(&adapter_name, &self.host, &capabilities, timeout);
        *self.environment.borrow_mut().registry_mut() = registry;

        match started {
            Err(err) => {
                // thrown, not merely false-reported: freeze with no server
                // and no window, process stays up
                log::error!("database adapter {} failed to start: {}", adapter_name, err);
                self.state = StartupState::Degraded;
            }
            Ok(reported) => {
                if !reported {
                    log::warn!(
                        "adapter {} reported unsuccessful initialization; continuing startup",
                        adapter_name
                    );
                }
                self.start_server();
            }
        }
    }

    /// Load the server module with the widened capability set and wait for
    /// its readiness signal, then issue the one window-creation call.
    fn start_server(&mut self) {
        self.state = StartupState::ServerStarting;
        self.ready = ReadySignal::new();

        let capabilities = {
            let environment = self.environment.borrow();
            environment.capability_template().extended(
                "environment",
                Rc::new(EnvironmentCapability::new(
                    Rc::clone(&self.environment),
                    self.ready.clone(),
                )),
            )
        };

        let server_path = self.config.server_script_path();
        let context = match self.host.load(&server_path, &capabilities) {
            Ok(context) => context,
            Err(err) => {
                log::error!("server module failed to load: {}", err);
                self.state = StartupState::Degraded;
                return;
            }
        };
        self.server = Some(context);
        log::info!("server module loaded from {}", server_path.display());

        let ready = self.ready.clone();
        match self
            .host
            .pump_until(|| ready.signaled(), self.config.init_timeout())
        {
            PumpOutcome::Satisfied => self.create_window(),
            PumpOutcome::TimedOut => {
                log::error!("server readiness timed out; no window will be created");
            }
            PumpOutcome::Exhausted => {
                log::error!(
                    "server never signaled readiness and no runnable work remains; \
                     no window will be created"
                );
            }
        }
    }

    fn create_window(&mut self) {
        let spec = WindowSpec {
            width: self.config.window.width,
            height: self.config.window.height,
            content_path: self.config.window_content_path(),
            title: self.config.window.title.clone(),
        };
        match self.presentation.create_window(&spec) {
            Ok(handle) => {
                self.environment.borrow_mut().set_window(handle);
                self.state = StartupState::Ready;
                log::info!("startup complete; window created");
            }
            Err(err) => {
                log::error!("window creation failed: {}", err);
            }
        }
    }
}
