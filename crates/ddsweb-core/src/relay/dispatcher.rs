use parking_lot::Mutex;

use crate::dds::{DdsCommand, DdsOptions, Launched, Launcher, RunningDds};
use crate::session::{Session, SessionStore};
use crate::signal::Mode;

use super::protocol::{ClientEvent, ServerEvent};

/// A continuous `dds` run and the session that started it
struct Background {
    owner: u64,
    run: RunningDds,
}

/// Applies client events to sessions and runs `dds` on triggers
///
/// There is one board, so at most one continuous run exists at a time.
/// Every trigger stops it before `dds` is invoked again.
pub struct Relay<L> {
    sessions: SessionStore,
    options: DdsOptions,
    launcher: L,
    background: Mutex<Option<Background>>,
}

impl<L: Launcher> Relay<L> {
    /// Create a new relay
    pub fn new(sessions: SessionStore, options: DdsOptions, launcher: L) -> Self {
        Self {
            sessions,
            options,
            launcher,
            background: Mutex::new(None),
        }
    }

    /// Session for a newly connected client
    pub fn open_session(&self) -> Session {
        self.sessions.open()
    }

    /// First event every client receives
    pub fn greeting(&self) -> ServerEvent {
        ServerEvent::idle()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Forget a disconnected session, stopping the run it started
    pub async fn release(&self, session: &Session) {
        let owned = {
            let mut slot = self.background.lock();
            if slot.as_ref().is_some_and(|bg| bg.owner == session.id()) {
                slot.take()
            } else {
                None
            }
        };
        if let Some(bg) = owned {
            bg.run.stop().await;
        }
    }

    /// Handle one client event
    ///
    /// Updates never produce a reply. A recognized trigger replies with
    /// `done` or `error` once `dds` has finished, or once a continuous run
    /// has started; an unrecognized one is ignored.
    pub async fn handle(&self, session: &Session, event: ClientEvent) -> Option<ServerEvent> {
        match event {
            ClientEvent::Freq(payload) => {
                tracing::info!("freq={}", payload.command);
                session.update(|c| c.frequency = payload.command);
                None
            }
            ClientEvent::Tone(payload) => {
                tracing::info!("tone={}", payload.command);
                session.update(|c| c.tone = payload.command);
                None
            }
            ClientEvent::Tone2(payload) => {
                tracing::info!("tone2={}", payload.command);
                session.update(|c| c.set_tone2(payload.command));
                None
            }
            ClientEvent::Power(payload) => {
                tracing::info!("power={}", payload.command);
                session.update(|c| c.power = payload.command);
                None
            }
            ClientEvent::Mode(payload) => {
                tracing::info!("command={}", payload.command);
                match Mode::parse(&payload.command) {
                    Some(mode) => Some(self.trigger(session, mode).await),
                    None => {
                        tracing::debug!("Ignoring unknown mode {:?}", payload.command);
                        None
                    }
                }
            }
        }
    }

    /// Build and run `dds` for `mode` from the session's current values
    async fn trigger(&self, session: &Session, mode: Mode) -> ServerEvent {
        let command = DdsCommand::build(&self.options, mode, &session.snapshot());

        let previous = self.background.lock().take();
        if let Some(bg) = previous {
            bg.run.stop().await;
        }

        tracing::info!("{}", command);

        match self.launcher.launch(&command).await {
            Ok(Launched::Exited(outcome)) => {
                tracing::debug!("dds exited with code {:?}", outcome.code);
                if !outcome.stdout.is_empty() {
                    tracing::debug!("dds output: {}", outcome.stdout);
                }
                ServerEvent::done()
            }
            Ok(Launched::Running(run)) => {
                tracing::info!("dds running in background (pid {:?})", run.pid());
                let replaced = self.background.lock().replace(Background {
                    owner: session.id(),
                    run,
                });
                // A concurrent trigger from another client started one too
                if let Some(bg) = replaced {
                    bg.run.stop().await;
                }
                ServerEvent::done()
            }
            Err(e) => {
                tracing::warn!("dds invocation failed: {}", e);
                ServerEvent::error(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dds::InvocationOutcome;
    use crate::error::RelayError;
    use crate::relay::CommandPayload;
    use crate::session::SessionScope;
    use crate::signal::SignalConfig;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    /// Launcher that records commands instead of running them
    #[derive(Clone, Default)]
    struct RecordingLauncher {
        calls: Arc<Mutex<Vec<DdsCommand>>>,
        fail: bool,
    }

    impl RecordingLauncher {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<DdsCommand> {
            self.calls.lock().clone()
        }
    }

    impl Launcher for RecordingLauncher {
        async fn launch(&self, command: &DdsCommand) -> Result<Launched, RelayError> {
            self.calls.lock().push(command.clone());
            if self.fail {
                return Err(RelayError::Exit {
                    program: command.program().to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "bad frequency".to_string(),
                });
            }
            Ok(Launched::Exited(InvocationOutcome::default()))
        }
    }

    fn relay_with(scope: SessionScope, launcher: RecordingLauncher) -> Relay<RecordingLauncher> {
        Relay::new(
            SessionStore::new(scope, SignalConfig::default()),
            DdsOptions::default(),
            launcher,
        )
    }

    fn payload(command: &str) -> CommandPayload {
        CommandPayload {
            command: command.to_string(),
        }
    }

    fn args(cmd: &DdsCommand) -> Vec<&str> {
        cmd.args().iter().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn test_greeting_is_idle() {
        let relay = relay_with(SessionScope::Connection, RecordingLauncher::default());
        assert_eq!(relay.greeting(), ServerEvent::idle());
    }

    #[tokio::test]
    async fn test_updates_produce_no_reply() {
        let launcher = RecordingLauncher::default();
        let relay = relay_with(SessionScope::Connection, launcher.clone());
        let session = relay.open_session();

        assert_eq!(relay.handle(&session, ClientEvent::Freq(payload("1"))).await, None);
        assert_eq!(relay.handle(&session, ClientEvent::Tone(payload("2"))).await, None);
        assert_eq!(relay.handle(&session, ClientEvent::Power(payload("3"))).await, None);
        assert_eq!(relay.handle(&session, ClientEvent::Tone2(payload("4"))).await, None);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.frequency, "1");
        assert_eq!(snapshot.tone, "2");
        assert_eq!(snapshot.power, "3");
        assert_eq!(snapshot.tone2.as_deref(), Some("4"));
        assert!(launcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rf_trigger_runs_once_and_reports_done() {
        let launcher = RecordingLauncher::default();
        let relay = relay_with(SessionScope::Connection, launcher.clone());
        let session = relay.open_session();

        relay.handle(&session, ClientEvent::Freq(payload("12000000"))).await;
        relay.handle(&session, ClientEvent::Power(payload("-10.0"))).await;
        let reply = relay.handle(&session, ClientEvent::Mode(payload("rf"))).await;

        assert_eq!(reply, Some(ServerEvent::done()));
        let calls = launcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            args(&calls[0]),
            ["--mode", "single-freq", "--freq", "12000000", "--rel-level", "-10.0"]
        );
    }

    #[tokio::test]
    async fn test_fm_trigger_uses_default_tone() {
        let launcher = RecordingLauncher::default();
        let relay = relay_with(SessionScope::Connection, launcher.clone());
        let session = relay.open_session();

        let reply = relay.handle(&session, ClientEvent::Mode(payload("fm"))).await;

        assert_eq!(reply, Some(ServerEvent::done()));
        assert_eq!(
            args(&launcher.calls()[0]),
            ["--mode", "fmtone", "--freq", "0.0", "--tone", "0.0", "--rel-level", "-100.0"]
        );
    }

    #[tokio::test]
    async fn test_unknown_mode_is_ignored() {
        let launcher = RecordingLauncher::default();
        let relay = relay_with(SessionScope::Connection, launcher.clone());
        let session = relay.open_session();

        let reply = relay.handle(&session, ClientEvent::Mode(payload("xyz"))).await;

        assert_eq!(reply, None);
        assert!(launcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_run_reports_error() {
        let relay = relay_with(SessionScope::Connection, RecordingLauncher::failing());
        let session = relay.open_session();

        let reply = relay.handle(&session, ClientEvent::Mode(payload("rf"))).await;

        match reply {
            Some(ServerEvent::Status(status)) => {
                assert_eq!(status.stat, crate::relay::Stat::Error);
                assert!(status.message.unwrap().contains("bad frequency"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_shared_scope_trigger_sees_other_clients_values() {
        let launcher = RecordingLauncher::default();
        let relay = relay_with(SessionScope::Shared, launcher.clone());
        let client_a = relay.open_session();
        let client_b = relay.open_session();

        relay.handle(&client_a, ClientEvent::Freq(payload("7000000"))).await;
        relay.handle(&client_b, ClientEvent::Mode(payload("rf"))).await;

        assert_eq!(launcher.calls()[0].args()[3], "7000000");
    }

    #[tokio::test]
    async fn test_connection_scope_trigger_ignores_other_clients() {
        let launcher = RecordingLauncher::default();
        let relay = relay_with(SessionScope::Connection, launcher.clone());
        let client_a = relay.open_session();
        let client_b = relay.open_session();

        relay.handle(&client_a, ClientEvent::Freq(payload("7000000"))).await;
        relay.handle(&client_b, ClientEvent::Mode(payload("rf"))).await;

        assert_eq!(launcher.calls()[0].args()[3], "0.0");
    }

    #[cfg(unix)]
    mod continuous {
        use super::*;
        use pretty_assertions::assert_eq;
        use crate::dds::fake::{is_alive, read_pid, write_dds};
        use crate::dds::ProcessLauncher;
        use std::path::Path;
        use std::time::{Duration, Instant};

        fn process_relay(dds: &Path, scope: SessionScope) -> Relay<ProcessLauncher> {
            Relay::new(
                SessionStore::new(scope, SignalConfig::default()),
                DdsOptions {
                    program: dds.display().to_string(),
                    ..DdsOptions::default()
                },
                ProcessLauncher::new(Duration::from_secs(1))
                    .with_startup_grace(Duration::from_millis(200)),
            )
        }

        async fn start_alternating(
            relay: &Relay<ProcessLauncher>,
            session: &Session,
        ) -> ServerEvent {
            relay.handle(session, ClientEvent::Freq(payload("10000000"))).await;
            relay.handle(session, ClientEvent::Tone(payload("1100"))).await;
            relay.handle(session, ClientEvent::Tone2(payload("2100"))).await;
            relay
                .handle(session, ClientEvent::Mode(payload("fm")))
                .await
                .unwrap()
        }

        async fn wait_dead(pid: &str) {
            let deadline = Instant::now() + Duration::from_secs(5);
            while is_alive(pid) {
                assert!(Instant::now() < deadline, "dds {pid} is still running");
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }

        #[tokio::test]
        async fn test_alternating_tone_reports_done_and_keeps_running() {
            let dir = tempfile::tempdir().unwrap();
            let relay = process_relay(&write_dds(dir.path()), SessionScope::Connection);
            let session = relay.open_session();

            let start = Instant::now();
            let reply = start_alternating(&relay, &session).await;

            assert_eq!(reply, ServerEvent::done());
            assert!(start.elapsed() < Duration::from_secs(1));

            let pid = read_pid(dir.path());
            tokio::time::sleep(Duration::from_millis(1200)).await;
            assert!(is_alive(&pid));

            relay.release(&session).await;
            wait_dead(&pid).await;
        }

        #[tokio::test]
        async fn test_next_trigger_stops_alternating_tone() {
            let dir = tempfile::tempdir().unwrap();
            let relay = process_relay(&write_dds(dir.path()), SessionScope::Connection);
            let session = relay.open_session();

            assert_eq!(start_alternating(&relay, &session).await, ServerEvent::done());
            let pid = read_pid(dir.path());

            let reply = relay.handle(&session, ClientEvent::Mode(payload("rf"))).await;

            assert_eq!(reply, Some(ServerEvent::done()));
            wait_dead(&pid).await;
        }

        #[tokio::test]
        async fn test_release_only_stops_own_run() {
            let dir = tempfile::tempdir().unwrap();
            let relay = process_relay(&write_dds(dir.path()), SessionScope::Shared);
            let owner = relay.open_session();
            let other = relay.open_session();

            assert_eq!(start_alternating(&relay, &owner).await, ServerEvent::done());
            let pid = read_pid(dir.path());

            relay.release(&other).await;
            assert!(is_alive(&pid));

            relay.release(&owner).await;
            wait_dead(&pid).await;
        }
    }
}
