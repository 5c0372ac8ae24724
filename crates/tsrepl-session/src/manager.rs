use tsrepl_ansi::DisplayMode;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::host::{Host, SessionBuffer};
use crate::process::{LaunchRequest, Launcher};
use crate::registry::{SessionRegistry, SharedRegistry};
use crate::session::{InterpreterSession, SessionHandle};

/// Creates, reuses and focuses the interpreter session tracked by a registry.
pub struct SessionManager {
    registry: SharedRegistry,
    launcher: Box<dyn Launcher>,
}

impl SessionManager {
    pub fn new(registry: SharedRegistry, launcher: Box<dyn Launcher>) -> Self {
        Self { registry, launcher }
    }

    /// The config the next spawn will use.
    pub fn config(&self) -> SessionConfig {
        self.registry.borrow().config().clone()
    }

    pub fn current_handle(&self) -> Option<SessionHandle> {
        self.registry.borrow().current_handle().cloned()
    }

    /// Whether the recorded session's process is still running.
    pub fn session_alive(&self) -> bool {
        self.registry.borrow_mut().live_handle().is_some()
    }

    /// Make sure a live session exists and return its handle.
    ///
    /// `command_line`, when given, replaces the program and arguments of the
    /// current config before anything else happens. A blank command line is
    /// ignored. Unless `keep_focus` is set, the session buffer is focused
    /// afterwards, whether or not a spawn happened.
    pub fn ensure_session(
        &self,
        host: &mut dyn Host,
        command_line: Option<&str>,
        keep_focus: bool,
    ) -> Result<SessionHandle, SessionError> {
        let config = match command_line {
            Some(line) => {
                let current = self.config();
                let config = current.with_command_line(line);
                if config.is_none() {
                    log::warn!("ignoring blank interpreter command line");
                }
                config
            }
            None => None,
        };
        self.ensure_session_with(host, config, keep_focus)
    }

    /// Like [`ensure_session`](Self::ensure_session), but the override is a
    /// complete config. The override is stored in the registry even when a
    /// live session is reused; it applies from the next spawn on.
    pub fn ensure_session_with(
        &self,
        host: &mut dyn Host,
        config: Option<SessionConfig>,
        keep_focus: bool,
    ) -> Result<SessionHandle, SessionError> {
        let handle = {
            let mut registry = self.registry.borrow_mut();
            if let Some(config) = config {
                registry.set_config(config);
            }

            match registry.live_handle() {
                Some(handle) => {
                    log::debug!("reusing session {} in {}", handle.id, handle.buffer);
                    handle
                }
                None => self.spawn(&mut registry, host)?,
            }
        };

        if !keep_focus {
            host.focus_buffer(&handle.buffer);
        }
        Ok(handle)
    }

    fn spawn(
        &self,
        registry: &mut SessionRegistry,
        host: &mut dyn Host,
    ) -> Result<SessionHandle, SessionError> {
        if let Some(stale) = registry.current_handle() {
            log::debug!("session {} has exited; spawning a new one", stale.id);
        }

        let config = registry.config().clone();
        let mode = DisplayMode::from_ansi_color(config.ansi_color);
        let request = LaunchRequest {
            program: config.program.clone(),
            args: config.args.clone(),
            env: mode.spawn_env(),
            buffer: config.buffer_name.clone(),
        };

        let process = self.launcher.launch(&request)?;
        let handle = SessionHandle {
            id: registry.next_session_id(),
            buffer: config.buffer_name.clone(),
        };
        let session = InterpreterSession::start(handle.clone(), &config.program, process, mode)?;

        host.attach_session_buffer(SessionBuffer {
            name: handle.buffer.clone(),
            session_id: handle.id,
            transcript: session.transcript().clone(),
            mode,
        });
        // Dropping the replaced session stops its output pump.
        drop(registry.install(session));

        log::info!(
            "started session {} ({}) in {}",
            handle.id,
            config.command_line(),
            handle.buffer
        );
        Ok(handle)
    }

    /// Focus the session buffer, optionally jumping to its end.
    ///
    /// Fails with [`SessionError::NoSession`] when no session was ever
    /// recorded or its buffer no longer exists; focus is left alone then.
    /// With `move_to_end` the previous location is pushed onto the mark ring
    /// before the cursor moves.
    pub fn switch_to_session(
        &self,
        host: &mut dyn Host,
        move_to_end: bool,
    ) -> Result<(), SessionError> {
        let handle = self.current_handle().ok_or(SessionError::NoSession)?;
        if !host.buffer_exists(&handle.buffer) {
            return Err(SessionError::NoSession);
        }

        host.focus_buffer(&handle.buffer);
        if move_to_end {
            host.push_mark();
            host.goto_end();
        }
        Ok(())
    }

    /// Write raw bytes to the session recorded under `handle.buffer`.
    pub fn write_input(&self, handle: &SessionHandle, data: &[u8]) -> Result<(), SessionError> {
        let mut registry = self.registry.borrow_mut();
        let session = registry
            .session_mut(&handle.buffer)
            .ok_or(SessionError::NoSession)?;
        log::debug!("writing {} bytes to session {}", data.len(), session.handle().id);
        session.write_input(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use crate::process::Process;
    use std::cell::RefCell;
    use std::io::Read;
    use std::rc::Rc;

    #[derive(Default)]
    struct Spawned {
        requests: Vec<LaunchRequest>,
        alive: Vec<Rc<RefCell<bool>>>,
        written: Vec<Rc<RefCell<Vec<u8>>>>,
    }

    struct FakeProcess {
        alive: Rc<RefCell<bool>>,
        written: Rc<RefCell<Vec<u8>>>,
    }

    impl Process for FakeProcess {
        fn write(&mut self, data: &[u8]) -> Result<(), SessionError> {
            self.written.borrow_mut().extend_from_slice(data);
            Ok(())
        }
        fn is_alive(&mut self) -> bool {
            *self.alive.borrow()
        }
        fn exit_code(&mut self) -> Option<u32> {
            (!*self.alive.borrow()).then_some(0)
        }
        fn take_reader(&mut self) -> Option<Box<dyn Read + Send>> {
            None
        }
        fn pid(&self) -> Option<u32> {
            None
        }
    }

    #[derive(Clone, Default)]
    struct FakeLauncher {
        spawned: Rc<RefCell<Spawned>>,
        fail: bool,
    }

    impl Launcher for FakeLauncher {
        fn launch(&self, request: &LaunchRequest) -> Result<Box<dyn Process>, SessionError> {
            if self.fail {
                return Err(SessionError::Spawn(format!("{} not found", request.program)));
            }
            let alive = Rc::new(RefCell::new(true));
            let written = Rc::new(RefCell::new(Vec::new()));
            let mut spawned = self.spawned.borrow_mut();
            spawned.requests.push(request.clone());
            spawned.alive.push(Rc::clone(&alive));
            spawned.written.push(Rc::clone(&written));
            Ok(Box::new(FakeProcess { alive, written }))
        }
    }

    fn manager() -> (SessionManager, Rc<RefCell<Spawned>>) {
        let launcher = FakeLauncher::default();
        let spawned = Rc::clone(&launcher.spawned);
        let registry = SessionRegistry::shared(SessionConfig::default());
        (SessionManager::new(registry, Box::new(launcher)), spawned)
    }

    fn host() -> MemoryHost {
        let mut host = MemoryHost::new();
        host.open_buffer("main.ts", "const x = 1;\n");
        host
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let (manager, spawned) = manager();
        let mut host = host();

        let first = manager.ensure_session(&mut host, None, true).unwrap();
        let second = manager.ensure_session(&mut host, None, true).unwrap();

        assert_eq!(first, second);
        assert_eq!(spawned.borrow().requests.len(), 1);
        assert_eq!(first.buffer, "*Typescript*");
    }

    #[test]
    fn test_respawn_after_exit() {
        let (manager, spawned) = manager();
        let mut host = host();

        let first = manager.ensure_session(&mut host, None, true).unwrap();
        let old_transcript = host.session_buffer(&first.buffer).unwrap().transcript.clone();
        *spawned.borrow().alive[0].borrow_mut() = false;

        let second = manager.ensure_session(&mut host, None, true).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(spawned.borrow().requests.len(), 2);
        let attached = host.session_buffer(&second.buffer).unwrap();
        assert_eq!(attached.session_id, second.id);
        assert!(!attached.transcript.same_as(&old_transcript));
    }

    #[test]
    fn test_session_alive_tracks_process() {
        let (manager, spawned) = manager();
        let mut host = host();
        assert!(!manager.session_alive());

        manager.ensure_session(&mut host, None, true).unwrap();
        assert!(manager.session_alive());

        *spawned.borrow().alive[0].borrow_mut() = false;
        assert!(!manager.session_alive());
        // The stale session stays recorded until the next ensure.
        assert_eq!(manager.current_handle().map(|h| h.id), Some(1));
    }

    #[test]
    fn test_focus_follows_keep_focus() {
        let (manager, _) = manager();
        let mut host = host();

        manager.ensure_session(&mut host, None, true).unwrap();
        assert_eq!(host.current_buffer(), Some("main.ts"));

        // Reuse also moves focus when asked.
        manager.ensure_session(&mut host, None, false).unwrap();
        assert_eq!(host.current_buffer(), Some("*Typescript*"));
    }

    #[test]
    fn test_command_line_override_isolation() {
        let (manager, spawned) = manager();
        let mut host = host();

        let live = manager.ensure_session(&mut host, None, true).unwrap();
        let reused = manager
            .ensure_session(&mut host, Some("ts-node --pretty"), true)
            .unwrap();

        assert_eq!(live, reused);
        assert_eq!(spawned.borrow().requests.len(), 1);
        assert_eq!(spawned.borrow().requests[0].program, "tsun");
        assert_eq!(manager.config().program, "ts-node");
        assert_eq!(manager.config().args, vec!["--pretty"]);

        *spawned.borrow().alive[0].borrow_mut() = false;
        manager.ensure_session(&mut host, None, true).unwrap();

        let spawned = spawned.borrow();
        assert_eq!(spawned.requests[1].program, "ts-node");
        assert_eq!(spawned.requests[1].args, vec!["--pretty"]);
    }

    #[test]
    fn test_blank_override_keeps_config() {
        let (manager, spawned) = manager();
        let mut host = host();

        manager.ensure_session(&mut host, Some("   "), true).unwrap();
        assert_eq!(spawned.borrow().requests[0].program, "tsun");
        assert_eq!(manager.config(), SessionConfig::default());
    }

    #[test]
    fn test_full_config_override() {
        let (manager, spawned) = manager();
        let mut host = host();
        let config = SessionConfig {
            program: "node".into(),
            args: vec!["-i".into()],
            ansi_color: false,
            buffer_name: "*node*".into(),
        };

        let handle = manager
            .ensure_session_with(&mut host, Some(config.clone()), true)
            .unwrap();

        assert_eq!(handle.buffer, "*node*");
        assert_eq!(manager.config(), config);
        assert_eq!(spawned.borrow().requests[0].args, vec!["-i"]);
        assert_eq!(
            host.session_buffer("*node*").unwrap().mode,
            DisplayMode::Plain
        );
    }

    #[test]
    fn test_display_mode_environment() {
        let (manager, spawned) = manager();
        let mut host = host();
        manager.ensure_session(&mut host, None, true).unwrap();
        assert!(spawned.borrow().requests[0].env.is_empty());

        let (manager, spawned) = self::manager();
        let plain = SessionConfig {
            ansi_color: false,
            ..SessionConfig::default()
        };
        manager
            .ensure_session_with(&mut host, Some(plain), true)
            .unwrap();
        assert_eq!(
            spawned.borrow().requests[0].env,
            vec![("NODE_NO_READLINE".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn test_spawn_failure_propagates() {
        let launcher = FakeLauncher {
            fail: true,
            ..FakeLauncher::default()
        };
        let manager = SessionManager::new(SessionRegistry::shared(SessionConfig::default()), Box::new(launcher));
        let mut host = host();

        let result = manager.ensure_session(&mut host, None, false);

        assert!(matches!(result, Err(SessionError::Spawn(_))));
        assert!(manager.current_handle().is_none());
        assert_eq!(host.current_buffer(), Some("main.ts"));
    }

    #[test]
    fn test_switch_without_session_fails() {
        let (manager, _) = manager();
        let mut host = host();

        let result = manager.switch_to_session(&mut host, true);

        assert!(matches!(result, Err(SessionError::NoSession)));
        assert_eq!(host.current_buffer(), Some("main.ts"));
        assert!(host.marks().is_empty());
    }

    #[test]
    fn test_switch_after_buffer_killed_fails() {
        let (manager, _) = manager();
        let mut host = host();
        manager.ensure_session(&mut host, None, true).unwrap();
        host.kill_buffer("*Typescript*");

        let result = manager.switch_to_session(&mut host, false);
        assert!(matches!(result, Err(SessionError::NoSession)));
        assert_eq!(host.current_buffer(), Some("main.ts"));
    }

    #[test]
    fn test_switch_to_dead_session_buffer_still_works() {
        let (manager, spawned) = manager();
        let mut host = host();
        manager.ensure_session(&mut host, None, true).unwrap();
        *spawned.borrow().alive[0].borrow_mut() = false;

        manager.switch_to_session(&mut host, false).unwrap();
        assert_eq!(host.current_buffer(), Some("*Typescript*"));
    }

    #[test]
    fn test_switch_move_to_end_pushes_mark() {
        let (manager, _) = manager();
        let mut host = host();
        let handle = manager.ensure_session(&mut host, None, true).unwrap();
        host.session_buffer(&handle.buffer)
            .unwrap()
            .transcript
            .lock()
            .append_text("> 1\n> ");

        manager.switch_to_session(&mut host, true).unwrap();

        assert_eq!(host.current_buffer(), Some("*Typescript*"));
        assert_eq!(host.point(), 6);
        assert_eq!(host.marks(), &[("*Typescript*".to_string(), 0)]);
    }

    #[test]
    fn test_write_input_reaches_process() {
        let (manager, spawned) = manager();
        let mut host = host();
        let handle = manager.ensure_session(&mut host, None, true).unwrap();

        manager.write_input(&handle, b"1 + 1\n").unwrap();

        assert_eq!(&*spawned.borrow().written[0].borrow(), b"1 + 1\n");
    }

    #[test]
    fn test_write_input_unknown_buffer() {
        let (manager, _) = manager();
        let handle = SessionHandle {
            id: 9,
            buffer: "*gone*".into(),
        };
        assert!(matches!(
            manager.write_input(&handle, b"x\n"),
            Err(SessionError::NoSession)
        ));
    }

    #[test]
    fn test_registries_are_independent() {
        let (a, spawned_a) = manager();
        let (b, spawned_b) = manager();
        let mut host = host();

        a.ensure_session(&mut host, None, true).unwrap();
        assert!(b.current_handle().is_none());
        assert_eq!(spawned_a.borrow().requests.len(), 1);
        assert!(spawned_b.borrow().requests.is_empty());
    }
}
