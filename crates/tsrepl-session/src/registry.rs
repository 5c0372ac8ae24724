use std::cell::RefCell;
use std::rc::Rc;

use crate::config::SessionConfig;
use crate::session::{InterpreterSession, SessionHandle, SessionId};

/// Registry shared by the session manager and the dispatcher.
pub type SharedRegistry = Rc<RefCell<SessionRegistry>>;

/// Holds at most one interpreter session and the config for the next spawn.
///
/// The slot may hold a session whose process has exited; that session is
/// only replaced when the next ensure finds it dead.
pub struct SessionRegistry {
    config: SessionConfig,
    slot: Option<InterpreterSession>,
    next_id: SessionId,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            slot: None,
            next_id: 1,
        }
    }

    /// Wrap a new registry for sharing.
    pub fn shared(config: SessionConfig) -> SharedRegistry {
        Rc::new(RefCell::new(Self::new(config)))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replace the config used by the next spawn.
    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    /// Handle of the recorded session, live or not.
    pub fn current_handle(&self) -> Option<&SessionHandle> {
        self.slot.as_ref().map(InterpreterSession::handle)
    }

    /// Handle of the recorded session if its process is still running.
    pub fn live_handle(&mut self) -> Option<SessionHandle> {
        let session = self.slot.as_mut()?;
        if session.is_alive() {
            Some(session.handle().clone())
        } else {
            if log::log_enabled!(log::Level::Debug) {
                let id = session.handle().id;
                let exit_code = session.exit_code();
                log::debug!("session {} is stale (exit code {:?})", id, exit_code);
            }
            None
        }
    }

    /// Look the recorded session up by buffer name.
    pub fn session_mut(&mut self, buffer: &str) -> Option<&mut InterpreterSession> {
        self.slot
            .as_mut()
            .filter(|session| session.handle().buffer == buffer)
    }

    /// Allocate the next session ID.
    pub fn next_session_id(&mut self) -> SessionId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Record `session` as the current one, returning the session it replaces.
    pub fn install(&mut self, session: InterpreterSession) -> Option<InterpreterSession> {
        self.slot.replace(session)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
