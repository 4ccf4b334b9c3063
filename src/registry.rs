//! Independently owned sessions keyed by session id.
//!
//! For hosts that administer several participants from one process. Each
//! session keeps its own seed, rule engine and log; nothing is shared.

use std::collections::HashMap;

use crate::config::SessionConfig;
use crate::error::{Result, WcstError};
use crate::session::{Session, SessionBootstrap, TrialRecord};
use crate::summary::SessionSummary;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session and return its id.
    pub fn start(&mut self, bootstrap: SessionBootstrap, config: SessionConfig) -> Result<String> {
        if let Some(id) = &bootstrap.session_id {
            if self.sessions.contains_key(id) {
                return Err(WcstError::DuplicateSession(id.clone()));
            }
        }
        let session = Session::start(bootstrap, config)?;
        let id = session.session_id().to_string();
        if self.sessions.contains_key(&id) {
            return Err(WcstError::DuplicateSession(id));
        }
        self.sessions.insert(id.clone(), session);
        Ok(id)
    }

    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn submit_response(
        &mut self,
        session_id: &str,
        selected: usize,
        response_time_ms: f64,
    ) -> Result<TrialRecord> {
        self.get_mut(session_id)?
            .submit_response(selected, response_time_ms)
    }

    pub fn summary(&self, session_id: &str) -> Result<SessionSummary> {
        self.sessions
            .get(session_id)
            .map(Session::summary)
            .ok_or_else(|| WcstError::UnknownSession(session_id.to_string()))
    }

    /// Withdraw the participant and hand the session (with its partial log) back.
    pub fn abandon(&mut self, session_id: &str) -> Result<Session> {
        self.get_mut(session_id)?.abandon()?;
        self.remove(session_id)
    }

    /// Remove a session, completed or not, handing it back to the caller.
    pub fn remove(&mut self, session_id: &str) -> Result<Session> {
        self.sessions
            .remove(session_id)
            .ok_or_else(|| WcstError::UnknownSession(session_id.to_string()))
    }

    fn get_mut(&mut self, session_id: &str) -> Result<&mut Session> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| WcstError::UnknownSession(session_id.to_string()))
    }
}
