use crate::geo::Location;

/// Identifies one live connection. Never reused within a process.
pub type ClientId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    /// Connected, no location yet.
    Unbound,
    /// Has reported at least one valid location; holds the latest.
    Bound(Location),
    /// Disconnected. Terminal.
    Closed,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: ClientId,
    state: SessionState,
}

impl Session {
    pub fn new(id: ClientId) -> Self {
        Self {
            id,
            state: SessionState::Unbound,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn location(&self) -> Option<Location> {
        match self.state {
            SessionState::Bound(location) => Some(location),
            SessionState::Unbound | SessionState::Closed => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Stores `location`, replacing any earlier one. Returns false on a closed
    /// session, which stays closed.
    pub fn bind(&mut self, location: Location) -> bool {
        if self.is_closed() {
            return false;
        }
        self.state = SessionState::Bound(location);
        true
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }
}
