//! User session handed to the client at startup.

/// The authenticated user.
///
/// Token acquisition and storage live outside this crate; when a token is
/// present the directory client sends it as a bearer credential. The
/// username doubles as the display name carried on WebSocket handshakes.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub token: Option<String>,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            token,
        }
    }
}
