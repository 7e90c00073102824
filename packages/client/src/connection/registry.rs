//! Listener registry for connection events.
//!
//! Four independent listener lists (open, error, system, chat). All
//! listeners of a category fire on each matching event, in registration
//! order, with no short-circuiting. Registration hands back a
//! [`ListenerToken`] that can later unregister the listener.

use super::ChatEvent;
use super::transport::TransportError;

type OpenListener = Box<dyn FnMut() + Send>;
type ErrorListener = Box<dyn FnMut(&TransportError) + Send>;
type SystemListener = Box<dyn FnMut(&str) + Send>;
type ChatListener = Box<dyn FnMut(&ChatEvent) + Send>;

/// Handle for unregistering a listener. Unique per registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

pub(crate) struct ListenerRegistry {
    next_id: u64,
    open: Vec<(ListenerToken, OpenListener)>,
    error: Vec<(ListenerToken, ErrorListener)>,
    system: Vec<(ListenerToken, SystemListener)>,
    chat: Vec<(ListenerToken, ChatListener)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            open: Vec::new(),
            error: Vec::new(),
            system: Vec::new(),
            chat: Vec::new(),
        }
    }

    fn next_token(&mut self) -> ListenerToken {
        let token = ListenerToken(self.next_id);
        self.next_id += 1;
        token
    }

    pub fn add_open(&mut self, listener: OpenListener) -> ListenerToken {
        let token = self.next_token();
        self.open.push((token, listener));
        token
    }

    pub fn add_error(&mut self, listener: ErrorListener) -> ListenerToken {
        let token = self.next_token();
        self.error.push((token, listener));
        token
    }

    pub fn add_system(&mut self, listener: SystemListener) -> ListenerToken {
        let token = self.next_token();
        self.system.push((token, listener));
        token
    }

    pub fn add_chat(&mut self, listener: ChatListener) -> ListenerToken {
        let token = self.next_token();
        self.chat.push((token, listener));
        token
    }

    /// Remove a listener by token. Returns whether anything was removed.
    pub fn remove(&mut self, token: ListenerToken) -> bool {
        let before = self.open.len() + self.error.len() + self.system.len() + self.chat.len();
        self.open.retain(|(t, _)| *t != token);
        self.error.retain(|(t, _)| *t != token);
        self.system.retain(|(t, _)| *t != token);
        self.chat.retain(|(t, _)| *t != token);
        let after = self.open.len() + self.error.len() + self.system.len() + self.chat.len();
        after < before
    }

    pub fn notify_open(&mut self) {
        for (_, listener) in &mut self.open {
            listener();
        }
    }

    pub fn notify_error(&mut self, error: &TransportError) {
        for (_, listener) in &mut self.error {
            listener(error);
        }
    }

    pub fn notify_system(&mut self, content: &str) {
        for (_, listener) in &mut self.system {
            listener(content);
        }
    }

    pub fn notify_chat(&mut self, event: &ChatEvent) {
        for (_, listener) in &mut self.chat {
            listener(event);
        }
    }
}
