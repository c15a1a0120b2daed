//! Per-client session tracking
//!
//! A session is created on the first hello from an unseen client id and
//! lives for the rest of the process. The store is owned by the server
//! loop, so no locking is involved.

use alloc::collections::BTreeMap;

use inkcast_protocol::HelloMessage;

/// What the gateway knows about one tag
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClientSession {
    /// Tag address
    pub client_id: u32,
    /// Image id the tag reported last
    pub last_image_id: u32,
    /// Number of hellos received from this tag
    pub received_count: u32,
    /// Uptime in ms when the tag was first heard
    pub first_seen_ms: u64,
    /// Uptime in ms when the tag was last heard
    pub last_seen_ms: u64,
    /// Hardware type from the last hello
    pub tag_type: u32,
    /// Firmware revision from the last hello
    pub git_hash: u32,
    /// Install date from the last hello
    pub install_date: u32,
    /// Offset of the last chunk sent, if any
    pub last_offset: Option<u16>,
}

impl ClientSession {
    fn new(hello: &HelloMessage, now_ms: u64) -> Self {
        Self {
            client_id: hello.client_id,
            last_image_id: hello.image_id,
            received_count: 0,
            first_seen_ms: now_ms,
            last_seen_ms: now_ms,
            tag_type: hello.tag_type,
            git_hash: hello.git_hash,
            install_date: hello.install_date,
            last_offset: None,
        }
    }

    fn update(&mut self, hello: &HelloMessage, now_ms: u64) {
        self.last_image_id = hello.image_id;
        self.received_count = self.received_count.saturating_add(1);
        self.last_seen_ms = now_ms;
        self.tag_type = hello.tag_type;
        self.git_hash = hello.git_hash;
        self.install_date = hello.install_date;
    }
}

/// All sessions, keyed by client id
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: BTreeMap<u32, ClientSession>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hello, creating the session if needed
    ///
    /// Returns the updated session and whether it was created by this call.
    pub fn record_hello(&mut self, hello: &HelloMessage, now_ms: u64) -> (&mut ClientSession, bool) {
        let mut created = false;
        let session = self.sessions.entry(hello.client_id).or_insert_with(|| {
            created = true;
            ClientSession::new(hello, now_ms)
        });
        session.update(hello, now_ms);
        (session, created)
    }

    /// Look up a session
    pub fn get(&self, client_id: u32) -> Option<&ClientSession> {
        self.sessions.get(&client_id)
    }

    /// Look up a session mutably
    pub fn get_mut(&mut self, client_id: u32) -> Option<&mut ClientSession> {
        self.sessions.get_mut(&client_id)
    }

    /// Number of known clients
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no client has been heard yet
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Iterate sessions in client id order
    pub fn iter(&self) -> impl Iterator<Item = &ClientSession> {
        self.sessions.values()
    }
}
