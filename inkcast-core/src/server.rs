//! Distribution server loop
//!
//! One iteration serves one hello:
//! 1. listen on the gateway address
//! 2. receive and decode a hello
//! 3. update the client's session
//! 4. snapshot the current image and pick a chunk
//! 5. switch to the client's address and transmit the reply
//!
//! Any failure aborts the iteration before the session is touched (receive
//! and decode errors) or after it (transmit errors); [`DistributionServer::run`]
//! logs the failure and carries on with the next hello.

use core::fmt;

use inkcast_protocol::{DataReply, HelloMessage, WireError};

use crate::chunk::{select_chunk, ReplyKind};
use crate::image::ImageSource;
use crate::session::SessionStore;
use crate::traits::PacketRadio;

/// Errors from one server iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServeError<E> {
    /// Radio failed to switch address, receive or transmit
    Radio(E),
    /// Received packet is not a valid hello
    Malformed(WireError),
    /// Reply could not be built from the image
    Reply(WireError),
}

impl<E: fmt::Display> fmt::Display for ServeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServeError::Radio(e) => write!(f, "radio: {}", e),
            ServeError::Malformed(e) => write!(f, "malformed hello: {}", e),
            ServeError::Reply(e) => write!(f, "reply: {}", e),
        }
    }
}

/// Result of serving one hello
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServeOutcome {
    /// Tag that was served
    pub client_id: u32,
    /// Image id the tag reported
    pub reported_image_id: u32,
    /// True the first time this tag is heard
    pub new_client: bool,
    /// Reply that was transmitted
    pub reply: DataReply,
    /// Why this chunk was chosen
    pub kind: ReplyKind,
}

/// Gateway side of the image distribution protocol
pub struct DistributionServer<R, S> {
    radio: R,
    images: S,
    sessions: SessionStore,
    gateway_id: u32,
}

impl<R, S> DistributionServer<R, S>
where
    R: PacketRadio,
    S: ImageSource,
{
    /// Create a server listening on `gateway_id`
    pub fn new(radio: R, images: S, gateway_id: u32) -> Self {
        Self {
            radio,
            images,
            sessions: SessionStore::new(),
            gateway_id,
        }
    }

    /// Gateway address tags send their hellos to
    pub fn gateway_id(&self) -> u32 {
        self.gateway_id
    }

    /// Known client sessions
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Access the radio
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Tear the server down, returning the radio and image source
    pub fn into_parts(self) -> (R, S) {
        (self.radio, self.images)
    }

    /// Serve exactly one hello
    ///
    /// `now_ms` is the service uptime used to stamp sessions.
    pub fn serve_once(&mut self, now_ms: u64) -> Result<ServeOutcome, ServeError<R::Error>> {
        self.radio
            .set_address(self.gateway_id)
            .map_err(ServeError::Radio)?;
        let packet = self.radio.receive().map_err(ServeError::Radio)?;
        let hello = HelloMessage::decode(&packet).map_err(ServeError::Malformed)?;

        let (session, new_client) = self.sessions.record_hello(&hello, now_ms);
        if new_client {
            log::info!(
                "{:08x}: new client (type {}, firmware {:08x})",
                hello.client_id,
                hello.tag_type,
                hello.git_hash
            );
        }

        let image = self.images.snapshot();
        let selection = select_chunk(&hello, image.id());
        let reply = image
            .reply(selection.offset, selection.flags)
            .map_err(ServeError::Reply)?;
        session.last_offset = Some(reply.offset);

        let encoded = reply.encode_to_vec().map_err(ServeError::Reply)?;
        self.radio
            .set_address(hello.client_id)
            .map_err(ServeError::Radio)?;
        self.radio.transmit(&encoded).map_err(ServeError::Radio)?;

        Ok(ServeOutcome {
            client_id: hello.client_id,
            reported_image_id: hello.image_id,
            new_client,
            reply,
            kind: selection.kind,
        })
    }

    /// Serve hellos forever
    ///
    /// `now_ms` is polled once per iteration. Every per-iteration failure is
    /// logged and the loop continues.
    pub fn run<C>(&mut self, mut now_ms: C) -> !
    where
        C: FnMut() -> u64,
    {
        log::info!("serving on gateway address {:08x}", self.gateway_id);
        loop {
            match self.serve_once(now_ms()) {
                Ok(outcome) => log_outcome(&outcome),
                Err(e) => log::warn!("{}", e),
            }
        }
    }
}

fn log_outcome(outcome: &ServeOutcome) {
    match outcome.kind {
        ReplyKind::StaleImage => log::info!(
            "{:08x}: old image {:08x}, restarting with {:08x}",
            outcome.client_id,
            outcome.reported_image_id,
            outcome.reply.image_id
        ),
        ReplyKind::Chunk { .. } => log::info!(
            "{:08x}: image {:08x} offset {}",
            outcome.client_id,
            outcome.reply.image_id,
            outcome.reply.offset
        ),
        ReplyKind::Complete => log::info!(
            "{:08x}: image {:08x} complete",
            outcome.client_id,
            outcome.reply.image_id
        ),
    }
}
