//! Board-agnostic core logic for the inkcast gateway
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Packet radio trait
//! - Served image state and content identifier
//! - Client session tracking
//! - Chunk selection
//! - Distribution server loop
//! - Radio address selection (autocorrelation screen)

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod chunk;
pub mod ident;
pub mod image;
pub mod server;
pub mod session;
pub mod traits;

pub use chunk::{select_chunk, ChunkSelection, ReplyKind};
pub use ident::{autocorrelation, is_acceptable, CorrelationSummary, IdentError, IdentifierSelector};
pub use image::{image_id, ImageError, ImageSource, ImageState};
pub use server::{DistributionServer, ServeError, ServeOutcome};
pub use session::{ClientSession, SessionStore};
