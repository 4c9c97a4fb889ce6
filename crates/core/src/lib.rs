pub mod auth;
pub mod client;
pub mod error;
pub mod media;
pub mod player;
pub mod protocol;
pub mod receiver;
pub mod session;
pub mod transport;

pub use auth::Credentials;
pub use client::ControlEngine;
pub use error::{Result, RtspError};
pub use media::{PacketSink, RtpPacket};
pub use player::{Player, PlayerConfig};
pub use session::{ControlSession, SessionState};
