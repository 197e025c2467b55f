//! Decision logic kept free of I/O so every rule can be unit tested without a
//! database. Services load rows, ask these functions what to do, then write.

pub mod handshake;
pub mod submission;
pub mod threads;
pub mod username;
pub mod voting;
