//! Lock-free bounded ring buffers.
//!
//! Two variants share the same capacity/mask discipline but different
//! concurrency contracts: [`spsc::Spsc`] is wait-free for its single
//! producer and single consumer; [`mpmc::Mpmc`] is lock-free for any
//! number of producers and consumers.

pub mod mpmc;
pub mod spsc;

pub use mpmc::Mpmc;
pub use spsc::Spsc;
