//! Procurement portal: access control, bid intake and committee evaluation.

pub mod access;
pub mod app;
pub mod bids;
pub mod evaluation;
pub mod inflight;
pub mod proposals;
pub mod repository;
pub mod router;
pub mod users;

#[cfg(test)]
mod tests;

pub use app::{Portal, PortalSeed};
pub use router::{portal_router, SESSION_HEADER};
