//! Voucher Booking Service
//!
//! 认证与令牌生命周期、代金券账本

pub mod application;
pub mod bootstrap;
pub mod infrastructure;

pub use bootstrap::{AppState, Collaborators, build, build_with};
