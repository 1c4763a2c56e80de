//! 应用层

pub mod auth;
pub mod ledger;
pub mod oauth;
pub mod profile;
pub mod stores;
