//! sms-mock core library: message store, Basic-auth checker, and the HTTP gateway
//! used by the `sms-mock` binary.

pub mod auth;
pub mod config;
pub mod gateway;
pub mod store;
