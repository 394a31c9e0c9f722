//! Gateway: the HTTP surface of the mock provider.
//!
//! `POST /Accounts/{username}/Messages.json` (Basic auth) records a message;
//! `GET /messages` lists everything recorded so far.

mod protocol;
mod server;

pub use protocol::{SendForm, MARSHAL_ERROR_BODY, UNAUTHORISED_BODY};
pub use server::{router, run_gateway, Gateway, GatewayState};
