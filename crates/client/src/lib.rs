//! HTTP implementation of `RemoteMandateAuthority`
//!
//! Talks to the mandate authority's REST API: `POST /mandates/issue` and
//! `POST /mandates/verify`. Issuance returns only a token, so `issue`
//! verifies it immediately to obtain the envelope.

pub mod http;
mod wire;

pub use self::http::{HttpAuthority, AGENT_ID_HEADER, API_KEY_HEADER};
