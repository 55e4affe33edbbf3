//! Common transport-layer types shared between the backend and the webphone client.
//! These structs describe the JSON the browser softphone consumes, so clients can
//! deserialize responses without duplicating shapes.

mod webphone;

pub use webphone::{SipAccountPayload, WebphoneAccount, WebphoneConfig};
