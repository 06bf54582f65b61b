//! Blocking HTTP client construction shared by the network stages.

use crate::error::Result;
use reqwest::blocking::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Builds a client with a single overall request timeout.
///
/// The public OSM endpoints reject anonymous agents, so every request
/// carries the crate name and version.
pub fn client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}
