use serde_json::Value;

use crate::{kmb::client::KmbClient, ContextData};

pub fn init() {
    dotenvy::from_filename(".env").ok();
    env_logger::try_init().ok();
}

/// Context whose KMB client answers from a fixed path -> (status, body)
/// table instead of the network.
pub fn fixed_context(responses: Vec<(&str, u16, Value)>) -> ContextData {
    init();

    ContextData {
        kmb: KmbClient::fixed(
            responses
                .into_iter()
                .map(|(path, status, body)| (path.to_string(), status, body.to_string()))
                .collect(),
        ),
    }
}
