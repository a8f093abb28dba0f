//! Engine.IO URL construction.

use reqwest::Url;

use crate::domain::realtime::TransportKind;
use crate::ports::{ChannelEndpoint, TransportError};

use super::protocol::ENGINE_IO_VERSION;

/// Build the Engine.IO URL for `transport`.
///
/// The socket path is appended to whatever path the base address already
/// has, so `https://host/api` + `/socket.io/` gives `https://host/api/socket.io/`.
/// Websocket URLs use `ws`/`wss` in place of `http`/`https`.
pub fn engine_url(
    endpoint: &ChannelEndpoint,
    transport: TransportKind,
    sid: Option<&str>,
) -> Result<Url, TransportError> {
    let mut url = Url::parse(&endpoint.api_base_url)
        .map_err(|e| TransportError::Connect(format!("invalid API base URL: {}", e)))?;

    let base_path = url.path().trim_end_matches('/').to_string();
    let socket_path = endpoint.socket_path.trim_start_matches('/');
    url.set_path(&format!("{}/{}", base_path, socket_path));

    if transport == TransportKind::WebSocket {
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(TransportError::Connect(format!(
                    "unsupported URL scheme '{}'",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| TransportError::Connect(format!("cannot use scheme '{}'", scheme)))?;
    }

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.append_pair("EIO", ENGINE_IO_VERSION);
        query.append_pair("transport", transport.as_str());
        if let Some(sid) = sid {
            query.append_pair("sid", sid);
        }
    }

    Ok(url)
}
