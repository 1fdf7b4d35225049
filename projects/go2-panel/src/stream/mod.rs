pub mod connector;
pub mod message;
pub mod policy;
pub mod transport;

use anyhow::{Result, anyhow};
use url::Url;

pub const STREAM_PATH: &str = "/ws/logs";

/// `/ws/logs` on the same origin, upgrading `https` to `wss` and anything else to `ws`.
pub fn stream_url(base: &Url) -> Result<Url> {
    let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
    let mut url = base.join(STREAM_PATH)?;
    url.set_scheme(scheme)
        .map_err(|_| anyhow!("cannot derive {scheme} url from {base}"))?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::stream_url;

    fn derive(base: &str) -> String {
        let base = Url::parse(base).expect("base should parse");
        stream_url(&base).expect("stream url should derive").to_string()
    }

    #[test]
    fn plain_http_uses_ws() {
        assert_eq!(derive("http://127.0.0.1:8000"), "ws://127.0.0.1:8000/ws/logs");
    }

    #[test]
    fn https_uses_wss_and_keeps_port() {
        assert_eq!(
            derive("https://robot.local:8443/index.html"),
            "wss://robot.local:8443/ws/logs"
        );
    }
}
