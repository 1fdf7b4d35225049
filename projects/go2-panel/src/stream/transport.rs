use std::pin::Pin;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_stream::{Stream, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

/// Text payloads of one open connection; the stream ends when the peer closes.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(&self, url: &Url) -> Result<MessageStream>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

#[async_trait]
impl StreamTransport for WebSocketTransport {
    async fn open(&self, url: &Url) -> Result<MessageStream> {
        let (socket, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("failed to open websocket {url}"))?;

        let payloads = socket
            .take_while(|frame| !matches!(frame, Ok(Message::Close(_))))
            .filter_map(|frame| match frame {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(data)) => Some(Ok(String::from_utf8_lossy(&data).into_owned())),
                Ok(_) => None,
                Err(err) => Some(Err(anyhow::Error::new(err).context("websocket read failed"))),
            });

        Ok(Box::pin(payloads))
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        extract::ws::{Message, WebSocketUpgrade},
        response::Response,
        routing::get,
    };
    use tokio_stream::StreamExt;

    use crate::{stream::stream_url, test_support::spawn_backend};

    use super::{StreamTransport, WebSocketTransport};

    async fn burst_then_close(ws: WebSocketUpgrade) -> Response {
        ws.on_upgrade(|mut socket| async move {
            let _ = socket
                .send(Message::Text(r#"{"type":"log","data":"hello"}"#.into()))
                .await;
            let _ = socket.send(Message::Ping(b"ka".to_vec().into())).await;
            let _ = socket.send(Message::Binary(b"raw bytes".to_vec().into())).await;
            let _ = socket.send(Message::Close(None)).await;
        })
    }

    #[tokio::test]
    async fn yields_text_and_binary_payloads_until_close() {
        let base = spawn_backend(Router::new().route("/ws/logs", get(burst_then_close))).await;
        let url = stream_url(&base).expect("stream url should derive");

        let mut payloads = WebSocketTransport
            .open(&url)
            .await
            .expect("socket should open");

        let first = payloads.next().await.expect("first payload").expect("text frame");
        assert_eq!(first, r#"{"type":"log","data":"hello"}"#);
        let second = payloads.next().await.expect("second payload").expect("binary frame");
        assert_eq!(second, "raw bytes");
        assert!(payloads.next().await.is_none(), "close frame should end the stream");
    }

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        let url = url::Url::parse("ws://127.0.0.1:1/ws/logs").expect("url should parse");
        assert!(WebSocketTransport.open(&url).await.is_err());
    }
}
