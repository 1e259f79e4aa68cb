//! `tokio-tungstenite` transport
//!
//! Splits each connection into a read half owned by the receive loop and a
//! write half kept behind the client's write lock.

use crate::core::config::DialerConfig;
use crate::traits::*;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{self, HeaderMap};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, WebSocketConfig};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production dialer backed by `tokio-tungstenite`
#[derive(Debug, Clone, Default)]
pub struct TungsteniteDialer {
    config: DialerConfig,
}

impl TungsteniteDialer {
    pub fn new(config: DialerConfig) -> Self {
        Self { config }
    }

    fn ws_config(&self) -> WebSocketConfig {
        let mut ws_config = WebSocketConfig::default();
        if let Some(size) = self.config.max_message_size {
            ws_config.max_message_size = Some(size);
        }
        if let Some(size) = self.config.max_frame_size {
            ws_config.max_frame_size = Some(size);
        }
        ws_config
    }
}

#[async_trait]
impl Dialer for TungsteniteDialer {
    async fn dial(&self, url: &str, headers: &Headers) -> Result<Dialed> {
        let mut request = url.into_client_request().map_err(|e| TetherError::Dial {
            reason: format!("invalid request for {}: {}", url, e),
            response: None,
        })?;

        // Apply headers to request
        for (key, value) in headers {
            match (
                key.parse::<http::header::HeaderName>(),
                value.parse::<http::header::HeaderValue>(),
            ) {
                (Ok(name), Ok(value)) => {
                    request.headers_mut().append(name, value);
                }
                (Err(_), _) => warn!("Invalid header name: {}", key),
                (_, Err(_)) => warn!("Invalid header value for key '{}': {}", key, value),
            }
        }

        let connecting =
            connect_async_with_config(request, Some(self.ws_config()), self.config.disable_nagle);
        let result = match self.config.handshake_timeout {
            Some(limit) => timeout(limit, connecting).await.map_err(|_| TetherError::Dial {
                reason: format!("handshake timed out after {:?}", limit),
                response: None,
            })?,
            None => connecting.await,
        };

        match result {
            Ok((stream, response)) => {
                debug!("Upgrade accepted by {} ({})", url, response.status());
                let handshake = Handshake {
                    status: response.status().as_u16(),
                    headers: header_pairs(response.headers()),
                    body: response
                        .body()
                        .as_ref()
                        .map(|body| String::from_utf8_lossy(body).into_owned()),
                };
                let (sink, stream) = stream.split();
                Ok(Dialed {
                    reader: Box::new(TungsteniteReader {
                        stream,
                        deadline: None,
                    }),
                    writer: Box::new(TungsteniteWriter { sink }),
                    handshake,
                })
            }
            Err(WsError::Http(response)) => {
                let handshake = Handshake {
                    status: response.status().as_u16(),
                    headers: header_pairs(response.headers()),
                    body: response
                        .body()
                        .as_ref()
                        .map(|body| String::from_utf8_lossy(body).into_owned()),
                };
                Err(TetherError::Dial {
                    reason: format!("handshake rejected with status {}", handshake.status),
                    response: Some(handshake),
                })
            }
            Err(e) => Err(TetherError::Dial {
                reason: e.to_string(),
                response: None,
            }),
        }
    }
}

/// Read half: a split stream plus the current read deadline
pub struct TungsteniteReader {
    stream: SplitStream<WsStream>,
    deadline: Option<Instant>,
}

#[async_trait]
impl FrameReader for TungsteniteReader {
    async fn read_frame(&mut self) -> Result<Frame> {
        let next = match self.deadline {
            Some(deadline) => timeout_at(deadline, self.stream.next())
                .await
                .map_err(|_| TetherError::Read("read deadline exceeded".into()))?,
            None => self.stream.next().await,
        };

        match next {
            Some(Ok(message)) => Ok(message_to_frame(message)),
            Some(Err(e)) => Err(TetherError::Read(e.to_string())),
            None => Err(TetherError::Read("stream ended".into())),
        }
    }

    fn set_read_deadline(&mut self, deadline: Instant) -> Result<()> {
        self.deadline = Some(deadline);
        Ok(())
    }
}

/// Write half
pub struct TungsteniteWriter {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameWriter for TungsteniteWriter {
    async fn write_frame(&mut self, frame: Frame) -> Result<()> {
        let message = frame_to_message(frame)?;
        self.sink
            .send(message)
            .await
            .map_err(|e| TetherError::Write(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        self.sink
            .close()
            .await
            .map_err(|e| TetherError::Close(e.to_string()))
    }
}

fn header_pairs(headers: &HeaderMap) -> Headers {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

/// Convert tungstenite Message to Frame
fn message_to_frame(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text),
        Message::Binary(data) => Frame::Binary(data),
        Message::Ping(data) => Frame::Ping(data),
        Message::Pong(data) => Frame::Pong(data),
        Message::Close(close) => {
            let (kind, reason) = match close {
                Some(close) => (close_kind(close.code), close.reason.into_owned()),
                None => (CloseKind::Normal, String::new()),
            };
            Frame::Close { kind, reason }
        }
        Message::Frame(raw) => Frame::Other(raw.into_data()),
    }
}

fn close_kind(code: CloseCode) -> CloseKind {
    match code {
        CloseCode::Away => CloseKind::GoingAway,
        CloseCode::Abnormal => CloseKind::Abnormal,
        _ => CloseKind::Normal,
    }
}

/// Convert Frame to tungstenite Message
fn frame_to_message(frame: Frame) -> Result<Message> {
    Ok(match frame {
        Frame::Text(text) => Message::Text(text),
        Frame::Binary(data) => Message::Binary(data),
        Frame::Ping(data) => Message::Ping(data),
        Frame::Pong(data) => Message::Pong(data),
        Frame::Close { kind, reason } => {
            let code = match kind {
                CloseKind::Normal => CloseCode::Normal,
                CloseKind::GoingAway => CloseCode::Away,
                // 1006 must not be sent on the wire
                CloseKind::Abnormal => {
                    return Err(TetherError::Write(
                        "abnormal closure cannot be sent in a close frame".into(),
                    ))
                }
            };
            Message::Close(Some(CloseFrame {
                code,
                reason: reason.into(),
            }))
        }
        Frame::Other(_) => {
            return Err(TetherError::Write("raw frames cannot be written".into()));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_codes_map_to_kinds() {
        let going_away = message_to_frame(Message::Close(Some(CloseFrame {
            code: CloseCode::Away,
            reason: "maintenance".into(),
        })));
        assert_eq!(
            going_away,
            Frame::Close {
                kind: CloseKind::GoingAway,
                reason: "maintenance".into()
            }
        );

        let abnormal = message_to_frame(Message::Close(Some(CloseFrame {
            code: CloseCode::Abnormal,
            reason: "".into(),
        })));
        assert!(matches!(
            abnormal,
            Frame::Close {
                kind: CloseKind::Abnormal,
                ..
            }
        ));

        assert_eq!(
            message_to_frame(Message::Close(None)),
            Frame::Close {
                kind: CloseKind::Normal,
                reason: String::new()
            }
        );
    }

    #[test]
    fn outbound_frames_convert() {
        assert_eq!(
            frame_to_message(Frame::Text("sub".into())).unwrap(),
            Message::Text("sub".into())
        );
        assert!(frame_to_message(Frame::Other(vec![1])).is_err());
        assert!(frame_to_message(Frame::Close {
            kind: CloseKind::Abnormal,
            reason: String::new()
        })
        .is_err());
    }

    #[test]
    fn size_limits_override_defaults() {
        let dialer = TungsteniteDialer::new(DialerConfig {
            max_message_size: Some(1024),
            ..DialerConfig::default()
        });
        let ws_config = dialer.ws_config();
        assert_eq!(ws_config.max_message_size, Some(1024));
        assert_eq!(
            ws_config.max_frame_size,
            WebSocketConfig::default().max_frame_size
        );
    }
}
