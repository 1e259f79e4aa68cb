use std::fmt;

/// Flavour of a close-family frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    /// Regular close frame
    Normal,
    /// Peer is going away (1001)
    GoingAway,
    /// Abnormal closure (1006)
    Abnormal,
}

impl fmt::Display for CloseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseKind::Normal => f.write_str("close"),
            CloseKind::GoingAway => f.write_str("going away"),
            CloseKind::Abnormal => f.write_str("abnormal closure"),
        }
    }
}

/// One WebSocket frame as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close { kind: CloseKind, reason: String },
    /// A raw frame the transport could not classify
    Other(Vec<u8>),
}

impl Frame {
    /// Get the frame as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Frame::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the frame as binary, if it is binary
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Frame::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Check if the frame is a control frame (ping, pong or close)
    pub fn is_control(&self) -> bool {
        matches!(self, Frame::Ping(_) | Frame::Pong(_) | Frame::Close { .. })
    }

    /// Raw payload bytes
    pub fn payload(&self) -> &[u8] {
        match self {
            Frame::Text(s) => s.as_bytes(),
            Frame::Binary(b) | Frame::Ping(b) | Frame::Pong(b) | Frame::Other(b) => b,
            Frame::Close { reason, .. } => reason.as_bytes(),
        }
    }
}

/// Control frames accepted by `write_control`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Ping,
    Pong,
    Close,
}

impl ControlKind {
    /// Wrap a payload into the matching frame
    pub fn into_frame(self, payload: Vec<u8>) -> Frame {
        match self {
            ControlKind::Ping => Frame::Ping(payload),
            ControlKind::Pong => Frame::Pong(payload),
            ControlKind::Close => Frame::Close {
                kind: CloseKind::Normal,
                reason: String::from_utf8_lossy(&payload).into_owned(),
            },
        }
    }
}
