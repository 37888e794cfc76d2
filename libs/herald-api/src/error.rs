use std::fmt;

/// Why a single delivery attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryErrorKind {
    /// Endpoint URL could not be parsed or used.
    Endpoint,
    /// Connection could not be established or was reset.
    Connect,
    /// No response within the delivery timeout.
    Timeout,
    /// Subscriber answered with a non-success status.
    Status,
    /// Anything else the client reported.
    Other,
}

impl fmt::Display for DeliveryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeliveryErrorKind::Endpoint => "endpoint",
            DeliveryErrorKind::Connect => "connect",
            DeliveryErrorKind::Timeout => "timeout",
            DeliveryErrorKind::Status => "status",
            DeliveryErrorKind::Other => "other",
        })
    }
}

/// Delivery error. Terminal for the attempt that produced it.
#[derive(Debug, Clone)]
pub struct DeliveryError {
    pub kind: DeliveryErrorKind,
    pub message: String,
}

impl DeliveryError {
    pub fn endpoint(msg: impl Into<String>) -> Self {
        Self { kind: DeliveryErrorKind::Endpoint, message: msg.into() }
    }

    pub fn connect(msg: impl Into<String>) -> Self {
        Self { kind: DeliveryErrorKind::Connect, message: msg.into() }
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self { kind: DeliveryErrorKind::Timeout, message: msg.into() }
    }

    pub fn status(code: u16) -> Self {
        Self { kind: DeliveryErrorKind::Status, message: format!("subscriber answered {code}") }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self { kind: DeliveryErrorKind::Other, message: msg.into() }
    }

    /// Prefix the message, keeping the kind.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for DeliveryError {}

/// A registration payload that decoded but does not make sense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationError {
    pub field: &'static str,
    pub message: String,
}

impl RegistrationError {
    pub fn new(field: &'static str, msg: impl Into<String>) -> Self {
        Self { field, message: msg.into() }
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for RegistrationError {}
