use std::fmt;

/// Secret used to authenticate every request made on behalf of a task.
///
/// The value is sent verbatim in the `Authorization` header. It is intentionally neither
/// `Serialize` nor printable: `Debug` and `Display` are redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Raw secret, for building the request header only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Whether the secret fits in an HTTP header value: visible ASCII, space or tab.
    pub fn is_header_safe(&self) -> bool {
        self.0
            .bytes()
            .all(|b| b == b'\t' || (b' '..=b'~').contains(&b))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}
