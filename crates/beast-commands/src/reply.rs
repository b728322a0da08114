//! The single response an invocation produces.

/// Prefix of private replies.
pub const PRIVATE_MARKER: &str = "🔒 ";
/// Prefix of public replies.
pub const PUBLIC_MARKER: &str = "💬 ";

/// Reply text plus its visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Undecorated text.
    pub content: String,
    /// Only visible to the invoking user.
    pub ephemeral: bool,
}

impl Reply {
    /// A reply only the invoking user sees.
    pub fn private(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }

    /// A reply visible to the channel.
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    /// Text as sent, with the visibility marker in front.
    #[must_use]
    pub fn rendered(&self) -> String {
        let marker = if self.ephemeral {
            PRIVATE_MARKER
        } else {
            PUBLIC_MARKER
        };
        format!("{marker}{}", self.content)
    }
}
