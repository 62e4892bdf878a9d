use bytes::Bytes;

/// A reference to an image handed to a verdict engine.
///
/// `data` carries the bytes when the caller already has them (a fresh
/// upload); otherwise engines that need pixels fetch `url`.
#[derive(Debug, Clone)]
pub struct ImageReference {
    /// Retrieval location.
    pub url: String,
    /// Display name of the source file.
    pub name: String,
    /// MIME type, when known.
    pub content_type: Option<String>,
    /// Inline image bytes, when already in hand.
    pub data: Option<Bytes>,
}

impl ImageReference {
    /// A reference to an image that is only reachable by URL.
    pub fn remote(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            content_type: None,
            data: None,
        }
    }

    /// Attach inline bytes.
    #[must_use]
    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach a content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Whether a MIME type names an image (`image/*`).
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}
