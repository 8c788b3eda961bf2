use bytes::Bytes;

/// Media type given to documents produced by an accepted rewrite.
pub const RENDERED_MEDIA_TYPE: &str = "text/html";

/// Display name given to documents produced by an accepted rewrite.
pub const RENDERED_DISPLAY_NAME: &str = "Optimized_Resume.html";

/// A user-supplied document: raw bytes plus enough metadata to forward it
/// to the collaborator and to label it in the UI.
///
/// Immutable once constructed. A session owns exactly one handle at a time;
/// replacing it drops the previous one. `Bytes` keeps the clone taken for
/// an in-flight collaborator call cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    content: Bytes,
    media_type: String,
    display_name: String,
}

impl DocumentHandle {
    pub fn new(content: impl Into<Bytes>, media_type: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            media_type: media_type.into(),
            display_name: display_name.into(),
        }
    }

    /// Wraps the markup of an accepted rewrite as a new document handle,
    /// marked as a rendered derivative of the original upload.
    pub fn from_rendered_markup(html: &str) -> Self {
        Self::new(
            Bytes::copy_from_slice(html.as_bytes()),
            RENDERED_MEDIA_TYPE,
            RENDERED_DISPLAY_NAME,
        )
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_markup_is_marked_as_html_derivative() {
        let doc = DocumentHandle::from_rendered_markup("<html><body>CV</body></html>");
        assert_eq!(doc.media_type(), RENDERED_MEDIA_TYPE);
        assert_eq!(doc.display_name(), RENDERED_DISPLAY_NAME);
        assert_eq!(doc.content(), b"<html><body>CV</body></html>");
    }

    #[test]
    fn test_upload_keeps_caller_metadata() {
        let doc = DocumentHandle::new(vec![1u8, 2, 3], "application/pdf", "cv.pdf");
        assert_eq!(doc.media_type(), "application/pdf");
        assert_eq!(doc.display_name(), "cv.pdf");
        assert_eq!(doc.content(), &[1, 2, 3]);
    }
}
