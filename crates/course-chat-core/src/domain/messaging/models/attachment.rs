// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use mime::Mime;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::util::mime_serde_shim;

/// An uploaded file referenced by a message of kind `File`.
///
/// The object storage owns the bytes; the engine only carries the durable URL and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: Url,
    pub name: String,
    pub size_bytes: u64,
    #[serde(with = "mime_serde_shim")]
    pub mime_type: Mime,
    pub thumbnail_url: Option<Url>,
}

/// Render-time classification of an attachment. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentCategory {
    Image,
    Pdf,
    Document,
    Other,
}

impl Attachment {
    pub fn category(&self) -> AttachmentCategory {
        AttachmentCategory::from(&self.mime_type)
    }
}

impl From<&Mime> for AttachmentCategory {
    fn from(mime: &Mime) -> Self {
        if mime.type_() == mime::IMAGE {
            return AttachmentCategory::Image;
        }
        if mime.essence_str() == mime::APPLICATION_PDF.essence_str() {
            return AttachmentCategory::Pdf;
        }
        if mime.type_() == mime::TEXT {
            return AttachmentCategory::Document;
        }

        let subtype = mime.subtype().as_str();
        let is_office_document = mime.type_() == mime::APPLICATION
            && (subtype == "msword"
                || subtype == "rtf"
                || subtype.starts_with("vnd.openxmlformats-officedocument")
                || subtype.starts_with("vnd.oasis.opendocument")
                || subtype.starts_with("vnd.ms-"));

        if is_office_document {
            AttachmentCategory::Document
        } else {
            AttachmentCategory::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(mime: &str) -> AttachmentCategory {
        AttachmentCategory::from(&mime.parse::<Mime>().unwrap())
    }

    #[test]
    fn test_classifies_mime_types() {
        assert_eq!(category("image/png"), AttachmentCategory::Image);
        assert_eq!(category("application/pdf"), AttachmentCategory::Pdf);
        assert_eq!(category("text/plain"), AttachmentCategory::Document);
        assert_eq!(
            category("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            AttachmentCategory::Document
        );
        assert_eq!(category("application/zip"), AttachmentCategory::Other);
    }
}
