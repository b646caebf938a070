use serde::Serialize;

use crate::example::Example;

pub mod media_type {
    pub const APPLICATION_JSON: &str = "application/json";
    pub const APPLICATION_XML: &str = "application/xml";
    pub const TEXT_PLAIN: &str = "text/plain";
    pub const TEXT_HTML: &str = "text/html";
    pub const TEXT_XML: &str = "text/xml";
}

/// A body of one media type, documented by a live example.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    media_type: String,
    example: Example,
}

impl Content {
    pub fn new(media_type: impl Into<String>, example: impl Into<Example>) -> Self {
        Self {
            media_type: media_type.into(),
            example: example.into(),
        }
    }

    /// JSON body from any `Serialize` value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        Self::new(media_type::APPLICATION_JSON, Example::from_serialize(value))
    }

    /// JSON body from an already classified example.
    pub fn json_example(example: impl Into<Example>) -> Self {
        Self::new(media_type::APPLICATION_JSON, example)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(media_type::TEXT_PLAIN, value.into())
    }

    pub fn html(value: impl Into<String>) -> Self {
        Self::new(media_type::TEXT_HTML, value.into())
    }

    pub fn text_xml(value: impl Into<String>) -> Self {
        Self::new(media_type::TEXT_XML, value.into())
    }

    pub fn xml(value: impl Into<String>) -> Self {
        Self::new(media_type::APPLICATION_XML, value.into())
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn example(&self) -> &Example {
        &self.example
    }
}
