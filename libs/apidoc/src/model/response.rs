use super::Content;

/// One entry of an operation's response table.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub description: String,
    pub content: Option<Content>,
}

impl Response {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            content: None,
        }
    }

    pub fn content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub required: bool,
    pub content: Content,
    pub description: Option<String>,
}

impl RequestBody {
    /// A required body.
    pub fn new(content: Content) -> Self {
        Self {
            required: true,
            content,
            description: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
