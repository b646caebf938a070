use serde::Serialize;

use crate::error::{DocError, Result};

/// Document metadata. `title` and `version` are mandatory at build time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    title: Option<String>,
    version: Option<String>,
    description: Option<String>,
    terms_of_service: Option<String>,
    contact: Option<Contact>,
    license: Option<License>,
}

impl Info {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            version: Some(version.into()),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn terms_of_service(mut self, url: impl Into<String>) -> Self {
        self.terms_of_service = Some(url.into());
        self
    }

    pub fn contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn license(mut self, name: impl Into<String>, url: Option<String>) -> Self {
        self.license = Some(License {
            name: name.into(),
            url,
        });
        self
    }

    /// Validated, serializable form.
    pub(crate) fn to_object(&self) -> Result<InfoObject> {
        let title = self
            .title
            .clone()
            .ok_or(DocError::MissingInfoField { field: "title" })?;
        let version = self
            .version
            .clone()
            .ok_or(DocError::MissingInfoField { field: "version" })?;

        Ok(InfoObject {
            title,
            version,
            description: self.description.clone(),
            terms_of_service: self.terms_of_service.clone(),
            contact: self.contact.clone(),
            license: self.license.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Contact {
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoObject {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_title_and_version_are_reported_in_order() {
        let err = Info::default().to_object().unwrap_err();
        assert!(matches!(err, DocError::MissingInfoField { field: "title" }));

        let err = Info::default().title("Pets").to_object().unwrap_err();
        assert!(matches!(err, DocError::MissingInfoField { field: "version" }));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let info = Info::new("Pets API", "1.0").to_object().unwrap();
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Pets API", "version": "1.0"}));
    }

    #[test]
    fn full_info_uses_openapi_field_names() {
        let info = Info::new("Pets API", "1.0")
            .description("All the pets")
            .terms_of_service("https://example.com/tos")
            .contact(Contact::email("ops@example.com"))
            .license("MIT", Some("https://opensource.org/licenses/MIT".to_string()))
            .to_object()
            .unwrap();
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["termsOfService"], "https://example.com/tos");
        assert_eq!(json["contact"]["email"], "ops@example.com");
        assert_eq!(json["license"]["name"], "MIT");
    }
}
