use axum::http::{HeaderName, HeaderValue};
use derive_more::Deref;
use serde::Serialize;

pub const SUPPORTED_VERSIONS_HEADER: HeaderName = HeaderName::from_static("api-supported-versions");
pub const DEPRECATED_VERSIONS_HEADER: HeaderName =
    HeaderName::from_static("api-deprecated-versions");

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ApiVersionDescription {
    /// version as it appears in the path, "2" for /v2
    pub version: String,
    /// name of the group of routes, "v2"
    pub group_name: String,
    pub deprecated: bool,
}

impl ApiVersionDescription {
    pub fn new(version: u32, deprecated: bool) -> Self {
        Self {
            version: version.to_string(),
            group_name: format!("v{version}"),
            deprecated,
        }
    }
}

/// Anything able to tell which API versions are currently served.
pub trait ApiVersionDescriptionProvider {
    fn api_version_descriptions(&self) -> Vec<ApiVersionDescription>;
}

/// versions mounted by the router.
#[derive(Deref, Clone, Debug)]
pub struct SupportedVersions(pub Vec<ApiVersionDescription>);

impl Default for SupportedVersions {
    fn default() -> Self {
        Self(vec![
            ApiVersionDescription::new(1, false),
            ApiVersionDescription::new(2, false),
        ])
    }
}

impl ApiVersionDescriptionProvider for SupportedVersions {
    fn api_version_descriptions(&self) -> Vec<ApiVersionDescription> {
        self.0.clone()
    }
}

impl SupportedVersions {
    fn header_value(&self, deprecated: bool) -> Option<HeaderValue> {
        let versions = self
            .iter()
            .filter(|v| v.deprecated == deprecated)
            .map(|v| v.version.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        if versions.is_empty() {
            None
        } else {
            HeaderValue::from_str(&versions).ok()
        }
    }
    /// value of the api-supported-versions header, "1, 2"
    pub fn supported_header(&self) -> Option<HeaderValue> {
        self.header_value(false)
    }
    /// value of the api-deprecated-versions header, if any version is deprecated
    pub fn deprecated_header(&self) -> Option<HeaderValue> {
        self.header_value(true)
    }
}
