use std::collections::BTreeSet;

use ahash::{HashMap, HashMapExt};
use aide::openapi::{
    ApiKeyLocation as OpenApiKeyLocation, Components, Info, OpenApi, Operation, PathItem, Paths,
    ReferenceOr, Response, Responses, SecurityRequirement, SecurityScheme as OpenApiSecurityScheme,
    StatusCode as OpenApiStatusCode,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{versioning::ApiVersionDescription, AppState};

pub const TITLE: &str = "Weather Forecast API";
pub const DESCRIPTION: &str = "This API returns weather forecast information";

/// How the document table is built at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryMode {
    /// one document per version reported by the version provider
    Discovery,
    /// the hand written list of documents, with per version security
    Declared,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// A routed operation as it appears in the documents of its API version.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApiOperation {
    /// version the route is mounted under, "2" for /v2
    pub version: &'static str,
    pub method: HttpMethod,
    /// OpenAPI path, parameters written as {id}
    pub path: &'static str,
    pub operation_id: &'static str,
    pub summary: &'static str,
    pub responses: &'static [(u16, &'static str)],
    pub deprecated: bool,
}

impl ApiOperation {
    fn to_openapi(self) -> Operation {
        let responses = self
            .responses
            .iter()
            .map(|(code, description)| {
                (
                    OpenApiStatusCode::Code(*code),
                    ReferenceOr::Item(Response {
                        description: description.to_string(),
                        ..Default::default()
                    }),
                )
            })
            .collect();
        Operation {
            operation_id: Some(self.operation_id.to_string()),
            summary: Some(self.summary.to_string()),
            deprecated: self.deprecated,
            responses: Some(Responses {
                responses,
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecuritySchemeKind {
    ApiKey,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SecurityScheme {
    pub scheme_name: String,
    pub kind: SecuritySchemeKind,
    pub header_name: String,
    pub location: ApiKeyLocation,
    pub description: String,
}

impl SecurityScheme {
    /// bearer token expected in the Authorization header
    pub fn jwt() -> Self {
        Self {
            scheme_name: "JWT".to_string(),
            kind: SecuritySchemeKind::ApiKey,
            header_name: "Authorization".to_string(),
            location: ApiKeyLocation::Header,
            description: "Field should be in this format: \nBearer {my token}".to_string(),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct DocumentDescriptor {
    pub name: String,
    /// empty for the document spanning every version
    pub version_tags: BTreeSet<String>,
    pub title: String,
    pub description: String,
    pub version: Option<String>,
    pub suppress_deprecated_fields: bool,
    pub security_scheme: Option<SecurityScheme>,
}

impl DocumentDescriptor {
    fn discovered(version: &ApiVersionDescription) -> Self {
        let mut title = TITLE.to_string();
        if version.deprecated {
            title.push_str(" (DEPRECATED)");
        }
        Self {
            name: version.group_name.clone(),
            version_tags: BTreeSet::from([version.version.clone()]),
            title,
            description: DESCRIPTION.to_string(),
            version: None,
            suppress_deprecated_fields: true,
            security_scheme: None,
        }
    }
    fn declared(version: u32) -> Self {
        Self {
            name: format!("v{version}"),
            version_tags: BTreeSet::from([version.to_string()]),
            title: TITLE.to_string(),
            description: DESCRIPTION.to_string(),
            version: Some(format!("v{version}")),
            suppress_deprecated_fields: true,
            security_scheme: None,
        }
    }
    /// used to generate clients for every version in one go
    fn aggregate() -> Self {
        Self {
            name: "all".to_string(),
            version_tags: BTreeSet::new(),
            title: TITLE.to_string(),
            description: TITLE.to_string(),
            version: Some("all".to_string()),
            suppress_deprecated_fields: false,
            security_scheme: None,
        }
    }
    pub fn is_aggregate(&self) -> bool {
        self.version_tags.is_empty()
    }
    /// operations of the tagged versions, every operation for the aggregate.
    /// Deprecated operations are left out when deprecated members are suppressed.
    pub fn includes(&self, operation: &ApiOperation) -> bool {
        (self.is_aggregate() || self.version_tags.contains(operation.version))
            && !(operation.deprecated && self.suppress_deprecated_fields)
    }
    /// render as an OpenAPI document
    pub fn to_openapi(&self, operations: &[ApiOperation]) -> OpenApi {
        // path items in route order
        let mut items: Vec<(&str, PathItem)> = Vec::new();
        for operation in operations.iter().filter(|o| self.includes(o)) {
            let index = match items.iter().position(|(path, _)| *path == operation.path) {
                Some(index) => index,
                None => {
                    items.push((operation.path, PathItem::default()));
                    items.len() - 1
                }
            };
            let item = &mut items[index].1;
            let slot = match operation.method {
                HttpMethod::Get => &mut item.get,
                HttpMethod::Post => &mut item.post,
                HttpMethod::Put => &mut item.put,
                HttpMethod::Delete => &mut item.delete,
            };
            *slot = Some(operation.to_openapi());
        }
        let mut api = OpenApi {
            info: Info {
                title: self.title.clone(),
                description: Some(self.description.clone()),
                version: self.version.clone().unwrap_or_else(|| self.name.clone()),
                ..Default::default()
            },
            ..Default::default()
        };
        if !items.is_empty() {
            api.paths = Some(Paths {
                paths: items
                    .into_iter()
                    .map(|(path, item)| (path.to_string(), ReferenceOr::Item(item)))
                    .collect(),
                ..Default::default()
            });
        }
        if let Some(scheme) = &self.security_scheme {
            let rendered = match scheme.kind {
                SecuritySchemeKind::ApiKey => OpenApiSecurityScheme::ApiKey {
                    location: match scheme.location {
                        ApiKeyLocation::Header => OpenApiKeyLocation::Header,
                    },
                    name: scheme.header_name.clone(),
                    description: Some(scheme.description.clone()),
                    extensions: Default::default(),
                },
            };
            api.components = Some(Components {
                security_schemes: [(scheme.scheme_name.clone(), ReferenceOr::Item(rendered))]
                    .into_iter()
                    .collect(),
                ..Default::default()
            });
            let requirement: SecurityRequirement = [(scheme.scheme_name.clone(), Vec::new())]
                .into_iter()
                .collect();
            api.security = vec![requirement];
        }
        api
    }
}

/// Immutable table of documents, in insertion order, addressable by name.
#[derive(Debug, Default, Clone)]
pub struct DocumentRegistry {
    documents: Vec<DocumentDescriptor>,
    index: HashMap<String, usize>,
    // every routed operation, filtered per document when rendering
    operations: Vec<ApiOperation>,
}

impl DocumentRegistry {
    fn push(&mut self, descriptor: DocumentDescriptor) {
        if self.index.contains_key(&descriptor.name) {
            warn!("document {} already registered, ignoring", descriptor.name);
            return;
        }
        self.index.insert(descriptor.name.clone(), self.documents.len());
        self.documents.push(descriptor);
    }
    pub fn get(&self, name: &str) -> Option<&DocumentDescriptor> {
        self.index.get(name).map(|i| &self.documents[*i])
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.name.as_str())
    }
    pub fn iter(&self) -> impl Iterator<Item = &DocumentDescriptor> {
        self.documents.iter()
    }
    pub fn len(&self) -> usize {
        self.documents.len()
    }
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
    pub fn with_operations(mut self, operations: Vec<ApiOperation>) -> Self {
        self.operations = operations;
        self
    }
    pub fn render(&self, name: &str) -> Option<OpenApi> {
        self.get(name).map(|d| d.to_openapi(&self.operations))
    }
    pub fn log_summary(&self) {
        if self.is_empty() {
            warn!("no OpenAPI document will be served");
        } else {
            info!(
                "serving OpenAPI documents: {}",
                self.names().collect::<Vec<_>>().join(", ")
            );
        }
    }
}

/// build the document table. Pure, the versions are only read.
/// An empty version list in discovery mode gives an empty table, never an error.
pub fn build_descriptors(
    versions: &[ApiVersionDescription],
    mode: RegistryMode,
) -> DocumentRegistry {
    let mut registry = DocumentRegistry {
        documents: Vec::new(),
        index: HashMap::new(),
        operations: Vec::new(),
    };
    match mode {
        RegistryMode::Discovery => {
            if versions.is_empty() {
                warn!("no API version discovered");
            }
            versions
                .iter()
                .map(DocumentDescriptor::discovered)
                .for_each(|d| registry.push(d));
        }
        RegistryMode::Declared => {
            registry.push(DocumentDescriptor::declared(1));
            registry.push(DocumentDescriptor {
                security_scheme: Some(SecurityScheme::jwt()),
                ..DocumentDescriptor::declared(2)
            });
            registry.push(DocumentDescriptor::aggregate());
        }
    }
    debug!("{} OpenAPI documents registered", registry.len());
    registry
}

#[derive(Serialize)]
struct DocumentLink {
    name: String,
    title: String,
    url: String,
}

/// list the documents an explorer can load
pub async fn list_documents(State(state): State<AppState>) -> impl IntoResponse {
    debug!("new request to list OpenAPI documents");
    let links: Vec<DocumentLink> = state
        .documents
        .iter()
        .map(|d| DocumentLink {
            name: d.name.to_uppercase(),
            title: d.title.clone(),
            url: format!("/swagger/{}/swagger.json", d.name),
        })
        .collect();
    Json(links)
}

/// raw descriptors, security included
pub async fn list_descriptors(State(state): State<AppState>) -> impl IntoResponse {
    debug!("new request to list OpenAPI descriptors");
    Json(state.documents.iter().cloned().collect::<Vec<_>>())
}

/// serve document as json
pub async fn serve_document(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    debug!("new request for OpenAPI document {name}");
    match state.documents.render(&name) {
        Some(api) => Json(api).into_response(),
        None => {
            warn!("request for unknown OpenAPI document {name}");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
