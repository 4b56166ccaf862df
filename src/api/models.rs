use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A server-defined record. The client enforces no schema on it.
pub type Entity = Map<String, Value>;

/// Identifier of an entity inside a resource; the backend uses integers for
/// most tables but some expose string keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(id) => write!(f, "{}", id),
            EntityId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId::Int(id)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId::Int(i64::from(id))
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        match id.parse::<i64>() {
            Ok(n) => EntityId::Int(n),
            Err(_) => EntityId::Str(id.to_string()),
        }
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId::from(id.as_str())
    }
}

/// Extract the `id` field of an entity, if it carries one.
pub fn entity_id(entity: &Entity) -> Option<EntityId> {
    match entity.get("id")? {
        Value::Number(n) => n.as_i64().map(EntityId::Int),
        Value::String(s) => Some(EntityId::from(s.as_str())),
        _ => None,
    }
}

/// One entry of the paginator's link bar.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageLink {
    pub url: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub active: bool,
}

impl PageLink {
    /// Page number carried by the link's `?page=` parameter.
    pub fn page_number(&self) -> Option<u32> {
        self.url.as_deref().and_then(page_from_url)
    }

    pub fn is_previous(&self) -> bool {
        self.label.to_lowercase().contains("previous")
    }

    pub fn is_next(&self) -> bool {
        self.label.to_lowercase().contains("next")
    }
}

/// Read the `page` query parameter from an absolute or relative URL.
pub fn page_from_url(url: &str) -> Option<u32> {
    let parsed = Url::parse(url)
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(url)))
        .ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse::<u32>().ok())
        .filter(|page| *page > 0)
}

/// One page of a resource listing.
///
/// The backend emits two shapes: the flat paginator
/// (`{data, links: [..], from, to, total}`) and the resource-collection
/// wrapper (`{data, links: {..}, meta: {from, to, total, links: [..]}}`).
/// Both normalize into this struct.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(
    from = "RawPage<T>",
    bound(deserialize = "T: serde::de::DeserializeOwned")
)]
pub struct Paginated<T = Entity> {
    pub data: Vec<T>,
    pub links: Vec<PageLink>,
    pub from: u64,
    pub to: u64,
    pub total: u64,
}

impl<T> Paginated<T> {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn previous_page(&self) -> Option<u32> {
        self.links
            .iter()
            .find(|link| link.is_previous())
            .and_then(PageLink::page_number)
    }

    pub fn next_page(&self) -> Option<u32> {
        self.links
            .iter()
            .find(|link| link.is_next())
            .and_then(PageLink::page_number)
    }

    /// Page marked active in the link bar.
    pub fn current_page(&self) -> Option<u32> {
        self.links
            .iter()
            .find(|link| link.active && !link.is_previous() && !link.is_next())
            .and_then(|link| link.page_number().or_else(|| link.label.trim().parse().ok()))
    }
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
struct RawPage<T> {
    data: Vec<T>,
    #[serde(default)]
    links: RawLinks,
    #[serde(default)]
    from: Option<u64>,
    #[serde(default)]
    to: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    meta: Option<RawMeta>,
}

#[derive(Deserialize, Default)]
#[serde(untagged)]
enum RawLinks {
    List(Vec<PageLink>),
    Map(Map<String, Value>),
    #[default]
    Missing,
}

#[derive(Deserialize, Default)]
struct RawMeta {
    #[serde(default)]
    from: Option<u64>,
    #[serde(default)]
    to: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    links: Vec<PageLink>,
}

impl<T> From<RawPage<T>> for Paginated<T> {
    fn from(raw: RawPage<T>) -> Self {
        let meta = raw.meta.unwrap_or_default();
        let links = match raw.links {
            RawLinks::List(links) => links,
            RawLinks::Map(_) | RawLinks::Missing => meta.links,
        };
        let total = raw
            .total
            .or(meta.total)
            .unwrap_or(raw.data.len() as u64);

        Paginated {
            links,
            from: raw.from.or(meta.from).unwrap_or(0),
            to: raw.to.or(meta.to).unwrap_or(0),
            total,
            data: raw.data,
        }
    }
}

/// Per-field validation messages reported by the server on HTTP 422.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn push(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `field: first message` pairs joined for a one-line notification.
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .filter_map(|(field, messages)| {
                messages.first().map(|msg| format!("{}: {}", field, msg))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Body of a 422 response.
#[derive(Debug, Deserialize)]
pub struct ValidationBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: FieldErrors,
}

/// A binary form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        Ok(Self::new(file_name, mime.essence_str(), bytes))
    }
}


#[derive(Debug, Clone, PartialEq)]
pub enum MultipartField {
    Text(String),
    File(FileUpload),
}

/// Ordered multipart payload, rendered into a transport form at send time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartBody {
    parts: Vec<(String, MultipartField)>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts
            .push((name.into(), MultipartField::Text(value.into())));
        self
    }

    pub fn file(mut self, name: impl Into<String>, upload: FileUpload) -> Self {
        self.parts.push((name.into(), MultipartField::File(upload)));
        self
    }

    pub fn parts(&self) -> &[(String, MultipartField)] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<(String, MultipartField)> {
        self.parts
    }
}

/// Explicitly tagged request payload for create/update.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Entity),
    Multipart(MultipartBody),
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

impl From<Entity> for RequestBody {
    fn from(fields: Entity) -> Self {
        RequestBody::Json(fields)
    }
}

impl From<MultipartBody> for RequestBody {
    fn from(body: MultipartBody) -> Self {
        RequestBody::Multipart(body)
    }
}
