use crate::api::client::StockroomClient;
use crate::api::models::{Entity, EntityId, Paginated, RequestBody};
use crate::storage::download::DownloadSink;
use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::ACCEPT;
use std::path::PathBuf;

pub const PRODUCTS: &str = "products";
pub const CATEGORIES: &str = "categories";
pub const BRANDS: &str = "brands";
pub const CUSTOMERS: &str = "customers";
pub const SUPPLIERS: &str = "suppliers";
pub const EMPLOYEES: &str = "employees";
pub const USERS: &str = "users";
pub const ROLES: &str = "roles";

/// Collections exposed by the backend.
pub const KNOWN_RESOURCES: &[&str] = &[
    PRODUCTS, CATEGORIES, BRANDS, CUSTOMERS, SUPPLIERS, EMPLOYEES, USERS, ROLES,
];

/// Operations over one REST collection.
///
/// Implementations never handle errors themselves; every failure is returned
/// to the caller, which decides what the user sees.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Resource name used in request paths and download file names.
    fn resource(&self) -> &str;

    async fn list(&self) -> crate::Result<Vec<Entity>>;

    async fn list_paginated(&self, page: u32, query: Option<&str>) -> crate::Result<Paginated>;

    async fn get_by_id(&self, id: &EntityId) -> crate::Result<Entity>;

    async fn create(&self, body: RequestBody) -> crate::Result<Entity>;

    async fn update(&self, id: &EntityId, body: RequestBody) -> crate::Result<Entity>;

    async fn delete_by_id(&self, id: &EntityId) -> crate::Result<()>;

    /// Download the resource's PDF report as `{resource}.pdf`.
    async fn export_pdf(&self, sink: &dyn DownloadSink) -> crate::Result<PathBuf>;
}

/// Resource-parameterized client over `/api/{resource}`.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    client: StockroomClient,
    resource: String,
}

impl ResourceClient {
    pub fn new(client: StockroomClient, resource: impl Into<String>) -> Self {
        Self {
            client,
            resource: resource.into(),
        }
    }

    fn collection_path(&self) -> String {
        format!("/api/{}", self.resource)
    }

    fn member_path(&self, id: &EntityId) -> String {
        format!("/api/{}/{}", self.resource, id)
    }

    pub fn pdf_file_name(&self) -> String {
        format!("{}.pdf", self.resource)
    }

    async fn get_json<T>(&self, endpoint: &str) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .send(self.client.build_request(Method::GET, endpoint), endpoint)
            .await?;
        Ok(self.client.handle_response(response, endpoint).await?)
    }

    async fn post_body(&self, endpoint: &str, body: RequestBody) -> crate::Result<Entity> {
        let request = self.client.build_request(Method::POST, endpoint);
        let request = self.client.attach_body(request, body, endpoint)?;
        let response = self.client.send(request, endpoint).await?;
        Ok(self.client.handle_response(response, endpoint).await?)
    }
}

#[async_trait]
impl ResourceApi for ResourceClient {
    fn resource(&self) -> &str {
        &self.resource
    }

    async fn list(&self) -> crate::Result<Vec<Entity>> {
        self.get_json(&self.collection_path()).await
    }

    async fn list_paginated(&self, page: u32, query: Option<&str>) -> crate::Result<Paginated> {
        let endpoint = format!("{}/paginated", self.collection_path());
        let mut params = vec![("page", page.max(1).to_string())];
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            params.push(("query", query.to_string()));
        }

        let request = self
            .client
            .build_request(Method::GET, &endpoint)
            .query(&params);
        let response = self.client.send(request, &endpoint).await?;
        Ok(self.client.handle_response(response, &endpoint).await?)
    }

    async fn get_by_id(&self, id: &EntityId) -> crate::Result<Entity> {
        self.get_json(&self.member_path(id)).await
    }

    async fn create(&self, body: RequestBody) -> crate::Result<Entity> {
        let endpoint = format!("{}/store", self.collection_path());
        self.post_body(&endpoint, body).await
    }

    async fn update(&self, id: &EntityId, body: RequestBody) -> crate::Result<Entity> {
        // The backend only parses multipart bodies on POST, so updates go
        // through the framework's verb override.
        let endpoint = format!("{}?_method=PUT", self.member_path(id));
        self.post_body(&endpoint, body).await
    }

    async fn delete_by_id(&self, id: &EntityId) -> crate::Result<()> {
        let endpoint = self.member_path(id);
        self.client
            .send(self.client.build_request(Method::DELETE, &endpoint), &endpoint)
            .await?;
        Ok(())
    }

    async fn export_pdf(&self, sink: &dyn DownloadSink) -> crate::Result<PathBuf> {
        let endpoint = format!("{}/pdf", self.collection_path());
        let request = self
            .client
            .build_request(Method::GET, &endpoint)
            .header(ACCEPT, "application/pdf");
        let response = self.client.send(request, &endpoint).await?;
        let bytes = response.bytes().await.map_err(|e| {
            crate::utils::error_helpers::convert_request_error(
                e,
                &endpoint,
                self.client.timeout_secs(),
            )
        })?;

        let path = sink.deliver(&self.pdf_file_name(), &bytes)?;
        log::info!("saved {} report to {}", self.resource, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(resource: &str) -> ResourceClient {
        let http = StockroomClient::new("http://example.test".to_string())
            .expect("client creation failed");
        http.resource(resource)
    }

    #[test]
    fn test_paths() {
        let roles = client(ROLES);
        assert_eq!(roles.resource(), "roles");
        assert_eq!(roles.collection_path(), "/api/roles");
        assert_eq!(roles.member_path(&EntityId::Int(4)), "/api/roles/4");
        assert_eq!(roles.pdf_file_name(), "roles.pdf");
    }

    #[test]
    fn test_known_resources() {
        assert_eq!(KNOWN_RESOURCES.len(), 8);
        assert!(KNOWN_RESOURCES.contains(&"suppliers"));
    }
}
