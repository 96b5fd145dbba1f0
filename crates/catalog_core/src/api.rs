use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{Product, ProductId},
    protocol::{CreateProductRequest, ListProductsQuery, PRODUCTS_PATH},
};
use tracing::{debug, warn};

use crate::error::CatalogError;

/// Remote source of truth for products.
#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn list_products(&self, query: &ListProductsQuery) -> Result<Vec<Product>, CatalogError>;
    async fn create_product(&self, request: &CreateProductRequest)
        -> Result<Product, CatalogError>;
    async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError>;
}

pub struct HttpProductApi {
    http: Client,
    base_url: String,
}

impl HttpProductApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn products_url(&self) -> String {
        format!("{}/{PRODUCTS_PATH}", self.base_url)
    }

    fn product_url(&self, id: ProductId) -> String {
        format!("{}/{PRODUCTS_PATH}/{}", self.base_url, id.0)
    }
}

#[async_trait]
impl ProductApi for HttpProductApi {
    async fn list_products(&self, query: &ListProductsQuery) -> Result<Vec<Product>, CatalogError> {
        let url = self.products_url();
        debug!(%url, sort_by = %query.sort_by, "fetching products");
        let res = self.http.get(url).query(query).send().await?;
        let res = ensure_success(res).await?;
        Ok(res.json().await?)
    }

    async fn create_product(
        &self,
        request: &CreateProductRequest,
    ) -> Result<Product, CatalogError> {
        let res = self
            .http
            .post(self.products_url())
            .json(request)
            .send()
            .await?;
        let res = ensure_success(res).await?;
        Ok(res.json().await?)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        let res = self.http.delete(self.product_url(id)).send().await?;
        ensure_success(res).await?;
        Ok(())
    }
}

async fn ensure_success(res: Response) -> Result<Response, CatalogError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = match res.text().await {
        Ok(body) => body,
        Err(err) => {
            warn!(%status, error = %err, "failed to read error response body");
            String::new()
        }
    };
    Err(CatalogError::server(status.as_u16(), body))
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
