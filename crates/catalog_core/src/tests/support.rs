//! In-memory stand-in for the remote catalog.

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicI64, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use shared::{
    domain::{Product, ProductId},
    protocol::{CreateProductRequest, ListProductsQuery},
};
use tokio::sync::Mutex;

use crate::{api::ProductApi, error::CatalogError};

pub(crate) fn product(id: i64, name: &str, price: f64) -> Product {
    Product {
        id: ProductId(id),
        name: name.to_string(),
        price,
        modified_date: "2024-01-01T00:00:00Z".parse().expect("timestamp"),
        description: None,
        image_url: None,
        discontinued: None,
        fixed_price: None,
    }
}

pub(crate) fn numbered_products(count: i64) -> Vec<Product> {
    (1..=count)
        .map(|id| product(id, &format!("Product {id}"), id as f64))
        .collect()
}

pub(crate) struct FakeProductApi {
    products: Mutex<Vec<Product>>,
    queued_failures: Mutex<VecDeque<CatalogError>>,
    queries: Mutex<Vec<ListProductsQuery>>,
    created: Mutex<Vec<CreateProductRequest>>,
    deleted: Mutex<Vec<ProductId>>,
    list_calls: AtomicUsize,
    next_id: AtomicI64,
}

impl FakeProductApi {
    pub(crate) fn with_products(products: Vec<Product>) -> Self {
        let next_id = products.iter().map(|p| p.id.0).max().unwrap_or(0) + 1;
        Self {
            products: Mutex::new(products),
            queued_failures: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            next_id: AtomicI64::new(next_id),
        }
    }

    pub(crate) async fn fail_next_list(&self, err: CatalogError) {
        self.queued_failures.lock().await.push_back(err);
    }

    pub(crate) async fn replace_products(&self, products: Vec<Product>) {
        *self.products.lock().await = products;
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) async fn queries(&self) -> Vec<ListProductsQuery> {
        self.queries.lock().await.clone()
    }

    pub(crate) async fn created(&self) -> Vec<CreateProductRequest> {
        self.created.lock().await.clone()
    }

    pub(crate) async fn deleted(&self) -> Vec<ProductId> {
        self.deleted.lock().await.clone()
    }
}

#[async_trait]
impl ProductApi for FakeProductApi {
    async fn list_products(&self, query: &ListProductsQuery) -> Result<Vec<Product>, CatalogError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().await.push(query.clone());
        if let Some(err) = self.queued_failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(self.products.lock().await.clone())
    }

    async fn create_product(
        &self,
        request: &CreateProductRequest,
    ) -> Result<Product, CatalogError> {
        self.created.lock().await.push(request.clone());
        let created = Product {
            id: ProductId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: request.product.name.clone(),
            price: request.product.price,
            modified_date: request.modified_date,
            description: request.product.description.clone(),
            image_url: request.product.image_url.clone(),
            discontinued: request.product.discontinued,
            fixed_price: request.product.fixed_price,
        };
        self.products.lock().await.insert(0, created.clone());
        Ok(created)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        let mut products = self.products.lock().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(CatalogError::server(404, "not found"));
        }
        self.deleted.lock().await.push(id);
        Ok(())
    }
}
