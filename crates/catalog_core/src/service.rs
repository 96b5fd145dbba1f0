//! Single access point for product data.
//!
//! The service owns the published product collection. Reloads replace it
//! wholesale; inserts and deletes only talk to the remote API and leave the
//! published snapshot alone until the next reload.

use std::{cmp::Ordering, sync::Arc, time::Duration};

use chrono::Utc;
use shared::{
    domain::{NewProduct, Product, ProductId},
    protocol::{CreateProductRequest, ListProductsQuery},
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    api::ProductApi,
    error::CatalogError,
    stream::{Feed, FeedReceiver, Publisher},
};

pub type ProductList = Arc<[Product]>;

const DEFAULT_LOAD_DELAY: Duration = Duration::from_millis(1500);
const DEFAULT_INSERT_DELAY: Duration = Duration::from_millis(1000);

/// Synthetic latency applied to successful responses before they are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub load_delay: Duration,
    pub insert_delay: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            load_delay: DEFAULT_LOAD_DELAY,
            insert_delay: DEFAULT_INSERT_DELAY,
        }
    }
}

impl ServiceSettings {
    pub fn immediate() -> Self {
        Self {
            load_delay: Duration::ZERO,
            insert_delay: Duration::ZERO,
        }
    }
}

pub struct ProductService {
    api: Arc<dyn ProductApi>,
    settings: ServiceSettings,
    query: ListProductsQuery,
    products: Publisher<ProductList>,
}

impl ProductService {
    /// Builds the service without loading anything.
    pub fn new(api: Arc<dyn ProductApi>, settings: ServiceSettings) -> Arc<Self> {
        Arc::new(Self {
            api,
            settings,
            query: ListProductsQuery::latest_first(),
            products: Publisher::new(),
        })
    }

    /// Builds the service and kicks off the initial load. Must be called
    /// inside a tokio runtime.
    pub fn start(api: Arc<dyn ProductApi>, settings: ServiceSettings) -> Arc<Self> {
        let service = Self::new(api, settings);
        service.spawn_reload();
        service
    }

    /// Fetches the list and replaces the published collection.
    ///
    /// A failure is published immediately and keeps the previous collection
    /// readable; the load delay only applies to successful responses.
    pub async fn load_products(&self) -> Result<ProductList, CatalogError> {
        let products = match self.api.list_products(&self.query).await {
            Ok(products) => products,
            Err(err) => {
                warn!(error = %err, "product list load failed");
                self.products.fail(err.clone());
                return Err(err);
            }
        };

        tokio::time::sleep(self.settings.load_delay).await;

        let products: ProductList = products.into();
        log_table(&products);
        self.products.publish(Arc::clone(&products));
        Ok(products)
    }

    pub async fn reset_list(&self) -> Result<ProductList, CatalogError> {
        self.load_products().await
    }

    /// Fire-and-forget reload. Overlapping reloads are not cancelled; the
    /// last one to finish wins.
    pub fn spawn_reload(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = service.load_products().await {
                warn!(error = %err, "background product reload failed");
            }
        })
    }

    pub fn products(&self) -> Feed<ProductList> {
        self.products.current()
    }

    pub fn subscribe_products(&self) -> FeedReceiver<ProductList> {
        self.products.subscribe()
    }

    pub fn subscribe_most_expensive(&self) -> FeedReceiver<ProductList, Option<Product>> {
        self.products
            .subscribe()
            .map(|products| most_expensive(products))
    }

    pub fn subscribe_count(&self) -> FeedReceiver<ProductList, usize> {
        self.products.subscribe().map(|products| products.len())
    }

    /// Stamps the draft with the current time and creates it remotely.
    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let request = CreateProductRequest::stamped(product, Utc::now());
        let created = self.api.create_product(&request).await?;
        tokio::time::sleep(self.settings.insert_delay).await;
        info!(product_id = created.id.0, name = %created.name, "product created");
        Ok(created)
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        self.api.delete_product(id).await?;
        info!(product_id = id.0, "product deleted");
        Ok(())
    }
}

/// Highest price wins; on equal prices the earlier element is kept.
pub fn most_expensive(products: &[Product]) -> Option<Product> {
    products
        .iter()
        .fold(None, |best: Option<&Product>, candidate| match best {
            Some(current) if candidate.price.total_cmp(&current.price) != Ordering::Greater => {
                Some(current)
            }
            _ => Some(candidate),
        })
        .cloned()
}

fn log_table(products: &[Product]) {
    info!(count = products.len(), "product list loaded");
    for product in products {
        debug!(
            product_id = product.id.0,
            name = %product.name,
            price = product.price,
            modified_date = %product.modified_date,
            "product"
        );
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
