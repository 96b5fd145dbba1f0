//! Collaborators the list controller is handed at construction.

use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard, PoisonError},
};

use shared::domain::ProductId;
use tracing::info;

pub trait FavouriteCounter: Send + Sync {
    fn favourites_count(&self) -> usize;
}

/// Routes the presentation layer to another view.
pub trait Navigator: Send + Sync {
    fn navigate_by_url(&self, url: &str);
}

pub fn product_detail_url(id: ProductId) -> String {
    format!("/products/{}", id.0)
}

#[derive(Default)]
pub struct InMemoryFavourites {
    ids: Mutex<BTreeSet<ProductId>>,
}

impl InMemoryFavourites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the product was already a favourite.
    pub fn add(&self, id: ProductId) -> bool {
        self.lock().insert(id)
    }

    pub fn remove(&self, id: ProductId) -> bool {
        self.lock().remove(&id)
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.lock().contains(&id)
    }

    pub fn ids(&self) -> Vec<ProductId> {
        self.lock().iter().copied().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<ProductId>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FavouriteCounter for InMemoryFavourites {
    fn favourites_count(&self) -> usize {
        self.lock().len()
    }
}

/// Navigator without a view layer: logs the route and remembers it.
#[derive(Default)]
pub struct TracingNavigator {
    last_url: Mutex<Option<String>>,
}

impl TracingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_url(&self) -> Option<String> {
        self.last_url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for TracingNavigator {
    fn navigate_by_url(&self, url: &str) {
        info!(%url, "navigate");
        *self.last_url.lock().unwrap_or_else(PoisonError::into_inner) = Some(url.to_string());
    }
}
