//! Reactive product catalog client.
//!
//! [`ProductService`] owns the product collection fetched from the catalog
//! API and publishes it as a replay-latest feed. [`ProductListController`]
//! derives the count, the most expensive product and a paginated window from
//! that feed, and runs the toggleable auto-refresh loop.

pub mod api;
pub mod collaborators;
pub mod config;
pub mod controller;
pub mod error;
pub mod service;
pub mod stream;

pub use api::{HttpProductApi, ProductApi};
pub use collaborators::{FavouriteCounter, InMemoryFavourites, Navigator, TracingNavigator};
pub use controller::{ListSettings, ListView, PageWindow, ProductListController, ViewWatcher};
pub use error::{CatalogError, DisplayError, DisplayErrorCategory};
pub use service::{most_expensive, ProductList, ProductService, ServiceSettings};
pub use stream::{Feed, FeedClosed, FeedReceiver, Publisher};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
