//! Presentation-facing orchestration over the product service: pagination,
//! selection, and the auto-refresh loop.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::domain::{Product, ProductId};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::debug;

use crate::{
    collaborators::{product_detail_url, FavouriteCounter, Navigator},
    error::DisplayError,
    service::{most_expensive, ProductList, ProductService},
    stream::{Feed, FeedClosed, FeedReceiver},
};

pub const LIST_TITLE: &str = "Products";
pub const DEFAULT_PAGE_SIZE: i64 = 5;
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSettings {
    pub page_size: i64,
    pub refresh_interval: Duration,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// Index range `[start, end)` of the collection currently displayed.
///
/// `end - start == page_size` always holds. Moving back from the first page
/// is not clamped, so bounds and page number can go below their initial
/// values; `slice` clamps to the collection when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page_size: i64,
    pub start: i64,
    pub end: i64,
    pub current_page: i64,
}

impl PageWindow {
    pub fn first(page_size: i64) -> Self {
        Self {
            page_size,
            start: 0,
            end: page_size,
            current_page: 1,
        }
    }

    pub fn next(self) -> Self {
        Self {
            start: self.start + self.page_size,
            end: self.end + self.page_size,
            current_page: self.current_page + 1,
            ..self
        }
    }

    pub fn previous(self) -> Self {
        Self {
            start: self.start - self.page_size,
            end: self.end - self.page_size,
            current_page: self.current_page - 1,
            ..self
        }
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let len = items.len() as i64;
        let start = self.start.clamp(0, len) as usize;
        let end = self.end.clamp(0, len) as usize;
        &items[start..end.max(start)]
    }

    pub fn has_previous(&self) -> bool {
        self.start > 0
    }

    pub fn has_next(&self, len: usize) -> bool {
        self.end < len as i64
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ListState {
    window: PageWindow,
    selected: Option<Product>,
}

/// Everything the list view renders, taken from one collection snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    pub title: &'static str,
    pub window: PageWindow,
    pub products: Vec<Product>,
    pub count: usize,
    pub most_expensive: Option<Product>,
    pub selected: Option<Product>,
    pub auto_refresh: bool,
    pub favourites: usize,
    pub loading: bool,
    pub error: Option<DisplayError>,
}

impl ListView {
    pub fn has_previous(&self) -> bool {
        self.window.has_previous()
    }

    pub fn has_next(&self) -> bool {
        self.window.has_next(self.count)
    }
}

/// Wakes when the collection or the pagination/selection state changes.
pub struct ViewWatcher {
    products: FeedReceiver<ProductList>,
    state: watch::Receiver<ListState>,
}

impl ViewWatcher {
    pub async fn changed(&mut self) -> Result<(), FeedClosed> {
        tokio::select! {
            changed = self.products.changed() => changed.map(|_| ()),
            changed = self.state.changed() => changed.map_err(|_| FeedClosed),
        }
    }
}

pub struct ProductListController {
    service: Arc<ProductService>,
    favourites: Arc<dyn FavouriteCounter>,
    navigator: Arc<dyn Navigator>,
    products: FeedReceiver<ProductList>,
    most_expensive: FeedReceiver<ProductList, Option<Product>>,
    count: FeedReceiver<ProductList, usize>,
    state: Arc<watch::Sender<ListState>>,
    auto_refresh: Arc<AtomicBool>,
    destroyed: AtomicBool,
    refresh_task: JoinHandle<()>,
}

impl ProductListController {
    /// Subscribes to the service and starts the auto-refresh loop. Must be
    /// called inside a tokio runtime.
    pub fn new(
        service: Arc<ProductService>,
        favourites: Arc<dyn FavouriteCounter>,
        navigator: Arc<dyn Navigator>,
        settings: ListSettings,
    ) -> Self {
        let settings = ListSettings {
            page_size: settings.page_size.max(1),
            refresh_interval: settings.refresh_interval.max(Duration::from_millis(1)),
        };
        let (state, _) = watch::channel(ListState {
            window: PageWindow::first(settings.page_size),
            selected: None,
        });
        let state = Arc::new(state);
        let auto_refresh = Arc::new(AtomicBool::new(false));
        let refresh_task = spawn_auto_refresh(
            Arc::clone(&service),
            Arc::clone(&state),
            Arc::clone(&auto_refresh),
            settings.refresh_interval,
        );

        Self {
            products: service.subscribe_products(),
            most_expensive: service.subscribe_most_expensive(),
            count: service.subscribe_count(),
            service,
            favourites,
            navigator,
            state,
            auto_refresh,
            destroyed: AtomicBool::new(false),
            refresh_task,
        }
    }

    pub fn products(&self) -> Feed<ProductList> {
        self.products.current()
    }

    pub fn most_expensive(&self) -> Option<Product> {
        self.most_expensive.current().into_latest().flatten()
    }

    /// Length of the latest collection; 0 until the first one arrives. A
    /// failed reload leaves it unchanged.
    pub fn product_count(&self) -> usize {
        self.count.current().into_latest().unwrap_or(0)
    }

    pub fn visible_products(&self) -> Vec<Product> {
        let window = self.window();
        self.products
            .with_snapshot(|feed| feed.latest().map(|products| window.slice(&products[..]).to_vec()))
            .unwrap_or_default()
    }

    pub fn window(&self) -> PageWindow {
        self.state.borrow().window
    }

    pub fn selected(&self) -> Option<Product> {
        self.state.borrow().selected.clone()
    }

    pub fn is_auto_refresh_enabled(&self) -> bool {
        self.auto_refresh.load(Ordering::SeqCst)
    }

    pub fn favourites(&self) -> usize {
        self.favourites.favourites_count()
    }

    /// A failed load, mapped for display. The last collection stays visible
    /// alongside it and the next successful reload clears it.
    pub fn error(&self) -> Option<DisplayError> {
        self.products
            .with_snapshot(|feed| feed.error().map(DisplayError::from_catalog_error))
    }

    pub fn view(&self) -> ListView {
        let (window, selected) = {
            let state = self.state.borrow();
            (state.window, state.selected.clone())
        };
        let (products, count, priciest, loading, error) = self.products.with_snapshot(|feed| {
            let (products, count, priciest) = feed
                .latest()
                .map(|products| {
                    (
                        window.slice(&products[..]).to_vec(),
                        products.len(),
                        most_expensive(products),
                    )
                })
                .unwrap_or_default();
            let error = feed.error().map(DisplayError::from_catalog_error);
            (products, count, priciest, feed.is_pending(), error)
        });

        ListView {
            title: LIST_TITLE,
            window,
            products,
            count,
            most_expensive: priciest,
            selected,
            auto_refresh: self.is_auto_refresh_enabled(),
            favourites: self.favourites(),
            loading,
            error,
        }
    }

    pub fn watch(&self) -> ViewWatcher {
        ViewWatcher {
            products: self.products.clone(),
            state: self.state.subscribe(),
        }
    }

    /// Takes effect at the next tick; no reload happens here.
    pub fn toggle_auto_refresh(&self) -> bool {
        let enabled = !self.auto_refresh.fetch_xor(true, Ordering::SeqCst);
        debug!(enabled, "auto-refresh toggled");
        enabled
    }

    pub fn previous_page(&self) {
        self.state.send_modify(|state| {
            state.window = state.window.previous();
            state.selected = None;
        });
    }

    pub fn next_page(&self) {
        self.state.send_modify(|state| {
            state.window = state.window.next();
            state.selected = None;
        });
    }

    /// Full reload of the collection; there is no incremental fetch.
    pub fn load_more(&self) -> JoinHandle<()> {
        self.service.spawn_reload()
    }

    /// Reloads and returns to the first page. The selection is kept.
    pub fn reset(&self) -> JoinHandle<()> {
        reset_list(&self.service, &self.state)
    }

    pub fn on_select(&self, product: &Product) {
        self.state
            .send_modify(|state| state.selected = Some(product.clone()));
        self.navigator
            .navigate_by_url(&product_detail_url(product.id));
    }

    /// Selects a product of the latest collection by id.
    pub fn select_by_id(&self, id: ProductId) -> Option<Product> {
        let product = self.products.with_snapshot(|feed| {
            feed.latest()
                .and_then(|products| products.iter().find(|p| p.id == id).cloned())
        })?;
        self.on_select(&product);
        Some(product)
    }

    /// Stops the auto-refresh loop for good.
    pub fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::SeqCst) {
            debug!("list controller destroyed");
        }
        self.refresh_task.abort();
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl Drop for ProductListController {
    fn drop(&mut self) {
        self.refresh_task.abort();
    }
}

fn reset_list(service: &Arc<ProductService>, state: &watch::Sender<ListState>) -> JoinHandle<()> {
    let reload = service.spawn_reload();
    state.send_modify(|state| state.window = PageWindow::first(state.window.page_size));
    reload
}

fn spawn_auto_refresh(
    service: Arc<ProductService>,
    state: Arc<watch::Sender<ListState>>,
    enabled: Arc<AtomicBool>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticks.tick().await;
            if !enabled.load(Ordering::SeqCst) {
                continue;
            }
            debug!("auto-refresh tick");
            reset_list(&service, &state);
        }
    })
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
