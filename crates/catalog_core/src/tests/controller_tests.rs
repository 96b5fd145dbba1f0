use super::*;
use crate::{
    collaborators::{InMemoryFavourites, TracingNavigator},
    error::{CatalogError, DisplayErrorCategory},
    service::ServiceSettings,
    test_support::{numbered_products, product, FakeProductApi},
};

struct Harness {
    api: Arc<FakeProductApi>,
    favourites: Arc<InMemoryFavourites>,
    navigator: Arc<TracingNavigator>,
    controller: ProductListController,
}

fn harness(products: Vec<Product>) -> Harness {
    let api = Arc::new(FakeProductApi::with_products(products));
    let service = ProductService::new(api.clone(), ServiceSettings::immediate());
    let favourites = Arc::new(InMemoryFavourites::new());
    let navigator = Arc::new(TracingNavigator::new());
    let controller = ProductListController::new(
        service,
        favourites.clone(),
        navigator.clone(),
        ListSettings::default(),
    );
    Harness {
        api,
        favourites,
        navigator,
        controller,
    }
}

async fn loaded(products: Vec<Product>) -> Harness {
    let harness = harness(products);
    harness.controller.reset().await.expect("reload task");
    harness
}

#[test]
fn page_window_shifts_by_page_size_without_clamping() {
    let window = PageWindow::first(5);
    assert_eq!(
        (window.start, window.end, window.current_page),
        (0, 5, 1)
    );

    let window = window.next();
    assert_eq!(
        (window.start, window.end, window.current_page),
        (5, 10, 2)
    );

    let window = window.previous().previous();
    assert_eq!(
        (window.start, window.end, window.current_page),
        (-5, 0, 0)
    );
}

#[test]
fn page_window_keeps_width_across_navigation() {
    let mut window = PageWindow::first(3);
    let moves = [true, true, false, false, false, true, false, true, true, true];
    for forward in moves {
        window = if forward {
            window.next()
        } else {
            window.previous()
        };
        assert_eq!(window.end - window.start, window.page_size);
    }
}

#[test]
fn page_window_slice_truncates_and_clamps() {
    let items: Vec<i32> = (0..12).collect();
    let last = PageWindow::first(5).next().next();
    assert_eq!(last.slice(&items[..]), &[10, 11]);
    assert!(last.has_previous());
    assert!(!last.has_next(items.len()));

    let before_first = PageWindow::first(5).previous();
    assert!(before_first.slice(&items[..]).is_empty());
    assert!(PageWindow::first(5).next().next().next().slice(&items[..]).is_empty());
}

#[tokio::test(start_paused = true)]
async fn count_is_zero_before_first_emission() {
    let harness = harness(numbered_products(3));
    assert_eq!(harness.controller.product_count(), 0);
    assert!(harness.controller.view().loading);
    assert_eq!(harness.controller.most_expensive(), None);
}

#[tokio::test(start_paused = true)]
async fn scenario_loads_count_and_most_expensive() {
    let harness = loaded(vec![
        product(1, "Pen", 10.0),
        product(2, "Desk", 30.0),
        product(3, "Lamp", 20.0),
    ])
    .await;

    assert_eq!(harness.controller.product_count(), 3);
    assert_eq!(
        harness.controller.most_expensive().map(|p| p.id),
        Some(ProductId(2))
    );

    let view = harness.controller.view();
    assert_eq!(view.title, "Products");
    assert_eq!(view.count, 3);
    assert_eq!(view.most_expensive.map(|p| p.price), Some(30.0));
    assert!(!view.loading);
}

#[tokio::test(start_paused = true)]
async fn count_follows_every_emission() {
    let harness = loaded(numbered_products(7)).await;
    assert_eq!(harness.controller.product_count(), 7);

    harness.api.replace_products(numbered_products(2)).await;
    harness.controller.load_more().await.expect("reload task");
    assert_eq!(harness.controller.product_count(), 2);
    assert_eq!(harness.api.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn pagination_scenario_and_visible_slice() {
    let harness = loaded(numbered_products(12)).await;
    let controller = &harness.controller;

    controller.next_page();
    let window = controller.window();
    assert_eq!((window.start, window.end, window.current_page), (5, 10, 2));
    let ids: Vec<i64> = controller.visible_products().iter().map(|p| p.id.0).collect();
    assert_eq!(ids, vec![6, 7, 8, 9, 10]);

    controller.previous_page();
    controller.previous_page();
    let window = controller.window();
    assert_eq!((window.start, window.end, window.current_page), (-5, 0, 0));
    assert!(controller.visible_products().is_empty());
}

#[tokio::test(start_paused = true)]
async fn page_navigation_clears_selection_but_reset_keeps_it() {
    let harness = loaded(numbered_products(8)).await;
    let controller = &harness.controller;
    let first = controller.visible_products()[0].clone();

    controller.on_select(&first);
    assert_eq!(controller.selected(), Some(first.clone()));
    assert_eq!(
        harness.navigator.last_url().as_deref(),
        Some(format!("/products/{}", first.id.0).as_str())
    );

    controller.next_page();
    assert_eq!(controller.selected(), None);

    controller.on_select(&first);
    controller.previous_page();
    assert_eq!(controller.selected(), None);

    controller.on_select(&first);
    controller.next_page();
    controller.on_select(&first);
    controller.reset().await.expect("reload task");
    assert_eq!(controller.selected(), Some(first));
    assert_eq!(controller.window(), PageWindow::first(DEFAULT_PAGE_SIZE));

    controller.toggle_auto_refresh();
    controller.load_more().await.expect("reload task");
    assert!(controller.selected().is_some());
}

#[tokio::test(start_paused = true)]
async fn select_by_id_navigates_to_detail_route() {
    let harness = loaded(numbered_products(3)).await;

    let selected = harness.controller.select_by_id(ProductId(2));

    assert_eq!(selected.map(|p| p.id), Some(ProductId(2)));
    assert_eq!(harness.navigator.last_url().as_deref(), Some("/products/2"));
    assert_eq!(harness.controller.select_by_id(ProductId(99)), None);
}

#[tokio::test(start_paused = true)]
async fn favourites_are_read_through_on_every_access() {
    let harness = harness(Vec::new());
    assert_eq!(harness.controller.favourites(), 0);

    harness.favourites.add(ProductId(1));
    harness.favourites.add(ProductId(2));
    assert_eq!(harness.controller.favourites(), 2);
    assert_eq!(harness.controller.view().favourites, 2);
}

#[tokio::test(start_paused = true)]
async fn toggle_flips_flag_without_reloading() {
    let harness = harness(numbered_products(2));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(harness.controller.toggle_auto_refresh());
    assert!(harness.controller.is_auto_refresh_enabled());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.api.list_calls(), 0);

    assert!(!harness.controller.toggle_auto_refresh());
    assert!(!harness.controller.is_auto_refresh_enabled());
}

#[tokio::test(start_paused = true)]
async fn auto_refresh_reloads_once_per_tick_only_while_enabled() {
    let harness = harness(numbered_products(12));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.api.list_calls(), 0);

    // Off across several ticks.
    tokio::time::sleep(Duration::from_millis(6000)).await;
    assert_eq!(harness.api.list_calls(), 0);

    // Ticks land at 8000, 10000 and 12000.
    harness.controller.toggle_auto_refresh();
    tokio::time::sleep(Duration::from_millis(6000)).await;
    assert_eq!(harness.api.list_calls(), 3);

    harness.controller.toggle_auto_refresh();
    tokio::time::sleep(Duration::from_millis(6000)).await;
    assert_eq!(harness.api.list_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn auto_refresh_tick_resets_pagination() {
    let harness = loaded(numbered_products(12)).await;
    harness.controller.next_page();
    harness.controller.next_page();
    tokio::time::sleep(Duration::from_millis(100)).await;

    harness.controller.toggle_auto_refresh();
    tokio::time::sleep(Duration::from_millis(2000)).await;

    assert_eq!(harness.controller.window(), PageWindow::first(5));
    assert_eq!(harness.api.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn destroy_stops_the_refresh_loop_for_good() {
    let harness = harness(numbered_products(2));
    tokio::time::sleep(Duration::from_millis(100)).await;
    harness.controller.toggle_auto_refresh();

    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert_eq!(harness.api.list_calls(), 1);

    harness.controller.destroy();
    assert!(harness.controller.is_destroyed());
    tokio::time::sleep(Duration::from_millis(10_000)).await;
    assert_eq!(harness.api.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_controller_stops_the_refresh_loop() {
    let Harness {
        api, controller, ..
    } = harness(numbered_products(2));
    controller.toggle_auto_refresh();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(api.list_calls(), 1);

    drop(controller);
    tokio::time::sleep(Duration::from_millis(10_000)).await;
    assert_eq!(api.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_reload_surfaces_error_and_next_tick_recovers() {
    let harness = loaded(numbered_products(4)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    harness
        .api
        .fail_next_list(CatalogError::Transport("connection refused".into()))
        .await;
    harness.controller.toggle_auto_refresh();

    // Tick at 2000 fails; the last collection stays on screen.
    tokio::time::sleep(Duration::from_millis(2000)).await;
    let error = harness.controller.error().expect("error state");
    assert_eq!(error.category(), DisplayErrorCategory::Transport);
    let view = harness.controller.view();
    assert!(view.error.is_some());
    assert!(!view.loading);
    assert_eq!(view.count, 4);
    assert_eq!(view.products.len(), 4);
    assert_eq!(harness.controller.product_count(), 4);

    // Tick at 4000 succeeds.
    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert_eq!(harness.controller.error(), None);
    assert_eq!(harness.controller.product_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn failed_load_more_keeps_the_page_being_viewed() {
    let harness = loaded(numbered_products(8)).await;
    let before = harness.controller.visible_products();
    assert_eq!(before.len(), 5);
    harness
        .api
        .fail_next_list(CatalogError::Transport("connection refused".into()))
        .await;

    harness.controller.load_more().await.expect("reload task");

    assert!(harness.controller.error().is_some());
    assert_eq!(harness.controller.product_count(), 8);
    assert_eq!(harness.controller.visible_products(), before);
    assert_eq!(
        harness.controller.most_expensive().map(|p| p.id),
        Some(ProductId(8))
    );
    let view = harness.controller.view();
    assert_eq!(view.count, 8);
    assert_eq!(view.most_expensive.map(|p| p.id), Some(ProductId(8)));
}

#[tokio::test(start_paused = true)]
async fn failed_first_load_shows_error_without_rows() {
    let harness = harness(numbered_products(3));
    harness
        .api
        .fail_next_list(CatalogError::server(500, "boom"))
        .await;

    harness.controller.load_more().await.expect("reload task");

    let view = harness.controller.view();
    assert!(!view.loading);
    assert_eq!(view.count, 0);
    assert!(view.products.is_empty());
    assert_eq!(
        view.error.map(|e| e.category()),
        Some(DisplayErrorCategory::Server)
    );
}

#[tokio::test(start_paused = true)]
async fn auto_refresh_tick_keeps_the_selection() {
    let harness = loaded(numbered_products(6)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    harness.controller.next_page();
    let chosen = harness.controller.select_by_id(ProductId(2)).expect("present");
    harness.controller.toggle_auto_refresh();

    tokio::time::sleep(Duration::from_millis(2000)).await;

    assert_eq!(harness.api.list_calls(), 2);
    assert_eq!(harness.controller.window().current_page, 1);
    assert_eq!(harness.controller.selected(), Some(chosen));
}

#[tokio::test(start_paused = true)]
async fn watcher_wakes_on_collection_and_page_changes() {
    let harness = harness(numbered_products(9));
    let mut watcher = harness.controller.watch();

    let reload = harness.controller.load_more();
    watcher.changed().await.expect("collection change");
    reload.await.expect("reload task");
    assert_eq!(harness.controller.view().count, 9);

    harness.controller.next_page();
    watcher.changed().await.expect("page change");
    let view = harness.controller.view();
    assert_eq!(view.window.current_page, 2);
    assert_eq!(view.products.len(), 4);
    assert!(view.has_previous());
    assert!(!view.has_next());
}
