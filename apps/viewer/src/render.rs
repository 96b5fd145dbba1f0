use catalog_core::ListView;
use shared::domain::Product;

pub fn render_list(view: &ListView) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} (page {}, {} total, favourites {}, auto-refresh {})\n",
        view.title,
        view.window.current_page,
        view.count,
        view.favourites,
        if view.auto_refresh { "on" } else { "off" },
    ));

    if let Some(error) = &view.error {
        let hint = if !error.is_retryable() {
            ""
        } else if view.auto_refresh {
            " (will retry)"
        } else {
            " (enable auto-refresh to retry)"
        };
        out.push_str(&format!("error: {}{hint}\n", error.message()));
        if view.count == 0 {
            return out;
        }
    }
    if view.loading {
        out.push_str("loading...\n");
        return out;
    }

    for product in &view.products {
        let marker = match &view.selected {
            Some(selected) if selected.id == product.id => '>',
            _ => ' ',
        };
        out.push_str(&format!("{marker} {}\n", render_row(product)));
    }
    if view.products.is_empty() {
        out.push_str("  (no products on this page)\n");
    }

    if let Some(product) = &view.most_expensive {
        out.push_str(&format!(
            "most expensive: {} ({})\n",
            product.name.to_uppercase(),
            format_price(product.price)
        ));
    }
    out
}

pub fn render_row(product: &Product) -> String {
    format!(
        "#{:<5} {:<30} {:>12}  {}",
        product.id.0,
        product.name,
        format_price(product.price),
        product.modified_date.format("%Y-%m-%d %H:%M")
    )
}

pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}
