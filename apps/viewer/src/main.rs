use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use catalog_core::{
    config::load_settings, HttpProductApi, InMemoryFavourites, ProductApi, ProductListController,
    ProductService, TracingNavigator,
};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use shared::domain::{NewProduct, ProductId};
use tracing_subscriber::EnvFilter;

mod render;

use render::{render_list, render_row};

#[derive(Parser, Debug)]
#[command(about = "Browse the product catalog")]
struct Cli {
    /// API root, e.g. http://localhost:3000
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    page_size: Option<i64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long, default_value_t = 1)]
        page: i64,
        /// Keep printing the page on every change until Ctrl-C.
        #[arg(long)]
        follow: bool,
        #[arg(long, requires = "follow")]
        auto_refresh: bool,
        #[arg(long)]
        json: bool,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: i64,
    },
    Show {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(page_size) = cli.page_size {
        settings.page_size = page_size;
    }
    settings.validate().context("invalid catalog settings")?;

    let api: Arc<dyn ProductApi> = Arc::new(HttpProductApi::new(settings.api_url.clone()));

    match cli.command {
        Command::List {
            page,
            follow,
            auto_refresh,
            json,
        } => {
            if page < 1 {
                bail!("page must be at least 1, got {page}");
            }
            let service = ProductService::start(api, settings.service_settings());
            let controller = ProductListController::new(
                Arc::clone(&service),
                Arc::new(InMemoryFavourites::new()),
                Arc::new(TracingNavigator::new()),
                settings.list_settings(),
            );

            wait_for_load(&service).await?;
            for _ in 1..page {
                controller.next_page();
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&controller.visible_products())?);
            } else {
                print!("{}", render_list(&controller.view()));
            }

            if follow {
                if auto_refresh {
                    controller.toggle_auto_refresh();
                }
                follow_changes(&controller).await?;
            }
            controller.destroy();
        }
        Command::Add {
            name,
            price,
            description,
        } => {
            let service = ProductService::new(api, settings.service_settings());
            let mut product = NewProduct::new(name, price);
            product.description = description;
            let created = service.insert_product(product).await?;
            println!("created {}", render_row(&created));
        }
        Command::Delete { id } => {
            let service = ProductService::new(api, settings.service_settings());
            service.delete_product(ProductId(id)).await?;
            println!("deleted product_id={id}");
        }
        Command::Show { id } => {
            let service = ProductService::start(api, settings.service_settings());
            let navigator = Arc::new(TracingNavigator::new());
            let controller = ProductListController::new(
                Arc::clone(&service),
                Arc::new(InMemoryFavourites::new()),
                navigator.clone(),
                settings.list_settings(),
            );
            wait_for_load(&service).await?;
            let Some(product) = controller.select_by_id(ProductId(id)) else {
                controller.destroy();
                bail!("product {id} not found");
            };
            println!("{}", render_row(&product));
            if let Some(description) = &product.description {
                println!("{description}");
            }
            if let Some(url) = navigator.last_url() {
                println!("route: {url}");
            }
            controller.destroy();
        }
    }

    Ok(())
}

/// Waits for the first load to either land or fail.
async fn wait_for_load(service: &ProductService) -> Result<()> {
    let mut feed = Box::pin(service.subscribe_products().into_stream());
    while let Some(state) = feed.next().await {
        if !state.is_pending() {
            return Ok(());
        }
    }
    bail!("product feed closed before the first load")
}

async fn follow_changes(controller: &ProductListController) -> Result<()> {
    let mut watcher = controller.watch();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("stopping viewer");
                return Ok(());
            }
            changed = watcher.changed() => {
                changed.context("product feed closed")?;
                print!("{}", render_list(&controller.view()));
            }
        }
    }
}
