use dotenvy::dotenv;
use std::env;
use std::path::Path;
use std::sync::Arc;
use stone_quote::config::database::{create_connection, create_tables};
use stone_quote::config::language::{load_language, save_language};
use stone_quote::config::{AppConfig, app::load_default_config};
use stone_quote::core::cache::CatalogCache;
use stone_quote::core::catalog::Catalog;
use stone_quote::core::fetcher::RemoteCatalog;
use stone_quote::core::price_list::build_price_list;
use stone_quote::core::pricing::QUOTE_CURRENCY;
use stone_quote::core::quotation::QuotationState;
use stone_quote::core::request::load_request;
use stone_quote::core::sync::{CatalogCallback, CatalogService};
use stone_quote::errors::Result;
use stone_quote::export::{OutputMode, PdfRenderer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: stone-quote <quotation.toml> | price-list | watch";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Configuration and local storage are the only fatal steps
    let config = load_default_config()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to open database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
    let language = load_language(&db).await?;

    // 4. Catalog service over the cache
    let cache = CatalogCache::with_ttls(db.clone(), config.catalog.fresh_ttl(), config.catalog.stale_ttl());
    let remote = RemoteCatalog::from_config(&config.catalog, cache)
        .inspect_err(|e| error!("Catalog API is not configured: {}", e))?;
    let callback: CatalogCallback = Arc::new(|catalog: &Catalog| {
        info!(
            "Catalog updated: {} products, {} colors",
            catalog.products.len(),
            catalog.colors.len()
        );
    });
    let service = CatalogService::new(remote, config.catalog.poll_interval(), callback);

    let command = env::args().nth(1);
    match command.as_deref() {
        Some("watch") => {
            service.start().await;
            info!("Polling the catalog every {:?}, Ctrl-C to stop", config.catalog.poll_interval());
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {}", e);
            }
            service.stop().await;
        }
        Some("price-list") => {
            let catalog = load_catalog(&service).await;
            let renderer = PdfRenderer::from_config(&config)?;
            let sections = build_price_list(&catalog, &config.catalog.default_currency);
            match renderer
                .render_price_list(&sections, QUOTE_CURRENCY, chrono::Local::now(), language, &download(&config))
                .await
            {
                Ok(pdf) => info!("Price list ready: {}", pdf.file_name),
                Err(e) => error!("Price list export failed: {}", e),
            }
        }
        Some(path) => {
            let catalog = load_catalog(&service).await;
            let renderer = PdfRenderer::from_config(&config)?;
            if let Err(e) = quote(&db, &catalog, &renderer, &config, language, Path::new(path)).await {
                error!("Quotation failed: {}", e);
            }
        }
        None => println!("{USAGE}"),
    }

    Ok(())
}

async fn load_catalog<S>(service: &CatalogService<S>) -> Catalog
where
    S: stone_quote::core::fetcher::SheetSource + 'static,
{
    match service.load().await {
        Ok(catalog) => {
            info!("Catalog state: {:?}", service.state().await);
            catalog
        }
        Err(e) => {
            error!("Catalog could not be loaded, continuing with an empty catalog: {}", e);
            Catalog::default()
        }
    }
}

async fn quote(
    db: &sea_orm::DatabaseConnection,
    catalog: &Catalog,
    renderer: &PdfRenderer,
    config: &AppConfig,
    language: stone_quote::config::Language,
    path: &Path,
) -> Result<()> {
    let request = load_request(path)?;
    let initial = QuotationState::new(language, &config.catalog.default_currency);
    let state = request.build(&initial, catalog)?;
    if state.language != language {
        save_language(db, state.language).await?;
    }

    let snapshot = state.snapshot(catalog);
    let pdf = renderer.render(&snapshot, &download(config), state.language).await?;
    info!(
        "Quotation {} ready: {} (grand total {:.2})",
        snapshot.id, pdf.file_name, snapshot.summary.grand_total
    );
    Ok(())
}

fn download(config: &AppConfig) -> OutputMode {
    OutputMode::Download {
        dir: config.pdf.output_dir.clone(),
    }
}
