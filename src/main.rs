use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, bail};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use inkwell::application::services::{
    AssetCache, ImageUrlBuilder, Registration, register, unregister,
};
use inkwell::application::use_cases::OptimizeImageUseCase;
use inkwell::domain::entities::ImageOptions;
use inkwell::domain::ports::{CacheStoragePort, NetworkPort, ObjectStoragePort};
use inkwell::infrastructure::config::{CacheBackend, Command};
use inkwell::infrastructure::{
    AppConfig, CliArgs, DiskCacheStorage, HttpClient, ImageTranscoder, MemoryCacheStorage,
    StorageManager, SupabaseStorage, UnconfiguredStorage,
};
use inkwell::presentation::{AppState, EdgeProxy, router};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = StorageManager::new()?.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

fn object_storage(config: &AppConfig, http: &HttpClient) -> Result<Arc<dyn ObjectStoragePort>> {
    match (config.supabase_url()?, config.supabase.service_role_key.clone()) {
        (Some(url), Some(key)) => {
            info!(%url, "Object storage configured");
            Ok(Arc::new(SupabaseStorage::new(http.inner().clone(), url, key)))
        }
        _ => {
            warn!("Supabase storage not configured; storage sources will fail");
            Ok(Arc::new(UnconfiguredStorage))
        }
    }
}

async fn cache_storage(config: &AppConfig) -> Result<Arc<dyn CacheStoragePort>> {
    let storage: Arc<dyn CacheStoragePort> = match config.cache.backend {
        CacheBackend::Memory => Arc::new(MemoryCacheStorage::new(config.cache.memory_entries)),
        CacheBackend::Disk => match &config.cache.dir {
            Some(dir) => Arc::new(DiskCacheStorage::new(dir.clone(), config.cache.max_disk_size).await?),
            None => Arc::new(DiskCacheStorage::default_location(config.cache.max_disk_size).await?),
        },
    };
    Ok(storage)
}

async fn edge_proxy(config: &AppConfig, network: Arc<dyn NetworkPort>) -> Result<Option<EdgeProxy>> {
    let Some(origin) = config.origin_url()? else {
        return Ok(None);
    };
    let cache = AssetCache::new(
        config.cache.asset_cache_config(),
        origin.clone(),
        network.clone(),
        cache_storage(config).await?,
    );

    match register(&cache, config.environment, config.cache.enabled).await {
        Ok(Registration::Registered) => info!(%origin, "Asset cache active"),
        Ok(outcome) => info!(?outcome, "Asset cache not registered"),
        Err(e) => warn!(error = %e, "Asset cache install failed, will retry on later requests"),
    }

    Ok(Some(EdgeProxy {
        cache: Arc::new(cache),
        origin,
        network,
    }))
}

async fn serve(config: AppConfig, http: HttpClient) -> Result<()> {
    let network: Arc<dyn NetworkPort> = Arc::new(http.clone());
    let optimizer = OptimizeImageUseCase::new(
        network.clone(),
        object_storage(&config, &http)?,
        Arc::new(ImageTranscoder::new(config.images.avif_speed)),
    )
    .with_storage_prefix(config.supabase.storage_prefix.clone())
    .with_max_dimension(config.images.max_dimension);

    let mut state = AppState::new(optimizer);
    if let Some(edge) = edge_proxy(&config, network).await? {
        state = state.with_edge(edge);
    }

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn purge_cache(config: &AppConfig, http: HttpClient) -> Result<()> {
    if !config.cache.backend.is_persistent() {
        bail!(
            "purge-cache needs the disk backend; memory stores live only inside the running server \
             and are purged when it exits"
        );
    }
    let network: Arc<dyn NetworkPort> = Arc::new(http);
    let site = config.origin_url()?.map_or_else(|| config.site_url(), Ok)?;
    let cache = AssetCache::new(
        config.cache.asset_cache_config(),
        site,
        network,
        cache_storage(config).await?,
    );
    let removed = unregister(&cache).await?;
    println!("Removed {removed} cache store(s)");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    init_logging(&config)?;

    info!(
        version = inkwell::VERSION,
        environment = %config.environment,
        "Starting {}",
        inkwell::NAME
    );

    let http = HttpClient::new(Duration::from_secs(config.server.request_timeout_secs))?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, http).await,
        Command::PurgeCache => purge_cache(&config, http).await,
        Command::ImageUrl {
            src,
            width,
            height,
            quality,
            format,
        } => {
            let defaults = ImageOptions::default();
            let options = ImageOptions {
                width,
                height,
                quality: quality.unwrap_or(defaults.quality),
                format: format.unwrap_or(defaults.format),
            };
            let builder =
                ImageUrlBuilder::new(config.site.url.clone(), config.supabase.storage_prefix.clone());
            println!("{}", builder.build(&src, &options));
            Ok(())
        }
    }
}
