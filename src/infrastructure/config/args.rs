use super::app_config::LogLevel;
use crate::domain::entities::{Environment, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "inkwell",
    version,
    about = "Image optimization proxy and offline asset cache for the author site",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Build environment.
    #[arg(long, value_enum, env = "INKWELL_ENV", global = true)]
    pub environment: Option<Environment>,

    /// Listen address.
    #[arg(long, value_name = "ADDR", global = true)]
    pub bind: Option<String>,

    /// Origin to serve through the asset cache.
    #[arg(long, value_name = "URL", global = true)]
    pub origin: Option<String>,

    /// Public site base URL.
    #[arg(long, env = "NEXT_PUBLIC_SITE_URL", global = true)]
    pub site_url: Option<String>,

    /// Supabase project URL.
    #[arg(long, env = "NEXT_PUBLIC_SUPABASE_URL", global = true)]
    pub supabase_url: Option<String>,

    /// Supabase anon key.
    #[arg(long, env = "NEXT_PUBLIC_SUPABASE_ANON_KEY", hide_env_values = true, global = true)]
    pub supabase_anon_key: Option<String>,

    /// Supabase service-role key used for storage downloads.
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true, global = true)]
    pub supabase_service_role_key: Option<String>,

    /// Stripe publishable key.
    #[arg(long, env = "NEXT_PUBLIC_STRIPE_PUBLISHABLE_KEY", hide_env_values = true, global = true)]
    pub stripe_publishable_key: Option<String>,

    /// Enable the asset cache.
    #[arg(long, global = true)]
    pub cache_enabled: Option<bool>,

    /// Disk cache directory.
    #[arg(long, value_name = "PATH", global = true)]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Delete every asset cache store.
    PurgeCache,
    /// Print the optimized URL for an image source.
    ImageUrl {
        /// Image source: site path, absolute URL or storage path.
        src: String,

        /// Target width.
        #[arg(long)]
        width: Option<u32>,

        /// Target height.
        #[arg(long)]
        height: Option<u32>,

        /// Encoder quality, 1-100.
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,

        /// Output format (webp, avif, png, jpeg).
        #[arg(long)]
        format: Option<OutputFormat>,
    },
}
