//! CLI entry point for EasyUsagePlanKey.
//!
//! Runs the plugin's lifecycle hooks against a compiled CloudFormation
//! template on disk: resolving API key, REST API and root resource names into
//! ids, freshening deployment logical IDs, and publishing API key values to
//! Parameter Store.

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use chrono::Utc;
use clap::{Parser, Subcommand};
use easy_usage_plan_key::freshen::freshen;
use easy_usage_plan_key::infra::{ApiGatewayClient, SsmParameterStore};
use easy_usage_plan_key::{Hook, PLUGIN_NAME, Plugin, PluginConfig, Template};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{Instrument, info, info_span};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "easy_usage_plan_key")]
#[command(
    about = "Resolve API Gateway names into ids inside a compiled CloudFormation template",
    long_about = None
)]
struct Cli {
    /// AWS region (defaults to the usual AWS environment/profile resolution)
    #[arg(long, global = true)]
    region: Option<String>,

    /// AWS shared config profile to use
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one lifecycle hook the way the host framework would
    Hook {
        /// Lifecycle point to run
        #[arg(value_enum)]
        hook: Hook,

        /// Compiled template JSON (only read by after-package-finalize)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Plugin config JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where to write the patched template (defaults to in place)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Resolve names and patch the template, without freshening deployments
    Patch {
        #[arg(short, long)]
        template: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Suffix deployment logical IDs with a timestamp
    Freshen {
        #[arg(short, long)]
        template: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Suffix to use instead of the current time in epoch millis
        #[arg(long)]
        timestamp: Option<i64>,
    },
    /// Copy configured API key values into Parameter Store
    Publish {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/easy_usage_plan_key.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("easy_usage_plan_key.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Hook {
            hook,
            template,
            config,
            output,
        } => {
            let plugin = build_plugin(config.as_deref(), cli.region, cli.profile).await?;
            match hook {
                Hook::AfterPackageFinalize => {
                    let template = template
                        .context("--template is required for after-package-finalize")?;
                    let mut compiled = Template::load(&template)?;
                    plugin.run_hook(hook, &mut compiled).await?;
                    compiled.save(output.as_ref().unwrap_or(&template))?;
                }
                Hook::BeforeInfoDisplay => {
                    plugin
                        .before_info_display()
                        .instrument(info_span!("EasyUsagePlanKey", hook = %hook))
                        .await;
                }
            }
        }
        Commands::Patch {
            template,
            config,
            output,
        } => {
            let plugin = build_plugin(config.as_deref(), cli.region, cli.profile).await?;
            let mut compiled = Template::load(&template)?;
            let outcome = plugin
                .resolve_and_patch(&mut compiled)
                .instrument(info_span!("EasyUsagePlanKey"))
                .await?;
            info!(
                keys_patched = outcome.keys_patched,
                rest_api_id = outcome.rest_api_id.as_deref(),
                root_resource_id = outcome.root_resource_id.as_deref(),
                "Template patched"
            );
            compiled.save(output.as_ref().unwrap_or(&template))?;
        }
        Commands::Freshen {
            template,
            output,
            timestamp,
        } => {
            let mut compiled = Template::load(&template)?;
            let epoch_millis = timestamp.unwrap_or_else(|| Utc::now().timestamp_millis());
            let _span = info_span!("EasyUsagePlanKey").entered();
            freshen(&mut compiled, epoch_millis);
            compiled.save(output.as_ref().unwrap_or(&template))?;
        }
        Commands::Publish { config } => {
            let plugin = build_plugin(Some(config.as_path()), cli.region, cli.profile).await?;
            plugin
                .before_info_display()
                .instrument(info_span!("EasyUsagePlanKey"))
                .await;
        }
    }

    Ok(())
}

/// Loads the plugin config (or defaults) and wires the AWS-backed clients.
async fn build_plugin(
    config_path: Option<&Path>,
    region: Option<String>,
    profile: Option<String>,
) -> Result<Plugin> {
    let config = match config_path {
        Some(path) => PluginConfig::load(path)?,
        None => PluginConfig::default(),
    };

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region));
    }
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    let sdk_config = loader.load().await;
    let region = sdk_config
        .region()
        .map(|r| r.to_string())
        .context("no AWS region configured; pass --region or set AWS_REGION")?;
    info!(plugin = PLUGIN_NAME, %region, "AWS configuration loaded");

    Ok(Plugin::new(
        config,
        ApiGatewayClient::new(&sdk_config),
        SsmParameterStore::new(&sdk_config),
    ))
}
