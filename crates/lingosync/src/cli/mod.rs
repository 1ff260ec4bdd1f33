//! CLI definition and command handling

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use console::style;
use tracing::warn;

use lingosync_connect::AppStoreConnect;
use lingosync_engine::{CancelFlag, Reconciler, RunOptions, Tracks};
use lingosync_translate::{default_catalog, OpenAiTranslator};

/// Environment variable holding the translation provider credential.
const PROVIDER_KEY_VAR: &str = "OPENAI_API_KEY";

/// lingosync - translates and syncs App Store metadata across locales
#[derive(Debug, Parser)]
#[command(name = "lingosync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// App Store Connect API key ID
    #[arg(long = "api_key_id")]
    pub api_key_id: String,

    /// App Store Connect issuer ID
    #[arg(long = "issuer_id")]
    pub issuer_id: String,

    /// Path to the private key (.p8) file
    #[arg(long = "auth_key_path")]
    pub auth_key_path: PathBuf,

    /// App Store Connect app ID
    #[arg(long = "app_id")]
    pub app_id: String,

    /// Locale whose content is the source of truth
    #[arg(long = "source_locale", default_value = "en-US")]
    pub source_locale: String,

    /// Translation model identifier
    #[arg(long = "translation_model", default_value = "gpt-4o")]
    pub translation_model: String,

    /// Only sync app name and subtitle
    #[arg(long = "only_app_info", conflicts_with = "only_app_store")]
    pub only_app_info: bool,

    /// Only sync App Store version content (description, keywords, URLs)
    #[arg(long = "only_app_store")]
    pub only_app_store: bool,

    /// List the target locales before processing
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Execute the CLI
    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run())
    }

    async fn run(self) -> anyhow::Result<()> {
        // Preconditions come first; nothing touches the network until every
        // credential is in hand.
        let provider_key = std::env::var(PROVIDER_KEY_VAR)
            .with_context(|| format!("{PROVIDER_KEY_VAR} must be set"))?;
        let private_key = std::fs::read_to_string(&self.auth_key_path)
            .with_context(|| format!("failed to read key file {}", self.auth_key_path.display()))?;

        let catalog = default_catalog();

        if !self.quiet {
            println!(
                "{} app {} from {} into {} locales",
                style("Syncing").cyan().bold(),
                style(&self.app_id).bold(),
                &self.source_locale,
                catalog.len()
            );
            if self.verbose {
                let codes: Vec<_> = catalog.iter().map(|locale| locale.code).collect();
                println!("  Locales: {}", style(codes.join(", ")).dim());
            }
        }

        let store = AppStoreConnect::new(
            self.api_key_id.as_str(),
            self.issuer_id.as_str(),
            &private_key,
        )?;
        let translator = OpenAiTranslator::new(
            provider_key,
            self.translation_model.as_str(),
            &self.source_locale,
            catalog.clone(),
        );

        let mut options = RunOptions::new(self.app_id.as_str());
        options.source_locale = self.source_locale.clone();
        options.tracks = Tracks {
            app_info: !self.only_app_store,
            version_content: !self.only_app_info,
        };

        let cancel = CancelFlag::new();
        let watcher = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping after the current step");
                watcher.cancel();
            }
        });

        let reconciler = Reconciler::new(store, translator, catalog, options);
        let summary = reconciler.run(&cancel).await?;

        if !self.quiet {
            println!();
            if summary.interrupted {
                println!("{} {summary}", style("Interrupted:").yellow().bold());
            } else {
                println!("{} {summary}", style("Done:").green().bold());
            }
        }

        Ok(())
    }
}
