//! Lifecycle hooks tying the locator, patcher, freshener and publisher
//! together.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::config::PluginConfig;
use crate::freshen::freshen;
use crate::patch::{patch_usage_plan_keys, resolve_rest_api, resolve_root_resource};
use crate::publish::{PublishReport, publish};
use crate::services::{GatewayApi, ParameterStore};
use crate::template::Template;

pub const PLUGIN_NAME: &str = "EasyUsagePlanKey";

/// Points in the host's lifecycle where the plugin runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Hook {
    /// After the compiled template has been merged with custom resources.
    AfterPackageFinalize,
    /// Before the service information is printed, i.e. after deploying.
    BeforeInfoDisplay,
}

impl Hook {
    /// The Serverless lifecycle event this hook is registered under.
    pub fn lifecycle_event(self) -> &'static str {
        match self {
            Hook::AfterPackageFinalize => "after:aws:package:finalize:mergeCustomProviderResources",
            Hook::BeforeInfoDisplay => "before:aws:info:displayServiceInfo",
        }
    }

    pub fn from_lifecycle_event(event: &str) -> Option<Self> {
        [Hook::AfterPackageFinalize, Hook::BeforeInfoDisplay]
            .into_iter()
            .find(|hook| hook.lifecycle_event() == event)
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.lifecycle_event())
    }
}

/// What a [`Plugin::run_hook`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Patched(PatchOutcome),
    Published(PublishReport),
}

/// What [`Plugin::after_package_finalize`] changed in the template.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub keys_patched: usize,
    pub rest_api_id: Option<String>,
    pub root_resource_id: Option<String>,
    pub deployments: BTreeMap<String, String>,
}

pub struct Plugin {
    config: PluginConfig,
    api: Box<dyn GatewayApi>,
    store: Box<dyn ParameterStore>,
}

impl Plugin {
    pub fn new(
        config: PluginConfig,
        api: impl GatewayApi + 'static,
        store: impl ParameterStore + 'static,
    ) -> Self {
        Self {
            config,
            api: Box::new(api),
            store: Box::new(store),
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Runs `hook`. The template is only touched by
    /// [`Hook::AfterPackageFinalize`].
    #[tracing::instrument(name = "EasyUsagePlanKey", skip_all, fields(hook = %hook))]
    pub async fn run_hook(&self, hook: Hook, template: &mut Template) -> Result<HookOutcome> {
        let outcome = match hook {
            Hook::AfterPackageFinalize => {
                let epoch_millis = Utc::now().timestamp_millis();
                HookOutcome::Patched(self.after_package_finalize(template, epoch_millis).await?)
            }
            Hook::BeforeInfoDisplay => HookOutcome::Published(self.before_info_display().await),
        };
        Ok(outcome)
    }

    /// Resolves names into ids, then freshens deployments with
    /// `epoch_millis`. Provider errors other than "not found" abort.
    pub async fn after_package_finalize(
        &self,
        template: &mut Template,
        epoch_millis: i64,
    ) -> Result<PatchOutcome> {
        if template.resources().is_none() {
            bail!("compiled template has no Resources section");
        }

        let mut outcome = self.resolve_and_patch(template).await?;
        if self.config.fresh_deployments {
            outcome.deployments = freshen(template, epoch_millis);
        }
        Ok(outcome)
    }

    /// Patches usage plan keys, then the REST API and root resource
    /// placeholders when a REST API name is configured.
    pub async fn resolve_and_patch(&self, template: &mut Template) -> Result<PatchOutcome> {
        let mut outcome = PatchOutcome {
            keys_patched: patch_usage_plan_keys(template, self.api.as_ref()).await?,
            ..PatchOutcome::default()
        };

        let Some(rest_api_name) = self.config.rest_api_name.as_deref() else {
            return Ok(outcome);
        };
        outcome.rest_api_id = resolve_rest_api(template, self.api.as_ref(), rest_api_name).await?;

        if let Some(rest_api_id) = outcome.rest_api_id.as_deref() {
            outcome.root_resource_id = resolve_root_resource(
                template,
                self.api.as_ref(),
                rest_api_id,
                self.config.root_resource_path(),
            )
            .await?;
        }

        Ok(outcome)
    }

    /// Publishes configured secrets. Failures are logged, never returned.
    pub async fn before_info_display(&self) -> PublishReport {
        if self.config.secrets.is_empty() {
            return PublishReport::default();
        }
        info!(secrets = self.config.secrets.len(), "Publishing API key values");
        let report = publish(self.api.as_ref(), self.store.as_ref(), &self.config.secrets).await;
        if !report.failed.is_empty() {
            warn!(failed = ?report.failed, "Some API key values were not published");
        }
        report
    }
}
