//! Hook validation and dispatch over the merged hook list.

use crate::hook::{
    domain::{
        Hook, HookAction, HookConfig, HookDispatchReport, HookEvent, HookExecutionError,
        HookExecutionResult, HookFailureMode, HookKind, HookPayload, HookSettings, HookValidation,
        HookValidationError, MergedHook, merge_hooks,
    },
    ports::{ExecutableLocator, HookExecutor},
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Validates and runs the hooks of one scope.
///
/// The global and project lists are merged once at construction; every
/// query afterwards filters that merged list.
pub struct HookOrchestrator<E, L>
where
    E: HookExecutor,
    L: ExecutableLocator,
{
    merged: Vec<MergedHook>,
    executor: Arc<E>,
    locator: Arc<L>,
    settings: HookSettings,
}

impl<E, L> HookOrchestrator<E, L>
where
    E: HookExecutor,
    L: ExecutableLocator,
{
    /// Creates an orchestrator over the merge of `global` and `project`.
    #[must_use]
    pub fn new(
        global: &[HookConfig],
        project: &[HookConfig],
        executor: Arc<E>,
        locator: Arc<L>,
    ) -> Self {
        Self {
            merged: merge_hooks(global, project),
            executor,
            locator,
            settings: HookSettings::default(),
        }
    }

    /// Overrides the dispatch settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: HookSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the dispatch settings.
    #[must_use]
    pub const fn settings(&self) -> HookSettings {
        self.settings
    }

    /// Returns the merged hook list.
    #[must_use]
    pub fn merged(&self) -> &[MergedHook] {
        &self.merged
    }

    /// Returns merged hooks subscribed to `event`, enabled or not.
    pub fn hooks_for_event(&self, event: HookEvent) -> impl Iterator<Item = &MergedHook> {
        self.merged
            .iter()
            .filter(move |hook| hook.config.listens_to(event))
    }

    /// Returns merged hooks of one kind.
    pub fn hooks_of_kind(&self, kind: HookKind) -> impl Iterator<Item = &MergedHook> {
        self.merged
            .iter()
            .filter(move |hook| hook.config.kind() == Some(kind))
    }

    /// Checks every merged hook.
    ///
    /// Never fails: each hook gets its own verdict, including duplicates
    /// and scripts whose program cannot be resolved.
    #[must_use]
    pub fn validate_all_hooks(&self) -> Vec<HookValidation> {
        let mut seen = HashSet::new();
        self.merged
            .iter()
            .map(|merged| {
                let mut errors = self.check(&merged.config).err().unwrap_or_default();
                if !seen.insert(merged.config.name.as_str()) {
                    errors.push(HookValidationError::DuplicateName(
                        merged.config.name.clone(),
                    ));
                }
                HookValidation {
                    hook: merged.config.clone(),
                    valid: errors.is_empty(),
                    errors,
                }
            })
            .collect()
    }

    /// Returns the hooks that would run for `event`, without running them.
    #[must_use]
    pub fn dry_run(&self, event: HookEvent) -> Vec<Hook> {
        self.hooks_for_event(event)
            .filter(|merged| merged.config.enabled)
            .filter_map(|merged| self.check(&merged.config).ok())
            .collect()
    }

    /// Runs the enabled hooks for the payload's event using the configured
    /// failure mode.
    pub async fn execute_hooks_for_event(&self, payload: &HookPayload) -> HookDispatchReport {
        self.execute_with_mode(payload, self.settings.failure_mode)
            .await
    }

    /// Runs the enabled hooks for the payload's event in merged order.
    ///
    /// Every executed hook leaves a result. In
    /// [`HookFailureMode::FailFast`] the first failure stops dispatch and
    /// the report is marked as aborted.
    pub async fn execute_with_mode(
        &self,
        payload: &HookPayload,
        mode: HookFailureMode,
    ) -> HookDispatchReport {
        let event = payload.event;
        let timeout = self.settings.timeout();
        let mut results = Vec::new();
        let mut aborted = false;

        for merged in self.hooks_for_event(event) {
            let name = merged.config.name.as_str();
            if !merged.config.enabled {
                debug!(hook = name, %event, "skipping disabled hook");
                continue;
            }
            let started = Instant::now();
            let outcome = match Hook::from_config(&merged.config) {
                Ok(hook) => self.executor.execute(&hook, payload, timeout).await,
                Err(errors) => Err(HookExecutionError::Invalid(join_errors(&errors))),
            };
            let result = HookExecutionResult::from_outcome(name, outcome, started.elapsed());
            let failed = !result.success;
            if let Some(err) = &result.error {
                warn!(hook = name, %event, error = %err, "hook failed");
            }
            results.push(result);
            if failed && mode == HookFailureMode::FailFast {
                aborted = true;
                break;
            }
        }

        info!(
            %event,
            executed = results.len(),
            failed = results.iter().filter(|result| !result.success).count(),
            aborted,
            "hooks dispatched"
        );
        HookDispatchReport {
            event,
            results,
            aborted,
        }
    }

    fn check(&self, config: &HookConfig) -> Result<Hook, Vec<HookValidationError>> {
        let hook = Hook::from_config(config)?;
        let missing = match hook.action() {
            HookAction::Script(script) if self.locator.locate(script.program()).is_none() => {
                Some(script.program().to_owned())
            }
            HookAction::Script(_) | HookAction::Webhook(_) => None,
        };
        if let Some(program) = missing {
            return Err(vec![HookValidationError::ExecutableNotFound(program)]);
        }
        Ok(hook)
    }
}

fn join_errors(errors: &[HookValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
