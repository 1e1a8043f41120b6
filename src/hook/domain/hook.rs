//! Validated, executable hooks.

use super::{HookConfig, HookEvent, HookKind, HookValidationError};
use reqwest::Url;

/// A script hook: a shell command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptHook {
    command: String,
}

impl ScriptHook {
    /// Returns the full command line passed to `sh -c`.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the program the command line starts with.
    #[must_use]
    pub fn program(&self) -> &str {
        self.command.split_whitespace().next().unwrap_or_default()
    }
}

/// A webhook: an absolute http(s) endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookHook {
    url: Url,
}

impl WebhookHook {
    /// Returns the endpoint.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

/// What running a hook does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Spawn a shell command.
    Script(ScriptHook),
    /// POST the payload.
    Webhook(WebhookHook),
}

impl HookAction {
    /// Returns the kind of action.
    #[must_use]
    pub const fn kind(&self) -> HookKind {
        match self {
            Self::Script(_) => HookKind::Script,
            Self::Webhook(_) => HookKind::Webhook,
        }
    }
}

/// A structurally valid hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    name: String,
    event: HookEvent,
    enabled: bool,
    action: HookAction,
}

impl Hook {
    /// Checks a configured hook and builds its executable form.
    ///
    /// Environment-dependent checks such as executable lookup are left to
    /// the caller.
    ///
    /// # Errors
    ///
    /// Returns every structural problem found.
    pub fn from_config(config: &HookConfig) -> Result<Self, Vec<HookValidationError>> {
        let mut errors = Vec::new();
        let name = config.name.trim();
        if name.is_empty() {
            errors.push(HookValidationError::EmptyName);
        }
        let event = HookEvent::try_from(config.event.as_str())
            .inspect_err(|_| errors.push(HookValidationError::UnknownEvent(config.event.clone())))
            .ok();
        let target = config.target.trim();
        if target.is_empty() {
            errors.push(HookValidationError::EmptyTarget);
        }
        let action = match config.kind() {
            None => {
                errors.push(HookValidationError::UnknownKind(config.kind.clone()));
                None
            }
            Some(_) if target.is_empty() => None,
            Some(HookKind::Script) => Some(HookAction::Script(ScriptHook {
                command: target.to_owned(),
            })),
            Some(HookKind::Webhook) => match parse_webhook_url(target) {
                Ok(url) => Some(HookAction::Webhook(WebhookHook { url })),
                Err(err) => {
                    errors.push(err);
                    None
                }
            },
        };

        match (event, action) {
            (Some(parsed_event), Some(parsed_action)) if errors.is_empty() => Ok(Self {
                name: name.to_owned(),
                event: parsed_event,
                enabled: config.enabled,
                action: parsed_action,
            }),
            _ => Err(errors),
        }
    }

    /// Returns the hook name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the subscribed event.
    #[must_use]
    pub const fn event(&self) -> HookEvent {
        self.event
    }

    /// Returns `true` unless the hook was disabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the action to run.
    #[must_use]
    pub const fn action(&self) -> &HookAction {
        &self.action
    }
}

fn parse_webhook_url(target: &str) -> Result<Url, HookValidationError> {
    let invalid = |reason: String| HookValidationError::InvalidUrl {
        url: target.to_owned(),
        reason,
    };
    let url = Url::parse(target).map_err(|err| invalid(err.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        "http" | "https" => Err(invalid("missing host".to_owned())),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn script_hook_exposes_program() {
        let hook = Hook::from_config(&HookConfig::script(
            "lint",
            "task.review",
            "  ./scripts/lint.sh --fast ",
        ))
        .expect("valid hook");

        let HookAction::Script(script) = hook.action() else {
            panic!("expected script action");
        };
        assert_eq!(script.command(), "./scripts/lint.sh --fast");
        assert_eq!(script.program(), "./scripts/lint.sh");
        assert_eq!(hook.event(), HookEvent::TaskReview);
    }

    #[rstest]
    fn every_problem_is_reported() {
        let config = HookConfig::new(" ", "task.finished", "email", "");
        let errors = Hook::from_config(&config).expect_err("invalid hook");
        assert_eq!(
            errors,
            vec![
                HookValidationError::EmptyName,
                HookValidationError::UnknownEvent("task.finished".to_owned()),
                HookValidationError::EmptyTarget,
                HookValidationError::UnknownKind("email".to_owned()),
            ]
        );
    }

    #[rstest]
    #[case("not a url")]
    #[case("ftp://files.example.com/drop")]
    #[case("/relative/path")]
    fn malformed_webhook_targets_are_rejected(#[case] target: &str) {
        let config = HookConfig::webhook("notify", "task.completed", target);
        let errors = Hook::from_config(&config).expect_err("invalid hook");
        assert!(matches!(
            errors.as_slice(),
            [HookValidationError::InvalidUrl { .. }]
        ));
    }

    #[rstest]
    fn disabled_flag_survives_validation() {
        let config =
            HookConfig::webhook("notify", "task.completed", "https://example.com/hook").disabled();
        let hook = Hook::from_config(&config).expect("valid hook");
        assert!(!hook.enabled());
        assert_eq!(hook.action().kind(), HookKind::Webhook);
    }
}
