//! Merging global and project hook lists by name.

use super::HookConfig;
use serde::Serialize;
use std::collections::HashMap;

/// Where a merged hook came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookOrigin {
    /// Global list, untouched by the project.
    Global,
    /// Project list, no global hook of the same name.
    Project,
    /// Project hook replacing the global hook of the same name.
    Override,
}

/// One entry of the merged hook list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedHook {
    /// Effective definition.
    pub config: HookConfig,
    /// Provenance.
    pub origin: HookOrigin,
}

/// Merges `global` with `project`.
///
/// The result starts as `global`. A project hook whose name exactly matches
/// a global hook replaces it in place, so an `enabled: false` override keeps
/// the hook listed but inert. Other project hooks are appended in order.
///
/// # Examples
///
/// ```
/// use gantry::hook::domain::{HookConfig, HookOrigin, merge_hooks};
///
/// let global = [HookConfig::webhook("notify", "task.completed", "https://a.example/h")];
/// let project = [HookConfig::webhook("notify", "task.completed", "https://a.example/h").disabled()];
///
/// let merged = merge_hooks(&global, &project);
/// assert_eq!(merged.len(), 1);
/// assert!(!merged[0].config.enabled);
/// assert_eq!(merged[0].origin, HookOrigin::Override);
/// ```
#[must_use]
pub fn merge_hooks(global: &[HookConfig], project: &[HookConfig]) -> Vec<MergedHook> {
    let mut merged: Vec<MergedHook> = global
        .iter()
        .map(|config| MergedHook {
            config: config.clone(),
            origin: HookOrigin::Global,
        })
        .collect();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (position, config) in global.iter().enumerate() {
        positions.entry(config.name.as_str()).or_insert(position);
    }

    for config in project {
        let replaced = positions
            .get(config.name.as_str())
            .and_then(|position| merged.get_mut(*position));
        if let Some(slot) = replaced {
            *slot = MergedHook {
                config: config.clone(),
                origin: HookOrigin::Override,
            };
        } else {
            merged.push(MergedHook {
                config: config.clone(),
                origin: HookOrigin::Project,
            });
        }
    }
    merged
}
