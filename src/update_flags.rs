use std::env;

use crate::{desktop_state, runtime_paths, DISABLE_UPDATES_ENV};

/// Enablement of the update channel, derived once at startup and immutable
/// for the process lifetime. Updates ship only for packaged Windows builds
/// and can be switched off explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UpdateFlags {
    pub(crate) enabled: bool,
}

impl UpdateFlags {
    pub(crate) fn detect() -> Self {
        let env_opt_out = env::var(DISABLE_UPDATES_ENV)
            .map(|value| flag_enabled(&value))
            .unwrap_or(false);
        let cached_opt_out = desktop_state::read_cached_auto_update_enabled(
            runtime_paths::default_app_root_dir().as_deref(),
        ) == Some(false);
        Self::compute(
            !cfg!(debug_assertions),
            cfg!(target_os = "windows"),
            env_opt_out || cached_opt_out,
        )
    }

    pub(crate) fn compute(packaged: bool, update_channel_platform: bool, opt_out: bool) -> Self {
        Self {
            enabled: packaged && update_channel_platform && !opt_out,
        }
    }
}

/// Boolean environment switches accept the usual truthy spellings.
pub(crate) fn flag_enabled(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::{flag_enabled, UpdateFlags};

    #[test]
    fn updates_require_packaged_build_and_update_platform() {
        assert!(UpdateFlags::compute(true, true, false).enabled);
        assert!(!UpdateFlags::compute(false, true, false).enabled);
        assert!(!UpdateFlags::compute(true, false, false).enabled);
    }

    #[test]
    fn explicit_opt_out_wins_over_everything() {
        assert!(!UpdateFlags::compute(true, true, true).enabled);
    }

    #[test]
    fn flag_enabled_accepts_common_truthy_spellings() {
        assert!(flag_enabled("1"));
        assert!(flag_enabled(" TRUE "));
        assert!(flag_enabled("yes"));
        assert!(!flag_enabled("0"));
        assert!(!flag_enabled(""));
        assert!(!flag_enabled("off"));
    }
}
