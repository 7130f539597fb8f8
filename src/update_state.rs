use crate::update_feed::FeedEvent;

/// Version and download progress attached to the active update, replaced
/// wholesale on every transition.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UpdateInfo {
    pub(crate) version: String,
    pub(crate) downloaded_fraction: f64,
}

impl UpdateInfo {
    fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            downloaded_fraction: 0.0,
        }
    }

    fn completed(version: &str) -> Self {
        Self {
            version: version.to_string(),
            downloaded_fraction: 1.0,
        }
    }
}

/// State of the single update cycle. `Idle` is re-entered after every
/// completed cycle; only the periodic tick starts a new one.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum UpdateState {
    #[default]
    Idle,
    Checking,
    Available(UpdateInfo),
    Downloading(UpdateInfo),
    Downloaded(UpdateInfo),
}

impl UpdateState {
    pub(crate) fn is_idle(&self) -> bool {
        matches!(self, UpdateState::Idle)
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            UpdateState::Idle => "idle",
            UpdateState::Checking => "checking",
            UpdateState::Available(_) => "available",
            UpdateState::Downloading(_) => "downloading",
            UpdateState::Downloaded(_) => "downloaded",
        }
    }

    pub(crate) fn info(&self) -> Option<&UpdateInfo> {
        match self {
            UpdateState::Idle | UpdateState::Checking => None,
            UpdateState::Available(info)
            | UpdateState::Downloading(info)
            | UpdateState::Downloaded(info) => Some(info),
        }
    }

    /// Applies one feed event. Any error returns to `Idle`; event and state
    /// combinations outside the cycle contract leave the state unchanged.
    pub(crate) fn apply(&self, event: &FeedEvent) -> UpdateState {
        match (self, event) {
            (_, FeedEvent::Error { .. }) => UpdateState::Idle,
            (UpdateState::Idle, FeedEvent::Checking) => UpdateState::Checking,
            (UpdateState::Checking, FeedEvent::UpToDate) => UpdateState::Idle,
            (UpdateState::Checking, FeedEvent::UpdateAvailable { version }) => {
                UpdateState::Available(UpdateInfo::new(version))
            }
            (UpdateState::Available(info), FeedEvent::DownloadProgress { fraction }) => {
                UpdateState::Downloading(UpdateInfo {
                    version: info.version.clone(),
                    downloaded_fraction: fraction.clamp(0.0, 1.0),
                })
            }
            (UpdateState::Downloading(info), FeedEvent::DownloadProgress { fraction }) => {
                // progress is monotone; a regressing fraction is ignored
                UpdateState::Downloading(UpdateInfo {
                    version: info.version.clone(),
                    downloaded_fraction: fraction
                        .clamp(0.0, 1.0)
                        .max(info.downloaded_fraction),
                })
            }
            (
                UpdateState::Available(_) | UpdateState::Downloading(_),
                FeedEvent::Downloaded { version },
            ) => UpdateState::Downloaded(UpdateInfo::completed(version)),
            _ => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{UpdateInfo, UpdateState};
    use crate::update_feed::FeedEvent;

    fn progress(fraction: f64) -> FeedEvent {
        FeedEvent::DownloadProgress { fraction }
    }

    #[test]
    fn full_cycle_walks_idle_to_downloaded() {
        let state = UpdateState::Idle
            .apply(&FeedEvent::Checking)
            .apply(&FeedEvent::UpdateAvailable {
                version: "2.0.0".to_string(),
            })
            .apply(&progress(0.4))
            .apply(&progress(0.9))
            .apply(&FeedEvent::Downloaded {
                version: "2.0.0".to_string(),
            });

        assert_eq!(
            state,
            UpdateState::Downloaded(UpdateInfo {
                version: "2.0.0".to_string(),
                downloaded_fraction: 1.0,
            })
        );
    }

    #[test]
    fn up_to_date_returns_to_idle() {
        let state = UpdateState::Idle
            .apply(&FeedEvent::Checking)
            .apply(&FeedEvent::UpToDate);
        assert!(state.is_idle());
    }

    #[test]
    fn download_fraction_never_regresses() {
        let state = UpdateState::Downloading(UpdateInfo {
            version: "2.0.0".to_string(),
            downloaded_fraction: 0.8,
        })
        .apply(&progress(0.3));

        assert_eq!(
            state.info().map(|info| info.downloaded_fraction),
            Some(0.8)
        );
        assert_eq!(state.label(), "downloading");
    }

    #[test]
    fn available_can_jump_straight_to_downloaded() {
        let state = UpdateState::Available(UpdateInfo {
            version: "2.0.0".to_string(),
            downloaded_fraction: 0.0,
        })
        .apply(&FeedEvent::Downloaded {
            version: "2.0.0".to_string(),
        });

        assert_eq!(state.label(), "downloaded");
        assert_eq!(state.info().map(|info| info.version.as_str()), Some("2.0.0"));
    }

    #[test]
    fn any_error_returns_to_idle() {
        for state in [
            UpdateState::Checking,
            UpdateState::Available(UpdateInfo::new("2.0.0")),
            UpdateState::Downloading(UpdateInfo::new("2.0.0")),
        ] {
            let next = state.apply(&FeedEvent::Error {
                message: "network unreachable".to_string(),
            });
            assert!(next.is_idle(), "{} should reset to idle", state.label());
        }
    }

    #[test]
    fn out_of_contract_events_leave_state_unchanged() {
        let checking = UpdateState::Checking.apply(&FeedEvent::Checking);
        assert_eq!(checking, UpdateState::Checking);

        let idle = UpdateState::Idle.apply(&FeedEvent::Downloaded {
            version: "2.0.0".to_string(),
        });
        assert!(idle.is_idle());
    }
}
