use std::{
    env,
    time::{Duration, Instant},
};

use crate::{
    startup_error::StartupFailure, DEFAULT_PROBE_RETRY_INTERVAL_MS, DEFAULT_PROBE_TIMEOUT_MS,
    PROBE_RETRY_INTERVAL_ENV, PROBE_RETRY_INTERVAL_MAX_MS, PROBE_RETRY_INTERVAL_MIN_MS,
    PROBE_TIMEOUT_ENV, PROBE_TIMEOUT_MAX_MS, PROBE_TIMEOUT_MIN_MS,
};

#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolveTiming {
    pub(crate) per_candidate_timeout: Duration,
    pub(crate) retry_interval: Duration,
}

impl ResolveTiming {
    pub(crate) fn from_environment() -> Self {
        Self {
            per_candidate_timeout: duration_from_env(
                PROBE_TIMEOUT_ENV,
                DEFAULT_PROBE_TIMEOUT_MS,
                PROBE_TIMEOUT_MIN_MS,
                PROBE_TIMEOUT_MAX_MS,
            ),
            retry_interval: duration_from_env(
                PROBE_RETRY_INTERVAL_ENV,
                DEFAULT_PROBE_RETRY_INTERVAL_MS,
                PROBE_RETRY_INTERVAL_MIN_MS,
                PROBE_RETRY_INTERVAL_MAX_MS,
            ),
        }
    }
}

fn duration_from_env(env_key: &str, default_ms: u64, min_ms: u64, max_ms: u64) -> Duration {
    let parsed_ms = env::var(env_key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(parsed_ms.clamp(min_ms, max_ms))
}

/// Resolves the first reachable candidate, strictly in list order.
///
/// Each candidate is retried at a fixed interval until its own deadline
/// elapses; only then does resolution move to the next candidate. The first
/// reachable candidate wins and nothing after it is probed. When every
/// candidate exhausts its deadline the full attempted list is returned for
/// diagnostics.
pub(crate) fn resolve_backend_endpoint<P, S, L>(
    candidates: &[String],
    timing: ResolveTiming,
    probe: P,
    sleep: S,
    log: L,
) -> Result<String, StartupFailure>
where
    P: Fn(&str) -> bool,
    S: Fn(Duration),
    L: Fn(&str),
{
    for candidate in candidates {
        log(&format!("probing backend candidate {candidate}"));
        let started = Instant::now();
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            if probe(candidate) {
                log(&format!(
                    "backend candidate {candidate} answered after {attempts} attempt(s)"
                ));
                return Ok(candidate.clone());
            }
            if started.elapsed() >= timing.per_candidate_timeout {
                break;
            }
            sleep(timing.retry_interval);
        }
        log(&format!(
            "backend candidate {candidate} exhausted its {}ms deadline after {attempts} attempt(s)",
            timing.per_candidate_timeout.as_millis()
        ));
    }

    Err(StartupFailure::UnreachableBackend {
        tried: candidates.to_vec(),
    })
}
