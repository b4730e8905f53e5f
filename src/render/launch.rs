//! Browser acquisition
//!
//! An ordered strategy list with no intra-tier retries: the operator-pinned
//! executable, then PATH discovery over known Chromium binary names, then
//! `headless_chrome`'s self-supplied browser (fetched and cached on first
//! use when nothing is installed). Each tier failure is
//! logged with the attempted path and carried into the final error so an
//! exhausted chain tells the whole story.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions};

use crate::config::BrowserConfig;

use super::RenderError;

/// Baseline flags every launch gets.
const BASE_CHROMIUM_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-first-run",
    "--no-zygote",
    "--disable-accelerated-2d-canvas",
];

/// Extra flags for discovered system binaries, which may run in stripped
/// container environments.
const SERVERLESS_ARGS: &[&str] = &[
    "--single-process",
    "--disable-extensions",
    "--disable-background-timer-throttling",
];

/// Chromium binary names probed on PATH, in preference order.
const DISCOVERY_NAMES: &[&str] = &["chromium", "chromium-browser", "google-chrome", "chrome"];

/// How long an idle browser may linger before `headless_chrome` kills it.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaunchTier {
    Pinned,
    Discovered,
    Bundled,
}

impl LaunchTier {
    /// Strategy order: pinned path, PATH discovery, fetched fallback.
    fn chain() -> [LaunchTier; 3] {
        [
            LaunchTier::Pinned,
            LaunchTier::Discovered,
            LaunchTier::Bundled,
        ]
    }

    fn label(self) -> &'static str {
        match self {
            LaunchTier::Pinned => "pinned executable",
            LaunchTier::Discovered => "discovered executable",
            LaunchTier::Bundled => "bundled resolution",
        }
    }
}

/// Merge flag lists preserving first-seen order, dropping exact duplicates.
/// Comparison is on the full flag string including any `=value` suffix.
pub(super) fn merge_args(lists: &[&[&str]], extra: &[String]) -> Vec<OsString> {
    let mut seen: Vec<&str> = Vec::new();
    let mut out: Vec<OsString> = Vec::new();
    for arg in lists
        .iter()
        .flat_map(|list| list.iter().copied())
        .chain(extra.iter().map(String::as_str))
    {
        if !seen.contains(&arg) {
            seen.push(arg);
            out.push(OsString::from(arg));
        }
    }
    out
}

fn discover_executable() -> Option<PathBuf> {
    DISCOVERY_NAMES
        .iter()
        .find_map(|name| which::which(name).ok())
}

fn launch(
    path: Option<PathBuf>,
    args: &[OsString],
    viewport: super::Viewport,
) -> Result<Browser, RenderError> {
    let scale_flag = format!("--force-device-scale-factor={}", viewport.scale_factor);
    let mut all_args: Vec<&OsStr> = args.iter().map(OsString::as_os_str).collect();
    let scale_os = OsString::from(scale_flag);
    all_args.push(scale_os.as_os_str());

    let options = LaunchOptions::default_builder()
        .path(path)
        .headless(true)
        .sandbox(false)
        .window_size(Some((viewport.width, viewport.height)))
        .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
        .args(all_args)
        .build()
        .map_err(|e| RenderError::Launch(e.to_string()))?;
    Browser::new(options).map_err(|e| RenderError::Launch(e.to_string()))
}

/// Acquire a browser through the full tier chain.
pub(super) fn acquire(
    config: &BrowserConfig,
    viewport: super::Viewport,
    caller_args: &[String],
) -> Result<Browser, RenderError> {
    acquire_from(&LaunchTier::chain(), config, viewport, caller_args)
}

/// Walk an explicit strategy list in order; every tier failure is captured
/// and attached to the final error on exhaustion.
fn acquire_from(
    tiers: &[LaunchTier],
    config: &BrowserConfig,
    viewport: super::Viewport,
    caller_args: &[String],
) -> Result<Browser, RenderError> {
    let mut failures: Vec<String> = Vec::new();

    for &tier in tiers {
        let attempt = match tier {
            LaunchTier::Pinned => {
                let path = config.executable_path.clone();
                if !path.exists() {
                    failures.push(format!("{}: {} does not exist", tier.label(), path.display()));
                    continue;
                }
                let args = merge_args(&[BASE_CHROMIUM_ARGS], caller_args);
                tracing::debug!(path = %path.display(), "launching pinned browser");
                launch(Some(path), &args, viewport)
            }
            LaunchTier::Discovered => {
                let Some(path) = discover_executable() else {
                    failures.push(format!("{}: no known binary on PATH", tier.label()));
                    continue;
                };
                let args = merge_args(&[BASE_CHROMIUM_ARGS, SERVERLESS_ARGS], caller_args);
                tracing::debug!(path = %path.display(), "launching discovered browser");
                launch(Some(path), &args, viewport)
            }
            LaunchTier::Bundled => {
                // No path: headless_chrome resolves or fetches its own
                // browser. Baseline flags only.
                let args = merge_args(&[BASE_CHROMIUM_ARGS], &[]);
                tracing::debug!("launching via bundled browser resolution");
                launch(None, &args, viewport)
            }
        };
        match attempt {
            Ok(browser) => return Ok(browser),
            Err(e) => {
                tracing::warn!(tier = tier.label(), error = %e, "browser launch tier failed");
                failures.push(format!("{}: {}", tier.label(), e));
            }
        }
    }

    Err(exhaustion(failures))
}

fn exhaustion(failures: Vec<String>) -> RenderError {
    RenderError::Launch(format!(
        "all launch strategies failed: [{}]",
        failures.join("; ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_preserves_first_seen_order() {
        let merged = merge_args(&[&["--a", "--b"], &["--c"]], &[]);
        assert_eq!(merged, vec!["--a", "--b", "--c"]);
    }

    #[test]
    fn merge_drops_exact_duplicates() {
        let caller = vec!["--b".to_string(), "--d".to_string()];
        let merged = merge_args(&[&["--a", "--b"], &["--a", "--c"]], &caller);
        assert_eq!(merged, vec!["--a", "--b", "--c", "--d"]);
    }

    #[test]
    fn flags_with_values_are_distinct_from_bare_flags() {
        let caller = vec!["--window-size=100,100".to_string()];
        let merged = merge_args(&[&["--window-size=200,200"]], &caller);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn baseline_includes_sandbox_and_shm_flags() {
        assert!(BASE_CHROMIUM_ARGS.contains(&"--no-sandbox"));
        assert!(BASE_CHROMIUM_ARGS.contains(&"--disable-dev-shm-usage"));
        // Serverless extras are exclusive to the discovery tier.
        for flag in SERVERLESS_ARGS {
            assert!(!BASE_CHROMIUM_ARGS.contains(flag));
        }
    }

    #[test]
    fn chain_orders_pinned_discovered_bundled() {
        assert_eq!(
            LaunchTier::chain(),
            [
                LaunchTier::Pinned,
                LaunchTier::Discovered,
                LaunchTier::Bundled,
            ]
        );
    }

    #[test]
    fn exhaustion_message_preserves_tier_order() {
        let err = exhaustion(vec![
            "pinned executable: gone".to_string(),
            "discovered executable: empty PATH".to_string(),
            "bundled resolution: fetch failed".to_string(),
        ]);
        let msg = err.to_string();
        let pinned = msg.find("pinned executable").unwrap();
        let discovered = msg.find("discovered executable").unwrap();
        let bundled = msg.find("bundled resolution").unwrap();
        assert!(pinned < discovered);
        assert!(discovered < bundled);
    }

    // Tests below mutate PATH; serialize them.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn acquire_aggregates_tier_failures_in_order() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let empty_path = tempfile::tempdir().unwrap();
        std::env::set_var("PATH", empty_path.path());

        let config = BrowserConfig {
            executable_path: "/nonexistent/chromium-binary".into(),
        };
        let err = acquire_from(
            &[LaunchTier::Pinned, LaunchTier::Discovered],
            &config,
            super::super::Viewport::BOOK,
            &[],
        )
        .err()
        .unwrap();

        let msg = err.to_string();
        assert!(msg.contains("/nonexistent/chromium-binary"));
        let pinned = msg.find("pinned executable").unwrap();
        let discovered = msg.find("discovered executable").unwrap();
        assert!(pinned < discovered);
    }

    #[test]
    #[ignore = "fetches a browser on first run"]
    fn bundled_tier_rescues_exhausted_earlier_tiers() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let empty_path = tempfile::tempdir().unwrap();
        std::env::set_var("PATH", empty_path.path());

        let config = BrowserConfig {
            executable_path: "/nonexistent/chromium-binary".into(),
        };
        let browser = acquire(&config, super::super::Viewport::BOOK, &[]).unwrap();
        assert!(browser.new_tab().is_ok());
    }
}
