//! Post-deployment verification — HTTP smoke checks against the public
//! frontend.
//!
//! Verification never fails the pipeline: the infrastructure is already
//! up, so an unhealthy endpoint is reported as a warning and left for
//! the operator to investigate.

use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{HttpProbe, ProgressReporter};

/// Attempts per endpoint before giving up.
const VERIFY_ATTEMPTS: u32 = 10;
/// Pause between attempts.
pub const VERIFY_SPACING: Duration = Duration::from_secs(3);

/// Checked paths, outermost tier first. The second path exercises the
/// whole chain: frontend proxy, backend API, database query.
const ENDPOINTS: [(&str, &str); 2] = [
    ("/petclinic/", "Frontend"),
    ("/petclinic/api/pettypes", "Full stack (frontend -> backend -> db)"),
];

/// Outcome of one endpoint check.
#[derive(Debug)]
pub struct EndpointCheck {
    pub url: String,
    pub label: &'static str,
    pub healthy: bool,
}

/// Public base URL for the frontend. The default HTTP port is left off
/// so reported URLs are pasteable as-is.
#[must_use]
pub fn base_url(ip: &str, port: u16) -> String {
    if port == 80 {
        format!("http://{ip}")
    } else {
        format!("http://{ip}:{port}")
    }
}

async fn check_endpoint(
    probe: &impl HttpProbe,
    reporter: &impl ProgressReporter,
    url: &str,
    spacing: Duration,
) -> bool {
    for attempt in 1..=VERIFY_ATTEMPTS {
        match probe.get_status(url).await {
            Ok(200) => return true,
            Ok(status) => {
                reporter.step(&format!("Attempt {attempt}/{VERIFY_ATTEMPTS}: HTTP {status}"));
            }
            Err(err) => {
                reporter.step(&format!("Attempt {attempt}/{VERIFY_ATTEMPTS}: {err:#}"));
            }
        }
        if attempt < VERIFY_ATTEMPTS {
            tokio::time::sleep(spacing).await;
        }
    }
    false
}

/// Check every endpoint and report per-endpoint health. Always succeeds;
/// unhealthy endpoints produce warnings.
pub async fn verify_deployment(
    probe: &impl HttpProbe,
    reporter: &impl ProgressReporter,
    base: &str,
    spacing: Duration,
) -> Vec<EndpointCheck> {
    reporter.header("Verifying deployment");

    let mut checks = Vec::with_capacity(ENDPOINTS.len());
    for (path, label) in ENDPOINTS {
        let url = format!("{base}{path}");
        reporter.step(&format!("Checking {label}: {url}"));
        let healthy = check_endpoint(probe, reporter, &url, spacing).await;
        if healthy {
            reporter.success(&format!("{label} is up."));
        } else {
            reporter.warn(&format!(
                "{label} did not respond after {VERIFY_ATTEMPTS} attempts: {url}"
            ));
        }
        checks.push(EndpointCheck {
            url,
            label,
            healthy,
        });
    }
    checks
}
