// runner.rs
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use defcred_catalog::load_catalog;
use defcred_common::{MissingTokenPolicy, RunConfig, ScanTarget};
use defcred_fingerprint::build_probes;
use defcred_orchestrator::{Orchestrator, ProbeJob};
use defcred_target_resolver::TargetResolver;
use crate::output::print_results;

pub struct ScanArgs {
    pub targets: Option<String>,
    pub target_file: Option<PathBuf>,
    pub catalog: PathBuf,
    pub name: Option<String>,
    pub category: Option<String>,
    pub timeout: u64,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
    pub concurrency: usize,
    pub skip_entry_on_missing_token: bool,
    pub output_format: String,
}

pub async fn run_scan(args: ScanArgs) -> Result<()> {
    info!("Starting scan...");
    info!("Catalog: {}", args.catalog.display());
    info!("Concurrency: {}", args.concurrency);

    let config = Arc::new(build_config(&args)?);

    let catalog = load_catalog(&args.catalog)
        .with_context(|| format!("Failed to load catalog from {}", args.catalog.display()))?
        .filter(args.name.as_deref(), args.category.as_deref());
    if catalog.is_empty() {
        return Err(anyhow!("No credential signatures left after filtering"));
    }
    info!("Using {} signature(s)", catalog.len());

    let targets = collect_targets(&args)?;
    info!("Found {} target(s)", targets.len());

    let probes = build_probes(&targets, Arc::new(catalog), config);
    let job = ProbeJob::new(probes);
    info!("Fingerprint probes: {}", job.probe_count());
    if job.probe_count() == 0 {
        warn!("No probes to run: no http signature uses the given target ports");
    }

    let orchestrator = Orchestrator::new(args.concurrency);
    orchestrator.submit_job(job).await?;

    let scan_start = Instant::now();
    orchestrator.run().await?;
    let scan_duration = scan_start.elapsed();

    let results = orchestrator.get_results().await;
    print_results(&results, &args.output_format, scan_duration)?;
    Ok(())
}

fn build_config(args: &ScanArgs) -> Result<RunConfig> {
    if args.timeout == 0 {
        return Err(anyhow!("Timeout must be at least one second"));
    }

    let mut config = RunConfig::default().with_timeout(Duration::from_secs(args.timeout));
    if let Some(proxy) = &args.proxy {
        reqwest::Proxy::all(proxy).with_context(|| format!("Invalid proxy: {}", proxy))?;
        config = config.with_proxy(proxy.clone());
    }
    if let Some(user_agent) = &args.user_agent {
        config = config.with_user_agent(user_agent.clone());
    }
    if args.skip_entry_on_missing_token {
        config = config.with_missing_token(MissingTokenPolicy::SkipEntry);
    }
    Ok(config)
}

fn collect_targets(args: &ScanArgs) -> Result<Vec<ScanTarget>> {
    let mut targets = Vec::new();
    if let Some(list) = &args.targets {
        targets.extend(TargetResolver::resolve_targets(list)?);
    }
    if let Some(path) = &args.target_file {
        for t in TargetResolver::resolve_target_file(path)? {
            if !targets.contains(&t) {
                targets.push(t);
            }
        }
    }
    if targets.is_empty() {
        return Err(anyhow!("No targets specified"));
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ScanArgs {
        ScanArgs {
            targets: Some("10.0.0.1,10.0.0.2:8080".into()),
            target_file: None,
            catalog: PathBuf::from("./creds"),
            name: None,
            category: None,
            timeout: 10,
            proxy: None,
            user_agent: None,
            concurrency: 10,
            skip_entry_on_missing_token: false,
            output_format: "table".into(),
        }
    }

    #[test]
    fn test_build_config_defaults() {
        let config = build_config(&args()).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.missing_token, MissingTokenPolicy::AbortProbe);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_build_config_flags() {
        let mut a = args();
        a.proxy = Some("socks5://127.0.0.1:9050".into());
        a.skip_entry_on_missing_token = true;
        let config = build_config(&a).unwrap();
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:9050"));
        assert_eq!(config.missing_token, MissingTokenPolicy::SkipEntry);
    }

    #[test]
    fn test_build_config_rejects_zero_timeout() {
        let mut a = args();
        a.timeout = 0;
        assert!(build_config(&a).is_err());
    }

    #[test]
    fn test_collect_targets() {
        let targets = collect_targets(&args()).unwrap();
        assert_eq!(
            targets,
            vec![ScanTarget::new("10.0.0.1"), ScanTarget::new("10.0.0.2").with_port(8080)]
        );
    }

    #[test]
    fn test_collect_targets_missing_file() {
        let mut a = args();
        a.targets = None;
        a.target_file = Some(PathBuf::from("/nonexistent/targets.txt"));
        assert!(collect_targets(&a).is_err());
    }
}
