//! Probe set construction from targets and the signature catalog

use std::collections::HashSet;
use std::sync::Arc;

use defcred_common::{Catalog, RunConfig, ScanTarget};
use tracing::debug;

use crate::probe::Probe;

/// One probe per (target, http entry, fingerprint url).
///
/// A target with an explicit port is only paired with entries whose default
/// port is that port. Every probe carries the whole catalog since one
/// response may match several entries. Duplicates are kept; see
/// [`dedup_probes`].
pub fn build_probes(
    targets: &[ScanTarget],
    catalog: Arc<Catalog>,
    config: Arc<RunConfig>,
) -> Vec<Probe> {
    let mut probes = Vec::new();

    for target in targets {
        for entry in catalog.iter().filter(|e| e.is_http()) {
            // only scan the port that was observed open
            if target.port.is_some_and(|port| port != entry.default_port) {
                continue;
            }

            let fp = &entry.fingerprint;
            for url in &fp.url {
                let probe = Probe {
                    target: target.host.clone(),
                    url: url.clone(),
                    port: entry.default_port,
                    ssl: entry.ssl,
                    headers: fp.headers.clone(),
                    cookies: fp.cookie.clone(),
                    config: Arc::clone(&config),
                    catalog: Arc::clone(&catalog),
                };
                debug!("Adding {} to fingerprint list", probe.full_url());
                probes.push(probe);
            }
        }
    }

    probes
}

/// Drop probes whose identity was already seen, keeping first occurrences in order.
pub fn dedup_probes(probes: Vec<Probe>) -> Vec<Probe> {
    let mut seen = HashSet::with_capacity(probes.len());
    probes
        .into_iter()
        .filter(|probe| seen.insert(probe.clone()))
        .collect()
}
