//! Target Resolver - CIDR and range expansion
//!
//! Turns a comma-separated target string (or a file with one token per line)
//! into a deduplicated list of scan targets. Supported token forms:
//! - single address: "1.2.3.4" or "::1"
//! - address or host with an observed open port: "1.2.3.4:8080", "[::1]:443"
//! - CIDR: "192.168.1.0/24"
//! - range: "192.168.1.1-192.168.1.10"
//! - hostname: "example.com"
//!
//! Hostnames are kept as-is; the HTTP client resolves them per request so the
//! right `Host` header is sent.

use anyhow::{Context, Result};
use defcred_common::ScanTarget;
use ipnet::Ipv4Net;
use std::collections::HashSet;
use std::fs;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::path::Path;

const MAX_HOSTS: u128 = 4096;
const ALLOW_LARGE_CIDR_ENV: &str = "DEFCRED_ALLOW_LARGE_CIDR";

pub struct TargetResolver;

impl TargetResolver {
    pub fn new() -> Self { Self }

    /// Resolve a comma-separated target string into unique scan targets.
    pub fn resolve_targets(targets: &str) -> Result<Vec<ScanTarget>> {
        Self::resolve_tokens(targets.split(','))
    }

    /// Resolve a file with one token per line. Blank lines and `#` comments are skipped.
    pub fn resolve_target_file(path: &Path) -> Result<Vec<ScanTarget>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read target file {}", path.display()))?;
        Self::resolve_tokens(content.lines().filter(|l| !l.trim_start().starts_with('#')))
    }

    fn resolve_tokens<'a, I>(tokens: I) -> Result<Vec<ScanTarget>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut resolved: Vec<ScanTarget> = Vec::new();
        let mut seen: HashSet<ScanTarget> = HashSet::new();
        let mut push = |t: ScanTarget| {
            if seen.insert(t.clone()) {
                resolved.push(t);
            }
        };

        for token in tokens {
            let t = token.trim();
            if t.is_empty() { continue; }

            // CIDR
            if let Ok(net) = t.parse::<Ipv4Net>() {
                let prefix = net.prefix_len();
                let hosts_count = if prefix >= 32 { 1u128 } else { 1u128 << (32 - prefix) };
                check_host_count("CIDR", t, hosts_count)?;
                for addr in net.hosts() {
                    push(ScanTarget::new(addr.to_string()));
                }
                continue;
            }

            // Range a.b.c.d-e.f.g.h
            if t.contains('-') && t.chars().any(|c| c.is_ascii_digit()) {
                if let Ok(range) = parse_ip_range(t) {
                    let hosts_count = u128::from(*range.end() - *range.start()) + 1;
                    check_host_count("Range", t, hosts_count)?;
                    for ip in range.map(Ipv4Addr::from) {
                        push(ScanTarget::new(ip.to_string()));
                    }
                    continue;
                }
            }

            // Address, host, or either with a port
            let target: ScanTarget = t.parse().with_context(|| format!("Invalid target: {}", t))?;
            push(target);
        }

        if resolved.is_empty() {
            anyhow::bail!("No targets specified");
        }

        Ok(resolved)
    }
}

fn check_host_count(kind: &str, token: &str, hosts_count: u128) -> Result<()> {
    let allow_large = std::env::var(ALLOW_LARGE_CIDR_ENV).map(|v| v == "1").unwrap_or(false);
    if hosts_count > MAX_HOSTS && !allow_large {
        anyhow::bail!("{} {} expands to {} hosts which exceeds the allowed limit of {}. Set {}=1 to override.", kind, token, hosts_count, MAX_HOSTS, ALLOW_LARGE_CIDR_ENV);
    }
    Ok(())
}

fn parse_ip_range(range: &str) -> Result<RangeInclusive<u32>> {
    let parts: Vec<&str> = range.split('-').collect();
    if parts.len() != 2 {
        anyhow::bail!("Invalid IP range: {}", range);
    }

    let start: Ipv4Addr = parts[0].trim().parse().context(format!("Invalid start IP: {}", parts[0]))?;
    let end: Ipv4Addr = parts[1].trim().parse().context(format!("Invalid end IP: {}", parts[1]))?;

    let start_u32 = u32::from(start);
    let end_u32 = u32::from(end);
    if start_u32 > end_u32 { anyhow::bail!("Invalid IP range: start > end"); }

    Ok(start_u32..=end_u32)
}

impl Default for TargetResolver { fn default() -> Self { Self::new() } }
