//! Orchestrator - probe job management and worker distribution

mod orchestrator;
mod progress;

pub use orchestrator::{Orchestrator, ProbeJob};
pub use progress::ProgressTracker;

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use defcred_common::{
		Auth, AuthType, Catalog, CatalogEntry, Credential, DefcredResult, FetchRequest, Fetcher,
		Fingerprint, FingerprintResponse, RunConfig, ScanTarget, SuccessCriteria,
	};
	use defcred_fingerprint::build_probes;
	use std::collections::BTreeMap;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	struct CountingFetcher {
		calls: AtomicUsize,
		body: &'static str,
	}

	#[async_trait]
	impl Fetcher for CountingFetcher {
		async fn fetch(&self, request: &FetchRequest) -> DefcredResult<FingerprintResponse> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(FingerprintResponse::new(200, request.url.clone()).with_body(self.body))
		}

		fn name(&self) -> &str {
			"counting"
		}
	}

	fn entry(name: &str, body: &str) -> CatalogEntry {
		CatalogEntry {
			name: name.into(),
			protocol: "http".into(),
			category: None,
			contributor: None,
			default_port: 80,
			ssl: false,
			references: Vec::new(),
			fingerprint: Fingerprint {
				url: vec!["/".into()],
				body: vec![body.into()],
				..Default::default()
			},
			auth: Auth {
				kind: AuthType::Get,
				url: vec!["/login".into()],
				csrf: None,
				sessionid: None,
				credentials: vec![Credential {
					username: "admin".into(),
					password: "admin".into(),
					raw: None,
				}],
				post: BTreeMap::new(),
				headers: BTreeMap::new(),
				success: SuccessCriteria::default(),
			},
		}
	}

	#[tokio::test]
	async fn orchestrator_run_no_jobs() {
		let orch = Orchestrator::new(1);
		assert!(orch.run().await.is_ok());
		assert!(orch.get_results().await.is_empty());
	}

	#[tokio::test]
	async fn duplicate_probes_fetch_once() {
		let catalog = Arc::new(Catalog::new(vec![entry("A", "Alpha"), entry("B", "Alpha")]));
		let targets = vec![ScanTarget::new("10.0.0.1"), ScanTarget::new("10.0.0.2")];
		let probes = build_probes(&targets, catalog, Arc::new(RunConfig::default()));
		assert_eq!(probes.len(), 4);

		let fetcher = Arc::new(CountingFetcher { calls: AtomicUsize::new(0), body: "Alpha" });
		let orch = Orchestrator::new(4).with_fetcher(fetcher.clone());
		let job = ProbeJob::new(probes);
		assert_eq!(job.probe_count(), 2);
		orch.submit_job(job).await.unwrap();
		orch.run().await.unwrap();

		assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
		// each response matches both entries: 2 probes x 2 entries x 1 pair
		assert_eq!(orch.get_results().await.len(), 4);
	}

	struct PanickyFetcher;

	#[async_trait]
	impl Fetcher for PanickyFetcher {
		async fn fetch(&self, request: &FetchRequest) -> DefcredResult<FingerprintResponse> {
			if request.url.contains("10.0.0.1") {
				panic!("fetcher blew up on {}", request.url);
			}
			tokio::time::sleep(std::time::Duration::from_millis(200)).await;
			Ok(FingerprintResponse::new(200, request.url.clone()).with_body("Alpha"))
		}

		fn name(&self) -> &str {
			"panicky"
		}
	}

	#[tokio::test]
	async fn worker_panic_still_waits_for_other_workers() {
		let catalog = Arc::new(Catalog::new(vec![entry("A", "Alpha")]));
		let targets = vec![ScanTarget::new("10.0.0.1"), ScanTarget::new("10.0.0.2")];
		let probes = build_probes(&targets, catalog, Arc::new(RunConfig::default()));

		let orch = Orchestrator::new(2).with_fetcher(Arc::new(PanickyFetcher));
		orch.submit_job(ProbeJob::new(probes)).await.unwrap();
		assert!(orch.run().await.is_err());

		let results = orch.get_results().await;
		assert_eq!(results.len(), 1);
		assert_eq!(results[0].url, "http://10.0.0.2/login");
	}

	#[tokio::test]
	async fn runs_against_live_server() {
		use wiremock::matchers::method;
		use wiremock::{Mock, MockServer, ResponseTemplate};

		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200).set_body_string("Alpha console"))
			.mount(&server)
			.await;

		let mut e = entry("A", "Alpha");
		e.default_port = server.address().port();
		let target = ScanTarget::new(server.address().ip().to_string());
		let probes = build_probes(&[target], Arc::new(Catalog::new(vec![e])), Arc::new(RunConfig::default()));

		let orch = Orchestrator::new(2);
		orch.submit_job(ProbeJob::new(probes)).await.unwrap();
		orch.run().await.unwrap();

		let results = orch.get_results().await;
		assert_eq!(results.len(), 1);
		assert_eq!(results[0].url, format!("{}/login", server.uri()));
	}
}
