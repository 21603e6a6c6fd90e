//! Signature-gated data fetching.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use log::debug;
use tokio::sync::mpsc;
use tokio::sync::watch;

use super::Transport;
use super::VisitRequest;
use crate::error::FetchError;
use crate::model::PaginatedData;
use crate::request::RequestSignature;

/// A finished fetch.
#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub result: Result<PaginatedData, FetchError>,
}

/// Starts exactly one fetch per request signature change.
///
/// The first signature observed is the one the initial page was rendered
/// with, so it only gets recorded. Every later change bumps the generation,
/// raises the loading flag and spawns the fetch. Only the fetch of the latest
/// generation lowers the flag again; superseded fetches still deliver their
/// outcome. Fetches are never cancelled.
pub struct FetchOrchestrator {
    transport: Arc<dyn Transport>,
    last_signature: Option<RequestSignature>,
    generation: Arc<AtomicU64>,
    loading: Arc<watch::Sender<bool>>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl FetchOrchestrator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (loading, _) = watch::channel(false);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            last_signature: None,
            generation: Arc::new(AtomicU64::new(0)),
            loading: Arc::new(loading),
            outcome_tx,
            outcome_rx,
        }
    }

    /// Follows the loading flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Generation of the most recently started fetch; 0 before the first.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The signature that last triggered (or seeded) a fetch.
    pub fn last_signature(&self) -> Option<&RequestSignature> {
        self.last_signature.as_ref()
    }

    /// Compares a freshly computed signature with the last one and starts a
    /// fetch if it changed.
    ///
    /// Returns the generation of the started fetch. Must be called inside a
    /// tokio runtime.
    pub fn observe(&mut self, signature: RequestSignature, mut request: VisitRequest) -> Option<u64> {
        match &self.last_signature {
            None => {
                debug!("Recording initial request signature {}", signature.digest());
                self.last_signature = Some(signature);
                return None;
            }
            Some(last) if *last == signature => return None,
            Some(_) => {}
        }

        // Bumping the generation and raising the flag happen under the flag's
        // lock, so a finishing fetch never sees one without the other.
        let mut generation = 0;
        self.loading.send_modify(|loading| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *loading = true;
        });
        debug!(
            "Request signature changed to {}; fetching generation {}",
            signature.digest(),
            generation
        );
        self.last_signature = Some(signature);

        request.generation = generation;
        let transport = Arc::clone(&self.transport);
        let latest = Arc::clone(&self.generation);
        let loading = Arc::clone(&self.loading);
        let outcomes = self.outcome_tx.clone();

        tokio::spawn(async move {
            let result = transport.visit(request).await;
            // Receiver lives as long as the orchestrator.
            let _ = outcomes.send(FetchOutcome { generation, result });
            let cleared = loading.send_if_modified(|loading| {
                let current = latest.load(Ordering::SeqCst) == generation;
                if current {
                    *loading = false;
                }
                current
            });
            if !cleared {
                debug!("Fetch generation {} finished after being superseded", generation);
            }
        });

        Some(generation)
    }

    /// A finished fetch, if one is waiting.
    pub fn try_next_outcome(&mut self) -> Option<FetchOutcome> {
        self.outcome_rx.try_recv().ok()
    }

    /// Waits for the next finished fetch.
    pub async fn next_outcome(&mut self) -> Option<FetchOutcome> {
        self.outcome_rx.recv().await
    }

    /// Waits until the latest fetch has finished.
    pub async fn wait_idle(&self) {
        let mut loading = self.subscribe();
        let _ = loading.wait_for(|loading| !*loading).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::model::PageMeta;
    use crate::request::FlatParams;
    use crate::request::RequestPayload;

    fn page(current_page: u32) -> PaginatedData {
        PaginatedData {
            data: Vec::new(),
            meta: PageMeta {
                current_page,
                from: None,
                to: None,
                last_page: 5,
                per_page: 10,
                total: 50,
                path: "/users".to_string(),
                links: Vec::new(),
            },
            links: Default::default(),
        }
    }

    fn visit() -> VisitRequest {
        VisitRequest {
            path: "/users".to_string(),
            params: FlatParams::new(),
            only: None,
            generation: 0,
        }
    }

    fn signature(page: &str) -> RequestSignature {
        let mut payload = RequestPayload::new();
        payload.insert("page", page);
        RequestSignature::new("/users", &payload)
    }

    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn visit(&self, request: VisitRequest) -> Result<PaginatedData, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(page(request.generation as u32))
        }
    }

    /// Holds every fetch until released.
    #[derive(Default)]
    struct GatedTransport {
        gate: Notify,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn visit(&self, request: VisitRequest) -> Result<PaginatedData, FetchError> {
            if request.generation == 1 {
                self.gate.notified().await;
            }
            Ok(page(request.generation as u32))
        }
    }

    #[tokio::test]
    async fn test_first_signature_is_only_recorded() {
        let transport = Arc::new(CountingTransport::default());
        let mut orchestrator = FetchOrchestrator::new(transport.clone());

        assert_eq!(orchestrator.observe(signature("1"), visit()), None);
        assert_eq!(orchestrator.observe(signature("1"), visit()), None);
        assert!(!orchestrator.is_loading());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_change_triggers_one_fetch() {
        let transport = Arc::new(CountingTransport::default());
        let mut orchestrator = FetchOrchestrator::new(transport.clone());
        orchestrator.observe(signature("1"), visit());

        assert_eq!(orchestrator.observe(signature("2"), visit()), Some(1));
        assert_eq!(orchestrator.observe(signature("2"), visit()), None);

        let outcome = orchestrator.next_outcome().await.unwrap();
        assert_eq!(outcome.generation, 1);
        assert!(outcome.result.is_ok());
        orchestrator.wait_idle().await;
        assert!(!orchestrator.is_loading());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_superseded_fetch_does_not_clear_loading() {
        let transport = Arc::new(GatedTransport::default());
        let mut orchestrator = FetchOrchestrator::new(transport.clone());
        orchestrator.observe(signature("1"), visit());

        assert_eq!(orchestrator.observe(signature("2"), visit()), Some(1));
        assert_eq!(orchestrator.observe(signature("3"), visit()), Some(2));

        let latest = orchestrator.next_outcome().await.unwrap();
        assert_eq!(latest.generation, 2);
        orchestrator.wait_idle().await;
        assert!(!orchestrator.is_loading());

        transport.gate.notify_one();
        let stale = orchestrator.next_outcome().await.unwrap();
        assert_eq!(stale.generation, 1);
        assert!(stale.result.is_ok());
        assert!(!orchestrator.is_loading());
        assert_eq!(orchestrator.generation(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_idle_only_after_latest_outcome() {
        let transport = Arc::new(CountingTransport::default());
        let mut orchestrator = FetchOrchestrator::new(transport);
        orchestrator.observe(signature("0"), visit());

        for round in 1..=500u64 {
            let generation = orchestrator.observe(signature(&round.to_string()), visit());
            assert_eq!(generation, Some(round));
            orchestrator.wait_idle().await;

            // Outcomes are sent before the flag drops, so the latest one is
            // already queued once the orchestrator reports idle.
            let mut seen = Vec::new();
            while let Some(outcome) = orchestrator.try_next_outcome() {
                seen.push(outcome.generation);
            }
            assert!(seen.contains(&round), "round {round} went idle early");
        }
    }
}
