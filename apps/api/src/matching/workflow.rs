//! Matching workflow — orchestrates analysis runs and the improvement
//! review over a shared session.
//!
//! Locking discipline: the session lock is held across precondition and
//! quota checks and the phase transition, then released for the duration of
//! the collaborator call, then re-acquired to commit the outcome. A second
//! mutating call arriving mid-flight sees the in-flight phase under the lock
//! and is rejected, never queued.

use tracing::{info, warn};

use crate::billing::ledger::PlanLedger;
use crate::errors::AppError;
use crate::matching::engine::MatchEngine;
use crate::matching::session::{AnalysisPhase, SharedSession, WorkflowState};
use crate::models::analysis::AnalysisResult;
use crate::models::document::{DocumentHandle, RENDERED_DISPLAY_NAME};
use crate::models::plan::UsagePlan;

/// Outcome of an analysis run. `Err` is reserved for precondition and
/// storage failures; collaborator failures surface as `Failed`.
#[derive(Debug)]
pub enum AnalyzeOutcome {
    Completed {
        result: AnalysisResult,
        plan: UsagePlan,
    },
    /// No credits left. Nothing ran, nothing changed.
    QuotaExceeded,
    /// Another analysis is already in flight. Rejected, not queued.
    Skipped,
    Failed {
        message: String,
    },
}

#[derive(Debug)]
pub enum ImproveOutcome {
    /// A candidate is ready for review.
    Ready,
    QuotaExceeded,
    /// A rewrite is already in flight or under review.
    Skipped,
    Failed {
        message: String,
    },
}

#[derive(Debug)]
pub enum AcceptOutcome {
    /// The candidate became the session document. `reanalysis` reports how
    /// the follow-up analysis of the new document went.
    Accepted {
        document_name: String,
        reanalysis: Box<AnalyzeOutcome>,
    },
    /// Nothing was under review.
    Skipped,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DiscardOutcome {
    Discarded,
    /// Nothing was under review.
    Skipped,
}

/// Runs one analysis of the session's document against its job description.
///
/// A successful run consumes one credit; failed runs are free.
pub async fn run_analysis(
    session: &SharedSession,
    engine: &dyn MatchEngine,
    ledger: &dyn PlanLedger,
    identity: &str,
) -> Result<AnalyzeOutcome, AppError> {
    let (document, jd_text) = {
        let mut s = session.lock().await;

        if s.phase == AnalysisPhase::Analyzing {
            return Ok(AnalyzeOutcome::Skipped);
        }
        let document = s
            .document
            .clone()
            .ok_or_else(|| AppError::NotReady("no document uploaded".to_string()))?;
        let jd_text = s
            .jd_text
            .clone()
            .ok_or_else(|| AppError::NotReady("no job description set".to_string()))?;

        // Quota is read with the lock held so the check and the transition
        // to Analyzing form one step.
        let plan = ledger.get_current(identity).await?;
        if !plan.has_quota() {
            return Ok(AnalyzeOutcome::QuotaExceeded);
        }

        s.phase = AnalysisPhase::Analyzing;
        (document, jd_text)
    };

    let outcome = engine.analyze(&document, &jd_text).await;

    let mut s = session.lock().await;
    match outcome {
        Ok(result) => {
            s.result = Some(result.clone());
            s.phase = AnalysisPhase::Complete;
            s.last_error = None;
            drop(s);

            ledger.record_usage(identity).await?;
            let plan = ledger.get_current(identity).await?;
            info!("Analysis for {} completed with score {}", identity, result.score);
            Ok(AnalyzeOutcome::Completed { result, plan })
        }
        Err(e) => {
            let message = e.to_string();
            s.phase = AnalysisPhase::Failed;
            s.last_error = Some(message.clone());
            warn!("Analysis for {} failed: {}", identity, message);
            Ok(AnalyzeOutcome::Failed { message })
        }
    }
}

/// Asks the collaborator for an improved rendition of the current document.
///
/// Requires a completed analysis. Does not consume a credit itself; only the
/// re-analysis after an accept is metered. The quota gate here keeps a user
/// with no credits from drafting a candidate they could never accept.
pub async fn request_improvement(
    session: &SharedSession,
    engine: &dyn MatchEngine,
    ledger: &dyn PlanLedger,
    identity: &str,
) -> Result<ImproveOutcome, AppError> {
    let (document, jd_text, analysis) = {
        let mut s = session.lock().await;

        if s.workflow != WorkflowState::NoCandidate {
            return Ok(ImproveOutcome::Skipped);
        }
        if s.phase != AnalysisPhase::Complete {
            return Err(AppError::NotReady(
                "no completed analysis to improve on".to_string(),
            ));
        }
        let document = s
            .document
            .clone()
            .ok_or_else(|| AppError::NotReady("no document uploaded".to_string()))?;
        let jd_text = s
            .jd_text
            .clone()
            .ok_or_else(|| AppError::NotReady("no job description set".to_string()))?;
        let analysis = s
            .result
            .clone()
            .ok_or_else(|| AppError::NotReady("no completed analysis to improve on".to_string()))?;

        let plan = ledger.get_current(identity).await?;
        if !plan.has_quota() {
            return Ok(ImproveOutcome::QuotaExceeded);
        }

        s.workflow = WorkflowState::Requesting;
        (document, jd_text, analysis)
    };

    let outcome = engine.rewrite(&document, &jd_text, &analysis).await;

    let mut s = session.lock().await;
    match outcome {
        Ok(html) if !html.trim().is_empty() => {
            s.candidate = Some(html);
            s.workflow = WorkflowState::Reviewing;
            s.last_error = None;
            info!("Improvement candidate ready for {}", identity);
            Ok(ImproveOutcome::Ready)
        }
        Ok(_) => {
            // An empty rendition is a failure, never a reviewable candidate.
            let message = "collaborator returned an empty rendition".to_string();
            s.candidate = None;
            s.workflow = WorkflowState::NoCandidate;
            s.last_error = Some(message.clone());
            warn!("Improvement for {} failed: {}", identity, message);
            Ok(ImproveOutcome::Failed { message })
        }
        Err(e) => {
            let message = e.to_string();
            s.candidate = None;
            s.workflow = WorkflowState::NoCandidate;
            s.last_error = Some(message.clone());
            warn!("Improvement for {} failed: {}", identity, message);
            Ok(ImproveOutcome::Failed { message })
        }
    }
}

/// Promotes the candidate under review to be the session document, then
/// re-analyzes the new document.
///
/// The swap commits before the re-analysis starts; a failed re-analysis
/// leaves the accepted document in place.
pub async fn accept_candidate(
    session: &SharedSession,
    engine: &dyn MatchEngine,
    ledger: &dyn PlanLedger,
    identity: &str,
) -> Result<AcceptOutcome, AppError> {
    {
        let mut s = session.lock().await;

        if s.workflow != WorkflowState::Reviewing {
            return Ok(AcceptOutcome::Skipped);
        }
        let Some(html) = s.candidate.take() else {
            s.workflow = WorkflowState::NoCandidate;
            return Ok(AcceptOutcome::Skipped);
        };

        s.document = Some(DocumentHandle::from_rendered_markup(&html));
        s.workflow = WorkflowState::NoCandidate;
        s.result = None;
        s.phase = AnalysisPhase::Idle;
    }

    info!("Improvement accepted for {}; re-analyzing", identity);
    let reanalysis = run_analysis(session, engine, ledger, identity).await?;

    Ok(AcceptOutcome::Accepted {
        document_name: RENDERED_DISPLAY_NAME.to_string(),
        reanalysis: Box::new(reanalysis),
    })
}

/// Drops the candidate under review. The prior document and its verdict
/// stay untouched.
pub async fn discard_candidate(session: &SharedSession) -> DiscardOutcome {
    let mut s = session.lock().await;

    if s.workflow != WorkflowState::Reviewing {
        return DiscardOutcome::Skipped;
    }

    s.candidate = None;
    s.workflow = WorkflowState::NoCandidate;
    DiscardOutcome::Discarded
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::{Mutex, Notify};

    use super::*;
    use crate::matching::session::AnalysisSession;
    use crate::models::document::RENDERED_MEDIA_TYPE;
    use crate::models::plan::{PlanTier, DEFAULT_FREE_CREDITS};

    struct MemoryLedger {
        plans: Mutex<HashMap<String, UsagePlan>>,
        usage_calls: AtomicU32,
    }

    impl MemoryLedger {
        fn new() -> Self {
            Self {
                plans: Mutex::new(HashMap::new()),
                usage_calls: AtomicU32::new(0),
            }
        }

        async fn with_plan(self, plan: UsagePlan) -> Self {
            self.plans.lock().await.insert(plan.identity.clone(), plan);
            self
        }

        fn usage_calls(&self) -> u32 {
            self.usage_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlanLedger for MemoryLedger {
        async fn get_current(&self, identity: &str) -> Result<UsagePlan, AppError> {
            let mut plans = self.plans.lock().await;
            Ok(plans
                .entry(identity.to_string())
                .or_insert_with(|| UsagePlan::default_free(identity))
                .clone())
        }

        async fn record_usage(&self, identity: &str) -> Result<(), AppError> {
            self.usage_calls.fetch_add(1, Ordering::SeqCst);
            let mut plans = self.plans.lock().await;
            plans
                .entry(identity.to_string())
                .or_insert_with(|| UsagePlan::default_free(identity))
                .credits_used += 1;
            Ok(())
        }

        async fn activate_pro(&self, identity: &str) -> Result<UsagePlan, AppError> {
            let mut plans = self.plans.lock().await;
            let plan = plans
                .entry(identity.to_string())
                .or_insert_with(|| UsagePlan::default_free(identity));
            plan.tier = PlanTier::Pro;
            plan.credit_limit = None;
            Ok(plan.clone())
        }
    }

    /// Engine that replays scripted responses and counts invocations.
    struct ScriptedEngine {
        analyses: Mutex<Vec<Result<AnalysisResult, AppError>>>,
        rewrites: Mutex<Vec<Result<String, AppError>>>,
        analyze_calls: AtomicU32,
    }

    impl ScriptedEngine {
        fn new() -> Self {
            Self {
                analyses: Mutex::new(Vec::new()),
                rewrites: Mutex::new(Vec::new()),
                analyze_calls: AtomicU32::new(0),
            }
        }

        async fn push_analysis(&self, outcome: Result<AnalysisResult, AppError>) {
            self.analyses.lock().await.push(outcome);
        }

        async fn push_rewrite(&self, outcome: Result<String, AppError>) {
            self.rewrites.lock().await.push(outcome);
        }

        fn analyze_calls(&self) -> u32 {
            self.analyze_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MatchEngine for ScriptedEngine {
        async fn analyze(
            &self,
            _document: &DocumentHandle,
            _jd_text: &str,
        ) -> Result<AnalysisResult, AppError> {
            self.analyze_calls.fetch_add(1, Ordering::SeqCst);
            let mut analyses = self.analyses.lock().await;
            if analyses.is_empty() {
                return Err(AppError::Collaborator("no scripted analysis".to_string()));
            }
            analyses.remove(0)
        }

        async fn rewrite(
            &self,
            _document: &DocumentHandle,
            _jd_text: &str,
            _analysis: &AnalysisResult,
        ) -> Result<String, AppError> {
            let mut rewrites = self.rewrites.lock().await;
            if rewrites.is_empty() {
                return Err(AppError::Collaborator("no scripted rewrite".to_string()));
            }
            rewrites.remove(0)
        }
    }

    /// Engine whose analyze call parks until released, to exercise the
    /// in-flight rejection path.
    struct BlockingEngine {
        entered: Notify,
        release: Notify,
        result: AnalysisResult,
    }

    impl BlockingEngine {
        fn new(result: AnalysisResult) -> Self {
            Self {
                entered: Notify::new(),
                release: Notify::new(),
                result,
            }
        }
    }

    #[async_trait]
    impl MatchEngine for BlockingEngine {
        async fn analyze(
            &self,
            _document: &DocumentHandle,
            _jd_text: &str,
        ) -> Result<AnalysisResult, AppError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(self.result.clone())
        }

        async fn rewrite(
            &self,
            _document: &DocumentHandle,
            _jd_text: &str,
            _analysis: &AnalysisResult,
        ) -> Result<String, AppError> {
            Err(AppError::Collaborator("not scripted".to_string()))
        }
    }

    fn verdict(score: u8) -> AnalysisResult {
        AnalysisResult {
            score,
            summary: "solid match".to_string(),
            strengths: vec!["Rust experience".to_string()],
            weaknesses: vec!["No Kubernetes".to_string()],
            missing_keywords: vec!["Kubernetes".to_string()],
            formatting_issues: vec![],
            improvement_plan: vec!["Add a skills section".to_string()],
        }
    }

    fn ready_session() -> SharedSession {
        let mut session = AnalysisSession::new();
        session
            .put_document(DocumentHandle::new(
                b"resume bytes".to_vec(),
                "application/pdf",
                "cv.pdf",
            ))
            .expect("upload should succeed");
        session
            .put_job_description("Senior backend engineer, Rust, Postgres".to_string())
            .expect("JD should be accepted");
        Arc::new(Mutex::new(session))
    }

    async fn session_with_completed_analysis(
        engine: &ScriptedEngine,
        ledger: &MemoryLedger,
    ) -> SharedSession {
        let session = ready_session();
        engine.push_analysis(Ok(verdict(62))).await;
        let outcome = run_analysis(&session, engine, ledger, "user-1")
            .await
            .expect("analysis should run");
        assert!(matches!(outcome, AnalyzeOutcome::Completed { .. }));
        session
    }

    #[tokio::test]
    async fn test_analysis_completes_and_consumes_one_credit() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let session = ready_session();
        engine.push_analysis(Ok(verdict(71))).await;

        let outcome = run_analysis(&session, &engine, &ledger, "user-1")
            .await
            .expect("analysis should run");

        match outcome {
            AnalyzeOutcome::Completed { result, plan } => {
                assert_eq!(result.score, 71);
                assert_eq!(plan.credits_used, 1);
                assert_eq!(plan.credits_remaining(), Some(DEFAULT_FREE_CREDITS - 1));
            }
            other => panic!("expected Completed, got {other:?}"),
        }

        let s = session.lock().await;
        assert_eq!(s.phase, AnalysisPhase::Complete);
        assert_eq!(s.result.as_ref().map(|r| r.score), Some(71));
        assert!(s.last_error.is_none());
    }

    #[tokio::test]
    async fn test_analysis_without_document_is_not_ready() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let mut session = AnalysisSession::new();
        session
            .put_job_description("Backend role".to_string())
            .expect("JD should be accepted");
        let session = Arc::new(Mutex::new(session));

        let err = run_analysis(&session, &engine, &ledger, "user-1")
            .await
            .expect_err("missing document should be rejected");
        assert!(matches!(err, AppError::NotReady(_)));
        assert_eq!(engine.analyze_calls(), 0);
    }

    #[tokio::test]
    async fn test_analysis_without_jd_is_not_ready() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let mut session = AnalysisSession::new();
        session
            .put_document(DocumentHandle::new(vec![1u8], "application/pdf", "cv.pdf"))
            .expect("upload should succeed");
        let session = Arc::new(Mutex::new(session));

        let err = run_analysis(&session, &engine, &ledger, "user-1")
            .await
            .expect_err("missing JD should be rejected");
        assert!(matches!(err, AppError::NotReady(_)));
    }

    #[tokio::test]
    async fn test_exhausted_quota_blocks_analysis_without_engine_call() {
        let engine = ScriptedEngine::new();
        let mut plan = UsagePlan::default_free("user-1");
        plan.credits_used = DEFAULT_FREE_CREDITS;
        let ledger = MemoryLedger::new().with_plan(plan).await;
        let session = ready_session();

        let outcome = run_analysis(&session, &engine, &ledger, "user-1")
            .await
            .expect("quota check should not error");
        assert!(matches!(outcome, AnalyzeOutcome::QuotaExceeded));
        assert_eq!(engine.analyze_calls(), 0);

        let s = session.lock().await;
        assert_eq!(s.phase, AnalysisPhase::Idle);
    }

    #[tokio::test]
    async fn test_unlimited_plan_ignores_usage_count() {
        let engine = ScriptedEngine::new();
        let mut plan = UsagePlan::default_free("user-1");
        plan.tier = PlanTier::Pro;
        plan.credit_limit = None;
        plan.credits_used = 9_999;
        let ledger = MemoryLedger::new().with_plan(plan).await;
        let session = ready_session();
        engine.push_analysis(Ok(verdict(80))).await;

        let outcome = run_analysis(&session, &engine, &ledger, "user-1")
            .await
            .expect("analysis should run");
        assert!(matches!(outcome, AnalyzeOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_failed_analysis_is_free_and_marks_session() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let session = ready_session();
        engine
            .push_analysis(Err(AppError::Collaborator("timeout".to_string())))
            .await;

        let outcome = run_analysis(&session, &engine, &ledger, "user-1")
            .await
            .expect("failure should be reported, not raised");
        assert!(matches!(outcome, AnalyzeOutcome::Failed { .. }));
        assert_eq!(ledger.usage_calls(), 0);

        let s = session.lock().await;
        assert_eq!(s.phase, AnalysisPhase::Failed);
        assert!(s.last_error.is_some());
        assert!(s.result.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_analysis_is_rejected_not_queued() {
        let engine = Arc::new(BlockingEngine::new(verdict(55)));
        let ledger = Arc::new(MemoryLedger::new());
        let session = ready_session();

        let first = {
            let engine = engine.clone();
            let ledger = ledger.clone();
            let session = session.clone();
            tokio::spawn(async move {
                run_analysis(&session, engine.as_ref(), ledger.as_ref(), "user-1").await
            })
        };

        // Wait until the first call is parked inside the collaborator.
        engine.entered.notified().await;

        let second = run_analysis(&session, engine.as_ref(), ledger.as_ref(), "user-1")
            .await
            .expect("second call should be rejected cleanly");
        assert!(matches!(second, AnalyzeOutcome::Skipped));

        engine.release.notify_one();
        let first = first.await.expect("task should not panic").expect("first run should succeed");
        assert!(matches!(first, AnalyzeOutcome::Completed { .. }));

        let s = session.lock().await;
        assert_eq!(s.phase, AnalysisPhase::Complete);
        assert_eq!(ledger.usage_calls(), 1);
    }

    #[tokio::test]
    async fn test_upgrade_unblocks_exhausted_identity() {
        let engine = ScriptedEngine::new();
        let mut plan = UsagePlan::default_free("user-1");
        plan.credits_used = DEFAULT_FREE_CREDITS;
        let ledger = MemoryLedger::new().with_plan(plan).await;
        let session = ready_session();

        let blocked = run_analysis(&session, &engine, &ledger, "user-1")
            .await
            .expect("quota check should not error");
        assert!(matches!(blocked, AnalyzeOutcome::QuotaExceeded));

        ledger
            .activate_pro("user-1")
            .await
            .expect("upgrade should succeed");
        engine.push_analysis(Ok(verdict(90))).await;

        let outcome = run_analysis(&session, &engine, &ledger, "user-1")
            .await
            .expect("analysis should run");
        match outcome {
            AnalyzeOutcome::Completed { result, plan } => {
                assert_eq!(result.score, 90);
                assert_eq!(plan.tier, PlanTier::Pro);
                assert_eq!(plan.credit_limit, None);
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_improvement_requires_completed_analysis() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let session = ready_session();

        let err = request_improvement(&session, &engine, &ledger, "user-1")
            .await
            .expect_err("improvement without analysis should be rejected");
        assert!(matches!(err, AppError::NotReady(_)));
    }

    #[tokio::test]
    async fn test_improvement_produces_reviewable_candidate_without_charging() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let session = session_with_completed_analysis(&engine, &ledger).await;
        engine
            .push_rewrite(Ok("<html><body>better</body></html>".to_string()))
            .await;

        let outcome = request_improvement(&session, &engine, &ledger, "user-1")
            .await
            .expect("improvement should run");
        assert!(matches!(outcome, ImproveOutcome::Ready));
        // Only the analysis was metered.
        assert_eq!(ledger.usage_calls(), 1);

        let s = session.lock().await;
        assert_eq!(s.workflow, WorkflowState::Reviewing);
        assert_eq!(
            s.candidate.as_deref(),
            Some("<html><body>better</body></html>")
        );
        // The prior verdict stays valid for the prior document.
        assert_eq!(s.phase, AnalysisPhase::Complete);
        assert!(s.result.is_some());
    }

    #[tokio::test]
    async fn test_blank_rendition_never_becomes_a_candidate() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let session = session_with_completed_analysis(&engine, &ledger).await;
        engine.push_rewrite(Ok("   \n\t".to_string())).await;

        let outcome = request_improvement(&session, &engine, &ledger, "user-1")
            .await
            .expect("improvement should report failure");
        assert!(matches!(outcome, ImproveOutcome::Failed { .. }));

        let s = session.lock().await;
        assert_eq!(s.workflow, WorkflowState::NoCandidate);
        assert!(s.candidate.is_none());
        assert!(s.last_error.is_some());
    }

    #[tokio::test]
    async fn test_rewrite_failure_returns_session_to_no_candidate() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let session = session_with_completed_analysis(&engine, &ledger).await;
        engine
            .push_rewrite(Err(AppError::Collaborator("overloaded".to_string())))
            .await;

        let outcome = request_improvement(&session, &engine, &ledger, "user-1")
            .await
            .expect("improvement should report failure");
        assert!(matches!(outcome, ImproveOutcome::Failed { .. }));

        let s = session.lock().await;
        assert_eq!(s.workflow, WorkflowState::NoCandidate);
        assert!(s.candidate.is_none());
    }

    #[tokio::test]
    async fn test_improvement_while_reviewing_is_skipped() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let session = session_with_completed_analysis(&engine, &ledger).await;
        engine
            .push_rewrite(Ok("<html>v1</html>".to_string()))
            .await;
        let outcome = request_improvement(&session, &engine, &ledger, "user-1")
            .await
            .expect("first improvement should run");
        assert!(matches!(outcome, ImproveOutcome::Ready));

        let second = request_improvement(&session, &engine, &ledger, "user-1")
            .await
            .expect("second improvement should be rejected cleanly");
        assert!(matches!(second, ImproveOutcome::Skipped));

        let s = session.lock().await;
        assert_eq!(s.candidate.as_deref(), Some("<html>v1</html>"));
    }

    #[tokio::test]
    async fn test_exhausted_quota_blocks_improvement() {
        let engine = ScriptedEngine::new();
        let mut plan = UsagePlan::default_free("user-1");
        plan.credits_used = DEFAULT_FREE_CREDITS - 1;
        let ledger = MemoryLedger::new().with_plan(plan).await;
        // Last credit goes to the analysis.
        let session = session_with_completed_analysis(&engine, &ledger).await;

        let outcome = request_improvement(&session, &engine, &ledger, "user-1")
            .await
            .expect("quota check should not error");
        assert!(matches!(outcome, ImproveOutcome::QuotaExceeded));
    }

    #[tokio::test]
    async fn test_accept_swaps_document_and_reanalyzes() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let session = session_with_completed_analysis(&engine, &ledger).await;
        engine
            .push_rewrite(Ok("<html><body>better</body></html>".to_string()))
            .await;
        request_improvement(&session, &engine, &ledger, "user-1")
            .await
            .expect("improvement should run");
        engine.push_analysis(Ok(verdict(88))).await;

        let outcome = accept_candidate(&session, &engine, &ledger, "user-1")
            .await
            .expect("accept should run");

        match outcome {
            AcceptOutcome::Accepted {
                document_name,
                reanalysis,
            } => {
                assert_eq!(document_name, RENDERED_DISPLAY_NAME);
                match *reanalysis {
                    AnalyzeOutcome::Completed { result, plan } => {
                        assert_eq!(result.score, 88);
                        assert_eq!(plan.credits_used, 2);
                    }
                    other => panic!("expected Completed reanalysis, got {other:?}"),
                }
            }
            AcceptOutcome::Skipped => panic!("expected Accepted"),
        }

        let s = session.lock().await;
        assert_eq!(s.workflow, WorkflowState::NoCandidate);
        assert!(s.candidate.is_none());
        let doc = s.document.as_ref().expect("document should be present");
        assert_eq!(doc.media_type(), RENDERED_MEDIA_TYPE);
        assert_eq!(doc.display_name(), RENDERED_DISPLAY_NAME);
        assert_eq!(doc.content(), b"<html><body>better</body></html>");
        assert_eq!(s.result.as_ref().map(|r| r.score), Some(88));
    }

    #[tokio::test]
    async fn test_accept_without_review_is_skipped() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let session = session_with_completed_analysis(&engine, &ledger).await;

        let outcome = accept_candidate(&session, &engine, &ledger, "user-1")
            .await
            .expect("accept should be rejected cleanly");
        assert!(matches!(outcome, AcceptOutcome::Skipped));
    }

    #[tokio::test]
    async fn test_accept_commits_swap_even_when_reanalysis_fails() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let session = session_with_completed_analysis(&engine, &ledger).await;
        engine
            .push_rewrite(Ok("<html>v2</html>".to_string()))
            .await;
        request_improvement(&session, &engine, &ledger, "user-1")
            .await
            .expect("improvement should run");
        engine
            .push_analysis(Err(AppError::Collaborator("overloaded".to_string())))
            .await;

        let outcome = accept_candidate(&session, &engine, &ledger, "user-1")
            .await
            .expect("accept should run");
        match outcome {
            AcceptOutcome::Accepted { reanalysis, .. } => {
                assert!(matches!(*reanalysis, AnalyzeOutcome::Failed { .. }));
            }
            AcceptOutcome::Skipped => panic!("expected Accepted"),
        }

        let s = session.lock().await;
        let doc = s.document.as_ref().expect("document should be present");
        assert_eq!(doc.content(), b"<html>v2</html>");
        assert_eq!(s.phase, AnalysisPhase::Failed);
        assert!(s.result.is_none());
        // Only the first analysis consumed a credit.
        assert_eq!(ledger.usage_calls(), 1);
    }

    #[tokio::test]
    async fn test_discard_keeps_original_document_and_verdict() {
        let engine = ScriptedEngine::new();
        let ledger = MemoryLedger::new();
        let session = session_with_completed_analysis(&engine, &ledger).await;
        engine
            .push_rewrite(Ok("<html>v3</html>".to_string()))
            .await;
        request_improvement(&session, &engine, &ledger, "user-1")
            .await
            .expect("improvement should run");

        let outcome = discard_candidate(&session).await;
        assert_eq!(outcome, DiscardOutcome::Discarded);

        let s = session.lock().await;
        assert_eq!(s.workflow, WorkflowState::NoCandidate);
        assert!(s.candidate.is_none());
        let doc = s.document.as_ref().expect("document should be present");
        assert_eq!(doc.display_name(), "cv.pdf");
        assert_eq!(s.phase, AnalysisPhase::Complete);
        assert_eq!(s.result.as_ref().map(|r| r.score), Some(62));
    }

    #[tokio::test]
    async fn test_discard_without_review_is_skipped() {
        let session = ready_session();
        assert_eq!(discard_candidate(&session).await, DiscardOutcome::Skipped);
    }
}
