//! Analysis pipeline: three prompt → model → parse stages.
//!
//! Flow: job description → JobDetails → (ResumeSuggestions, CoverLetter).
//! Stages run sequentially; both later stages consume the JobDetails record.
//! A run either returns a complete report or an error, never a partial one.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{self, ExtractionError, ExtractionTier};
use crate::generation::prompt_builder::{
    self, GenerationRequest, PromptInputs, PromptTemplate, JOB_DESCRIPTION, JOB_DETAILS,
    JOB_TITLE, RESUME,
};
use crate::llm_client::{generate_with_timeout, TextGenerator};
use crate::models::analysis::{CoverLetter, JobDetails, ResumeSuggestions};
use crate::schema::{defaults_for, StructuredRecord};

const UNPARSEABLE_MESSAGE: &str =
    "Automatic extraction failed: the model reply contained no JSON document. The raw reply is shown instead.";

const DEGRADED_MESSAGE: &str = "Automatic extraction of the job details failed; \
    continuing with empty job details. Suggestions and the cover letter may be generic.";

/// Result of one structured stage as presented to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome<T> {
    Extracted {
        record: T,
        tier: ExtractionTier,
        repaired_fields: Vec<&'static str>,
    },
    /// All-defaults record substituted at the caller's request.
    Degraded {
        record: T,
        raw: String,
        message: String,
    },
    Unparseable {
        raw: String,
        message: String,
    },
}

impl<T> StageOutcome<T> {
    pub fn record(&self) -> Option<&T> {
        match self {
            StageOutcome::Extracted { record, .. } | StageOutcome::Degraded { record, .. } => {
                Some(record)
            }
            StageOutcome::Unparseable { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub job_description: String,
    pub resume_text: String,
    /// Continue with an all-defaults JobDetails when extraction fails.
    pub substitute_default_job_details: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub job_details: StageOutcome<JobDetails>,
    pub suggestions: StageOutcome<ResumeSuggestions>,
    pub cover_letter: CoverLetter,
}

/// Owns the injected generation service and the per-call timeout.
#[derive(Clone)]
pub struct AnalysisPipeline {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl AnalysisPipeline {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Stage 1: structured requirements from the raw job description.
    pub async fn extract_job_details(
        &self,
        job_description: &str,
    ) -> Result<StageOutcome<JobDetails>, AppError> {
        let inputs = PromptInputs::new().with(JOB_DESCRIPTION, job_description);
        let request = prompt_builder::build(PromptTemplate::JobDetails, &inputs)?;
        self.structured_stage(request).await
    }

    /// Stage 2: resume gap analysis against the job details.
    pub async fn suggest_improvements(
        &self,
        job: &JobDetails,
        resume_text: &str,
    ) -> Result<StageOutcome<ResumeSuggestions>, AppError> {
        let inputs = PromptInputs::new()
            .with(JOB_DETAILS, render_job_details(job)?)
            .with(RESUME, resume_text);
        let request = prompt_builder::build(PromptTemplate::ResumeSuggestions, &inputs)?;
        self.structured_stage(request).await
    }

    /// Stage 3: free-text cover letter.
    pub async fn write_cover_letter(
        &self,
        job: &JobDetails,
        resume_text: &str,
    ) -> Result<CoverLetter, AppError> {
        let inputs = PromptInputs::new()
            .with(JOB_TITLE, job.job_title.as_str())
            .with(JOB_DETAILS, render_job_details(job)?)
            .with(RESUME, resume_text);
        let request = prompt_builder::build(PromptTemplate::CoverLetter, &inputs)?;
        let raw = self.call(request).await?;

        CoverLetter::new(raw)
            .ok_or_else(|| AppError::Llm("cover letter generation returned empty text".to_string()))
    }

    /// Runs all three stages for one analysis request.
    pub async fn run(&self, input: AnalysisInput) -> Result<AnalysisReport, AppError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, model = self.generator.model(), "Starting analysis run");

        let job_outcome = match self.extract_job_details(&input.job_description).await? {
            StageOutcome::Unparseable { raw, .. } if input.substitute_default_job_details => {
                warn!(%run_id, "Job details unparseable; substituting defaults as requested");
                StageOutcome::Degraded {
                    record: defaults_for::<JobDetails>(),
                    raw,
                    message: DEGRADED_MESSAGE.to_string(),
                }
            }
            StageOutcome::Unparseable { raw, .. } => {
                warn!(%run_id, "Job details unparseable; halting run");
                return Err(AppError::Unparseable {
                    stage: "job_details",
                    raw,
                });
            }
            outcome => outcome,
        };
        let job = job_outcome.record().cloned().unwrap_or_default();
        info!(%run_id, job_title = %job.job_title, "Job details ready");

        let suggestions = self.suggest_improvements(&job, &input.resume_text).await?;
        if suggestions.record().is_none() {
            warn!(%run_id, "Resume suggestions unparseable; reporting raw reply");
        }

        let cover_letter = self.write_cover_letter(&job, &input.resume_text).await?;
        info!(%run_id, "Analysis run complete");

        Ok(AnalysisReport {
            run_id,
            generated_at: Utc::now(),
            model: self.generator.model().to_string(),
            job_details: job_outcome,
            suggestions,
            cover_letter,
        })
    }

    async fn structured_stage<T: StructuredRecord>(
        &self,
        request: GenerationRequest,
    ) -> Result<StageOutcome<T>, AppError> {
        let raw = self.call(request).await?;

        Ok(match extraction::extract::<T>(&raw) {
            Ok(extracted) => StageOutcome::Extracted {
                record: extracted.record,
                tier: extracted.tier,
                repaired_fields: extracted.repaired_fields,
            },
            Err(ExtractionError::Unparseable { raw }) => StageOutcome::Unparseable {
                raw,
                message: UNPARSEABLE_MESSAGE.to_string(),
            },
        })
    }

    async fn call(&self, request: GenerationRequest) -> Result<String, AppError> {
        info!(
            template = ?request.template,
            schema = request.schema.map(|s| s.name()).unwrap_or("free_text"),
            prompt_len = request.prompt.len(),
            "Calling generation service"
        );
        let raw = generate_with_timeout(self.generator.as_ref(), &request.prompt, self.timeout)
            .await?;
        Ok(raw)
    }
}

/// JobDetails as embedded in downstream prompts.
fn render_job_details(job: &JobDetails) -> Result<String, AppError> {
    serde_json::to_string_pretty(job).map_err(|e| AppError::Internal(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{ScriptedGenerator, StalledGenerator};
    use crate::llm_client::LlmError;

    const JOB_REPLY: &str = r#"{
        "job_title": "Data Engineer",
        "required_skills": ["SQL", "Python"],
        "experience_required": 3,
        "tools": ["Airflow"],
        "soft_skills": ["communication"]
    }"#;

    const SUGGESTIONS_REPLY: &str = r#"```json
{"missing_skills": ["Airflow"], "improvement_points": ["Mention pipeline scale"], "overall_fit_summary": "Solid fit"}
```"#;

    const LETTER_REPLY: &str = "Dear Hiring Manager,\n\nI am excited to apply.\n";

    const RESUME_TEXT: &str = "Jane Doe. Five years of SQL and Python ETL work.";

    fn input(substitute: bool) -> AnalysisInput {
        AnalysisInput {
            job_description: "We need a Data Engineer with 3 years of SQL.".to_string(),
            resume_text: RESUME_TEXT.to_string(),
            substitute_default_job_details: substitute,
        }
    }

    fn pipeline(generator: Arc<ScriptedGenerator>) -> AnalysisPipeline {
        AnalysisPipeline::new(generator, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_full_run_produces_all_three_outputs() {
        let generator = Arc::new(ScriptedGenerator::new([
            JOB_REPLY,
            SUGGESTIONS_REPLY,
            LETTER_REPLY,
        ]));
        let report = pipeline(generator.clone()).run(input(false)).await.unwrap();

        let job = report.job_details.record().unwrap();
        assert_eq!(job.job_title, "Data Engineer");
        assert_eq!(job.experience_required, 3);

        let suggestions = report.suggestions.record().unwrap();
        assert_eq!(suggestions.missing_skills, vec!["Airflow"]);
        assert!(matches!(
            report.suggestions,
            StageOutcome::Extracted {
                tier: ExtractionTier::Strict,
                ..
            }
        ));

        assert_eq!(
            report.cover_letter.as_str(),
            "Dear Hiring Manager,\n\nI am excited to apply."
        );
        assert_eq!(report.model, "scripted");
    }

    #[tokio::test]
    async fn test_downstream_prompts_carry_job_details_and_resume() {
        let generator = Arc::new(ScriptedGenerator::new([
            JOB_REPLY,
            SUGGESTIONS_REPLY,
            LETTER_REPLY,
        ]));
        pipeline(generator.clone()).run(input(false)).await.unwrap();

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("We need a Data Engineer with 3 years of SQL."));
        assert!(prompts[1].contains("\"job_title\": \"Data Engineer\""));
        assert!(prompts[1].contains(RESUME_TEXT));
        assert!(prompts[2].contains("Job Title: Data Engineer"));
        assert!(prompts[2].contains(RESUME_TEXT));
    }

    #[tokio::test]
    async fn test_unparseable_job_details_halts_run() {
        let generator = Arc::new(ScriptedGenerator::new([
            "I cannot provide that information.",
        ]));
        let err = pipeline(generator.clone()).run(input(false)).await.unwrap_err();

        match err {
            AppError::Unparseable { stage, raw } => {
                assert_eq!(stage, "job_details");
                assert_eq!(raw, "I cannot provide that information.");
            }
            other => panic!("expected Unparseable, got {other:?}"),
        }
        assert_eq!(generator.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_job_details_can_degrade_to_defaults() {
        let generator = Arc::new(ScriptedGenerator::new([
            "I cannot provide that information.",
            SUGGESTIONS_REPLY,
            LETTER_REPLY,
        ]));
        let report = pipeline(generator.clone()).run(input(true)).await.unwrap();

        match &report.job_details {
            StageOutcome::Degraded { record, raw, message } => {
                assert_eq!(record, &JobDetails::default());
                assert_eq!(raw, "I cannot provide that information.");
                assert!(message.contains("empty job details"));
            }
            other => panic!("expected Degraded, got {other:?}"),
        }
        assert_eq!(generator.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_blank_job_details_reply_degrades_when_requested() {
        let generator = Arc::new(ScriptedGenerator::new(["  ", SUGGESTIONS_REPLY, LETTER_REPLY]));
        let report = pipeline(generator).run(input(true)).await.unwrap();

        match &report.job_details {
            StageOutcome::Degraded { record, raw, .. } => {
                assert_eq!(record, &JobDetails::default());
                assert_eq!(raw, "  ");
            }
            other => panic!("expected Degraded, got {other:?}"),
        }
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["job_details"]["status"], "degraded");
    }

    #[tokio::test]
    async fn test_blank_job_details_reply_is_unparseable_not_a_service_error() {
        let generator = Arc::new(ScriptedGenerator::new([""]));
        let err = pipeline(generator).run(input(false)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Unparseable { stage: "job_details", .. }
        ));
    }

    #[tokio::test]
    async fn test_unparseable_suggestions_still_produce_cover_letter() {
        let generator = Arc::new(ScriptedGenerator::new([
            JOB_REPLY,
            "You should learn Airflow.",
            LETTER_REPLY,
        ]));
        let report = pipeline(generator).run(input(false)).await.unwrap();

        match &report.suggestions {
            StageOutcome::Unparseable { raw, message } => {
                assert_eq!(raw, "You should learn Airflow.");
                assert!(message.contains("Automatic extraction failed"));
            }
            other => panic!("expected Unparseable, got {other:?}"),
        }
        assert!(report.suggestions.record().is_none());
        assert!(!report.cover_letter.as_str().is_empty());
    }

    #[tokio::test]
    async fn test_repaired_job_details_report_fields() {
        let generator = Arc::new(ScriptedGenerator::new([
            "Sure, here is the JSON: {\"job_title\": \"Dev\"} Hope that helps!",
        ]));
        let outcome = pipeline(generator)
            .extract_job_details("Dev role")
            .await
            .unwrap();

        match outcome {
            StageOutcome::Extracted {
                record,
                tier,
                repaired_fields,
            } => {
                assert_eq!(record.job_title, "Dev");
                assert_eq!(tier, ExtractionTier::Repaired);
                assert!(repaired_fields.contains(&"experience_required"));
            }
            other => panic!("expected Extracted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_cover_letter_is_an_error() {
        let generator = Arc::new(ScriptedGenerator::new(["   \n"]));
        let err = pipeline(generator)
            .write_cover_letter(&JobDetails::default(), RESUME_TEXT)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_service_failure_propagates() {
        let generator = Arc::new(
            ScriptedGenerator::new(Vec::<String>::new())
                .push_error(LlmError::ServiceUnavailable("connection refused".into())),
        );
        let err = pipeline(generator).run(input(false)).await.unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_generation_times_out() {
        let pipeline = AnalysisPipeline::new(
            Arc::new(StalledGenerator(Duration::from_secs(3600))),
            Duration::from_secs(10),
        );
        let err = pipeline.extract_job_details("anything").await.unwrap_err();
        assert!(matches!(err, AppError::GenerationTimeout { secs: 10 }));
    }

    #[test]
    fn test_stage_outcome_serializes_with_status_tag() {
        let outcome: StageOutcome<JobDetails> = StageOutcome::Unparseable {
            raw: "nope".to_string(),
            message: UNPARSEABLE_MESSAGE.to_string(),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "unparseable");
        assert_eq!(value["raw"], "nope");
    }
}
