//! Moment extraction: prompt, call, parse, with retries and model fallback.

use std::sync::Arc;

use tracing::{info, warn};

use momentcut_models::{CandidateMoment, Transcript, DEFAULT_MIN_CLIP_LENGTH};

use crate::cache::MomentCache;
use crate::client::MomentModel;
use crate::error::{AiError, ExtractionError};
use crate::metrics;
use crate::parse::parse_moments;
use crate::prompt::build_prompt;
use crate::retry::{retry_async, RetryConfig, RetryResult};

/// Asks a [`MomentModel`] for the strongest moments of a transcript.
pub struct MomentExtractor {
    model: Arc<dyn MomentModel>,
    retry: RetryConfig,
    min_clip_length: f64,
    cache: Option<MomentCache>,
}

impl MomentExtractor {
    pub fn new(model: Arc<dyn MomentModel>) -> Self {
        Self {
            model,
            retry: RetryConfig::new("moment_extraction"),
            min_clip_length: DEFAULT_MIN_CLIP_LENGTH,
            cache: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Minimum clip length quoted to the model.
    pub fn with_min_clip_length(mut self, min_clip_length: f64) -> Self {
        self.min_clip_length = min_clip_length;
        self
    }

    pub fn with_cache(mut self, cache: MomentCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Extract up to `target_count` candidates, ranked strongest first.
    ///
    /// One prompt is sent per attempt. Transient failures are retried with
    /// backoff; once a model's budget is spent the next model is tried.
    pub async fn extract(
        &self,
        transcript: &Transcript,
        target_count: usize,
    ) -> Result<Vec<CandidateMoment>, ExtractionError> {
        if transcript.plain_text().trim().is_empty() {
            return Err(ExtractionError::EmptyTranscript);
        }
        let target_count = target_count.max(1);
        let models = self.model.models();
        let prompt = build_prompt(transcript, target_count, self.min_clip_length);

        let cache_key = self
            .cache
            .as_ref()
            .map(|_| MomentCache::key(&prompt, &models));
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(moments) = cache.load(key).await {
                metrics::record_cache_hit();
                info!(count = moments.len(), "Using cached moments");
                return Ok(moments);
            }
        }

        let mut total_attempts = 0u32;
        let mut last_error = AiError::Config("no models configured".to_string());

        for name in &models {
            let model = self.model.as_ref();
            let name = name.as_str();
            let prompt = prompt.as_str();

            let result = retry_async(&self.retry, move || async move {
                let outcome = match model.generate(name, prompt).await {
                    Ok(raw) => parse_moments(&raw),
                    Err(e) => Err(e),
                };
                metrics::record_ai_call(name, if outcome.is_ok() { "ok" } else { "error" });
                outcome
            })
            .await;

            match result {
                RetryResult::Success(mut moments) => {
                    if moments.is_empty() {
                        warn!(model = name, "Model returned no candidate moments");
                        return Err(ExtractionError::NoCandidates);
                    }
                    moments.truncate(target_count);
                    info!(model = name, count = moments.len(), "Extracted candidate moments");

                    if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
                        cache.store(key, &moments).await;
                    }
                    return Ok(moments);
                }
                RetryResult::Failed { error, attempts } => {
                    total_attempts += attempts;
                    warn!(model = name, attempts, error = %error, "Model failed, trying next");
                    let fatal = matches!(error, AiError::Config(_));
                    last_error = error;
                    if fatal {
                        break;
                    }
                }
            }
        }

        Err(match last_error {
            AiError::Parse(detail) => ExtractionError::Unparsable {
                attempts: total_attempts,
                detail,
            },
            source => ExtractionError::ServiceFailed {
                attempts: total_attempts,
                source,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use momentcut_models::{TimingSource, TranscriptSpan};

    use crate::error::AiResult;

    /// Replays scripted responses and records which models were called.
    struct ScriptedModel {
        models: Vec<String>,
        responses: Mutex<VecDeque<AiResult<String>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(models: &[&str], responses: Vec<AiResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                models: models.iter().map(|m| m.to_string()).collect(),
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MomentModel for ScriptedModel {
        fn models(&self) -> Vec<String> {
            self.models.clone()
        }

        async fn generate(&self, model: &str, _prompt: &str) -> AiResult<String> {
            self.calls.lock().unwrap().push(model.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AiError::Timeout))
        }
    }

    fn transcript() -> Transcript {
        Transcript::new(
            vec![
                TranscriptSpan::new("Nobody tells you this.", 0.0, 10.0),
                TranscriptSpan::new("And then it all fell apart.", 10.0, 30.0),
            ],
            Some(60.0),
            TimingSource::Native,
        )
        .unwrap()
    }

    fn extractor(model: Arc<ScriptedModel>) -> MomentExtractor {
        MomentExtractor::new(model)
            .with_retry(RetryConfig::new("test").with_base_delay(Duration::from_millis(1)))
    }

    const THREE: &str = r#"{"moments": [
        {"title": "a", "start_time": 0, "end_time": 10},
        {"title": "b", "start_time": 10, "end_time": 20},
        {"title": "c", "start_time": 20, "end_time": 30}
    ]}"#;

    #[tokio::test]
    async fn test_truncates_to_target_count() {
        let model = ScriptedModel::new(&["m1"], vec![Ok(THREE.to_string())]);
        let moments = extractor(model).extract(&transcript(), 2).await.unwrap();
        assert_eq!(moments.len(), 2);
        assert_eq!(moments[0].title, "a");
        assert_eq!(moments[1].rank, 1);
    }

    #[tokio::test]
    async fn test_retries_unparsable_output() {
        let model = ScriptedModel::new(
            &["m1"],
            vec![Ok("not json at all".to_string()), Ok(THREE.to_string())],
        );
        let moments = extractor(model.clone()).extract(&transcript(), 5).await.unwrap();
        assert_eq!(moments.len(), 3);
        assert_eq!(model.calls(), vec!["m1", "m1"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_next_model() {
        let model = ScriptedModel::new(
            &["m1", "m2"],
            vec![
                Err(AiError::Http { status: 503, body: String::new() }),
                Err(AiError::Http { status: 503, body: String::new() }),
                Err(AiError::Http { status: 503, body: String::new() }),
                Ok(THREE.to_string()),
            ],
        );
        let moments = extractor(model.clone()).extract(&transcript(), 5).await.unwrap();
        assert_eq!(moments.len(), 3);
        assert_eq!(model.calls(), vec!["m1", "m1", "m1", "m2"]);
    }

    #[tokio::test]
    async fn test_unparsable_after_all_attempts() {
        let model = ScriptedModel::new(
            &["m1"],
            vec![Ok("nope".into()), Ok("still nope".into()), Ok("never".into())],
        );
        let err = extractor(model).extract(&transcript(), 5).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Unparsable { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_service_failure_reports_attempts() {
        let model = ScriptedModel::new(
            &["m1"],
            vec![Err(AiError::Http { status: 401, body: "bad key".into() })],
        );
        let err = extractor(model).extract(&transcript(), 5).await.unwrap_err();
        match err {
            ExtractionError::ServiceFailed { attempts, source } => {
                assert_eq!(attempts, 1);
                assert!(matches!(source, AiError::Http { status: 401, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_list_is_no_candidates() {
        let model = ScriptedModel::new(&["m1", "m2"], vec![Ok(r#"{"moments": []}"#.into())]);
        let err = extractor(model.clone()).extract(&transcript(), 5).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoCandidates));
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_skips_second_call() {
        let dir = tempfile::TempDir::new().unwrap();
        let model = ScriptedModel::new(&["m1"], vec![Ok(THREE.to_string())]);
        let extractor = extractor(model.clone()).with_cache(MomentCache::new(dir.path()));

        let first = extractor.extract(&transcript(), 5).await.unwrap();
        let second = extractor.extract(&transcript(), 5).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(model.calls().len(), 1);
    }
}
