use crate::{
    backend::GenerationBackend,
    config::SessionConfig,
    error::Result,
    logger,
    models::{GenerationInput, GenerationRequest, Outcome, StatusCode},
};
use std::io::{self, Write};
use std::sync::Arc;
use uuid::Uuid;

/// Outcomes of one image-then-variations run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub image: Outcome,
    pub variations: Outcome,
}

impl SessionReport {
    pub fn all_succeeded(&self) -> bool {
        self.image.is_success() && self.variations.is_success()
    }
}

#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn GenerationBackend> {
        &self.backend
    }

    pub async fn generate_image(
        &self,
        prompt: &str,
        output_prefix: &str,
        credential: &str,
        batch_size: u32,
    ) -> Result<StatusCode> {
        self.backend
            .generate_image(prompt, output_prefix, credential, batch_size)
            .await
    }

    pub async fn generate_variations(
        &self,
        source_image_path: &str,
        output_prefix: &str,
        credential: &str,
        batch_size: u32,
    ) -> Result<StatusCode> {
        self.backend
            .generate_variations(source_image_path, output_prefix, credential, batch_size)
            .await
    }

    /// Validates the request, then forwards it to the matching operation.
    pub async fn execute(&self, request: &GenerationRequest) -> Result<StatusCode> {
        request.validate()?;

        let operation = request.operation();
        let request_id = Uuid::new_v4();
        log::debug!(
            "[req:{}] {} -> {} (batch size {}, credential {})",
            request_id,
            operation.label(),
            request.output_prefix,
            request.batch_size,
            logger::redact(&request.credential)
        );

        let _timer = logger::timer(&format!("{} [req:{}]", operation.label(), request_id));
        let status = match &request.input {
            GenerationInput::Prompt(prompt) => {
                self.generate_image(
                    prompt,
                    &request.output_prefix,
                    &request.credential,
                    request.batch_size,
                )
                .await
            }
            GenerationInput::SourceImage(path) => {
                self.generate_variations(
                    path,
                    &request.output_prefix,
                    &request.credential,
                    request.batch_size,
                )
                .await
            }
        };

        match &status {
            Ok(code) => log::debug!("[req:{}] backend reported {:?}", request_id, code.outcome()),
            Err(e) => log::error!("[req:{}] {} could not run: {}", request_id, operation.label(), e),
        }
        status
    }

    /// Runs the request and writes one success/failure line to `out`.
    ///
    /// A backend error counts as a failure; it is logged, not returned.
    pub async fn run_and_report<W: Write>(
        &self,
        request: &GenerationRequest,
        out: &mut W,
    ) -> io::Result<Outcome> {
        let outcome = match self.execute(request).await {
            Ok(status) => status.outcome(),
            Err(e) => {
                log::warn!("{} failed: {}", request.operation().label(), e);
                Outcome::Failure
            }
        };
        writeln!(out, "{}", request.operation().report_line(outcome))?;
        Ok(outcome)
    }

    /// Image generation, then variations of `session.source_image_path`.
    /// The second call runs whatever the first one returned.
    pub async fn run_session<W: Write>(
        &self,
        session: &SessionConfig,
        credential: &str,
        out: &mut W,
    ) -> io::Result<SessionReport> {
        let image_request = GenerationRequest::image(
            session.prompt.as_str(),
            session.output_prefix.as_str(),
            credential,
            session.batch_size,
        );
        let image = self.run_and_report(&image_request, out).await?;

        let variations_request = GenerationRequest::variations(
            session.source_image_path.as_str(),
            session.variation_output_prefix.as_str(),
            credential,
            session.batch_size,
        );
        let variations = self.run_and_report(&variations_request, out).await?;

        Ok(SessionReport { image, variations })
    }
}
