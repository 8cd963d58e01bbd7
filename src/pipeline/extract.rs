//! Entity extraction through the completion service, with retry and the
//! checksum trust boundary.
//!
//! Two policies live here and nowhere else:
//!
//! * **Retry budget** — `max_retries` total attempts against the provider,
//!   with exponential backoff between them (`retry_delay_secs * 2^attempt`).
//!   A response that is not valid JSON for the expected schema burns an
//!   attempt exactly like a transport failure; retrying a model that
//!   answered garbage often succeeds.
//! * **Trust boundary** — the service self-reports `ValidIdentificator`,
//!   and that value is discarded. Every entity's checksum verdict is
//!   recomputed locally from the identifier digits before the result leaves
//!   this module. A service that lies about validity cannot reach callers.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::output::{Entity, EntityType, IdentificationType, Validity};
use crate::prompts::ENTITY_EXTRACTION_PROMPT;
use crate::provider::CompletionProvider;
use crate::validate::{validate_company_id, validate_person_id};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Parsed extraction-service response.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityExtraction {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub overall_extraction_quality: f64,
}

/// Run the full extraction step: call the service with retries, then
/// recompute every entity's identifier validity.
pub async fn extract_entities(
    provider: &dyn CompletionProvider,
    text: &str,
    config: &PipelineConfig,
) -> Result<EntityExtraction, PipelineError> {
    let mut extraction = call_with_retries(provider, text, config).await?;

    for entity in &mut extraction.entities {
        entity.valid_identificator = recompute_validity(entity);
    }

    info!(
        entities = extraction.entities.len(),
        quality = extraction.overall_extraction_quality,
        "entity extraction complete"
    );
    Ok(extraction)
}

/// Drive the provider until it yields a parseable response or the attempt
/// budget runs out.
async fn call_with_retries(
    provider: &dyn CompletionProvider,
    text: &str,
    config: &PipelineConfig,
) -> Result<EntityExtraction, PipelineError> {
    let mut last_detail = String::new();

    for attempt in 0..config.max_retries {
        debug!(
            attempt = attempt + 1,
            of = config.max_retries,
            "extraction attempt"
        );

        match provider.complete_json(ENTITY_EXTRACTION_PROMPT, text).await {
            Ok(value) => match serde_json::from_value::<EntityExtraction>(value) {
                Ok(extraction) => return Ok(extraction),
                Err(e) => {
                    last_detail = format!("response did not match schema: {e}");
                    warn!(attempt = attempt + 1, "{last_detail}");
                }
            },
            Err(e) => {
                last_detail = e.to_string();
                warn!(attempt = attempt + 1, "extraction call failed: {e}");
            }
        }

        // No sleep after the final attempt; the caller gets the error
        // immediately once the budget is spent.
        if attempt + 1 < config.max_retries {
            let delay = config.retry_delay_secs * 2u64.pow(attempt);
            info!("retrying extraction in {delay} s");
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }
    }

    Err(PipelineError::ServiceCallFailed {
        attempts: config.max_retries,
        detail: last_detail,
    })
}

/// Local checksum verdict for one entity.
///
/// Persons with an EGN and companies with an EIK get the real checksum;
/// every other (type, scheme) combination has no checksum to run, so it
/// passes through as `Valid`.
fn recompute_validity(entity: &Entity) -> Validity {
    match (entity.entity_type, entity.identification_type) {
        (EntityType::Person, IdentificationType::Egn) => {
            Validity::from_bool(validate_person_id(&entity.identification_number))
        }
        (EntityType::Company, IdentificationType::Eik) => {
            Validity::from_bool(validate_company_id(&entity.identification_number))
        }
        _ => Validity::Valid,
    }
}
