//! Result types returned by the pipeline.
//!
//! Everything here is `serde`-serialisable because the primary consumer is
//! an HTTP layer that forwards the result as JSON. Field names and the exact
//! string values of the enums (`EGN`/`EIK`, `person`/`company`,
//! `Valid`/`Invalid`) are part of the wire contract and must not change
//! without coordinating with downstream consumers.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Entity kind as reported by the extraction service.
///
/// The service is instructed to emit lowercase values but models
/// occasionally capitalise; the aliases absorb that without a custom
/// deserializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    #[serde(alias = "Person", alias = "PERSON")]
    Person,
    #[serde(alias = "Company", alias = "COMPANY")]
    Company,
    /// Anything else the model invents. Kept rather than rejected so one
    /// odd entity does not discard the whole response.
    #[serde(other)]
    Other,
}

/// National identifier scheme attached to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentificationType {
    /// Bulgarian unified civil number (persons).
    #[serde(rename = "EGN")]
    Egn,
    /// Bulgarian company identification code / BULSTAT.
    #[serde(rename = "EIK")]
    Eik,
    #[serde(other, rename = "OTHER")]
    Other,
}

/// Checksum verdict for an entity's identifier.
///
/// Always recomputed locally; the value the service self-reports is
/// discarded (trust boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validity {
    Valid,
    Invalid,
}

impl Validity {
    pub fn from_bool(valid: bool) -> Self {
        if valid {
            Validity::Valid
        } else {
            Validity::Invalid
        }
    }
}

fn default_validity() -> Validity {
    Validity::Invalid
}

/// One extracted person or company.
///
/// The extraction service only emits an entity when both the name and the
/// identification number were present in the source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub identification_number: String,
    pub identification_type: IdentificationType,
    /// Self-reported clarity of the OCR'd name/number, 0.0 (unreadable)
    /// to 1.0 (perfectly clear).
    #[serde(default)]
    pub confidence: f64,
    /// Recomputed checksum verdict. See [`crate::pipeline::extract`].
    #[serde(rename = "ValidIdentificator", default = "default_validity")]
    pub valid_identificator: Validity,
}

/// Terminal status of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Text extracted and entities returned.
    Completed,
    /// Degraded success: the run finished but produced nothing useful
    /// (dev-mode empty-text fallback).
    CompletedWithWarnings,
    /// The run ended in one of the error exits.
    Failed,
}

/// Final result of processing one document.
///
/// Assembled once at the end of the run and immutable afterwards. The
/// orchestrator's contract is to always produce one of these — success or
/// failure — rather than an uncaught fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub status: PipelineStatus,
    pub entities: Vec<Entity>,
    /// Service-reported quality of the extraction as a whole, 0.0–1.0.
    pub overall_extraction_quality: f64,
    /// Length in characters of the concatenated OCR text, when text
    /// extraction got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
    /// First ~200 characters of the OCR text, newlines flattened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_preview: Option<String>,
    /// Wall-clock processing time in seconds.
    pub processing_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineResult {
    /// Successful run with entities.
    pub fn completed(
        entities: Vec<Entity>,
        quality: f64,
        text_length: usize,
        text_preview: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            status: PipelineStatus::Completed,
            entities,
            overall_extraction_quality: quality,
            text_length: Some(text_length),
            text_preview: Some(text_preview),
            processing_time: elapsed.as_secs_f64(),
            warning: None,
            error: None,
        }
    }

    /// Dev-mode degraded success when OCR recovered no text.
    pub fn degraded(warning: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            status: PipelineStatus::CompletedWithWarnings,
            entities: Vec::new(),
            overall_extraction_quality: 0.0,
            text_length: Some(0),
            text_preview: None,
            processing_time: elapsed.as_secs_f64(),
            warning: Some(warning.into()),
            error: None,
        }
    }

    /// Failure result from a fatal error.
    pub fn failure(error: &PipelineError, elapsed: Duration) -> Self {
        Self {
            status: PipelineStatus::Failed,
            entities: Vec::new(),
            overall_extraction_quality: 0.0,
            text_length: None,
            text_preview: None,
            processing_time: elapsed.as_secs_f64(),
            warning: None,
            error: Some(error.to_string()),
        }
    }

    /// Failure result for the partial-success branch: text extraction worked
    /// but the entity-extraction service did not. Text stats are preserved so
    /// callers can see how far the run got.
    pub fn extraction_failure(
        error: &PipelineError,
        text_length: usize,
        text_preview: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            status: PipelineStatus::Failed,
            entities: Vec::new(),
            overall_extraction_quality: 0.0,
            text_length: Some(text_length),
            text_preview: Some(text_preview),
            processing_time: elapsed.as_secs_f64(),
            warning: None,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serialises_snake_case() {
        let s = serde_json::to_string(&PipelineStatus::CompletedWithWarnings).unwrap();
        assert_eq!(s, "\"completed_with_warnings\"");
    }

    #[test]
    fn entity_wire_format() {
        let e = Entity {
            name: "Иван Иванов".into(),
            entity_type: EntityType::Person,
            identification_number: "8406141237".into(),
            identification_type: IdentificationType::Egn,
            confidence: 0.9,
            valid_identificator: Validity::Valid,
        };
        let v: serde_json::Value = serde_json::to_value(&e).unwrap();
        assert_eq!(v["type"], "person");
        assert_eq!(v["identification_type"], "EGN");
        assert_eq!(v["ValidIdentificator"], "Valid");
    }

    #[test]
    fn entity_tolerates_capitalised_type_and_missing_validity() {
        let e: Entity = serde_json::from_value(serde_json::json!({
            "name": "Acme OOD",
            "type": "Company",
            "identification_number": "123456786",
            "identification_type": "EIK",
            "confidence": 0.7
        }))
        .unwrap();
        assert_eq!(e.entity_type, EntityType::Company);
        assert_eq!(e.valid_identificator, Validity::Invalid);
    }

    #[test]
    fn unknown_identification_type_maps_to_other() {
        let e: Entity = serde_json::from_value(serde_json::json!({
            "name": "Foreign Corp",
            "type": "company",
            "identification_number": "DE12345",
            "identification_type": "VAT",
            "confidence": 0.5,
            "ValidIdentificator": "Invalid"
        }))
        .unwrap();
        assert_eq!(e.identification_type, IdentificationType::Other);
    }

    #[test]
    fn failure_result_omits_text_fields() {
        let r = PipelineResult::failure(
            &PipelineError::NoTextExtracted,
            Duration::from_millis(1500),
        );
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["status"], "failed");
        assert!(v.get("text_length").is_none());
        assert!((r.processing_time - 1.5).abs() < 1e-9);
    }
}
