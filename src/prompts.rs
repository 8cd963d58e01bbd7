//! Instruction prompt for the structured-extraction service.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the JSON schema the service is asked to
//!    produce must match the `serde` types in [`crate::output`]; keeping the
//!    contract in one constant makes drift easy to spot in review.
//!
//! 2. **Testability** — unit tests can assert schema field names appear in
//!    the prompt without calling a real service.

/// System prompt sent with the full OCR text on every extraction call.
///
/// The service must only return entities for which both the name and the
/// identification number appear in the text. `ValidIdentificator` is part of
/// the requested schema for shape-compatibility, but the pipeline discards
/// the self-reported value and recomputes it locally.
pub const ENTITY_EXTRACTION_PROMPT: &str = r#"You are a data extraction assistant. Extract all people and companies mentioned in the document, along with their identification numbers (EGN for individuals, EIK for companies).

For each extraction, include a confidence score from 0.0 to 1.0 that represents how confident you are in the accuracy of the extraction. Consider the following when determining confidence:
- For names: Is the full name clearly visible and properly formatted?
- For identification numbers: Are all digits clearly visible and does the format match expected patterns?
- For entity type: Is it clear whether this is a person or a company?

Use these confidence levels:
- 1.0: Perfect clarity with no ambiguity
- 0.8-0.9: Very clear with minimal ambiguity
- 0.6-0.7: Mostly clear but with some uncertainty
- 0.4-0.5: Significant uncertainty but probably correct
- 0.1-0.3: Highly uncertain, likely contains errors
- 0.0: Cannot determine at all

Return the results in JSON format with the following structure:
{
    "entities": [
        {
            "name": "Full Name",
            "type": "person/company",
            "identification_number": "number",
            "identification_type": "EGN/EIK",
            "confidence": 0.8,
            "ValidIdentificator": "Valid/Invalid"
        }
    ],
    "overall_extraction_quality": 0.8
}

"overall_extraction_quality" is a single 0.0-1.0 score for how completely and
cleanly the document as a whole could be extracted.

Only include entities where both name and identification number are mentioned - do not include entities which only have names specified.
The document is in Bulgarian language."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_schema_field() {
        for field in [
            "entities",
            "name",
            "type",
            "identification_number",
            "identification_type",
            "confidence",
            "ValidIdentificator",
            "overall_extraction_quality",
        ] {
            assert!(
                ENTITY_EXTRACTION_PROMPT.contains(field),
                "prompt is missing schema field '{field}'"
            );
        }
    }

    #[test]
    fn prompt_requires_both_name_and_number() {
        assert!(ENTITY_EXTRACTION_PROMPT.contains("both name and identification number"));
    }
}
