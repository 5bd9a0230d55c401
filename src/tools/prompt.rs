use crate::core::types::Record;

/// Records requested per extraction call, and the offset step between calls.
pub const BATCH_SIZE: usize = 20;

/// Key under which schema-constrained replies carry the batch.
pub const STRUCTURED_ARRAY_KEY: &str = "resorts";

/// What shape the reply is asked to take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputContract {
    /// Free text that must be nothing but a JSON array.
    JsonArray,
    /// A JSON object `{"resorts": [...]}` enforced by the service's response schema.
    Structured,
}

/// Everything the instruction depends on for one batch.
pub struct ExtractionRequest<'a> {
    pub criteria: &'a str,
    pub page_offset: usize,
    pub seen_names: &'a [String],
    pub html: &'a str,
    pub contract: OutputContract,
}

const EXAMPLE_RECORD: &str = r#"{
        "Resort Name": "Example Resort 1",
        "Country": "Spain",
        "Description": "A beautiful resort...",
        "Star Rating": "4",
        "Price": "$200/night",
        "Main Picture": "https://example.com/image1.jpg"
    }"#;

/// Builds the instruction for one batch, page HTML included.
pub fn build_extraction_prompt(request: &ExtractionRequest<'_>) -> String {
    let fields = Record::FIELD_NAMES
        .iter()
        .map(|name| {
            if *name == Record::PICTURE_FIELD {
                format!("- {} (the full URL to the image)", name)
            } else {
                format!("- {}", name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let seen = if request.seen_names.is_empty() {
        "(none yet)".to_string()
    } else {
        request.seen_names.join(", ")
    };

    let (format_rule, example) = match request.contract {
        OutputContract::JsonArray => (
            "Return the data as a single, valid JSON array of objects. Do not include any text or explanations outside of the JSON array.".to_string(),
            format!("[\n    {}\n]", EXAMPLE_RECORD),
        ),
        OutputContract::Structured => (
            format!(
                "Return the data as a single, valid JSON array of objects under the key \"{}\" of one JSON object. Do not include any text or explanations outside of the JSON.",
                STRUCTURED_ARRAY_KEY
            ),
            format!(
                "{{\n  \"{}\": [\n    {}\n  ]\n}}",
                STRUCTURED_ARRAY_KEY, EXAMPLE_RECORD
            ),
        ),
    };

    format!(
        "Analyze the following HTML content and extract data for holiday resorts based on these criteria: '{criteria}'.

Extract the following fields for each resort:
{fields}

Follow these rules:
1. Identify the top {batch} resorts from the HTML that match the criteria, starting from result number {offset}.
2. Do NOT include any resorts from this list of already extracted names: {seen}.
3. If a field (like 'Price' or 'Star Rating') is not found for a resort, set its value to \"N/A\".
4. {format_rule}

Example of the exact output format expected:
{example}

HTML Content to analyze is provided below:
---
{html}",
        criteria = request.criteria,
        fields = fields,
        batch = BATCH_SIZE,
        offset = request.page_offset,
        seen = seen,
        format_rule = format_rule,
        example = example,
        html = request.html,
    )
}

/// JSON schema sent as `response_format` when the structured contract is used.
pub fn batch_response_schema() -> serde_json::Value {
    let properties: serde_json::Map<String, serde_json::Value> = Record::FIELD_NAMES
        .iter()
        .map(|name| (name.to_string(), serde_json::json!({ "type": "string" })))
        .collect();

    serde_json::json!({
        "type": "object",
        "properties": {
            STRUCTURED_ARRAY_KEY: {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": properties,
                    "required": Record::FIELD_NAMES,
                }
            }
        },
        "required": [STRUCTURED_ARRAY_KEY],
    })
}
