//! OCR.space response types.
//!
//! The service is loose about JSON types: `ProcessingTimeInMilliseconds`
//! and `TextOrientation` arrive as numeric strings, `ErrorMessage` is a
//! string on some errors and an array on others. The deserializers below
//! accept every shape seen in practice and drop anything else to `None`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Top-level parse response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OcrApiResponse {
    #[serde(rename = "OCRExitCode", default, deserialize_with = "lenient_i64")]
    pub ocr_exit_code: Option<i64>,
    #[serde(rename = "IsErroredOnProcessing", default)]
    pub is_errored_on_processing: Option<bool>,
    #[serde(rename = "ProcessingTimeInMilliseconds", default, deserialize_with = "lenient_i64")]
    pub processing_time_ms: Option<i64>,
    #[serde(rename = "ErrorMessage", default, deserialize_with = "string_or_seq")]
    pub error_messages: Vec<String>,
    #[serde(rename = "ParsedResults", default)]
    pub parsed_results: Option<Vec<ParsedResult>>,
}

/// One entry per submitted page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ParsedResult {
    #[serde(rename = "ParsedText", default)]
    pub parsed_text: Option<String>,
    #[serde(rename = "FileParseExitCode", default, deserialize_with = "lenient_i64")]
    pub file_parse_exit_code: Option<i64>,
    #[serde(rename = "TextOrientation", default, deserialize_with = "lenient_i64")]
    pub text_orientation: Option<i64>,
    #[serde(rename = "ErrorMessage", default, deserialize_with = "lenient_string")]
    pub error_message: Option<String>,
    #[serde(rename = "ErrorDetails", default, deserialize_with = "lenient_string")]
    pub error_details: Option<String>,
}

/// What the OCR client hands to the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub body: OcrApiResponse,
    pub status: u16,
    /// Wall-clock time from request start to full body received.
    pub response_time_ms: u64,
}

impl OcrApiResponse {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            Some(joined)
        }
        _ => None,
    })
}

fn string_or_seq<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typical_success_body() {
        let body = r#"{
            "ParsedResults": [{
                "TextOverlay": {"Lines": [], "HasOverlay": false, "Message": "Text overlay is not provided as it is not requested"},
                "TextOrientation": "0",
                "FileParseExitCode": 1,
                "ParsedText": "Hello World\r\n",
                "ErrorMessage": "",
                "ErrorDetails": ""
            }],
            "OCRExitCode": 1,
            "IsErroredOnProcessing": false,
            "ProcessingTimeInMilliseconds": "343",
            "SearchablePDFURL": "Searchable PDF not generated as it was not requested."
        }"#;
        let resp = OcrApiResponse::from_json(body).unwrap();
        assert_eq!(resp.ocr_exit_code, Some(1));
        assert_eq!(resp.is_errored_on_processing, Some(false));
        assert_eq!(resp.processing_time_ms, Some(343));
        assert!(resp.error_messages.is_empty());
        let first = &resp.parsed_results.unwrap()[0];
        assert_eq!(first.parsed_text.as_deref(), Some("Hello World\r\n"));
        assert_eq!(first.text_orientation, Some(0));
        assert_eq!(first.file_parse_exit_code, Some(1));
        assert_eq!(first.error_message.as_deref(), Some(""));
    }

    #[test]
    fn parses_error_body_with_message_array() {
        let body = r#"{
            "OCRExitCode": 99,
            "IsErroredOnProcessing": true,
            "ErrorMessage": ["Unable to recognize the file type", "E216:Unable to detect the file extension"],
            "ProcessingTimeInMilliseconds": "0"
        }"#;
        let resp = OcrApiResponse::from_json(body).unwrap();
        assert_eq!(resp.ocr_exit_code, Some(99));
        assert_eq!(resp.error_messages.len(), 2);
        assert!(resp.parsed_results.is_none());
    }

    #[test]
    fn error_message_as_plain_string() {
        let resp = OcrApiResponse::from_json(r#"{"ErrorMessage": "Timed out waiting for results"}"#).unwrap();
        assert_eq!(resp.error_messages, vec!["Timed out waiting for results".to_string()]);
    }

    #[test]
    fn odd_types_degrade_to_none() {
        let resp = OcrApiResponse::from_json(
            r#"{"OCRExitCode": "abc", "ProcessingTimeInMilliseconds": 12.6, "ParsedResults": [{"TextOrientation": null}]}"#,
        )
        .unwrap();
        assert_eq!(resp.ocr_exit_code, None);
        assert_eq!(resp.processing_time_ms, Some(13));
        assert_eq!(resp.parsed_results.unwrap()[0].text_orientation, None);
    }

    #[test]
    fn empty_object_is_valid() {
        let resp = OcrApiResponse::from_json("{}").unwrap();
        assert_eq!(resp, OcrApiResponse::default());
    }
}
