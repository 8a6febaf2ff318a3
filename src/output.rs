use crate::AnalysisResult;

/// Render the analysis as plain text; errors are prefixed with `error:`
pub fn render_text(result: &AnalysisResult) -> String {
    match result {
        AnalysisResult::Text(text) => text.trim_end().to_string(),
        AnalysisResult::Error(msg) => format!("error: {msg}"),
    }
}

/// Render the analysis as `{"result": ...}` or `{"error": ...}`
pub fn render_json(result: &AnalysisResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text() {
        let result = AnalysisResult::Text("Line one\nLine two\n\n".to_string());
        assert_eq!(render_text(&result), "Line one\nLine two");
    }

    #[test]
    fn test_render_text_error() {
        let result = AnalysisResult::Error("video file processing failed".to_string());
        assert_eq!(render_text(&result), "error: video file processing failed");
    }

    #[test]
    fn test_render_json() {
        let result = AnalysisResult::Text("A \"quoted\" summary".to_string());
        let parsed: serde_json::Value = serde_json::from_str(&render_json(&result)).unwrap();
        assert_eq!(parsed, serde_json::json!({ "result": "A \"quoted\" summary" }));
    }
}
