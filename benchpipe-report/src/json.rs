//! JSON Output

use crate::report::ReportBenchmarkResult;

/// Serialize a result sequence into the prettified JSON report payload.
///
/// Entry order is preserved (insertion order = execution order).
pub fn generate_json_report(
    results: &[ReportBenchmarkResult],
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(results)
}

/// Parse a report payload back into its result sequence.
pub fn parse_json_report(text: &str) -> Result<Vec<ReportBenchmarkResult>, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn report_round_trips_in_order() {
        let mut parameters = BTreeMap::new();
        parameters.insert("size".to_string(), "1000".to_string());

        let results = vec![
            ReportBenchmarkResult::new("text.sort", 1234.5).with_parameters(parameters),
            ReportBenchmarkResult {
                benchmark: "text.hash".to_string(),
                score: 98.7,
                error_margin: Some(1.2),
                parameters: BTreeMap::new(),
            },
        ];

        let json = generate_json_report(&results).unwrap();
        let parsed = parse_json_report(&json).unwrap();
        assert_eq!(parsed, results);
        // Execution order survives serialization.
        assert_eq!(parsed[0].benchmark, "text.sort");
        assert_eq!(parsed[1].benchmark, "text.hash");
    }

    #[test]
    fn absent_error_margin_is_omitted() {
        let json = generate_json_report(&[ReportBenchmarkResult::new("b", 1.0)]).unwrap();
        assert!(!json.contains("error_margin"));
    }
}
