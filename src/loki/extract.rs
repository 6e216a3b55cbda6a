use super::{LogLine, QueryRangeResponse};

/// Flatten a grouped `query_range` response into a linear sequence of
/// log lines, preserving backend-supplied order. Entries whose timestamp
/// does not parse are skipped, never fatal; an absent `result` array
/// yields an empty sequence.
pub fn extract_lines(response: &QueryRangeResponse) -> Vec<LogLine> {
    let mut out = Vec::new();
    for stream in &response.data.result {
        for (ts, text) in &stream.values {
            if let Ok(timestamp_ns) = ts.parse::<i64>() {
                out.push(LogLine {
                    timestamp_ns,
                    text: text.clone(),
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loki::{LogStream, QueryData};

    fn response(streams: Vec<LogStream>) -> QueryRangeResponse {
        QueryRangeResponse {
            data: QueryData { result: streams },
        }
    }

    #[test]
    fn test_empty_response_yields_no_lines() {
        assert!(extract_lines(&QueryRangeResponse::default()).is_empty());
        assert!(extract_lines(&response(vec![])).is_empty());
    }

    #[test]
    fn test_flattens_streams_in_order() {
        let resp = response(vec![
            LogStream {
                values: vec![
                    ("1700000000000000002".into(), "b".into()),
                    ("1700000000000000001".into(), "a".into()),
                ],
            },
            LogStream {
                values: vec![("1700000000000000003".into(), "c".into())],
            },
        ]);

        let lines = extract_lines(&resp);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "b");
        assert_eq!(lines[1].text, "a");
        assert_eq!(lines[2].text, "c");
        assert_eq!(lines[0].timestamp_ns, 1_700_000_000_000_000_002);
    }

    #[test]
    fn test_malformed_timestamp_skipped() {
        let resp = response(vec![LogStream {
            values: vec![
                ("not-a-number".into(), "dropped".into()),
                ("1700000000000000000".into(), "kept".into()),
            ],
        }]);

        let lines = extract_lines(&resp);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "kept");
    }

    #[test]
    fn test_absent_result_deserializes_empty() {
        let resp: QueryRangeResponse = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(extract_lines(&resp).is_empty());

        let resp: QueryRangeResponse = serde_json::from_str(r#"{"data":{}}"#).unwrap();
        assert!(extract_lines(&resp).is_empty());
    }
}
