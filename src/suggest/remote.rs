use super::{SuggestError, Suggestion};
use crate::domain::SphereSet;
use serde::Serialize;
use std::time::Duration;

/// Per-sphere figures sent to the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SphereSummary {
    pub key: String,
    pub name: String,
    pub progress: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub spheres: Vec<SphereSummary>,
    pub harmony_score: u8,
}

/// Request body for the suggestion endpoint.
///
/// Built from spheres alone: journal and task text never leave the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionRequest {
    pub summary: Summary,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl SuggestionRequest {
    pub fn new(spheres: &SphereSet, timestamp: i64) -> Self {
        Self {
            summary: Summary {
                spheres: spheres
                    .iter()
                    .map(|s| SphereSummary {
                        key: s.key.as_str().to_string(),
                        name: s.name.clone(),
                        progress: s.progress,
                    })
                    .collect(),
                harmony_score: spheres.harmony_score(),
            },
            timestamp,
        }
    }
}

/// Raw HTTP outcome; any status code, including errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends a JSON body to a URL and reports what came back
pub trait SuggestionTransport {
    fn post_json(
        &self,
        url: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<TransportResponse, SuggestError>;
}

/// Blocking HTTP transport backed by ureq
#[derive(Debug, Default, Clone, Copy)]
pub struct UreqTransport;

impl SuggestionTransport for UreqTransport {
    fn post_json(
        &self,
        url: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<TransportResponse, SuggestError> {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();

        let result = agent
            .post(url)
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
            .send_string(body);

        match result {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.into_string().map_err(|e| SuggestError::Transport {
                    url: url.to_string(),
                    message: format!("failed to read response body: {e}"),
                })?;
                Ok(TransportResponse { status, body })
            }
            // Error statuses still come back as a response so the caller can classify them
            Err(ureq::Error::Status(status, resp)) => Ok(TransportResponse {
                status,
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(e)) => Err(SuggestError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// Validate a response and pull the suggestion out of it
pub fn parse_response(response: &TransportResponse) -> Result<Suggestion, SuggestError> {
    if !(200..300).contains(&response.status) {
        return Err(SuggestError::Status {
            status: response.status,
        });
    }

    let value: serde_json::Value =
        serde_json::from_str(&response.body).map_err(SuggestError::Body)?;

    let text = value
        .get("recommendedAction")
        .and_then(|action| action.get("text"))
        .and_then(|text| text.as_str())
        .ok_or_else(|| SuggestError::Shape("missing recommendedAction.text".to_string()))?;
    if text.trim().is_empty() {
        return Err(SuggestError::Shape("empty recommendedAction.text".to_string()));
    }

    serde_json::from_value(value).map_err(|e| SuggestError::Shape(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SphereKey;
    use pretty_assertions::assert_eq;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    fn ok(body: &str) -> TransportResponse {
        TransportResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_request_payload_shape() {
        let request = SuggestionRequest::new(&SphereSet::default(), 1_760_000_000_000);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["timestamp"], 1_760_000_000_000i64);
        assert_eq!(json["summary"]["harmonyScore"], 64);
        let spheres = json["summary"]["spheres"].as_array().unwrap();
        assert_eq!(spheres.len(), 6);
        assert_eq!(spheres[0], serde_json::json!({"key": "health", "name": "Santé", "progress": 60}));

        // Only the documented fields are sent
        let summary_keys: Vec<&String> = json["summary"].as_object().unwrap().keys().collect();
        assert_eq!(summary_keys.len(), 2);
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_valid_response() {
        let suggestion = parse_response(&ok(
            r#"{"recommendedAction": {"text": "5-minute breathing", "durationMin": 5},
                "reason": "Spiritual is lowest", "sphereKey": "spiritual"}"#,
        ))
        .unwrap();
        assert_eq!(suggestion.recommended_action.text, "5-minute breathing");
        assert_eq!(suggestion.recommended_action.duration_min, Some(5.0));
        assert_eq!(suggestion.reason, "Spiritual is lowest");
        assert_eq!(suggestion.sphere_key, Some(SphereKey::Spiritual));
    }

    #[test]
    fn test_parse_rejects_error_status() {
        let response = TransportResponse {
            status: 500,
            body: r#"{"recommendedAction": {"text": "x"}}"#.to_string(),
        };
        assert!(matches!(
            parse_response(&response),
            Err(SuggestError::Status { status: 500 })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_bodies() {
        assert!(matches!(parse_response(&ok("not json")), Err(SuggestError::Body(_))));
        assert!(matches!(parse_response(&ok("{}")), Err(SuggestError::Shape(_))));
        assert!(matches!(
            parse_response(&ok(r#"{"recommendedAction": {"durationMin": 5}}"#)),
            Err(SuggestError::Shape(_))
        ));
        assert!(matches!(
            parse_response(&ok(r#"{"recommendedAction": {"text": 12}}"#)),
            Err(SuggestError::Shape(_))
        ));
        assert!(matches!(
            parse_response(&ok(r#"{"recommendedAction": {"text": "  "}}"#)),
            Err(SuggestError::Shape(_))
        ));
        assert!(matches!(
            parse_response(&ok(r#"{"recommendedAction": {"text": "x"}, "reason": 4}"#)),
            Err(SuggestError::Shape(_))
        ));
    }

    /// Serve exactly one canned HTTP response on a loopback port
    fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(value) = lower.strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });

        format!("http://{}/api/ai-suggest", addr)
    }

    #[test]
    fn test_ureq_transport_success() {
        let url = one_shot_server(
            "HTTP/1.1 200 OK",
            r#"{"recommendedAction":{"text":"Stretch","durationMin":2},"reason":"ok"}"#,
        );
        let response = UreqTransport
            .post_json(&url, "{}", Duration::from_secs(5))
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(parse_response(&response).unwrap().recommended_action.text, "Stretch");
    }

    #[test]
    fn test_ureq_transport_error_status_is_a_response() {
        let url = one_shot_server("HTTP/1.1 500 Internal Server Error", r#"{"error":"Server error"}"#);
        let response = UreqTransport
            .post_json(&url, "{}", Duration::from_secs(5))
            .unwrap();
        assert_eq!(response.status, 500);
        assert!(response.body.contains("Server error"));
    }

    #[test]
    fn test_ureq_transport_connection_refused() {
        // Bind then drop to get a port nothing listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{}/api/ai-suggest", port);
        let result = UreqTransport.post_json(&url, "{}", Duration::from_secs(2));
        assert!(matches!(result, Err(SuggestError::Transport { .. })));
    }
}
