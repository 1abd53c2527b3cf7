use super::heuristic::local_heuristic;
use super::remote::{parse_response, SuggestionRequest, SuggestionTransport};
use super::{SuggestError, Suggestion, SuggestionConfig};
use crate::domain::SphereSet;
use tracing::{debug, warn};

/// Single best-effort remote call. No retries.
pub fn try_resolve(
    spheres: &SphereSet,
    config: &SuggestionConfig,
    transport: &dyn SuggestionTransport,
) -> Result<Suggestion, SuggestError> {
    let url = config.remote_url().ok_or(SuggestError::Disabled)?;

    let request = SuggestionRequest::new(spheres, chrono::Utc::now().timestamp_millis());
    let body = serde_json::to_string(&request).map_err(|e| SuggestError::Shape(e.to_string()))?;

    debug!(url, "requesting remote suggestion");
    let response = transport.post_json(url, &body, config.timeout)?;
    parse_response(&response)
}

/// Resolve a suggestion, falling back to the local heuristic on any failure
pub fn resolve(
    spheres: &SphereSet,
    config: &SuggestionConfig,
    transport: &dyn SuggestionTransport,
) -> Suggestion {
    match try_resolve(spheres, config, transport) {
        Ok(suggestion) => suggestion,
        Err(SuggestError::Disabled) => {
            debug!("remote suggestions disabled, using local heuristic");
            local_heuristic(spheres)
        }
        Err(e) => {
            warn!(error = %e, "remote suggestion failed, falling back to local heuristic");
            local_heuristic(spheres)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::remote::TransportResponse;
    use crate::suggest::UreqTransport;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::time::{Duration, Instant};

    /// Transport that replays a fixed outcome and records what it was sent
    struct StubTransport {
        outcome: fn() -> Result<TransportResponse, SuggestError>,
        calls: RefCell<Vec<(String, String)>>,
    }

    impl StubTransport {
        fn new(outcome: fn() -> Result<TransportResponse, SuggestError>) -> Self {
            Self {
                outcome,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl SuggestionTransport for StubTransport {
        fn post_json(
            &self,
            url: &str,
            body: &str,
            _timeout: Duration,
        ) -> Result<TransportResponse, SuggestError> {
            self.calls.borrow_mut().push((url.to_string(), body.to_string()));
            (self.outcome)()
        }
    }

    fn enabled() -> SuggestionConfig {
        SuggestionConfig {
            ai_enabled: true,
            api_url: Some("http://coach.local/api/ai-suggest".to_string()),
            ..SuggestionConfig::default()
        }
    }

    fn respond(status: u16, body: &str) -> Result<TransportResponse, SuggestError> {
        Ok(TransportResponse {
            status,
            body: body.to_string(),
        })
    }

    #[test]
    fn test_disabled_never_touches_network() {
        let transport = StubTransport::new(|| respond(200, r#"{"recommendedAction":{"text":"remote"}}"#));
        let spheres = SphereSet::default();

        let mut config = enabled();
        config.ai_enabled = false;
        assert_eq!(resolve(&spheres, &config, &transport), local_heuristic(&spheres));

        let mut config = enabled();
        config.api_url = Some(String::new());
        assert_eq!(resolve(&spheres, &config, &transport), local_heuristic(&spheres));

        assert!(transport.calls.borrow().is_empty());
        assert!(matches!(
            try_resolve(&spheres, &SuggestionConfig::default(), &transport),
            Err(SuggestError::Disabled)
        ));
    }

    #[test]
    fn test_remote_success_returned_verbatim() {
        let transport = StubTransport::new(|| {
            respond(
                200,
                r#"{"recommendedAction":{"text":"Drink a glass of water","durationMin":1},"reason":"Health could use a boost"}"#,
            )
        });
        let spheres = SphereSet::default();
        let suggestion = resolve(&spheres, &enabled(), &transport);

        assert_eq!(suggestion.recommended_action.text, "Drink a glass of water");
        assert_eq!(suggestion.recommended_action.duration_min, Some(1.0));
        assert_eq!(suggestion.reason, "Health could use a boost");
        assert_eq!(suggestion.sphere_key, None);
    }

    #[test]
    fn test_request_carries_only_sphere_summary() {
        let transport = StubTransport::new(|| respond(200, r#"{"recommendedAction":{"text":"ok"}}"#));
        resolve(&SphereSet::default(), &enabled(), &transport);

        let calls = transport.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "http://coach.local/api/ai-suggest");

        let body: serde_json::Value = serde_json::from_str(&calls[0].1).unwrap();
        assert_eq!(body["summary"]["harmonyScore"], 64);
        assert!(body["timestamp"].as_i64().unwrap() > 0);
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_every_failure_falls_back_to_local() {
        let failures: Vec<fn() -> Result<TransportResponse, SuggestError>> = vec![
            || respond(500, r#"{"error":"Server error"}"#),
            || respond(429, r#"{"error":"Too many requests, please slow down."}"#),
            || respond(200, "<html>oops</html>"),
            || respond(200, r#"{"reason":"no action"}"#),
            || respond(200, r#"{"recommendedAction":{"durationMin":5}}"#),
            || {
                Err(SuggestError::Transport {
                    url: "http://coach.local".to_string(),
                    message: "connection reset".to_string(),
                })
            },
        ];

        let spheres = SphereSet::from_progress([30, 70, 80, 45, 20, 70]);
        let expected = local_heuristic(&spheres);
        assert_eq!(expected.recommended_action.text, "Bloc focus de 25 minutes (Pomodoro)");

        for outcome in failures {
            let transport = StubTransport::new(outcome);
            assert_eq!(resolve(&spheres, &enabled(), &transport), expected);
            assert_eq!(transport.calls.borrow().len(), 1, "exactly one attempt, no retry");
        }
    }

    #[test]
    fn test_null_reason_is_still_a_remote_success() {
        let transport = StubTransport::new(|| {
            respond(200, r#"{"recommendedAction":{"text":"Stretch","durationMin":2.5},"reason":null}"#)
        });
        let suggestion = resolve(&SphereSet::default(), &enabled(), &transport);

        assert_eq!(suggestion.recommended_action.text, "Stretch");
        assert_eq!(suggestion.recommended_action.duration_min, Some(2.5));
        assert_eq!(suggestion.reason, "");
    }

    #[test]
    fn test_silent_endpoint_times_out_and_falls_back() {
        // Connections complete in the backlog but nothing ever answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = SuggestionConfig {
            ai_enabled: true,
            api_url: Some(format!("http://{}/api/ai-suggest", listener.local_addr().unwrap())),
            timeout: Duration::from_millis(300),
        };
        let spheres = SphereSet::default();

        let started = Instant::now();
        assert!(matches!(
            try_resolve(&spheres, &config, &UreqTransport),
            Err(SuggestError::Transport { .. })
        ));
        assert_eq!(resolve(&spheres, &config, &UreqTransport), local_heuristic(&spheres));
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(listener);
    }

    #[test]
    fn test_default_timeout_is_eight_seconds() {
        assert_eq!(SuggestionConfig::default().timeout, Duration::from_secs(8));
        assert_eq!(enabled().timeout, crate::suggest::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_unreachable_endpoint_falls_back() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = SuggestionConfig {
            ai_enabled: true,
            api_url: Some(format!("http://127.0.0.1:{}/api/ai-suggest", port)),
            timeout: Duration::from_secs(2),
        };
        let spheres = SphereSet::default();
        assert_eq!(resolve(&spheres, &config, &UreqTransport), local_heuristic(&spheres));
    }
}
