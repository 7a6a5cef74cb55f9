use actix_web::{web, HttpRequest, HttpResponse};
use click_event::ClickAttributes;
use serde_json::json;
use tracing::{debug, error};

use super::{pixel, AppState, IngestOutcome, RequestContext};
use crate::error::Result;
use crate::metrics;

/// `GET /track`: record a click and return the tracking pixel.
///
/// The response is the same whatever happens to the click.
pub async fn track(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let attributes = parse_attributes(req.query_string());
    let context = RequestContext::from_request(&req);

    let outcome = state.ingestor.record_event(attributes, context).await;
    metrics::record_ingest(outcome.label());

    match &outcome {
        IngestOutcome::Enqueued { id } => debug!(event_id = %id, "Click enqueued"),
        IngestOutcome::Dropped { id, reason } => {
            error!(event_id = %id, error = %reason, "Failed to enqueue click")
        }
    }

    pixel::response()
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// `GET /ready`: the queue must answer.
pub async fn ready(state: web::Data<AppState>) -> Result<HttpResponse> {
    let depth = state.queue.depth().await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "ready", "queue_depth": depth })))
}

/// Lenient query parsing: never rejects a click.
fn parse_attributes(query: &str) -> ClickAttributes {
    match web::Query::<Vec<(String, String)>>::from_query(query) {
        Ok(pairs) => ClickAttributes::from_pairs(pairs.into_inner()),
        Err(e) => {
            debug!("Ignoring unparsable query string: {}", e);
            ClickAttributes::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attributes_decodes_values() {
        let attributes = parse_attributes("uniqueId=abc%20def&sub1=x%2By&sub10=&other=1");
        assert_eq!(attributes.unique_id(), "abc def");
        assert_eq!(attributes.sub(1), "x+y");
        assert_eq!(attributes.sub(10), "");
    }

    #[test]
    fn test_parse_attributes_empty_query() {
        assert_eq!(parse_attributes(""), ClickAttributes::default());
    }

    #[test]
    fn test_parse_attributes_repeated_key_last_wins() {
        let attributes = parse_attributes("sub3=a&sub3=b");
        assert_eq!(attributes.sub(3), "b");
    }
}
