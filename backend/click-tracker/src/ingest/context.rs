use actix_web::HttpRequest;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Client details captured from the incoming request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub client_ip: String,
    pub user_agent: String,
}

impl RequestContext {
    pub fn new(client_ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            user_agent: user_agent.into(),
        }
    }

    /// `X-Forwarded-For` is kept verbatim (the whole proxy chain, untrimmed)
    /// when present and non-empty; otherwise the peer address is used.
    pub fn from_request(req: &HttpRequest) -> Self {
        let client_ip = header_value(req, FORWARDED_FOR)
            .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
            .unwrap_or_default();

        let user_agent = header_value(req, actix_web::http::header::USER_AGENT.as_str())
            .unwrap_or_default();

        Self {
            client_ip,
            user_agent,
        }
    }
}

/// Header bytes as sent; non-UTF-8 octets become U+FFFD rather than
/// discarding the value.
fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .filter(|v| !v.is_empty())
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}
