use shopway_core::Lang;
use thiserror::Error;

/// Errors returned while fetching a route from the backend.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The backend answered `"success": false` with a message.
    #[error("route backend error: {0}")]
    Api(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response carried no drawable vehicle segment.
    #[error("route has no drawable vehicle geometry")]
    EmptyGeometry,

    #[error("route request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl RouteError {
    /// Text shown next to the destination field, in `lang`.
    ///
    /// Backend messages are passed through verbatim; everything else gets a
    /// generic sentence so transport details never reach the visitor.
    #[must_use]
    pub fn user_message(&self, lang: Lang) -> String {
        let text = match (self, lang) {
            (RouteError::Api(message), _) if !message.trim().is_empty() => {
                return message.clone();
            }
            (RouteError::EmptyGeometry, Lang::Fr) => {
                "Aucun itinéraire trouvé pour cette destination."
            }
            (RouteError::EmptyGeometry, Lang::En) => "No route found for this destination.",
            (RouteError::Timeout { .. }, Lang::Fr) => {
                "Le service d'itinéraire n'a pas répondu à temps."
            }
            (RouteError::Timeout { .. }, Lang::En) => "The route service did not answer in time.",
            (_, Lang::Fr) => "Le service d'itinéraire est indisponible, veuillez réessayer.",
            (_, Lang::En) => "The route service is unavailable, please try again.",
        };
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_message_is_passed_through() {
        let err = RouteError::Api("Zone fermée".to_string());
        assert_eq!(err.user_message(Lang::En), "Zone fermée");
        assert_eq!(err.user_message(Lang::Fr), "Zone fermée");
    }

    #[test]
    fn blank_api_message_falls_back() {
        let err = RouteError::Api("  ".to_string());
        assert!(err.user_message(Lang::En).contains("unavailable"));
        assert!(err.user_message(Lang::Fr).contains("indisponible"));
    }

    #[test]
    fn generic_texts_follow_language() {
        assert_eq!(
            RouteError::EmptyGeometry.user_message(Lang::Fr),
            "Aucun itinéraire trouvé pour cette destination."
        );
        assert_eq!(
            RouteError::EmptyGeometry.user_message(Lang::En),
            "No route found for this destination."
        );
        assert!(RouteError::Timeout { secs: 15 }
            .user_message(Lang::Fr)
            .contains("à temps"));
    }

    #[test]
    fn status_error_hides_url() {
        let err = RouteError::UnexpectedStatus {
            status: 502,
            url: "https://internal.example/route".to_string(),
        };
        assert!(!err.user_message(Lang::En).contains("internal.example"));
    }
}
