/// Query parameters of the platform's `GET` verification handshake.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyParams {
    pub mode: Option<String>,
    pub verify_token: Option<String>,
    pub challenge: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Matching mode and secret; respond 200 with the challenge verbatim.
    Verified { challenge: String },
    /// Mode or token present but wrong; respond 403.
    Forbidden,
    /// Mode or token absent entirely; respond 400.
    MissingParams,
}

pub fn verify_subscription(params: &VerifyParams, shared_secret: &str) -> VerifyOutcome {
    let (Some(mode), Some(token)) = (&params.mode, &params.verify_token) else {
        return VerifyOutcome::MissingParams;
    };

    if mode == "subscribe" && token == shared_secret {
        VerifyOutcome::Verified { challenge: params.challenge.clone().unwrap_or_default() }
    } else {
        VerifyOutcome::Forbidden
    }
}

#[cfg(test)]
mod tests {
    use super::{verify_subscription, VerifyOutcome, VerifyParams};

    fn params(mode: Option<&str>, token: Option<&str>, challenge: Option<&str>) -> VerifyParams {
        VerifyParams {
            mode: mode.map(str::to_string),
            verify_token: token.map(str::to_string),
            challenge: challenge.map(str::to_string),
        }
    }

    #[test]
    fn matching_mode_and_secret_returns_the_challenge_verbatim() {
        let outcome = verify_subscription(
            &params(Some("subscribe"), Some("shared-secret"), Some("1158201444")),
            "shared-secret",
        );
        assert_eq!(outcome, VerifyOutcome::Verified { challenge: "1158201444".to_string() });
    }

    #[test]
    fn wrong_secret_is_forbidden() {
        let outcome = verify_subscription(
            &params(Some("subscribe"), Some("guess"), Some("1158201444")),
            "shared-secret",
        );
        assert_eq!(outcome, VerifyOutcome::Forbidden);
    }

    #[test]
    fn wrong_mode_is_forbidden() {
        let outcome = verify_subscription(
            &params(Some("unsubscribe"), Some("shared-secret"), Some("1158201444")),
            "shared-secret",
        );
        assert_eq!(outcome, VerifyOutcome::Forbidden);
    }

    #[test]
    fn missing_mode_or_token_is_a_bad_request() {
        let secret = "shared-secret";
        assert_eq!(
            verify_subscription(&params(None, Some(secret), Some("1")), secret),
            VerifyOutcome::MissingParams
        );
        assert_eq!(
            verify_subscription(&params(Some("subscribe"), None, Some("1")), secret),
            VerifyOutcome::MissingParams
        );
    }

    #[test]
    fn missing_challenge_still_verifies_with_an_empty_body() {
        let outcome = verify_subscription(
            &params(Some("subscribe"), Some("shared-secret"), None),
            "shared-secret",
        );
        assert_eq!(outcome, VerifyOutcome::Verified { challenge: String::new() });
    }
}
