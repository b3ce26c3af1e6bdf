//! Evaluation of requests with asynchronous primitives.
use tokio::time::timeout;

use crate::guard::{self, Error, Guard, GuardConfig, Input, Outcome, Output, RequestDescriptor};
use crate::primitives::consumer::StoreError;
use crate::primitives::principal::Principal;
use crate::signature::SignatureMethods;

use super::primitives::{AccessTokenAnalyzer, ConsumerStore};

/// Required functionality to evaluate protected requests asynchronously.
///
/// Either primitive may be absent if the corresponding protocol is disabled.
pub trait Endpoint: Send + Sync {
    /// The settings of the guard.
    fn config(&self) -> &GuardConfig;

    /// The accepted signature methods of signed requests.
    fn methods(&self) -> &SignatureMethods;

    /// The analyzer of bearer tokens.
    fn analyzer(&self) -> Option<&dyn AccessTokenAnalyzer>;

    /// The store of consumer credentials for signed requests.
    fn consumers(&self) -> Option<&dyn ConsumerStore>;
}

/// Evaluate a request with asynchronous primitives.
///
/// A consumer lookup that does not complete within `GuardConfig::lookup_timeout` is abandoned and
/// the request fails with a protocol error.
pub async fn protect(endpoint: &dyn Endpoint, request: &RequestDescriptor) -> Result<Principal, Error> {
    enum Requested {
        None,
        Request,
        Lookup { consumer_key: String, token: String },
        Analyze(String),
    }

    let mut guard = Guard::new(endpoint.config(), endpoint.methods());
    let mut requested = Requested::None;
    loop {
        let input = match requested {
            Requested::None => Input::None,
            Requested::Request => Input::Request(request),
            Requested::Lookup { consumer_key, token } => {
                let consumers = endpoint
                    .consumers()
                    .ok_or_else(|| Error::protocol("no consumer store configured"))?;
                let lookup = consumers.lookup(&consumer_key, &token);
                let credentials = match timeout(endpoint.config().lookup_timeout(), lookup).await {
                    Ok(credentials) => credentials,
                    Err(_) => Err(StoreError::TimedOut),
                };
                Input::Credentials(credentials)
            }
            Requested::Analyze(token) => {
                let analyzer = endpoint
                    .analyzer()
                    .ok_or_else(|| Error::protocol("no token analyzer configured"))?;
                Input::Analyzed(analyzer.analyze(&token).await)
            }
        };

        requested = match guard.advance(input) {
            Output::Err(error) => return Err(error),
            Output::Ok(principal) => return Ok(principal),
            Output::GetRequest => Requested::Request,
            Output::LookupConsumer { consumer_key, token } => Requested::Lookup {
                consumer_key: consumer_key.to_string(),
                token: token.to_string(),
            },
            Output::Analyze { token } => Requested::Analyze(token.to_string()),
        };
    }
}

/// Evaluate a request and log the result.
pub async fn evaluate(endpoint: &dyn Endpoint, request: &RequestDescriptor) -> Outcome {
    let result = protect(endpoint, request).await;
    guard::trace(&result);
    result.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::guard::Protocols;
    use crate::primitives::analyzer::{AccessGrant, StandardAnalyzer};
    use crate::primitives::consumer::{ConsumerMap, Credentials, TokenRecord};
    use crate::primitives::keys::ServerKeys;
    use crate::signature::{base_string, HmacMethod, SignatureMethod, SigningKey};

    const URL: &str = "https://api.example.com/photos";

    /// A store that answers only after a delay.
    struct SlowStore {
        delay: Duration,
        inner: ConsumerMap,
    }

    #[async_trait]
    impl ConsumerStore for SlowStore {
        async fn lookup(&self, consumer_key: &str, token: &str) -> Result<Option<Credentials>, StoreError> {
            tokio::time::sleep(self.delay).await;
            crate::primitives::consumer::ConsumerStore::lookup(&self.inner, consumer_key, token)
        }
    }

    struct TestEndpoint<C> {
        config: GuardConfig,
        methods: SignatureMethods,
        analyzer: StandardAnalyzer,
        consumers: C,
    }

    impl<C: ConsumerStore> Endpoint for TestEndpoint<C> {
        fn config(&self) -> &GuardConfig {
            &self.config
        }

        fn methods(&self) -> &SignatureMethods {
            &self.methods
        }

        fn analyzer(&self) -> Option<&dyn AccessTokenAnalyzer> {
            Some(&self.analyzer)
        }

        fn consumers(&self) -> Option<&dyn ConsumerStore> {
            Some(&self.consumers)
        }
    }

    fn endpoint<C: ConsumerStore>(consumers: C, timeout: Duration) -> TestEndpoint<C> {
        let keys = ServerKeys::ephemeral().unwrap();
        TestEndpoint {
            config: GuardConfig::default()
                .with_protocols(Protocols::both())
                .with_lookup_timeout(timeout),
            methods: SignatureMethods::default(),
            analyzer: StandardAnalyzer::new(Arc::new(keys)),
            consumers,
        }
    }

    fn consumers() -> ConsumerMap {
        let mut consumers = ConsumerMap::new();
        consumers.register_consumer("consumer", "consumer-secret");
        let record = TokenRecord::new("token-secret", "alice", "read".parse().unwrap());
        consumers.register_token("consumer", "token", record);
        consumers
    }

    fn signed_request() -> RequestDescriptor {
        let timestamp = Utc::now().timestamp().to_string();
        let oauth = [
            ("oauth_consumer_key", "consumer"),
            ("oauth_token", "token"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_nonce", "nonce"),
        ];
        let base = base_string("GET", URL, oauth.iter().cloned()).unwrap();
        let signature = HmacMethod::sha1().sign(&base, &SigningKey::new("consumer-secret", "token-secret"));

        let mut header = String::from("OAuth ");
        for (key, value) in oauth.iter() {
            header.push_str(&format!("{}=\"{}\", ", key, value));
        }
        header.push_str(&format!("oauth_signature=\"{}\"", signature.as_str()));

        RequestDescriptor::new("GET", URL)
            .with_authorization(header)
            .with_operation("read")
    }

    #[tokio::test]
    async fn blocking_store_is_usable() {
        let endpoint = endpoint(consumers(), Duration::from_secs(1));
        let outcome = evaluate(&endpoint, &signed_request()).await;
        assert_eq!(outcome.principal().map(Principal::name), Some("alice"));
    }

    #[tokio::test]
    async fn slow_store_within_timeout() {
        let store = SlowStore {
            delay: Duration::from_millis(5),
            inner: consumers(),
        };
        let endpoint = endpoint(store, Duration::from_secs(2));
        assert!(evaluate(&endpoint, &signed_request()).await.is_allowed());
    }

    #[tokio::test]
    async fn slow_store_times_out() {
        let store = SlowStore {
            delay: Duration::from_millis(500),
            inner: consumers(),
        };
        let endpoint = endpoint(store, Duration::from_millis(20));
        match evaluate(&endpoint, &signed_request()).await {
            Outcome::ProtocolError(_) => (),
            other => panic!("Expected a protocol error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bearer_token() {
        let endpoint = endpoint(consumers(), Duration::from_secs(1));
        let token = endpoint
            .analyzer
            .issue(&AccessGrant {
                owner_id: "bob".into(),
                client_id: "client".into(),
                scope: "read write".parse().unwrap(),
                until: Utc::now() + chrono::Duration::minutes(1),
            })
            .unwrap();

        let request = RequestDescriptor::new("GET", URL)
            .with_authorization(format!("Bearer {}", token))
            .with_operation("write");
        let principal = protect(&endpoint, &request).await.unwrap();
        assert_eq!(principal.name(), "bob");

        let admin = RequestDescriptor::new("GET", URL)
            .with_authorization(format!("Bearer {}", token))
            .with_operation("admin");
        assert_eq!(evaluate(&endpoint, &admin).await, Outcome::Denied);
    }
}
