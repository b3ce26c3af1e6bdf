use std::borrow::Cow;
use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::endpoint::*;
use crate::frontends::simple::endpoint::{Error as SimpleError, FnOperation, Generic, Vacant};
use crate::frontends::simple::request::{Request, Response, Status};
use crate::primitives::analyzer::{AccessGrant, StandardAnalyzer};
use crate::primitives::consumer::{ConsumerMap, TokenRecord};
use crate::primitives::keys::ServerKeys;
use crate::signature::{base_string, HmacMethod, SignatureMethod, SignatureMethods, SigningKey};


/// Open and simple implementation of `WebRequest` that can fail on every accessor.
#[derive(Clone, Debug, Default)]
struct CraftedRequest {
    method: String,
    url: String,
    urlbody: Option<Vec<(String, String)>>,
    auth: Option<String>,
}

#[derive(Clone, Copy, Debug)]
struct MalformedRequest;

impl WebRequest for CraftedRequest {
    type Error = MalformedRequest;

    fn method(&mut self) -> Result<Cow<'_, str>, Self::Error> {
        Ok(Cow::Borrowed(self.method.as_str()))
    }

    fn url(&mut self) -> Result<Cow<'_, str>, Self::Error> {
        Ok(Cow::Borrowed(self.url.as_str()))
    }

    fn urlbody(&mut self) -> Result<Cow<'_, dyn QueryParameter + 'static>, Self::Error> {
        self.urlbody
            .as_ref()
            .map(|body| Cow::Borrowed(body as &dyn QueryParameter))
            .ok_or(MalformedRequest)
    }

    fn authheader(&mut self) -> Result<Option<Cow<'_, str>>, Self::Error> {
        Ok(self.auth.as_ref().map(|string| Cow::Borrowed(string.as_str())))
    }
}

mod defaults {
    pub const OWNER: &str = "alice";
    pub const CLIENT: &str = "photos";
    pub const URL: &str = "https://api.example.com/photos";
    pub const CONSUMER_KEY: &str = "dpf43f3p2l4k3l03";
    pub const CONSUMER_SECRET: &str = "kd94hf93k423kf44";
    pub const TOKEN: &str = "nnch734d00sl2jdk";
    pub const TOKEN_SECRET: &str = "pfkkdhi9sl3r4s00";
}

fn analyzer() -> StandardAnalyzer {
    let keys = ServerKeys::ephemeral().expect("ephemeral keys can always be generated");
    StandardAnalyzer::new(Arc::new(keys))
}

fn token_for(analyzer: &StandardAnalyzer, scope: &str, valid_for: Duration) -> String {
    let grant = AccessGrant {
        owner_id: defaults::OWNER.to_string(),
        client_id: defaults::CLIENT.to_string(),
        scope: scope.parse().unwrap(),
        until: Utc::now() + valid_for,
    };
    analyzer.issue(&grant).unwrap()
}

fn bearer_endpoint(analyzer: StandardAnalyzer) -> Generic<StandardAnalyzer, Vacant, &'static str> {
    Generic {
        config: GuardConfig::default(),
        methods: SignatureMethods::default(),
        analyzer,
        consumers: Vacant,
        operation: "write",
    }
}

fn bearer_request(token: &str) -> Request {
    Request::new("POST", defaults::URL).with_auth(format!("Bearer {}", token))
}

#[test]
fn bearer_allowed() {
    let analyzer = analyzer();
    let token = token_for(&analyzer, "read write", Duration::minutes(5));
    let mut flow = bearer_endpoint(analyzer).guard_flow().unwrap();

    match flow.execute(bearer_request(&token)) {
        Outcome::Allowed(principal) => {
            assert_eq!(principal.name(), defaults::OWNER);
            assert!(principal.is_in_scope("read"));
        }
        other => panic!("Expected the request to be allowed, got {:?}", other),
    }
}

#[test]
fn bearer_denied() {
    let analyzer = analyzer();
    let token = token_for(&analyzer, "read write", Duration::minutes(5));
    let endpoint = bearer_endpoint(analyzer).with_operation("admin");
    let mut flow = endpoint.guard_flow().unwrap();
    assert_eq!(flow.execute(bearer_request(&token)), Outcome::Denied);
}

#[test]
fn bearer_expired() {
    let analyzer = analyzer();
    let token = token_for(&analyzer, "write", Duration::minutes(-1));
    let mut flow = bearer_endpoint(analyzer).guard_flow().unwrap();
    assert_eq!(flow.execute(bearer_request(&token)), Outcome::AuthenticationFailed);
}

#[test]
fn bearer_in_form_body() {
    let analyzer = analyzer();
    let token = token_for(&analyzer, "write", Duration::minutes(5));
    let mut flow = bearer_endpoint(analyzer).guard_flow().unwrap();
    let request = Request::new("POST", defaults::URL).with_body_param("access_token", token);
    assert!(flow.execute(request).is_allowed());
}

#[test]
fn token_of_other_keys() {
    let foreign = analyzer();
    let token = token_for(&foreign, "write", Duration::minutes(5));
    let mut flow = bearer_endpoint(analyzer()).guard_flow().unwrap();
    assert_eq!(flow.execute(bearer_request(&token)), Outcome::AuthenticationFailed);
}

#[test]
fn no_credentials() {
    let mut flow = bearer_endpoint(analyzer()).guard_flow().unwrap();
    let outcome = flow.execute(Request::new("GET", defaults::URL));
    assert_eq!(outcome, Outcome::AuthenticationFailed);

    let response = Response::from_outcome(&outcome, flow.config());
    assert_eq!(response.status, Status::Unauthorized);
    assert_eq!(response.www_authenticate.as_deref(), Some("Bearer"));
}

#[test]
fn flow_reused_for_many_requests() {
    let analyzer = analyzer();
    let good = token_for(&analyzer, "write", Duration::minutes(5));
    let mut flow = bearer_endpoint(analyzer).guard_flow().unwrap();

    assert!(flow.execute(bearer_request(&good)).is_allowed());
    assert_eq!(flow.execute(bearer_request("garbage")), Outcome::AuthenticationFailed);
    assert!(flow.execute(bearer_request(&good)).is_allowed());
}

#[test]
fn two_credentials_are_a_protocol_error() {
    let analyzer = analyzer();
    let token = token_for(&analyzer, "write", Duration::minutes(5));
    let mut flow = bearer_endpoint(analyzer).guard_flow().unwrap();
    let request = bearer_request(&token).with_body_param("access_token", token.clone());

    let outcome = flow.execute(request);
    assert!(matches!(outcome, Outcome::ProtocolError(_)));
    let response = Response::from_outcome(&outcome, flow.config());
    assert_eq!(response.status, Status::BadRequest);
}

#[test]
fn unreadable_request() {
    let analyzer = analyzer();
    let token = token_for(&analyzer, "write", Duration::minutes(5));
    let mut flow = GuardFlow::prepare(bearer_endpoint(analyzer)).unwrap();

    let request = CraftedRequest {
        method: "POST".into(),
        url: defaults::URL.into(),
        urlbody: None,
        auth: Some(format!("Bearer {}", token)),
    };

    assert!(matches!(flow.execute(request.clone()), Outcome::ProtocolError(_)));

    let readable = CraftedRequest {
        urlbody: Some(vec![]),
        ..request
    };
    assert!(flow.execute(readable).is_allowed());
}

#[test]
fn operation_from_request() {
    let analyzer = analyzer();
    let token = token_for(&analyzer, "read", Duration::minutes(5));
    let endpoint = bearer_endpoint(analyzer).with_operation(FnOperation(|request: &mut Request| {
        match request.method.as_str() {
            "GET" | "HEAD" => Some("read".to_string()),
            "POST" | "PUT" | "DELETE" => Some("write".to_string()),
            _ => None,
        }
    }));
    let mut flow = endpoint.guard_flow().unwrap();

    let get = Request::new("GET", defaults::URL).with_auth(format!("Bearer {}", token));
    assert!(flow.execute(get).is_allowed());
    assert_eq!(flow.execute(bearer_request(&token)), Outcome::Denied);

    let unknown = Request::new("PATCH", defaults::URL).with_auth(format!("Bearer {}", token));
    assert!(matches!(flow.execute(unknown), Outcome::ProtocolError(_)));
}

#[test]
fn prepare_requires_primitives() {
    let endpoint = Generic {
        config: GuardConfig::default(),
        methods: SignatureMethods::default(),
        analyzer: Vacant,
        consumers: Vacant,
        operation: "read",
    };
    match endpoint.guard_flow::<Request>() {
        Err(SimpleError::OAuth(OAuthError::PrimitiveError)) => (),
        _ => panic!("Expected a missing analyzer to be rejected"),
    }

    let endpoint = bearer_endpoint(analyzer());
    let endpoint = Generic {
        config: GuardConfig::default().with_protocols(Protocols::both()),
        ..endpoint
    };
    match endpoint.guard_flow::<Request>() {
        Err(SimpleError::OAuth(OAuthError::PrimitiveError)) => (),
        _ => panic!("Expected a missing consumer store to be rejected"),
    }
}

#[test]
fn prepare_requires_operation() {
    struct NoOperation(GuardConfig, SignatureMethods, StandardAnalyzer);

    impl Endpoint<Request> for NoOperation {
        type Error = OAuthError;

        fn config(&self) -> &GuardConfig {
            &self.0
        }

        fn methods(&self) -> &SignatureMethods {
            &self.1
        }

        fn analyzer(&self) -> Option<&dyn crate::primitives::analyzer::AccessTokenAnalyzer> {
            Some(&self.2)
        }

        fn consumers(&self) -> Option<&dyn crate::primitives::consumer::ConsumerStore> {
            None
        }

        fn operation(&mut self) -> Option<&mut dyn Operation<Request>> {
            None
        }

        fn error(&mut self, err: OAuthError) -> OAuthError {
            err
        }
    }

    let endpoint = NoOperation(GuardConfig::default(), SignatureMethods::default(), analyzer());
    match GuardFlow::prepare(endpoint) {
        Err(err) => assert_eq!(err, OAuthError::MissingOperation),
        Ok(_) => panic!("Expected an endpoint without operation to be rejected"),
    }
}

/// Build the `Authorization` header of a request signed with HMAC-SHA1.
fn signed_header(method: &str, url: &str, form: &[(&str, &str)], consumer_secret: &str) -> String {
    let timestamp = Utc::now().timestamp().to_string();
    let oauth = vec![
        ("oauth_consumer_key", defaults::CONSUMER_KEY),
        ("oauth_token", defaults::TOKEN),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_nonce", "kllo9940pd9333jh"),
        ("oauth_version", "1.0"),
    ];

    let params = oauth.iter().chain(form.iter()).map(|&(key, value)| (key, value));
    let base = base_string(method, url, params).unwrap();
    let key = SigningKey::new(consumer_secret, defaults::TOKEN_SECRET);
    let signature = HmacMethod::sha1().sign(&base, &key);

    let mut header = String::from("OAuth realm=\"Photos\"");
    for (key, value) in oauth {
        header.push_str(&format!(", {}=\"{}\"", key, value));
    }
    header.push_str(&format!(", oauth_signature=\"{}\"", signature.as_str()));
    header
}

fn consumers(scope: &str) -> ConsumerMap {
    let mut consumers = ConsumerMap::new();
    consumers.register_consumer(defaults::CONSUMER_KEY, defaults::CONSUMER_SECRET);
    let record = TokenRecord::new(defaults::TOKEN_SECRET, defaults::OWNER, scope.parse().unwrap());
    assert!(consumers.register_token(defaults::CONSUMER_KEY, defaults::TOKEN, record));
    consumers
}
