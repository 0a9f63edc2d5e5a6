//! End-to-end authorization lifecycle: issue, refresh, revoke, introspect.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use grantstate_core::types::{Claims, ClientId, Credential, GrantType, MetaValue, ScopeSet};
use grantstate_core::{
    Authorization, CLAIMS_METADATA_NAME, FixedClock, NOT_BEFORE_CLAIM, Token,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 5, 20, 10, 0, 0).unwrap()
}

fn issued_authorization() -> Authorization {
    Authorization::with_client(ClientId::new("c1").unwrap())
        .principal_name("alice")
        .grant_type(GrantType::AuthorizationCode)
        .authorized_scopes(["read", "write"].into_iter().collect())
        .build()
        .unwrap()
}

fn access(value: &str) -> Credential {
    Credential::access(value)
        .unwrap()
        .with_lifetime(Some(now()), Some(now() + Duration::minutes(5)))
        .unwrap()
}

fn refresh(value: &str) -> Credential {
    Credential::refresh(value)
        .unwrap()
        .with_lifetime(Some(now()), Some(now() + Duration::days(30)))
        .unwrap()
}

#[test]
fn fresh_authorization_has_generated_id_and_no_tokens() {
    let authorization = issued_authorization();

    assert!(!authorization.id().as_str().is_empty());
    assert!(authorization.access_token().is_none());
    assert_eq!(
        authorization.authorized_scopes(),
        &ScopeSet::parse_delimited("read write")
    );
    assert_eq!(authorization.principal_name(), "alice");
    assert_eq!(authorization.client_id().as_str(), "c1");
}

#[test]
fn issuing_tokens_yields_active_credentials() {
    let authorization = issued_authorization();
    let issued = Authorization::from(&authorization)
        .access_token(access("A1"))
        .unwrap()
        .refresh_token(refresh("R1"))
        .unwrap()
        .build()
        .unwrap();

    let access_token = issued.access_token().unwrap();
    assert_eq!(access_token.credential().value(), "A1");
    assert!(access_token.is_active(now()));
    assert!(issued.refresh_token().unwrap().is_active(now()));
    assert_eq!(issued.id(), authorization.id());
}

#[test]
fn revoking_refresh_token_kills_access_token() {
    let issued = Authorization::from(&issued_authorization())
        .access_token(access("A1"))
        .unwrap()
        .refresh_token(refresh("R1"))
        .unwrap()
        .build()
        .unwrap();

    // Revocation collaborator: locate by raw value, invalidate, rebuild.
    let located = issued.find_token("R1").unwrap().unwrap();
    let credential = located.credential().clone();
    let revoked = Authorization::from(&issued)
        .invalidate(&credential)
        .build()
        .unwrap();

    assert!(revoked.refresh_token().unwrap().is_invalidated());
    assert!(revoked.access_token().unwrap().is_invalidated());
    assert!(!revoked.access_token().unwrap().is_active(now()));
    assert!(issued.access_token().unwrap().is_active(now()));
}

#[test]
fn not_before_claim_keeps_token_inactive() {
    let claims = Claims::new().with(NOT_BEFORE_CLAIM, now() + Duration::minutes(10));
    let authorization = Authorization::from(&issued_authorization())
        .token_with(access("A1"), |metadata| {
            metadata.with(CLAIMS_METADATA_NAME, claims)
        })
        .build()
        .unwrap();
    let token: &Token = authorization.access_token().unwrap();

    assert!(token.is_before_use(now()));
    assert!(!token.is_expired(now()));
    assert!(!token.is_invalidated());
    assert!(!token.is_active(now()));
    assert!(!token.is_active_at(&FixedClock::new(now())));
}

#[test]
fn unknown_token_value_is_absent() {
    let authorization = Authorization::from(&issued_authorization())
        .access_token(access("A1"))
        .unwrap()
        .build()
        .unwrap();
    assert!(authorization.find_token("unknown-raw-value").unwrap().is_none());
}

#[test]
fn adding_an_attribute_leaves_the_source_snapshot_alone() {
    let a = issued_authorization();
    let b = Authorization::from(&a)
        .attribute("pkce_verifier", "xyz")
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(
        b.attribute("pkce_verifier").unwrap(),
        Some(&MetaValue::from("xyz"))
    );
    assert!(a.attributes().get("pkce_verifier").is_none());
}

#[test]
fn copies_of_returned_collections_do_not_write_back() {
    let a = issued_authorization();
    let mut scopes: Vec<String> = a.authorized_scopes().iter().map(str::to_string).collect();
    scopes.push("admin".to_string());
    let attributes = a.attributes().clone().with("injected", true);

    assert_eq!(scopes.len(), 3);
    assert!(!a.authorized_scopes().contains("admin"));
    assert!(attributes.contains_key("injected"));
    assert!(a.attributes().is_empty());
}

#[test]
fn builder_reuse_after_build_does_not_touch_earlier_snapshots() {
    let a = issued_authorization();
    let mut builder = Authorization::from(&a);
    let b = builder.build().unwrap();
    assert_eq!(a, b);

    let mut builder = builder
        .principal_name("mallory")
        .token(access("A9"))
        .attribute("k", 1_i64)
        .unwrap();
    let c = builder.build().unwrap();

    assert_eq!(a, b);
    assert_eq!(b.principal_name(), "alice");
    assert!(b.access_token().is_none());
    assert_eq!(c.principal_name(), "mallory");
    assert_eq!(c.id(), a.id());
}

#[test]
fn client_credentials_principal_is_the_client() {
    let authorization = Authorization::with_client(ClientId::new("svc").unwrap())
        .principal_name("svc")
        .grant_type(GrantType::ClientCredentials)
        .token(access("A1"))
        .build()
        .unwrap();
    assert!(authorization.grant_type().is_client_only());
    assert!(authorization.refresh_token().is_none());
}

#[test]
fn snapshots_are_shareable_across_threads() {
    let authorization = Authorization::from(&issued_authorization())
        .access_token(access("A1"))
        .unwrap()
        .build()
        .unwrap();
    let shared = Arc::new(authorization);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || shared.access_token().unwrap().is_active(now()))
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
