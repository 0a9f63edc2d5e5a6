use std::fmt;

use grantstate_core::Authorization;
use grantstate_core::types::TokenKind;

/// Narrows [`find_by_token`](crate::AuthorizationStore::find_by_token) to one kind of value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenLookup {
    /// Only credentials of this kind.
    Kind(TokenKind),
    /// Only the `state` attribute of an in-flight authorization request.
    State,
}

impl TokenLookup {
    /// Map an introspection/revocation `token_type_hint` onto a lookup.
    #[must_use]
    pub fn from_hint(hint: &str) -> Option<Self> {
        if hint == "state" {
            return Some(TokenLookup::State);
        }
        TokenKind::parse(hint).ok().map(TokenLookup::Kind)
    }
}

impl fmt::Display for TokenLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenLookup::Kind(kind) => f.write_str(kind.as_str()),
            TokenLookup::State => f.write_str("state"),
        }
    }
}

/// How well `authorization` matches `value` in the place `lookup` points at.
///
/// `Some(0)` is a credential match, `Some(1)` a `state` match, `None` no
/// match. With no lookup both places are checked and a credential match wins.
pub(crate) fn match_rank(
    authorization: &Authorization,
    value: &str,
    lookup: Option<TokenLookup>,
) -> Option<u8> {
    let holds_credential = || {
        authorization
            .tokens()
            .any(|token| token.credential().value() == value)
    };
    let holds_state = || authorization.state() == Some(value);
    match lookup {
        Some(TokenLookup::State) => holds_state().then_some(1),
        Some(TokenLookup::Kind(kind)) => authorization
            .token(kind)
            .is_some_and(|token| token.credential().value() == value)
            .then_some(0),
        None if holds_credential() => Some(0),
        None => holds_state().then_some(1),
    }
}

#[cfg(test)]
mod tests {
    use grantstate_core::Authorization;
    use grantstate_core::types::{ClientId, Credential, GrantType, TokenKind};

    use super::{TokenLookup, match_rank};

    fn pending() -> Authorization {
        Authorization::with_client(ClientId::new("c1").unwrap())
            .principal_name("alice")
            .grant_type(GrantType::AuthorizationCode)
            .attribute("state", "st-1")
            .unwrap()
            .token(Credential::authorization_code("code-1").unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn hint_parsing() {
        assert_eq!(TokenLookup::from_hint("state"), Some(TokenLookup::State));
        assert_eq!(
            TokenLookup::from_hint("refresh_token"),
            Some(TokenLookup::Kind(TokenKind::Refresh))
        );
        assert_eq!(TokenLookup::from_hint("nonsense"), None);
    }

    #[test]
    fn lookup_filters_by_place() {
        let authorization = pending();
        assert_eq!(match_rank(&authorization, "st-1", None), Some(1));
        assert_eq!(match_rank(&authorization, "code-1", None), Some(0));
        assert_eq!(
            match_rank(&authorization, "st-1", Some(TokenLookup::State)),
            Some(1)
        );
        assert_eq!(
            match_rank(&authorization, "code-1", Some(TokenLookup::State)),
            None
        );
        assert_eq!(
            match_rank(
                &authorization,
                "code-1",
                Some(TokenLookup::Kind(TokenKind::AuthorizationCode))
            ),
            Some(0)
        );
        assert_eq!(
            match_rank(
                &authorization,
                "code-1",
                Some(TokenLookup::Kind(TokenKind::Access))
            ),
            None
        );
        assert_eq!(match_rank(&authorization, "other", None), None);
    }
}
