//! Reading and writing the token pair in the local store

use tracing::debug;

use super::types::{Credential, TokenResponse};
use crate::storage::{keys, LocalStore, StorageResult};

/// Values a browser store leaves behind for a token that was never set
fn is_unset(value: &str) -> bool {
    value.is_empty() || value == "undefined" || value == "null"
}

/// Load the credential currently held in `store`.
///
/// Returns `None` when no access token is stored.
///
/// # Errors
/// Propagates store read failures.
pub fn load_credential(store: &dyn LocalStore) -> StorageResult<Option<Credential>> {
    let access_token = store.get_item(keys::ACCESS_TOKEN)?.filter(|t| !is_unset(t));
    let refresh_token = store.get_item(keys::REFRESH_TOKEN)?.filter(|t| !is_unset(t));
    Ok(access_token.map(|access| Credential::new(access, refresh_token)))
}

/// Persist the fields present in `tokens`; absent fields keep their
/// previous values.
///
/// # Errors
/// Propagates store write failures.
pub fn set_token(store: &dyn LocalStore, tokens: &TokenResponse) -> StorageResult<()> {
    if let Some(access) = tokens.access_token.as_deref().filter(|t| !t.is_empty()) {
        store.set_item(keys::ACCESS_TOKEN, access)?;
    }
    if let Some(refresh) = tokens.refresh_token.as_deref().filter(|t| !t.is_empty()) {
        store.set_item(keys::REFRESH_TOKEN, refresh)?;
    }
    debug!(
        access = tokens.access_token.is_some(),
        refresh = tokens.refresh_token.is_some(),
        "tokens stored"
    );
    Ok(())
}

/// Remove both tokens.
///
/// # Errors
/// Propagates store write failures.
pub fn clear_credential(store: &dyn LocalStore) -> StorageResult<()> {
    store.remove_item(keys::ACCESS_TOKEN)?;
    store.remove_item(keys::REFRESH_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn set_token_writes_only_present_fields() {
        let store = MemoryStore::with_items([(keys::ACCESS_TOKEN, "a1"), (keys::REFRESH_TOKEN, "r1")]);

        let partial = TokenResponse { access_token: Some("a2".to_string()), refresh_token: None };
        set_token(&store, &partial).unwrap();

        let credential = load_credential(&store).unwrap().unwrap();
        assert_eq!(credential.access_token, "a2");
        assert_eq!(credential.refresh_token.as_deref(), Some("r1"));
    }

    #[test]
    fn placeholder_refresh_token_counts_as_missing() {
        let store =
            MemoryStore::with_items([(keys::ACCESS_TOKEN, "a1"), (keys::REFRESH_TOKEN, "undefined")]);
        let credential = load_credential(&store).unwrap().unwrap();
        assert!(credential.refresh_token.is_none());
    }

    #[test]
    fn clear_removes_both_tokens() {
        let store = MemoryStore::with_items([(keys::ACCESS_TOKEN, "a1"), (keys::REFRESH_TOKEN, "r1")]);
        clear_credential(&store).unwrap();
        assert!(load_credential(&store).unwrap().is_none());
        assert!(store.is_empty());
    }
}
