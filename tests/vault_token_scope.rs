//! Integration tests for scoped Vault token injection
//!
//! These tests mutate `VAULT_TOKEN`, so they live in their own test binary and
//! run as a single test function to keep the process environment predictable.

use credbroker::credmgrs::token::{ScopedVaultToken, VAULT_TOKEN_ENV};
use credbroker::CredentialError;
use std::env;
use std::io::Write;
use std::sync::Arc;
use std::thread;

fn sink(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_token_scope_lifecycle() {
    let original = env::var(VAULT_TOKEN_ENV).ok();
    env::remove_var(VAULT_TOKEN_ENV);

    // Sink token is injected only while the guard lives
    let file = sink("s.fromsink\n");
    {
        let scoped = ScopedVaultToken::acquire(Some(file.path())).unwrap();
        assert!(scoped.injected());
        assert_eq!(scoped.token(), "s.fromsink");
        assert_eq!(env::var(VAULT_TOKEN_ENV).unwrap(), "s.fromsink");
    }
    assert!(env::var(VAULT_TOKEN_ENV).is_err());

    // The sink is re-read every time
    std::fs::write(file.path(), "s.rotated").unwrap();
    let scoped = ScopedVaultToken::acquire(Some(file.path())).unwrap();
    assert_eq!(scoped.token(), "s.rotated");
    drop(scoped);
    assert!(env::var(VAULT_TOKEN_ENV).is_err());

    // Unusable sinks fail without touching the environment
    let empty = sink("  \n");
    let err = ScopedVaultToken::acquire(Some(empty.path())).unwrap_err();
    assert!(matches!(err, CredentialError::BackendUnavailable { .. }));
    let err = ScopedVaultToken::acquire(None).unwrap_err();
    assert!(matches!(err, CredentialError::BackendUnavailable { .. }));
    let missing = std::path::Path::new("/nonexistent/vault-token");
    assert!(ScopedVaultToken::acquire(Some(missing)).is_err());
    assert!(env::var(VAULT_TOKEN_ENV).is_err());

    // Cleared even when the holder panics
    let path = file.path().to_path_buf();
    let panicked = thread::spawn(move || {
        let _scoped = ScopedVaultToken::acquire(Some(path.as_path())).unwrap();
        panic!("client build failed");
    })
    .join();
    assert!(panicked.is_err());
    assert!(env::var(VAULT_TOKEN_ENV).is_err());

    // Concurrent holders never observe each other's token
    let sinks: Arc<Vec<_>> = Arc::new((0..8).map(|i| sink(&format!("s.token{}", i))).collect());
    let workers: Vec<_> = (0..8)
        .map(|i| {
            let sinks = sinks.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    let scoped = ScopedVaultToken::acquire(Some(sinks[i].path())).unwrap();
                    assert_eq!(env::var(VAULT_TOKEN_ENV).unwrap(), format!("s.token{}", i));
                    drop(scoped);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert!(env::var(VAULT_TOKEN_ENV).is_err());

    // An ambient token wins and is left in place
    env::set_var(VAULT_TOKEN_ENV, "s.ambient");
    {
        let scoped = ScopedVaultToken::acquire(Some(file.path())).unwrap();
        assert!(!scoped.injected());
        assert_eq!(scoped.token(), "s.ambient");
    }
    assert_eq!(env::var(VAULT_TOKEN_ENV).unwrap(), "s.ambient");

    match original {
        Some(token) => env::set_var(VAULT_TOKEN_ENV, token),
        None => env::remove_var(VAULT_TOKEN_ENV),
    }
}
