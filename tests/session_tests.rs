//! Session manager tests
//! Login, logout, restore-after-reload and failure handling against a real
//! file store and the in-process authenticator

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use carehub::auth::{
    create_token, Authenticator, DirectoryAuthenticator, FileSessionStore, Identity, LoginRequest,
    LoginResponse, MemorySessionStore, Role, Session, SessionManager, SessionState, SessionStore,
    UserDirectory,
};
use carehub::error::{Error, Result};
use carehub::gate::{Decision, Gate, RouteTable};

const SECRET: &[u8] = b"session-test-secret";

async fn directory_authenticator() -> Arc<DirectoryAuthenticator> {
    let directory = Arc::new(UserDirectory::with_demo_accounts(4).await.unwrap());
    Arc::new(DirectoryAuthenticator::new(directory, SECRET.to_vec(), 3600))
}

/// Never answers within any reasonable timeout
struct StalledAuthenticator;

#[async_trait]
impl Authenticator for StalledAuthenticator {
    async fn authenticate(&self, _credentials: &LoginRequest) -> Result<LoginResponse> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(Error::Other("unreachable".to_string()))
    }
}

/// Answers after a per-user delay
struct DelayedAuthenticator;

#[async_trait]
impl Authenticator for DelayedAuthenticator {
    async fn authenticate(&self, credentials: &LoginRequest) -> Result<LoginResponse> {
        let (delay, id, role) = match credentials.username.as_str() {
            "slow" => (200, 1, Role::Admin),
            _ => (10, 2, Role::Nurse),
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(LoginResponse {
            token: format!("token-{}", credentials.username),
            user: Identity::new(id, credentials.username.clone(), role),
        })
    }
}

/// Memory store whose next `failures` saves write half a session and then fail
struct FailingStore {
    inner: MemorySessionStore,
    failures: AtomicUsize,
}

impl FailingStore {
    fn new(failures: usize) -> Self {
        Self {
            inner: MemorySessionStore::new(),
            failures: AtomicUsize::new(failures),
        }
    }
}

impl SessionStore for FailingStore {
    fn save(&self, session: &Session) -> Result<()> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !failing {
            return self.inner.save(session);
        }

        // Leave the previous token next to the new user, like a write cut short
        let user = serde_json::to_string(&session.identity)?;
        let token = self.inner.raw_token();
        self.inner.put_raw(token.as_deref(), Some(&user));
        Err(Error::Other("disk full".to_string()))
    }

    fn load(&self) -> Option<Session> {
        self.inner.load()
    }

    fn clear(&self) -> Result<()> {
        self.inner.clear()
    }
}

#[tokio::test]
async fn test_login_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let authenticator = directory_authenticator().await;

    let manager = SessionManager::restored(
        Arc::new(FileSessionStore::new(dir.path())),
        authenticator.clone(),
    )
    .await;
    let identity = manager.login("doctor", "doctor123").await.unwrap();
    assert_eq!(identity.role, Role::Doctor);

    // A fresh manager over the same directory stands in for a process restart
    let reloaded = SessionManager::new(Arc::new(FileSessionStore::new(dir.path())), authenticator);
    assert!(reloaded.is_loading().await);
    reloaded.restore().await;

    assert_eq!(reloaded.current_identity().await, Some(identity));
    assert!(reloaded.has_role(Role::Doctor).await);
}

#[tokio::test]
async fn test_wrong_password_keeps_anonymous() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileSessionStore::new(dir.path()));
    let manager = SessionManager::restored(store.clone(), directory_authenticator().await).await;

    let err = manager.login("nurse", "wrong-password").await.unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(err.to_string(), "Invalid credentials");

    assert_eq!(manager.state().await, SessionState::Anonymous);
    assert!(store.load().is_none());
    assert!(!dir.path().join("token").exists());
}

#[tokio::test]
async fn test_failed_login_keeps_existing_session() {
    let store = Arc::new(MemorySessionStore::new());
    let manager = SessionManager::restored(store.clone(), directory_authenticator().await).await;

    manager.login("admin", "admin123").await.unwrap();
    let before = manager.state().await;

    assert!(manager.login("admin", "nope").await.is_err());
    assert_eq!(manager.state().await, before);
    assert_eq!(store.load().map(|s| s.identity.role), Some(Role::Admin));
}

#[tokio::test]
async fn test_save_failure_leaves_anonymous_and_empty_store() {
    let store = Arc::new(FailingStore::new(1));
    let manager = SessionManager::restored(store.clone(), directory_authenticator().await).await;

    let err = manager.login("doctor", "doctor123").await.unwrap_err();
    assert_eq!(err.to_string(), "disk full");
    assert!(!err.is_rejection());

    assert_eq!(manager.state().await, SessionState::Anonymous);
    assert!(store.load().is_none());
    assert!(store.inner.raw_token().is_none());
}

#[tokio::test]
async fn test_save_failure_keeps_previous_session_on_disk() {
    let store = Arc::new(FailingStore::new(0));
    let manager = SessionManager::restored(store.clone(), directory_authenticator().await).await;
    manager.login("patient", "patient123").await.unwrap();
    let before = manager.state().await;

    store.failures.store(1, Ordering::SeqCst);
    assert!(manager.login("admin", "admin123").await.is_err());

    // Memory and storage both still hold the patient session
    assert_eq!(manager.state().await, before);
    match &before {
        SessionState::Authenticated(session) => assert_eq!(store.load().as_ref(), Some(session)),
        other => panic!("expected a patient session, got {:?}", other),
    }
    assert!(!manager.has_role(Role::Admin).await);

    // A restart over the same storage sees the same user
    let reloaded = SessionManager::restored(store.clone(), directory_authenticator().await).await;
    assert_eq!(reloaded.state().await, before);
}

#[tokio::test]
async fn test_logout_twice() {
    let store = Arc::new(MemorySessionStore::new());
    let manager = SessionManager::restored(store.clone(), directory_authenticator().await).await;
    manager.login("intern", "intern123").await.unwrap();

    manager.logout().await;
    assert_eq!(manager.state().await, SessionState::Anonymous);
    manager.logout().await;
    assert_eq!(manager.state().await, SessionState::Anonymous);
    assert!(store.load().is_none());
}

#[tokio::test]
async fn test_login_timeout_is_a_failure() {
    let store = Arc::new(MemorySessionStore::new());
    let manager = SessionManager::restored(store.clone(), Arc::new(StalledAuthenticator))
        .await
        .with_login_timeout(Duration::from_millis(50));

    let err = manager.login("admin", "admin123").await.unwrap_err();
    assert!(matches!(err, Error::LoginTimeout(_)));
    assert_eq!(manager.state().await, SessionState::Anonymous);
    assert!(store.raw_token().is_none());
}

#[tokio::test]
async fn test_overlapping_logins_last_to_finish_wins() {
    let store = Arc::new(MemorySessionStore::new());
    let manager = SessionManager::restored(store.clone(), Arc::new(DelayedAuthenticator)).await;

    let (slow, fast) = tokio::join!(manager.login("slow", "x"), manager.login("fast", "x"));
    slow.unwrap();
    fast.unwrap();

    let current = manager.current_identity().await.unwrap();
    assert_eq!(current.name, "slow");
    assert_eq!(store.load().unwrap().identity, current);
}

#[tokio::test]
async fn test_expired_session_restores_anonymous() {
    let store = Arc::new(MemorySessionStore::new());
    let identity = Identity::new(3, "System Administrator", Role::Superadmin);
    let stale = create_token(&identity, SECRET, -300).unwrap();
    store.save(&Session::new(stale, identity)).unwrap();

    let manager = SessionManager::restored(store.clone(), directory_authenticator().await).await;
    assert_eq!(manager.state().await, SessionState::Anonymous);
    assert!(store.raw_token().is_none());
}

#[tokio::test]
async fn test_check_expiry_logs_out() {
    let store = Arc::new(MemorySessionStore::new());
    let directory = Arc::new(UserDirectory::with_demo_accounts(4).await.unwrap());
    let short_lived = Arc::new(DirectoryAuthenticator::new(directory, SECRET.to_vec(), -300));
    let manager = SessionManager::restored(store, short_lived).await;

    manager.login("nurse", "nurse123").await.unwrap();
    assert!(manager.check_expiry().await);
    assert!(!manager.is_authenticated().await);
    assert!(!manager.check_expiry().await);
}

#[tokio::test]
async fn test_corrupt_store_restores_anonymous() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("token"), "sample-jwt-token").unwrap();
    std::fs::write(dir.path().join("user"), "{\"id\": \"oops\"").unwrap();

    let manager = SessionManager::restored(
        Arc::new(FileSessionStore::new(dir.path())),
        directory_authenticator().await,
    )
    .await;
    assert_eq!(manager.state().await, SessionState::Anonymous);
}

#[tokio::test]
async fn test_gate_pending_until_restored() {
    let store = Arc::new(MemorySessionStore::new());
    store
        .save(&Session::new("sample-jwt-token", Identity::new(4, "Nancy White", Role::Nurse)))
        .unwrap();

    let manager = SessionManager::new(store, directory_authenticator().await);
    let gate = Gate::new(manager.clone(), RouteTable::carehub());

    assert_eq!(gate.check("/patients").await, Decision::Pending);
    manager.restore().await;
    assert_eq!(gate.check("/patients").await, Decision::Render);
}

#[tokio::test]
async fn test_gate_follows_login_and_logout() {
    let manager = SessionManager::restored(
        Arc::new(MemorySessionStore::new()),
        directory_authenticator().await,
    )
    .await;
    let gate = Gate::new(manager.clone(), RouteTable::carehub());

    assert_eq!(gate.check("/patients").await, Decision::RedirectToLogin);
    assert_eq!(gate.check("/not-a-route").await, Decision::Render);

    manager.login("patient", "patient123").await.unwrap();
    assert_eq!(
        gate.check("/patients").await,
        Decision::RedirectTo("/unauthorized".to_string())
    );
    assert_eq!(gate.check("/dashboard").await, Decision::Render);

    manager.logout().await;
    assert_eq!(gate.check_settled("/dashboard").await, Decision::RedirectToLogin);
}

#[tokio::test]
async fn test_blog_edit_requires_ownership() {
    let manager = SessionManager::restored(
        Arc::new(MemorySessionStore::new()),
        directory_authenticator().await,
    )
    .await;
    let gate = Gate::new(manager.clone(), RouteTable::carehub());

    assert_eq!(gate.check_blog_edit("/blogs/edit/3", 7).await, Decision::RedirectToLogin);

    // The demo doctor has id 2
    let doctor = manager.login("doctor", "doctor123").await.unwrap();
    assert_eq!(
        gate.check_blog_edit("/blogs/edit/3", 7).await,
        Decision::RedirectTo("/blogs/3".to_string())
    );
    assert_eq!(gate.check_blog_edit("/blogs/edit/3", doctor.id).await, Decision::Render);
    // Public blog pages are not subject to the ownership rule
    assert_eq!(gate.check_blog_edit("/blogs/3", 7).await, Decision::Render);

    manager.login("admin", "admin123").await.unwrap();
    assert_eq!(gate.check_blog_edit("/blogs/edit/3", 7).await, Decision::Render);

    // Role check still comes first
    manager.login("nurse", "nurse123").await.unwrap();
    assert_eq!(
        gate.check_blog_edit("/blogs/edit/3", 4).await,
        Decision::RedirectTo("/unauthorized".to_string())
    );
}
