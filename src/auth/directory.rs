//! In-memory user directory backing the local authentication endpoint

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::auth::models::{Identity, Role, SignupRequest};
use crate::error::{Error, Result};

/// A registered account
#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub password_hash: String,
    pub identity: Identity,
}

/// Accounts keyed by username
pub struct UserDirectory {
    accounts: RwLock<HashMap<String, Account>>,
    cost: u32,
}

impl UserDirectory {
    /// Create an empty directory hashing with the given bcrypt cost
    pub fn new(cost: u32) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            cost,
        }
    }

    /// Directory seeded with one account per role
    pub async fn with_demo_accounts(cost: u32) -> Result<Self> {
        let directory = Self::new(cost);
        let seed = [
            ("admin", "admin123", Role::Admin, "Administrator", "admin@carehub.com", "Administration"),
            ("doctor", "doctor123", Role::Doctor, "Dr. Sarah Williams", "sarah.williams@carehub.com", "Cardiology"),
            ("superadmin", "super123", Role::Superadmin, "System Administrator", "sysadmin@carehub.com", "IT"),
            ("nurse", "nurse123", Role::Nurse, "Nancy White", "nancy.white@carehub.com", "Emergency"),
            ("intern", "intern123", Role::Intern, "Dr. Michael Lee", "michael.lee@carehub.com", "Pediatrics"),
            ("patient", "patient123", Role::Patient, "John Doe", "john.doe@example.com", ""),
        ];

        for (username, password, role, name, email, department) in seed {
            directory
                .register(SignupRequest {
                    username: username.to_string(),
                    password: password.to_string(),
                    role: role.to_string(),
                    name: name.to_string(),
                    email: Some(email.to_string()),
                    phone: None,
                    department: (!department.is_empty()).then(|| department.to_string()),
                })
                .await?;
        }

        Ok(directory)
    }

    /// Register an account, returning its id
    pub async fn register(&self, request: SignupRequest) -> Result<u64> {
        let role: Role = request.role.parse()?;
        let password_hash = hash_password(request.password.clone(), self.cost).await?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&request.username) {
            return Err(Error::UserExists(format!("Username '{}'", request.username)));
        }
        if let Some(email) = &request.email {
            let taken = accounts
                .values()
                .any(|account| account.identity.email.as_deref() == Some(email.as_str()));
            if taken {
                return Err(Error::UserExists(format!("Email '{}'", email)));
            }
        }

        let id = accounts.values().map(|a| a.identity.id).max().unwrap_or(0) + 1;
        let mut identity = Identity::new(id, request.name, role);
        identity.email = request.email;
        identity.phone = request.phone;
        identity.department = request.department;

        tracing::info!("Registered user '{}' with role {}", request.username, role);
        accounts.insert(
            request.username.clone(),
            Account {
                username: request.username,
                password_hash,
                identity,
            },
        );
        Ok(id)
    }

    /// Check credentials and return the account's identity
    pub async fn verify(&self, username: &str, password: &str) -> Result<Identity> {
        // Copy out what we need so the lock is not held while hashing
        let (password_hash, identity) = {
            let accounts = self.accounts.read().await;
            let account = accounts.get(username).ok_or(Error::InvalidCredentials)?;
            (account.password_hash.clone(), account.identity.clone())
        };

        if verify_password(password.to_string(), password_hash).await? {
            Ok(identity)
        } else {
            Err(Error::InvalidCredentials)
        }
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

async fn hash_password(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| Error::Other(format!("Password hashing task failed: {}", e)))?
        .map_err(Error::from)
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| Error::Other(format!("Password check task failed: {}", e)))?
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, email: Option<&str>, role: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            password: "secret".to_string(),
            role: role.to_string(),
            name: username.to_string(),
            email: email.map(str::to_string),
            phone: None,
            department: None,
        }
    }

    #[tokio::test]
    async fn test_register_and_verify() {
        let directory = UserDirectory::new(4);
        let id = directory.register(signup("alice", None, "nurse")).await.unwrap();

        let identity = directory.verify("alice", "secret").await.unwrap();
        assert_eq!(identity.id, id);
        assert_eq!(identity.role, Role::Nurse);
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let directory = UserDirectory::new(4);
        directory.register(signup("alice", None, "nurse")).await.unwrap();

        let err = directory.verify("alice", "wrong").await.unwrap_err();
        assert!(err.is_rejection());
        assert!(directory.verify("bob", "secret").await.unwrap_err().is_rejection());
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let directory = UserDirectory::new(4);
        directory
            .register(signup("alice", Some("a@carehub.com"), "nurse"))
            .await
            .unwrap();

        assert!(matches!(
            directory.register(signup("alice", None, "doctor")).await,
            Err(Error::UserExists(_))
        ));
        assert!(matches!(
            directory.register(signup("bob", Some("a@carehub.com"), "doctor")).await,
            Err(Error::UserExists(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_logins_do_not_block_signup() {
        let directory = std::sync::Arc::new(UserDirectory::new(4));
        directory.register(signup("alice", None, "nurse")).await.unwrap();

        let logins: Vec<_> = (0..8)
            .map(|_| {
                let directory = directory.clone();
                tokio::spawn(async move { directory.verify("alice", "secret").await })
            })
            .collect();
        directory.register(signup("bob", None, "doctor")).await.unwrap();

        for login in logins {
            assert_eq!(login.await.unwrap().unwrap().role, Role::Nurse);
        }
        assert_eq!(directory.verify("bob", "secret").await.unwrap().role, Role::Doctor);
    }

    #[tokio::test]
    async fn test_unknown_role_rejected() {
        let directory = UserDirectory::new(4);
        assert!(matches!(
            directory.register(signup("alice", None, "Admin")).await,
            Err(Error::InvalidRole(_))
        ));
        assert!(directory.is_empty().await);
    }

    #[tokio::test]
    async fn test_demo_accounts_cover_every_role() {
        let directory = UserDirectory::with_demo_accounts(4).await.unwrap();
        assert_eq!(directory.len().await, Role::ALL.len());

        let patient = directory.verify("patient", "patient123").await.unwrap();
        assert_eq!(patient.role, Role::Patient);
        assert!(patient.department.is_none());
    }
}
