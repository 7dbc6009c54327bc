//! Credential collection and scheme negotiation
//!
//! # Design
//!
//! - At most one scheme per concrete [`AuthKind`]; adding a scheme of a kind
//!   already held replaces it
//! - Schemes are kept sorted by `(priority, kind)`, most preferred first
//! - Negotiation is a greedy walk: the first held scheme compatible with any
//!   acceptable kind wins
//!
//! # Thread Safety
//!
//! The held schemes sit behind a read-write lock. Negotiation takes a read
//! lock and returns an `Arc` to the chosen scheme, so a concurrent [`add`]
//! never invalidates a scheme a caller is already using.
//!
//! [`add`]: AuthCollection::add
//!
//! # Example
//!
//! ```
//! use kagi_auth::auth::{AuthCollection, AuthKind, BasicHeaderAuth, QueryParamsAuth};
//!
//! let auth = AuthCollection::new();
//! auth.add(BasicHeaderAuth::new("key", "secret"));
//! auth.add(QueryParamsAuth::new("key", "secret"));
//!
//! let chosen = auth
//!     .select_acceptable(&[AuthKind::QueryParams, AuthKind::SignedToken])
//!     .unwrap();
//! assert_eq!(chosen.kind(), AuthKind::QueryParams);
//! ```

use super::{AuthError, AuthKind, AuthMethod};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
pub struct AuthCollection {
    methods: RwLock<Vec<Arc<AuthMethod>>>,
}

impl AuthCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection from several schemes
    ///
    /// Later schemes replace earlier ones of the same kind.
    pub fn with_methods<I, M>(methods: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<AuthMethod>,
    {
        let collection = Self::new();
        for method in methods {
            collection.add(method);
        }
        collection
    }

    /// Add a scheme, replacing any held scheme of the same kind
    pub fn add(&self, method: impl Into<AuthMethod>) {
        let method = method.into();
        let kind = method.kind();
        let mut methods = self.methods.write();

        let before = methods.len();
        methods.retain(|held| held.kind() != kind);
        let replaced = methods.len() != before;

        methods.push(Arc::new(method));
        methods.sort_by_key(|held| (held.priority(), held.kind()));

        info!(auth.method = ?kind, replaced, "Registered authentication method");
    }

    /// First held scheme of exactly `kind`
    pub fn get_by_kind(&self, kind: AuthKind) -> Result<Arc<AuthMethod>, AuthError> {
        let methods = self.methods.read();
        methods
            .iter()
            .find(|held| held.kind() == kind)
            .cloned()
            .ok_or_else(|| AuthError::no_acceptable(&kinds_of(&methods), &[kind]))
    }

    /// Most preferred held scheme compatible with any of `acceptable`
    pub fn select_acceptable(&self, acceptable: &[AuthKind]) -> Result<Arc<AuthMethod>, AuthError> {
        let methods = self.methods.read();
        for held in methods.iter() {
            if acceptable.iter().any(|&kind| held.is_compatible_with(kind)) {
                debug!(auth.method = ?held.kind(), "Selected authentication method");
                return Ok(Arc::clone(held));
            }
        }

        debug!(
            held = ?kinds_of(&methods),
            acceptable = ?acceptable,
            "No acceptable authentication method"
        );
        Err(AuthError::no_acceptable(&kinds_of(&methods), acceptable))
    }

    /// Whether a scheme of exactly `kind` is held
    pub fn has_kind(&self, kind: AuthKind) -> bool {
        self.methods.read().iter().any(|held| held.kind() == kind)
    }

    /// API key of the most preferred scheme that carries one
    pub fn api_key(&self) -> Result<String, AuthError> {
        let method = self.select_acceptable(&[AuthKind::ApiKey])?;
        method
            .api_key()
            .map(str::to_string)
            .ok_or_else(|| AuthError::no_acceptable(&[method.kind()], &[AuthKind::ApiKey]))
    }

    /// Held kinds, most preferred first
    pub fn kinds(&self) -> Vec<AuthKind> {
        kinds_of(&self.methods.read())
    }

    pub fn len(&self) -> usize {
        self.methods.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.read().is_empty()
    }
}

fn kinds_of(methods: &[Arc<AuthMethod>]) -> Vec<AuthKind> {
    methods.iter().map(|held| held.kind()).collect()
}

impl fmt::Debug for AuthCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCollection")
            .field("methods", &self.kinds())
            .finish()
    }
}
