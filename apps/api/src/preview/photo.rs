//! Photo resolver: turns the resume's photo state into something an `<img>` can show.
//!
//! A pending (not yet uploaded) photo is exposed through a temporary object URL
//! served from memory. Each object URL is an [`ObjectUrl`] guard: it is
//! revoked exactly once, when the guard drops, which happens on every exit
//! path of the state machine (new photo, removal, session teardown).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::resume::model::{PendingPhoto, PhotoValue};

/// Route prefix object URLs are served under.
pub const OBJECT_URL_PREFIX: &str = "/api/v1/photos/";

// ────────────────────────────────────────────────────────────────────────────
// Object URL registry
// ────────────────────────────────────────────────────────────────────────────

/// Acquisition/release counters, exposed for instrumentation and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectUrlStats {
    pub created: usize,
    pub revoked: usize,
    pub live: usize,
}

#[derive(Default)]
struct RegistryInner {
    entries: Mutex<HashMap<Uuid, PendingPhoto>>,
    created: AtomicUsize,
    revoked: AtomicUsize,
}

impl RegistryInner {
    fn entries(&self) -> MutexGuard<'_, HashMap<Uuid, PendingPhoto>> {
        // The map holds plain data; a panic mid-insert cannot leave it inconsistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared store of pending photos reachable through object URLs.
#[derive(Clone, Default)]
pub struct ObjectUrlRegistry {
    inner: Arc<RegistryInner>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `photo` reachable under a fresh token until the returned guard drops.
    pub fn create(&self, photo: &PendingPhoto) -> ObjectUrl {
        let token = Uuid::new_v4();
        self.inner.entries().insert(token, photo.clone());
        self.inner.created.fetch_add(1, Ordering::SeqCst);
        debug!("Created object URL {token} for photo {}", photo.id);
        ObjectUrl {
            token,
            photo_id: photo.id,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Looks up the photo behind a live token.
    pub fn get(&self, token: Uuid) -> Option<PendingPhoto> {
        self.inner.entries().get(&token).cloned()
    }

    pub fn stats(&self) -> ObjectUrlStats {
        ObjectUrlStats {
            created: self.inner.created.load(Ordering::SeqCst),
            revoked: self.inner.revoked.load(Ordering::SeqCst),
            live: self.inner.entries().len(),
        }
    }
}

/// A live object URL. Revoked when dropped.
pub struct ObjectUrl {
    token: Uuid,
    photo_id: Uuid,
    registry: Arc<RegistryInner>,
}

impl ObjectUrl {
    /// Id of the pending photo this URL points at.
    pub fn photo_id(&self) -> Uuid {
        self.photo_id
    }

    pub fn href(&self) -> String {
        format!("{OBJECT_URL_PREFIX}{}", self.token)
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        if self.registry.entries().remove(&self.token).is_some() {
            self.registry.revoked.fetch_add(1, Ordering::SeqCst);
            debug!("Revoked object URL {}", self.token);
        }
    }
}

impl std::fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectUrl")
            .field("token", &self.token)
            .field("photo_id", &self.photo_id)
            .finish()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resolver state machine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum DisplayedPhoto {
    Nothing,
    Local(ObjectUrl),
    Remote(String),
}

/// Tracks what photo is on screen for one editing view.
#[derive(Debug)]
pub struct PhotoResolver {
    registry: ObjectUrlRegistry,
    displayed: DisplayedPhoto,
}

impl PhotoResolver {
    pub fn new(registry: ObjectUrlRegistry) -> Self {
        Self {
            registry,
            displayed: DisplayedPhoto::Nothing,
        }
    }

    /// Moves to the state described by `photo`. Replacing a local reference drops
    /// (and so revokes) the previous one.
    pub fn resolve(&mut self, photo: &PhotoValue) {
        let next = match photo {
            PhotoValue::Pending(pending) => {
                if let DisplayedPhoto::Local(current) = &self.displayed {
                    if current.photo_id() == pending.id {
                        return;
                    }
                }
                DisplayedPhoto::Local(self.registry.create(pending))
            }
            PhotoValue::Persisted(url) => DisplayedPhoto::Remote(url.clone()),
            PhotoValue::Removed | PhotoValue::Absent => DisplayedPhoto::Nothing,
        };
        self.displayed = next;
    }

    /// Image source to render, if any.
    pub fn src(&self) -> Option<String> {
        match &self.displayed {
            DisplayedPhoto::Nothing => None,
            DisplayedPhoto::Local(url) => Some(url.href()),
            DisplayedPhoto::Remote(url) => Some(url.clone()),
        }
    }
}

impl std::fmt::Debug for ObjectUrlRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectUrlRegistry")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn pending(tag: &'static [u8]) -> PhotoValue {
        PhotoValue::Pending(PendingPhoto::new(Bytes::from_static(tag), "image/png", None))
    }

    #[test]
    fn test_pending_photo_gets_object_url() {
        let registry = ObjectUrlRegistry::new();
        let mut resolver = PhotoResolver::new(registry.clone());
        resolver.resolve(&pending(b"a"));

        let src = resolver.src().expect("pending photo should be displayed");
        assert!(src.starts_with(OBJECT_URL_PREFIX));
        let token: Uuid = src[OBJECT_URL_PREFIX.len()..].parse().unwrap();
        assert_eq!(registry.get(token).unwrap().bytes, Bytes::from_static(b"a"));
    }

    #[test]
    fn test_pending_to_removed_releases_exactly_once() {
        let registry = ObjectUrlRegistry::new();
        let mut resolver = PhotoResolver::new(registry.clone());
        resolver.resolve(&pending(b"a"));
        resolver.resolve(&PhotoValue::Removed);

        assert_eq!(resolver.src(), None);
        assert_eq!(
            registry.stats(),
            ObjectUrlStats {
                created: 1,
                revoked: 1,
                live: 0
            }
        );

        // Teardown after removal must not release again.
        drop(resolver);
        assert_eq!(registry.stats().revoked, 1);
    }

    #[test]
    fn test_repeated_photo_swaps_do_not_leak() {
        let registry = ObjectUrlRegistry::new();
        let mut resolver = PhotoResolver::new(registry.clone());
        for _ in 0..10 {
            resolver.resolve(&pending(b"x"));
        }
        let stats = registry.stats();
        assert_eq!(stats.created, 10);
        assert_eq!(stats.revoked, 9);
        assert_eq!(stats.live, 1);

        drop(resolver);
        assert_eq!(registry.stats().live, 0);
        assert_eq!(registry.stats().revoked, 10);
    }

    #[test]
    fn test_resolving_same_pending_photo_keeps_reference() {
        let registry = ObjectUrlRegistry::new();
        let mut resolver = PhotoResolver::new(registry.clone());
        let photo = pending(b"same");
        resolver.resolve(&photo);
        let first = resolver.src();
        resolver.resolve(&photo);
        assert_eq!(resolver.src(), first);
        assert_eq!(registry.stats().created, 1);
    }

    #[test]
    fn test_persisted_url_uses_no_object_url() {
        let registry = ObjectUrlRegistry::new();
        let mut resolver = PhotoResolver::new(registry.clone());
        resolver.resolve(&pending(b"a"));
        resolver.resolve(&PhotoValue::Persisted("https://cdn.test/me.png".into()));

        assert_eq!(resolver.src().as_deref(), Some("https://cdn.test/me.png"));
        assert_eq!(registry.stats().live, 0);
        assert_eq!(registry.stats().revoked, 1);
    }
}
