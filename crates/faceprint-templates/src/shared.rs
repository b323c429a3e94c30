// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Lock-protected template store
//!
//! Capture, enrollment and persistence all go through one mutex, so a
//! multi-call sequence such as add -> consolidate -> serialise can be made
//! atomic with [`SharedTemplateStore::with_lock`].

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::embedding::Embedding;
use crate::error::TemplateResult;
use crate::matching::NearestMatch;
use crate::store::{SampleOutcome, TemplateStore};

/// Cloneable handle to a single [`TemplateStore`]
#[derive(Debug, Clone, Default)]
pub struct SharedTemplateStore {
    inner: Arc<Mutex<TemplateStore>>,
}

impl SharedTemplateStore {
    pub fn new(store: TemplateStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` while holding the lock
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut TemplateStore) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Consistent copy of the current contents
    pub fn snapshot(&self) -> TemplateStore {
        self.inner.lock().clone()
    }

    /// Swap in new contents (e.g. after loading from flash)
    pub fn replace(&self, store: TemplateStore) -> TemplateStore {
        std::mem::replace(&mut *self.inner.lock(), store)
    }

    /// Swap in contents loaded from flash, keeping the current pinned dimension
    ///
    /// Loaded templates that disagree with the pin are discarded with a
    /// warning and the store starts empty.
    ///
    /// # Returns
    /// Number of identities now held
    pub fn restore(&self, mut loaded: TemplateStore) -> usize {
        let mut guard = self.inner.lock();
        if let Some(dimension) = guard.pinned_dimension() {
            if let Err(e) = loaded.pin_dimension(dimension) {
                warn!("[TEMPLATES] Discarding {} loaded identities: {}", loaded.len(), e);
                loaded = TemplateStore::with_dimension(dimension);
            }
        }
        let count = loaded.len();
        *guard = loaded;
        count
    }

    pub fn add_sample(&self, name: &str, embedding: Embedding) -> TemplateResult<SampleOutcome> {
        self.inner.lock().add_sample(name, embedding)
    }

    pub fn consolidate(&self, name: &str) -> Embedding {
        self.inner.lock().consolidate(name)
    }

    pub fn find_nearest(&self, target: &Embedding) -> NearestMatch {
        self.inner.lock().find_nearest(target)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl From<TemplateStore> for SharedTemplateStore {
    fn from(store: TemplateStore) -> Self {
        Self::new(store)
    }
}
