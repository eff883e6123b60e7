//! In-memory stand-ins for Azure and AUXO, shared by unit and integration tests.

use crate::auxo::AssetService;
use crate::azure::InventorySource;
use crate::models::{InventorySnapshot, ProtectSurfaceLocationState, RemoteStateRecord};
use crate::BoxError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Inventory source returning a fixed snapshot, or failing.
pub struct StaticInventory {
    snapshot: Option<InventorySnapshot>,
    pub calls: AtomicUsize,
    pub delay: Duration,
}

impl StaticInventory {
    pub fn new(snapshot: InventorySnapshot) -> StaticInventory {
        StaticInventory {
            snapshot: Some(snapshot),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Every call fails like an unreachable inventory.
    pub fn failing() -> StaticInventory {
        StaticInventory {
            snapshot: None,
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> StaticInventory {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl InventorySource for StaticInventory {
    async fn snapshot(&self) -> Result<InventorySnapshot, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.snapshot
            .clone()
            .ok_or_else(|| "inventory unavailable: authorization failed".into())
    }
}

/// Asset service double that records every call.
#[derive(Default)]
pub struct RecordingService {
    pub states: Vec<RemoteStateRecord>,
    /// protect surface id -> name.
    pub names: HashMap<String, String>,
    pub fail_get_states: bool,
    /// Upserts for these protect surface names fail.
    pub failing_upserts: HashSet<String>,
    /// Deletes for these state ids fail.
    pub failing_deletes: HashSet<String>,
    pub upserts: Mutex<Vec<ProtectSurfaceLocationState>>,
    pub deletes: Mutex<Vec<String>>,
    pub name_lookups: Mutex<Vec<String>>,
}

impl RecordingService {
    pub fn new() -> RecordingService {
        RecordingService::default()
    }

    /// Add a remote state under protect surface `ps_id` named `name`.
    pub fn with_state(mut self, id: &str, maintainer: &str, ps_id: &str, name: &str) -> RecordingService {
        self.states.push(RemoteStateRecord {
            id: id.to_string(),
            maintainer: Some(maintainer.to_string()),
            protectsurface_id: ps_id.to_string(),
            content: None,
        });
        self.names.insert(ps_id.to_string(), name.to_string());
        self
    }

    /// Upserted items, sorted by surface and location.
    pub fn upserts(&self) -> Vec<ProtectSurfaceLocationState> {
        let mut upserts = self.upserts.lock().map(|u| u.clone()).unwrap_or_default();
        upserts.sort_by_key(|u| u.label());
        upserts
    }

    /// Deleted state ids, sorted.
    pub fn deletes(&self) -> Vec<String> {
        let mut deletes = self.deletes.lock().map(|d| d.clone()).unwrap_or_default();
        deletes.sort();
        deletes
    }

    pub fn name_lookups(&self) -> Vec<String> {
        self.name_lookups.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AssetService for RecordingService {
    async fn upsert_state(&self, item: &ProtectSurfaceLocationState) -> Result<(), BoxError> {
        if self.failing_upserts.contains(&item.protectsurface_name) {
            return Err(format!("Error http: [500] Unable to Upsert {}", item.label()).into());
        }
        self.upserts
            .lock()
            .map_err(|_| "upserts lock poisoned")?
            .push(item.clone());
        Ok(())
    }

    async fn get_states(&self) -> Result<Vec<RemoteStateRecord>, BoxError> {
        if self.fail_get_states {
            return Err("Error http: [502] States get request failed".into());
        }
        Ok(self.states.clone())
    }

    async fn get_protect_surface_name(&self, protect_surface_id: &str) -> Result<String, BoxError> {
        self.name_lookups
            .lock()
            .map_err(|_| "lookups lock poisoned")?
            .push(protect_surface_id.to_string());
        self.names
            .get(protect_surface_id)
            .cloned()
            .ok_or_else(|| format!("Error http: [404] Protect surface {protect_surface_id}").into())
    }

    async fn delete_state(&self, state_id: &str) -> Result<(), BoxError> {
        if self.failing_deletes.contains(state_id) {
            return Err(format!("Error http: [500] Failed to delete state {state_id}").into());
        }
        self.deletes
            .lock()
            .map_err(|_| "deletes lock poisoned")?
            .push(state_id.to_string());
        Ok(())
    }
}
