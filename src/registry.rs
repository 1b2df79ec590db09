use std::{
    collections::{BTreeMap, HashMap},
    ops::Deref,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dispatch::request::{default_body, default_method},
    error::RegistryError,
};

/// A template as supplied by the caller, everything but the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub name: String,
    #[serde(default = "default_method")]
    pub method: String,
    pub url_template: String,
    #[serde(default)]
    pub headers_template: BTreeMap<String, String>,
    #[serde(default = "default_body")]
    pub body_template: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookTemplate {
    pub id: String,
    #[serde(flatten)]
    pub draft: TemplateDraft,
}
impl Deref for WebhookTemplate {
    type Target = TemplateDraft;
    fn deref(&self) -> &Self::Target {
        &self.draft
    }
}

#[derive(Debug, Default)]
struct Store {
    order: Vec<String>,
    templates: HashMap<String, WebhookTemplate>,
}

/// In-memory template store, safe to share between tasks.
///
/// Every operation takes the lock once, so each one is atomic with respect to the others.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    store: RwLock<Store>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    // no operation leaves the store half-written, so a poisoned lock still guards consistent data
    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }
    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create(&self, draft: TemplateDraft) -> WebhookTemplate {
        let mut store = self.write();
        let id = loop {
            let id = Uuid::new_v4().to_string();
            if !store.templates.contains_key(&id) {
                break id;
            }
        };
        let template = WebhookTemplate { id: id.clone(), draft };
        store.order.push(id.clone());
        store.templates.insert(id, template.clone());
        tracing::debug!(id = %template.id, name = %template.name, "create template");
        template
    }

    pub fn get(&self, id: &str) -> Result<WebhookTemplate, RegistryError> {
        self.read().templates.get(id).cloned().ok_or_else(|| RegistryError::TemplateNotFound(id.to_string()))
    }

    pub fn find_by_name(&self, name: &str) -> Option<WebhookTemplate> {
        let store = self.read();
        store.order.iter().filter_map(|id| store.templates.get(id)).find(|t| t.name == name).cloned()
    }

    pub fn list(&self) -> Vec<WebhookTemplate> {
        let store = self.read();
        store.order.iter().filter_map(|id| store.templates.get(id)).cloned().collect()
    }

    pub fn update(&self, id: &str, draft: TemplateDraft) -> Result<WebhookTemplate, RegistryError> {
        let mut store = self.write();
        let template = store.templates.get_mut(id).ok_or_else(|| RegistryError::TemplateNotFound(id.to_string()))?;
        template.draft = draft;
        tracing::debug!(id = %template.id, name = %template.name, "update template");
        Ok(template.clone())
    }

    pub fn delete(&self, id: &str) -> Result<(), RegistryError> {
        let mut store = self.write();
        store.templates.remove(id).ok_or_else(|| RegistryError::TemplateNotFound(id.to_string()))?;
        store.order.retain(|i| i != id);
        tracing::debug!(id, "delete template");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<TemplateDraft> for TemplateRegistry {
    fn from_iter<I: IntoIterator<Item = TemplateDraft>>(iter: I) -> Self {
        let registry = Self::new();
        for draft in iter {
            registry.create(draft);
        }
        registry
    }
}
