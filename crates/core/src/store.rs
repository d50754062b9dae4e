use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::ids::{AgentId, SectorId, TemplateId};
use crate::domain::instance::AgentInstance;
use crate::domain::sector::Sector;
use crate::domain::template::AgentTemplate;

/// Sectors and per-sector templates. A sector's template list is fixed once stored.
#[derive(Default)]
pub struct CatalogStore {
    sectors: RwLock<Vec<Sector>>,
    templates: RwLock<HashMap<SectorId, Vec<AgentTemplate>>>,
}

impl CatalogStore {
    pub async fn sectors(&self) -> Vec<Sector> {
        self.sectors.read().await.clone()
    }

    pub async fn sector(&self, sector_id: &SectorId) -> Option<Sector> {
        self.sectors.read().await.iter().find(|sector| &sector.id == sector_id).cloned()
    }

    pub async fn templates(&self, sector_id: &SectorId) -> Option<Vec<AgentTemplate>> {
        self.templates.read().await.get(sector_id).cloned()
    }

    /// Looks the template up across every loaded sector.
    pub async fn find_template(&self, template_id: &TemplateId) -> Option<AgentTemplate> {
        self.templates
            .read()
            .await
            .values()
            .flat_map(|templates| templates.iter())
            .find(|template| &template.id == template_id)
            .cloned()
    }

    pub(crate) async fn replace_sectors(&self, sectors: Vec<Sector>) {
        *self.sectors.write().await = sectors;
    }

    /// Stores the list unless the sector already has one; returns the stored length.
    pub(crate) async fn insert_templates(
        &self,
        sector_id: SectorId,
        templates: Vec<AgentTemplate>,
    ) -> usize {
        self.templates.write().await.entry(sector_id).or_insert(templates).len()
    }
}

/// The company's activated instances, in backend order.
#[derive(Default)]
pub struct InstanceStore {
    instances: RwLock<Vec<AgentInstance>>,
}

impl InstanceStore {
    pub async fn snapshot(&self) -> Vec<AgentInstance> {
        self.instances.read().await.clone()
    }

    pub async fn get(&self, agent_id: &AgentId) -> Option<AgentInstance> {
        self.instances.read().await.iter().find(|instance| &instance.id == agent_id).cloned()
    }

    pub async fn find_by_template(&self, template_id: &TemplateId) -> Option<AgentInstance> {
        self.instances
            .read()
            .await
            .iter()
            .find(|instance| &instance.agent_template_id == template_id)
            .cloned()
    }

    pub(crate) async fn replace_all(&self, instances: Vec<AgentInstance>) -> usize {
        let mut current = self.instances.write().await;
        *current = instances;
        current.len()
    }

    /// Replaces the instance with the same id, or appends it.
    pub(crate) async fn upsert(&self, instance: AgentInstance) {
        let mut instances = self.instances.write().await;
        match instances.iter_mut().find(|existing| existing.id == instance.id) {
            Some(existing) => *existing = instance,
            None => instances.push(instance),
        }
    }

    /// Applies `change` to the instance and returns its states from before and after.
    pub(crate) async fn modify<F>(
        &self,
        agent_id: &AgentId,
        change: F,
    ) -> Option<(AgentInstance, AgentInstance)>
    where
        F: FnOnce(&mut AgentInstance),
    {
        let mut instances = self.instances.write().await;
        let instance = instances.iter_mut().find(|instance| &instance.id == agent_id)?;
        let previous = instance.clone();
        change(instance);
        Some((previous, instance.clone()))
    }

    /// Puts `previous` back if the stored instance still equals `expected`. Returns `false`
    /// without touching anything when the lock is held elsewhere.
    pub(crate) fn try_restore(&self, previous: &AgentInstance, expected: &AgentInstance) -> bool {
        match self.instances.try_write() {
            Ok(mut instances) => {
                restore_in(&mut instances, previous, expected);
                true
            }
            Err(_) => false,
        }
    }

    pub(crate) async fn restore(&self, previous: &AgentInstance, expected: &AgentInstance) {
        restore_in(&mut self.instances.write().await, previous, expected);
    }
}

// a reload that landed in between wins over the snapshot
fn restore_in(instances: &mut [AgentInstance], previous: &AgentInstance, expected: &AgentInstance) {
    if let Some(slot) = instances.iter_mut().find(|instance| instance.id == previous.id) {
        if slot == expected {
            *slot = previous.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogStore, InstanceStore};
    use crate::domain::fixtures::{instance, sector, template};
    use crate::domain::ids::{AgentId, TemplateId};
    use crate::domain::template::CommunicationType;

    #[tokio::test]
    async fn template_lists_are_fixed_once_stored() {
        let store = CatalogStore::default();
        let sector = sector("car-rental");
        store.replace_sectors(vec![sector.clone()]).await;

        let stored = store
            .insert_templates(sector.id.clone(), vec![template("t1", CommunicationType::Voice)])
            .await;
        let again = store.insert_templates(sector.id.clone(), Vec::new()).await;

        assert_eq!((stored, again), (1, 1));
        assert_eq!(store.templates(&sector.id).await.map(|list| list.len()), Some(1));
        assert!(store.find_template(&TemplateId("t1".to_owned())).await.is_some());
        assert_eq!(store.sector(&sector.id).await, Some(sector));
    }

    #[tokio::test]
    async fn upsert_replaces_by_id_and_modify_returns_previous_state() {
        let store = InstanceStore::default();
        store.replace_all(vec![instance("a1", "t1", true)]).await;
        store.upsert(instance("a2", "t2", false)).await;
        store.upsert(instance("a1", "t1", false)).await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot[0].is_active);

        let (previous, optimistic) = store
            .modify(&AgentId("a2".to_owned()), |instance| instance.is_active = true)
            .await
            .expect("a2 exists");
        assert!(!previous.is_active);
        assert!(optimistic.is_active);
        assert!(store.get(&AgentId("a2".to_owned())).await.is_some_and(|a| a.is_active));
        assert!(store.modify(&AgentId("missing".to_owned()), |_| {}).await.is_none());
        assert_eq!(
            store.find_by_template(&TemplateId("t2".to_owned())).await.map(|a| a.id.0),
            Some("a2".to_owned())
        );
    }

    #[tokio::test]
    async fn restore_only_replaces_the_expected_state() {
        let store = InstanceStore::default();
        store.replace_all(vec![instance("a1", "t1", true)]).await;
        let (previous, optimistic) = store
            .modify(&AgentId("a1".to_owned()), |instance| instance.is_active = false)
            .await
            .expect("a1 exists");

        assert!(store.try_restore(&previous, &optimistic));
        assert!(store.get(&AgentId("a1".to_owned())).await.is_some_and(|a| a.is_active));

        let mut reloaded = instance("a1", "t1", false);
        reloaded.custom_name = Some("Reloaded".to_owned());
        store.replace_all(vec![reloaded.clone()]).await;
        store.restore(&previous, &optimistic).await;
        assert_eq!(store.get(&AgentId("a1".to_owned())).await, Some(reloaded));
    }
}
