use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::domain::ids::{AgentId, CompanyId, SectorId, TemplateId};
use crate::domain::instance::AgentInstance;
use crate::domain::requests::{ActivationRequest, SettingsPatch};
use crate::domain::sector::Sector;
use crate::domain::template::AgentTemplate;
use crate::errors::ServiceError;

#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_sectors(&self) -> Result<Vec<Sector>, ServiceError>;
    async fn list_templates(&self, sector_id: &SectorId)
        -> Result<Vec<AgentTemplate>, ServiceError>;
}

#[async_trait]
pub trait InstanceService: Send + Sync {
    async fn list_instances(&self, company_id: &CompanyId)
        -> Result<Vec<AgentInstance>, ServiceError>;

    async fn activate(
        &self,
        company_id: &CompanyId,
        template_id: &TemplateId,
        request: &ActivationRequest,
    ) -> Result<AgentInstance, ServiceError>;

    async fn update(
        &self,
        company_id: &CompanyId,
        agent_id: &AgentId,
        patch: &SettingsPatch,
    ) -> Result<AgentInstance, ServiceError>;

    async fn toggle(
        &self,
        company_id: &CompanyId,
        agent_id: &AgentId,
        is_active: bool,
    ) -> Result<AgentInstance, ServiceError>;
}

/// Source of the current company id, owned by the session collaborator.
pub trait CompanyIdProvider: Send + Sync {
    fn current_company_id(&self) -> Option<CompanyId>;
}

#[derive(Clone, Debug, Default)]
pub struct StaticCompanyId(Option<CompanyId>);

impl StaticCompanyId {
    pub fn new(company_id: Option<CompanyId>) -> Self {
        Self(company_id)
    }
}

impl CompanyIdProvider for StaticCompanyId {
    fn current_company_id(&self) -> Option<CompanyId> {
        self.0.clone()
    }
}

/// Company id that becomes available once session initialization completes.
#[derive(Clone, Debug, Default)]
pub struct SharedCompanyId {
    inner: Arc<RwLock<Option<CompanyId>>>,
}

impl SharedCompanyId {
    pub fn set(&self, company_id: Option<CompanyId>) {
        match self.inner.write() {
            Ok(mut current) => *current = company_id,
            Err(poisoned) => *poisoned.into_inner() = company_id,
        }
    }
}

impl CompanyIdProvider for SharedCompanyId {
    fn current_company_id(&self) -> Option<CompanyId> {
        match self.inner.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Result of an operation that needs a company id. `NotReady` means the session has not
/// produced one yet; callers treat it as "try again later", not as a failure.
#[derive(Clone, Debug, PartialEq)]
pub enum Readiness<T> {
    Ready(T),
    NotReady,
}

impl<T> Readiness<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::NotReady => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CompanyIdProvider, Readiness, SharedCompanyId, StaticCompanyId};
    use crate::domain::ids::CompanyId;

    #[test]
    fn shared_company_id_is_visible_through_clones() {
        let provider = SharedCompanyId::default();
        let handle = provider.clone();
        assert_eq!(provider.current_company_id(), None);

        handle.set(Some(CompanyId("c1".to_owned())));
        assert_eq!(provider.current_company_id(), Some(CompanyId("c1".to_owned())));
    }

    #[test]
    fn static_company_id_and_readiness_helpers() {
        assert_eq!(StaticCompanyId::default().current_company_id(), None);
        assert!(Readiness::Ready(3).is_ready());
        assert_eq!(Readiness::<u8>::NotReady.ready(), None);
    }
}
