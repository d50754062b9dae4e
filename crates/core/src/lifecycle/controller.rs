use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::{watch, Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::ids::{AgentId, CompanyId, SectorId, TemplateId};
use crate::domain::instance::AgentInstance;
use crate::domain::requests::{ActivationRequest, SettingsPatch};
use crate::domain::sector::Sector;
use crate::domain::view::AgentViewModel;
use crate::errors::{AgentError, LoadResource, MutationKind, ServiceError};
use crate::lifecycle::states::{LifecycleEvent, LifecycleState};
use crate::reconcile::{reconcile_with_diagnostics, MergeDiagnostic};
use crate::services::{CatalogService, CompanyIdProvider, InstanceService, Readiness};
use crate::store::{CatalogStore, InstanceStore};

/// What happens to local state when an update is rejected by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RollbackPolicy {
    /// Reload instances so local state converges with the backend.
    #[default]
    Refetch,
    /// Leave the optimistic merge in place.
    KeepOptimistic,
}

/// Observable loading/error state for the presentation layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ControllerStatus {
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum MutationKey {
    Agent(AgentId),
    Template(TemplateId),
}

/// Owns the catalog and instance stores and every operation that mutates them.
///
/// Mutations on the same agent (or the same template, for activation) are serialized: a
/// second request waits for the first to resolve before applying its optimistic change.
/// Mutations on different agents run independently.
pub struct LifecycleController {
    catalog_service: Arc<dyn CatalogService>,
    instance_service: Arc<dyn InstanceService>,
    company: Arc<dyn CompanyIdProvider>,
    catalog: CatalogStore,
    instances: Arc<InstanceStore>,
    in_flight: Mutex<HashMap<MutationKey, Arc<AsyncMutex<()>>>>,
    activating: Mutex<HashSet<TemplateId>>,
    loads_in_flight: AtomicUsize,
    status: watch::Sender<ControllerStatus>,
}

impl LifecycleController {
    pub fn new(
        catalog_service: Arc<dyn CatalogService>,
        instance_service: Arc<dyn InstanceService>,
        company: Arc<dyn CompanyIdProvider>,
    ) -> Self {
        let (status, _) = watch::channel(ControllerStatus::default());
        Self {
            catalog_service,
            instance_service,
            company,
            catalog: CatalogStore::default(),
            instances: Arc::new(InstanceStore::default()),
            in_flight: Mutex::new(HashMap::new()),
            activating: Mutex::new(HashSet::new()),
            loads_in_flight: AtomicUsize::new(0),
            status,
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn instances(&self) -> &InstanceStore {
        &self.instances
    }

    pub fn status(&self) -> ControllerStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerStatus> {
        self.status.subscribe()
    }

    pub async fn load_sectors(&self) -> Result<usize, AgentError> {
        self.begin_load();
        match self.catalog_service.list_sectors().await {
            Ok(sectors) => {
                let count = sectors.len();
                self.catalog.replace_sectors(sectors).await;
                self.end_load(None);
                info!(event_name = "agents.load.sectors", count, "sectors loaded");
                Ok(count)
            }
            Err(source) => Err(self.load_failed(LoadResource::Sectors, source)),
        }
    }

    /// Fetches the sector's templates unless they are already loaded.
    pub async fn load_templates(&self, sector_id: &SectorId) -> Result<usize, AgentError> {
        if let Some(templates) = self.catalog.templates(sector_id).await {
            debug!(
                event_name = "agents.load.templates_cached",
                sector_id = %sector_id,
                "templates already loaded for sector"
            );
            return Ok(templates.len());
        }

        self.begin_load();
        match self.catalog_service.list_templates(sector_id).await {
            Ok(templates) => {
                let count = self.catalog.insert_templates(sector_id.clone(), templates).await;
                self.end_load(None);
                info!(
                    event_name = "agents.load.templates",
                    sector_id = %sector_id,
                    count,
                    "templates loaded"
                );
                Ok(count)
            }
            Err(source) => Err(self.load_failed(LoadResource::Templates, source)),
        }
    }

    pub async fn load_instances(&self) -> Result<Readiness<usize>, AgentError> {
        let Some(company_id) = self.company.current_company_id() else {
            debug!(event_name = "agents.load.not_ready", "no company id yet, skipping load");
            return Ok(Readiness::NotReady);
        };
        self.fetch_instances(&company_id).await.map(Readiness::Ready)
    }

    /// Reconciled view of one loaded sector. Unknown sectors yield an empty list.
    pub async fn agents(&self, sector_id: &SectorId) -> Vec<AgentViewModel> {
        let Some(sector) = self.catalog.sector(sector_id).await else {
            return Vec::new();
        };
        let templates = self.catalog.templates(sector_id).await.unwrap_or_default();
        let instances = self.instances.snapshot().await;

        let reconciliation = reconcile_with_diagnostics(&sector, &templates, &instances);
        log_diagnostics(&sector, &reconciliation.diagnostics);
        reconciliation.agents
    }

    pub async fn lifecycle_state(&self, template_id: &TemplateId) -> LifecycleState {
        if lock(&self.activating).contains(template_id) {
            return LifecycleState::Activating;
        }
        match self.instances.find_by_template(template_id).await {
            Some(instance) => LifecycleState::from_instance(instance.is_active),
            None => LifecycleState::Available,
        }
    }

    /// Creates the company's instance of `template_id`. Explicit `overrides` win over the
    /// template defaults field by field. Nothing is stored locally unless the backend
    /// confirms the activation.
    pub async fn activate(
        &self,
        template_id: &TemplateId,
        overrides: ActivationRequest,
    ) -> Result<Readiness<AgentInstance>, AgentError> {
        let Some(company_id) = self.company.current_company_id() else {
            return Ok(Readiness::NotReady);
        };
        let _guard = self.acquire(MutationKey::Template(template_id.clone())).await;

        let template = self
            .catalog
            .find_template(template_id)
            .await
            .ok_or_else(|| AgentError::UnknownTemplate(template_id.clone()))?;
        let activating = self
            .lifecycle_state(template_id)
            .await
            .transition(LifecycleEvent::ActivationRequested)?;

        let correlation_id = Uuid::new_v4().to_string();
        let request = overrides.with_template_defaults(&template);
        let _slot = ActivationSlot::claim(&self.activating, template_id.clone());
        info!(
            event_name = "agents.lifecycle.activate_requested",
            correlation_id = %correlation_id,
            company_id = %company_id,
            template_id = %template_id,
            "activating agent template"
        );

        match self.instance_service.activate(&company_id, template_id, &request).await {
            Ok(instance) => {
                let state = activating.transition(LifecycleEvent::ActivationSucceeded)?;
                self.instances.upsert(instance.clone()).await;
                self.set_error(None);
                info!(
                    event_name = "agents.lifecycle.activated",
                    correlation_id = %correlation_id,
                    template_id = %template_id,
                    agent_id = %instance.id,
                    state = ?state,
                    "agent activated"
                );
                Ok(Readiness::Ready(instance))
            }
            Err(source) => {
                let error = AgentError::MutationFailure {
                    operation: MutationKind::Activate,
                    target: template_id.to_string(),
                    source,
                };
                let state = activating.transition(LifecycleEvent::ActivationFailed)?;
                warn!(
                    event_name = "agents.lifecycle.activate_failed",
                    correlation_id = %correlation_id,
                    template_id = %template_id,
                    state = ?state,
                    error = %error,
                    "activation rejected, local state unchanged"
                );
                self.set_error(Some(&error));
                Err(error)
            }
        }
    }

    /// Flips an instance on or off. When `template_id` is given with `is_active == true` and
    /// the template has no instance yet, this is a first activation and goes through
    /// [`Self::activate`] with no overrides.
    pub async fn toggle(
        &self,
        agent_id: &AgentId,
        is_active: bool,
        template_id: Option<&TemplateId>,
    ) -> Result<Readiness<AgentInstance>, AgentError> {
        let agent_id = match template_id.filter(|_| is_active) {
            Some(template_id) => match self.instances.find_by_template(template_id).await {
                Some(existing) => existing.id,
                None => return self.activate(template_id, ActivationRequest::default()).await,
            },
            None => agent_id.clone(),
        };

        let Some(company_id) = self.company.current_company_id() else {
            return Ok(Readiness::NotReady);
        };
        let guard = self.acquire(MutationKey::Agent(agent_id.clone())).await;

        let current = self
            .instances
            .get(&agent_id)
            .await
            .ok_or_else(|| AgentError::UnknownAgent(agent_id.clone()))?;
        let event = if is_active { LifecycleEvent::Enabled } else { LifecycleEvent::Disabled };
        LifecycleState::from_instance(current.is_active).transition(event)?;

        let correlation_id = Uuid::new_v4().to_string();
        let (previous, optimistic) = self
            .instances
            .modify(&agent_id, |instance| instance.is_active = is_active)
            .await
            .ok_or_else(|| AgentError::UnknownAgent(agent_id.clone()))?;
        let mut pending =
            PendingMutation::new(Arc::clone(&self.instances), previous, optimistic, guard);
        info!(
            event_name = "agents.lifecycle.toggle_requested",
            correlation_id = %correlation_id,
            company_id = %company_id,
            agent_id = %agent_id,
            is_active,
            "status flip applied optimistically"
        );

        match self.instance_service.toggle(&company_id, &agent_id, is_active).await {
            Ok(confirmed) => {
                pending.disarm();
                self.instances.upsert(confirmed.clone()).await;
                self.set_error(None);
                Ok(Readiness::Ready(confirmed))
            }
            Err(source) => {
                let error = AgentError::MutationFailure {
                    operation: MutationKind::Toggle,
                    target: agent_id.to_string(),
                    source,
                };
                warn!(
                    event_name = "agents.lifecycle.toggle_failed",
                    correlation_id = %correlation_id,
                    agent_id = %agent_id,
                    error = %error,
                    "status flip rejected, resynchronizing from backend"
                );
                self.roll_back(&company_id, &mut pending, &correlation_id).await;
                self.set_error(Some(&error));
                Err(error)
            }
        }
    }

    pub async fn update(
        &self,
        agent_id: &AgentId,
        patch: SettingsPatch,
    ) -> Result<Readiness<AgentInstance>, AgentError> {
        self.update_with_policy(agent_id, patch, RollbackPolicy::default()).await
    }

    pub async fn update_with_policy(
        &self,
        agent_id: &AgentId,
        patch: SettingsPatch,
        policy: RollbackPolicy,
    ) -> Result<Readiness<AgentInstance>, AgentError> {
        let Some(company_id) = self.company.current_company_id() else {
            return Ok(Readiness::NotReady);
        };
        let guard = self.acquire(MutationKey::Agent(agent_id.clone())).await;

        let patch = patch.normalized();
        if patch.is_empty() {
            return self
                .instances
                .get(agent_id)
                .await
                .map(Readiness::Ready)
                .ok_or_else(|| AgentError::UnknownAgent(agent_id.clone()));
        }

        let correlation_id = Uuid::new_v4().to_string();
        let (previous, optimistic) = self
            .instances
            .modify(agent_id, |instance| patch.apply_to(instance))
            .await
            .ok_or_else(|| AgentError::UnknownAgent(agent_id.clone()))?;
        let mut pending =
            PendingMutation::new(Arc::clone(&self.instances), previous, optimistic, guard);
        info!(
            event_name = "agents.lifecycle.update_requested",
            correlation_id = %correlation_id,
            company_id = %company_id,
            agent_id = %agent_id,
            "settings merged optimistically"
        );

        match self.instance_service.update(&company_id, agent_id, &patch).await {
            Ok(confirmed) => {
                pending.disarm();
                self.instances.upsert(confirmed.clone()).await;
                self.set_error(None);
                Ok(Readiness::Ready(confirmed))
            }
            Err(source) => {
                let error = AgentError::MutationFailure {
                    operation: MutationKind::Update,
                    target: agent_id.to_string(),
                    source,
                };
                warn!(
                    event_name = "agents.lifecycle.update_failed",
                    correlation_id = %correlation_id,
                    agent_id = %agent_id,
                    policy = ?policy,
                    error = %error,
                    "settings update rejected"
                );
                match policy {
                    RollbackPolicy::Refetch => {
                        self.roll_back(&company_id, &mut pending, &correlation_id).await;
                    }
                    RollbackPolicy::KeepOptimistic => pending.disarm(),
                }
                self.set_error(Some(&error));
                Err(error)
            }
        }
    }

    async fn fetch_instances(&self, company_id: &CompanyId) -> Result<usize, AgentError> {
        self.begin_load();
        match self.instance_service.list_instances(company_id).await {
            Ok(instances) => {
                let count = self.instances.replace_all(instances).await;
                self.end_load(None);
                info!(
                    event_name = "agents.load.instances",
                    company_id = %company_id,
                    count,
                    "instances loaded"
                );
                Ok(count)
            }
            Err(source) => Err(self.load_failed(LoadResource::Instances, source)),
        }
    }

    /// Reloads instances after a rejected mutation. If the reload fails too, the
    /// pre-mutation snapshot is restored so the rejected value is never kept.
    async fn roll_back(
        &self,
        company_id: &CompanyId,
        pending: &mut PendingMutation,
        correlation_id: &str,
    ) {
        let agent_id = pending.agent_id().clone();
        match self.fetch_instances(company_id).await {
            Ok(_) => {
                pending.disarm();
                info!(
                    event_name = "agents.lifecycle.resynchronized",
                    correlation_id = %correlation_id,
                    agent_id = %agent_id,
                    "instances reloaded after rejected mutation"
                );
            }
            Err(error) => {
                warn!(
                    event_name = "agents.lifecycle.snapshot_restored",
                    correlation_id = %correlation_id,
                    agent_id = %agent_id,
                    error = %error,
                    "reload failed, restoring pre-mutation snapshot"
                );
                pending.restore().await;
            }
        }
    }

    async fn acquire(&self, key: MutationKey) -> OwnedMutexGuard<()> {
        let slot = lock(&self.in_flight).entry(key).or_default().clone();
        slot.lock_owned().await
    }

    fn begin_load(&self) {
        self.loads_in_flight.fetch_add(1, Ordering::SeqCst);
        self.status.send_modify(|status| status.is_loading = true);
    }

    fn end_load(&self, error: Option<&AgentError>) {
        let remaining = self.loads_in_flight.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        self.status.send_modify(|status| {
            status.is_loading = remaining > 0;
            status.error = error.map(ToString::to_string);
        });
    }

    fn load_failed(&self, resource: LoadResource, source: ServiceError) -> AgentError {
        let error = AgentError::LoadFailure { resource, source };
        warn!(
            event_name = "agents.load.failed",
            resource = %resource,
            error = %error,
            "load failed, keeping previously loaded state"
        );
        self.end_load(Some(&error));
        error
    }

    fn set_error(&self, error: Option<&AgentError>) {
        self.status.send_modify(|status| status.error = error.map(ToString::to_string));
    }
}

/// Marks a template as `Activating` for as long as it lives.
struct ActivationSlot<'a> {
    activating: &'a Mutex<HashSet<TemplateId>>,
    template_id: TemplateId,
}

impl<'a> ActivationSlot<'a> {
    fn claim(activating: &'a Mutex<HashSet<TemplateId>>, template_id: TemplateId) -> Self {
        lock(activating).insert(template_id.clone());
        Self { activating, template_id }
    }
}

impl Drop for ActivationSlot<'_> {
    fn drop(&mut self) {
        lock(self.activating).remove(&self.template_id);
    }
}

/// An optimistic write the backend has not settled yet. Dropping it while still armed
/// (the caller gave up on the mutation) puts the pre-mutation snapshot back before the
/// agent's mutation lock is released.
struct PendingMutation {
    store: Arc<InstanceStore>,
    previous: Option<AgentInstance>,
    optimistic: AgentInstance,
    guard: Option<OwnedMutexGuard<()>>,
}

impl PendingMutation {
    fn new(
        store: Arc<InstanceStore>,
        previous: AgentInstance,
        optimistic: AgentInstance,
        guard: OwnedMutexGuard<()>,
    ) -> Self {
        Self { store, previous: Some(previous), optimistic, guard: Some(guard) }
    }

    fn agent_id(&self) -> &AgentId {
        &self.optimistic.id
    }

    /// The backend settled the mutation; the lock is still held until drop.
    fn disarm(&mut self) {
        self.previous = None;
    }

    async fn restore(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.store.restore(&previous, &self.optimistic).await;
        }
    }
}

impl Drop for PendingMutation {
    fn drop(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        warn!(
            event_name = "agents.lifecycle.mutation_abandoned",
            agent_id = %previous.id,
            "mutation dropped before the backend answered, restoring snapshot"
        );
        if self.store.try_restore(&previous, &self.optimistic) {
            return;
        }

        // the store is busy: finish the restore on the runtime, still holding the agent lock
        let store = Arc::clone(&self.store);
        let optimistic = self.optimistic.clone();
        let guard = self.guard.take();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                store.restore(&previous, &optimistic).await;
                drop(guard);
            });
        }
    }
}

fn log_diagnostics(sector: &Sector, diagnostics: &[MergeDiagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic {
            MergeDiagnostic::MissingTemplate { agent_id, template_id } => debug!(
                event_name = "agents.reconcile.missing_template",
                sector_id = %sector.id,
                agent_id = %agent_id,
                template_id = %template_id,
                "instance template not in loaded catalog, using instance data only"
            ),
            MergeDiagnostic::DuplicateInstance { template_id, kept, dropped } => warn!(
                event_name = "agents.reconcile.duplicate_instance",
                sector_id = %sector.id,
                template_id = %template_id,
                kept = %kept,
                dropped = %dropped,
                "multiple instances for one template"
            ),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
