pub mod config;
pub mod domain;
pub mod errors;
pub mod lifecycle;
pub mod reconcile;
pub mod services;
pub mod store;

pub use domain::ids::{AgentId, CompanyId, SectorId, TemplateId};
pub use domain::instance::AgentInstance;
pub use domain::requests::{ActivationRequest, SettingsPatch, ToggleRequest};
pub use domain::sector::Sector;
pub use domain::template::{AgentTemplate, CommunicationType, VoiceSelection};
pub use domain::view::{AgentSettings, AgentViewModel, ChatSettings, VoiceSettings};
pub use errors::{AgentError, InterfaceError, ServiceError};
pub use lifecycle::{ControllerStatus, LifecycleController, LifecycleState, RollbackPolicy};
pub use reconcile::language::normalize_language;
pub use reconcile::{reconcile, reconcile_with_diagnostics, MergeDiagnostic, Reconciliation};
pub use services::{
    CatalogService, CompanyIdProvider, InstanceService, Readiness, SharedCompanyId,
    StaticCompanyId,
};
