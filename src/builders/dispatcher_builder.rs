//! Builds a `Dispatcher` from configuration.

use crate::config::{DispatchConfig, NotifierBackendConfig};
use crate::core::{
    CategoryCatalog, DispatchError, Dispatcher, Notifier, RequesterCheck, ScheduleOracle,
    ScoutDirectory, TaskCategory, TracingAuditSink,
};
use crate::infra::{FileNotifier, InMemoryNotifier};

/// Build a dispatcher from configuration, creating the notifier through `notifier_factory`.
///
/// # Errors
///
/// Returns `DispatchError::Backend` for invalid configuration and whatever the
/// factory reports.
pub fn build_dispatcher<FN>(
    cfg: &DispatchConfig,
    mut notifier_factory: FN,
    requesters: Box<dyn RequesterCheck>,
    schedule: Box<dyn ScheduleOracle>,
) -> Result<Dispatcher, DispatchError>
where
    FN: FnMut(&NotifierBackendConfig) -> Result<Box<dyn Notifier>, DispatchError>,
{
    cfg.validate()
        .map_err(|e| DispatchError::Backend(format!("config invalid: {e}")))?;

    let catalog = CategoryCatalog::new(cfg.categories.iter().map(TaskCategory::from));
    let notifier = notifier_factory(&cfg.notifications)?;
    let dispatcher = Dispatcher::new(
        catalog,
        ScoutDirectory::new(cfg.default_scout_rating),
        notifier,
        requesters,
        schedule,
        cfg.limits(),
    );
    tracing::info!(
        categories = cfg.categories.len(),
        max_offers = cfg.max_offers_per_task,
        "dispatcher built"
    );
    Ok(if cfg.audit_log {
        dispatcher.with_audit(Box::new(TracingAuditSink))
    } else {
        dispatcher
    })
}

/// Notifier factory covering the built-in backends.
///
/// # Errors
///
/// Returns `DispatchError::Backend` when the file backend cannot be opened.
pub fn default_notifier(cfg: &NotifierBackendConfig) -> Result<Box<dyn Notifier>, DispatchError> {
    Ok(match cfg {
        NotifierBackendConfig::InMemory => Box::new(InMemoryNotifier::new()),
        NotifierBackendConfig::File { path } => Box::new(FileNotifier::new(path)?),
    })
}
