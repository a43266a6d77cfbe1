use std::sync::Arc;

use casbin::{CoreApi, MgmtApi};

use crate::error::{ServiceError, ServiceResult};

use super::identity::Identity;
use super::permission::{PermissionKind, PermissionValue};
use super::store::PermissionEvaluator;
use super::subject::ExpandedSubjects;

/// ## Summary
/// Initialize a Casbin enforcer over the repository permission model.
///
/// ## Errors
/// Returns an error if the model cannot be parsed or the adapter fails to load policies.
#[tracing::instrument(skip(adapter))]
pub async fn init_casbin<A>(adapter: A) -> ServiceResult<casbin::Enforcer>
where
    A: casbin::TryIntoAdapter,
{
    tracing::debug!("Initializing Casbin enforcer");

    let model = casbin::DefaultModel::from_str(include_str!("casbin_model.conf")).await?;
    tracing::debug!("Casbin model loaded");

    let enforcer = casbin::Enforcer::new(model, adapter).await?;

    let policy_count = enforcer.get_policy().len();
    let grouping_count = enforcer.get_named_grouping_policy("g2").len();
    tracing::info!(
        policy_count = policy_count,
        grouping_count = grouping_count,
        "Casbin enforcer initialized successfully"
    );
    Ok(enforcer)
}

/// [`PermissionEvaluator`] backed by Casbin path policies.
///
/// Policies grant a role on a path glob to a subject; `g2` maps roles to
/// permission kinds.
pub struct CasbinPermissionEvaluator {
    enforcer: Arc<casbin::Enforcer>,
}

impl CasbinPermissionEvaluator {
    #[must_use]
    pub fn new(enforcer: Arc<casbin::Enforcer>) -> Self {
        Self { enforcer }
    }
}

impl PermissionEvaluator for CasbinPermissionEvaluator {
    /// Checks each subject the identity expands to until one is allowed.
    fn get_permission(
        &self,
        identity: &Identity,
        path: &str,
        kind: PermissionKind,
    ) -> ServiceResult<PermissionValue> {
        let subjects = ExpandedSubjects::for_identity(identity);
        let act = kind.as_casbin_action();

        tracing::debug!(
            path = %path,
            action = %act,
            subject_count = subjects.len(),
            "Permission check started"
        );

        for subject in &subjects {
            let sub = subject.casbin_subject();

            let allowed = self
                .enforcer
                .enforce((&sub, path, act))
                .map_err(ServiceError::CasbinError)?;

            tracing::trace!(
                subject = %sub,
                path = %path,
                action = %act,
                allowed = %allowed,
                "Subject check result"
            );

            if allowed {
                return Ok(PermissionValue::Allowed);
            }
        }

        tracing::debug!(path = %path, action = %act, "Permission denied for all subjects");
        Ok(PermissionValue::Denied)
    }
}
