use salvo::async_trait;
use std::sync::Arc;

use crate::error::AppResult;
use turnstile_core::error::CoreError;
use turnstile_service::auth::AuthPipeline;

/// Makes the shared authentication pipeline available to every request.
pub struct PipelineHandler {
    pub pipeline: Arc<AuthPipeline>,
}

#[async_trait]
impl salvo::Handler for PipelineHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.pipeline));
    }
}

/// ## Summary
/// Retrieves the authentication pipeline from the depot.
///
/// ## Errors
/// Returns an error if the pipeline is not found in the depot.
pub fn get_pipeline_from_depot(depot: &salvo::Depot) -> AppResult<Arc<AuthPipeline>> {
    depot
        .obtain::<Arc<AuthPipeline>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Authentication pipeline not found in depot").into())
}
