//! Names of the resources converged for a build.

use crate::constants::MAX_RESOURCE_NAME_LENGTH;
use crate::controller::build::BuildContext;
use crate::controller::dataplane::naming::generate_k8s_name_with_length_limit;

/// CI namespace shared by every build of an organization
#[must_use]
pub fn make_namespace_name(prefix: &str, ctx: &BuildContext) -> String {
    generate_k8s_name_with_length_limit(MAX_RESOURCE_NAME_LENGTH, &[prefix, &ctx.organization()])
}

/// Workflow name, derived from the Build name alone
#[must_use]
pub fn make_workflow_name(ctx: &BuildContext) -> String {
    generate_k8s_name_with_length_limit(MAX_RESOURCE_NAME_LENGTH, &[ctx.build_name()])
}

/// Image repository name within the registry
#[must_use]
pub fn make_image_name(ctx: &BuildContext) -> String {
    generate_k8s_name_with_length_limit(
        MAX_RESOURCE_NAME_LENGTH,
        &[
            &ctx.organization(),
            ctx.project_name(),
            ctx.component_name(),
            ctx.deployment_track_name(),
        ],
    )
}
