//! Project external client and transformers
//!
//! The external-name is the numeric project ID. With legacy path
//! external-names enabled, a `group/project` external-name is looked up once
//! and rewritten to the ID.

use crate::connector::ExternalContext;
use crate::error::ControllerError;
use crate::external::{connection_detail, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate};
use crate::reconcile_helpers::{
    enum_equal_if_set, equal_if_set, equal_if_set_opt, format_time, late_init, late_init_enum,
    late_init_non_empty, late_init_non_zero, late_init_opt, list_equal_if_set, parse_external_id, require_external_id,
    resolve_deprecated,
};
use crate::reconciler::{deleted, failed, found};
use async_trait::async_trait;
use crds::{Condition, Managed, Project, ProjectNamespaceObservation, ProjectObservation, ProjectParameters};
use gitlab_client::{
    CreateProjectOptions, DeleteProjectOptions, EditProjectOptions, Project as RemoteProject, ProjectSettings,
    ProjectsApi,
};
use kube::ResourceExt;
use tracing::{debug, info};

const KIND: &str = "Project";

/// Connection detail key for the project's runner registration token
pub const RUNNERS_TOKEN_KEY: &str = "runnersToken";

fn settings(p: &ProjectParameters) -> ProjectSettings {
    let (public_jobs, _) = resolve_deprecated(&p.public_jobs, &p.public_builds);
    ProjectSettings {
        default_branch: p.default_branch.clone(),
        description: p.description.clone(),
        visibility: p.visibility.map(|v| v.to_string()),
        issues_access_level: p.issues_access_level.map(|v| v.to_string()),
        repository_access_level: p.repository_access_level.map(|v| v.to_string()),
        merge_requests_access_level: p.merge_requests_access_level.map(|v| v.to_string()),
        builds_access_level: p.builds_access_level.map(|v| v.to_string()),
        wiki_access_level: p.wiki_access_level.map(|v| v.to_string()),
        snippets_access_level: p.snippets_access_level.map(|v| v.to_string()),
        pages_access_level: p.pages_access_level.map(|v| v.to_string()),
        container_registry_access_level: p.container_registry_access_level.map(|v| v.to_string()),
        resolve_outdated_diff_discussions: p.resolve_outdated_diff_discussions,
        shared_runners_enabled: p.shared_runners_enabled,
        public_jobs,
        only_allow_merge_if_pipeline_succeeds: p.only_allow_merge_if_pipeline_succeeds,
        only_allow_merge_if_all_discussions_are_resolved: p.only_allow_merge_if_all_discussions_are_resolved,
        merge_method: p.merge_method.map(|v| v.to_string()),
        squash_option: p.squash_option.map(|v| v.to_string()),
        remove_source_branch_after_merge: p.remove_source_branch_after_merge,
        lfs_enabled: p.lfs_enabled,
        request_access_enabled: p.request_access_enabled,
        topics: p.topics.clone(),
        ci_config_path: p.ci_config_path.clone(),
        ci_default_git_depth: p.ci_default_git_depth,
        build_timeout: p.build_timeout,
        auto_devops_enabled: p.auto_devops_enabled,
        packages_enabled: p.packages_enabled,
        mirror: p.mirror,
        mirror_trigger_builds: p.mirror_trigger_builds,
    }
}

/// `POST /projects` body; the name defaults to the record name
pub fn create_options(p: &ProjectParameters, record_name: &str) -> CreateProjectOptions {
    CreateProjectOptions {
        name: Some(p.name.clone().unwrap_or_else(|| record_name.to_string())),
        path: p.path.clone(),
        namespace_id: p.namespace_id,
        initialize_with_readme: p.initialize_with_readme,
        settings: settings(p),
    }
}

/// `PUT /projects/:id` body; `namespaceId` is never sent
pub fn update_options(p: &ProjectParameters) -> EditProjectOptions {
    EditProjectOptions {
        name: p.name.clone(),
        path: p.path.clone(),
        settings: settings(p),
        mirror_user_id: p.mirror_user_id,
        only_mirror_protected_branches: p.only_mirror_protected_branches,
        mirror_overwrites_diverged_branches: p.mirror_overwrites_diverged_branches,
    }
}

/// Fill unset parameters from the remote project
pub fn late_initialize(p: &mut ProjectParameters, r: &RemoteProject) {
    late_init_non_empty(&mut p.name, &r.name);
    late_init_non_empty(&mut p.path, &r.path);
    late_init_opt(&mut p.description, r.description.clone().filter(|d| !d.is_empty()));
    late_init_opt(&mut p.default_branch, r.default_branch.clone());
    late_init_enum(&mut p.visibility, &r.visibility);
    late_init_enum(&mut p.issues_access_level, &r.issues_access_level);
    late_init_enum(&mut p.repository_access_level, &r.repository_access_level);
    late_init_enum(&mut p.merge_requests_access_level, &r.merge_requests_access_level);
    late_init_enum(&mut p.builds_access_level, &r.builds_access_level);
    late_init_enum(&mut p.wiki_access_level, &r.wiki_access_level);
    late_init_enum(&mut p.snippets_access_level, &r.snippets_access_level);
    late_init_enum(&mut p.pages_access_level, &r.pages_access_level);
    late_init_enum(&mut p.container_registry_access_level, &r.container_registry_access_level);
    late_init(&mut p.resolve_outdated_diff_discussions, r.resolve_outdated_diff_discussions);
    late_init(&mut p.shared_runners_enabled, r.shared_runners_enabled);
    // Only the current field is filled; a set publicBuilds keeps precedence rules meaningful
    if p.public_builds.is_none() {
        late_init(&mut p.public_jobs, r.public_jobs);
    }
    late_init(&mut p.only_allow_merge_if_pipeline_succeeds, r.only_allow_merge_if_pipeline_succeeds);
    late_init(
        &mut p.only_allow_merge_if_all_discussions_are_resolved,
        r.only_allow_merge_if_all_discussions_are_resolved,
    );
    late_init_enum(&mut p.merge_method, &r.merge_method);
    late_init_enum(&mut p.squash_option, &r.squash_option);
    late_init(&mut p.remove_source_branch_after_merge, r.remove_source_branch_after_merge);
    late_init(&mut p.lfs_enabled, r.lfs_enabled);
    late_init(&mut p.request_access_enabled, r.request_access_enabled);
    if p.topics.is_none() && !r.topics.is_empty() {
        p.topics = Some(r.topics.clone());
    }
    late_init_opt(&mut p.ci_config_path, r.ci_config_path.clone().filter(|c| !c.is_empty()));
    late_init_opt(&mut p.ci_default_git_depth, r.ci_default_git_depth);
    late_init(&mut p.build_timeout, r.build_timeout);
    late_init(&mut p.auto_devops_enabled, r.auto_devops_enabled);
    late_init_opt(&mut p.packages_enabled, r.packages_enabled);
    late_init(&mut p.mirror, r.mirror);
    late_init_non_zero(&mut p.mirror_user_id, r.mirror_user_id);
    late_init(&mut p.mirror_trigger_builds, r.mirror_trigger_builds);
    late_init(&mut p.only_mirror_protected_branches, r.only_mirror_protected_branches);
    late_init(&mut p.mirror_overwrites_diverged_branches, r.mirror_overwrites_diverged_branches);
}

/// Whether the remote project matches every set parameter
pub fn is_up_to_date(p: &ProjectParameters, r: &RemoteProject) -> bool {
    let (public_jobs, _) = resolve_deprecated(&p.public_jobs, &p.public_builds);
    equal_if_set(&p.name, &r.name)
        && equal_if_set(&p.path, &r.path)
        && equal_if_set_opt(&p.description, &r.description)
        && equal_if_set_opt(&p.default_branch, &r.default_branch)
        && enum_equal_if_set(&p.visibility, &r.visibility)
        && enum_equal_if_set(&p.issues_access_level, &r.issues_access_level)
        && enum_equal_if_set(&p.repository_access_level, &r.repository_access_level)
        && enum_equal_if_set(&p.merge_requests_access_level, &r.merge_requests_access_level)
        && enum_equal_if_set(&p.builds_access_level, &r.builds_access_level)
        && enum_equal_if_set(&p.wiki_access_level, &r.wiki_access_level)
        && enum_equal_if_set(&p.snippets_access_level, &r.snippets_access_level)
        && enum_equal_if_set(&p.pages_access_level, &r.pages_access_level)
        && enum_equal_if_set(&p.container_registry_access_level, &r.container_registry_access_level)
        && equal_if_set(&p.resolve_outdated_diff_discussions, &r.resolve_outdated_diff_discussions)
        && equal_if_set(&p.shared_runners_enabled, &r.shared_runners_enabled)
        && equal_if_set(&public_jobs, &r.public_jobs)
        && equal_if_set(&p.only_allow_merge_if_pipeline_succeeds, &r.only_allow_merge_if_pipeline_succeeds)
        && equal_if_set(
            &p.only_allow_merge_if_all_discussions_are_resolved,
            &r.only_allow_merge_if_all_discussions_are_resolved,
        )
        && enum_equal_if_set(&p.merge_method, &r.merge_method)
        && enum_equal_if_set(&p.squash_option, &r.squash_option)
        && equal_if_set(&p.remove_source_branch_after_merge, &r.remove_source_branch_after_merge)
        && equal_if_set(&p.lfs_enabled, &r.lfs_enabled)
        && equal_if_set(&p.request_access_enabled, &r.request_access_enabled)
        && list_equal_if_set(&p.topics, &r.topics)
        && equal_if_set_opt(&p.ci_config_path, &r.ci_config_path)
        && equal_if_set_opt(&p.ci_default_git_depth, &r.ci_default_git_depth)
        && equal_if_set(&p.build_timeout, &r.build_timeout)
        && equal_if_set(&p.auto_devops_enabled, &r.auto_devops_enabled)
        && equal_if_set_opt(&p.packages_enabled, &r.packages_enabled)
        && equal_if_set(&p.mirror, &r.mirror)
        && equal_if_set_opt(&p.mirror_user_id, &r.mirror_user_id)
        && equal_if_set(&p.mirror_trigger_builds, &r.mirror_trigger_builds)
        && equal_if_set(&p.only_mirror_protected_branches, &r.only_mirror_protected_branches)
        && equal_if_set(&p.mirror_overwrites_diverged_branches, &r.mirror_overwrites_diverged_branches)
}

/// Status projection of the remote project
pub fn observation(p: &ProjectParameters, r: &RemoteProject) -> ProjectObservation {
    let (_, using_deprecated) = resolve_deprecated(&p.public_jobs, &p.public_builds);
    ProjectObservation {
        id: Some(r.id),
        path_with_namespace: Some(r.path_with_namespace.clone()),
        http_url_to_repo: Some(r.http_url_to_repo.clone()),
        ssh_url_to_repo: Some(r.ssh_url_to_repo.clone()),
        web_url: Some(r.web_url.clone()),
        namespace: r.namespace.as_ref().map(|n| ProjectNamespaceObservation {
            id: n.id,
            name: n.name.clone(),
            path: n.path.clone(),
            kind: n.kind.clone(),
            full_path: n.full_path.clone(),
        }),
        archived: Some(r.archived),
        empty_repo: Some(r.empty_repo),
        star_count: Some(r.star_count),
        forks_count: Some(r.forks_count),
        open_issues_count: Some(r.open_issues_count),
        created_at: format_time(r.created_at),
        last_activity_at: format_time(r.last_activity_at),
        marked_for_deletion_on: r.marked_for_deletion_on.clone(),
        using_deprecated_public_builds: Some(using_deprecated),
    }
}

fn runners_token(r: &RemoteProject) -> crate::external::ConnectionDetails {
    r.runners_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| connection_detail(RUNNERS_TOKEN_KEY, t))
        .unwrap_or_default()
}

/// External client for `Project`
pub struct ProjectExternal<C> {
    client: C,
    path_external_names: bool,
}

impl<C: ProjectsApi> ProjectExternal<C> {
    pub fn new(client: C, context: ExternalContext) -> Self {
        Self {
            client,
            path_external_names: context.project_path_external_names,
        }
    }

    /// Fetch the project the external-name points at
    async fn lookup(&self, cr: &mut Project) -> Result<Option<RemoteProject>, ControllerError> {
        let external_name = cr.external_name().to_string();
        let pid = match parse_external_id(&external_name) {
            Ok(None) => return Ok(None),
            Ok(Some(id)) => id.to_string(),
            Err(_) if self.path_external_names => external_name.clone(),
            Err(e) => return Err(e),
        };
        let project = found(self.client.get_project(&pid).await, KIND)?;
        if let Some(project) = &project {
            let id = project.id.to_string();
            if id != external_name {
                info!(
                    name = %cr.name_any(),
                    from = %external_name,
                    to = %id,
                    "rewriting path external-name to project ID"
                );
                cr.set_external_name(id);
            }
        }
        Ok(project)
    }
}

#[async_trait]
impl<C: ProjectsApi + 'static> ExternalClient<Project> for ProjectExternal<C> {
    async fn observe(&self, cr: &mut Project) -> Result<ExternalObservation, ControllerError> {
        let Some(remote) = self.lookup(cr).await? else {
            return Ok(ExternalObservation::absent());
        };

        let at_provider = observation(&cr.spec.for_provider, &remote);
        cr.status.get_or_insert_with(Default::default).at_provider = at_provider;

        let pending_deletion = remote.marked_for_deletion_on.is_some()
            && cr.is_deleting()
            && cr.spec.for_provider.remove_finalizer_on_pending_deletion == Some(true);
        if pending_deletion {
            debug!(name = %cr.name_any(), "project is marked for deletion, releasing record");
            return Ok(ExternalObservation::absent());
        }

        let up_to_date = is_up_to_date(&cr.spec.for_provider, &remote);
        let snapshot = cr.spec.for_provider.clone();
        late_initialize(&mut cr.spec.for_provider, &remote);
        cr.set_conditions([Condition::available()]);

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date,
            resource_late_initialized: snapshot != cr.spec.for_provider,
            connection_details: runners_token(&remote),
        })
    }

    async fn create(&self, cr: &mut Project) -> Result<ExternalCreation, ControllerError> {
        let opts = create_options(&cr.spec.for_provider, &cr.name_any());
        let project = self
            .client
            .create_project(&opts)
            .await
            .map_err(failed("create", KIND))?;
        cr.set_external_name(project.id.to_string());
        Ok(ExternalCreation {
            connection_details: runners_token(&project),
        })
    }

    async fn update(&self, cr: &mut Project) -> Result<ExternalUpdate, ControllerError> {
        let id = require_external_id(cr.external_name())?;
        self.client
            .edit_project(id, &update_options(&cr.spec.for_provider))
            .await
            .map_err(failed("update", KIND))?;
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cr: &mut Project) -> Result<(), ControllerError> {
        let Some(id) = parse_external_id(cr.external_name())? else {
            return Ok(());
        };
        let at_provider = cr.status.as_ref().map(|s| s.at_provider.clone()).unwrap_or_default();

        if at_provider.marked_for_deletion_on.is_none() {
            deleted(self.client.delete_project(id, &DeleteProjectOptions::default()).await, KIND)?;
        }
        if cr.spec.for_provider.permanently_remove == Some(true) {
            let opts = DeleteProjectOptions {
                permanently_remove: Some(true),
                full_path: at_provider.path_with_namespace,
            };
            deleted(self.client.delete_project(id, &opts).await, KIND)?;
        }
        Ok(())
    }
}
