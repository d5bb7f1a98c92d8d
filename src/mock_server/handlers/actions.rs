//! Workflow job and log endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{not_found, SharedState};
use crate::WorkflowJobs;

/// Query parameters for listing jobs.
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub filter: Option<String>,
}

/// GET /repos/{owner}/{repo}/actions/runs/{run_id}/jobs
///
/// Paginates with a `Link` header like the real API.
pub async fn list_workflow_jobs(
    State(state): State<SharedState>,
    Path((owner, repo, run_id)): Path<(String, String, u64)>,
    Query(query): Query<ListJobsQuery>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    if state.get_repository(&owner, &repo).is_none() {
        return not_found();
    }
    let Some(jobs) = state.workflow_jobs.get(&run_id) else {
        return not_found();
    };

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(30).clamp(1, 100);
    let last_page = u32::try_from(jobs.len().div_ceil(per_page as usize))
        .unwrap_or(u32::MAX)
        .max(1);

    let start = ((page - 1) * per_page) as usize;
    let page_jobs: Vec<_> = jobs
        .iter()
        .skip(start)
        .take(per_page as usize)
        .cloned()
        .collect();

    let body = Json(WorkflowJobs {
        total_count: jobs.len() as u64,
        jobs: page_jobs,
    });

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let page_url = |n: u32| {
        format!(
            "<http://{host}/repos/{owner}/{repo}/actions/runs/{run_id}/jobs?page={n}&per_page={per_page}>"
        )
    };

    let mut links = Vec::new();
    if page < last_page {
        links.push(format!("{}; rel=\"next\"", page_url(page + 1)));
        links.push(format!("{}; rel=\"last\"", page_url(last_page)));
    }
    if page > 1 {
        links.push(format!("{}; rel=\"first\"", page_url(1)));
        links.push(format!("{}; rel=\"prev\"", page_url(page - 1)));
    }

    let mut response = body.into_response();
    if !links.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&links.join(", ")) {
            response.headers_mut().insert(header::LINK, value);
        }
    }
    response
}

/// GET /repos/{owner}/{repo}/actions/jobs/{job_id}/logs
///
/// Redirects to a signed blob URL.
pub async fn get_workflow_job_logs(
    State(state): State<SharedState>,
    Path((owner, repo, job_id)): Path<(String, String, u64)>,
) -> Response {
    let state = state.read().await;
    if state.get_repository(&owner, &repo).is_none() {
        return not_found();
    }
    let exists = state
        .workflow_jobs
        .values()
        .flatten()
        .any(|job| job.id == Some(job_id));
    if !exists {
        return not_found();
    }

    redirect(
        StatusCode::FOUND,
        &format!("https://results.example.com/jobs/{job_id}/logs.txt?sig=mock"),
    )
}

/// GET /repos/{owner}/{repo}/actions/runs/{run_id}/logs
///
/// Moved permanently to the repository-id form, as after a rename.
pub async fn get_workflow_run_logs(
    State(state): State<SharedState>,
    Path((owner, repo, run_id)): Path<(String, String, u64)>,
) -> Response {
    let state = state.read().await;
    let Some(id) = state.get_repository(&owner, &repo).and_then(|r| r.id) else {
        return not_found();
    };
    redirect(
        StatusCode::MOVED_PERMANENTLY,
        &format!("/repositories/{id}/actions/runs/{run_id}/logs"),
    )
}

/// GET /repositories/{id}/actions/runs/{run_id}/logs
pub async fn get_workflow_run_logs_by_id(
    State(state): State<SharedState>,
    Path((id, run_id)): Path<(u64, u64)>,
) -> Response {
    let state = state.read().await;
    if !state.repositories.values().any(|r| r.id == Some(id)) {
        return not_found();
    }
    if !state.workflow_jobs.contains_key(&run_id) {
        return not_found();
    }
    redirect(
        StatusCode::FOUND,
        &format!("https://results.example.com/runs/{run_id}/logs.zip?sig=mock"),
    )
}

fn redirect(status: StatusCode, location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (status, [(header::LOCATION, value)]).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
