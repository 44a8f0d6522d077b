//! GitHub implementation of the remote gateway.
//!
//! Project items, date fields and sub-issue links go through the GraphQL
//! API; issue creation and edits go through the REST API. Node ids and
//! Project item ids learned along the way are cached for the rest of the run.

use std::collections::HashMap;
use std::time::Duration;

use jiff::civil::Date;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{AccessReport, CreatedIssue, IssueDraft, IssueUpdate, RemoteGateway};
use crate::config::{Config, DateFields};
use crate::error::RemoteError;
use crate::models::{DateField, Derived, FetchFilter, Project, ProjectMeta, RemoteId, Task};

const DEFAULT_API_URL: &str = "https://api.github.com";
const ITEMS_PAGE_SIZE: u32 = 100;

const PROJECT_QUERY: &str = r#"
query($owner: String!, $number: Int!) {
  OWNER_KIND(login: $owner) {
    projectV2(number: $number) {
      id
      number
      title
      url
      fields(first: 50) {
        nodes {
          ... on ProjectV2FieldCommon { id name dataType }
        }
      }
    }
  }
}"#;

const ITEMS_QUERY: &str = r#"
query($projectId: ID!, $cursor: String, $first: Int!) {
  node(id: $projectId) {
    ... on ProjectV2 {
      items(first: $first, after: $cursor) {
        pageInfo { hasNextPage endCursor }
        nodes {
          id
          fieldValues(first: 30) {
            nodes {
              ... on ProjectV2ItemFieldDateValue {
                date
                field { ... on ProjectV2FieldCommon { name } }
              }
            }
          }
          content {
            ... on Issue {
              id
              number
              title
              body
              state
              url
              repository { nameWithOwner }
              assignees(first: 20) { nodes { login } }
              labels(first: 50) { nodes { name } }
              milestone { title }
              parent { number }
            }
          }
        }
      }
    }
  }
}"#;

const ISSUE_ITEMS_QUERY: &str = r#"
query($issueId: ID!) {
  node(id: $issueId) {
    ... on Issue {
      projectItems(first: 50) { nodes { id project { id } } }
    }
  }
}"#;

const ADD_ITEM_MUTATION: &str = r#"
mutation($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: {projectId: $projectId, contentId: $contentId}) {
    item { id }
  }
}"#;

const SET_DATE_MUTATION: &str = r#"
mutation($projectId: ID!, $itemId: ID!, $fieldId: ID!, $date: Date!) {
  updateProjectV2ItemFieldValue(
    input: {projectId: $projectId, itemId: $itemId, fieldId: $fieldId, value: {date: $date}}
  ) {
    projectV2Item { id }
  }
}"#;

const CLEAR_DATE_MUTATION: &str = r#"
mutation($projectId: ID!, $itemId: ID!, $fieldId: ID!) {
  clearProjectV2ItemFieldValue(input: {projectId: $projectId, itemId: $itemId, fieldId: $fieldId}) {
    projectV2Item { id }
  }
}"#;

const ADD_SUB_ISSUE_MUTATION: &str = r#"
mutation($parentId: ID!, $childId: ID!) {
  addSubIssue(input: {issueId: $parentId, subIssueId: $childId, replaceParent: true}) {
    issue { number }
  }
}"#;

// Wire types

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,

    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,

    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Nodes<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<Option<T>>,
}

impl<T> Default for Nodes<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T> Nodes<T> {
    fn into_values(self) -> impl Iterator<Item = T> {
        self.nodes.into_iter().flatten()
    }
}

#[derive(Debug, Deserialize)]
struct OwnerData {
    #[serde(rename = "organization", alias = "user")]
    owner: Option<OwnerNode>,
}

#[derive(Debug, Deserialize)]
struct OwnerNode {
    #[serde(rename = "projectV2")]
    project: Option<ProjectNode>,
}

#[derive(Debug, Deserialize)]
struct ProjectNode {
    id: String,
    number: u64,
    title: String,
    url: String,

    #[serde(default)]
    fields: Nodes<FieldNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FieldNode {
    id: Option<String>,
    name: Option<String>,

    #[serde(rename = "dataType")]
    data_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemsData {
    node: Option<ItemsNode>,
}

#[derive(Debug, Deserialize)]
struct ItemsNode {
    items: ItemPage,
}

#[derive(Debug, Deserialize)]
struct ItemPage {
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,

    #[serde(default)]
    nodes: Vec<Option<ItemNode>>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,

    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemNode {
    id: String,

    #[serde(rename = "fieldValues", default)]
    field_values: Nodes<DateValueNode>,

    content: Option<IssueNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DateValueNode {
    date: Option<String>,
    field: Option<NameNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IssueNode {
    id: String,
    number: Option<u64>,
    title: String,
    body: Option<String>,
    state: String,
    url: String,
    repository: Option<RepositoryNode>,
    assignees: Nodes<LoginNode>,
    labels: Nodes<NameNode>,
    milestone: Option<TitleNode>,
    parent: Option<NumberNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RepositoryNode {
    #[serde(rename = "nameWithOwner")]
    name_with_owner: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginNode {
    login: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NameNode {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TitleNode {
    title: String,
}

#[derive(Debug, Deserialize)]
struct NumberNode {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct IdNode {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AddItemData {
    #[serde(rename = "addProjectV2ItemById")]
    add: AddItemPayload,
}

#[derive(Debug, Deserialize)]
struct AddItemPayload {
    item: IdNode,
}

#[derive(Debug, Deserialize)]
struct IssueItemsData {
    node: Option<IssueItemsNode>,
}

#[derive(Debug, Deserialize)]
struct IssueItemsNode {
    #[serde(rename = "projectItems", default)]
    project_items: Nodes<IssueItemNode>,
}

#[derive(Debug, Deserialize)]
struct IssueItemNode {
    id: String,
    project: IdNode,
}

#[derive(Debug, Deserialize)]
struct RestIssue {
    number: u64,
    node_id: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RestMessage {
    message: String,
}

/// Resolved Project identity and date field ids.
#[derive(Debug, Clone)]
struct ProjectHandle {
    meta: ProjectMeta,
    start_field: Option<String>,
    end_field: Option<String>,
}

/// Gateway over the GitHub GraphQL and REST APIs.
pub struct GithubGateway {
    client: Client,
    token: String,
    api_url: String,
    owner: String,
    repo: String,
    project_number: u64,
    date_fields: DateFields,
    project: Option<ProjectHandle>,
    node_ids: HashMap<RemoteId, String>,
    item_ids: HashMap<RemoteId, String>,
}

impl GithubGateway {
    pub fn new(config: &Config, token: impl Into<String>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .user_agent(concat!("ghgantt/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RemoteError::Transport(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            owner: config.owner().to_string(),
            repo: config.repo_name().to_string(),
            project_number: config.project_number,
            date_fields: config.date_fields.clone(),
            project: None,
            node_ids: HashMap::new(),
            item_ids: HashMap::new(),
        })
    }

    /// Points the gateway at another API root, e.g. GitHub Enterprise.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        check_status(response)
    }

    fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, RemoteError> {
        let request = self
            .client
            .post(format!("{}/graphql", self.api_url))
            .header("GraphQL-Features", "sub_issues")
            .json(&json!({ "query": query, "variables": variables }));
        let response: GraphqlResponse<T> = self
            .send(request)?
            .json()
            .map_err(|e| RemoteError::Rejected(format!("unexpected GraphQL response: {e}")))?;

        if let Some(error) = graphql_error(&response.errors) {
            return Err(error);
        }
        response
            .data
            .ok_or_else(|| RemoteError::Rejected("GraphQL response carried no data".to_string()))
    }

    fn issues_url(&self) -> String {
        format!("{}/repos/{}/{}/issues", self.api_url, self.owner, self.repo)
    }

    fn load_project(&self, owner_kind: &str) -> Result<Option<ProjectNode>, RemoteError> {
        let query = PROJECT_QUERY.replace("OWNER_KIND", owner_kind);
        let variables = json!({ "owner": self.owner, "number": self.project_number });
        match self.graphql::<OwnerData>(&query, variables) {
            Ok(data) => Ok(data.owner.and_then(|owner| owner.project)),
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Resolves the Project, trying the owner as an organization first.
    fn project_handle(&mut self) -> Result<ProjectHandle, RemoteError> {
        if let Some(handle) = &self.project {
            return Ok(handle.clone());
        }

        let node = match self.load_project("organization")? {
            Some(node) => node,
            None => self.load_project("user")?.ok_or_else(|| {
                RemoteError::NotFound(format!(
                    "project {} of '{}'",
                    self.project_number, self.owner
                ))
            })?,
        };

        let mut start_field = None;
        let mut end_field = None;
        for field in node.fields.into_values() {
            if field.data_type.as_deref() != Some("DATE") {
                continue;
            }
            let name = field.name.unwrap_or_default();
            if name == self.date_fields.start {
                start_field = field.id;
            } else if name == self.date_fields.end {
                end_field = field.id;
            }
        }

        let handle = ProjectHandle {
            meta: ProjectMeta {
                id: node.id,
                number: node.number,
                title: node.title,
                url: node.url,
                progress: Derived::default(),
            },
            start_field,
            end_field,
        };
        log::debug!(
            "Resolved project '{}' ({})",
            handle.meta.title,
            handle.meta.id
        );
        self.project = Some(handle.clone());
        Ok(handle)
    }

    fn node_id(&mut self, remote_id: RemoteId) -> Result<String, RemoteError> {
        if let Some(node_id) = self.node_ids.get(&remote_id) {
            return Ok(node_id.clone());
        }
        let url = format!("{}/{}", self.issues_url(), remote_id.number());
        let issue: RestIssue = self
            .send(self.client.get(url))?
            .json()
            .map_err(|e| RemoteError::Rejected(format!("unexpected issue response: {e}")))?;
        self.node_ids.insert(remote_id, issue.node_id.clone());
        Ok(issue.node_id)
    }

    fn item_id(&mut self, remote_id: RemoteId, project_id: &str) -> Result<String, RemoteError> {
        if let Some(item_id) = self.item_ids.get(&remote_id) {
            return Ok(item_id.clone());
        }
        let node_id = self.node_id(remote_id)?;
        let data: IssueItemsData =
            self.graphql(ISSUE_ITEMS_QUERY, json!({ "issueId": node_id }))?;
        let item = data
            .node
            .map(|node| node.project_items)
            .unwrap_or_default()
            .into_values()
            .find(|item| item.project.id == project_id)
            .ok_or_else(|| {
                RemoteError::NotFound(format!("issue {remote_id} is not in the project"))
            })?;
        self.item_ids.insert(remote_id, item.id.clone());
        Ok(item.id)
    }

    fn item_to_task(&self, item: ItemNode) -> Option<Task> {
        let issue = item.content?;
        let number = issue.number?;
        if let Some(repository) = &issue.repository {
            let expected = format!("{}/{}", self.owner, self.repo);
            if !repository.name_with_owner.eq_ignore_ascii_case(&expected) {
                log::debug!(
                    "Skipping {}#{number}: outside {expected}",
                    repository.name_with_owner
                );
                return None;
            }
        }

        let mut task = Task::existing(number, issue.title);
        task.node_id = Some(issue.id);
        task.item_id = Some(item.id);
        task.url = Some(issue.url).filter(|url| !url.is_empty());
        task.body = Some(issue.body.unwrap_or_default());
        task.closed = issue.state.eq_ignore_ascii_case("CLOSED");
        task.assignees = issue
            .assignees
            .into_values()
            .map(|node| node.login)
            .collect();
        task.labels = issue
            .labels
            .into_values()
            .filter_map(|node| node.name)
            .collect();
        task.milestone = Derived::new(issue.milestone.map(|m| m.title));
        task.parent = issue.parent.map(|parent| RemoteId(parent.number));

        for value in item.field_values.into_values() {
            let (Some(text), Some(name)) = (value.date, value.field.and_then(|f| f.name)) else {
                continue;
            };
            let parsed = text.get(..10).unwrap_or(&text).parse::<Date>().ok();
            if name == self.date_fields.start {
                task.start = parsed;
            } else if name == self.date_fields.end {
                task.end = parsed;
            }
        }
        Some(task)
    }
}

impl RemoteGateway for GithubGateway {
    fn fetch_project(&mut self, filter: &FetchFilter) -> Result<Project, RemoteError> {
        let handle = self.project_handle()?;
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let variables = json!({
                "projectId": handle.meta.id,
                "cursor": cursor,
                "first": ITEMS_PAGE_SIZE,
            });
            let data: ItemsData = self.graphql(ITEMS_QUERY, variables)?;
            let page = data
                .node
                .ok_or_else(|| RemoteError::NotFound(format!("project {}", handle.meta.id)))?
                .items;

            for node in page.nodes.into_iter().flatten() {
                if let Some(task) = self.item_to_task(node) {
                    items.push(task);
                }
            }
            if !page.page_info.has_next_page {
                break;
            }
            cursor = page.page_info.end_cursor;
        }

        for task in &items {
            if let Some(node_id) = &task.node_id {
                self.node_ids.insert(task.remote_id, node_id.clone());
            }
            if let Some(item_id) = &task.item_id {
                self.item_ids.insert(task.remote_id, item_id.clone());
            }
        }
        log::info!(
            "Fetched {} issues from project '{}'",
            items.len(),
            handle.meta.title
        );

        let tasks = filter.apply(super::assemble(items));
        Ok(Project::new(handle.meta, tasks))
    }

    fn create_issue(&mut self, draft: &IssueDraft) -> Result<CreatedIssue, RemoteError> {
        let body = json!({
            "title": draft.title,
            "body": draft.body,
            "labels": draft.labels,
            "assignees": draft.assignees,
        });
        let issue: RestIssue = self
            .send(self.client.post(self.issues_url()).json(&body))?
            .json()
            .map_err(|e| RemoteError::Rejected(format!("unexpected issue response: {e}")))?;

        let remote_id = RemoteId(issue.number);
        self.node_ids.insert(remote_id, issue.node_id.clone());
        log::debug!("Created issue {remote_id}");
        Ok(CreatedIssue {
            remote_id,
            node_id: issue.node_id,
            url: issue.html_url,
        })
    }

    fn update_issue(
        &mut self,
        remote_id: RemoteId,
        update: &IssueUpdate,
    ) -> Result<(), RemoteError> {
        if update.is_empty() {
            return Ok(());
        }
        let mut body = Map::new();
        if let Some(title) = &update.title {
            body.insert("title".into(), json!(title));
        }
        if let Some(text) = &update.body {
            body.insert("body".into(), json!(text));
        }
        if let Some(assignees) = &update.assignees {
            body.insert("assignees".into(), json!(assignees));
        }
        if let Some(labels) = &update.labels {
            body.insert("labels".into(), json!(labels));
        }
        if let Some(closed) = update.closed {
            let state = if closed { "closed" } else { "open" };
            body.insert("state".into(), json!(state));
        }

        let url = format!("{}/{}", self.issues_url(), remote_id.number());
        self.send(self.client.patch(url).json(&Value::Object(body)))?;
        log::debug!("Updated issue {remote_id}");
        Ok(())
    }

    fn set_date_field(
        &mut self,
        remote_id: RemoteId,
        field: DateField,
        value: Option<Date>,
    ) -> Result<(), RemoteError> {
        let handle = self.project_handle()?;
        let (field_id, field_name) = match field {
            DateField::Start => (handle.start_field, &self.date_fields.start),
            DateField::End => (handle.end_field, &self.date_fields.end),
        };
        let field_id = field_id.ok_or_else(|| RemoteError::FieldMissing(field_name.clone()))?;
        let item_id = self.item_id(remote_id, &handle.meta.id)?;

        let mut variables = json!({
            "projectId": handle.meta.id,
            "itemId": item_id,
            "fieldId": field_id,
        });
        let mutation = match value {
            Some(date) => {
                variables["date"] = json!(date.to_string());
                SET_DATE_MUTATION
            }
            None => CLEAR_DATE_MUTATION,
        };
        self.graphql::<Value>(mutation, variables)?;
        log::debug!("Set {} of {remote_id} to {value:?}", field.as_str());
        Ok(())
    }

    fn link_parent_child(&mut self, parent: RemoteId, child: RemoteId) -> Result<(), RemoteError> {
        let parent_id = self.node_id(parent)?;
        let child_id = self.node_id(child)?;
        self.graphql::<Value>(
            ADD_SUB_ISSUE_MUTATION,
            json!({ "parentId": parent_id, "childId": child_id }),
        )?;
        log::debug!("Linked {child} under {parent}");
        Ok(())
    }

    fn add_to_project(&mut self, remote_id: RemoteId) -> Result<String, RemoteError> {
        let handle = self.project_handle()?;
        let content_id = self.node_id(remote_id)?;
        let data: AddItemData = self.graphql(
            ADD_ITEM_MUTATION,
            json!({ "projectId": handle.meta.id, "contentId": content_id }),
        )?;
        let item_id = data.add.item.id;
        self.item_ids.insert(remote_id, item_id.clone());
        Ok(item_id)
    }

    fn check_access(&mut self) -> Result<AccessReport, RemoteError> {
        let handle = self.project_handle()?;
        Ok(AccessReport {
            project_title: handle.meta.title,
            project_url: handle.meta.url,
            start_field: handle.start_field.map(|_| self.date_fields.start.clone()),
            end_field: handle.end_field.map(|_| self.date_fields.end.clone()),
        })
    }
}

/// Maps GraphQL errors to the gateway taxonomy. `None` when there are none.
fn graphql_error(errors: &[GraphqlError]) -> Option<RemoteError> {
    let first = errors.first()?;
    let message = errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    Some(match first.kind.as_deref() {
        Some("NOT_FOUND") => RemoteError::NotFound(message),
        Some("RATE_LIMITED") => RemoteError::RateLimited { retry_after: None },
        _ => RemoteError::Rejected(message),
    })
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Seconds until the remote accepts requests again, if it said so.
fn retry_after(headers: &HeaderMap) -> Option<u64> {
    if let Some(seconds) = header_number(headers, "retry-after") {
        return Some(seconds);
    }
    let reset = i64::try_from(header_number(headers, "x-ratelimit-reset")?).ok()?;
    let now = jiff::Timestamp::now().as_second();
    Some(u64::try_from(reset - now).unwrap_or(0))
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && (header_number(headers, "x-ratelimit-remaining") == Some(0)
                || headers.contains_key("retry-after")))
}

fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let headers = response.headers().clone();
    let text = response.text().unwrap_or_default();
    let message = serde_json::from_str::<RestMessage>(&text)
        .map(|body| body.message)
        .unwrap_or_else(|_| text.trim().to_string());

    Err(classify(status, &headers, message))
}

fn classify(status: StatusCode, headers: &HeaderMap, message: String) -> RemoteError {
    if is_rate_limited(status, headers) {
        return RemoteError::RateLimited {
            retry_after: retry_after(headers),
        };
    }
    match status {
        StatusCode::UNAUTHORIZED => {
            RemoteError::Transport(format!("authentication failed ({status}): {message}"))
        }
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        status if status.is_server_error() => {
            RemoteError::Transport(format!("server error ({status}): {message}"))
        }
        _ => RemoteError::Rejected(format!("{status}: {message}")),
    }
}
