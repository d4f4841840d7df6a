use std::sync::Arc;

use chrono::Weekday;
use jql_clause::apply_date_range;
use jql_core::stage::names;
use jql_core::{
    DateRange, ExecutionContext, IntentSet, IssueLink, IssueTracker, QueryAssistant, QueryError,
    QueryRequest, SearchPage, StepLog, StepRecord,
};
use jql_in::{interpret, wants_suggestion, KeywordCatalog};
use jql_out::{ResponseTexts, WorklogFigures};
use jql_sprint::{BoardDirectory, SprintResolver};
use jql_worklog::{WorklogAggregator, WorklogSummary};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::scope::scope_query;

/// Query ready for execution, with what was learned while building it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedQuery {
    pub query: String,
    pub intents: IntentSet,
    pub title: Option<String>,
    /// Dates the query was pinned to, for sprint-scoped requests.
    pub range: Option<DateRange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub query: String,
    pub intents: IntentSet,
    pub range: Option<DateRange>,
    /// `None` for dry runs.
    pub page: Option<SearchPage>,
    pub links: Vec<IssueLink>,
    pub analysis: Option<String>,
    pub worklog: Option<WorklogSummary>,
    pub steps: StepLog,
}

impl PipelineOutcome {
    pub fn total(&self) -> Option<u64> {
        self.page.as_ref().map(|p| p.total)
    }
}

pub fn issue_detail_path(key: &str) -> String {
    format!(
        "/rest/api/2/issue/{}?fields=summary,description,status,issuetype",
        key
    )
}

/// Sprint scoping applies when the request mentions a sprint or names one.
pub fn sprint_scoped(request: &QueryRequest, intents: IntentSet) -> bool {
    intents.is_sprint_scoped || request.sprint().is_some()
}

/// Search fields: the caller's list, plus `worklog` for worklog requests.
pub fn search_fields(request: &QueryRequest, intents: IntentSet) -> Vec<String> {
    let mut fields = request.field_list();
    if intents.is_worklog && !fields.iter().any(|f| f == "worklog") {
        fields.push("worklog".to_string());
    }
    fields
}

pub struct QueryPipeline {
    tracker: Arc<dyn IssueTracker>,
    assistant: Option<Arc<dyn QueryAssistant>>,
    catalog: Arc<KeywordCatalog>,
    texts: Arc<ResponseTexts>,
    boards: BoardDirectory,
    fallback_weekday: Weekday,
}

impl QueryPipeline {
    pub fn new(tracker: Arc<dyn IssueTracker>, texts: Arc<ResponseTexts>) -> Self {
        Self {
            tracker,
            assistant: None,
            catalog: Arc::new(KeywordCatalog::builtin()),
            texts,
            boards: BoardDirectory::new(),
            fallback_weekday: Weekday::Thu,
        }
    }

    pub fn with_assistant(mut self, assistant: Option<Arc<dyn QueryAssistant>>) -> Self {
        self.assistant = assistant;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<KeywordCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_boards(mut self, boards: BoardDirectory) -> Self {
        self.boards = boards;
        self
    }

    pub fn with_fallback_weekday(mut self, weekday: Weekday) -> Self {
        self.fallback_weekday = weekday;
        self
    }

    pub fn tracker(&self) -> &Arc<dyn IssueTracker> {
        &self.tracker
    }

    pub fn assistant(&self) -> Option<&Arc<dyn QueryAssistant>> {
        self.assistant.as_ref()
    }

    pub fn texts(&self) -> &ResponseTexts {
        &self.texts
    }

    pub fn boards(&self) -> &BoardDirectory {
        &self.boards
    }

    /// Build the final query: interpretation, sprint dates, project and
    /// people scoping. Nothing is searched yet.
    pub async fn prepare(
        &self,
        ctx: &ExecutionContext,
        request: &QueryRequest,
    ) -> Result<PreparedQuery, QueryError> {
        let suggestion = self.suggest(ctx, request).await?;
        let interpretation = interpret(request, suggestion.as_deref(), &self.catalog)?;
        let intents = interpretation.intents;
        debug!(query = %interpretation.query, intents = ?intents.labels(), "base query");

        let projects = request.project_keys();
        let users = request.user_names();
        let mut query = interpretation.query;
        let mut range = None;

        if sprint_scoped(request, intents) {
            if projects.len() > 1 {
                return Err(QueryError::Validation(
                    "sprint-scoped requests take a single project".to_string(),
                ));
            }
            let board = self
                .boards
                .board_for(self.tracker.as_ref(), ctx, projects.first().map(String::as_str))
                .await?;
            let text = format!("{} {}", request.raw_text, query);
            let resolved = SprintResolver::new(self.tracker.as_ref(), &self.catalog)
                .with_fallback_weekday(self.fallback_weekday)
                .resolve(ctx, request.sprint(), &text, board)
                .await?;
            debug!(board = ?board, start = %resolved.start, end = %resolved.end, source = ?resolved.source, "sprint range");
            query = apply_date_range(&query, &resolved);
            range = Some(resolved);
        }

        let query = scope_query(&query, intents, &projects, &users);
        if query.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        Ok(PreparedQuery {
            query,
            intents,
            title: interpretation.title,
            range,
        })
    }

    /// Model suggestion for requests that would use one. Model failures are
    /// soft; only interruption is an error.
    async fn suggest(
        &self,
        ctx: &ExecutionContext,
        request: &QueryRequest,
    ) -> Result<Option<String>, QueryError> {
        let Some(assistant) = &self.assistant else {
            return Ok(None);
        };
        if request.raw_text.trim().is_empty() || !wants_suggestion(request, &self.catalog) {
            return Ok(None);
        }
        match ctx.run(assistant.derive_query(&request.raw_text)).await? {
            Ok(suggested) => Ok(Some(suggested)),
            Err(err) => {
                warn!(error = %err, "query suggestion failed, using heuristics");
                Ok(None)
            }
        }
    }

    /// Run a request end to end. Dry runs stop after [`Self::prepare`].
    pub async fn run(
        &self,
        ctx: &ExecutionContext,
        request: &QueryRequest,
    ) -> Result<PipelineOutcome, QueryError> {
        let prepared = self.prepare(ctx, request).await?;
        self.execute(ctx, request, prepared).await
    }

    /// Search with an already prepared query and collect everything the
    /// response carries.
    pub async fn execute(
        &self,
        ctx: &ExecutionContext,
        request: &QueryRequest,
        prepared: PreparedQuery,
    ) -> Result<PipelineOutcome, QueryError> {
        let PreparedQuery {
            query,
            intents,
            title,
            range,
        } = prepared;

        if request.dry_run {
            info!(trace_id = %ctx.trace_id, query = %query, intents = ?intents.labels(), "dry run");
            return Ok(PipelineOutcome {
                query,
                intents,
                range,
                page: None,
                links: Vec::new(),
                analysis: None,
                worklog: None,
                steps: StepLog::new(),
            });
        }

        let fields = search_fields(request, intents);
        let page = ctx
            .call(
                self.tracker
                    .search(&query, request.effective_limit(), 0, &fields),
            )
            .await?
            .map_err(QueryError::from)?;
        let links = page.issue_links(self.tracker.base_url());

        let detail = match (title.as_ref(), links.first()) {
            (Some(_), Some(first)) => self.issue_detail(ctx, &first.key).await?,
            _ => None,
        };

        let worklog = if intents.is_worklog {
            self.worklog(ctx, &query, &request.user_names()).await?
        } else {
            None
        };

        let analysis = match &worklog {
            Some(summary) => Some(self.texts.worklog_summary(WorklogFigures {
                hours: summary.hours,
                issues_scanned: summary.issues_scanned,
                possibly_incomplete: summary.possibly_incomplete,
            })),
            None if request.wants_analysis => self.summarize(ctx, request, &query, &page.raw).await?,
            None => None,
        };

        let mut steps = StepLog::new();
        steps.push(
            StepRecord::completed(names::GENERATE_QUERY, self.texts.generate_step(title.as_deref()))
                .with_result(json!({ "jql": query })),
        );
        steps.push(
            StepRecord::completed(names::EXECUTE_SEARCH, self.texts.search_step(page.total))
                .with_result(page.raw.clone()),
        );
        if let Some(text) = &analysis {
            steps.push(
                StepRecord::completed(names::ANALYSIS, self.texts.analysis_step())
                    .with_result(json!({ "analysis": text })),
            );
        }
        if let Some((key, body)) = detail {
            steps.push(
                StepRecord::completed(names::ISSUE_DETAILS, self.texts.issue_details_step(Some(&key)))
                    .with_result(body),
            );
        }

        info!(
            trace_id = %ctx.trace_id,
            query = %query,
            intents = ?intents.labels(),
            total = page.total,
            "search completed"
        );

        Ok(PipelineOutcome {
            query,
            intents,
            range,
            page: Some(page),
            links,
            analysis,
            worklog,
            steps,
        })
    }

    async fn issue_detail(
        &self,
        ctx: &ExecutionContext,
        key: &str,
    ) -> Result<Option<(String, Value)>, QueryError> {
        match ctx.call(self.tracker.get(&issue_detail_path(key))).await? {
            Ok(body) => Ok(Some((key.to_string(), body))),
            Err(err) => {
                warn!(issue = key, error = %err, "issue detail lookup failed");
                Ok(None)
            }
        }
    }

    async fn worklog(
        &self,
        ctx: &ExecutionContext,
        query: &str,
        authors: &[String],
    ) -> Result<Option<WorklogSummary>, QueryError> {
        match WorklogAggregator::new(self.tracker.as_ref())
            .sum_hours(ctx, query, authors)
            .await
        {
            Ok(summary) => Ok(Some(summary)),
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                warn!(error = %err, "worklog aggregation failed, no summary");
                Ok(None)
            }
        }
    }

    async fn summarize(
        &self,
        ctx: &ExecutionContext,
        request: &QueryRequest,
        query: &str,
        payload: &Value,
    ) -> Result<Option<String>, QueryError> {
        let Some(assistant) = &self.assistant else {
            return Ok(None);
        };
        match ctx
            .run(assistant.summarize(&request.raw_text, query, payload))
            .await?
        {
            Ok(text) if !text.trim().is_empty() => Ok(Some(text)),
            Ok(_) => Ok(None),
            Err(err) => {
                warn!(error = %err, "result analysis failed");
                Ok(None)
            }
        }
    }
}
