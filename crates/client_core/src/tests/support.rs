//! In-process stand-in for the CRM backend's reminder endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use shared::{
    domain::{
        CustomerId, LeadId, QuoteId, ReminderId, ReminderPriority, ReminderType, SuggestedAction,
        UserId, UserRole,
    },
    error::ApiErrorBody,
    protocol::{
        ActReminderRequest, CurrentUser, DismissReminderRequest, GenerateRemindersResponse,
        LoginRequest, Reminder, StaleSummary, TokenResponse,
    },
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{events::EventBus, session::Session, transport::ApiTransport};

pub const TEST_TOKEN: &str = "test-token";
pub const TEST_PASSWORD: &str = "secret";

#[derive(Default)]
pub struct MockBackend {
    pub reminders: Vec<Reminder>,
    pub list_calls: u32,
    pub me_calls: u32,
    pub summary_calls: u32,
    pub dismissals: Vec<(ReminderId, Option<String>)>,
    pub acts: Vec<(ReminderId, SuggestedAction, Option<String>)>,
    pub last_list_query: Option<ListQuery>,
    /// Reject every mutation with this status and detail.
    pub reject_mutations: Option<(StatusCode, Option<String>)>,
    pub fail_summary: bool,
    /// Answer list calls with 503.
    pub fail_lists: bool,
}

pub type SharedBackend = Arc<Mutex<MockBackend>>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub dismissed: Option<bool>,
    pub priority: Option<ReminderPriority>,
    pub reminder_type: Option<ReminderType>,
}

pub fn sample_reminder(id: i64, priority: ReminderPriority, days_stale: u32) -> Reminder {
    Reminder {
        id: ReminderId(id),
        reminder_type: ReminderType::LeadStale,
        priority,
        title: format!("Reminder {id}"),
        message: None,
        days_stale,
        suggested_action: SuggestedAction::FollowUp,
        lead_id: Some(LeadId(100 + id)),
        quote_id: None,
        customer_id: None,
        customer_name: None,
        quote_number: None,
        is_dismissed: false,
        dismissed_reason: None,
        dismissed_at: None,
        is_acted_upon: false,
        action_taken: None,
        acted_at: None,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    }
}

pub fn quote_reminder(id: i64, quote_id: i64, action: SuggestedAction) -> Reminder {
    Reminder {
        reminder_type: ReminderType::QuoteStale,
        suggested_action: action,
        quote_id: Some(QuoteId(quote_id)),
        customer_id: Some(CustomerId(900 + id)),
        ..sample_reminder(id, ReminderPriority::High, 5)
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TEST_TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiErrorBody::new("Could not validate credentials")),
    )
        .into_response()
}

fn rejection(status: StatusCode, detail: Option<String>) -> Response {
    let body = match detail {
        Some(detail) => ApiErrorBody::new(detail),
        None => ApiErrorBody::default(),
    };
    (status, Json(body)).into_response()
}

async fn handle_login(Json(payload): Json<LoginRequest>) -> Response {
    if payload.password != TEST_PASSWORD {
        return rejection(
            StatusCode::UNAUTHORIZED,
            Some("Incorrect username or password".into()),
        );
    }
    Json(TokenResponse {
        access_token: TEST_TOKEN.to_string(),
        token_type: "bearer".into(),
    })
    .into_response()
}

async fn handle_me(State(state): State<SharedBackend>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.lock().await.me_calls += 1;
    Json(CurrentUser {
        id: UserId(1),
        username: "dana".into(),
        email: Some("dana@example.com".into()),
        role: UserRole::Sales,
    })
    .into_response()
}

async fn handle_list(
    State(state): State<SharedBackend>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut guard = state.lock().await;
    guard.list_calls += 1;
    guard.last_list_query = Some(query.clone());
    if guard.fail_lists {
        return rejection(
            StatusCode::SERVICE_UNAVAILABLE,
            Some("Service unavailable".into()),
        );
    }
    let rows: Vec<Reminder> = guard
        .reminders
        .iter()
        .filter(|r| query.dismissed.map_or(true, |d| r.is_dismissed == d))
        .filter(|r| query.priority.map_or(true, |p| r.priority == p))
        .filter(|r| query.reminder_type.map_or(true, |t| r.reminder_type == t))
        .cloned()
        .collect();
    Json(rows).into_response()
}

async fn handle_summary(State(state): State<SharedBackend>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut guard = state.lock().await;
    guard.summary_calls += 1;
    if guard.fail_summary {
        return rejection(StatusCode::INTERNAL_SERVER_ERROR, None);
    }
    let open: Vec<&Reminder> = guard.reminders.iter().filter(|r| !r.is_dismissed).collect();
    Json(StaleSummary {
        total_reminders: open.len() as u64,
        urgent_count: open
            .iter()
            .filter(|r| r.priority == ReminderPriority::Urgent)
            .count() as u64,
        stale_leads: open
            .iter()
            .filter(|r| r.reminder_type == ReminderType::LeadStale)
            .count() as u64,
        stale_quotes: open
            .iter()
            .filter(|r| r.reminder_type != ReminderType::LeadStale)
            .count() as u64,
    })
    .into_response()
}

async fn handle_dismiss(
    State(state): State<SharedBackend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<DismissReminderRequest>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut guard = state.lock().await;
    if let Some((status, detail)) = guard.reject_mutations.clone() {
        return rejection(status, detail);
    }
    let Some(reminder) = guard.reminders.iter_mut().find(|r| r.id.0 == id) else {
        return rejection(StatusCode::NOT_FOUND, Some("Reminder not found".into()));
    };
    reminder.is_dismissed = true;
    reminder.dismissed_reason = payload.reason.clone();
    guard.dismissals.push((ReminderId(id), payload.reason));
    StatusCode::NO_CONTENT.into_response()
}

async fn handle_act(
    State(state): State<SharedBackend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<ActReminderRequest>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut guard = state.lock().await;
    if let Some((status, detail)) = guard.reject_mutations.clone() {
        return rejection(status, detail);
    }
    let Some(reminder) = guard.reminders.iter_mut().find(|r| r.id.0 == id) else {
        return rejection(StatusCode::NOT_FOUND, Some("Reminder not found".into()));
    };
    if reminder.is_dismissed {
        return rejection(
            StatusCode::BAD_REQUEST,
            Some("Cannot act on a dismissed reminder".into()),
        );
    }
    reminder.is_acted_upon = true;
    reminder.action_taken = Some(payload.action_taken);
    let response = Json(reminder.clone()).into_response();
    guard
        .acts
        .push((ReminderId(id), payload.action_taken, payload.notes));
    response
}

async fn handle_generate(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(GenerateRemindersResponse { created: 3 }).into_response()
}

pub async fn spawn_backend(reminders: Vec<Reminder>) -> (String, SharedBackend) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state: SharedBackend = Arc::new(Mutex::new(MockBackend {
        reminders,
        ..MockBackend::default()
    }));
    let app = Router::new()
        .route("/auth/login", post(handle_login))
        .route("/auth/me", get(handle_me))
        .route("/reminders", get(handle_list))
        .route("/reminders/summary", get(handle_summary))
        .route("/reminders/generate", post(handle_generate))
        .route("/reminders/:id/dismiss", post(handle_dismiss))
        .route("/reminders/:id/act", post(handle_act))
        .with_state(Arc::clone(&state));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

pub async fn signed_in_transport(server_url: &str) -> (Arc<ApiTransport>, EventBus) {
    let session = Arc::new(Session::in_memory());
    session
        .set_token(TEST_TOKEN.to_string())
        .await
        .expect("set token");
    let events = EventBus::new();
    let transport = Arc::new(ApiTransport::with_client(
        reqwest::Client::new(),
        server_url,
        session,
        events.clone(),
    ));
    (transport, events)
}
