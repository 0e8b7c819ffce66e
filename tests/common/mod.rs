#![allow(dead_code)]

use axum::extract::{Multipart, Path, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const SESSION_COOKIE: &str = "session";

#[derive(Clone, Debug)]
pub struct Stored {
    pub id: i64,
    pub contact: i64,
    pub mine: bool,
    pub content: String,
    pub attachment: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileRecord {
    pub username: String,
    pub phone_number: String,
    pub status: String,
    pub picture: Option<String>,
}

#[derive(Default)]
pub struct Store {
    pub users: Vec<(i64, String, Option<String>)>,
    pub passwords: Vec<(String, String)>,
    pub admins: Vec<String>,
    /// Profile forms posted to `/profile`, with the account that sent them.
    pub profiles: Vec<(String, ProfileRecord)>,
    pub messages: Vec<Stored>,
    pub next_id: i64,
}

/// In-process stand-in for the chat server. Counts every request it sees.
#[derive(Clone, Default)]
pub struct Backend {
    pub state: Arc<Mutex<Store>>,
    hits: Arc<AtomicUsize>,
}

impl Backend {
    pub fn seeded() -> Self {
        let backend = Backend::default();
        {
            let mut st = backend.state.lock().unwrap();
            st.users = vec![
                (1, "ann".into(), Some("ann.png".into())),
                (2, "bob".into(), None),
            ];
            st.passwords = vec![("me".into(), "secret".into()), ("root".into(), "toor".into())];
            st.admins = vec!["root".into()];
            st.messages = vec![
                Stored { id: 1, contact: 1, mine: false, content: "hi there".into(), attachment: None },
                Stored { id: 2, contact: 1, mine: true, content: "look".into(), attachment: Some("cat.png".into()) },
            ];
            st.next_id = 3;
        }
        backend
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn stored(&self, id: i64) -> Option<Stored> {
        self.state.lock().unwrap().messages.iter().find(|m| m.id == id).cloned()
    }

    pub fn user(&self, id: i64) -> Option<(i64, String, Option<String>)> {
        self.state.lock().unwrap().users.iter().find(|u| u.0 == id).cloned()
    }

    pub fn last_profile(&self) -> Option<(String, ProfileRecord)> {
        self.state.lock().unwrap().profiles.last().cloned()
    }
}

#[derive(Deserialize)]
struct Creds {
    username: String,
    password: String,
}

fn error(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "error": text }))).into_response()
}

/// The account named by the session cookie, if any.
fn session_user(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|c| c.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn authorized(headers: &HeaderMap) -> bool {
    session_user(headers).is_some()
}

fn is_admin(backend: &Backend, headers: &HeaderMap) -> bool {
    session_user(headers).is_some_and(|u| backend.state.lock().unwrap().admins.contains(&u))
}

async fn count(State(backend): State<Backend>, req: Request, next: Next) -> Response {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    next.run(req).await
}

async fn login(State(backend): State<Backend>, Json(creds): Json<Creds>) -> Response {
    let ok = backend
        .state
        .lock()
        .unwrap()
        .passwords
        .iter()
        .any(|(u, p)| *u == creds.username && *p == creds.password);
    if !ok {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}={}; Path=/", creds.username))],
        Json(json!({ "message": "Login successful" })),
    )
        .into_response()
}

async fn register(State(backend): State<Backend>, Json(creds): Json<Creds>) -> Response {
    let mut st = backend.state.lock().unwrap();
    if st.passwords.iter().any(|(u, _)| *u == creds.username) {
        return error(StatusCode::BAD_REQUEST, "User already exists");
    }
    st.passwords.push((creds.username, creds.password));
    (StatusCode::CREATED, Json(json!({ "message": "User registered successfully" }))).into_response()
}

async fn logout(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    Json(json!({ "message": "bye" })).into_response()
}

async fn users(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let st = backend.state.lock().unwrap();
    let list: Vec<Value> = st
        .users
        .iter()
        .map(|(id, name, pic)| json!({ "id": id, "username": name, "profile_pic": pic }))
        .collect();
    Json(list).into_response()
}

async fn conversation(State(backend): State<Backend>, headers: HeaderMap, Path(contact): Path<i64>) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let st = backend.state.lock().unwrap();
    let name = st
        .users
        .iter()
        .find(|(id, _, _)| *id == contact)
        .map(|(_, n, _)| n.clone())
        .unwrap_or_default();
    let list: Vec<Value> = st
        .messages
        .iter()
        .filter(|m| m.contact == contact)
        .map(|m| {
            json!({
                "id": m.id,
                "sender": if m.mine { "You".to_string() } else { name.clone() },
                "content": m.content,
                "attachment": m.attachment,
                "timestamp": "2024-06-01 12:30:00",
            })
        })
        .collect();
    Json(list).into_response()
}

async fn delete_message(State(backend): State<Backend>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut st = backend.state.lock().unwrap();
    let Some(pos) = st.messages.iter().position(|m| m.id == id) else {
        return error(StatusCode::NOT_FOUND, "Message not found");
    };
    if !st.messages[pos].mine {
        return error(StatusCode::FORBIDDEN, "Permission denied");
    }
    st.messages.remove(pos);
    Json(json!({ "message": "Message deleted successfully" })).into_response()
}

async fn send_message(State(backend): State<Backend>, headers: HeaderMap, mut form: Multipart) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut content = String::new();
    let mut receiver: Option<i64> = None;
    let mut attachment = None;
    while let Ok(Some(field)) = form.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "content" => content = field.text().await.unwrap_or_default(),
            "receiver_id" => receiver = field.text().await.ok().and_then(|t| t.parse().ok()),
            "attachment" => {
                attachment = field.file_name().map(str::to_string);
                let _ = field.bytes().await;
            }
            _ => {}
        }
    }
    let mut st = backend.state.lock().unwrap();
    let Some(receiver) = receiver.filter(|r| st.users.iter().any(|(id, _, _)| id == r)) else {
        return error(StatusCode::BAD_REQUEST, "Receiver does not exist");
    };
    let id = st.next_id;
    st.next_id += 1;
    st.messages.push(Stored { id, contact: receiver, mine: true, content, attachment });
    (StatusCode::CREATED, Json(json!({ "message": "Message sent successfully", "message_id": id }))).into_response()
}

async fn read_profile_form(mut form: Multipart) -> ProfileRecord {
    let mut record = ProfileRecord::default();
    while let Ok(Some(field)) = form.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "username" => record.username = field.text().await.unwrap_or_default(),
            "phone_number" => record.phone_number = field.text().await.unwrap_or_default(),
            "status" => record.status = field.text().await.unwrap_or_default(),
            "profile_pic" => {
                record.picture = field.file_name().map(str::to_string);
                let _ = field.bytes().await;
            }
            _ => {}
        }
    }
    record
}

async fn update_profile(State(backend): State<Backend>, headers: HeaderMap, form: Multipart) -> Response {
    let Some(user) = session_user(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    };
    let record = read_profile_form(form).await;
    backend.state.lock().unwrap().profiles.push((user, record));
    Redirect::to("/profile").into_response()
}

async fn profile_page(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    Html("<h1>Profile</h1>").into_response()
}

async fn admin_delete_user(State(backend): State<Backend>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !is_admin(&backend, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut st = backend.state.lock().unwrap();
    let Some(pos) = st.users.iter().position(|u| u.0 == id) else {
        return error(StatusCode::NOT_FOUND, "User not found");
    };
    st.users.remove(pos);
    st.messages.retain(|m| m.contact != id);
    Json(json!({ "message": "User and associated messages deleted successfully" })).into_response()
}

async fn admin_edit_user(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    form: Multipart,
) -> Response {
    if !is_admin(&backend, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    if backend.user(id).is_none() {
        return error(StatusCode::NOT_FOUND, "User not found");
    }
    let record = read_profile_form(form).await;
    let mut st = backend.state.lock().unwrap();
    if let Some(user) = st.users.iter_mut().find(|u| u.0 == id) {
        user.1 = record.username;
        if record.picture.is_some() {
            user.2 = record.picture;
        }
    }
    Redirect::to("/admin/users").into_response()
}

async fn admin_users_page(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !is_admin(&backend, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    Html("<h1>Users</h1>").into_response()
}

async fn upload(Path(file): Path<String>) -> Response {
    if file == "cat.png" {
        vec![0x89u8, b'P', b'N', b'G'].into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

pub fn router(backend: Backend) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/users", get(users))
        .route("/messages", post(send_message))
        .route("/messages/{id}", get(conversation).delete(delete_message))
        .route("/profile", get(profile_page).post(update_profile))
        .route("/admin/users", get(admin_users_page))
        .route("/admin/users/{id}", post(admin_delete_user))
        .route("/admin/users/{id}/edit", post(admin_edit_user))
        .route("/static/uploads/{file}", get(upload))
        .layer(middleware::from_fn_with_state(backend.clone(), count))
        .with_state(backend)
}

pub async fn spawn_backend() -> (String, Backend) {
    let backend = Backend::seeded();
    let app = router(backend.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), backend)
}
