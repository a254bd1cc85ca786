use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// Response of `GET /api/hello/`.
pub const HELLO_MESSAGE: &str = "Hello World!";

/// Canned summary served by `GET /api/weather/`, in the format the real
/// backend produces from its upstream weather provider.
pub const WEATHER_SUMMARY: &str = "Weather in Hamburg: clear sky, 20°C";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct PersonInput {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// In-memory person table. Rows keep insertion order so list responses are
/// deterministic; ids are assigned sequentially from 1 like an autoincrement
/// column.
pub struct PersonTable {
    next_id: i64,
    rows: Vec<Person>,
}

impl PersonTable {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl Default for PersonTable {
    fn default() -> Self {
        Self::new()
    }
}

pub type Db = Arc<RwLock<PersonTable>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(PersonTable::new()));
    Router::new().nest("/api", api_routes()).with_state(db)
}

// The static `/hello/persons/` segment shadows the `{last_name}` capture:
// the persons collection stays reachable, and the one name that can never
// be greeted is the literal segment `persons`.
fn api_routes() -> Router<Db> {
    Router::new()
        .route("/hello/", get(hello_world))
        .route("/hello/persons/", get(list_persons).post(create_person))
        .route(
            "/hello/persons/{id}/",
            get(get_person).put(update_person).delete(delete_person),
        )
        .route("/hello/{last_name}/", get(hello_person))
        .route("/weather/", get(weather_summary))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn hello_world() -> Json<Message> {
    Json(Message {
        message: HELLO_MESSAGE.to_string(),
    })
}

async fn hello_person(State(db): State<Db>, Path(last_name): Path<String>) -> Json<Message> {
    let table = db.read().await;
    let message = match table.rows.iter().find(|p| p.last_name == last_name) {
        Some(person) => format!("Hello {} {}!", person.first_name, person.last_name),
        None => format!("Who is this '{last_name}' you're talking about?"),
    };
    Json(Message { message })
}

async fn list_persons(State(db): State<Db>) -> Json<Vec<Person>> {
    let table = db.read().await;
    Json(table.rows.clone())
}

async fn create_person(
    State(db): State<Db>,
    Json(input): Json<PersonInput>,
) -> (StatusCode, Json<Person>) {
    let mut table = db.write().await;
    let person = Person {
        id: table.next_id,
        first_name: input.first_name,
        last_name: input.last_name,
        created_at: Utc::now(),
    };
    table.next_id += 1;
    table.rows.push(person.clone());
    (StatusCode::CREATED, Json(person))
}

async fn get_person(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Person>, StatusCode> {
    let table = db.read().await;
    table
        .rows
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_person(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<PersonInput>,
) -> Result<Json<Person>, StatusCode> {
    let mut table = db.write().await;
    let person = table
        .rows
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    person.first_name = input.first_name;
    person.last_name = input.last_name;
    Ok(Json(person.clone()))
}

async fn delete_person(State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, StatusCode> {
    let mut table = db.write().await;
    match table.rows.iter().position(|p| p.id == id) {
        Some(index) => {
            table.rows.remove(index);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn weather_summary() -> Json<Message> {
    Json(Message {
        message: WEATHER_SUMMARY.to_string(),
    })
}
