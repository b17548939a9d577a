//! Single binary web host: REST API over the engine and an in-memory store.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! ENGINE_SEED (u64) fixes every shuffle, for reproducible brackets.

use actix_web::{
    get, post,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::NaiveDateTime;
use racquet_tournament::engine::{Engine, EngineConfig};
use racquet_tournament::models::{
    Category, CategoryId, Competitor, ConfrontationGame, ConfrontationId, Gender, KnockoutStage,
    Match, MatchId, Participant, ParticipantId, Round, SetScore, Tournament, TournamentFormat,
    TournamentId,
};
use racquet_tournament::store::{MatchFilter, MemoryStore, TournamentStore};
use racquet_tournament::EngineError;
use serde::Deserialize;
use std::sync::Arc;

type AppState = Data<Engine<MemoryStore>>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_court_count() -> u32 {
    4
}

fn default_match_duration() -> u32 {
    90
}

fn default_qualified_per_group() -> u32 {
    2
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    #[serde(default)]
    format: TournamentFormat,
    #[serde(default = "default_court_count")]
    court_count: u32,
    #[serde(default = "default_match_duration")]
    match_duration_minutes: u32,
    start_time: Option<NaiveDateTime>,
}

#[derive(Deserialize)]
struct CreateCategoryBody {
    name: String,
    format: TournamentFormat,
    #[serde(default)]
    number_of_groups: u32,
    #[serde(default = "default_qualified_per_group")]
    qualified_per_group: u32,
    knockout_stage: Option<KnockoutStage>,
    #[serde(default)]
    third_place_match: bool,
}

#[derive(Deserialize)]
struct RegisterParticipantBody {
    name: String,
    /// Individual player instead of a team.
    #[serde(default)]
    individual: bool,
    gender: Option<Gender>,
    group_name: Option<String>,
}

#[derive(Deserialize)]
struct NewMatchBody {
    round: Round,
    position: u32,
    team1: Option<Competitor>,
    team2: Option<Competitor>,
}

#[derive(Deserialize)]
struct CreateMatchesBody {
    matches: Vec<NewMatchBody>,
}

#[derive(Deserialize)]
struct ResultBody {
    sets: Vec<SetScore>,
}

#[derive(Deserialize)]
struct MixedAmericanBody {
    matches_per_player: u32,
}

#[derive(Deserialize, Default)]
struct AmericanoBody {
    group: Option<String>,
}

#[derive(Deserialize)]
struct StartConfrontationsBody {
    seeded: Vec<ParticipantId>,
}

#[derive(Deserialize)]
struct ConfrontationResultBody {
    games: Vec<ConfrontationGame>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and category id. A tournament without
/// categories uses its own id as the category id.
#[derive(Deserialize)]
struct CategoryPath {
    id: TournamentId,
    category_id: CategoryId,
}

#[derive(Deserialize)]
struct MatchPath {
    match_id: MatchId,
}

#[derive(Deserialize)]
struct ConfrontationPath {
    confrontation_id: ConfrontationId,
}

fn error_response(e: EngineError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        EngineError::TournamentNotFound(_)
        | EngineError::CategoryNotFound(_)
        | EngineError::MatchNotFound(_)
        | EngineError::ConfrontationNotFound(_)
        | EngineError::ParticipantNotFound(_) => HttpResponse::NotFound().json(body),
        EngineError::InvalidScore(_)
        | EngineError::NotEnoughPlayers { .. }
        | EngineError::InvalidFormat(_) => HttpResponse::BadRequest().json(body),
        EngineError::Store(_) => HttpResponse::InternalServerError().json(body),
    }
}

fn respond<T: serde::Serialize>(result: Result<T, EngineError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "racquet-tournament",
    })
}

#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let body = body.into_inner();
    let tournament = Tournament::new(body.name, body.format).with_schedule(
        body.court_count,
        body.match_duration_minutes,
        body.start_time,
    );
    respond(
        state
            .store()
            .insert_tournament(tournament.clone())
            .map(|_| tournament)
            .map_err(EngineError::from),
    )
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.store().get_tournament(path.id).await {
        Ok(Some(t)) => HttpResponse::Ok().json(t),
        Ok(None) => error_response(EngineError::TournamentNotFound(path.id)),
        Err(e) => error_response(e.into()),
    }
}

#[post("/api/tournaments/{id}/categories")]
async fn api_create_category(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<CreateCategoryBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let mut category = Category::new(path.id, body.name, body.format);
    category.number_of_groups = body.number_of_groups;
    category.qualified_per_group = body.qualified_per_group;
    category.knockout_stage = body.knockout_stage;
    category.third_place_match = body.third_place_match;
    respond(
        state
            .store()
            .insert_category(category.clone())
            .map(|_| category)
            .map_err(EngineError::from),
    )
}

#[post("/api/tournaments/{id}/categories/{category_id}/participants")]
async fn api_register_participant(
    state: AppState,
    path: Path<CategoryPath>,
    body: Json<RegisterParticipantBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let store = state.store();
    let order = match store.list_participants(path.id, Some(path.category_id)).await {
        Ok(existing) => existing.len() as u32,
        Err(e) => return error_response(e.into()),
    };
    let participant = if body.individual {
        Participant::individual(path.id, path.category_id, body.name, body.gender, order)
    } else {
        Participant::team(path.id, path.category_id, body.name, order)
    };
    let participant = match body.group_name {
        Some(group) => participant.in_group(group),
        None => participant,
    };
    respond(
        store
            .insert_participant(participant.clone())
            .map(|_| participant)
            .map_err(EngineError::from),
    )
}

#[get("/api/tournaments/{id}/categories/{category_id}/participants")]
async fn api_list_participants(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    respond(
        state
            .store()
            .list_participants(path.id, Some(path.category_id))
            .await
            .map_err(EngineError::from),
    )
}

/// Insert group-stage or first-round matches built by the organizer.
#[post("/api/tournaments/{id}/categories/{category_id}/matches")]
async fn api_create_matches(
    state: AppState,
    path: Path<CategoryPath>,
    body: Json<CreateMatchesBody>,
) -> HttpResponse {
    let matches: Vec<Match> = body
        .into_inner()
        .matches
        .into_iter()
        .map(|m| {
            Match::new(path.id, path.category_id, m.round, m.position).with_sides(m.team1, m.team2)
        })
        .collect();
    respond(
        state
            .store()
            .insert_matches(matches.clone())
            .await
            .map(|_| matches)
            .map_err(EngineError::from),
    )
}

#[get("/api/tournaments/{id}/categories/{category_id}/matches")]
async fn api_list_matches(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    respond(
        state
            .store()
            .list_matches(&MatchFilter::category(path.id, path.category_id))
            .await
            .map_err(EngineError::from),
    )
}

/// Record a result; advancement runs as part of the call.
#[post("/api/matches/{match_id}/result")]
async fn api_record_result(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<ResultBody>,
) -> HttpResponse {
    respond(state.record_result(path.match_id, body.into_inner().sets).await)
}

#[post("/api/matches/{match_id}/revert")]
async fn api_revert_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    respond(state.revert_match(path.match_id).await)
}

#[post("/api/tournaments/{id}/categories/{category_id}/finish-group-stage")]
async fn api_finish_group_stage(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    respond(state.finish_group_stage(path.id, path.category_id).await)
}

#[post("/api/tournaments/{id}/categories/{category_id}/final-positions")]
async fn api_final_positions(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    respond(state.compute_final_positions(path.id, path.category_id).await)
}

#[post("/api/tournaments/{id}/categories/{category_id}/mixed-american")]
async fn api_mixed_american(
    state: AppState,
    path: Path<CategoryPath>,
    body: Json<MixedAmericanBody>,
) -> HttpResponse {
    respond(
        state
            .generate_mixed_american_schedule(path.id, path.category_id, body.matches_per_player)
            .await,
    )
}

#[post("/api/tournaments/{id}/categories/{category_id}/americano")]
async fn api_americano(
    state: AppState,
    path: Path<CategoryPath>,
    body: Option<Json<AmericanoBody>>,
) -> HttpResponse {
    let group = body.map(|b| b.into_inner()).unwrap_or_default().group;
    respond(state.generate_americano_round(path.id, path.category_id, group).await)
}

#[post("/api/tournaments/{id}/categories/{category_id}/confrontations")]
async fn api_start_confrontations(
    state: AppState,
    path: Path<CategoryPath>,
    body: Json<StartConfrontationsBody>,
) -> HttpResponse {
    respond(
        state
            .start_confrontation_bracket(path.id, path.category_id, body.into_inner().seeded)
            .await,
    )
}

#[post("/api/confrontations/{confrontation_id}/result")]
async fn api_record_confrontation(
    state: AppState,
    path: Path<ConfrontationPath>,
    body: Json<ConfrontationResultBody>,
) -> HttpResponse {
    respond(
        state
            .record_confrontation(path.confrontation_id, body.into_inner().games)
            .await,
    )
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let config = EngineConfig {
        seed: std::env::var("ENGINE_SEED").ok().and_then(|s| s.parse().ok()),
    };
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);
    if let Some(seed) = config.seed {
        log::info!("Engine seeded with {}", seed);
    }

    let state = Data::new(Engine::new(Arc::new(MemoryStore::new()), config));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_create_category)
            .service(api_register_participant)
            .service(api_list_participants)
            .service(api_create_matches)
            .service(api_list_matches)
            .service(api_record_result)
            .service(api_revert_match)
            .service(api_finish_group_stage)
            .service(api_final_positions)
            .service(api_mixed_american)
            .service(api_americano)
            .service(api_start_confrontations)
            .service(api_record_confrontation)
    })
    .bind(bind)?
    .run()
    .await
}
