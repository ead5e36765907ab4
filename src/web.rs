use actix_files::Files;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

use crate::config::Config;
use crate::display::chart_to_text;
use crate::error::Error;
use crate::parser::read_roster;
use crate::roster::{Roster, NO_GROUPING};
use crate::seating::{
    generate, generate_with_rng, Grouping, GroupingType, SeatingChart, SeatingPreferences,
};
use crate::store::JsonStore;

// Rosters and preferences live on disk; the last chart is kept for export
pub struct AppState {
    pub store: Mutex<JsonStore>,
    pub last_chart: Mutex<Option<(String, SeatingChart)>>,
}

impl AppState {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store: Mutex::new(store),
            last_chart: Mutex::new(None),
        }
    }
}

#[derive(Serialize)]
pub struct RosterListResponse {
    rosters: Vec<String>,
    active: String,
}

#[derive(Serialize)]
pub struct RosterView {
    name: String,
    headers: Vec<String>,
    students: Roster,
}

impl RosterView {
    fn new(name: &str, students: Roster) -> Self {
        Self {
            name: name.to_string(),
            headers: students.headers(),
            students,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    new_name: String,
}

#[derive(Deserialize)]
pub struct InsertRowRequest {
    index: usize,
}

#[derive(Deserialize)]
pub struct InsertColumnRequest {
    after: usize,
    name: String,
}

#[derive(Deserialize)]
pub struct SetCellRequest {
    row: usize,
    column: String,
    value: String,
}

fn default_grouping_column() -> String {
    NO_GROUPING.to_string()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    #[serde(default = "default_grouping_column")]
    grouping_column: String,
    #[serde(default)]
    grouping_type: GroupingType,
    seed: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
    roster_name: String,
    #[serde(flatten)]
    chart: SeatingChart,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("state lock poisoned"))
}

fn error_response(err: &Error) -> HttpResponse {
    let body = serde_json::json!({"success": false, "error": err.to_string()});
    match err {
        Error::RosterNotFound(_) => HttpResponse::NotFound().json(body),
        Error::Io(_) | Error::Json(_) => {
            warn!("Request failed: {}", err);
            HttpResponse::InternalServerError().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

/// Loads a roster, applies an edit and saves it back
fn edit_roster<F>(state: &AppState, name: &str, edit: F) -> Result<HttpResponse>
where
    F: FnOnce(&mut Roster) -> Result<(), Error>,
{
    let store = lock(&state.store)?;
    let outcome = store.load_roster(name).and_then(|mut roster| {
        edit(&mut roster)?;
        store.save_roster(name, &roster)?;
        Ok(roster)
    });
    Ok(match outcome {
        Ok(roster) => HttpResponse::Ok().json(RosterView::new(name, roster)),
        Err(e) => error_response(&e),
    })
}

async fn list_rosters(state: web::Data<AppState>) -> Result<HttpResponse> {
    let store = lock(&state.store)?;
    let listing = store.list_rosters().and_then(|rosters| {
        let active = store.active_roster()?;
        Ok(RosterListResponse { rosters, active })
    });
    Ok(match listing {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(e) => error_response(&e),
    })
}

async fn get_roster(name: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let store = lock(&state.store)?;
    Ok(match store.load_roster(&name) {
        Ok(roster) => HttpResponse::Ok().json(RosterView::new(&name, roster)),
        Err(e) => error_response(&e),
    })
}

async fn save_roster(
    name: web::Path<String>,
    roster: web::Json<Roster>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let roster = roster.into_inner();
    let store = lock(&state.store)?;
    Ok(match store.save_roster(&name, &roster) {
        Ok(()) => HttpResponse::Ok().json(RosterView::new(&name, roster)),
        Err(e) => error_response(&e),
    })
}

async fn delete_roster(name: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let store = lock(&state.store)?;
    Ok(match store.delete_roster(&name) {
        Ok(active) => HttpResponse::Ok().json(serde_json::json!({"success": true, "active": active})),
        Err(e) => error_response(&e),
    })
}

// CSV upload: the body is the raw file
async fn import_roster(
    name: web::Path<String>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let roster = match read_roster(&body[..]) {
        Ok(roster) => roster,
        Err(e) => return Ok(error_response(&e)),
    };
    let store = lock(&state.store)?;
    Ok(match store.save_roster(&name, &roster) {
        Ok(()) => HttpResponse::Ok().json(RosterView::new(&name, roster)),
        Err(e) => error_response(&e),
    })
}

async fn rename_roster(
    name: web::Path<String>,
    req: web::Json<RenameRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let store = lock(&state.store)?;
    Ok(match store.rename_roster(&name, &req.new_name) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({"success": true, "active": req.new_name.trim()})),
        Err(e) => error_response(&e),
    })
}

async fn insert_row(
    name: web::Path<String>,
    req: web::Json<InsertRowRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    edit_roster(&state, &name, |roster| {
        roster.insert_row(req.index);
        Ok(())
    })
}

async fn remove_row(path: web::Path<(String, usize)>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let (name, index) = path.into_inner();
    edit_roster(&state, &name, |roster| roster.remove_row(index).map(|_| ()))
}

async fn insert_column(
    name: web::Path<String>,
    req: web::Json<InsertColumnRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    edit_roster(&state, &name, |roster| roster.insert_column(req.after, &req.name))
}

async fn remove_column(path: web::Path<(String, usize)>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let (name, index) = path.into_inner();
    edit_roster(&state, &name, |roster| roster.remove_column(index).map(|_| ()))
}

async fn rename_column(
    path: web::Path<(String, usize)>,
    req: web::Json<RenameRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (name, index) = path.into_inner();
    edit_roster(&state, &name, |roster| roster.rename_column(index, &req.new_name))
}

async fn set_cell(
    name: web::Path<String>,
    req: web::Json<SetCellRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    edit_roster(&state, &name, |roster| roster.set_cell(req.row, &req.column, &req.value))
}

async fn grouping_columns(name: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let store = lock(&state.store)?;
    Ok(match store.load_roster(&name) {
        Ok(roster) => HttpResponse::Ok().json(serde_json::json!({
            "columns": roster.grouping_columns(),
            "types": [GroupingType::Mixed, GroupingType::Same],
        })),
        Err(e) => error_response(&e),
    })
}

async fn get_preferences(state: web::Data<AppState>) -> Result<HttpResponse> {
    let store = lock(&state.store)?;
    Ok(match store.load_preferences() {
        Ok(prefs) => HttpResponse::Ok().json(prefs),
        Err(e) => error_response(&e),
    })
}

async fn save_preferences(
    prefs: web::Json<SeatingPreferences>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut prefs = prefs.into_inner();
    prefs.pad_table_settings();
    let store = lock(&state.store)?;
    Ok(match store.save_preferences(&prefs) {
        Ok(()) => HttpResponse::Ok().json(prefs),
        Err(e) => error_response(&e),
    })
}

async fn reset_table_settings(state: web::Data<AppState>) -> Result<HttpResponse> {
    let store = lock(&state.store)?;
    let reset = store.load_preferences().and_then(|mut prefs| {
        prefs.reset_table_settings();
        store.save_preferences(&prefs)?;
        Ok(prefs)
    });
    Ok(match reset {
        Ok(prefs) => HttpResponse::Ok().json(prefs),
        Err(e) => error_response(&e),
    })
}

async fn generate_chart(
    name: web::Path<String>,
    req: web::Json<ChartRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let loaded = {
        let store = lock(&state.store)?;
        store
            .load_roster(&name)
            .and_then(|roster| Ok((roster, store.load_preferences()?)))
    };
    let (roster, prefs) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => return Ok(error_response(&e)),
    };

    let grouping = Grouping::from_selection(&req.grouping_column, req.grouping_type);
    let result = match req.seed {
        Some(seed) => generate_with_rng(&roster, &prefs, &grouping, &mut StdRng::seed_from_u64(seed)),
        None => generate(&roster, &prefs, &grouping),
    };

    match result {
        Ok(chart) => {
            info!("Generated chart for \"{}\"", name);
            *lock(&state.last_chart)? = Some((name.to_string(), chart.clone()));
            Ok(HttpResponse::Ok().json(ChartResponse {
                roster_name: name.into_inner(),
                chart,
            }))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn export_chart(state: web::Data<AppState>) -> Result<HttpResponse> {
    let last_chart = lock(&state.last_chart)?;
    if let Some((ref roster_name, ref chart)) = *last_chart {
        Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}_seating_chart.txt\"", roster_name),
            ))
            .body(chart_to_text(roster_name, chart)))
    } else {
        Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "No seating chart generated yet"})))
    }
}

/// Registers the JSON API routes
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/rosters", web::get().to(list_rosters))
        .service(
            web::resource("/api/rosters/{name}")
                .route(web::get().to(get_roster))
                .route(web::put().to(save_roster))
                .route(web::delete().to(delete_roster)),
        )
        .route("/api/rosters/{name}/import", web::post().to(import_roster))
        .route("/api/rosters/{name}/rename", web::post().to(rename_roster))
        .route("/api/rosters/{name}/rows", web::post().to(insert_row))
        .route("/api/rosters/{name}/rows/{index}", web::delete().to(remove_row))
        .route("/api/rosters/{name}/columns", web::post().to(insert_column))
        .route("/api/rosters/{name}/columns/{index}", web::delete().to(remove_column))
        .route("/api/rosters/{name}/columns/{index}/rename", web::post().to(rename_column))
        .route("/api/rosters/{name}/cells", web::put().to(set_cell))
        .route("/api/rosters/{name}/grouping-columns", web::get().to(grouping_columns))
        .route("/api/rosters/{name}/chart", web::post().to(generate_chart))
        .service(
            web::resource("/api/preferences")
                .route(web::get().to(get_preferences))
                .route(web::put().to(save_preferences)),
        )
        .route("/api/preferences/reset", web::post().to(reset_table_settings))
        .route("/api/chart/export", web::get().to(export_chart));
}

pub async fn start_server(config: Config) -> std::io::Result<()> {
    let store = JsonStore::open(&config.data_dir).map_err(|e| std::io::Error::other(e.to_string()))?;
    let app_state = web::Data::new(AppState::new(store));
    let static_dir = config.static_dir.clone();
    let serve_static = static_dir.is_dir();
    if !serve_static {
        info!("No front-end found at {}, serving the API only", static_dir.display());
    }

    info!("Listening on http://{}:{}", config.bind, config.port);
    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure_api)
            .configure(move |cfg| {
                if serve_static {
                    cfg.service(Files::new("/", static_dir).index_file("index.html"));
                }
            })
    })
    .bind((config.bind.as_str(), config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use tempfile::TempDir;

    fn state() -> (TempDir, web::Data<AppState>) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        (dir, web::Data::new(AppState::new(store)))
    }

    const CSV: &str = "First Name,Last Name,Level\nAda,Lovelace,High\nAlan,Turing,Low\nGrace,Hopper,High\nEdsger,Dijkstra,Low\nBarbara,Liskov,High\n";

    #[actix_web::test]
    async fn test_import_then_generate_and_export() {
        let (_dir, state) = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_api)).await;

        let req = test::TestRequest::post()
            .uri("/api/rosters/Period1/import")
            .set_payload(CSV)
            .to_request();
        let view: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["students"].as_array().unwrap().len(), 5);
        assert_eq!(view["headers"][2], "Level");

        let req = test::TestRequest::post()
            .uri("/api/rosters/Period1/chart")
            .set_json(serde_json::json!({"groupingColumn": "Level", "groupingType": "Same", "seed": 4}))
            .to_request();
        let chart: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(chart["rosterName"], "Period1");
        let seated: usize = chart["tables"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|t| t["seats"].as_array().unwrap())
            .filter(|s| !s["student"].is_null())
            .count();
        assert_eq!(seated, 5);

        let req = test::TestRequest::get().uri("/api/chart/export").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.starts_with("** Period1 Seating Chart **"));
    }

    #[actix_web::test]
    async fn test_empty_roster_chart_is_bad_request() {
        let (_dir, state) = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_api)).await;
        let req = test::TestRequest::post()
            .uri("/api/rosters/Empty/chart")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_export_before_generate_is_not_found() {
        let (_dir, state) = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_api)).await;
        let req = test::TestRequest::get().uri("/api/chart/export").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_column_edits_and_required_columns() {
        let (_dir, state) = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_api)).await;
        let req = test::TestRequest::post()
            .uri("/api/rosters/P2/import")
            .set_payload(CSV)
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/rosters/P2/columns")
            .set_json(serde_json::json!({"after": 2, "name": "Seat Pref"}))
            .to_request();
        let view: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["headers"][3], "Seat Pref");

        let req = test::TestRequest::delete().uri("/api/rosters/P2/columns/0").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete().uri("/api/rosters/P2/rows/0").to_request();
        let view: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["students"].as_array().unwrap().len(), 4);
    }

    #[actix_web::test]
    async fn test_cell_edit_and_column_rename() {
        let (_dir, state) = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_api)).await;
        let req = test::TestRequest::post()
            .uri("/api/rosters/P3/import")
            .set_payload(CSV)
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::put()
            .uri("/api/rosters/P3/cells")
            .set_json(serde_json::json!({"row": 1, "column": "Level", "value": "Mid"}))
            .to_request();
        let view: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["students"][1]["Level"], "Mid");

        let req = test::TestRequest::put()
            .uri("/api/rosters/P3/cells")
            .set_json(serde_json::json!({"row": 0, "column": "Nickname", "value": "Countess"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/rosters/P3/columns/2/rename")
            .set_json(serde_json::json!({"newName": "Ability"}))
            .to_request();
        let view: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["headers"][2], "Ability");
        assert_eq!(view["students"][1]["Ability"], "Mid");

        let req = test::TestRequest::post()
            .uri("/api/rosters/P3/columns/0/rename")
            .set_json(serde_json::json!({"newName": "Given Name"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // Edits are persisted
        let req = test::TestRequest::get().uri("/api/rosters/P3").to_request();
        let view: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["students"][1]["Ability"], "Mid");
    }

    #[actix_web::test]
    async fn test_blank_table_settings_get_defaults_in_chart() {
        let (_dir, state) = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_api)).await;
        let req = test::TestRequest::put()
            .uri("/api/preferences")
            .set_json(serde_json::json!({
                "numTables": 1,
                "studentsPerTable": 5,
                "minStudentsPerTable": 3,
                "tableSettings": [{"name": "", "color": ""}],
            }))
            .to_request();
        let prefs: SeatingPreferences = test::call_and_read_body_json(&app, req).await;
        assert_eq!(prefs.table_settings[0].name, "Table 1");

        let req = test::TestRequest::post()
            .uri("/api/rosters/P4/import")
            .set_payload(CSV)
            .to_request();
        test::call_service(&app, req).await;
        let req = test::TestRequest::post()
            .uri("/api/rosters/P4/chart")
            .set_json(serde_json::json!({"seed": 1}))
            .to_request();
        let chart: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(chart["tables"][0]["name"], "Table 1");
        assert_eq!(chart["tables"][0]["color"], "#f9f9f9");
    }

    #[actix_web::test]
    async fn test_reset_table_settings() {
        let (_dir, state) = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_api)).await;
        let req = test::TestRequest::put()
            .uri("/api/preferences")
            .set_json(serde_json::json!({
                "numTables": 3,
                "tableSettings": [{"name": "Window", "color": "#aaccee"}],
            }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post().uri("/api/preferences/reset").to_request();
        let prefs: SeatingPreferences = test::call_and_read_body_json(&app, req).await;
        assert_eq!(prefs.num_tables, 3);
        assert_eq!(prefs.table_settings[0].name, "Table 1");
        assert_eq!(prefs.table_settings[0].color, "#f9f9f9");

        let req = test::TestRequest::get().uri("/api/preferences").to_request();
        let saved: SeatingPreferences = test::call_and_read_body_json(&app, req).await;
        assert_eq!(saved, prefs);
    }

    #[actix_web::test]
    async fn test_preferences_roundtrip() {
        let (_dir, state) = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_api)).await;
        let req = test::TestRequest::put()
            .uri("/api/preferences")
            .set_json(serde_json::json!({"numTables": 6, "studentsPerTable": 5, "minStudentsPerTable": 4}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/api/preferences").to_request();
        let prefs: SeatingPreferences = test::call_and_read_body_json(&app, req).await;
        assert_eq!(prefs.num_tables, 6);
        assert_eq!(prefs.students_per_table, 5);
        assert_eq!(prefs.min_students_per_table, 4);
    }

    #[actix_web::test]
    async fn test_rename_missing_roster_is_not_found() {
        let (_dir, state) = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_api)).await;
        let req = test::TestRequest::post()
            .uri("/api/rosters/Ghost/rename")
            .set_json(serde_json::json!({"newName": "Spirit"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
