use actix_web::http::header;
use actix_web::web::{self, Data, Form, Path};
use actix_web::{get, middleware, post, App, HttpResponse, HttpServer};
use log::info;
use std::collections::HashMap;
use uuid::Uuid;

mod actions_response;
mod application;
mod ballot_state;
mod config;
mod data;
mod error;
mod poll_state;
mod ui_poll_view;
mod web_ui;

use actions_response::{BallotForm, BuilderForm};
use application::PollApplication;
use config::Config;
use error::AppError;

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn html(page: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page)
}

#[get("/")]
async fn new_poll_response(application: Data<PollApplication>) -> Result<HttpResponse, AppError> {
    let poll_id = application.open_draft().await?;
    Ok(see_other(&format!("/create/{}", poll_id)))
}

#[get("/create/{poll_id}")]
async fn builder_response(
    path: Path<Uuid>,
    application: Data<PollApplication>,
) -> Result<HttpResponse, AppError> {
    Ok(html(application.builder_page(path.into_inner()).await?))
}

#[post("/create/{poll_id}")]
async fn builder_action_response(
    path: Path<Uuid>,
    payload: Form<HashMap<String, String>>,
    application: Data<PollApplication>,
) -> Result<HttpResponse, AppError> {
    let poll_id = path.into_inner();
    let form = BuilderForm::try_from(payload.into_inner())?;
    application.process_builder_form(poll_id, form).await?;
    Ok(see_other(&format!("/create/{}", poll_id)))
}

#[get("/poll/{poll_id}")]
async fn open_ballot_response(
    path: Path<String>,
    application: Data<PollApplication>,
) -> Result<HttpResponse, AppError> {
    let poll_id = path.into_inner();
    let ballot_id = application.open_ballot(&poll_id).await?;
    Ok(see_other(&format!("/poll/{}/ballot/{}", poll_id, ballot_id)))
}

#[get("/poll/{poll_id}/ballot/{ballot_id}")]
async fn ballot_response(
    path: Path<(String, Uuid)>,
    application: Data<PollApplication>,
) -> Result<HttpResponse, AppError> {
    let (_, ballot_id) = path.into_inner();
    Ok(html(application.ballot_page(ballot_id).await?))
}

#[post("/poll/{poll_id}/ballot/{ballot_id}")]
async fn ballot_action_response(
    path: Path<(String, Uuid)>,
    payload: Form<HashMap<String, String>>,
    application: Data<PollApplication>,
) -> Result<HttpResponse, AppError> {
    let (poll_id, ballot_id) = path.into_inner();
    let form = BallotForm::try_from(payload.into_inner())?;
    application.process_ballot_form(ballot_id, form).await?;
    Ok(see_other(&format!("/poll/{}/ballot/{}", poll_id, ballot_id)))
}

#[get("/favicon.ico")]
async fn favicon_response() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[get("/{poll_id}")]
async fn short_link_response(path: Path<String>) -> HttpResponse {
    see_other(&format!("/poll/{}", path.into_inner()))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().limit(64 * 1024))
        .service(new_poll_response)
        .service(builder_response)
        .service(builder_action_response)
        .service(open_ballot_response)
        .service(ballot_response)
        .service(ballot_action_response)
        .service(favicon_response)
        .service(short_link_response);
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::from_env()?;
    let address = (config.bind_addr.clone(), config.port);
    let workers = config.workers;
    let application = Data::new(PollApplication::new(config)?);
    info!("Serving polls on {}:{}", address.0, address.1);

    HttpServer::new(move || {
        App::new()
            .app_data(application.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .workers(workers)
    .bind(address)?
    .run()
    .await?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::testing::RecordingPollApi;
    use crate::data::{PollOption, PollQuestion, PollRecord};
    use actix_web::dev::{Service, ServiceResponse};
    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, init_service, read_body, TestRequest};
    use std::sync::Arc;

    fn location(response: &ServiceResponse) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned()
    }

    fn record(votes: &[u64]) -> PollRecord {
        PollRecord {
            id: "p1".to_owned(),
            questions: vec![PollQuestion {
                content: "Tea or coffee?".to_owned(),
                options: votes
                    .iter()
                    .enumerate()
                    .map(|(i, votes)| PollOption {
                        content: format!("Choice {}", i),
                        votes: *votes,
                    })
                    .collect(),
            }],
        }
    }

    async fn app_with(
        api: Arc<RecordingPollApi>,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
    {
        let application = PollApplication::with_api(Config::default(), api).unwrap();
        init_service(
            App::new()
                .app_data(Data::new(application))
                .configure(configure),
        )
        .await
    }

    async fn post_form<S>(app: &S, uri: &str, form: &[(&str, &str)]) -> String
    where
        S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    {
        let request = TestRequest::post().uri(uri).set_form(form).to_request();
        let response = call_service(app, request).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        location(&response)
    }

    async fn get_page<S>(app: &S, uri: &str) -> String
    where
        S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    {
        let response = call_service(app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        String::from_utf8(read_body(response).await.to_vec()).unwrap()
    }

    #[actix_rt::test]
    async fn builder_round_trip_creates_poll_once() {
        let api = Arc::new(RecordingPollApi::default());
        let app = app_with(api.clone()).await;

        let response = call_service(&app, TestRequest::get().uri("/").to_request()).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let builder = location(&response);
        assert!(builder.starts_with("/create/"));

        post_form(&app, &builder, &[("action", "add_question")]).await;
        post_form(
            &app,
            &builder,
            &[
                ("action", "finish"),
                ("question_0", "Tea or coffee?"),
                ("option_0_0", "Tea"),
                ("option_0_1", "Coffee"),
                ("question_1", "Morning or evening?"),
                ("option_1_0", "Morning"),
                ("option_1_1", "Evening"),
            ],
        )
        .await;

        let created = api.created.lock().unwrap().clone();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].questions.len(), 2);
        assert!(created[0].questions.iter().all(|q| q.options.len() == 2));
        assert!(created[0]
            .questions
            .iter()
            .flat_map(|q| q.options.iter())
            .all(|o| o.votes == 0));
        assert_eq!(format!("/create/{}", created[0].pollid), builder);

        let page = get_page(&app, &builder).await;
        assert!(page.contains("Poll finished and saved!"));
        assert!(page.contains("class=\"share\""));

        post_form(&app, &builder, &[("action", "finish")]).await;
        assert_eq!(api.created.lock().unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn invalid_builder_never_calls_backend() {
        let api = Arc::new(RecordingPollApi::default());
        let app = app_with(api.clone()).await;
        let response = call_service(&app, TestRequest::get().uri("/").to_request()).await;
        let builder = location(&response);

        post_form(
            &app,
            &builder,
            &[("action", "finish"), ("question_0", "Lonely"), ("option_0_0", "yes")],
        )
        .await;

        assert!(api.created.lock().unwrap().is_empty());
        let page = get_page(&app, &builder).await;
        assert!(page.contains("Please correct the highlighted errors"));
        assert!(page.contains("Question 1, option 2 is empty"));
    }

    #[actix_rt::test]
    async fn failed_create_keeps_poll_editable() {
        let api = Arc::new(RecordingPollApi {
            fail_create: true,
            ..Default::default()
        });
        let app = app_with(api.clone()).await;
        let response = call_service(&app, TestRequest::get().uri("/").to_request()).await;
        let builder = location(&response);
        let form = [
            ("action", "finish"),
            ("question_0", "Q"),
            ("option_0_0", "A"),
            ("option_0_1", "B"),
        ];

        post_form(&app, &builder, &form).await;
        let page = get_page(&app, &builder).await;
        assert!(page.contains("Could not save the poll"));
        assert!(!page.contains("class=\"share\""));

        post_form(&app, &builder, &form).await;
        assert_eq!(api.created.lock().unwrap().len(), 2);
    }

    #[actix_rt::test]
    async fn voting_submits_and_refetches() {
        let api = Arc::new(RecordingPollApi::serving(record(&[0, 0])));
        let app = app_with(api.clone()).await;

        let response = call_service(&app, TestRequest::get().uri("/poll/p1").to_request()).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let ballot = location(&response);
        assert!(ballot.starts_with("/poll/p1/ballot/"));
        assert!(get_page(&app, &ballot).await.contains("Tea or coffee?"));

        post_form(&app, &ballot, &[("action", "submit")]).await;
        assert!(api.submitted.lock().unwrap().is_empty());
        assert!(get_page(&app, &ballot)
            .await
            .contains("Please select an option for each question."));

        *api.poll.lock().unwrap() = Some(record(&[3, 7]));
        post_form(&app, &ballot, &[("action", "submit"), ("question_0", "1")]).await;
        let submitted = api.submitted.lock().unwrap().clone();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].selected_options, vec![1]);
        assert_eq!(api.fetches.lock().unwrap().len(), 2);

        post_form(&app, &ballot, &[("action", "view_results")]).await;
        let page = get_page(&app, &ballot).await;
        assert!(page.contains("30.00%"));
        assert!(page.contains("70.00%"));

        post_form(&app, &ballot, &[("action", "submit"), ("question_0", "0")]).await;
        assert_eq!(api.submitted.lock().unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn missing_poll_is_reported() {
        let api = Arc::new(RecordingPollApi::default());
        let app = app_with(api).await;
        let response = call_service(&app, TestRequest::get().uri("/poll/nope").to_request()).await;
        let ballot = location(&response);
        assert!(get_page(&app, &ballot)
            .await
            .contains("This poll could not be loaded"));
    }

    #[actix_rt::test]
    async fn short_link_redirects_and_unknown_sessions_404() {
        let app = app_with(Arc::new(RecordingPollApi::default())).await;
        let response = call_service(&app, TestRequest::get().uri("/abc123").to_request()).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/poll/abc123");

        let uri = format!("/create/{}", Uuid::new_v4());
        let response = call_service(&app, TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = call_service(
            &app,
            TestRequest::post()
                .uri(&uri)
                .set_form([("action", "explode")])
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn favicon_is_not_a_short_link() {
        let api = Arc::new(RecordingPollApi::default());
        let app = app_with(api.clone()).await;
        let response =
            call_service(&app, TestRequest::get().uri("/favicon.ico").to_request()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(api.fetches.lock().unwrap().is_empty());
    }
}
