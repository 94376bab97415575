use twofold_protocol::{LEADERBOARD_PATH, SCORE_PATH, ScoreSubmission, SubmitResponse};
use worker::*;

mod db;
mod error;

use db::Leaderboard;
use error::LeaderboardError;

fn cors() -> Cors {
    Cors::new()
        .with_origins(vec!["*"])
        .with_methods(vec![Method::Get, Method::Post, Method::Options])
        .with_allowed_headers(vec!["Content-Type"])
}

#[event(start)]
fn start() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        console_error!("Error initializing logger: {}", err);
    }
}

#[event(fetch)]
async fn fetch(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    log::debug!("{:?} {}", req.method(), req.path());
    Router::new()
        .get_async(LEADERBOARD_PATH, get_leaderboard)
        .post_async(SCORE_PATH, post_score)
        .options(LEADERBOARD_PATH, preflight)
        .options(SCORE_PATH, preflight)
        .run(req, env)
        .await
}

fn preflight(_req: Request, _ctx: RouteContext<()>) -> Result<Response> {
    Response::empty()?.with_cors(&cors())
}

async fn get_leaderboard(_req: Request, ctx: RouteContext<()>) -> Result<Response> {
    let entries = match Leaderboard::open(&ctx.env).await {
        Ok(leaderboard) => leaderboard.top().await,
        Err(err) => Err(err),
    };
    match entries {
        Ok(entries) => Response::from_json(&entries)?.with_cors(&cors()),
        Err(err) => err.into_response("Failed to fetch leaderboard", &cors()),
    }
}

async fn post_score(mut req: Request, ctx: RouteContext<()>) -> Result<Response> {
    let body = req.text().await?;
    let outcome = match ScoreSubmission::parse(&body) {
        Ok(submission) => match Leaderboard::open(&ctx.env).await {
            Ok(leaderboard) => leaderboard.insert(submission).await,
            Err(err) => Err(err),
        },
        Err(err) => Err(LeaderboardError::from(err)),
    };
    match outcome {
        Ok(()) => Response::from_json(&SubmitResponse { success: true })?.with_cors(&cors()),
        Err(err) => err.into_response("Failed to submit score", &cors()),
    }
}
