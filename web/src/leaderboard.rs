use chrono::DateTime;
use gloo::net::http::{Request, Response};
use twofold_protocol::{
    ApiFailure, ErrorBody, LEADERBOARD_PATH, LeaderboardEntry, SCORE_PATH, ScoreSubmission,
    SubmitResponse,
};
use yew::prelude::*;

fn network_failure(err: gloo::net::Error) -> ApiFailure {
    log::warn!("leaderboard request failed: {}", err);
    ApiFailure::Failed(err.to_string())
}

async fn failure_from(response: Response) -> ApiFailure {
    let status = response.status();
    let body = response.json::<ErrorBody>().await.ok();
    let failure = ApiFailure::from_status(status, body);
    log::warn!("leaderboard answered {}: {}", status, failure);
    failure
}

pub(crate) async fn fetch_leaderboard(api_base: &str) -> Result<Vec<LeaderboardEntry>, ApiFailure> {
    let url = format!("{api_base}{LEADERBOARD_PATH}");
    let response = Request::get(&url).send().await.map_err(network_failure)?;
    if !response.ok() {
        return Err(failure_from(response).await);
    }
    response.json().await.map_err(network_failure)
}

pub(crate) async fn submit_score(
    api_base: &str,
    submission: &ScoreSubmission,
) -> Result<(), ApiFailure> {
    let url = format!("{api_base}{SCORE_PATH}");
    let response = Request::post(&url)
        .json(submission)
        .map_err(network_failure)?
        .send()
        .await
        .map_err(network_failure)?;
    if !response.ok() {
        return Err(failure_from(response).await);
    }

    let body: SubmitResponse = response.json().await.map_err(network_failure)?;
    if body.success {
        Ok(())
    } else {
        Err(ApiFailure::Failed("score was not recorded".to_string()))
    }
}

/// Calendar date of an RFC 3339 timestamp, or the raw text when it does not parse.
pub(crate) fn display_date(created_at: &str) -> String {
    DateTime::parse_from_rfc3339(created_at)
        .map(|time| time.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| created_at.to_string())
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum LeaderboardState {
    Loading,
    Loaded(Vec<LeaderboardEntry>),
    Failed(ApiFailure),
}

#[derive(Properties, PartialEq)]
pub(crate) struct LeaderboardProps {
    pub state: LeaderboardState,
    pub on_retry: Callback<()>,
}

#[function_component]
pub(crate) fn LeaderboardView(props: &LeaderboardProps) -> Html {
    let body = match &props.state {
        LeaderboardState::Loading => html! { <p class="muted">{"Loading…"}</p> },
        LeaderboardState::Loaded(entries) if entries.is_empty() => {
            html! { <p class="muted">{"No scores yet"}</p> }
        }
        LeaderboardState::Loaded(entries) => html! {
            <ol>
                {
                    for entries.iter().map(|entry| html! {
                        <li>
                            <span class="name">{&entry.player_name}</span>
                            <span class="score">{entry.score}</span>
                            <time datetime={entry.created_at.clone()}>{display_date(&entry.created_at)}</time>
                        </li>
                    })
                }
            </ol>
        },
        LeaderboardState::Failed(failure) => {
            let onclick = props.on_retry.reform(|_: MouseEvent| ());
            html! {
                <p class="error">
                    {failure.to_string()}
                    if failure.is_retryable() {
                        <button {onclick}>{"Retry"}</button>
                    }
                </p>
            }
        }
    };

    html! {
        <section class="leaderboard">
            <h2>{"Leaderboard"}</h2>
            {body}
        </section>
    }
}
