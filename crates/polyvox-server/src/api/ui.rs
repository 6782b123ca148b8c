//! The browser front-end.

use axum::{extract::State, response::Html};

use crate::state::{AppState, UiVariant};

const SIMPLE_PAGE: &str = include_str!("../../ui/simple.html");
const ADVANCED_PAGE: &str = include_str!("../../ui/advanced.html");

pub async fn index(State(state): State<AppState>) -> Html<&'static str> {
    match state.ui {
        UiVariant::Simple => Html(SIMPLE_PAGE),
        UiVariant::Advanced => Html(ADVANCED_PAGE),
    }
}
