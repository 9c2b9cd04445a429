use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::AppState;
use crate::dashboard::Dashboard;
use crate::helpers::created_age;
use crate::models::stack::endpoint_ready;
use crate::models::views::{LinkView, StackCard, StackView};

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    title: String,
    logged_in: bool,
    poll_secs: u64,
    stacks: Vec<StackCard>,
}

fn render_template(tmpl: &impl Template) -> Response {
    match tmpl.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

// --- View Builders ---

fn status_class(cfstatus: &str) -> &'static str {
    if cfstatus.contains("FAILED") || cfstatus.contains("ROLLBACK") {
        "badge-error"
    } else if cfstatus.contains("IN_PROGRESS") {
        "badge-warning"
    } else if cfstatus.ends_with("COMPLETE") {
        "badge-success"
    } else {
        "badge-info"
    }
}

fn link(label: &str, value: &str) -> LinkView {
    LinkView {
        label: label.to_string(),
        value: value.to_string(),
        is_link: endpoint_ready(value),
    }
}

fn build_stack_card(view: &StackView, cert_url: String) -> StackCard {
    let mut card = StackCard {
        name: view.name.clone(),
        account: view.account.clone(),
        pending: true,
        deleting: view.deletion_in_flight,
        delete_error: view.delete_error.clone().unwrap_or_default(),
        cert_url,
        status_class: "badge-info".to_string(),
        ..Default::default()
    };

    if let Some(d) = view.detail.ready() {
        card.pending = false;
        card.created = d.created.clone();
        card.age = created_age(&d.created);
        card.address = d.address.clone();
        card.cfstatus = d.cfstatus.clone();
        card.status_class = status_class(&d.cfstatus).to_string();
        card.links = vec![
            link("Kotsadm", &d.kotsadm),
            link("Login", &d.login),
            link("API", &d.api),
            link("CA", &d.ca),
        ];
    }

    card
}

fn build_cards(dashboard: &Dashboard) -> Vec<StackCard> {
    dashboard
        .reconciler()
        .snapshot()
        .stacks
        .iter()
        .map(|view| {
            let cert_url = dashboard.certificate_url(&view.name).unwrap_or_default();
            build_stack_card(view, cert_url)
        })
        .collect()
}

// --- Dashboard ---

pub async fn handle_dashboard(State(state): State<AppState>) -> Response {
    let dashboard = state.host.current();

    let tmpl = DashboardTemplate {
        title: "Stack Instances".to_string(),
        logged_in: dashboard.is_some(),
        poll_secs: state.config.poll_interval_secs,
        stacks: dashboard.as_deref().map(build_cards).unwrap_or_default(),
    };

    render_template(&tmpl)
}
