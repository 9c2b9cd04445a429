use axum::{
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures_util::stream::{self, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;

use super::api::mounted;
use crate::AppState;
use crate::models::views::{DetailState, StackView, ViewSnapshot};

fn view_event(snapshot: &ViewSnapshot) -> Event {
    match Event::default()
        .event("view")
        .id(snapshot.revision.to_string())
        .json_data(snapshot)
    {
        Ok(event) => event,
        Err(e) => {
            tracing::error!("encoding view snapshot: {}", e);
            Event::default().comment("encode error")
        }
    }
}

/// The part of a snapshot the dashboard cards show. The backend recomputes
/// `uptime` on every detail call and the cards don't display it.
fn card_key(snapshot: &ViewSnapshot) -> Vec<StackView> {
    snapshot
        .stacks
        .iter()
        .map(|view| {
            let mut view = view.clone();
            if let DetailState::Ready(detail) = &mut view.detail {
                detail.uptime.clear();
            }
            view
        })
        .collect()
}

/// Turns each snapshot into its `view` event, followed by a `cards` event
/// when the visible cards differ from the previous snapshot's.
fn snapshot_events() -> impl FnMut(ViewSnapshot) -> Vec<Event> {
    let mut shown: Option<Vec<StackView>> = None;
    move |snapshot| {
        let mut events = vec![view_event(&snapshot)];
        let key = card_key(&snapshot);
        if shown.as_ref().is_some_and(|prev| *prev != key) {
            events.push(
                Event::default()
                    .event("cards")
                    .id(snapshot.revision.to_string())
                    .data(snapshot.revision.to_string()),
            );
        }
        shown = Some(key);
        events
    }
}

/// SSE endpoint that streams every published view snapshot to the browser.
/// The current snapshot is sent first; the stream ends when the dashboard is
/// unmounted.
pub async fn handle_view_events(State(state): State<AppState>) -> Response {
    let rx = match mounted(&state) {
        Ok(dashboard) => dashboard.reconciler().subscribe(),
        Err(resp) => return resp,
    };

    let stream = WatchStream::new(rx)
        .map(snapshot_events())
        .flat_map(stream::iter)
        .map(Ok::<_, Infallible>);

    Sse::new(stream)
        .keep_alive(KeepAlive::default().interval(Duration::from_secs(15)))
        .into_response()
}
