// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live marketplace notifications over WebSocket.
//!
//! Vendors and admins keep a socket open on `/api/live` and receive a small
//! JSON event whenever a lead or ticket changes. Events carry identifiers
//! only; clients fetch the record over HTTP to see the details they are
//! allowed to see. Nothing is accepted from the client side of the socket.

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use leadhub_api::{LeadInfo, TicketInfo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Slow clients lose events older than this many messages.
const EVENT_BUFFER_SIZE: usize = 100;

/// A change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// A lead arrived from the public form or an import.
    LeadSubmitted {
        /// The new lead.
        lead_id: i64,
    },
    /// A lead is now open to every vendor serving its category.
    LeadPublished {
        /// The lead.
        lead_id: i64,
        /// Its service category.
        category: String,
    },
    /// A lead was reserved for specific vendors.
    LeadAssigned {
        /// The lead.
        lead_id: i64,
        /// The vendors who may take it.
        vendor_ids: Vec<i64>,
    },
    /// A vendor won a lead.
    LeadTaken {
        /// The lead.
        lead_id: i64,
        /// The new owner.
        vendor_id: i64,
    },
    /// Any other lead status change.
    LeadStatusChanged {
        /// The lead.
        lead_id: i64,
        /// The new status.
        status: String,
    },
    /// A vendor opened a support ticket.
    TicketOpened {
        /// The ticket.
        ticket_id: i64,
        /// The vendor who opened it.
        vendor_id: i64,
    },
    /// Someone added a message to a ticket.
    TicketReplied {
        /// The ticket.
        ticket_id: i64,
        /// The ticket status after the reply.
        status: String,
    },
    /// A ticket was assigned, closed or otherwise moved.
    TicketStatusChanged {
        /// The ticket.
        ticket_id: i64,
        /// The new status.
        status: String,
    },
    /// First message on every connection.
    Connected {
        /// Server time (RFC 3339).
        timestamp: String,
    },
}

impl LiveEvent {
    /// Picks the most specific event for a lead after a transition.
    #[must_use]
    pub fn for_lead(lead: &LeadInfo) -> Self {
        match (lead.status.as_str(), lead.taken_by) {
            ("taken", Some(vendor_id)) => Self::LeadTaken {
                lead_id: lead.lead_id,
                vendor_id,
            },
            ("available", _) => Self::LeadPublished {
                lead_id: lead.lead_id,
                category: lead.category.clone(),
            },
            ("assigned", _) => Self::LeadAssigned {
                lead_id: lead.lead_id,
                vendor_ids: lead.assigned_vendor_ids.clone(),
            },
            _ => Self::LeadStatusChanged {
                lead_id: lead.lead_id,
                status: lead.status.clone(),
            },
        }
    }

    /// Status change notification for a ticket.
    #[must_use]
    pub fn ticket_status(ticket: &TicketInfo) -> Self {
        Self::TicketStatusChanged {
            ticket_id: ticket.ticket_id,
            status: ticket.status.clone(),
        }
    }
}

/// Fan-out of live events to every connected socket.
#[derive(Clone)]
pub struct LiveEventBroadcaster {
    tx: broadcast::Sender<LiveEvent>,
}

impl LiveEventBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Sends an event to all current subscribers. Never blocks; with no
    /// subscribers the event is dropped.
    pub fn broadcast(&self, event: &LiveEvent) {
        match self.tx.send(event.clone()) {
            Ok(count) => {
                debug!(?event, receivers = count, "Broadcast live event");
            }
            Err(_) => {
                debug!(?event, "No receivers for live event");
            }
        }
    }

    /// Events published before this call are not delivered.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }
}

impl Default for LiveEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Upgrades `/api/live` to a WebSocket and streams events until the client
/// goes away.
pub async fn live_events_handler(
    ws: WebSocketUpgrade,
    AxumState(broadcaster): AxumState<Arc<LiveEventBroadcaster>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: Arc<LiveEventBroadcaster>) {
    info!("Client connected to live event stream");

    let (mut sender, mut receiver) = socket.split();
    let mut rx: broadcast::Receiver<LiveEvent> = broadcaster.subscribe();

    let connected_event = LiveEvent::Connected {
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| String::from("unknown")),
    };

    if let Ok(json) = serde_json::to_string(&connected_event)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!("Failed to send connection confirmation");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(?e, "Failed to serialize live event");
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live client fell behind; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Ignoring message from live client");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!("Client disconnected from live event stream");
}
