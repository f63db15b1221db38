//! Domain events and the fire-and-forget notification sink.
//!
//! Services emit events after their transaction commits; delivery is
//! best-effort and never aborts the operation that produced the event. The
//! consumer task logs every event and forwards the notification-worthy ones
//! to an optional email notifier.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SmtpConfig;
use crate::db::DbPool;
use crate::entities::user;

/// Events emitted by the write-side services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ProductCreated {
        product_id: Uuid,
        name: String,
    },
    ProductUpdated {
        product_id: Uuid,
        name: String,
        detail: Option<String>,
    },
    ProductDeleted {
        product_id: Uuid,
        name: String,
    },
    LowStock {
        product_id: Uuid,
        name: String,
        stock: i32,
        threshold: i32,
    },
    SaleCompleted {
        sale_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    PurchaseReceived {
        purchase_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    ProformaIssued {
        proforma_id: Uuid,
        invoice_number: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }
}

/// Outbound notification channel. Failures are the caller's to log and drop.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &Event) -> anyhow::Result<()>;
}

/// Email notifier delivering to every active ADMIN and KEEPER account.
pub struct EmailNotifier {
    db: Arc<DbPool>,
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailNotifier {
    pub fn new(db: Arc<DbPool>, smtp: &SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?
            .credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ))
            .build();
        let from: Mailbox = smtp.from.parse()?;
        Ok(Self {
            db,
            transport,
            from,
        })
    }

    async fn recipients(&self) -> anyhow::Result<Vec<Mailbox>> {
        let users = user::Entity::find()
            .filter(user::Column::Status.eq("ACTIVE"))
            .filter(
                sea_orm::Condition::any()
                    .add(user::Column::Role.eq("ADMIN"))
                    .add(user::Column::Role.eq("KEEPER")),
            )
            .all(self.db.as_ref())
            .await?;

        Ok(users
            .into_iter()
            .filter_map(|u| u.email.parse::<Mailbox>().ok())
            .collect())
    }

    fn render(event: &Event) -> Option<(String, String)> {
        match event {
            Event::ProductCreated { name, .. } => Some((
                format!("Product Created: {name}"),
                format!("<h2>Product Created</h2><p>Product: {name}</p>"),
            )),
            Event::ProductUpdated { name, detail, .. } => Some((
                format!("Product Updated: {name}"),
                format!(
                    "<h2>Product Updated</h2><p>Product: {name}</p>{}",
                    detail
                        .as_deref()
                        .map(|d| format!("<p>{d}</p>"))
                        .unwrap_or_default()
                ),
            )),
            Event::ProductDeleted { name, .. } => Some((
                format!("Product Deleted: {name}"),
                format!("<h2>Product Deleted</h2><p>Product: {name}</p>"),
            )),
            Event::LowStock {
                name,
                stock,
                threshold,
                ..
            } => {
                let status = if *stock == 0 { "Out of Stock" } else { "Low Stock" };
                Some((
                    format!("{status} Alert: {name}"),
                    format!(
                        "<h2>{status} Alert</h2><p>Product: {name}</p>\
                         <p>Current Stock: {stock}</p><p>Threshold: {threshold}</p>\
                         <p>Please update your inventory soon.</p>"
                    ),
                ))
            }
            // Transaction records are logged but not emailed.
            _ => None,
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, event: &Event) -> anyhow::Result<()> {
        let Some((subject, body)) = Self::render(event) else {
            return Ok(());
        };

        let recipients = self.recipients().await?;
        if recipients.is_empty() {
            return Ok(());
        }

        let mut builder = Message::builder().from(self.from.clone());
        for mbox in recipients {
            builder = builder.to(mbox);
        }
        let message = builder
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Consumes the event channel until every sender is dropped. Runs detached
/// from request handling; a failed delivery is logged and the loop moves on.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, notifier: Option<Arc<dyn Notifier>>) {
    while let Some(event) = rx.recv().await {
        info!(event = ?event, "processing event");

        if let Some(notifier) = &notifier {
            if let Err(err) = notifier.notify(&event).await {
                warn!(error = %err, "notification delivery failed");
            }
        }
    }
    info!("event channel closed, notification consumer stopping");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_events_are_not_emailed() {
        let event = Event::SaleCompleted {
            sale_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: 3,
        };
        assert!(EmailNotifier::render(&event).is_none());
    }

    #[test]
    fn low_stock_render_distinguishes_out_of_stock() {
        let (subject, _) = EmailNotifier::render(&Event::LowStock {
            product_id: Uuid::new_v4(),
            name: "Widget".into(),
            stock: 0,
            threshold: 5,
        })
        .unwrap();
        assert!(subject.starts_with("Out of Stock"));

        let (subject, body) = EmailNotifier::render(&Event::LowStock {
            product_id: Uuid::new_v4(),
            name: "Widget".into(),
            stock: 3,
            threshold: 5,
        })
        .unwrap();
        assert!(subject.starts_with("Low Stock"));
        assert!(body.contains("Current Stock: 3"));
    }

    #[tokio::test]
    async fn send_reports_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);
        drop(rx);

        let err = sender
            .send(Event::ProductDeleted {
                product_id: Uuid::new_v4(),
                name: "Widget".into(),
            })
            .await
            .unwrap_err();
        assert!(err.contains("Failed to send event"));
    }
}
