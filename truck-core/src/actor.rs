//! Actor-based concurrency for the register
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One logical writer task eliminates read-modify-write races
//! - Each message runs to completion, so a purchase observes every
//!   previously committed purchase (serializable, no interleaving)
//! - Async message passing with backpressure (bounded mailbox)
//!
//! Queries never enter the mailbox; they read committed state directly
//! through [`crate::QueryService`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 HTTP gateway (axum)                   │
//! │              Multiple concurrent requests             │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ purchase / create / provision
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              RegisterHandle (Clone)                   │
//! │          Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │             RegisterActor (Single Task)               │
//! │     resolve → validate → guard → commit_sale()        │
//! │          (atomic WriteBatch to RocksDB)               │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::register::execute_purchase;
use crate::types::{Account, Item, PurchaseRequest, Receipt, Truck};
use crate::{Error, Result, Storage};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the register actor
pub enum RegisterMessage {
    /// Process a purchase
    Purchase {
        /// The purchase request
        request: PurchaseRequest,
        /// Reply channel
        response: oneshot::Sender<Result<Receipt>>,
    },

    /// Create a catalog item
    CreateItem {
        /// The item to store
        item: Item,
        /// Reply channel
        response: oneshot::Sender<Result<Item>>,
    },

    /// Create a customer account
    CreateAccount {
        /// The account to store
        account: Account,
        /// Reply channel
        response: oneshot::Sender<Result<Account>>,
    },

    /// Create a truck
    CreateTruck {
        /// The truck to store
        truck: Truck,
        /// Reply channel
        response: oneshot::Sender<Result<Truck>>,
    },

    /// Provision the default truck and catalog
    Provision {
        /// The truck to store
        truck: Truck,
        /// Its catalog items
        items: Vec<Item>,
        /// Reply channel
        response: oneshot::Sender<Result<Truck>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes register messages
pub struct RegisterActor {
    /// Storage backend
    storage: Arc<Storage>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<RegisterMessage>,

    /// Timestamp of the last committed sale, for the monotonic clamp
    last_commit_at: DateTime<Utc>,
}

impl RegisterActor {
    /// Create new actor
    pub fn new(storage: Arc<Storage>, mailbox: mpsc::Receiver<RegisterMessage>) -> Self {
        Self {
            storage,
            mailbox,
            last_commit_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                RegisterMessage::Shutdown => break,
                msg => self.handle_message(msg),
            }
        }

        tracing::debug!("Register actor stopped");
    }

    /// Handle a single message to completion
    fn handle_message(&mut self, msg: RegisterMessage) {
        match msg {
            RegisterMessage::Purchase { request, response } => {
                let now = self.commit_timestamp();
                let result = execute_purchase(&self.storage, &request, now);
                let _ = response.send(result);
            }

            RegisterMessage::CreateItem { item, response } => {
                let result = item
                    .validate()
                    .and_then(|_| self.storage.create_item(&item))
                    .map(|_| item);
                let _ = response.send(result);
            }

            RegisterMessage::CreateAccount { account, response } => {
                let result = account
                    .validate()
                    .and_then(|_| self.storage.create_account(&account))
                    .map(|_| account);
                let _ = response.send(result);
            }

            RegisterMessage::CreateTruck { truck, response } => {
                let result = self.storage.create_truck(&truck).map(|_| truck);
                let _ = response.send(result);
            }

            RegisterMessage::Provision {
                truck,
                items,
                response,
            } => {
                let result = items
                    .iter()
                    .try_for_each(Item::validate)
                    .and_then(|_| self.storage.provision(&truck, &items))
                    .map(|_| truck);
                let _ = response.send(result);
            }

            RegisterMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    /// Next commit timestamp: wall clock, clamped non-decreasing
    ///
    /// The clock can step backwards (NTP); record order must not.
    fn commit_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = if now > self.last_commit_at {
            now
        } else {
            self.last_commit_at
        };
        self.last_commit_at = ts;
        ts
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct RegisterHandle {
    sender: mpsc::Sender<RegisterMessage>,
}

impl RegisterHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<RegisterMessage>) -> Self {
        Self { sender }
    }

    /// Process a purchase
    pub async fn purchase(&self, request: PurchaseRequest) -> Result<Receipt> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegisterMessage::Purchase {
                request,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Create a catalog item
    pub async fn create_item(&self, item: Item) -> Result<Item> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegisterMessage::CreateItem { item, response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Create a customer account
    pub async fn create_account(&self, account: Account) -> Result<Account> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegisterMessage::CreateAccount {
                account,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Create a truck
    pub async fn create_truck(&self, truck: Truck) -> Result<Truck> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegisterMessage::CreateTruck {
                truck,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Provision the default truck and catalog
    pub async fn provision(&self, truck: Truck, items: Vec<Item>) -> Result<Truck> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegisterMessage::Provision {
                truck,
                items,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(RegisterMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the register actor
pub fn spawn_register_actor(storage: Arc<Storage>, mailbox_capacity: usize) -> RegisterHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = RegisterActor::new(storage, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    RegisterHandle::new(tx)
}
