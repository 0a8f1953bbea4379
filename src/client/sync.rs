use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::models::{CartItem, CartResponse, UpdateCartItem};

use super::store::SyncOp;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("request failed: {0}")]
    Http(#[from] Box<ureq::Error>),

    #[error("invalid response body: {0}")]
    Body(#[from] std::io::Error),
}

impl From<ureq::Error> for SyncError {
    fn from(err: ureq::Error) -> Self {
        SyncError::Http(Box::new(err))
    }
}

/// Mirrors local cart mutations to the server, one call per op.
/// At-most-once: failures are logged and dropped, never retried, and the
/// local store is never rolled back.
pub struct SyncClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl SyncClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(10))
                .build(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Drains the outbox until the store side hangs up.
    pub fn run(&self, ops: Receiver<SyncOp>) {
        for op in ops {
            if let Err(e) = self.apply(&op) {
                warn!("cart sync failed, local state stands: {e}");
            }
        }
    }

    pub fn spawn(self, ops: Receiver<SyncOp>) -> JoinHandle<()> {
        thread::spawn(move || self.run(ops))
    }

    /// Fetches the server cart for a full reload; the caller feeds the
    /// result into `CartStore::load_from_server`.
    pub fn fetch_cart(&self) -> Result<Vec<CartItem>, SyncError> {
        let response: CartResponse = self
            .agent
            .get(&format!("{}/cart", self.base_url))
            .set("Authorization", &self.bearer())
            .call()?
            .into_json()?;

        Ok(response.items)
    }

    fn apply(&self, op: &SyncOp) -> Result<(), SyncError> {
        match op {
            SyncOp::Add(item) => {
                self.agent
                    .post(&format!("{}/cart", self.base_url))
                    .set("Authorization", &self.bearer())
                    .send_json(item)?;
            }
            SyncOp::SetQuantity {
                product_slug,
                quantity,
            } => {
                self.agent
                    .put(&format!("{}/cart", self.base_url))
                    .set("Authorization", &self.bearer())
                    .send_json(UpdateCartItem {
                        product_slug: product_slug.clone(),
                        quantity: *quantity,
                    })?;
            }
            SyncOp::Remove { product_slug } => {
                self.agent
                    .delete(&format!("{}/cart", self.base_url))
                    .set("Authorization", &self.bearer())
                    .query("product_slug", product_slug)
                    .call()?;
            }
            SyncOp::Clear => {
                self.agent
                    .delete(&format!("{}/cart", self.base_url))
                    .set("Authorization", &self.bearer())
                    .call()?;
            }
        }

        Ok(())
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
