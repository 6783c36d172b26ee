use std::sync::Arc;

use anyhow::Result;
use bazaar_core::errors::BazaarError;
use bazaar_core::{update_document, Document, DocumentStore, Session};
use serde_json::Value;

use super::{Offer, OfferForm};

/// Collection holding every offer.
pub const OFFERS: &str = "offers";

/// Offer reads and writes against the document store.
///
/// `edit` and `buy` are compare-and-swap updates, so concurrent writers
/// never lose each other's changes.
#[derive(Clone)]
pub struct OffersService {
    store: Arc<dyn DocumentStore>,
    cas_retries: usize,
}

fn decode(doc: Document) -> Result<(String, Offer)> {
    let offer = serde_json::from_value::<Offer>(doc.data).map_err(|e| {
        BazaarError::general_error(format!("Malformed offer '{}': {e}", doc.id)).into_anyhow()
    })?;
    Ok((doc.id, offer))
}

fn as_object(data: &mut Value) -> Result<&mut serde_json::Map<String, Value>> {
    data.as_object_mut()
        .ok_or_else(|| BazaarError::general_error("Offer document is not an object").into_anyhow())
}

impl OffersService {
    pub fn new(store: Arc<dyn DocumentStore>, cas_retries: usize) -> Self {
        Self { store, cas_retries }
    }

    pub async fn list(&self) -> Result<Vec<(String, Offer)>> {
        self.store
            .list(OFFERS)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn get(&self, id: &str) -> Result<Offer> {
        let (_, offer) = decode(self.store.get(OFFERS, id).await?)?;
        Ok(offer)
    }

    /// Store a new offer owned by `salesman` with no clients yet.
    pub async fn create(&self, form: OfferForm, salesman: &Session) -> Result<String> {
        let offer = form.into_offer(salesman.user_id.clone());
        let id = self.store.insert(OFFERS, serde_json::to_value(&offer)?).await?;
        tracing::info!(offer = %id, salesman = %salesman.user_id, "offer created");
        Ok(id)
    }

    /// Overwrite only the submitted fields; everything else is kept.
    pub async fn edit(&self, id: &str, form: &OfferForm) -> Result<Offer> {
        let doc = update_document(self.store.as_ref(), OFFERS, id, self.cas_retries, |mut data| {
            let map = as_object(&mut data)?;
            for (key, value) in form.fields() {
                map.insert(key.to_string(), Value::String(value.to_string()));
            }
            Ok(data)
        })
        .await?;

        tracing::info!(offer = %id, version = doc.version, "offer edited");
        decode(doc).map(|(_, offer)| offer)
    }

    /// Add `buyer` to the client list unless already there.
    pub async fn buy(&self, id: &str, buyer: &Session) -> Result<Offer> {
        let uid = buyer.user_id.as_str();
        let doc = update_document(self.store.as_ref(), OFFERS, id, self.cas_retries, |mut data| {
            let map = as_object(&mut data)?;
            let clients = map
                .entry("clientIds")
                .or_insert_with(|| Value::Array(Vec::new()));

            let Some(clients) = clients.as_array_mut() else {
                return Err(BazaarError::general_error("Offer clientIds is not a list").into_anyhow());
            };
            if !clients.iter().any(|c| c.as_str() == Some(uid)) {
                clients.push(Value::String(uid.to_string()));
            }
            Ok(data)
        })
        .await?;

        tracing::info!(offer = %id, buyer = %uid, "offer bought");
        decode(doc).map(|(_, offer)| offer)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.store.delete(OFFERS, id).await?;
        tracing::info!(offer = %id, "offer deleted");
        Ok(())
    }
}
