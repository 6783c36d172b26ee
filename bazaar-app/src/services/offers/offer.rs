use bazaar_core::Request;
use serde::{Deserialize, Serialize};

/// An offer as stored in the `offers` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    /// Creator's user id; never changes after creation.
    pub salesman_id: String,
    /// Buyers in the order they joined.
    #[serde(default)]
    pub client_ids: Vec<String>,
}

impl Offer {
    pub fn has_client(&self, user_id: &str) -> bool {
        self.client_ids.iter().any(|id| id == user_id)
    }
}

/// The editable offer fields as submitted; absent fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferForm {
    pub name: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
}

impl OfferForm {
    pub fn from_request(req: &Request) -> Self {
        let field = |name: &str| req.field(name).map(|v| v.to_string());
        Self {
            name: field("name"),
            price: field("price"),
            image_url: field("imageUrl"),
            description: field("description"),
            brand: field("brand"),
        }
    }

    /// Submitted fields keyed by their stored (camelCase) names.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("name", &self.name),
            ("price", &self.price),
            ("imageUrl", &self.image_url),
            ("description", &self.description),
            ("brand", &self.brand),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }

    pub fn into_offer(self, salesman_id: impl Into<String>) -> Offer {
        Offer {
            name: self.name.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            image_url: self.image_url.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            brand: self.brand.unwrap_or_default(),
            salesman_id: salesman_id.into(),
            client_ids: Vec::new(),
        }
    }
}

/// An offer prepared for display to one viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image_url: String,
    pub description: String,
    pub brand: String,
    pub salesman_id: String,
    pub client_ids: Vec<String>,
    pub im_the_salesman: bool,
    pub im_in_the_clients_list: bool,
}

impl OfferView {
    /// `viewer` is the signed-in user's id; guests see both flags off.
    pub fn new(id: impl Into<String>, offer: Offer, viewer: Option<&str>) -> Self {
        let im_the_salesman = viewer.is_some_and(|uid| offer.salesman_id == uid);
        let im_in_the_clients_list = viewer.is_some_and(|uid| offer.has_client(uid));

        Self {
            id: id.into(),
            name: offer.name,
            price: offer.price,
            image_url: offer.image_url,
            description: offer.description,
            brand: offer.brand,
            salesman_id: offer.salesman_id,
            client_ids: offer.client_ids,
            im_the_salesman,
            im_in_the_clients_list,
        }
    }
}
