pub mod offer;
pub mod offers_service;

pub use offer::{Offer, OfferForm, OfferView};
pub use offers_service::{OffersService, OFFERS};
