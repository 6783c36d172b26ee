pub mod offers;
pub mod types;

pub use offers::{Offer, OfferForm, OfferView, OffersService, OFFERS};
pub use types::BazaarState;
