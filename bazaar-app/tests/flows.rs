use std::sync::Arc;

use async_trait::async_trait;
use bazaar_app::{navigator, with_defaults, BazaarState, OfferView, View};
use bazaar_core::{
    load_session, BazaarConfig, DocumentStore, ErrorKind, IdentityProvider, MemoryDocumentStore,
    MemoryKeyValueStore, Navigator, Outcome, Session,
};
use bazaar_auth_local::{LocalIdentityOptions, LocalIdentityProvider};
use parking_lot::Mutex;
use proptest::prelude::*;

/// Counts sign-ups before handing them to the real provider.
struct CountingIdentity {
    inner: LocalIdentityProvider,
    sign_ups: Mutex<usize>,
}

#[async_trait]
impl IdentityProvider for CountingIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> anyhow::Result<Session> {
        *self.sign_ups.lock() += 1;
        self.inner.sign_up(email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<Session> {
        self.inner.sign_in(email, password).await
    }

    async fn sign_out(&self, session: Option<&Session>) -> anyhow::Result<()> {
        self.inner.sign_out(session).await
    }
}

struct Market {
    config: BazaarConfig,
    state: BazaarState,
    store: Arc<MemoryDocumentStore>,
    identity: Arc<CountingIdentity>,
}

impl Market {
    fn new(policy: &str) -> Self {
        let mut config = BazaarConfig::new();
        config.set("app.failure_policy", policy);
        let config = with_defaults(config);

        let store = Arc::new(MemoryDocumentStore::new());
        let identity = Arc::new(CountingIdentity {
            inner: LocalIdentityProvider::new().with_options(LocalIdentityOptions {
                hash_cost: 4,
                ..Default::default()
            }),
            sign_ups: Mutex::new(0),
        });
        let state = BazaarState::new(
            store.clone(),
            identity.clone(),
            Arc::new(bazaar_app::AskamaRenderer::new()),
            3,
        );

        Self {
            config,
            state,
            store,
            identity,
        }
    }

    fn browser(&self) -> Navigator<BazaarState, View> {
        navigator(
            &self.config,
            self.state.clone(),
            Arc::new(MemoryKeyValueStore::new()),
        )
        .unwrap()
    }

    /// Register and sign in on `browser`, returning the session.
    async fn sign_up(&self, browser: &Navigator<BazaarState, View>, email: &str) -> Session {
        browser
            .submit(
                "/register",
                [("email", email), ("password", "123456"), ("repeatPassword", "123456")],
            )
            .await
            .unwrap();
        browser
            .submit("/login", [("email", email), ("password", "123456")])
            .await
            .unwrap();
        load_session(browser.storage().as_ref()).unwrap()
    }

    async fn create_offer(&self, browser: &Navigator<BazaarState, View>) -> String {
        browser
            .submit(
                "/create-offer",
                [
                    ("name", "Mountain bike"),
                    ("price", "250"),
                    ("imageUrl", "https://img.example/bike.png"),
                    ("description", "Barely used"),
                    ("brand", "Cube"),
                ],
            )
            .await
            .unwrap();

        let docs = self.store.list("offers").await.unwrap();
        docs.last().unwrap().id.clone()
    }
}

fn details_offer(browser: &Navigator<BazaarState, View>) -> OfferView {
    match browser.view() {
        Some(View::Details(ctx)) => ctx.offer.unwrap(),
        other => panic!("expected details view, got {other:?}"),
    }
}

#[tokio::test]
async fn app_starts_on_the_guest_home() {
    let market = Market::new("log-only");
    let browser = market.browser();

    let outcome = browser.run("/home").await.unwrap();
    assert_eq!(outcome, Outcome::Rendered("/home".into()));
    match browser.view() {
        Some(View::HomeGuest(ctx)) => {
            assert!(!ctx.is_logged_in);
            assert!(ctx.has_partial("header"));
        }
        other => panic!("expected guest home, got {other:?}"),
    }
}

#[tokio::test]
async fn register_then_login_persists_the_session() {
    let market = Market::new("log-only");
    let browser = market.browser();

    let outcome = browser
        .submit(
            "/register",
            [("email", "peter@abv.bg"), ("password", "123456"), ("repeatPassword", "123456")],
        )
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Rendered("/login".into()));
    assert!(load_session(browser.storage().as_ref()).is_none());

    let outcome = browser
        .submit("/login", [("email", "peter@abv.bg"), ("password", "123456")])
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Rendered("/home".into()));

    let session = load_session(browser.storage().as_ref()).unwrap();
    assert_eq!(session.email, "peter@abv.bg");
    match browser.view() {
        Some(View::HomeUser(ctx)) => assert_eq!(ctx.user_email, "peter@abv.bg"),
        other => panic!("expected user home, got {other:?}"),
    }
}

#[tokio::test]
async fn login_keeps_the_address_as_typed() {
    let market = Market::new("surface");
    let browser = market.browser();

    let session = market.sign_up(&browser, "Peter@Abv.BG").await;
    assert_eq!(session.email, "Peter@Abv.BG");
    match browser.view() {
        Some(View::HomeUser(ctx)) => assert_eq!(ctx.user_email, "Peter@Abv.BG"),
        other => panic!("expected user home, got {other:?}"),
    }
}

async fn register_and_login(email: &str, password: &str) -> Option<Session> {
    let market = Market::new("surface");
    let browser = market.browser();

    browser
        .submit(
            "/register",
            [("email", email), ("password", password), ("repeatPassword", password)],
        )
        .await
        .ok()?;
    browser
        .submit("/login", [("email", email), ("password", password)])
        .await
        .ok()?;
    load_session(browser.storage().as_ref())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn any_valid_account_logs_in_with_its_own_email(
        email in "[A-Za-z][A-Za-z0-9._]{0,11}@[A-Za-z]{1,10}\\.[A-Za-z]{2,4}",
        password in "[A-Za-z0-9!#%]{6,20}",
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let session = rt.block_on(register_and_login(&email, &password));

        prop_assert!(session.is_some(), "no session for {}", email);
        prop_assert_eq!(session.unwrap().email, email);
    }
}

#[tokio::test]
async fn password_mismatch_creates_nothing_and_stays_put() {
    let market = Market::new("log-only");
    let browser = market.browser();
    browser.navigate("/register").await.unwrap();

    let outcome = browser
        .submit(
            "/register",
            [("email", "peter@abv.bg"), ("password", "123456"), ("repeatPassword", "654321")],
        )
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Halted);
    assert_eq!(*market.identity.sign_ups.lock(), 0);
    assert_eq!(browser.location().as_deref(), Some("/register"));
    assert!(matches!(browser.view(), Some(View::Register(_))));
}

#[tokio::test]
async fn surface_policy_reports_the_mismatch() {
    let market = Market::new("surface");
    let browser = market.browser();

    let err = browser
        .submit(
            "/register",
            [("email", "peter@abv.bg"), ("password", "123456"), ("repeatPassword", "nope")],
        )
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::of(&err), ErrorKind::Unprocessable);
    assert_eq!(*market.identity.sign_ups.lock(), 0);
}

#[tokio::test]
async fn failed_login_is_silent_under_log_only() {
    let market = Market::new("log-only");
    let browser = market.browser();
    browser.navigate("/login").await.unwrap();

    let outcome = browser
        .submit("/login", [("email", "ghost@abv.bg"), ("password", "123456")])
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Halted);
    assert!(load_session(browser.storage().as_ref()).is_none());
    assert!(matches!(browser.view(), Some(View::Login(_))));
}

#[tokio::test]
async fn creator_is_the_salesman() {
    let market = Market::new("log-only");
    let browser = market.browser();
    let me = market.sign_up(&browser, "seller@abv.bg").await;

    let id = market.create_offer(&browser).await;
    assert_eq!(browser.location().as_deref(), Some("/home"));

    let stored = market.state.offers.get(&id).await.unwrap();
    assert_eq!(stored.salesman_id, me.user_id);
    assert!(stored.client_ids.is_empty());

    browser.navigate(&format!("/details/{id}")).await.unwrap();
    let offer = details_offer(&browser);
    assert!(offer.im_the_salesman);
    assert!(!offer.im_in_the_clients_list);
}

#[tokio::test]
async fn guests_cannot_create_offers() {
    let market = Market::new("surface");
    let browser = market.browser();

    let err = browser
        .submit("/create-offer", [("name", "Bike")])
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::of(&err), ErrorKind::NotAuthenticated);
    assert!(market.store.list("offers").await.unwrap().is_empty());
}

#[tokio::test]
async fn buying_joins_the_client_list_once() {
    let market = Market::new("log-only");
    let seller = market.browser();
    market.sign_up(&seller, "seller@abv.bg").await;
    let id = market.create_offer(&seller).await;

    let buyer = market.browser();
    let me = market.sign_up(&buyer, "buyer@abv.bg").await;

    let outcome = buyer.navigate(&format!("/buy/{id}")).await.unwrap();
    assert_eq!(outcome, Outcome::Rendered(format!("/details/{id}")));
    let offer = details_offer(&buyer);
    assert!(offer.im_in_the_clients_list);
    assert!(!offer.im_the_salesman);

    buyer.navigate(&format!("/buy/{id}")).await.unwrap();
    let stored = market.state.offers.get(&id).await.unwrap();
    assert_eq!(stored.client_ids, vec![me.user_id]);
}

#[tokio::test]
async fn concurrent_buys_keep_every_buyer() {
    let market = Market::new("log-only");
    let seller = market.browser();
    market.sign_up(&seller, "seller@abv.bg").await;
    let id = market.create_offer(&seller).await;

    let mut buyers = Vec::new();
    for n in 0..4 {
        let browser = market.browser();
        let session = market.sign_up(&browser, &format!("buyer{n}@abv.bg")).await;
        buyers.push((Arc::new(browser), session));
    }

    let tasks: Vec<_> = buyers
        .iter()
        .map(|(browser, _)| {
            let browser = Arc::clone(browser);
            let path = format!("/buy/{id}");
            tokio::spawn(async move { browser.navigate(&path).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stored = market.state.offers.get(&id).await.unwrap();
    assert_eq!(stored.client_ids.len(), 4);
    for (_, session) in &buyers {
        assert!(stored.has_client(&session.user_id));
    }
}

#[tokio::test]
async fn edit_only_touches_submitted_fields() {
    let market = Market::new("log-only");
    let browser = market.browser();
    let me = market.sign_up(&browser, "seller@abv.bg").await;
    let id = market.create_offer(&browser).await;

    let outcome = browser
        .submit(&format!("/edit/{id}"), [("price", "199")])
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Rendered(format!("/details/{id}")));

    let stored = market.state.offers.get(&id).await.unwrap();
    assert_eq!(stored.price, "199");
    assert_eq!(stored.name, "Mountain bike");
    assert_eq!(stored.brand, "Cube");
    assert_eq!(stored.description, "Barely used");
    assert_eq!(stored.image_url, "https://img.example/bike.png");
    assert_eq!(stored.salesman_id, me.user_id);
}

#[tokio::test]
async fn edit_page_is_prefilled() {
    let market = Market::new("log-only");
    let browser = market.browser();
    market.sign_up(&browser, "seller@abv.bg").await;
    let id = market.create_offer(&browser).await;

    browser.navigate(&format!("/edit/{id}")).await.unwrap();
    match browser.view() {
        Some(View::EditOffer(ctx)) => assert_eq!(ctx.offer.unwrap().brand, "Cube"),
        other => panic!("expected edit view, got {other:?}"),
    }
    assert!(browser.html().contains("value=\"Mountain bike\""));
}

#[tokio::test]
async fn deleted_offers_are_not_found() {
    let market = Market::new("surface");
    let browser = market.browser();
    market.sign_up(&browser, "seller@abv.bg").await;
    let id = market.create_offer(&browser).await;

    let outcome = browser.navigate(&format!("/delete/{id}")).await.unwrap();
    assert_eq!(outcome, Outcome::Rendered("/home".into()));

    let err = browser.navigate(&format!("/details/{id}")).await.unwrap_err();
    assert_eq!(ErrorKind::of(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn missing_offer_keeps_the_view_under_log_only() {
    let market = Market::new("log-only");
    let browser = market.browser();
    browser.run("/home").await.unwrap();

    let outcome = browser.navigate("/details/nope").await.unwrap();
    assert_eq!(outcome, Outcome::Halted);
    assert!(matches!(browser.view(), Some(View::HomeGuest(_))));
}

#[tokio::test]
async fn logout_returns_to_the_guest_home() {
    let market = Market::new("log-only");
    let browser = market.browser();
    let me = market.sign_up(&browser, "peter@abv.bg").await;

    let outcome = browser.navigate("/logout").await.unwrap();
    assert_eq!(outcome, Outcome::Rendered("/home".into()));
    assert!(load_session(browser.storage().as_ref()).is_none());
    assert!(!market.identity.inner.is_signed_in(&me.user_id).await);

    browser.run("/home").await.unwrap();
    match browser.view() {
        Some(View::HomeGuest(ctx)) => assert!(!ctx.is_logged_in),
        other => panic!("expected guest home, got {other:?}"),
    }
}

#[tokio::test]
async fn declared_edit_offer_route_renders_an_empty_form() {
    let market = Market::new("log-only");
    let browser = market.browser();

    browser.navigate("/edit-offer/abc").await.unwrap();
    match browser.view() {
        Some(View::EditOffer(ctx)) => {
            assert!(ctx.offer.is_none());
            assert_eq!(ctx.param("offerId"), "abc");
        }
        other => panic!("expected edit view, got {other:?}"),
    }
    assert!(browser.html().contains("action=\"/edit/abc\""));
}

#[tokio::test]
async fn unknown_locations_blank_the_view() {
    let market = Market::new("log-only");
    let browser = market.browser();
    browser.run("/home").await.unwrap();

    assert_eq!(
        browser.navigate("/nowhere").await.unwrap(),
        Outcome::Blank("/nowhere".into())
    );
    assert!(browser.view().is_none());
}
