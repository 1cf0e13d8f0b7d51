use std::sync::Arc;

use chrono::Utc;

use crate::catalog::CatalogGateway;
use crate::commerce::CommerceService;
use crate::dialogue::{normalize, render, InboundMessage, Reply};
use crate::domain::product::{Product, ProductId};
use crate::domain::reservation::PresaleProductId;
use crate::errors::{CommerceError, DomainError, StoreError};
use crate::session::{Session, SessionStep};

/// Inputs that force the conversation back to the menu from any state.
const MENU_TRIGGERS: &[&str] = &["hola", "menu", "ayuda"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuOption {
    Cotizacion,
    Precios,
    Disponibilidad,
    Entregas,
    Stock,
    Preventa,
    Carrito,
    Reservas,
}

/// Fixed-priority routing table for `await_option`. Evaluated top to bottom:
/// exact digit first, then keyword containment, so tie-breaks are
/// reproducible. Option names match their own keyword ("cotizacion" contains
/// "cotiz"), so no separate exact-name arm is needed.
const OPTION_ROUTES: &[(MenuOption, &str, &str)] = &[
    (MenuOption::Cotizacion, "1", "cotiz"),
    (MenuOption::Precios, "2", "precio"),
    (MenuOption::Disponibilidad, "3", "dispon"),
    (MenuOption::Entregas, "4", "entrega"),
    (MenuOption::Stock, "5", "stock"),
    (MenuOption::Preventa, "6", "preventa"),
    (MenuOption::Carrito, "7", "carrito"),
    (MenuOption::Reservas, "8", "reserva"),
];

fn route_option(input: &str) -> Option<MenuOption> {
    OPTION_ROUTES
        .iter()
        .find(|(_, digit, keyword)| input == *digit || input.contains(keyword))
        .map(|(option, _, _)| *option)
}

/// `ID cantidad` input, e.g. `ZAF001 5`. The quantity defaults to 1 when
/// absent, non-numeric, or not positive.
fn parse_item_request(raw: &str) -> (Option<&str>, i64) {
    let mut parts = raw.split_whitespace();
    let id = parts.next();
    let quantity = parts
        .next()
        .and_then(|token| token.parse::<i64>().ok())
        .filter(|quantity| *quantity > 0)
        .unwrap_or(1);
    (id, quantity)
}

/// The session-keyed state machine. `handle` consumes exactly one inbound
/// message and always yields a reply: domain errors are rendered as specific
/// guidance inside the state handlers, and a store failure anywhere is caught
/// at this boundary with the session step left as it was before the attempt.
pub struct DialogueEngine {
    catalog: Arc<dyn CatalogGateway>,
    commerce: CommerceService,
}

impl DialogueEngine {
    pub fn new(catalog: Arc<dyn CatalogGateway>, commerce: CommerceService) -> Self {
        Self { catalog, commerce }
    }

    pub async fn handle(&self, session: &mut Session, message: &InboundMessage) -> Reply {
        session.touched_at = Utc::now();

        let body = normalize(&message.body);
        let selected = message.selected_option();

        // Step transitions are staged on a copy so a failed handler leaves
        // the session exactly where it was.
        let mut step = session.step;
        if MENU_TRIGGERS.contains(&body.as_str()) || selected == "menu" {
            step = SessionStep::Menu;
        }

        match self.dispatch(&mut step, message, &body, &selected).await {
            Ok(reply) => {
                tracing::debug!(
                    event_name = "dialogue.message_handled",
                    address = %message.address,
                    from_step = session.step.as_str(),
                    to_step = step.as_str(),
                    "message handled"
                );
                session.step = step;
                reply
            }
            Err(error) => {
                tracing::error!(
                    event_name = "dialogue.handler_failed",
                    address = %message.address,
                    step = session.step.as_str(),
                    error = %error,
                    "handler failed; replying with apology and preserving step"
                );
                Reply::single(render::apology())
            }
        }
    }

    async fn dispatch(
        &self,
        step: &mut SessionStep,
        message: &InboundMessage,
        body: &str,
        selected: &str,
    ) -> Result<Reply, StoreError> {
        match *step {
            SessionStep::Menu => {
                *step = SessionStep::AwaitOption;
                Ok(self.menu_reply().await)
            }
            SessionStep::AwaitOption => self.handle_option(step, message, selected).await,
            SessionStep::AwaitCotizacionProduct => {
                self.handle_cotizacion(step, &message.address, body, &message.body).await
            }
            SessionStep::AwaitDisponibilidadProduct => {
                self.handle_disponibilidad(&message.body).await
            }
            SessionStep::AwaitEntregasZone => self.handle_entregas(&message.body).await,
            SessionStep::AwaitPreventaReservation => {
                self.handle_preventa(step, &message.address, body, &message.body).await
            }
        }
    }

    /// The menu never fails: if the catalog read errors, a static menu with
    /// hard-coded contact details goes out instead.
    async fn menu_reply(&self) -> Reply {
        match self.catalog.company().await {
            Ok(company) => Reply::single(render::menu(company.as_ref())),
            Err(error) => {
                tracing::warn!(
                    event_name = "dialogue.menu_degraded",
                    error = %error,
                    "catalog unavailable while rendering menu; using static menu"
                );
                Reply::single(render::static_menu())
            }
        }
    }

    async fn handle_option(
        &self,
        step: &mut SessionStep,
        message: &InboundMessage,
        selected: &str,
    ) -> Result<Reply, StoreError> {
        let Some(option) = route_option(selected) else {
            // Unmatched input stays in await_option, not back at the menu.
            return Ok(Reply::single(render::unrecognized_option()));
        };

        match option {
            MenuOption::Cotizacion => {
                let listings = self.catalog.categories_with_products(Some(5), true).await?;
                *step = SessionStep::AwaitCotizacionProduct;
                Ok(Reply::single(render::cotizacion_intro(&listings)))
            }
            MenuOption::Precios => {
                let listings = self.catalog.categories_with_products(None, false).await?;
                let company = self.catalog.company().await?;
                *step = SessionStep::Menu;
                Ok(Reply::single(render::price_list(&listings, company.as_ref())))
            }
            MenuOption::Disponibilidad => {
                let available = self.catalog.available_products().await?;
                let unavailable_count = self.catalog.count_unavailable_products().await?;
                *step = SessionStep::AwaitDisponibilidadProduct;
                Ok(Reply::single(render::disponibilidad_intro(&available, unavailable_count)))
            }
            MenuOption::Entregas => {
                let zones = self.catalog.zones().await?;
                let company = self.catalog.company().await?;
                *step = SessionStep::AwaitEntregasZone;
                Ok(Reply::single(render::entregas_intro(&zones, company.as_ref())))
            }
            MenuOption::Stock => {
                let listings = self.catalog.categories_with_products(None, false).await?;
                *step = SessionStep::Menu;
                Ok(Reply::single(render::stock_report(&listings)))
            }
            MenuOption::Preventa => {
                let presales = self.catalog.presale_products().await?;
                if presales.is_empty() {
                    let company = self.catalog.company().await?;
                    *step = SessionStep::Menu;
                    Ok(Reply::single(render::preventa_empty(company.as_ref())))
                } else {
                    *step = SessionStep::AwaitPreventaReservation;
                    Ok(Reply::single(render::preventa_intro(&presales)))
                }
            }
            MenuOption::Carrito => {
                *step = SessionStep::Menu;
                self.cart_view_reply(&message.address).await
            }
            MenuOption::Reservas => {
                *step = SessionStep::Menu;
                self.reservations_reply(&message.address).await
            }
        }
    }

    async fn handle_cotizacion(
        &self,
        step: &mut SessionStep,
        address: &str,
        body: &str,
        raw_body: &str,
    ) -> Result<Reply, StoreError> {
        // Cart shortcut: render the cart and leave the add-items loop as is.
        if body.contains("carrito") {
            return self.cart_view_reply(address).await;
        }

        let (raw_id, quantity) = parse_item_request(raw_body);
        let Some(raw_id) = raw_id else {
            return Ok(Reply::single(render::cotizacion_usage()));
        };
        let product_id = ProductId::parse(raw_id);

        // Success and domain failure both stay in await_cotizacion_product,
        // so the customer can keep adding items.
        debug_assert_eq!(*step, SessionStep::AwaitCotizacionProduct);
        match self.commerce.add_to_cart(address, &product_id, quantity).await {
            Ok(addition) => Ok(Reply::single(render::cart_added(&addition))),
            Err(CommerceError::Domain(DomainError::ProductNotFound(_))) => {
                let listings = self.catalog.categories_with_products(Some(3), false).await?;
                Ok(Reply::single(render::product_not_found(&product_id.0, &listings)))
            }
            Err(CommerceError::Domain(DomainError::InsufficientStock {
                available, unit, ..
            })) => Ok(Reply::single(render::insufficient_stock(available, &unit))),
            Err(CommerceError::Domain(other)) => {
                Err(StoreError::decode(format!("unexpected cart error: {other}")))
            }
            Err(CommerceError::Store(error)) => Err(error),
        }
    }

    async fn handle_disponibilidad(&self, raw_body: &str) -> Result<Reply, StoreError> {
        let product_id = ProductId::parse(raw_body);
        match self.catalog.product(&product_id).await? {
            Some(product) => {
                let category_name = self.category_name(&product).await?;
                Ok(Reply::single(render::disponibilidad_detail(&product, &category_name)))
            }
            None => {
                let samples = self.catalog.products(Some(10)).await?;
                Ok(Reply::single(render::disponibilidad_not_found(&product_id.0, &samples)))
            }
        }
    }

    async fn handle_entregas(&self, raw_body: &str) -> Result<Reply, StoreError> {
        match self.catalog.zone_matching(raw_body).await? {
            Some(zone) => {
                let company = self.catalog.company().await?;
                Ok(Reply::single(render::entregas_detail(&zone, company.as_ref())))
            }
            None => {
                let zones = self.catalog.zones().await?;
                Ok(Reply::single(render::entregas_not_found(raw_body.trim(), &zones)))
            }
        }
    }

    async fn handle_preventa(
        &self,
        step: &mut SessionStep,
        address: &str,
        body: &str,
        raw_body: &str,
    ) -> Result<Reply, StoreError> {
        // Reservations shortcut, same-state loop as the cart shortcut.
        if body.contains("reserva") {
            return self.reservations_reply(address).await;
        }

        let (raw_id, quantity) = parse_item_request(raw_body);
        let Some(raw_id) = raw_id else {
            return Ok(Reply::single(render::preventa_usage()));
        };
        let presale_id = PresaleProductId::parse(raw_id);

        // Company is read before the reservation is written so a contact
        // lookup failure cannot strand a half-announced reservation.
        let company = self.catalog.company().await?;
        match self.commerce.create_reservation(address, &presale_id, quantity).await {
            Ok(receipt) => {
                *step = SessionStep::Menu;
                Ok(Reply::single(render::reservation_created(&receipt, company.as_ref())))
            }
            Err(CommerceError::Domain(DomainError::PresaleProductNotFound(_))) => {
                let presales = self.catalog.presale_products().await?;
                Ok(Reply::single(render::preventa_not_found(&presale_id.0, &presales)))
            }
            Err(CommerceError::Domain(other)) => {
                Err(StoreError::decode(format!("unexpected reservation error: {other}")))
            }
            Err(CommerceError::Store(error)) => Err(error),
        }
    }

    async fn cart_view_reply(&self, address: &str) -> Result<Reply, StoreError> {
        let view = self.commerce.view_cart(address).await?;
        if view.is_empty() {
            return Ok(Reply::single(render::cart_empty()));
        }
        let company = self.catalog.company().await?;
        Ok(Reply::single(render::cart_view(&view, company.as_ref())))
    }

    async fn reservations_reply(&self, address: &str) -> Result<Reply, StoreError> {
        let views = self.commerce.list_reservations(address).await?;
        if views.is_empty() {
            return Ok(Reply::single(render::reservations_empty()));
        }
        let company = self.catalog.company().await?;
        Ok(Reply::single(render::reservations_view(&views, company.as_ref())))
    }

    async fn category_name(&self, product: &Product) -> Result<String, StoreError> {
        Ok(self
            .catalog
            .category(&product.category_id)
            .await?
            .map_or_else(|| "Sin categoría".to_string(), |category| category.name))
    }
}
