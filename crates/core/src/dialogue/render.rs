//! Reply text for every handler, in the channel's flat markup (`*bold*`,
//! plain newlines). Keeping the strings in one place keeps the engine free of
//! formatting noise.

use rust_decimal::Decimal;

use crate::catalog::CategoryListing;
use crate::commerce::{CartAddition, CartView, ReservationReceipt, ReservationView};
use crate::domain::company::Company;
use crate::domain::product::Product;
use crate::domain::reservation::PresaleProduct;
use crate::domain::zone::DeliveryZone;

fn money(value: Decimal) -> String {
    format!("${:.2}", value.round_dp(2))
}

pub fn menu(company: Option<&Company>) -> String {
    format!(
        "🍞 ¡Hola! Bienvenido a *{name}*\n\n\
         Más de 30 años suministrando insumos de la más alta calidad para panadería y repostería.\n\n\
         ¿En qué puedo ayudarte? Selecciona una opción:\n\n\
         1️⃣ 💰 Cotización (con carrito)\n\
         2️⃣ 💵 Precios\n\
         3️⃣ 📦 Disponibilidad\n\
         4️⃣ 🚚 Entregas\n\
         5️⃣ 📊 Stock\n\
         6️⃣ 🎁 Preventa (reservas)\n\
         7️⃣ 🛒 Ver mi carrito\n\
         8️⃣ 📋 Ver mis reservas\n\n\
         📞 Contacto: {phone}\n\n\
         Escribe el número o *menu* para ver este menú.",
        name = Company::name_or_default(company),
        phone = Company::phone_or_default(company),
    )
}

/// Menu rendered when the catalog store is unreachable, so first contact
/// still gets an answer.
pub fn static_menu() -> String {
    format!(
        "🍞 ¡Hola! Bienvenido a *{name}*\n\n\
         ¿En qué puedo ayudarte? Selecciona una opción:\n\n\
         1️⃣ 💰 Cotización\n\
         2️⃣ 💵 Precios\n\
         3️⃣ 📦 Disponibilidad\n\
         4️⃣ 🚚 Entregas\n\
         5️⃣ 📊 Stock\n\
         6️⃣ 🎁 Preventa\n\
         7️⃣ 🛒 Ver mi carrito\n\
         8️⃣ 📋 Ver mis reservas\n\n\
         📞 Contacto: {phone}",
        name = Company::name_or_default(None),
        phone = Company::phone_or_default(None),
    )
}

pub fn unrecognized_option() -> String {
    "❌ No te entendí 😅. Por favor selecciona una opción del menú o escribe *menu*.".to_string()
}

pub fn apology() -> String {
    "❌ Ocurrió un error. Por favor intenta de nuevo o escribe *menu*.".to_string()
}

pub fn cotizacion_intro(listings: &[CategoryListing]) -> String {
    let mut message = String::from("💰 *Cotización de Productos*\n\n");
    message.push_str("*Agrega productos a tu carrito escribiendo: ID cantidad*\n");
    message.push_str("Ejemplo: *ZAF001 5*\n\n");
    message.push_str("*Categorías disponibles:*\n");
    for (index, listing) in listings.iter().enumerate() {
        if !listing.products.is_empty() {
            message.push_str(&format!("{}. {}\n", index + 1, listing.category.name));
        }
    }
    message.push_str("\n*Ejemplos de productos:*\n");
    for listing in listings {
        for product in listing.products.iter().take(2) {
            message.push_str(&format!(
                "• {} - {} - {}\n",
                product.id,
                product.name,
                money(product.price)
            ));
        }
    }
    message.push_str("\nEscribe *ID cantidad* para agregar al carrito o *menu* para regresar.");
    message
}

pub fn cotizacion_usage() -> String {
    "❌ Por favor escribe el ID del producto. Ejemplo: *ZAF001 5*\n\n\
     O escribe *carrito* para ver tu carrito."
        .to_string()
}

pub fn cart_added(addition: &CartAddition) -> String {
    let category_name =
        addition.category.as_ref().map_or("Sin categoría", |category| category.name.as_str());
    format!(
        "✅ *Agregado al carrito*\n\n\
         💰 *{name}*\n\
         📋 Categoría: {category_name}\n\
         💵 Precio: {price} / {unit}\n\
         📦 Cantidad: {quantity} {unit}\n\
         💰 Subtotal: {subtotal}\n\n\
         🛒 Escribe *carrito* para ver tu carrito\n\
         📝 Escribe otro producto (ID cantidad) o *menu* para regresar.",
        name = addition.product.name,
        price = money(addition.product.price),
        unit = addition.product.unit,
        quantity = addition.quantity,
        subtotal = money(addition.subtotal()),
    )
}

pub fn insufficient_stock(available: i64, unit: &str) -> String {
    format!(
        "❌ Stock insuficiente. Disponible: {available} {unit}\n\n\
         Escribe otro producto o *menu* para regresar."
    )
}

pub fn product_not_found(product_id: &str, listings: &[CategoryListing]) -> String {
    let mut message = format!("❌ No encontré el producto *{product_id}*.\n\n");
    message.push_str("*Productos disponibles:*\n");
    for listing in listings {
        if !listing.products.is_empty() {
            message.push_str(&format!("\n*{}:*\n", listing.category.name));
            for product in &listing.products {
                message.push_str(&format!("• {} - {}\n", product.id, product.name));
            }
        }
    }
    message.push_str("\nEscribe *ID cantidad* (ej: ZAF001 5) o *menu* para regresar.");
    message
}

pub fn price_list(listings: &[CategoryListing], company: Option<&Company>) -> String {
    let mut message = String::from("💵 *Lista de Precios*\n\n");
    for listing in listings {
        if listing.products.is_empty() {
            continue;
        }
        message.push_str(&format!("*{}:*\n", listing.category.name));
        for product in &listing.products {
            let stock_emoji = if product.in_stock() { "✅" } else { "❌" };
            message.push_str(&format!("{stock_emoji} {} ({})\n", product.name, product.id));
            message.push_str(&format!("   {} / {}\n", money(product.price), product.unit));
        }
        message.push('\n');
    }
    message.push_str(
        "💡 *Nota:* Precios sujetos a cambio. Para pedidos especiales o grandes volúmenes, \
         contáctanos.\n\n",
    );
    message.push_str(&format!("📞 {}\n\n", Company::phone_or_default(company)));
    message.push_str("Escribe *menu* para volver al menú.");
    message
}

pub fn disponibilidad_intro(available: &[Product], unavailable_count: i64) -> String {
    let mut message = String::from("📦 *Disponibilidad de Productos*\n\n");
    message.push_str("*Productos disponibles:*\n");
    for product in available {
        let stock_emoji = if product.stock > 10 { "✅" } else { "⚠️" };
        message.push_str(&format!(
            "{stock_emoji} {} - {} ({} {})\n",
            product.id, product.name, product.stock, product.unit
        ));
    }
    if unavailable_count > 0 {
        message.push_str(&format!(
            "\n⚠️ {unavailable_count} producto(s) actualmente agotado(s)\n\n"
        ));
    }
    message.push_str("Escribe el *ID del producto* para más detalles o *menu* para regresar.");
    message
}

pub fn disponibilidad_detail(product: &Product, category_name: &str) -> String {
    let status = if product.in_stock() { "✅ Disponible" } else { "❌ Agotado" };
    let mut message = format!(
        "📦 *Disponibilidad - {name}*\n\n\
         Estado: {status}\n\
         Stock: {stock} {unit}\n\
         Nivel: {level}\n\
         ID: {id}\n\
         Categoría: {category_name}\n\
         Tiempo de entrega: {days} día(s)\n\n",
        name = product.name,
        stock = product.stock,
        unit = product.unit,
        level = product.stock_level().label(),
        id = product.id,
        days = product.delivery_days,
    );
    if product.stock == 0 {
        message
            .push_str("⚠️ Producto agotado. Contáctanos para conocer fecha de reposición.\n\n");
    }
    message.push_str("\n\nEscribe *menu* para volver al menú.");
    message
}

pub fn disponibilidad_not_found(product_id: &str, samples: &[Product]) -> String {
    let mut message = format!("❌ No encontré el producto *{product_id}*.\n\n");
    message.push_str("Productos disponibles:\n");
    for product in samples {
        message.push_str(&format!("• {} - {}\n", product.id, product.name));
    }
    message.push_str("\nEscribe un ID o *menu* para regresar.");
    message
}

pub fn entregas_intro(zones: &[DeliveryZone], company: Option<&Company>) -> String {
    let zone_list = zones
        .iter()
        .map(|zone| format!("• {}: {} día(s) - {}", zone.zone, zone.days, money(zone.cost)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "🚚 *Información de Entregas*\n\n\
         *Zonas de entrega y costos:*\n{zone_list}\n\n\
         📍 *Sucursal:*\n{address}\n\
         📞 {phone}\n\
         🕐 {schedule}\n\n\
         Escribe el *nombre de la zona* para más detalles o *menu* para regresar.",
        address = Company::address_or_default(company),
        phone = Company::phone_or_default(company),
        schedule = Company::schedule_or_default(company),
    )
}

pub fn entregas_detail(zone: &DeliveryZone, company: Option<&Company>) -> String {
    let mut message = format!("🚚 *Entregas - {}*\n\n", zone.zone);
    message.push_str(&format!("⏱️ Tiempo estimado: {} día(s)\n", zone.days));
    message.push_str(&format!("💰 Costo de envío: {}\n", money(zone.cost)));
    if let Some(description) = &zone.description {
        message.push_str(&format!("📍 {description}\n"));
    }

    if let Some(company) = company {
        message.push_str("\n*Nuestra sucursal:*\n");
        message.push_str(&format!("📍 {}\n", company.address));
        message.push_str(&format!("📞 {}\n", company.phone));
        message.push_str(&format!("🕐 {}\n", company.schedule));
    }

    message
        .push_str("\n💡 *Nota:* Los tiempos pueden variar según el volumen del pedido.\n\n");
    message.push_str("Escribe *menu* para volver al menú.");
    message
}

pub fn entregas_not_found(input: &str, zones: &[DeliveryZone]) -> String {
    let mut message = format!("❌ No encontré la zona *{input}*.\n\n");
    message.push_str("Zonas disponibles:\n");
    for zone in zones {
        message.push_str(&format!("• {}\n", zone.zone));
    }
    message.push_str("\nEscribe una zona o *menu* para regresar.");
    message
}

pub fn stock_report(listings: &[CategoryListing]) -> String {
    let mut message = String::from("📊 *Stock Actual de Inventario*\n\n");
    for listing in listings {
        if listing.products.is_empty() {
            continue;
        }
        message.push_str(&format!("*{}:*\n", listing.category.name));
        for product in &listing.products {
            let emoji = match product.stock {
                0 => "❌",
                1..=10 => "⚠️",
                11..=25 => "🟡",
                _ => "✅",
            };
            message.push_str(&format!("{emoji} {} ({})\n", product.name, product.id));
            message.push_str(&format!("   Stock: {} {}\n", product.stock, product.unit));
        }
        message.push('\n');
    }
    message.push_str("*Leyenda:*\n✅ Buen stock | 🟡 Stock medio | ⚠️ Stock bajo | ❌ Agotado\n\n");
    message.push_str("Escribe *menu* para volver al menú.");
    message
}

pub fn preventa_intro(presales: &[PresaleProduct]) -> String {
    let presale_list = presales
        .iter()
        .enumerate()
        .map(|(index, presale)| {
            let mut entry = format!("{}. *{}* ({})\n", index + 1, presale.name, presale.id);
            entry.push_str(&format!("   💵 Precio: {}\n", money(presale.price)));
            entry.push_str(&format!("   💰 Anticipo: {}\n", money(presale.deposit)));
            entry.push_str(&format!("   📅 Fecha: {}\n", presale.release_date));
            if let Some(description) = &presale.description {
                entry.push_str(&format!("   ℹ️ {description}\n"));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "🎁 *Productos en Preventa*\n\n\
         Reserva ahora escribiendo: *ID cantidad*\n\
         Ejemplo: *PRE001 2*\n\n\
         {presale_list}\n\n\
         Escribe *ID cantidad* para reservar o *menu* para regresar."
    )
}

pub fn preventa_empty(company: Option<&Company>) -> String {
    format!(
        "🎁 *Productos en Preventa*\n\n\
         Actualmente no tenemos productos en preventa.\n\n\
         💡 *¿Buscas algo específico?* Contáctanos y te ayudamos a encontrarlo.\n\
         📞 {phone}\n\n\
         Escribe *menu* para volver al menú.",
        phone = Company::phone_or_default(company),
    )
}

pub fn preventa_usage() -> String {
    "❌ Por favor escribe el ID del producto en preventa. Ejemplo: *PRE001 2*\n\n\
     O escribe *reservas* para ver tus reservas."
        .to_string()
}

pub fn preventa_not_found(presale_id: &str, presales: &[PresaleProduct]) -> String {
    let mut message = format!("❌ No encontré el producto en preventa *{presale_id}*.\n\n");
    message.push_str("Productos en preventa:\n");
    for presale in presales {
        message.push_str(&format!("• {} - {}\n", presale.id, presale.name));
    }
    message.push_str("\nEscribe *ID cantidad* o *menu* para regresar.");
    message
}

pub fn reservation_created(receipt: &ReservationReceipt, company: Option<&Company>) -> String {
    format!(
        "✅ *Reserva creada*\n\n\
         🎁 *{name}*\n\
         💵 Precio: {price}\n\
         💰 Anticipo: {deposit} c/u\n\
         📦 Cantidad: {quantity}\n\
         💰 Total anticipo: {total}\n\
         📅 Fecha de lanzamiento: {release_date}\n\n\
         📋 ID de reserva: {reservation_id}\n\n\
         💡 *Nota:* Contáctanos para confirmar tu reserva y realizar el pago del anticipo.\n\
         📞 {phone}\n\n\
         Escribe *reservas* para ver tus reservas o *menu* para regresar.",
        name = receipt.product.name,
        price = money(receipt.product.price),
        deposit = money(receipt.product.deposit),
        quantity = receipt.quantity,
        total = money(receipt.deposit_total()),
        release_date = receipt.product.release_date,
        reservation_id = receipt.reservation_id,
        phone = Company::phone_or_default(company),
    )
}

pub fn cart_empty() -> String {
    "🛒 *Tu Carrito está vacío*\n\n\
     Agrega productos desde la opción *Cotización* del menú.\n\n\
     Escribe *menu* para regresar."
        .to_string()
}

pub fn cart_view(view: &CartView, company: Option<&Company>) -> String {
    let mut message = String::from("🛒 *Tu Carrito de Cotización*\n\n");
    for line in &view.lines {
        message.push_str(&format!("• {} ({})\n", line.product.name, line.product.id));
        message.push_str(&format!("  Cantidad: {} {}\n", line.quantity, line.product.unit));
        message.push_str(&format!("  Precio: {} c/u\n", money(line.product.price)));
        message.push_str(&format!("  Subtotal: {}\n\n", money(line.subtotal())));
    }
    message.push_str(&format!("💰 *Total: {}*\n\n", money(view.total())));
    message.push_str("💡 Para finalizar tu cotización, contáctanos:\n");
    message.push_str(&format!("📞 {}\n\n", Company::phone_or_default(company)));
    message.push_str("Escribe *menu* para regresar.");
    message
}

pub fn reservations_empty() -> String {
    "📋 *No tienes reservas*\n\n\
     Puedes hacer reservas desde la opción *Preventa* del menú.\n\n\
     Escribe *menu* para regresar."
        .to_string()
}

pub fn reservations_view(views: &[ReservationView], company: Option<&Company>) -> String {
    let mut message = String::from("📋 *Tus Reservas*\n\n");
    for (index, reservation) in views.iter().enumerate() {
        message.push_str(&format!(
            "{}. *Reserva {}...*\n",
            index + 1,
            reservation.short_id
        ));
        message.push_str(&format!("   Estado: {}\n", reservation.status.label()));
        for line in &reservation.lines {
            message.push_str(&format!("   🎁 {}\n", line.product.name));
            message.push_str(&format!("   Cantidad: {}\n", line.quantity));
            message.push_str(&format!("   Anticipo: {}\n", money(line.deposit_total())));
        }
        message.push('\n');
    }
    message.push_str("💡 Para confirmar tus reservas, contáctanos:\n");
    message.push_str(&format!("📞 {}\n\n", Company::phone_or_default(company)));
    message.push_str("Escribe *menu* para regresar.");
    message
}
