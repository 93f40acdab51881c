//! Order notification templates.
//!
//! Pure render functions so the HTML/text bodies can be tested without a
//! mail provider. One template pair per audience: the customer gets a
//! confirmation, the shop inbox gets a fulfilment notification.

use rust_decimal::Decimal;

use crate::checkout::payload::SubmitOrderRequest;
use crate::domain::aggregates::checkout::PaymentOption;

/// Everything the templates need, flattened off the submission payload.
#[derive(Clone, Debug)]
pub struct OrderEmail {
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub full_address: String,
    pub receiver: Option<ReceiverBlock>,
    pub lines: Vec<EmailLine>,
    pub total: Decimal,
    pub payment_option: PaymentOption,
    pub receipt_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ReceiverBlock {
    pub full_name: String,
    pub phone: String,
    pub full_address: String,
}

#[derive(Clone, Debug)]
pub struct EmailLine {
    pub name: String,
    pub quantity: u32,
    pub line_total: Decimal,
}

#[derive(Clone, Debug)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl OrderEmail {
    pub fn from_request(request: &SubmitOrderRequest, receipt_url: Option<&str>) -> Self {
        Self {
            order_id: request.order_id.as_str().to_string(),
            customer_name: request.customer_info.full_name.clone(),
            customer_email: request.customer_info.email.clone(),
            customer_phone: request.customer_info.phone.clone(),
            full_address: request.customer_info.full_address.clone(),
            receiver: request.receiver_info.as_ref().map(|receiver| ReceiverBlock {
                full_name: receiver.full_name.clone(),
                phone: receiver.phone.clone(),
                full_address: receiver.full_address.clone(),
            }),
            lines: request
                .cart
                .iter()
                .map(|line| EmailLine {
                    name: line.name.clone(),
                    quantity: line.quantity,
                    line_total: line.line_total(),
                })
                .collect(),
            total: request.total,
            payment_option: request.payment_option,
            receipt_url: receipt_url.map(str::to_string),
        }
    }
}

fn option_label(option: PaymentOption) -> &'static str {
    match option {
        PaymentOption::PayInFull => "Paid in full",
        PaymentOption::CashOnDelivery => "Cash on delivery",
        PaymentOption::Deposit => "10% deposit paid",
    }
}

fn items_table(lines: &[EmailLine]) -> String {
    let mut rows = String::new();
    for line in lines {
        rows.push_str(&format!(
            "<tr><td style=\"padding:6px 12px;border-bottom:1px solid #eee\">{}</td>\
             <td style=\"padding:6px 12px;border-bottom:1px solid #eee;text-align:center\">{}</td>\
             <td style=\"padding:6px 12px;border-bottom:1px solid #eee;text-align:right\">NPR {}</td></tr>",
            line.name, line.quantity, line.line_total
        ));
    }
    format!(
        "<table style=\"border-collapse:collapse;width:100%\">\
         <tr><th style=\"text-align:left;padding:6px 12px\">Item</th>\
         <th style=\"padding:6px 12px\">Qty</th>\
         <th style=\"text-align:right;padding:6px 12px\">Amount</th></tr>{rows}</table>"
    )
}

fn items_text(lines: &[EmailLine]) -> String {
    lines
        .iter()
        .map(|line| format!("  - {} x{}: NPR {}", line.name, line.quantity, line.line_total))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Confirmation sent to the customer after a successful order.
pub fn customer_confirmation(order: &OrderEmail) -> RenderedEmail {
    let subject = format!("Order confirmed: {}", order.order_id);

    let mut html = format!(
        "<div style=\"font-family:sans-serif;max-width:560px;margin:0 auto\">\
         <h2>Thanks for your order, {}!</h2>\
         <p>Your order <strong>{}</strong> has been received.</p>{}",
        order.customer_name,
        order.order_id,
        items_table(&order.lines)
    );
    html.push_str(&format!(
        "<p style=\"text-align:right;font-size:16px\"><strong>Total: NPR {}</strong></p>\
         <p>Payment: {}</p>",
        order.total,
        option_label(order.payment_option)
    ));
    if let Some(receiver) = &order.receiver {
        html.push_str(&format!(
            "<p>Delivering to: {} ({})<br>{}</p>",
            receiver.full_name, receiver.phone, receiver.full_address
        ));
    } else {
        html.push_str(&format!("<p>Delivering to: {}</p>", order.full_address));
    }
    html.push_str("<p>We will contact you on the phone number you provided once the order ships.</p></div>");

    let mut text = format!(
        "Thanks for your order, {}!\n\nOrder {} has been received.\n\n{}\n\nTotal: NPR {}\nPayment: {}\n",
        order.customer_name,
        order.order_id,
        items_text(&order.lines),
        order.total,
        option_label(order.payment_option)
    );
    if let Some(receiver) = &order.receiver {
        text.push_str(&format!(
            "Delivering to: {} ({}), {}\n",
            receiver.full_name, receiver.phone, receiver.full_address
        ));
    } else {
        text.push_str(&format!("Delivering to: {}\n", order.full_address));
    }

    RenderedEmail { subject, html, text }
}

/// Notification sent to the shop inbox so fulfilment can start.
pub fn admin_notification(order: &OrderEmail) -> RenderedEmail {
    let subject = format!("New order {} (NPR {})", order.order_id, order.total);

    let mut html = format!(
        "<div style=\"font-family:sans-serif;max-width:560px;margin:0 auto\">\
         <h2>New order {}</h2>\
         <p>{} &lt;{}&gt;<br>{}<br>{}</p>{}",
        order.order_id,
        order.customer_name,
        order.customer_email,
        order.customer_phone,
        order.full_address,
        items_table(&order.lines)
    );
    html.push_str(&format!(
        "<p style=\"text-align:right\"><strong>Total: NPR {}</strong></p><p>Payment: {}</p>",
        order.total,
        option_label(order.payment_option)
    ));
    if let Some(receiver) = &order.receiver {
        html.push_str(&format!(
            "<p>Ship to: {} ({})<br>{}</p>",
            receiver.full_name, receiver.phone, receiver.full_address
        ));
    }
    match &order.receipt_url {
        Some(url) => html.push_str(&format!("<p><a href=\"{url}\">Payment receipt</a></p>")),
        None => html.push_str("<p>No receipt attached.</p>"),
    }
    html.push_str("</div>");

    let mut text = format!(
        "New order {}\n\nCustomer: {} <{}>\nPhone: {}\nAddress: {}\n\n{}\n\nTotal: NPR {}\nPayment: {}\n",
        order.order_id,
        order.customer_name,
        order.customer_email,
        order.customer_phone,
        order.full_address,
        items_text(&order.lines),
        order.total,
        option_label(order.payment_option)
    );
    if let Some(receiver) = &order.receiver {
        text.push_str(&format!(
            "Ship to: {} ({}), {}\n",
            receiver.full_name, receiver.phone, receiver.full_address
        ));
    }
    match &order.receipt_url {
        Some(url) => text.push_str(&format!("Receipt: {url}\n")),
        None => text.push_str("No receipt attached.\n"),
    }

    RenderedEmail { subject, html, text }
}
