//! Branded HTML bodies for the notification emails. Kept deliberately
//! simple: a header bar, one content block, a footer line.

use super::EmailMessage;

const BRAND: &str = "Deliveroo";
const FOOTER: &str = "Fast, reliable parcel delivery.";

fn wrap(body: &str) -> String {
    format!(
        "<div style=\"background:#f3f4f6;padding:24px 0;\">\
         <table role=\"presentation\" width=\"560\" style=\"margin:0 auto;background:#ffffff;\
         border-radius:12px;overflow:hidden;\">\
         <tr><td style=\"background:#111827;color:#ffffff;padding:18px 24px;\
         font-family:Arial,sans-serif;font-size:18px;font-weight:700;\">{BRAND}</td></tr>\
         <tr><td style=\"padding:24px;font-family:Arial,sans-serif;color:#1f2937;\
         line-height:1.6;\">{body}</td></tr>\
         <tr><td style=\"padding:14px 24px;background:#f9fafb;font-family:Arial,sans-serif;\
         color:#6b7280;font-size:12px;text-align:center;\">{FOOTER}</td></tr>\
         </table></div>"
    )
}

/// Status-change notification for the parcel's owner.
pub fn status_update(to: &str, username: &str, parcel_id: i32, status: &str) -> EmailMessage {
    let body = format!(
        "<p>Hello {username},</p>\
         <p>Your parcel is on the move. The status for order <strong>#{parcel_id}</strong> \
         is now <strong>{status}</strong>.</p>\
         <p>Thanks for choosing {BRAND}.</p>"
    );
    EmailMessage {
        to: to.to_string(),
        subject: format!("{BRAND} Update: Parcel #{parcel_id} Status"),
        html_body: wrap(&body),
    }
}

/// Location-change notification for the parcel's owner.
pub fn location_update(to: &str, username: &str, parcel_id: i32, location: &str) -> EmailMessage {
    let body = format!(
        "<p>Hello {username},</p>\
         <p>We have a new location update for parcel <strong>#{parcel_id}</strong>: \
         <strong>{location}</strong>.</p>\
         <p>Thanks for choosing {BRAND}.</p>"
    );
    EmailMessage {
        to: to.to_string(),
        subject: format!("{BRAND} Update: Parcel #{parcel_id} Location"),
        html_body: wrap(&body),
    }
}

/// Contact-form submission forwarded to the support inbox.
pub fn contact_message(to: &str, name: &str, email: &str, message: &str) -> EmailMessage {
    let body = format!(
        "<h2>New Message via {BRAND} Contact Form</h2>\
         <p><strong>From:</strong> {name}</p>\
         <p><strong>Email:</strong> {email}</p>\
         <hr><p>{message}</p>"
    );
    EmailMessage {
        to: to.to_string(),
        subject: format!("New Contact Form Message from {name}"),
        html_body: wrap(&body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_email_names_the_parcel_and_status() {
        let msg = status_update("jane@example.com", "jane", 17, "In Transit");
        assert_eq!(msg.to, "jane@example.com");
        assert!(msg.subject.contains("#17"));
        assert!(msg.html_body.contains("In Transit"));
    }

    #[test]
    fn contact_email_carries_the_sender_address() {
        let msg = contact_message("support@example.com", "Sam", "sam@example.com", "hello");
        assert!(msg.html_body.contains("sam@example.com"));
        assert!(msg.subject.contains("Sam"));
    }
}
