use shared_models::error::AppError;

use crate::models::GatewayForm;

/// Turns a signed gateway form into the document that navigates the
/// browser away to the gateway.
pub trait GatewayRedirect: Send + Sync {
    fn render(&self, form: &GatewayForm) -> Result<String, AppError>;
}

/// An HTML page holding the form as hidden inputs that posts itself on load.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoSubmitForm;

impl GatewayRedirect for AutoSubmitForm {
    fn render(&self, form: &GatewayForm) -> Result<String, AppError> {
        let url = form.esewa_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(AppError::ValidationError(format!("Refusing gateway URL {:?}", url)));
        }

        let inputs: String = form
            .fields()
            .map(|(name, value)| {
                format!(
                    "    <input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
                    escape(name),
                    escape(&value)
                )
            })
            .collect();

        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Redirecting to payment</title></head>\n\
             <body onload=\"document.forms[0].submit()\">\n\
             <form method=\"POST\" action=\"{}\">\n{}    <noscript><button type=\"submit\">Continue to payment</button></noscript>\n\
             </form>\n</body>\n</html>\n",
            escape(url),
            inputs
        ))
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
