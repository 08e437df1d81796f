//! HTML scraping of the SSO auto-submit form.

use scraper::{Html, Selector};

/// Form field carrying the SAML assertion.
pub const SAML_RESPONSE_FIELD: &str = "SAMLResponse";

/// Value of the first `<input>` named `name`, if any.
///
/// Only `type="hidden"` inputs are considered; an input without a `type`
/// attribute is accepted too.
pub fn extract_hidden_field(html: &str, name: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("input").ok()?;
    document
        .select(&selector)
        .filter(|input| {
            input
                .value()
                .attr("type")
                .map_or(true, |kind| kind.eq_ignore_ascii_case("hidden"))
        })
        .find(|input| input.value().attr("name") == Some(name))
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
}
