//! Internationalization utilities.
//!
//! `ResultEnvelope.message` is rendered in the user's inferred language when
//! one can be inferred, else in the default language. There is no HTTP
//! request here to carry an `Accept-Language` header, so the locale is set
//! per-request by [`super::locale::infer_query_locale`] from the query text
//! itself, then read back out of thread-local storage by
//! `PipelineError::localized_message`.

use std::cell::RefCell;

// Thread-local storage for current locale
thread_local! {
    static CURRENT_LOCALE: RefCell<String> = RefCell::new("es".to_string());
}

/// Supported locales
pub const SUPPORTED_LOCALES: &[&str] = &["es", "en"];
pub const DEFAULT_LOCALE: &str = "es";

/// Set the current locale for the current thread
pub fn set_locale(locale: &str) {
    let locale = normalize_locale(locale);
    CURRENT_LOCALE.with(|l| {
        *l.borrow_mut() = locale;
    });
}

/// Get the current locale for the current thread
pub fn get_locale() -> String {
    CURRENT_LOCALE.with(|l| l.borrow().clone())
}

/// Normalize locale string to supported format
/// Accepts: "zh", "zh-CN", "zh_CN", "en", "en-US", "en_US", etc.
fn normalize_locale(locale: &str) -> String {
    let locale = locale.trim().to_lowercase();
    
    // Extract primary language tag
    let primary = locale
        .split(|c| c == '-' || c == '_' || c == ',')
        .next()
        .unwrap_or(DEFAULT_LOCALE);
    
    // Map to supported locale
    if primary.starts_with("en") {
        "en".to_string()
    } else if primary.starts_with("es") {
        "es".to_string()
    } else {
        DEFAULT_LOCALE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("es"), "es");
        assert_eq!(normalize_locale("es-AR"), "es");
        assert_eq!(normalize_locale("en"), "en");
        assert_eq!(normalize_locale("en-US"), "en");
        assert_eq!(normalize_locale("fr"), "es"); // Unsupported, fallback to default
        assert_eq!(normalize_locale(""), "es");
    }

    #[test]
    fn test_set_get_locale() {
        set_locale("en");
        assert_eq!(get_locale(), "en");

        set_locale("es-AR");
        assert_eq!(get_locale(), "es");
    }
}
