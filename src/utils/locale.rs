//! Best-effort language inference over the raw query text.
//!
//! There is no HTTP `Accept-Language` header in this pipeline, so the
//! orchestrator infers a locale tag from the query itself and sets it via
//! [`super::set_locale`] before any error is localized. Detection is
//! intentionally crude, a short list of unambiguous function words, because
//! getting it wrong only changes which language an error message is
//! rendered in, never the data returned.

use super::i18n::{DEFAULT_LOCALE, set_locale};

const SPANISH_MARKERS: &[&str] = &[
    "qué", "que", "cuántos", "cuantos", "más", "mas", "de", "el", "la", "los", "las", "puntos",
    "equipos", "jugador", "temporada", "anotadores", "rebotes", "asistencias",
];
const ENGLISH_MARKERS: &[&str] = &[
    "what", "how", "many", "most", "the", "points", "teams", "player", "season", "scorers",
    "rebounds", "assists",
];

/// Infers "es" or "en" from `text` and sets it as the thread-local locale
/// for the remainder of the request. Falls back to [`DEFAULT_LOCALE`] when
/// the text gives no signal either way.
pub fn infer_query_locale(text: &str) -> String {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().map(|w| w.trim_matches(|c: char| !c.is_alphanumeric())).collect();

    let es_hits = words.iter().filter(|w| SPANISH_MARKERS.contains(w)).count();
    let en_hits = words.iter().filter(|w| ENGLISH_MARKERS.contains(w)).count();

    let locale = if es_hits == 0 && en_hits == 0 {
        DEFAULT_LOCALE.to_string()
    } else if en_hits > es_hits {
        "en".to_string()
    } else {
        "es".to_string()
    };

    set_locale(&locale);
    locale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_spanish() {
        assert_eq!(infer_query_locale("Top 10 anotadores de esta temporada"), "es");
    }

    #[test]
    fn detects_english() {
        assert_eq!(infer_query_locale("What are the top scorers this season"), "en");
    }

    #[test]
    fn falls_back_to_default_on_ambiguous_input() {
        assert_eq!(infer_query_locale("Campazzo"), DEFAULT_LOCALE);
    }
}
