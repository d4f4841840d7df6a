//! Title directive extraction ("название: ...", "title - ...").

use crate::catalog::KeywordCatalog;

/// Characters stripped from both ends of an extracted title.
const TITLE_TRIM: &[char] = &['"', '\'', '⟨', '⟩', '“', '”', '«', '»'];

/// Value of a title directive in `raw_text`, cut before the first stop word.
pub fn extract_title(raw_text: &str, catalog: &KeywordCatalog) -> Option<String> {
    let directive = catalog.title_directive.as_ref()?;
    let caps = directive.captures(raw_text)?;
    let candidate = caps.get(1)?.as_str().trim();
    let candidate = truncate_before(candidate, &catalog.title_stop_words);
    let candidate = candidate.trim_matches(TITLE_TRIM).trim();
    (!candidate.is_empty()).then(|| candidate.to_string())
}

/// Cut `text` at the earliest word starting with any keyword, ignoring case.
fn truncate_before<'a>(text: &'a str, keywords: &[String]) -> &'a str {
    let cut = text
        .char_indices()
        .filter(|&(idx, _)| word_start(text, idx))
        .map(|(idx, _)| idx)
        .find(|&idx| {
            let rest = text[idx..].to_lowercase();
            keywords.iter().any(|k| rest.starts_with(k.as_str()))
        })
        .unwrap_or(text.len());
    text[..cut].trim()
}

fn word_start(text: &str, idx: usize) -> bool {
    text[..idx]
        .chars()
        .next_back()
        .map_or(true, |c| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> KeywordCatalog {
        KeywordCatalog::builtin()
    }

    #[test]
    fn test_russian_directive() {
        assert_eq!(
            extract_title("название: Миграция базы", &catalog()),
            Some("Миграция базы".to_string())
        );
    }

    #[test]
    fn test_longer_directive_form() {
        assert_eq!(
            extract_title("найди задачу с названием - «Новый логин» опиши её", &catalog()),
            Some("Новый логин".to_string())
        );
    }

    #[test]
    fn test_english_directive_is_case_insensitive() {
        assert_eq!(
            extract_title("Title: \"Checkout timeout\"", &catalog()),
            Some("Checkout timeout".to_string())
        );
    }

    #[test]
    fn test_cut_before_stop_word() {
        assert_eq!(
            extract_title("название: Импорт прайса проанализируй риски", &catalog()),
            Some("Импорт прайса".to_string())
        );
    }

    #[test]
    fn test_english_stop_words() {
        assert_eq!(
            extract_title("title: Checkout timeout find related issues", &catalog()),
            Some("Checkout timeout".to_string())
        );
        assert_eq!(
            extract_title("title - Payment retries write a test plan", &catalog()),
            Some("Payment retries".to_string())
        );
    }

    #[test]
    fn test_stop_words_only_cut_at_word_start() {
        assert_eq!(
            extract_title("title: Latest contest results", &catalog()),
            Some("Latest contest results".to_string())
        );
    }

    #[test]
    fn test_no_directive_or_empty_value() {
        assert_eq!(extract_title("мои баги за неделю", &catalog()), None);
        assert_eq!(extract_title("название: \"\"", &catalog()), None);
        assert_eq!(extract_title("название: опиши задачу", &catalog()), None);
    }
}
