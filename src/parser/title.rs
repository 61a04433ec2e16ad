use crate::config::ParserConfig;
use crate::domain::MediaKind;
use regex::Regex;
use std::sync::OnceLock;

/// Outcome of classifying one raw viewing-history title.
///
/// Titles with at least three colon-separated segments are treated as
/// series episodes (`Base: Season marker: Episode`), everything else as a
/// movie. `Unparseable` is the fallback for degenerate input and is stored
/// as a movie-like entity with an unknown kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedTitle {
    Movie {
        title: String,
    },
    SeriesEpisode {
        full_title: String,
        base_title: String,
        season_number: Option<i32>,
        episode_fragment: String,
    },
    Unparseable {
        raw_title: String,
    },
}

impl ParsedTitle {
    /// The exact string the catalog dedups on. For series this is the full
    /// episode title, never the base title.
    #[must_use]
    pub fn matching_title(&self) -> &str {
        match self {
            Self::Movie { title } => title,
            Self::SeriesEpisode { full_title, .. } => full_title,
            Self::Unparseable { raw_title } => raw_title,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> MediaKind {
        match self {
            Self::Movie { .. } => MediaKind::Movie,
            Self::SeriesEpisode { .. } => MediaKind::SeriesEpisode,
            Self::Unparseable { .. } => MediaKind::Unknown,
        }
    }

    #[must_use]
    pub fn base_title(&self) -> Option<&str> {
        match self {
            Self::SeriesEpisode { base_title, .. } => Some(base_title),
            _ => None,
        }
    }

    #[must_use]
    pub const fn season_number(&self) -> Option<i32> {
        match self {
            Self::SeriesEpisode { season_number, .. } => *season_number,
            _ => None,
        }
    }

    /// Query string handed to the metadata enricher: the series name when
    /// one was extracted, the whole title otherwise.
    #[must_use]
    pub fn enrichment_query(&self) -> &str {
        match self {
            Self::Movie { title } => title,
            Self::SeriesEpisode { base_title, .. } => base_title,
            Self::Unparseable { raw_title } => raw_title,
        }
    }
}

/// Colon-format title classifier. Season markers are localized and come
/// from configuration, so the keyword regex is compiled per instance.
pub struct TitleParser {
    keyword_re: Option<Regex>,
}

impl TitleParser {
    #[must_use]
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            keyword_re: build_keyword_regex(&config.season_keywords),
        }
    }

    #[must_use]
    pub fn parse(&self, raw: &str) -> ParsedTitle {
        let trimmed = raw.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();

        if parts.len() < 3 {
            return ParsedTitle::Movie {
                title: trimmed.to_string(),
            };
        }

        let base = parts[0].trim();
        if base.is_empty() {
            return ParsedTitle::Unparseable {
                raw_title: trimmed.to_string(),
            };
        }

        ParsedTitle::SeriesEpisode {
            full_title: trimmed.to_string(),
            base_title: base.to_string(),
            season_number: self.extract_season(parts[1]),
            episode_fragment: parts[2..].join(":").trim().to_string(),
        }
    }

    fn extract_season(&self, segment: &str) -> Option<i32> {
        if let Some(re) = &self.keyword_re
            && let Some(caps) = re.captures(segment)
            && let Some(m) = caps.get(1)
            && let Ok(n) = m.as_str().parse()
        {
            return Some(n);
        }

        // Markers like "Limited Series" or "Part One" carry no digits and
        // intentionally end up with no season.
        standalone_int_re()
            .captures(segment)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

fn build_keyword_regex(keywords: &[String]) -> Option<Regex> {
    let alternation = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");

    if alternation.is_empty() {
        return None;
    }

    Regex::new(&format!(r"(?i)\b(?:{alternation})\s*(\d{{1,4}})\b")).ok()
}

fn standalone_int_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,4})\b").expect("Invalid regex pattern defined in code")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> TitleParser {
        TitleParser::new(&ParserConfig::default())
    }

    #[test]
    fn test_series_episode() {
        let parsed = parser().parse("Arcane: Season 2: Chapter One");
        assert_eq!(
            parsed,
            ParsedTitle::SeriesEpisode {
                full_title: "Arcane: Season 2: Chapter One".to_string(),
                base_title: "Arcane".to_string(),
                season_number: Some(2),
                episode_fragment: "Chapter One".to_string(),
            }
        );
        assert_eq!(parsed.kind(), MediaKind::SeriesEpisode);
    }

    #[test]
    fn test_movie() {
        let parsed = parser().parse("KPop Demon Hunters");
        assert_eq!(
            parsed,
            ParsedTitle::Movie {
                title: "KPop Demon Hunters".to_string()
            }
        );
        assert_eq!(parsed.kind(), MediaKind::Movie);
    }

    #[test]
    fn test_two_segment_title_is_a_movie() {
        let parsed = parser().parse("Glass Onion: A Knives Out Mystery");
        assert_eq!(
            parsed.matching_title(),
            "Glass Onion: A Knives Out Mystery"
        );
        assert_eq!(parsed.kind(), MediaKind::Movie);
    }

    #[test]
    fn test_localized_season_markers() {
        let p = parser();
        assert_eq!(
            p.parse("Arcane: Staffel 2: Töten ist ein Kreislauf").season_number(),
            Some(2)
        );
        assert_eq!(p.parse("Dark: Temporada 3: Deja Vu").season_number(), Some(3));
        assert_eq!(p.parse("Lupin: Saison 2: Chapitre 6").season_number(), Some(2));
    }

    #[test]
    fn test_ambiguous_marker_has_no_season() {
        let parsed = parser().parse("X: Limited Series: Part One");
        assert_eq!(parsed.season_number(), None);
        assert_eq!(parsed.kind(), MediaKind::SeriesEpisode);
        assert_eq!(parsed.base_title(), Some("X"));
    }

    #[test]
    fn test_standalone_integer_fallback() {
        let parsed = parser().parse("Stranger Things: 4: Chapter One");
        assert_eq!(parsed.season_number(), Some(4));
    }

    #[test]
    fn test_episode_fragment_keeps_inner_colons() {
        let parsed = parser().parse("Show: Season 1: Part 2: The End");
        match parsed {
            ParsedTitle::SeriesEpisode {
                episode_fragment, ..
            } => assert_eq!(episode_fragment, "Part 2: The End"),
            other => panic!("expected series episode, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_base_is_unparseable() {
        let parsed = parser().parse(": Season 2: Chapter One");
        assert_eq!(parsed.kind(), MediaKind::Unknown);
        assert_eq!(parsed.matching_title(), ": Season 2: Chapter One");
    }

    #[test]
    fn test_outer_whitespace_trimmed_only() {
        let parsed = parser().parse("  Arcane: Season 2: Chapter One  ");
        assert_eq!(parsed.matching_title(), "Arcane: Season 2: Chapter One");
    }

    #[test]
    fn test_deterministic() {
        let p = parser();
        for raw in [
            "Arcane: Season 2: Chapter One",
            "KPop Demon Hunters",
            ": Season 2: X",
            "X: Limited Series: Part One",
        ] {
            assert_eq!(p.parse(raw), p.parse(raw));
        }
    }

    #[test]
    fn test_enrichment_query_uses_base_title() {
        let p = parser();
        assert_eq!(
            p.parse("Arcane: Season 2: Chapter One").enrichment_query(),
            "Arcane"
        );
        assert_eq!(p.parse("KPop Demon Hunters").enrichment_query(), "KPop Demon Hunters");
    }
}
