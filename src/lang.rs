use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Headword / translation language. The pipeline only ever heads entries in
/// these two; pivot languages appear as dumps, not as entry languages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Ido
    #[default]
    Io,
    /// Esperanto
    Eo,
}

impl Lang {
    pub const fn long(self) -> &'static str {
        match self {
            Self::Io => "Ido",
            Self::Eo => "Esperanto",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::Eo => "eo",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Lang {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "io" => Ok(Self::Io),
            "eo" => Ok(Self::Eo),
            other => bail!("unknown language '{other}'. Choose between: io | eo"),
        }
    }
}

/// Language edition a dump comes from. Io and Eo dumps use the inline
/// translation style, En and Fr the template style.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DumpLang {
    Io,
    Eo,
    En,
    Fr,
}

impl DumpLang {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::Eo => "eo",
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    /// Names under which this edition writes its own language-section header.
    ///
    /// Example (io): `== {{io}} ==` or `== Ido ==`
    pub const fn section_names(self) -> &'static [&'static str] {
        match self {
            Self::Io => &["Ido"],
            Self::Eo => &["Esperanto"],
            Self::En => &["English"],
            Self::Fr => &["français", "Français"],
        }
    }
}

impl fmt::Display for DumpLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Part of speech. `Unknown` is allowed before morphology inference; the
/// POS-header parser and the inferencer are the only producers of the rest.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "kebab-case")]
pub enum Pos {
    Noun,
    Verb,
    Adjective,
    Adverb,
    ProperNoun,
    Pronoun,
    Preposition,
    Conjunction,
    Determiner,
    Interjection,
    Numeral,
    Other,
    #[default]
    Unknown,
}

impl Pos {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Noun => "noun",
            Self::Verb => "verb",
            Self::Adjective => "adjective",
            Self::Adverb => "adverb",
            Self::ProperNoun => "proper-noun",
            Self::Pronoun => "pronoun",
            Self::Preposition => "preposition",
            Self::Conjunction => "conjunction",
            Self::Determiner => "determiner",
            Self::Interjection => "interjection",
            Self::Numeral => "numeral",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }

    /// Map a POS subsection header to a `Pos`.
    ///
    /// Covers the English header names, the Ido/Esperanto ones (both editions
    /// use the same Romance-derived set), and the argument of the French
    /// `{{S|nom|io}}` header template.
    pub fn from_header(header: &str) -> Self {
        match header.trim().to_lowercase().as_str() {
            "noun" | "substantivo" | "nom" | "nom commun" => Self::Noun,
            "verb" | "verbo" | "verbe" => Self::Verb,
            "adjective" | "adjektivo" | "adjectif" => Self::Adjective,
            "adverb" | "adverbo" | "adverbe" => Self::Adverb,
            "proper noun" | "propra nomo" | "nomo propra" | "nom propre" => Self::ProperNoun,
            "pronoun" | "pronomo" | "pronom" => Self::Pronoun,
            "preposition" | "prepoziciono" | "prepozicio" | "préposition" => Self::Preposition,
            "conjunction" | "konjunciono" | "konjunkcio" | "conjonction" => Self::Conjunction,
            "determiner" | "determinanto" | "déterminant" | "article" => Self::Determiner,
            "interjection" | "interjeciono" | "interjekcio" => Self::Interjection,
            "numeral" | "number" | "numero" | "numeralo" | "adjectif numéral" => Self::Numeral,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lang_roundtrip() {
        assert_eq!("io".parse::<Lang>().unwrap(), Lang::Io);
        assert_eq!(Lang::Eo.to_string(), "eo");
        assert!("xx".parse::<Lang>().is_err());
    }

    #[test]
    fn pos_from_headers() {
        assert_eq!(Pos::from_header("Noun"), Pos::Noun);
        assert_eq!(Pos::from_header("Substantivo"), Pos::Noun);
        assert_eq!(Pos::from_header("nom"), Pos::Noun);
        assert_eq!(Pos::from_header("Propra nomo"), Pos::ProperNoun);
        assert_eq!(Pos::from_header("Mistero"), Pos::Unknown);
    }

    #[test]
    fn pos_serde_is_kebab() {
        let s = serde_json::to_string(&Pos::ProperNoun).unwrap();
        assert_eq!(s, "\"proper-noun\"");
    }
}
