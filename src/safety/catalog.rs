//! Disallowed-content pattern catalog.
//!
//! The catalog is plain data: an ordered slice of [`CatalogEntry`] values,
//! each naming a semantic [`ContentCategory`] and a word-boundary anchored
//! regex. It is compiled once per process into a [`CompiledCatalog`] and is
//! never mutated afterwards, so every validation call can share it freely.
//!
//! Patterns are written against *match-normalized* text (lowercase ASCII
//! letters, digits and spaces, look-alikes already substituted, repeated
//! letters already collapsed). Several entries still tolerate repeats and
//! digit look-alikes so they stay correct if fed less-normalized text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::RegexSet;

use ContentCategory::{Discriminatory, HateReference, Profanity, RacialSlur, Sexual};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// What kind of disallowed content an entry targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentCategory {
    /// General profanity and vulgar insults.
    Profanity,
    /// Racial or ethnic slurs.
    RacialSlur,
    /// Slurs targeting sexuality, gender identity or disability.
    Discriminatory,
    /// Sexual content.
    Sexual,
    /// Hate symbols, numeric codes and extremist references.
    HateReference,
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Profanity => "profanity",
            Self::RacialSlur => "racial_slur",
            Self::Discriminatory => "discriminatory",
            Self::Sexual => "sexual",
            Self::HateReference => "hate_reference",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One declarative catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Short snake_case identifier, safe to log.
    pub name: &'static str,
    /// Category reported when this entry matches.
    pub category: ContentCategory,
    /// Regex source, compiled by [`CompiledCatalog::compile`].
    pub pattern: &'static str,
}

const fn entry(
    name: &'static str,
    category: ContentCategory,
    pattern: &'static str,
) -> CatalogEntry {
    CatalogEntry {
        name,
        category,
        pattern,
    }
}

/// The built-in catalog, in match order.
pub static ENTRIES: &[CatalogEntry] = &[
    // Common profanity
    entry("f_word", Profanity, r"\b[f]+[u]+[c]+[k]+\w*\b"),
    entry("s_word", Profanity, r"\b[s]+[h]+[i]+[t]+\w*\b"),
    entry("b_word", Profanity, r"\b[b]+[i]+[t]+[c]+[h]+\w*\b"),
    entry("a_word", Profanity, r"\ba[s]+[s]+(?:hole)?\w*\b"),
    entry("d_word", Profanity, r"\bd[i]+[c]+[k]+\w*\b"),
    entry("p_word", Profanity, r"\bp[i]+[s]+[s]+\w*\b"),
    entry("c_word", Profanity, r"\bc[u]+[n]+[t]+\w*\b"),
    // Racial and ethnic slurs
    entry("n_slur", RacialSlur, r"\bn[i1]+[g]+[e3]+[r]+\w*\b"),
    entry("k_slur", RacialSlur, r"\bk[i1]+[k]+[e3]*\w*\b"),
    entry("w_slur", RacialSlur, r"\bw[e3]+tb[a4]+[c]+[k]+\w*\b"),
    entry("ch_slur", RacialSlur, r"\b[c]+h[i1]+n[k]+\w*\b"),
    entry("g_slur", RacialSlur, r"\bg[o0]+[o0]+[k]+\w*\b"),
    entry("sp_slur", RacialSlur, r"\b[s]+p[i1]+[c]+\w*\b"),
    entry("spa_slur", RacialSlur, r"\b[s]+p[a4]+[d]+[e3]+\w*\b"),
    entry("r_slur", RacialSlur, r"\br[a4]+gh[e3]+[a4]+d\w*\b"),
    entry("kr_slur", RacialSlur, r"\bk[r]+[a4]+[u]+t\w*\b"),
    entry("d_slur", RacialSlur, r"\b[d]+[a4]+[g]+[o0]+\w*\b"),
    // Discriminatory terms
    entry("f_slur", Discriminatory, r"\bf[a4]+[g]+[o0]*[t]*\w*\b"),
    entry("dy_slur", Discriminatory, r"\bd[y]+k[e3]+\w*\b"),
    entry("re_slur", Discriminatory, r"\br[e3]+[t]+[a4]+rd\w*\b"),
    entry("tr_slur", Discriminatory, r"\btr[a4]+nn[y]+\w*\b"),
    // Sexual content
    entry("porn", Sexual, r"\b[p]+[o0]+rn\w*\b"),
    entry("rape", Sexual, r"\br[a4]+p[e3]+[d]*\w*\b"),
    entry("sex", Sexual, r"\b[s]+[e3]+x+[y]*\w*\b"),
    entry("nude", Sexual, r"\b[n]+[u]+d[e3]+\w*\b"),
    entry("penis", Sexual, r"\b[p]+[e3]+n[i1]+[s]+\w*\b"),
    entry("vag", Sexual, r"\b[v]+[a4]+g\w*\b"),
    entry("boobs", Sexual, r"\bb[o0]+[o0]+b[s]+\w*\b"),
    entry("horny", Sexual, r"\bh[o0]+rn[y]+\w*\b"),
    entry("orgy", Sexual, r"\b[o0]+rg[y]+\w*\b"),
    // Additional profanity
    entry("wh_word", Profanity, r"\b[w]+h[o0]+r[e3]+\w*\b"),
    entry("sl_word", Profanity, r"\bsl[u]+t+\w*\b"),
    entry("ba_word", Profanity, r"\bb[a4]+st[a4]+rd\w*\b"),
    entry("do_word", Profanity, r"\bd[o0]+[u]+[c]+h[e3]+\w*\b"),
    entry("tw_word", Profanity, r"\bt[w]+[a4]+t+\w*\b"),
    // Look-alike spellings
    entry("d_word_digit", Profanity, r"\b[d]+[1i]+[c]+[k]+\w*\b"),
    entry("f_word_ph", Profanity, r"\b[p]+[h]+[u]+[k]+\w*\b"),
    entry("f_slur_ph", Discriminatory, r"\b[p]+[h]+[a4]+[g]+\w*\b"),
    entry("n_slur_short", RacialSlur, r"\bn[1i]+[g]+[a4]+\w*\b"),
    entry("sex_digit", Sexual, r"\b[s]+3x\w*\b"),
    // Hate symbols and numeric codes
    entry("code_1488", HateReference, r"\b1488\b"),
    entry("code_88", HateReference, r"\b88\b"),
    entry("code_wp", HateReference, r"\bwp\b"),
    entry("kkk_repeat", HateReference, r"\b[k]+[k]+[k]+\w*\b"),
    // Extremist references
    entry("kkk", HateReference, r"\bkkk\w*\b"),
    entry("nazi", HateReference, r"\bn[a4]+z[1i]+\w*\b"),
    entry("fascist", HateReference, r"\bf[a4]+[s]+c[1i]+[s]+[t]+\w*\b"),
    entry("hitler", HateReference, r"\bh[1i]+tl[e3]+r\w*\b"),
    // Circumvention spellings
    entry("n_slur_stem", RacialSlur, r"\b[n]+[1i]+[g]+\w*\b"),
    entry("f_word_v", Profanity, r"\b[f]+[v]+[c]+[k]+\w*\b"),
    entry("sex_double_x", Sexual, r"\b[s]+[e3]+[x]+[x]+\w*\b"),
    entry("porno", Sexual, r"\b[p]+[o0]+[r]+[n]+[o0]+\w*\b"),
];

// ---------------------------------------------------------------------------
// Compiled catalog
// ---------------------------------------------------------------------------

/// A catalog entry that matched some text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogMatch {
    /// Name of the first entry (in catalog order) that matched.
    pub name: &'static str,
    /// Category of that entry.
    pub category: ContentCategory,
}

/// Compiled form of a catalog, ready for matching.
///
/// A single `RegexSet` answers "does anything match, and which entries"
/// in one scan, so clean text costs one pass regardless of catalog size.
pub struct CompiledCatalog {
    set: RegexSet,
    entries: &'static [CatalogEntry],
}

impl CompiledCatalog {
    /// Compile `entries` into a matcher.
    pub fn compile(entries: &'static [CatalogEntry]) -> Result<Self, regex::Error> {
        let set = RegexSet::new(entries.iter().map(|e| e.pattern))?;
        Ok(Self { set, entries })
    }

    /// Return the first entry, in catalog order, that matches `text`.
    pub fn first_match(&self, text: &str) -> Option<CatalogMatch> {
        self.set
            .matches(text)
            .iter()
            .next()
            .map(|idx| CatalogMatch {
                name: self.entries[idx].name,
                category: self.entries[idx].category,
            })
    }

    /// Number of entries in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compile each entry on its own and return the ones that fail.
    #[cfg(test)]
    fn invalid_entries(entries: &[CatalogEntry]) -> Vec<(&'static str, String)> {
        entries
            .iter()
            .filter_map(|e| {
                regex::Regex::new(e.pattern)
                    .err()
                    .map(|err| (e.name, err.to_string()))
            })
            .collect()
    }
}

/// The process-wide compiled built-in catalog.
pub static CATALOG: Lazy<CompiledCatalog> = Lazy::new(|| {
    CompiledCatalog::compile(ENTRIES).expect("static catalog patterns must compile")
});

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
