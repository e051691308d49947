//! Query expansion vocabulary
//!
//! Static synonym bundles used by the query expander: abbreviation → full
//! names (Bangla + English), Banglish ↔ Bangla term pairs, intent-driven
//! keyword bundles and triggered semantic equivalences. Latin-script keys are
//! matched on word boundaries; Bengali keys by substring.

use bhorti_core::Intent;

/// One synonym bundle: when `key` appears in the query, `expansions` are
/// appended (deduplicated) to the expanded query.
pub struct SynonymBundle {
    pub key: &'static str,
    pub expansions: &'static [&'static str],
}

/// Abbreviations and common admission terms with their expansions.
pub static SYNONYM_BUNDLES: &[SynonymBundle] = &[
    // University abbreviations → Bangla + English full names.
    SynonymBundle {
        key: "du",
        expansions: &["ঢাকা বিশ্ববিদ্যালয়", "Dhaka University", "ঢাবি"],
    },
    SynonymBundle {
        key: "ru",
        expansions: &["রাজশাহী বিশ্ববিদ্যালয়", "Rajshahi University", "রাবি"],
    },
    SynonymBundle {
        key: "cu",
        expansions: &["চট্টগ্রাম বিশ্ববিদ্যালয়", "Chittagong University", "চবি"],
    },
    SynonymBundle {
        key: "ku",
        expansions: &["খুলনা বিশ্ববিদ্যালয়", "Khulna University", "খুবি"],
    },
    SynonymBundle {
        key: "ju",
        expansions: &["জাহাঙ্গীরনগর বিশ্ববিদ্যালয়", "Jahangirnagar University", "জাবি"],
    },
    SynonymBundle {
        key: "jnu",
        expansions: &["জগন্নাথ বিশ্ববিদ্যালয়", "Jagannath University", "জবি"],
    },
    SynonymBundle {
        key: "buet",
        expansions: &["বুয়েট", "Bangladesh University of Engineering and Technology"],
    },
    SynonymBundle {
        key: "kuet",
        expansions: &["কুয়েট", "Khulna University of Engineering and Technology"],
    },
    SynonymBundle {
        key: "ruet",
        expansions: &["রুয়েট", "Rajshahi University of Engineering and Technology"],
    },
    SynonymBundle {
        key: "cuet",
        expansions: &["চুয়েট", "Chittagong University of Engineering and Technology"],
    },
    SynonymBundle {
        key: "sust",
        expansions: &["শাহজালাল বিজ্ঞান ও প্রযুক্তি বিশ্ববিদ্যালয়", "শাবিপ্রবি"],
    },
    SynonymBundle {
        key: "cou",
        expansions: &["কুমিল্লা বিশ্ববিদ্যালয়", "কুবি", "Comilla University"],
    },
    SynonymBundle {
        key: "gst",
        expansions: &["গুচ্ছ ভর্তি", "guccho admission"],
    },
    // Bengali institution names → abbreviations, so dense retrieval also sees
    // the tag forms used inside passages.
    SynonymBundle {
        key: "ঢাবি",
        expansions: &["ঢাকা বিশ্ববিদ্যালয়", "DU"],
    },
    SynonymBundle {
        key: "চবি",
        expansions: &["চট্টগ্রাম বিশ্ববিদ্যালয়", "CU"],
    },
    SynonymBundle {
        key: "রাবি",
        expansions: &["রাজশাহী বিশ্ববিদ্যালয়", "RU"],
    },
    SynonymBundle {
        key: "খুবি",
        expansions: &["খুলনা বিশ্ববিদ্যালয়", "KU"],
    },
    SynonymBundle {
        key: "জাবি",
        expansions: &["জাহাঙ্গীরনগর বিশ্ববিদ্যালয়", "JU"],
    },
    SynonymBundle {
        key: "জবি",
        expansions: &["জগন্নাথ বিশ্ববিদ্যালয়", "JNU"],
    },
    SynonymBundle {
        key: "বুয়েট",
        expansions: &["BUET", "Bangladesh University of Engineering and Technology"],
    },
    // Banglish ↔ Bangla admission terms.
    SynonymBundle {
        key: "bhorti",
        expansions: &["ভর্তি", "admission"],
    },
    SynonymBundle {
        key: "admission",
        expansions: &["ভর্তি"],
    },
    SynonymBundle {
        key: "porikkha",
        expansions: &["পরীক্ষা", "exam"],
    },
    SynonymBundle {
        key: "exam",
        expansions: &["পরীক্ষা"],
    },
    SynonymBundle {
        key: "tarikh",
        expansions: &["তারিখ", "date"],
    },
    SynonymBundle {
        key: "kobe",
        expansions: &["কবে", "তারিখ"],
    },
    SynonymBundle {
        key: "fee",
        expansions: &["ফি", "আবেদন ফি", "টাকা"],
    },
    SynonymBundle {
        key: "ফি",
        expansions: &["আবেদন ফি", "fee"],
    },
    SynonymBundle {
        key: "seat",
        expansions: &["আসন", "আসন সংখ্যা"],
    },
    SynonymBundle {
        key: "আসন",
        expansions: &["আসন সংখ্যা", "seat"],
    },
    SynonymBundle {
        key: "circular",
        expansions: &["বিজ্ঞপ্তি", "ভর্তি বিজ্ঞপ্তি"],
    },
    SynonymBundle {
        key: "apply",
        expansions: &["আবেদন", "আবেদন করা"],
    },
    SynonymBundle {
        key: "আবেদন",
        expansions: &["apply", "application"],
    },
    SynonymBundle {
        key: "result",
        expansions: &["ফলাফল"],
    },
    SynonymBundle {
        key: "unit",
        expansions: &["ইউনিট"],
    },
    SynonymBundle {
        key: "ইউনিট",
        expansions: &["unit"],
    },
    SynonymBundle {
        key: "varsity",
        expansions: &["বিশ্ববিদ্যালয়", "university"],
    },
    SynonymBundle {
        key: "admit",
        expansions: &["প্রবেশপত্র", "এডমিট কার্ড"],
    },
    SynonymBundle {
        key: "প্রবেশপত্র",
        expansions: &["admit card", "এডমিট"],
    },
    SynonymBundle {
        key: "website",
        expansions: &["ওয়েবসাইট", "লিংক"],
    },
    SynonymBundle {
        key: "syllabus",
        expansions: &["সিলেবাস", "মানবণ্টন"],
    },
    SynonymBundle {
        key: "সিলেবাস",
        expansions: &["syllabus", "মানবণ্টন"],
    },
    SynonymBundle {
        key: "gpa",
        expansions: &["জিপিএ", "পয়েন্ট"],
    },
    SynonymBundle {
        key: "জিপিএ",
        expansions: &["gpa", "গ্রেড পয়েন্ট"],
    },
    SynonymBundle {
        key: "quota",
        expansions: &["কোটা"],
    },
    SynonymBundle {
        key: "কোটা",
        expansions: &["quota", "সংরক্ষিত আসন"],
    },
    SynonymBundle {
        key: "ssc",
        expansions: &["এসএসসি", "মাধ্যমিক"],
    },
    SynonymBundle {
        key: "hsc",
        expansions: &["এইচএসসি", "উচ্চ মাধ্যমিক"],
    },
    SynonymBundle {
        key: "এসএসসি",
        expansions: &["ssc", "মাধ্যমিক"],
    },
    SynonymBundle {
        key: "এইচএসসি",
        expansions: &["hsc", "উচ্চ মাধ্যমিক"],
    },
    SynonymBundle {
        key: "deadline",
        expansions: &["শেষ তারিখ", "সময়সীমা"],
    },
    SynonymBundle {
        key: "সময়সীমা",
        expansions: &["deadline", "শেষ তারিখ"],
    },
];

/// Extra terms appended per intent, independent of any keyword trigger.
pub fn intent_expansion_terms(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Date => &[
            "সময়সূচী",
            "তারিখ",
            "আবেদনের শেষ তারিখ",
            "ভর্তি পরীক্ষার তারিখ",
        ],
        Intent::Fee => &["আবেদন ফি", "ফি", "টাকা"],
        Intent::Eligibility => &["যোগ্যতা", "আবেদনের যোগ্যতা", "জিপিএ"],
        Intent::Seat => &["আসন সংখ্যা", "আসন"],
        Intent::AdmitCard => &["প্রবেশপত্র", "ডাউনলোড"],
        Intent::Website => &["ওয়েবসাইট", "অনলাইনে আবেদন"],
        Intent::Exam => &["পরীক্ষা", "মানবণ্টন", "সিলেবাস"],
        Intent::General => &[],
    }
}

/// Triggered semantic equivalences: when `trigger` occurs, `equivalents` are
/// injected. Covers phrasing circulars use that students rarely type.
pub struct Equivalence {
    pub trigger: &'static str,
    pub equivalents: &'static [&'static str],
}

pub static EQUIVALENCES: &[Equivalence] = &[
    Equivalence {
        trigger: "মানবিক",
        equivalents: &["অ-বিজ্ঞান শাখা", "humanities"],
    },
    Equivalence {
        trigger: "বাণিজ্য",
        equivalents: &["ব্যবসায় শিক্ষা", "commerce"],
    },
    Equivalence {
        trigger: "বিজ্ঞান",
        equivalents: &["science", "বিজ্ঞান শাখা"],
    },
    Equivalence {
        trigger: "সেকেন্ড টাইম",
        equivalents: &["দ্বিতীয়বার", "second time"],
    },
    Equivalence {
        trigger: "second time",
        equivalents: &["দ্বিতীয়বার আবেদন", "সেকেন্ড টাইম"],
    },
];

/// Filler words ignored by the clarity check when counting substantive
/// tokens.
pub static FILLER_WORDS: &[&str] = &[
    "eta", "eita", "oita", "ki", "kno", "keno", "ta", "to", "hmm", "acha",
    "accha", "bhai", "apu", "please", "plz", "the", "a", "an", "is", "are",
    "what", "এটা", "ওটা", "কি", "কী", "তো", "হুম", "আচ্ছা", "ভাই", "আপু",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundles_nonempty() {
        for bundle in SYNONYM_BUNDLES {
            assert!(
                !bundle.expansions.is_empty(),
                "empty bundle for {}",
                bundle.key
            );
        }
    }

    #[test]
    fn test_confusables_expand_to_distinct_universities() {
        let ju = SYNONYM_BUNDLES.iter().find(|b| b.key == "ju").unwrap();
        let jnu = SYNONYM_BUNDLES.iter().find(|b| b.key == "jnu").unwrap();
        assert!(ju.expansions.contains(&"জাহাঙ্গীরনগর বিশ্ববিদ্যালয়"));
        assert!(jnu.expansions.contains(&"জগন্নাথ বিশ্ববিদ্যালয়"));
        assert!(!ju.expansions.iter().any(|e| e.contains("জগন্নাথ")));
    }

    #[test]
    fn test_intent_terms_for_date() {
        let terms = intent_expansion_terms(Intent::Date);
        assert!(terms.contains(&"ভর্তি পরীক্ষার তারিখ"));
        assert!(intent_expansion_terms(Intent::General).is_empty());
    }

    #[test]
    fn test_humanities_equivalence_present() {
        let eq = EQUIVALENCES
            .iter()
            .find(|e| e.trigger == "মানবিক")
            .unwrap();
        assert!(eq.equivalents.contains(&"অ-বিজ্ঞান শাখা"));
    }
}
