//! University detection and filter rule tables
//!
//! One ordered rule per institution. Bengali matching is substring-based —
//! word-boundary regex is unreliable for Bengali script because `\b` operates
//! on ASCII word characters — while English/Banglish abbreviations use
//! word-boundary regexes so `ku` never fires inside `kuet`.
//!
//! Rule order matters twice:
//! - detection walks the table top to bottom, so longer/more specific
//!   abbreviations (`kuet`, `cuet`, `ruet`, `jnu`, `duet`, `butex`) are
//!   declared before their confusable prefixes (`ku`, `cu`, `ru`, `ju`,
//!   `du`, `bu`);
//! - the first detected entity drives single-entity filtering.
//!
//! Filter rules disambiguate the classic confusable pairs:
//! KU ≠ KUET, JU ≠ JNU, RU ≠ RUET, CU ≠ CUET.

use once_cell::sync::Lazy;
use regex::Regex;

/// Institution family, used by the not-found responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstitutionCategory {
    Engineering,
    GeneralPublic,
    SciTech,
    Medical,
    Agricultural,
    GstCluster,
    Private,
    Coaching,
}

/// A single detection rule.
pub struct UniversityRule {
    /// Lowercase abbreviation; the canonical entity key.
    pub abbrev: &'static str,
    pub full_name: &'static str,
    /// Bengali substrings that identify this institution.
    pub bengali_markers: &'static [&'static str],
    /// Word-boundary regex over the raw query for English/Banglish mentions.
    pub english_pattern: &'static str,
    pub category: InstitutionCategory,
}

/// Abbreviation reserved for the coaching brand; the strict filter returns
/// empty for it so the controller can emit the canned response.
pub const COACHING_ABBREV: &str = "udvash";

/// Ordered detection table. Longer abbreviations precede their prefixes.
pub static UNIVERSITY_RULES: &[UniversityRule] = &[
    // --- Engineering universities (specific before general) ---
    UniversityRule {
        abbrev: "buet",
        full_name: "Bangladesh University of Engineering and Technology (BUET)",
        bengali_markers: &["বুয়েট", "বাংলাদেশ প্রকৌশল বিশ্ববিদ্যালয়"],
        english_pattern: r"(?i)\b(buet|bangladesh university of engineering)\b",
        category: InstitutionCategory::Engineering,
    },
    UniversityRule {
        abbrev: "kuet",
        full_name: "Khulna University of Engineering and Technology (KUET)",
        bengali_markers: &["কুয়েট", "খুলনা প্রকৌশল"],
        english_pattern: r"(?i)\b(kuet|khulna university of engineering)\b",
        category: InstitutionCategory::Engineering,
    },
    UniversityRule {
        abbrev: "ruet",
        full_name: "Rajshahi University of Engineering and Technology (RUET)",
        bengali_markers: &["রুয়েট", "রাজশাহী প্রকৌশল"],
        english_pattern: r"(?i)\b(ruet|rajshahi university of engineering)\b",
        category: InstitutionCategory::Engineering,
    },
    UniversityRule {
        abbrev: "cuet",
        full_name: "Chittagong University of Engineering and Technology (CUET)",
        bengali_markers: &["চুয়েট", "চট্টগ্রাম প্রকৌশল"],
        english_pattern: r"(?i)\b(cuet|chittagong university of engineering)\b",
        category: InstitutionCategory::Engineering,
    },
    UniversityRule {
        abbrev: "duet",
        full_name: "Dhaka University of Engineering and Technology (DUET)",
        bengali_markers: &["ডুয়েট", "ঢাকা প্রকৌশল ও প্রযুক্তি"],
        english_pattern: r"(?i)\b(duet|dhaka university of engineering)\b",
        category: InstitutionCategory::Engineering,
    },
    UniversityRule {
        abbrev: "butex",
        full_name: "Bangladesh University of Textiles (BUTEX)",
        bengali_markers: &["বুটেক্স", "টেক্সটাইল বিশ্ববিদ্যালয়"],
        english_pattern: r"(?i)\b(butex|bangladesh university of textiles)\b",
        category: InstitutionCategory::Engineering,
    },
    UniversityRule {
        abbrev: "mist",
        full_name: "Military Institute of Science and Technology (MIST)",
        bengali_markers: &["এমআইএসটি", "মিলিটারি ইনস্টিটিউট"],
        english_pattern: r"(?i)\b(mist|military institute of science)\b",
        category: InstitutionCategory::Engineering,
    },
    // --- Confusable pair: জগন্নাথ (JNU) before জাহাঙ্গীরনগর (JU) ---
    UniversityRule {
        abbrev: "jnu",
        full_name: "Jagannath University (JNU)",
        bengali_markers: &["জগন্নাথ বিশ্ববিদ্যালয়", "জগন্নাথ", "জবি"],
        english_pattern: r"(?i)\b(jnu|jagannath university|jagannath)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    UniversityRule {
        abbrev: "ju",
        full_name: "Jahangirnagar University (JU)",
        bengali_markers: &["জাহাঙ্গীরনগর বিশ্ববিদ্যালয়", "জাহাঙ্গীরনগর", "জাবি"],
        english_pattern: r"(?i)\b(ju|jahangirnagar university|jahangirnagar)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    // --- General public universities ---
    UniversityRule {
        abbrev: "du",
        full_name: "University of Dhaka (DU)",
        bengali_markers: &["ঢাকা বিশ্ববিদ্যালয়", "ঢাবি"],
        english_pattern: r"(?i)\b(du|dhaka university|university of dhaka)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    UniversityRule {
        abbrev: "ru",
        full_name: "University of Rajshahi (RU)",
        bengali_markers: &["রাজশাহী বিশ্ববিদ্যালয়", "রাবি"],
        english_pattern: r"(?i)\b(ru|rajshahi university|university of rajshahi)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    UniversityRule {
        abbrev: "cu",
        full_name: "University of Chittagong (CU)",
        bengali_markers: &["চট্টগ্রাম বিশ্ববিদ্যালয়", "চবি"],
        english_pattern: r"(?i)\b(cu|chittagong university|university of chittagong)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    UniversityRule {
        abbrev: "ku",
        full_name: "Khulna University (KU)",
        bengali_markers: &["খুলনা বিশ্ববিদ্যালয়", "খুবি"],
        english_pattern: r"(?i)\b(ku|khulna university)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    UniversityRule {
        abbrev: "cou",
        full_name: "Comilla University (COU)",
        bengali_markers: &["কুমিল্লা বিশ্ববিদ্যালয়", "কুবি"],
        english_pattern: r"(?i)\b(cou|comilla university|cumilla university)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    UniversityRule {
        abbrev: "bu",
        full_name: "University of Barishal (BU)",
        bengali_markers: &["বরিশাল বিশ্ববিদ্যালয়", "ববি"],
        english_pattern: r"(?i)\b(bu|barishal university|university of barishal)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    UniversityRule {
        abbrev: "iu",
        full_name: "Islamic University, Kushtia (IU)",
        bengali_markers: &["ইসলামী বিশ্ববিদ্যালয়", "ইবি"],
        english_pattern: r"(?i)\b(iu|islamic university)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    UniversityRule {
        abbrev: "bup",
        full_name: "Bangladesh University of Professionals (BUP)",
        bengali_markers: &["বাংলাদেশ প্রফেশনালস", "বিইউপি"],
        english_pattern: r"(?i)\b(bup|university of professionals)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    UniversityRule {
        abbrev: "nu",
        full_name: "National University (NU)",
        bengali_markers: &["জাতীয় বিশ্ববিদ্যালয়"],
        english_pattern: r"(?i)\b(nu|national university)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    // --- Science & technology universities ---
    UniversityRule {
        abbrev: "sust",
        full_name: "Shahjalal University of Science and Technology (SUST)",
        bengali_markers: &["শাহজালাল বিজ্ঞান ও প্রযুক্তি", "শাবিপ্রবি", "শাবি"],
        english_pattern: r"(?i)\b(sust|shahjalal university)\b",
        category: InstitutionCategory::SciTech,
    },
    UniversityRule {
        abbrev: "nstu",
        full_name: "Noakhali Science and Technology University (NSTU)",
        bengali_markers: &["নোয়াখালী বিজ্ঞান", "নোবিপ্রবি"],
        english_pattern: r"(?i)\b(nstu|noakhali science)\b",
        category: InstitutionCategory::SciTech,
    },
    UniversityRule {
        abbrev: "just",
        full_name: "Jashore University of Science and Technology (JUST)",
        bengali_markers: &["যশোর বিজ্ঞান", "যবিপ্রবি"],
        english_pattern: r"(?i)\b(just|jashore university)\b",
        category: InstitutionCategory::SciTech,
    },
    UniversityRule {
        abbrev: "pust",
        full_name: "Pabna University of Science and Technology (PUST)",
        bengali_markers: &["পাবনা বিজ্ঞান", "পাবিপ্রবি"],
        english_pattern: r"(?i)\b(pust|pabna university)\b",
        category: InstitutionCategory::SciTech,
    },
    UniversityRule {
        abbrev: "mbstu",
        full_name: "Mawlana Bhashani Science and Technology University (MBSTU)",
        bengali_markers: &["মাওলানা ভাসানী", "মাভাবিপ্রবি"],
        english_pattern: r"(?i)\b(mbstu|mawlana bhashani)\b",
        category: InstitutionCategory::SciTech,
    },
    UniversityRule {
        abbrev: "pstu",
        full_name: "Patuakhali Science and Technology University (PSTU)",
        bengali_markers: &["পটুয়াখালী বিজ্ঞান", "পবিপ্রবি"],
        english_pattern: r"(?i)\b(pstu|patuakhali science)\b",
        category: InstitutionCategory::SciTech,
    },
    UniversityRule {
        abbrev: "hstu",
        full_name: "Hajee Mohammad Danesh Science and Technology University (HSTU)",
        bengali_markers: &["হাজী মোহাম্মদ দানেশ", "হাবিপ্রবি"],
        english_pattern: r"(?i)\b(hstu|hajee mohammad danesh)\b",
        category: InstitutionCategory::SciTech,
    },
    UniversityRule {
        abbrev: "brur",
        full_name: "Begum Rokeya University, Rangpur (BRUR)",
        bengali_markers: &["বেগম রোকেয়া", "বেরোবি"],
        english_pattern: r"(?i)\b(brur|begum rokeya)\b",
        category: InstitutionCategory::SciTech,
    },
    UniversityRule {
        abbrev: "bsmrstu",
        full_name: "Bangabandhu Sheikh Mujibur Rahman Science and Technology University (BSMRSTU)",
        bengali_markers: &["গোপালগঞ্জ বিজ্ঞান", "বশেমুরবিপ্রবি"],
        english_pattern: r"(?i)\b(bsmrstu|gopalganj science)\b",
        category: InstitutionCategory::SciTech,
    },
    UniversityRule {
        abbrev: "jkkniu",
        full_name: "Jatiya Kabi Kazi Nazrul Islam University (JKKNIU)",
        bengali_markers: &["কাজী নজরুল ইসলাম বিশ্ববিদ্যালয়", "জাককানইবি"],
        english_pattern: r"(?i)\b(jkkniu|kazi nazrul islam university)\b",
        category: InstitutionCategory::SciTech,
    },
    UniversityRule {
        abbrev: "rmstu",
        full_name: "Rangamati Science and Technology University (RMSTU)",
        bengali_markers: &["রাঙ্গামাটি বিজ্ঞান", "রাবিপ্রবি"],
        english_pattern: r"(?i)\b(rmstu|rangamati science)\b",
        category: InstitutionCategory::SciTech,
    },
    UniversityRule {
        abbrev: "bsmrmu",
        full_name: "Bangabandhu Sheikh Mujibur Rahman Maritime University (BSMRMU)",
        bengali_markers: &["মেরিটাইম বিশ্ববিদ্যালয়"],
        english_pattern: r"(?i)\b(bsmrmu|maritime university)\b",
        category: InstitutionCategory::SciTech,
    },
    UniversityRule {
        abbrev: "bou",
        full_name: "Bangladesh Open University (BOU)",
        bengali_markers: &["উন্মুক্ত বিশ্ববিদ্যালয়", "বাউবি"],
        english_pattern: r"(?i)\b(bou|open university)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    UniversityRule {
        abbrev: "iau",
        full_name: "Islamic Arabic University (IAU)",
        bengali_markers: &["ইসলামি আরবি বিশ্ববিদ্যালয়", "ইসলামী আরবি বিশ্ববিদ্যালয়"],
        english_pattern: r"(?i)\b(iau|islamic arabic university)\b",
        category: InstitutionCategory::GeneralPublic,
    },
    // --- Private universities (abbreviations longer than their prefixes
    //     first: aiub before iub) ---
    UniversityRule {
        abbrev: "aiub",
        full_name: "American International University-Bangladesh (AIUB)",
        bengali_markers: &["আমেরিকান ইন্টারন্যাশনাল বিশ্ববিদ্যালয়"],
        english_pattern: r"(?i)\b(aiub|american international university)\b",
        category: InstitutionCategory::Private,
    },
    UniversityRule {
        abbrev: "iub",
        full_name: "Independent University, Bangladesh (IUB)",
        bengali_markers: &["ইন্ডিপেন্ডেন্ট বিশ্ববিদ্যালয়"],
        english_pattern: r"(?i)\b(iub|independent university)\b",
        category: InstitutionCategory::Private,
    },
    UniversityRule {
        abbrev: "nsu",
        full_name: "North South University (NSU)",
        bengali_markers: &["নর্থ সাউথ বিশ্ববিদ্যালয়", "নর্থ সাউথ"],
        english_pattern: r"(?i)\b(nsu|north south university)\b",
        category: InstitutionCategory::Private,
    },
    UniversityRule {
        abbrev: "bracu",
        full_name: "BRAC University (BRACU)",
        bengali_markers: &["ব্র্যাক বিশ্ববিদ্যালয়", "ব্র্যাক"],
        english_pattern: r"(?i)\b(bracu|brac university)\b",
        category: InstitutionCategory::Private,
    },
    UniversityRule {
        abbrev: "ewu",
        full_name: "East West University (EWU)",
        bengali_markers: &["ইস্ট ওয়েস্ট বিশ্ববিদ্যালয়"],
        english_pattern: r"(?i)\b(ewu|east west university)\b",
        category: InstitutionCategory::Private,
    },
    UniversityRule {
        abbrev: "uiu",
        full_name: "United International University (UIU)",
        bengali_markers: &["ইউনাইটেড ইন্টারন্যাশনাল বিশ্ববিদ্যালয়"],
        english_pattern: r"(?i)\b(uiu|united international university)\b",
        category: InstitutionCategory::Private,
    },
    UniversityRule {
        abbrev: "aust",
        full_name: "Ahsanullah University of Science and Technology (AUST)",
        bengali_markers: &["আহসানউল্লাহ বিজ্ঞান ও প্রযুক্তি"],
        english_pattern: r"(?i)\b(aust|ahsanullah university)\b",
        category: InstitutionCategory::Private,
    },
    // --- Medical ---
    UniversityRule {
        abbrev: "medical",
        full_name: "Medical and Dental Colleges (MBBS/BDS)",
        bengali_markers: &["মেডিকেল", "মেডিক্যাল", "এমবিবিএস", "ডেন্টাল", "মেডিকেল কলেজ"],
        english_pattern: r"(?i)\b(mbbs|bds|medical college|medical admission|dental)\b",
        category: InstitutionCategory::Medical,
    },
    // --- Agricultural cluster ---
    UniversityRule {
        abbrev: "agri",
        full_name: "Agricultural Universities Cluster (কৃষি গুচ্ছ)",
        bengali_markers: &["কৃষি গুচ্ছ", "কৃষি বিশ্ববিদ্যালয়", "বাকৃবি", "শেকৃবি"],
        english_pattern: r"(?i)\b(agri cluster|agricultural university|krishi guccho|bau|sau)\b",
        category: InstitutionCategory::Agricultural,
    },
    // --- GST cluster ---
    UniversityRule {
        abbrev: "gst",
        full_name: "GST Cluster Universities (গুচ্ছ ভর্তি)",
        bengali_markers: &["গুচ্ছ ভর্তি", "গুচ্ছ বিশ্ববিদ্যালয়", "জিএসটি"],
        english_pattern: r"(?i)\b(gst|guccho|cluster admission)\b",
        category: InstitutionCategory::GstCluster,
    },
    // --- Coaching brand (short-circuited before retrieval) ---
    UniversityRule {
        abbrev: COACHING_ABBREV,
        full_name: "UDVASH Academic & Admission Care",
        bengali_markers: &["উদ্ভাস", "উন্মেষ", "উদ্ভাস-উন্মেষ"],
        english_pattern: r"(?i)\b(udvash|unmesh)\b",
        category: InstitutionCategory::Coaching,
    },
];

/// A rule with its English regex compiled.
pub struct CompiledUniversityRule {
    pub rule: &'static UniversityRule,
    pub english: Regex,
}

/// Detection table with precompiled regexes, built once.
pub static COMPILED_UNIVERSITY_RULES: Lazy<Vec<CompiledUniversityRule>> = Lazy::new(|| {
    UNIVERSITY_RULES
        .iter()
        .map(|rule| CompiledUniversityRule {
            rule,
            english: Regex::new(rule.english_pattern).expect("invalid university pattern"),
        })
        .collect()
});

/// Queries about the coaching brand itself, answered without retrieval.
pub static COACHING_QUERY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"উদ্ভাস",
        r"উন্মেষ",
        r"(?i)\budvash\b",
        r"(?i)\bunmesh\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid coaching pattern"))
    .collect()
});

/// Post-retrieval inclusion/exclusion markers for one institution.
///
/// Markers are case-folded substrings checked against the lowercased passage
/// text; bracketed markers match the institution tag prepended at index time.
pub struct FilterRule {
    pub abbrev: &'static str,
    pub must_contain: &'static [&'static str],
    pub must_not_contain: &'static [&'static str],
}

pub static FILTER_RULES: &[FilterRule] = &[
    FilterRule {
        abbrev: "du",
        must_contain: &["ঢাকা বিশ্ববিদ্যালয়", "ঢাবি", "dhaka university", "university of dhaka", "[du]"],
        must_not_contain: &["ডুয়েট", "duet", "প্রকৌশল ও প্রযুক্তি"],
    },
    FilterRule {
        abbrev: "ru",
        must_contain: &["রাজশাহী বিশ্ববিদ্যালয়", "রাবি", "rajshahi university", "[রাজশাহী বিশ্ববিদ্যালয় ru]"],
        must_not_contain: &["রুয়েট", "ruet", "রাজশাহী প্রকৌশল"],
    },
    FilterRule {
        abbrev: "cu",
        must_contain: &["চট্টগ্রাম বিশ্ববিদ্যালয়", "চবি", "chittagong university", "university of chittagong"],
        must_not_contain: &["চুয়েট", "cuet", "চট্টগ্রাম প্রকৌশল"],
    },
    FilterRule {
        abbrev: "ku",
        must_contain: &["খুলনা বিশ্ববিদ্যালয়", "খুবি", "khulna university", "[খুলনা বিশ্ববিদ্যালয় ku]"],
        must_not_contain: &["কুয়েট", "kuet", "খুলনা প্রকৌশল", "engineering"],
    },
    FilterRule {
        abbrev: "ju",
        must_contain: &["জাহাঙ্গীরনগর", "জাবি", "jahangirnagar", "ju-admission"],
        must_not_contain: &["জগন্নাথ", "jagannath", "jnu"],
    },
    FilterRule {
        abbrev: "jnu",
        must_contain: &["জগন্নাথ", "জবি", "jagannath", "admission.jnu"],
        must_not_contain: &["জাহাঙ্গীরনগর", "jahangirnagar"],
    },
    FilterRule {
        abbrev: "buet",
        must_contain: &["বুয়েট", "buet", "বাংলাদেশ প্রকৌশল"],
        must_not_contain: &["বুটেক্স", "butex"],
    },
    FilterRule {
        abbrev: "kuet",
        must_contain: &["কুয়েট", "kuet", "খুলনা প্রকৌশল", "admission.kuet"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "ruet",
        must_contain: &["রুয়েট", "ruet", "রাজশাহী প্রকৌশল", "admission.ruet"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "cuet",
        must_contain: &["চুয়েট", "cuet", "চট্টগ্রাম প্রকৌশল", "admission.cuet"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "duet",
        must_contain: &["ডুয়েট", "duet", "ঢাকা প্রকৌশল"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "butex",
        must_contain: &["বুটেক্স", "butex", "টেক্সটাইল"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "mist",
        must_contain: &["এমআইএসটি", "mist", "মিলিটারি ইনস্টিটিউট"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "cou",
        must_contain: &["কুমিল্লা বিশ্ববিদ্যালয়", "কুবি", "comilla university", "cumilla university"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "bu",
        must_contain: &["বরিশাল বিশ্ববিদ্যালয়", "ববি", "barishal university"],
        must_not_contain: &["বুয়েট", "buet", "বুটেক্স", "butex", "প্রফেশনালস", "bup"],
    },
    FilterRule {
        abbrev: "iu",
        must_contain: &["ইসলামী বিশ্ববিদ্যালয়", "ইবি", "islamic university"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "bup",
        must_contain: &["প্রফেশনালস", "বিইউপি", "bup"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "nu",
        must_contain: &["জাতীয় বিশ্ববিদ্যালয়", "national university"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "sust",
        must_contain: &["শাহজালাল", "শাবিপ্রবি", "sust", "shahjalal"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "nstu",
        must_contain: &["নোয়াখালী", "নোবিপ্রবি", "nstu", "noakhali"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "just",
        must_contain: &["যশোর", "যবিপ্রবি", "jashore", "jstu.edu"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "pust",
        must_contain: &["পাবনা", "পাবিপ্রবি", "pabna"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "mbstu",
        must_contain: &["মাওলানা ভাসানী", "মাভাবিপ্রবি", "mbstu", "bhashani"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "pstu",
        must_contain: &["পটুয়াখালী", "পবিপ্রবি", "pstu", "patuakhali"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "hstu",
        must_contain: &["দানেশ", "হাবিপ্রবি", "hstu", "danesh"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "brur",
        must_contain: &["বেগম রোকেয়া", "বেরোবি", "brur", "rokeya"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "bsmrstu",
        must_contain: &["গোপালগঞ্জ", "বশেমুরবিপ্রবি", "bsmrstu", "gopalganj"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "jkkniu",
        must_contain: &["কাজী নজরুল", "জাককানইবি", "jkkniu", "nazrul"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "rmstu",
        must_contain: &["রাঙ্গামাটি", "রাবিপ্রবি", "rmstu", "rangamati"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "bsmrmu",
        must_contain: &["মেরিটাইম", "bsmrmu", "maritime"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "bou",
        must_contain: &["উন্মুক্ত বিশ্ববিদ্যালয়", "বাউবি", "open university"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "iau",
        must_contain: &["আরবি বিশ্ববিদ্যালয়", "islamic arabic"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "aiub",
        must_contain: &["আমেরিকান ইন্টারন্যাশনাল", "aiub"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "iub",
        must_contain: &["ইন্ডিপেন্ডেন্ট", "independent university", "iub"],
        must_not_contain: &["aiub", "আমেরিকান"],
    },
    FilterRule {
        abbrev: "nsu",
        must_contain: &["নর্থ সাউথ", "north south", "nsu"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "bracu",
        must_contain: &["ব্র্যাক", "brac university", "bracu"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "ewu",
        must_contain: &["ইস্ট ওয়েস্ট", "east west", "ewu"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "uiu",
        must_contain: &["ইউনাইটেড ইন্টারন্যাশনাল", "united international", "uiu"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "aust",
        must_contain: &["আহসানউল্লাহ", "ahsanullah", "aust"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "medical",
        must_contain: &["মেডিকেল", "মেডিক্যাল", "এমবিবিএস", "mbbs", "dental", "ডেন্টাল", "dghs"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "agri",
        must_contain: &["কৃষি", "agricultural", "krishi", "acas.edu.bd"],
        must_not_contain: &[],
    },
    FilterRule {
        abbrev: "gst",
        must_contain: &["গুচ্ছ", "gst", "guccho", "gstadmission"],
        must_not_contain: &["কৃষি গুচ্ছ"],
    },
    // The coaching brand has no indexed corpus: every passage is rejected so
    // the strict filter yields empty and the canned response fires.
    FilterRule {
        abbrev: COACHING_ABBREV,
        must_contain: &[],
        must_not_contain: &[],
    },
];

/// Look up the detection rule for an abbreviation.
pub fn university_rule(abbrev: &str) -> Option<&'static UniversityRule> {
    UNIVERSITY_RULES.iter().find(|r| r.abbrev == abbrev)
}

/// Look up the filter rule for an abbreviation.
pub fn filter_rule(abbrev: &str) -> Option<&'static FilterRule> {
    FILTER_RULES.iter().find(|r| r.abbrev == abbrev)
}

/// Official website per institution, used in not-found guidance.
pub fn official_website(abbrev: &str) -> Option<&'static str> {
    match abbrev {
        "du" => Some("https://admission.eis.du.ac.bd"),
        "ru" => Some("https://admission.ru.ac.bd"),
        "cu" => Some("https://admission.cu.ac.bd"),
        "ku" => Some("https://admission.ku.ac.bd"),
        "ju" => Some("https://ju-admission.org"),
        "jnu" => Some("https://admission.jnu.ac.bd"),
        "buet" => Some("https://www.buet.ac.bd"),
        "kuet" => Some("https://admission.kuet.ac.bd"),
        "ruet" => Some("https://www.admission.ruet.ac.bd"),
        "cuet" => Some("https://www.cuet.ac.bd"),
        "duet" => Some("https://www.duet.ac.bd"),
        "butex" => Some("https://www.butex.edu.bd"),
        "mist" => Some("https://mist.ac.bd"),
        "cou" => Some("https://cou.ac.bd"),
        "bu" => Some("https://admission.eis.bu.ac.bd"),
        "iu" => Some("https://admission.iu.ac.bd"),
        "bup" => Some("https://admission.bup.edu.bd"),
        "nu" => Some("https://www.nu.ac.bd"),
        "sust" => Some("https://admission.sust.edu"),
        "nstu" => Some("https://admission.nstu.edu.bd"),
        "just" => Some("https://just.edu.bd"),
        "pust" => Some("https://admission.pust.ac.bd"),
        "mbstu" => Some("https://admission.mbstu.ac.bd"),
        "pstu" => Some("https://pstu.ac.bd"),
        "hstu" => Some("https://admission.hstu.ac.bd"),
        "brur" => Some("https://admission.brur.ac.bd"),
        "bsmrstu" => Some("https://bsmrstu.edu.bd"),
        "jkkniu" => Some("https://jkkniu.edu.bd"),
        "rmstu" => Some("https://rmstu.edu.bd"),
        "bsmrmu" => Some("https://bsmrmu.edu.bd"),
        "bou" => Some("https://www.bou.ac.bd"),
        "iau" => Some("https://iau.edu.bd"),
        "aiub" => Some("https://www.aiub.edu"),
        "iub" => Some("https://iub.ac.bd"),
        "nsu" => Some("http://www.northsouth.edu"),
        "bracu" => Some("https://www.bracu.ac.bd"),
        "ewu" => Some("https://www.ewubd.edu"),
        "uiu" => Some("https://www.uiu.ac.bd"),
        "aust" => Some("https://www.aust.edu"),
        "medical" => Some("https://dghs.gov.bd"),
        "agri" => Some("https://acas.edu.bd"),
        "gst" => Some("https://gstadmission.ac.bd"),
        COACHING_ABBREV => Some("https://udvash.com/HomePage"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_compile() {
        assert_eq!(COMPILED_UNIVERSITY_RULES.len(), UNIVERSITY_RULES.len());
    }

    #[test]
    fn test_specific_abbrevs_precede_prefixes() {
        let pos = |a: &str| {
            UNIVERSITY_RULES
                .iter()
                .position(|r| r.abbrev == a)
                .unwrap_or_else(|| panic!("missing rule {}", a))
        };
        assert!(pos("kuet") < pos("ku"));
        assert!(pos("cuet") < pos("cu"));
        assert!(pos("ruet") < pos("ru"));
        assert!(pos("duet") < pos("du"));
        assert!(pos("jnu") < pos("ju"));
        assert!(pos("buet") < pos("bu"));
        assert!(pos("butex") < pos("bu"));
    }

    #[test]
    fn test_word_boundary_keeps_ku_out_of_kuet() {
        let ku = COMPILED_UNIVERSITY_RULES
            .iter()
            .find(|c| c.rule.abbrev == "ku")
            .unwrap();
        assert!(!ku.english.is_match("kuet admission date"));
        assert!(ku.english.is_match("KU admission date"));
    }

    #[test]
    fn test_confusable_filters_exclude_each_other() {
        let ju = filter_rule("ju").unwrap();
        assert!(ju.must_not_contain.contains(&"জগন্নাথ"));
        let ku = filter_rule("ku").unwrap();
        assert!(ku.must_not_contain.contains(&"kuet"));
        let ru = filter_rule("ru").unwrap();
        assert!(ru.must_not_contain.contains(&"ruet"));
        let cu = filter_rule("cu").unwrap();
        assert!(cu.must_not_contain.contains(&"cuet"));
    }

    #[test]
    fn test_every_detection_rule_has_a_filter_rule() {
        for rule in UNIVERSITY_RULES {
            assert!(
                filter_rule(rule.abbrev).is_some(),
                "no filter rule for {}",
                rule.abbrev
            );
        }
    }

    #[test]
    fn test_coaching_patterns_match_brand_queries() {
        assert!(COACHING_QUERY_PATTERNS
            .iter()
            .any(|p| p.is_match("উদ্ভাস ব্যাচের সময় কখন?")));
        assert!(COACHING_QUERY_PATTERNS
            .iter()
            .any(|p| p.is_match("when does the udvash batch start")));
        assert!(!COACHING_QUERY_PATTERNS
            .iter()
            .any(|p| p.is_match("buet admission")));
    }

    #[test]
    fn test_official_websites_cover_notfound_categories() {
        assert!(official_website("medical").unwrap().contains("dghs"));
        assert!(official_website(COACHING_ABBREV).unwrap().contains("udvash.com"));
        assert!(official_website("gst").is_some());
    }
}
