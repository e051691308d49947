//! Prompt templates
//!
//! All LLM-facing text lives here: the counselor-voice grounded QA prompt,
//! the multi-entity comparative prompt, the fact filter, the query rewriter,
//! the decomposer and the index-time triple extractor. Few-shot examples are
//! kept in Bangla because the corpus and most questions are Bangla; the
//! models are instructed to answer in the language of the question.
//!
//! Builders return `(role, content)` pairs; the gateway layer converts them
//! to wire messages. Roles are `"system"`, `"user"`, `"assistant"`.

/// A prompt message before conversion to a wire type.
pub type PromptMessage = (&'static str, String);

/// Sentinel returned by the rewriter when it cannot improve the query.
pub const UNCLEAR_SENTINEL: &str = "UNCLEAR";

/// Canned Bengali not-found answer emitted by the grounded QA prompt.
pub const NOT_FOUND_ANSWER: &str =
    "দুঃখিত, আপনার প্রশ্নের সঠিক উত্তর দেওয়ার জন্য প্রয়োজনীয় তথ্য আমার কাছে নেই।";

/// Marker used for missing slots in comparative tables.
pub const SLOT_NOT_FOUND: &str = "তথ্য পাওয়া যায়নি";

// ---------------------------------------------------------------------------
// Grounded single-entity QA
// ---------------------------------------------------------------------------

const GROUNDED_QA_SYSTEM: &str = r#"You are a senior admission counselor answering questions about admission circulars of Bangladeshi universities. Answer ONLY from the provided passages.

CRITICAL RULES:
1. ONLY use information explicitly stated in the provided passages.
2. Passages are in ORDER OF RELEVANCE: prefer the first passage; use later ones only when the first does not answer.
3. ONLY use passages that mention the EXACT university in the question. জাহাঙ্গীরনগর বিশ্ববিদ্যালয় (JU) ≠ জগন্নাথ বিশ্ববিদ্যালয় (JNU). খুলনা বিশ্ববিদ্যালয় (KU) ≠ কুয়েট (KUET). Verify the university name before using a passage.
4. NEVER invent or guess dates, fees, deadlines or seat counts. Quote numbers VERBATIM from the passages. If the passages give only a RANGE, quote the range.
5. If the answer is not in the passages, reply with exactly: দুঃখিত, আপনার প্রশ্নের সঠিক উত্তর দেওয়ার জন্য প্রয়োজনীয় তথ্য আমার কাছে নেই।
6. Respond in the SAME LANGUAGE as the question; default to Bengali. Do not mix languages.
7. Speak like a calm counselor: short structured bullets, no greetings, no system talk, never JSON/XML.

Response format (both labels are REQUIRED):
Thought: [brief analysis of what the passages contain]
Answer: [the response in the question's language]"#;

const GROUNDED_QA_SHOT_USER: &str = r#"Passage: [কুমিল্লা বিশ্ববিদ্যালয় COU] কুমিল্লা বিশ্ববিদ্যালয়ে ২০২৫-২০২৬ শিক্ষাবর্ষে ১ম বর্ষ স্নাতক (সম্মান) শ্রেণিতে ভর্তির জন্য আবেদন আহ্বান করা যাচ্ছে। আবেদনের তারিখ: ২৭ নভেম্বর থেকে ৩১ ডিসেম্বর ২০২৫ পর্যন্ত।

Passage: [চট্টগ্রাম বিশ্ববিদ্যালয় CU] চট্টগ্রাম বিশ্ববিদ্যালয় D1 উপ-ইউনিট শিক্ষাবর্ষ: ২০২৫-২০২৬। ভর্তি পরীক্ষা: ৫ জানুয়ারি ২০২৬ (সোমবার)।

Question: কুমিল্লা বিশ্ববিদ্যালয়ে আবেদনের শেষ তারিখ কবে?"#;

const GROUNDED_QA_SHOT_ASSISTANT: &str = r#"Thought: The first passage covers কুমিল্লা বিশ্ববিদ্যালয় admission for 2025-2026; the application window is ২৭ নভেম্বর থেকে ৩১ ডিসেম্বর ২০২৫.
Answer: কুমিল্লা বিশ্ববিদ্যালয়ে (কুবি / COU) ২০২৫-২০২৬ শিক্ষাবর্ষে ভর্তি আবেদনের শেষ তারিখ **৩১ ডিসেম্বর ২০২৫**।

**আবেদনের সময়সীমা:**
- শুরু: ২৭ নভেম্বর ২০২৫
- শেষ: ৩১ ডিসেম্বর ২০২৫

সময়মতো আবেদন সম্পন্ন করুন।"#;

const GROUNDED_QA_NOTFOUND_USER: &str = r#"Passage: [ঢাকা বিশ্ববিদ্যালয় DU] ঢাকা বিশ্ববিদ্যালয় ব্যবসা শিক্ষা ইউনিট ভর্তি-নির্দেশিকা। পরীক্ষার তারিখ: ০৬ ডিসেম্বর ২০২৫।

Question: জাহাঙ্গীরনগর বিশ্ববিদ্যালয়ের ভর্তি পরীক্ষার তারিখ কবে?"#;

const GROUNDED_QA_NOTFOUND_ASSISTANT: &str = r#"Thought: The passage is about ঢাকা বিশ্ববিদ্যালয় only; the question asks about জাহাঙ্গীরনগর বিশ্ববিদ্যালয়, a different university. No relevant information.
Answer: দুঃখিত, আপনার প্রশ্নের সঠিক উত্তর দেওয়ার জন্য প্রয়োজনীয় তথ্য আমার কাছে নেই।"#;

const GROUNDED_QA_CONFUSABLE_USER: &str = r#"Passage: [জাহাঙ্গীরনগর বিশ্ববিদ্যালয় JU] জাহাঙ্গীরনগর বিশ্ববিদ্যালয়ের আবেদনের সময়সীমা: ২২ নভেম্বর ২০২৫ তারিখ বিকাল ০৪:৩০ টা থেকে ০৭ ডিসেম্বর ২০২৫ তারিখ রাত ১১:৫৯ টা পর্যন্ত।

Passage: [জগন্নাথ বিশ্ববিদ্যালয় JNU] জগন্নাথ বিশ্ববিদ্যালয় ইউনিট-A: বিজ্ঞান অনুষদ। আবেদনের সময়কাল: ২০/১১/২০২৫ থেকে ০৫/১২/২০২৫।

Question: জাহাঙ্গীরনগর বিশ্ববিদ্যালয়ের আবেদনের সময়সীমা কত?"#;

const GROUNDED_QA_CONFUSABLE_ASSISTANT: &str = r#"Thought: The question asks about জাহাঙ্গীরনগর বিশ্ববিদ্যালয় (JU). The first passage is JU with dates ২২ নভেম্বর – ০৭ ডিসেম্বর ২০২৫. The second passage is জগন্নাথ বিশ্ববিদ্যালয় (JNU), a different university, so it must be ignored.
Answer: জাহাঙ্গীরনগর বিশ্ববিদ্যালয়ের (জাবি / JU) আবেদনের সময়সীমা:

- **শুরু:** ২২ নভেম্বর ২০২৫, বিকাল ০৪:৩০ টা
- **শেষ:** ০৭ ডিসেম্বর ২০২৫, রাত ১১:৫৯ টা"#;

const GROUNDED_QA_RANGE_USER: &str = r#"Passage: [জাহাঙ্গীরনগর বিশ্ববিদ্যালয় JU] জাহাঙ্গীরনগর বিশ্ববিদ্যালয় ভর্তি পরীক্ষার সম্ভাব্য তারিখ: ২১ ডিসেম্বর ২০২৫ তারিখ থেকে ৩১ ডিসেম্বর ২০২৫ তারিখের মধ্যে ভর্তি পরীক্ষা অনুষ্ঠিত হবে।

Question: জাহাঙ্গীরনগর A unit এর পরীক্ষা কবে?"#;

const GROUNDED_QA_RANGE_ASSISTANT: &str = r#"Thought: The passage only gives a general range (২১–৩১ ডিসেম্বর ২০২৫), not an A-unit date. I must not fabricate a specific date.
Answer: জাহাঙ্গীরনগর বিশ্ববিদ্যালয়ের (জাবি / JU) ভর্তি পরীক্ষা **২১ ডিসেম্বর ২০২৫ থেকে ৩১ ডিসেম্বর ২০২৫** এর মধ্যে অনুষ্ঠিত হবে।

⚠️ **A ইউনিটের নির্দিষ্ট তারিখ** প্রদত্ত তথ্যে নেই। চূড়ান্ত তারিখ জানতে অফিসিয়াল ওয়েবসাইট দেখুন।"#;

/// Build the grounded single-entity QA conversation.
///
/// `extracted_date` is the output of the deterministic date extractor; when
/// present the model is told to echo it rather than re-derive it.
pub fn grounded_qa_messages(
    question: &str,
    context: &str,
    language_instruction: Option<&str>,
    extracted_date: Option<&str>,
) -> Vec<PromptMessage> {
    let mut user = String::new();
    user.push_str(context);
    user.push_str("\n\nQuestion: ");
    user.push_str(question);
    if let Some(date) = extracted_date {
        user.push_str(&format!(
            "\n\n(VERIFIED: the exam date extracted from the official schedule table is \"{}\". State exactly this date in your answer.)",
            date
        ));
    }
    if let Some(instruction) = language_instruction {
        user.push_str(&format!("\n\n({})", instruction));
    }

    vec![
        ("system", GROUNDED_QA_SYSTEM.to_string()),
        ("user", GROUNDED_QA_SHOT_USER.to_string()),
        ("assistant", GROUNDED_QA_SHOT_ASSISTANT.to_string()),
        ("user", GROUNDED_QA_NOTFOUND_USER.to_string()),
        ("assistant", GROUNDED_QA_NOTFOUND_ASSISTANT.to_string()),
        ("user", GROUNDED_QA_CONFUSABLE_USER.to_string()),
        ("assistant", GROUNDED_QA_CONFUSABLE_ASSISTANT.to_string()),
        ("user", GROUNDED_QA_RANGE_USER.to_string()),
        ("assistant", GROUNDED_QA_RANGE_ASSISTANT.to_string()),
        ("user", user),
    ]
}

// ---------------------------------------------------------------------------
// Multi-entity slot-aware synthesis
// ---------------------------------------------------------------------------

const MULTI_ENTITY_SYSTEM: &str = r#"You are a senior admission counselor comparing admission circulars of multiple Bangladeshi universities. You receive one labeled context block per university.

RULES:
1. Answer each university's slot ONLY from its own labeled block. Never carry a date or fee from one university's block into another university's row.
2. Use the bracketed institution tags (e.g. [কুয়েট KUET]) to confirm which university a passage belongs to.
3. For comparative questions produce a Markdown table with one row per university.
4. If a university's block does not contain the asked information, write "তথ্য পাওয়া যায়নি" in that row. NEVER guess.
5. Quote dates, fees and numbers VERBATIM from the passages; if only a range is given, quote the range.
6. Respond in the language of the question; default to Bengali. No greetings, no JSON."#;

const MULTI_ENTITY_DATE_ADDENDUM: &str = r#"
DATE QUESTIONS:
- Look for schedule-table rows such as "ভর্তি পরীক্ষার তারিখ ও সময়" and quote the row for the named university only.
- Circulars often list several universities' dates; disambiguate strictly by the bracketed tag and the university name in the row.
- Never merge or average dates across universities."#;

/// Build the multi-entity comparative conversation. `entity_blocks` is a list
/// of `(full_name, abbrev, context, coverage_warning)`.
pub fn multi_entity_messages(
    question: &str,
    entity_blocks: &[(String, String, String, bool)],
    is_date_intent: bool,
    language_instruction: Option<&str>,
) -> Vec<PromptMessage> {
    let mut system = MULTI_ENTITY_SYSTEM.to_string();
    if is_date_intent {
        system.push_str(MULTI_ENTITY_DATE_ADDENDUM);
    }

    let mut user = String::new();
    for (full_name, abbrev, context, low_coverage) in entity_blocks {
        user.push_str(&format!("=== {} ({}) ===\n", full_name, abbrev.to_uppercase()));
        if *low_coverage {
            user.push_str("(সতর্কতা: এই প্রতিষ্ঠানের জন্য খুব কম তথ্য পাওয়া গেছে)\n");
        }
        if context.is_empty() {
            user.push_str("(কোনো প্রাসঙ্গিক তথ্য পাওয়া যায়নি)\n");
        } else {
            user.push_str(context);
            user.push('\n');
        }
        user.push('\n');
    }
    user.push_str("Question: ");
    user.push_str(question);
    if let Some(instruction) = language_instruction {
        user.push_str(&format!("\n\n({})", instruction));
    }

    vec![("system", system), ("user", user)]
}

// ---------------------------------------------------------------------------
// Fact filter (LLM reranker over candidate triples)
// ---------------------------------------------------------------------------

const FACT_FILTER_SYSTEM: &str = r#"You filter knowledge-graph facts for relevance to a question. Given a question and candidate facts as JSON {"fact": [[subject, predicate, object], ...]}, return ONLY the facts useful for answering, best first, in the identical JSON shape. Keep the original language of each fact. Return {"fact": []} if none are relevant. Output JSON only, no commentary."#;

const FACT_FILTER_SHOT_USER: &str = r#"Question: চবির ভর্তি পরীক্ষার তারিখ কবে?

Candidate facts: {"fact": [["চট্টগ্রাম বিশ্ববিদ্যালয়", "ভর্তি পরীক্ষার তারিখ", "৫ জানুয়ারি ২০২৬"], ["ঢাকা বিশ্ববিদ্যালয়", "আবেদন ফি", "১০০০ টাকা"], ["চট্টগ্রাম বিশ্ববিদ্যালয়", "অবস্থিত", "চট্টগ্রাম"]]}"#;

const FACT_FILTER_SHOT_ASSISTANT: &str =
    r#"{"fact": [["চট্টগ্রাম বিশ্ববিদ্যালয়", "ভর্তি পরীক্ষার তারিখ", "৫ জানুয়ারি ২০২৬"]]}"#;

/// Build the fact filter conversation. `fact_json` is the serialized
/// `{"fact": [...]}` candidate payload.
pub fn fact_filter_messages(question: &str, fact_json: &str) -> Vec<PromptMessage> {
    vec![
        ("system", FACT_FILTER_SYSTEM.to_string()),
        ("user", FACT_FILTER_SHOT_USER.to_string()),
        ("assistant", FACT_FILTER_SHOT_ASSISTANT.to_string()),
        (
            "user",
            format!("Question: {}\n\nCandidate facts: {}", question, fact_json),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Query rewriting
// ---------------------------------------------------------------------------

const REWRITE_SYSTEM: &str = r#"You rewrite unclear admission questions into clear, self-contained ones. Keep the SAME LANGUAGE as the input. Do not add universities or topics the user did not mention. If the query cannot be made clearer, reply with exactly UNCLEAR."#;

/// Build the clarity-rewrite conversation.
pub fn rewrite_messages(query: &str) -> Vec<PromptMessage> {
    vec![
        ("system", REWRITE_SYSTEM.to_string()),
        ("user", "Query: du te ki ki lage?".to_string()),
        (
            "assistant",
            "ঢাকা বিশ্ববিদ্যালয়ে ভর্তির জন্য কী কী যোগ্যতা লাগে?".to_string(),
        ),
        ("user", "Query: পরীক্ষা কবে?".to_string()),
        (
            "assistant",
            "ভর্তি পরীক্ষার তারিখ কবে?".to_string(),
        ),
        ("user", "Query: hmm".to_string()),
        ("assistant", UNCLEAR_SENTINEL.to_string()),
        ("user", format!("Query: {}", query)),
    ]
}

// ---------------------------------------------------------------------------
// Multi-entity decomposition
// ---------------------------------------------------------------------------

const DECOMPOSE_SYSTEM: &str = r#"You split a question that mentions several universities into one sub-question per university. Output exactly one line per university in the format ABBREV|sub_question, nothing else. The sub_question must name the university explicitly and keep the language of the original question."#;

/// Build the decomposition conversation. `entities` is `(abbrev, full_name)`.
pub fn decompose_messages(query: &str, entities: &[(String, String)]) -> Vec<PromptMessage> {
    let listing = entities
        .iter()
        .map(|(abbrev, full_name)| format!("- {} = {}", abbrev.to_uppercase(), full_name))
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ("system", DECOMPOSE_SYSTEM.to_string()),
        (
            "user",
            "Universities:\n- BUET = Bangladesh University of Engineering and Technology (BUET)\n- KUET = Khulna University of Engineering and Technology (KUET)\n\nQuestion: BUET ar KUET er abedon fee koto?".to_string(),
        ),
        (
            "assistant",
            "BUET|Bangladesh University of Engineering and Technology (BUET) er abedon fee koto?\nKUET|Khulna University of Engineering and Technology (KUET) er abedon fee koto?".to_string(),
        ),
        (
            "user",
            format!("Universities:\n{}\n\nQuestion: {}", listing, query),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Index-time triple extraction (OpenIE)
// ---------------------------------------------------------------------------

const TRIPLE_EXTRACTION_SYSTEM: &str = r#"You extract knowledge-graph triples from admission circular passages. Return JSON only: {"triples": [[subject, predicate, object], ...]}.

RULES:
1. Keep entities in the SAME LANGUAGE and script as the passage. Never transliterate or translate.
2. Subjects and objects are short noun phrases (university names, units, dates, fees, GPA values). Predicates are short relations (ভর্তি পরীক্ষার তারিখ, আবেদন ফি, আসন সংখ্যা, requires, located in).
3. Extract every date, fee, seat count and eligibility relation stated in the passage.
4. No duplicate triples, no commentary."#;

/// Build the OpenIE conversation for one passage.
pub fn triple_extraction_messages(passage: &str) -> Vec<PromptMessage> {
    vec![
        ("system", TRIPLE_EXTRACTION_SYSTEM.to_string()),
        (
            "user",
            "Passage: [খুলনা প্রকৌশল ও প্রযুক্তি বিশ্ববিদ্যালয় KUET] কুয়েটে ভর্তি পরীক্ষা ১০ জানুয়ারি ২০২৬ তারিখে অনুষ্ঠিত হবে। আবেদন ফি ১২০০ টাকা।".to_string(),
        ),
        (
            "assistant",
            r#"{"triples": [["কুয়েট", "ভর্তি পরীক্ষার তারিখ", "১০ জানুয়ারি ২০২৬"], ["কুয়েট", "আবেদন ফি", "১২০০ টাকা"]]}"#.to_string(),
        ),
        ("user", format!("Passage: {}", passage)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grounded_qa_shape() {
        let messages = grounded_qa_messages("প্রশ্ন", "Passage: কিছু", None, None);
        assert_eq!(messages[0].0, "system");
        assert_eq!(messages.len(), 10);
        // Alternating user/assistant few-shots between system and the query.
        for (i, (role, _)) in messages[1..messages.len() - 1].iter().enumerate() {
            assert_eq!(*role, if i % 2 == 0 { "user" } else { "assistant" });
        }
        assert!(messages.last().unwrap().1.contains("Question: প্রশ্ন"));
    }

    #[test]
    fn test_grounded_qa_injects_extracted_date() {
        let messages =
            grounded_qa_messages("কবে?", "Passage: x", None, Some("১০ জানুয়ারি ২০২৬"));
        assert!(messages.last().unwrap().1.contains("১০ জানুয়ারি ২০২৬"));
    }

    #[test]
    fn test_multi_entity_blocks_labeled() {
        let blocks = vec![
            (
                "Khulna University of Engineering and Technology (KUET)".to_string(),
                "kuet".to_string(),
                "Passage: কুয়েট".to_string(),
                false,
            ),
            (
                "University of Dhaka (DU)".to_string(),
                "du".to_string(),
                String::new(),
                true,
            ),
        ];
        let messages = multi_entity_messages("fee koto?", &blocks, false, None);
        let user = &messages.last().unwrap().1;
        assert!(user.contains("=== Khulna University of Engineering and Technology (KUET) (KUET) ==="));
        assert!(user.contains("কোনো প্রাসঙ্গিক তথ্য পাওয়া যায়নি"));
    }

    #[test]
    fn test_date_addendum_only_for_date_intent() {
        let blocks = vec![];
        let plain = multi_entity_messages("q", &blocks, false, None);
        let dated = multi_entity_messages("q", &blocks, true, None);
        assert!(!plain[0].1.contains("DATE QUESTIONS"));
        assert!(dated[0].1.contains("DATE QUESTIONS"));
    }

    #[test]
    fn test_decompose_lists_entities() {
        let entities = vec![
            ("buet".to_string(), "BUET full".to_string()),
            ("ruet".to_string(), "RUET full".to_string()),
        ];
        let messages = decompose_messages("fee?", &entities);
        let user = &messages.last().unwrap().1;
        assert!(user.contains("- BUET = BUET full"));
        assert!(user.contains("- RUET = RUET full"));
    }

    #[test]
    fn test_rewrite_has_unclear_shot() {
        let messages = rewrite_messages("eta ki");
        assert!(messages.iter().any(|(_, c)| c == UNCLEAR_SENTINEL));
    }
}
