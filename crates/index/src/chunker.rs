//! Document chunking
//!
//! The chunking contract the retrieval core consumes: chunks of at most
//! 3,000 characters, split on paragraph or sentence boundaries (Bengali `। `
//! or English `. `) with a 200-character overlap, each chunk prefixed with a
//! bracketed institution tag inferred from the source filename.

use std::path::Path;

use bhorti_config::constants::chunking::{MAX_CHARS, OVERLAP_CHARS, TARGET_CHARS};
use bhorti_config::domain::universities::UNIVERSITY_RULES;

use crate::IndexError;

/// Find the last occurrence of `pattern` inside `chars[from..to]`, returned
/// as a char index into `chars`.
fn rfind_chars(chars: &[char], pattern: &[char], from: usize, to: usize) -> Option<usize> {
    if pattern.is_empty() || to > chars.len() || from + pattern.len() > to {
        return None;
    }
    let mut idx = to - pattern.len();
    loop {
        if chars[idx..idx + pattern.len()] == *pattern {
            return Some(idx);
        }
        if idx == from {
            return None;
        }
        idx -= 1;
    }
}

/// Split text into chunks of at most `max_chars` characters with `overlap`
/// characters of context carried between consecutive chunks. Cuts prefer a
/// paragraph break, then a Bengali sentence end, then an English one —
/// falling back to a hard cut only when no boundary lands in the second half
/// of the window.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    let paragraph: Vec<char> = "\n\n".chars().collect();
    let bangla_sentence: Vec<char> = "। ".chars().collect();
    let english_sentence: Vec<char> = ". ".chars().collect();

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let mut end = (start + max_chars).min(chars.len());

        if end < chars.len() {
            let half = start + max_chars / 2;
            if let Some(cut) = rfind_chars(&chars, &paragraph, start, end) {
                if cut > half {
                    end = cut;
                }
            } else if let Some(cut) = rfind_chars(&chars, &bangla_sentence, start, end)
                .or_else(|| rfind_chars(&chars, &english_sentence, start, end))
            {
                if cut > half {
                    end = cut + 1;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(overlap);
    }

    chunks
}

/// Infer the bracketed institution tag from a source filename, e.g.
/// `ru_admission_2026.txt` → `[রাজশাহী বিশ্ববিদ্যালয় RU]`.
pub fn infer_institution_tag(filename: &str) -> Option<String> {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_lowercase();

    for rule in UNIVERSITY_RULES {
        let abbrev_hit = stem
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| token == rule.abbrev);
        let bengali_hit = rule.bengali_markers.iter().any(|m| stem.contains(m));
        if abbrev_hit || bengali_hit {
            let display = rule
                .bengali_markers
                .first()
                .copied()
                .unwrap_or(rule.full_name);
            return Some(format!("[{} {}]", display, rule.abbrev.to_uppercase()));
        }
    }
    None
}

/// Load and chunk every `.txt` file in a folder. Page-marked files
/// (`=== Page N ===`) split per page first; the page-number line is dropped.
/// Each chunk is prefixed with the institution tag inferred from its
/// filename.
pub fn load_documents_from_folder(folder: &Path) -> Result<Vec<String>, IndexError> {
    if !folder.is_dir() {
        return Err(IndexError::FolderNotFound(folder.display().to_string()));
    }

    let mut documents = Vec::new();
    let mut files = 0usize;

    let mut entries: Vec<_> = std::fs::read_dir(folder)
        .map_err(|e| IndexError::Io(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("txt"))
        .collect();
    entries.sort();

    for path in entries {
        let content =
            std::fs::read_to_string(&path).map_err(|e| IndexError::Io(e.to_string()))?;
        files += 1;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let tag = infer_institution_tag(&filename);

        let mut push_chunks = |text: &str| {
            for chunk in chunk_text(text, TARGET_CHARS.min(MAX_CHARS), OVERLAP_CHARS) {
                match &tag {
                    Some(tag) if !chunk.starts_with('[') => {
                        documents.push(format!("{} {}", tag, chunk));
                    }
                    _ => documents.push(chunk),
                }
            }
        };

        if content.contains("=== Page") {
            for page in content.split("=== Page") {
                let page = page.trim();
                if page.is_empty() || page.starts_with("===") {
                    continue;
                }
                // Drop the "N ===" page-number line.
                let body = match page.split_once('\n') {
                    Some((first, rest)) if first.contains("===") => rest,
                    _ => page,
                };
                let body = body.trim();
                if body.chars().count() > 50 {
                    push_chunks(body);
                }
            }
        } else if !content.trim().is_empty() {
            push_chunks(content.trim());
        }
    }

    tracing::info!(chunks = documents.len(), files, "documents loaded from folder");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("ছোট টেক্সট", 100, 20);
        assert_eq!(chunks, vec!["ছোট টেক্সট"]);
    }

    #[test]
    fn test_chunks_respect_max_chars() {
        let text = "বাক্য এক। ".repeat(100);
        let chunks = chunk_text(&text, 200, 50);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 200);
        }
    }

    #[test]
    fn test_prefers_paragraph_boundary() {
        let para1 = "ক".repeat(150);
        let para2 = "খ".repeat(150);
        let text = format!("{}\n\n{}", para1, para2);
        let chunks = chunk_text(&text, 200, 10);
        assert_eq!(chunks[0], para1);
    }

    #[test]
    fn test_overlap_carries_context() {
        let text = "শব্দ ".repeat(200);
        let chunks = chunk_text(&text, 300, 100);
        assert!(chunks.len() >= 2);
        // The head of chunk N+1 comes from inside chunk N.
        let head: String = chunks[1].chars().take(50).collect();
        assert!(chunks[0].contains(head.trim()));
    }

    #[test]
    fn test_infer_tag_from_filename() {
        assert_eq!(
            infer_institution_tag("ru_admission_2026.txt").as_deref(),
            Some("[রাজশাহী বিশ্ববিদ্যালয় RU]")
        );
        assert_eq!(
            infer_institution_tag("kuet-circular.txt").as_deref(),
            Some("[কুয়েট KUET]")
        );
        assert_eq!(infer_institution_tag("notes.txt"), None);
    }

    #[test]
    fn test_tag_inference_word_boundary() {
        // "ru" must not fire inside "circular".
        assert_eq!(infer_institution_tag("circular_list.txt"), None);
    }

    #[test]
    fn test_folder_loading_with_page_markers() {
        let dir = TempDir::new().unwrap();
        let body = format!(
            "=== Page 1 ===\n{}\n=== Page 2 ===\n{}",
            "চট্টগ্রাম বিশ্ববিদ্যালয় ভর্তি বিজ্ঞপ্তি প্রকাশিত হয়েছে। আবেদন শুরু শীঘ্রই জানানো হবে।",
            "ভর্তি পরীক্ষা ৫ জানুয়ারি ২০২৬ তারিখে অনুষ্ঠিত হবে। বিস্তারিত ওয়েবসাইটে পাওয়া যাবে।"
        );
        std::fs::write(dir.path().join("cu_notice.txt"), body).unwrap();

        let docs = load_documents_from_folder(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        for doc in &docs {
            assert!(doc.starts_with("[চট্টগ্রাম বিশ্ববিদ্যালয় CU]"), "doc: {}", doc);
        }
    }

    #[test]
    fn test_missing_folder_rejected() {
        let result = load_documents_from_folder(Path::new("/no/such/folder"));
        assert!(matches!(result, Err(IndexError::FolderNotFound(_))));
    }
}
