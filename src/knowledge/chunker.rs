//! Markdown chunking — frontmatter-aware semantic splitting.
//!
//! One entry point, [`chunk_file`], dispatching on file shape: a file with
//! skill frontmatter (`name` + `description`) yields a frontmatter chunk
//! plus one chunk per canonical section; a context file is split by
//! headings, then paragraphs, then sentences until every chunk fits the
//! token budget; a file without headings yields `full` chunks.
//!
//! Chunk ids are derived deterministically from
//! `(file path, chunk type, ordinal)` so re-indexing unchanged content
//! reproduces identical ids.

use std::collections::BTreeMap;

use serde_json::json;
use sha2::{Digest, Sha256};

use crate::knowledge::normalize::estimate_tokens;
use crate::knowledge::types::{Chunk, ChunkType, SourceType};

/// Token budget per chunk, fixed so boundaries are reproducible across
/// model swaps.
pub const CHUNK_TOKEN_BUDGET: usize = 500;

/// Result of chunking one file: the ordered chunks plus the importance
/// override parsed from frontmatter, if any.
#[derive(Debug)]
pub struct ChunkedFile {
    pub chunks: Vec<Chunk>,
    pub importance: Option<u8>,
}

/// Split one indexable file into chunks. `path` is the relative
/// forward-slash path; `text` is expected to be normalized.
pub fn chunk_file(path: &str, text: &str) -> ChunkedFile {
    let (frontmatter, body, body_line) = parse_frontmatter(text);

    let importance = frontmatter
        .as_ref()
        .and_then(|fm| fm.get("importance"))
        .and_then(|v| v.parse::<u8>().ok())
        .filter(|n| (1..=10).contains(n));

    let skill = frontmatter.as_ref().and_then(|fm| {
        let name = fm.get("name").filter(|v| !v.is_empty())?;
        let description = fm.get("description").filter(|v| !v.is_empty())?;
        Some((name.clone(), description.clone()))
    });

    let mut builder = ChunkBuilder::new(path, if skill.is_some() {
        SourceType::Skill
    } else {
        SourceType::Knowledge
    });

    match skill {
        Some((name, description)) => chunk_skill(&mut builder, &name, &description, body, body_line),
        None => chunk_context(&mut builder, body, body_line),
    }

    ChunkedFile {
        chunks: builder.chunks,
        importance,
    }
}

// ── Frontmatter ───────────────────────────────────────────────────────────────

/// Parse a YAML-style frontmatter block delimited by `---` at file start.
///
/// Only flat `key: value` pairs are recognized. Anything else — a missing
/// closing fence, nested mappings, a line without a colon — makes the
/// whole block malformed, which is silently ignored: the entire file is
/// treated as body. Returns `(pairs, body, body_start_line)` with
/// 1-indexed lines.
fn parse_frontmatter(text: &str) -> (Option<BTreeMap<String, String>>, &str, usize) {
    let mut offset = 0usize;
    let mut lines = text.split_inclusive('\n');

    match lines.next() {
        Some(first) if first.trim_end() == "---" => offset += first.len(),
        _ => return (None, text, 1),
    }

    let mut pairs = BTreeMap::new();
    let mut line_no = 1;

    for line in lines {
        line_no += 1;
        let stripped = line.trim_end_matches('\n');

        if stripped.trim() == "---" {
            let body = &text[offset + line.len()..];
            return (Some(pairs), body, line_no + 1);
        }

        offset += line.len();

        if stripped.trim().is_empty() || stripped.trim_start().starts_with('#') {
            continue;
        }
        if stripped.starts_with(' ') || stripped.starts_with('\t') {
            return (None, text, 1);
        }
        let Some((key, value)) = stripped.split_once(':') else {
            return (None, text, 1);
        };
        let key = key.trim();
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return (None, text, 1);
        }
        pairs.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    // No closing fence
    (None, text, 1)
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// ── Heading-based sectioning ──────────────────────────────────────────────────

/// A heading-delimited slice of text. `heading` is `None` for the
/// preamble before the first heading.
struct Section {
    heading: Option<String>,
    start_line: usize,
    body: String,
}

fn is_heading(line: &str, level: usize) -> bool {
    let marker = "#".repeat(level);
    line.starts_with(&marker)
        && line[level..].starts_with(' ')
}

fn heading_text(line: &str, level: usize) -> String {
    line[level..].trim().to_string()
}

/// Split text into sections at headings of exactly `level`.
fn split_level(text: &str, level: usize, first_line: usize) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section {
        heading: None,
        start_line: first_line,
        body: String::new(),
    };

    for (i, line) in text.split('\n').enumerate() {
        let line_no = first_line + i;
        if is_heading(line, level) {
            sections.push(current);
            current = Section {
                heading: Some(heading_text(line, level)),
                start_line: line_no,
                body: String::new(),
            };
        } else {
            if !current.body.is_empty() {
                current.body.push('\n');
            }
            current.body.push_str(line);
        }
    }
    sections.push(current);
    sections
}

// ── Budget-constrained splitting ──────────────────────────────────────────────

/// Split text into pieces that each fit the token budget: greedy
/// paragraph packing, oversized paragraphs split by sentence, oversized
/// sentences hard-split at word boundaries.
fn split_to_budget(text: &str) -> Vec<String> {
    let max_chars = CHUNK_TOKEN_BUDGET * 4;
    let mut pieces = Vec::new();
    let mut buf = String::new();

    for para in text.split("\n\n") {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }

        if para.chars().count() > max_chars {
            flush(&mut pieces, &mut buf);
            for sentence_piece in split_oversized_paragraph(para, max_chars) {
                pieces.push(sentence_piece);
            }
            continue;
        }

        let would_be = if buf.is_empty() {
            para.chars().count()
        } else {
            buf.chars().count() + 2 + para.chars().count()
        };
        if would_be > max_chars {
            flush(&mut pieces, &mut buf);
        }
        if !buf.is_empty() {
            buf.push_str("\n\n");
        }
        buf.push_str(para);
    }

    flush(&mut pieces, &mut buf);
    pieces
}

fn flush(pieces: &mut Vec<String>, buf: &mut String) {
    if !buf.trim().is_empty() {
        pieces.push(std::mem::take(buf));
    } else {
        buf.clear();
    }
}

fn split_oversized_paragraph(para: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut buf = String::new();

    for sentence in split_sentences(para) {
        if sentence.chars().count() > max_chars {
            flush(&mut pieces, &mut buf);
            hard_split(sentence, max_chars, &mut pieces);
            continue;
        }
        if !buf.is_empty() && buf.chars().count() + 1 + sentence.chars().count() > max_chars {
            flush(&mut pieces, &mut buf);
        }
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(sentence);
    }

    flush(&mut pieces, &mut buf);
    pieces
}

/// Split after `.`, `!`, or `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev_was_ender = false;

    for (idx, c) in text.char_indices() {
        if prev_was_ender && c.is_whitespace() {
            let candidate = text[start..idx].trim();
            if !candidate.is_empty() {
                sentences.push(candidate);
            }
            start = idx;
        }
        prev_was_ender = matches!(c, '.' | '!' | '?');
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Last resort: split at word boundaries near `max_chars`.
fn hard_split(text: &str, max_chars: usize, pieces: &mut Vec<String>) {
    let mut buf = String::new();
    for word in text.split_whitespace() {
        if !buf.is_empty() && buf.chars().count() + 1 + word.chars().count() > max_chars {
            pieces.push(std::mem::take(&mut buf));
        }
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(word);
    }
    if !buf.is_empty() {
        pieces.push(buf);
    }
}

// ── Chunk assembly ────────────────────────────────────────────────────────────

struct ChunkBuilder<'a> {
    path: &'a str,
    source_type: SourceType,
    ordinals: BTreeMap<&'static str, usize>,
    chunks: Vec<Chunk>,
}

impl<'a> ChunkBuilder<'a> {
    fn new(path: &'a str, source_type: SourceType) -> Self {
        Self {
            path,
            source_type,
            ordinals: BTreeMap::new(),
            chunks: Vec::new(),
        }
    }

    fn push(
        &mut self,
        chunk_type: ChunkType,
        content: &str,
        heading: Option<String>,
        priority: u8,
        metadata: Option<serde_json::Value>,
    ) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        let ordinal = self.ordinals.entry(chunk_type.as_str()).or_insert(0);
        let id = chunk_id(self.path, chunk_type, *ordinal);
        *ordinal += 1;

        self.chunks.push(Chunk {
            id,
            file_path: self.path.to_string(),
            source_type: self.source_type,
            chunk_type,
            content: content.to_string(),
            heading,
            priority,
            metadata,
        });
    }
}

/// First 16 hex chars of `SHA-256("{path}#{chunk_type}#{ordinal}")`.
fn chunk_id(path: &str, chunk_type: ChunkType, ordinal: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{path}#{chunk_type}#{ordinal}").as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

/// Canonical skill sections with their fixed priorities. Trigger outranks
/// problem: trigger strings are the highest-signal retrieval targets.
fn canonical_section(heading: &str) -> Option<(ChunkType, u8)> {
    match heading.trim().to_lowercase().as_str() {
        "problem" => Some((ChunkType::Problem, 8)),
        "trigger" => Some((ChunkType::Trigger, 9)),
        "solution" => Some((ChunkType::Solution, 7)),
        "verification" => Some((ChunkType::Verification, 5)),
        _ => None,
    }
}

fn chunk_skill(
    builder: &mut ChunkBuilder,
    name: &str,
    description: &str,
    body: &str,
    body_line: usize,
) {
    builder.push(
        ChunkType::Frontmatter,
        &format!("{name}: {description}"),
        None,
        10,
        Some(json!({ "skillName": name })),
    );

    for section in split_level(body, 2, body_line) {
        match &section.heading {
            None => {
                builder.push(
                    ChunkType::Section,
                    &section.body,
                    None,
                    4,
                    Some(json!({ "skillName": name, "startLine": section.start_line })),
                );
            }
            Some(heading) => {
                let (chunk_type, priority) =
                    canonical_section(heading).unwrap_or((ChunkType::Section, 4));
                builder.push(
                    chunk_type,
                    &section.body,
                    Some(heading.clone()),
                    priority,
                    Some(json!({
                        "skillName": name,
                        "sectionPath": heading,
                        "startLine": section.start_line,
                    })),
                );
            }
        }
    }
}

fn chunk_context(builder: &mut ChunkBuilder, body: &str, body_line: usize) {
    let sections = split_level(body, 2, body_line);
    let has_headings = sections.iter().any(|s| s.heading.is_some());

    if !has_headings {
        for piece in split_to_budget(body) {
            builder.push(ChunkType::Full, &piece, None, 5, None);
        }
        return;
    }

    for section in sections {
        let label = match &section.heading {
            Some(h) => Some(h.clone()),
            // Preamble: borrow the H1 title as its label if one leads the file
            None => leading_title(&section.body),
        };

        if estimate_tokens(&section.body) <= CHUNK_TOKEN_BUDGET {
            push_section(builder, &section.body, label, section.start_line);
            continue;
        }

        let subsections = split_level(&section.body, 3, section.start_line);
        if subsections.iter().any(|s| s.heading.is_some()) {
            for sub in subsections {
                let sub_label = match (&label, &sub.heading) {
                    (Some(h2), Some(h3)) => Some(format!("{h2} > {h3}")),
                    (None, Some(h3)) => Some(h3.clone()),
                    _ => label.clone(),
                };
                if estimate_tokens(&sub.body) <= CHUNK_TOKEN_BUDGET {
                    push_section(builder, &sub.body, sub_label, sub.start_line);
                } else {
                    for piece in split_to_budget(&sub.body) {
                        push_section(builder, &piece, sub_label.clone(), sub.start_line);
                    }
                }
            }
        } else {
            for piece in split_to_budget(&section.body) {
                push_section(builder, &piece, label.clone(), section.start_line);
            }
        }
    }
}

fn push_section(builder: &mut ChunkBuilder, content: &str, label: Option<String>, line: usize) {
    let metadata = label
        .as_ref()
        .map(|l| json!({ "sectionPath": l, "startLine": line }));
    builder.push(ChunkType::Section, content, label, 6, metadata);
}

fn leading_title(body: &str) -> Option<String> {
    body.lines()
        .find(|l| !l.trim().is_empty())
        .filter(|l| is_heading(l, 1))
        .map(|l| heading_text(l, 1))
}
