//! Assistant-facing markdown produced by the phases.

use std::collections::HashSet;

use super::state::{CodeScaffold, DocumentationEntry, Phase, TechStack};

/// Truncate to at most `max` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Capitalize the first letter of each `_`/space separated word.
fn title_case(category: &str) -> String {
    category
        .split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Confirmation shown when the Planner finalizes the specification.
pub fn spec_summary(requirements: &str, architecture: &str, tech_stack: &TechStack) -> String {
    let stack_lines: Vec<String> = tech_stack
        .iter()
        .filter(|(_, techs)| !techs.is_empty())
        .map(|(category, techs)| format!("- {}: {}", title_case(category), techs.join(", ")))
        .collect();

    let stack = if stack_lines.is_empty() {
        "- (none specified)".to_string()
    } else {
        stack_lines.join("\n")
    };

    format!(
        "**Technical Specification Complete**\n\n\
         Here is what I captured for your project.\n\n\
         **Requirements**\n{}\n\n\
         **Architecture**\n{}\n\n\
         **Tech Stack**\n{}\n\n\
         ---\n\
         Next, the Librarian will gather documentation for this stack.",
        requirements.trim(),
        architecture.trim(),
        stack
    )
}

/// Deterministic fallback for the Librarian synthesis: raw snippets grouped
/// by technology with numbered references.
pub fn format_citations(entries: &[DocumentationEntry], snippet_chars: usize) -> String {
    if entries.is_empty() {
        return "No documentation found.".to_string();
    }

    // group by technology, keeping first-seen order
    let mut groups: Vec<(&str, Vec<&DocumentationEntry>)> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|(tech, _)| *tech == entry.technology) {
            Some((_, group)) => group.push(entry),
            None => groups.push((&entry.technology, vec![entry])),
        }
    }

    let mut out = String::new();
    let mut sources = Vec::new();
    let mut index = 1;

    for (tech, group) in groups {
        out.push_str(&format!("## {} Documentation\n\n", tech));
        for entry in group {
            out.push_str(&format!("**{}** [{}]\n", entry.section_title, index));
            out.push_str(truncate_chars(&entry.content, snippet_chars));
            out.push_str("\n\n");
            sources.push(format!("[{}] {}: {}", index, entry.section_title, entry.source_url));
            index += 1;
        }
    }

    out.push_str("---\n### Sources\n\n");
    out.push_str(&sources.join("\n"));
    out
}

/// Librarian message: header, synthesis and one source line per distinct URL.
pub fn librarian_response(
    technologies: &[String],
    synthesis: &str,
    entries: &[DocumentationEntry],
) -> String {
    let mut seen = HashSet::new();
    let sources: Vec<String> = entries
        .iter()
        .filter(|e| !e.source_url.is_empty() && seen.insert(e.source_url.as_str()))
        .enumerate()
        .map(|(i, e)| {
            format!(
                "[{}] **{}**: {}\n    {}",
                i + 1,
                e.technology,
                e.section_title,
                e.source_url
            )
        })
        .collect();

    let mut out = format!(
        "**Documentation Research Complete**\n\n\
         I gathered documentation for: **{}**\n\n{}\n",
        technologies.join(", "),
        synthesis.trim()
    );

    if !sources.is_empty() {
        out.push_str("\n---\n### Sources\n\n");
        out.push_str(&sources.join("\n"));
        out.push('\n');
    }

    out.push_str("\n---\nNext, the Mentor will scaffold the project from this research.");
    out
}

/// Fence language for a scaffold, guessed from its extension.
fn fence_language(file_path: &str) -> &'static str {
    let ext = file_path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "py" => "python",
        "rs" => "rust",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" => "javascript",
        "go" => "go",
        "java" => "java",
        "rb" => "ruby",
        "sql" => "sql",
        "sh" => "bash",
        "toml" => "toml",
        "yml" | "yaml" => "yaml",
        "json" => "json",
        "html" => "html",
        "css" => "css",
        "md" => "markdown",
        _ => "",
    }
}

/// Mentor message: file list, hints, first steps and scaffold bodies.
pub fn mentor_response(
    scaffolds: &[CodeScaffold],
    implementation_hints: &[String],
    first_steps: &str,
) -> String {
    let mut out = String::from("**Mentor Scaffolding Complete**\n");

    if !scaffolds.is_empty() {
        out.push_str("\n**Generated Files**\n");
        for scaffold in scaffolds {
            out.push_str(&format!("- `{}`\n", scaffold.file_path));
        }
    }

    if !implementation_hints.is_empty() {
        out.push_str("\n**Implementation Hints**\n");
        for (i, hint) in implementation_hints.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, hint));
        }
    }

    if !first_steps.trim().is_empty() {
        out.push_str(&format!(
            "\n**Recommended Starting Point**\n{}\n",
            first_steps.trim()
        ));
    }

    if !scaffolds.is_empty() {
        out.push_str("\n---\n## Scaffolds\n");
        for scaffold in scaffolds {
            out.push_str(&format!(
                "\n### `{}`\n```{}\n{}\n```\n",
                scaffold.file_path,
                fence_language(&scaffold.file_path),
                scaffold.content.trim_end()
            ));
            if !scaffold.hints.is_empty() {
                out.push_str("**Hints for this file:**\n");
                for hint in &scaffold.hints {
                    out.push_str(&format!("- {}\n", hint));
                }
            }
        }
    }

    out.push_str(
        "\n---\nThese scaffolds are intentionally incomplete. \
         The TODO sections are yours to implement, guided by the hints and the Librarian's documentation.",
    );
    out
}

/// The single assistant message appended when a phase fails.
pub fn phase_error(phase: Phase, message: &str) -> String {
    format!("The {} phase encountered an error: {}", phase, message)
}
