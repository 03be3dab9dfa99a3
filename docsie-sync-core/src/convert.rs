//! Converts Docsie block trees to Markdown.
//!
//! Top-level blocks map one-to-one onto Markdown fragments which are joined
//! with a blank line. Container blocks (`banner`, `content`, `tiles`) hold a
//! nested node tree that is flattened with [`extract_nested`].

use crate::model::{BlockKind, ContentBlock, ContentTree, NestedNode, RecordContent};

/// Converts a record's content payload. Plain Markdown passes through trimmed.
pub fn content_to_markdown(content: &RecordContent) -> String {
    match content {
        RecordContent::Blocks(tree) => to_markdown(Some(tree)),
        RecordContent::Markdown(text) => text.trim().to_string(),
    }
}

pub fn to_markdown(tree: Option<&ContentTree>) -> String {
    let Some(tree) = tree else {
        return String::new();
    };

    let mut parts: Vec<String> = Vec::with_capacity(tree.blocks.len());
    let mut ordered_index = 0usize;

    for block in &tree.blocks {
        if block.kind == BlockKind::OrderedListItem {
            ordered_index += 1;
        } else {
            ordered_index = 0;
        }

        let rendered = render_block(block, ordered_index);
        if !rendered.is_empty() {
            parts.push(rendered);
        }
    }

    parts.join("\n\n").trim().to_string()
}

fn render_block(block: &ContentBlock, ordered_index: usize) -> String {
    let text = block.text.as_str();
    let src = block.data.src.as_deref().filter(|s| !s.is_empty());

    match &block.kind {
        BlockKind::Paragraph => text.to_string(),
        BlockKind::Heading(level) => format!("{} {}", "#".repeat(*level as usize), text),
        BlockKind::StepHeading => format!("**{}**", text),
        BlockKind::UnorderedListItem => format!("- {}", text),
        BlockKind::OrderedListItem => format!("{}. {}", ordered_index, text),
        BlockKind::Image => match src {
            Some(src) => format!("![{}]({})", block.data.label.as_deref().unwrap_or(""), src),
            None => String::new(),
        },
        BlockKind::Video => match src {
            Some(src) => {
                let label = block
                    .data
                    .label
                    .as_deref()
                    .filter(|l| !l.is_empty())
                    .unwrap_or("Video");
                format!("[{}]({})", label, src)
            }
            None => String::new(),
        },
        BlockKind::Embed => match src {
            Some(src) => format!("[Embedded content]({})", src),
            None => String::new(),
        },
        BlockKind::Code => match src {
            Some(src) => format!("[Code Gist]({})", src),
            None => text.to_string(),
        },
        BlockKind::Chart => String::new(),
        BlockKind::Container => block
            .data
            .content
            .as_ref()
            .map(extract_nested)
            .unwrap_or_default(),
        BlockKind::Tiles => block
            .data
            .tiles
            .iter()
            .filter_map(|tile| tile.content.as_ref())
            .map(extract_nested)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
        BlockKind::Unknown(_) => text.to_string(),
    }
}

/// Flattens a nested node tree into Markdown text.
pub fn extract_nested(node: &NestedNode) -> String {
    match node.node_type.as_str() {
        "text" => node.text.clone().unwrap_or_default(),
        "doc" => node
            .content
            .iter()
            .map(extract_nested)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
        "heading" => {
            let level = node
                .attrs
                .level
                .filter(|l| (1..=6).contains(l))
                .unwrap_or(2);
            format!("{} {}", "#".repeat(level as usize), concat_children(node))
        }
        "bulletList" | "bullet_list" => node
            .content
            .iter()
            .map(|child| format!("- {}", extract_nested(child)))
            .collect::<Vec<_>>()
            .join("\n"),
        "orderedList" | "ordered_list" => node
            .content
            .iter()
            .enumerate()
            .map(|(i, child)| format!("{}. {}", i + 1, extract_nested(child)))
            .collect::<Vec<_>>()
            .join("\n"),
        "blockquote" => node
            .content
            .iter()
            .map(extract_nested)
            .collect::<Vec<_>>()
            .join("\n")
            .lines()
            .map(|line| format!("> {}", line))
            .collect::<Vec<_>>()
            .join("\n"),
        "codeBlock" | "code_block" => format!("```\n{}\n```", concat_children(node)),
        "hardBreak" | "hard_break" => "\n".to_string(),
        // paragraph, listItem and anything unrecognised
        _ => concat_children(node),
    }
}

fn concat_children(node: &NestedNode) -> String {
    let mut out = node.text.clone().unwrap_or_default();
    for child in &node.content {
        out.push_str(&extract_nested(child));
    }
    out
}
