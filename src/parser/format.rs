//! Canonical formatting for synthesized edits.
//!
//! Removing a node hands its leading trivia to whatever takes its place, so
//! comments and indentation in front of the first modifier or the first
//! import survive. Inserted annotations go on their own line at the
//! member's indentation (or inline inside parameter lists); inserted imports
//! go one per line in sorted position, statics in their own block.

use std::sync::Arc;

use super::ast::{Annotation, CompilationUnit, Import, LeadingTrivia, Modifier};

/// Where an inserted annotation goes relative to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationLayout {
    /// Declarations: one annotation per line when the declaration starts a line
    OwnLine,
    /// Parameters: space separated
    Inline,
}

/// Indentation of the line on which a token with this trivia starts.
pub fn indent_of(leading: &str) -> &str {
    match leading.rfind('\n') {
        Some(newline) => {
            let line = &leading[newline + 1..];
            let end = line
                .find(|c: char| c != ' ' && c != '\t')
                .unwrap_or(line.len());
            &line[..end]
        }
        None => "",
    }
}

fn separator_like(leading: &str, layout: AnnotationLayout) -> String {
    let own_line = layout == AnnotationLayout::OwnLine && (leading.contains('\n') || leading.is_empty());
    if own_line {
        let newline = if leading.contains("\r\n") { "\r\n" } else { "\n" };
        format!("{}{}", newline, indent_of(leading))
    } else {
        " ".to_string()
    }
}

/// Removes the annotations matching `pred` from a modifier list.
///
/// `after` is the trivia of the first token following the list; it receives
/// the list's leading trivia when every modifier goes away.
pub fn remove_annotations(
    modifiers: &mut Vec<Modifier>,
    after: &mut String,
    mut pred: impl FnMut(&Annotation) -> bool,
) -> Vec<Arc<Annotation>> {
    let indices: Vec<usize> = modifiers
        .iter()
        .enumerate()
        .filter(|(_, m)| matches!(m, Modifier::Annotation(a) if pred(a.as_ref())))
        .map(|(i, _)| i)
        .collect();
    remove_modifiers_at(modifiers, after, &indices)
        .into_iter()
        .filter_map(|m| match m {
            Modifier::Annotation(annotation) => Some(annotation),
            Modifier::Keyword(_) => None,
        })
        .collect()
}

/// Removes the modifiers at `indices`. Trivia of modifiers removed from the
/// front goes to the first remaining modifier, or to `after`.
pub fn remove_modifiers_at(
    modifiers: &mut Vec<Modifier>,
    after: &mut String,
    indices: &[usize],
) -> Vec<Modifier> {
    let mut removed = Vec::new();
    let mut kept: Vec<Modifier> = Vec::with_capacity(modifiers.len());
    let mut pending: Option<String> = None;

    for (i, mut modifier) in modifiers.drain(..).enumerate() {
        if indices.contains(&i) {
            if kept.is_empty() && pending.is_none() {
                pending = Some(modifier.leading().to_string());
            }
            removed.push(modifier);
        } else {
            if let Some(leading) = pending.take() {
                modifier.set_leading(leading);
            }
            kept.push(modifier);
        }
    }

    if let Some(leading) = pending {
        *after = leading;
    }
    *modifiers = kept;
    removed
}

/// Inserts an annotation in sorted position (by simple name) among the
/// annotations of a modifier list.
pub fn add_annotation(
    modifiers: &mut Vec<Modifier>,
    after: &mut String,
    mut annotation: Annotation,
    layout: AnnotationLayout,
) {
    let name = annotation.simple_name().to_string();
    let index = modifiers
        .iter()
        .position(|m| m.as_annotation().is_some_and(|a| a.simple_name() > name.as_str()))
        .unwrap_or_else(|| {
            modifiers
                .iter()
                .rposition(|m| m.as_annotation().is_some())
                .map_or(0, |i| i + 1)
        });

    let next_leading = match modifiers.get(index) {
        Some(modifier) => modifier.leading().to_string(),
        None => after.clone(),
    };
    let separator = separator_like(&next_leading, layout);

    if index == 0 {
        annotation.set_leading(next_leading);
        match modifiers.first_mut() {
            Some(first) => first.set_leading(separator),
            None => *after = separator,
        }
    } else {
        annotation.set_leading(separator);
    }
    modifiers.insert(index, Modifier::Annotation(Arc::new(annotation)));
}

/// Replaces the annotation at `index` keeping its position and trivia.
pub fn replace_annotation(modifiers: &mut [Modifier], index: usize, mut annotation: Annotation) {
    if let Some(slot) = modifiers.get_mut(index) {
        annotation.set_leading(slot.leading().to_string());
        *slot = Modifier::Annotation(Arc::new(annotation));
    }
}

fn line_ending(cu: &CompilationUnit) -> &'static str {
    if cu.crlf {
        "\r\n"
    } else {
        "\n"
    }
}

/// Makes sure there is an empty line in front of `leading`.
fn ensure_blank_line(leading: &mut String, newline: &str) {
    let newlines = leading
        .chars()
        .take_while(|c| c.is_whitespace())
        .filter(|&c| c == '\n')
        .count();
    if newlines < 2 {
        leading.insert_str(0, &newline.repeat(2 - newlines));
    }
}

/// Inserts an import in sorted position within its block (static imports
/// form a block after the regular ones).
pub fn add_import(cu: &mut CompilationUnit, mut import: Import) {
    let is_static = import.is_static();
    let name = import.qualified_name();
    let newline = line_ending(cu);

    if cu.imports.is_empty() {
        import.set_leading(if cu.package.is_some() { newline.repeat(2) } else { String::new() });
        ensure_blank_line(cu.body_leading_mut(), newline);
        cu.imports.push(Arc::new(import));
        return;
    }

    let group: Vec<usize> = (0..cu.imports.len())
        .filter(|&i| cu.imports[i].is_static() == is_static)
        .collect();
    let index = group
        .iter()
        .copied()
        .find(|&i| cu.imports[i].qualified_name() > name)
        .or_else(|| group.last().map(|&i| i + 1))
        .unwrap_or(if is_static { cu.imports.len() } else { 0 });

    let boundary = |other_static: bool| {
        if other_static != is_static {
            newline.repeat(2)
        } else {
            newline.to_string()
        }
    };
    // Inserting in front of a block takes over the block's separation
    let starts_block = index < cu.imports.len() && (index == 0 || group.first() == Some(&index));
    if starts_block {
        let first = Arc::make_mut(&mut cu.imports[index]);
        import.set_leading(first.leading().to_string());
        first.set_leading(boundary(first.is_static()));
    } else {
        import.set_leading(boundary(cu.imports[index - 1].is_static()));
    }
    cu.imports.insert(index, Arc::new(import));
}

/// Removes the import at `index`, keeping the layout of the import section.
pub fn remove_import(cu: &mut CompilationUnit, index: usize) -> Arc<Import> {
    let removed = cu.imports.remove(index);
    let leading = removed.leading().to_string();

    if cu.imports.is_empty() {
        // The import section is gone
        let body = cu.body_leading_mut();
        let rest = body.trim_start().to_string();
        *body = format!("{}{}", leading, rest);
    } else if let Some(next) = cu.imports.get_mut(index) {
        let group_start = leading.matches('\n').count() >= 2 && next.is_static() == removed.is_static();
        if index == 0 || group_start {
            Arc::make_mut(next).set_leading(leading);
        }
    }
    removed
}
