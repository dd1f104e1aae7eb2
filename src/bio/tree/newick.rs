//! Newick reader and writer.
//!
//! Tokens (labels, branch lengths, comments) are lexed with `nom`; nesting is
//! tracked on an explicit stack so arbitrarily deep trees parse without
//! recursion.

use super::{NodeId, Tree, TreeBuilder};
use crate::KerfError;
use nom::{
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::char,
    number::complete::double,
    sequence::{delimited, preceded},
    IResult,
};
use std::path::Path;
use tracing::debug;

const RESERVED: &str = "()[]':;,";

fn is_label_char(c: char) -> bool {
    !c.is_whitespace() && !RESERVED.contains(c)
}

fn comment(input: &str) -> IResult<&str, &str> {
    delimited(char('['), take_until("]"), char(']'))(input)
}

/// Skip whitespace and `[bracketed]` comments.
fn skip_filler(mut input: &str) -> &str {
    loop {
        let trimmed = input.trim_start();
        match comment(trimmed) {
            Ok((rest, _)) => input = rest,
            Err(_) => return trimmed,
        }
    }
}

fn unquoted_label(input: &str) -> IResult<&str, String> {
    let (rest, label) = take_while1(is_label_char)(input)?;
    Ok((rest, label.to_string()))
}

/// `'quoted label'`, with `''` standing for a literal quote.
fn quoted_label(input: &str) -> IResult<&str, String> {
    let (mut rest, _) = char('\'')(input)?;
    let mut label = String::new();
    loop {
        let (after, chunk) = take_while(|c: char| c != '\'')(rest)?;
        label.push_str(chunk);
        let (after, _) = char('\'')(after)?;
        match tag::<_, _, nom::error::Error<&str>>("'")(after) {
            Ok((after_escape, _)) => {
                label.push('\'');
                rest = after_escape;
            }
            Err(_) => return Ok((after, label)),
        }
    }
}

fn branch_length(input: &str) -> IResult<&str, f64> {
    preceded(char(':'), preceded(take_while(|c: char| c.is_whitespace()), double))(input)
}

/// Read the optional `label[:length]` that follows a subtree.
fn read_annotations<'a>(
    input: &'a str,
    builder: &mut TreeBuilder,
    node: NodeId,
) -> Result<&'a str, KerfError> {
    let mut rest = skip_filler(input);
    if let Ok((after, label)) = quoted_label(rest).or_else(|_| unquoted_label(rest)) {
        builder.set_name(node, Some(label));
        rest = skip_filler(after);
    }
    if rest.starts_with(':') {
        let (after, length) = branch_length(rest)
            .map_err(|_| parse_error(rest, "invalid branch length"))?;
        builder.set_branch_length(node, Some(length));
        rest = skip_filler(after);
    }
    Ok(rest)
}

fn parse_error(at: &str, what: &str) -> KerfError {
    let context: String = at.chars().take(24).collect();
    KerfError::Parse(format!("Newick: {} near '{}'", what, context))
}

/// Parse a single Newick tree.
pub fn parse_newick(input: &str) -> Result<Tree, KerfError> {
    let mut builder = TreeBuilder::new();
    let root = builder.root();
    let mut open: Vec<NodeId> = Vec::new();
    let mut root_used = false;
    let mut rest = skip_filler(input);

    if rest.is_empty() {
        return Err(KerfError::Parse("Newick: empty tree description".to_string()));
    }

    'subtree: loop {
        // At the start of a subtree: any number of '(' then a leaf.
        loop {
            rest = skip_filler(rest);
            if let Some(after) = rest.strip_prefix('(') {
                let node = match open.last() {
                    Some(&parent) => builder.add_child(parent, None),
                    None if !root_used => {
                        root_used = true;
                        root
                    }
                    None => return Err(parse_error(rest, "more than one tree")),
                };
                open.push(node);
                rest = after;
            } else {
                let leaf = match open.last() {
                    Some(&parent) => builder.add_child(parent, None),
                    None if !root_used => {
                        root_used = true;
                        root
                    }
                    None => return Err(parse_error(rest, "more than one tree")),
                };
                rest = read_annotations(rest, &mut builder, leaf)?;
                break;
            }
        }

        // After a subtree: ',' opens a sibling, ')' closes a clade, ';' ends.
        loop {
            rest = skip_filler(rest);
            match rest.chars().next() {
                Some(',') if !open.is_empty() => {
                    rest = &rest[1..];
                    continue 'subtree;
                }
                Some(')') => {
                    let closed = open.pop().ok_or_else(|| parse_error(rest, "unbalanced ')'"))?;
                    rest = read_annotations(&rest[1..], &mut builder, closed)?;
                }
                Some(';') if open.is_empty() => {
                    rest = &rest[1..];
                    break 'subtree;
                }
                None if open.is_empty() => break 'subtree,
                None => return Err(parse_error(rest, "unexpected end of input, missing ')'")),
                Some(_) => return Err(parse_error(rest, "unexpected character")),
            }
        }
    }

    if !skip_filler(rest).is_empty() {
        return Err(parse_error(rest, "trailing data after ';'"));
    }

    let tree = builder.build()?;
    debug!(
        "Parsed Newick tree with {} named terminals",
        tree.named_terminal_count()
    );
    Ok(tree)
}

pub fn read_newick<P: AsRef<Path>>(path: P) -> Result<Tree, KerfError> {
    let contents = std::fs::read_to_string(path)?;
    parse_newick(&contents)
}

fn write_label(out: &mut String, tree: &Tree, id: NodeId) {
    let node = tree.node(id);
    if let Some(name) = node.name() {
        if name.chars().all(is_label_char) {
            out.push_str(name);
        } else {
            out.push('\'');
            out.push_str(&name.replace('\'', "''"));
            out.push('\'');
        }
    }
    if let Some(length) = node.branch_length {
        out.push(':');
        out.push_str(&length.to_string());
    }
}

enum Step {
    Enter(NodeId),
    Exit(NodeId),
    Comma,
}

/// Serialize the live part of a tree, terminated by `;`.
pub fn to_newick(tree: &Tree) -> String {
    let mut out = String::new();
    let mut stack = vec![Step::Enter(tree.root())];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => {
                let children = tree.node(id).children();
                if children.is_empty() {
                    write_label(&mut out, tree, id);
                    continue;
                }
                out.push('(');
                stack.push(Step::Exit(id));
                for (i, &child) in children.iter().enumerate().rev() {
                    stack.push(Step::Enter(child));
                    if i > 0 {
                        stack.push(Step::Comma);
                    }
                }
            }
            Step::Exit(id) => {
                out.push(')');
                write_label(&mut out, tree, id);
            }
            Step::Comma => out.push(','),
        }
    }

    out.push(';');
    out
}

pub fn write_newick<P: AsRef<Path>>(path: P, tree: &Tree) -> Result<(), KerfError> {
    let mut text = to_newick(tree);
    text.push('\n');
    std::fs::write(path, text)?;
    Ok(())
}
