//! Minimal PhyloXML writer: clade nesting, names and branch lengths.

use super::{NodeId, Tree};
use crate::KerfError;
use std::path::Path;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

enum Step {
    Open(NodeId, usize),
    Close(usize),
}

pub fn to_phyloxml(tree: &Tree) -> String {
    let mut out = String::new();
    out.push_str("<?xml version='1.0' encoding='UTF-8'?>\n");
    out.push_str(
        "<phy:phyloxml xmlns:phy=\"http://www.phyloxml.org\">\n  <phy:phylogeny rooted=\"true\">\n",
    );

    let mut stack = vec![Step::Open(tree.root(), 2)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Open(id, level) => {
                let pad = "  ".repeat(level);
                let node = tree.node(id);
                out.push_str(&format!("{}<phy:clade>\n", pad));
                if let Some(name) = node.name() {
                    out.push_str(&format!("{}  <phy:name>{}</phy:name>\n", pad, escape(name)));
                }
                if let Some(length) = node.branch_length {
                    out.push_str(&format!(
                        "{}  <phy:branch_length>{}</phy:branch_length>\n",
                        pad, length
                    ));
                }
                stack.push(Step::Close(level));
                for &child in node.children().iter().rev() {
                    stack.push(Step::Open(child, level + 1));
                }
            }
            Step::Close(level) => {
                out.push_str(&format!("{}</phy:clade>\n", "  ".repeat(level)));
            }
        }
    }

    out.push_str("  </phy:phylogeny>\n</phy:phyloxml>\n");
    out
}

pub fn write_phyloxml<P: AsRef<Path>>(path: P, tree: &Tree) -> Result<(), KerfError> {
    std::fs::write(path, to_phyloxml(tree))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::tree::newick::parse_newick;

    #[test]
    fn test_nesting_and_escaping() {
        let tree = parse_newick("('A&B':0.5,(C,D));").unwrap();
        let xml = to_phyloxml(&tree);
        assert_eq!(xml.matches("<phy:clade>").count(), 5);
        assert_eq!(xml.matches("</phy:clade>").count(), 5);
        assert!(xml.contains("<phy:name>A&amp;B</phy:name>"));
        assert!(xml.contains("<phy:branch_length>0.5</phy:branch_length>"));
        assert!(xml.trim_end().ends_with("</phy:phyloxml>"));
    }
}
