//! Plain-text drawing of a tree, one node per line.

use super::{NodeId, Tree};

pub fn render_ascii(tree: &Tree) -> String {
    let mut out = String::new();
    // (node, prefix for this line, prefix for its children)
    let mut stack: Vec<(NodeId, String, String)> = vec![(tree.root(), String::new(), String::new())];

    while let Some((id, line_prefix, child_prefix)) = stack.pop() {
        let node = tree.node(id);
        out.push_str(&line_prefix);
        match node.name() {
            Some(name) => out.push_str(name),
            None if node.is_terminal() => out.push('·'),
            None => out.push('┐'),
        }
        out.push('\n');

        let children = node.children();
        for (i, &child) in children.iter().enumerate().rev() {
            let last = i + 1 == children.len();
            let (branch, extend) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
            stack.push((
                child,
                format!("{}{}", child_prefix, branch),
                format!("{}{}", child_prefix, extend),
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::tree::newick::parse_newick;

    #[test]
    fn test_render_layout() {
        let tree = parse_newick("((A,B),C);").unwrap();
        let text = render_ascii(&tree);
        let expected = "┐\n├── ┐\n│   ├── A\n│   └── B\n└── C\n";
        assert_eq!(text, expected);
    }
}
