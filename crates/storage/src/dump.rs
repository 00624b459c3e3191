//! Diagnostic node listing.

use crate::tree::Tree;

impl Tree {
    /// Emit a plain-text listing of every allocated node through
    /// `sink`, one line per call: a summary line first, then one line
    /// per node with its split byte, flag, and child indices. Intended
    /// for debugging and for eyeballing small trees; the output format
    /// is not stable.
    pub fn dump(&self, sink: &mut dyn FnMut(&str)) {
        sink(&format!(
            "nodes={} keys={} capacity={}",
            self.node_count(),
            self.key_count(),
            self.arena().capacity()
        ));
        for index in 1..self.node_count() {
            let node = self.arena().node(index);
            sink(&format!(
                "node {}: splitchar={} flag={} low={} equal={} high={}",
                index,
                printable(node.splitchar),
                u8::from(node.flag),
                node.low,
                node.equal,
                node.high
            ));
        }
    }
}

fn printable(b: u8) -> String {
    if b.is_ascii_graphic() {
        format!("'{}'", b as char)
    } else {
        format!("0x{b:02x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump_lines(tree: &Tree) -> Vec<String> {
        let mut lines = Vec::new();
        tree.dump(&mut |line: &str| lines.push(line.to_string()));
        lines
    }

    #[test]
    fn dump_lists_every_node_with_flags() {
        let mut tree = Tree::new();
        tree.insert(b"banana");
        tree.insert(b"apples");
        tree.insert(b"bananas");

        let lines = dump_lines(&tree);
        // Summary plus one line per content node.
        assert_eq!(lines.len(), 14);
        assert!(lines[0].starts_with("nodes=14 keys=3"));
        assert!(lines
            .iter()
            .any(|l| l.starts_with("node 6:") && l.contains("flag=1")));
        assert!(lines
            .iter()
            .any(|l| l.starts_with("node 13:") && l.contains("flag=1")));
        // Exactly key_count flags are set.
        let flagged = lines.iter().filter(|l| l.contains("flag=1")).count();
        assert_eq!(flagged, 3);
    }

    #[test]
    fn dump_of_empty_tree_is_just_the_summary() {
        let lines = dump_lines(&Tree::new());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("nodes=1 keys=0"));
    }

    #[test]
    fn unprintable_bytes_are_hex_escaped() {
        let mut tree = Tree::new();
        tree.insert(b"\x00\x7f");
        let lines = dump_lines(&tree);
        assert!(lines[1].contains("0x00"));
        assert!(lines[2].contains("0x7f"));
    }
}
