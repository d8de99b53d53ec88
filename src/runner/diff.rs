//! Line based unified diff for dry-run reports.

use std::ops::{Index, IndexMut};

/// Unchanged lines shown around each change
const CONTEXT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

#[derive(Debug, Clone, Copy)]
struct Edit<'a> {
    op: Op,
    line: &'a str,
}

fn common_prefix(a: &[&str], b: &[&str]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[&str], b: &[&str]) -> usize {
    a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

/// Furthest reaching `x` per diagonal `k`, for `k` in `-max..=max`.
struct Frontier {
    offset: isize,
    xs: Vec<usize>,
}

impl Frontier {
    fn new(max: usize) -> Self {
        Self {
            offset: max as isize,
            xs: vec![0; 2 * max + 1],
        }
    }
}

impl Index<isize> for Frontier {
    type Output = usize;

    fn index(&self, k: isize) -> &usize {
        &self.xs[(k + self.offset) as usize]
    }
}

impl IndexMut<isize> for Frontier {
    fn index_mut(&mut self, k: isize) -> &mut usize {
        &mut self.xs[(k + self.offset) as usize]
    }
}

/// Myers' middle snake: a split point `(x, y)` of an optimal edit script,
/// found with forward and backward searches in linear space.
fn middle_snake(old: &[&str], new: &[&str]) -> Option<(usize, usize)> {
    let (n, m) = (old.len(), new.len());
    let delta = n as isize - m as isize;
    let odd = delta & 1 == 1;
    let max = (n + m + 1) / 2 + 1;
    let mut forward = Frontier::new(max);
    let mut backward = Frontier::new(max);

    for d in 0..max as isize {
        for k in (-d..=d).rev().step_by(2) {
            let mut x = if k == -d || (k != d && forward[k - 1] < forward[k + 1]) {
                forward[k + 1]
            } else {
                forward[k - 1] + 1
            };
            let y = (x as isize - k) as usize;
            let (x0, y0) = (x, y);
            if x < n && y < m {
                x += common_prefix(&old[x..], &new[y..]);
            }
            forward[k] = x;
            if odd && (k - delta).abs() < d && forward[k] + backward[delta - k] >= n {
                return Some((x0, y0));
            }
        }
        for k in (-d..=d).rev().step_by(2) {
            let mut x = if k == -d || (k != d && backward[k - 1] < backward[k + 1]) {
                backward[k + 1]
            } else {
                backward[k - 1] + 1
            };
            let mut y = (x as isize - k) as usize;
            if x < n && y < m {
                let advance = common_suffix(&old[..n - x], &new[..m - y]);
                x += advance;
                y += advance;
            }
            backward[k] = x;
            if !odd && (k - delta).abs() <= d && backward[k] + forward[delta - k] >= n {
                return Some((n - x, m - y));
            }
        }
    }
    None
}

fn push_all<'a>(edits: &mut Vec<Edit<'a>>, op: Op, lines: &[&'a str]) {
    edits.extend(lines.iter().map(|&line| Edit { op, line }));
}

/// Divide and conquer around middle snakes; common prefix and suffix are
/// peeled off at every level.
fn conquer<'a>(old: &[&'a str], new: &[&'a str], edits: &mut Vec<Edit<'a>>) {
    let prefix = common_prefix(old, new);
    push_all(edits, Op::Equal, &old[..prefix]);
    let (old, new) = (&old[prefix..], &new[prefix..]);
    let suffix = common_suffix(old, new);
    let old_mid = &old[..old.len() - suffix];
    let new_mid = &new[..new.len() - suffix];

    if old_mid.is_empty() {
        push_all(edits, Op::Insert, new_mid);
    } else if new_mid.is_empty() {
        push_all(edits, Op::Delete, old_mid);
    } else if let Some((x, y)) = middle_snake(old_mid, new_mid) {
        conquer(&old_mid[..x], &new_mid[..y], edits);
        conquer(&old_mid[x..], &new_mid[y..], edits);
    } else {
        push_all(edits, Op::Delete, old_mid);
        push_all(edits, Op::Insert, new_mid);
    }

    push_all(edits, Op::Equal, &old[old.len() - suffix..]);
}

/// Shortest edit script between two line lists. Within each changed run
/// deletions come before insertions.
fn line_edits<'a>(before: &[&'a str], after: &[&'a str]) -> Vec<Edit<'a>> {
    let mut edits = Vec::with_capacity(before.len().max(after.len()));
    conquer(before, after, &mut edits);
    for run in edits.split_mut(|e| e.op == Op::Equal) {
        run.sort_by_key(|e| e.op == Op::Insert);
    }
    edits
}

/// Unified diff of `before` and `after` with `a/` and `b/` headers.
/// Empty when the texts are equal.
pub fn unified_diff(path: &str, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }
    let old: Vec<&str> = before.split_inclusive('\n').collect();
    let new: Vec<&str> = after.split_inclusive('\n').collect();
    let edits = line_edits(&old, &new);

    // Line numbers reached before each edit
    let mut old_pos = Vec::with_capacity(edits.len());
    let mut new_pos = Vec::with_capacity(edits.len());
    let (mut o, mut n) = (0, 0);
    for edit in &edits {
        old_pos.push(o);
        new_pos.push(n);
        match edit.op {
            Op::Equal => {
                o += 1;
                n += 1;
            }
            Op::Delete => o += 1,
            Op::Insert => n += 1,
        }
    }

    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for (index, _) in edits.iter().enumerate().filter(|(_, e)| e.op != Op::Equal) {
        match hunks.last_mut() {
            Some((_, last)) if index - *last <= 2 * CONTEXT + 1 => *last = index,
            _ => hunks.push((index, index)),
        }
    }

    let mut out = format!("--- a/{}\n+++ b/{}\n", path, path);
    for (first, last) in hunks {
        let start = first.saturating_sub(CONTEXT);
        let end = (last + CONTEXT + 1).min(edits.len());
        let slice = &edits[start..end];
        let old_count = slice.iter().filter(|e| e.op != Op::Insert).count();
        let new_count = slice.iter().filter(|e| e.op != Op::Delete).count();
        out.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_pos[start] + usize::from(old_count > 0),
            old_count,
            new_pos[start] + usize::from(new_count > 0),
            new_count
        ));
        for edit in slice {
            out.push(match edit.op {
                Op::Equal => ' ',
                Op::Delete => '-',
                Op::Insert => '+',
            });
            out.push_str(edit.line);
            if !edit.line.ends_with('\n') {
                out.push_str("\n\\ No newline at end of file\n");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_equal_texts_have_no_diff() {
        assert_eq!(unified_diff("A.java", "class A {}\n", "class A {}\n"), "");
    }

    #[test]
    fn test_single_hunk() {
        assert_eq!(
            unified_diff("x", "a\nb\nc\n", "a\nB\nc\n"),
            "--- a/x\n+++ b/x\n@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n"
        );
    }

    #[test]
    fn test_distant_changes_get_separate_hunks() {
        let before: String = (1..=12).map(|i| format!("{}\n", i)).collect();
        let after = before.replacen("1\n", "x\n", 1).replace("12\n", "y\n");
        assert_eq!(
            unified_diff("f", &before, &after),
            "--- a/f\n+++ b/f\n@@ -1,4 +1,4 @@\n-1\n+x\n 2\n 3\n 4\n@@ -9,4 +9,4 @@\n 9\n 10\n 11\n-12\n+y\n"
        );
    }

    #[test]
    fn test_insertion_and_missing_newline() {
        assert_eq!(
            unified_diff("p", "a=1", "a=1\nb=2"),
            "--- a/p\n+++ b/p\n@@ -1,1 +1,2 @@\n-a=1\n\\ No newline at end of file\n+a=1\n+b=2\n\\ No newline at end of file\n"
        );
    }

    #[test]
    fn test_large_file_with_edits_at_both_ends() {
        let before: String = (0..20_000).map(|i| format!("line {}\n", i)).collect();
        let after = format!("import a;\n{}", before).replace("line 19998\n", "changed\n");
        let diff = unified_diff("Big.java", &before, &after);
        assert_eq!(diff.matches("@@ -").count(), 2);
        assert!(diff.contains("@@ -1,3 +1,4 @@\n+import a;\n line 0\n"));
        assert!(diff.contains("-line 19998\n+changed\n line 19999\n"));
    }

    #[test]
    fn test_reordered_lines_keep_minimal_script() {
        let edits = line_edits(&["a\n", "b\n", "c\n", "d\n"], &["b\n", "a\n", "c\n", "e\n", "d\n"]);
        let changed = edits.iter().filter(|e| e.op != Op::Equal).count();
        assert_eq!(changed, 3);
        let old: Vec<_> = edits.iter().filter(|e| e.op != Op::Insert).map(|e| e.line).collect();
        let new: Vec<_> = edits.iter().filter(|e| e.op != Op::Delete).map(|e| e.line).collect();
        assert_eq!(old, vec!["a\n", "b\n", "c\n", "d\n"]);
        assert_eq!(new, vec!["b\n", "a\n", "c\n", "e\n", "d\n"]);
    }
}
