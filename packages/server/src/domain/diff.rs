//! 差分エンジン
//!
//! 2 つのプログラム出力の行単位の unified diff を計算します。
//! 出力は任意のバイト列です。`\n` で行に分割し、改行文字も行に含めるため、
//! 末尾の改行の有無も差分になります:
//!
//! ```text
//! @@ -1,2 +1,1 @@
//! -5
//! -3
//! +8
//! ```
//!
//! UTF-8 として不正なバイトを含む行は `\xNN` 形式でエスケープし（`\` 自体は `\\`）、
//! 直後にマーカー行を付けます。パッチは常に元のバイト列を再構築できます。

use std::{collections::HashMap, ops::Range};

use super::error::PatchError;

/// Unchanged lines shown around each change.
pub const CONTEXT_LINES: usize = 3;

const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";
const ESCAPED_MARKER: &str = "\\ Non-UTF-8 bytes escaped";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditOp {
    Equal(usize, usize), // old_idx, new_idx
    Delete(usize),       // old_idx
    Insert(usize),       // new_idx
}

impl EditOp {
    fn is_equal(&self) -> bool {
        matches!(self, EditOp::Equal(..))
    }
}

/// Compute the patch turning `old` into `new`.
///
/// Returns an empty string when both inputs are identical. The result is
/// deterministic: the same inputs always produce byte-identical patches.
/// Memory use is linear in the input size; time is `O((N + M) * D)` over the
/// lines both sides have in common.
pub fn diff(old: &[u8], new: &[u8]) -> String {
    if old == new {
        return String::new();
    }

    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let ops = compute_edit_ops(&old_lines, &new_lines);

    let mut output = String::new();
    // Lines consumed on each side before the current hunk starts.
    let (mut old_before, mut new_before, mut consumed) = (0, 0, 0);
    for range in hunk_ranges(&ops) {
        for op in &ops[consumed..range.start] {
            match op {
                EditOp::Equal(..) => {
                    old_before += 1;
                    new_before += 1;
                }
                EditOp::Delete(_) => old_before += 1,
                EditOp::Insert(_) => new_before += 1,
            }
        }
        consumed = range.start;
        write_hunk(
            &mut output,
            &old_lines,
            &new_lines,
            old_before,
            new_before,
            &ops[range],
        );
    }
    output
}

/// Rebuild the new side of a patch from the old side.
///
/// Context and removed lines are checked against `original`, so a patch
/// applied to the wrong input is rejected instead of producing garbage.
pub fn apply_patch(original: &[u8], patch: &str) -> Result<Vec<u8>, PatchError> {
    let old_lines = split_lines(original);
    let mut output = Vec::with_capacity(original.len());
    let mut cursor = 0;
    let mut lines = patch.split_inclusive('\n').peekable();

    while let Some(header) = lines.next() {
        let (old_start, old_count) = parse_hunk_header(header)?;
        let hunk_start = if old_count == 0 {
            old_start
        } else {
            old_start.saturating_sub(1)
        };
        if hunk_start < cursor || hunk_start > old_lines.len() {
            return Err(PatchError::OutOfRange { line: old_start });
        }
        for line in &old_lines[cursor..hunk_start] {
            output.extend_from_slice(line);
        }
        cursor = hunk_start;

        while let Some(body) = lines.next_if(|line| !line.starts_with("@@")) {
            let text = body.strip_suffix('\n').unwrap_or(body);
            let (tag, content) = match text.chars().next() {
                Some(tag @ (' ' | '-' | '+')) => (tag, &text[1..]),
                _ => return Err(PatchError::UnexpectedLine(text.to_string())),
            };
            let escaped = lines
                .next_if(|line| line.starts_with(ESCAPED_MARKER))
                .is_some();
            let terminated = lines
                .next_if(|line| line.starts_with(NO_NEWLINE_MARKER))
                .is_none();
            let mut bytes = if escaped {
                unescape(content).ok_or_else(|| PatchError::UnexpectedLine(text.to_string()))?
            } else {
                content.as_bytes().to_vec()
            };
            if terminated {
                bytes.push(b'\n');
            }

            match tag {
                '+' => output.extend_from_slice(&bytes),
                _ => {
                    if old_lines.get(cursor) != Some(&bytes.as_slice()) {
                        return Err(PatchError::ContextMismatch { line: cursor + 1 });
                    }
                    if tag == ' ' {
                        output.extend_from_slice(&bytes);
                    }
                    cursor += 1;
                }
            }
        }
    }

    for line in &old_lines[cursor..] {
        output.extend_from_slice(line);
    }
    Ok(output)
}

fn split_lines(bytes: &[u8]) -> Vec<&[u8]> {
    bytes.split_inclusive(|b| *b == b'\n').collect()
}

/// Edit script built from a longest common subsequence of lines.
///
/// Lines are interned to ids first. A line that occurs on only one side can
/// never be part of the subsequence, so it is dropped before the search and
/// outputs that share nothing are handled in linear time.
fn compute_edit_ops(old: &[&[u8]], new: &[&[u8]]) -> Vec<EditOp> {
    let mut ids = HashMap::new();
    let old_ids = intern(&mut ids, old);
    let new_ids = intern(&mut ids, new);

    // (occurs in old, occurs in new) per id
    let mut seen = vec![(false, false); ids.len()];
    for &id in &old_ids {
        seen[id].0 = true;
    }
    for &id in &new_ids {
        seen[id].1 = true;
    }
    let (old_index, old_seq): (Vec<usize>, Vec<usize>) = old_ids
        .iter()
        .enumerate()
        .filter(|(_, id)| seen[**id].1)
        .map(|(i, id)| (i, *id))
        .unzip();
    let (new_index, new_seq): (Vec<usize>, Vec<usize>) = new_ids
        .iter()
        .enumerate()
        .filter(|(_, id)| seen[**id].0)
        .map(|(j, id)| (j, *id))
        .unzip();

    let mut matches = Vec::new();
    common_subsequence(&old_seq, &new_seq, 0, 0, &mut matches);

    // Within each gap, removals come before additions.
    let mut ops = Vec::with_capacity(old.len() + new.len());
    let (mut i, mut j) = (0, 0);
    for (a, b) in matches {
        let (oi, ni) = (old_index[a], new_index[b]);
        ops.extend((i..oi).map(EditOp::Delete));
        ops.extend((j..ni).map(EditOp::Insert));
        ops.push(EditOp::Equal(oi, ni));
        (i, j) = (oi + 1, ni + 1);
    }
    ops.extend((i..old.len()).map(EditOp::Delete));
    ops.extend((j..new.len()).map(EditOp::Insert));
    ops
}

fn intern<'a>(ids: &mut HashMap<&'a [u8], usize>, lines: &[&'a [u8]]) -> Vec<usize> {
    lines
        .iter()
        .map(|line| {
            let next = ids.len();
            *ids.entry(*line).or_insert(next)
        })
        .collect()
}

/// Append the index pairs of a longest common subsequence of `a` and `b`,
/// offset by `a_off` / `b_off`, in increasing order.
///
/// Myers' divide-and-conquer search: the common prefix and suffix are peeled
/// off, then the middle snake splits the rest into two smaller problems.
fn common_subsequence(
    a: &[usize],
    b: &[usize],
    a_off: usize,
    b_off: usize,
    matches: &mut Vec<(usize, usize)>,
) {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    matches.extend((0..prefix).map(|k| (a_off + k, b_off + k)));
    let (a, b) = (&a[prefix..], &b[prefix..]);
    let (a_off, b_off) = (a_off + prefix, b_off + prefix);

    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (a, b) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

    if !a.is_empty() && !b.is_empty() {
        if let Some(snake) = middle_snake(a, b) {
            common_subsequence(&a[..snake.x0], &b[..snake.y0], a_off, b_off, matches);
            matches.extend(
                (0..snake.x1 - snake.x0).map(|k| (a_off + snake.x0 + k, b_off + snake.y0 + k)),
            );
            common_subsequence(
                &a[snake.x1..],
                &b[snake.y1..],
                a_off + snake.x1,
                b_off + snake.y1,
                matches,
            );
        }
    }

    matches.extend((0..suffix).map(|k| (a_off + a.len() + k, b_off + b.len() + k)));
}

/// Diagonal run of equal elements from `(x0, y0)` to `(x1, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snake {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

impl Snake {
    /// `None` when the snake would not split `n x m` into smaller problems.
    fn split(x0: isize, y0: isize, x1: isize, y1: isize, n: isize, m: isize) -> Option<Self> {
        let at_corner = (x0 == 0 && y0 == 0) || (x0 == n && y0 == m);
        if x1 == x0 && at_corner {
            return None;
        }
        Some(Self {
            x0: usize::try_from(x0).ok()?,
            y0: usize::try_from(y0).ok()?,
            x1: usize::try_from(x1).ok()?,
            y1: usize::try_from(y1).ok()?,
        })
    }
}

/// Find the snake in the middle of an optimal edit path between `a` and `b`.
///
/// Searches forward from the start and backward from the end at the same
/// time; only two diagonals vectors of `O(N + M)` are kept. Both inputs must
/// be non-empty with no common prefix or suffix.
fn middle_snake(a: &[usize], b: &[usize]) -> Option<Snake> {
    let (n, m) = (a.len() as isize, b.len() as isize);
    let delta = n - m;
    let odd = delta % 2 != 0;
    let max = (n + m + 1) / 2;
    let offset = max + 1;
    let at = |k: isize| (k + offset) as usize;

    // Furthest x reached on each diagonal k = x - y; backward measures from the end.
    let mut forward = vec![0isize; (2 * offset + 1) as usize];
    let mut backward = forward.clone();

    for d in 0..=max {
        for k in (-d..=d).step_by(2) {
            let mut x = if k == -d || (k != d && forward[at(k - 1)] < forward[at(k + 1)]) {
                forward[at(k + 1)]
            } else {
                forward[at(k - 1)] + 1
            };
            let mut y = x - k;
            let (x0, y0) = (x, y);
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            forward[at(k)] = x;

            let reverse_k = delta - k;
            if odd
                && (-(d - 1)..=d - 1).contains(&reverse_k)
                && x + backward[at(reverse_k)] >= n
                && x <= n
                && y <= m
            {
                return Snake::split(x0, y0, x, y, n, m);
            }
        }

        for k in (-d..=d).step_by(2) {
            let mut x = if k == -d || (k != d && backward[at(k - 1)] < backward[at(k + 1)]) {
                backward[at(k + 1)]
            } else {
                backward[at(k - 1)] + 1
            };
            let mut y = x - k;
            let (x0, y0) = (x, y);
            while x < n && y < m && a[(n - x - 1) as usize] == b[(m - y - 1) as usize] {
                x += 1;
                y += 1;
            }
            backward[at(k)] = x;

            let forward_k = delta - k;
            if !odd
                && (-d..=d).contains(&forward_k)
                && x + forward[at(forward_k)] >= n
                && x <= n
                && y <= m
            {
                return Snake::split(n - x, m - y, n - x0, m - y0, n, m);
            }
        }
    }
    None
}

/// Group changes into hunks, merging changes whose context would overlap.
fn hunk_ranges(ops: &[EditOp]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < ops.len() {
        if ops[i].is_equal() {
            i += 1;
            continue;
        }

        let start = i.saturating_sub(CONTEXT_LINES);
        let mut end = i;
        loop {
            while end < ops.len() && !ops[end].is_equal() {
                end += 1;
            }
            let mut next = end;
            while next < ops.len() && ops[next].is_equal() {
                next += 1;
            }
            if next < ops.len() && next - end <= 2 * CONTEXT_LINES {
                end = next;
            } else {
                break;
            }
        }

        ranges.push(start..(end + CONTEXT_LINES).min(ops.len()));
        i = end;
    }

    ranges
}

fn write_hunk(
    output: &mut String,
    old: &[&[u8]],
    new: &[&[u8]],
    old_before: usize,
    new_before: usize,
    hunk: &[EditOp],
) {
    let old_count = hunk
        .iter()
        .filter(|op| !matches!(op, EditOp::Insert(_)))
        .count();
    let new_count = hunk
        .iter()
        .filter(|op| !matches!(op, EditOp::Delete(_)))
        .count();

    output.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        hunk_start(old_before, old_count),
        old_count,
        hunk_start(new_before, new_count),
        new_count
    ));

    for op in hunk {
        match *op {
            EditOp::Equal(oi, _) => write_line(output, ' ', old[oi]),
            EditOp::Delete(oi) => write_line(output, '-', old[oi]),
            EditOp::Insert(ni) => write_line(output, '+', new[ni]),
        }
    }
}

/// Unified diff numbers an empty range by the line before it.
fn hunk_start(before: usize, count: usize) -> usize {
    if count == 0 { before } else { before + 1 }
}

fn write_line(output: &mut String, tag: char, line: &[u8]) {
    let (content, terminated) = match line.strip_suffix(b"\n") {
        Some(content) => (content, true),
        None => (line, false),
    };

    output.push(tag);
    let escaped = match std::str::from_utf8(content) {
        Ok(text) => {
            output.push_str(text);
            false
        }
        Err(_) => {
            push_escaped(output, content);
            true
        }
    };
    output.push('\n');

    if escaped {
        output.push_str(ESCAPED_MARKER);
        output.push('\n');
    }
    if !terminated {
        output.push_str(NO_NEWLINE_MARKER);
        output.push('\n');
    }
}

fn push_escaped(output: &mut String, bytes: &[u8]) {
    for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            if c == '\\' {
                output.push_str("\\\\");
            } else {
                output.push(c);
            }
        }
        for byte in chunk.invalid() {
            output.push_str(&format!("\\x{byte:02x}"));
        }
    }
}

/// Inverse of [`push_escaped`]; `None` on a malformed escape.
fn unescape(text: &str) -> Option<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            output.push(bytes[i]);
            i += 1;
            continue;
        }
        match bytes.get(i + 1)? {
            b'\\' => {
                output.push(b'\\');
                i += 2;
            }
            b'x' => {
                let hex = std::str::from_utf8(bytes.get(i + 2..i + 4)?).ok()?;
                output.push(u8::from_str_radix(hex, 16).ok()?);
                i += 4;
            }
            _ => return None,
        }
    }
    Some(output)
}

fn parse_hunk_header(line: &str) -> Result<(usize, usize), PatchError> {
    let malformed = || PatchError::MalformedHeader(line.trim_end().to_string());

    let old_range = line
        .strip_prefix("@@ -")
        .and_then(|rest| rest.split_whitespace().next())
        .ok_or_else(malformed)?;
    let (start, count) = old_range.split_once(',').unwrap_or((old_range, "1"));
    let start = start.parse().map_err(|_| malformed())?;
    let count = count.parse().map_err(|_| malformed())?;
    Ok((start, count))
}
