/// Split `text` into chunks of at most `limit` characters, preferring line boundaries.
///
/// Lines longer than `limit` are broken at the last whitespace that fits, or hard-split
/// on character boundaries when a single word is too long. Chunks keep the original
/// newlines between the lines they contain; the newline (or space) at a split point is
/// dropped. Chunks made only of whitespace are never emitted.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut out = Vec::new();
    let mut chunk = String::new();
    let mut chunk_len = 0usize;
    let mut has_line = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        // +1 for the joining newline.
        if has_line && chunk_len + 1 + line_len <= limit {
            chunk.push('\n');
            chunk.push_str(line);
            chunk_len += 1 + line_len;
            continue;
        }

        if has_line {
            flush(&mut out, &mut chunk);
        }

        let mut rest: Vec<char> = line.chars().collect();
        while rest.len() > limit {
            let (head, skip) = match rest[1..=limit].iter().rposition(|c| c.is_whitespace()) {
                Some(i) => (i + 1, 1),
                None => (limit, 0),
            };
            out.push(rest[..head].iter().collect());
            rest.drain(..head + skip);
        }
        chunk = rest.iter().collect();
        chunk_len = rest.len();
        has_line = true;
    }

    if has_line {
        flush(&mut out, &mut chunk);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn flush(out: &mut Vec<String>, chunk: &mut String) {
    let chunk = std::mem::take(chunk);
    if !chunk.trim().is_empty() {
        out.push(chunk);
    }
}
