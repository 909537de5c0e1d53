/// Greedy word wrap to `max_len` characters per line.
///
/// Existing line breaks are kept. A word longer than the limit gets a line of
/// its own rather than being split. `None` or `0` returns the text unchanged.
pub fn wrap_text(text: &str, max_len: Option<usize>) -> String {
    let max_len = match max_len {
        Some(n) if n > 0 => n,
        _ => return text.to_string(),
    };

    let mut out: Vec<String> = Vec::new();
    for line in text.split('\n') {
        if line.chars().count() <= max_len {
            out.push(line.to_string());
            continue;
        }
        let mut current = String::new();
        let mut current_len = 0;
        for word in line.split(' ').filter(|w| !w.is_empty()) {
            let word_len = word.chars().count();
            if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_len {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                out.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            }
        }
        out.push(current);
    }
    out.join("\n")
}
