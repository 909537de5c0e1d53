use once_cell::sync::Lazy;
use regex::Regex;

static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("think block pattern"));
static THINK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?think>").expect("think tag pattern"));

/// Strips `<think>` reasoning blocks and stray think tags from model output, then trims.
///
/// Blocks are removed one by one (non-greedy), so text between two blocks
/// survives. Leftover tags come from blocks cut off by the token limit.
/// Both passes repeat until nothing changes, since removing a tag can join its
/// neighbours into a new one.
pub fn strip_reasoning(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let without_blocks = THINK_BLOCK.replace_all(&text, "");
        let without_tags = THINK_TAG.replace_all(&without_blocks, "").into_owned();
        if without_tags == text {
            break;
        }
        text = without_tags;
    }
    text.trim().to_string()
}
