//! Removal of leftover chart art from assistant text
//!
//! Models sometimes emit ASCII/Unicode bar charts alongside the prose. The
//! cleaner strips box-drawing glyphs and drops filler lines so the
//! remaining text reads as plain prose. It operates on display text only,
//! after table recognition has already run against the uncleaned text, so
//! cleaning never takes a table away from the extractor.

use regex::Regex;

/// Strip box-drawing/bar glyphs and drop filler lines.
///
/// Known limitation, kept as observed behavior: the short-numeric-line rule
/// also drops legitimate standalone values such as a lone `42%`.
pub fn clean_chart_artifacts(text: &str) -> String {
    let box_chars = Regex::new(concat!(
        "[│┃┆┇┊┋║╎╏╵╷╹╻╽╿",
        "┌┍┎┏┐┑┒┓└┕┖┗┘┙┚┛",
        "├┝┞┟┠┡┢┣┤┥┦┧┨┩┪┫",
        "┬┭┮┯┰┱┲┳┴┵┶┷┸┹┺┻",
        "┼┽┾┿╀╁╂╃╄╅╆╇╈╉╊╋",
        "─━┄┅┈┉]"
    ))
    .unwrap();
    let bar_glyphs = Regex::new("[█▇▆▅▄▃▂▁]+").unwrap();
    let interior_space = Regex::new(r"\s{2,}").unwrap();
    let punct_filler = Regex::new(r"^[=._\-:]{4,}$").unwrap();
    let pipe_filler = Regex::new(r"^[|:]{3,}$").unwrap();
    let numeric_noise = Regex::new(r"^[0-9.,\s%\-]+$").unwrap();

    let kept: Vec<String> = text
        .lines()
        .map(|line| {
            let line = box_chars.replace_all(line, " ");
            let line = bar_glyphs.replace_all(&line, " ");
            let line = interior_space.replace_all(&line, " ");
            line.trim_end().to_string()
        })
        .filter(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return true;
            }
            if punct_filler.is_match(trimmed) || pipe_filler.is_match(trimmed) {
                return false;
            }
            !(numeric_noise.is_match(trimmed) && trimmed.chars().count() < 8)
        })
        .collect();

    let extra_newlines = Regex::new(r"\n{3,}").unwrap();
    extra_newlines
        .replace_all(&kept.join("\n"), "\n\n")
        .trim()
        .to_string()
}
