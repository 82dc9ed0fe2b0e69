use colored::Colorize;
use serde::Serialize;
use syntect::parsing::SyntaxReference;
use syntect::{
    easy::HighlightLines,
    highlighting::{Style, ThemeSet},
    parsing::SyntaxSet,
    util::{as_24_bit_terminal_escaped, LinesWithEndings},
};

use crate::error::Result;

/// Serializes `value` and prints it, highlighted unless `raw` is set.
pub fn print_json<T: Serialize>(value: &T, raw: bool) -> Result<()> {
    let compact = serde_json::to_string(value)?;
    if raw {
        println!("{}", compact);
        return Ok(());
    }
    let pretty = jsonxf::pretty_print(&compact).unwrap_or(compact);
    print_syntect(&pretty, "json");
    println!();
    Ok(())
}

pub fn print_syntect(s: &str, ext: &str) {
    let ps = SyntaxSet::load_defaults_newlines();
    let ts = ThemeSet::load_defaults();

    let syntax: &SyntaxReference = ps
        .find_syntax_by_extension(ext)
        .unwrap_or_else(|| ps.find_syntax_plain_text()); // fallback if not found

    let mut h = HighlightLines::new(syntax, &ts.themes["base16-ocean.dark"]);

    for line in LinesWithEndings::from(s) {
        match h.highlight_line(line, &ps) {
            Ok(ranges) => {
                let ranges: Vec<(Style, &str)> = ranges;
                print!("{}", as_24_bit_terminal_escaped(&ranges[..], true));
            }
            Err(_) => print!("{}", line),
        }
    }
}

/// One-line footer for list commands, e.g. `3 questions · page 1 · more available`.
pub fn page_summary(count: usize, noun: &str, page: u32, has_more: bool) -> String {
    let more = if has_more {
        "more available".yellow().to_string()
    } else {
        "last page".dimmed().to_string()
    };
    format!(
        "{} {} · page {} · {}",
        count.to_string().green().bold(),
        noun,
        page,
        more
    )
}

pub fn format_probability(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_json_renders_question_page() {
        let page: crate::types::QuestionList = serde_json::from_value(serde_json::json!({
            "questions": [{"id": 1, "name": "Will it rain?",
                           "answers": [{"id": 7, "name": "Yes", "probability": 0.65}]}],
            "page": 1,
            "has_more": false
        }))
        .unwrap();
        assert!(print_json(&page.questions, true).is_ok());
        assert!(print_json(&page.questions, false).is_ok());
    }

    #[test]
    fn test_page_summary_mentions_counts() {
        colored::control::set_override(false);
        assert_eq!(
            page_summary(3, "questions", 1, true),
            "3 questions · page 1 · more available"
        );
        assert_eq!(
            page_summary(0, "comments", 2, false),
            "0 comments · page 2 · last page"
        );
    }

    #[test]
    fn test_format_probability() {
        assert_eq!(format_probability(0.65), "65.0%");
        assert_eq!(format_probability(0.0), "0.0%");
    }
}
