// src/render/terminal.rs
// =============================================================================
// Renders Markdown for the console.
//
// We use the `pulldown-cmark` crate which parses Markdown into a stream of
// events (start of heading, text, end of list item, ...). We walk those
// events and print styled text with `colored`:
// - headings: bold, underlined, cyan
// - **strong** spans: bold
// - list items: indented with a bullet
//
// Colors are switched off automatically when stdout is not a terminal or
// NO_COLOR is set.
// =============================================================================

use colored::Colorize;
use pulldown_cmark::{Event, Parser, Tag};

pub fn render_for_terminal(markdown: &str) -> String {
    let mut out = String::new();

    // Where we are in the document; decides how text gets styled
    let mut in_heading = false;
    let mut in_strong = false;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading(..)) => in_heading = true,
            Event::End(Tag::Heading(..)) => {
                in_heading = false;
                out.push_str("\n\n");
            }

            Event::Start(Tag::Strong) => in_strong = true,
            Event::End(Tag::Strong) => in_strong = false,

            Event::Start(Tag::Item) => out.push_str("  • "),
            Event::End(Tag::Item) => out.push('\n'),
            Event::End(Tag::List(_)) => out.push('\n'),

            Event::End(Tag::Paragraph) => out.push('\n'),

            Event::Text(text) | Event::Code(text) => {
                let styled = if in_heading {
                    (*text).bold().underline().cyan().to_string()
                } else if in_strong {
                    (*text).bold().to_string()
                } else {
                    text.to_string()
                };
                out.push_str(&styled);
            }

            Event::SoftBreak | Event::HardBreak => out.push('\n'),

            // Nothing else shows up in the summaries we render
            _ => {}
        }
    }

    out
}
