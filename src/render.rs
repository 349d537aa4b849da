//! Page rendering in two pure steps: `render` turns a page and the view
//! options into a [`PageView`], and `layout_lines` turns that view into
//! styled terminal lines for a given width.

use std::path::PathBuf;

use ratatui::{
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
};
use textwrap::core::display_width;

use crate::content::{BookContent, Page};
use crate::options::ViewOptions;
use crate::theme::Base16Palette;
use crate::viewport::Density;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Plain,
    Italic,
    Small,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Illustration {
        alt: String,
        source: PathBuf,
        size: Option<(usize, usize)>,
    },
    Heading {
        text: String,
        level: u8,
        align: Align,
    },
    Line {
        text: String,
        emphasis: Emphasis,
        align: Align,
    },
    Body {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub index: usize,
    pub blocks: Vec<Block>,
}

/// Build the visual description of page `index`. Returns `None` past the end.
pub fn render(index: usize, book: &BookContent, options: &ViewOptions) -> Option<PageView> {
    let page = book.page(index)?;
    let blocks = match page {
        Page::Cover {
            image,
            title,
            subtitle,
        } => vec![
            Block::Heading {
                text: title.clone(),
                level: 1,
                align: Align::Center,
            },
            Block::Illustration {
                alt: format!("Book cover: {title}"),
                source: image.source.clone(),
                size: image.size,
            },
            Block::Line {
                text: subtitle.clone(),
                emphasis: Emphasis::Plain,
                align: Align::Center,
            },
        ],
        Page::Dedication {
            image,
            dedication,
            title,
            author,
            summary,
        } => vec![
            Block::Illustration {
                alt: "Book atmosphere".to_string(),
                source: image.source.clone(),
                size: image.size,
            },
            Block::Line {
                text: dedication.clone(),
                emphasis: Emphasis::Italic,
                align: Align::Right,
            },
            Block::Heading {
                text: title.clone(),
                level: 2,
                align: Align::Right,
            },
            Block::Line {
                text: author.clone(),
                emphasis: Emphasis::Plain,
                align: Align::Right,
            },
            Block::Line {
                text: summary.clone(),
                emphasis: Emphasis::Small,
                align: Align::Right,
            },
        ],
        Page::Chapter {
            image,
            image_title,
            text,
        } => {
            let text = book
                .chapter_text(index, options.show_diacritics)
                .unwrap_or(text);
            vec![
                Block::Illustration {
                    alt: format!("Illustration for chapter {}: {image_title}", index + 1),
                    source: image.source.clone(),
                    size: image.size,
                },
                Block::Body {
                    text: text.to_string(),
                },
            ]
        }
    };

    Some(PageView { index, blocks })
}

/// Everything on the page that can be read aloud, in reading order.
pub fn narration_text(view: &PageView) -> String {
    view.blocks
        .iter()
        .filter_map(|block| match block {
            Block::Heading { text, .. } | Block::Line { text, .. } | Block::Body { text } => {
                Some(text.as_str())
            }
            Block::Illustration { .. } => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lay out a page view as terminal lines `width` columns wide.
pub fn layout_lines(
    view: &PageView,
    palette: &Base16Palette,
    density: Density,
    width: usize,
) -> Vec<Line<'static>> {
    let width = width.max(8);
    let mut lines = Vec::new();

    for (i, block) in view.blocks.iter().enumerate() {
        if i > 0 && density == Density::Comfortable {
            lines.push(Line::default());
        }
        match block {
            Block::Illustration { alt, source, size } => {
                lines.extend(illustration_frame(alt, source, *size, palette, density, width));
            }
            Block::Heading { text, level, align } => {
                let mut style = Style::default()
                    .fg(palette.base_07)
                    .add_modifier(Modifier::BOLD);
                if *level == 1 {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                push_wrapped(&mut lines, text, style, *align, width);
            }
            Block::Line {
                text,
                emphasis,
                align,
            } => {
                let style = match emphasis {
                    Emphasis::Plain => Style::default().fg(palette.base_06),
                    Emphasis::Italic => Style::default()
                        .fg(palette.base_05)
                        .add_modifier(Modifier::ITALIC),
                    Emphasis::Small => Style::default().fg(palette.base_04),
                };
                push_wrapped(&mut lines, text, style, *align, width);
            }
            Block::Body { text } => {
                let style = Style::default().fg(palette.base_06);
                // whitespace-pre-line: keep the author's line breaks
                for paragraph in text.lines() {
                    if paragraph.trim().is_empty() {
                        lines.push(Line::default());
                        continue;
                    }
                    push_wrapped(&mut lines, paragraph, style, Align::Right, width);
                }
            }
        }
    }

    lines
}

fn push_wrapped(
    lines: &mut Vec<Line<'static>>,
    text: &str,
    style: Style,
    align: Align,
    width: usize,
) {
    let alignment = match align {
        Align::Center => Alignment::Center,
        Align::Right => Alignment::Right,
    };
    for wrapped in textwrap::wrap(text, width) {
        lines.push(Line::from(Span::styled(wrapped.into_owned(), style)).alignment(alignment));
    }
}

fn illustration_frame(
    alt: &str,
    source: &std::path::Path,
    size: Option<(usize, usize)>,
    palette: &Base16Palette,
    density: Density,
    width: usize,
) -> Vec<Line<'static>> {
    let border = Style::default().fg(palette.base_03);
    let caption = Style::default()
        .fg(palette.base_04)
        .add_modifier(Modifier::ITALIC);

    if density == Density::Compact {
        let label = truncate(&format!("[{alt}]"), width);
        return vec![Line::from(Span::styled(label, caption)).alignment(Alignment::Center)];
    }

    let inner = width.saturating_sub(4);
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let detail = match size {
        Some((w, h)) => format!("{file_name} ({w}x{h})"),
        None => file_name,
    };

    let framed = |text: &str, style: Style| {
        let text = truncate(text, inner);
        let pad = inner - display_width(&text);
        let left = pad / 2;
        Line::from(vec![
            Span::styled("│ ", border),
            Span::raw(" ".repeat(left)),
            Span::styled(text, style),
            Span::raw(" ".repeat(pad - left)),
            Span::styled(" │", border),
        ])
    };

    let rule = "─".repeat(inner + 2);
    vec![
        Line::from(Span::styled(format!("┌{rule}┐"), border)),
        framed(alt, caption),
        framed(&detail, Style::default().fg(palette.base_03)),
        Line::from(Span::styled(format!("└{rule}┘"), border)),
    ]
}

fn truncate(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        let candidate = format!("{out}{ch}…");
        if display_width(&candidate) > max_width {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}
