//! Rating card images.

use std::sync::Arc;

use anyhow::Result;
use minijinja::AutoEscape;
use minijinja::Environment;
use minijinja::context;
use resvg::usvg::fontdb;
use serde::Serialize;

use crate::rating::RatingFields;

const TEMPLATE_NAME: &str = "rating_card.svg";

const IMAGE_WIDTH: u32 = 800;
const MARGIN: u32 = 20;
const ROW_HEIGHT: u32 = 40;
const MIN_HEADER_HEIGHT: u32 = 120;
const SUBJECT_FIRST_BASELINE: u32 = 107;
const SUBJECT_LINE_HEIGHT: u32 = 24;
const SUBJECT_LINE_CHARS: usize = 55;
const MAX_LABEL_CHARS: usize = 38;

const ROW_EVEN_COLOR: &str = "#F9F9F9";
const ROW_ODD_COLOR: &str = "#FFFFFF";
const ROW_SUMMARY_COLOR: &str = "#FFF3CD";

/// Everything shown on a card.
#[derive(Clone, Debug)]
pub struct RatingCard {
    pub student_id: String,
    pub subject: String,
    pub fields: RatingFields,
}

/// Turns a rating card into PNG bytes.
pub trait Renderer: Send + Sync {
    fn render(&self, card: &RatingCard) -> Result<Vec<u8>>;
}

#[derive(Serialize)]
struct TemplateLine {
    text: String,
    baseline: u32,
}

#[derive(Serialize)]
struct TemplateRow {
    label: String,
    value: String,
    background: &'static str,
    y: u32,
}

/// Renders cards from an SVG template.
pub struct CardRenderer {
    jinja_env: Environment<'static>,
    fontdb: Arc<fontdb::Database>,
}

impl CardRenderer {
    pub fn new() -> Result<Self> {
        let mut jinja_env = Environment::new();
        jinja_env.set_auto_escape_callback(|_| AutoEscape::Html);
        jinja_env.add_template(TEMPLATE_NAME, include_str!("../assets/rating_card.svg"))?;

        let mut fontdb = fontdb::Database::new();
        fontdb.load_system_fonts();
        fontdb.set_sans_serif_family("DejaVu Sans");

        Ok(Self {
            jinja_env,
            fontdb: Arc::new(fontdb),
        })
    }

    /// Renders the card to SVG markup.
    pub fn render_svg(&self, card: &RatingCard) -> Result<(String, u32, u32)> {
        let subject_lines: Vec<TemplateLine> = wrap_words(&card.subject, SUBJECT_LINE_CHARS)
            .into_iter()
            .enumerate()
            .map(|(i, text)| TemplateLine {
                text,
                baseline: SUBJECT_FIRST_BASELINE + i as u32 * SUBJECT_LINE_HEIGHT,
            })
            .collect();

        let subject_bottom = SUBJECT_FIRST_BASELINE
            + (subject_lines.len() as u32).saturating_sub(1) * SUBJECT_LINE_HEIGHT;
        let table_y = MIN_HEADER_HEIGHT.max(subject_bottom + 13);

        let rows: Vec<TemplateRow> = card
            .fields
            .iter()
            .enumerate()
            .map(|(i, (field, value))| TemplateRow {
                label: truncate_label(&field.label()),
                value: value.to_string(),
                background: if field.is_summary() {
                    ROW_SUMMARY_COLOR
                } else if i % 2 == 0 {
                    ROW_EVEN_COLOR
                } else {
                    ROW_ODD_COLOR
                },
                y: table_y + (i as u32 + 1) * ROW_HEIGHT,
            })
            .collect();

        let table_bottom = table_y + (rows.len() as u32 + 1) * ROW_HEIGHT;
        let height = table_bottom + MARGIN * 2;

        let template = self.jinja_env.get_template(TEMPLATE_NAME)?;
        let svg = template.render(context! {
            width => IMAGE_WIDTH,
            height => height,
            margin => MARGIN,
            row_height => ROW_HEIGHT,
            table_y => table_y,
            table_width => IMAGE_WIDTH - MARGIN * 2,
            label_x => MARGIN + 10,
            value_x => IMAGE_WIDTH - MARGIN - 10,
            footer_y => table_bottom + 28,
            student_id => card.student_id.as_str(),
            subject_lines => subject_lines,
            rows => rows,
        })?;

        Ok((svg, IMAGE_WIDTH, height))
    }

    fn svg_to_png(&self, svg: &str, width: u32, height: u32) -> Result<Vec<u8>> {
        let options = resvg::usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };

        let tree = resvg::usvg::Tree::from_str(svg, &options)?;
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| anyhow::anyhow!("Failed to create pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::default(),
            &mut pixmap.as_mut(),
        );
        Ok(pixmap.encode_png()?)
    }
}

impl Renderer for CardRenderer {
    fn render(&self, card: &RatingCard) -> Result<Vec<u8>> {
        let (svg, width, height) = self.render_svg(card)?;
        self.svg_to_png(&svg, width, height)
    }
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        label.to_string()
    } else {
        let head: String = label.chars().take(MAX_LABEL_CHARS - 3).collect();
        format!("{head}...")
    }
}

/// Greedy word wrap by character count. Words longer than a line stay whole.
fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
