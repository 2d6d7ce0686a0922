//! Dominant topic of every entry and the composite topic-cloud image.

use std::path::Path;

use image::{Rgb, RgbImage, imageops};
use log::{debug, info};

use crate::cloud::{CloudStyle, WHITE, WordCloud, save_png};
use crate::error::{Error, Result};
use crate::font::{draw_text, text_size};
use crate::topics::TopicModel;

/// Stem of the composite image; no part may carry this label.
pub const TOPIC_CLOUD_LABEL: &str = "topic_cloud";

/// File name of the composite image inside the output directory.
pub const TOPIC_CLOUD_FILE: &str = "topic_cloud.png";

/// Columns of the composite grid.
pub const GRID_COLUMNS: usize = 2;

/// Tableau 10 palette; topic `n` is drawn in `TOPIC_PALETTE[n % 10]`.
pub const TOPIC_PALETTE: [Rgb<u8>; 10] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
    Rgb([148, 103, 189]),
    Rgb([140, 86, 75]),
    Rgb([227, 119, 194]),
    Rgb([127, 127, 127]),
    Rgb([188, 189, 34]),
    Rgb([23, 190, 207]),
];

const CELL_WIDTH: u32 = 500;
const CELL_HEIGHT: u32 = 360;
const TITLE_HEIGHT: u32 = 32;
const TITLE_SCALE: u32 = 3;
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// The most probable topic of one corpus entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DominantTopic {
    pub topic: usize,
    /// Rounded to four decimals.
    pub probability: f64,
    /// The topic's keywords joined by ", ".
    pub keywords: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicSummary {
    /// Index-aligned with the corpus.
    pub dominant: Vec<DominantTopic>,
    /// Relative to the output directory.
    pub topic_cloud: String,
}

/// Draws the composite topic cloud and picks every entry's dominant topic.
pub fn summarize(model: &TopicModel, output_dir: &Path) -> Result<TopicSummary> {
    let topic_cloud = render_topic_cloud(model, output_dir)?;
    let dominant = dominant_topics(model);
    Ok(TopicSummary {
        dominant,
        topic_cloud,
    })
}

pub fn dominant_topics(model: &TopicModel) -> Vec<DominantTopic> {
    info!("Identifying the most influential topic of every part");
    model
        .document_topics
        .iter()
        .map(|distribution| {
            let (topic, probability) = argmax(distribution);
            let keywords = model
                .show_topic(topic, model.config.top_words)
                .into_iter()
                .map(|(word, _)| word)
                .collect::<Vec<_>>()
                .join(", ");
            DominantTopic {
                topic,
                probability: round4(probability),
                keywords,
            }
        })
        .collect()
}

/// Index and value of the largest probability; the first one wins a tie.
pub fn argmax(distribution: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (topic, &p) in distribution.iter().enumerate() {
        if p > best.1 {
            best = (topic, p);
        }
    }
    best
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Rows and columns of the composite grid for `topics` topics.
pub fn grid_shape(topics: usize) -> (usize, usize) {
    (topics.div_ceil(GRID_COLUMNS), GRID_COLUMNS)
}

pub fn topic_color(topic: usize) -> Rgb<u8> {
    TOPIC_PALETTE[topic % TOPIC_PALETTE.len()]
}

/// Writes `topic_cloud.png`: one titled cell per topic showing its top
/// keywords sized by weight.
pub fn render_topic_cloud(model: &TopicModel, output_dir: &Path) -> Result<String> {
    info!("Drawing topic word clouds");
    let requested = model.config.num_topics;
    let found = model.num_topics();
    if found < requested {
        return Err(Error::TopicCount { requested, found });
    }
    let img = topic_cloud_image(&model.show_topics(model.config.top_words));
    save_png(&img, &output_dir.join(TOPIC_CLOUD_FILE))?;
    Ok(TOPIC_CLOUD_FILE.to_string())
}

/// Lays the topic cells out row by row, two per row.
pub fn topic_cloud_image(topics: &[(usize, Vec<(String, f64)>)]) -> RgbImage {
    let (rows, cols) = grid_shape(topics.len());
    let cell_total_height = TITLE_HEIGHT + CELL_HEIGHT;
    let mut canvas = RgbImage::from_pixel(
        cols as u32 * CELL_WIDTH,
        (rows as u32 * cell_total_height).max(1),
        WHITE,
    );
    for (position, (topic, words)) in topics.iter().enumerate() {
        let x = (position % cols) as u32 * CELL_WIDTH;
        let y = (position / cols) as u32 * cell_total_height;

        let title = format!("Topic {topic}");
        let (title_width, title_height) = text_size(&title, TITLE_SCALE);
        draw_text(
            &mut canvas,
            x + CELL_WIDTH.saturating_sub(title_width) / 2,
            y + TITLE_HEIGHT.saturating_sub(title_height) / 2,
            &title,
            TITLE_SCALE,
            BLACK,
        );

        let style = CloudStyle {
            width: CELL_WIDTH,
            height: CELL_HEIGHT,
            max_words: 10,
            contour_width: 0,
            max_scale: 40,
            position_step: 2,
            ..CloudStyle::default()
        };
        let cloud = WordCloud::generate_from_frequencies(style, words);
        debug!("Topic {topic}: placed {} words", cloud.words().len());
        let color = topic_color(*topic);
        let cell = cloud.to_image(|_| color);
        imageops::overlay(&mut canvas, &cell, x as i64, (y + TITLE_HEIGHT) as i64);
    }
    canvas
}
