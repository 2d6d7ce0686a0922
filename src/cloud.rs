//! Frequency-weighted word clouds rendered to PNG.
//!
//! Words are placed greedily from the most to the least frequent. Each word
//! starts at a size derived from its relative frequency and shrinks until a
//! free spot is found; free spots are found with an integral image over the
//! occupied pixels and one of them is picked by a seeded RNG, so identical
//! input always yields an identical picture.

use std::path::Path;

use image::{Rgb, RgbImage};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::font::{draw_text, text_size};
use crate::input::Corpus;
use crate::lexical::{LexicalAnalysis, count_words, sort_map_to_vec};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const STEEL_BLUE: Rgb<u8> = Rgb([70, 130, 180]);

/// Colours picked at random for the words of a part's cloud.
const WORD_PALETTE: [Rgb<u8>; 6] = [
    Rgb([68, 1, 84]),
    Rgb([59, 82, 139]),
    Rgb([49, 104, 142]),
    Rgb([33, 145, 140]),
    Rgb([53, 183, 121]),
    Rgb([94, 201, 98]),
];

/// Appearance and layout parameters of one cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudStyle {
    pub width: u32,
    pub height: u32,
    pub background: Rgb<u8>,
    pub max_words: usize,
    /// Border drawn around the canvas; zero disables it.
    pub contour_width: u32,
    pub contour_color: Rgb<u8>,
    /// Free pixels kept around every word.
    pub margin: u32,
    /// 0 sizes words by rank only, 1 strictly by frequency.
    pub relative_scaling: f64,
    pub min_scale: u32,
    /// Upper bound for the scale of the first word.
    pub max_scale: u32,
    /// Step between candidate positions, in pixels.
    pub position_step: u32,
    pub seed: u64,
}

impl Default for CloudStyle {
    fn default() -> Self {
        CloudStyle {
            width: 400,
            height: 200,
            background: WHITE,
            max_words: 5000,
            contour_width: 3,
            contour_color: STEEL_BLUE,
            margin: 2,
            relative_scaling: 0.5,
            min_scale: 1,
            max_scale: 24,
            position_step: 1,
            seed: 42,
        }
    }
}

/// A word with its final position and scale.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub word: String,
    /// Frequency relative to the most frequent word.
    pub weight: f64,
    pub x: u32,
    pub y: u32,
    pub scale: u32,
}

#[derive(Debug, Clone)]
pub struct WordCloud {
    style: CloudStyle,
    words: Vec<PlacedWord>,
}

impl WordCloud {
    /// Lays out `frequencies` (any order, any positive weights).
    pub fn generate_from_frequencies(style: CloudStyle, frequencies: &[(String, f64)]) -> Self {
        let mut sorted: Vec<&(String, f64)> =
            frequencies.iter().filter(|(_, f)| *f > 0.0).collect();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted.truncate(style.max_words);

        let mut words = Vec::new();
        let Some(max_freq) = sorted.first().map(|(_, f)| *f) else {
            return WordCloud { style, words };
        };

        let mut rng = StdRng::seed_from_u64(style.seed);
        let mut occupancy = Occupancy::new(style.width, style.height);
        let mut scale = style.max_scale.max(style.min_scale);
        let mut last_weight = 1.0;

        'words: for (i, (word, freq)) in sorted.into_iter().enumerate() {
            let weight = freq / max_freq;
            if i != 0 {
                let rs = style.relative_scaling;
                scale = ((rs * weight / last_weight + (1.0 - rs)) * scale as f64).round() as u32;
            }
            loop {
                if scale < style.min_scale.max(1) {
                    break 'words;
                }
                if let Some((x, y)) = occupancy.find_spot(word, scale, &style, &mut rng) {
                    occupancy.occupy(word, x, y, scale, style.margin);
                    words.push(PlacedWord {
                        word: word.clone(),
                        weight,
                        x,
                        y,
                        scale,
                    });
                    break;
                }
                scale -= 1;
            }
            last_weight = weight;
        }
        WordCloud { style, words }
    }

    pub fn words(&self) -> &[PlacedWord] {
        &self.words
    }

    pub fn style(&self) -> &CloudStyle {
        &self.style
    }

    /// Renders the cloud, asking `color` for the colour of each placed word.
    pub fn to_image<F>(&self, mut color: F) -> RgbImage
    where
        F: FnMut(&PlacedWord) -> Rgb<u8>,
    {
        let style = &self.style;
        let mut img = RgbImage::from_pixel(style.width, style.height, style.background);
        for word in &self.words {
            let c = color(word);
            draw_text(&mut img, word.x, word.y, &word.word, word.scale, c);
        }
        draw_contour(&mut img, style.contour_width, style.contour_color);
        img
    }

    /// Renders with colours drawn from a fixed palette by a seeded RNG.
    pub fn to_palette_image(&self) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(self.style.seed.wrapping_add(1));
        self.to_image(|_| WORD_PALETTE[rng.random_range(0..WORD_PALETTE.len())])
    }
}

/// Occupied pixels of the canvas plus their integral image.
struct Occupancy {
    width: u32,
    height: u32,
    taken: Vec<bool>,
    // (width + 1) * (height + 1) prefix sums
    integral: Vec<u32>,
}

impl Occupancy {
    fn new(width: u32, height: u32) -> Self {
        Occupancy {
            width,
            height,
            taken: vec![false; (width * height) as usize],
            integral: vec![0; ((width + 1) * (height + 1)) as usize],
        }
    }

    fn sum(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> u32 {
        let w = self.width + 1;
        let at = |x: u32, y: u32| self.integral[(y * w + x) as usize];
        at(x1, y1) + at(x0, y0) - at(x0, y1) - at(x1, y0)
    }

    fn find_spot(
        &self,
        word: &str,
        scale: u32,
        style: &CloudStyle,
        rng: &mut StdRng,
    ) -> Option<(u32, u32)> {
        let (w, h) = text_size(word, scale);
        let m = style.margin;
        if w + 2 * m > self.width || h + 2 * m > self.height {
            return None;
        }
        let step = style.position_step.max(1) as usize;
        let mut free = Vec::new();
        for y in (m..=self.height - h - m).step_by(step) {
            for x in (m..=self.width - w - m).step_by(step) {
                if self.sum(x - m, y - m, x + w + m, y + h + m) == 0 {
                    free.push((x, y));
                }
            }
        }
        if free.is_empty() {
            None
        } else {
            Some(free[rng.random_range(0..free.len())])
        }
    }

    fn occupy(&mut self, word: &str, x: u32, y: u32, scale: u32, margin: u32) {
        let (w, h) = text_size(word, scale);
        let x_end = (x + w + margin).min(self.width);
        let y_end = (y + h + margin).min(self.height);
        for py in y.saturating_sub(margin)..y_end {
            for px in x.saturating_sub(margin)..x_end {
                self.taken[(py * self.width + px) as usize] = true;
            }
        }
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let w = self.width as usize + 1;
        for y in 0..self.height as usize {
            let mut row = 0;
            for x in 0..self.width as usize {
                row += self.taken[y * self.width as usize + x] as u32;
                self.integral[(y + 1) * w + x + 1] = self.integral[y * w + x + 1] + row;
            }
        }
    }
}

pub fn draw_contour(img: &mut RgbImage, width: u32, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    let width = width.min(w / 2).min(h / 2);
    for y in 0..h {
        for x in 0..w {
            if x < width || y < width || x >= w - width || y >= h - width {
                img.put_pixel(x, y, color);
            }
        }
    }
}

/// Relative word frequencies of a token stream, most frequent first.
pub fn word_frequencies(tokens: &[String], max_words: usize) -> Vec<(String, f64)> {
    let mut counted = sort_map_to_vec(count_words(tokens));
    counted.truncate(max_words);
    let max = counted.first().map(|(_, c)| *c as f64).unwrap_or(1.0);
    counted
        .into_iter()
        .map(|(word, count)| (word, count as f64 / max))
        .collect()
}

/// The word-cloud image written for one corpus entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCloudArtifact {
    pub label: String,
    /// Relative to the output directory.
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordClouds {
    pub artifacts: Vec<WordCloudArtifact>,
}

/// Draws one cloud per corpus entry into `output_dir` as `<label>.png`,
/// replacing existing files.
pub fn render_word_clouds(
    corpus: &Corpus,
    analysis: &LexicalAnalysis,
    output_dir: &Path,
) -> Result<WordClouds> {
    let style = CloudStyle::default();
    let mut artifacts = Vec::with_capacity(corpus.len());
    for (counter, (entry, stats)) in corpus.entries().iter().zip(&analysis.parts).enumerate() {
        info!("Generating word cloud {counter}");
        if stats.cleaned.is_empty() {
            return Err(Error::EmptyCloud {
                label: entry.label.clone(),
            });
        }
        let frequencies = word_frequencies(&stats.cleaned, style.max_words);
        let cloud = WordCloud::generate_from_frequencies(style.clone(), &frequencies);
        debug!(
            "{}: placed {} of {} words",
            entry.label,
            cloud.words().len(),
            frequencies.len()
        );
        let file_name = format!("{}.png", entry.label);
        save_png(&cloud.to_palette_image(), &output_dir.join(&file_name))?;
        artifacts.push(WordCloudArtifact {
            label: entry.label.clone(),
            file_name,
        });
    }
    Ok(WordClouds { artifacts })
}

pub fn save_png(img: &RgbImage, path: &Path) -> Result<()> {
    img.save(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(w, f)| (w.to_string(), *f)).collect()
    }

    fn overlaps(a: &PlacedWord, b: &PlacedWord) -> bool {
        let (aw, ah) = text_size(&a.word, a.scale);
        let (bw, bh) = text_size(&b.word, b.scale);
        a.x < b.x + bw && b.x < a.x + aw && a.y < b.y + bh && b.y < a.y + ah
    }

    #[test]
    fn frequencies_are_relative_to_the_top_word() {
        let tokens: Vec<String> = "cat dog cat bird cat dog"
            .split_whitespace()
            .map(String::from)
            .collect();
        let f = word_frequencies(&tokens, 5000);
        assert_eq!(
            f,
            freqs(&[("cat", 1.0), ("dog", 2.0 / 3.0), ("bird", 1.0 / 3.0)])
        );
        assert_eq!(word_frequencies(&tokens, 1).len(), 1);
    }

    #[test]
    fn placed_words_do_not_overlap_and_stay_inside() {
        let style = CloudStyle::default();
        let f = freqs(&[
            ("whale", 1.0),
            ("sea", 0.8),
            ("ship", 0.6),
            ("captain", 0.5),
            ("harpoon", 0.3),
            ("sail", 0.2),
        ]);
        let cloud = WordCloud::generate_from_frequencies(style.clone(), &f);
        let words = cloud.words();
        assert!(!words.is_empty());
        assert_eq!(words[0].word, "whale");
        for (i, a) in words.iter().enumerate() {
            let (w, h) = text_size(&a.word, a.scale);
            assert!(a.x + w <= style.width && a.y + h <= style.height);
            for b in &words[i + 1..] {
                assert!(!overlaps(a, b), "{} overlaps {}", a.word, b.word);
            }
        }
    }

    #[test]
    fn less_frequent_words_are_not_larger() {
        let f = freqs(&[("alpha", 1.0), ("beta", 0.5), ("gamma", 0.1)]);
        let cloud = WordCloud::generate_from_frequencies(CloudStyle::default(), &f);
        let scales: Vec<u32> = cloud.words().iter().map(|w| w.scale).collect();
        assert!(scales.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn layout_is_reproducible() {
        let f = freqs(&[("one", 3.0), ("two", 2.0), ("three", 1.0)]);
        let a = WordCloud::generate_from_frequencies(CloudStyle::default(), &f);
        let b = WordCloud::generate_from_frequencies(CloudStyle::default(), &f);
        assert_eq!(a.words(), b.words());
        assert_eq!(a.to_palette_image(), b.to_palette_image());
    }

    #[test]
    fn image_has_contour_and_background() {
        let f = freqs(&[("x", 1.0)]);
        let cloud = WordCloud::generate_from_frequencies(CloudStyle::default(), &f);
        let img = cloud.to_palette_image();
        assert_eq!(img.dimensions(), (400, 200));
        assert_eq!(*img.get_pixel(0, 0), STEEL_BLUE);
        assert_eq!(*img.get_pixel(2, 100), STEEL_BLUE);
        assert_eq!(*img.get_pixel(399, 199), STEEL_BLUE);
    }

    #[test]
    fn empty_input_places_nothing() {
        let cloud = WordCloud::generate_from_frequencies(CloudStyle::default(), &[]);
        assert!(cloud.words().is_empty());
    }
}
