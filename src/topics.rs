//! Vocabulary, bag-of-words corpus and a latent Dirichlet allocation model
//! fitted by batch variational Bayes.

use std::collections::HashMap;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::lexical::LexicalAnalysis;

/// Sparse document vector: `(token id, count)` sorted by id.
pub type BagOfWords = Vec<(usize, u32)>;

/// Bidirectional token <-> id mapping. Ids follow first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    token2id: HashMap<String, usize>,
    id2token: Vec<String>,
}

impl Dictionary {
    pub fn from_documents<D, T>(documents: D) -> Self
    where
        D: IntoIterator<Item = T>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let mut dictionary = Dictionary::default();
        for document in documents {
            for token in document {
                dictionary.add(token.as_ref());
            }
        }
        dictionary
    }

    fn add(&mut self, token: &str) -> usize {
        if let Some(&id) = self.token2id.get(token) {
            return id;
        }
        let id = self.id2token.len();
        self.token2id.insert(token.to_string(), id);
        self.id2token.push(token.to_string());
        id
    }

    pub fn id(&self, token: &str) -> Option<usize> {
        self.token2id.get(token).copied()
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.id2token.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.id2token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id2token.is_empty()
    }

    /// Counts the known tokens of `document`; unknown tokens are ignored.
    pub fn doc2bow<I>(&self, document: I) -> BagOfWords
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut counts: HashMap<usize, u32> = HashMap::new();
        for token in document {
            if let Some(id) = self.id(token.as_ref()) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        let mut bow: BagOfWords = counts.into_iter().collect();
        bow.sort_unstable_by_key(|(id, _)| *id);
        bow
    }
}

/// Fitting parameters. Both Dirichlet priors are symmetric, `1 / num_topics`.
#[derive(Debug, Clone, PartialEq)]
pub struct LdaConfig {
    pub num_topics: usize,
    /// Sweeps over the whole corpus.
    pub passes: usize,
    /// Upper bound on per-document inference iterations.
    pub iterations: usize,
    /// Mean absolute change of a document's gamma below which inference stops.
    pub gamma_threshold: f64,
    pub seed: u64,
    /// Keywords reported per topic.
    pub top_words: usize,
}

impl Default for LdaConfig {
    fn default() -> Self {
        LdaConfig {
            num_topics: 10,
            passes: 10,
            iterations: 100,
            gamma_threshold: 0.001,
            seed: 100,
            top_words: 10,
        }
    }
}

impl LdaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_topics == 0 {
            return Err(Error::InvalidConfig("number of topics must be at least 1".into()));
        }
        if self.passes == 0 {
            return Err(Error::InvalidConfig("number of passes must be at least 1".into()));
        }
        if self.top_words == 0 {
            return Err(Error::InvalidConfig("keywords per topic must be at least 1".into()));
        }
        Ok(())
    }

    pub fn alpha(&self) -> f64 {
        1.0 / self.num_topics as f64
    }

    pub fn eta(&self) -> f64 {
        1.0 / self.num_topics as f64
    }
}

/// Fitted topic-word variational parameters.
#[derive(Debug, Clone)]
pub struct LdaModel {
    alpha: f64,
    iterations: usize,
    gamma_threshold: f64,
    /// topics x vocabulary
    lambda: Vec<Vec<f64>>,
    /// exp(E[log beta]), same shape as `lambda`
    exp_elog_beta: Vec<Vec<f64>>,
}

impl LdaModel {
    pub fn fit(corpus: &[BagOfWords], vocabulary_size: usize, config: &LdaConfig) -> Result<Self> {
        config.validate()?;
        if vocabulary_size == 0 {
            return Err(Error::EmptyVocabulary);
        }
        let mut rng = StdRng::seed_from_u64(config.seed);
        let lambda: Vec<Vec<f64>> = (0..config.num_topics)
            .map(|_| {
                (0..vocabulary_size)
                    .map(|_| rng.random_range(0.5..1.5))
                    .collect()
            })
            .collect();
        let mut model = LdaModel {
            alpha: config.alpha(),
            iterations: config.iterations,
            gamma_threshold: config.gamma_threshold,
            exp_elog_beta: exp_dirichlet_expectation_rows(&lambda),
            lambda,
        };

        let eta = config.eta();
        for pass in 0..config.passes {
            let mut sstats = vec![vec![0.0; vocabulary_size]; config.num_topics];
            let mut converged = 0;
            for bow in corpus {
                let (_, done) = model.infer(bow, Some(&mut sstats));
                converged += done as usize;
            }
            for (row, stats) in model.lambda.iter_mut().zip(&sstats) {
                for (l, s) in row.iter_mut().zip(stats) {
                    *l = eta + s;
                }
            }
            model.exp_elog_beta = exp_dirichlet_expectation_rows(&model.lambda);
            debug!(
                "LDA pass {}/{}: {}/{} documents converged",
                pass + 1,
                config.passes,
                converged,
                corpus.len()
            );
        }
        Ok(model)
    }

    pub fn num_topics(&self) -> usize {
        self.lambda.len()
    }

    /// Normalised topic distribution of one document.
    pub fn document_topics(&self, bow: &BagOfWords) -> Vec<f64> {
        let (gamma, _) = self.infer(bow, None);
        let total: f64 = gamma.iter().sum();
        gamma.into_iter().map(|g| g / total).collect()
    }

    /// `(token id, weight)` of the `topn` heaviest words of `topic`,
    /// heaviest first; ties go to the lower id.
    pub fn top_word_ids(&self, topic: usize, topn: usize) -> Vec<(usize, f64)> {
        let row = &self.lambda[topic];
        let total: f64 = row.iter().sum();
        let mut weights: Vec<(usize, f64)> =
            row.iter().enumerate().map(|(id, l)| (id, l / total)).collect();
        weights.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        weights.truncate(topn);
        weights
    }

    /// Variational E-step for one document. Returns its gamma and whether it
    /// converged; adds the document's sufficient statistics to `sstats`.
    fn infer(&self, bow: &BagOfWords, sstats: Option<&mut Vec<Vec<f64>>>) -> (Vec<f64>, bool) {
        let k = self.num_topics();
        if bow.is_empty() {
            return (vec![self.alpha; k], true);
        }
        let mut gamma = vec![1.0; k];
        let ids: Vec<usize> = bow.iter().map(|(id, _)| *id).collect();
        let cts: Vec<f64> = bow.iter().map(|(_, c)| *c as f64).collect();
        let beta_d: Vec<Vec<f64>> = self
            .exp_elog_beta
            .iter()
            .map(|row| ids.iter().map(|&id| row[id]).collect())
            .collect();

        let mut exp_elog_theta = exp_dirichlet_expectation(&gamma);
        let mut phinorm = phi_norm(&exp_elog_theta, &beta_d);
        let mut converged = false;
        for _ in 0..self.iterations {
            let last = gamma.clone();
            for t in 0..k {
                let dot: f64 = (0..ids.len())
                    .map(|n| cts[n] / phinorm[n] * beta_d[t][n])
                    .sum();
                gamma[t] = self.alpha + exp_elog_theta[t] * dot;
            }
            exp_elog_theta = exp_dirichlet_expectation(&gamma);
            phinorm = phi_norm(&exp_elog_theta, &beta_d);
            let mean_change =
                gamma.iter().zip(&last).map(|(g, l)| (g - l).abs()).sum::<f64>() / k as f64;
            if mean_change < self.gamma_threshold {
                converged = true;
                break;
            }
        }

        if let Some(sstats) = sstats {
            for t in 0..k {
                for (n, &id) in ids.iter().enumerate() {
                    sstats[t][id] += exp_elog_theta[t] * cts[n] / phinorm[n] * beta_d[t][n];
                }
            }
        }
        (gamma, converged)
    }
}

fn phi_norm(exp_elog_theta: &[f64], beta_d: &[Vec<f64>]) -> Vec<f64> {
    let words = beta_d.first().map(Vec::len).unwrap_or(0);
    (0..words)
        .map(|n| {
            exp_elog_theta
                .iter()
                .zip(beta_d)
                .map(|(theta, row)| theta * row[n])
                .sum::<f64>()
                + 1e-100
        })
        .collect()
}

/// exp(E[log X]) for X ~ Dirichlet(alpha).
fn exp_dirichlet_expectation(alpha: &[f64]) -> Vec<f64> {
    let psi_total = digamma(alpha.iter().sum());
    alpha.iter().map(|a| (digamma(*a) - psi_total).exp()).collect()
}

fn exp_dirichlet_expectation_rows(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    rows.iter().map(|row| exp_dirichlet_expectation(row)).collect()
}

/// Digamma function via recurrence up to x >= 6 and the asymptotic series.
pub fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}

/// Vocabulary, corpus and fitted model, plus every entry's topic
/// distribution (index-aligned with the corpus).
#[derive(Debug, Clone)]
pub struct TopicModel {
    pub dictionary: Dictionary,
    pub corpus: Vec<BagOfWords>,
    pub lda: LdaModel,
    pub config: LdaConfig,
    pub document_topics: Vec<Vec<f64>>,
}

impl TopicModel {
    pub fn num_topics(&self) -> usize {
        self.lda.num_topics()
    }

    /// The `topn` heaviest words of `topic` with their weights.
    pub fn show_topic(&self, topic: usize, topn: usize) -> Vec<(String, f64)> {
        self.lda
            .top_word_ids(topic, topn)
            .into_iter()
            .filter_map(|(id, w)| self.dictionary.token(id).map(|t| (t.to_string(), w)))
            .collect()
    }

    /// `show_topic` for every topic, in topic order.
    pub fn show_topics(&self, topn: usize) -> Vec<(usize, Vec<(String, f64)>)> {
        (0..self.num_topics())
            .map(|topic| (topic, self.show_topic(topic, topn)))
            .collect()
    }
}

/// Builds the vocabulary over all cleaned token streams and fits the model.
pub fn fit(analysis: &LexicalAnalysis, config: &LdaConfig) -> Result<TopicModel> {
    info!("Fitting topic model with {} topics", config.num_topics);
    let dictionary = Dictionary::from_documents(analysis.parts.iter().map(|p| &p.cleaned));
    let corpus: Vec<BagOfWords> = analysis
        .parts
        .iter()
        .map(|p| dictionary.doc2bow(&p.cleaned))
        .collect();
    debug!(
        "Vocabulary of {} tokens over {} documents",
        dictionary.len(),
        corpus.len()
    );
    let lda = LdaModel::fit(&corpus, dictionary.len(), config)?;
    let document_topics = corpus.iter().map(|bow| lda.document_topics(bow)).collect();
    Ok(TopicModel {
        dictionary,
        corpus,
        lda,
        config: config.clone(),
        document_topics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::PartStats;

    fn stats(text: &str) -> PartStats {
        PartStats {
            sentences: 1,
            tokens: 0,
            tokens_per_sentence: None,
            cleaned: text.split_whitespace().map(String::from).collect(),
        }
    }

    fn analysis(texts: &[&str]) -> LexicalAnalysis {
        LexicalAnalysis {
            parts: texts.iter().map(|t| stats(t)).collect(),
        }
    }

    #[test]
    fn digamma_matches_known_values() {
        assert!((digamma(1.0) + 0.577_215_664_901_532_9).abs() < 1e-9);
        assert!((digamma(0.5) + 1.963_510_026_021_423).abs() < 1e-9);
        assert!((digamma(10.0) - 2.251_752_589_066_721).abs() < 1e-9);
    }

    #[test]
    fn dictionary_ids_follow_first_appearance() {
        let d = Dictionary::from_documents(vec![vec!["cat", "sat"], vec!["dog", "cat"]]);
        assert_eq!(d.len(), 3);
        assert_eq!(d.id("cat"), Some(0));
        assert_eq!(d.id("sat"), Some(1));
        assert_eq!(d.token(2), Some("dog"));
        assert_eq!(d.doc2bow(["dog", "cat", "dog", "bird"]), vec![(0, 1), (2, 2)]);
    }

    #[test]
    fn distributions_are_normalised() {
        let model = fit(
            &analysis(&["whale sea ship whale", "whale sea", "garden rose tulip rose"]),
            &LdaConfig::default(),
        )
        .unwrap();
        assert_eq!(model.num_topics(), 10);
        assert_eq!(model.document_topics.len(), 3);
        for dist in &model.document_topics {
            assert_eq!(dist.len(), 10);
            assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(dist.iter().all(|p| *p > 0.0));
        }
    }

    #[test]
    fn topics_list_vocabulary_words_heaviest_first() {
        let model = fit(&analysis(&["a b c d e f g h i j k l"]), &LdaConfig::default()).unwrap();
        for (topic, words) in model.show_topics(10) {
            assert!(topic < 10);
            assert_eq!(words.len(), 10);
            assert!(words.windows(2).all(|w| w[0].1 >= w[1].1));
            assert!(words.iter().all(|(w, _)| model.dictionary.id(w).is_some()));
        }
        // fewer words than requested
        assert_eq!(model.show_topic(0, 50).len(), 12);
    }

    #[test]
    fn fitting_is_deterministic_for_a_seed() {
        let a = analysis(&["river boat water fish", "boat sail wind", "bread oven flour bread"]);
        let config = LdaConfig::default();
        let first = fit(&a, &config).unwrap();
        let second = fit(&a, &config).unwrap();
        assert_eq!(first.document_topics, second.document_topics);
        assert_eq!(first.show_topics(10), second.show_topics(10));
    }

    #[test]
    fn empty_vocabulary_is_rejected() {
        let err = fit(&analysis(&["", ""]), &LdaConfig::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyVocabulary));
    }

    #[test]
    fn zero_topics_is_rejected() {
        let config = LdaConfig {
            num_topics: 0,
            ..LdaConfig::default()
        };
        let err = fit(&analysis(&["word"]), &config).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn custom_topic_count_is_honoured() {
        let config = LdaConfig {
            num_topics: 3,
            ..LdaConfig::default()
        };
        let model = fit(&analysis(&["one two three", "four five"]), &config).unwrap();
        assert_eq!(model.num_topics(), 3);
        assert!(model.document_topics.iter().all(|d| d.len() == 3));
    }
}
