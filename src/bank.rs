use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BankError;

static BANK_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/data");

const BUILTIN_BANK: &str = "questions.json";

/// Options beyond this cannot be picked from the keyboard (`a`-`i`, `1`-`9`).
pub const MAX_OPTIONS: usize = 9;

/// Shown after answering when a question carries no explanation of its own.
pub const DEFAULT_EXPLANATION: &str =
    "Resposta baseada nos manuais oficiais e legislação em vigor.";

/// One of the five canonical topic buckets of the exam.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    strum_macros::Display,
)]
pub enum Category {
    #[strum(to_string = "Lei TVDE")]
    LeiTvde,
    #[strum(to_string = "Código da Estrada")]
    RoadCode,
    #[strum(to_string = "Comunicação e Turismo")]
    CommunicationTourism,
    #[strum(to_string = "Mecânica e Eco-condução")]
    MechanicsEcoDriving,
    #[strum(to_string = "Segurança e Socorro")]
    SafetyFirstAid,
}

impl Category {
    /// Menu order.
    pub const ALL: [Category; 5] = [
        Category::LeiTvde,
        Category::RoadCode,
        Category::CommunicationTourism,
        Category::MechanicsEcoDriving,
        Category::SafetyFirstAid,
    ];

    /// Maps a free-text bank label onto a canonical category.
    ///
    /// Rules are checked in order and the first hit wins, so a label such as
    /// "Regulamento de Segurança" lands in [`Category::LeiTvde`]. Matching is
    /// case-sensitive. Anything unmatched falls through to
    /// [`Category::RoadCode`].
    pub fn classify(label: &str) -> Category {
        const RULES: [(&[&str], Category); 4] = [
            (&["Lei", "Regulamento"], Category::LeiTvde),
            (&["Mecânica", "Eco"], Category::MechanicsEcoDriving),
            (&["Socorro", "Segurança"], Category::SafetyFirstAid),
            (
                &["Comunicação", "Turismo", "Inglês"],
                Category::CommunicationTourism,
            ),
        ];

        RULES
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| label.contains(n)))
            .map(|(_, category)| *category)
            .unwrap_or(Category::RoadCode)
    }

    fn slug(&self) -> &'static str {
        match self {
            Category::LeiTvde => "lei-tvde",
            Category::RoadCode => "codigo-da-estrada",
            Category::CommunicationTourism => "comunicacao-e-turismo",
            Category::MechanicsEcoDriving => "mecanica-e-eco-conducao",
            Category::SafetyFirstAid => "seguranca-e-socorro",
        }
    }
}

/// Which questions a session draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Every selectable filter in menu order, starting with "Todos".
    pub fn menu() -> Vec<CategoryFilter> {
        std::iter::once(CategoryFilter::All)
            .chain(Category::ALL.into_iter().map(CategoryFilter::Only))
            .collect()
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("Todos"),
            CategoryFilter::Only(c) => write!(f, "{c}"),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    /// Accepts display labels ("Lei TVDE", "Todos") case-insensitively, as
    /// well as ascii slugs ("lei-tvde", "all") for the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if wanted == "todos" || wanted == "all" {
            return Ok(CategoryFilter::All);
        }

        Category::ALL
            .into_iter()
            .find(|c| c.to_string().to_lowercase() == wanted || c.slug() == wanted)
            .map(CategoryFilter::Only)
            .ok_or_else(|| format!("unknown category `{s}`"))
    }
}

/// A question-bank record as it is authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// A question ready to be asked in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub category: Category,
    pub explanation: String,
}

/// Turns raw bank records into session questions, one per record.
///
/// When the correct option text is not among the options the question keeps
/// index 0 as its answer and an integrity warning is logged.
pub fn normalize(raw: &[RawQuestion]) -> Vec<Question> {
    raw.iter()
        .map(|rq| {
            let correct_index = rq
                .options
                .iter()
                .position(|o| *o == rq.correct)
                .unwrap_or_else(|| {
                    warn!(
                        question = %rq.id,
                        correct = %rq.correct,
                        "correct answer not found among options, falling back to the first option"
                    );
                    0
                });

            Question {
                id: rq.id.clone(),
                text: rq.question.clone(),
                options: rq.options.clone(),
                correct_index,
                category: Category::classify(&rq.category),
                explanation: rq
                    .explanation
                    .clone()
                    .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string()),
            }
        })
        .collect()
}

/// Keeps the questions matching `filter` and returns them in random order.
pub fn filter_and_shuffle<R: Rng + ?Sized>(
    questions: &[Question],
    filter: CategoryFilter,
    rng: &mut R,
) -> Vec<Question> {
    let mut selected: Vec<Question> = questions
        .iter()
        .filter(|q| filter.matches(q.category))
        .cloned()
        .collect();
    selected.shuffle(rng);
    selected
}

/// The read-only question bank a quiz draws from.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    raw: Vec<RawQuestion>,
}

impl QuestionBank {
    pub fn new(raw: Vec<RawQuestion>) -> Self {
        Self { raw }
    }

    /// The bank compiled into the binary.
    pub fn builtin() -> Result<Self, BankError> {
        let file = BANK_DIR
            .get_file(BUILTIN_BANK)
            .ok_or_else(|| BankError::Missing(BUILTIN_BANK.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| BankError::Missing(BUILTIN_BANK.to_string()))?;
        Self::from_json(contents, BUILTIN_BANK)
    }

    /// Loads a bank from a JSON file on disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BankError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| BankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents, &path.display().to_string())
    }

    fn from_json(contents: &str, origin: &str) -> Result<Self, BankError> {
        let raw: Vec<RawQuestion> =
            serde_json::from_str(contents).map_err(|source| BankError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        for rq in &raw {
            let reason = match rq.options.len() {
                0 => "question has no options".to_string(),
                n if n > MAX_OPTIONS => {
                    format!("question has {n} options, at most {MAX_OPTIONS} are supported")
                }
                _ => continue,
            };
            return Err(BankError::Invalid {
                id: rq.id.clone(),
                reason,
            });
        }
        debug!(origin, questions = raw.len(), "loaded question bank");
        Ok(Self { raw })
    }

    pub fn raw(&self) -> &[RawQuestion] {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn questions(&self) -> Vec<Question> {
        normalize(&self.raw)
    }

    /// Number of questions per canonical category. Categories without any
    /// question are absent from the map.
    pub fn category_counts(&self) -> HashMap<Category, usize> {
        self.raw
            .iter()
            .map(|rq| Category::classify(&rq.category))
            .counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn raw(id: &str, category: &str) -> RawQuestion {
        RawQuestion {
            id: id.to_string(),
            question: format!("question {id}"),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct: "b".into(),
            category: category.to_string(),
            explanation: None,
        }
    }

    #[test]
    fn classify_follows_rule_order() {
        assert_eq!(Category::classify("Lei 45/2018"), Category::LeiTvde);
        assert_eq!(Category::classify("Regulamento TVDE"), Category::LeiTvde);
        assert_eq!(
            Category::classify("Mecânica Básica"),
            Category::MechanicsEcoDriving
        );
        assert_eq!(
            Category::classify("Eco-condução"),
            Category::MechanicsEcoDriving
        );
        assert_eq!(
            Category::classify("Primeiros Socorros"),
            Category::SafetyFirstAid
        );
        assert_eq!(
            Category::classify("Segurança Rodoviária"),
            Category::SafetyFirstAid
        );
        assert_eq!(
            Category::classify("Comunicação com o Cliente"),
            Category::CommunicationTourism
        );
        assert_eq!(Category::classify("Turismo"), Category::CommunicationTourism);
        assert_eq!(Category::classify("Inglês"), Category::CommunicationTourism);
        // first match wins
        assert_eq!(
            Category::classify("Regulamento de Segurança"),
            Category::LeiTvde
        );
        assert_eq!(
            Category::classify("Segurança e Turismo"),
            Category::SafetyFirstAid
        );
    }

    #[test]
    fn classify_falls_back_to_road_code() {
        assert_eq!(Category::classify("Código da Estrada"), Category::RoadCode);
        assert_eq!(Category::classify(""), Category::RoadCode);
        assert_eq!(Category::classify("Geral"), Category::RoadCode);
        // case-sensitive
        assert_eq!(Category::classify("lei"), Category::RoadCode);
    }

    #[test]
    fn normalize_locates_correct_option() {
        let questions = normalize(&[raw("1", "Lei")]);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_index, 1);
        assert_eq!(questions[0].category, Category::LeiTvde);
        assert_eq!(questions[0].explanation, DEFAULT_EXPLANATION);
    }

    #[test]
    fn normalize_falls_back_to_first_option() {
        let mut rq = raw("1", "Lei");
        rq.correct = "not an option".into();
        let questions = normalize(&[rq]);
        assert_eq!(questions[0].correct_index, 0);
    }

    #[test]
    fn normalize_keeps_custom_explanation() {
        let mut rq = raw("1", "Turismo");
        rq.explanation = Some("Porque sim.".into());
        assert_eq!(normalize(&[rq])[0].explanation, "Porque sim.");
    }

    #[test]
    fn normalize_is_one_to_one_and_in_bounds() {
        let mut bank: Vec<RawQuestion> = (0..30)
            .map(|i| raw(&i.to_string(), ["Lei", "Eco", "Turismo", "x"][i % 4]))
            .collect();
        bank[7].correct = "missing".into();
        bank[11].options = vec!["only".into()];

        let questions = normalize(&bank);
        assert_eq!(questions.len(), bank.len());
        for (q, rq) in questions.iter().zip(&bank) {
            assert_eq!(q.id, rq.id);
            assert!(q.correct_index < q.options.len());
        }
    }

    #[test]
    fn filter_and_shuffle_is_a_permutation_of_the_filtered_set() {
        let bank: Vec<RawQuestion> = (0..20)
            .map(|i| raw(&i.to_string(), if i % 2 == 0 { "Lei" } else { "Inglês" }))
            .collect();
        let questions = normalize(&bank);
        let mut rng = StdRng::seed_from_u64(7);

        let filter = CategoryFilter::Only(Category::LeiTvde);
        let picked = filter_and_shuffle(&questions, filter, &mut rng);
        assert!(picked.iter().all(|q| q.category == Category::LeiTvde));

        let mut picked_ids: Vec<_> = picked.iter().map(|q| q.id.clone()).collect();
        let mut expected: Vec<_> = questions
            .iter()
            .filter(|q| q.category == Category::LeiTvde)
            .map(|q| q.id.clone())
            .collect();
        picked_ids.sort();
        expected.sort();
        assert_eq!(picked_ids, expected);

        let all = filter_and_shuffle(&questions, CategoryFilter::All, &mut rng);
        assert_eq!(all.len(), questions.len());
    }

    #[test]
    fn shuffle_is_reproducible_with_a_seed() {
        let bank: Vec<RawQuestion> = (0..10).map(|i| raw(&i.to_string(), "Lei")).collect();
        let questions = normalize(&bank);

        let a = filter_and_shuffle(
            &questions,
            CategoryFilter::All,
            &mut StdRng::seed_from_u64(42),
        );
        let b = filter_and_shuffle(
            &questions,
            CategoryFilter::All,
            &mut StdRng::seed_from_u64(42),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn filter_parses_labels_and_slugs() {
        assert_eq!("Todos".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert_eq!(
            "Lei TVDE".parse::<CategoryFilter>(),
            Ok(CategoryFilter::Only(Category::LeiTvde))
        );
        assert_eq!(
            "segurança e socorro".parse::<CategoryFilter>(),
            Ok(CategoryFilter::Only(Category::SafetyFirstAid))
        );
        assert_eq!(
            "mecanica-e-eco-conducao".parse::<CategoryFilter>(),
            Ok(CategoryFilter::Only(Category::MechanicsEcoDriving))
        );
        assert!("nope".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn filter_display_round_trips() {
        for filter in CategoryFilter::menu() {
            assert_eq!(filter.to_string().parse::<CategoryFilter>(), Ok(filter));
        }
    }

    #[test]
    fn builtin_bank_loads_and_covers_every_category() {
        let bank = QuestionBank::builtin().unwrap();
        assert!(!bank.is_empty());

        let counts = bank.category_counts();
        for category in Category::ALL {
            assert!(counts.get(&category).copied().unwrap_or(0) > 0, "{category}");
        }
        assert_eq!(counts.values().sum::<usize>(), bank.len());

        // every built-in question names a real option as correct
        for rq in bank.raw() {
            assert!(rq.options.contains(&rq.correct), "{}", rq.id);
        }
    }

    #[test]
    fn from_path_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            QuestionBank::from_path(&path),
            Err(BankError::Parse { .. })
        ));
        assert!(matches!(
            QuestionBank::from_path(dir.path().join("missing.json")),
            Err(BankError::Io { .. })
        ));
    }

    #[test]
    fn from_path_rejects_questions_without_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        let mut rq = raw("empty", "Lei");
        rq.options.clear();
        std::fs::write(&path, serde_json::to_string(&vec![rq]).unwrap()).unwrap();
        assert!(matches!(
            QuestionBank::from_path(&path),
            Err(BankError::Invalid { ref id, .. }) if id == "empty"
        ));
    }

    #[test]
    fn from_path_rejects_questions_with_too_many_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        let mut rq = raw("wide", "Lei");
        rq.options = (0..=MAX_OPTIONS).map(|i| format!("option {i}")).collect();
        rq.correct = rq.options[MAX_OPTIONS].clone();
        std::fs::write(&path, serde_json::to_string(&vec![rq.clone()]).unwrap()).unwrap();
        assert!(matches!(
            QuestionBank::from_path(&path),
            Err(BankError::Invalid { ref id, .. }) if id == "wide"
        ));

        rq.options.truncate(MAX_OPTIONS);
        rq.correct = rq.options[MAX_OPTIONS - 1].clone();
        std::fs::write(&path, serde_json::to_string(&vec![rq]).unwrap()).unwrap();
        let bank = QuestionBank::from_path(&path).unwrap();
        assert_eq!(bank.questions()[0].correct_index, MAX_OPTIONS - 1);
    }
}
