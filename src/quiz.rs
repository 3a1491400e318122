//! The study session state machine.
//!
//! A [`QuizEngine`] is either waiting for a category choice, walking through
//! a shuffled session, or showing the summary of a finished one:
//!
//! ```text
//! CategorySelection --start--> InProgress --advance(last)--> Finished
//!        ^                        |                             |
//!        +-------abandon----------+                             |
//!        +-------------------restart(false)---------------------+
//!                                 InProgress <--restart(true)---+
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::bank::{filter_and_shuffle, CategoryFilter, Question, QuestionBank};
use crate::error::QuizError;

/// Minimum percentage for a [`Verdict::Pass`].
pub const PASS_THRESHOLD_PERCENT: u32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    CategorySelection,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    NeedsReview,
}

impl Verdict {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= PASS_THRESHOLD_PERCENT {
            Verdict::Pass
        } else {
            Verdict::NeedsReview
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Pass => "Excelente trabalho! Domina bem este tópico. Continue assim.",
            Verdict::NeedsReview => {
                "Bom esforço! Sugerimos rever este tópico mais algumas vezes para consolidar o conhecimento."
            }
        }
    }
}

/// Final tally of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub filter: CategoryFilter,
    pub score: usize,
    pub total: usize,
    pub percentage: u32,
    pub verdict: Verdict,
}

impl Summary {
    fn new(filter: CategoryFilter, score: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (score as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            filter,
            score,
            total,
            percentage,
            verdict: Verdict::from_percentage(percentage),
        }
    }
}

/// What the user learns right after choosing an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub chosen: usize,
    pub correct_index: usize,
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next,
    Finished(Summary),
}

/// One run through a filtered, shuffled set of questions.
#[derive(Debug, Clone)]
pub struct Session {
    filter: CategoryFilter,
    questions: Vec<Question>,
    position: usize,
    answer: Option<usize>,
    score: usize,
    finished: bool,
}

impl Session {
    fn new(filter: CategoryFilter, questions: Vec<Question>) -> Self {
        Self {
            filter,
            questions,
            position: 0,
            answer: None,
            score: 0,
            finished: false,
        }
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> &Question {
        &self.questions[self.position]
    }

    pub fn answer(&self) -> Option<usize> {
        self.answer
    }

    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_last(&self) -> bool {
        self.position + 1 == self.questions.len()
    }

    /// Fraction of the session reached, counting the current question.
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        ((self.position + 1) as f64 / self.questions.len() as f64).min(1.0)
    }

    pub fn summary(&self) -> Summary {
        Summary::new(self.filter, self.score, self.questions.len())
    }
}

/// Owns the normalized bank and at most one active [`Session`].
#[derive(Debug)]
pub struct QuizEngine<R: Rng = StdRng> {
    questions: Vec<Question>,
    rng: R,
    session: Option<Session>,
}

impl QuizEngine<StdRng> {
    pub fn new(bank: &QuestionBank) -> Self {
        Self::with_rng(bank, StdRng::from_entropy())
    }

    pub fn seeded(bank: &QuestionBank, seed: u64) -> Self {
        Self::with_rng(bank, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> QuizEngine<R> {
    pub fn with_rng(bank: &QuestionBank, rng: R) -> Self {
        Self {
            questions: bank.questions(),
            rng,
            session: None,
        }
    }

    pub fn phase(&self) -> Phase {
        match &self.session {
            None => Phase::CategorySelection,
            Some(s) if s.finished => Phase::Finished,
            Some(_) => Phase::InProgress,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Builds a fresh session and replaces whatever was active.
    ///
    /// An empty selection leaves the engine exactly as it was.
    pub fn start_session(&mut self, filter: CategoryFilter) -> Result<&Session, QuizError> {
        let questions = filter_and_shuffle(&self.questions, filter, &mut self.rng);
        if questions.is_empty() {
            info!(category = %filter, "no questions available");
            return Err(QuizError::EmptyResultSet(filter));
        }

        info!(category = %filter, questions = questions.len(), "session started");
        Ok(self.session.insert(Session::new(filter, questions)))
    }

    pub fn answer(&mut self, option: usize) -> Result<AnswerFeedback, QuizError> {
        let session = self.in_progress_mut()?;
        if session.answer.is_some() {
            return Err(QuizError::AlreadyAnswered);
        }

        let question = &session.questions[session.position];
        if option >= question.options.len() {
            return Err(QuizError::OptionOutOfRange {
                index: option,
                len: question.options.len(),
            });
        }

        let is_correct = option == question.correct_index;
        let feedback = AnswerFeedback {
            chosen: option,
            correct_index: question.correct_index,
            is_correct,
            explanation: question.explanation.clone(),
        };

        session.answer = Some(option);
        if is_correct {
            session.score += 1;
        }
        debug!(
            question = %question.id,
            option,
            is_correct,
            score = session.score,
            "answered"
        );
        Ok(feedback)
    }

    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        let session = self.in_progress_mut()?;
        if session.answer.is_none() {
            return Err(QuizError::NotAnswered);
        }

        if session.is_last() {
            session.finished = true;
            let summary = session.summary();
            info!(
                category = %summary.filter,
                score = summary.score,
                total = summary.total,
                percentage = summary.percentage,
                "session finished"
            );
            return Ok(Advance::Finished(summary));
        }

        session.position += 1;
        session.answer = None;
        Ok(Advance::Next)
    }

    /// Replays the same category with a fresh shuffle, or goes back to the
    /// category menu.
    pub fn restart(&mut self, same_category: bool) -> Result<(), QuizError> {
        let filter = self
            .session
            .as_ref()
            .map(|s| s.filter)
            .ok_or(QuizError::NotInProgress)?;

        if same_category {
            self.start_session(filter)?;
        } else {
            self.session = None;
        }
        Ok(())
    }

    /// Drops the active session without finishing it.
    pub fn abandon(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(
                category = %session.filter,
                position = session.position,
                "session abandoned"
            );
        }
    }

    fn in_progress_mut(&mut self) -> Result<&mut Session, QuizError> {
        match self.session.as_mut() {
            Some(s) if !s.finished => Ok(s),
            _ => Err(QuizError::NotInProgress),
        }
    }
}
