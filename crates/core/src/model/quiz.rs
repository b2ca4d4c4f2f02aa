use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{ArticleId, QuestionId};

/// Minimum score (percent) for an attempt to count as passed.
pub const PASS_THRESHOLD: u8 = 70;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("question {0} has no options")]
    NoOptions(QuestionId),

    #[error("question {question} has a blank label for option '{key}'")]
    BlankOption { question: QuestionId, key: String },

    #[error("question {question} marks '{key}' as correct but has no such option")]
    UnknownCorrectOption { question: QuestionId, key: String },

    #[error("a quiz needs at least one question")]
    EmptyQuiz,

    #[error("question {question} belongs to article {found}, expected {expected}")]
    ForeignQuestion {
        question: QuestionId,
        expected: ArticleId,
        found: ArticleId,
    },

    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),

    #[error("question {question} has no option '{key}'")]
    UnknownOption { question: QuestionId, key: String },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One multiple-choice question of an article's test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    id: QuestionId,
    article_id: ArticleId,
    text: String,
    options: BTreeMap<String, String>,
    correct_option: String,
}

impl QuizQuestion {
    /// # Errors
    ///
    /// Returns `QuizError` if the text is blank, there are no options, an
    /// option label is blank, or `correct_option` is not an option key.
    pub fn new(
        id: QuestionId,
        article_id: ArticleId,
        text: impl Into<String>,
        options: BTreeMap<String, String>,
        correct_option: impl Into<String>,
    ) -> Result<Self, QuizError> {
        let text = text.into().trim().to_owned();
        if text.is_empty() {
            return Err(QuizError::EmptyQuestion);
        }
        if options.is_empty() {
            return Err(QuizError::NoOptions(id));
        }
        if let Some((key, _)) = options.iter().find(|(_, label)| label.trim().is_empty()) {
            return Err(QuizError::BlankOption {
                question: id,
                key: key.clone(),
            });
        }
        let correct_option = correct_option.into();
        if !options.contains_key(&correct_option) {
            return Err(QuizError::UnknownCorrectOption {
                question: id,
                key: correct_option,
            });
        }

        Ok(Self {
            id,
            article_id,
            text,
            options,
            correct_option,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Option key → label, ordered by key.
    #[must_use]
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.correct_option
    }

    #[must_use]
    pub fn option_label(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn is_correct(&self, chosen: &str) -> bool {
        self.correct_option == chosen
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// The ordered question set ("test") of one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    article_id: ArticleId,
    questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuiz` for no questions, `ForeignQuestion` if
    /// a question belongs to another article, and `DuplicateQuestion` if an
    /// id repeats.
    pub fn new(article_id: ArticleId, questions: Vec<QuizQuestion>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyQuiz);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for q in &questions {
            if q.article_id != article_id {
                return Err(QuizError::ForeignQuestion {
                    question: q.id,
                    expected: article_id,
                    found: q.article_id,
                });
            }
            if !seen.insert(q.id) {
                return Err(QuizError::DuplicateQuestion(q.id));
            }
        }
        Ok(Self {
            article_id,
            questions,
        })
    }

    #[must_use]
    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&QuizQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Scores an attempt. Unanswered questions count as incorrect.
    #[must_use]
    pub fn score(&self, attempt: &QuizAttempt) -> QuizOutcome {
        let review: Vec<QuestionReview> = self
            .questions
            .iter()
            .map(|q| {
                let chosen = attempt.choice(q.id).map(str::to_owned);
                let is_correct = chosen.as_deref().is_some_and(|c| q.is_correct(c));
                QuestionReview {
                    question_id: q.id,
                    chosen,
                    correct_option: q.correct_option.clone(),
                    is_correct,
                }
            })
            .collect();

        let correct = review.iter().filter(|r| r.is_correct).count();
        let score = percent(correct, review.len());
        QuizOutcome {
            article_id: self.article_id,
            score,
            correct,
            total: review.len(),
            passed: score >= PASS_THRESHOLD,
            review,
        }
    }
}

/// `round(100 * correct / total)` with halves rounded up; 0 for an empty total.
#[must_use]
pub fn percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total);
    let rounded = (200 * correct + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// Answers chosen so far in one quiz session. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizAttempt {
    answers: HashMap<QuestionId, String>,
}

impl QuizAttempt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or replaces) the chosen option for a question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownQuestion` if the question is not in the quiz
    /// and `QuizError::UnknownOption` if the key is not one of its options.
    pub fn choose(
        &mut self,
        quiz: &Quiz,
        question: QuestionId,
        key: impl Into<String>,
    ) -> Result<(), QuizError> {
        let q = quiz
            .question(question)
            .ok_or(QuizError::UnknownQuestion(question))?;
        let key = key.into();
        if !q.options.contains_key(&key) {
            return Err(QuizError::UnknownOption { question, key });
        }
        self.answers.insert(question, key);
        Ok(())
    }

    #[must_use]
    pub fn choice(&self, question: QuestionId) -> Option<&str> {
        self.answers.get(&question).map(String::as_str)
    }

    #[must_use]
    pub fn answered(&self) -> usize {
        self.answers.len()
    }
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Per-question result shown after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionReview {
    pub question_id: QuestionId,
    pub chosen: Option<String>,
    pub correct_option: String,
    pub is_correct: bool,
}

/// Result of scoring a submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizOutcome {
    pub article_id: ArticleId,
    pub score: u8,
    pub correct: usize,
    pub total: usize,
    pub passed: bool,
    pub review: Vec<QuestionReview>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(keys: &[&str]) -> BTreeMap<String, String> {
        keys.iter()
            .map(|k| ((*k).to_owned(), format!("Option {k}")))
            .collect()
    }

    fn question(id: u64, correct: &str) -> QuizQuestion {
        QuizQuestion::new(
            QuestionId::new(id),
            ArticleId::new(1),
            format!("Question {id}?"),
            options(&["a", "b", "c"]),
            correct,
        )
        .unwrap()
    }

    fn four_question_quiz() -> Quiz {
        Quiz::new(
            ArticleId::new(1),
            vec![
                question(1, "a"),
                question(2, "b"),
                question(3, "c"),
                question(4, "a"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn three_of_four_passes_with_75() {
        let quiz = four_question_quiz();
        let mut attempt = QuizAttempt::new();
        attempt.choose(&quiz, QuestionId::new(1), "a").unwrap();
        attempt.choose(&quiz, QuestionId::new(2), "b").unwrap();
        attempt.choose(&quiz, QuestionId::new(3), "c").unwrap();
        attempt.choose(&quiz, QuestionId::new(4), "b").unwrap();

        let outcome = quiz.score(&attempt);
        assert_eq!(outcome.score, 75);
        assert_eq!(outcome.correct, 3);
        assert!(outcome.passed);
    }

    #[test]
    fn two_of_four_fails_with_50() {
        let quiz = four_question_quiz();
        let mut attempt = QuizAttempt::new();
        attempt.choose(&quiz, QuestionId::new(1), "a").unwrap();
        attempt.choose(&quiz, QuestionId::new(2), "b").unwrap();

        let outcome = quiz.score(&attempt);
        assert_eq!(outcome.score, 50);
        assert!(!outcome.passed);
        assert_eq!(outcome.review[2].chosen, None);
        assert!(!outcome.review[3].is_correct);
    }

    #[test]
    fn unanswered_quiz_scores_zero() {
        let outcome = four_question_quiz().score(&QuizAttempt::new());
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.total, 4);
    }

    #[test]
    fn rechoosing_overwrites_previous_answer() {
        let quiz = four_question_quiz();
        let mut attempt = QuizAttempt::new();
        attempt.choose(&quiz, QuestionId::new(1), "b").unwrap();
        attempt.choose(&quiz, QuestionId::new(1), "a").unwrap();
        assert_eq!(attempt.choice(QuestionId::new(1)), Some("a"));
        assert_eq!(attempt.answered(), 1);
    }

    #[test]
    fn choose_rejects_unknown_question_and_option() {
        let quiz = four_question_quiz();
        let mut attempt = QuizAttempt::new();
        assert_eq!(
            attempt.choose(&quiz, QuestionId::new(9), "a"),
            Err(QuizError::UnknownQuestion(QuestionId::new(9)))
        );
        assert!(matches!(
            attempt.choose(&quiz, QuestionId::new(1), "z"),
            Err(QuizError::UnknownOption { .. })
        ));
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(7, 10), 70);
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn question_rejects_missing_correct_option() {
        let err = QuizQuestion::new(
            QuestionId::new(1),
            ArticleId::new(1),
            "Q?",
            options(&["a", "b"]),
            "c",
        )
        .unwrap_err();
        assert!(matches!(err, QuizError::UnknownCorrectOption { .. }));
    }

    #[test]
    fn question_rejects_blank_label() {
        let mut opts = options(&["a"]);
        opts.insert("b".into(), "  ".into());
        let err = QuizQuestion::new(QuestionId::new(1), ArticleId::new(1), "Q?", opts, "a")
            .unwrap_err();
        assert!(matches!(err, QuizError::BlankOption { .. }));
    }

    #[test]
    fn quiz_rejects_foreign_and_duplicate_questions() {
        let foreign = QuizQuestion::new(
            QuestionId::new(5),
            ArticleId::new(2),
            "Q?",
            options(&["a"]),
            "a",
        )
        .unwrap();
        assert!(matches!(
            Quiz::new(ArticleId::new(1), vec![foreign]),
            Err(QuizError::ForeignQuestion { .. })
        ));
        assert_eq!(
            Quiz::new(ArticleId::new(1), vec![question(1, "a"), question(1, "b")]),
            Err(QuizError::DuplicateQuestion(QuestionId::new(1)))
        );
        assert_eq!(
            Quiz::new(ArticleId::new(1), Vec::new()),
            Err(QuizError::EmptyQuiz)
        );
    }
}
