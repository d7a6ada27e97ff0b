//! Multiple choice selections of one respondent.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::arena::Question;
use crate::domain::definition::{MULTIPLE_CHOICE_TYPE, SELECTED};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ordered::OrderedMap;
use crate::domain::record::FlatRecord;

/// Shape of the crosstab result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChoiceFormat {
    /// Sub-question title to selected flag, for every answered sub-question.
    Map,
    /// Titles of selected sub-questions.
    Code,
    /// Labels of selected sub-questions.
    Text,
    /// Title and label of selected sub-questions.
    CodeAndText,
    /// The selected sub-questions themselves.
    #[default]
    Node,
}

/// What to do when the question cannot produce a crosstab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnIneligible {
    /// Return the precondition error.
    #[default]
    Fail,
    /// Log the problem and return an empty result.
    Report,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChoiceOptions {
    pub format: ChoiceFormat,
    pub on_ineligible: OnIneligible,
}

impl ChoiceOptions {
    pub fn new(format: ChoiceFormat) -> Self {
        Self {
            format,
            on_ineligible: OnIneligible::Fail,
        }
    }

    pub fn lenient(mut self) -> Self {
        self.on_ineligible = OnIneligible::Report;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledChoice {
    pub code: String,
    pub text: String,
}

/// Crosstab result in the requested format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Choices<'a> {
    Map(OrderedMap<bool>),
    Codes(Vec<String>),
    Texts(Vec<String>),
    Labeled(Vec<LabeledChoice>),
    Nodes(Vec<Question<'a>>),
}

impl<'a> Choices<'a> {
    pub fn empty(format: ChoiceFormat) -> Self {
        match format {
            ChoiceFormat::Map => Choices::Map(OrderedMap::new()),
            ChoiceFormat::Code => Choices::Codes(Vec::new()),
            ChoiceFormat::Text => Choices::Texts(Vec::new()),
            ChoiceFormat::CodeAndText => Choices::Labeled(Vec::new()),
            ChoiceFormat::Node => Choices::Nodes(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Choices::Map(m) => m.len(),
            Choices::Codes(v) | Choices::Texts(v) => v.len(),
            Choices::Labeled(v) => v.len(),
            Choices::Nodes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> Question<'a> {
    /// Which sub-questions of this multiple choice question `response` selected.
    ///
    /// Sub-question columns are named `TITLE[SUBTITLE]`; a column whose value
    /// is `Y` is selected. Columns missing from the response are skipped.
    ///
    /// # Errors
    /// `Precondition` when called on a sub-question, on a question that is not
    /// of the multiple choice type, or on a question without sub-questions,
    /// unless `options.on_ineligible` is `Report`.
    pub fn multiple_choice(
        &self,
        response: &FlatRecord,
        options: ChoiceOptions,
    ) -> DomainResult<Choices<'a>> {
        match self.check_multiple_choice() {
            Ok(()) => Ok(self.collect_choices(response, options.format)),
            Err(e) => match options.on_ineligible {
                OnIneligible::Fail => Err(e),
                OnIneligible::Report => {
                    warn!(qid = self.qid(), error = %e, "multiple choice skipped");
                    Ok(Choices::empty(options.format))
                }
            },
        }
    }

    fn check_multiple_choice(&self) -> DomainResult<()> {
        if self.is_subquestion() {
            return Err(DomainError::precondition(format!(
                "'{}' is a sub-question",
                self.title()
            )));
        }
        if self.question_type() != MULTIPLE_CHOICE_TYPE {
            return Err(DomainError::precondition(format!(
                "question type of '{}' was '{}', not '{}'",
                self.title(),
                self.question_type(),
                MULTIPLE_CHOICE_TYPE
            )));
        }
        if self.subquestion_count() == 0 {
            return Err(DomainError::precondition(format!(
                "'{}' has no sub-questions",
                self.title()
            )));
        }
        Ok(())
    }

    fn collect_choices(&self, response: &FlatRecord, format: ChoiceFormat) -> Choices<'a> {
        let answered = self.subquestions().filter_map(|sub| {
            let column = format!("{}[{}]", self.title(), sub.title());
            response.get(&column).map(|value| (sub, value == SELECTED))
        });

        match format {
            ChoiceFormat::Map => Choices::Map(
                answered
                    .map(|(sub, selected)| (sub.title(), selected))
                    .collect(),
            ),
            ChoiceFormat::Code => Choices::Codes(
                answered
                    .filter(|(_, selected)| *selected)
                    .map(|(sub, _)| sub.title().to_string())
                    .collect(),
            ),
            ChoiceFormat::Text => Choices::Texts(
                answered
                    .filter(|(_, selected)| *selected)
                    .map(|(sub, _)| sub.label().to_string())
                    .collect(),
            ),
            ChoiceFormat::CodeAndText => Choices::Labeled(
                answered
                    .filter(|(_, selected)| *selected)
                    .map(|(sub, _)| LabeledChoice {
                        code: sub.title().to_string(),
                        text: sub.label().to_string(),
                    })
                    .collect(),
            ),
            ChoiceFormat::Node => Choices::Nodes(
                answered
                    .filter(|(_, selected)| *selected)
                    .map(|(sub, _)| sub)
                    .collect(),
            ),
        }
    }
}
