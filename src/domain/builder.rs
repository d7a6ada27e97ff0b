//! Tree builder for turning survey definitions into a `QuestionSet`.

use std::collections::HashMap;

use itertools::Itertools;
use tracing::{debug, instrument, warn};

use crate::domain::access::AccessFilter;
use crate::domain::arena::{ParentRef, QuestionSet};
use crate::domain::definition::{AnswerDef, DefinitionPayload, QuestionDef, DUAL_SCALE_TYPE};
use crate::domain::error::DomainError;
use crate::domain::natural::{natural_cmp, natural_sort_by_key};

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;

/// Constructs ordered, indexed question trees from definition payloads.
///
/// Every level is sorted naturally by title; answers by `scale_id` for
/// dual-scale questions and by `code` otherwise.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    filter: Option<AccessFilter>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only top-level questions whose title passes `filter`.
    pub fn with_filter(mut self, filter: AccessFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn build_payload(&self, payload: DefinitionPayload) -> TreeResult<QuestionSet> {
        match payload {
            DefinitionPayload::Nested(definitions) => self.build(definitions),
            DefinitionPayload::Flat { questions, answers } => {
                self.build_from_rows(questions, answers)
            }
        }
    }

    /// Build from top-level definitions carrying their sub-questions and answers.
    #[instrument(level = "debug", skip_all, fields(definitions = definitions.len()))]
    pub fn build(&self, definitions: Vec<QuestionDef>) -> TreeResult<QuestionSet> {
        let mut roots = self.apply_filter(definitions)?;
        natural_sort_by_key(&mut roots, |q| q.title.as_str());

        let mut set = QuestionSet::new();
        let mut stack: Vec<(QuestionDef, ParentRef)> =
            roots.into_iter().rev().map(|q| (q, ParentRef::Root)).collect();

        while let Some((mut def, parent)) = stack.pop() {
            let mut subquestions = std::mem::take(&mut def.subquestions);
            let mut answers = std::mem::take(&mut def.answers);
            let raw = def.raw_fields();
            let qtype = def.qtype.clone();

            let idx = set.insert_question(def.qid, def.title, def.qtype, raw, parent)?;

            sort_answers(&qtype, &mut answers);
            for answer in answers {
                let raw = answer.raw_fields();
                set.insert_answer(idx, answer.aid, answer.code, raw);
            }

            natural_sort_by_key(&mut subquestions, |q| q.title.as_str());
            // Reverse so siblings are inserted in sorted order
            for sub in subquestions.into_iter().rev() {
                stack.push((sub, ParentRef::Question(idx)));
            }
        }

        debug!(
            top_level = set.len(),
            total = set.total_questions(),
            "built question tree"
        );
        Ok(set)
    }

    /// Build from flat rows: questions linked by `parent_qid`, answers by `qid`.
    #[instrument(level = "debug", skip_all, fields(questions = questions.len(), answers = answers.len()))]
    pub fn build_from_rows(
        &self,
        questions: Vec<QuestionDef>,
        answers: Vec<AnswerDef>,
    ) -> TreeResult<QuestionSet> {
        let total = questions.len();
        let (roots, nested): (Vec<_>, Vec<_>) =
            questions.into_iter().partition(QuestionDef::is_top_level);

        if roots.is_empty() {
            if let Some(first) = nested.first() {
                return Err(DomainError::CycleDetected(first.qid.clone()));
            }
        }

        let mut children: HashMap<String, Vec<QuestionDef>> = nested
            .into_iter()
            .into_group_map_by(|q| q.parent_qid.clone().unwrap_or_default());

        let (owned, orphans): (Vec<_>, Vec<_>) =
            answers.into_iter().partition(|a| a.qid.is_some());
        if !orphans.is_empty() {
            warn!(count = orphans.len(), "answer rows without qid ignored");
        }
        let mut answers_by_qid: HashMap<String, Vec<AnswerDef>> = owned
            .into_iter()
            .into_group_map_by(|a| a.qid.clone().unwrap_or_default());

        let roots: Vec<QuestionDef> = roots
            .into_iter()
            .map(|root| attach(root, &mut children, &mut answers_by_qid))
            .collect();

        let unreachable: usize = children.values().map(Vec::len).sum();
        if unreachable > 0 {
            warn!(unreachable, total, "question rows not reachable from a top-level question");
        }

        self.build(roots)
    }

    fn apply_filter(&self, definitions: Vec<QuestionDef>) -> TreeResult<Vec<QuestionDef>> {
        let Some(filter) = &self.filter else {
            return Ok(definitions);
        };
        let mut kept = Vec::with_capacity(definitions.len());
        for def in definitions {
            if filter.is_allowed(&def.title)? {
                kept.push(def);
            }
        }
        Ok(kept)
    }
}

/// Attach sub-question and answer rows to `question`, recursively.
fn attach(
    mut question: QuestionDef,
    children: &mut HashMap<String, Vec<QuestionDef>>,
    answers: &mut HashMap<String, Vec<AnswerDef>>,
) -> QuestionDef {
    if let Some(found) = answers.remove(&question.qid) {
        question.answers.extend(found);
    }
    if let Some(subs) = children.remove(&question.qid) {
        for sub in subs {
            let sub = attach(sub, children, answers);
            question.subquestions.push(sub);
        }
    }
    question
}

fn sort_answers(qtype: &str, answers: &mut [AnswerDef]) {
    if qtype == DUAL_SCALE_TYPE {
        answers.sort_by(|a, b| {
            natural_cmp(
                a.scale_id.as_deref().unwrap_or_default(),
                b.scale_id.as_deref().unwrap_or_default(),
            )
        });
    } else {
        natural_sort_by_key(answers, |a| a.code.as_str());
    }
}
