use crate::ballot_state::{Ballot, BallotView};
use crate::config::Config;
use crate::poll_state::{PollDraft, ValidationIssue};
use crate::ui_poll_view::{Notice, QuestionResults};
use serde::Serialize;
use tera::{Context, Tera};

pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../templates/base.html")),
        ("builder.html", include_str!("../templates/builder.html")),
        ("ballot.html", include_str!("../templates/ballot.html")),
    ])?;
    Ok(tera)
}

#[derive(Serialize)]
struct BuilderPage {
    poll_id: String,
    questions: Vec<QuestionForm>,
    add_question_disabled: bool,
    remove_question_disabled: bool,
    finish_disabled: bool,
    share_link: Option<String>,
    errors: Vec<String>,
    notice: Option<Notice>,
}

#[derive(Serialize)]
struct QuestionForm {
    id: String,
    index: usize,
    number: usize,
    content: String,
    invalid: bool,
    options: Vec<OptionForm>,
    add_option_disabled: bool,
    remove_option_disabled: bool,
}

#[derive(Serialize)]
struct OptionForm {
    index: usize,
    number: usize,
    content: String,
    invalid: bool,
}

#[derive(Serialize)]
struct BallotPage {
    poll_id: String,
    ballot_id: String,
    state: &'static str,
    message: Option<String>,
    questions: Vec<BallotQuestion>,
    results: Vec<QuestionResults>,
    submitted: bool,
    notice: Option<Notice>,
}

#[derive(Serialize)]
struct BallotQuestion {
    index: usize,
    content: String,
    options: Vec<BallotOption>,
}

#[derive(Serialize)]
struct BallotOption {
    index: usize,
    content: String,
    selected: bool,
}

fn highlights_question(errors: &[ValidationIssue], question: usize) -> bool {
    errors
        .iter()
        .any(|issue| matches!(issue, ValidationIssue::EmptyQuestion { question: q } if *q == question))
}

fn highlights_option(errors: &[ValidationIssue], question: usize, option: usize) -> bool {
    errors.iter().any(|issue| match issue {
        ValidationIssue::EmptyOption {
            question: q,
            option: o,
        } => *q == question && *o == option,
        ValidationIssue::OptionCount { question: q, .. } => *q == question,
        ValidationIssue::EmptyQuestion { .. } => false,
    })
}

pub fn create_builder_view(
    tera: &Tera,
    config: &Config,
    draft: &PollDraft,
) -> Result<String, tera::Error> {
    let controls = draft.controls();
    let page = BuilderPage {
        poll_id: draft.id.to_string(),
        questions: draft
            .questions
            .iter()
            .enumerate()
            .map(|(i, question)| QuestionForm {
                id: question.id.to_string(),
                index: i,
                number: i + 1,
                content: question.content.clone(),
                invalid: highlights_question(&draft.errors, i),
                options: question
                    .options
                    .iter()
                    .enumerate()
                    .map(|(o, content)| OptionForm {
                        index: o,
                        number: o + 1,
                        content: content.clone(),
                        invalid: highlights_option(&draft.errors, i, o),
                    })
                    .collect(),
                add_option_disabled: controls.add_option_disabled[i],
                remove_option_disabled: controls.remove_option_disabled[i],
            })
            .collect(),
        add_question_disabled: controls.add_question_disabled,
        remove_question_disabled: controls.remove_question_disabled,
        finish_disabled: controls.finish_disabled,
        share_link: if draft.is_published() {
            Some(config.share_link(&draft.id.to_string()))
        } else {
            None
        },
        errors: draft.errors.iter().map(ToString::to_string).collect(),
        notice: draft.notice.clone(),
    };
    tera.render("builder.html", &Context::from_serialize(&page)?)
}

pub fn create_ballot_view(tera: &Tera, ballot: &Ballot) -> Result<String, tera::Error> {
    let (state, message) = match &ballot.view {
        BallotView::Loading => ("loading", None),
        BallotView::Unavailable(message) => ("unavailable", Some(message.clone())),
        BallotView::Voting => ("voting", None),
        BallotView::Results => ("results", None),
    };
    let questions = ballot
        .poll
        .iter()
        .flat_map(|poll| poll.questions.iter().enumerate())
        .map(|(i, question)| BallotQuestion {
            index: i,
            content: question.content.clone(),
            options: question
                .options
                .iter()
                .enumerate()
                .map(|(o, option)| BallotOption {
                    index: o,
                    content: option.content.clone(),
                    selected: ballot.selections.get(i) == Some(&Some(o)),
                })
                .collect(),
        })
        .collect();
    let page = BallotPage {
        poll_id: ballot.poll_id.clone(),
        ballot_id: ballot.id.to_string(),
        state,
        message,
        questions,
        results: ballot.results(),
        submitted: ballot.is_submitted(),
        notice: ballot.notice.clone(),
    };
    tera.render("ballot.html", &Context::from_serialize(&page)?)
}
