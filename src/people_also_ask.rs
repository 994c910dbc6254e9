//! "People also ask" boxes. The markup is the same on desktop and every
//! mobile layout, so both assembler sets share this extractor.

use scraper::{ElementRef, Html};

use crate::document::{non_empty, selector, text, Container};
use crate::fields::href;
use crate::model::PeopleAlsoAsk;
use crate::normalize::split_description_and_date;

pub fn people_also_ask(document: &Html) -> Vec<PeopleAlsoAsk> {
    document
        .select(selector!(".related-question-pair"))
        .filter_map(parse_question)
        .collect()
}

fn parse_question(el: ElementRef<'_>) -> Option<PeopleAlsoAsk> {
    let c = Container::new(el);

    let question = [
        selector!(".s75CSd"),
        selector!(r#"[role="heading"]"#),
        selector!(r#"[role="button"]"#),
    ]
    .into_iter()
    .filter_map(|sel| c.first(sel))
    .find_map(|node| non_empty(&text(node)))?;

    // Collapsed boxes carry no answer until clicked.
    let answer = [
        selector!(".wDYxhc"),
        selector!(r#"[data-attrid="wa:/description"]"#),
    ]
    .into_iter()
    .find_map(|sel| non_empty(&c.text_of(sel)));
    let split = answer
        .as_deref()
        .map(split_description_and_date)
        .unwrap_or_default();

    let source = c
        .all(selector!("a"))
        .into_iter()
        .find(|a| a.select(selector!("h3")).next().is_some());

    Some(PeopleAlsoAsk {
        question,
        answer: split.description.or(answer),
        date: split.date,
        url: source.and_then(href),
        title: source
            .and_then(|a| a.select(selector!("h3")).next())
            .and_then(|h3| non_empty(&text(h3))),
    })
}
