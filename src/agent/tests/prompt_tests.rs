//! Tests for the prompt catalogue.

use minijinja::context;
use rstest::{fixture, rstest};

use crate::agent::services::{MENU_ITEMS, PromptCatalog, PromptError};

#[fixture]
fn catalog() -> PromptCatalog {
    PromptCatalog::standard().expect("templates compile")
}

#[rstest]
fn legal_review_embeds_the_snippet(catalog: PromptCatalog) {
    let prompt = catalog
        .render("legal_review", context! { snippet => "Clause 4: penalties" })
        .expect("renders");

    assert!(prompt.contains("Clause 4: penalties"));
    assert!(prompt.starts_with("Role: lawyer."));
}

#[rstest]
fn followup_lists_every_document(catalog: PromptCatalog) {
    let documents = vec![
        context! { file_id => "a", text => "alpha", analysis => "low risk" },
        context! { file_id => "b", text => "beta", analysis => "" },
    ];

    let prompt = catalog
        .render(
            "legal_followup",
            context! { query => "deadlines?", documents },
        )
        .expect("renders");

    assert!(prompt.contains("deadlines?"));
    assert!(prompt.contains("Document a: alpha"));
    assert!(prompt.contains("Document b: beta"));
    assert!(prompt.contains("low risk"));
}

#[rstest]
fn unknown_templates_are_reported(catalog: PromptCatalog) {
    let result = catalog.render("nope", context! {});

    assert_eq!(result, Err(PromptError::UnknownTemplate("nope".to_owned())));
}

#[rstest]
fn menu_items_are_known_templates(catalog: PromptCatalog) {
    for item in MENU_ITEMS {
        assert!(catalog.is_menu_item(item));
    }
    assert!(!catalog.is_menu_item("assistant_reply"));
}

#[rstest]
fn templates_can_be_replaced(catalog: PromptCatalog) {
    let custom = catalog
        .with_template("assistant_reply", "Q: {{ snippet }}")
        .expect("compiles");

    let prompt = custom
        .render("assistant_reply", context! { snippet => "hi" })
        .expect("renders");

    assert_eq!(prompt, "Q: hi");
}
